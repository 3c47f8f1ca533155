// SPDX-License-Identifier: GPL-3.0-only

//! Crop, scale, mirror and rotate
//!
//! Scaling is nearest-neighbor with a fixed-point ratio of
//! [`SCALE_FIXED_SHIFT`] fractional bits, computed as
//! `((src_len - 1) << shift) / (dst_len - 1)` so the first and last
//! destination pixels land exactly on the first and last source pixels.
//! Sides of length 1 use a zero ratio.
//!
//! A negative source width or height mirrors that axis: the same area is
//! read from its far edge back towards `x` (or `y`). Half turns are done here
//! as a double mirror; quarter turns are left to the companion
//! [`RotatorFilter`] that [`TransformFilter::companion_rotator`] provides.

use super::rotator::{RotateDirection, RotatorFilter};
use crate::constants::{FILL_COLOR, MAX_TRANSFORM_SOURCE_DIMENSION, SCALE_FIXED_SHIFT};
use crate::errors::{ImagingError, ImagingResult};
use crate::media::frame::{Frame, alloc_pixels, pixel_count};
use tracing::debug;

/// Requested source area; a zero width or height selects the full image on that axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Transform filter state
#[derive(Debug, Clone, Default)]
pub struct TransformFilter {
    source: SourceRect,
    dest_width: u32,
    dest_height: u32,
    rotation: u8,
}

/// One axis of the resolved source area
#[derive(Debug, Clone, Copy)]
struct Span {
    start: i64,
    len: u32,
    mirrored: bool,
}

impl Span {
    fn resolve(origin: i32, extent: i32, full: u32) -> ImagingResult<Self> {
        let span = if extent == 0 {
            Span {
                start: 0,
                len: full,
                mirrored: false,
            }
        } else {
            Span {
                start: origin as i64,
                len: extent.unsigned_abs(),
                mirrored: extent < 0,
            }
        };
        if span.len > MAX_TRANSFORM_SOURCE_DIMENSION {
            return Err(ImagingError::invalid(format!(
                "source side {} exceeds {}",
                span.len, MAX_TRANSFORM_SOURCE_DIMENSION
            )));
        }
        Ok(span)
    }

    fn overlaps(&self, bound: u32) -> bool {
        self.start < bound as i64 && self.start + self.len as i64 > 0
    }
}

/// Fixed-point step between consecutive destination samples
pub(crate) fn scale_ratio(src_len: u32, dst_len: u32) -> u32 {
    if src_len <= 1 || dst_len <= 1 {
        return 0;
    }
    ((((src_len - 1) as u64) << SCALE_FIXED_SHIFT) / (dst_len - 1) as u64) as u32
}

/// Source index sampled by each destination index, `None` where it falls outside `0..bound`
fn sample_positions(span: &Span, target: u32, bound: u32) -> Vec<Option<usize>> {
    let ratio = scale_ratio(span.len, target) as u64;
    let half = 1u64 << (SCALE_FIXED_SHIFT - 1);
    let last = span.len.saturating_sub(1) as u64;

    (0..target as u64)
        .map(|d| {
            let offset = ((d * ratio + half) >> SCALE_FIXED_SHIFT).min(last) as i64;
            let pos = if span.mirrored {
                span.start + last as i64 - offset
            } else {
                span.start + offset
            };
            (0..bound as i64).contains(&pos).then_some(pos as usize)
        })
        .collect()
}

/// Half-open range of destination indices that sample inside the source
fn visible_band(positions: &[Option<usize>]) -> Option<(usize, usize)> {
    let first = positions.iter().position(Option::is_some)?;
    let last = positions.iter().rposition(Option::is_some)?;
    Some((first, last + 1))
}

impl TransformFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.source = SourceRect {
            x,
            y,
            width,
            height,
        };
    }

    /// Final output size, after rotation; zero derives that side from the source area
    pub fn set_dest_size(&mut self, width: i32, height: i32) -> ImagingResult<()> {
        if width < 0 || height < 0 {
            return Err(ImagingError::invalid(format!(
                "destination size {}x{} is negative",
                width, height
            )));
        }
        self.dest_width = width as u32;
        self.dest_height = height as u32;
        Ok(())
    }

    /// Clockwise quarter turns, 0 to 3
    pub fn set_rotation(&mut self, quarter_turns: i32) -> ImagingResult<()> {
        if !(0..=3).contains(&quarter_turns) {
            return Err(ImagingError::invalid(format!(
                "rotation {} outside 0..=3",
                quarter_turns
            )));
        }
        self.rotation = quarter_turns as u8;
        Ok(())
    }

    pub fn source_rect(&self) -> SourceRect {
        self.source
    }

    pub fn dest_size(&self) -> (u32, u32) {
        (self.dest_width, self.dest_height)
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Rotator that has to follow this transform in a pipeline, for odd rotations
    pub fn companion_rotator(&self) -> Option<RotatorFilter> {
        match self.rotation {
            1 => Some(RotatorFilter::new(RotateDirection::Clockwise)),
            3 => Some(RotatorFilter::new(RotateDirection::CounterClockwise)),
            _ => None,
        }
    }

    /// Size of the scaled image before any quarter turn
    fn scaled_size(&self, src_w: u32, src_h: u32) -> (u32, u32) {
        let (dw, dh) = if self.rotation % 2 == 1 {
            (self.dest_height, self.dest_width)
        } else {
            (self.dest_width, self.dest_height)
        };
        (
            if dw == 0 { src_w } else { dw },
            if dh == 0 { src_h } else { dh },
        )
    }

    /// Crop, mirror and scale `input`
    ///
    /// For odd rotations the result is the pre-rotation image; the quarter
    /// turn happens in the companion rotator.
    pub fn process(&self, input: &Frame) -> ImagingResult<Frame> {
        let (pixels, src_w, src_h) = input.require_rgb32("transform")?;

        let mut span_x = Span::resolve(self.source.x, self.source.width, src_w)?;
        let mut span_y = Span::resolve(self.source.y, self.source.height, src_h)?;
        if self.rotation == 2 {
            span_x.mirrored = !span_x.mirrored;
            span_y.mirrored = !span_y.mirrored;
        }

        let (dst_w, dst_h) = self.scaled_size(span_x.len, span_y.len);
        let count = pixel_count(dst_w, dst_h)?;

        // Everything not covered by the visible band stays black
        let mut output = alloc_pixels(count, FILL_COLOR)?;

        if !span_x.overlaps(src_w) || !span_y.overlaps(src_h) {
            debug!(source = ?self.source, src_w, src_h, "Source area outside image");
            return Frame::from_pixels(output, dst_w, dst_h);
        }

        let cols = sample_positions(&span_x, dst_w, src_w);
        let rows = sample_positions(&span_y, dst_h, src_h);

        if let (Some((dx0, dx1)), Some((dy0, dy1))) = (visible_band(&cols), visible_band(&rows)) {
            let stride = dst_w as usize;
            let src_stride = src_w as usize;
            for (dy, row) in rows.iter().enumerate().take(dy1).skip(dy0) {
                let Some(sy) = *row else { continue };
                let src_row = &pixels[sy * src_stride..(sy + 1) * src_stride];
                let dst_row = &mut output[dy * stride + dx0..dy * stride + dx1];
                for (dst, col) in dst_row.iter_mut().zip(&cols[dx0..dx1]) {
                    if let Some(sx) = *col {
                        *dst = src_row[sx];
                    }
                }
            }
        }

        debug!(
            src_w,
            src_h,
            dst_w,
            dst_h,
            rotation = self.rotation,
            "Transform applied"
        );
        Frame::from_pixels(output, dst_w, dst_h)
    }
}
