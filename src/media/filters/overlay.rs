// SPDX-License-Identifier: MPL-2.0

//! Composites a second RGB32 image onto the frame
//!
//! The blend mode comes from flag bits in the top byte of the transparency
//! argument given with the overlay image, checked in this order:
//!
//! - [`OVERLAY_FULLY_OPAQUE`] set: overlay pixels overwrite the frame
//! - [`OVERLAY_ALPHA_ENABLED`] set: "A over B" using each overlay pixel's alpha
//! - neither: chroma key, overlay pixels whose RGB equals the argument's RGB
//!   are skipped
//!
//! Compositing writes into the frame's pixels. A frame that is shared or
//! externally owned is duplicated first (see [`Frame::into_writable_pixels`]).

use crate::constants::{OVERLAY_ALPHA_ENABLED, OVERLAY_FULLY_OPAQUE};
use crate::errors::{ImagingError, ImagingResult};
use crate::media::frame::Frame;
use tracing::{debug, trace};

const RGB_MASK: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    /// Skip overlay pixels with this RGB value
    TransparentColor(u32),
    AlphaBlend,
}

impl BlendMode {
    pub fn from_transparency(color: u32) -> Self {
        if color & OVERLAY_FULLY_OPAQUE != 0 {
            BlendMode::Opaque
        } else if color & OVERLAY_ALPHA_ENABLED != 0 {
            BlendMode::AlphaBlend
        } else {
            BlendMode::TransparentColor(color & RGB_MASK)
        }
    }
}

/// Overlay filter state
///
/// Clones share the overlay image buffer.
#[derive(Debug, Clone)]
pub struct OverlayFilter {
    image: Option<Frame>,
    x: i32,
    y: i32,
    mode: BlendMode,
}

impl Default for OverlayFilter {
    fn default() -> Self {
        Self {
            image: None,
            x: 0,
            y: 0,
            mode: BlendMode::Opaque,
        }
    }
}

/// Clipped placement of the overlay on the frame
struct Placement {
    /// First destination pixel
    dst_offset: usize,
    /// First overlay pixel
    src_offset: usize,
    cols: usize,
    rows: usize,
}

impl OverlayFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overlay image, its top-left position and the transparency argument
    pub fn set_image(
        &mut self,
        image: &Frame,
        x: i32,
        y: i32,
        transparency: u32,
    ) -> ImagingResult<()> {
        if image.dimensions().is_none() {
            return Err(ImagingError::invalid("overlay image must be RGB32"));
        }
        self.image = Some(image.addref());
        self.x = x;
        self.y = y;
        self.mode = BlendMode::from_transparency(transparency);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&Frame> {
        self.image.as_ref()
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.mode
    }

    fn placement(
        &self,
        overlay_w: u32,
        overlay_h: u32,
        width: u32,
        height: u32,
    ) -> Option<Placement> {
        let (x, y) = (self.x as i64, self.y as i64);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + overlay_w as i64).min(width as i64);
        let y1 = (y + overlay_h as i64).min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Placement {
            dst_offset: (y0 * width as i64 + x0) as usize,
            src_offset: ((y0 - y) * overlay_w as i64 + (x0 - x)) as usize,
            cols: (x1 - x0) as usize,
            rows: (y1 - y0) as usize,
        })
    }

    /// Composite onto `input`; returns `input` itself when nothing overlaps
    pub fn process(&self, input: Frame) -> ImagingResult<Frame> {
        let (width, height) = input
            .dimensions()
            .ok_or_else(|| ImagingError::invalid("overlay expects an RGB32 frame"))?;

        let Some(image) = &self.image else {
            trace!("No overlay image, passing frame through");
            return Ok(input);
        };
        let (overlay, overlay_w, overlay_h) = image.require_rgb32("overlay image")?;

        let Some(place) = self.placement(overlay_w, overlay_h, width, height) else {
            debug!(
                x = self.x,
                y = self.y,
                "Overlay outside frame, passing frame through"
            );
            return Ok(input);
        };

        let (mut pixels, width, height) = input.into_writable_pixels()?;
        let dst = &mut pixels[place.dst_offset..];
        let src = &overlay[place.src_offset..];
        let (dst_stride, src_stride) = (width as usize, overlay_w as usize);

        let (cols, rows) = (place.cols, place.rows);
        match self.mode {
            BlendMode::Opaque => blend_opaque(dst, dst_stride, src, src_stride, cols, rows),
            BlendMode::TransparentColor(key) => {
                blend_keyed(dst, dst_stride, src, src_stride, cols, rows, key)
            }
            BlendMode::AlphaBlend => blend_alpha(dst, dst_stride, src, src_stride, cols, rows),
        }

        debug!(
            x = self.x,
            y = self.y,
            cols = place.cols,
            rows = place.rows,
            mode = ?self.mode,
            "Overlay composited"
        );
        Frame::from_pixels(pixels, width, height)
    }
}

fn rows_of<'a>(
    dst: &'a mut [u32],
    dst_stride: usize,
    src: &'a [u32],
    src_stride: usize,
    cols: usize,
    rows: usize,
) -> impl Iterator<Item = (&'a mut [u32], &'a [u32])> {
    dst.chunks_mut(dst_stride)
        .zip(src.chunks(src_stride))
        .take(rows)
        .map(move |(d, s)| (&mut d[..cols], &s[..cols]))
}

fn blend_opaque(
    dst: &mut [u32],
    dst_stride: usize,
    src: &[u32],
    src_stride: usize,
    cols: usize,
    rows: usize,
) {
    for (d, s) in rows_of(dst, dst_stride, src, src_stride, cols, rows) {
        d.copy_from_slice(s);
    }
}

fn blend_keyed(
    dst: &mut [u32],
    dst_stride: usize,
    src: &[u32],
    src_stride: usize,
    cols: usize,
    rows: usize,
    key: u32,
) {
    for (d, s) in rows_of(dst, dst_stride, src, src_stride, cols, rows) {
        for (dp, &sp) in d.iter_mut().zip(s) {
            if sp & RGB_MASK != key {
                *dp = sp;
            }
        }
    }
}

fn blend_alpha(
    dst: &mut [u32],
    dst_stride: usize,
    src: &[u32],
    src_stride: usize,
    cols: usize,
    rows: usize,
) {
    for (d, s) in rows_of(dst, dst_stride, src, src_stride, cols, rows) {
        for (dp, &sp) in d.iter_mut().zip(s) {
            match sp >> 24 {
                0xFF => *dp = sp,
                0 => {}
                _ => *dp = alpha_over(sp, *dp),
            }
        }
    }
}

/// `src` over `dst`, both straight (non-premultiplied) alpha
fn alpha_over(src: u32, dst: u32) -> u32 {
    let sa = (src >> 24) as u64;
    let da = (dst >> 24) as u64;
    // Destination weight once the source has covered it
    let dw = da * (255 - sa) / 255;
    let out_a = sa + dw;
    // 8.24 fixed-point reciprocal of the combined alpha
    let recip = (1u64 << 24) / out_a;

    let channel = |shift: u32| -> u32 {
        let sc = (src >> shift) as u64 & 0xFF;
        let dc = (dst >> shift) as u64 & 0xFF;
        let c = ((sc * sa + dc * dw) * recip + (1 << 23)) >> 24;
        (c.min(255) as u32) << shift
    };

    ((out_a as u32) << 24) | channel(16) | channel(8) | channel(0)
}
