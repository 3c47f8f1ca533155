// SPDX-License-Identifier: GPL-3.0-only

//! Quarter-turn rotation, the transform's companion stage

use crate::errors::ImagingResult;
use crate::media::frame::{Frame, alloc_pixels};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    /// One quarter turn clockwise
    Clockwise,
    /// Three quarter turns clockwise
    CounterClockwise,
}

/// Transposes an RGB32 frame by a quarter turn
#[derive(Debug, Clone)]
pub struct RotatorFilter {
    direction: RotateDirection,
}

impl RotatorFilter {
    pub fn new(direction: RotateDirection) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> RotateDirection {
        self.direction
    }

    /// Output is `height x width`
    ///
    /// Source rows are walked in order; each one becomes an output column,
    /// written with a stride of the output width.
    pub fn process(&self, input: &Frame) -> ImagingResult<Frame> {
        let (pixels, width, height) = input.require_rgb32("rotator")?;
        let (w, h) = (width as usize, height as usize);

        let mut output = alloc_pixels(pixels.len(), 0)?;
        // Output rows are `h` pixels wide
        let out_stride = h;

        for (y, row) in pixels.chunks_exact(w).enumerate() {
            match self.direction {
                RotateDirection::Clockwise => {
                    // Source row y lands in output column h - 1 - y, top to bottom
                    let column = h - 1 - y;
                    for (x, &p) in row.iter().enumerate() {
                        output[x * out_stride + column] = p;
                    }
                }
                RotateDirection::CounterClockwise => {
                    // Source row y lands in output column y, bottom to top
                    let column = y;
                    for (x, &p) in row.iter().enumerate() {
                        output[(w - 1 - x) * out_stride + column] = p;
                    }
                }
            }
        }

        debug!(width, height, direction = ?self.direction, "Frame rotated");
        Frame::from_pixels(output, height, width)
    }
}
