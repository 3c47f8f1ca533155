// SPDX-License-Identifier: GPL-3.0-only

//! RGB32 to JPEG/PNG converter
//!
//! Pixels are `0xAARRGGBB`; the encoders receive opaque RGB8 because most
//! inputs are XRGB with an undefined top byte.

use super::IntParameter;
use crate::constants::{
    DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIME_JPEG, MIME_PNG, MIN_JPEG_QUALITY, PARAM_QUALITY,
};
use crate::errors::{ImagingError, ImagingResult};
use crate::media::frame::{Frame, alloc_bytes};
use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use tracing::debug;

/// Encoded output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodedFormat {
    /// MIME identifier of this format
    pub fn mime(&self) -> &'static str {
        match self {
            EncodedFormat::Jpeg => MIME_JPEG,
            EncodedFormat::Png => MIME_PNG,
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodedFormat::Jpeg => "jpg",
            EncodedFormat::Png => "png",
        }
    }

    /// Match a destination MIME identifier, ignoring ASCII case
    pub fn from_mime(mime: &str) -> Option<Self> {
        [EncodedFormat::Jpeg, EncodedFormat::Png]
            .into_iter()
            .find(|format| format.mime().eq_ignore_ascii_case(mime))
    }

    /// Bytes reserved up front for encoding a `width x height` image
    fn capacity_hint(&self, width: u32, height: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        match self {
            // Room for worst-case JPEG output at quality 100
            EncodedFormat::Jpeg => ((w + 7) & !7) * ((h + 7) & !7) * 5 + 1024,
            // Filtered scanlines plus deflate block overhead and chunk headers
            EncodedFormat::Png => {
                let scanlines = h * (1 + w * 3);
                scanlines + scanlines / 1000 * 5 + 1024
            }
        }
    }
}

/// Converter filter state
#[derive(Debug, Clone)]
pub struct ConverterFilter {
    format: EncodedFormat,
    quality: u8,
}

impl ConverterFilter {
    pub const INT_PARAMETERS: &'static [IntParameter] = &[IntParameter {
        name: PARAM_QUALITY,
        min: MIN_JPEG_QUALITY as i32,
        max: MAX_JPEG_QUALITY as i32,
        default: DEFAULT_JPEG_QUALITY as i32,
    }];

    pub fn new(format: EncodedFormat) -> Self {
        Self {
            format,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn format(&self) -> EncodedFormat {
        self.format
    }

    /// JPEG quality; kept but ignored for PNG
    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn int_param(&self, name: &str) -> ImagingResult<i32> {
        if name == PARAM_QUALITY {
            Ok(self.quality as i32)
        } else {
            Err(ImagingError::invalid(format!("unknown parameter '{}'", name)))
        }
    }

    pub fn set_int_param(&mut self, name: &str, value: i32) -> ImagingResult<()> {
        if name != PARAM_QUALITY {
            return Err(ImagingError::invalid(format!("unknown parameter '{}'", name)));
        }
        if !(MIN_JPEG_QUALITY as i32..=MAX_JPEG_QUALITY as i32).contains(&value) {
            return Err(ImagingError::invalid(format!(
                "quality {} outside {}..={}",
                value, MIN_JPEG_QUALITY, MAX_JPEG_QUALITY
            )));
        }
        self.quality = value as u8;
        Ok(())
    }

    pub fn process(&self, input: &Frame) -> ImagingResult<Frame> {
        let (pixels, width, height) = input.require_rgb32("converter")?;
        let encoded = self.encode(pixels, width, height)?;

        debug!(
            width,
            height,
            format = ?self.format,
            size = encoded.len(),
            "Encoding complete"
        );
        Ok(Frame::from_bytes(encoded))
    }

    /// Encode into a buffer trimmed to the encoded length
    fn encode(&self, pixels: &[u32], width: u32, height: u32) -> ImagingResult<Vec<u8>> {
        let mut encoded = alloc_bytes(self.format.capacity_hint(width, height))?;
        let rgb = argb_to_rgb8(pixels)?;

        match self.format {
            EncodedFormat::Jpeg => {
                JpegEncoder::new_with_quality(&mut encoded, self.quality)
                    .encode(&rgb, width, height, image::ExtendedColorType::Rgb8)
                    .map_err(|e| ImagingError::fail(format!("JPEG encoding failed: {}", e)))?;
            }
            EncodedFormat::Png => {
                PngEncoder::new(&mut encoded)
                    .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
                    .map_err(|e| ImagingError::fail(format!("PNG encoding failed: {}", e)))?;
            }
        }

        if encoded.is_empty() {
            return Err(ImagingError::fail("encoder produced no output"));
        }

        encoded.shrink_to_fit();
        Ok(encoded)
    }
}

fn argb_to_rgb8(pixels: &[u32]) -> ImagingResult<Vec<u8>> {
    let mut rgb = alloc_bytes(pixels.len() * 3)?;
    for &p in pixels {
        rgb.extend_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8]);
    }
    Ok(rgb)
}
