// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline-wide constants

/// Raw 32-bit pixels, one `u32` per pixel laid out as `0xAARRGGBB`
pub const MIME_RGB32: &str = "image/raw;format=rgba8888";
/// JPEG encoded stream
pub const MIME_JPEG: &str = "image/jpeg;format=JPEG";
/// PNG encoded stream
pub const MIME_PNG: &str = "image/png;format=PNG";

/// Maximum number of filters a media processor accepts by default
pub const MAX_PROCESSOR_FILTERS: usize = 10;

/// JPEG quality used by a freshly created converter
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
/// Lowest accepted JPEG quality
pub const MIN_JPEG_QUALITY: u8 = 1;
/// Highest accepted JPEG quality
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Name of the converter's quality parameter
pub const PARAM_QUALITY: &str = "quality";

/// Fractional bits of the transform's fixed-point scale ratio
pub const SCALE_FIXED_SHIFT: u32 = 20;

/// Largest source rectangle side the transform accepts
///
/// `(len - 1) << SCALE_FIXED_SHIFT` has to fit in 32 bits for ratios to stay
/// bit-compatible with handsets that compute them in 32-bit arithmetic.
pub const MAX_TRANSFORM_SOURCE_DIMENSION: u32 = (1 << (32 - SCALE_FIXED_SHIFT)) - 1;

/// Opaque black, used for destination areas with no source coverage
pub const FILL_COLOR: u32 = 0xFF00_0000;

/// Top-byte marker of an overlay transparency argument requesting a plain overwrite
pub const OVERLAY_FULLY_OPAQUE: u32 = 0x1000_0000;
/// Top-byte marker of an overlay transparency argument requesting per-pixel alpha
pub const OVERLAY_ALPHA_ENABLED: u32 = 0x0800_0000;

/// Effect preset names, indexed by preset number
pub const EFFECT_PRESETS: [&str; 2] = ["monochrome", "negative"];

/// Default worker thread name
pub const WORKER_THREAD_NAME: &str = "amms-media-processor";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_dimension_limit() {
        assert_eq!(MAX_TRANSFORM_SOURCE_DIMENSION, 4095);
        let scaled = (MAX_TRANSFORM_SOURCE_DIMENSION as u64 - 1) << SCALE_FIXED_SHIFT;
        assert!(scaled <= u32::MAX as u64);
    }

    #[test]
    fn test_jpeg_quality_bounds() {
        assert!(MIN_JPEG_QUALITY <= DEFAULT_JPEG_QUALITY);
        assert!(DEFAULT_JPEG_QUALITY <= MAX_JPEG_QUALITY);
    }
}
