// SPDX-License-Identifier: MPL-2.0

//! Integration tests for shared constants

use amms_imaging::FilterFactory;
use amms_imaging::constants::*;
use amms_imaging::media::filters::EncodedFormat;

#[test]
fn test_mime_types_round_trip_through_formats() {
    assert_eq!(EncodedFormat::from_mime(MIME_PNG), Some(EncodedFormat::Png));
    assert_eq!(EncodedFormat::from_mime(MIME_JPEG), Some(EncodedFormat::Jpeg));
    assert_eq!(EncodedFormat::from_mime(MIME_RGB32), None);
}

#[test]
fn test_effect_presets_match_filter() {
    let factory = FilterFactory::new();
    let effect = factory
        .create(amms_imaging::FilterKind::Effect, MIME_RGB32, MIME_RGB32)
        .unwrap();
    assert_eq!(effect.supported_presets().unwrap(), &EFFECT_PRESETS);
}

#[test]
fn test_quality_bounds() {
    assert!(MIN_JPEG_QUALITY <= DEFAULT_JPEG_QUALITY);
    assert!(DEFAULT_JPEG_QUALITY <= MAX_JPEG_QUALITY);
}

#[test]
fn test_transform_source_limit_fits_fixed_point() {
    let max = u64::from(MAX_TRANSFORM_SOURCE_DIMENSION);
    assert!(max << SCALE_FIXED_SHIFT <= u64::from(u32::MAX));
    assert_eq!(MAX_TRANSFORM_SOURCE_DIMENSION, 4095);
}
