// SPDX-License-Identifier: MPL-2.0

//! Integration tests for processor configuration

use amms_imaging::constants::MAX_PROCESSOR_FILTERS;
use amms_imaging::pipelines::event_channel;
use amms_imaging::{ImagingError, MediaProcessor, ProcessorConfig};

#[test]
fn test_config_default() {
    let config = ProcessorConfig::default();
    assert_eq!(config.max_filters, MAX_PROCESSOR_FILTERS);
    assert_eq!(config.default_jpeg_quality, 80);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_partial_json_keeps_defaults() {
    let config = ProcessorConfig::from_json_str(r#"{ "max_filters": 3 }"#).unwrap();
    assert_eq!(config.max_filters, 3);
    assert_eq!(config.worker_thread_name, ProcessorConfig::default().worker_thread_name);
}

#[test]
fn test_config_rejects_bad_values() {
    assert!(matches!(
        ProcessorConfig::from_json_str(r#"{ "default_jpeg_quality": 0 }"#),
        Err(ImagingError::InvalidArgument(_))
    ));
    assert!(matches!(
        ProcessorConfig::from_json_str("not json"),
        Err(ImagingError::InvalidArgument(_))
    ));
}

#[test]
fn test_config_load_from_file() {
    let path = std::env::temp_dir().join(format!(
        "amms-imaging-config-{}.json",
        std::process::id()
    ));
    let json = r#"{ "max_filters": 2, "worker_thread_name": "test-pipeline" }"#;
    std::fs::write(&path, json).unwrap();

    let config = ProcessorConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.max_filters, 2);
    assert_eq!(config.worker_thread_name, "test-pipeline");

    let missing = ProcessorConfig::load(&path);
    assert!(matches!(missing, Err(ImagingError::Fail(_))));
}

#[test]
fn test_processor_rejects_invalid_config() {
    let (events, _rx) = event_channel();
    let config = ProcessorConfig {
        max_filters: 0,
        ..ProcessorConfig::default()
    };
    assert!(MediaProcessor::with_config(1, events, config).is_err());
}
