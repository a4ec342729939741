// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use depth_layers::constants::{DEFAULT_THRESHOLD_MM, timing};
use depth_layers::{SegmentError, SegmentationConfig};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = SegmentationConfig::default();

    assert_eq!(config.threshold, DEFAULT_THRESHOLD_MM);
    assert_eq!(config.acquire_timeout(), timing::ACQUIRE_TIMEOUT);
    assert_eq!(config.frame_interval(), timing::FRAME_INTERVAL);
    assert!(
        !config.clear_layers_each_frame,
        "Layers should keep unwritten pixels by default"
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_partial_json_keeps_defaults() {
    let config = SegmentationConfig::from_json_str(r#"{ "threshold": 1800 }"#).unwrap();

    assert_eq!(config.threshold, 1800);
    assert_eq!(config.acquire_timeout(), Duration::from_millis(100));
    assert!(!config.clear_layers_each_frame);
}

#[test]
fn test_config_empty_json_is_default() {
    let config = SegmentationConfig::from_json_str("{}").unwrap();
    assert_eq!(config, SegmentationConfig::default());
}

#[test]
fn test_config_rejects_zero_timeout() {
    let result = SegmentationConfig::from_json_str(r#"{ "acquire_timeout_ms": 0 }"#);
    assert!(matches!(result, Err(SegmentError::Config(_))));
}

#[test]
fn test_config_rejects_malformed_json() {
    let result = SegmentationConfig::from_json_str(r#"{ "threshold": "far" }"#);
    assert!(matches!(result, Err(SegmentError::Config(_))));
}

#[test]
fn test_config_save_and_load() {
    let dir = std::env::temp_dir().join(format!("depth-layers-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");

    let config = SegmentationConfig {
        threshold: 3100,
        clear_layers_each_frame: true,
        ..SegmentationConfig::default()
    };
    config.save(&path).unwrap();
    let loaded = SegmentationConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_config_load_missing_file() {
    let path = std::env::temp_dir().join("depth-layers-does-not-exist.json");
    let result = SegmentationConfig::load(&path);
    assert!(matches!(result, Err(SegmentError::Io(_))));
}
