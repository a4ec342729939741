// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use depth_layers::backends::sensor::DepthPixel;
use depth_layers::constants::{DEFAULT_THRESHOLD_MM, app_info, depth_bits, layers, streams, timing};

#[test]
fn test_player_index_and_distance_round_trip() {
    let pixel = DepthPixel::from_parts(depth_bits::MAX_DEPTH_MM, depth_bits::MAX_PLAYER_INDEX);
    assert_eq!(pixel.raw(), u16::MAX);
    assert_eq!(pixel.depth_mm(), 8191);
    assert_eq!(pixel.player_index(), 7);
}

#[test]
fn test_default_threshold_is_in_range() {
    assert!(DEFAULT_THRESHOLD_MM > 0);
    assert!(DEFAULT_THRESHOLD_MM < depth_bits::MAX_DEPTH_MM as u32);
}

#[test]
fn test_layer_layout() {
    assert_eq!(layers::BYTES_PER_PIXEL, 4);
    assert_eq!(layers::OPAQUE_ALPHA, 255);
    assert_eq!(layers::LAYER_COUNT, 3);
}

#[test]
fn test_reference_streams() {
    assert_eq!((streams::DEPTH_WIDTH, streams::DEPTH_HEIGHT), (640, 480));
    assert_eq!((streams::COLOR_WIDTH, streams::COLOR_HEIGHT), (640, 480));
    // Frame pacing should keep up with the sensor framerate
    assert!(timing::FRAME_INTERVAL.as_millis() as u32 * streams::FRAMERATE <= 1000);
}

#[test]
fn test_version_is_set() {
    assert!(!app_info::version().is_empty());
}
