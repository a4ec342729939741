// SPDX-License-Identifier: GPL-3.0-only

//! Sensor and pipeline constants

use std::time::Duration;

/// Default near/far cutoff in sensor-native depth units (millimeters)
pub const DEFAULT_THRESHOLD_MM: u32 = 2400;

/// Depth sample bit layout
///
/// Raw depth samples carry the tracked-player index in the low bits and the
/// distance in millimeters in the remaining high bits:
/// ```text
/// 15                 3 2   0
/// [   depth in mm     ][pid]
/// ```
pub mod depth_bits {
    /// Mask isolating the player index bits
    pub const PLAYER_INDEX_BITMASK: u16 = 0b111;

    /// Width of the player index field (shift to recover the distance)
    pub const PLAYER_INDEX_BITMASK_WIDTH: u32 = 3;

    /// Largest player index that fits the mask
    pub const MAX_PLAYER_INDEX: u8 = PLAYER_INDEX_BITMASK as u8;

    /// Largest distance that fits above the player index bits
    pub const MAX_DEPTH_MM: u16 = u16::MAX >> PLAYER_INDEX_BITMASK_WIDTH;
}

/// Output layer layout
pub mod layers {
    /// Bytes per output pixel (three copied channels plus alpha)
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Alpha written for every composited pixel
    pub const OPAQUE_ALPHA: u8 = 0xFF;

    /// Number of output layers (room, near occupant, far occupant)
    pub const LAYER_COUNT: usize = 3;
}

/// Reference stream configuration for the depth sensor
pub mod streams {
    /// Depth stream width
    pub const DEPTH_WIDTH: u32 = 640;

    /// Depth stream height
    pub const DEPTH_HEIGHT: u32 = 480;

    /// Color stream width
    pub const COLOR_WIDTH: u32 = 640;

    /// Color stream height
    pub const COLOR_HEIGHT: u32 = 480;

    /// Frame rate for both streams
    pub const FRAMERATE: u32 = 30;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Per-stream acquisition timeout
    pub const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(100);

    /// Capture loop pacing (~30fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("BUILD_VERSION")
    }
}
