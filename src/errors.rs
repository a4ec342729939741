// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the segmentation pipeline

use std::fmt;
use std::time::Duration;

/// Result type alias using SegmentError
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Pipeline error type
///
/// `DeviceNotFound`, `InitializationFailed` and `Config` are fatal and only
/// produced while setting things up. `FrameTimeout` and `InvalidFrame` are
/// recovered by skipping the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// No connected sensor
    DeviceNotFound(String),
    /// A depth or color frame did not arrive in time
    FrameTimeout(Duration),
    /// Stream configuration or buffer allocation failed
    InitializationFailed(String),
    /// Frame data does not match its declared format
    InvalidFrame(String),
    /// Configuration could not be parsed or is out of range
    Config(String),
    /// Filesystem error
    Io(String),
}

impl SegmentError {
    /// Whether the pipeline recovers from this error by skipping one frame
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SegmentError::FrameTimeout(_) | SegmentError::InvalidFrame(_)
        )
    }
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            SegmentError::FrameTimeout(timeout) => {
                write!(f, "Frame not received within {} ms", timeout.as_millis())
            }
            SegmentError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            SegmentError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            SegmentError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SegmentError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SegmentError {}

impl From<std::io::Error> for SegmentError {
    fn from(err: std::io::Error) -> Self {
        SegmentError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SegmentError {
    fn from(err: serde_json::Error) -> Self {
        SegmentError::Config(err.to_string())
    }
}

impl From<image::ImageError> for SegmentError {
    fn from(err: image::ImageError) -> Self {
        SegmentError::Io(err.to_string())
    }
}
