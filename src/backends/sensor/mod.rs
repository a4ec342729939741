// SPDX-License-Identifier: GPL-3.0-only

//! Depth sensor abstraction
//!
//! The segmentation pipeline only talks to a sensor through [`FrameSource`].
//! Concrete driver bindings implement it; [`synthetic::SyntheticSource`]
//! implements it in-process for tests and demos.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ SegmentationPipeline │
//! └──────────┬───────────┘
//!            │ acquire_frame_pair / map_depth_to_color
//!            ▼
//! ┌──────────────────────┐
//! │   FrameSource Trait  │  ← Common interface
//! └──────────┬───────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!  ┌─────────┐ ┌───────────┐
//!  │ Driver  │ │ Synthetic │
//!  └─────────┘ └───────────┘
//! ```

pub mod frame_loop;
pub mod registration;
pub mod synthetic;
pub mod types;

pub use frame_loop::{CaptureLoopController, LoopAction};
pub use registration::{
    DepthRegistration, IdentityRegistration, ScaledRegistration, TableRegistration,
};
pub use synthetic::{LeaseCounter, OccupantScene, SyntheticSource};
pub use types::*;

use crate::errors::SegmentResult;
use std::time::Duration;

/// Capabilities a depth+color sensor exposes to the pipeline
pub trait FrameSource: Send {
    /// Human-readable device name (for logging)
    fn name(&self) -> &str;

    /// Check whether a sensor is connected and streaming
    fn is_available(&self) -> bool;

    /// Format of the depth stream
    fn depth_format(&self) -> DepthFormat;

    /// Format of the color stream
    fn color_format(&self) -> ColorFormat;

    /// Wait for the next depth and color frame
    ///
    /// # Returns
    /// * `Ok(FramePair)` - Both frames arrived; dropping the pair releases them
    /// * `Err(SegmentError::FrameTimeout)` - Either stream missed the timeout
    /// * `Err(SegmentError::DeviceNotFound)` - The sensor went away
    fn acquire_frame_pair(&mut self, timeout: Duration) -> SegmentResult<FramePair>;

    /// Map a depth-grid coordinate and its raw sample into the color grid
    ///
    /// The result may lie outside the color grid.
    fn map_depth_to_color(
        &self,
        x: u32,
        y: u32,
        pixel: DepthPixel,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
    ) -> ColorPoint;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn depth_format(&self) -> DepthFormat {
        (**self).depth_format()
    }

    fn color_format(&self) -> ColorFormat {
        (**self).color_format()
    }

    fn acquire_frame_pair(&mut self, timeout: Duration) -> SegmentResult<FramePair> {
        (**self).acquire_frame_pair(timeout)
    }

    fn map_depth_to_color(
        &self,
        x: u32,
        y: u32,
        pixel: DepthPixel,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
    ) -> ColorPoint {
        (**self).map_depth_to_color(x, y, pixel, depth_format, color_format)
    }
}
