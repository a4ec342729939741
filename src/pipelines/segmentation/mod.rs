// SPDX-License-Identifier: GPL-3.0-only

//! Room / near-occupant / far-occupant layer segmentation
//!
//! One pass per frame pair:
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐   ┌────────────┐   ┌──────┐
//! │ FrameSource │──▶│ Depth→Color  │──▶│ Classifier │──▶│ Compositor │──▶│ Sink │
//! │ (acquire)   │   │ registration │   │ (threshold)│   │ (3 layers) │   │      │
//! └─────────────┘   └──────────────┘   └────────────┘   └────────────┘   └──────┘
//! ```
//!
//! Frame state machine:
//!
//! ```text
//! Idle ──▶ FrameAcquired ──▶ Classified ──▶ Published ──▶ Idle
//!   │            │
//!   │            └── invalid frame: skip, back to Idle
//!   ├── timeout: skip, back to Idle
//!   └── sensor lost ──▶ SensorUnavailable (terminal)
//! ```
//!
//! Nothing carries over between frames except the published layers and the
//! shared threshold.

pub mod classifier;
pub mod compositor;
pub mod runner;
pub mod threshold;

pub use classifier::{Layer, classify};
pub use compositor::{Compositor, LayerBuffer, LayerCounts, LayerSet};
pub use runner::{LayerSink, SegmentationLoop};
pub use threshold::ThresholdHandle;

use crate::backends::sensor::{ColorFormat, DepthFormat, FramePair, FrameSource};
use crate::config::SegmentationConfig;
use crate::constants::timing::FRAME_LOG_INTERVAL;
use crate::errors::{SegmentError, SegmentResult};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Where the pipeline is in its per-frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PipelineState {
    #[default]
    Idle,
    FrameAcquired,
    Classified,
    Published,
    /// The sensor is gone; no further frames are processed
    SensorUnavailable,
}

/// Why a frame was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Depth or color frame missed the acquisition timeout
    Timeout,
    /// Frame data did not match the stream format
    InvalidFrame,
}

/// Distance readout for the status line
///
/// Holds the distance of the last occupant pixel processed in the frame, or
/// zero when the frame had no occupant pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DepthReadout {
    pub depth_mm: u16,
}

impl std::fmt::Display for DepthReadout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Depth = {}", self.depth_mm)
    }
}

/// Summary of one published frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Sequence number of the depth frame
    pub frame_index: u64,
    /// Threshold snapshot used for the frame
    pub threshold: u32,
    pub readout: DepthReadout,
    pub counts: LayerCounts,
}

/// Result of one processing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Published(FrameReport),
    Skipped(SkipReason),
}

/// Frames published and skipped since the pipeline was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PipelineStats {
    pub published: u64,
    pub skipped: u64,
}

/// Per-frame segmentation over a frame source
pub struct SegmentationPipeline<S: FrameSource> {
    source: S,
    config: SegmentationConfig,
    threshold: ThresholdHandle,
    depth_format: DepthFormat,
    color_format: ColorFormat,
    compositor: Compositor,
    state: PipelineState,
    stats: PipelineStats,
}

impl<S: FrameSource> SegmentationPipeline<S> {
    /// Create a pipeline, allocating layers to the source's depth format
    ///
    /// # Returns
    /// * `Err(SegmentError::DeviceNotFound)` - The source has no sensor
    /// * `Err(SegmentError::InitializationFailed)` - Unusable stream formats
    /// * `Err(SegmentError::Config)` - Invalid settings
    pub fn new(source: S, config: SegmentationConfig) -> SegmentResult<Self> {
        config.validate()?;

        if !source.is_available() {
            warn!(source = %source.name(), "No connected depth sensor");
            return Err(SegmentError::DeviceNotFound(source.name().to_string()));
        }

        let depth_format = source.depth_format();
        let color_format = source.color_format();

        if depth_format.width == 0 || depth_format.height == 0 {
            return Err(SegmentError::InitializationFailed(format!(
                "zero-sized depth stream ({})",
                depth_format
            )));
        }
        if color_format.width == 0 || color_format.height == 0 {
            return Err(SegmentError::InitializationFailed(format!(
                "zero-sized color stream ({})",
                color_format
            )));
        }
        if !matches!(color_format.bytes_per_pixel, 3 | 4) {
            return Err(SegmentError::InitializationFailed(format!(
                "unsupported color layout ({})",
                color_format
            )));
        }

        info!(
            source = %source.name(),
            depth = %depth_format,
            color = %color_format,
            threshold = config.threshold,
            "Segmentation pipeline created"
        );

        Ok(Self {
            compositor: Compositor::new(
                depth_format.width,
                depth_format.height,
                config.clear_layers_each_frame,
            ),
            threshold: ThresholdHandle::new(config.threshold),
            source,
            config,
            depth_format,
            color_format,
            state: PipelineState::Idle,
            stats: PipelineStats::default(),
        })
    }

    /// Handle for changing the threshold from another thread
    pub fn threshold(&self) -> ThresholdHandle {
        self.threshold.clone()
    }

    /// Layers from the last published frame
    pub fn layers(&self) -> &LayerSet {
        self.compositor.layers()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
    }

    fn skip(&mut self, reason: SkipReason) -> FrameOutcome {
        self.stats.skipped += 1;
        self.transition(PipelineState::Idle);
        FrameOutcome::Skipped(reason)
    }

    /// Acquire, classify and publish one frame pair
    ///
    /// Timeouts and malformed frames skip the frame and leave the layers
    /// untouched. Losing the sensor is returned as an error and leaves the
    /// pipeline in `SensorUnavailable`.
    pub fn process_frame(&mut self) -> SegmentResult<FrameOutcome> {
        if self.state == PipelineState::SensorUnavailable {
            return Err(SegmentError::DeviceNotFound(self.source.name().to_string()));
        }

        let timeout = self.config.acquire_timeout();
        let pair = match self.source.acquire_frame_pair(timeout) {
            Ok(pair) => pair,
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "Skipping frame");
                let reason = match e {
                    SegmentError::FrameTimeout(_) => SkipReason::Timeout,
                    _ => SkipReason::InvalidFrame,
                };
                return Ok(self.skip(reason));
            }
            Err(e) => {
                warn!(error = %e, "Frame acquisition failed");
                self.transition(PipelineState::SensorUnavailable);
                return Err(e);
            }
        };
        self.transition(PipelineState::FrameAcquired);

        if let Err(e) = self.check_frame(&pair) {
            debug!(error = %e, "Skipping frame");
            return Ok(self.skip(SkipReason::InvalidFrame));
        }

        let threshold = self.threshold.get();
        let frame_index = pair.depth.sequence;
        let readout = self.composite(&pair, threshold);
        // Frames go back to the driver before the layers are handed out
        drop(pair);
        self.transition(PipelineState::Classified);

        let counts = self.compositor.publish();
        self.stats.published += 1;
        self.transition(PipelineState::Published);

        let report = FrameReport {
            frame_index,
            threshold,
            readout,
            counts,
        };

        if report.frame_index % FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = report.frame_index,
                threshold,
                room = report.counts.room,
                near = report.counts.near_occupant,
                far = report.counts.far_occupant,
                unmapped = report.counts.unmapped,
                "Frame published"
            );
        }

        self.transition(PipelineState::Idle);
        Ok(FrameOutcome::Published(report))
    }

    fn check_frame(&self, pair: &FramePair) -> SegmentResult<()> {
        if pair.depth.format != self.depth_format {
            return Err(SegmentError::InvalidFrame(format!(
                "depth frame is {}, stream is {}",
                pair.depth.format, self.depth_format
            )));
        }
        if pair.color.format != self.color_format {
            return Err(SegmentError::InvalidFrame(format!(
                "color frame is {}, stream is {}",
                pair.color.format, self.color_format
            )));
        }
        pair.validate()
    }

    /// Map, classify and write every depth pixel, row-major
    fn composite(&mut self, pair: &FramePair, threshold: u32) -> DepthReadout {
        let depth_format = &pair.depth.format;
        let color_format = &pair.color.format;
        let mut readout = DepthReadout::default();

        self.compositor.begin_frame();

        let mut pixel_index = 0usize;
        for y in 0..depth_format.height {
            for x in 0..depth_format.width {
                let pixel = pair.depth.pixel(x, y);
                let layer = classify(pixel, threshold);
                if pixel.has_player() {
                    readout.depth_mm = pixel.depth_mm();
                }

                let point = self
                    .source
                    .map_depth_to_color(x, y, pixel, depth_format, color_format);
                match pair.color.sample(point) {
                    Some(channels) => self.compositor.write(layer, pixel_index, channels),
                    None => self.compositor.skip(),
                }

                pixel_index += 1;
            }
        }

        readout
    }
}
