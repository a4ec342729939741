// SPDX-License-Identifier: GPL-3.0-only

//! Depth Layers - person/room segmentation for depth+color sensors
//!
//! Every depth pixel of a frame pair is mapped into the color image,
//! classified as room, near occupant or far occupant (by a distance
//! threshold), and its color is written into the matching output layer.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Frame source abstraction, registration, synthetic source
//! - [`pipelines`]: Per-frame segmentation pipeline and processing loop
//! - [`media`]: Layer export (RGBA conversion, PNG)
//! - [`config`]: Segmentation settings
//!
//! # Example
//!
//! ```no_run
//! use depth_layers::backends::sensor::{
//!     ChannelOrder, ColorFormat, DepthFormat, OccupantScene, SyntheticSource,
//! };
//! use depth_layers::{SegmentationConfig, SegmentationPipeline};
//!
//! let source = SyntheticSource::new(
//!     DepthFormat::new(640, 480),
//!     ColorFormat::new(640, 480, ChannelOrder::Bgra),
//! )
//! .with_scene(OccupantScene::default());
//!
//! let mut pipeline = SegmentationPipeline::new(source, SegmentationConfig::default())?;
//! pipeline.process_frame()?;
//! let _room = &pipeline.layers().room;
//! # Ok::<(), depth_layers::SegmentError>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;

// Re-export commonly used types
pub use backends::sensor::FrameSource;
pub use config::SegmentationConfig;
pub use errors::{SegmentError, SegmentResult};
pub use pipelines::segmentation::{Layer, LayerSet, LayerSink, SegmentationLoop, ThresholdHandle};
pub use pipelines::{FrameOutcome, FrameReport, SegmentationPipeline};
