// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing pipelines
//!
//! # Modules
//!
//! - [`segmentation`]: splits each depth+color frame pair into room,
//!   near-occupant and far-occupant layers

pub mod segmentation;

pub use segmentation::{
    FrameOutcome, FrameReport, PipelineState, PipelineStats, SegmentationPipeline, SkipReason,
};
