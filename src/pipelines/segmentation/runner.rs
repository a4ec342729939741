// SPDX-License-Identifier: GPL-3.0-only

//! Background processing loop and output sink

use super::{
    FrameOutcome, FrameReport, LayerSet, PipelineStats, SegmentationPipeline, ThresholdHandle,
};
use crate::backends::sensor::{CaptureLoopController, FrameSource, LoopAction};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// Receives the layers after every published frame
///
/// Layers are only borrowed for the duration of the call; sinks that keep
/// them must copy.
pub trait LayerSink: Send {
    fn publish(&mut self, layers: &LayerSet, report: &FrameReport);
}

impl<F> LayerSink for F
where
    F: FnMut(&LayerSet, &FrameReport) + Send,
{
    fn publish(&mut self, layers: &LayerSet, report: &FrameReport) {
        self(layers, report)
    }
}

/// Runs a pipeline on its own thread, one frame per tick
///
/// The loop ends when stopped, dropped, or when the sensor goes away.
pub struct SegmentationLoop {
    controller: CaptureLoopController,
    threshold: ThresholdHandle,
    stats: Arc<Mutex<PipelineStats>>,
}

impl SegmentationLoop {
    /// Start processing at `interval` (zero runs frames back to back)
    pub fn start<S, K>(pipeline: SegmentationPipeline<S>, interval: Duration, sink: K) -> Self
    where
        S: FrameSource + 'static,
        K: LayerSink + 'static,
    {
        let threshold = pipeline.threshold();
        let stats = Arc::new(Mutex::new(pipeline.stats()));
        let stats_clone = Arc::clone(&stats);

        let mut pipeline = pipeline;
        let mut sink = sink;
        let controller = CaptureLoopController::start("segmentation", interval, move || {
            let result = pipeline.process_frame();

            if let Ok(mut shared) = stats_clone.lock() {
                *shared = pipeline.stats();
            }

            match result {
                Ok(FrameOutcome::Published(report)) => {
                    sink.publish(pipeline.layers(), &report);
                    LoopAction::Continue
                }
                Ok(FrameOutcome::Skipped(_)) => LoopAction::Continue,
                Err(e) => {
                    warn!(error = %e, "Stopping segmentation loop");
                    LoopAction::Stop
                }
            }
        });

        Self {
            controller,
            threshold,
            stats,
        }
    }

    /// Handle for adjusting the threshold while the loop runs
    pub fn threshold(&self) -> ThresholdHandle {
        self.threshold.clone()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Stop the loop and wait for the current frame to finish
    pub fn stop(mut self) -> PipelineStats {
        self.controller.stop();
        self.stats()
    }
}
