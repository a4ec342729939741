// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::DEFAULT_THRESHOLD_MM;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// Shared near/far cutoff in millimeters
///
/// Clones share one value. A UI or config layer writes it; the pipeline takes
/// one snapshot per frame, so a change lands on the next frame at the latest.
#[derive(Debug, Clone)]
pub struct ThresholdHandle {
    value: Arc<AtomicU32>,
}

impl ThresholdHandle {
    pub fn new(threshold_mm: u32) -> Self {
        Self {
            value: Arc::new(AtomicU32::new(threshold_mm)),
        }
    }

    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    pub fn set(&self, threshold_mm: u32) {
        let previous = self.value.swap(threshold_mm, Ordering::AcqRel);
        if previous != threshold_mm {
            debug!(previous, threshold = threshold_mm, "Threshold changed");
        }
    }
}

impl Default for ThresholdHandle {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_MM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_value() {
        let ui = ThresholdHandle::default();
        let pipeline = ui.clone();
        assert_eq!(pipeline.get(), 2400);

        ui.set(3500);
        assert_eq!(pipeline.get(), 3500);
    }

    #[test]
    fn test_visible_across_threads() {
        let handle = ThresholdHandle::new(1000);
        let writer = handle.clone();
        std::thread::spawn(move || writer.set(1800))
            .join()
            .unwrap();
        assert_eq!(handle.get(), 1800);
    }
}
