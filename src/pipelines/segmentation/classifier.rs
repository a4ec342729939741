// SPDX-License-Identifier: GPL-3.0-only

//! Per-pixel layer decision

use crate::backends::sensor::DepthPixel;
use crate::constants::layers::LAYER_COUNT;
use serde::{Deserialize, Serialize};

/// Output layer a depth pixel belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// No tracked occupant
    Room,
    /// Occupant at or nearer than the threshold
    NearOccupant,
    /// Occupant farther than the threshold
    FarOccupant,
}

impl Layer {
    pub const ALL: [Layer; LAYER_COUNT] = [Layer::Room, Layer::NearOccupant, Layer::FarOccupant];

    /// Short name used in file names and logs
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Room => "room",
            Layer::NearOccupant => "near",
            Layer::FarOccupant => "far",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify one raw depth sample against a threshold in millimeters
///
/// Pixels without a player index are room. Occupant pixels exactly at the
/// threshold count as near.
#[inline]
pub fn classify(pixel: DepthPixel, threshold_mm: u32) -> Layer {
    if !pixel.has_player() {
        Layer::Room
    } else if u32::from(pixel.depth_mm()) > threshold_mm {
        Layer::FarOccupant
    } else {
        Layer::NearOccupant
    }
}
