// SPDX-License-Identifier: GPL-3.0-only

//! Layer conversion and PNG export
//!
//! Layers keep the sensor's channel order (BGRA for the reference sensor);
//! these helpers swizzle to RGBA for the `image` crate.

use crate::backends::sensor::ChannelOrder;
use crate::errors::{SegmentError, SegmentResult};
use crate::pipelines::segmentation::{Layer, LayerBuffer, LayerSet};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stack order for flattening: room at the bottom, near occupant on top
pub const STACK_ORDER: [Layer; 3] = [Layer::Room, Layer::FarOccupant, Layer::NearOccupant];

/// Convert layer bytes in sensor channel order to RGBA
pub fn layer_to_rgba(buffer: &LayerBuffer, order: ChannelOrder) -> Vec<u8> {
    let mut rgba = buffer.as_bytes().to_vec();
    if order.is_bgr() {
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
    }
    rgba
}

/// Convert a layer to an RGBA image
pub fn layer_to_rgba_image(buffer: &LayerBuffer, order: ChannelOrder) -> SegmentResult<RgbaImage> {
    RgbaImage::from_raw(buffer.width(), buffer.height(), layer_to_rgba(buffer, order)).ok_or_else(
        || {
            SegmentError::InvalidFrame(format!(
                "layer buffer does not match {}x{}",
                buffer.width(),
                buffer.height()
            ))
        },
    )
}

/// Flatten the three layers into one RGBA image
///
/// Opaque pixels of upper layers cover lower ones; see [`STACK_ORDER`].
pub fn flatten_layers(layers: &LayerSet, order: ChannelOrder) -> SegmentResult<RgbaImage> {
    let mut flat = layer_to_rgba_image(layers.get(STACK_ORDER[0]), order)?;
    for layer in &STACK_ORDER[1..] {
        let upper = layer_to_rgba_image(layers.get(*layer), order)?;
        for (dst, src) in flat.pixels_mut().zip(upper.pixels()) {
            if src.0[3] != 0 {
                *dst = *src;
            }
        }
    }
    Ok(flat)
}

/// Save each layer as `<stem>_<layer>.png` in `dir`
///
/// Returns the written paths in room, near, far order.
pub fn save_layers_png(
    layers: &LayerSet,
    order: ChannelOrder,
    dir: &Path,
    stem: &str,
) -> SegmentResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(Layer::ALL.len());
    for layer in Layer::ALL {
        let path = dir.join(format!("{}_{}.png", stem, layer.name()));
        layer_to_rgba_image(layers.get(layer), order)?.save(&path)?;
        paths.push(path);
    }

    info!(dir = %dir.display(), stem, "Layers saved");
    Ok(paths)
}
