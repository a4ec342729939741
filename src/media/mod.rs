// SPDX-License-Identifier: GPL-3.0-only

//! Output conversion for published layers
//!
//! - [`export`]: channel swizzling, layer flattening and PNG export

pub mod export;

pub use export::{flatten_layers, layer_to_rgba, layer_to_rgba_image, save_layers_png};
