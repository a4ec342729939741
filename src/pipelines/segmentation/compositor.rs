// SPDX-License-Identifier: GPL-3.0-only

//! Output layer buffers and per-frame compositing
//!
//! Each frame is composited into a scratch copy of the layers and swapped in
//! as a whole when the frame is done, so readers of the published layers
//! never see a half-written frame.

use super::classifier::Layer;
use crate::constants::layers::{BYTES_PER_PIXEL, OPAQUE_ALPHA};
use serde::Serialize;

/// One output image, 4 bytes per pixel, same size as the depth grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LayerBuffer {
    /// Transparent black buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at a depth-grid coordinate
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let px = &self.data[offset..offset + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Write three color channels plus opaque alpha at a linear pixel index
    #[inline]
    fn write(&mut self, pixel_index: usize, channels: [u8; 3]) {
        let offset = pixel_index * BYTES_PER_PIXEL;
        self.data[offset..offset + 3].copy_from_slice(&channels);
        self.data[offset + 3] = OPAQUE_ALPHA;
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn copy_from(&mut self, other: &LayerBuffer) {
        self.data.copy_from_slice(&other.data);
    }
}

/// The three output layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSet {
    pub room: LayerBuffer,
    pub near_occupant: LayerBuffer,
    pub far_occupant: LayerBuffer,
}

impl LayerSet {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            room: LayerBuffer::new(width, height),
            near_occupant: LayerBuffer::new(width, height),
            far_occupant: LayerBuffer::new(width, height),
        }
    }

    pub fn get(&self, layer: Layer) -> &LayerBuffer {
        match layer {
            Layer::Room => &self.room,
            Layer::NearOccupant => &self.near_occupant,
            Layer::FarOccupant => &self.far_occupant,
        }
    }

    fn get_mut(&mut self, layer: Layer) -> &mut LayerBuffer {
        match layer {
            Layer::Room => &mut self.room,
            Layer::NearOccupant => &mut self.near_occupant,
            Layer::FarOccupant => &mut self.far_occupant,
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut LayerBuffer> {
        [
            &mut self.room,
            &mut self.near_occupant,
            &mut self.far_occupant,
        ]
        .into_iter()
    }
}

/// Pixels written per layer in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LayerCounts {
    pub room: usize,
    pub near_occupant: usize,
    pub far_occupant: usize,
    /// Pixels whose color coordinate fell outside the color grid
    pub unmapped: usize,
}

impl LayerCounts {
    pub fn get(&self, layer: Layer) -> usize {
        match layer {
            Layer::Room => self.room,
            Layer::NearOccupant => self.near_occupant,
            Layer::FarOccupant => self.far_occupant,
        }
    }

    /// Depth pixels processed, mapped or not
    pub fn total(&self) -> usize {
        self.room + self.near_occupant + self.far_occupant + self.unmapped
    }

    fn bump(&mut self, layer: Layer) {
        match layer {
            Layer::Room => self.room += 1,
            Layer::NearOccupant => self.near_occupant += 1,
            Layer::FarOccupant => self.far_occupant += 1,
        }
    }
}

/// Double-buffered layer compositor
#[derive(Debug)]
pub struct Compositor {
    published: LayerSet,
    scratch: LayerSet,
    clear_each_frame: bool,
    counts: LayerCounts,
}

impl Compositor {
    pub fn new(width: u32, height: u32, clear_each_frame: bool) -> Self {
        Self {
            published: LayerSet::new(width, height),
            scratch: LayerSet::new(width, height),
            clear_each_frame,
            counts: LayerCounts::default(),
        }
    }

    /// Layers from the last published frame
    pub fn layers(&self) -> &LayerSet {
        &self.published
    }

    /// Prepare the scratch layers for a new frame
    ///
    /// Scratch starts as a copy of the published layers, or transparent black
    /// when clearing every frame.
    pub fn begin_frame(&mut self) {
        if self.clear_each_frame {
            self.scratch.iter_mut().for_each(LayerBuffer::clear);
        } else {
            self.scratch.room.copy_from(&self.published.room);
            self.scratch.near_occupant.copy_from(&self.published.near_occupant);
            self.scratch.far_occupant.copy_from(&self.published.far_occupant);
        }
        self.counts = LayerCounts::default();
    }

    /// Write a color sample into one layer at a depth-grid pixel index
    #[inline]
    pub fn write(&mut self, layer: Layer, pixel_index: usize, channels: [u8; 3]) {
        self.scratch.get_mut(layer).write(pixel_index, channels);
        self.counts.bump(layer);
    }

    /// Record a pixel with no valid color sample
    #[inline]
    pub fn skip(&mut self) {
        self.counts.unmapped += 1;
    }

    /// Swap the finished scratch layers in and return the frame's counts
    pub fn publish(&mut self) -> LayerCounts {
        std::mem::swap(&mut self.published, &mut self.scratch);
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_forces_opaque_alpha() {
        let mut compositor = Compositor::new(2, 1, false);
        compositor.begin_frame();
        compositor.write(Layer::Room, 1, [10, 20, 30]);
        let counts = compositor.publish();

        assert_eq!(counts.room, 1);
        assert_eq!(compositor.layers().room.pixel(1, 0), Some([10, 20, 30, 255]));
        assert_eq!(compositor.layers().room.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_scratch_is_invisible_until_publish() {
        let mut compositor = Compositor::new(1, 1, false);
        compositor.begin_frame();
        compositor.write(Layer::FarOccupant, 0, [1, 2, 3]);
        assert_eq!(compositor.layers().far_occupant.pixel(0, 0), Some([0, 0, 0, 0]));

        compositor.publish();
        assert_eq!(
            compositor.layers().far_occupant.pixel(0, 0),
            Some([1, 2, 3, 255])
        );
    }

    #[test]
    fn test_unwritten_pixels_keep_previous_frame() {
        let mut compositor = Compositor::new(2, 1, false);
        compositor.begin_frame();
        compositor.write(Layer::Room, 0, [9, 9, 9]);
        compositor.write(Layer::NearOccupant, 1, [7, 7, 7]);
        compositor.publish();

        // Next frame only touches pixel 1 of the room layer
        compositor.begin_frame();
        compositor.write(Layer::Room, 1, [5, 5, 5]);
        compositor.skip();
        let counts = compositor.publish();

        let layers = compositor.layers();
        assert_eq!(layers.room.pixel(0, 0), Some([9, 9, 9, 255]));
        assert_eq!(layers.room.pixel(1, 0), Some([5, 5, 5, 255]));
        assert_eq!(layers.near_occupant.pixel(1, 0), Some([7, 7, 7, 255]));
        assert_eq!(counts.unmapped, 1);
        assert_eq!(counts.get(Layer::Room), 1);
        assert_eq!(counts.get(Layer::NearOccupant), 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_clear_each_frame_drops_stale_pixels() {
        let mut compositor = Compositor::new(2, 1, true);
        compositor.begin_frame();
        compositor.write(Layer::Room, 0, [9, 9, 9]);
        compositor.publish();

        compositor.begin_frame();
        compositor.write(Layer::NearOccupant, 0, [1, 1, 1]);
        compositor.publish();

        let layers = compositor.layers();
        assert_eq!(layers.room.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(layers.near_occupant.pixel(0, 0), Some([1, 1, 1, 255]));
    }

    #[test]
    fn test_pixel_out_of_range() {
        let buffer = LayerBuffer::new(2, 2);
        assert_eq!(buffer.stride(), 8);
        assert_eq!(buffer.as_bytes().len(), 16);
        assert_eq!(buffer.pixel(2, 0), None);
        assert_eq!(buffer.pixel(0, 2), None);
    }
}
