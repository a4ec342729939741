// SPDX-License-Identifier: GPL-3.0-only
// Shared types for depth sensor sources

//! Frame and format types shared by sensor sources and the pipeline

use crate::constants::depth_bits::{
    MAX_DEPTH_MM, MAX_PLAYER_INDEX, PLAYER_INDEX_BITMASK, PLAYER_INDEX_BITMASK_WIDTH,
};
use crate::errors::{SegmentError, SegmentResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Depth stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthFormat {
    pub width: u32,
    pub height: u32,
}

impl DepthFormat {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of depth samples in one frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for DepthFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} depth", self.width, self.height)
    }
}

/// Byte order of the color channels delivered by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChannelOrder {
    /// Blue, green, red, padding/alpha (Kinect color stream)
    #[default]
    Bgra,
    /// Blue, green, red
    Bgr,
    /// Red, green, blue, padding/alpha
    Rgba,
    /// Red, green, blue
    Rgb,
}

impl ChannelOrder {
    /// Bytes per pixel implied by the channel order
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            ChannelOrder::Bgra | ChannelOrder::Rgba => 4,
            ChannelOrder::Bgr | ChannelOrder::Rgb => 3,
        }
    }

    /// Whether the first channel is blue
    pub fn is_bgr(&self) -> bool {
        matches!(self, ChannelOrder::Bgra | ChannelOrder::Bgr)
    }
}

/// Color stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorFormat {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: u32,
    pub channel_order: ChannelOrder,
}

impl ColorFormat {
    pub fn new(width: u32, height: u32, channel_order: ChannelOrder) -> Self {
        Self {
            width,
            height,
            bytes_per_pixel: channel_order.bytes_per_pixel(),
            channel_order,
        }
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel as usize
    }

    /// Bytes in one frame
    pub fn frame_len(&self) -> usize {
        self.stride() * self.height as usize
    }

    /// Check whether a mapped point lies inside the color grid
    pub fn contains(&self, point: ColorPoint) -> bool {
        point.x >= 0 && point.y >= 0 && (point.x as u32) < self.width && (point.y as u32) < self.height
    }
}

impl std::fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {:?} ({} bytes/pixel)",
            self.width, self.height, self.channel_order, self.bytes_per_pixel
        )
    }
}

/// A point in the color grid, possibly outside its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorPoint {
    pub x: i32,
    pub y: i32,
}

impl ColorPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One raw depth sample: distance in the high bits, player index in the low bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthPixel(pub u16);

impl DepthPixel {
    /// Pack a distance and player index into a raw sample
    ///
    /// Values that do not fit their field are clamped.
    pub fn from_parts(depth_mm: u16, player_index: u8) -> Self {
        let depth = depth_mm.min(MAX_DEPTH_MM);
        let player = player_index.min(MAX_PLAYER_INDEX) as u16;
        DepthPixel((depth << PLAYER_INDEX_BITMASK_WIDTH) | player)
    }

    /// Tracked player owning this pixel (0 = nobody)
    pub fn player_index(&self) -> u8 {
        (self.0 & PLAYER_INDEX_BITMASK) as u8
    }

    /// Distance in millimeters
    pub fn depth_mm(&self) -> u16 {
        self.0 >> PLAYER_INDEX_BITMASK_WIDTH
    }

    pub fn has_player(&self) -> bool {
        self.player_index() != 0
    }

    pub fn raw(&self) -> u16 {
        self.0
    }
}

/// A depth frame: row-major raw samples
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub format: DepthFormat,
    pub pixels: Arc<[u16]>,
    /// Frame number assigned by the source
    pub sequence: u64,
}

impl DepthFrame {
    pub fn new(format: DepthFormat, pixels: impl Into<Arc<[u16]>>, sequence: u64) -> Self {
        Self {
            format,
            pixels: pixels.into(),
            sequence,
        }
    }

    /// Check that the sample count matches the declared format
    pub fn validate(&self) -> SegmentResult<()> {
        let expected = self.format.pixel_count();
        if self.pixels.len() < expected {
            return Err(SegmentError::InvalidFrame(format!(
                "depth frame has {} samples, {} expects {}",
                self.pixels.len(),
                self.format,
                expected
            )));
        }
        Ok(())
    }

    /// Sample at a depth-grid coordinate
    pub fn pixel(&self, x: u32, y: u32) -> DepthPixel {
        DepthPixel(self.pixels[y as usize * self.format.width as usize + x as usize])
    }
}

/// A color frame: row-major packed pixels
#[derive(Debug, Clone)]
pub struct ColorFrame {
    pub format: ColorFormat,
    pub data: Arc<[u8]>,
    pub sequence: u64,
}

impl ColorFrame {
    pub fn new(format: ColorFormat, data: impl Into<Arc<[u8]>>, sequence: u64) -> Self {
        Self {
            format,
            data: data.into(),
            sequence,
        }
    }

    /// Check that the byte count matches the declared format
    pub fn validate(&self) -> SegmentResult<()> {
        let expected = self.format.frame_len();
        if self.data.len() < expected {
            return Err(SegmentError::InvalidFrame(format!(
                "color frame has {} bytes, {} expects {}",
                self.data.len(),
                self.format,
                expected
            )));
        }
        Ok(())
    }

    /// First three channels at a color-grid point, in sensor order
    ///
    /// Returns `None` for points outside the grid.
    pub fn sample(&self, point: ColorPoint) -> Option<[u8; 3]> {
        if !self.format.contains(point) {
            return None;
        }
        let offset =
            point.y as usize * self.format.stride() + point.x as usize * self.format.bytes_per_pixel as usize;
        let px = self.data.get(offset..offset + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Scoped handle on a pair of frames borrowed from the sensor driver
///
/// The release callback runs exactly once, when the lease is dropped.
pub struct FrameLease {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl FrameLease {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Lease with nothing to return (owned frame data)
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for FrameLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLease")
            .field("pending_release", &self.release.is_some())
            .finish()
    }
}

/// Depth and color frames acquired for the same time step
#[derive(Debug)]
pub struct FramePair {
    pub depth: DepthFrame,
    pub color: ColorFrame,
    pub lease: FrameLease,
}

impl FramePair {
    pub fn new(depth: DepthFrame, color: ColorFrame, lease: FrameLease) -> Self {
        Self { depth, color, lease }
    }

    pub fn validate(&self) -> SegmentResult<()> {
        self.depth.validate()?;
        self.color.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_depth_pixel_split() {
        let px = DepthPixel::from_parts(3000, 5);
        assert_eq!(px.raw(), (3000 << 3) | 5);
        assert_eq!(px.depth_mm(), 3000);
        assert_eq!(px.player_index(), 5);
        assert!(px.has_player());

        let room = DepthPixel::from_parts(1000, 0);
        assert!(!room.has_player());
        assert_eq!(room.depth_mm(), 1000);
    }

    #[test]
    fn test_depth_pixel_clamps_fields() {
        let px = DepthPixel::from_parts(u16::MAX, 200);
        assert_eq!(px.depth_mm(), 8191);
        assert_eq!(px.player_index(), 7);
    }

    #[test]
    fn test_color_format_contains() {
        let format = ColorFormat::new(4, 2, ChannelOrder::Bgra);
        assert!(format.contains(ColorPoint::new(0, 0)));
        assert!(format.contains(ColorPoint::new(3, 1)));
        assert!(!format.contains(ColorPoint::new(-1, 0)));
        assert!(!format.contains(ColorPoint::new(4, 0)));
        assert!(!format.contains(ColorPoint::new(0, 2)));
    }

    #[test]
    fn test_color_sample_respects_bytes_per_pixel() {
        let format = ColorFormat::new(2, 1, ChannelOrder::Bgr);
        let frame = ColorFrame::new(format, vec![1u8, 2, 3, 4, 5, 6], 0);
        assert_eq!(frame.sample(ColorPoint::new(1, 0)), Some([4, 5, 6]));
        assert_eq!(frame.sample(ColorPoint::new(2, 0)), None);
    }

    #[test]
    fn test_short_frames_are_invalid() {
        let depth = DepthFrame::new(DepthFormat::new(2, 2), vec![0u16; 3], 0);
        assert!(matches!(depth.validate(), Err(SegmentError::InvalidFrame(_))));

        let color = ColorFrame::new(ColorFormat::new(2, 2, ChannelOrder::Bgra), vec![0u8; 15], 0);
        assert!(matches!(color.validate(), Err(SegmentError::InvalidFrame(_))));
    }

    #[test]
    fn test_lease_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let lease = FrameLease::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(lease);
        assert_eq!(released.load(Ordering::SeqCst), 1);

        drop(FrameLease::detached());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
