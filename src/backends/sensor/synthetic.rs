// SPDX-License-Identifier: GPL-3.0-only

//! In-process frame source
//!
//! Replays a script of frame pairs and timeouts, then (optionally) renders a
//! procedural scene with one occupant walking back and forth in front of a
//! wall. Tracks how many acquired frame pairs are still held so tests can
//! check that every pass hands its frames back.

use super::registration::{DepthRegistration, IdentityRegistration};
use super::types::*;
use super::FrameSource;
use crate::errors::{SegmentError, SegmentResult};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// One scripted acquisition result
#[derive(Debug, Clone)]
enum ScriptStep {
    Frame { depth: Vec<u16>, color: Vec<u8> },
    Timeout,
}

/// Counts frame pairs handed out and returned
#[derive(Debug, Clone, Default)]
pub struct LeaseCounter {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl LeaseCounter {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Frame pairs acquired but not yet released
    pub fn outstanding(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }

    fn lease(&self) -> FrameLease {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let released = Arc::clone(&self.released);
        FrameLease::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Procedural scene: a wall, and one occupant moving across it
///
/// The occupant sweeps horizontally and walks between `near_mm` and `far_mm`
/// over `period` frames (an odd period is rounded down).
#[derive(Debug, Clone, Copy)]
pub struct OccupantScene {
    pub wall_mm: u16,
    pub near_mm: u16,
    pub far_mm: u16,
    pub player_index: u8,
    pub period: u64,
}

impl Default for OccupantScene {
    fn default() -> Self {
        Self {
            wall_mm: 3800,
            near_mm: 1500,
            far_mm: 3400,
            player_index: 1,
            period: 120,
        }
    }
}

impl OccupantScene {
    /// Occupant distance at a frame number (triangle wave)
    pub fn occupant_depth(&self, sequence: u64) -> u16 {
        let half = (self.period / 2).max(1);
        let phase = sequence % (2 * half);
        let t = if phase < half { phase } else { 2 * half - phase };
        let span = self.far_mm.saturating_sub(self.near_mm) as u64;
        let depth = self.near_mm as u64 + span * t / half;
        depth.min(self.far_mm.max(self.near_mm) as u64) as u16
    }

    fn render(
        &self,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
        sequence: u64,
    ) -> (Vec<u16>, Vec<u8>) {
        let (w, h) = (depth_format.width, depth_format.height);
        let body_w = (w / 6).max(1);
        let body_h = (h * 2 / 3).max(1);
        let travel = w.saturating_sub(body_w).max(1) as u64;
        let left = ((sequence * 3) % travel) as u32;
        let top = h.saturating_sub(body_h);
        let occupant_mm = self.occupant_depth(sequence);

        let mut depth = Vec::with_capacity(depth_format.pixel_count());
        for y in 0..h {
            for x in 0..w {
                let inside = x >= left && x < left + body_w && y >= top;
                depth.push(if inside {
                    DepthPixel::from_parts(occupant_mm, self.player_index).raw()
                } else {
                    DepthPixel::from_parts(self.wall_mm, 0).raw()
                });
            }
        }

        // Color: wall gradient with the occupant in a flat tone, in depth-grid
        // coordinates scaled to the color grid
        let bpp = color_format.bytes_per_pixel as usize;
        let mut color = vec![0u8; color_format.frame_len()];
        for cy in 0..color_format.height {
            for cx in 0..color_format.width {
                let dx = cx * w / color_format.width.max(1);
                let dy = cy * h / color_format.height.max(1);
                let inside = dx >= left && dx < left + body_w && dy >= top;
                let (r, g, b) = if inside {
                    (200u8, 90u8, 60u8)
                } else {
                    (
                        (cx * 255 / color_format.width.max(1)) as u8,
                        (cy * 255 / color_format.height.max(1)) as u8,
                        160u8,
                    )
                };
                let offset = cy as usize * color_format.stride() + cx as usize * bpp;
                let px = if color_format.channel_order.is_bgr() {
                    [b, g, r]
                } else {
                    [r, g, b]
                };
                color[offset..offset + 3].copy_from_slice(&px);
                if bpp == 4 {
                    color[offset + 3] = 0;
                }
            }
        }

        (depth, color)
    }
}

/// Frame source backed by scripted or procedurally rendered frames
pub struct SyntheticSource {
    name: String,
    connected: bool,
    depth_format: DepthFormat,
    color_format: ColorFormat,
    registration: Box<dyn DepthRegistration>,
    script: VecDeque<ScriptStep>,
    scene: Option<OccupantScene>,
    sequence: u64,
    leases: LeaseCounter,
}

impl SyntheticSource {
    /// Create a connected source with identity registration and an empty script
    pub fn new(depth_format: DepthFormat, color_format: ColorFormat) -> Self {
        Self {
            name: "Synthetic depth sensor".to_string(),
            connected: true,
            depth_format,
            color_format,
            registration: Box::new(IdentityRegistration),
            script: VecDeque::new(),
            scene: None,
            sequence: 0,
            leases: LeaseCounter::default(),
        }
    }

    /// Source that reports no connected sensor
    pub fn disconnected(depth_format: DepthFormat, color_format: ColorFormat) -> Self {
        Self {
            connected: false,
            ..Self::new(depth_format, color_format)
        }
    }

    pub fn with_registration<R: DepthRegistration + 'static>(mut self, registration: R) -> Self {
        self.registration = Box::new(registration);
        self
    }

    /// Render this scene once the script runs out
    pub fn with_scene(mut self, scene: OccupantScene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Queue a frame pair (raw depth samples, packed color bytes)
    pub fn push_frame(&mut self, depth: Vec<u16>, color: Vec<u8>) {
        self.script.push_back(ScriptStep::Frame { depth, color });
    }

    /// Queue an acquisition that times out
    pub fn push_timeout(&mut self) {
        self.script.push_back(ScriptStep::Timeout);
    }

    /// Simulate unplugging or replugging the sensor
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn leases(&self) -> LeaseCounter {
        self.leases.clone()
    }

    fn next_pair(&mut self, depth: Vec<u16>, color: Vec<u8>) -> FramePair {
        let sequence = self.sequence;
        self.sequence += 1;
        FramePair::new(
            DepthFrame::new(self.depth_format, depth, sequence),
            ColorFrame::new(self.color_format, color, sequence),
            self.leases.lease(),
        )
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.connected
    }

    fn depth_format(&self) -> DepthFormat {
        self.depth_format
    }

    fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    fn acquire_frame_pair(&mut self, timeout: Duration) -> SegmentResult<FramePair> {
        if !self.connected {
            return Err(SegmentError::DeviceNotFound(self.name.clone()));
        }

        match self.script.pop_front() {
            Some(ScriptStep::Frame { depth, color }) => Ok(self.next_pair(depth, color)),
            Some(ScriptStep::Timeout) => {
                debug!(sequence = self.sequence, "Scripted frame timeout");
                Err(SegmentError::FrameTimeout(timeout))
            }
            None => match self.scene {
                Some(scene) => {
                    let (depth, color) =
                        scene.render(&self.depth_format, &self.color_format, self.sequence);
                    Ok(self.next_pair(depth, color))
                }
                None => Err(SegmentError::FrameTimeout(timeout)),
            },
        }
    }

    fn map_depth_to_color(
        &self,
        x: u32,
        y: u32,
        pixel: DepthPixel,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
    ) -> ColorPoint {
        self.registration.map(x, y, pixel, depth_format, color_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> (DepthFormat, ColorFormat) {
        (
            DepthFormat::new(12, 6),
            ColorFormat::new(24, 12, ChannelOrder::Bgra),
        )
    }

    #[test]
    fn test_script_replays_in_order() {
        let (d, c) = formats();
        let mut source = SyntheticSource::new(d, c);
        source.push_timeout();
        source.push_frame(vec![0; d.pixel_count()], vec![0; c.frame_len()]);

        let timeout = Duration::from_millis(100);
        assert_eq!(
            source.acquire_frame_pair(timeout).unwrap_err(),
            SegmentError::FrameTimeout(timeout)
        );
        let pair = source.acquire_frame_pair(timeout).unwrap();
        assert_eq!(pair.depth.sequence, 0);

        // Script exhausted, no scene
        assert!(source.acquire_frame_pair(timeout).is_err());
    }

    #[test]
    fn test_leases_are_counted() {
        let (d, c) = formats();
        let mut source = SyntheticSource::new(d, c).with_scene(OccupantScene::default());
        let leases = source.leases();

        let pair = source.acquire_frame_pair(Duration::from_millis(10)).unwrap();
        assert_eq!(leases.outstanding(), 1);
        drop(pair);
        assert_eq!(leases.outstanding(), 0);
        assert_eq!(leases.acquired(), 1);
        assert_eq!(leases.released(), 1);
    }

    #[test]
    fn test_disconnected_source() {
        let (d, c) = formats();
        let mut source = SyntheticSource::disconnected(d, c);
        assert!(!source.is_available());
        assert!(matches!(
            source.acquire_frame_pair(Duration::from_millis(10)),
            Err(SegmentError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_scene_frames_are_valid_and_contain_occupant() {
        let (d, c) = formats();
        let mut source = SyntheticSource::new(d, c).with_scene(OccupantScene::default());
        let pair = source.acquire_frame_pair(Duration::from_millis(10)).unwrap();
        pair.validate().unwrap();

        let occupants = pair
            .depth
            .pixels
            .iter()
            .filter(|&&raw| DepthPixel(raw).has_player())
            .count();
        assert!(occupants > 0);
        assert!(occupants < d.pixel_count());
    }

    #[test]
    fn test_occupant_depth_oscillates() {
        let scene = OccupantScene::default();
        assert_eq!(scene.occupant_depth(0), scene.near_mm);
        assert_eq!(scene.occupant_depth(scene.period / 2), scene.far_mm);
        assert_eq!(scene.occupant_depth(scene.period), scene.near_mm);
    }

    #[test]
    fn test_occupant_depth_stays_in_range_for_odd_period() {
        let scene = OccupantScene {
            period: 5,
            ..OccupantScene::default()
        };
        for sequence in 0..20 {
            let d = scene.occupant_depth(sequence);
            assert!(d >= scene.near_mm && d <= scene.far_mm, "frame {}: {}", sequence, d);
        }
        assert_eq!(scene.occupant_depth(2), scene.far_mm);
        assert_eq!(scene.occupant_depth(4), scene.near_mm);
    }

    #[test]
    fn test_occupant_depth_near_u16_limit() {
        let scene = OccupantScene {
            near_mm: 30000,
            far_mm: 60000,
            period: 3,
            ..OccupantScene::default()
        };
        assert_eq!(scene.occupant_depth(0), 30000);
        assert_eq!(scene.occupant_depth(1), 60000);
        assert_eq!(scene.occupant_depth(2), 30000);
    }

    #[test]
    fn test_outstanding_never_underflows() {
        let leases = LeaseCounter::default();
        // A release observed before its acquire
        leases.released.fetch_add(1, Ordering::SeqCst);
        assert_eq!(leases.outstanding(), 0);
    }
}
