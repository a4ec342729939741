// SPDX-License-Identifier: GPL-3.0-only

//! Depth-to-color registration
//!
//! The depth and color sensors sit side by side, so a depth pixel sees the
//! scene from a slightly different point than the color pixel with the same
//! coordinates. Registration maps each depth pixel (and its distance) to the
//! color pixel looking at the same spot. Results may fall outside the color
//! grid; callers check with [`ColorFormat::contains`].

use super::types::{ColorFormat, ColorPoint, DepthFormat, DepthPixel};
use crate::errors::{SegmentError, SegmentResult};

/// Point returned when a depth pixel has no registration entry
pub const UNREGISTERED: ColorPoint = ColorPoint { x: -1, y: -1 };

/// Maps a depth-grid coordinate and its raw sample to a color-grid coordinate
pub trait DepthRegistration: Send + Sync {
    fn map(
        &self,
        x: u32,
        y: u32,
        pixel: DepthPixel,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
    ) -> ColorPoint;
}

/// Same coordinates in both grids
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRegistration;

impl DepthRegistration for IdentityRegistration {
    fn map(&self, x: u32, y: u32, _: DepthPixel, _: &DepthFormat, _: &ColorFormat) -> ColorPoint {
        ColorPoint::new(x as i32, y as i32)
    }
}

/// Resolution ratio plus a fixed pixel offset (in color-grid pixels)
///
/// Ignores parallax; good enough for sensors with a shared optical axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledRegistration {
    pub offset_x: i32,
    pub offset_y: i32,
}

impl ScaledRegistration {
    pub fn new(offset_x: i32, offset_y: i32) -> Self {
        Self { offset_x, offset_y }
    }
}

impl DepthRegistration for ScaledRegistration {
    fn map(
        &self,
        x: u32,
        y: u32,
        _: DepthPixel,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
    ) -> ColorPoint {
        if depth_format.width == 0 || depth_format.height == 0 {
            return UNREGISTERED;
        }
        let cx = x as i64 * color_format.width as i64 / depth_format.width as i64;
        let cy = y as i64 * color_format.height as i64 / depth_format.height as i64;
        ColorPoint::new(
            (cx as i32).saturating_add(self.offset_x),
            (cy as i32).saturating_add(self.offset_y),
        )
    }
}

/// Table-driven registration computed from device calibration
///
/// Each depth pixel has a base color position `[x_scaled, y]` where x is in
/// fixed point (`x_val_scale` units per pixel). A second table indexed by
/// distance in millimeters gives the horizontal parallax shift, also in fixed
/// point. Rows are offset by `target_offset`. Tables are built for a color
/// grid `base_color_width` pixels wide and scaled to the actual color grid.
#[derive(Debug, Clone)]
pub struct TableRegistration {
    /// Per depth pixel `[x_scaled, y]` base positions, row-major
    registration_table: Vec<[i32; 2]>,
    /// Horizontal shift indexed by distance in millimeters
    depth_to_rgb_shift: Vec<i32>,
    /// Row offset subtracted from the table y
    target_offset: u32,
    /// Fixed-point scale for x values (typically 256)
    x_val_scale: i32,
    /// Color width the tables were built for
    base_color_width: u32,
}

impl TableRegistration {
    /// Fixed-point scale used by Kinect calibration tables
    pub const DEFAULT_X_VAL_SCALE: i32 = 256;

    pub fn new(
        registration_table: Vec<[i32; 2]>,
        depth_to_rgb_shift: Vec<i32>,
        target_offset: u32,
        base_color_width: u32,
    ) -> SegmentResult<Self> {
        if registration_table.is_empty() {
            return Err(SegmentError::InitializationFailed(
                "registration table is empty".to_string(),
            ));
        }
        if depth_to_rgb_shift.is_empty() {
            return Err(SegmentError::InitializationFailed(
                "depth-to-color shift table is empty".to_string(),
            ));
        }
        if base_color_width == 0 {
            return Err(SegmentError::InitializationFailed(
                "registration base width is zero".to_string(),
            ));
        }
        Ok(Self {
            registration_table,
            depth_to_rgb_shift,
            target_offset,
            x_val_scale: Self::DEFAULT_X_VAL_SCALE,
            base_color_width,
        })
    }

    /// Build tables from a per-pixel base position and a per-distance shift
    ///
    /// `shift_px` returns the shift in whole color pixels for a distance.
    pub fn from_fn<B, S>(
        depth_format: &DepthFormat,
        max_depth_mm: u16,
        base_color_width: u32,
        target_offset: u32,
        base: B,
        shift_px: S,
    ) -> SegmentResult<Self>
    where
        B: Fn(u32, u32) -> (i32, i32),
        S: Fn(u16) -> i32,
    {
        let scale = Self::DEFAULT_X_VAL_SCALE;
        let mut table = Vec::with_capacity(depth_format.pixel_count());
        for y in 0..depth_format.height {
            for x in 0..depth_format.width {
                let (bx, by) = base(x, y);
                table.push([bx * scale, by + target_offset as i32]);
            }
        }
        let shifts = (0..=max_depth_mm).map(|mm| shift_px(mm) * scale).collect();

        Self::new(table, shifts, target_offset, base_color_width)
    }
}

impl DepthRegistration for TableRegistration {
    fn map(
        &self,
        x: u32,
        y: u32,
        pixel: DepthPixel,
        depth_format: &DepthFormat,
        color_format: &ColorFormat,
    ) -> ColorPoint {
        let reg_idx = y as usize * depth_format.width as usize + x as usize;
        let Some(reg) = self.registration_table.get(reg_idx) else {
            return UNREGISTERED;
        };

        // Distances beyond the shift table use its last entry
        let Some(&shift) = self
            .depth_to_rgb_shift
            .get(pixel.depth_mm() as usize)
            .or_else(|| self.depth_to_rgb_shift.last())
        else {
            return UNREGISTERED;
        };

        let x_base = (reg[0] + shift).div_euclid(self.x_val_scale);
        let y_base = reg[1] - self.target_offset as i32;

        // Scale from the table's color grid to the actual one
        let scale = color_format.width as f32 / self.base_color_width as f32;
        ColorPoint::new(
            (x_base as f32 * scale).floor() as i32,
            (y_base as f32 * scale).floor() as i32,
        )
    }
}
