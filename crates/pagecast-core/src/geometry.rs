//! Integer rectangles in page or viewport pixel space.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with integer pixel coordinates.
///
/// Field names are part of the persisted scenario format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering a whole `width`×`height` frame.
    #[inline]
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Create a rectangle from inclusive-exclusive corners.
    pub fn from_corners(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Center point.
    #[inline]
    pub fn center(self) -> DVec2 {
        DVec2::new(
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Area in pixels. Degenerate rectangles report 0.
    #[inline]
    pub fn area(self) -> i64 {
        if self.is_degenerate() {
            0
        } else {
            self.w as i64 * self.h as i64
        }
    }

    #[inline]
    pub fn is_degenerate(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Map this rectangle from a `src` sized canvas into a `dst` sized one,
    /// using an aspect-preserving fit with centered padding.
    pub fn letterbox(self, src: (u32, u32), dst: (u32, u32)) -> Self {
        if src.0 == 0 || src.1 == 0 {
            return self;
        }
        let scale = (dst.0 as f64 / src.0 as f64).min(dst.1 as f64 / src.1 as f64);
        let pad_x = (dst.0 as f64 - src.0 as f64 * scale) / 2.0;
        let pad_y = (dst.1 as f64 - src.1 as f64 * scale) / 2.0;
        Self::new(
            (self.x as f64 * scale + pad_x).round() as i32,
            (self.y as f64 * scale + pad_y).round() as i32,
            (self.w as f64 * scale).round() as i32,
            (self.h as f64 * scale).round() as i32,
        )
    }
}
