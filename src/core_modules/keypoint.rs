// THEORY:
// A `Keypoint` is the smallest unit of data the overlay works with: a single
// landmark reported by the detector, or a point derived from other landmarks
// (an axis midpoint). Coordinates are normalized fractions of the canvas, so a
// keypoint has no idea how large the surface it will be drawn on is. The
// conversion to pixels happens only at draw time via `to_pixel`.

use serde::{Deserialize, Serialize};

/// A 2D landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    /// Horizontal position as a fraction of the canvas width.
    pub x: f64,
    /// Vertical position as a fraction of the canvas height.
    pub y: f64,
    /// Relative depth. Points derived by intersection always carry 0.
    #[serde(default)]
    pub depth: f64,
}

impl Keypoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, depth: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Scales the normalized point against a surface of the given pixel size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x * width as f64, self.y * height as f64)
    }

    /// Offset from `origin` to this point, in normalized units.
    pub fn offset_from(&self, origin: &Keypoint) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}
