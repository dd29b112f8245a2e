// THEORY:
// The geometry layer answers two questions about the projected box:
//
// 1.  Where does each principal axis "exit" the box on screen? Each axis is
//     identified by a pair of box diagonals lying on the face the axis points
//     through. The two diagonals of a face cross at its projected centre, and
//     that crossing is the axis midpoint.
// 2.  Which way does an axis ray point? `arctan360` extends `atan` to the full
//     circle so arrowheads can be rotated in any direction.
//
// Intersections of (near-)parallel lines do not exist. Instead of handing a
// point at infinity to the renderer, `line_intersection` returns `None` and the
// caller skips that axis.

use crate::core_modules::box_topology::{BoxKeypoint, DetectedBox};
use crate::core_modules::keypoint::Keypoint;
use std::f64::consts::{FRAC_PI_2, PI};

/// Denominators smaller than this are treated as parallel lines.
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// A line through two points, used as an infinite line for intersection.
pub type Segment = [Keypoint; 2];

/// One of the three principal directions of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The two face diagonals whose crossing marks this axis' midpoint.
    pub const fn diagonals(self) -> [[BoxKeypoint; 2]; 2] {
        use BoxKeypoint::*;
        match self {
            Axis::X => [
                [BackBottomRight, FrontTopRight],
                [BackTopRight, FrontBottomRight],
            ],
            Axis::Y => [
                [BackTopLeft, FrontTopRight],
                [FrontTopLeft, BackTopRight],
            ],
            Axis::Z => [
                [FrontTopRight, FrontBottomLeft],
                [FrontTopLeft, FrontBottomRight],
            ],
        }
    }
}

/// The computed endpoint of each axis ray. `None` marks a degenerate axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMidpoints {
    pub x: Option<Keypoint>,
    pub y: Option<Keypoint>,
    pub z: Option<Keypoint>,
}

impl AxisMidpoints {
    pub fn get(&self, axis: Axis) -> Option<Keypoint> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Number of axes that have no usable midpoint.
    pub fn degenerate_count(&self) -> usize {
        Axis::ALL.iter().filter(|a| self.get(**a).is_none()).count()
    }
}

/// Intersects the infinite lines through `a` and `b`.
///
/// Returns `None` when the lines are parallel (or numerically close to it) or
/// the result is not finite. The returned point has depth 0.
pub fn line_intersection(a: Segment, b: Segment) -> Option<Keypoint> {
    let [a0, a1] = a;
    let [b0, b1] = b;

    let y_diff_b = b0.y - b1.y;
    let x_diff_b = b0.x - b1.x;

    let top = (a0.x - b0.x) * y_diff_b - (a0.y - b0.y) * x_diff_b;
    let bot = (a0.x - a1.x) * y_diff_b - (a0.y - a1.y) * x_diff_b;
    if bot.is_nan() || bot.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = top / bot;

    let point = Keypoint::new(a0.x + t * (a1.x - a0.x), a0.y + t * (a1.y - a0.y));
    point.is_finite().then_some(point)
}

/// Midpoint of a single axis of `detected`.
pub fn axis_midpoint(detected: &DetectedBox, axis: Axis) -> Option<Keypoint> {
    let [[a0, a1], [b0, b1]] = axis.diagonals();
    line_intersection(
        [detected[a0], detected[a1]],
        [detected[b0], detected[b1]],
    )
}

pub fn compute_axis_midpoints(detected: &DetectedBox) -> AxisMidpoints {
    AxisMidpoints {
        x: axis_midpoint(detected, Axis::X),
        y: axis_midpoint(detected, Axis::Y),
        z: axis_midpoint(detected, Axis::Z),
    }
}

/// Full-circle arctangent of the direction `(dx, dy)`, in radians within
/// `[-PI, PI]`.
pub fn arctan360(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 {
        return if dy >= 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
    }

    let angle = (dy / dx).atan();
    if dx > 0.0 {
        angle
    } else if dy >= 0.0 {
        angle + PI
    } else {
        angle - PI
    }
}

/// Rotation of an arrowhead drawn at `tip` for a ray starting at `origin`.
/// The arrowhead's apex points along local -y, hence the quarter turn.
pub fn arrowhead_rotation(origin: &Keypoint, tip: &Keypoint) -> f64 {
    let (dx, dy) = tip.offset_from(origin);
    arctan360(dx, dy) + FRAC_PI_2
}
