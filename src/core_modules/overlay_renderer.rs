// THEORY:
// The overlay renderer is the visual end of the system. It turns a validated
// `DetectedBox` into drawing calls on any `DrawingSurface`:
//
// 1.  **Box edges**: the twelve projected edges of the 3D box.
// 2.  **Axes**: for each principal axis, a thick ray from the box centroid to the
//     axis midpoint, capped by an arrowhead rotated to follow the ray.
// 3.  **Centroid**: a filled dot on the box centre.
//
// The renderer is a pure function of its inputs plus the surface. It keeps no
// state between frames, and every transform it applies is scoped, so the
// surface leaves each call with the transform it came in with.

use crate::core_modules::box_topology::DetectedBox;
use crate::core_modules::color::{AxisColors, Color};
use crate::core_modules::geometry::{self, Axis};
use crate::core_modules::keypoint::Keypoint;
use crate::core_modules::surface::{DrawingSurface, TransformScope};
use crate::error::OverlayError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Stroke width of an axis ray, in pixels.
pub const AXIS_LINE_WIDTH: f64 = 8.0;
/// Arrowhead base and height, in pixels.
pub const TRIANGLE_BASE: f64 = 2.0 * AXIS_LINE_WIDTH;
pub const TRIANGLE_HEIGHT: f64 = TRIANGLE_BASE;
/// Outline width of an arrowhead, in pixels.
pub const TRIANGLE_OUTLINE_WIDTH: f64 = 1.0;

/// Everything needed to draw one axis indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisIndicator {
    pub axis: Axis,
    pub midpoint: Keypoint,
    /// Arrowhead rotation in radians.
    pub rotation: f64,
}

/// Computes the indicator of every non-degenerate axis, in x, y, z order.
pub fn axis_indicators(detected: &DetectedBox) -> Vec<AxisIndicator> {
    let center = detected.center();
    let midpoints = geometry::compute_axis_midpoints(detected);

    Axis::ALL
        .into_iter()
        .filter_map(|axis| match midpoints.get(axis) {
            Some(midpoint) => Some(AxisIndicator {
                axis,
                midpoint,
                rotation: geometry::arrowhead_rotation(&center, &midpoint),
            }),
            None => {
                debug!("Skipping axis {axis:?}: box diagonals are parallel");
                None
            }
        })
        .collect()
}

/// Draws the axis rays, then their arrowheads on top. Returns how many axes
/// were left out because their diagonals were parallel.
pub fn render_axes<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    detected: &DetectedBox,
    colors: &AxisColors,
) -> usize {
    let (width, height) = (surface.width(), surface.height());
    let center = detected.center().to_pixel(width, height);
    let indicators = axis_indicators(detected);

    for indicator in &indicators {
        let tip = indicator.midpoint.to_pixel(width, height);
        surface.stroke_line(center, tip, colors.get(indicator.axis), AXIS_LINE_WIDTH);
    }
    for indicator in &indicators {
        draw_triangle(
            surface,
            &indicator.midpoint,
            TRIANGLE_BASE,
            TRIANGLE_HEIGHT,
            colors.get(indicator.axis),
            indicator.rotation,
        );
    }

    Axis::ALL.len() - indicators.len()
}

/// Draws an isosceles triangle whose base is centred on `point` and whose apex
/// points along local -y after `rotation` is applied.
pub fn draw_triangle<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    point: &Keypoint,
    base: f64,
    height: f64,
    color: Color,
    rotation: f64,
) {
    let (real_x, real_y) = point.to_pixel(surface.width(), surface.height());
    let mut scope = TransformScope::new(surface);
    scope.translate(real_x, real_y);
    scope.rotate(rotation);

    let vertices = [(base / 2.0, 0.0), (0.0, -height), (-base / 2.0, 0.0)];
    scope.fill_polygon(&vertices, color);
    scope.stroke_polyline(&vertices, true, color, TRIANGLE_OUTLINE_WIDTH);
}

/// Strokes the twelve edges of the projected box.
pub fn render_box_edges<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    detected: &DetectedBox,
    color: Color,
    line_width: f64,
) {
    let (width, height) = (surface.width(), surface.height());
    for (from, to) in detected.edges() {
        surface.stroke_line(
            from.to_pixel(width, height),
            to.to_pixel(width, height),
            color,
            line_width,
        );
    }
}

pub fn render_centroid<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    detected: &DetectedBox,
    color: Color,
    radius: f64,
) {
    let center = detected.center().to_pixel(surface.width(), surface.height());
    surface.fill_circle(center, radius, color);
}

/// Appearance of a full detection overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub draw_box: bool,
    pub box_color: Color,
    pub box_line_width: f64,
    pub axis_colors: AxisColors,
    pub draw_centroid: bool,
    pub centroid_color: Color,
    pub centroid_radius: f64,
}

impl OverlayStyle {
    pub fn validate(&self) -> Result<(), OverlayError> {
        for (name, value) in [
            ("box_line_width", self.box_line_width),
            ("centroid_radius", self.centroid_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OverlayError::InvalidOption(format!(
                    "{name} must be a finite, non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            draw_box: true,
            box_color: Color::RED,
            box_line_width: 4.0,
            axis_colors: AxisColors::default(),
            draw_centroid: true,
            centroid_color: Color::WHITE,
            centroid_radius: 6.0,
        }
    }
}

/// Draws box edges, then axes, then the centroid on top. Returns the number of
/// skipped axes, as `render_axes` does.
pub fn render_detection<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    detected: &DetectedBox,
    style: &OverlayStyle,
) -> usize {
    if style.draw_box {
        render_box_edges(surface, detected, style.box_color, style.box_line_width);
    }
    let skipped = render_axes(surface, detected, &style.axis_colors);
    if style.draw_centroid {
        render_centroid(surface, detected, style.centroid_color, style.centroid_radius);
    }
    skipped
}
