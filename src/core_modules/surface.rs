// THEORY:
// The `DrawingSurface` trait is the seam between the overlay logic and whatever
// actually owns the pixels. It mirrors the handful of canvas primitives the
// overlay needs: a current affine transform, filled polygons, stroked
// polylines, and filled circles. All coordinates passed to the drawing calls
// are in the surface's local space and pass through the current transform.
//
// Canvas APIs keep the transform on an implicit save/restore stack. Here the
// stack is replaced by `TransformScope`, a guard that captures the transform
// when it is created and puts it back when it is dropped. A rotated arrowhead
// can never leak its rotation into the next draw call, on any exit path.
//
// `RecordingSurface` is a headless implementation that stores every command in
// device space. It is what tests use to check where things would be drawn.

use crate::core_modules::color::Color;
use std::ops::{Deref, DerefMut};

/// A 2D affine transform in canvas order: `(a, b, c, d, e, f)` maps
/// `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Returns `self` followed by a translation in local space.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            e: self.a * dx + self.c * dy + self.e,
            f: self.b * dx + self.d * dy + self.f,
            ..self
        }
    }

    /// Returns `self` followed by a clockwise (screen space) rotation in
    /// local space.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length scale of the transform, used for stroke widths.
    pub fn scale(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A canvas-like raster target with a known pixel size.
pub trait DrawingSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);

    /// Fills the closed polygon through `points`.
    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Color);

    /// Strokes the polyline through `points`, closing it back to the first
    /// point when `closed` is set.
    fn stroke_polyline(&mut self, points: &[(f64, f64)], closed: bool, color: Color, line_width: f64);

    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Color);

    fn translate(&mut self, dx: f64, dy: f64) {
        let transform = self.transform().translated(dx, dy);
        self.set_transform(transform);
    }

    fn rotate(&mut self, angle: f64) {
        let transform = self.transform().rotated(angle);
        self.set_transform(transform);
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), color: Color, line_width: f64) {
        self.stroke_polyline(&[from, to], false, color, line_width);
    }
}

/// Restores the surface transform captured at creation when dropped.
pub struct TransformScope<'a, S: DrawingSurface + ?Sized> {
    surface: &'a mut S,
    saved: Transform,
}

impl<'a, S: DrawingSurface + ?Sized> TransformScope<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        let saved = surface.transform();
        Self { surface, saved }
    }
}

impl<S: DrawingSurface + ?Sized> Deref for TransformScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> DerefMut for TransformScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> Drop for TransformScope<'_, S> {
    fn drop(&mut self) {
        self.surface.set_transform(self.saved);
    }
}

/// A single drawing call as seen by a `RecordingSurface`, in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetTransform(Transform),
    FillPolygon {
        points: Vec<(f64, f64)>,
        color: Color,
    },
    StrokePolyline {
        points: Vec<(f64, f64)>,
        closed: bool,
        color: Color,
        line_width: f64,
    },
    FillCircle {
        center: (f64, f64),
        radius: f64,
        color: Color,
    },
}

/// Headless surface that records commands instead of touching pixels.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    transform: Transform,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: Transform::IDENTITY,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands that actually put paint on the surface.
    pub fn paint_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| !matches!(c, DrawCommand::SetTransform(_)))
    }

    fn to_device(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        points.iter().map(|p| self.transform.apply(*p)).collect()
    }
}

impl DrawingSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        let points = self.to_device(points);
        self.commands.push(DrawCommand::FillPolygon { points, color });
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], closed: bool, color: Color, line_width: f64) {
        let points = self.to_device(points);
        self.commands.push(DrawCommand::StrokePolyline {
            points,
            closed,
            color,
            line_width: line_width * self.transform.scale(),
        });
    }

    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Color) {
        let center = self.transform.apply(center);
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius: radius * self.transform.scale(),
            color,
        });
    }
}
