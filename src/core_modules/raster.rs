// THEORY:
// `RasterSurface` is the pixel-owning implementation of `DrawingSurface`,
// backed by an `image::RgbaImage`. It rasterizes the three primitives the
// overlay needs:
//
// - Polygons are filled with an even-odd scanline pass that samples pixel
//   centres, so adjacent shapes do not double-paint shared edges.
// - Strokes are expanded into one quad per segment (butt caps) and filled as
//   polygons.
// - Circles are filled by testing pixel centres against the radius.
//
// Geometry with a non-finite vertex is dropped before rasterization. This is
// the last line of defence against NaN positions reaching the pixel buffer.

use crate::core_modules::color::Color;
use crate::core_modules::surface::{DrawingSurface, Transform};
use image::imageops::{self, FilterType};
use image::{Pixel, RgbaImage};

pub struct RasterSurface {
    image: RgbaImage,
    transform: Transform,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_image(RgbaImage::new(width, height))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            transform: Transform::IDENTITY,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Resets every pixel to `color` and the transform to identity.
    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba();
        self.image.pixels_mut().for_each(|p| *p = rgba);
        self.transform = Transform::IDENTITY;
    }

    /// Draws `frame` stretched over the whole surface, replacing its contents.
    pub fn draw_image(&mut self, frame: &RgbaImage) {
        let (width, height) = self.image.dimensions();
        if frame.dimensions() == (width, height) {
            self.image.copy_from_slice(frame.as_raw());
        } else {
            self.image = imageops::resize(frame, width, height, FilterType::Triangle);
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let rgba = color.to_rgba();
        let pixel = self.image.get_pixel_mut(x, y);
        if rgba[3] == u8::MAX {
            *pixel = rgba;
        } else {
            pixel.blend(&rgba);
        }
    }

    /// Even-odd scanline fill of a polygon already in device space.
    fn fill_device_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        if points.len() < 3 || points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return;
        }
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let row_start = (min_y - 0.5).ceil().max(0.0) as u32;
        let row_end = (max_y - 0.5).floor().min((height - 1) as f64);
        if row_end < 0.0 {
            return;
        }
        let row_end = row_end as u32;

        let mut crossings = Vec::with_capacity(points.len());
        for row in row_start..=row_end {
            let sample_y = row as f64 + 0.5;
            crossings.clear();
            for (i, &(x0, y0)) in points.iter().enumerate() {
                let (x1, y1) = points[(i + 1) % points.len()];
                // Half-open on y so a vertex shared by two edges counts once.
                if (y0 <= sample_y && sample_y < y1) || (y1 <= sample_y && sample_y < y0) {
                    crossings.push(x0 + (sample_y - y0) / (y1 - y0) * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                let col_start = (span[0] - 0.5).ceil().max(0.0);
                let col_end = (span[1] - 0.5).ceil().min(width as f64);
                if col_end <= col_start {
                    continue;
                }
                for col in col_start as u32..col_end as u32 {
                    self.blend(col, row, color);
                }
            }
        }
    }
}

/// Expands the segment `from -> to` into a quad of the given width.
fn segment_quad(from: (f64, f64), to: (f64, f64), line_width: f64) -> Option<[(f64, f64); 4]> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if !length.is_finite() || length == 0.0 {
        return None;
    }
    let half = line_width / 2.0;
    let (nx, ny) = (-dy / length * half, dx / length * half);
    Some([
        (from.0 + nx, from.1 + ny),
        (to.0 + nx, to.1 + ny),
        (to.0 - nx, to.1 - ny),
        (from.0 - nx, from.1 - ny),
    ])
}

impl DrawingSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        let device: Vec<_> = points.iter().map(|p| self.transform.apply(*p)).collect();
        self.fill_device_polygon(&device, color);
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], closed: bool, color: Color, line_width: f64) {
        if points.len() < 2 {
            return;
        }
        let device: Vec<_> = points.iter().map(|p| self.transform.apply(*p)).collect();
        let width = line_width * self.transform.scale();

        let segment_count = if closed { device.len() } else { device.len() - 1 };
        for i in 0..segment_count {
            let from = device[i];
            let to = device[(i + 1) % device.len()];
            if let Some(quad) = segment_quad(from, to, width) {
                self.fill_device_polygon(&quad, color);
            }
        }
    }

    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Color) {
        let (cx, cy) = self.transform.apply(center);
        let radius = radius * self.transform.scale();
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let (width, height) = self.image.dimensions();

        let col_start = (cx - radius).floor().max(0.0) as u32;
        let col_end = (cx + radius).ceil().min(width as f64).max(0.0) as u32;
        let row_start = (cy - radius).floor().max(0.0) as u32;
        let row_end = (cy + radius).ceil().min(height as f64).max(0.0) as u32;

        let radius_sq = radius * radius;
        for row in row_start..row_end {
            for col in col_start..col_end {
                let dx = col as f64 + 0.5 - cx;
                let dy = row as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= radius_sq {
                    self.blend(col, row, color);
                }
            }
        }
    }
}
