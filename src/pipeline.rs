// THEORY:
// The `pipeline` module is the top-level API for annotating a single frame. It
// does what the browser page did on every detector callback, in the same order:
//
// 1.  Paint the video frame, stretched over the canvas.
// 2.  For every detection, validate its keypoints into a `DetectedBox`.
// 3.  Draw the box edges, the three axis indicators and the centroid.
//
// A detection that breaks the nine-keypoint contract is rejected and counted,
// never drawn. The other detections in the frame are still rendered. The
// result of a frame is the annotated canvas plus a `Report` describing what
// was drawn.

use crate::config::OverlayConfig;
use crate::core_modules::detection::{Detection, ObjectDetector};
use crate::core_modules::overlay_renderer;
use crate::core_modules::raster::RasterSurface;
use crate::error::OverlayError;
use image::RgbaImage;
use log::{debug, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::box_topology::{BoxKeypoint, DetectedBox};
pub use crate::core_modules::color::{AxisColors, Color};
pub use crate::core_modules::overlay_renderer::OverlayStyle;

/// What was drawn on a frame that had detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSummary {
    pub boxes_drawn: usize,
    /// Axes left out because their diagonals were parallel.
    pub axes_skipped: usize,
    /// Detections that failed keypoint validation.
    pub rejected_detections: usize,
}

/// The outcome of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    NoDetections,
    Rendered(RenderSummary),
}

/// An annotated frame.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub frame_id: u64,
    pub canvas: RgbaImage,
    pub report: Report,
}

/// Renders detector output onto frames, one frame at a time.
pub struct FramePipeline {
    config: OverlayConfig,
    frame_count: u64,
}

impl FramePipeline {
    pub fn new(config: OverlayConfig) -> Result<Self, OverlayError> {
        config.validate()?;
        Ok(Self {
            config,
            frame_count: 0,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Renders the next frame, numbering frames in call order.
    pub fn process_frame(&mut self, frame: &RgbaImage, detections: &[Detection]) -> RenderedFrame {
        let frame_id = self.frame_count;
        self.frame_count += 1;
        self.render_frame(frame_id, frame, detections)
    }

    /// Asks `detector` for detections on `frame` and renders them.
    pub fn run_detector<D: ObjectDetector + ?Sized>(
        &mut self,
        detector: &mut D,
        frame: &RgbaImage,
    ) -> Result<RenderedFrame, OverlayError> {
        let detections = detector.detect(frame)?;
        Ok(self.process_frame(frame, &detections))
    }

    /// Renders `detections` over `frame` without touching the frame counter.
    pub fn render_frame(&self, frame_id: u64, frame: &RgbaImage, detections: &[Detection]) -> RenderedFrame {
        // --- 1. Background ---
        let mut surface = RasterSurface::new(self.config.canvas_width, self.config.canvas_height);
        surface.draw_image(frame);

        if detections.is_empty() {
            return RenderedFrame {
                frame_id,
                canvas: surface.into_image(),
                report: Report::NoDetections,
            };
        }

        // --- 2. Overlays ---
        let mut summary = RenderSummary::default();
        for (index, detection) in detections.iter().enumerate() {
            let detected = match detection.to_box() {
                Ok(detected) => detected,
                Err(err) => {
                    warn!("Frame {frame_id}: rejecting detection {index}: {err}");
                    summary.rejected_detections += 1;
                    continue;
                }
            };

            summary.axes_skipped +=
                overlay_renderer::render_detection(&mut surface, &detected, &self.config.style);
            summary.boxes_drawn += 1;
        }

        debug!(
            "Frame {frame_id}: drew {} boxes, skipped {} axes, rejected {} detections",
            summary.boxes_drawn, summary.axes_skipped, summary.rejected_detections
        );
        RenderedFrame {
            frame_id,
            canvas: surface.into_image(),
            report: Report::Rendered(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::detection::{DetectorOptions, ReplayDetector};
    use crate::core_modules::keypoint::Keypoint;
    use image::Rgba;

    fn small_config() -> OverlayConfig {
        OverlayConfig {
            canvas_width: 64,
            canvas_height: 48,
            ..OverlayConfig::default()
        }
    }

    fn cube_detection() -> Detection {
        Detection::from_points(&[
            Keypoint::new(0.48, 0.52),
            Keypoint::new(0.4, 0.6),
            Keypoint::new(0.6, 0.6),
            Keypoint::new(0.4, 0.4),
            Keypoint::new(0.6, 0.4),
            Keypoint::new(0.3, 0.7),
            Keypoint::new(0.7, 0.7),
            Keypoint::new(0.3, 0.3),
            Keypoint::new(0.7, 0.3),
        ])
    }

    #[test]
    fn empty_frame_reports_no_detections() {
        let mut pipeline = FramePipeline::new(small_config()).unwrap();
        let frame = RgbaImage::from_pixel(32, 24, Rgba([1, 2, 3, 255]));
        let rendered = pipeline.process_frame(&frame, &[]);
        assert_eq!(rendered.report, Report::NoDetections);
        assert_eq!(rendered.canvas.dimensions(), (64, 48));
        assert!(rendered.canvas.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn malformed_detection_is_rejected_but_others_render() {
        let mut pipeline = FramePipeline::new(small_config()).unwrap();
        let frame = RgbaImage::new(64, 48);
        let broken = Detection::from_points(&[Keypoint::new(0.5, 0.5); 4]);
        let rendered = pipeline.process_frame(&frame, &[broken, cube_detection()]);

        assert_eq!(
            rendered.report,
            Report::Rendered(RenderSummary {
                boxes_drawn: 1,
                axes_skipped: 0,
                rejected_detections: 1,
            })
        );
        // Centroid dot at (0.48 * 64, 0.52 * 48).
        assert_eq!(rendered.canvas.get_pixel(30, 24), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn frames_are_numbered_in_call_order() {
        let mut pipeline = FramePipeline::new(small_config()).unwrap();
        let frame = RgbaImage::new(8, 8);
        let mut detector = ReplayDetector::new(vec![vec![cube_detection()], vec![]]);
        detector.set_options(&DetectorOptions::default()).unwrap();

        let first = pipeline.run_detector(&mut detector, &frame).unwrap();
        let second = pipeline.run_detector(&mut detector, &frame).unwrap();
        assert_eq!((first.frame_id, second.frame_id), (0, 1));
        assert!(matches!(first.report, Report::Rendered(_)));
        assert_eq!(second.report, Report::NoDetections);
        assert_eq!(pipeline.frame_count(), 2);
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = OverlayConfig {
            canvas_width: 0,
            ..OverlayConfig::default()
        };
        assert!(FramePipeline::new(config).is_err());
    }
}
