// THEORY:
// Object detection itself is not part of this crate. This module pins down the
// contract with whatever model does it:
//
// - What goes in: a frame and a set of `DetectorOptions` (model, object count,
//   confidence thresholds). The options are forwarded untouched.
// - What comes out: a list of `Detection`s, each carrying the nine projected
//   box keypoints in detector order.
//
// `ObjectDetector` is the seam a real model plugs into. `ReplayDetector` plays
// back detections recorded in a `FrameManifest`, which is how the crate is
// exercised without a model.

use crate::core_modules::box_topology::DetectedBox;
use crate::core_modules::keypoint::Keypoint;
use crate::error::OverlayError;
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Object category the detection model is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelName {
    #[default]
    Shoe,
    Chair,
    Cup,
    Camera,
}

/// Options forwarded to the detection model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    pub model_name: ModelName,
    pub max_num_objects: usize,
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
    /// Mirror the input horizontally before detection.
    pub selfie_mode: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            model_name: ModelName::Shoe,
            max_num_objects: 2,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.99,
            selfie_mode: false,
        }
    }
}

impl DetectorOptions {
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.max_num_objects == 0 {
            return Err(OverlayError::InvalidOption(
                "max_num_objects must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OverlayError::InvalidOption(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One keypoint as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedKeypoint {
    #[serde(rename = "point2d")]
    pub point_2d: Keypoint,
    #[serde(rename = "point3d", default, skip_serializing_if = "Option::is_none")]
    pub point_3d: Option<[f64; 3]>,
}

impl From<Keypoint> for DetectedKeypoint {
    fn from(point_2d: Keypoint) -> Self {
        Self {
            point_2d,
            point_3d: None,
        }
    }
}

/// A single detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub keypoints: Vec<DetectedKeypoint>,
}

impl Detection {
    pub fn from_points(points: &[Keypoint]) -> Self {
        Self {
            id: None,
            keypoints: points.iter().copied().map(DetectedKeypoint::from).collect(),
        }
    }

    /// Projects the 2D keypoints into a validated box.
    pub fn to_box(&self) -> Result<DetectedBox, OverlayError> {
        let landmarks: Vec<Keypoint> = self.keypoints.iter().map(|k| k.point_2d).collect();
        DetectedBox::from_keypoints(&landmarks)
    }
}

/// The external object-detection model.
pub trait ObjectDetector {
    fn set_options(&mut self, options: &DetectorOptions) -> Result<(), OverlayError>;

    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<Detection>, OverlayError>;
}

/// A recorded frame: an image path and the detections made on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFrame {
    /// Image path, relative to the manifest file.
    pub image: PathBuf,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A recorded sequence of frames and detections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameManifest {
    pub frames: Vec<ManifestFrame>,
}

impl FrameManifest {
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let content = fs::read_to_string(path)?;
        let manifest: FrameManifest = serde_json::from_str(&content)?;
        info!(
            "Loaded manifest with {} frames from {}",
            manifest.frames.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<(), OverlayError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Plays back recorded detections, one frame per `detect` call.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    recorded: VecDeque<Vec<Detection>>,
    options: DetectorOptions,
}

impl ReplayDetector {
    pub fn new(recorded: impl IntoIterator<Item = Vec<Detection>>) -> Self {
        Self {
            recorded: recorded.into_iter().collect(),
            options: DetectorOptions::default(),
        }
    }

    pub fn from_manifest(manifest: &FrameManifest) -> Self {
        Self::new(manifest.frames.iter().map(|f| f.detections.clone()))
    }

    pub fn remaining(&self) -> usize {
        self.recorded.len()
    }
}

impl ObjectDetector for ReplayDetector {
    fn set_options(&mut self, options: &DetectorOptions) -> Result<(), OverlayError> {
        options.validate()?;
        self.options = options.clone();
        Ok(())
    }

    fn detect(&mut self, _frame: &RgbaImage) -> Result<Vec<Detection>, OverlayError> {
        let Some(mut detections) = self.recorded.pop_front() else {
            debug!("Replay exhausted, reporting no detections");
            return Ok(Vec::new());
        };
        if detections.len() > self.options.max_num_objects {
            debug!(
                "Dropping {} detections above max_num_objects",
                detections.len() - self.options.max_num_objects
            );
            detections.truncate(self.options.max_num_objects);
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(count: usize) -> Detection {
        let points: Vec<Keypoint> = (0..count)
            .map(|i| Keypoint::new(0.1 * i as f64, 0.05 * i as f64))
            .collect();
        Detection::from_points(&points)
    }

    #[test]
    fn parses_objectron_keypoint_layout() {
        let json = r#"{
            "keypoints": [
                {"point2d": {"x": 0.5, "y": 0.5, "depth": -0.1}, "point3d": [0.0, 0.0, -1.0]},
                {"point2d": {"x": 0.4, "y": 0.6}}
            ]
        }"#;
        let parsed: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.keypoints[0].point_2d.depth, -0.1);
        assert_eq!(parsed.keypoints[0].point_3d, Some([0.0, 0.0, -1.0]));
        assert_eq!(parsed.keypoints[1].point_2d, Keypoint::new(0.4, 0.6));
    }

    #[test]
    fn to_box_requires_nine_keypoints() {
        assert!(detection(9).to_box().is_ok());
        assert!(matches!(
            detection(3).to_box(),
            Err(OverlayError::WrongKeypointCount { found: 3, .. })
        ));
    }

    #[test]
    fn default_options_match_shoe_model() {
        let options = DetectorOptions::default();
        assert_eq!(options.model_name, ModelName::Shoe);
        assert_eq!(options.max_num_objects, 2);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let options = DetectorOptions {
            min_tracking_confidence: 1.5,
            ..DetectorOptions::default()
        };
        assert!(matches!(options.validate(), Err(OverlayError::InvalidOption(_))));
        let options = DetectorOptions {
            max_num_objects: 0,
            ..DetectorOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn replay_honours_max_num_objects_and_exhausts() {
        let mut detector = ReplayDetector::new(vec![
            vec![detection(9), detection(9), detection(9)],
            vec![detection(9)],
        ]);
        detector
            .set_options(&DetectorOptions {
                max_num_objects: 2,
                ..DetectorOptions::default()
            })
            .unwrap();

        let frame = RgbaImage::new(2, 2);
        assert_eq!(detector.detect(&frame).unwrap().len(), 2);
        assert_eq!(detector.detect(&frame).unwrap().len(), 1);
        assert_eq!(detector.remaining(), 0);
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = FrameManifest {
            frames: vec![ManifestFrame {
                image: PathBuf::from("frame_0000.png"),
                detections: vec![detection(9)],
            }],
        };
        manifest.save(&path).unwrap();
        assert_eq!(FrameManifest::load(&path).unwrap(), manifest);
    }
}
