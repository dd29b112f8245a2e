use crate::core_modules::box_topology::BoxKeypoint;
use thiserror::Error;

/// Everything that can go wrong between detector output and a rendered frame.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("expected {expected} keypoints per detection, found {found}")]
    WrongKeypointCount { expected: usize, found: usize },
    #[error("keypoint {role:?} has a non-finite coordinate")]
    NonFiniteKeypoint { role: BoxKeypoint },
    #[error("invalid color {0:?}, expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),
    #[error("invalid detector option: {0}")]
    InvalidOption(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("render worker pool is no longer running")]
    WorkerUnavailable,
}
