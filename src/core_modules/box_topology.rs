// THEORY:
// The detector describes an oriented 3D box with nine projected keypoints in a
// fixed order: the centroid followed by the eight corners. This module is the
// only place that knows that order. Everything else reaches a corner through
// `BoxKeypoint`, so a mix-up between "front top left" and "back top left" is a
// type error instead of an off-by-one.
//
// `DetectedBox` is the validated form of a detection. It is built once per
// detection per frame and refuses input that does not honor the nine-keypoint
// contract.

use crate::core_modules::keypoint::Keypoint;
use crate::error::OverlayError;
use std::ops::Index;

/// Number of keypoints in a box detection: one centroid and eight corners.
pub const BOX_KEYPOINT_COUNT: usize = 9;

/// Named roles of the nine box keypoints, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxKeypoint {
    Center = 0,
    BackBottomLeft = 1,
    BackBottomRight = 2,
    BackTopLeft = 3,
    BackTopRight = 4,
    FrontBottomLeft = 5,
    FrontBottomRight = 6,
    FrontTopLeft = 7,
    FrontTopRight = 8,
}

impl BoxKeypoint {
    pub const ALL: [BoxKeypoint; BOX_KEYPOINT_COUNT] = [
        BoxKeypoint::Center,
        BoxKeypoint::BackBottomLeft,
        BoxKeypoint::BackBottomRight,
        BoxKeypoint::BackTopLeft,
        BoxKeypoint::BackTopRight,
        BoxKeypoint::FrontBottomLeft,
        BoxKeypoint::FrontBottomRight,
        BoxKeypoint::FrontTopLeft,
        BoxKeypoint::FrontTopRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The twelve edges of the box, as pairs of corner roles.
pub const BOX_EDGES: [(BoxKeypoint, BoxKeypoint); 12] = {
    use BoxKeypoint::*;
    [
        (BackBottomLeft, BackBottomRight),
        (BackBottomLeft, BackTopLeft),
        (BackBottomLeft, FrontBottomLeft),
        (BackBottomRight, BackTopRight),
        (BackBottomRight, FrontBottomRight),
        (BackTopLeft, BackTopRight),
        (BackTopLeft, FrontTopLeft),
        (BackTopRight, FrontTopRight),
        (FrontBottomLeft, FrontBottomRight),
        (FrontBottomLeft, FrontTopLeft),
        (FrontBottomRight, FrontTopRight),
        (FrontTopLeft, FrontTopRight),
    ]
};

/// A validated set of nine box keypoints for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedBox {
    keypoints: [Keypoint; BOX_KEYPOINT_COUNT],
}

impl DetectedBox {
    /// Builds a box from detector output, failing on a wrong count or a
    /// non-finite coordinate.
    pub fn from_keypoints(keypoints: &[Keypoint]) -> Result<Self, OverlayError> {
        let keypoints: [Keypoint; BOX_KEYPOINT_COUNT] =
            keypoints
                .try_into()
                .map_err(|_| OverlayError::WrongKeypointCount {
                    expected: BOX_KEYPOINT_COUNT,
                    found: keypoints.len(),
                })?;

        if let Some(role) = BoxKeypoint::ALL
            .into_iter()
            .find(|role| !keypoints[role.index()].is_finite())
        {
            return Err(OverlayError::NonFiniteKeypoint { role });
        }

        Ok(Self { keypoints })
    }

    pub fn center(&self) -> Keypoint {
        self[BoxKeypoint::Center]
    }

    pub fn edges(&self) -> impl Iterator<Item = (Keypoint, Keypoint)> + '_ {
        BOX_EDGES.iter().map(|&(a, b)| (self[a], self[b]))
    }
}

impl Index<BoxKeypoint> for DetectedBox {
    type Output = Keypoint;

    fn index(&self, role: BoxKeypoint) -> &Keypoint {
        &self.keypoints[role.index()]
    }
}
