//! Landmark snapshots as delivered by an external pose/hand estimator.
//!
//! Coordinates are normalised to the (mirrored) camera image: `x` grows to
//! the right, `y` grows downward, both in `0..=1`.  "Higher" on screen is
//! therefore a *smaller* `y`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Points
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Visibility / confidence in `0..=1`.  Hand points usually omit it.
    #[serde(default = "fully_visible")]
    pub visibility: f32,
}

fn fully_visible() -> f32 { 1.0 }

impl Landmark {
    /// Stand-in for an index the estimator did not report.
    pub const HIDDEN: Landmark = Landmark { x: 0.5, y: 0.5, visibility: 0.0 };

    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Landmark { x, y, visibility }
    }

    pub fn dist2(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Body pose landmark indices (33-point topology).
pub mod pose_index {
    pub const NOSE:           usize = 0;
    pub const LEFT_SHOULDER:  usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW:     usize = 13;
    pub const RIGHT_ELBOW:    usize = 14;
    pub const LEFT_WRIST:     usize = 15;
    pub const RIGHT_WRIST:    usize = 16;
    pub const LEFT_HIP:       usize = 23;
    pub const RIGHT_HIP:      usize = 24;
    pub const COUNT:          usize = 33;
}

/// Hand landmark indices (21-point topology).
pub mod hand_index {
    pub const WRIST:      usize = 0;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_TIP:  usize = 20;
    pub const COUNT:      usize = 21;
}

// ════════════════════════════════════════════════════════════════════════════
// Snapshots
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub landmarks: Vec<Landmark>,
}

impl PoseSnapshot {
    /// Landmark at `index`, or [`Landmark::HIDDEN`] when missing.
    pub fn point(&self, index: usize) -> Landmark {
        self.landmarks.get(index).copied().unwrap_or(Landmark::HIDDEN)
    }

    /// True when every listed landmark is above `threshold`.
    pub fn visible(&self, indices: &[usize], threshold: f32) -> bool {
        indices.iter().all(|&i| self.point(i).visibility > threshold)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandSnapshot {
    pub handedness: Handedness,
    /// Detection confidence of the whole hand.
    #[serde(default = "fully_visible")]
    pub score:      f32,
    pub points:     Vec<Landmark>,
}

impl HandSnapshot {
    pub fn point(&self, index: usize) -> Landmark {
        self.points.get(index).copied().unwrap_or(Landmark::HIDDEN)
    }

    pub fn wrist(&self) -> Landmark {
        self.point(hand_index::WRIST)
    }

    /// Mean of the wrist and the four finger knuckles.
    pub fn palm_center(&self) -> (f32, f32) {
        use hand_index::*;
        let ids = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
        let (sx, sy) = ids.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            let p = self.point(i);
            (sx + p.x, sy + p.y)
        });
        (sx / ids.len() as f32, sy / ids.len() as f32)
    }

    /// A hand is usable only with the full 21-point set.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= hand_index::COUNT
    }
}

/// Everything the estimator found in one camera frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    #[serde(default)]
    pub pose:  Option<PoseSnapshot>,
    #[serde(default)]
    pub hands: Vec<HandSnapshot>,
}

impl LandmarkSnapshot {
    pub fn is_empty(&self) -> bool {
        self.pose.is_none() && self.hands.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Unavailable frames
// ════════════════════════════════════════════════════════════════════════════

/// Why a frame produced no snapshot.  Never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    #[error("Camera unavailable. Keyboard fallback: left/right + up/down.")]
    CameraUnavailable,
    #[error("Camera frame unavailable. Keyboard fallback: left/right + up/down.")]
    FrameUnreadable,
    #[error("No landmarks found. Step into view of the camera.")]
    NoLandmarks,
}

pub type Frame = Result<LandmarkSnapshot, Unavailable>;

/// One line of the JSON-lines landmark protocol.
///
/// ```text
/// {"status":"ok","pose":{"landmarks":[{"x":0.5,"y":0.3,"visibility":0.9}, ...]},"hands":[]}
/// {"status":"camera_unavailable"}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameMessage {
    Ok(LandmarkSnapshot),
    CameraUnavailable,
    FrameUnreadable,
    NoLandmarks,
}

impl FrameMessage {
    pub fn into_frame(self) -> Frame {
        match self {
            FrameMessage::Ok(s) if s.is_empty() => Err(Unavailable::NoLandmarks),
            FrameMessage::Ok(s)                 => Ok(s),
            FrameMessage::CameraUnavailable     => Err(Unavailable::CameraUnavailable),
            FrameMessage::FrameUnreadable       => Err(Unavailable::FrameUnreadable),
            FrameMessage::NoLandmarks           => Err(Unavailable::NoLandmarks),
        }
    }
}

impl From<Frame> for FrameMessage {
    fn from(frame: Frame) -> Self {
        match frame {
            Ok(s)                              => FrameMessage::Ok(s),
            Err(Unavailable::CameraUnavailable) => FrameMessage::CameraUnavailable,
            Err(Unavailable::FrameUnreadable)   => FrameMessage::FrameUnreadable,
            Err(Unavailable::NoLandmarks)       => FrameMessage::NoLandmarks,
        }
    }
}
