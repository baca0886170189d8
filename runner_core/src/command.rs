//! The per-frame command a gesture profile hands to gameplay.

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp_lane, lane_x};

// ════════════════════════════════════════════════════════════════════════════
// Lane
// ════════════════════════════════════════════════════════════════════════════

/// A lane index that is always in `0..=2`.  Construction clamps, so an
/// out-of-range value can never reach gameplay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i32", into = "u8")]
pub struct Lane(u8);

impl Lane {
    pub const LEFT:   Lane = Lane(0);
    pub const CENTER: Lane = Lane(1);
    pub const RIGHT:  Lane = Lane(2);

    pub fn new(lane: i32) -> Lane {
        Lane(clamp_lane(lane) as u8)
    }

    pub fn index(self) -> usize { self.0 as usize }

    pub fn world_x(self) -> f32 { lane_x(self.0 as i32) }

    /// Lane `delta` steps over, clamped at the edges.
    pub fn shifted(self, delta: i32) -> Lane {
        Lane::new(self.0 as i32 + delta)
    }
}

impl Default for Lane {
    fn default() -> Self { Lane::CENTER }
}

impl From<i32> for Lane {
    fn from(v: i32) -> Self { Lane::new(v) }
}

impl From<Lane> for u8 {
    fn from(l: Lane) -> Self { l.0 }
}

// ════════════════════════════════════════════════════════════════════════════
// MovementState
// ════════════════════════════════════════════════════════════════════════════

/// One frame of classified input.
///
/// `jump` is edge-triggered (true on the frame a jump fires), `duck` is held.
/// When `tracked` is false gameplay treats the frame as "no input" and keeps
/// the last committed lane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    pub lane:    Lane,
    pub jump:    bool,
    pub duck:    bool,
    pub tracked: bool,
    pub message: String,
}

impl MovementState {
    pub fn untracked(lane: Lane, message: impl Into<String>) -> Self {
        MovementState { lane, jump: false, duck: false, tracked: false, message: message.into() }
    }

    pub fn tracked(lane: Lane, message: impl Into<String>) -> Self {
        MovementState { lane, jump: false, duck: false, tracked: true, message: message.into() }
    }

    pub fn with_jump(mut self, jump: bool) -> Self {
        self.jump = jump;
        self
    }

    pub fn with_duck(mut self, duck: bool) -> Self {
        self.duck = duck;
        self
    }
}

impl Default for MovementState {
    fn default() -> Self {
        MovementState::untracked(Lane::CENTER, "Waiting for input")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_construction_clamps() {
        assert_eq!(Lane::new(-3), Lane::LEFT);
        assert_eq!(Lane::new(7), Lane::RIGHT);
        assert_eq!(Lane::RIGHT.shifted(1), Lane::RIGHT);
        assert_eq!(Lane::CENTER.shifted(-1), Lane::LEFT);
    }

    #[test]
    fn lane_deserialises_clamped() {
        let lane: Lane = serde_json::from_str("9").unwrap();
        assert_eq!(lane, Lane::RIGHT);
        assert_eq!(serde_json::to_string(&Lane::LEFT).unwrap(), "0");
    }
}
