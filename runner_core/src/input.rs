//! Merges the keyboard fallback with the classified gesture command.

use crate::command::{Lane, MovementState};
use crate::entities::Player;

/// Arrow keys held this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub left:  bool,
    pub right: bool,
    pub up:    bool,
    pub down:  bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputResult {
    pub lane_changed: bool,
    pub jumped:       bool,
    pub duck_hold:    bool,
}

/// Apply one frame of input to the player.
///
/// Arrow keys override the gesture lane; the gesture lane only counts when the
/// frame was tracked.  Jumps start from the ground and never out of a duck.
pub fn apply_input(player: &mut Player, controls: &MovementState, keys: KeyboardState) -> InputResult {
    let previous = player.target_lane;

    if keys.left {
        player.set_lane(Lane::LEFT);
    } else if keys.right {
        player.set_lane(Lane::RIGHT);
    } else if controls.tracked {
        player.set_lane(controls.lane);
    }

    let jumped = (controls.jump || keys.up) && !player.ducking && player.jump();

    InputResult {
        lane_changed: player.target_lane != previous,
        jumped,
        duck_hold:    controls.duck || keys.down,
    }
}
