//! Disabled leg: seated play with the hands only.  Raise a hand to move to
//! its side, raise both to jump, make two fists to duck.

use std::time::Instant;

use runner_core::{Lane, ModeId, ModeProfile, MovementState};

use super::HAND_SENSITIVITY_FLOOR;
use crate::error::SampleRejected;
use crate::filters::{DuckFilter, HoldCounter, JumpCooldown, LaneSmoother};
use crate::hand::{hand_shape, resolve_hands, HandShape};
use crate::landmarks::{hand_index as H, HandSnapshot, LandmarkSnapshot};
use crate::profile::{keys, load, CalibrationMap, GestureProfile};

const NO_HANDS: &str = "Disabled Leg Mode: show one or both hands clearly in frame.";
const ACTIVE:   &str = "Disabled Leg Mode: raise left/right hand to move, both hands up to jump.";
const HINT:     &str = "Show both hands at comfortable neutral height, elbows relaxed.";

const MIN_SCORE:       f32 = 0.40;
const MIN_RAISE_ROW:   f32 = 0.12;
/// Knuckles may trail the wrist by this much and still count as raised.
const KNUCKLE_SLACK:   f32 = 0.08;

pub struct DisabledLegProfile {
    sensitivity:      f32,
    smoothing:        f32,
    left_rest_y:      Option<f32>,
    right_rest_y:     Option<f32>,
    lane:             LaneSmoother,
    jump_hold:        HoldCounter,
    cooldown:         JumpCooldown,
    duck:             DuckFilter,
}

impl DisabledLegProfile {
    pub fn new(mode: &ModeProfile) -> Self {
        DisabledLegProfile {
            sensitivity:  mode.movement_sensitivity.max(HAND_SENSITIVITY_FLOOR),
            smoothing:    mode.lane_smoothing,
            left_rest_y:  None,
            right_rest_y: None,
            lane:         LaneSmoother::default(),
            jump_hold:    HoldCounter::new(2),
            cooldown:     JumpCooldown::new(mode.jump_cooldown),
            duck:         DuckFilter::standard(),
        }
    }

    /// Screen row a wrist must rise above for its side.
    fn raise_row(&self, rest: Option<f32>) -> f32 {
        let s = self.sensitivity;
        match rest {
            Some(r) => (r - 0.13 / s).max(MIN_RAISE_ROW),
            None    => 0.45 + (s - 1.0) * 0.05,
        }
    }
}

fn raised(hand: Option<&HandSnapshot>, row: f32) -> bool {
    hand.map_or(false, |h| h.wrist().y < row && h.point(H::INDEX_MCP).y < row + KNUCKLE_SLACK)
}

impl GestureProfile for DisabledLegProfile {
    fn id(&self) -> ModeId { ModeId::DisabledLeg }

    fn classify(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> MovementState {
        let sides = resolve_hands(&snapshot.hands, MIN_SCORE);
        if sides.is_empty() {
            return MovementState::untracked(self.lane.lane(), NO_HANDS);
        }

        let left  = raised(sides.left,  self.raise_row(self.left_rest_y));
        let right = raised(sides.right, self.raise_row(self.right_rest_y));
        let lane = match (left, right) {
            (true, true)   => self.lane.update(Lane::CENTER, self.smoothing),
            (true, false)  => self.lane.update(Lane::LEFT,   self.smoothing),
            (false, true)  => self.lane.update(Lane::RIGHT,  self.smoothing),
            (false, false) => self.lane.lane(),
        };

        let jump = self.jump_hold.update(left && right) && self.cooldown.try_fire(now);

        let fists = sides
            .both()
            .map_or(false, |(l, r)| hand_shape(l) == HandShape::Fist && hand_shape(r) == HandShape::Fist);
        let duck = self.duck.update(fists);

        MovementState::tracked(lane, ACTIVE).with_jump(jump).with_duck(duck)
    }

    fn sample(&self, snapshot: &LandmarkSnapshot) -> Result<CalibrationMap, SampleRejected> {
        let sides = resolve_hands(&snapshot.hands, MIN_SCORE);
        if sides.is_empty() {
            return Err(SampleRejected::NoHands);
        }
        let (l, r) = sides.both().ok_or(SampleRejected::MissingHand)?;
        Ok(CalibrationMap::from([
            (keys::LEFT_HAND_REST.to_string(),  l.wrist().y),
            (keys::RIGHT_HAND_REST.to_string(), r.wrist().y),
        ]))
    }

    fn apply_calibration(&mut self, baseline: &CalibrationMap) {
        load(baseline, keys::LEFT_HAND_REST,  &mut self.left_rest_y);
        load(baseline, keys::RIGHT_HAND_REST, &mut self.right_rest_y);
    }

    fn calibration_hint(&self) -> &'static str { HINT }

    fn smoothed_lane(&self) -> f32 { self.lane.value() }
}
