//! Leg-free: hand shapes choose the lane.
//!
//! Open the left hand for the left lane, the right hand for the right lane,
//! both for the centre.  Raise both hands to jump, clench both to duck.

use std::time::Instant;

use runner_core::{Lane, ModeId, ModeProfile, MovementState};

use super::HAND_SENSITIVITY_FLOOR;
use crate::error::SampleRejected;
use crate::filters::{DuckFilter, HoldCounter, JumpCooldown, LaneSmoother};
use crate::hand::{hand_shape, resolve_hands, HandShape, SideHands};
use crate::landmarks::{HandSnapshot, LandmarkSnapshot};
use crate::profile::{keys, load, CalibrationMap, GestureProfile};

const NO_HANDS: &str = "Leg-Free Mode: show your hands to the camera.";
const ACTIVE:   &str = "Leg-Free Mode: open left/right hand to move, both open for center, raise both to jump, fists to duck.";
const HINT:     &str = "Rest both hands in view at a comfortable height, fingers relaxed.";

const MIN_SCORE:   f32 = 0.45;
/// Uncalibrated wrists must rise above this row to jump.
const DEFAULT_ROW: f32 = 0.40;

pub struct LegFreeProfile {
    sensitivity:  f32,
    smoothing:    f32,
    left_rest_y:  Option<f32>,
    right_rest_y: Option<f32>,
    lane:         LaneSmoother,
    last_shape:   Option<(bool, bool)>,
    shape_hold:   HoldCounter,
    jump_hold:    HoldCounter,
    jump_armed:   bool,
    cooldown:     JumpCooldown,
    duck:         DuckFilter,
}

impl LegFreeProfile {
    pub fn new(mode: &ModeProfile) -> Self {
        LegFreeProfile {
            sensitivity:  mode.movement_sensitivity.max(HAND_SENSITIVITY_FLOOR),
            smoothing:    mode.lane_smoothing,
            left_rest_y:  None,
            right_rest_y: None,
            lane:         LaneSmoother::default(),
            last_shape:   None,
            shape_hold:   HoldCounter::new(2),
            jump_hold:    HoldCounter::new(2),
            jump_armed:   true,
            cooldown:     JumpCooldown::new(mode.jump_cooldown),
            duck:         DuckFilter::standard(),
        }
    }

    fn margin(&self) -> f32 {
        0.12 / self.sensitivity
    }

    /// How far a wrist sits above its rest row (positive is higher).
    fn rise(&self, hand: Option<&HandSnapshot>, rest: Option<f32>) -> f32 {
        let rest = rest.unwrap_or(DEFAULT_ROW + self.margin());
        hand.map_or(f32::NEG_INFINITY, |h| rest - h.wrist().y)
    }

    fn lowest_rise(&self, sides: &SideHands<'_>) -> f32 {
        self.rise(sides.left, self.left_rest_y)
            .min(self.rise(sides.right, self.right_rest_y))
    }
}

fn is_open(hand: Option<&HandSnapshot>) -> bool {
    hand.map_or(false, |h| hand_shape(h) == HandShape::Open)
}

fn is_fist(hand: Option<&HandSnapshot>) -> bool {
    hand.map_or(false, |h| hand_shape(h) == HandShape::Fist)
}

impl GestureProfile for LegFreeProfile {
    fn id(&self) -> ModeId { ModeId::LegFree }

    fn classify(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> MovementState {
        let sides = resolve_hands(&snapshot.hands, MIN_SCORE);
        if sides.is_empty() {
            return MovementState::untracked(self.lane.lane(), NO_HANDS);
        }

        // ── lane: which hands are open, once the shape has settled ───────
        let shape = (is_open(sides.left), is_open(sides.right));
        if self.last_shape != Some(shape) {
            self.shape_hold.reset();
            self.last_shape = Some(shape);
        }
        let settled = self.shape_hold.update(true);
        let target = match shape {
            (true, true)   => Some(Lane::CENTER),
            (true, false)  => Some(Lane::LEFT),
            (false, true)  => Some(Lane::RIGHT),
            (false, false) => None,
        };
        let lane = match target {
            Some(t) if settled => self.lane.update(t, self.smoothing),
            _                  => self.lane.lane(),
        };

        // ── jump: both wrists raised, re-armed after lowering ────────────
        let margin = self.margin();
        let lowest = self.lowest_rise(&sides);
        let raised = lowest > margin;
        if !raised {
            self.jump_hold.reset();
        } else if self.jump_armed {
            self.jump_hold.update(true);
        }
        let mut jump = false;
        if self.jump_hold.reached() && self.cooldown.try_fire(now) {
            jump = true;
            self.jump_armed = false;
            self.jump_hold.reset();
        }
        if lowest < margin * 0.5 {
            self.jump_armed = true;
        }

        let duck = self.duck.update(is_fist(sides.left) && is_fist(sides.right));

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
