//! Disabled hand: no wrist landmarks needed.  The torso and shoulders carry
//! every command.

use std::time::Instant;

use runner_core::{Lane, ModeId, ModeProfile, MovementState};

use super::{NO_POSE, POSE_SENSITIVITY_FLOOR};
use crate::error::SampleRejected;
use crate::filters::{drift, DuckFilter, HoldCounter, JumpCooldown, LaneSmoother};
use crate::landmarks::LandmarkSnapshot;
use crate::pose::{Torso, HIPS, SHOULDERS, TORSO, VISIBILITY};
use crate::profile::{keys, load, CalibrationMap, GestureProfile};

const GUIDANCE: &str = "Disabled Hand Mode: keep shoulders visible to control movement.";
const ACTIVE:   &str = "Disabled Hand Mode: lean torso/tilt shoulders to move, rise body to jump, small squat to duck.";
const HINT:     &str = "Stand upright with shoulders and hips visible, keep still briefly.";

const SHOULDER_VISIBILITY: f32 = 0.30;
const HIP_VISIBILITY:      f32 = 0.18;
/// Minimum shoulder width used to normalise tilt.
const MIN_SHOULDER_WIDTH:  f32 = 0.08;
const TILT_WEIGHT:         f32 = 0.08;

pub struct DisabledHandProfile {
    sensitivity:         f32,
    smoothing:           f32,
    baseline_torso_x:    Option<f32>,
    baseline_shoulder_y: Option<f32>,
    lane:                LaneSmoother,
    jump_hold:           HoldCounter,
    /// Cleared when a jump fires; set again once the shoulders settle.
    jump_armed:          bool,
    cooldown:            JumpCooldown,
    duck:                DuckFilter,
}

impl DisabledHandProfile {
    pub fn new(mode: &ModeProfile) -> Self {
        DisabledHandProfile {
            sensitivity:         mode.movement_sensitivity.max(POSE_SENSITIVITY_FLOOR),
            smoothing:           mode.lane_smoothing.max(0.24),
            baseline_torso_x:    None,
            baseline_shoulder_y: None,
            lane:                LaneSmoother::default(),
            jump_hold:           HoldCounter::new(3),
            jump_armed:          true,
            cooldown:            JumpCooldown::new(mode.jump_cooldown),
            duck:                DuckFilter::standard(),
        }
    }
}

impl GestureProfile for DisabledHandProfile {
    fn id(&self) -> ModeId { ModeId::DisabledHand }

    fn classify(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> MovementState {
        let Some(pose) = &snapshot.pose else {
            return MovementState::untracked(self.lane.lane(), NO_POSE);
        };
        if !pose.visible(&SHOULDERS, SHOULDER_VISIBILITY) {
            // A held rise must start over once the shoulders come back.
            self.jump_hold.reset();
            return MovementState::untracked(self.lane.lane(), GUIDANCE);
        }

        let s = self.sensitivity;
        let t = Torso::measure(pose, pose.visible(&HIPS, HIP_VISIBILITY));
        let width = t.shoulder_width.max(MIN_SHOULDER_WIDTH);
        let base_x = *self.baseline_torso_x.get_or_insert(t.torso_mid_x);
        let base_y = *self.baseline_shoulder_y.get_or_insert(t.shoulder_mid_y);

        // ── lane: lean, nudged by shoulder tilt ──────────────────────────
        let lateral = (t.torso_mid_x - base_x) - (t.tilt() / width) * TILT_WEIGHT;
        let threshold = 0.030 / s;
        let target = if lateral < -threshold {
            Lane::LEFT
        } else if lateral > threshold {
            Lane::RIGHT
        } else {
            Lane::CENTER
        };
        let lane = self.lane.update(target, self.smoothing);

        // ── jump / duck from vertical shoulder shift ─────────────────────
        let up   = base_y - t.shoulder_mid_y;
        let down = t.shoulder_mid_y - base_y;
        let jump_threshold = 0.040 / s;
        let duck_threshold = 0.052 / s;

        let rising = up > jump_threshold;
        if !rising {
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
        if up < jump_threshold * 0.45 {
            self.jump_armed = true;
        }

        let duck = self.duck.update(down > duck_threshold);

        let neutral = up.abs() < jump_threshold * 0.55 && down < duck_threshold * 0.55;
        if neutral {
            self.baseline_shoulder_y = Some(drift(base_y, t.shoulder_mid_y, 0.95));
            self.baseline_torso_x    = Some(drift(base_x, t.torso_mid_x, 0.94));
        }

        MovementState::tracked(lane, ACTIVE).with_jump(jump).with_duck(duck)
    }

    fn sample(&self, snapshot: &LandmarkSnapshot) -> Result<CalibrationMap, SampleRejected> {
        let pose = snapshot.pose.as_ref().ok_or(SampleRejected::NoPose)?;
        if !pose.visible(&TORSO, VISIBILITY) {
            return Err(SampleRejected::LowVisibility(GUIDANCE));
        }
        let t = Torso::measure(pose, true);
        Ok(CalibrationMap::from([
            (keys::TORSO_X.to_string(),       t.torso_mid_x),
            (keys::SHOULDER_Y.to_string(),    t.shoulder_mid_y),
            (keys::SMOOTHED_LANE.to_string(), 1.0),
        ]))
    }

    fn apply_calibration(&mut self, baseline: &CalibrationMap) {
        load(baseline, keys::TORSO_X,    &mut self.baseline_torso_x);
        load(baseline, keys::SHOULDER_Y, &mut self.baseline_shoulder_y);
        if let Some(v) = baseline.get(keys::SMOOTHED_LANE) {
            self.lane.set(*v);
        }
    }

    fn calibration_hint(&self) -> &'static str { HINT }

    fn smoothed_lane(&self) -> f32 { self.lane.value() }
}
