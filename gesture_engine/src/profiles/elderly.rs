//! Elderly: calm, deliberate arm movements with extra debouncing.

use std::time::Instant;

use runner_core::{Lane, ModeId, ModeProfile, MovementState};

use super::{NO_POSE, POSE_SENSITIVITY_FLOOR};
use crate::error::SampleRejected;
use crate::filters::{drift, DuckFilter, HoldCounter, JumpCooldown, LaneSmoother};
use crate::landmarks::LandmarkSnapshot;
use crate::pose::{Torso, UPPER_BODY, VISIBILITY};
use crate::profile::{keys, load, CalibrationMap, GestureProfile};

const GUIDANCE: &str = "Elderly Mode: keep shoulders, wrists, and hips visible.";
const ACTIVE:   &str = "Elderly Mode: both hands left/right to move, slow raise above head to jump.";
const HINT:     &str = "Stand naturally and keep both hands visible near a comfortable rest position.";

/// The trailing wrist only has to reach this fraction of the side threshold.
const TRAILING_WRIST: f32 = 0.72;

pub struct ElderlyProfile {
    sensitivity:         f32,
    smoothing:           f32,
    baseline_shoulder_y: Option<f32>,
    rest_left_wrist_y:   Option<f32>,
    rest_right_wrist_y:  Option<f32>,
    lane:                LaneSmoother,
    jump_hold:           HoldCounter,
    cooldown:            JumpCooldown,
    duck:                DuckFilter,
}

impl ElderlyProfile {
    pub fn new(mode: &ModeProfile) -> Self {
        ElderlyProfile {
            sensitivity:         mode.movement_sensitivity.max(POSE_SENSITIVITY_FLOOR),
            smoothing:           mode.lane_smoothing.min(0.16),
            baseline_shoulder_y: None,
            rest_left_wrist_y:   None,
            rest_right_wrist_y:  None,
            lane:                LaneSmoother::default(),
            jump_hold:           HoldCounter::new(3),
            cooldown:            JumpCooldown::new(mode.jump_cooldown),
            duck:                DuckFilter::new(0.82, 0.18, 0.48),
        }
    }
}

impl GestureProfile for ElderlyProfile {
    fn id(&self) -> ModeId { ModeId::Elderly }

    fn classify(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> MovementState {
        let Some(pose) = &snapshot.pose else {
            return MovementState::untracked(self.lane.lane(), NO_POSE);
        };
        if !pose.visible(&UPPER_BODY, VISIBILITY) {
            return MovementState::untracked(self.lane.lane(), GUIDANCE);
        }

        let s = self.sensitivity;
        let t = Torso::measure(pose, true);
        let base_y = *self.baseline_shoulder_y.get_or_insert(t.shoulder_mid_y);

        // Both wrists out to the same side.
        let side = (t.shoulder_width * (0.56 / s)).max(0.05);
        let mid = t.shoulder_mid_x;
        let both_left = t.left_wrist.x < mid - side
            && t.right_wrist.x < mid - side * TRAILING_WRIST;
        let both_right = t.left_wrist.x > mid + side * TRAILING_WRIST
            && t.right_wrist.x > mid + side;
        let target = match (both_left, both_right) {
            (true, _)     => Lane::LEFT,
            (false, true) => Lane::RIGHT,
            _             => Lane::CENTER,
        };
        let lane = self.lane.update(target, self.smoothing);

        // Both hands above the head, held for three frames.
        let over_nose = t.nose.y - 0.01 / s;
        let mut raised = t.left_wrist.y < over_nose && t.right_wrist.y < over_nose;
        if let (Some(rl), Some(rr)) = (self.rest_left_wrist_y, self.rest_right_wrist_y) {
            let rise = 0.09 / s;
            raised &= t.left_wrist.y < rl - rise && t.right_wrist.y < rr - rise;
        }
        let jump = self.jump_hold.update(raised) && self.cooldown.try_fire(now);
        if jump {
            self.jump_hold.reset();
        }

        let forward_bend  = t.nose.y > t.shoulder_mid_y + 0.098 / s;
        let shoulder_drop = t.shoulder_mid_y > base_y + 0.038 / s;
        let duck = self.duck.update(forward_bend || shoulder_drop);
        if !duck {
            self.baseline_shoulder_y = Some(drift(base_y, t.shoulder_mid_y, 0.98));
        }

        MovementState::tracked(lane, ACTIVE).with_jump(jump).with_duck(duck)
    }

    fn sample(&self, snapshot: &LandmarkSnapshot) -> Result<CalibrationMap, SampleRejected> {
        let pose = snapshot.pose.as_ref().ok_or(SampleRejected::NoPose)?;
        if !pose.visible(&UPPER_BODY, VISIBILITY) {
            return Err(SampleRejected::LowVisibility(GUIDANCE));
        }
        let t = Torso::measure(pose, true);
        Ok(CalibrationMap::from([
            (keys::TORSO_X.to_string(),       t.torso_mid_x),
            (keys::SHOULDER_Y.to_string(),    t.shoulder_mid_y),
            (keys::LEFT_WRIST_Y.to_string(),  t.left_wrist.y),
            (keys::RIGHT_WRIST_Y.to_string(), t.right_wrist.y),
            (keys::SMOOTHED_LANE.to_string(), 1.0),
        ]))
    }

    fn apply_calibration(&mut self, baseline: &CalibrationMap) {
        load(baseline, keys::SHOULDER_Y,    &mut self.baseline_shoulder_y);
        load(baseline, keys::LEFT_WRIST_Y,  &mut self.rest_left_wrist_y);
        load(baseline, keys::RIGHT_WRIST_Y, &mut self.rest_right_wrist_y);
        if let Some(v) = baseline.get(keys::SMOOTHED_LANE) {
            self.lane.set(*v);
        }
    }

    fn calibration_hint(&self) -> &'static str { HINT }

    fn smoothed_lane(&self) -> f32 { self.lane.value() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::fixtures::PoseBuilder;
    use std::time::Duration;

    fn elderly() -> ElderlyProfile {
        ElderlyProfile::new(&ModeProfile::get(ModeId::Elderly))
    }

    #[test]
    fn smoothing_is_capped_for_calm_lane_changes() {
        assert_eq!(elderly().smoothing, 0.14);
        let mut fast = ModeProfile::get(ModeId::Elderly);
        fast.lane_smoothing = 0.5;
        assert_eq!(ElderlyProfile::new(&fast).smoothing, 0.16);
    }

    #[test]
    fn both_hands_left_moves_left_eventually() {
        let mut p = elderly();
        let t0 = Instant::now();
        // side threshold = max(0.05, 0.20 * 0.56 / 0.72) ≈ 0.156
        let reach = PoseBuilder::default().wrists_at(0.20, 0.45, 0.32, 0.45).snapshot();
        let lanes: Vec<Lane> = (0..8).map(|_| p.classify(&reach, t0).lane).collect();
        assert_eq!(lanes[0], Lane::CENTER);
        assert_eq!(*lanes.last().unwrap(), Lane::LEFT);
    }

    #[test]
    fn jump_needs_three_held_frames_and_resets_after_firing() {
        let mut p = elderly();
        let t0 = Instant::now();
        let up = PoseBuilder::default().wrists_at(0.40, 0.10, 0.60, 0.10).snapshot();
        let fired: Vec<bool> = (0..7)
            .map(|k| p.classify(&up, t0 + Duration::from_secs(k)).jump)
            .collect();
        assert_eq!(fired, [false, false, true, false, false, true, false]);
    }

    #[test]
    fn ducks_on_sustained_shoulder_drop() {
        let mut p = elderly();
        let t0 = Instant::now();
        p.classify(&PoseBuilder::default().snapshot(), t0);
        let crouch = PoseBuilder::default().shift_shoulders_y(0.08).snapshot();
        assert!(!p.classify(&crouch, t0).duck);
        let later: Vec<bool> = (0..6).map(|_| p.classify(&crouch, t0).duck).collect();
        assert!(later.last().copied().unwrap_or(false));
    }
}
