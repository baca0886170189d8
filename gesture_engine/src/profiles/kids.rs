//! Kids: big, obvious whole-body gestures.
//!
//! Lean the torso to change lane, throw both hands up to jump, bend forward
//! (or crouch) to duck.

use std::time::Instant;

use runner_core::{Lane, ModeId, ModeProfile, MovementState};

use super::{NO_POSE, POSE_SENSITIVITY_FLOOR};
use crate::error::SampleRejected;
use crate::filters::{drift, DuckFilter, HoldCounter, JumpCooldown, LaneSmoother};
use crate::landmarks::LandmarkSnapshot;
use crate::pose::{Torso, UPPER_BODY, VISIBILITY};
use crate::profile::{keys, load, CalibrationMap, GestureProfile};

const GUIDANCE: &str = "Kids Mode: keep nose, shoulders, wrists, and hips visible.";
const ACTIVE:   &str = "Kids Mode: lean wide to move, both hands high to jump, bend forward to duck.";
const HINT:     &str = "Stand centered with hands relaxed. Keep body visible and still.";

pub struct KidsProfile {
    sensitivity:    f32,
    smoothing:      f32,
    baseline_torso_x:    Option<f32>,
    baseline_shoulder_y: Option<f32>,
    rest_left_wrist_y:   Option<f32>,
    rest_right_wrist_y:  Option<f32>,
    lane:           LaneSmoother,
    jump_hold:      HoldCounter,
    cooldown:       JumpCooldown,
    duck:           DuckFilter,
}

impl KidsProfile {
    pub fn new(mode: &ModeProfile) -> Self {
        KidsProfile {
            sensitivity: mode.movement_sensitivity.max(POSE_SENSITIVITY_FLOOR),
            smoothing:   mode.lane_smoothing.max(0.24),
            baseline_torso_x:    None,
            baseline_shoulder_y: None,
            rest_left_wrist_y:   None,
            rest_right_wrist_y:  None,
            lane:        LaneSmoother::default(),
            jump_hold:   HoldCounter::new(2),
            cooldown:    JumpCooldown::new(mode.jump_cooldown),
            duck:        DuckFilter::standard(),
        }
    }
}

impl GestureProfile for KidsProfile {
    fn id(&self) -> ModeId { ModeId::Kids }

    fn classify(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> MovementState {
        let Some(pose) = &snapshot.pose else {
            return MovementState::untracked(self.lane.lane(), NO_POSE);
        };
        if !pose.visible(&UPPER_BODY, VISIBILITY) {
            return MovementState::untracked(self.lane.lane(), GUIDANCE);
        }

        let s = self.sensitivity;
        let t = Torso::measure(pose, true);
        let base_x = *self.baseline_torso_x.get_or_insert(t.torso_mid_x);
        let base_y = *self.baseline_shoulder_y.get_or_insert(t.shoulder_mid_y);

        // ── lane: torso lean ─────────────────────────────────────────────
        let threshold = (t.shoulder_width * (0.31 / s)).max(0.03);
        let delta = t.torso_mid_x - base_x;
        let target = if delta < -threshold {
            Lane::LEFT
        } else if delta > threshold {
            Lane::RIGHT
        } else {
            Lane::CENTER
        };
        let lane = self.lane.update(target, self.smoothing);
        if delta.abs() < threshold * 0.60 {
            self.baseline_torso_x = Some(drift(base_x, t.torso_mid_x, 0.92));
        }

        // ── jump: both hands well above the shoulders ────────────────────
        let margin = 0.055 / s;
        let mut jump_pose = t.left_wrist.y < t.left_shoulder.y - margin
            && t.right_wrist.y < t.right_shoulder.y - margin;
        if let (Some(rl), Some(rr)) = (self.rest_left_wrist_y, self.rest_right_wrist_y) {
            let rise = 0.13 / s;
            jump_pose &= t.left_wrist.y < rl - rise && t.right_wrist.y < rr - rise;
        }
        let jump = self.jump_hold.update(jump_pose) && self.cooldown.try_fire(now);

        // ── duck: forward bend or crouch ─────────────────────────────────
        let down_pose = t.nose.y > t.shoulder_mid_y + 0.078 / s
            || t.shoulder_mid_y > base_y + 0.05 / s;
        let duck = self.duck.update(down_pose);
        if !down_pose {
            self.baseline_shoulder_y = Some(drift(base_y, t.shoulder_mid_y, 0.96));
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
        load(baseline, keys::TORSO_X,       &mut self.baseline_torso_x);
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

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::pose_index as P;
    use crate::profiles::fixtures::PoseBuilder;
    use std::time::Duration;

    fn kids() -> KidsProfile {
        KidsProfile::new(&ModeProfile::get(ModeId::Kids))
    }

    #[test]
    fn leaning_left_reaches_left_lane_within_five_frames() {
        let mut p = kids();
        let t0 = Instant::now();
        // First frame seeds the torso baseline at the neutral position.
        let first = p.classify(&PoseBuilder::default().snapshot(), t0);
        assert_eq!(first.lane, Lane::CENTER);

        // Shoulder width 0.20 → threshold 0.20 * 0.31 / 1.18 ≈ 0.053
        let lean = PoseBuilder::default().shift_x(-0.10).snapshot();
        let expected = [1.0, 0.7, 0.49, 0.343, 0.2401, 0.16807];
        let mut last = Lane::CENTER;
        for k in 1..=5 {
            let state = p.classify(&lean, t0 + Duration::from_millis(33 * k));
            assert!(state.tracked);
            assert!((p.smoothed_lane() - expected[k as usize]).abs() < 1e-4);
            last = state.lane;
            if k >= 2 {
                assert_eq!(state.lane, Lane::LEFT, "frame {k}");
            }
        }
        assert_eq!(last, Lane::LEFT);
    }

    #[test]
    fn low_visibility_is_untracked_and_keeps_baselines() {
        let mut p = kids();
        let t0 = Instant::now();
        p.classify(&PoseBuilder::default().snapshot(), t0);
        let torso = p.baseline_torso_x;
        let shoulder = p.baseline_shoulder_y;
        let lane = p.smoothed_lane();

        let hidden = PoseBuilder::default()
            .shift_x(-0.2)
            .shift_shoulders_y(0.1)
            .visibility(P::LEFT_WRIST, 0.2)
            .snapshot();
        for _ in 0..10 {
            let state = p.classify(&hidden, t0);
            assert!(!state.tracked);
            assert_eq!(state.message, GUIDANCE);
        }
        assert_eq!(p.baseline_torso_x, torso);
        assert_eq!(p.baseline_shoulder_y, shoulder);
        assert_eq!(p.smoothed_lane(), lane);
    }

    #[test]
    fn both_hands_up_jumps_after_two_frames_then_cools_down() {
        let mut p = kids();
        let t0 = Instant::now();
        p.classify(&PoseBuilder::default().snapshot(), t0);
        let up = PoseBuilder::default().wrists_at(0.38, 0.10, 0.62, 0.10).snapshot();

        assert!(!p.classify(&up, t0 + Duration::from_millis(33)).jump);
        assert!(p.classify(&up, t0 + Duration::from_millis(66)).jump);
        assert!(!p.classify(&up, t0 + Duration::from_millis(300)).jump);
        assert!(p.classify(&up, t0 + Duration::from_millis(520)).jump);
    }

    #[test]
    fn single_bend_frame_does_not_duck() {
        let mut p = kids();
        let t0 = Instant::now();
        let neutral = PoseBuilder::default().snapshot();
        let bend = PoseBuilder::default().nose_y(0.50).snapshot();
        p.classify(&neutral, t0);
        assert!(!p.classify(&bend, t0).duck);
        for _ in 0..30 {
            assert!(!p.classify(&neutral, t0).duck);
        }
        let held: Vec<bool> = (0..5).map(|_| p.classify(&bend, t0).duck).collect();
        assert_eq!(held, [false, false, false, true, true]);
    }

    #[test]
    fn calibration_sample_carries_pose_baselines() {
        let p = kids();
        let s = p.sample(&PoseBuilder::default().snapshot()).unwrap();
        assert!((s[keys::TORSO_X] - 0.5).abs() < 1e-6);
        assert!((s[keys::SHOULDER_Y] - 0.35).abs() < 1e-6);
        assert!((s[keys::LEFT_WRIST_Y] - 0.65).abs() < 1e-6);
        assert_eq!(s[keys::SMOOTHED_LANE], 1.0);

        let hidden = PoseBuilder::default().visibility(P::NOSE, 0.1).snapshot();
        assert_eq!(p.sample(&hidden), Err(SampleRejected::LowVisibility(GUIDANCE)));
    }

    #[test]
    fn calibrated_rest_wrists_raise_the_jump_bar() {
        let mut p = kids();
        let mut base = CalibrationMap::new();
        base.insert(keys::LEFT_WRIST_Y.into(), 0.40);
        base.insert(keys::RIGHT_WRIST_Y.into(), 0.40);
        p.apply_calibration(&base);
        let t0 = Instant::now();
        // Above shoulders but only 0.1 above rest (needs 0.13 / 1.18 ≈ 0.11)
        let half = PoseBuilder::default().wrists_at(0.38, 0.30, 0.62, 0.30).snapshot();
        for k in 0..4 {
            assert!(!p.classify(&half, t0 + Duration::from_millis(40 * k)).jump);
        }
    }
}
