//! The gesture-profile seam and the per-session [`Classifier`] that owns one.

use std::collections::BTreeMap;
use std::time::Instant;

use runner_core::{Lane, ModeId, ModeProfile, MovementState};

use crate::error::SampleRejected;
use crate::landmarks::{Frame, LandmarkSnapshot};
use crate::profiles::{
    DisabledHandProfile, DisabledLegProfile, ElderlyProfile, KidsProfile, LegFreeProfile,
};

/// Named baseline scalars: one calibration sample, or an averaged baseline.
pub type CalibrationMap = BTreeMap<String, f32>;

/// Persisted field names.
pub mod keys {
    pub const TORSO_X:          &str = "pose_baseline_torso_x";
    pub const SHOULDER_Y:       &str = "pose_baseline_shoulder_y";
    pub const LEFT_WRIST_Y:     &str = "pose_baseline_left_wrist_y";
    pub const RIGHT_WRIST_Y:    &str = "pose_baseline_right_wrist_y";
    pub const SMOOTHED_LANE:    &str = "smoothed_lane";
    pub const LEFT_HAND_REST:   &str = "left_hand_rest_y";
    pub const RIGHT_HAND_REST:  &str = "right_hand_rest_y";
}

/// Overwrite `slot` if `map` has `key`.
pub(crate) fn load(map: &CalibrationMap, key: &str, slot: &mut Option<f32>) {
    if let Some(v) = map.get(key) {
        *slot = Some(*v);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureProfile trait
// ════════════════════════════════════════════════════════════════════════════

/// One accessibility profile's landmark → command mapping.
///
/// Implementations own all their rolling state (baselines, filters, hold
/// counters).  Frames that fail the profile's visibility gate must return an
/// untracked state and leave that state untouched.
pub trait GestureProfile: Send {
    fn id(&self) -> ModeId;

    fn classify(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> MovementState;

    /// Extract one neutral-pose calibration sample.
    fn sample(&self, snapshot: &LandmarkSnapshot) -> Result<CalibrationMap, SampleRejected>;

    /// Seed baselines from a saved or freshly averaged calibration.
    fn apply_calibration(&mut self, baseline: &CalibrationMap);

    /// Instruction shown on the calibration screen.
    fn calibration_hint(&self) -> &'static str;

    /// Continuous lane value, for overlays.
    fn smoothed_lane(&self) -> f32;
}

/// Build the profile for a mode.
pub fn build_profile(mode: &ModeProfile) -> Box<dyn GestureProfile> {
    match mode.id {
        ModeId::Kids         => Box::new(KidsProfile::new(mode)),
        ModeId::Elderly      => Box::new(ElderlyProfile::new(mode)),
        ModeId::DisabledHand => Box::new(DisabledHandProfile::new(mode)),
        ModeId::DisabledLeg  => Box::new(DisabledLegProfile::new(mode)),
        ModeId::LegFree      => Box::new(LegFreeProfile::new(mode)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

/// The active profile for a session, plus the fallback for missing frames.
pub struct Classifier {
    profile:   Box<dyn GestureProfile>,
    last_lane: Lane,
}

impl Classifier {
    pub fn new(mode: &ModeProfile) -> Self {
        log::info!("gesture profile {} active", mode.id);
        Classifier { profile: build_profile(mode), last_lane: Lane::CENTER }
    }

    pub fn with_profile(profile: Box<dyn GestureProfile>) -> Self {
        Classifier { profile, last_lane: Lane::CENTER }
    }

    pub fn id(&self) -> ModeId {
        self.profile.id()
    }

    /// Classify one frame.  Unavailable frames come back untracked with the
    /// fallback message and the last committed lane.
    pub fn classify(&mut self, frame: &Frame, now: Instant) -> MovementState {
        let state = match frame {
            Ok(snapshot) => self.profile.classify(snapshot, now),
            Err(why)     => MovementState::untracked(self.last_lane, why.to_string()),
        };
        if state.tracked {
            self.last_lane = state.lane;
        }
        log::debug!(
            "{} lane={} jump={} duck={} tracked={}",
            self.profile.id(), state.lane.index(), state.jump, state.duck, state.tracked
        );
        state
    }

    pub fn sample(&self, frame: &Frame) -> Result<CalibrationMap, SampleRejected> {
        match frame {
            Ok(snapshot) => self.profile.sample(snapshot),
            Err(why)     => Err(SampleRejected::Unavailable(*why)),
        }
    }

    pub fn apply_calibration(&mut self, baseline: &CalibrationMap) {
        if baseline.is_empty() {
            return;
        }
        self.profile.apply_calibration(baseline);
    }

    pub fn calibration_hint(&self) -> &'static str {
        self.profile.calibration_hint()
    }

    pub fn smoothed_lane(&self) -> f32 {
        self.profile.smoothed_lane()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Unavailable;

    #[test]
    fn every_mode_builds_its_own_profile() {
        for mode in ModeProfile::all() {
            assert_eq!(build_profile(&mode).id(), mode.id);
        }
    }

    #[test]
    fn unavailable_frame_is_untracked_with_fallback_message() {
        let mut c = Classifier::new(&ModeProfile::get(ModeId::Kids));
        let state = c.classify(&Err(Unavailable::CameraUnavailable), Instant::now());
        assert!(!state.tracked);
        assert!(!state.jump && !state.duck);
        assert_eq!(state.message, "Camera unavailable. Keyboard fallback: left/right + up/down.");

        let rejected = c.sample(&Err(Unavailable::FrameUnreadable)).unwrap_err();
        assert!(rejected.to_string().starts_with("Camera frame unavailable"));
    }
}
