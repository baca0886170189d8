//! Calibration capture: collect neutral-pose samples from the live classifier,
//! average them into a baseline, save it and hand it back to the classifier.
//! A baseline that cannot be saved is still used for this session.
//!
//! ```text
//! Idle ─start─► Sampling ─(target reached)─► Finalizing ─► Done
//!                  │  ▲                                      ▲
//!                  │  └─restart_capture                      │
//!                  ├─skip (saved profile only) ──────────────┘
//!                  └─abort ─► Aborted
//! ```

use std::collections::BTreeMap;

use runner_core::{ControlScheme, ModeProfile};

use crate::landmarks::Frame;
use crate::profile::{CalibrationMap, Classifier};
use crate::store::CalibrationStore;

pub const TARGET_SAMPLES: usize = 45;

const STATUS_START: &str = "Hold a neutral position...";
const STATUS_POSE:  &str = "Hold still in a neutral position...";
const STATUS_HAND:  &str = "Hold your hands steady...";
pub const STATUS_SAVED: &str = "Calibration saved.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationPhase {
    Idle,
    Sampling,
    Finalizing,
    Done,
    Aborted,
}

pub struct CalibrationSession {
    mode:              ModeProfile,
    phase:             CalibrationPhase,
    samples:           Vec<CalibrationMap>,
    target:            usize,
    status:            String,
    has_saved_profile: bool,
}

impl CalibrationSession {
    pub fn new(mode: ModeProfile) -> Self {
        CalibrationSession {
            mode,
            phase:             CalibrationPhase::Idle,
            samples:           Vec::with_capacity(TARGET_SAMPLES),
            target:            TARGET_SAMPLES,
            status:            STATUS_START.to_string(),
            has_saved_profile: false,
        }
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target.max(1);
        self
    }

    /// Enter sampling.  A previously saved baseline is applied to the
    /// classifier straight away so skipping keeps it.
    pub fn start(&mut self, classifier: &mut Classifier, store: &dyn CalibrationStore) {
        let saved = store.get(self.mode.id);
        self.has_saved_profile = !saved.is_empty();
        classifier.apply_calibration(&saved);
        self.clear();
        self.phase = CalibrationPhase::Sampling;
        log::info!(
            "calibrating {} (saved profile: {})",
            self.mode.id,
            if self.has_saved_profile { "yes" } else { "no" }
        );
    }

    /// One frame of sampling.  Returns the phase after the frame.
    pub fn tick(
        &mut self,
        classifier: &mut Classifier,
        frame: &Frame,
        store: &mut dyn CalibrationStore,
    ) -> CalibrationPhase {
        if self.phase != CalibrationPhase::Sampling {
            return self.phase;
        }
        match classifier.sample(frame) {
            Ok(sample) => {
                self.samples.push(sample);
                self.status = match self.mode.control_scheme {
                    ControlScheme::Pose => STATUS_POSE,
                    ControlScheme::Hand => STATUS_HAND,
                }
                .to_string();
            }
            Err(why) => self.status = why.to_string(),
        }
        if self.samples.len() >= self.target {
            self.finalize(classifier, store);
        }
        self.phase
    }

    /// Average what has been collected, save it and apply it.  Without any
    /// samples nothing is saved and the session keeps sampling.  A failed
    /// save still finishes with the baseline applied; the status line says so.
    pub fn finalize(&mut self, classifier: &mut Classifier, store: &mut dyn CalibrationStore) -> bool {
        if self.samples.is_empty() {
            log::warn!("calibration for {} finished with no samples; keeping saved profile", self.mode.id);
            return false;
        }
        self.phase = CalibrationPhase::Finalizing;
        let baseline = average(&self.samples);
        match store.save(self.mode.id, &baseline) {
            Ok(()) => {
                self.has_saved_profile = true;
                self.status = STATUS_SAVED.to_string();
            }
            Err(e) => {
                log::warn!("calibration for {} not saved: {e}", self.mode.id);
                self.status = format!("Calibration applied but not saved: {e}");
            }
        }
        classifier.apply_calibration(&baseline);
        self.phase = CalibrationPhase::Done;
        log::info!(
            "calibration for {} finalised from {} samples ({} fields)",
            self.mode.id, self.samples.len(), baseline.len()
        );
        true
    }

    pub fn restart_capture(&mut self) {
        if self.phase == CalibrationPhase::Sampling {
            self.clear();
            log::info!("calibration capture restarted");
        }
    }

    /// Jump straight to `Done`, keeping the saved baseline.  Refused when
    /// this mode has never been calibrated.
    pub fn skip(&mut self) -> bool {
        if self.phase != CalibrationPhase::Sampling || !self.has_saved_profile {
            return false;
        }
        self.phase = CalibrationPhase::Done;
        log::info!("calibration skipped, using saved {} profile", self.mode.id);
        true
    }

    pub fn abort(&mut self) {
        self.phase = CalibrationPhase::Aborted;
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.status = STATUS_START.to_string();
    }

    pub fn phase(&self) -> CalibrationPhase { self.phase }

    pub fn status(&self) -> &str { &self.status }

    pub fn has_saved_profile(&self) -> bool { self.has_saved_profile }

    pub fn samples_collected(&self) -> usize { self.samples.len() }

    pub fn mode(&self) -> &ModeProfile { &self.mode }

    /// Fraction of the target collected, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        (self.samples.len() as f32 / self.target as f32).min(1.0)
    }
}

/// Per-field arithmetic mean.  A field missing from some samples is averaged
/// over the samples that carry it.
pub fn average(samples: &[CalibrationMap]) -> CalibrationMap {
    let mut totals: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
    for sample in samples {
        for (key, value) in sample {
            let slot = totals.entry(key.as_str()).or_insert((0.0, 0));
            slot.0 += f64::from(*value);
            slot.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(key, (sum, n))| (key.to_string(), (sum / f64::from(n)) as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::tests::synthetic_hand;
    use crate::landmarks::{Handedness, LandmarkSnapshot, Unavailable};
    use crate::profile::keys;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use crate::error::{SampleRejected, StoreError};
    use crate::profile::GestureProfile;
    use crate::store::MemoryStore;
    use runner_core::{ModeId, MovementState};

    /// Accepts every frame and records what calibration it is handed.
    struct RecordingProfile(Arc<Mutex<Vec<CalibrationMap>>>);

    impl GestureProfile for RecordingProfile {
        fn id(&self) -> ModeId { ModeId::LegFree }

        fn classify(&mut self, _: &LandmarkSnapshot, _: Instant) -> MovementState {
            MovementState::default()
        }

        fn sample(&self, _: &LandmarkSnapshot) -> Result<CalibrationMap, SampleRejected> {
            Ok(map(&[(keys::LEFT_HAND_REST, 0.6)]))
        }

        fn apply_calibration(&mut self, baseline: &CalibrationMap) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(baseline.clone());
            }
        }

        fn calibration_hint(&self) -> &'static str { "" }

        fn smoothed_lane(&self) -> f32 { 1.0 }
    }

    /// Read-only disk: nothing saved, ever.
    struct ReadOnlyStore;

    impl CalibrationStore for ReadOnlyStore {
        fn get(&self, _mode: ModeId) -> CalibrationMap {
            CalibrationMap::new()
        }

        fn save(&mut self, _mode: ModeId, _baseline: &CalibrationMap) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path:   "/read-only/cal.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn map(pairs: &[(&str, f32)]) -> CalibrationMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn hands_frame(y: f32) -> Frame {
        Ok(LandmarkSnapshot {
            pose:  None,
            hands: vec![
                synthetic_hand(Handedness::Left,  0.25, y, true),
                synthetic_hand(Handedness::Right, 0.75, y, true),
            ],
        })
    }

    fn leg_free() -> (ModeProfile, Classifier) {
        let mode = ModeProfile::get(ModeId::LegFree);
        (mode, Classifier::new(&mode))
    }

    #[test]
    fn average_is_per_field_and_order_independent() {
        let a = map(&[("x", 1.0), ("y", 10.0)]);
        let b = map(&[("x", 2.0)]);
        let c = map(&[("x", 6.0), ("y", 20.0)]);
        let forward = average(&[a.clone(), b.clone(), c.clone()]);
        let backward = average(&[c, b, a]);
        assert!((forward["x"] - 3.0).abs() < 1e-6);
        assert!((forward["y"] - 15.0).abs() < 1e-6);
        assert_eq!(forward, backward);
        assert!(average(&[]).is_empty());
    }

    #[test]
    fn collects_target_samples_then_saves_and_applies() {
        let (mode, mut c) = leg_free();
        let mut store = MemoryStore::new();
        let mut session = CalibrationSession::new(mode).with_target(4);
        session.start(&mut c, &store);
        assert_eq!(session.phase(), CalibrationPhase::Sampling);
        assert!(!session.has_saved_profile());

        for expected in [0.25, 0.5, 0.75] {
            let phase = session.tick(&mut c, &hands_frame(0.6), &mut store);
            assert_eq!(phase, CalibrationPhase::Sampling);
            assert_eq!(session.progress(), expected);
            assert_eq!(session.status(), STATUS_HAND);
        }
        let phase = session.tick(&mut c, &hands_frame(0.6), &mut store);
        assert_eq!(phase, CalibrationPhase::Done);
        assert!(session.has_saved_profile());
        assert_eq!(session.status(), STATUS_SAVED);
        let saved = store.get(ModeId::LegFree);
        assert!((saved[keys::LEFT_HAND_REST] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn rejected_frames_update_status_without_progress() {
        let (mode, mut c) = leg_free();
        let mut store = MemoryStore::new();
        let mut session = CalibrationSession::new(mode);
        session.start(&mut c, &store);
        session.tick(&mut c, &Err(Unavailable::NoLandmarks), &mut store);
        assert_eq!(session.progress(), 0.0);
        assert_eq!(session.status(), Unavailable::NoLandmarks.to_string());
    }

    #[test]
    fn zero_samples_leaves_saved_profile_untouched() {
        let (mode, mut c) = leg_free();
        let mut store = MemoryStore::new();
        let old = map(&[(keys::LEFT_HAND_REST, 0.7)]);
        store.save(ModeId::LegFree, &old).unwrap();
        let mut session = CalibrationSession::new(mode);
        session.start(&mut c, &store);
        assert!(!session.finalize(&mut c, &mut store));
        assert_eq!(session.phase(), CalibrationPhase::Sampling);
        assert_eq!(store.get(ModeId::LegFree), old);
    }

    #[test]
    fn failed_save_still_applies_the_baseline() {
        let (mode, _) = leg_free();
        let applied = Arc::new(Mutex::new(Vec::new()));
        let mut c = Classifier::with_profile(Box::new(RecordingProfile(applied.clone())));
        let mut store = ReadOnlyStore;
        let mut session = CalibrationSession::new(mode).with_target(2);
        session.start(&mut c, &store);
        session.tick(&mut c, &hands_frame(0.6), &mut store);
        let phase = session.tick(&mut c, &hands_frame(0.6), &mut store);

        assert_eq!(phase, CalibrationPhase::Done);
        assert!(!session.has_saved_profile());
        assert!(session.status().starts_with("Calibration applied but not saved"));
        assert!(session.status().contains("read-only"));
        let applied = applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert!((applied[0][keys::LEFT_HAND_REST] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn skip_needs_a_saved_profile() {
        let (mode, mut c) = leg_free();
        let mut store = MemoryStore::new();
        let mut session = CalibrationSession::new(mode);
        session.start(&mut c, &store);
        assert!(!session.skip());
        assert_eq!(session.phase(), CalibrationPhase::Sampling);

        store.save(ModeId::LegFree, &map(&[(keys::LEFT_HAND_REST, 0.7)])).unwrap();
        session.start(&mut c, &store);
        assert!(session.skip());
        assert_eq!(session.phase(), CalibrationPhase::Done);
    }

    #[test]
    fn restart_clears_samples_but_stays_sampling() {
        let (mode, mut c) = leg_free();
        let mut store = MemoryStore::new();
        let mut session = CalibrationSession::new(mode);
        session.start(&mut c, &store);
        for _ in 0..5 {
            session.tick(&mut c, &hands_frame(0.6), &mut store);
        }
        assert_eq!(session.samples_collected(), 5);
        session.restart_capture();
        assert_eq!(session.samples_collected(), 0);
        assert_eq!(session.status(), STATUS_START);
        assert_eq!(session.phase(), CalibrationPhase::Sampling);
    }

    #[test]
    fn abort_stops_sampling() {
        let (mode, mut c) = leg_free();
        let mut store = MemoryStore::new();
        let mut session = CalibrationSession::new(mode);
        session.start(&mut c, &store);
        session.abort();
        let phase = session.tick(&mut c, &hands_frame(0.6), &mut store);
        assert_eq!(phase, CalibrationPhase::Aborted);
        assert_eq!(session.samples_collected(), 0);
    }
}
