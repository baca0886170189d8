//! Top-level application state machine.
//!
//! ```text
//!   Calibrating ──(samples done / S with saved profile)──► Playing
//!        │                                                  │  ▲
//!        Esc                                            crash  R/Enter/Space/jump
//!        ▼                                                  ▼  │
//!   back to mode select ◄──────────── Esc / M ──────────── GameOver
//! ```
//!
//! `AppState` owns the classifier, the calibration session, the store and the
//! run.  It never touches the window: the visualizer turns key presses into
//! [`InputFrame`]s and draws whatever `AppState` exposes, so the whole flow is
//! testable with scripted frames.

use std::path::PathBuf;
use std::time::Instant;

use gesture_engine::{
    CalibrationPhase, CalibrationSession, CalibrationStore, Classifier, Frame, JsonFileStore,
};
use runner_core::{
    GroundPlaneCamera, KeyboardState, ModeId, ModeProfile, MovementState, PerspectiveCamera,
    Projection, RunSession, TickOutcome,
};

use crate::error::AppError;
use crate::source::{JsonLinesSource, LandmarkSource, NullSource};
use crate::visualizer::Visualizer;

/// Longest simulated step; a stalled frame must not teleport the world.
const MAX_DT: f32 = 0.1;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub mode:             ModeId,
    pub calibration_path: PathBuf,
    /// Helper command printing JSON landmark lines.  `None` means keyboard
    /// only (or the LeapMotion device with the `leap` feature).
    pub landmarks:        Option<String>,
    pub seed:             u64,
    /// Ground-plane projection instead of the perspective camera.
    pub flat:             bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mode:             ModeId::Kids,
            calibration_path: PathBuf::from("config/user_calibration.json"),
            landmarks:        None,
            seed:             0x5eed,
            flat:             false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Input and screens
// ════════════════════════════════════════════════════════════════════════════

/// One-shot keys the state machine reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKey {
    R,
    S,
    M,
    Escape,
    Enter,
    Space,
}

/// Keyboard state for one frame: held arrows plus keys pressed this frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputFrame {
    pub arrows:  KeyboardState,
    pub pressed: Vec<ControlKey>,
}

impl InputFrame {
    pub fn pressed(&self, key: ControlKey) -> bool {
        self.pressed.contains(&key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Calibrating,
    Playing,
    GameOver,
}

/// Why the window loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    Quit,
    BackToModeSelect,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    mode:        ModeProfile,
    screen:      Screen,
    classifier:  Classifier,
    calibration: CalibrationSession,
    store:       Box<dyn CalibrationStore>,
    session:     RunSession,
    controls:    MovementState,
    pub status:  String,
}

impl AppState {
    /// Start in calibration for `mode`.
    pub fn new(mode: ModeId, store: Box<dyn CalibrationStore>, seed: u64) -> Self {
        let profile = ModeProfile::get(mode);
        log::info!("mode {} selected", profile.id.label());
        let mut classifier = Classifier::new(&profile);
        let mut calibration = CalibrationSession::new(profile);
        calibration.start(&mut classifier, &*store);
        AppState {
            mode:     profile,
            screen:   Screen::Calibrating,
            classifier,
            status:   calibration.status().to_string(),
            calibration,
            store,
            session:  RunSession::new(profile, seed),
            controls: MovementState::default(),
        }
    }

    /// Advance one frame.  `Some(exit)` ends the window loop.
    pub fn step(&mut self, frame: &Frame, input: &InputFrame, dt: f32, now: Instant) -> Option<Exit> {
        let dt = dt.clamp(0.0, MAX_DT);
        match self.screen {
            Screen::Calibrating => self.step_calibration(frame, input),
            Screen::Playing     => self.step_playing(frame, input, dt, now),
            Screen::GameOver    => self.step_game_over(frame, input, now),
        }
    }

    fn step_calibration(&mut self, frame: &Frame, input: &InputFrame) -> Option<Exit> {
        if input.pressed(ControlKey::Escape) {
            self.calibration.abort();
            return Some(Exit::BackToModeSelect);
        }
        if input.pressed(ControlKey::R) {
            self.calibration.restart_capture();
        }
        if input.pressed(ControlKey::S) {
            if self.calibration.skip() {
                self.start_run("Using saved calibration.");
                return None;
            }
            self.status = "No saved profile for this mode yet.".to_string();
            return None;
        }

        let phase = self.calibration.tick(&mut self.classifier, frame, &mut *self.store);
        if phase == CalibrationPhase::Done {
            let status = self.calibration.status().to_string();
            self.start_run(&status);
        } else {
            self.status = self.calibration.status().to_string();
        }
        None
    }

    fn step_playing(&mut self, frame: &Frame, input: &InputFrame, dt: f32, now: Instant) -> Option<Exit> {
        if input.pressed(ControlKey::Escape) {
            return Some(Exit::BackToModeSelect);
        }
        self.controls = self.classifier.classify(frame, now);
        self.status = self.controls.message.clone();
        if self.session.tick(dt, &self.controls, input.arrows) == TickOutcome::Crashed {
            self.screen = Screen::GameOver;
            self.status = format!("Game over. Score {}", self.session.score);
        }
        None
    }

    fn step_game_over(&mut self, frame: &Frame, input: &InputFrame, now: Instant) -> Option<Exit> {
        if input.pressed(ControlKey::Escape) || input.pressed(ControlKey::M) {
            return Some(Exit::BackToModeSelect);
        }
        // Keep the classifier's filters warm so a gesture jump can restart.
        self.controls = self.classifier.classify(frame, now);
        let restart = [ControlKey::R, ControlKey::Enter, ControlKey::Space]
            .iter()
            .any(|&k| input.pressed(k));
        if restart || self.controls.jump {
            self.start_run("Run restarted.");
        }
        None
    }

    fn start_run(&mut self, status: &str) {
        self.session.restart();
        self.screen = Screen::Playing;
        self.status = status.to_string();
        log::info!("{}: {}", self.mode.id, status);
    }

    // ── accessors for the renderer ───────────────────────────────────────

    pub fn screen(&self)      -> Screen              { self.screen }
    pub fn mode(&self)        -> &ModeProfile        { &self.mode }
    pub fn session(&self)     -> &RunSession         { &self.session }
    pub fn calibration(&self) -> &CalibrationSession { &self.calibration }
    pub fn classifier(&self)  -> &Classifier         { &self.classifier }
    pub fn controls(&self)    -> &MovementState      { &self.controls }

    #[cfg(test)]
    fn session_mut(&mut self) -> &mut RunSession {
        &mut self.session
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the window loop
// ════════════════════════════════════════════════════════════════════════════

fn open_source(cfg: &AppConfig) -> Result<Box<dyn LandmarkSource>, AppError> {
    if let Some(command) = &cfg.landmarks {
        return Ok(Box::new(JsonLinesSource::spawn(command)?));
    }
    #[cfg(feature = "leap")]
    {
        return Ok(Box::new(crate::source::LeapLandmarkSource::start()?));
    }
    #[cfg(not(feature = "leap"))]
    {
        log::info!("no landmark source configured; keyboard only");
        Ok(Box::new(NullSource))
    }
}

/// Open the window and play `cfg.mode` until the window closes or the player
/// asks for the mode menu.
pub fn run(cfg: &AppConfig) -> Result<Exit, AppError> {
    if cfg.flat {
        run_with(cfg, GroundPlaneCamera::default())
    } else {
        run_with(cfg, PerspectiveCamera::default())
    }
}

fn run_with<P: Projection>(cfg: &AppConfig, camera: P) -> Result<Exit, AppError> {
    let store = JsonFileStore::open(&cfg.calibration_path);
    let mut source = open_source(cfg)?;
    let mut vis = Visualizer::new(camera)?;
    let mut app = AppState::new(cfg.mode, Box::new(store), cfg.seed);
    log::info!("landmarks from {}", source.name());

    let mut last = Instant::now();
    while vis.is_open() {
        let input = vis.poll_input();
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let frame = source.next_frame();
        if let Some(exit) = app.step(&frame, &input, dt, now) {
            return Ok(exit);
        }
        vis.render(&app)?;
    }
    Ok(Exit::Quit)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_engine::{
        keys, CalibrationMap, HandSnapshot, Handedness, Landmark, LandmarkSnapshot, MemoryStore,
        StoreError, Unavailable,
    };
    use runner_core::entities::{Obstacle, ObstacleKind};
    use runner_core::geometry::PLAYER_Z;
    use runner_core::Lane;

    use crate::source::ScriptedSource;

    const DT: f32 = 1.0 / 30.0;

    fn press(pressed: &[ControlKey]) -> InputFrame {
        InputFrame { arrows: KeyboardState::default(), pressed: pressed.to_vec() }
    }

    fn hand(side: Handedness, x: f32, y: f32) -> HandSnapshot {
        HandSnapshot { handedness: side, score: 1.0, points: vec![Landmark::new(x, y, 1.0); 21] }
    }

    fn resting_hands() -> Frame {
        Ok(LandmarkSnapshot {
            pose:  None,
            hands: vec![hand(Handedness::Left, 0.25, 0.6), hand(Handedness::Right, 0.75, 0.6)],
        })
    }

    fn saved(mode: ModeId) -> Box<MemoryStore> {
        let mut store = MemoryStore::new();
        store
            .save(mode, &CalibrationMap::from([(keys::LEFT_HAND_REST.to_string(), 0.6)]))
            .unwrap();
        Box::new(store)
    }

    struct ReadOnlyStore;

    impl CalibrationStore for ReadOnlyStore {
        fn get(&self, _mode: ModeId) -> CalibrationMap {
            CalibrationMap::new()
        }

        fn save(&mut self, _mode: ModeId, _baseline: &CalibrationMap) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path:   PathBuf::from("/read-only/cal.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn playing(mode: ModeId) -> AppState {
        let mut app = AppState::new(mode, saved(mode), 3);
        let lost = Err(Unavailable::NoLandmarks);
        app.step(&lost, &press(&[ControlKey::S]), DT, Instant::now());
        assert_eq!(app.screen(), Screen::Playing);
        app
    }

    fn crash(app: &mut AppState) {
        app.session_mut().level.obstacles.push(Obstacle {
            lane: Lane::CENTER,
            kind: ObstacleKind::JumpOver,
            z:    PLAYER_Z + 0.3,
        });
        let lost = Err(Unavailable::NoLandmarks);
        app.step(&lost, &InputFrame::default(), DT, Instant::now());
        assert_eq!(app.screen(), Screen::GameOver);
    }

    #[test]
    fn calibration_completes_into_playing_and_saves() {
        let mut app = AppState::new(ModeId::LegFree, Box::new(MemoryStore::new()), 1);
        assert_eq!(app.screen(), Screen::Calibrating);
        let mut source = ScriptedSource::new(std::iter::repeat_with(resting_hands).take(60));
        let t0 = Instant::now();
        let mut frames = 0;
        while app.screen() == Screen::Calibrating {
            let frame = source.next_frame();
            assert!(app.step(&frame, &InputFrame::default(), DT, t0).is_none());
            frames += 1;
            assert!(frames <= 60, "calibration never finished");
        }
        assert_eq!(frames, gesture_engine::TARGET_SAMPLES);
        assert_eq!(app.screen(), Screen::Playing);
        assert!(app.calibration().has_saved_profile());
        assert_eq!(app.status, "Calibration saved.");
    }

    #[test]
    fn unsaved_calibration_still_starts_the_run() {
        let mut app = AppState::new(ModeId::LegFree, Box::new(ReadOnlyStore), 1);
        let t0 = Instant::now();
        for _ in 0..gesture_engine::TARGET_SAMPLES {
            assert!(app.step(&resting_hands(), &InputFrame::default(), DT, t0).is_none());
        }
        assert_eq!(app.screen(), Screen::Playing);
        assert!(!app.calibration().has_saved_profile());
        assert!(app.status.starts_with("Calibration applied but not saved"));
    }

    #[test]
    fn skip_needs_a_saved_profile() {
        let mut app = AppState::new(ModeId::Kids, Box::new(MemoryStore::new()), 1);
        let lost = Err(Unavailable::CameraUnavailable);
        app.step(&lost, &press(&[ControlKey::S]), DT, Instant::now());
        assert_eq!(app.screen(), Screen::Calibrating);
        assert_eq!(app.status, "No saved profile for this mode yet.");

        let app = playing(ModeId::Kids);
        assert_eq!(app.status, "Using saved calibration.");
    }

    #[test]
    fn unavailable_frames_show_the_fallback_message_while_calibrating() {
        let mut app = AppState::new(ModeId::Elderly, Box::new(MemoryStore::new()), 1);
        let lost = Err(Unavailable::CameraUnavailable);
        app.step(&lost, &InputFrame::default(), DT, Instant::now());
        assert_eq!(app.status, Unavailable::CameraUnavailable.to_string());
        assert_eq!(app.calibration().samples_collected(), 0);
    }

    #[test]
    fn escape_returns_to_mode_select_from_every_screen() {
        let lost = Err(Unavailable::NoLandmarks);
        let esc = press(&[ControlKey::Escape]);

        let mut app = AppState::new(ModeId::Kids, Box::new(MemoryStore::new()), 1);
        assert_eq!(app.step(&lost, &esc, DT, Instant::now()), Some(Exit::BackToModeSelect));
        assert_eq!(app.calibration().phase(), CalibrationPhase::Aborted);

        let mut app = playing(ModeId::Kids);
        assert_eq!(app.step(&lost, &esc, DT, Instant::now()), Some(Exit::BackToModeSelect));

        let mut app = playing(ModeId::Kids);
        crash(&mut app);
        assert_eq!(app.step(&lost, &press(&[ControlKey::M]), DT, Instant::now()), Some(Exit::BackToModeSelect));
    }

    #[test]
    fn crash_then_restart_keeps_best_score() {
        let mut app = playing(ModeId::Kids);
        let lost = Err(Unavailable::NoLandmarks);
        for _ in 0..10 {
            app.step(&lost, &InputFrame::default(), DT, Instant::now());
        }
        crash(&mut app);
        let best = app.session().best_score;
        assert!(best > 0);
        assert!(app.status.starts_with("Game over"));

        // Nothing pressed: stays on the game-over screen.
        app.step(&lost, &InputFrame::default(), DT, Instant::now());
        assert_eq!(app.screen(), Screen::GameOver);

        app.step(&lost, &press(&[ControlKey::Enter]), DT, Instant::now());
        assert_eq!(app.screen(), Screen::Playing);
        assert_eq!(app.session().score, 0);
        assert_eq!(app.session().best_score, best);
    }

    #[test]
    fn arrow_keys_steer_while_playing() {
        let mut app = playing(ModeId::DisabledLeg);
        let lost = Err(Unavailable::CameraUnavailable);
        let left = InputFrame {
            arrows:  KeyboardState { left: true, ..Default::default() },
            pressed: Vec::new(),
        };
        app.step(&lost, &left, DT, Instant::now());
        assert_eq!(app.session().player.target_lane, Lane::LEFT);
        assert!(!app.controls().tracked);
        assert_eq!(app.status, Unavailable::CameraUnavailable.to_string());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut app = playing(ModeId::Kids);
        let lost = Err(Unavailable::NoLandmarks);
        app.step(&lost, &InputFrame::default(), 5.0, Instant::now());
        assert!(app.session().level.world_scroll <= app.mode().speed * MAX_DT + 1.0);
    }
}
