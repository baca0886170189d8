//! One run from start to crash: score, coins, pace and the session metrics
//! shown on the HUD.

use serde::Serialize;

use crate::command::MovementState;
use crate::entities::Player;
use crate::input::{apply_input, InputResult, KeyboardState};
use crate::level::{Level, Prompt};
use crate::mode::ModeProfile;

pub const SESSION_TARGET_SECS: f32 = 180.0;

const COMBO_MAX:         u32 = 999;
const COMBO_DECAY_AFTER: f32 = 2.2;
const COMBO_DECAY_REARM: f32 = 1.7;
const COIN_SCORE:        u64 = 25;
const COIN_CALORIES:     f32 = 0.22;

// ════════════════════════════════════════════════════════════════════════════
// SessionTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub combo:           u32,
    pub calories:        f32,
    /// Movement intensity in `0..=1`.
    pub intensity:       f32,
    pub elapsed_seconds: f32,
    /// Fraction of the session target reached, `0..=1`.
    pub progress:        f32,
    #[serde(skip)]
    combo_decay_timer:   f32,
}

/// Everything that happened to the player this frame, for the metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameActivity {
    pub tracked:      bool,
    pub input:        InputResult,
    pub coins_gained: u32,
}

pub struct SessionTracker {
    target_seconds: f32,
    pub metrics:    SessionMetrics,
}

impl Default for SessionTracker {
    fn default() -> Self { Self::new(SESSION_TARGET_SECS) }
}

impl SessionTracker {
    pub fn new(target_seconds: f32) -> Self {
        SessionTracker { target_seconds: target_seconds.max(30.0), metrics: SessionMetrics::default() }
    }

    pub fn reset(&mut self) {
        self.metrics = SessionMetrics::default();
    }

    pub fn update(&mut self, dt: f32, speed: f32, act: FrameActivity) {
        let m = &mut self.metrics;
        m.elapsed_seconds += dt;
        m.progress = (m.elapsed_seconds / self.target_seconds).clamp(0.0, 1.0);

        let mut intensity = m.intensity - dt * 0.22;
        if act.tracked         { intensity += 0.06 * dt; }
        if act.input.lane_changed { intensity += 0.18; }
        if act.input.jumped    { intensity += 0.22; }
        if act.input.duck_hold { intensity += 0.08 * dt; }
        m.intensity = intensity.clamp(0.0, 1.0);

        if act.coins_gained > 0 {
            m.combo = (m.combo + act.coins_gained).min(COMBO_MAX);
            m.combo_decay_timer = 0.0;
            m.calories += act.coins_gained as f32 * COIN_CALORIES;
        } else {
            m.combo_decay_timer += dt;
            if m.combo_decay_timer > COMBO_DECAY_AFTER {
                m.combo = m.combo.saturating_sub(1);
                m.combo_decay_timer = COMBO_DECAY_REARM;
            }
        }

        let pace = (speed / 16.0).min(1.0);
        let burn = 0.06 + m.intensity * 0.22 + pace * 0.05;
        m.calories += burn * dt;
    }

    pub fn reset_combo(&mut self) {
        self.metrics.combo = 0;
        self.metrics.combo_decay_timer = 0.0;
    }

    /// Elapsed time as `MM:SS`.
    pub fn formatted_timer(&self) -> String {
        let total = self.metrics.elapsed_seconds.max(0.0) as u32;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RunSession
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    Crashed,
}

/// Gameplay for one mode: the road, the player and the score.
pub struct RunSession {
    pub level:       Level,
    pub player:      Player,
    pub tracker:     SessionTracker,
    pub score:       u64,
    pub best_score:  u64,
    pub coin_count:  u32,
    pub speed:       f32,
    pub prompt:      Prompt,
    elapsed:         f32,
    crashed:         bool,
}

impl RunSession {
    pub fn new(profile: ModeProfile, seed: u64) -> Self {
        RunSession {
            level:      Level::new(profile, seed),
            player:     Player::default(),
            tracker:    SessionTracker::default(),
            score:      0,
            best_score: 0,
            coin_count: 0,
            speed:      profile.speed,
            prompt:     Prompt::Run,
            elapsed:    0.0,
            crashed:    false,
        }
    }

    pub fn profile(&self) -> &ModeProfile {
        self.level.profile()
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Start a fresh run.  Best score survives.
    pub fn restart(&mut self) {
        self.level.reset();
        self.player     = Player::default();
        self.tracker.reset();
        self.score      = 0;
        self.coin_count = 0;
        self.speed      = self.profile().speed;
        self.prompt     = Prompt::Run;
        self.elapsed    = 0.0;
        self.crashed    = false;
    }

    /// Advance one frame.  A crashed run stays crashed until [`restart`].
    ///
    /// [`restart`]: RunSession::restart
    pub fn tick(&mut self, dt: f32, controls: &MovementState, keys: KeyboardState) -> TickOutcome {
        if self.crashed {
            return TickOutcome::Crashed;
        }

        self.elapsed += dt;
        self.speed = self.profile().current_speed(self.elapsed);
        self.score += (dt * (58.0 + self.speed * 5.8)) as u64;

        let input = apply_input(&mut self.player, controls, keys);
        self.player.update(dt, self.speed, input.duck_hold);
        self.level.update(dt, self.speed);

        if self.level.check_collision(&self.player) {
            self.tracker.reset_combo();
            self.best_score = self.best_score.max(self.score);
            self.crashed = true;
            log::info!(
                "game over: score {} coins {} time {}",
                self.score, self.coin_count, self.tracker.formatted_timer()
            );
            return TickOutcome::Crashed;
        }

        let coins = self.level.collect_coins(&self.player);
        if coins > 0 {
            self.coin_count += coins;
            let combo_bonus = (self.tracker.metrics.combo + coins) as u64 * 4;
            self.score += coins as u64 * COIN_SCORE + combo_bonus;
        }

        self.prompt = self.level.next_prompt();
        self.tracker.update(dt, self.speed, FrameActivity {
            tracked: controls.tracked,
            input,
            coins_gained: coins,
        });
        TickOutcome::Running
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
