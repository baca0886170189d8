//! Accessibility modes and their immutable tuning table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// ModeId
// ════════════════════════════════════════════════════════════════════════════

/// One of the five play modes.  Also names the gesture profile bound to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeId {
    Kids,
    Elderly,
    DisabledLeg,
    DisabledHand,
    LegFree,
}

impl ModeId {
    pub const ALL: [ModeId; 5] = [
        ModeId::Kids,
        ModeId::Elderly,
        ModeId::DisabledLeg,
        ModeId::DisabledHand,
        ModeId::LegFree,
    ];

    /// Stable key used for persistence and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ModeId::Kids         => "kids",
            ModeId::Elderly      => "elderly",
            ModeId::DisabledLeg  => "disabled_leg",
            ModeId::DisabledHand => "disabled_hand",
            ModeId::LegFree      => "leg_free",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModeId::Kids         => "Kids Mode",
            ModeId::Elderly      => "Elderly Mode",
            ModeId::DisabledLeg  => "Disabled Leg Mode",
            ModeId::DisabledHand => "Disabled Hand Mode",
            ModeId::LegFree      => "Leg-Free Mode",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("unknown mode `{0}` (expected kids, elderly, disabled_leg, disabled_hand or leg_free)")]
    UnknownMode(String),
}

impl FromStr for ModeId {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        ModeId::ALL
            .into_iter()
            .find(|m| m.key() == key)
            .ok_or_else(|| ModeError::UnknownMode(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlScheme
// ════════════════════════════════════════════════════════════════════════════

/// Which landmark family drives the mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScheme {
    Pose,
    Hand,
}

// ════════════════════════════════════════════════════════════════════════════
// ModeProfile
// ════════════════════════════════════════════════════════════════════════════

/// Immutable per-mode configuration.  Selected once per session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    pub id:                   ModeId,
    /// Base world speed in units per second.
    pub speed:                f32,
    /// Seconds between obstacle spawns (before jitter).
    pub obstacle_spawn_rate:  f32,
    pub control_scheme:       ControlScheme,
    /// Larger is more responsive: gesture thresholds divide by it.
    pub movement_sensitivity: f32,
    pub jump_cooldown:        f32,
    /// Exponential smoothing factor for the continuous lane state.
    pub lane_smoothing:       f32,
    pub speed_bonus_cap:      f32,
    pub speed_ramp:           f32,
    /// Probability that a spawned obstacle must be jumped over.
    pub jump_bias:            f32,
}

const KIDS: ModeProfile = ModeProfile {
    id:                   ModeId::Kids,
    speed:                11.6,
    obstacle_spawn_rate:  1.02,
    control_scheme:       ControlScheme::Pose,
    movement_sensitivity: 1.18,
    jump_cooldown:        0.45,
    lane_smoothing:       0.30,
    speed_bonus_cap:      4.0,
    speed_ramp:           0.36,
    jump_bias:            0.65,
};

const ELDERLY: ModeProfile = ModeProfile {
    id:                   ModeId::Elderly,
    speed:                7.0,
    obstacle_spawn_rate:  2.05,
    control_scheme:       ControlScheme::Pose,
    movement_sensitivity: 0.72,
    jump_cooldown:        0.80,
    lane_smoothing:       0.14,
    speed_bonus_cap:      1.7,
    speed_ramp:           0.24,
    jump_bias:            0.55,
};

const DISABLED_LEG: ModeProfile = ModeProfile {
    id:                   ModeId::DisabledLeg,
    speed:                9.3,
    obstacle_spawn_rate:  1.46,
    control_scheme:       ControlScheme::Hand,
    movement_sensitivity: 1.0,
    jump_cooldown:        0.55,
    lane_smoothing:       0.22,
    speed_bonus_cap:      2.8,
    speed_ramp:           0.30,
    jump_bias:            0.55,
};

const DISABLED_HAND: ModeProfile = ModeProfile {
    id:                   ModeId::DisabledHand,
    speed:                8.7,
    obstacle_spawn_rate:  1.58,
    control_scheme:       ControlScheme::Pose,
    movement_sensitivity: 1.10,
    jump_cooldown:        0.55,
    lane_smoothing:       0.22,
    speed_bonus_cap:      2.3,
    speed_ramp:           0.27,
    jump_bias:            0.55,
};

const LEG_FREE: ModeProfile = ModeProfile {
    id:                   ModeId::LegFree,
    speed:                9.0,
    obstacle_spawn_rate:  1.50,
    control_scheme:       ControlScheme::Hand,
    movement_sensitivity: 1.02,
    jump_cooldown:        0.55,
    lane_smoothing:       0.26,
    speed_bonus_cap:      2.6,
    speed_ramp:           0.28,
    jump_bias:            0.55,
};

impl ModeProfile {
    pub fn get(id: ModeId) -> ModeProfile {
        match id {
            ModeId::Kids         => KIDS,
            ModeId::Elderly      => ELDERLY,
            ModeId::DisabledLeg  => DISABLED_LEG,
            ModeId::DisabledHand => DISABLED_HAND,
            ModeId::LegFree      => LEG_FREE,
        }
    }

    /// Lenient lookup: unknown keys fall back to kids.
    pub fn lookup(key: &str) -> ModeProfile {
        match key.parse::<ModeId>() {
            Ok(id) => Self::get(id),
            Err(e) => {
                log::warn!("{e}; using kids");
                KIDS
            }
        }
    }

    pub fn all() -> [ModeProfile; 5] {
        ModeId::ALL.map(Self::get)
    }

    /// World speed after `elapsed` seconds of running.
    pub fn current_speed(&self, elapsed: f32) -> f32 {
        self.speed + (elapsed.max(0.0) * self.speed_ramp).min(self.speed_bonus_cap)
    }
}

impl Default for ModeProfile {
    fn default() -> Self { KIDS }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
