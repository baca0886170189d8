//! Things that live on the road: obstacles, coins and the player.

use serde::{Deserialize, Serialize};

use crate::command::Lane;

// ════════════════════════════════════════════════════════════════════════════
// Obstacles and coins
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Low block on the road, cleared by jumping.
    JumpOver,
    /// Overhead bar, cleared by ducking.
    DuckUnder,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub lane: Lane,
    pub kind: ObstacleKind,
    pub z:    f32,
}

impl Obstacle {
    pub fn advance(&mut self, distance: f32) {
        self.z -= distance;
    }
}

/// Rest height of a coin above the road.
pub const COIN_HEIGHT: f32 = 0.75;
const COIN_BOB:        f32 = 0.08;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub lane:  Lane,
    pub z:     f32,
    pub phase: f32,
}

impl Coin {
    pub fn advance(&mut self, distance: f32) {
        self.z -= distance;
    }

    /// Current height including the depth-dependent bob.
    pub fn height(&self) -> f32 {
        COIN_HEIGHT + (self.phase + self.z * 0.35).sin() * COIN_BOB
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player
// ════════════════════════════════════════════════════════════════════════════

pub const JUMP_VELOCITY: f32 = 6.2;
pub const GRAVITY:       f32 = 18.0;
const LANE_EASE:         f32 = 12.0;
const ANIM_RATE:         f32 = 0.9;

/// The runner.  Lives at a fixed depth; only `x` and `y` move.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub target_lane: Lane,
    /// Smoothed world x, easing toward the target lane centre.
    pub x:           f32,
    /// Height of the feet above the road.
    pub y:           f32,
    pub velocity_y:  f32,
    pub ducking:     bool,
    /// Gait phase in radians, drives the running animation.
    pub anim_phase:  f32,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            target_lane: Lane::CENTER,
            x:           Lane::CENTER.world_x(),
            y:           0.0,
            velocity_y:  0.0,
            ducking:     false,
            anim_phase:  0.0,
        }
    }
}

impl Player {
    pub fn set_lane(&mut self, lane: Lane) {
        self.target_lane = lane;
    }

    pub fn on_ground(&self) -> bool {
        self.y <= 1e-4 && self.velocity_y <= 0.0
    }

    /// Start a jump.  Returns false when already airborne.
    pub fn jump(&mut self) -> bool {
        if !self.on_ground() {
            return false;
        }
        self.velocity_y = JUMP_VELOCITY;
        true
    }

    pub fn update(&mut self, dt: f32, speed: f32, duck_hold: bool) {
        let target_x = self.target_lane.world_x();
        self.x += (target_x - self.x) * (dt * LANE_EASE).min(1.0);

        self.velocity_y -= GRAVITY * dt;
        self.y += self.velocity_y * dt;
        if self.y <= 0.0 {
            self.y = 0.0;
            self.velocity_y = 0.0;
        }

        self.ducking = duck_hold && self.on_ground();
        self.anim_phase = (self.anim_phase + dt * speed * ANIM_RATE) % std::f32::consts::TAU;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_is_ballistic_and_lands() {
        let mut p = Player::default();
        assert!(p.jump());
        assert!(!p.jump(), "no double jump while airborne");
        let mut peak = 0.0_f32;
        for _ in 0..120 {
            p.update(1.0 / 60.0, 10.0, false);
            peak = peak.max(p.y);
        }
        // v²/2g ≈ 1.07
        assert!(peak > 0.95 && peak < 1.1, "peak {peak}");
        assert!(p.on_ground());
    }

    #[test]
    fn duck_requires_ground() {
        let mut p = Player::default();
        p.jump();
        p.update(0.05, 10.0, true);
        assert!(!p.ducking);
        let mut q = Player::default();
        q.update(0.05, 10.0, true);
        assert!(q.ducking);
    }

    #[test]
    fn x_eases_toward_target_lane() {
        let mut p = Player::default();
        p.set_lane(Lane::LEFT);
        p.update(0.05, 10.0, false);
        assert!(p.x < 0.0 && p.x > -1.2);
        p.update(1.0, 10.0, false);
        assert!((p.x + 1.2).abs() < 1e-5);
    }
}
