//! Obstacle and coin spawning, world scroll, collisions.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::command::Lane;
use crate::entities::{Coin, Obstacle, ObstacleKind, Player};
use crate::geometry::PLAYER_Z;
use crate::mode::ModeProfile;

/// Entities at or nearer than this depth have passed the player and are dropped.
pub const REMOVAL_Z: f32 = 0.55;

const OBSTACLE_SPAWN_Z: (f32, f32) = (41.0, 56.0);
const COIN_SPAWN_Z:     (f32, f32) = (33.0, 57.0);
const SPAWN_JITTER:     (f32, f32) = (-0.10, 0.18);
const COIN_INTERVAL:    (f32, f32) = (0.22, 0.48);
const FIRST_COIN:       f32 = 0.45;

const HIT_DEPTH:        f32 = 0.44;
const HIT_LATERAL:      f32 = 0.58;
/// Feet must be at least this high to clear a jump-over block.
const CLEAR_HEIGHT:     f32 = 0.57;
const COIN_DEPTH:       f32 = 0.48;
const COIN_LATERAL:     f32 = 0.62;

/// What the HUD tells the player to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prompt {
    Run,
    Jump,
    Duck,
}

impl Prompt {
    pub fn label(self) -> &'static str {
        match self {
            Prompt::Run  => "RUN",
            Prompt::Jump => "JUMP",
            Prompt::Duck => "DUCK",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Level
// ════════════════════════════════════════════════════════════════════════════

pub struct Level {
    profile:          ModeProfile,
    pub obstacles:    Vec<Obstacle>,
    pub coins:        Vec<Coin>,
    pub elapsed:      f32,
    /// Accumulated distance travelled; drives repeating road decoration.
    pub world_scroll: f32,
    /// When false `update` only moves existing entities.
    pub spawning:     bool,
    spawn_timer:      f32,
    coin_timer:       f32,
    rng:              SmallRng,
}

impl Level {
    pub fn new(profile: ModeProfile, seed: u64) -> Self {
        Level {
            profile,
            obstacles:    Vec::new(),
            coins:        Vec::new(),
            elapsed:      0.0,
            world_scroll: 0.0,
            spawning:     true,
            spawn_timer:  profile.obstacle_spawn_rate,
            coin_timer:   FIRST_COIN,
            rng:          SmallRng::seed_from_u64(seed),
        }
    }

    pub fn profile(&self) -> &ModeProfile {
        &self.profile
    }

    /// Clear the road for a new run.  The rng keeps its stream.
    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.coins.clear();
        self.elapsed      = 0.0;
        self.world_scroll = 0.0;
        self.spawn_timer  = self.profile.obstacle_spawn_rate;
        self.coin_timer   = FIRST_COIN;
    }

    pub fn update(&mut self, dt: f32, speed: f32) {
        self.elapsed += dt;
        let distance = speed * dt;
        self.world_scroll += distance;

        if self.spawning {
            self.spawn_timer -= dt;
            if self.spawn_timer <= 0.0 {
                self.spawn_obstacle();
                let rate = self.profile.obstacle_spawn_rate;
                let jitter = self.rng.gen_range(SPAWN_JITTER.0..SPAWN_JITTER.1);
                let min_gap = (rate * 0.68).max(0.6);
                self.spawn_timer = (rate + jitter).max(min_gap);
            }

            self.coin_timer -= dt;
            if self.coin_timer <= 0.0 {
                self.spawn_coin();
                self.coin_timer = self.rng.gen_range(COIN_INTERVAL.0..COIN_INTERVAL.1);
            }
        }

        for o in &mut self.obstacles {
            o.advance(distance);
        }
        for c in &mut self.coins {
            c.advance(distance);
        }
        self.obstacles.retain(|o| o.z > REMOVAL_Z);
        self.coins.retain(|c| c.z > REMOVAL_Z);
    }

    fn random_lane(&mut self) -> Lane {
        Lane::new(self.rng.gen_range(0..3))
    }

    fn spawn_obstacle(&mut self) {
        let kind = if self.rng.gen::<f32>() < self.profile.jump_bias {
            ObstacleKind::JumpOver
        } else {
            ObstacleKind::DuckUnder
        };
        let lane = self.random_lane();
        let z = self.rng.gen_range(OBSTACLE_SPAWN_Z.0..OBSTACLE_SPAWN_Z.1);
        log::debug!("spawn {kind:?} lane {} z {z:.1}", lane.index());
        self.obstacles.push(Obstacle { lane, kind, z });
    }

    fn spawn_coin(&mut self) {
        let lane = self.random_lane();
        let z = self.rng.gen_range(COIN_SPAWN_Z.0..COIN_SPAWN_Z.1);
        let phase = self.rng.gen_range(0.0..6.0);
        self.coins.push(Coin { lane, z, phase });
    }

    // ── collision ────────────────────────────────────────────────────────

    pub fn hits_obstacle(player: &Player, obstacle: &Obstacle) -> bool {
        if (obstacle.z - PLAYER_Z).abs() > HIT_DEPTH {
            return false;
        }
        if (player.x - obstacle.lane.world_x()).abs() > HIT_LATERAL {
            return false;
        }
        match obstacle.kind {
            ObstacleKind::JumpOver  => player.y < CLEAR_HEIGHT,
            ObstacleKind::DuckUnder => !player.ducking,
        }
    }

    pub fn takes_coin(player: &Player, coin: &Coin) -> bool {
        (coin.z - PLAYER_Z).abs() <= COIN_DEPTH
            && (player.x - coin.lane.world_x()).abs() <= COIN_LATERAL
    }

    pub fn check_collision(&self, player: &Player) -> bool {
        self.obstacles.iter().any(|o| Self::hits_obstacle(player, o))
    }

    /// Remove and count the coins the player is touching.
    pub fn collect_coins(&mut self, player: &Player) -> u32 {
        let before = self.coins.len();
        self.coins.retain(|c| !Self::takes_coin(player, c));
        (before - self.coins.len()) as u32
    }

    /// Prompt for the nearest obstacle still ahead of the player.
    pub fn next_prompt(&self) -> Prompt {
        self.obstacles
            .iter()
            .filter(|o| o.z > PLAYER_Z)
            .min_by(|a, b| a.z.total_cmp(&b.z))
            .map_or(Prompt::Run, |o| match o.kind {
                ObstacleKind::JumpOver  => Prompt::Jump,
                ObstacleKind::DuckUnder => Prompt::Duck,
            })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
