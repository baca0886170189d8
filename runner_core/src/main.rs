//! runner_sim: headless run with a simple autopilot.
//!
//! ```text
//! runner_sim [--mode <key>] [--seconds <n>] [--seed <n>]
//! ```

use runner_core::entities::ObstacleKind;
use runner_core::geometry::PLAYER_Z;
use runner_core::{KeyboardState, Lane, ModeId, MovementState, RunSession, TickOutcome};

const DT: f32 = 1.0 / 30.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let flag = |name: &str| {
        args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
    };

    let mode = match flag("--mode").map(|m| m.parse::<ModeId>()).transpose() {
        Ok(m) => m.unwrap_or(ModeId::Kids),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let seconds: f32 = flag("--seconds").and_then(|s| s.parse().ok()).unwrap_or(60.0);
    let seed: u64    = flag("--seed").and_then(|s| s.parse().ok()).unwrap_or(2026);

    println!();
    println!("  runner_sim: {} for {:.0}s (seed {})", mode.label(), seconds, seed);
    println!();

    let mut run = RunSession::new(runner_core::ModeProfile::get(mode), seed);
    let frames = (seconds / DT) as u32;
    let mut crashes = 0u32;

    for frame in 0..frames {
        let (command, keys) = autopilot(&run);
        if run.tick(DT, &command, keys) == TickOutcome::Crashed {
            crashes += 1;
            println!(
                "  crash #{:<3} at {}  score {:>6}  coins {:>3}",
                crashes, run.tracker.formatted_timer(), run.score, run.coin_count
            );
            run.restart();
        }
        if frame % 300 == 299 {
            let m = &run.tracker.metrics;
            println!(
                "  {}  speed {:>5.2}  score {:>6}  combo {:>3}  kcal {:>5.2}  intensity {:.2}",
                run.tracker.formatted_timer(), run.speed, run.score, m.combo, m.calories, m.intensity
            );
        }
    }

    println!();
    println!("  best score {}  crashes {}", run.best_score.max(run.score), crashes);
}

/// Steer away from the nearest threat, or toward the nearest coin.
fn autopilot(run: &RunSession) -> (MovementState, KeyboardState) {
    let lane = run.player.target_lane;
    let mut keys = KeyboardState::default();

    let threat = run.level.obstacles.iter()
        .filter(|o| o.z > PLAYER_Z && o.z < PLAYER_Z + 2.5 && o.lane == lane)
        .min_by(|a, b| a.z.total_cmp(&b.z));

    match threat.map(|o| o.kind) {
        Some(ObstacleKind::JumpOver)  => keys.up = true,
        Some(ObstacleKind::DuckUnder) => keys.down = true,
        None => {}
    }

    let target = run.level.coins.iter()
        .filter(|c| c.z > PLAYER_Z)
        .min_by(|a, b| a.z.total_cmp(&b.z))
        .map(|c| c.lane)
        .unwrap_or(Lane::CENTER);

    let blocked = |l: Lane| run.level.obstacles.iter()
        .any(|o| o.lane == l && o.z > PLAYER_Z && o.z < PLAYER_Z + 6.0);
    let lane = if blocked(target) { lane } else { target };

    (MovementState::tracked(lane, "autopilot"), keys)
}
