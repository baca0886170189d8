//! gesture_runner: interactive entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use gesture_runner::{run, AppConfig, Exit};
use runner_core::{ModeId, ModeProfile};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Runner: three lanes, no controller            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Hands: LeapMotion hardware (or --landmarks <command>)");
    #[cfg(not(feature = "leap"))]
    println!("  Landmarks: --landmarks <command>, otherwise keyboard only");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cfg = match base_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let fixed_mode = args.iter().any(|a| a == "--quick" || a == "--mode");

    loop {
        if !fixed_mode {
            cfg.mode = pick_mode();
        }
        println!();
        println!("  Opening window for {}…", cfg.mode.label());
        println!();

        match run(&cfg) {
            Ok(Exit::BackToModeSelect) if !fixed_mode => continue,
            Ok(_) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Flags shared by the quick and interactive paths.
fn base_config(args: &[String]) -> Result<AppConfig, String> {
    let flag = |name: &str| {
        args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
    };
    let mut cfg = AppConfig::default();
    if let Some(key) = flag("--mode") {
        cfg.mode = key.parse().map_err(|e| format!("{e}"))?;
    }
    if let Some(path) = flag("--calibration") {
        cfg.calibration_path = PathBuf::from(path);
    }
    if let Some(seed) = flag("--seed") {
        cfg.seed = seed.parse().map_err(|_| format!("--seed expects an integer, got {seed:?}"))?;
    }
    cfg.landmarks = flag("--landmarks");
    cfg.flat = args.iter().any(|a| a == "--flat");
    if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: {}, perspective camera, seed {}\n", cfg.mode.label(), cfg.seed);
    }
    Ok(cfg)
}

fn pick_mode() -> ModeId {
    println!("  Choose a mode:");
    for (i, profile) in ModeProfile::all().iter().enumerate() {
        println!(
            "    {}. {:<14} speed {:>4.1}  {:?} control",
            i + 1,
            profile.id.label(),
            profile.speed,
            profile.control_scheme
        );
    }
    let choice = read_line("  Choice (1–5, default 1): ");
    let choice = choice.trim();
    match choice.parse::<usize>() {
        Ok(n) if (1..=ModeId::ALL.len()).contains(&n) => ModeId::ALL[n - 1],
        _ => ModeProfile::lookup(choice).id,
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
