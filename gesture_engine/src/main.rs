//! gesture_replay: classify a recorded JSON-lines landmark stream.
//!
//! ```text
//! gesture_replay [--mode <key>] [--fps <n>] [--calibration <path>] [file]
//! ```
//!
//! Reads one frame message per line (stdin when no file is given) and prints
//! the movement command for each.  Frames are stamped at a fixed rate so jump
//! cooldowns behave as they would live.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::{Duration, Instant};

use gesture_engine::{CalibrationStore, Classifier, FrameMessage, JsonFileStore, Unavailable};
use runner_core::{ModeId, ModeProfile};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `--fps` value; unparseable or missing means 30, and never below 1.
fn frame_rate(arg: Option<&str>) -> f32 {
    arg.and_then(|s| s.trim().parse::<f32>().ok()).unwrap_or(30.0).max(1.0)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flag = |name: &str| {
        args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
    };
    let valued = ["--mode", "--fps", "--calibration"];
    let file = args
        .iter()
        .enumerate()
        .find(|(i, a)| {
            !a.starts_with("--") && (*i == 0 || !valued.contains(&args[*i - 1].as_str()))
        })
        .map(|(_, a)| a.clone());

    let mode: ModeId = flag("--mode").as_deref().unwrap_or("kids").parse()?;
    let fps = frame_rate(flag("--fps").as_deref());
    let step = Duration::from_secs_f32(1.0 / fps);

    let profile = ModeProfile::get(mode);
    let mut classifier = Classifier::new(&profile);
    if let Some(path) = flag("--calibration") {
        let baseline = JsonFileStore::open(path).get(mode);
        if baseline.is_empty() {
            log::warn!("no saved {} calibration; using live baselines", mode);
        }
        classifier.apply_calibration(&baseline);
    }

    let input: Box<dyn BufRead> = match &file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    println!();
    println!("  gesture_replay: {} at {:.0} fps", mode.label(), fps);
    println!();
    println!("  {:>5}  {:>4}  {:>4}  {:>4}  {:>7}  message", "frame", "lane", "jump", "duck", "tracked");

    let t0 = Instant::now();
    let (mut jumps, mut ducks, mut tracked) = (0u32, 0u32, 0u32);
    let mut frames = 0u32;

    for (n, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = match serde_json::from_str::<FrameMessage>(&line) {
            Ok(msg) => msg.into_frame(),
            Err(e) => {
                log::warn!("line {}: {e}", n + 1);
                Err(Unavailable::FrameUnreadable)
            }
        };
        let state = classifier.classify(&frame, t0 + step * frames);
        println!(
            "  {:>5}  {:>4}  {:>4}  {:>4}  {:>7}  {}",
            frames,
            state.lane.index(),
            if state.jump { "J" } else { "." },
            if state.duck { "D" } else { "." },
            state.tracked,
            state.message
        );
        jumps   += state.jump as u32;
        ducks   += state.duck as u32;
        tracked += state.tracked as u32;
        frames  += 1;
    }

    println!();
    println!("  {} frames, {} tracked, {} jumps, {} duck frames", frames, tracked, jumps, ducks);
    Ok(())
}
