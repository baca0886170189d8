//! # gesture_runner
//!
//! A three-lane endless runner steered by body pose or hand gestures, drawn
//! in a software framebuffer window.
//!
//! ## Modes
//!
//! | Mode | Tracks | Lane | Jump | Duck |
//! |---|---|---|---|---|
//! | Kids | body pose | lean torso | both hands over shoulders | bob head down |
//! | Elderly | body pose | both hands out to one side | both hands over head, held | bend forward |
//! | Disabled Hand | body pose | lean and tilt shoulders | shrug | drop shoulders |
//! | Disabled Leg | hands | raise one hand | raise both | two fists |
//! | Leg-Free | hands | open left / right / both | raise both | two fists |
//!
//! Each session starts with a short calibration capture of the player's
//! neutral position, saved per mode and reusable with `S` next time.
//!
//! ## Landmarks
//!
//! * (default) **Keyboard only**, or an external helper given with
//!   `--landmarks <command>` that prints one JSON frame per line.
//! * `leap` feature: hand landmarks from a LeapMotion controller via LeapC.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `←` / `→` | Change lane (overrides gestures) |
//! | `↑` / `↓` | Jump / duck |
//! | `R` | Restart calibration capture, or run again after a crash |
//! | `S` | Skip calibration when a saved profile exists |
//! | `Enter` / `Space` | Run again after a crash |
//! | `M` / `Esc` | Back to mode selection |

pub mod canvas;
pub mod scene;
pub mod figure;
pub mod source;
pub mod visualizer;
pub mod app;
pub mod error;

pub use app::{run, AppConfig, AppState, Exit, Screen};
pub use error::AppError;
