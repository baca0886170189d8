//! # runner_core
//!
//! The world model of a three-lane endless runner: the perspective camera
//! that places everything on screen, per-mode tuning, obstacles and coins,
//! player physics and the run/session bookkeeping.
//!
//! Nothing here knows about windows, cameras or landmarks.  Input arrives as a
//! [`MovementState`] per frame plus an optional [`KeyboardState`].
//!
//! ## Coordinate system
//!
//! | Axis | Meaning | Range |
//! |---|---|---|
//! | `x` | lateral offset from the road centre | lanes at -1.2, 0, 1.2 |
//! | `y` | height above the road | `>= 0` |
//! | `z` | forward depth from the camera | visible when `> 0.12` |

pub mod geometry;
pub mod mode;
pub mod command;
pub mod entities;
pub mod level;
pub mod input;
pub mod session;

pub use command::{Lane, MovementState};
pub use geometry::{GroundPlaneCamera, PerspectiveCamera, Projection, ScreenPoint, WorldPoint};
pub use input::{apply_input, InputResult, KeyboardState};
pub use level::{Level, Prompt};
pub use mode::{ControlScheme, ModeError, ModeId, ModeProfile};
pub use session::{RunSession, SessionTracker, TickOutcome};
