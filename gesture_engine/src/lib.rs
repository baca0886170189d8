//! # gesture_engine
//!
//! Turns per-frame body-pose and hand landmarks into [`MovementState`]
//! commands for the runner, one [`GestureProfile`] per accessibility mode.
//!
//! ```text
//!   landmark source ──► Frame ──► Classifier ──► MovementState ──► game
//!                                    │  ▲
//!                       sample()     │  │ apply_calibration()
//!                                    ▼  │
//!                            CalibrationSession ◄──► CalibrationStore
//! ```
//!
//! Every profile owns its rolling state (baselines, lane smoother, hold
//! counters, jump cooldown, duck filter).  Switching mode means building a new
//! [`Classifier`]; nothing carries over.
//!
//! Landmarks are normalised image coordinates: `x` grows to the right, `y`
//! grows downward, both in `[0, 1]`.
//!
//! [`MovementState`]: runner_core::MovementState

pub mod landmarks;
pub mod filters;
pub mod pose;
pub mod hand;
pub mod profile;
pub mod profiles;
pub mod calibration;
pub mod store;
pub mod error;

pub use calibration::{average, CalibrationPhase, CalibrationSession, TARGET_SAMPLES};
pub use error::{SampleRejected, StoreError};
pub use landmarks::{
    Frame, FrameMessage, HandSnapshot, Handedness, Landmark, LandmarkSnapshot, PoseSnapshot,
    Unavailable,
};
pub use profile::{build_profile, keys, CalibrationMap, Classifier, GestureProfile};
pub use store::{CalibrationStore, JsonFileStore, MemoryStore};
