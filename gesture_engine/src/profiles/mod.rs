//! One module per accessibility profile.
//!
//! | Profile | Landmarks | Lane | Jump | Duck |
//! |---|---|---|---|---|
//! | kids | pose | torso lean | both hands above shoulders | bend forward / drop |
//! | elderly | pose | both hands to one side | both hands above head, held | gentle bend / drop |
//! | disabled_hand | pose (shoulders) | lean + shoulder tilt | shoulder rise, held, re-armed | shoulder drop |
//! | disabled_leg | hands | raise one hand | raise both | two fists |
//! | leg_free | hands | open left / right / both | raise both, re-armed | two fists |

mod kids;
mod elderly;
mod disabled_hand;
mod disabled_leg;
mod leg_free;

pub use disabled_hand::DisabledHandProfile;
pub use disabled_leg::DisabledLegProfile;
pub use elderly::ElderlyProfile;
pub use kids::KidsProfile;
pub use leg_free::LegFreeProfile;

/// Sensitivity floor for the pose profiles.
pub(crate) const POSE_SENSITIVITY_FLOOR: f32 = 0.55;
/// Sensitivity floor for the hand profiles.
pub(crate) const HAND_SENSITIVITY_FLOOR: f32 = 0.6;

pub(crate) const NO_POSE: &str = "No pose detected. Stand where shoulders and hips are visible.";

#[cfg(test)]
pub(crate) mod fixtures {
    //! Synthetic standing poses for profile tests.

    use crate::landmarks::{pose_index as P, Landmark, LandmarkSnapshot, PoseSnapshot};

    /// A neutral, fully visible person centred in frame.
    #[derive(Clone, Debug)]
    pub struct PoseBuilder {
        pub lm: Vec<Landmark>,
    }

    impl Default for PoseBuilder {
        fn default() -> Self {
            let mut lm = vec![Landmark::new(0.5, 0.5, 0.99); P::COUNT];
            lm[P::NOSE]           = Landmark::new(0.50, 0.20, 0.99);
            lm[P::LEFT_SHOULDER]  = Landmark::new(0.40, 0.35, 0.99);
            lm[P::RIGHT_SHOULDER] = Landmark::new(0.60, 0.35, 0.99);
            lm[P::LEFT_ELBOW]     = Landmark::new(0.36, 0.50, 0.99);
            lm[P::RIGHT_ELBOW]    = Landmark::new(0.64, 0.50, 0.99);
            lm[P::LEFT_WRIST]     = Landmark::new(0.37, 0.65, 0.99);
            lm[P::RIGHT_WRIST]    = Landmark::new(0.63, 0.65, 0.99);
            lm[P::LEFT_HIP]       = Landmark::new(0.44, 0.75, 0.99);
            lm[P::RIGHT_HIP]      = Landmark::new(0.56, 0.75, 0.99);
            PoseBuilder { lm }
        }
    }

    impl PoseBuilder {
        /// Move the whole body sideways.
        pub fn shift_x(mut self, dx: f32) -> Self {
            for p in &mut self.lm {
                p.x += dx;
            }
            self
        }

        /// Move the upper body (nose and shoulders) vertically.
        pub fn shift_shoulders_y(mut self, dy: f32) -> Self {
            for i in [P::NOSE, P::LEFT_SHOULDER, P::RIGHT_SHOULDER] {
                self.lm[i].y += dy;
            }
            self
        }

        pub fn wrists_at(mut self, lx: f32, ly: f32, rx: f32, ry: f32) -> Self {
            self.lm[P::LEFT_WRIST].x  = lx;
            self.lm[P::LEFT_WRIST].y  = ly;
            self.lm[P::RIGHT_WRIST].x = rx;
            self.lm[P::RIGHT_WRIST].y = ry;
            self
        }

        pub fn nose_y(mut self, y: f32) -> Self {
            self.lm[P::NOSE].y = y;
            self
        }

        pub fn visibility(mut self, index: usize, v: f32) -> Self {
            self.lm[index].visibility = v;
            self
        }

        pub fn snapshot(self) -> LandmarkSnapshot {
            LandmarkSnapshot { pose: Some(PoseSnapshot { landmarks: self.lm }), hands: Vec::new() }
        }
    }
}
