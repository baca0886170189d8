//! Derived upper-body measurements shared by the pose profiles.

use crate::landmarks::{pose_index as P, Landmark, PoseSnapshot};

/// Landmarks the full-body profiles need.
pub const UPPER_BODY: [usize; 7] = [
    P::NOSE,
    P::LEFT_SHOULDER,
    P::RIGHT_SHOULDER,
    P::LEFT_WRIST,
    P::RIGHT_WRIST,
    P::LEFT_HIP,
    P::RIGHT_HIP,
];

pub const SHOULDERS: [usize; 2] = [P::LEFT_SHOULDER, P::RIGHT_SHOULDER];
pub const HIPS:      [usize; 2] = [P::LEFT_HIP, P::RIGHT_HIP];
pub const TORSO:     [usize; 4] = [P::LEFT_SHOULDER, P::RIGHT_SHOULDER, P::LEFT_HIP, P::RIGHT_HIP];

/// Default visibility gate for full-body profiles and for calibration.
pub const VISIBILITY: f32 = 0.45;

/// One frame of upper-body geometry.
#[derive(Clone, Copy, Debug)]
pub struct Torso {
    pub nose:           Landmark,
    pub left_shoulder:  Landmark,
    pub right_shoulder: Landmark,
    pub left_wrist:     Landmark,
    pub right_wrist:    Landmark,
    pub shoulder_mid_x: f32,
    pub shoulder_mid_y: f32,
    pub shoulder_width: f32,
    /// Midpoint of shoulder and hip centres; falls back to the shoulder
    /// centre when hips are not used.
    pub torso_mid_x:    f32,
}

impl Torso {
    pub fn measure(pose: &PoseSnapshot, use_hips: bool) -> Self {
        let ls = pose.point(P::LEFT_SHOULDER);
        let rs = pose.point(P::RIGHT_SHOULDER);
        let shoulder_mid_x = (ls.x + rs.x) * 0.5;
        let shoulder_mid_y = (ls.y + rs.y) * 0.5;
        let torso_mid_x = if use_hips {
            let hip_mid_x = (pose.point(P::LEFT_HIP).x + pose.point(P::RIGHT_HIP).x) * 0.5;
            (shoulder_mid_x + hip_mid_x) * 0.5
        } else {
            shoulder_mid_x
        };
        Torso {
            nose:           pose.point(P::NOSE),
            left_shoulder:  ls,
            right_shoulder: rs,
            left_wrist:     pose.point(P::LEFT_WRIST),
            right_wrist:    pose.point(P::RIGHT_WRIST),
            shoulder_mid_x,
            shoulder_mid_y,
            shoulder_width: (rs.x - ls.x).abs(),
            torso_mid_x,
        }
    }

    /// Left shoulder minus right shoulder height (positive: left is lower).
    pub fn tilt(&self) -> f32 {
        self.left_shoulder.y - self.right_shoulder.y
    }
}
