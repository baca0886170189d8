//! Lane geometry and the camera models that turn world points into pixels.
//!
//! World space: `x` is lateral (road centre = 0, left negative), `y` is height
//! above the road surface, `z` is forward depth from the camera.  Depth shrinks
//! as things approach the player.  Everything the renderer draws goes through
//! a [`Projection`]; nothing else in the workspace does its own perspective
//! math.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Screen and world constants
// ════════════════════════════════════════════════════════════════════════════

pub const SCREEN_W:         usize = 1280;
pub const SCREEN_H:         usize = 720;
/// `int(SCREEN_H * 0.27)`.
pub const HORIZON_Y:        f32   = 194.0;
/// Row the flat ground-plane camera pins the player's feet to.
pub const GROUND_Y:         f32   = (SCREEN_H - 68) as f32;

pub const CAMERA_HEIGHT:    f32   = 1.45;
pub const PROJECTION_SCALE: f32   = 760.0;
/// Points at or closer than this depth are behind the camera.
pub const NEAR_PLANE:       f32   = 0.12;

pub const LANE_X:           [f32; 3] = [-1.2, 0.0, 1.2];
pub const ROAD_HALF_WIDTH:  f32   = 2.8;
/// Fixed depth at which the player figure stands.
pub const PLAYER_Z:         f32   = 3.2;

// ════════════════════════════════════════════════════════════════════════════
// Points
// ════════════════════════════════════════════════════════════════════════════

/// A point in lane-relative world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        WorldPoint { x, y, z }
    }

    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        WorldPoint { x: self.x + dx, y: self.y + dy, z: self.z + dz }
    }
}

/// A projected point.  `scale` is pixels per world unit at that depth and is
/// reused to size anything drawn there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x:     f32,
    pub y:     f32,
    pub scale: f32,
}

impl ScreenPoint {
    /// Integer pixel coordinates (truncating, like the rasteriser).
    pub fn px(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Lanes
// ════════════════════════════════════════════════════════════════════════════

/// Clamp any lane value into `0..=2`.
pub fn clamp_lane(lane: i32) -> usize {
    lane.clamp(0, 2) as usize
}

/// World x of a lane centreline.  Out-of-range lanes clamp to the nearest edge.
pub fn lane_x(lane: i32) -> f32 {
    LANE_X[clamp_lane(lane)]
}

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Maps a world point to the screen, or `None` when it is not visible.
pub trait Projection {
    fn project(&self, p: WorldPoint) -> Option<ScreenPoint>;

    /// Framebuffer size this projection targets.
    fn screen_size(&self) -> (usize, usize);

    /// Screen row of the vanishing line.
    fn horizon_y(&self) -> f32;

    fn project_xyz(&self, x: f32, y: f32, z: f32) -> Option<ScreenPoint> {
        self.project(WorldPoint::new(x, y, z))
    }
}

// ── Pinhole camera ────────────────────────────────────────────────────────

/// Fixed, level pinhole camera looking down the road.  No rotation: the world
/// is a single corridor, so `screen = centre + world * (k / z)` is enough.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub width:            usize,
    pub height:           usize,
    pub horizon_y:        f32,
    pub camera_height:    f32,
    pub projection_scale: f32,
    pub near_plane:       f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        PerspectiveCamera {
            width:            SCREEN_W,
            height:           SCREEN_H,
            horizon_y:        HORIZON_Y,
            camera_height:    CAMERA_HEIGHT,
            projection_scale: PROJECTION_SCALE,
            near_plane:       NEAR_PLANE,
        }
    }
}

impl Projection for PerspectiveCamera {
    fn project(&self, p: WorldPoint) -> Option<ScreenPoint> {
        // `!(a > b)` also rejects NaN depths.
        if !(p.z > self.near_plane) {
            return None;
        }
        let scale = self.projection_scale / p.z;
        Some(ScreenPoint {
            x: self.width as f32 * 0.5 + p.x * scale,
            y: self.horizon_y + (self.camera_height - p.y) * scale,
            scale,
        })
    }

    fn screen_size(&self) -> (usize, usize) { (self.width, self.height) }
    fn horizon_y(&self) -> f32 { self.horizon_y }
}

// ── Flat ground-plane camera ──────────────────────────────────────────────

/// 2.5D variant: the ground row of `anchor_z` is pinned to `ground_y` and the
/// road recedes linearly (in scale) to the horizon.  Heights are lifted off
/// the ground row by the same depth scale.  Used for the flat look and for
/// layouts where the player's feet must sit on a fixed pixel row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundPlaneCamera {
    pub width:            usize,
    pub height:           usize,
    pub horizon_y:        f32,
    pub ground_y:         f32,
    pub anchor_z:         f32,
    pub projection_scale: f32,
    pub near_plane:       f32,
}

impl Default for GroundPlaneCamera {
    fn default() -> Self {
        GroundPlaneCamera {
            width:            SCREEN_W,
            height:           SCREEN_H,
            horizon_y:        HORIZON_Y,
            ground_y:         GROUND_Y,
            anchor_z:         PLAYER_Z,
            projection_scale: PROJECTION_SCALE,
            near_plane:       NEAR_PLANE,
        }
    }
}

impl Projection for GroundPlaneCamera {
    fn project(&self, p: WorldPoint) -> Option<ScreenPoint> {
        if !(p.z > self.near_plane) {
            return None;
        }
        let scale  = self.projection_scale / p.z;
        let anchor = self.projection_scale / self.anchor_z;
        let ground_row = self.horizon_y + (self.ground_y - self.horizon_y) * (scale / anchor);
        Some(ScreenPoint {
            x: self.width as f32 * 0.5 + p.x * scale,
            y: ground_row - p.y * scale,
            scale,
        })
    }

    fn screen_size(&self) -> (usize, usize) { (self.width, self.height) }
    fn horizon_y(&self) -> f32 { self.horizon_y }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn behind_near_plane_is_not_visible() {
        let cam = PerspectiveCamera::default();
        assert!(cam.project_xyz(0.0, 0.0, NEAR_PLANE).is_none());
        assert!(cam.project_xyz(0.0, 0.0, 0.0).is_none());
        assert!(cam.project_xyz(0.0, 0.0, -4.0).is_none());
        assert!(cam.project_xyz(0.0, 0.0, f32::NAN).is_none());
    }

    #[test]
    fn road_centre_projects_to_screen_centre() {
        let cam = PerspectiveCamera::default();
        let p = cam.project_xyz(0.0, 0.0, 10.0).unwrap();
        assert_eq!(p.x, SCREEN_W as f32 * 0.5);
        assert!((p.scale - 76.0).abs() < 1e-4);
        // 194 + 1.45 * 76
        assert!((p.y - 304.2).abs() < 1e-3);
    }

    #[test]
    fn eye_level_points_sit_on_horizon() {
        let cam = PerspectiveCamera::default();
        for z in [1.0_f32, 5.0, 40.0] {
            let p = cam.project_xyz(0.7, CAMERA_HEIGHT, z).unwrap();
            assert!((p.y - HORIZON_Y).abs() < 1e-3);
        }
    }

    #[test]
    fn lane_x_clamps_out_of_range() {
        assert_eq!(lane_x(-5), lane_x(0));
        assert_eq!(lane_x(99), lane_x(2));
        assert_eq!(lane_x(1), 0.0);
    }

    #[test]
    fn ground_plane_pins_anchor_depth_to_ground_row() {
        let cam = GroundPlaneCamera::default();
        let p = cam.project_xyz(0.0, 0.0, PLAYER_Z).unwrap();
        assert!((p.y - GROUND_Y).abs() < 1e-3);
        let far = cam.project_xyz(0.0, 0.0, 10_000.0).unwrap();
        assert!((far.y - HORIZON_Y).abs() < 1.0);
    }

    #[test]
    fn taller_points_rise_on_screen() {
        let cam = GroundPlaneCamera::default();
        let low  = cam.project_xyz(0.0, 0.0, 8.0).unwrap();
        let high = cam.project_xyz(0.0, 1.0, 8.0).unwrap();
        assert!(high.y < low.y);
    }

    proptest! {
        #[test]
        fn not_visible_at_or_behind_near_plane(z in -100.0f32..=NEAR_PLANE, x in -10.0f32..10.0, y in 0.0f32..5.0) {
            prop_assert!(PerspectiveCamera::default().project_xyz(x, y, z).is_none());
            prop_assert!(GroundPlaneCamera::default().project_xyz(x, y, z).is_none());
        }

        #[test]
        fn visible_points_are_finite(z in 0.1201f32..500.0, x in -10.0f32..10.0, y in 0.0f32..5.0) {
            let p = PerspectiveCamera::default().project_xyz(x, y, z).unwrap();
            prop_assert!(p.x.is_finite() && p.y.is_finite() && p.scale.is_finite());
            prop_assert!(p.scale > 0.0);
        }

        #[test]
        fn scale_decreases_with_depth(z in 0.13f32..400.0, dz in 0.01f32..50.0) {
            let cam = PerspectiveCamera::default();
            let near = cam.project_xyz(0.0, 0.0, z).unwrap();
            let far  = cam.project_xyz(0.0, 0.0, z + dz).unwrap();
            prop_assert!(far.scale < near.scale);
        }

        #[test]
        fn lane_x_is_total(lane in any::<i32>()) {
            let x = lane_x(lane);
            prop_assert!(LANE_X.contains(&x));
        }
    }
}
