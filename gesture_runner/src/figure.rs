//! The runner as a projected stick figure with volume.
//!
//! Joints are posed in world space around the player's feet, so the figure
//! shrinks, lifts and shifts with the same camera as the road.  Limbs are
//! capsules between projected joints; farther segments are drawn first.

use std::f32::consts::PI;

use runner_core::entities::Player;
use runner_core::geometry::PLAYER_Z;
use runner_core::{Projection, ScreenPoint, WorldPoint};

use crate::canvas::{rgb, Canvas};

const HIP_HEIGHT:      f32 = 0.95;
const DUCK_HIP_HEIGHT: f32 = 0.55;
const TORSO:           f32 = 0.55;
const NECK:            f32 = 0.22;
const HEAD_RADIUS:     f32 = 0.13;
const THIGH:           f32 = 0.45;
const SHIN:            f32 = 0.42;
const UPPER_ARM:       f32 = 0.30;
const FOREARM:         f32 = 0.28;
const HIP_HALF:        f32 = 0.12;
const SHOULDER_HALF:   f32 = 0.18;
const SHADOW_RADIUS:   f32 = 0.35;

const SKIN:    u32 = rgb(244, 200, 160);
const SHIRT:   u32 = rgb(236, 84, 92);
const SHIRT_D: u32 = rgb(184, 56, 68);
const PANTS:   u32 = rgb(52, 72, 132);
const PANTS_D: u32 = rgb(36, 50, 98);
const SHOE:    u32 = rgb(34, 34, 40);
const SHADOW:  u32 = rgb(20, 24, 36);

// ════════════════════════════════════════════════════════════════════════════
// Skeleton
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Skeleton {
    pub hip:        WorldPoint,
    pub neck:       WorldPoint,
    pub head:       WorldPoint,
    pub knee_l:     WorldPoint,
    pub knee_r:     WorldPoint,
    pub foot_l:     WorldPoint,
    pub foot_r:     WorldPoint,
    pub shoulder_l: WorldPoint,
    pub shoulder_r: WorldPoint,
    pub elbow_l:    WorldPoint,
    pub elbow_r:    WorldPoint,
    pub hand_l:     WorldPoint,
    pub hand_r:     WorldPoint,
}

/// Pose the figure for the current animation state.
pub fn pose(player: &Player) -> Skeleton {
    let root = WorldPoint::new(player.x, player.y, PLAYER_Z);
    let phase = player.anim_phase;
    let airborne = !player.on_ground();

    let (hip_y, lean) = if player.ducking {
        (DUCK_HIP_HEIGHT, 0.28)
    } else if airborne {
        (HIP_HEIGHT, 0.04)
    } else {
        (HIP_HEIGHT + phase.sin().abs() * 0.05, 0.06)
    };

    let hip  = root.offset(0.0, hip_y, 0.0);
    let neck = if player.ducking {
        hip.offset(0.0, TORSO * 0.62, lean)
    } else {
        hip.offset(0.0, TORSO, lean)
    };
    let head = neck.offset(0.0, NECK, lean * 0.3);

    let (knee_l, foot_l) = leg(hip, -HIP_HALF, phase, airborne, player.ducking);
    let (knee_r, foot_r) = leg(hip, HIP_HALF, phase + PI, airborne, player.ducking);

    // Arms swing against the legs.
    let shoulder_l = neck.offset(-SHOULDER_HALF, -0.04, 0.0);
    let shoulder_r = neck.offset(SHOULDER_HALF, -0.04, 0.0);
    let (elbow_l, hand_l) = arm(shoulder_l, -1.0, phase + PI, airborne);
    let (elbow_r, hand_r) = arm(shoulder_r, 1.0, phase, airborne);

    Skeleton {
        hip, neck, head,
        knee_l, knee_r, foot_l, foot_r,
        shoulder_l, shoulder_r, elbow_l, elbow_r, hand_l, hand_r,
    }
}

fn leg(hip: WorldPoint, side: f32, phase: f32, airborne: bool, ducking: bool) -> (WorldPoint, WorldPoint) {
    let root = hip.offset(side, 0.0, 0.0);
    if airborne {
        let knee = root.offset(0.0, -THIGH * 0.55, -0.28);
        return (knee, knee.offset(0.0, -SHIN * 0.7, 0.18));
    }
    if ducking {
        let knee = root.offset(side * 0.5, -THIGH * 0.45, -0.32);
        let foot = WorldPoint::new(knee.x, hip.y - DUCK_HIP_HEIGHT, knee.z + 0.12);
        return (knee, foot);
    }
    let swing = phase.sin();
    let knee = root.offset(0.0, -THIGH, -swing * 0.22);
    let lift = (-phase.cos()).max(0.0) * 0.14;
    let foot = knee.offset(0.0, -SHIN + lift, -swing * 0.12 + lift);
    (knee, foot)
}

fn arm(shoulder: WorldPoint, side: f32, phase: f32, airborne: bool) -> (WorldPoint, WorldPoint) {
    if airborne {
        let elbow = shoulder.offset(side * 0.12, UPPER_ARM * 0.9, 0.0);
        return (elbow, elbow.offset(side * 0.04, FOREARM * 0.9, 0.0));
    }
    let swing = phase.sin();
    let elbow = shoulder.offset(side * 0.04, -UPPER_ARM, -swing * 0.16);
    let hand  = elbow.offset(0.0, -FOREARM * 0.4, -swing * 0.12 - 0.2);
    (elbow, hand)
}

// ════════════════════════════════════════════════════════════════════════════
// Drawing
// ════════════════════════════════════════════════════════════════════════════

struct Segment {
    a:     ScreenPoint,
    b:     ScreenPoint,
    depth: f32,
    color: u32,
    /// Width as a fraction of the projected scale.
    width: f32,
}

/// Draw the shadow and the figure for `player`.
pub fn draw_player<P: Projection>(canvas: &mut Canvas, camera: &P, player: &Player) {
    draw_shadow(canvas, camera, player);

    let s = pose(player);
    let limbs = [
        (s.hip,        s.knee_l,     PANTS_D, 0.075),
        (s.knee_l,     s.foot_l,     PANTS_D, 0.065),
        (s.shoulder_l, s.elbow_l,    SHIRT_D, 0.06),
        (s.elbow_l,    s.hand_l,     SKIN,    0.05),
        (s.hip,        s.neck,       SHIRT,   0.16),
        (s.hip,        s.knee_r,     PANTS,   0.075),
        (s.knee_r,     s.foot_r,     PANTS,   0.065),
        (s.shoulder_r, s.elbow_r,    SHIRT,   0.06),
        (s.elbow_r,    s.hand_r,     SKIN,    0.05),
        (s.shoulder_l, s.shoulder_r, SHIRT,   0.07),
    ];

    let mut segments: Vec<Segment> = limbs
        .iter()
        .filter_map(|&(a, b, color, width)| {
            Some(Segment {
                a: camera.project(a)?,
                b: camera.project(b)?,
                depth: (a.z + b.z) * 0.5,
                color,
                width,
            })
        })
        .collect();
    segments.sort_by(|x, y| y.depth.total_cmp(&x.depth));

    for seg in &segments {
        let avg = (seg.a.scale + seg.b.scale) * 0.5;
        canvas.draw_capsule((seg.a.x, seg.a.y), (seg.b.x, seg.b.y), (avg * seg.width).max(2.0), seg.color);
    }

    for foot in [s.foot_l, s.foot_r] {
        if let Some(p) = camera.project(foot) {
            canvas.fill_circle(p.x, p.y, (p.scale * 0.045).max(2.0), SHOE);
        }
    }
    if let Some(h) = camera.project(s.head) {
        let r = (h.scale * HEAD_RADIUS).max(3.0);
        canvas.fill_circle(h.x, h.y, r, SKIN);
        canvas.draw_circle(h.x, h.y, r, 1.0, rgb(200, 150, 118));
    }
}

/// Ellipse on the road under the player, shrinking as the player rises.
fn draw_shadow<P: Projection>(canvas: &mut Canvas, camera: &P, player: &Player) {
    let radius = SHADOW_RADIUS / (1.0 + player.y * 0.8);
    let ring: Option<Vec<(f32, f32)>> = (0..16)
        .map(|i| {
            let a = i as f32 / 16.0 * 2.0 * PI;
            camera
                .project_xyz(player.x + a.cos() * radius, 0.0, PLAYER_Z + a.sin() * radius * 0.6)
                .map(|p| (p.x, p.y))
        })
        .collect();
    if let Some(ring) = ring {
        canvas.fill_polygon_alpha(&ring, SHADOW, 90);
    }
}
