//! The road world, drawn back to front through any [`Projection`].
//!
//! ```text
//! background (sky, clouds, haze, ground)
//!   → road (verges, shoulders, curbs, surface, edge lines, dashes, rails)
//!   → scenery (buildings, trees, lamps), farthest first
//!   → coins and obstacles, farthest first
//!   → player figure
//! ```
//!
//! Nothing here does its own perspective math: every world point goes through
//! the camera, so the flat ground-plane look and the full perspective look
//! share one code path.

use runner_core::entities::{Coin, Obstacle, ObstacleKind, Player};
use runner_core::geometry::ROAD_HALF_WIDTH;
use runner_core::{Level, Projection, ScreenPoint, WorldPoint};

use crate::canvas::{rgb, shade, Canvas};
use crate::figure;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const ROAD_NEAR_Z:     f32 = 2.35;
const ROAD_FAR_Z:      f32 = 74.0;
const SHOULDER_WIDTH:  f32 = 1.45;
const CURB_DROP:       f32 = -0.16;
const CENTER_STRIP:    f32 = 0.25;

const DASH_X:          f32 = 0.93;
const DASH_SPACING:    f32 = 2.3;
const DASH_LENGTH:     f32 = 1.1;

const RAIL_X:          f32 = ROAD_HALF_WIDTH + 1.06;
const RAIL_SPACING:    f32 = 3.2;
const RAIL_MID_Y:      f32 = 0.42;
const RAIL_TOP_Y:      f32 = 0.72;

const SCENERY_NEAR_Z:  f32 = 5.0;
const SCENERY_FAR_Z:   f32 = 70.0;
const SCENERY_SPACING: f32 = 3.8;
/// Trees and lamps stand this far behind their slot's building.
const PROP_OFFSET_Z:   f32 = 1.4;

const DUCK_BAR_Y:      f32 = 1.05;
const LAMP_HEIGHT:     f32 = 1.9;

const CLOUDS: [(f32, f32, f32); 4] = [
    (170.0, 92.0, 52.0),
    (410.0, 72.0, 45.0),
    (830.0, 84.0, 58.0),
    (1060.0, 70.0, 42.0),
];

// ── palette ──────────────────────────────────────────────────────────────

const DIRT:         u32 = rgb(192, 141, 96);
const SHOULDER:     u32 = rgb(144, 112, 80);
const CURB:         u32 = rgb(38, 46, 68);
pub(crate) const ROAD: u32 = rgb(67, 76, 102);
const ROAD_OUTLINE: u32 = rgb(37, 45, 67);
const EDGE_LINE:    u32 = rgb(235, 214, 180);
const STRIP:        u32 = rgb(74, 85, 112);
const DASH:         u32 = rgb(244, 244, 229);
const POST:         u32 = rgb(196, 202, 216);
const RAIL_TOP:     u32 = rgb(214, 222, 236);
const RAIL_MID:     u32 = rgb(184, 192, 208);
const HAZE:         u32 = rgb(230, 244, 255);
const WHITE:        u32 = rgb(255, 255, 255);

// ════════════════════════════════════════════════════════════════════════════
// Scrolling
// ════════════════════════════════════════════════════════════════════════════

/// First repeating slot in front of `near`: its world index and its depth.
///
/// Slot `k` sits at world distance `k * spacing`; as `scroll` grows every
/// slot approaches the camera, and a slot's index never changes while it is
/// on screen.
pub fn first_slot(scroll: f32, spacing: f32, near: f32) -> (i64, f32) {
    let phase = scroll.rem_euclid(spacing);
    let index = (scroll / spacing).floor() as i64 + 1;
    (index, near + spacing - phase)
}

/// Something on the road that needs depth sorting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Entity {
    Coin(Coin),
    Obstacle(Obstacle),
}

impl Entity {
    pub fn z(&self) -> f32 {
        match self {
            Entity::Coin(c)     => c.z,
            Entity::Obstacle(o) => o.z,
        }
    }
}

/// Coins and obstacles, farthest first.
pub fn depth_sorted(level: &Level) -> Vec<Entity> {
    let mut items: Vec<Entity> = level.coins.iter().copied().map(Entity::Coin)
        .chain(level.obstacles.iter().copied().map(Entity::Obstacle))
        .collect();
    items.sort_by(|a, b| b.z().total_cmp(&a.z()));
    items
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Prop {
    Building { x: f32, z: f32, idx: i64 },
    Tree     { x: f32, z: f32 },
    Lamp     { x: f32, z: f32, side: f32 },
}

impl Prop {
    fn z(&self) -> f32 {
        match *self {
            Prop::Building { z, .. } | Prop::Tree { z, .. } | Prop::Lamp { z, .. } => z,
        }
    }
}

fn scenery_props(scroll: f32) -> Vec<Prop> {
    let (first, mut z) = first_slot(scroll, SCENERY_SPACING, SCENERY_NEAR_Z);
    let mut props = Vec::new();
    let mut idx = first;
    while z < SCENERY_FAR_Z {
        let spread = idx.rem_euclid(3) as f32 * 0.55;
        for side in [-1.0f32, 1.0] {
            let x = side * (ROAD_HALF_WIDTH + 1.3 + spread);
            props.push(Prop::Building { x, z, idx });
            if idx.rem_euclid(2) == 0 {
                props.push(Prop::Tree { x, z: z + PROP_OFFSET_Z });
            } else {
                props.push(Prop::Lamp { x, z: z + PROP_OFFSET_Z, side });
            }
        }
        z += SCENERY_SPACING;
        idx += 1;
    }
    props.sort_by(|a, b| b.z().total_cmp(&a.z()));
    props
}

// ════════════════════════════════════════════════════════════════════════════
// SceneRenderer
// ════════════════════════════════════════════════════════════════════════════

pub struct SceneRenderer<P: Projection> {
    camera:     P,
    background: Canvas,
}

impl<P: Projection> SceneRenderer<P> {
    pub fn new(camera: P) -> Self {
        let (w, h) = camera.screen_size();
        let mut background = Canvas::new(w, h);
        paint_background(&mut background, camera.horizon_y());
        SceneRenderer { camera, background }
    }

    pub fn camera(&self) -> &P {
        &self.camera
    }

    /// One full frame of the world.
    pub fn draw(&self, canvas: &mut Canvas, level: &Level, player: &Player) {
        self.draw_background(canvas);
        self.draw_road(canvas, level.world_scroll);
        self.draw_scenery(canvas, level.world_scroll);
        self.draw_entities(canvas, level);
        figure::draw_player(canvas, &self.camera, player);
    }

    pub fn draw_background(&self, canvas: &mut Canvas) {
        canvas.copy_from(&self.background);
    }

    fn pt(&self, x: f32, y: f32, z: f32) -> Option<ScreenPoint> {
        self.camera.project(WorldPoint::new(x, y, z))
    }

    /// Project four world corners; `None` if any is behind the camera.
    fn quad(&self, corners: [(f32, f32, f32); 4]) -> Option<[(f32, f32); 4]> {
        let mut out = [(0.0, 0.0); 4];
        for (slot, (x, y, z)) in out.iter_mut().zip(corners) {
            let p = self.pt(x, y, z)?;
            *slot = (p.x, p.y);
        }
        Some(out)
    }

    /// Ground strip between two lateral offsets, near to far.
    fn ground_strip(&self, x0: f32, x1: f32) -> Option<[(f32, f32); 4]> {
        self.quad([
            (x0, 0.0, ROAD_NEAR_Z),
            (x1, 0.0, ROAD_NEAR_Z),
            (x1, 0.0, ROAD_FAR_Z),
            (x0, 0.0, ROAD_FAR_Z),
        ])
    }

    // ── road ─────────────────────────────────────────────────────────────

    pub fn draw_road(&self, canvas: &mut Canvas, scroll: f32) {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        let half = ROAD_HALF_WIDTH;
        let outer = half + SHOULDER_WIDTH;

        let (Some(road), Some(left_shoulder), Some(right_shoulder)) = (
            self.ground_strip(-half, half),
            self.ground_strip(-outer, -half),
            self.ground_strip(half, outer),
        ) else {
            return;
        };

        // Verges run from the shoulders out to the screen edges.
        let [sln, _, _, slf] = left_shoulder;
        let [_, srn, srf, _] = right_shoulder;
        canvas.fill_polygon(&[(0.0, h), sln, slf, (0.0, slf.1)], DIRT);
        canvas.fill_polygon(&[(w, h), srn, srf, (w, srf.1)], DIRT);
        canvas.fill_polygon(&left_shoulder, SHOULDER);
        canvas.fill_polygon(&right_shoulder, SHOULDER);

        for x in [-half, half] {
            if let Some(curb) = self.quad([
                (x, 0.0, ROAD_NEAR_Z),
                (x, 0.0, ROAD_FAR_Z),
                (x, CURB_DROP, ROAD_FAR_Z),
                (x, CURB_DROP, ROAD_NEAR_Z),
            ]) {
                canvas.fill_polygon(&curb, CURB);
            }
        }

        canvas.fill_polygon(&road, ROAD);
        canvas.draw_polygon(&road, 3.0, ROAD_OUTLINE);
        let [ln, rn, rf, lf] = road;
        canvas.draw_line(ln, lf, 4.0, EDGE_LINE);
        canvas.draw_line(rn, rf, 4.0, EDGE_LINE);

        if let Some(strip) = self.ground_strip(-CENTER_STRIP, CENTER_STRIP) {
            canvas.fill_polygon(&strip, STRIP);
        }

        self.draw_dashes(canvas, scroll);
        self.draw_guardrails(canvas, scroll);
    }

    fn draw_dashes(&self, canvas: &mut Canvas, scroll: f32) {
        let (_, start) = first_slot(scroll, DASH_SPACING, ROAD_NEAR_Z - DASH_SPACING);
        for x in [-DASH_X, DASH_X] {
            let mut z = start;
            while z < ROAD_FAR_Z {
                if let (Some(p0), Some(p1)) = (self.pt(x, 0.0, z), self.pt(x, 0.0, z + DASH_LENGTH)) {
                    let w0 = (p0.scale * 0.012).max(2.0);
                    let w1 = (p1.scale * 0.009).max(1.0);
                    canvas.fill_polygon(
                        &[(p0.x - w0, p0.y), (p0.x + w0, p0.y), (p1.x + w1, p1.y), (p1.x - w1, p1.y)],
                        DASH,
                    );
                }
                z += DASH_SPACING;
            }
        }
    }

    fn draw_guardrails(&self, canvas: &mut Canvas, scroll: f32) {
        let (_, start) = first_slot(scroll, RAIL_SPACING, ROAD_NEAR_Z - RAIL_SPACING);
        for side in [-1.0f32, 1.0] {
            let x = side * RAIL_X;
            let mut prev: Option<(ScreenPoint, ScreenPoint)> = None;
            let mut z = start;
            while z < ROAD_FAR_Z {
                let post = (self.pt(x, 0.0, z), self.pt(x, RAIL_MID_Y, z), self.pt(x, RAIL_TOP_Y, z));
                if let (Some(base), Some(mid), Some(top)) = post {
                    let post_w = (base.scale * 0.0048).max(1.0);
                    canvas.draw_line((base.x, base.y), (top.x, top.y), post_w, POST);
                    if let Some((prev_mid, prev_top)) = prev {
                        let rail_w = ((top.scale + prev_top.scale) * 0.5 * 0.0036).max(1.0);
                        canvas.draw_line((prev_top.x, prev_top.y), (top.x, top.y), rail_w, RAIL_TOP);
                        canvas.draw_line((prev_mid.x, prev_mid.y), (mid.x, mid.y), rail_w, RAIL_MID);
                    }
                    prev = Some((mid, top));
                }
                z += RAIL_SPACING;
            }
        }
    }

    // ── scenery ──────────────────────────────────────────────────────────

    pub fn draw_scenery(&self, canvas: &mut Canvas, scroll: f32) {
        for prop in scenery_props(scroll) {
            match prop {
                Prop::Building { x, z, idx } => self.draw_building(canvas, x, z, idx),
                Prop::Tree { x, z }          => self.draw_tree(canvas, x, z),
                Prop::Lamp { x, z, side }    => self.draw_lamp(canvas, x, z, side),
            }
        }
    }

    /// Box with roof, road-facing side and a lit front.
    fn draw_building(&self, canvas: &mut Canvas, x: f32, z: f32, idx: i64) {
        let half_w = 0.42 + idx.rem_euclid(3) as f32 * 0.08;
        let height = 1.85 + idx.rem_euclid(4) as f32 * 0.34;
        let depth  = 0.9 + idx.rem_euclid(2) as f32 * 0.2;
        let (l, r, zb) = (x - half_w, x + half_w, z + depth);

        let (Some(front), Some(roof)) = (
            self.quad([(l, 0.0, z), (r, 0.0, z), (r, height, z), (l, height, z)]),
            self.quad([(l, height, z), (r, height, z), (r, height, zb), (l, height, zb)]),
        ) else {
            return;
        };
        // The face turned toward the road.
        let sx = if x < 0.0 { r } else { l };
        let Some(side) = self.quad([(sx, 0.0, z), (sx, 0.0, zb), (sx, height, zb), (sx, height, z)]) else {
            return;
        };

        let base = rgb(
            (154 + idx.rem_euclid(4) * 8) as u8,
            (112 + idx.rem_euclid(3) * 7) as u8,
            (93 + idx.rem_euclid(2) * 10) as u8,
        );
        canvas.fill_polygon(&roof, shade(base, 20, 18, 16));
        canvas.fill_polygon(&side, shade(base, -28, -28, -24));
        canvas.fill_polygon(&front, base);
        canvas.draw_polygon(&front, 1.0, rgb(205, 170, 146));

        let xs = front.iter().map(|p| p.0);
        let min_x = xs.clone().fold(f32::MAX, f32::min) as i32;
        let max_x = xs.fold(f32::MIN, f32::max) as i32;
        let top    = front[2].1.min(front[3].1) as i32;
        let bottom = front[0].1.max(front[1].1) as i32;
        let (face_w, face_h) = (max_x - min_x, bottom - top);
        if face_w > 10 && face_h > 20 {
            let win_w = (face_w / 6).max(2);
            let win_h = (face_h / 10).max(3);
            for row in 1..=6 {
                for col in 1..=3 {
                    let wx = min_x + (col as f32 / 4.0 * face_w as f32) as i32 - win_w / 2;
                    let wy = top + (row as f32 / 8.0 * face_h as f32) as i32;
                    if wy + win_h >= bottom - 2 {
                        continue;
                    }
                    canvas.fill_rect(wx, wy, win_w, win_h, rgb(214, 233, 252));
                }
            }
        }
    }

    fn draw_tree(&self, canvas: &mut Canvas, x: f32, z: f32) {
        let (tw, th, td) = (0.1, 0.82, 0.32);
        let (l, r) = (x - tw, x + tw);
        let sx = if x < 0.0 { r } else { l };
        let (Some(front), Some(side)) = (
            self.quad([(l, 0.0, z), (r, 0.0, z), (r, th, z), (l, th, z)]),
            self.quad([(sx, 0.0, z), (sx, 0.0, z + td), (sx, th, z + td), (sx, th, z)]),
        ) else {
            return;
        };
        canvas.fill_polygon(&side, rgb(88, 62, 47));
        canvas.fill_polygon(&front, rgb(124, 86, 58));

        let crowns = (
            self.pt(x + 0.04, 1.16, z + 0.32),
            self.pt(x - 0.02, 1.2, z + 0.08),
            self.pt(x, 1.46, z + 0.12),
        );
        let (Some(back), Some(front), Some(top)) = crowns else {
            return;
        };
        let front_r = (front.scale * 0.19).max(6.0);
        canvas.fill_circle(back.x, back.y, (back.scale * 0.13).max(4.0), rgb(56, 120, 58));
        canvas.fill_circle(front.x, front.y, front_r, rgb(74, 151, 72));
        canvas.fill_circle(top.x, top.y, (top.scale * 0.12).max(4.0), rgb(102, 186, 93));
        canvas.fill_circle(
            front.x - front_r * 0.35,
            front.y - front_r * 0.35,
            (front_r * 0.56).max(3.0),
            rgb(134, 206, 118),
        );
    }

    /// Post with an arm reaching over the verge and a glowing head.
    fn draw_lamp(&self, canvas: &mut Canvas, x: f32, z: f32, side: f32) {
        let arm_x = x - side * 0.45;
        let (Some(base), Some(top), Some(head)) = (
            self.pt(x, 0.0, z),
            self.pt(x, LAMP_HEIGHT, z),
            self.pt(arm_x, LAMP_HEIGHT - 0.05, z),
        ) else {
            return;
        };
        let w = (base.scale * 0.012).max(1.0);
        canvas.draw_line((base.x, base.y), (top.x, top.y), w, rgb(92, 100, 118));
        canvas.draw_line((top.x, top.y), (head.x, head.y), (w * 0.7).max(1.0), rgb(92, 100, 118));
        let r = (head.scale * 0.06).max(2.0);
        canvas.fill_circle_alpha(head.x, head.y, r * 2.4, rgb(255, 236, 170), 60);
        canvas.fill_circle(head.x, head.y, r, rgb(255, 244, 200));
    }

    // ── coins and obstacles ──────────────────────────────────────────────

    pub fn draw_entities(&self, canvas: &mut Canvas, level: &Level) {
        for item in depth_sorted(level) {
            match item {
                Entity::Coin(c)     => self.draw_coin(canvas, &c),
                Entity::Obstacle(o) => self.draw_obstacle(canvas, &o),
            }
        }
    }

    fn draw_obstacle(&self, canvas: &mut Canvas, o: &Obstacle) {
        let x = o.lane.world_x();
        let Some(ground) = self.pt(x, 0.0, o.z) else { return };
        let s = ground.scale;
        match o.kind {
            ObstacleKind::JumpOver => {
                let w = (s * 0.70).max(12.0) as i32;
                let h = (s * 0.35).max(10.0) as i32;
                let (rx, ry) = ((ground.x - w as f32 * 0.5) as i32, ground.y as i32 - h);
                canvas.fill_rect(rx, ry, w, h, rgb(237, 121, 72));
                canvas.draw_rect(rx, ry, w, h, 2, rgb(255, 226, 188));
                canvas.fill_rect(rx + 3, ry + h - (h / 3).max(6), w - 6, (h / 5).max(3), rgb(194, 86, 48));
            }
            ObstacleKind::DuckUnder => {
                let Some(bar) = self.pt(x, DUCK_BAR_Y, o.z) else { return };
                let w = (s * 0.95).max(22.0) as i32;
                let h = (s * 0.13).max(7.0) as i32;
                let (rx, ry) = ((ground.x - w as f32 * 0.5) as i32, (bar.y - h as f32 * 0.5) as i32);
                canvas.fill_rect(rx, ry, w, h, rgb(83, 158, 246));
                canvas.draw_rect(rx, ry, w, h, 2, rgb(228, 245, 255));
            }
        }
    }

    fn draw_coin(&self, canvas: &mut Canvas, c: &Coin) {
        let Some(p) = self.pt(c.lane.world_x(), c.height(), c.z) else { return };
        let r = (p.scale * 0.16).max(4.0);
        canvas.fill_circle_alpha(p.x, p.y, r * 2.0, rgb(255, 236, 133), 62);
        canvas.fill_circle_alpha(p.x, p.y, r * 1.6, rgb(255, 204, 58), 116);
        canvas.fill_circle(p.x, p.y, r, rgb(250, 198, 40));
        canvas.fill_circle(p.x - r * 0.25, p.y - r * 0.25, (r / 3.0).max(2.0), rgb(255, 235, 128));
        canvas.draw_circle(p.x, p.y, r, (r / 6.0).max(1.0), rgb(235, 151, 24));
    }
}

/// Sky and ground gradients, clouds and the horizon haze.
fn paint_background(canvas: &mut Canvas, horizon: f32) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let horizon_row = horizon as i32;
    for y in 0..h {
        let color = if y < horizon_row {
            let k = y as f32 / horizon.max(1.0);
            rgb((28.0 + 110.0 * k) as u8, (94.0 + 120.0 * k) as u8, (198.0 + 45.0 * k) as u8)
        } else {
            let k = (y - horizon_row) as f32 / (h - horizon_row).max(1) as f32;
            rgb((174.0 - 110.0 * k) as u8, (208.0 - 128.0 * k) as u8, (238.0 - 140.0 * k) as u8)
        };
        canvas.fill_rect(0, y, w, 1, color);
    }
    for (cx, cy, r) in CLOUDS {
        canvas.fill_circle(cx, cy, r, WHITE);
        canvas.fill_circle(cx + (r / 2.0).floor(), cy + 8.0, r * 0.66, WHITE);
        canvas.fill_circle(cx - (r / 2.0).floor(), cy + 12.0, r * 0.62, WHITE);
    }
    canvas.fill_rect_alpha(0, horizon_row - 6, w, 90, HAZE, 82);
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner_core::{GroundPlaneCamera, Lane, ModeId, ModeProfile, PerspectiveCamera};

    fn level() -> Level {
        Level::new(ModeProfile::get(ModeId::Kids), 7)
    }

    #[test]
    fn slots_scroll_toward_the_camera_and_keep_their_index() {
        let (i0, z0) = first_slot(0.0, 3.8, 5.0);
        assert_eq!(i0, 1);
        assert!((z0 - 8.8).abs() < 1e-5);

        let (i1, z1) = first_slot(1.0, 3.8, 5.0);
        assert_eq!(i1, 1);
        assert!((z1 - 7.8).abs() < 1e-5);

        // Just past one full spacing the old slot 1 has left, slot 2 is first
        // and sits exactly one spacing further out than slot 1 used to.
        let (i2, z2) = first_slot(3.8 + 1.0, 3.8, 5.0);
        assert_eq!(i2, 2);
        assert!((z2 - z1).abs() < 1e-4);
    }

    #[test]
    fn entities_are_drawn_farthest_first() {
        let mut lv = level();
        lv.coins.push(Coin { lane: Lane::LEFT, z: 10.0, phase: 0.0 });
        lv.coins.push(Coin { lane: Lane::RIGHT, z: 30.0, phase: 0.0 });
        lv.obstacles.push(Obstacle { lane: Lane::CENTER, kind: ObstacleKind::JumpOver, z: 20.0 });
        lv.obstacles.push(Obstacle { lane: Lane::CENTER, kind: ObstacleKind::DuckUnder, z: 45.0 });
        let zs: Vec<f32> = depth_sorted(&lv).iter().map(Entity::z).collect();
        assert_eq!(zs, vec![45.0, 30.0, 20.0, 10.0]);
    }

    #[test]
    fn scenery_props_are_sorted_and_alternate_trees_and_lamps() {
        let props = scenery_props(12.3);
        assert!(props.windows(2).all(|w| w[0].z() >= w[1].z()));
        let trees = props.iter().filter(|p| matches!(p, Prop::Tree { .. })).count();
        let lamps = props.iter().filter(|p| matches!(p, Prop::Lamp { .. })).count();
        assert!(trees > 0 && lamps > 0);
        assert!((trees as i32 - lamps as i32).abs() <= 2);
    }

    #[test]
    fn background_has_sky_on_top_and_road_below_the_horizon() {
        let scene = SceneRenderer::new(PerspectiveCamera::default());
        let mut canvas = Canvas::new(1280, 720);
        scene.draw_background(&mut canvas);
        assert_eq!(canvas.pixel(5, 0), Some(rgb(28, 94, 198)));

        scene.draw_road(&mut canvas, 0.0);
        // Row 500 is z ≈ 3.6; column 766 is x ≈ 0.6, between the strip and a dash.
        assert_eq!(canvas.pixel(766, 500), Some(ROAD));
    }

    #[test]
    fn both_cameras_render_a_full_frame() {
        let mut lv = level();
        for _ in 0..120 {
            lv.update(1.0 / 30.0, 11.6);
        }
        let player = Player::default();
        let mut canvas = Canvas::new(1280, 720);
        SceneRenderer::new(PerspectiveCamera::default()).draw(&mut canvas, &lv, &player);
        let persp: Vec<u32> = canvas.buffer().to_vec();
        SceneRenderer::new(GroundPlaneCamera::default()).draw(&mut canvas, &lv, &player);
        assert_ne!(persp, canvas.buffer());
    }
}
