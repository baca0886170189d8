//! The `minifb` window: key polling in, framebuffer out.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ SCORE / COINS / BEST          [ JUMP ]          mode / TIME / COMBO  │
//! │ ▓▓▓▓▓▓▓░░░ session progress                         intensity  kcal  │
//! │                                                                      │
//! │                    road, scenery, coins, obstacles                   │
//! │                             runner figure                            │
//! │                                                                      │
//! │ status bar: classifier message                     TRACKED / KEYS    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calibration and game-over screens draw a translucent panel over the
//! running scene.  Everything here draws into a [`Canvas`], so the overlays
//! can be checked without opening a window.

use std::time::Duration;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use runner_core::{KeyboardState, Projection, Prompt};

use crate::app::{AppState, ControlKey, InputFrame, Screen};
use crate::canvas::{rgb, text_width, Canvas};
use crate::error::AppError;
use crate::scene::SceneRenderer;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const TITLE:        &str = "Gesture Runner";
const FRAME_TIME:   Duration = Duration::from_millis(33);
const PANEL_W:      i32 = 250;
const STATUS_H:     i32 = 34;

const TEXT:         u32 = rgb(238, 244, 255);
const TEXT_DIM:     u32 = rgb(150, 168, 200);
const PANEL:        u32 = rgb(12, 22, 44);
const OVERLAY:      u32 = rgb(8, 18, 40);
const BAR_BG:       u32 = rgb(20, 40, 82);
const BAR_BORDER:   u32 = rgb(110, 160, 232);
const BAR_FILL:     u32 = rgb(32, 126, 238);
const GOOD:         u32 = rgb(96, 214, 130);
const WARN:         u32 = rgb(246, 196, 82);
const BAD:          u32 = rgb(240, 98, 92);

const CAL_CONTROLS: &str = "R: restart capture   S: skip   ESC: back to mode select";
const END_CONTROLS: &str = "R / ENTER / SPACE or jump: run again   M / ESC: mode select";

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer<P: Projection> {
    window: Window,
    canvas: Canvas,
    scene:  SceneRenderer<P>,
}

impl<P: Projection> Visualizer<P> {
    pub fn new(camera: P) -> Result<Self, AppError> {
        let (w, h) = camera.screen_size();
        let mut window = Window::new(
            TITLE,
            w, h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        window.limit_update_rate(Some(FRAME_TIME));

        Ok(Visualizer {
            window,
            canvas: Canvas::new(w, h),
            scene:  SceneRenderer::new(camera),
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Held arrow keys plus the control keys pressed since the last frame.
    pub fn poll_input(&self) -> InputFrame {
        let down = |k: Key| self.window.is_key_down(k);
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        let arrows = KeyboardState {
            left:  down(Key::Left),
            right: down(Key::Right),
            up:    down(Key::Up),
            down:  down(Key::Down),
        };
        let pressed = [
            (Key::R,        ControlKey::R),
            (Key::S,        ControlKey::S),
            (Key::M,        ControlKey::M),
            (Key::Escape,   ControlKey::Escape),
            (Key::Enter,    ControlKey::Enter),
            (Key::NumPadEnter, ControlKey::Enter),
            (Key::Space,    ControlKey::Space),
        ]
        .into_iter()
        .filter(|&(key, _)| one_shot(key))
        .map(|(_, control)| control)
        .collect();

        InputFrame { arrows, pressed }
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState) -> Result<(), AppError> {
        draw_app(&mut self.canvas, &self.scene, app);
        self.window
            .update_with_buffer(self.canvas.buffer(), self.canvas.width(), self.canvas.height())?;
        Ok(())
    }
}

/// Scene plus whatever overlay the current screen needs.
pub fn draw_app<P: Projection>(canvas: &mut Canvas, scene: &SceneRenderer<P>, app: &AppState) {
    let session = app.session();
    scene.draw(canvas, &session.level, &session.player);
    match app.screen() {
        Screen::Calibrating => draw_calibration(canvas, app),
        Screen::Playing => {
            draw_hud(canvas, app);
            draw_status_bar(canvas, app);
        }
        Screen::GameOver => {
            draw_hud(canvas, app);
            draw_game_over(canvas, app);
        }
    }
}

// ── HUD ──────────────────────────────────────────────────────────────────

fn prompt_color(prompt: Prompt) -> u32 {
    match prompt {
        Prompt::Run  => GOOD,
        Prompt::Jump => WARN,
        Prompt::Duck => rgb(120, 186, 255),
    }
}

fn draw_hud(canvas: &mut Canvas, app: &AppState) {
    let s = app.session();
    let m = &s.tracker.metrics;
    let w = canvas.width() as i32;

    // Left: score.
    canvas.fill_rect_alpha(12, 12, PANEL_W, 92, PANEL, 170);
    canvas.draw_text(&format!("SCORE {}", s.score), 24, 22, 3, TEXT);
    canvas.draw_text(&format!("COINS {}", s.coin_count), 24, 50, 2, rgb(255, 214, 90));
    canvas.draw_text(&format!("BEST {}", s.best_score), 24, 70, 2, TEXT_DIM);
    progress_bar(canvas, 24, 90, PANEL_W - 24, 8, m.progress, BAR_FILL);

    // Right: mode and session metrics.
    let x = w - PANEL_W - 12;
    canvas.fill_rect_alpha(x, 12, PANEL_W, 92, PANEL, 170);
    canvas.draw_text(app.mode().id.label(), x + 12, 22, 2, TEXT);
    canvas.draw_text(&format!("TIME {}", s.tracker.formatted_timer()), x + 12, 42, 2, TEXT);
    canvas.draw_text(&format!("COMBO X{}", m.combo), x + 12, 62, 2, WARN);
    canvas.draw_text(&format!("{:.1} KCAL", m.calories), x + 140, 62, 2, TEXT_DIM);
    progress_bar(canvas, x + 12, 86, PANEL_W - 24, 8, m.intensity, GOOD);

    // Centre: what to do next.
    let label = s.prompt.label();
    let pw = text_width(label, 5) + 36;
    let px = w / 2 - pw / 2;
    canvas.fill_rect_alpha(px, 14, pw, 48, PANEL, 150);
    canvas.draw_rect(px, 14, pw, 48, 2, prompt_color(s.prompt));
    canvas.draw_text_centered(label, w / 2, 26, 5, prompt_color(s.prompt));
}

fn draw_status_bar(canvas: &mut Canvas, app: &AppState) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    canvas.fill_rect_alpha(0, h - STATUS_H, w, STATUS_H, PANEL, 200);
    canvas.draw_text(&app.status, 12, h - STATUS_H + 10, 2, TEXT);
    let (tag, color) = if app.controls().tracked { ("TRACKED", GOOD) } else { ("KEYS", WARN) };
    canvas.draw_text(tag, w - text_width(tag, 2) - 12, h - STATUS_H + 10, 2, color);
}

fn progress_bar(canvas: &mut Canvas, x: i32, y: i32, w: i32, h: i32, fraction: f32, fill: u32) {
    canvas.fill_rect(x, y, w, h, BAR_BG);
    let filled = (w as f32 * fraction.clamp(0.0, 1.0)) as i32;
    canvas.fill_rect(x, y, filled, h, fill);
    canvas.draw_rect(x, y, w, h, 1, BAR_BORDER);
}

// ── calibration ──────────────────────────────────────────────────────────

fn draw_calibration(canvas: &mut Canvas, app: &AppState) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let (cx, cy) = (w / 2, h / 2);
    let cal = app.calibration();

    canvas.fill_rect_alpha(0, 0, w, h, OVERLAY, 192);
    canvas.draw_text_centered(&format!("Calibrating: {}", cal.mode().id.label()), cx, cy - 235, 4, TEXT);

    let hint = app.classifier().calibration_hint();
    let hint = if hint.is_empty() { "Hold a neutral position." } else { hint };
    canvas.draw_text_centered(hint, cx, cy - 178, 2, TEXT_DIM);

    let (bx, by, bw, bh) = (cx - 340, cy - 130, 680, 34);
    canvas.fill_rect(bx, by, bw, bh, BAR_BG);
    canvas.fill_rect(bx, by, (bw as f32 * cal.progress()) as i32, bh, BAR_FILL);
    canvas.draw_rect(bx, by, bw, bh, 2, BAR_BORDER);
    let pct = (cal.progress() * 100.0).round() as u32;
    canvas.draw_text_centered(&format!("Progress: {pct}%"), cx, cy - 82, 3, TEXT);

    canvas.draw_text_centered(&app.status, cx, h - 96, 2, WARN);
    let saved = if cal.has_saved_profile() {
        "Saved profile found: press S to skip and use it."
    } else {
        "No saved profile yet for this mode."
    };
    canvas.draw_text_centered(saved, cx, h - 66, 2, TEXT_DIM);
    canvas.draw_text_centered(CAL_CONTROLS, cx, h - 36, 2, TEXT_DIM);
}

// ── game over ────────────────────────────────────────────────────────────

fn draw_game_over(canvas: &mut Canvas, app: &AppState) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let (cx, cy) = (w / 2, h / 2);
    let s = app.session();

    canvas.fill_rect_alpha(cx - 360, cy - 110, 720, 220, OVERLAY, 210);
    canvas.draw_rect(cx - 360, cy - 110, 720, 220, 2, BAD);
    canvas.draw_text_centered("GAME OVER", cx, cy - 90, 6, BAD);
    canvas.draw_text_centered(
        &format!("Score {}   Coins {}   Best {}", s.score, s.coin_count, s.best_score),
        cx, cy - 16, 3, TEXT,
    );
    canvas.draw_text_centered(
        &format!("Time {}   {:.1} kcal", s.tracker.formatted_timer(), s.tracker.metrics.calories),
        cx, cy + 22, 2, TEXT_DIM,
    );
    canvas.draw_text_centered(END_CONTROLS, cx, cy + 70, 2, TEXT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_engine::{CalibrationMap, CalibrationStore, MemoryStore, Unavailable};
    use runner_core::{ModeId, PerspectiveCamera};
    use std::time::Instant;

    fn frame(app: &AppState) -> Canvas {
        let scene = SceneRenderer::new(PerspectiveCamera::default());
        let mut canvas = Canvas::new(1280, 720);
        draw_app(&mut canvas, &scene, app);
        canvas
    }

    #[test]
    fn calibration_overlay_darkens_the_scene_and_draws_the_bar() {
        let app = AppState::new(ModeId::Kids, Box::new(MemoryStore::new()), 1);
        let c = frame(&app);
        // Sky pixel under the overlay is no longer the raw sky colour.
        assert_ne!(c.pixel(5, 0), Some(rgb(28, 94, 198)));
        // Empty progress bar interior.
        assert_eq!(c.pixel(640 - 300, 360 - 113), Some(BAR_BG));
    }

    #[test]
    fn playing_screen_shows_the_status_bar() {
        let mut store = MemoryStore::new();
        let baseline = CalibrationMap::from([("pose_baseline_torso_x".to_string(), 0.5)]);
        store.save(ModeId::Kids, &baseline).unwrap();
        let mut app = AppState::new(ModeId::Kids, Box::new(store), 1);
        let skip = InputFrame { pressed: vec![ControlKey::S], ..Default::default() };
        app.step(&Err(Unavailable::NoLandmarks), &skip, 0.03, Instant::now());
        assert_eq!(app.screen(), Screen::Playing);

        let c = frame(&app);
        // "KEYS" tag in the bottom-right corner of the status bar.
        let tag_x = 1280 - text_width("KEYS", 2) - 12;
        let row = 720 - STATUS_H + 10;
        let lit = (0..text_width("KEYS", 2)).any(|dx| c.pixel(tag_x + dx, row) == Some(WARN));
        assert!(lit);
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        let mut c = Canvas::new(120, 20);
        progress_bar(&mut c, 10, 5, 100, 10, 0.5, BAR_FILL);
        assert_eq!(c.pixel(30, 10), Some(BAR_FILL));
        assert_eq!(c.pixel(90, 10), Some(BAR_BG));
        assert_eq!(c.pixel(10, 5), Some(BAR_BORDER));
    }
}
