//! Software framebuffer and the raster primitives the scene is built from.
//!
//! Pixels are `0xAARRGGBB` as `minifb` expects.  Every primitive clips to the
//! buffer, so callers can pass projected coordinates that fall off screen.

// ════════════════════════════════════════════════════════════════════════════
// Colour helpers
// ════════════════════════════════════════════════════════════════════════════

pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Mix two colours channel by channel; `t` = 0.0 keeps `a`, 1.0 gives `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    [16u32, 8, 0].iter().fold(0xFF00_0000, |out, &shift| {
        let from = ((a >> shift) & 0xFF) as f32;
        let to = ((b >> shift) & 0xFF) as f32;
        out | (((from + (to - from) * t).round() as u32) << shift)
    })
}

/// Offset each channel, saturating at 0 and 255.
pub fn shade(c: u32, dr: i32, dg: i32, db: i32) -> u32 {
    let ch = |shift: u32, d: i32| (((c >> shift) & 0xFF) as i32 + d).clamp(0, 255) as u8;
    rgb(ch(16, dr), ch(8, dg), ch(0, db))
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![0xFF00_0000; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn buffer(&self) -> &[u32] { &self.buf }

    pub fn fill(&mut self, color: u32) {
        self.buf.fill(color);
    }

    /// Copy a same-sized canvas over this one.
    pub fn copy_from(&mut self, other: &Canvas) {
        if other.width == self.width && other.height == self.height {
            self.buf.copy_from_slice(&other.buf);
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.buf[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color;
        }
    }

    /// Alpha-composite `color` over the pixel; `alpha` in `0..=255`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: u32, alpha: u8) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = blend(self.buf[i], color, alpha as f32 / 255.0);
        }
    }

    /// Horizontal run `[x0, x1)` on row `y`.
    fn span(&mut self, x0: i32, x1: i32, y: i32, color: u32, alpha: u8) {
        if y < 0 || y as usize >= self.height {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width as i32);
        if x0 >= x1 {
            return;
        }
        let row = y as usize * self.width;
        let run = &mut self.buf[row + x0 as usize..row + x1 as usize];
        if alpha == 255 {
            run.fill(color);
        } else {
            let t = alpha as f32 / 255.0;
            for px in run {
                *px = blend(*px, color, t);
            }
        }
    }

    // ── rectangles ───────────────────────────────────────────────────────

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.fill_rect_alpha(x, y, w, h, color, 255);
    }

    pub fn fill_rect_alpha(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: u8) {
        for row in y.max(0)..(y + h).min(self.height as i32) {
            self.span(x, x + w, row, color, alpha);
        }
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, thickness: i32, color: u32) {
        let t = thickness.max(1);
        self.fill_rect(x, y, w, t, color);
        self.fill_rect(x, y + h - t, w, t, color);
        self.fill_rect(x, y, t, h, color);
        self.fill_rect(x + w - t, y, t, h, color);
    }

    // ── polygons ─────────────────────────────────────────────────────────

    /// Even-odd scanline fill, sampled at pixel centres.
    pub fn fill_polygon(&mut self, pts: &[(f32, f32)], color: u32) {
        self.fill_polygon_alpha(pts, color, 255);
    }

    pub fn fill_polygon_alpha(&mut self, pts: &[(f32, f32)], color: u32, alpha: u8) {
        if pts.len() < 3 || pts.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return;
        }
        let (min_y, max_y) = pts
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        let y0 = (min_y.floor() as i32).max(0);
        let y1 = (max_y.ceil() as i32).min(self.height as i32 - 1);

        let mut xs: Vec<f32> = Vec::with_capacity(pts.len());
        for y in y0..=y1 {
            let sy = y as f32 + 0.5;
            xs.clear();
            for i in 0..pts.len() {
                let (ax, ay) = pts[i];
                let (bx, by) = pts[(i + 1) % pts.len()];
                if (ay <= sy && sy < by) || (by <= sy && sy < ay) {
                    xs.push(ax + (sy - ay) / (by - ay) * (bx - ax));
                }
            }
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.chunks_exact(2) {
                self.span(pair[0].round() as i32, pair[1].round() as i32, y, color, alpha);
            }
        }
    }

    pub fn draw_polygon(&mut self, pts: &[(f32, f32)], width: f32, color: u32) {
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            self.draw_line(a, b, width, color);
        }
    }

    // ── lines ────────────────────────────────────────────────────────────

    /// Line of `width` pixels.  Thick lines are drawn as a filled quad.
    pub fn draw_line(&mut self, a: (f32, f32), b: (f32, f32), width: f32, color: u32) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt();
        if !len.is_finite() {
            return;
        }
        if width <= 1.0 || len < 1e-3 {
            let steps = len.ceil().max(1.0) as i32;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                self.set_pixel((a.0 + dx * t) as i32, (a.1 + dy * t) as i32, color);
            }
            return;
        }
        let (nx, ny) = (-dy / len * width * 0.5, dx / len * width * 0.5);
        self.fill_polygon(
            &[(a.0 + nx, a.1 + ny), (b.0 + nx, b.1 + ny), (b.0 - nx, b.1 - ny), (a.0 - nx, a.1 - ny)],
            color,
        );
    }

    /// Thick line with round ends, for limbs.
    pub fn draw_capsule(&mut self, a: (f32, f32), b: (f32, f32), width: f32, color: u32) {
        self.draw_line(a, b, width, color);
        let r = width * 0.5;
        self.fill_circle(a.0, a.1, r, color);
        self.fill_circle(b.0, b.1, r, color);
    }

    // ── circles ──────────────────────────────────────────────────────────

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        self.fill_circle_alpha(cx, cy, r, color, 255);
    }

    pub fn fill_circle_alpha(&mut self, cx: f32, cy: f32, r: f32, color: u32, alpha: u8) {
        if !(r > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let top = ((cy - r).floor() as i32).max(0);
        let bottom = ((cy + r).ceil() as i32).min(self.height as i32 - 1);
        for y in top..=bottom {
            let dy = y as f32 + 0.5 - cy;
            let half = r * r - dy * dy;
            if half < 0.0 {
                continue;
            }
            let half = half.sqrt();
            self.span((cx - half).round() as i32, (cx + half).round() as i32, y, color, alpha);
        }
    }

    /// Annulus of `thickness` pixels just inside radius `r`.
    pub fn draw_circle(&mut self, cx: f32, cy: f32, r: f32, thickness: f32, color: u32) {
        if !(r > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let inner = (r - thickness.max(1.0)).max(0.0);
        let top = ((cy - r).floor() as i32).max(0);
        let bottom = ((cy + r).ceil() as i32).min(self.height as i32 - 1);
        for y in top..=bottom {
            let dy = y as f32 + 0.5 - cy;
            let outer2 = r * r - dy * dy;
            if outer2 < 0.0 {
                continue;
            }
            let o = outer2.sqrt();
            let inner2 = inner * inner - dy * dy;
            if inner2 <= 0.0 {
                self.span((cx - o).round() as i32, (cx + o).round() as i32, y, color, 255);
            } else {
                let i = inner2.sqrt();
                self.span((cx - o).round() as i32, (cx - i).round() as i32, y, color, 255);
                self.span((cx + i).round() as i32, (cx + o).round() as i32, y, color, 255);
            }
        }
    }

    // ── text ─────────────────────────────────────────────────────────────

    /// 3×5 bitmap text, each font pixel drawn as a `scale`×`scale` block.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let s = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5 {
                let cols = glyph_row(bits, row);
                for col in 0..3 {
                    if cols & (0b100 >> col) != 0 {
                        self.fill_rect(cx + col * s, y + row * s, s, s, color);
                    }
                }
            }
            cx += 4 * s;
            if cx >= self.width as i32 {
                break;
            }
        }
    }

    /// Text centred on `cx`.
    pub fn draw_text_centered(&mut self, text: &str, cx: i32, y: i32, scale: i32, color: u32) {
        self.draw_text(text, cx - text_width(text, scale) / 2, y, scale, color);
    }
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { n * 4 * scale.max(1) - scale.max(1) }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 font
// ────────────────────────────────────────────────────────────────────────────

/// Glyph rows packed top to bottom, three bits each, leftmost column in the
/// high bit.  Sorted by character for binary search.
const FONT: [(char, u16); 49] = [
    (' ',  0b000_000_000_000_000),
    ('!',  0b010_010_010_000_010),
    ('%',  0b101_001_010_100_101),
    ('\'', 0b010_010_000_000_000),
    ('(',  0b001_010_010_010_001),
    (')',  0b100_010_010_010_100),
    ('+',  0b000_010_111_010_000),
    (',',  0b000_000_000_010_100),
    ('-',  0b000_000_111_000_000),
    ('.',  0b000_000_000_000_010),
    ('/',  0b001_001_010_100_100),
    ('0',  0b111_101_101_101_111),
    ('1',  0b010_110_010_010_111),
    ('2',  0b111_001_111_100_111),
    ('3',  0b111_001_111_001_111),
    ('4',  0b101_101_111_001_001),
    ('5',  0b111_100_111_001_111),
    ('6',  0b111_100_111_101_111),
    ('7',  0b111_001_001_001_001),
    ('8',  0b111_101_111_101_111),
    ('9',  0b111_101_111_001_111),
    (':',  0b000_010_000_010_000),
    ('?',  0b111_001_010_000_010),
    ('A',  0b010_101_111_101_101),
    ('B',  0b110_101_110_101_110),
    ('C',  0b011_100_100_100_011),
    ('D',  0b110_101_101_101_110),
    ('E',  0b111_100_110_100_111),
    ('F',  0b111_100_110_100_100),
    ('G',  0b011_100_101_101_011),
    ('H',  0b101_101_111_101_101),
    ('I',  0b111_010_010_010_111),
    ('J',  0b001_001_001_101_010),
    ('K',  0b101_101_110_101_101),
    ('L',  0b100_100_100_100_111),
    ('M',  0b101_111_111_101_101),
    ('N',  0b110_101_101_101_101),
    ('O',  0b010_101_101_101_010),
    ('P',  0b110_101_110_100_100),
    ('Q',  0b010_101_101_110_011),
    ('R',  0b110_101_110_101_101),
    ('S',  0b011_100_010_001_110),
    ('T',  0b111_010_010_010_010),
    ('U',  0b101_101_101_101_111),
    ('V',  0b101_101_101_101_010),
    ('W',  0b101_101_111_111_101),
    ('X',  0b101_101_010_101_101),
    ('Y',  0b101_101_010_010_010),
    ('Z',  0b111_001_010_100_111),
];

/// Anything outside the table renders as a centred dot.
const MISSING_GLYPH: u16 = 0b000_000_010_000_000;

fn glyph(c: char) -> u16 {
    let c = c.to_ascii_uppercase();
    FONT.binary_search_by_key(&c, |&(k, _)| k)
        .map(|i| FONT[i].1)
        .unwrap_or(MISSING_GLYPH)
}

/// Row `row` (0 = top) of a packed glyph as three column bits.
fn glyph_row(bits: u16, row: i32) -> u16 {
    (bits >> (12 - 3 * row)) & 0b111
}
