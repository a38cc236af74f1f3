//! Software-rendered preview window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ GESTURE: INDEX_ONLY          (or NO HAND…)   │
//! │ FINGERS: [FALSE, TRUE, …]                    │
//! │                                              │
//! │            camera frame + hand skeleton      │
//! │                                              │
//! ├──────────────────────────────────────────────┤
//! │ status bar: last dispatched action           │
//! └──────────────────────────────────────────────┘
//! ```

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use hand_gesture::{label, Landmark, LandmarkSet, HAND_CONNECTIONS};

use crate::app::TickOutcome;
use crate::error::AppError;
use crate::sim::{SimControl, SimPose};
use crate::source::Frame;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 640;
pub const WIN_H:     usize = 480;
const STATUS_H:      usize = 34;
const STATUS_Y:      usize = WIN_H - STATUS_H;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const TEXT_BG:       u32   = 0xFF0F3460;
const GREEN:         u32   = 0xFF00FF00;
const RED:           u32   = 0xFFFF0000;
const JOINT_COLOR:   u32   = 0xFFFF3030;
const BONE_COLOR:    u32   = 0xFFFFFFFF;

const POSE_KEYS: [(Key, SimPose); 7] = [
    (Key::Key0, SimPose::Fist),
    (Key::Key1, SimPose::ThumbsUp),
    (Key::Key2, SimPose::OpenPalm),
    (Key::Key3, SimPose::Index),
    (Key::Key4, SimPose::IndexMiddle),
    (Key::Key5, SimPose::IndexPinky),
    (Key::H,    SimPose::Hidden),
];

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    /// Present in simulation mode; number keys change the held pose.
    sim:    Option<SimControl>,
}

impl Visualizer {
    pub fn new(sim: Option<SimControl>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Gesture Music Player",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        // The driver paces ticks itself.
        window.limit_update_rate(None);

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim,
        })
    }

    /// False once the window has been closed.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Handle keyboard input.  Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            return false;
        }
        if let Some(ctl) = &self.sim {
            if let Some(&(_, pose)) = POSE_KEYS.iter().find(|(k, _)| pressed(*k)) {
                ctl.set(pose);
            }
        }
        true
    }

    /// Render one tick.
    pub fn render(&mut self, outcome: &TickOutcome, status: &str) {
        match outcome {
            TickOutcome::Skipped => {
                // Nothing new to show, but keep the event queue moving.
                self.window.update();
                return;
            }
            TickOutcome::NoHand { frame } => {
                self.draw_frame(frame);
                self.draw_label("NO HAND DETECTED", 10, 14, 3, RED);
            }
            TickOutcome::Hand { frame, hand, gesture, fingers, .. } => {
                self.draw_frame(frame);
                self.draw_hand(hand);
                self.draw_label(&format!("GESTURE: {}", label(*gesture)), 10, 14, 3, GREEN);
                self.draw_label(&format!("FINGERS: {}", fingers), 10, 40, 2, GREEN);
            }
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, TEXT_BG);
        self.draw_label(status, 8, STATUS_Y + 6, 2, 0xFFEEEEEE);
        if self.sim.is_some() {
            self.draw_label(
                "1=thumb 2=palm 3=index 4=index+middle 5=index+pinky 0=fist h=hide q=quit",
                8, WIN_H - 10, 1, 0xFF888888,
            );
        }

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Frame ─────────────────────────────────────────────────────────────

    /// Nearest-neighbour scale of `frame` onto the whole window.
    fn draw_frame(&mut self, frame: &Frame) {
        if frame.width == 0 || frame.height == 0 {
            self.buf.fill(BG_COLOR);
            return;
        }
        for y in 0..WIN_H {
            let sy = y * frame.height / WIN_H;
            for x in 0..WIN_W {
                let sx = x * frame.width / WIN_W;
                self.buf[y * WIN_W + x] = rgb_to_argb(frame.pixel(sx, sy));
            }
        }
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &LandmarkSet) {
        let pts = hand.points();
        for &(a, b) in HAND_CONNECTIONS.iter() {
            let (x0, y0) = to_screen(&pts[a]);
            let (x1, y1) = to_screen(&pts[b]);
            self.draw_line(x0, y0, x1, y1, BONE_COLOR);
        }
        for p in pts.iter() {
            let (x, y) = to_screen(p);
            for dy in -2..=2 {
                for dx in -2..=2 {
                    self.set_pixel_i(x + dx, y + dy, JOINT_COLOR);
                }
            }
        }
    }

    /// Bresenham line, clipped per pixel.
    fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel_i(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    /// 3×5 bitmap font, each bit drawn as a `scale`×`scale` block.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let advance = 4 * scale;
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += advance;
            if cx + advance > WIN_W { break; }
        }
    }
}

/// Normalized landmark → window pixel.
fn to_screen(p: &Landmark) -> (isize, isize) {
    let x = (p.x.clamp(0.0, 1.0) * (WIN_W - 1) as f32).round() as isize;
    let y = (p.y.clamp(0.0, 1.0) * (WIN_H - 1) as f32).round() as isize;
    (x, y)
}

fn rgb_to_argb([r, g, b]: [u8; 3]) -> u32 {
    0xFF000000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

const FALLBACK_GLYPH: [u8; 5] = [0b000, 0b000, 0b010, 0b000, 0b000];

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => FALLBACK_GLYPH,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::{FingerVector, Gesture};

    #[test]
    fn overlay_text_has_real_glyphs() {
        let mut texts = vec!["NO HAND DETECTED".to_string(), "GESTURE: none".to_string()];
        for g in Gesture::ALL {
            texts.push(format!("GESTURE: {}", g));
        }
        texts.push(format!("FINGERS: {}", FingerVector([true, false, true, false, true])));
        texts.push("thumbs_up -> Alt+Shift+B".to_string());
        texts.push("index_middle -> Ctrl+Right".to_string());
        texts.push("open_palm -> Space".to_string());
        for t in texts {
            for ch in t.chars() {
                assert!(ch == '.' || char_glyph(ch) != FALLBACK_GLYPH, "no glyph for {:?} in {:?}", ch, t);
            }
        }
    }

    #[test]
    fn to_screen_maps_corners() {
        assert_eq!(to_screen(&Landmark::new(0.0, 0.0)), (0, 0));
        assert_eq!(to_screen(&Landmark::new(1.0, 1.0)), (WIN_W as isize - 1, WIN_H as isize - 1));
        // Out-of-frame points are pinned to the border.
        assert_eq!(to_screen(&Landmark::new(-0.2, 1.3)), (0, WIN_H as isize - 1));
    }

    #[test]
    fn rgb_packs_as_argb() {
        assert_eq!(rgb_to_argb([0x12, 0x34, 0x56]), 0xFF123456);
    }
}
