//! # Mode Renderer Module
//!
//! Pure rendering of the four visualization modes into a [`FrameBuffer`].
//!
//! Every frame is computed from scratch from `(mode, telemetry, power flag,
//! elapsed time, rng)`; nothing persists between frames, so a mode switch can
//! never leak pixel semantics from the previous mode. Out-of-range numeric
//! inputs are clamped, never rejected, and rendering cannot fail.
//!
//! ## Modes
//!
//! | Mode | Pattern |
//! |------|---------|
//! | Monitor | 2x2 center block pulsing green, intensity `150 + 100*sin(3t)` |
//! | Spirit Level | single bubble pixel from pitch/roll over a +-20 deg range |
//! | Rainbow Wave | per-pixel sine waves in all three channels, phase `2t` |
//! | Fire Effect | every pixel resampled per frame, r in [150,255], g in [0,100] |

use rand::Rng;

use super::{pixel_index, FrameBuffer, Rgb, BLANK_FRAME, GRID_SIZE};
use crate::sensor::Telemetry;
use crate::state::{DisplayMode, StateSnapshot};

/// Full-scale tilt in degrees mapped to the edge of the matrix.
const SPIRIT_FULL_SCALE_DEG: f64 = 20.0;

/// Grid center used by the spirit level offset mapping.
const GRID_CENTER: f64 = 3.5;

/// 3x5 digit glyphs for the mode-number indicator, row bits left-to-right.
const DIGIT_GLYPHS: [[u8; 5]; 4] = [
    // 0
    [0b111, 0b101, 0b101, 0b101, 0b111],
    // 1
    [0b010, 0b110, 0b010, 0b010, 0b111],
    // 2
    [0b111, 0b001, 0b111, 0b100, 0b111],
    // 3
    [0b111, 0b001, 0b011, 0b001, 0b111],
];

/// Render one frame for a mode.
///
/// # Arguments
///
/// * `mode` - Active visualization mode
/// * `telemetry` - Current sensor readings (only pitch/roll are consumed)
/// * `power_on` - When false the result is all-dark regardless of mode
/// * `elapsed` - Seconds since the pipeline started, drives the animations
/// * `rng` - Randomness source for the fire effect
pub fn render<R: Rng>(
    mode: DisplayMode,
    telemetry: &Telemetry,
    power_on: bool,
    elapsed: f64,
    rng: &mut R,
) -> FrameBuffer {
    if !power_on {
        return BLANK_FRAME;
    }

    match mode {
        DisplayMode::Monitor => render_monitor(elapsed),
        DisplayMode::SpiritLevel => render_spirit_level(telemetry.pitch, telemetry.roll),
        DisplayMode::RainbowWave => render_rainbow(elapsed),
        DisplayMode::Fire => render_fire(rng),
    }
}

/// Render one frame for a full state snapshot.
///
/// Power-off wins over everything. An active mode transition replaces the
/// mode pattern with the blue mode-number digit on a dark background, which
/// is what guarantees a blank hand-over between two modes that reuse the same
/// coordinates with different meanings.
pub fn render_frame<R: Rng>(
    snapshot: &StateSnapshot,
    telemetry: &Telemetry,
    elapsed: f64,
    rng: &mut R,
    indicator_color: Rgb,
) -> FrameBuffer {
    if !snapshot.power_on {
        return BLANK_FRAME;
    }

    if let Some(digit) = snapshot.transition_digit {
        return render_digit(digit, indicator_color);
    }

    render(snapshot.mode, telemetry, true, elapsed, rng)
}

/// Monitor mode: a 2x2 center block pulsing green.
///
/// Intensity is `150 + 100*sin(3t)`, always inside `[50, 250]`.
fn render_monitor(elapsed: f64) -> FrameBuffer {
    let intensity = (150.0 + 100.0 * (elapsed * 3.0).sin()) as u8;
    let color = Rgb::new(0, intensity, 0);

    let mut frame = BLANK_FRAME;
    for &(x, y) in &[(3, 3), (3, 4), (4, 3), (4, 4)] {
        frame[pixel_index(x, y)] = color;
    }
    frame
}

/// Spirit level: one bubble pixel positioned from pitch and roll.
///
/// Roll maps to the vertical offset and negated pitch to the horizontal one,
/// each over a +-20 degree full scale from the grid center; coordinates are
/// truncated and clamped into the grid. The bubble is green inside the
/// central 2x2 block (level) and red anywhere else (tilted).
fn render_spirit_level(pitch: f64, roll: f64) -> FrameBuffer {
    let y = clamp_coord(GRID_CENTER + (roll / SPIRIT_FULL_SCALE_DEG) * GRID_CENTER);
    let x = clamp_coord(GRID_CENTER + (-pitch / SPIRIT_FULL_SCALE_DEG) * GRID_CENTER);

    let level = (3..=4).contains(&x) && (3..=4).contains(&y);
    let color = if level {
        Rgb::new(0, 255, 0)
    } else {
        Rgb::new(255, 0, 0)
    };

    let mut frame = BLANK_FRAME;
    frame[pixel_index(x, y)] = color;
    frame
}

/// Rainbow wave: three phase-shifted sine fields over the grid, phase `2t`.
fn render_rainbow(elapsed: f64) -> FrameBuffer {
    let phase = elapsed * 2.0;

    let mut frame = BLANK_FRAME;
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            let (fx, fy) = (x as f64, y as f64);
            frame[pixel_index(x, y)] = Rgb::new(
                (128.0 + 127.0 * (fx / 2.0 + phase).sin()) as u8,
                (128.0 + 127.0 * (fy / 2.0 + phase).sin()) as u8,
                (128.0 + 127.0 * ((fx + fy) / 2.0 + phase).sin()) as u8,
            );
        }
    }
    frame
}

/// Fire effect: every pixel independently resampled each frame.
///
/// The per-frame flicker is the effect; no smoothing is applied.
fn render_fire<R: Rng>(rng: &mut R) -> FrameBuffer {
    let mut frame = BLANK_FRAME;
    for pixel in frame.iter_mut() {
        *pixel = Rgb::new(rng.gen_range(150..=255), rng.gen_range(0..=100), 0);
    }
    frame
}

/// Render a mode-number digit (0-3) centered on a dark frame.
fn render_digit(digit: u8, color: Rgb) -> FrameBuffer {
    let glyph = DIGIT_GLYPHS[(digit as usize) % DIGIT_GLYPHS.len()];

    let mut frame = BLANK_FRAME;
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..3 {
            if (bits >> (2 - col)) & 1 == 1 {
                frame[pixel_index(2 + col, 1 + row)] = color;
            }
        }
    }
    frame
}

/// Truncate a fractional grid coordinate and clamp it into `[0, 7]`.
fn clamp_coord(value: f64) -> usize {
    (value as i64).clamp(0, GRID_SIZE as i64 - 1) as usize
}
