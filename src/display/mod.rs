//! # Display Module
//!
//! The 8x8 RGB pixel buffer, the LED sink seam the pipeline draws through,
//! and the low-light dimming applied just before pixels reach hardware.
//!
//! This module handles:
//! - The [`FrameBuffer`] type rendered by [`renderer`](crate::display::renderer)
//! - The [`LedSink`] trait abstracting the physical matrix
//! - The Sense HAT framebuffer device implementation
//! - A no-op sink for machines without the hardware

pub mod framebuffer;
pub mod renderer;

pub use framebuffer::SenseHatMatrix;

/// Width and height of the LED matrix.
pub const GRID_SIZE: usize = 8;

/// Number of pixels in one frame.
pub const PIXEL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Right-shift applied to every channel in low-light mode (quarter brightness).
const LOW_LIGHT_SHIFT: u8 = 2;

/// One RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Row-major 64-pixel frame: index `y * 8 + x`.
pub type FrameBuffer = [Rgb; PIXEL_COUNT];

/// An all-dark frame.
pub const BLANK_FRAME: FrameBuffer = [Rgb::BLACK; PIXEL_COUNT];

/// Buffer index for grid coordinates. Callers must pass `x, y < 8`.
#[inline]
pub fn pixel_index(x: usize, y: usize) -> usize {
    debug_assert!(x < GRID_SIZE && y < GRID_SIZE);
    y * GRID_SIZE + x
}

/// Dim a frame for low-light operation.
///
/// Every channel is scaled down by the same power of two, so dimming can
/// never brighten a pixel and black stays black.
pub fn apply_low_light(frame: &FrameBuffer) -> FrameBuffer {
    let mut dimmed = *frame;
    for pixel in dimmed.iter_mut() {
        pixel.r >>= LOW_LIGHT_SHIFT;
        pixel.g >>= LOW_LIGHT_SHIFT;
        pixel.b >>= LOW_LIGHT_SHIFT;
    }
    dimmed
}

/// Trait for the physical LED matrix output.
pub trait LedSink: Send {
    /// Push one full frame to the matrix.
    fn draw(&mut self, frame: &FrameBuffer) -> crate::error::Result<()>;

    /// Blank the matrix.
    fn clear(&mut self) -> crate::error::Result<()> {
        self.draw(&BLANK_FRAME)
    }
}

/// Sink that discards every frame, used when no matrix hardware is present.
#[derive(Debug, Default)]
pub struct NullLedSink;

impl LedSink for NullLedSink {
    fn draw(&mut self, _frame: &FrameBuffer) -> crate::error::Result<()> {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_index_is_row_major() {
        assert_eq!(pixel_index(0, 0), 0);
        assert_eq!(pixel_index(7, 0), 7);
        assert_eq!(pixel_index(0, 1), 8);
        assert_eq!(pixel_index(7, 7), 63);
    }

    #[test]
    fn test_apply_low_light_never_brightens() {
        let mut frame = BLANK_FRAME;
        frame[pixel_index(2, 5)] = Rgb::new(255, 100, 3);

        let dimmed = apply_low_light(&frame);
        for (before, after) in frame.iter().zip(dimmed.iter()) {
            assert!(after.r <= before.r);
            assert!(after.g <= before.g);
            assert!(after.b <= before.b);
        }
        assert_eq!(dimmed[pixel_index(2, 5)], Rgb::new(63, 25, 0));
    }

    #[test]
    fn test_apply_low_light_keeps_black_black() {
        let dimmed = apply_low_light(&BLANK_FRAME);
        assert_eq!(dimmed, BLANK_FRAME);
    }
}
