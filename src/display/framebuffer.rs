//! # Sense HAT LED Matrix
//!
//! The Sense HAT exposes its 8x8 LED matrix as a Linux framebuffer device
//! named `RPi-Sense FB`. One frame is 64 RGB565 little-endian words written
//! from offset zero.
//!
//! Detection scans `/sys/class/graphics/fb*/name` for the matching name, the
//! same pattern the joystick uses for its evdev device.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, info};

use super::{FrameBuffer, LedSink, Rgb, PIXEL_COUNT};
use crate::error::{Result, SenseLoopError};

/// Framebuffer name advertised by the Sense HAT kernel driver.
const SENSE_HAT_FB_NAME: &str = "RPi-Sense FB";

/// Sysfs directory listing framebuffer devices.
const SYSFS_GRAPHICS_DIR: &str = "/sys/class/graphics";

/// Handle to the Sense HAT LED matrix framebuffer.
pub struct SenseHatMatrix {
    file: File,
    device_path: String,
}

impl std::fmt::Debug for SenseHatMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseHatMatrix")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SenseHatMatrix {
    /// Detect and open the Sense HAT framebuffer.
    ///
    /// # Errors
    ///
    /// Returns [`SenseLoopError::LedMatrix`] when no framebuffer named
    /// `RPi-Sense FB` exists, or an I/O error when opening the device fails.
    pub fn open() -> Result<Self> {
        Self::open_in(Path::new(SYSFS_GRAPHICS_DIR))
    }

    /// Detect the matrix by scanning a sysfs graphics directory.
    fn open_in(sysfs_dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(sysfs_dir).map_err(|e| {
            SenseLoopError::LedMatrix(format!("failed to read {}: {}", sysfs_dir.display(), e))
        })?;

        for entry in entries.flatten() {
            let name_path = entry.path().join("name");
            let Ok(mut file) = File::open(&name_path) else {
                continue;
            };

            let mut name = String::new();
            if file.read_to_string(&mut name).is_err() {
                continue;
            }

            debug!("Found framebuffer {}: {}", entry.path().display(), name.trim());
            if name.trim() == SENSE_HAT_FB_NAME {
                let device_path = format!("/dev/{}", entry.file_name().to_string_lossy());
                return Self::open_device(&device_path);
            }
        }

        Err(SenseLoopError::LedMatrix(format!(
            "no framebuffer named '{}' found",
            SENSE_HAT_FB_NAME
        )))
    }

    /// Open a specific framebuffer device path.
    pub fn open_device(path: &str) -> Result<Self> {
        let file = OpenOptions::new().write(true).open(path)?;
        info!("Opened Sense HAT LED matrix at {}", path);
        Ok(Self {
            file,
            device_path: path.to_string(),
        })
    }

    /// Device path of the opened framebuffer.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// Pack a pixel into RGB565.
fn rgb565(pixel: Rgb) -> u16 {
    let r = (pixel.r as u16 >> 3) << 11;
    let g = (pixel.g as u16 >> 2) << 5;
    let b = pixel.b as u16 >> 3;
    r | g | b
}

impl LedSink for SenseHatMatrix {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<()> {
        let mut raw = [0u8; PIXEL_COUNT * 2];
        for (i, pixel) in frame.iter().enumerate() {
            let word = rgb565(*pixel).to_le_bytes();
            raw[i * 2] = word[0];
            raw[i * 2 + 1] = word[1];
        }

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_packs_extremes() {
        assert_eq!(rgb565(Rgb::BLACK), 0x0000);
        assert_eq!(rgb565(Rgb::new(255, 255, 255)), 0xffff);
        assert_eq!(rgb565(Rgb::new(255, 0, 0)), 0xf800);
        assert_eq!(rgb565(Rgb::new(0, 255, 0)), 0x07e0);
        assert_eq!(rgb565(Rgb::new(0, 0, 255)), 0x001f);
    }

    #[test]
    fn test_draw_writes_128_bytes_from_start() {
        use super::super::BLANK_FRAME;
        use tempfile::NamedTempFile;

        let temp = NamedTempFile::new().unwrap();
        let mut matrix =
            SenseHatMatrix::open_device(temp.path().to_str().unwrap()).unwrap();

        let mut frame = BLANK_FRAME;
        frame[0] = Rgb::new(255, 0, 0);
        matrix.draw(&frame).unwrap();
        matrix.draw(&BLANK_FRAME).unwrap();

        let raw = std::fs::read(temp.path()).unwrap();
        assert_eq!(raw.len(), PIXEL_COUNT * 2);
        // Second draw overwrote from offset zero
        assert_eq!(&raw[0..2], &[0x00, 0x00]);
    }

    #[test]
    fn test_open_reports_missing_device() {
        let result = SenseHatMatrix::open_in(Path::new("/nonexistent-sysfs"));
        assert!(result.is_err());
    }
}
