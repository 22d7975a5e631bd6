//! # Sense HAT Joystick
//!
//! The five-way stick is exposed by the kernel as an evdev input device named
//! `Raspberry Pi Sense HAT Joystick`, emitting EV_KEY events:
//!
//! | Key | Direction |
//! |-----|-----------|
//! | KEY_LEFT | left |
//! | KEY_RIGHT | right |
//! | KEY_UP | up |
//! | KEY_DOWN | down |
//! | KEY_ENTER | center |
//!
//! Event values: 1 = pressed, 2 = held (autorepeat), 0 = released. Releases
//! carry no mapping and are dropped.

use std::path::Path;

use evdev::{Device, InputEventKind, Key};
use tracing::{debug, info};

use super::{Action, Direction, InputEvent, JoystickSource};
use crate::error::{Result, SenseLoopError};

/// Device name advertised by the Sense HAT joystick driver.
const SENSE_HAT_JOYSTICK_NAME: &str = "Raspberry Pi Sense HAT Joystick";

/// Handle to the Sense HAT joystick evdev device.
pub struct SenseHatJoystick {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for SenseHatJoystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseHatJoystick")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SenseHatJoystick {
    /// Detect and open the Sense HAT joystick.
    ///
    /// Scans `/dev/input/event*` for a device advertising the Sense HAT
    /// joystick name.
    ///
    /// # Errors
    ///
    /// Returns [`SenseLoopError::Joystick`] when no matching device exists or
    /// none can be opened (typically a permissions problem on `/dev/input`).
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(SenseLoopError::Joystick(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| SenseLoopError::Joystick(format!("failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                SenseLoopError::Joystick(format!("failed to read directory entry: {}", e))
            })?;

        // Deterministic scan order
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let Some(filename) = path.file_name() else {
                continue;
            };
            if !filename.to_string_lossy().starts_with("event") {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let name = device.name().unwrap_or("<unknown>");
                    debug!("Found input device: {} ({})", path.display(), name);

                    if name == SENSE_HAT_JOYSTICK_NAME {
                        info!("Opened Sense HAT joystick at {}", path.display());
                        return Ok(Self {
                            device,
                            device_path: path.display().to_string(),
                        });
                    }
                }
                Err(e) => {
                    debug!("Cannot open {}: {}", path.display(), e);
                }
            }
        }

        Err(SenseLoopError::Joystick(format!(
            "no input device named '{}' found",
            SENSE_HAT_JOYSTICK_NAME
        )))
    }

    /// Device path of the opened joystick.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// Map an evdev key to a stick direction.
fn direction_for_key(key: Key) -> Option<Direction> {
    match key {
        Key::KEY_LEFT => Some(Direction::Left),
        Key::KEY_RIGHT => Some(Direction::Right),
        Key::KEY_UP => Some(Direction::Up),
        Key::KEY_DOWN => Some(Direction::Down),
        Key::KEY_ENTER => Some(Direction::Center),
        _ => None,
    }
}

/// Map an evdev key value to an action. Releases (0) map to `None`.
fn action_for_value(value: i32) -> Option<Action> {
    match value {
        1 => Some(Action::Pressed),
        2 => Some(Action::Held),
        _ => None,
    }
}

impl JoystickSource for SenseHatJoystick {
    fn fetch_events(&mut self) -> Result<Vec<InputEvent>> {
        let events = match self.device.fetch_events() {
            Ok(events) => events,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(Vec::new()),
            Err(e) => {
                return Err(SenseLoopError::Joystick(format!(
                    "failed to fetch events: {}",
                    e
                )))
            }
        };

        let mut mapped = Vec::new();
        for event in events {
            let InputEventKind::Key(key) = event.kind() else {
                continue;
            };
            let (Some(direction), Some(action)) =
                (direction_for_key(key), action_for_value(event.value()))
            else {
                continue;
            };
            mapped.push(InputEvent { direction, action });
        }
        Ok(mapped)
    }
}
