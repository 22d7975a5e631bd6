//! # Telemetry Module
//!
//! The outward sample payload assembled once per tick, the barometric
//! altitude derivation, and the publisher seam towards the socket transport.
//!
//! The transport itself is an external collaborator: the shipped
//! [`ChannelPublisher`] forwards samples into a tokio mpsc channel whose
//! receiving end stands in for it. Samples are dropped, not queued, when the
//! consumer falls behind; a real-time feed has no use for stale frames.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, SenseLoopError};
use crate::sensor::Telemetry;
use crate::state::StateSnapshot;

/// Standard sea-level atmospheric pressure in hPa.
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Inbound control surface from the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flip the CSV recording session on or off
    ToggleRecording,
}

/// Convert atmospheric pressure to altitude via the barometric approximation
/// `44330 * (1 - (P/P0)^(1/5.255))`.
///
/// # Arguments
///
/// * `pressure` - Current pressure in hPa
/// * `sea_level_pressure` - Reference sea-level pressure (P0) in hPa
///
/// # Errors
///
/// Returns [`SenseLoopError::InvalidPressure`] for non-positive pressure;
/// the caller omits altitude for that frame and keeps the loop running.
///
/// # Examples
///
/// ```
/// use sense_loop::telemetry::{pressure_to_altitude, SEA_LEVEL_PRESSURE_HPA};
///
/// let altitude = pressure_to_altitude(SEA_LEVEL_PRESSURE_HPA, SEA_LEVEL_PRESSURE_HPA)?;
/// assert_eq!(altitude, 0.0);
/// # Ok::<(), sense_loop::error::SenseLoopError>(())
/// ```
pub fn pressure_to_altitude(pressure: f64, sea_level_pressure: f64) -> Result<f64> {
    if pressure <= 0.0 {
        return Err(SenseLoopError::InvalidPressure(pressure));
    }
    Ok(44330.0 * (1.0 - (pressure / sea_level_pressure).powf(1.0 / 5.255)))
}

/// Round to one decimal place, the resolution of every published number.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Environmental block of the published sample.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnvReadings {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    /// Omitted from the payload for frames with a rejected pressure reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// Inertial block of the published sample.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImuReadings {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// System status block of the published sample.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SysStatus {
    pub mode_id: u8,
    pub mode_name: &'static str,
    pub is_on: bool,
    pub is_recording: bool,
}

/// Joystick block of the published sample. Empty strings until the first
/// stick event arrives.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JoystickStatus {
    pub direction: &'static str,
    pub action: &'static str,
}

/// One outward sample, published per tick and appended to the CSV log while
/// a recording session is active. All numeric fields carry one decimal.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Sample {
    pub env: EnvReadings,
    pub imu: ImuReadings,
    pub sys: SysStatus,
    pub joystick: JoystickStatus,
}

impl Sample {
    /// Assemble a sample from the frame's telemetry and state snapshot.
    pub fn new(telemetry: &Telemetry, snapshot: &StateSnapshot, is_recording: bool) -> Self {
        let (direction, action) = match snapshot.last_event {
            Some(event) => (event.direction.as_str(), event.action.as_str()),
            None => ("", ""),
        };

        Self {
            env: EnvReadings {
                temp: round1(telemetry.temperature),
                humidity: round1(telemetry.humidity),
                pressure: round1(telemetry.pressure),
                altitude: telemetry.altitude.map(round1),
            },
            imu: ImuReadings {
                pitch: round1(telemetry.pitch),
                roll: round1(telemetry.roll),
                yaw: round1(telemetry.yaw),
            },
            sys: SysStatus {
                mode_id: snapshot.mode.id(),
                mode_name: snapshot.mode.name(),
                is_on: snapshot.power_on,
                is_recording,
            },
            joystick: JoystickStatus { direction, action },
        }
    }
}

/// Trait for handing samples to the outward transport.
pub trait SamplePublisher: Send {
    /// Publish one sample. Must not block the pipeline.
    fn publish(&mut self, sample: &Sample);
}

/// Publisher forwarding samples into a bounded mpsc channel.
pub struct ChannelPublisher {
    tx: mpsc::Sender<Sample>,
}

impl ChannelPublisher {
    pub fn new(tx: mpsc::Sender<Sample>) -> Self {
        Self { tx }
    }
}

impl SamplePublisher for ChannelPublisher {
    fn publish(&mut self, sample: &Sample) {
        if let Err(e) = self.tx.try_send(sample.clone()) {
            debug!("Sample dropped: {}", e);
        }
    }
}
