//! # Sensor Module
//!
//! Access to the environmental and inertial sensors behind a single trait
//! seam, so the pipeline runs identically against real hardware or the mock
//! fallback.
//!
//! The [`SensorSource`] interface is deliberately infallible: absence of
//! hardware is absorbed at construction time by substituting [`MockSensor`],
//! so a read can never fail mid-loop. There is no safe degraded telemetry
//! value, which is why any unexpected failure below this seam is treated as
//! fatal rather than recovered.
//!
//! ## Orientation convention
//!
//! The IMU reports pitch/roll/yaw in `[0, 360)`. Pitch and roll are
//! normalized into `[-180, 180]` (values above 180 get 360 subtracted) before
//! they reach the renderer or the outward sample; yaw keeps the raw domain.

pub mod mock;

pub use mock::MockSensor;

/// Raw orientation reading in degrees, each axis in `[0, 360)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// The full set of readings for one sampling tick.
///
/// `altitude` is derived from pressure by the pipeline and omitted
/// (left `None`) for frames where the pressure reading is non-positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Barometric pressure in hPa
    pub pressure: f64,
    /// Barometric altitude in meters, when derivable
    pub altitude: Option<f64>,
    /// Pitch in degrees, normalized to `[-180, 180]`
    pub pitch: f64,
    /// Roll in degrees, normalized to `[-180, 180]`
    pub roll: f64,
    /// Yaw in degrees, raw `[0, 360)` domain
    pub yaw: f64,
}

/// Trait for instantaneous telemetry reads.
///
/// Implementations must be cheap enough to call once per frame. Reads carry
/// no timeout: a hang here stalls the whole pipeline, a deliberate limitation
/// until a watchdog is layered on top.
pub trait SensorSource: Send {
    /// Temperature in degrees Celsius
    fn temperature_c(&mut self) -> f64;

    /// Relative humidity in percent
    fn humidity_percent(&mut self) -> f64;

    /// Barometric pressure in hPa
    fn pressure_hpa(&mut self) -> f64;

    /// Orientation with each axis in `[0, 360)`
    fn orientation(&mut self) -> Orientation;
}

/// Normalize an angle from `[0, 360)` into `[-180, 180]`.
pub fn normalize_angle(degrees: f64) -> f64 {
    if degrees > 180.0 {
        degrees - 360.0
    } else {
        degrees
    }
}

/// Read one telemetry frame from a source, normalizing pitch and roll.
///
/// Altitude is left unset; the pipeline derives it from pressure so that a
/// bad reading can be rejected without touching this seam.
pub fn read_telemetry(source: &mut dyn SensorSource) -> Telemetry {
    let orientation = source.orientation();

    Telemetry {
        temperature: source.temperature_c(),
        humidity: source.humidity_percent(),
        pressure: source.pressure_hpa(),
        altitude: None,
        pitch: normalize_angle(orientation.pitch),
        roll: normalize_angle(orientation.roll),
        yaw: orientation.yaw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_below_threshold_unchanged() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(90.0), 90.0);
        assert_eq!(normalize_angle(180.0), 180.0);
    }

    #[test]
    fn test_normalize_angle_above_threshold_wraps() {
        assert_eq!(normalize_angle(181.0), -179.0);
        assert_eq!(normalize_angle(270.0), -90.0);
        assert_eq!(normalize_angle(359.0), -1.0);
    }

    #[test]
    fn test_read_telemetry_from_mock_defaults() {
        let mut sensor = MockSensor::default();
        let telemetry = read_telemetry(&mut sensor);

        assert_eq!(telemetry.temperature, 25.0);
        assert_eq!(telemetry.humidity, 45.0);
        assert_eq!(telemetry.pressure, 1013.25);
        assert_eq!(telemetry.altitude, None);
        assert_eq!(telemetry.pitch, 0.0);
        assert_eq!(telemetry.roll, 0.0);
        assert_eq!(telemetry.yaw, 0.0);
    }

    #[test]
    fn test_read_telemetry_normalizes_pitch_and_roll_but_not_yaw() {
        struct Tilted;

        impl SensorSource for Tilted {
            fn temperature_c(&mut self) -> f64 {
                20.0
            }
            fn humidity_percent(&mut self) -> f64 {
                50.0
            }
            fn pressure_hpa(&mut self) -> f64 {
                1000.0
            }
            fn orientation(&mut self) -> Orientation {
                Orientation {
                    pitch: 350.0,
                    roll: 190.0,
                    yaw: 270.0,
                }
            }
        }

        let telemetry = read_telemetry(&mut Tilted);
        assert_eq!(telemetry.pitch, -10.0);
        assert_eq!(telemetry.roll, -170.0);
        assert_eq!(telemetry.yaw, 270.0);
    }
}
