//! Mock sensor returning fixed default readings.
//!
//! Used whenever the Sense HAT hardware is absent, so development machines
//! and CI exercise exactly the same pipeline as the device.

use super::{Orientation, SensorSource};

/// Default temperature returned without hardware, in degrees Celsius.
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Default relative humidity returned without hardware, in percent.
pub const DEFAULT_HUMIDITY: f64 = 45.0;
/// Default pressure returned without hardware, in hPa.
pub const DEFAULT_PRESSURE: f64 = 1013.25;

/// Sensor source with fixed readings and a level orientation.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSensor;

impl SensorSource for MockSensor {
    fn temperature_c(&mut self) -> f64 {
        DEFAULT_TEMPERATURE
    }

    fn humidity_percent(&mut self) -> f64 {
        DEFAULT_HUMIDITY
    }

    fn pressure_hpa(&mut self) -> f64 {
        DEFAULT_PRESSURE
    }

    fn orientation(&mut self) -> Orientation {
        Orientation::default()
    }
}
