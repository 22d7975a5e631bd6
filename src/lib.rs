//! # Sense Loop Library
//!
//! Real-time acquisition-and-control loop for a Sense HAT class device.
//!
//! This library reads environmental and inertial telemetry at a fixed
//! cadence, renders one of four visualization modes onto the 8x8 LED matrix,
//! reacts to joystick input, publishes samples towards a transport
//! collaborator and optionally records them to CSV session files.

pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod recorder;
pub mod sensor;
pub mod state;
pub mod telemetry;
