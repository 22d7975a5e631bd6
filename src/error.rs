//! # Error Types
//!
//! Custom error types for Sense Loop using `thiserror`.

use thiserror::Error;

/// Main error type for Sense Loop
#[derive(Debug, Error)]
pub enum SenseLoopError {
    /// Altitude cannot be derived from a non-positive pressure reading
    #[error("invalid pressure reading: {0} hPa (must be positive)")]
    InvalidPressure(f64),

    /// Joystick device errors
    #[error("joystick error: {0}")]
    Joystick(String),

    /// LED matrix device errors
    #[error("led matrix error: {0}")]
    LedMatrix(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Sense Loop
pub type Result<T> = std::result::Result<T, SenseLoopError>;
