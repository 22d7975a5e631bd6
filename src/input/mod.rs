//! # Input Module
//!
//! Joystick input handling for the Sense HAT's five-way stick.
//!
//! This module handles:
//! - The [`JoystickSource`] trait abstracting the input device
//! - The evdev implementation in [`joystick`](crate::input::joystick)
//! - The [`InputListener`] task that polls the device and mutates the shared
//!   [`ControlState`](crate::state::ControlState)
//!
//! ## Direction mapping
//!
//! | Direction | Effect |
//! |-----------|--------|
//! | Left | previous mode + mode-number indicator |
//! | Right | next mode + mode-number indicator |
//! | Up | low-light off |
//! | Down | low-light on |
//! | Center | toggle display power |
//!
//! The listener only mutates state and records the event; the transition
//! delay that follows a mode change is consumed inside the pipeline, so input
//! polling latency never stalls on it.

pub mod joystick;

pub use joystick::SenseHatJoystick;

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::state::SharedState;

/// Five-way stick direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Center,
}

impl Direction {
    /// Wire name used in samples and log rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Center => "center",
        }
    }
}

/// Kind of stick actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pressed,
    Held,
}

impl Action {
    /// Wire name used in samples and log rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Pressed => "pressed",
            Action::Held => "held",
        }
    }
}

/// One joystick event as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub direction: Direction,
    pub action: Action,
}

/// Trait for queued joystick event reads.
///
/// `fetch_events` drains whatever the device has queued since the previous
/// call and returns immediately when nothing is pending.
pub trait JoystickSource: Send {
    fn fetch_events(&mut self) -> Result<Vec<InputEvent>>;
}

/// Joystick source that never produces events, used without hardware.
#[derive(Debug, Default)]
pub struct NullJoystick;

impl JoystickSource for NullJoystick {
    fn fetch_events(&mut self) -> Result<Vec<InputEvent>> {
        Ok(Vec::new())
    }
}

/// Polling task turning raw joystick events into control-state mutations.
pub struct InputListener {
    joystick: Box<dyn JoystickSource>,
    state: SharedState,
    poll_interval: Duration,
}

impl InputListener {
    /// Create a listener over a joystick source.
    ///
    /// # Arguments
    ///
    /// * `joystick` - Event source (evdev device or a test double)
    /// * `state` - Shared control state mutated on every event
    /// * `poll_interval` - Device poll period (~100 ms balances input latency
    ///   against device load)
    pub fn new(
        joystick: Box<dyn JoystickSource>,
        state: SharedState,
        poll_interval: Duration,
    ) -> Self {
        Self {
            joystick,
            state,
            poll_interval,
        }
    }

    /// Run the polling loop until the shutdown flag flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut poll = tokio::time::interval(self.poll_interval);
        info!("Joystick listener started (poll period {:?})", self.poll_interval);

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    match self.joystick.fetch_events() {
                        Ok(events) => {
                            for event in events {
                                apply_event(&self.state, event);
                            }
                        }
                        Err(e) => warn!("Joystick read failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Joystick listener stopped");
    }
}

/// Apply one joystick event to the shared state.
///
/// Runs synchronously in the listener task; the critical section is short and
/// never awaits. Mode changes hitting an active transition window are
/// absorbed by [`ControlState::advance`](crate::state::ControlState::advance).
pub fn apply_event(state: &SharedState, event: InputEvent) {
    let now = Instant::now();
    let mut state = state.lock().expect("control state mutex poisoned");
    state.set_last_event(event);

    match event.direction {
        Direction::Left | Direction::Right => {
            let step = if event.direction == Direction::Left { -1 } else { 1 };
            match state.advance(step, now) {
                Some(mode) => info!("Mode changed to {} ({})", mode.id(), mode.name()),
                None => debug!("Mode change absorbed by transition window"),
            }
        }
        Direction::Up => state.set_low_light(false),
        Direction::Down => state.set_low_light(true),
        Direction::Center => {
            let on = state.toggle_power();
            info!("Display toggled: {}", if on { "ON" } else { "OFF" });
        }
    }
}
