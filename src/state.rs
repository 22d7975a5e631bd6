//! # Display State Module
//!
//! Shared control state for the LED display, mutated by the joystick listener
//! and read by the sampling pipeline once per frame.
//!
//! ## Concurrency
//!
//! [`ControlState`] is the single shared-mutation boundary in the application.
//! It is wrapped in `Arc<Mutex<..>>` ([`SharedState`]); both tasks take the
//! lock only for short, non-awaiting critical sections. A frame may render
//! against a snapshot that is concurrently being replaced, but the mode
//! discriminant can never be observed torn or out of range.
//!
//! ## Mode transitions
//!
//! Changing the mode installs a [`Transition`]: for a fixed window the matrix
//! shows only the blue mode-number digit instead of the mode pattern, so no
//! pixel semantics from the previous mode bleed into the new one. The window
//! doubles as a software debounce: `advance` calls that arrive while a
//! transition is active are absorbed, not queued.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::input::InputEvent;

/// The four mutually exclusive LED visualization modes.
///
/// Ordinal and cyclic: [`DisplayMode::advance`] wraps around in both
/// directions (mod 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Static status indicator with a pulsing 2x2 center block
    Monitor,
    /// Attitude bubble driven by pitch/roll
    SpiritLevel,
    /// Animated full-matrix rainbow
    RainbowWave,
    /// Random flame flicker
    Fire,
}

/// Number of display modes (the cyclic modulus).
pub const MODE_COUNT: i32 = 4;

impl DisplayMode {
    /// Numeric mode id (0-3), as published in samples and log rows.
    pub fn id(self) -> u8 {
        match self {
            DisplayMode::Monitor => 0,
            DisplayMode::SpiritLevel => 1,
            DisplayMode::RainbowWave => 2,
            DisplayMode::Fire => 3,
        }
    }

    /// Human-readable mode name, as published in samples and log rows.
    pub fn name(self) -> &'static str {
        match self {
            DisplayMode::Monitor => "Monitor Mode",
            DisplayMode::SpiritLevel => "Spirit Level",
            DisplayMode::RainbowWave => "Rainbow Wave",
            DisplayMode::Fire => "Fire Effect",
        }
    }

    /// Mode for a numeric id, wrapping modulo [`MODE_COUNT`].
    pub fn from_id(id: i32) -> Self {
        match id.rem_euclid(MODE_COUNT) {
            0 => DisplayMode::Monitor,
            1 => DisplayMode::SpiritLevel,
            2 => DisplayMode::RainbowWave,
            _ => DisplayMode::Fire,
        }
    }

    /// Cyclic step by `step` positions (negative steps go backwards).
    ///
    /// # Examples
    ///
    /// ```
    /// use sense_loop::state::DisplayMode;
    ///
    /// assert_eq!(DisplayMode::Monitor.advance(-1), DisplayMode::Fire);
    /// assert_eq!(DisplayMode::Fire.advance(1), DisplayMode::Monitor);
    /// ```
    pub fn advance(self, step: i32) -> Self {
        Self::from_id(self.id() as i32 + step)
    }
}

/// Active mode-transition window.
///
/// While `until` lies in the future the renderer draws the digit indicator
/// instead of the mode pattern, and further `advance` calls are absorbed.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    /// Mode id to show as the on-screen digit
    pub digit: u8,
    /// Deadline after which normal rendering resumes
    pub until: Instant,
}

/// Consistent view of the control state taken once per frame.
#[derive(Debug, Clone, Copy)]
pub struct StateSnapshot {
    pub mode: DisplayMode,
    pub power_on: bool,
    pub low_light: bool,
    pub last_event: Option<InputEvent>,
    /// Digit to render instead of the mode pattern, when a transition is active
    pub transition_digit: Option<u8>,
}

/// Shared display state: mode, power and brightness flags, plus the most
/// recent joystick event for outward publication.
#[derive(Debug)]
pub struct ControlState {
    mode: DisplayMode,
    power_on: bool,
    low_light: bool,
    last_event: Option<InputEvent>,
    transition: Option<Transition>,
    transition_duration: Duration,
}

impl ControlState {
    /// Create the initial state: Monitor mode, powered on, normal brightness.
    ///
    /// # Arguments
    ///
    /// * `transition_duration` - Length of the blanking/debounce window after
    ///   a mode change (500 ms in the default configuration)
    pub fn new(transition_duration: Duration) -> Self {
        Self {
            mode: DisplayMode::Monitor,
            power_on: true,
            low_light: false,
            last_event: None,
            transition: None,
            transition_duration,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Whether the display is powered on.
    pub fn power_on(&self) -> bool {
        self.power_on
    }

    /// Whether low-light dimming is requested.
    pub fn low_light(&self) -> bool {
        self.low_light
    }

    /// Step the mode cyclically and install the transition window.
    ///
    /// Returns the new mode, or `None` when the call arrived inside an active
    /// transition window and was absorbed (debounce). Exactly one transition
    /// is installed per effective mode change.
    pub fn advance(&mut self, step: i32, now: Instant) -> Option<DisplayMode> {
        if let Some(transition) = self.transition {
            if now < transition.until {
                return None;
            }
        }

        self.mode = self.mode.advance(step);
        self.transition = Some(Transition {
            digit: self.mode.id(),
            until: now + self.transition_duration,
        });
        Some(self.mode)
    }

    /// Flip display power. Returns the new power flag.
    pub fn toggle_power(&mut self) -> bool {
        self.power_on = !self.power_on;
        self.power_on
    }

    /// Set the low-light dimming flag.
    pub fn set_low_light(&mut self, low: bool) {
        self.low_light = low;
    }

    /// Remember the most recent joystick event for outward publication.
    pub fn set_last_event(&mut self, event: InputEvent) {
        self.last_event = Some(event);
    }

    /// Take a frame snapshot, lazily clearing an expired transition.
    pub fn snapshot(&mut self, now: Instant) -> StateSnapshot {
        let transition_digit = match self.transition {
            Some(transition) if now < transition.until => Some(transition.digit),
            Some(_) => {
                self.transition = None;
                None
            }
            None => None,
        };

        StateSnapshot {
            mode: self.mode,
            power_on: self.power_on,
            low_light: self.low_light,
            last_event: self.last_event,
            transition_digit,
        }
    }
}

/// Shared handle to the control state.
pub type SharedState = Arc<Mutex<ControlState>>;

/// Create a fresh shared state handle.
pub fn shared_state(transition_duration: Duration) -> SharedState {
    Arc::new(Mutex::new(ControlState::new(transition_duration)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ControlState {
        ControlState::new(Duration::from_millis(500))
    }

    #[test]
    fn test_mode_ids_are_stable() {
        assert_eq!(DisplayMode::Monitor.id(), 0);
        assert_eq!(DisplayMode::SpiritLevel.id(), 1);
        assert_eq!(DisplayMode::RainbowWave.id(), 2);
        assert_eq!(DisplayMode::Fire.id(), 3);
    }

    #[test]
    fn test_advance_forward_then_back_is_identity() {
        for id in 0..MODE_COUNT {
            let mode = DisplayMode::from_id(id);
            assert_eq!(mode.advance(1).advance(-1), mode);
        }
    }

    #[test]
    fn test_advance_wraps_in_both_directions() {
        assert_eq!(DisplayMode::Fire.advance(1), DisplayMode::Monitor);
        assert_eq!(DisplayMode::Monitor.advance(-1), DisplayMode::Fire);
        assert_eq!(DisplayMode::Monitor.advance(4), DisplayMode::Monitor);
        assert_eq!(DisplayMode::Monitor.advance(-5), DisplayMode::Fire);
    }

    #[test]
    fn test_advance_installs_transition() {
        let mut state = state();
        let now = Instant::now();

        let mode = state.advance(1, now);
        assert_eq!(mode, Some(DisplayMode::SpiritLevel));

        let snapshot = state.snapshot(now);
        assert_eq!(snapshot.transition_digit, Some(1));
    }

    #[test]
    fn test_advance_inside_window_is_absorbed() {
        let mut state = state();
        let now = Instant::now();

        assert!(state.advance(1, now).is_some());
        // Second press 100ms later, still inside the 500ms window
        let absorbed = state.advance(1, now + Duration::from_millis(100));
        assert!(absorbed.is_none());
        assert_eq!(state.mode(), DisplayMode::SpiritLevel);
    }

    #[test]
    fn test_advance_after_window_is_applied() {
        let mut state = state();
        let now = Instant::now();

        assert!(state.advance(1, now).is_some());
        let later = now + Duration::from_millis(501);
        assert_eq!(state.advance(1, later), Some(DisplayMode::RainbowWave));
    }

    #[test]
    fn test_snapshot_clears_expired_transition() {
        let mut state = state();
        let now = Instant::now();
        state.advance(1, now);

        let during = state.snapshot(now + Duration::from_millis(499));
        assert_eq!(during.transition_digit, Some(1));

        let after = state.snapshot(now + Duration::from_millis(500));
        assert_eq!(after.transition_digit, None);

        // Cleared for good, not just hidden
        let again = state.snapshot(now);
        assert_eq!(again.transition_digit, None);
    }

    #[test]
    fn test_toggle_power() {
        let mut state = state();
        assert!(state.power_on());
        assert!(!state.toggle_power());
        assert!(state.toggle_power());
    }

    #[test]
    fn test_set_low_light() {
        let mut state = state();
        assert!(!state.low_light());
        state.set_low_light(true);
        assert!(state.low_light());
        state.set_low_light(false);
        assert!(!state.low_light());
    }
}
