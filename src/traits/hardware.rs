//! Hardware abstraction traits for the slider drive, rack lift, and home sensor.
//!
//! This module defines the hardware interfaces the control core talks to.
//! Nothing here touches registers; concrete implementations live in
//! [`crate::hal`].
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Actuator`] | Start/stop/direction/speed outputs of a timed drive |
//! | [`LiftActuator`] | Two-position (up/down) rack output |
//! | [`HomeSensor`] | Reference switch used for homing |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::traits::{Actuator, Direction};
//! use rs_fingering::hal::MockActuator;
//!
//! let mut drive = MockActuator::new();
//! drive.set_direction(Direction::Reverse).unwrap();
//! drive.set_speed_hz(800).unwrap();
//! drive.start().unwrap();
//!
//! assert!(drive.running);
//! assert_eq!(drive.direction, Direction::Reverse);
//! ```

/// Direction of actuator travel.
///
/// For the slider, [`Forward`](Self::Forward) moves away from the home
/// sensor (increasing position) and [`Reverse`](Self::Reverse) moves
/// towards it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Away from home, position increases.
    #[default]
    Forward,
    /// Towards home, position decreases.
    Reverse,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_fingering::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }

    /// Direction implied by the sign of a signed travel distance.
    ///
    /// Zero maps to [`Forward`](Self::Forward).
    #[inline]
    pub const fn from_travel(travel_mm: i32) -> Self {
        if travel_mm < 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Returns `1` for forward and `-1` for reverse.
    #[inline]
    pub const fn signum(&self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Parse direction from text input.
    ///
    /// Accepts `"forward"`/`"fwd"`/`"1"` and `"reverse"`/`"rev"`/`"-1"`.
    /// Input is trimmed and case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_fingering::Direction;
    ///
    /// assert_eq!(Direction::from_text("fwd"), Some(Direction::Forward));
    /// assert_eq!(Direction::from_text(" -1 "), Some(Direction::Reverse));
    /// assert_eq!(Direction::from_text("sideways"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("forward") || s.eq_ignore_ascii_case("fwd") || s == "1" {
            Some(Direction::Forward)
        } else if s.eq_ignore_ascii_case("reverse") || s.eq_ignore_ascii_case("rev") || s == "-1"
        {
            Some(Direction::Reverse)
        } else {
            None
        }
    }
}

/// Timed drive outputs: the start, direction, and speed channels of a
/// linear actuator.
///
/// Every call must return immediately. Implementations should make
/// repeated calls with the same argument harmless.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_fingering::traits::{Actuator, Direction};
///
/// struct StepperDriver { /* pin handles */ }
///
/// impl Actuator for StepperDriver {
///     type Error = ();
///
///     fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
///         // DIR pin high for forward...
///         Ok(())
///     }
///
///     fn set_speed_hz(&mut self, hz: u32) -> Result<(), ()> {
///         // Reprogram the step generator...
///         Ok(())
///     }
///
///     fn start(&mut self) -> Result<(), ()> { Ok(()) }
///     fn stop(&mut self) -> Result<(), ()> { Ok(()) }
/// }
/// ```
pub trait Actuator {
    /// Error type for output operations.
    type Error;

    /// One-time pin configuration. Called from `setup()`.
    fn configure(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Drive the direction output.
    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error>;

    /// Set the drive speed.
    fn set_speed_hz(&mut self, hz: u32) -> Result<(), Self::Error>;

    /// Energize the drive.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// De-energize the drive.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Two-position output used by the rack motor.
pub trait LiftActuator {
    /// Error type for output operations.
    type Error;

    /// One-time pin configuration. Called from `setup()`.
    fn configure(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Move to the raised position.
    fn raise(&mut self) -> Result<(), Self::Error>;

    /// Move to the lowered position.
    fn lower(&mut self) -> Result<(), Self::Error>;
}

/// Reference switch that marks the slider's zero position.
pub trait HomeSensor {
    /// One-time pin configuration.
    fn configure(&mut self) {}

    /// Returns true while the carriage sits on the switch.
    fn is_triggered(&mut self) -> bool;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for movement timing.
///
/// # Example
///
/// ```rust
/// use rs_fingering::traits::Clock;
/// use rs_fingering::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
