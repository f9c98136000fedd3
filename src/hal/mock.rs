//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits, enabling
//! development and testing on desktop without a rig attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockActuator`] | [`Actuator`] | Tracks drive outputs and call counts |
//! | [`MockLift`] | [`LiftActuator`] | Tracks rack raise/lower calls |
//! | [`MockSensor`] | [`HomeSensor`] | Home switch set by the test |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::{Fingering, SliderConfig, RackConfig, SchedulerConfig, Slider, RackMotor};
//! use rs_fingering::hal::{MockActuator, MockLift};
//!
//! let slider = Slider::new(MockActuator::new(), SliderConfig::default());
//! let rack = RackMotor::new(MockLift::new(), RackConfig::default());
//! let mut rig: Fingering<_, _, _> = Fingering::new(slider, rack, SchedulerConfig::default());
//!
//! rig.calibrate(0).unwrap();
//! rig.move_finger(30, 0).unwrap();
//!
//! // Verify via the mocks
//! assert!(rig.slider().device().actuator().running);
//! assert_eq!(rig.rack().lift().raise_count, 1);
//! ```
//!
//! [`Actuator`]: crate::traits::Actuator
//! [`LiftActuator`]: crate::traits::LiftActuator
//! [`HomeSensor`]: crate::traits::HomeSensor
//! [`Clock`]: crate::traits::Clock

use crate::traits::{Actuator, Clock, Direction, HomeSensor, LiftActuator};

// ============================================================================
// Drive Mocks
// ============================================================================

/// Mock drive outputs for testing.
///
/// Records every output change. Use the public fields to inspect state
/// after test operations. Set [`fail`](Self::fail) to make every call
/// return an error.
///
/// # Example
///
/// ```rust
/// use rs_fingering::hal::MockActuator;
/// use rs_fingering::traits::{Actuator, Direction};
///
/// let mut drive = MockActuator::new();
/// drive.set_speed_hz(800).unwrap();
/// drive.start().unwrap();
/// drive.stop().unwrap();
///
/// assert_eq!(drive.speed_hz, 800);
/// assert!(!drive.running);
/// assert_eq!(drive.start_count, 1);
/// assert_eq!(drive.stop_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockActuator {
    /// Whether `configure` has been called.
    pub configured: bool,
    /// Whether the start output is asserted.
    pub running: bool,
    /// Current direction output.
    pub direction: Direction,
    /// Current speed output in Hz.
    pub speed_hz: u32,
    /// Number of times `start` was called.
    pub start_count: usize,
    /// Number of times `stop` was called.
    pub stop_count: usize,
    /// When set, every call fails.
    pub fail: bool,
}

impl MockActuator {
    /// Creates a new stopped mock drive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock drive whose calls all fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), ()> {
        if self.fail {
            Err(())
        } else {
            Ok(())
        }
    }
}

impl Actuator for MockActuator {
    type Error = ();

    fn configure(&mut self) -> Result<(), ()> {
        self.check()?;
        self.configured = true;
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), ()> {
        self.check()?;
        self.direction = direction;
        Ok(())
    }

    fn set_speed_hz(&mut self, hz: u32) -> Result<(), ()> {
        self.check()?;
        self.speed_hz = hz;
        Ok(())
    }

    fn start(&mut self) -> Result<(), ()> {
        self.check()?;
        self.running = true;
        self.start_count += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ()> {
        self.check()?;
        self.running = false;
        self.stop_count += 1;
        Ok(())
    }
}

/// Mock rack lift for testing.
///
/// ```rust
/// use rs_fingering::hal::MockLift;
/// use rs_fingering::traits::LiftActuator;
///
/// let mut lift = MockLift::new();
/// assert_eq!(lift.raised, None);
///
/// lift.raise().unwrap();
/// assert_eq!(lift.raised, Some(true));
/// assert_eq!(lift.raise_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockLift {
    /// Whether `configure` has been called.
    pub configured: bool,
    /// Last driven level, `None` before the first call.
    pub raised: Option<bool>,
    /// Number of times `raise` was called.
    pub raise_count: usize,
    /// Number of times `lower` was called.
    pub lower_count: usize,
    /// When set, every call fails.
    pub fail: bool,
}

impl MockLift {
    /// Creates a new undriven mock lift.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiftActuator for MockLift {
    type Error = ();

    fn configure(&mut self) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.configured = true;
        Ok(())
    }

    fn raise(&mut self) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.raised = Some(true);
        self.raise_count += 1;
        Ok(())
    }

    fn lower(&mut self) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.raised = Some(false);
        self.lower_count += 1;
        Ok(())
    }
}

// ============================================================================
// Input Mocks
// ============================================================================

/// Mock home switch.
///
/// ```rust
/// use rs_fingering::hal::MockSensor;
/// use rs_fingering::traits::HomeSensor;
///
/// let mut sensor = MockSensor::new();
/// assert!(!sensor.is_triggered());
///
/// sensor.trigger();
/// assert!(sensor.is_triggered());
///
/// sensor.release();
/// assert!(!sensor.is_triggered());
/// ```
#[derive(Debug, Default)]
pub struct MockSensor {
    /// Whether the switch reads as triggered.
    pub triggered: bool,
    /// Whether `configure` has been called.
    pub configured: bool,
}

impl MockSensor {
    /// Creates an untriggered mock switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the carriage reaching the switch.
    pub fn trigger(&mut self) {
        self.triggered = true;
    }

    /// Simulates the carriage leaving the switch.
    pub fn release(&mut self) {
        self.triggered = false;
    }
}

impl HomeSensor for MockSensor {
    fn configure(&mut self) {
        self.configured = true;
    }

    fn is_triggered(&mut self) -> bool {
        self.triggered
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Mock clock for testing time-dependent behavior.
///
/// Allows precise control over time for testing movements and homing
/// timeouts.
///
/// # Example
///
/// ```rust
/// use rs_fingering::hal::MockClock;
/// use rs_fingering::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_actuator_changes_nothing() {
        let mut drive = MockActuator::failing();
        assert!(drive.start().is_err());
        assert!(drive.set_speed_hz(100).is_err());
        assert!(!drive.running);
        assert_eq!(drive.speed_hz, 0);
        assert_eq!(drive.start_count, 0);
    }

    #[test]
    fn failing_lift_changes_nothing() {
        let mut lift = MockLift {
            fail: true,
            ..MockLift::default()
        };
        assert!(lift.lower().is_err());
        assert_eq!(lift.raised, None);
        assert_eq!(lift.lower_count, 0);
    }

    #[test]
    fn sensor_configure() {
        let mut sensor = MockSensor::new();
        sensor.configure();
        assert!(sensor.configured);
    }
}
