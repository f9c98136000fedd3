//! Rack motor: an on/off lift with up and down positions.

use crate::config::RackConfig;
use crate::traits::LiftActuator;

/// Last commanded rack position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RackPosition {
    /// Not commanded since power-up.
    #[default]
    Unknown,
    /// Raised, clear of the slider's path.
    Up,
    /// Lowered onto the work.
    Down,
}

/// Rack motor driving a [`LiftActuator`].
///
/// Repeating the current command does not re-drive the output.
///
/// # Example
///
/// ```rust
/// use rs_fingering::{RackMotor, RackConfig, RackPosition, hal::MockLift};
///
/// let mut rack = RackMotor::new(MockLift::new(), RackConfig::default());
/// assert!(rack.up().unwrap());
/// assert!(!rack.up().unwrap()); // already up
/// assert_eq!(rack.position(), RackPosition::Up);
/// assert_eq!(rack.lift().raise_count, 1);
/// ```
pub struct RackMotor<L: LiftActuator> {
    lift: L,
    pin: u8,
    position: RackPosition,
}

impl<L: LiftActuator> RackMotor<L> {
    /// Create a rack motor in the unknown position.
    pub fn new(lift: L, config: RackConfig) -> Self {
        Self {
            lift,
            pin: config.pin,
            position: RackPosition::Unknown,
        }
    }

    /// One-time output configuration.
    pub fn setup(&mut self) -> Result<(), L::Error> {
        self.lift.configure()?;
        log::info!("rack setup: pin={}", self.pin);
        Ok(())
    }

    /// Raise the rack. Returns `true` if the output was driven.
    pub fn up(&mut self) -> Result<bool, L::Error> {
        if self.position == RackPosition::Up {
            return Ok(false);
        }
        self.lift.raise()?;
        self.position = RackPosition::Up;
        log::debug!("rack up");
        Ok(true)
    }

    /// Lower the rack. Returns `true` if the output was driven.
    pub fn down(&mut self) -> Result<bool, L::Error> {
        if self.position == RackPosition::Down {
            return Ok(false);
        }
        self.lift.lower()?;
        self.position = RackPosition::Down;
        log::debug!("rack down");
        Ok(true)
    }

    /// Last commanded position.
    #[inline]
    pub fn position(&self) -> RackPosition {
        self.position
    }

    /// Whether the rack is raised.
    #[inline]
    pub fn is_up(&self) -> bool {
        self.position == RackPosition::Up
    }

    /// Lift output identifier.
    #[inline]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// The lift output.
    pub fn lift(&self) -> &L {
        &self.lift
    }

    /// The lift output, mutably.
    pub fn lift_mut(&mut self) -> &mut L {
        &mut self.lift
    }
}
