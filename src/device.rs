//! Non-blocking timed-movement state machine.
//!
//! A [`Device`] drives an [`Actuator`] for a computed amount of time and
//! tracks where that leaves the carriage. Nothing here waits: starting a
//! movement returns immediately and the control loop calls
//! [`Device::update`] every tick until the duration has elapsed.
//!
//! # States
//!
//! ```text
//!            control / move_by               update (elapsed)
//!   Idle ─────────────────────────▶ Moving ─────────────────────▶ Idle
//! ```
//!
//! # Distance Law
//!
//! Distance moves run at the configured fixed speed for
//! `|travel_mm| * ms_per_mm` milliseconds. Timed moves issued through
//! [`Device::control`] at another speed are booked with the same law
//! scaled by `speed_hz / fixed_move_speed_hz`.
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::{Device, MotionConfig, hal::MockActuator};
//!
//! let mut device = Device::new(MockActuator::new(), MotionConfig::default());
//! device.setup().unwrap();
//!
//! device.move_by(25, 0).unwrap(); // 25 mm at 10 ms/mm
//! assert!(!device.is_movement_complete());
//!
//! device.update(249).unwrap();
//! assert!(!device.is_movement_complete());
//!
//! device.update(250).unwrap();
//! assert!(device.is_movement_complete());
//! assert_eq!(device.current_position(), 25);
//! ```

use core::fmt;

use crate::config::{BusyPolicy, MotionConfig, PinConfig, TravelPolicy};
use crate::traits::{Actuator, Direction};

/// Why a movement request was refused or failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceError<E> {
    /// A movement is already in flight and the busy policy rejects.
    Busy,
    /// The requested target lies outside `0..=max_mm`.
    OutOfRange {
        /// Requested relative travel.
        requested_mm: i32,
        /// Configured travel limit.
        max_mm: u32,
    },
    /// Distance moves need a zero reference first.
    NotCalibrated,
    /// Calibration is still running.
    Calibrating,
    /// The hardware collaborator reported an error.
    Hardware(E),
}

impl<E: fmt::Debug> fmt::Display for DeviceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Busy => f.write_str("movement already in progress"),
            DeviceError::OutOfRange {
                requested_mm,
                max_mm,
            } => write!(f, "move of {requested_mm} mm leaves 0..={max_mm} mm"),
            DeviceError::NotCalibrated => f.write_str("device is not calibrated"),
            DeviceError::Calibrating => f.write_str("calibration in progress"),
            DeviceError::Hardware(e) => write!(f, "hardware error: {e:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for DeviceError<E> {}

/// Result of an accepted movement request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The movement started as requested.
    Started {
        /// Signed travel that will be booked on completion.
        travel_mm: i32,
        /// How long the actuator will run.
        duration_ms: u64,
    },
    /// The target was outside the limits and the move was shortened.
    Clamped {
        /// Travel the caller asked for.
        requested_mm: i32,
        /// Travel that will actually be booked.
        travel_mm: i32,
        /// How long the actuator will run.
        duration_ms: u64,
    },
    /// Nothing to do: zero travel, the actuator was not started.
    AlreadyThere,
}

impl MoveOutcome {
    /// Duration of the started movement, if any.
    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            MoveOutcome::Started { duration_ms, .. } | MoveOutcome::Clamped { duration_ms, .. } => {
                Some(*duration_ms)
            }
            MoveOutcome::AlreadyThere => None,
        }
    }
}

/// Progress of an in-flight movement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementProgress {
    /// Milliseconds since the movement started.
    pub elapsed_ms: u64,
    /// Milliseconds until the movement is due to end.
    pub remaining_ms: u64,
    /// Fraction complete (0.0 to 1.0).
    pub fraction: f32,
    /// Direction of travel.
    pub direction: Direction,
}

/// Snapshot of a device for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceState {
    /// Tracked position in millimeters.
    pub position_mm: u32,
    /// Whether a movement is in flight.
    pub is_moving: bool,
    /// Whether a zero reference has been established.
    pub is_calibrated: bool,
    /// Progress of the current movement, if any.
    pub progress: Option<MovementProgress>,
}

/// Timed actuator with position bookkeeping.
///
/// # Type Parameter
///
/// - `A`: The drive outputs ([`Actuator`] trait)
pub struct Device<A: Actuator> {
    actuator: A,
    motion: MotionConfig,
    direction: Direction,
    is_moving: bool,
    is_calibrated: bool,
    current_position: u32,
    move_start_ms: u64,
    move_duration_ms: u64,
    pending_travel_mm: i32,
}

impl<A: Actuator> Device<A> {
    /// Create a new idle device at position 0, not calibrated.
    pub fn new(actuator: A, motion: MotionConfig) -> Self {
        Self {
            actuator,
            motion,
            direction: Direction::Forward,
            is_moving: false,
            is_calibrated: false,
            current_position: 0,
            move_start_ms: 0,
            move_duration_ms: 0,
            pending_travel_mm: 0,
        }
    }

    /// One-time hardware configuration. Leaves the drive stopped.
    pub fn setup(&mut self) -> Result<(), DeviceError<A::Error>> {
        self.actuator.configure().map_err(DeviceError::Hardware)?;
        self.actuator.stop().map_err(DeviceError::Hardware)?;
        let pins = self.motion.pins;
        log::info!(
            "device setup: start={} direction={} speed={}",
            pins.start,
            pins.direction,
            pins.speed
        );
        Ok(())
    }

    /// Run for an explicit duration in a given direction and speed.
    ///
    /// `duration_tenths` is in tenths of a second. The travel booked on
    /// completion follows the distance law scaled by speed and is clamped
    /// to the travel limits; timed moves are never rejected for range.
    pub fn control(
        &mut self,
        direction: Direction,
        speed_hz: u32,
        duration_tenths: u32,
        now_ms: u64,
    ) -> Result<MoveOutcome, DeviceError<A::Error>> {
        self.check_busy()?;
        self.interrupt(now_ms)?;

        let duration_ms = duration_tenths as u64 * 100;
        let estimate = self.travel_for(duration_ms, speed_hz);
        let target = self.clamp_target(self.current_position as i64 + direction.signum() * estimate);
        let travel_mm = (target - self.current_position as i64) as i32;

        self.direction = direction;
        self.actuator
            .set_speed_hz(speed_hz)
            .map_err(DeviceError::Hardware)?;
        self.dispatch(duration_ms, travel_mm, now_ms)?;

        Ok(MoveOutcome::Started {
            travel_mm,
            duration_ms,
        })
    }

    /// Move by a signed distance at the fixed speed.
    ///
    /// Targets outside `0..=max_distance` follow the configured
    /// [`TravelPolicy`].
    pub fn move_by(
        &mut self,
        position_mm: i32,
        now_ms: u64,
    ) -> Result<MoveOutcome, DeviceError<A::Error>> {
        if self.motion.require_calibration && !self.is_calibrated {
            return Err(DeviceError::NotCalibrated);
        }
        self.check_busy()?;

        // Range is judged from where an overridden move would stop
        let current = self.settled_position(now_ms);
        let target = current + position_mm as i64;
        let in_range = (0..=self.motion.max_distance_mm as i64).contains(&target);

        let travel_mm = match (in_range, self.motion.travel_policy) {
            (true, _) => position_mm,
            (false, TravelPolicy::Reject) => {
                log::warn!(
                    "rejecting move of {} mm from {} mm (limit {} mm)",
                    position_mm,
                    current,
                    self.motion.max_distance_mm
                );
                return Err(DeviceError::OutOfRange {
                    requested_mm: position_mm,
                    max_mm: self.motion.max_distance_mm,
                });
            }
            (false, TravelPolicy::Clamp) => (self.clamp_target(target) - current) as i32,
        };
        self.interrupt(now_ms)?;

        if travel_mm == 0 {
            return Ok(MoveOutcome::AlreadyThere);
        }

        let duration_ms = self.duration_for(travel_mm);
        self.direction = Direction::from_travel(travel_mm);
        self.actuator
            .set_speed_hz(self.motion.fixed_move_speed_hz)
            .map_err(DeviceError::Hardware)?;
        self.dispatch(duration_ms, travel_mm, now_ms)?;

        if travel_mm == position_mm {
            Ok(MoveOutcome::Started {
                travel_mm,
                duration_ms,
            })
        } else {
            Ok(MoveOutcome::Clamped {
                requested_mm: position_mm,
                travel_mm,
                duration_ms,
            })
        }
    }

    /// Start the timer and energize the drive in the current direction.
    ///
    /// Movements started here book no travel on completion. Used by
    /// calibration strategies that establish the position themselves.
    pub fn start_movement(
        &mut self,
        duration_ms: u64,
        now_ms: u64,
    ) -> Result<(), DeviceError<A::Error>> {
        self.dispatch(duration_ms, 0, now_ms)
    }

    fn dispatch(
        &mut self,
        duration_ms: u64,
        travel_mm: i32,
        now_ms: u64,
    ) -> Result<(), DeviceError<A::Error>> {
        self.actuator
            .set_direction(self.direction)
            .map_err(DeviceError::Hardware)?;
        self.actuator.start().map_err(DeviceError::Hardware)?;
        self.move_start_ms = now_ms;
        self.move_duration_ms = duration_ms;
        self.pending_travel_mm = travel_mm;
        self.is_moving = true;
        log::debug!(
            "movement started: {} for {} ms ({} mm)",
            self.direction.as_str(),
            duration_ms,
            travel_mm
        );
        Ok(())
    }

    /// Advance the state machine. Call once per control loop tick.
    ///
    /// Returns `true` on the tick where a movement finishes.
    pub fn update(&mut self, now_ms: u64) -> Result<bool, DeviceError<A::Error>> {
        if !self.is_moving || self.elapsed_ms(now_ms) < self.move_duration_ms {
            return Ok(false);
        }

        self.book_travel(self.pending_travel_mm);
        self.stop_movement()?;
        log::debug!("movement complete at {} mm", self.current_position);
        Ok(true)
    }

    /// Stop the drive and leave the Moving state without booking travel.
    pub fn stop_movement(&mut self) -> Result<(), DeviceError<A::Error>> {
        self.is_moving = false;
        self.pending_travel_mm = 0;
        self.actuator.stop().map_err(DeviceError::Hardware)
    }

    /// Stop an in-flight movement, booking the share of its travel that
    /// has elapsed so far.
    pub fn interrupt(&mut self, now_ms: u64) -> Result<(), DeviceError<A::Error>> {
        if !self.is_moving {
            return Ok(());
        }
        self.current_position = self.settled_position(now_ms) as u32;
        log::debug!("movement interrupted at {} mm", self.current_position);
        self.stop_movement()
    }

    /// True when no movement is in flight, before the first move and after
    /// each one finishes.
    #[inline]
    pub fn is_movement_complete(&self) -> bool {
        !self.is_moving
    }

    /// Energize the drive without touching the timer.
    pub fn start(&mut self) -> Result<(), DeviceError<A::Error>> {
        self.actuator.start().map_err(DeviceError::Hardware)
    }

    /// De-energize the drive without touching the timer.
    pub fn stop(&mut self) -> Result<(), DeviceError<A::Error>> {
        self.actuator.stop().map_err(DeviceError::Hardware)
    }

    /// Drive the direction output and remember it for the next start.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), DeviceError<A::Error>> {
        self.direction = direction;
        self.actuator
            .set_direction(direction)
            .map_err(DeviceError::Hardware)
    }

    /// Set the drive speed.
    pub fn set_speed_hz(&mut self, hz: u32) -> Result<(), DeviceError<A::Error>> {
        self.actuator.set_speed_hz(hz).map_err(DeviceError::Hardware)
    }

    /// Record the current location as the zero reference.
    pub fn set_zero(&mut self) {
        self.current_position = 0;
        self.is_calibrated = true;
    }

    /// Forget the zero reference. Position is untrusted until the next
    /// [`set_zero`](Self::set_zero).
    pub fn clear_zero(&mut self) {
        if self.is_calibrated {
            log::debug!("zero reference cleared at {} mm", self.current_position);
        }
        self.is_calibrated = false;
    }

    fn check_busy(&self) -> Result<(), DeviceError<A::Error>> {
        match (self.is_moving, self.motion.busy_policy) {
            (true, BusyPolicy::Reject) => Err(DeviceError::Busy),
            _ => Ok(()),
        }
    }

    /// Position an interrupt at `now_ms` would book, without stopping.
    fn settled_position(&self, now_ms: u64) -> i64 {
        let current = self.current_position as i64;
        if !self.is_moving {
            return current;
        }
        let partial = if self.move_duration_ms == 0 {
            self.pending_travel_mm as i64
        } else {
            let elapsed = self.elapsed_ms(now_ms).min(self.move_duration_ms) as i64;
            self.pending_travel_mm as i64 * elapsed / self.move_duration_ms as i64
        };
        self.clamp_target(current + partial)
    }

    fn book_travel(&mut self, travel_mm: i32) {
        let target = self.current_position as i64 + travel_mm as i64;
        self.current_position = self.clamp_target(target) as u32;
    }

    fn clamp_target(&self, target: i64) -> i64 {
        target.clamp(0, self.motion.max_distance_mm as i64)
    }

    fn duration_for(&self, travel_mm: i32) -> u64 {
        travel_mm.unsigned_abs() as u64 * self.motion.ms_per_mm as u64
    }

    fn travel_for(&self, duration_ms: u64, speed_hz: u32) -> i64 {
        let per_mm = self.motion.fixed_move_speed_hz as u64 * self.motion.ms_per_mm as u64;
        if per_mm == 0 {
            return 0;
        }
        // Booked travel never exceeds the full length, so cap there
        let limit = self.motion.max_distance_mm.min(i32::MAX as u32) as u128;
        let travel = duration_ms as u128 * speed_hz as u128 / per_mm as u128;
        travel.min(limit) as i64
    }

    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.move_start_ms)
    }

    /// Milliseconds until the current movement is due to end.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.is_moving
            .then(|| self.move_duration_ms.saturating_sub(self.elapsed_ms(now_ms)))
    }

    /// Progress of the current movement, if any.
    pub fn progress(&self, now_ms: u64) -> Option<MovementProgress> {
        if !self.is_moving {
            return None;
        }
        let elapsed_ms = self.elapsed_ms(now_ms).min(self.move_duration_ms);
        let fraction = if self.move_duration_ms == 0 {
            1.0
        } else {
            elapsed_ms as f32 / self.move_duration_ms as f32
        };
        Some(MovementProgress {
            elapsed_ms,
            remaining_ms: self.move_duration_ms - elapsed_ms,
            fraction,
            direction: self.direction,
        })
    }

    /// Snapshot for diagnostics.
    pub fn state(&self, now_ms: u64) -> DeviceState {
        DeviceState {
            position_mm: self.current_position,
            is_moving: self.is_moving,
            is_calibrated: self.is_calibrated,
            progress: self.progress(now_ms),
        }
    }

    /// Whether a movement is in flight.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Whether a zero reference has been established.
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    /// Tracked position in millimeters.
    #[inline]
    pub fn current_position(&self) -> u32 {
        self.current_position
    }

    /// Travel limit in millimeters.
    #[inline]
    pub fn max_distance(&self) -> u32 {
        self.motion.max_distance_mm
    }

    /// Speed used for distance moves.
    #[inline]
    pub fn fixed_move_speed(&self) -> u32 {
        self.motion.fixed_move_speed_hz
    }

    /// Milliseconds of travel per millimeter.
    #[inline]
    pub fn distance_to_duration_ratio(&self) -> u32 {
        self.motion.ms_per_mm
    }

    /// Timestamp of the latest movement start.
    #[inline]
    pub fn move_start_ms(&self) -> u64 {
        self.move_start_ms
    }

    /// Duration of the latest movement.
    #[inline]
    pub fn move_duration_ms(&self) -> u64 {
        self.move_duration_ms
    }

    /// Direction of the latest movement.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Drive channel identifiers.
    #[inline]
    pub fn pins(&self) -> PinConfig {
        self.motion.pins
    }

    /// Motion configuration.
    #[inline]
    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    /// The drive outputs.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// The drive outputs, mutably.
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}
