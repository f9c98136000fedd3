//! Calibration strategies for establishing a zero reference.
//!
//! A [`Slider`](crate::Slider) owns a [`Device`] and one strategy; the
//! strategy decides how the zero reference is found.
//!
//! # Built-in Strategies
//!
//! | Strategy | Behavior | Ticks |
//! |----------|----------|-------|
//! | [`InstantCalibration`] | Declares the current location as zero | 0 |
//! | [`SensorHoming`] | Drives towards the home sensor until it triggers | many |
//!
//! # States
//!
//! ```text
//!   Idle ──begin──▶ Seeking ──sensor──▶ Homed
//!                      │
//!                      └──timeout──▶ Failed
//! ```
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::traits::{Calibration, CalibrationState, SensorHoming};
//! use rs_fingering::{Device, MotionConfig, HomingConfig};
//! use rs_fingering::hal::{MockActuator, MockSensor};
//!
//! let mut device = Device::new(MockActuator::new(), MotionConfig::default());
//! let mut homing = SensorHoming::new(MockSensor::new(), HomingConfig::default());
//!
//! assert_eq!(homing.begin(&mut device, 0).unwrap(), CalibrationState::Seeking);
//!
//! homing.sensor_mut().trigger();
//! device.update(40).unwrap();
//! assert_eq!(homing.poll(&mut device, 40).unwrap(), CalibrationState::Homed);
//! assert!(device.is_calibrated());
//! ```

use core::fmt;

use crate::config::HomingConfig;
use crate::device::{Device, DeviceError};
use crate::traits::{Actuator, Direction, HomeSensor};

/// Why a calibration run ended without a zero reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CalibrationError {
    /// The seek timed out before the home sensor triggered.
    SensorNotTriggered,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::SensorNotTriggered => {
                f.write_str("home sensor did not trigger before timeout")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CalibrationError {}

/// Where a calibration strategy is in its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CalibrationState {
    /// Not started.
    #[default]
    Idle,
    /// Looking for the zero reference.
    Seeking,
    /// Zero reference established.
    Homed,
    /// The last run failed.
    Failed(CalibrationError),
}

/// A way of establishing a device's zero reference.
///
/// `begin` starts a run; `poll` is called every tick after the device
/// update while [`is_calibrating`](Self::is_calibrating) is true.
pub trait Calibration {
    /// One-time input configuration. Called from `setup()`.
    fn configure(&mut self) {}

    /// Start a calibration run.
    fn begin<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
        now_ms: u64,
    ) -> Result<CalibrationState, DeviceError<A::Error>>;

    /// Advance a running calibration.
    fn poll<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
        now_ms: u64,
    ) -> Result<CalibrationState, DeviceError<A::Error>>;

    /// Current state.
    fn state(&self) -> CalibrationState;

    /// Whether a run is in progress.
    fn is_calibrating(&self) -> bool {
        self.state() == CalibrationState::Seeking
    }
}

// ============================================================================
// Instant Calibration
// ============================================================================

/// Declares the current location as zero without moving.
///
/// Placeholder for rigs without a home sensor: any movement in flight is
/// stopped and the run completes inside [`begin`](Calibration::begin).
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantCalibration {
    state: CalibrationState,
}

impl InstantCalibration {
    /// Create an idle strategy.
    pub const fn new() -> Self {
        Self {
            state: CalibrationState::Idle,
        }
    }

    fn complete<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
    ) -> Result<CalibrationState, DeviceError<A::Error>> {
        device.stop_movement()?;
        device.set_zero();
        self.state = CalibrationState::Homed;
        log::info!("calibration complete");
        Ok(self.state)
    }
}

impl Calibration for InstantCalibration {
    fn begin<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
        _now_ms: u64,
    ) -> Result<CalibrationState, DeviceError<A::Error>> {
        log::info!("calibrating without sensor");
        self.state = CalibrationState::Seeking;
        self.complete(device)
    }

    fn poll<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
        _now_ms: u64,
    ) -> Result<CalibrationState, DeviceError<A::Error>> {
        if self.state == CalibrationState::Seeking && device.is_movement_complete() {
            return self.complete(device);
        }
        Ok(self.state)
    }

    fn state(&self) -> CalibrationState {
        self.state
    }
}

// ============================================================================
// Sensor Homing
// ============================================================================

/// Drives in reverse until the home sensor triggers.
///
/// The seek is an ordinary timed movement on the device, bounded by the
/// time a full-length move takes at the homing speed plus a margin. If
/// that movement ends before the sensor triggers the run fails with
/// [`CalibrationError::SensorNotTriggered`].
pub struct SensorHoming<S: HomeSensor> {
    sensor: S,
    config: HomingConfig,
    state: CalibrationState,
}

impl<S: HomeSensor> SensorHoming<S> {
    /// Create an idle strategy.
    pub fn new(sensor: S, config: HomingConfig) -> Self {
        Self {
            sensor,
            config,
            state: CalibrationState::Idle,
        }
    }

    /// Longest a seek may run for the given device.
    pub fn timeout_ms<A: Actuator>(&self, device: &Device<A>) -> u64 {
        let motion = device.motion();
        let speed = self.config.speed_hz.max(1) as u64;
        motion.full_travel_ms() * motion.fixed_move_speed_hz as u64 / speed
            + self.config.margin_ms as u64
    }

    /// The home sensor.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// The home sensor, mutably.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    fn home<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
    ) -> Result<CalibrationState, DeviceError<A::Error>> {
        device.stop_movement()?;
        device.set_zero();
        self.state = CalibrationState::Homed;
        log::info!("homing complete");
        Ok(self.state)
    }
}

impl<S: HomeSensor> Calibration for SensorHoming<S> {
    fn configure(&mut self) {
        self.sensor.configure();
    }

    fn begin<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
        now_ms: u64,
    ) -> Result<CalibrationState, DeviceError<A::Error>> {
        device.stop_movement()?;
        device.clear_zero();

        if self.sensor.is_triggered() {
            return self.home(device);
        }

        let timeout_ms = self.timeout_ms(device);
        device.set_direction(Direction::Reverse)?;
        device.set_speed_hz(self.config.speed_hz)?;
        device.start_movement(timeout_ms, now_ms)?;
        self.state = CalibrationState::Seeking;
        log::info!("homing: seeking sensor for up to {} ms", timeout_ms);
        Ok(self.state)
    }

    fn poll<A: Actuator>(
        &mut self,
        device: &mut Device<A>,
        _now_ms: u64,
    ) -> Result<CalibrationState, DeviceError<A::Error>> {
        if self.state != CalibrationState::Seeking {
            return Ok(self.state);
        }

        if self.sensor.is_triggered() {
            return self.home(device);
        }

        if device.is_movement_complete() {
            self.state = CalibrationState::Failed(CalibrationError::SensorNotTriggered);
            log::warn!("homing failed: {}", CalibrationError::SensorNotTriggered);
        }
        Ok(self.state)
    }

    fn state(&self) -> CalibrationState {
        self.state
    }
}
