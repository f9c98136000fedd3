//! Linear slider: a timed [`Device`] plus a calibration strategy.
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::{Slider, SliderConfig, hal::MockActuator};
//!
//! let mut slider = Slider::new(MockActuator::new(), SliderConfig::default());
//! slider.setup().unwrap();
//!
//! // Placeholder calibration completes immediately
//! slider.calibrate(0).unwrap();
//! assert!(slider.is_calibrated());
//! assert!(!slider.is_calibrating());
//! assert_eq!(slider.current_position(), 0);
//!
//! slider.move_by(12, 0).unwrap();
//! slider.update(120).unwrap();
//! assert_eq!(slider.current_position(), 12);
//! ```

use crate::config::SliderConfig;
use crate::device::{Device, DeviceError, DeviceState, MoveOutcome};
use crate::traits::{
    Actuator, Calibration, CalibrationState, Direction, HomeSensor, InstantCalibration,
    SensorHoming,
};

/// Slider with a home sensor input.
///
/// # Type Parameters
///
/// - `A`: The drive outputs ([`Actuator`] trait)
/// - `C`: How the zero reference is found ([`Calibration`] trait)
pub struct Slider<A: Actuator, C: Calibration = InstantCalibration> {
    device: Device<A>,
    calibration: C,
    sensor_pin: u8,
}

impl<A: Actuator> Slider<A, InstantCalibration> {
    /// Create a slider with placeholder calibration.
    pub fn new(actuator: A, config: SliderConfig) -> Self {
        Self::with_calibration(actuator, config, InstantCalibration::new())
    }
}

impl<A: Actuator, S: HomeSensor> Slider<A, SensorHoming<S>> {
    /// Create a slider that homes against `sensor`.
    pub fn with_sensor(actuator: A, sensor: S, config: SliderConfig) -> Self {
        let homing = SensorHoming::new(sensor, config.homing);
        Self::with_calibration(actuator, config, homing)
    }
}

impl<A: Actuator, C: Calibration> Slider<A, C> {
    /// Create a slider with any calibration strategy.
    pub fn with_calibration(actuator: A, config: SliderConfig, calibration: C) -> Self {
        Self {
            device: Device::new(actuator, config.motion),
            calibration,
            sensor_pin: config.sensor_pin,
        }
    }

    /// One-time hardware configuration for drive and sensor.
    pub fn setup(&mut self) -> Result<(), DeviceError<A::Error>> {
        self.device.setup()?;
        self.calibration.configure();
        log::info!("slider setup: sensor={}", self.sensor_pin);
        Ok(())
    }

    /// Start establishing the zero reference.
    pub fn calibrate(&mut self, now_ms: u64) -> Result<CalibrationState, DeviceError<A::Error>> {
        self.calibration.begin(&mut self.device, now_ms)
    }

    /// Advance movement and calibration. Call once per tick.
    ///
    /// Returns `true` on the tick where a movement finishes.
    pub fn update(&mut self, now_ms: u64) -> Result<bool, DeviceError<A::Error>> {
        let finished = self.device.update(now_ms)?;
        if self.calibration.is_calibrating() {
            self.calibration.poll(&mut self.device, now_ms)?;
        }
        Ok(finished)
    }

    /// Move by a signed distance. Refused while calibrating.
    pub fn move_by(
        &mut self,
        position_mm: i32,
        now_ms: u64,
    ) -> Result<MoveOutcome, DeviceError<A::Error>> {
        self.ensure_not_calibrating()?;
        self.device.move_by(position_mm, now_ms)
    }

    /// Timed move. Refused while calibrating.
    pub fn control(
        &mut self,
        direction: Direction,
        speed_hz: u32,
        duration_tenths: u32,
        now_ms: u64,
    ) -> Result<MoveOutcome, DeviceError<A::Error>> {
        self.ensure_not_calibrating()?;
        self.device
            .control(direction, speed_hz, duration_tenths, now_ms)
    }

    fn ensure_not_calibrating(&self) -> Result<(), DeviceError<A::Error>> {
        if self.calibration.is_calibrating() {
            return Err(DeviceError::Calibrating);
        }
        Ok(())
    }

    /// True when no movement is in flight.
    #[inline]
    pub fn is_movement_complete(&self) -> bool {
        self.device.is_movement_complete()
    }

    /// Whether a calibration run is in progress.
    #[inline]
    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_calibrating()
    }

    /// Whether a zero reference has been established.
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.device.is_calibrated()
    }

    /// Tracked position in millimeters.
    #[inline]
    pub fn current_position(&self) -> u32 {
        self.device.current_position()
    }

    /// Home sensor input identifier.
    #[inline]
    pub fn sensor_pin(&self) -> u8 {
        self.sensor_pin
    }

    /// Calibration state.
    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    /// Snapshot for diagnostics.
    pub fn state(&self, now_ms: u64) -> DeviceState {
        self.device.state(now_ms)
    }

    /// The underlying timed device.
    pub fn device(&self) -> &Device<A> {
        &self.device
    }

    /// The underlying timed device, mutably.
    pub fn device_mut(&mut self) -> &mut Device<A> {
        &mut self.device
    }

    /// The calibration strategy.
    pub fn calibration(&self) -> &C {
        &self.calibration
    }

    /// The calibration strategy, mutably.
    pub fn calibration_mut(&mut self) -> &mut C {
        &mut self.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HomingConfig;
    use crate::hal::{MockActuator, MockSensor};
    use crate::traits::CalibrationError;

    #[test]
    fn calibrate_stub_from_any_state() {
        let mut slider = Slider::new(MockActuator::new(), SliderConfig::default());
        slider.move_by(80, 0).unwrap();
        slider.update(800).unwrap();
        assert_eq!(slider.current_position(), 80);

        assert_eq!(slider.calibrate(900).unwrap(), CalibrationState::Homed);
        assert!(slider.is_calibrated());
        assert!(!slider.is_calibrating());
        assert_eq!(slider.current_position(), 0);

        // Calibrating twice is harmless
        slider.calibrate(1000).unwrap();
        assert!(slider.is_calibrated());
        assert_eq!(slider.current_position(), 0);
    }

    #[test]
    fn setup_configures_sensor() {
        let mut slider = Slider::with_sensor(
            MockActuator::new(),
            MockSensor::new(),
            SliderConfig::default().with_sensor_pin(11),
        );
        slider.setup().unwrap();
        assert!(slider.device().actuator().configured);
        assert!(slider.calibration().sensor().configured);
        assert_eq!(slider.sensor_pin(), 11);
    }

    #[test]
    fn moves_refused_while_homing() {
        let mut slider = Slider::with_sensor(
            MockActuator::new(),
            MockSensor::new(),
            SliderConfig::default(),
        );
        slider.calibrate(0).unwrap();
        assert!(slider.is_calibrating());

        assert_eq!(slider.move_by(5, 10).unwrap_err(), DeviceError::Calibrating);
        assert_eq!(
            slider.control(Direction::Forward, 800, 1, 10).unwrap_err(),
            DeviceError::Calibrating
        );
    }

    #[test]
    fn update_drives_homing_to_completion() {
        let mut slider = Slider::with_sensor(
            MockActuator::new(),
            MockSensor::new(),
            SliderConfig::default(),
        );
        slider.calibrate(0).unwrap();

        for t in (0..300).step_by(10) {
            slider.update(t).unwrap();
        }
        assert!(slider.is_calibrating());

        slider.calibration_mut().sensor_mut().trigger();
        slider.update(310).unwrap();

        assert!(!slider.is_calibrating());
        assert!(slider.is_calibrated());
        assert_eq!(slider.calibration_state(), CalibrationState::Homed);
        assert!(slider.move_by(5, 320).is_ok());
    }

    #[test]
    fn update_reports_homing_timeout() {
        let config = SliderConfig::default().with_homing(HomingConfig::default().with_margin_ms(0));
        let mut slider = Slider::with_sensor(MockActuator::new(), MockSensor::new(), config);
        slider.calibrate(0).unwrap();

        slider.update(4000).unwrap();
        assert_eq!(
            slider.calibration_state(),
            CalibrationState::Failed(CalibrationError::SensorNotTriggered)
        );
        assert!(!slider.is_calibrated());
        assert!(!slider.is_calibrating());
    }
}
