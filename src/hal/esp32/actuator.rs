//! Slider drive outputs on ESP32 GPIO and LEDC PWM.
//!
//! The drive board takes three signals:
//! - START (GPIO2): high while the carriage should run
//! - DIR (GPIO3): high for forward, low for reverse
//! - SPEED (GPIO5): PWM whose duty sets the step rate
//!
//! Speed maps linearly to duty: `duty = speed_hz * MAX_DUTY / full_scale_hz`.

use crate::traits::{Actuator, Direction};
use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Slider drive for ESP32.
///
/// Uses the LEDC peripheral for the speed signal at 20kHz with 10-bit
/// resolution (1024 duty steps).
///
/// # Example
///
/// ```ignore
/// use rs_fingering::hal::esp32::Esp32Actuator;
/// use rs_fingering::traits::{Actuator, Direction};
///
/// let peripherals = Peripherals::take()?;
/// let mut drive = Esp32Actuator::new(
///     peripherals.pins.gpio2.downgrade_output(),
///     peripherals.pins.gpio3.downgrade_output(),
///     peripherals.pins.gpio5,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     1600,
/// )?;
///
/// drive.set_direction(Direction::Forward)?;
/// drive.set_speed_hz(800)?; // half scale
/// drive.start()?;
/// ```
pub struct Esp32Actuator<'d> {
    start: PinDriver<'d, AnyOutputPin, Output>,
    direction: PinDriver<'d, AnyOutputPin, Output>,
    speed: LedcDriver<'d>,
    /// Step rate that maps to full duty
    full_scale_hz: u32,
    speed_hz: u32,
}

impl<'d> Esp32Actuator<'d> {
    /// PWM frequency in Hz (20kHz is above audible range)
    const PWM_FREQ_HZ: u32 = 20_000;

    /// PWM resolution (10-bit = 1024 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits10;

    /// Maximum duty value for 10-bit resolution
    const MAX_DUTY: u32 = 1023;

    /// Creates the drive with all outputs low.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or PWM initialization fails.
    pub fn new<T, TI, C, CI, SP, SPI>(
        start_pin: AnyOutputPin,
        direction_pin: AnyOutputPin,
        speed_pin: SP,
        timer: T,
        channel: C,
        full_scale_hz: u32,
    ) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        SPI: OutputPin + 'd,
        SP: Peripheral<P = SPI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let speed = LedcDriver::new(channel, &timer_driver, speed_pin)?;

        let mut drive = Self {
            start: PinDriver::output(start_pin)?,
            direction: PinDriver::output(direction_pin)?,
            speed,
            full_scale_hz: full_scale_hz.max(1),
            speed_hz: 0,
        };
        drive.start.set_low()?;
        drive.direction.set_low()?;
        drive.speed.set_duty(0)?;
        Ok(drive)
    }

    fn duty_for(&self, hz: u32) -> u32 {
        let duty = hz.min(self.full_scale_hz) as u64 * Self::MAX_DUTY as u64
            / self.full_scale_hz as u64;
        duty as u32
    }

    /// Returns the last commanded speed in Hz.
    #[inline]
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }
}

impl Actuator for Esp32Actuator<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        match direction {
            Direction::Forward => self.direction.set_high(),
            Direction::Reverse => self.direction.set_low(),
        }
    }

    fn set_speed_hz(&mut self, hz: u32) -> Result<(), Self::Error> {
        self.speed.set_duty(self.duty_for(hz))?;
        self.speed_hz = hz;
        Ok(())
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        self.start.set_high()
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.start.set_low()
    }
}
