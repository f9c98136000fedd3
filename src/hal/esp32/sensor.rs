//! Home switch input.
//!
//! Works with any `embedded-hal` 1.0 input, including an esp-idf
//! `PinDriver` configured with a pull-up.

use crate::traits::HomeSensor;
use embedded_hal::digital::InputPin;

/// Active-low limit switch at the slider's home end.
///
/// A read error counts as "not triggered"; homing then times out rather
/// than zeroing at an unknown place.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::{PinDriver, Pull};
/// use rs_fingering::hal::esp32::Esp32HomeSensor;
///
/// let mut pin = PinDriver::input(peripherals.pins.gpio7)?;
/// pin.set_pull(Pull::Up)?;
/// let sensor = Esp32HomeSensor::new(pin);
/// ```
pub struct Esp32HomeSensor<P: InputPin> {
    pin: P,
}

impl<P: InputPin> Esp32HomeSensor<P> {
    /// Wraps an input pin that reads low when the carriage is home.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> HomeSensor for Esp32HomeSensor<P> {
    fn is_triggered(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(level) => level,
            Err(e) => {
                log::warn!("home sensor read failed: {:?}", e);
                false
            }
        }
    }
}
