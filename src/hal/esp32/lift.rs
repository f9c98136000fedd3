//! Rack lift output.

use crate::traits::LiftActuator;
use embedded_hal::digital::OutputPin;

/// Rack motor on a single digital output: high raises, low lowers.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::PinDriver;
/// use rs_fingering::hal::esp32::Esp32Lift;
///
/// let lift = Esp32Lift::new(PinDriver::output(peripherals.pins.gpio9)?);
/// ```
pub struct Esp32Lift<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> Esp32Lift<P> {
    /// Wraps the lift output pin.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin> LiftActuator for Esp32Lift<P> {
    type Error = P::Error;

    fn raise(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn lower(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }
}
