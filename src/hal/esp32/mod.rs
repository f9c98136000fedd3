//! ESP32-C3 hardware abstraction layer for the fingering rig.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini
//! - **Slider**: drive board with START/DIR/SPEED inputs
//! - **Home switch**: active-low limit switch at the home end
//! - **Rack**: lift motor switched by a single output
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for the default GPIO map.

mod actuator;
mod clock;
mod lift;
mod sensor;

pub use actuator::Esp32Actuator;
pub use clock::Esp32Clock;
pub use lift::Esp32Lift;
pub use sensor::Esp32HomeSensor;

/// Default pin assignments.
///
/// These match [`PinConfig::default`](crate::PinConfig), the default
/// sensor pin, and the default rack pin.
pub mod pins {
    // =========================================================================
    // Slider Drive
    // =========================================================================

    /// Run/stop output
    pub const START: i32 = 2;

    /// Direction output (high = forward)
    pub const DIRECTION: i32 = 3;

    /// Speed PWM output
    pub const SPEED: i32 = 5;

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Home switch input (active low, internal pull-up)
    pub const HOME_SENSOR: i32 = 7;

    // =========================================================================
    // Rack
    // =========================================================================

    /// Rack lift output (high = up)
    pub const RACK: i32 = 9;
}
