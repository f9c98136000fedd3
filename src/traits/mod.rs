//! Trait definitions for hardware abstraction and calibration strategies.
//!
//! This module defines the core abstractions that allow rs-fingering to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Swap how a slider finds its zero reference
//!
//! # Submodules
//!
//! - `hardware`: Drive outputs, rack lift, home sensor, clock
//! - `calibration`: Zero reference strategies
//!
//! # Hardware Abstraction
//!
//! - [`Actuator`]: start/stop/direction/speed drive outputs
//! - [`LiftActuator`]: two-position rack output
//! - [`HomeSensor`]: reference switch
//! - [`Clock`]: Time source for `no_std` environments
//!
//! # Calibration Strategies
//!
//! - [`InstantCalibration`]: declare the current location as zero
//! - [`SensorHoming`]: seek the home sensor over many ticks

pub mod calibration;
pub mod hardware;

pub use calibration::*;
pub use hardware::*;
