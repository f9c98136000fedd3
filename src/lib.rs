//! # rs-fingering
//!
//! Control core for a finger placement rig: a linear slider positions a
//! finger, a rack motor lifts it clear while the slider travels, and a
//! small job queue lowers it again on a later tick.
//!
//! ## Features
//!
//! - **Non-blocking movement**: timed moves advance from a cooperative loop, nothing waits
//! - **Position bookkeeping**: distance moves at a fixed speed with configurable range policy
//! - **Calibration**: placeholder zeroing or sensor homing with timeout
//! - **Deferred jobs**: fixed-capacity FIFO that keeps one slot free
//! - **Hardware abstraction**: drive, lift, sensor and clock traits with mocks for desktop testing
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions and calibration strategies
//! - `device` - Timed-movement state machine
//! - `slider` - Device plus calibration
//! - `rack` - Two-position rack motor
//! - `jobs` - Deferred job queue
//! - `fingering` - Ties slider, rack and queue together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_fingering::{
//!     Fingering, RackConfig, RackMotor, SchedulerConfig, Slider, SliderConfig,
//!     hal::{MockActuator, MockLift},
//! };
//!
//! let slider = Slider::new(MockActuator::new(), SliderConfig::default());
//! let rack = RackMotor::new(MockLift::new(), RackConfig::default());
//! let mut rig = Fingering::new(slider, rack, SchedulerConfig::default());
//!
//! rig.setup().unwrap();
//! rig.calibrate(0).unwrap();
//!
//! // Lift, slide 40 mm, lower once the slider stops
//! rig.move_finger(40, 0).unwrap();
//!
//! // Update in your main loop
//! let mut now = 0;
//! while !rig.is_idle() {
//!     now += 10; // 10ms tick
//!     rig.tick(now).unwrap();
//! }
//! assert_eq!(rig.slider().current_position(), 40);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Timed-movement state machine with position tracking.
pub mod device;
/// Finger placement orchestration over slider, rack and job queue.
pub mod fingering;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Fixed-capacity deferred job queue.
pub mod jobs;
/// Two-position rack motor.
pub mod rack;
/// Slider: a device with calibration.
pub mod slider;
/// Core traits for hardware abstraction and calibration strategies.
pub mod traits;

// Re-exports for convenience
pub use device::{Device, DeviceError, DeviceState, MoveOutcome, MovementProgress};
pub use fingering::{
    move_finger, FingerError, FingerJob, FingerOutcome, Fingering, RigError, TickReport,
};
pub use jobs::{DrainPolicy, DrainReport, JobQueue, JobRunner, QueueFull, MAX_QUEUE_SIZE};
pub use rack::{RackMotor, RackPosition};
pub use slider::Slider;
pub use traits::{
    // Hardware
    Actuator,
    // Calibration
    Calibration,
    CalibrationError,
    CalibrationState,
    Clock,
    Direction,
    HomeSensor,
    InstantCalibration,
    LiftActuator,
    SensorHoming,
};

// Config re-exports
pub use config::{
    BusyPolicy, Config, ConfigError, HomingConfig, JobGate, MotionConfig, PinConfig, RackConfig,
    RigConfig, SchedulerConfig, SliderConfig, TravelPolicy,
};
