//! Rig configuration shared by the desktop simulator and ESP32 firmware.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::config::{Config, MotionConfig, SliderConfig, TravelPolicy};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default().with_slider(
//!     SliderConfig::default().with_motion(
//!         MotionConfig::default()
//!             .with_max_distance_mm(150)
//!             .with_travel_policy(TravelPolicy::Clamp),
//!     ),
//! );
//! assert_eq!(config.slider.motion.max_distance_mm, 150);
//! ```

use core::fmt;
use heapless::String as HString;

use crate::jobs::DrainPolicy;

/// Maximum length for short config strings (names, identifiers)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Policies
// ============================================================================

/// What a distance move does when its target lies outside `0..=max_distance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TravelPolicy {
    /// Shorten the move so it stops at the nearest bound.
    Clamp,
    /// Refuse the move with [`DeviceError::OutOfRange`](crate::DeviceError::OutOfRange).
    #[default]
    Reject,
}

/// What a movement request does while another movement is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BusyPolicy {
    /// Refuse with [`DeviceError::Busy`](crate::DeviceError::Busy).
    #[default]
    Reject,
    /// Book the partial travel so far and restart timing for the new move.
    Override,
}

/// When the scheduler may run deferred jobs relative to slider motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JobGate {
    /// Hold the queue while the slider is moving or calibrating.
    #[default]
    WaitForSlider,
    /// Drain every tick regardless of slider state.
    Immediate,
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete rig configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Rig identification
    pub rig: RigConfig,
    /// Slider drive and calibration
    pub slider: SliderConfig,
    /// Rack motor output
    pub rack: RackConfig,
    /// Control loop and job scheduling
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Set rig identification
    pub fn with_rig(mut self, rig: RigConfig) -> Self {
        self.rig = rig;
        self
    }

    /// Set slider configuration
    pub fn with_slider(mut self, slider: SliderConfig) -> Self {
        self.slider = slider;
        self
    }

    /// Set rack configuration
    pub fn with_rack(mut self, rack: RackConfig) -> Self {
        self.rack = rack;
        self
    }

    /// Set scheduler configuration
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Check the values the timing math divides by or bounds against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.slider.validate()
    }
}

/// Largest `max_distance_mm` a signed millimeter travel can span.
pub const MAX_DISTANCE_LIMIT_MM: u32 = i32::MAX as u32;

/// Invalid configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_distance_mm` is zero.
    ZeroMaxDistance,
    /// `max_distance_mm` does not fit a signed travel.
    MaxDistanceTooLarge,
    /// `fixed_move_speed_hz` is zero.
    ZeroMoveSpeed,
    /// `ms_per_mm` is zero.
    ZeroRatio,
    /// `homing.speed_hz` is zero.
    ZeroHomingSpeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroMaxDistance => f.write_str("max distance must be non-zero"),
            ConfigError::MaxDistanceTooLarge => {
                write!(f, "max distance must not exceed {} mm", MAX_DISTANCE_LIMIT_MM)
            }
            ConfigError::ZeroMoveSpeed => f.write_str("fixed move speed must be non-zero"),
            ConfigError::ZeroRatio => f.write_str("distance to duration ratio must be non-zero"),
            ConfigError::ZeroHomingSpeed => f.write_str("homing speed must be non-zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Pin Config
// ============================================================================

/// The three drive channels of a timed actuator.
///
/// These are opaque identifiers; the core only reports them in
/// diagnostics and hands them to hardware constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinConfig {
    /// Enable/start output
    pub start: u8,
    /// Direction output
    pub direction: u8,
    /// Speed output
    pub speed: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            start: 2,
            direction: 3,
            speed: 5,
        }
    }
}

impl PinConfig {
    /// Create a pin set
    pub const fn new(start: u8, direction: u8, speed: u8) -> Self {
        Self {
            start,
            direction,
            speed,
        }
    }
}

// ============================================================================
// Motion Config
// ============================================================================

/// Timing law and limits of a timed actuator.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionConfig {
    /// Drive channels
    pub pins: PinConfig,
    /// Upper bound on position in millimeters
    pub max_distance_mm: u32,
    /// Speed used for distance moves
    pub fixed_move_speed_hz: u32,
    /// Milliseconds of travel per millimeter at `fixed_move_speed_hz`
    pub ms_per_mm: u32,
    /// Out-of-range distance moves
    pub travel_policy: TravelPolicy,
    /// Requests while already moving
    pub busy_policy: BusyPolicy,
    /// Reject distance moves until a zero reference exists
    pub require_calibration: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            max_distance_mm: 200,
            fixed_move_speed_hz: 800,
            ms_per_mm: 10,
            travel_policy: TravelPolicy::Reject,
            busy_policy: BusyPolicy::Reject,
            require_calibration: false,
        }
    }
}

impl MotionConfig {
    /// Set the drive channels
    pub fn with_pins(mut self, pins: PinConfig) -> Self {
        self.pins = pins;
        self
    }

    /// Set the travel limit
    pub fn with_max_distance_mm(mut self, mm: u32) -> Self {
        self.max_distance_mm = mm;
        self
    }

    /// Set the speed used for distance moves
    pub fn with_fixed_move_speed_hz(mut self, hz: u32) -> Self {
        self.fixed_move_speed_hz = hz;
        self
    }

    /// Set the distance to duration ratio
    pub fn with_ms_per_mm(mut self, ms: u32) -> Self {
        self.ms_per_mm = ms;
        self
    }

    /// Set the out-of-range policy
    pub fn with_travel_policy(mut self, policy: TravelPolicy) -> Self {
        self.travel_policy = policy;
        self
    }

    /// Set the busy policy
    pub fn with_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = policy;
        self
    }

    /// Require calibration before distance moves
    pub fn with_require_calibration(mut self, required: bool) -> Self {
        self.require_calibration = required;
        self
    }

    /// Check the values the timing math relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_distance_mm == 0 {
            return Err(ConfigError::ZeroMaxDistance);
        }
        if self.max_distance_mm > MAX_DISTANCE_LIMIT_MM {
            return Err(ConfigError::MaxDistanceTooLarge);
        }
        if self.fixed_move_speed_hz == 0 {
            return Err(ConfigError::ZeroMoveSpeed);
        }
        if self.ms_per_mm == 0 {
            return Err(ConfigError::ZeroRatio);
        }
        Ok(())
    }

    /// Duration of a full-length move at the fixed speed.
    pub fn full_travel_ms(&self) -> u64 {
        self.max_distance_mm as u64 * self.ms_per_mm as u64
    }
}

// ============================================================================
// Slider Config
// ============================================================================

/// Sensor-driven homing parameters
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HomingConfig {
    /// Drive speed while seeking the sensor
    pub speed_hz: u32,
    /// Extra time allowed beyond a full-length move before giving up
    pub margin_ms: u32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            speed_hz: 400,
            margin_ms: 1000,
        }
    }
}

impl HomingConfig {
    /// Set the seek speed
    pub fn with_speed_hz(mut self, hz: u32) -> Self {
        self.speed_hz = hz;
        self
    }

    /// Set the timeout margin
    pub fn with_margin_ms(mut self, ms: u32) -> Self {
        self.margin_ms = ms;
        self
    }
}

/// Slider configuration
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliderConfig {
    /// Timing law and limits
    pub motion: MotionConfig,
    /// Home sensor input
    pub sensor_pin: u8,
    /// Homing parameters
    pub homing: HomingConfig,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            sensor_pin: 7,
            homing: HomingConfig::default(),
        }
    }
}

impl SliderConfig {
    /// Set the motion parameters
    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Set the sensor pin
    pub fn with_sensor_pin(mut self, pin: u8) -> Self {
        self.sensor_pin = pin;
        self
    }

    /// Set the homing parameters
    pub fn with_homing(mut self, homing: HomingConfig) -> Self {
        self.homing = homing;
        self
    }

    /// Validate motion and homing values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motion.validate()?;
        if self.homing.speed_hz == 0 {
            return Err(ConfigError::ZeroHomingSpeed);
        }
        Ok(())
    }
}

// ============================================================================
// Rack Config
// ============================================================================

/// Rack motor configuration
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RackConfig {
    /// Lift output
    pub pin: u8,
}

impl Default for RackConfig {
    fn default() -> Self {
        Self { pin: 9 }
    }
}

impl RackConfig {
    /// Set the lift output pin
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = pin;
        self
    }
}

// ============================================================================
// Scheduler Config
// ============================================================================

/// Control loop and job scheduling configuration
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Control loop period in milliseconds
    pub tick_interval_ms: u32,
    /// How many jobs a tick may run
    pub drain_policy: DrainPolicy,
    /// Whether jobs wait for the slider
    pub job_gate: JobGate,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            drain_policy: DrainPolicy::One,
            job_gate: JobGate::WaitForSlider,
        }
    }
}

impl SchedulerConfig {
    /// Set the loop period
    pub fn with_tick_interval_ms(mut self, ms: u32) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Set the drain policy
    pub fn with_drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }

    /// Set the job gate
    pub fn with_job_gate(mut self, gate: JobGate) -> Self {
        self.job_gate = gate;
        self
    }
}

// ============================================================================
// Rig Config
// ============================================================================

/// Rig identification
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigConfig {
    /// Human-readable rig name
    pub name: ShortString,
    /// Rig identifier (for multi-rig setups)
    pub id: ShortString,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-fingering"),
            id: short_string("rig1"),
        }
    }
}

impl RigConfig {
    /// Set the rig name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the rig ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.slider.motion.max_distance_mm, 200);
        assert_eq!(config.slider.motion.ms_per_mm, 10);
        assert_eq!(config.slider.motion.travel_policy, TravelPolicy::Reject);
        assert_eq!(config.slider.motion.busy_policy, BusyPolicy::Reject);
        assert_eq!(config.scheduler.job_gate, JobGate::WaitForSlider);
        assert_eq!(config.scheduler.drain_policy, DrainPolicy::One);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_rig(RigConfig::default().with_name("Bench").with_id("rig-7"))
            .with_rack(RackConfig::default().with_pin(12))
            .with_scheduler(
                SchedulerConfig::default()
                    .with_tick_interval_ms(5)
                    .with_drain_policy(DrainPolicy::All)
                    .with_job_gate(JobGate::Immediate),
            );

        assert_eq!(config.rig.name.as_str(), "Bench");
        assert_eq!(config.rig.id.as_str(), "rig-7");
        assert_eq!(config.rack.pin, 12);
        assert_eq!(config.scheduler.tick_interval_ms, 5);
        assert_eq!(config.scheduler.drain_policy, DrainPolicy::All);
        assert_eq!(config.scheduler.job_gate, JobGate::Immediate);
    }

    #[test]
    fn motion_builder() {
        let motion = MotionConfig::default()
            .with_pins(PinConfig::new(10, 11, 12))
            .with_max_distance_mm(90)
            .with_fixed_move_speed_hz(1200)
            .with_ms_per_mm(4)
            .with_travel_policy(TravelPolicy::Clamp)
            .with_busy_policy(BusyPolicy::Override)
            .with_require_calibration(true);

        assert_eq!(motion.pins, PinConfig::new(10, 11, 12));
        assert_eq!(motion.max_distance_mm, 90);
        assert_eq!(motion.fixed_move_speed_hz, 1200);
        assert_eq!(motion.ms_per_mm, 4);
        assert_eq!(motion.travel_policy, TravelPolicy::Clamp);
        assert_eq!(motion.busy_policy, BusyPolicy::Override);
        assert!(motion.require_calibration);
        assert_eq!(motion.full_travel_ms(), 360);
    }

    #[test]
    fn validate_rejects_zero_values() {
        let zero_max = MotionConfig::default().with_max_distance_mm(0);
        assert_eq!(zero_max.validate(), Err(ConfigError::ZeroMaxDistance));

        let huge_max = MotionConfig::default().with_max_distance_mm(MAX_DISTANCE_LIMIT_MM + 1);
        assert_eq!(huge_max.validate(), Err(ConfigError::MaxDistanceTooLarge));
        let edge_max = MotionConfig::default().with_max_distance_mm(MAX_DISTANCE_LIMIT_MM);
        assert!(edge_max.validate().is_ok());

        let zero_speed = MotionConfig::default().with_fixed_move_speed_hz(0);
        assert_eq!(zero_speed.validate(), Err(ConfigError::ZeroMoveSpeed));

        let zero_ratio = MotionConfig::default().with_ms_per_mm(0);
        assert_eq!(zero_ratio.validate(), Err(ConfigError::ZeroRatio));

        let slider = SliderConfig::default().with_homing(HomingConfig::default().with_speed_hz(0));
        assert_eq!(slider.validate(), Err(ConfigError::ZeroHomingSpeed));

        let config = Config::default().with_slider(slider);
        assert_eq!(config.validate(), Err(ConfigError::ZeroHomingSpeed));
    }

    #[test]
    fn config_error_display() {
        let msg = format!("{}", ConfigError::ZeroRatio);
        assert!(msg.contains("ratio"));
    }

    #[test]
    fn slider_builder() {
        let slider = SliderConfig::default()
            .with_sensor_pin(14)
            .with_homing(HomingConfig::default().with_speed_hz(250).with_margin_ms(500));

        assert_eq!(slider.sensor_pin, 14);
        assert_eq!(slider.homing.speed_hz, 250);
        assert_eq!(slider.homing.margin_ms, 500);
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn short_string_utf8_boundary() {
        // 4-byte characters: 8 fit exactly, the 9th must be dropped whole
        let input = "🎹".repeat(9);
        let s = short_string(&input);
        assert_eq!(s.len(), 32);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());

        let odd = "ab🎹🎹🎹🎹🎹🎹🎹🎹";
        let s = short_string(odd);
        assert!(s.len() <= MAX_SHORT_STRING);
        assert!(s.as_str().starts_with("ab"));
    }
}
