//! ESP32-C3 SuperMini fingering rig controller.
//!
//! This is the main entry point for the physical hardware. It homes the
//! slider against its sensor, then runs a cooperative control loop that:
//! - Advances slider movement and homing
//! - Lowers the rack once the slider has stopped
//! - Steps through a fixed pattern of finger positions
//!
//! # Hardware Setup
//!
//! See [`rs_fingering::hal::esp32::pins`] for the default wiring.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! ```

use esp_idf_hal::gpio::{OutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::log::EspLogger;
use rs_fingering::hal::esp32::{Esp32Actuator, Esp32Clock, Esp32HomeSensor, Esp32Lift};
use rs_fingering::traits::Clock;
use rs_fingering::{
    CalibrationState, Config, FingerJob, FingerOutcome, Fingering, RackConfig, RackMotor,
    SchedulerConfig, Slider, SliderConfig,
};
use std::thread;
use std::time::Duration;

/// Finger positions in millimeters from home, played in order.
const PATTERN_MM: [u32; 4] = [20, 45, 80, 130];

/// Pause between finger placements.
const DWELL_MS: u64 = 750;

/// Speed that maps to full PWM duty.
const FULL_SCALE_HZ: u32 = 1600;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_slider(SliderConfig::default())
        .with_rack(RackConfig::default())
        .with_scheduler(SchedulerConfig::default());
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;

    log::info!("{} ({}) starting", config.rig.name, config.rig.id);

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Slider drive (GPIO2/3 outputs, GPIO5 PWM)
    // =========================================================================
    let drive = Esp32Actuator::new(
        peripherals.pins.gpio2.downgrade_output(),
        peripherals.pins.gpio3.downgrade_output(),
        peripherals.pins.gpio5,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        FULL_SCALE_HZ,
    )?;

    // =========================================================================
    // Home sensor (GPIO7, active low) and rack (GPIO9)
    // =========================================================================
    let mut home = PinDriver::input(peripherals.pins.gpio7)?;
    home.set_pull(Pull::Up)?;
    let sensor = Esp32HomeSensor::new(home);

    let lift = Esp32Lift::new(PinDriver::output(peripherals.pins.gpio9)?);

    // =========================================================================
    // Rig
    // =========================================================================
    let clock = Esp32Clock::new();
    let slider = Slider::with_sensor(drive, sensor, config.slider);
    let rack = RackMotor::new(lift, config.rack);
    let mut rig = Fingering::new(slider, rack, config.scheduler);

    rig.setup().map_err(|e| anyhow::anyhow!("setup failed: {e}"))?;
    // Finger clear of the slider's path before the seek starts
    rig.run_job(FingerJob::RaiseRack, clock.now_ms())
        .map_err(|e| anyhow::anyhow!("rack raise failed: {e}"))?;
    rig.calibrate(clock.now_ms())
        .map_err(|e| anyhow::anyhow!("calibration failed to start: {e}"))?;

    let tick = Duration::from_millis(config.scheduler.tick_interval_ms as u64);
    let mut step = 0usize;
    let mut next_move_ms = 0u64;

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    loop {
        let now = clock.now_ms();

        match rig.tick(now) {
            Ok(report) if report.jobs_failed > 0 => {
                log::warn!("{} job(s) failed this tick", report.jobs_failed);
            }
            Ok(_) => {}
            Err(e) => log::error!("tick failed: {e}"),
        }

        if rig.is_idle() && now >= next_move_ms {
            match rig.slider().calibration_state() {
                CalibrationState::Failed(e) => {
                    log::error!("homing failed: {e}, retrying");
                    if let Err(e) = rig.run_job(FingerJob::RaiseRack, now) {
                        log::error!("rack raise failed: {e}");
                    } else if let Err(e) = rig.calibrate(now) {
                        log::error!("calibration failed to start: {e}");
                    }
                }
                CalibrationState::Homed if step < PATTERN_MM.len() => {
                    let target = PATTERN_MM[step];
                    let distance = target as i32 - rig.slider().current_position() as i32;
                    match rig.move_finger(distance, now) {
                        Ok(FingerOutcome::Skipped) => log::info!("skipped {} mm", target),
                        Ok(_) => log::info!(
                            "finger to {} mm at {} Hz",
                            target,
                            rig.slider().device().actuator().speed_hz()
                        ),
                        Err(e) => log::error!("finger move failed: {e}"),
                    }
                    step += 1;
                }
                CalibrationState::Homed => {
                    // Pattern done: lift clear and home again
                    for job in [FingerJob::RaiseRack, FingerJob::CalibrateSlider] {
                        if let Err(e) = rig.enqueue(job) {
                            log::warn!("{:?} not scheduled: {e}", e.0);
                        }
                    }
                    step = 0;
                }
                CalibrationState::Idle | CalibrationState::Seeking => {}
            }
            next_move_ms = now + DWELL_MS;
        }

        // Sleep until next tick
        thread::sleep(tick);
    }
}
