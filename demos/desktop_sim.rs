//! Desktop simulation of the fingering rig against mock hardware.
//!
//! Runs the same cooperative loop as the ESP32 binary, driven by a
//! simulated clock, and logs what the slider and rack do.
//!
//! # Usage
//!
//! Each argument is one step, run when the rig is idle:
//! - `30` or `-5`: finger move by that many millimeters
//! - `fwd:12` / `rev:4`: timed slider move for that many tenths of a second
//! - `home`: recalibrate
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_sim -- 30 -5 20 rev:3 home
//! ```

use std::collections::VecDeque;

use rs_fingering::hal::{MockActuator, MockClock, MockLift};
use rs_fingering::traits::Clock;
use rs_fingering::{
    Config, Direction, FingerJob, Fingering, RackMotor, SchedulerConfig, Slider,
};

/// Simulated loop period.
const TICK_MS: u64 = 10;

/// Give up if the rig never settles.
const MAX_SIM_MS: u64 = 60_000;

#[derive(Debug)]
enum Step {
    Finger(i32),
    Timed(Direction, u32),
    Home,
}

fn parse_step(arg: &str) -> anyhow::Result<Step> {
    if arg.eq_ignore_ascii_case("home") {
        return Ok(Step::Home);
    }
    if let Some((dir, tenths)) = arg.split_once(':') {
        let direction = Direction::from_text(dir)
            .ok_or_else(|| anyhow::anyhow!("unknown direction '{dir}'"))?;
        return Ok(Step::Timed(direction, tenths.trim().parse()?));
    }
    Ok(Step::Finger(arg.trim().parse()?))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let mut steps = std::env::args()
        .skip(1)
        .map(|arg| parse_step(&arg))
        .collect::<anyhow::Result<VecDeque<_>>>()?;
    if steps.is_empty() {
        steps.extend([Step::Finger(30), Step::Finger(-5), Step::Finger(20), Step::Home]);
    }

    let config = Config::default().with_scheduler(SchedulerConfig::default());
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;

    let mut clock = MockClock::new();
    let slider = Slider::new(MockActuator::new(), config.slider);
    let rack = RackMotor::new(MockLift::new(), config.rack);
    let mut rig = Fingering::new(slider, rack, config.scheduler);

    rig.setup().map_err(|e| anyhow::anyhow!("setup failed: {e}"))?;
    rig.calibrate(clock.now_ms())
        .map_err(|e| anyhow::anyhow!("calibration failed: {e}"))?;

    while clock.now_ms() < MAX_SIM_MS {
        let now = clock.now_ms();
        let report = rig
            .tick(now)
            .map_err(|e| anyhow::anyhow!("tick failed: {e}"))?;
        if report.movement_finished {
            log::info!(
                "[{now:>6} ms] slider stopped at {} mm",
                rig.slider().current_position()
            );
        }

        if rig.is_idle() {
            let Some(step) = steps.pop_front() else {
                break;
            };
            log::info!("[{now:>6} ms] {:?}", step);
            let result = match step {
                Step::Finger(mm) => rig.move_finger(mm, now).map(|outcome| {
                    log::info!("           {:?}", outcome);
                }),
                Step::Timed(direction, tenths) => {
                    let speed = config.slider.motion.fixed_move_speed_hz;
                    rig.slider_mut()
                        .control(direction, speed, tenths, now)
                        .map(|outcome| log::info!("           {:?}", outcome))
                        .map_err(rs_fingering::FingerError::Slider)
                }
                Step::Home => rig.run_job(FingerJob::CalibrateSlider, now),
            };
            if let Err(e) = result {
                log::warn!("           refused: {e}");
            }
        }

        clock.advance(TICK_MS);
    }

    let state = rig.slider().state(clock.now_ms());
    log::info!(
        "done at {} ms: position {} mm, rack {:?}, calibrated {}",
        clock.now_ms(),
        state.position_mm,
        rig.rack().position(),
        state.is_calibrated
    );
    Ok(())
}
