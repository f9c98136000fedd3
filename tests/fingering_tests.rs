//! Integration tests for the fingering rig

use rs_fingering::{
    hal::{MockActuator, MockClock, MockLift, MockSensor},
    traits::Clock,
    BusyPolicy, CalibrationError, CalibrationState, Config, DeviceError, FingerError, FingerJob,
    FingerOutcome, Fingering, JobGate, JobQueue, MotionConfig, MoveOutcome, RackConfig,
    RackMotor, RackPosition, SchedulerConfig, SensorHoming, Slider, SliderConfig,
};

type SensorRig = Fingering<MockActuator, SensorHoming<MockSensor>, MockLift>;

fn sensor_rig() -> SensorRig {
    let slider = Slider::with_sensor(
        MockActuator::new(),
        MockSensor::new(),
        SliderConfig::default(),
    );
    let rack = RackMotor::new(MockLift::new(), RackConfig::default());
    Fingering::new(slider, rack, SchedulerConfig::default())
}

/// Tick every 10 ms until the rig is idle or `limit_ms` passes.
fn run_until_idle<A, C, L, const N: usize>(
    rig: &mut Fingering<A, C, L, N>,
    clock: &mut MockClock,
    limit_ms: u64,
) where
    A: rs_fingering::Actuator,
    A::Error: core::fmt::Debug,
    C: rs_fingering::Calibration,
    L: rs_fingering::LiftActuator,
    L::Error: core::fmt::Debug,
{
    let deadline = clock.now_ms() + limit_ms;
    while !rig.is_idle() && clock.now_ms() < deadline {
        clock.advance(10);
        rig.tick(clock.now_ms()).unwrap();
    }
}

#[test]
fn homing_then_finger_cycle() {
    let mut clock = MockClock::new();
    let mut rig = sensor_rig();
    rig.setup().unwrap();

    assert_eq!(rig.calibrate(0).unwrap(), CalibrationState::Seeking);
    assert!(!rig.is_idle());

    // Carriage reaches the switch part way through the seek
    for _ in 0..50 {
        clock.advance(10);
        rig.tick(clock.now_ms()).unwrap();
    }
    assert!(rig.slider().is_calibrating());
    rig.slider_mut().calibration_mut().sensor_mut().trigger();
    clock.advance(10);
    rig.tick(clock.now_ms()).unwrap();

    assert!(rig.slider().is_calibrated());
    assert_eq!(rig.slider().current_position(), 0);
    assert!(rig.is_idle());

    // Off the switch again once the slider moves away
    rig.slider_mut().calibration_mut().sensor_mut().release();
    let outcome = rig.move_finger(60, clock.now_ms()).unwrap();
    assert_eq!(
        outcome,
        FingerOutcome::Dispatched {
            movement: MoveOutcome::Started {
                travel_mm: 60,
                duration_ms: 600
            },
            retract_scheduled: true,
        }
    );

    run_until_idle(&mut rig, &mut clock, 2000);
    assert_eq!(rig.slider().current_position(), 60);
    assert_eq!(rig.rack().position(), RackPosition::Down);
    assert_eq!(rig.rack().lift().raise_count, 1);
    assert_eq!(rig.rack().lift().lower_count, 1);
}

#[test]
fn homing_timeout_leaves_rig_uncalibrated() {
    let mut clock = MockClock::new();
    let mut rig = sensor_rig();
    rig.calibrate(0).unwrap();

    // 200 mm * 10 ms/mm * 800/400 + 1000 ms margin
    run_until_idle(&mut rig, &mut clock, 10_000);

    assert_eq!(clock.now_ms(), 5000);
    assert_eq!(
        rig.slider().calibration_state(),
        CalibrationState::Failed(CalibrationError::SensorNotTriggered)
    );
    assert!(!rig.slider().is_calibrated());
    assert!(!rig.slider().device().actuator().running);
}

#[test]
fn failed_rehome_leaves_rig_uncalibrated() {
    let motion = MotionConfig::default().with_require_calibration(true);
    let slider = Slider::with_sensor(
        MockActuator::new(),
        MockSensor::new(),
        SliderConfig::default().with_motion(motion),
    );
    let rack = RackMotor::new(MockLift::new(), RackConfig::default());
    let mut rig = Fingering::new(slider, rack, SchedulerConfig::default());
    let mut clock = MockClock::new();

    rig.slider_mut().calibration_mut().sensor_mut().trigger();
    assert_eq!(rig.calibrate(0).unwrap(), CalibrationState::Homed);
    rig.slider_mut().calibration_mut().sensor_mut().release();

    rig.move_finger(100, 0).unwrap();
    run_until_idle(&mut rig, &mut clock, 2000);
    assert_eq!(rig.slider().current_position(), 100);

    // Switch never seen on the way back
    rig.calibrate(clock.now_ms()).unwrap();
    assert!(!rig.slider().is_calibrated());
    run_until_idle(&mut rig, &mut clock, 10_000);

    assert_eq!(
        rig.slider().calibration_state(),
        CalibrationState::Failed(CalibrationError::SensorNotTriggered)
    );
    assert!(!rig.slider().is_calibrated());
    assert_eq!(
        rig.move_finger(10, clock.now_ms()).unwrap_err(),
        FingerError::Slider(DeviceError::NotCalibrated)
    );
}

#[test]
fn rack_raised_directly_is_up_during_homing() {
    let mut rig = sensor_rig();
    rig.setup().unwrap();

    rig.run_job(FingerJob::RaiseRack, 0).unwrap();
    assert_eq!(rig.calibrate(0).unwrap(), CalibrationState::Seeking);

    assert!(rig.rack().is_up());
    assert!(rig.jobs().is_empty());
    assert!(rig.slider().device().actuator().running);
}

#[test]
fn jobs_wait_for_homing() {
    let mut clock = MockClock::new();
    let mut rig = sensor_rig();
    rig.enqueue(FingerJob::RaiseRack).unwrap();
    rig.calibrate(0).unwrap();

    for _ in 0..10 {
        clock.advance(10);
        let report = rig.tick(clock.now_ms()).unwrap();
        assert!(report.held);
    }
    assert_eq!(rig.rack().position(), RackPosition::Unknown);

    rig.slider_mut().calibration_mut().sensor_mut().trigger();
    clock.advance(10);
    let report = rig.tick(clock.now_ms()).unwrap();
    assert_eq!(report.jobs_run, 1);
    assert!(rig.rack().is_up());
}

#[test]
fn negative_finger_move_only_raises_rack() {
    let mut rig = sensor_rig();
    rig.enqueue(FingerJob::CalibrateSlider).unwrap();
    let pending = rig.jobs().len();

    assert_eq!(rig.move_finger(-5, 0).unwrap(), FingerOutcome::Skipped);

    assert_eq!(rig.rack().lift().raise_count, 1);
    assert_eq!(rig.slider().device().actuator().start_count, 0);
    assert_eq!(rig.jobs().len(), pending);

    // A second skipped move does not re-drive the rack
    rig.move_finger(-1, 0).unwrap();
    assert_eq!(rig.rack().lift().raise_count, 1);
}

#[test]
fn finger_move_while_busy_is_refused() {
    let mut rig = Fingering::from_config(MockActuator::new(), MockLift::new(), &Config::default());
    rig.calibrate(0).unwrap();

    rig.move_finger(50, 0).unwrap();
    let err = rig.move_finger(10, 100).unwrap_err();

    assert_eq!(err, FingerError::Slider(DeviceError::Busy));
    assert_eq!(rig.jobs().len(), 1);
    assert!(rig.rack().is_up());
}

#[test]
fn finger_move_override_books_partial_travel() {
    let motion = MotionConfig::default().with_busy_policy(BusyPolicy::Override);
    let config = Config::default().with_slider(SliderConfig::default().with_motion(motion));
    let mut rig = Fingering::from_config(MockActuator::new(), MockLift::new(), &config);
    let mut clock = MockClock::new();
    rig.calibrate(0).unwrap();

    rig.move_finger(100, 0).unwrap();
    clock.set(400);
    rig.tick(400).unwrap();
    rig.move_finger(10, 400).unwrap();

    assert_eq!(rig.slider().current_position(), 40);
    run_until_idle(&mut rig, &mut clock, 1000);
    assert_eq!(rig.slider().current_position(), 50);
    assert_eq!(rig.rack().position(), RackPosition::Down);
}

#[test]
fn immediate_gate_lowers_rack_during_travel() {
    let config = Config::default()
        .with_scheduler(SchedulerConfig::default().with_job_gate(JobGate::Immediate));
    let mut rig = Fingering::from_config(MockActuator::new(), MockLift::new(), &config);
    rig.calibrate(0).unwrap();

    rig.move_finger(100, 0).unwrap();
    rig.tick(10).unwrap();

    assert_eq!(rig.rack().position(), RackPosition::Down);
    assert!(rig.slider().device().is_moving());
}

#[test]
fn small_queue_reports_unscheduled_retract() {
    let slider = Slider::new(MockActuator::new(), SliderConfig::default());
    let rack = RackMotor::new(MockLift::new(), RackConfig::default());
    let jobs: JobQueue<FingerJob, 2> = JobQueue::new();
    let mut rig = Fingering::with_queue(slider, rack, jobs, SchedulerConfig::default());
    rig.calibrate(0).unwrap();

    rig.move_finger(10, 0).unwrap();
    rig.tick(100).unwrap();
    assert_eq!(rig.rack().position(), RackPosition::Down);

    rig.enqueue(FingerJob::RaiseRack).unwrap();
    let outcome = rig.move_finger(10, 100).unwrap();
    assert!(matches!(
        outcome,
        FingerOutcome::Dispatched {
            retract_scheduled: false,
            ..
        }
    ));
    assert_eq!(rig.jobs().dropped_count(), 1);
}
