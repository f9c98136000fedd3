//! Finger placement: coordinates the slider, the rack and the job queue.
//!
//! A finger move lifts the rack clear, slides the carriage to the new
//! spot, and schedules the rack to come back down on a later tick. The
//! later tick is chosen by the [`JobGate`]: by default the retraction
//! waits until the slider has stopped.
//!
//! # Sequence
//!
//! ```text
//!   move_finger(d)
//!     rack.up()
//!     d < 0 ? ──yes──▶ Skipped
//!       │ no
//!     slider.move_by(d)
//!     enqueue(RetractRack)
//!
//!   tick(now)
//!     slider.update(now)
//!     drain jobs (gate + drain policy)
//! ```
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::{Fingering, FingerOutcome, RackPosition, SchedulerConfig};
//! use rs_fingering::{RackConfig, RackMotor, Slider, SliderConfig};
//! use rs_fingering::hal::{MockActuator, MockLift};
//!
//! let slider = Slider::new(MockActuator::new(), SliderConfig::default());
//! let rack = RackMotor::new(MockLift::new(), RackConfig::default());
//! let mut rig = Fingering::new(slider, rack, SchedulerConfig::default());
//! rig.setup().unwrap();
//! rig.calibrate(0).unwrap();
//!
//! let outcome = rig.move_finger(20, 0).unwrap();
//! assert!(matches!(outcome, FingerOutcome::Dispatched { retract_scheduled: true, .. }));
//! assert_eq!(rig.rack().position(), RackPosition::Up);
//!
//! // The rack stays up while the slider travels (20 mm at 10 ms/mm)
//! rig.tick(100).unwrap();
//! assert_eq!(rig.rack().position(), RackPosition::Up);
//!
//! // Slider arrives, retraction runs on the same tick
//! let report = rig.tick(200).unwrap();
//! assert!(report.movement_finished);
//! assert_eq!(report.jobs_run, 1);
//! assert_eq!(rig.rack().position(), RackPosition::Down);
//! assert_eq!(rig.slider().current_position(), 20);
//! ```

use core::fmt;

use crate::config::{JobGate, SchedulerConfig};
use crate::device::{DeviceError, MoveOutcome};
use crate::jobs::{JobQueue, JobRunner, QueueFull, MAX_QUEUE_SIZE};
use crate::rack::RackMotor;
use crate::slider::Slider;
use crate::traits::{Actuator, Calibration, CalibrationState, InstantCalibration, LiftActuator};

/// Deferred work the rig can schedule for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FingerJob {
    /// Lower the rack onto the work.
    RetractRack,
    /// Lift the rack clear.
    RaiseRack,
    /// Move the slider by a signed distance.
    MoveSlider {
        /// Relative travel in millimeters.
        distance_mm: i32,
    },
    /// Re-establish the slider's zero reference.
    CalibrateSlider,
}

/// Result of a finger move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FingerOutcome {
    /// Negative distance: the rack was raised and nothing else happened.
    Skipped,
    /// The slider move was accepted.
    Dispatched {
        /// What the slider is doing.
        movement: MoveOutcome,
        /// Whether the rack retraction made it into the queue.
        retract_scheduled: bool,
    },
}

/// Failure from either half of the rig.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FingerError<SE, LE> {
    /// The slider refused or its drive failed.
    Slider(DeviceError<SE>),
    /// The rack output failed.
    Rack(LE),
}

impl<SE: fmt::Debug, LE: fmt::Debug> fmt::Display for FingerError<SE, LE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerError::Slider(e) => write!(f, "slider: {e}"),
            FingerError::Rack(e) => write!(f, "rack output error: {e:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl<SE: fmt::Debug, LE: fmt::Debug> std::error::Error for FingerError<SE, LE> {}

/// Error type of a rig built from `A` and `L`.
pub type RigError<A, L> = FingerError<<A as Actuator>::Error, <L as LiftActuator>::Error>;

/// Summary of one control loop tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TickReport {
    /// A slider movement finished on this tick.
    pub movement_finished: bool,
    /// Jobs that ran successfully.
    pub jobs_run: usize,
    /// Jobs that ran and failed.
    pub jobs_failed: usize,
    /// Jobs are pending but the gate held them.
    pub held: bool,
}

/// Raise the rack, move the slider, and schedule the rack to come down.
///
/// The rack is raised first, always. A negative distance stops there. A
/// full queue does not undo the slider move; it shows up as
/// `retract_scheduled: false`.
pub fn move_finger<A, C, L, const N: usize>(
    slider: &mut Slider<A, C>,
    rack: &mut RackMotor<L>,
    jobs: &mut JobQueue<FingerJob, N>,
    distance_mm: i32,
    now_ms: u64,
) -> Result<FingerOutcome, RigError<A, L>>
where
    A: Actuator,
    C: Calibration,
    L: LiftActuator,
{
    rack.up().map_err(FingerError::Rack)?;

    if distance_mm < 0 {
        log::debug!("finger move of {} mm skipped", distance_mm);
        return Ok(FingerOutcome::Skipped);
    }

    let movement = slider
        .move_by(distance_mm, now_ms)
        .map_err(FingerError::Slider)?;

    let retract_scheduled = match jobs.enqueue(FingerJob::RetractRack) {
        Ok(()) => true,
        Err(QueueFull(_)) => {
            log::warn!("rack retraction not scheduled, rack stays up");
            false
        }
    };

    Ok(FingerOutcome::Dispatched {
        movement,
        retract_scheduled,
    })
}

fn execute<A, C, L>(
    job: FingerJob,
    slider: &mut Slider<A, C>,
    rack: &mut RackMotor<L>,
    now_ms: u64,
) -> Result<(), RigError<A, L>>
where
    A: Actuator,
    C: Calibration,
    L: LiftActuator,
{
    log::debug!("running job {:?}", job);
    match job {
        FingerJob::RetractRack => rack.down().map(|_| ()).map_err(FingerError::Rack),
        FingerJob::RaiseRack => rack.up().map(|_| ()).map_err(FingerError::Rack),
        FingerJob::MoveSlider { distance_mm } => slider
            .move_by(distance_mm, now_ms)
            .map(|_| ())
            .map_err(FingerError::Slider),
        FingerJob::CalibrateSlider => slider
            .calibrate(now_ms)
            .map(|_| ())
            .map_err(FingerError::Slider),
    }
}

/// Runs jobs against borrowed rig parts for one drain pass.
struct RigRunner<'a, A: Actuator, C: Calibration, L: LiftActuator> {
    slider: &'a mut Slider<A, C>,
    rack: &'a mut RackMotor<L>,
    gate: JobGate,
    now_ms: u64,
}

impl<A, C, L> JobRunner<FingerJob> for RigRunner<'_, A, C, L>
where
    A: Actuator,
    A::Error: fmt::Debug,
    C: Calibration,
    L: LiftActuator,
    L::Error: fmt::Debug,
{
    type Error = RigError<A, L>;

    fn ready(&self) -> bool {
        match self.gate {
            JobGate::Immediate => true,
            JobGate::WaitForSlider => {
                self.slider.is_movement_complete() && !self.slider.is_calibrating()
            }
        }
    }

    fn run_job(&mut self, job: FingerJob) -> Result<(), Self::Error> {
        execute(job, self.slider, self.rack, self.now_ms)
    }
}

/// The complete rig: slider, rack, and the queue linking them.
///
/// # Type Parameters
///
/// - `A`: Slider drive outputs ([`Actuator`] trait)
/// - `C`: Slider calibration strategy ([`Calibration`] trait)
/// - `L`: Rack output ([`LiftActuator`] trait)
/// - `N`: Queue slots (holds `N - 1` jobs)
pub struct Fingering<A, C, L, const N: usize = MAX_QUEUE_SIZE>
where
    A: Actuator,
    C: Calibration,
    L: LiftActuator,
{
    slider: Slider<A, C>,
    rack: RackMotor<L>,
    jobs: JobQueue<FingerJob, N>,
    scheduler: SchedulerConfig,
}

impl<A, C, L> Fingering<A, C, L, MAX_QUEUE_SIZE>
where
    A: Actuator,
    A::Error: fmt::Debug,
    C: Calibration,
    L: LiftActuator,
    L::Error: fmt::Debug,
{
    /// Create a rig with the default queue size.
    pub fn new(slider: Slider<A, C>, rack: RackMotor<L>, scheduler: SchedulerConfig) -> Self {
        Self::with_queue(slider, rack, JobQueue::new(), scheduler)
    }
}

impl<A, L> Fingering<A, InstantCalibration, L, MAX_QUEUE_SIZE>
where
    A: Actuator,
    A::Error: fmt::Debug,
    L: LiftActuator,
    L::Error: fmt::Debug,
{
    /// Create a rig from a complete [`Config`](crate::Config), without a
    /// home sensor.
    pub fn from_config(actuator: A, lift: L, config: &crate::Config) -> Self {
        Self::new(
            Slider::new(actuator, config.slider),
            RackMotor::new(lift, config.rack),
            config.scheduler,
        )
    }
}

impl<A, C, L, const N: usize> Fingering<A, C, L, N>
where
    A: Actuator,
    A::Error: fmt::Debug,
    C: Calibration,
    L: LiftActuator,
    L::Error: fmt::Debug,
{
    /// Create a rig around an existing queue.
    pub fn with_queue(
        slider: Slider<A, C>,
        rack: RackMotor<L>,
        jobs: JobQueue<FingerJob, N>,
        scheduler: SchedulerConfig,
    ) -> Self {
        Self {
            slider,
            rack,
            jobs,
            scheduler,
        }
    }

    /// One-time hardware configuration for slider and rack.
    pub fn setup(&mut self) -> Result<(), RigError<A, L>> {
        self.slider.setup().map_err(FingerError::Slider)?;
        self.rack.setup().map_err(FingerError::Rack)?;
        log::info!(
            "rig ready: queue holds {} jobs, gate {:?}, drain {:?}",
            self.jobs.capacity(),
            self.scheduler.job_gate,
            self.scheduler.drain_policy
        );
        Ok(())
    }

    /// Start slider calibration.
    pub fn calibrate(&mut self, now_ms: u64) -> Result<CalibrationState, RigError<A, L>> {
        self.slider.calibrate(now_ms).map_err(FingerError::Slider)
    }

    /// Place the finger `distance_mm` further along. See [`move_finger`].
    pub fn move_finger(
        &mut self,
        distance_mm: i32,
        now_ms: u64,
    ) -> Result<FingerOutcome, RigError<A, L>> {
        move_finger(
            &mut self.slider,
            &mut self.rack,
            &mut self.jobs,
            distance_mm,
            now_ms,
        )
    }

    /// Schedule a job for a later tick.
    pub fn enqueue(&mut self, job: FingerJob) -> Result<(), QueueFull<FingerJob>> {
        self.jobs.enqueue(job)
    }

    /// Run a job now, bypassing the queue and the gate.
    pub fn run_job(&mut self, job: FingerJob, now_ms: u64) -> Result<(), RigError<A, L>> {
        execute(job, &mut self.slider, &mut self.rack, now_ms)
    }

    /// Advance the rig. Call once per control loop tick.
    ///
    /// Updates the slider, then drains the queue according to the gate
    /// and drain policy. Job failures are logged and counted, not returned.
    pub fn tick(&mut self, now_ms: u64) -> Result<TickReport, RigError<A, L>> {
        let movement_finished = self.slider.update(now_ms).map_err(FingerError::Slider)?;

        let mut runner = RigRunner {
            slider: &mut self.slider,
            rack: &mut self.rack,
            gate: self.scheduler.job_gate,
            now_ms,
        };
        let drain = self
            .jobs
            .drain(&mut runner, self.scheduler.drain_policy);

        Ok(TickReport {
            movement_finished,
            jobs_run: drain.ran,
            jobs_failed: drain.failed,
            held: drain.held,
        })
    }

    /// Nothing moving, calibrating, or pending.
    pub fn is_idle(&self) -> bool {
        self.slider.is_movement_complete() && !self.slider.is_calibrating() && self.jobs.is_empty()
    }

    /// The slider.
    pub fn slider(&self) -> &Slider<A, C> {
        &self.slider
    }

    /// The slider, mutably.
    pub fn slider_mut(&mut self) -> &mut Slider<A, C> {
        &mut self.slider
    }

    /// The rack.
    pub fn rack(&self) -> &RackMotor<L> {
        &self.rack
    }

    /// The rack, mutably.
    pub fn rack_mut(&mut self) -> &mut RackMotor<L> {
        &mut self.rack
    }

    /// Pending jobs.
    pub fn jobs(&self) -> &JobQueue<FingerJob, N> {
        &self.jobs
    }

    /// Scheduling configuration.
    pub fn scheduler(&self) -> &SchedulerConfig {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RackConfig, SliderConfig};
    use crate::hal::{MockActuator, MockLift};
    use crate::jobs::DrainPolicy;
    use crate::rack::RackPosition;

    type MockRig<const N: usize> = Fingering<MockActuator, InstantCalibration, MockLift, N>;

    fn parts() -> (Slider<MockActuator>, RackMotor<MockLift>) {
        let mut slider = Slider::new(MockActuator::new(), SliderConfig::default());
        slider.calibrate(0).unwrap();
        let rack = RackMotor::new(MockLift::new(), RackConfig::default());
        (slider, rack)
    }

    fn rig(scheduler: SchedulerConfig) -> MockRig<MAX_QUEUE_SIZE> {
        let (slider, rack) = parts();
        Fingering::new(slider, rack, scheduler)
    }

    // =========================================================================
    // move_finger
    // =========================================================================

    #[test]
    fn negative_distance_only_raises_rack() {
        let (mut slider, mut rack) = parts();
        let mut jobs: JobQueue<FingerJob, 8> = JobQueue::new();

        let outcome = move_finger(&mut slider, &mut rack, &mut jobs, -5, 0).unwrap();

        assert_eq!(outcome, FingerOutcome::Skipped);
        assert_eq!(rack.lift().raise_count, 1);
        assert_eq!(rack.position(), RackPosition::Up);
        assert_eq!(slider.device().actuator().start_count, 0);
        assert!(slider.is_movement_complete());
        assert!(jobs.is_empty());
    }

    #[test]
    fn positive_distance_moves_and_schedules_retract() {
        let (mut slider, mut rack) = parts();
        let mut jobs: JobQueue<FingerJob, 8> = JobQueue::new();

        let outcome = move_finger(&mut slider, &mut rack, &mut jobs, 15, 0).unwrap();

        assert_eq!(
            outcome,
            FingerOutcome::Dispatched {
                movement: MoveOutcome::Started {
                    travel_mm: 15,
                    duration_ms: 150
                },
                retract_scheduled: true,
            }
        );
        assert!(rack.is_up());
        assert!(!slider.is_movement_complete());
        assert_eq!(jobs.peek(), Some(&FingerJob::RetractRack));
    }

    #[test]
    fn zero_distance_still_schedules_retract() {
        let (mut slider, mut rack) = parts();
        let mut jobs: JobQueue<FingerJob, 8> = JobQueue::new();

        let outcome = move_finger(&mut slider, &mut rack, &mut jobs, 0, 0).unwrap();

        assert_eq!(
            outcome,
            FingerOutcome::Dispatched {
                movement: MoveOutcome::AlreadyThere,
                retract_scheduled: true,
            }
        );
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn full_queue_keeps_move() {
        let (mut slider, mut rack) = parts();
        let mut jobs: JobQueue<FingerJob, 2> = JobQueue::new();
        jobs.enqueue(FingerJob::RaiseRack).unwrap();

        let outcome = move_finger(&mut slider, &mut rack, &mut jobs, 10, 0).unwrap();

        assert!(matches!(
            outcome,
            FingerOutcome::Dispatched {
                retract_scheduled: false,
                ..
            }
        ));
        assert!(!slider.is_movement_complete());
        assert_eq!(jobs.dropped_count(), 1);
    }

    #[test]
    fn refused_move_schedules_nothing() {
        let (mut slider, mut rack) = parts();
        let mut jobs: JobQueue<FingerJob, 8> = JobQueue::new();

        let err = move_finger(&mut slider, &mut rack, &mut jobs, 500, 0).unwrap_err();

        assert!(matches!(
            err,
            FingerError::Slider(DeviceError::OutOfRange { .. })
        ));
        assert!(rack.is_up());
        assert!(jobs.is_empty());
    }

    #[test]
    fn rack_failure_stops_before_slider() {
        let (mut slider, mut rack) = parts();
        rack.lift_mut().fail = true;
        let mut jobs: JobQueue<FingerJob, 8> = JobQueue::new();

        let err = move_finger(&mut slider, &mut rack, &mut jobs, 10, 0).unwrap_err();

        assert_eq!(err, FingerError::Rack(()));
        assert_eq!(slider.device().actuator().start_count, 0);
    }

    // =========================================================================
    // Tick and Gate
    // =========================================================================

    #[test]
    fn gate_holds_retract_until_slider_stops() {
        let mut rig = rig(SchedulerConfig::default());
        rig.move_finger(30, 0).unwrap();

        for t in (10..300).step_by(10) {
            let report = rig.tick(t).unwrap();
            assert!(report.held);
            assert_eq!(report.jobs_run, 0);
            assert!(rig.rack().is_up());
        }

        let report = rig.tick(300).unwrap();
        assert!(report.movement_finished);
        assert_eq!(report.jobs_run, 1);
        assert_eq!(rig.rack().position(), RackPosition::Down);
        assert!(rig.is_idle());
    }

    #[test]
    fn immediate_gate_retracts_next_tick() {
        let mut rig = rig(SchedulerConfig::default().with_job_gate(JobGate::Immediate));
        rig.move_finger(30, 0).unwrap();

        let report = rig.tick(10).unwrap();
        assert_eq!(report.jobs_run, 1);
        assert_eq!(rig.rack().position(), RackPosition::Down);
        assert!(!rig.slider().is_movement_complete());
    }

    #[test]
    fn drain_one_runs_a_job_per_tick() {
        let mut rig = rig(SchedulerConfig::default());
        rig.enqueue(FingerJob::RaiseRack).unwrap();
        rig.enqueue(FingerJob::RetractRack).unwrap();

        assert_eq!(rig.tick(0).unwrap().jobs_run, 1);
        assert!(rig.rack().is_up());
        assert_eq!(rig.tick(10).unwrap().jobs_run, 1);
        assert_eq!(rig.rack().position(), RackPosition::Down);
    }

    #[test]
    fn drain_all_stops_at_a_new_movement() {
        let mut rig = rig(SchedulerConfig::default().with_drain_policy(DrainPolicy::All));
        rig.enqueue(FingerJob::RaiseRack).unwrap();
        rig.enqueue(FingerJob::MoveSlider { distance_mm: 10 }).unwrap();
        rig.enqueue(FingerJob::RetractRack).unwrap();

        let report = rig.tick(0).unwrap();
        assert_eq!(report.jobs_run, 2);
        assert!(report.held);
        assert!(rig.rack().is_up());

        let report = rig.tick(100).unwrap();
        assert!(report.movement_finished);
        assert_eq!(report.jobs_run, 1);
        assert_eq!(rig.rack().position(), RackPosition::Down);
        assert_eq!(rig.slider().current_position(), 10);
    }

    #[test]
    fn failed_job_is_counted_not_returned() {
        let mut rig = rig(SchedulerConfig::default());
        rig.enqueue(FingerJob::MoveSlider { distance_mm: -1 }).unwrap();

        let report = rig.tick(0).unwrap();
        assert_eq!(report.jobs_failed, 1);
        assert!(rig.jobs().is_empty());
    }

    #[test]
    fn calibrate_job_rezeroes() {
        let mut rig = rig(SchedulerConfig::default());
        rig.run_job(FingerJob::MoveSlider { distance_mm: 40 }, 0)
            .unwrap();
        rig.tick(400).unwrap();
        assert_eq!(rig.slider().current_position(), 40);

        rig.enqueue(FingerJob::CalibrateSlider).unwrap();
        rig.tick(410).unwrap();
        assert_eq!(rig.slider().current_position(), 0);
        assert!(rig.slider().is_calibrated());
    }

    #[test]
    fn finger_error_display() {
        let err: FingerError<(), ()> = FingerError::Slider(DeviceError::Busy);
        assert_eq!(format!("{}", err), "slider: movement already in progress");
        let err: FingerError<(), ()> = FingerError::Rack(());
        assert_eq!(format!("{}", err), "rack output error: ()");
    }
}
