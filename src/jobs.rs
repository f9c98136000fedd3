//! Fixed-capacity deferred job queue.
//!
//! Lets one action schedule another to run on a later tick of the same
//! cooperative loop, without blocking or recursion.
//!
//! # Capacity
//!
//! The queue is a ring buffer of `N` slots that always keeps one slot
//! free, so at most `N - 1` jobs are pending. Empty is `head == tail`,
//! full is `tail + 1 == head` (mod `N`).
//!
//! # Overflow
//!
//! A job offered to a full queue is dropped and logged. The job is handed
//! back inside [`QueueFull`] so callers that care can react.
//!
//! # Example
//!
//! ```rust
//! use rs_fingering::jobs::JobQueue;
//!
//! let mut queue: JobQueue<&str, 4> = JobQueue::new();
//! assert_eq!(queue.capacity(), 3);
//!
//! queue.enqueue("a").unwrap();
//! queue.enqueue("b").unwrap();
//! queue.enqueue("c").unwrap();
//! assert!(queue.enqueue("d").is_err()); // dropped
//!
//! assert_eq!(queue.dequeue(), Some("a"));
//! assert_eq!(queue.dequeue(), Some("b"));
//! assert_eq!(queue.dequeue(), Some("c"));
//! assert_eq!(queue.dequeue(), None); // empty sentinel
//! ```

use core::fmt;

use heapless::spsc::Queue;

/// Slot count used by the rig's job queue (holds one fewer job).
pub const MAX_QUEUE_SIZE: usize = 8;

/// A job was offered to a full queue and dropped.
///
/// Carries the dropped job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFull<J>(pub J);

impl<J> fmt::Display for QueueFull<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("job queue is full")
    }
}

/// How many jobs a drain pass may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DrainPolicy {
    /// At most one job per pass.
    #[default]
    One,
    /// Every pending job the runner is ready for.
    All,
}

/// Executes jobs taken off a [`JobQueue`].
pub trait JobRunner<J> {
    /// Error type for a failed job.
    type Error: fmt::Debug;

    /// Whether the next job may run now.
    ///
    /// Checked before every dequeue; returning `false` leaves the job in
    /// the queue for a later pass.
    fn ready(&self) -> bool {
        true
    }

    /// Run one job.
    fn run_job(&mut self, job: J) -> Result<(), Self::Error>;
}

/// Outcome of a drain pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Jobs that ran successfully.
    pub ran: usize,
    /// Jobs that ran and returned an error.
    pub failed: usize,
    /// A pending job was held back because the runner was not ready.
    pub held: bool,
}

impl DrainReport {
    /// Total jobs taken off the queue.
    pub fn total(&self) -> usize {
        self.ran + self.failed
    }
}

/// FIFO ring buffer of deferred jobs.
///
/// Single producer, single consumer, both on the control loop. Not
/// synchronized; confine it to one task.
pub struct JobQueue<J, const N: usize = MAX_QUEUE_SIZE> {
    queue: Queue<J, N>,
    dropped: u32,
}

impl<J, const N: usize> JobQueue<J, N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            dropped: 0,
        }
    }

    /// Append a job at the tail.
    ///
    /// When full the job is dropped, a warning is logged, and the job is
    /// returned in the error. Never blocks.
    pub fn enqueue(&mut self, job: J) -> Result<(), QueueFull<J>> {
        self.queue.enqueue(job).map_err(|job| {
            self.dropped = self.dropped.saturating_add(1);
            log::warn!(
                "job queue is full ({} pending), dropping job",
                self.queue.len()
            );
            QueueFull(job)
        })
    }

    /// Remove and return the head job, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<J> {
        let job = self.queue.dequeue();
        if job.is_none() {
            log::trace!("job queue is empty");
        }
        job
    }

    /// The head job, without removing it.
    pub fn peek(&self) -> Option<&J> {
        self.queue.peek()
    }

    /// Run pending jobs on `runner`.
    ///
    /// Stops when the queue is empty, when the runner is not ready, or
    /// after one job under [`DrainPolicy::One`]. A failing job is logged
    /// and counted; it does not stop the pass.
    pub fn drain<R: JobRunner<J>>(
        &mut self,
        runner: &mut R,
        policy: DrainPolicy,
    ) -> DrainReport {
        let mut report = DrainReport::default();

        while !self.queue.is_empty() {
            if !runner.ready() {
                report.held = true;
                break;
            }
            let Some(job) = self.queue.dequeue() else {
                break;
            };
            match runner.run_job(job) {
                Ok(()) => report.ran += 1,
                Err(e) => {
                    log::warn!("deferred job failed: {:?}", e);
                    report.failed += 1;
                }
            }
            if policy == DrainPolicy::One {
                break;
            }
        }

        report
    }

    /// Discard every pending job.
    pub fn clear(&mut self) {
        while self.queue.dequeue().is_some() {}
    }

    /// Number of pending jobs.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no jobs are pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns true if the next enqueue would be dropped.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Maximum pending jobs (`N - 1`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Jobs dropped on overflow since creation.
    #[inline]
    pub fn dropped_count(&self) -> u32 {
        self.dropped
    }
}

impl<J, const N: usize> Default for JobQueue<J, N> {
    fn default() -> Self {
        Self::new()
    }
}
