//! Monotonic millisecond clock for the control loop.

use crate::traits::Clock;

/// Milliseconds since boot from `esp_timer_get_time()`.
///
/// The control loop reads this once per tick and passes the value to
/// every `update` call, so all components see the same instant.
///
/// # Example
///
/// ```ignore
/// use rs_fingering::hal::esp32::Esp32Clock;
/// use rs_fingering::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let now = clock.now_ms();
/// rig.tick(now)?;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates the clock.
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Read-only access to the high resolution timer
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        micros.max(0) as u64 / 1000
    }
}
