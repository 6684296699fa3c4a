//! Host clock

use vitrine_core::Clock;

use crate::timers::performance_now;

/// Milliseconds from `performance.now()`
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> u64 {
        whole_ms(performance_now())
    }
}

/// Truncate a high-resolution timestamp to whole milliseconds
pub(crate) fn whole_ms(timestamp: f64) -> u64 {
    if timestamp.is_finite() && timestamp > 0.0 {
        timestamp as u64
    } else {
        0
    }
}
