//! RAII phase timing for enforcement.

use std::time::{Duration, Instant};

/// Charges the wall time of one role's fetch or evaluation to a phase total.
///
/// `enforce` keeps two totals, one for cache fetches and one for statement
/// evaluation, and opens a fresh timer for each role in each phase. The
/// totals therefore hold the sum over every role visited before the loop
/// stopped, and feed `EnforcePhases::fetch_ms` and `evaluate_ms`. Time is
/// added on drop, so a failed fetch is charged as well.
pub(crate) struct PhaseTimer<'a> {
    started: Instant,
    total: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub(crate) fn new(total: &'a mut Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.total += self.started.elapsed();
    }
}

pub(crate) fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
