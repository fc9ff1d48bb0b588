use crate::{Duration, Instant, component::StepData};

use super::MonotonicClock;

/// Samples the monotonic clock once per tick, producing the delta and
/// cumulative run time consumed by debounce timers and timestamps.
pub struct TimeBase<C> {
    clock: C,
    last: Instant,
    count: u32,
}

impl<C: MonotonicClock> TimeBase<C> {
    pub fn new(clock: C) -> Self {
        let last = clock.now();
        TimeBase {
            clock,
            last,
            count: 0,
        }
    }

    pub fn tick(&mut self) -> StepData {
        let now = self.clock.now();
        let step = StepData {
            step_time: now,
            step_interval: Duration(now.0 - self.last.0),
            step_count: self.count,
        };
        self.last = now;
        self.count = self.count.wrapping_add(1);
        step
    }
}
