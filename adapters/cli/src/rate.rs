//! Fixed-rate pacing for the tick loop.

use std::thread;
use std::time::{Duration, Instant};

/// Paces a loop at a fixed number of ticks per second.
pub(crate) struct TickRate {
    interval: Duration,
    next: Instant,
}

impl TickRate {
    /// Creates a pacer, or `None` when the rate is zero (uncapped).
    pub(crate) fn new(ticks_per_second: u32) -> Option<Self> {
        if ticks_per_second == 0 {
            return None;
        }
        let interval = Duration::from_secs(1) / ticks_per_second;
        Some(Self {
            interval,
            next: Instant::now() + interval,
        })
    }

    /// Sleeps until the next tick deadline, then advances it. A loop that
    /// fell behind proceeds immediately and re-anchors the deadline.
    pub(crate) fn wait(&mut self) {
        let now = Instant::now();
        if now < self.next {
            thread::sleep(self.next - now);
            self.next += self.interval;
        } else {
            self.next = now + self.interval;
        }
    }
}
