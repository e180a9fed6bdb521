// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Recurring timer driven by the UI loop: the loop asks whether it is due and how long to sleep.

use std::time::{Duration, Instant};

/// Default interval between tracking-status checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct RecurringTimer {
    interval: Duration,
    next: Instant,
    cancelled: bool,
}

impl RecurringTimer {
    /// First tick is one `interval` after `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        RecurringTimer {
            interval,
            next: now + interval,
            cancelled: false,
        }
    }

    /// True once per elapsed interval. Missed ticks are not replayed; the next tick is scheduled
    /// one interval after `now`.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if self.cancelled || now < self.next {
            return false;
        }
        self.next = now + self.interval;
        true
    }

    /// Time until the next tick, or `None` once cancelled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.cancelled {
            None
        } else {
            Some(self.next.saturating_duration_since(now))
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
