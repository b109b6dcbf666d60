//! Session countdown and meditation check-in timers
//!
//! Both timers are plain state polled by the orchestrator's one-second tick.
//! Disarming is synchronous, so a disarmed timer has nothing left that could
//! fire later.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFire {
    /// The countdown reached zero on this tick
    CountdownExpired,
    /// The check-in interval elapsed on this tick
    CheckInDue,
}

/// Session-duration countdown, one decrement per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Decrement once. Returns true exactly when this tick reaches zero.
    fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}

/// Periodic check-in, fired when the elapsed time since the last baseline
/// reaches the threshold
#[derive(Debug, Clone, Copy)]
pub struct CheckInInterval {
    threshold: Duration,
    last_check_in: Instant,
}

impl CheckInInterval {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_check_in: now,
        }
    }

    pub fn last_check_in(&self) -> Instant {
        self.last_check_in
    }

    fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_check_in) >= self.threshold {
            self.last_check_in = now;
            return true;
        }
        false
    }
}

/// Owner of the countdown and the check-in interval
#[derive(Debug, Default)]
pub struct SessionTimer {
    countdown: Option<Countdown>,
    check_in: Option<CheckInInterval>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_countdown(&mut self, seconds: u32) {
        debug!("Countdown armed: {}s", seconds);
        self.countdown = Some(Countdown::new(seconds));
    }

    pub fn disarm_countdown(&mut self) {
        self.countdown = None;
    }

    /// Arm (or re-arm) the check-in interval with `now` as the baseline
    pub fn arm_check_in(&mut self, threshold: Duration, now: Instant) {
        debug!("Check-in armed: every {:?}", threshold);
        self.check_in = Some(CheckInInterval::new(threshold, now));
    }

    /// Move the check-in baseline to `now` without changing the threshold
    pub fn reset_check_in(&mut self, now: Instant) {
        if let Some(check_in) = &mut self.check_in {
            check_in.last_check_in = now;
        }
    }

    pub fn disarm_check_in(&mut self) {
        self.check_in = None;
    }

    pub fn disarm_all(&mut self) {
        self.countdown = None;
        self.check_in = None;
    }

    pub fn countdown_armed(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn check_in_armed(&self) -> bool {
        self.check_in.is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.countdown_armed() || self.check_in_armed()
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining())
    }

    pub fn last_check_in(&self) -> Option<Instant> {
        self.check_in.map(|c| c.last_check_in())
    }

    /// Advance both timers by one tick.
    ///
    /// Countdown expiry wins over a check-in due on the same tick: the
    /// countdown disarms itself and the check-in is not evaluated.
    pub fn tick(&mut self, now: Instant) -> Option<TimerFire> {
        if let Some(countdown) = &mut self.countdown {
            if countdown.tick() {
                self.countdown = None;
                return Some(TimerFire::CountdownExpired);
            }
        }

        match self.check_in.as_mut().map(|c| c.poll(now)) {
            Some(true) => Some(TimerFire::CheckInDue),
            _ => None,
        }
    }
}
