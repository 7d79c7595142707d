//! Recurring tick timer with explicit cancellation.
//!
//! At most one timer is armed at a time. Arming always cancels the previous
//! timer first, and every arm issues a fresh [`TimerToken`], so a tick can
//! always be traced to exactly one arm call.

use std::time::Duration;

/// Identifies one armed timer. Never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    token: TimerToken,
    interval: Duration,
    next_due: Duration,
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    issued: u64,
    armed: Option<Armed>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any armed timer and arm a new one whose first tick is due one
    /// `interval` after `now`.
    pub fn arm(&mut self, now: Duration, interval: Duration) -> TimerToken {
        self.cancel();
        self.issued += 1;
        let token = TimerToken(self.issued);
        let interval = interval.max(Duration::from_millis(1));
        self.armed = Some(Armed {
            token,
            interval,
            next_due: now + interval,
        });
        token
    }

    /// Cancel the armed timer, returning its token.
    pub fn cancel(&mut self) -> Option<TimerToken> {
        self.armed.take().map(|a| a.token)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time remaining until the next tick, zero if one is already due.
    pub fn until_due(&self, now: Duration) -> Option<Duration> {
        self.armed.map(|a| a.next_due.saturating_sub(now))
    }

    /// If a tick is due at `now`, consume it and return the armed token.
    ///
    /// Each call consumes at most one tick; callers loop to catch up after
    /// a long gap.
    pub fn take_due(&mut self, now: Duration) -> Option<TimerToken> {
        let armed = self.armed.as_mut()?;
        if now < armed.next_due {
            return None;
        }
        armed.next_due += armed.interval;
        Some(armed.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn ticks_once_per_interval() {
        let mut s = TickScheduler::new();
        let token = s.arm(ms(0), ms(100));
        assert_eq!(s.take_due(ms(99)), None);
        assert_eq!(s.take_due(ms(100)), Some(token));
        assert_eq!(s.take_due(ms(100)), None);
        assert_eq!(s.take_due(ms(200)), Some(token));
    }

    #[test]
    fn catches_up_one_tick_per_call() {
        let mut s = TickScheduler::new();
        s.arm(ms(0), ms(10));
        let mut count = 0;
        while s.take_due(ms(35)).is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn cancel_stops_ticks() {
        let mut s = TickScheduler::new();
        let token = s.arm(ms(0), ms(10));
        assert_eq!(s.cancel(), Some(token));
        assert!(!s.is_armed());
        assert_eq!(s.take_due(ms(1_000)), None);
        assert_eq!(s.cancel(), None);
    }

    #[test]
    fn rearm_replaces_timer_and_token() {
        let mut s = TickScheduler::new();
        let first = s.arm(ms(0), ms(1_000));
        let second = s.arm(ms(500), ms(50));
        assert_ne!(first, second);
        // New interval applies from the re-arm instant.
        assert_eq!(s.take_due(ms(549)), None);
        assert_eq!(s.take_due(ms(550)), Some(second));
        assert_eq!(s.cancel(), Some(second));
    }

    #[test]
    fn until_due_reports_remaining_time() {
        let mut s = TickScheduler::new();
        assert_eq!(s.until_due(ms(0)), None);
        s.arm(ms(0), ms(100));
        assert_eq!(s.until_due(ms(40)), Some(ms(60)));
        assert_eq!(s.until_due(ms(400)), Some(ms(0)));
    }

    #[test]
    fn zero_interval_is_raised_to_one_ms() {
        let mut s = TickScheduler::new();
        let token = s.arm(ms(0), ms(0));
        assert_eq!(s.until_due(ms(0)), Some(ms(1)));
        assert_eq!(s.take_due(ms(0)), None);
        assert_eq!(s.take_due(ms(1)), Some(token));
        assert_eq!(s.take_due(ms(1)), None);
    }
}
