//! Cycle timing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Keeps a fixed cycle period by sleeping until absolute deadlines, so a long cycle is followed
/// by a shorter sleep rather than drifting the whole schedule.
#[derive(Debug, Clone)]
pub struct CycleTimer {
    period: Duration,
    next_deadline: Instant,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    /// The cycle finished before its deadline.
    OnTime,

    /// The cycle missed its deadline by the given amount. The schedule restarts from now.
    Overrun(Duration),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleTimer {
    /// Start a timer whose first deadline is one period from now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: Instant::now() + period,
        }
    }

    /// Change the period, taking effect after the current deadline.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until the end of the current cycle.
    pub fn wait(&mut self) -> CycleStatus {
        let (sleep, next_deadline, status) = plan(self.next_deadline, Instant::now(), self.period);

        if let Some(d) = sleep {
            thread::sleep(d);
        }
        self.next_deadline = next_deadline;

        status
    }
}

/// Work out how long to sleep at `now` for a cycle ending at `deadline`, and when the next cycle
/// ends.
pub fn plan(
    deadline: Instant,
    now: Instant,
    period: Duration,
) -> (Option<Duration>, Instant, CycleStatus) {
    match deadline.checked_duration_since(now) {
        Some(sleep) => (Some(sleep), deadline + period, CycleStatus::OnTime),
        None => (
            None,
            now + period,
            CycleStatus::Overrun(now.duration_since(deadline)),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(10);

    #[test]
    fn test_on_time() {
        let start = Instant::now();
        let deadline = start + PERIOD;

        // A 3 ms cycle sleeps for the remaining 7 ms, next deadline is a whole period later
        let (sleep, next, status) = plan(deadline, start + Duration::from_millis(3), PERIOD);
        assert_eq!(status, CycleStatus::OnTime);
        assert_eq!(sleep, Some(Duration::from_millis(7)));
        assert_eq!(next, deadline + PERIOD);

        // A long cycle sleeps for less to keep the cadence
        let (sleep, next, _) = plan(next, start + Duration::from_millis(19), PERIOD);
        assert_eq!(sleep, Some(Duration::from_millis(1)));
        assert_eq!(next, start + Duration::from_millis(30));
    }

    #[test]
    fn test_overrun() {
        let start = Instant::now();
        let deadline = start + PERIOD;
        let now = start + Duration::from_millis(14);

        let (sleep, next, status) = plan(deadline, now, PERIOD);
        assert_eq!(sleep, None);
        assert_eq!(status, CycleStatus::Overrun(Duration::from_millis(4)));
        assert_eq!(next, now + PERIOD);
    }

    #[test]
    fn test_wait() {
        let mut timer = CycleTimer::new(Duration::from_millis(1));
        timer.set_period(Duration::from_millis(2));
        assert_eq!(timer.period(), Duration::from_millis(2));

        let before = Instant::now();
        timer.wait();
        timer.wait();
        assert!(before.elapsed() >= Duration::from_millis(2));
    }
}
