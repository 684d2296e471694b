//! Cooperative interval scheduler.
//!
//! The host polls with the current time; each interval reports the instants at
//! which its periods fell due since the last poll. Intervals live exactly as long
//! as their [`IntervalGuard`].

use chrono::{Duration, NaiveDateTime};
use log::debug;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

#[derive(Debug)]
struct IntervalState {
    period: Duration,
    next_due: NaiveDateTime,
}

#[derive(Debug, Default)]
struct SchedulerState {
    next_id: u64,
    intervals: BTreeMap<u64, IntervalState>,
}

/// Single-threaded interval registry. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an interval whose first period ends at `now + period`.
    ///
    /// Non-positive periods are clamped to one second.
    pub fn start_interval(&self, period: Duration, now: NaiveDateTime) -> IntervalGuard {
        let period = if period <= Duration::zero() {
            Duration::seconds(1)
        } else {
            period
        };
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.intervals.insert(
            id,
            IntervalState {
                period,
                next_due: now + period,
            },
        );
        debug!("event=interval_start module=timer status=ok interval_id={id}");
        IntervalGuard {
            id,
            scheduler: Rc::downgrade(&self.state),
        }
    }

    pub fn active_intervals(&self) -> usize {
        self.state.borrow().intervals.len()
    }
}

/// Handle to a live interval; dropping it cancels the interval.
#[derive(Debug)]
pub struct IntervalGuard {
    id: u64,
    scheduler: Weak<RefCell<SchedulerState>>,
}

impl IntervalGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Instants at which a period ended, at or before `now`, since the last
    /// call. Empty once the scheduler is gone.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<NaiveDateTime> {
        let Some(state) = self.scheduler.upgrade() else {
            return Vec::new();
        };
        let mut state = state.borrow_mut();
        let Some(interval) = state.intervals.get_mut(&self.id) else {
            return Vec::new();
        };
        let mut due = Vec::new();
        while interval.next_due <= now {
            due.push(interval.next_due);
            interval.next_due += interval.period;
        }
        due
    }
}

impl Drop for IntervalGuard {
    fn drop(&mut self) {
        if let Some(state) = self.scheduler.upgrade() {
            if state.borrow_mut().intervals.remove(&self.id).is_some() {
                debug!(
                    "event=interval_stop module=timer status=ok interval_id={}",
                    self.id
                );
            }
        }
    }
}
