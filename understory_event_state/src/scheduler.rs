// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative single-threaded timers with cancellable handles.
//!
//! A [`TaskScope`] owns a virtual clock and a set of pending deadlines. Nothing runs on its
//! own: the owner calls [`TaskScope::advance_to`] and routes each returned [`TimerHandle`] to
//! whoever scheduled it. Handles are generational, so a handle that already fired or was
//! cancelled can never match a newer task that reused its slot.
//!
//! ```
//! use understory_event_state::scheduler::TaskScope;
//!
//! let mut scope = TaskScope::new();
//! let a = scope.schedule(100);
//! let b = scope.schedule(50);
//!
//! assert!(scope.advance_to(60).unwrap().as_slice() == [b]);
//! assert!(scope.cancel(a));
//! assert!(!scope.cancel(a), "second cancel is a no-op");
//! assert!(!scope.cancel(b), "cancelling a fired task is a no-op");
//! assert!(scope.advance_to(200).unwrap().is_empty());
//! ```

use smallvec::SmallVec;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle of a task scheduled on a [`TaskScope`].
    pub struct TimerHandle;
}

/// Errors reported by [`TaskScope`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ScheduleError {
    /// The clock was asked to move backwards.
    #[error("cannot move the timer clock back from {now} to {requested}")]
    TimeWentBackwards {
        /// Current time.
        now: u64,
        /// Requested time.
        requested: u64,
    },
}

/// Timers that fired in one [`TaskScope::advance_to`] call, earliest deadline first.
pub type FiredTimers = SmallVec<[TimerHandle; 4]>;

/// A single-threaded scope of delayed tasks over a virtual millisecond clock.
#[derive(Clone, Debug, Default)]
pub struct TaskScope {
    now: u64,
    deadlines: SlotMap<TimerHandle, u64>,
}

impl TaskScope {
    /// An empty scope at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scope whose clock starts at `now`.
    pub fn starting_at(now: u64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Current time.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule a task `delay` milliseconds from now.
    pub fn schedule(&mut self, delay: u64) -> TimerHandle {
        let deadline = self.now.saturating_add(delay);
        let handle = self.deadlines.insert(deadline);
        log::trace!("scheduled {handle:?} for t={deadline}");
        handle
    }

    /// Cancel a pending task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let cancelled = self.deadlines.remove(handle).is_some();
        if cancelled {
            log::trace!("cancelled {handle:?}");
        }
        cancelled
    }

    /// Whether `handle` is still waiting to fire.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(handle)
    }

    /// Number of pending tasks.
    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.deadlines.values().copied().min()
    }

    /// Move the clock to `now` and return every task whose deadline is at or before it.
    ///
    /// Fired tasks are removed before they are returned.
    pub fn advance_to(&mut self, now: u64) -> Result<FiredTimers, ScheduleError> {
        if now < self.now {
            return Err(ScheduleError::TimeWentBackwards {
                now: self.now,
                requested: now,
            });
        }
        self.now = now;
        let mut due: SmallVec<[(u64, TimerHandle); 4]> = self
            .deadlines
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(handle, &deadline)| (deadline, handle))
            .collect();
        due.sort_by_key(|&(deadline, _)| deadline);
        Ok(due
            .into_iter()
            .map(|(_, handle)| {
                self.deadlines.remove(handle);
                handle
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_at_deadline_inclusive() {
        let mut scope = TaskScope::starting_at(1000);
        let h = scope.schedule(500);
        assert_eq!(scope.next_deadline(), Some(1500));
        assert!(scope.advance_to(1499).unwrap().is_empty());
        assert!(scope.is_pending(h));
        assert_eq!(scope.advance_to(1500).unwrap().as_slice(), [h]);
        assert!(!scope.is_pending(h));
        assert_eq!(scope.pending(), 0);
    }

    #[test]
    fn fired_in_deadline_order() {
        let mut scope = TaskScope::new();
        let late = scope.schedule(30);
        let early = scope.schedule(10);
        let mid = scope.schedule(20);
        assert_eq!(scope.advance_to(100).unwrap().as_slice(), [early, mid, late]);
    }

    #[test]
    fn stale_handle_does_not_touch_reused_slot() {
        let mut scope = TaskScope::new();
        let old = scope.schedule(10);
        assert!(scope.cancel(old));
        let new = scope.schedule(10);
        assert_ne!(old, new);
        assert!(!scope.cancel(old));
        assert!(scope.is_pending(new));
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut scope = TaskScope::starting_at(50);
        assert_eq!(
            scope.advance_to(49),
            Err(ScheduleError::TimeWentBackwards {
                now: 50,
                requested: 49
            })
        );
        assert_eq!(scope.now(), 50);
    }
}
