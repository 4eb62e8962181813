// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual event clock.

use crate::error::InjectError;

/// Millisecond clock that only moves when told to.
///
/// Every synthesized event is stamped with [`EventClock::now`] at the moment it is enqueued,
/// never with the time it is eventually delivered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EventClock {
    now: u64,
}

impl EventClock {
    /// A clock reading `start` milliseconds.
    pub const fn starting_at(start: u64) -> Self {
        Self { now: start }
    }

    /// Current reading.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Validate a duration for [`EventClock::advance`] without applying it.
    pub fn check(duration: i64) -> Result<u64, InjectError> {
        u64::try_from(duration).map_err(|_| InjectError::NegativeDuration(duration))
    }

    /// Move the clock forward by `duration` milliseconds and return the new reading.
    ///
    /// A zero duration is valid and leaves the reading unchanged.
    ///
    /// ```
    /// use understory_inject::clock::EventClock;
    ///
    /// let mut clock = EventClock::default();
    /// assert_eq!(clock.advance(23), Ok(23));
    /// assert_eq!(clock.advance(0), Ok(23));
    /// assert!(clock.advance(-1).is_err());
    /// assert_eq!(clock.now(), 23);
    /// ```
    pub fn advance(&mut self, duration: i64) -> Result<u64, InjectError> {
        let delta = Self::check(duration)?;
        self.now = self.now.saturating_add(delta);
        Ok(self.now)
    }

    /// Jump forward to `time`. Never moves backwards.
    pub(crate) fn advance_to(&mut self, time: u64) {
        debug_assert!(time >= self.now, "clock moved backwards: {} -> {time}", self.now);
        self.now = self.now.max(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_duration_is_rejected_without_moving() {
        let mut clock = EventClock::starting_at(100);
        assert_eq!(clock.advance(-5), Err(InjectError::NegativeDuration(-5)));
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn advances_accumulate() {
        let mut clock = EventClock::default();
        clock.advance(23).unwrap();
        clock.advance(47).unwrap();
        assert_eq!(clock.now(), 70);
    }

    #[test]
    fn advance_to_never_goes_back() {
        let mut clock = EventClock::starting_at(10);
        clock.advance_to(15);
        assert_eq!(clock.now(), 15);
    }
}
