// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer velocity estimation for flings.
//!
//! [`VelocityTracker`] keeps the last [`HISTORY_SIZE`] samples in a ring and estimates velocity
//! with the impulse strategy: each segment's velocity is treated as an impulse on a unit mass
//! and the accumulated kinetic energy is converted back into a velocity. Only samples within
//! [`HORIZON_MS`] of the newest one count, and a gap longer than [`STOPPED_GAP_MS`] between
//! two samples means the pointer stopped there.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};

/// Samples kept per tracker.
pub const HISTORY_SIZE: usize = 20;

/// Samples older than this (relative to the newest) are ignored.
pub const HORIZON_MS: u64 = 100;

/// A gap longer than this between samples means the pointer had stopped.
pub const STOPPED_GAP_MS: u64 = 40;

#[derive(Copy, Clone, Debug, PartialEq)]
struct Sample {
    time: u64,
    position: Point,
}

/// Estimates the velocity of one pointer from its recent positions.
///
/// ```
/// use kurbo::{Point, Vec2};
/// use understory_event_state::velocity::VelocityTracker;
///
/// let mut tracker = VelocityTracker::new();
/// for i in 0..5_u32 {
///     tracker.add_position(u64::from(i) * 10, Point::new(f64::from(i) * 10.0, 0.0));
/// }
/// let v = tracker.velocity();
/// assert!((v.x - 1000.0).abs() < 1e-6, "10px every 10ms is 1000px/s, got {v:?}");
/// assert_eq!(v.y, 0.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct VelocityTracker {
    samples: [Option<Sample>; HISTORY_SIZE],
    index: usize,
}

impl VelocityTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker seeded with one sample.
    pub fn starting_at(time: u64, position: Point) -> Self {
        let mut tracker = Self::new();
        tracker.add_position(time, position);
        tracker
    }

    /// Record where the pointer was at `time`.
    pub fn add_position(&mut self, time: u64, position: Point) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(Sample { time, position });
    }

    /// Forget every sample.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Estimated velocity in pixels per second, or zero with fewer than two usable samples.
    pub fn velocity(&self) -> Vec2 {
        // Newest first: (age in ms as a negative offset, position).
        let mut recent: [(f64, Point); HISTORY_SIZE] = [(0.0, Point::ZERO); HISTORY_SIZE];
        let mut count = 0;
        let Some(newest) = self.samples[self.index] else {
            return Vec2::ZERO;
        };
        let mut previous = newest;
        let mut index = self.index;
        while count < HISTORY_SIZE {
            let Some(sample) = self.samples[index] else {
                break;
            };
            let age = newest.time.saturating_sub(sample.time);
            let gap = previous.time.abs_diff(sample.time);
            previous = sample;
            if age > HORIZON_MS || gap > STOPPED_GAP_MS {
                break;
            }
            recent[count] = (-ms_as_f64(age), sample.position);
            count += 1;
            index = index.checked_sub(1).unwrap_or(HISTORY_SIZE - 1);
        }
        if count < 2 {
            return Vec2::ZERO;
        }
        let recent = &recent[..count];
        let vx = impulse_velocity(recent.iter().map(|&(t, p)| (t, p.x)));
        let vy = impulse_velocity(recent.iter().map(|&(t, p)| (t, p.y)));
        Vec2::new(vx, vy) * 1000.0
    }
}

/// Impulse estimate along one axis, in units per millisecond.
///
/// `samples` are newest first as `(time, value)` with non-positive times.
fn impulse_velocity(samples: impl DoubleEndedIterator<Item = (f64, f64)> + ExactSizeIterator) -> f64 {
    let n = samples.len();
    if n == 2 {
        let mut it = samples;
        let (Some((t0, x0)), Some((t1, x1))) = (it.next(), it.next()) else {
            return 0.0;
        };
        if t0 == t1 {
            return 0.0;
        }
        return (x0 - x1) / (t0 - t1);
    }
    let mut work = 0.0;
    // Oldest to newest.
    let mut oldest_first = samples.rev();
    let Some(mut older) = oldest_first.next() else {
        return 0.0;
    };
    for (step, newer) in oldest_first.enumerate() {
        let (t_old, x_old) = older;
        let (t_new, x_new) = newer;
        older = newer;
        if t_new == t_old {
            continue;
        }
        let v_prev = kinetic_energy_to_velocity(work);
        let v_curr = (x_new - x_old) / (t_new - t_old);
        work += (v_curr - v_prev) * v_curr.abs();
        if step == 0 {
            work *= 0.5;
        }
    }
    kinetic_energy_to_velocity(work)
}

fn kinetic_energy_to_velocity(energy: f64) -> f64 {
    if energy == 0.0 {
        return 0.0;
    }
    energy.signum() * (2.0 * energy.abs()).sqrt()
}

#[allow(
    clippy::cast_precision_loss,
    reason = "ages are bounded by the horizon"
)]
fn ms_as_f64(ms: u64) -> f64 {
    ms as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_single_sample_are_still() {
        assert_eq!(VelocityTracker::new().velocity(), Vec2::ZERO);
        assert_eq!(
            VelocityTracker::starting_at(5, Point::new(3.0, 3.0)).velocity(),
            Vec2::ZERO
        );
    }

    #[test]
    fn two_samples_are_a_plain_slope() {
        let mut t = VelocityTracker::starting_at(0, Point::ZERO);
        t.add_position(20, Point::new(10.0, -20.0));
        assert_eq!(t.velocity(), Vec2::new(500.0, -1000.0));
    }

    #[test]
    fn long_pause_means_stopped() {
        let mut t = VelocityTracker::starting_at(0, Point::ZERO);
        t.add_position(10, Point::new(10.0, 0.0));
        t.add_position(60, Point::new(10.0, 0.0));
        assert_eq!(t.velocity(), Vec2::ZERO);
    }

    #[test]
    fn samples_beyond_horizon_are_ignored() {
        let mut t = VelocityTracker::new();
        // Fast early motion, then slow motion within the last 100ms.
        t.add_position(0, Point::ZERO);
        t.add_position(30, Point::new(300.0, 0.0));
        for i in 1..=5_u32 {
            t.add_position(30 + u64::from(i) * 30, Point::new(300.0 + f64::from(i) * 3.0, 0.0));
        }
        let v = t.velocity();
        assert!((v.x - 100.0).abs() < 1e-6, "expected 100px/s, got {v:?}");
    }

    #[test]
    fn ring_wraps_past_history_size() {
        let mut t = VelocityTracker::new();
        for i in 0..40_u32 {
            t.add_position(u64::from(i) * 4, Point::new(0.0, f64::from(i) * 2.0));
        }
        let v = t.velocity();
        assert!((v.y - 500.0).abs() < 1e-6, "expected 500px/s, got {v:?}");
    }

    #[test]
    fn reset_forgets_samples() {
        let mut t = VelocityTracker::starting_at(0, Point::ZERO);
        t.add_position(10, Point::new(5.0, 0.0));
        t.reset();
        assert_eq!(t.velocity(), Vec2::ZERO);
    }
}
