// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pass dispatcher: visit a filter chain once per pass in the right order.
//!
//! A chain is a slice of filters from outermost (ancestor) to innermost (descendant). Every
//! pointer event is dispatched as three passes:
//!
//! - [`Initial`](PointerEventPass::Initial): outermost → innermost.
//! - [`Main`](PointerEventPass::Main): innermost → outermost.
//! - [`Final`](PointerEventPass::Final): outermost → innermost.
//!
//! Filters share the same mutable change list, so consumption by one filter is visible to every
//! filter that runs after it.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Size};
//! use understory_event_state::filter::{FilterContext, GestureFilter};
//! use understory_event_state::pass::GestureDetector;
//! use understory_event_state::pointer::{PointerChange, PointerEventPass, PointerId};
//!
//! struct Probe(&'static str, Vec<(PointerEventPass, &'static str)>);
//! impl GestureFilter for Probe {
//!     fn on_pointer_event(
//!         &mut self,
//!         _: &mut FilterContext<'_>,
//!         _: &mut [PointerChange],
//!         pass: PointerEventPass,
//!     ) {
//!         self.1.push((pass, self.0));
//!     }
//!     fn on_cancel(&mut self, _: &mut FilterContext<'_>) {}
//! }
//!
//! let mut outer = Probe("outer", Vec::new());
//! let mut inner = Probe("inner", Vec::new());
//! let mut detector = GestureDetector::new(Size::new(100.0, 100.0));
//! let mut changes = [PointerChange::down(PointerId(0), 0, Point::new(5.0, 5.0))];
//! detector.dispatch(&mut [&mut outer, &mut inner], &mut changes).unwrap();
//!
//! use PointerEventPass::*;
//! assert_eq!(outer.1, [(Initial, "outer"), (Main, "outer"), (Final, "outer")]);
//! assert_eq!(inner.1, [(Initial, "inner"), (Main, "inner"), (Final, "inner")]);
//! ```

use kurbo::Size;

use crate::filter::{FilterContext, GestureFilter};
use crate::pointer::{PointerChange, PointerEventPass};
use crate::scheduler::{ScheduleError, TaskScope};

/// Run all three passes of one pointer event over `chain` (outermost first).
pub fn run_passes(
    chain: &mut [&mut dyn GestureFilter],
    cx: &mut FilterContext<'_>,
    changes: &mut [PointerChange],
) {
    for pass in PointerEventPass::ALL {
        run_pass(chain, cx, changes, pass);
    }
}

/// Run a single pass over `chain` (outermost first) in that pass's visiting order.
pub fn run_pass(
    chain: &mut [&mut dyn GestureFilter],
    cx: &mut FilterContext<'_>,
    changes: &mut [PointerChange],
    pass: PointerEventPass,
) {
    if pass.descendants_first() {
        for filter in chain.iter_mut().rev() {
            filter.on_pointer_event(cx, changes, pass);
        }
    } else {
        for filter in chain.iter_mut() {
            filter.on_pointer_event(cx, changes, pass);
        }
    }
}

/// Drives filter chains: owns the timer scope and the bounds the chain is attached to.
#[derive(Clone, Debug)]
pub struct GestureDetector {
    bounds: Size,
    timers: TaskScope,
}

impl GestureDetector {
    /// A detector over a region of `bounds`, with its clock at zero.
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            timers: TaskScope::new(),
        }
    }

    /// Bounds filters see.
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Change the bounds, e.g. after a layout pass.
    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    /// Current time of the timer clock.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// The timer scope.
    pub fn timers(&self) -> &TaskScope {
        &self.timers
    }

    /// Dispatch one pointer event.
    ///
    /// The clock first moves to the newest uptime among `changes`, firing any timers due by
    /// then, so a long press that expired before this event is reported before it. An empty
    /// change list only moves the clock.
    pub fn dispatch(
        &mut self,
        chain: &mut [&mut dyn GestureFilter],
        changes: &mut [PointerChange],
    ) -> Result<(), ScheduleError> {
        let now = changes
            .iter()
            .map(PointerChange::uptime)
            .max()
            .unwrap_or_else(|| self.timers.now());
        self.advance_time(chain, now)?;
        if changes.is_empty() {
            return Ok(());
        }
        let mut cx = FilterContext::new(self.bounds, &mut self.timers);
        run_passes(chain, &mut cx, changes);
        Ok(())
    }

    /// Move the clock to `now` and deliver every timer that comes due.
    ///
    /// Returns how many timers fired.
    pub fn advance_time(
        &mut self,
        chain: &mut [&mut dyn GestureFilter],
        now: u64,
    ) -> Result<usize, ScheduleError> {
        let fired = self.timers.advance_to(now)?;
        let mut cx = FilterContext::new(self.bounds, &mut self.timers);
        for &timer in &fired {
            for filter in chain.iter_mut() {
                filter.on_timer(&mut cx, timer);
            }
        }
        Ok(fired.len())
    }

    /// Cancel the gesture in every filter of `chain`.
    pub fn cancel(&mut self, chain: &mut [&mut dyn GestureFilter]) {
        log::debug!("cancelling gesture in {} filters", chain.len());
        let mut cx = FilterContext::new(self.bounds, &mut self.timers);
        for filter in chain.iter_mut() {
            filter.on_cancel(&mut cx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::PointerId;
    use crate::scheduler::TimerHandle;
    use alloc::vec::Vec;
    use kurbo::Point;

    /// Consumes every down change it sees during `pass`, and records what it saw.
    struct Blocker {
        pass: PointerEventPass,
        saw_down: Vec<(PointerEventPass, bool)>,
    }

    impl Blocker {
        fn new(pass: PointerEventPass) -> Self {
            Self {
                pass,
                saw_down: Vec::new(),
            }
        }
    }

    impl GestureFilter for Blocker {
        fn on_pointer_event(
            &mut self,
            _: &mut FilterContext<'_>,
            changes: &mut [PointerChange],
            pass: PointerEventPass,
        ) {
            self.saw_down
                .push((pass, changes.iter().all(PointerChange::changed_to_down)));
            if pass == self.pass {
                changes.iter_mut().for_each(PointerChange::consume_down_change);
            }
        }

        fn on_cancel(&mut self, _: &mut FilterContext<'_>) {}
    }

    #[test]
    fn initial_consumption_hides_down_from_descendants() {
        let mut outer = Blocker::new(PointerEventPass::Initial);
        let mut inner = Blocker::new(PointerEventPass::Final);
        let mut detector = GestureDetector::new(Size::new(50.0, 50.0));
        let mut changes = [PointerChange::down(PointerId(1), 0, Point::new(1.0, 1.0))];
        detector
            .dispatch(&mut [&mut outer, &mut inner], &mut changes)
            .unwrap();
        assert_eq!(outer.saw_down[0], (PointerEventPass::Initial, true));
        assert_eq!(inner.saw_down[0], (PointerEventPass::Initial, false));
    }

    #[test]
    fn main_consumption_hides_down_from_ancestors() {
        let mut outer = Blocker::new(PointerEventPass::Final);
        let mut inner = Blocker::new(PointerEventPass::Main);
        let mut detector = GestureDetector::new(Size::new(50.0, 50.0));
        let mut changes = [PointerChange::down(PointerId(1), 0, Point::new(1.0, 1.0))];
        detector
            .dispatch(&mut [&mut outer, &mut inner], &mut changes)
            .unwrap();
        assert_eq!(outer.saw_down[1], (PointerEventPass::Main, false));
        assert_eq!(inner.saw_down[1], (PointerEventPass::Main, true));
    }

    struct TimerProbe {
        handle: Option<TimerHandle>,
        fired_at: Vec<u64>,
    }

    impl GestureFilter for TimerProbe {
        fn on_pointer_event(
            &mut self,
            cx: &mut FilterContext<'_>,
            changes: &mut [PointerChange],
            _: PointerEventPass,
        ) {
            if self.handle.is_none() && changes.iter().any(PointerChange::changed_to_down) {
                self.handle = Some(cx.timers.schedule(100));
            }
        }

        fn on_cancel(&mut self, cx: &mut FilterContext<'_>) {
            if let Some(h) = self.handle.take() {
                cx.timers.cancel(h);
            }
        }

        fn on_timer(&mut self, cx: &mut FilterContext<'_>, timer: TimerHandle) {
            if self.handle == Some(timer) {
                self.fired_at.push(cx.now());
            }
        }
    }

    #[test]
    fn timers_fire_before_the_event_that_passes_them() {
        let mut probe = TimerProbe {
            handle: None,
            fired_at: Vec::new(),
        };
        let mut detector = GestureDetector::new(Size::new(50.0, 50.0));
        let down = PointerChange::down(PointerId(0), 10, Point::ZERO);
        detector.dispatch(&mut [&mut probe], &mut [down]).unwrap();
        assert_eq!(detector.advance_time(&mut [&mut probe], 109), Ok(0));
        let mut moved = [down.moved_to(150, Point::new(1.0, 0.0))];
        detector.dispatch(&mut [&mut probe], &mut moved).unwrap();
        assert_eq!(probe.fired_at, [150]);
    }

    #[test]
    fn cancel_reaches_every_filter() {
        let mut probe = TimerProbe {
            handle: None,
            fired_at: Vec::new(),
        };
        let mut detector = GestureDetector::new(Size::new(50.0, 50.0));
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        detector.dispatch(&mut [&mut probe], &mut [down]).unwrap();
        assert_eq!(detector.timers().pending(), 1);
        detector.cancel(&mut [&mut probe]);
        assert_eq!(detector.timers().pending(), 0);
        assert_eq!(detector.advance_time(&mut [&mut probe], 500), Ok(0));
    }
}
