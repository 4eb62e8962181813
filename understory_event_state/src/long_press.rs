// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Long-press detection.
//!
//! ```text
//! Idle ──all down──▶ Primed ──timeout──▶ Fired
//!  ▲                   │                   │
//!  └───── all up, consumed movement, or all pointers out of bounds
//! ```
//!
//! Priming schedules a timer on the context's [`TaskScope`](crate::scheduler::TaskScope);
//! leaving `Primed` for `Idle` cancels it. When the timer fires the filter checks that it is
//! still `Primed` with that same timer, so a stale timer never fires a long press. After firing,
//! the filter consumes the up of the gesture in the `Initial` pass so that nothing below it
//! treats the release as a tap.

use alloc::vec::Vec;

use kurbo::Point;

use crate::config::GestureConfig;
use crate::filter::{FilterContext, GestureFilter};
use crate::pointer::{PointerChange, PointerEventPass, PointerId};
use crate::scheduler::TimerHandle;

/// Where a [`LongPress`] is in its gesture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LongPressState {
    /// Waiting for a press.
    #[default]
    Idle,
    /// Pressed; the timer is running.
    Primed,
    /// The long press was reported; waiting for release.
    Fired,
}

/// Core state machine of [`LongPressGestureFilter`].
#[derive(Clone, Debug)]
pub struct LongPress {
    timeout: u64,
    state: LongPressState,
    // Insertion-ordered: the first pointer down is the one reported.
    positions: Vec<(PointerId, Point)>,
    timer: Option<TimerHandle>,
}

impl Default for LongPress {
    fn default() -> Self {
        Self::new(GestureConfig::default().long_press_timeout_ms)
    }
}

impl LongPress {
    /// A detector that fires after `timeout` milliseconds.
    pub fn new(timeout: u64) -> Self {
        Self {
            timeout,
            state: LongPressState::Idle,
            positions: Vec::new(),
            timer: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> LongPressState {
        self.state
    }

    /// Timeout in milliseconds.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Process one pass.
    pub fn process(
        &mut self,
        cx: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        match pass {
            PointerEventPass::Initial => {
                if self.state == LongPressState::Fired {
                    for change in changes.iter_mut().filter(|c| c.changed_to_up()) {
                        change.consume_down_change();
                    }
                }
            }
            PointerEventPass::Main => {
                if self.state == LongPressState::Idle
                    && changes.iter().all(PointerChange::changed_to_down)
                {
                    self.prime(cx);
                } else if self.state != LongPressState::Idle
                    && changes
                        .iter()
                        .all(PointerChange::changed_to_up_ignore_consumed)
                {
                    self.reset(cx);
                } else if !changes.iter().any(|c| cx.pressed_in_bounds(c)) {
                    self.reset(cx);
                }

                if self.state == LongPressState::Primed {
                    for change in changes.iter() {
                        self.track(change);
                    }
                }
            }
            PointerEventPass::Final => {
                if self.state != LongPressState::Idle
                    && changes.iter().any(PointerChange::position_change_consumed)
                {
                    self.reset(cx);
                }
            }
        }
    }

    /// A timer fired. Returns the long-press position if it was ours and we were still primed.
    pub fn on_timer(&mut self, timer: TimerHandle) -> Option<Point> {
        if self.state != LongPressState::Primed || self.timer != Some(timer) {
            return None;
        }
        self.timer = None;
        self.state = LongPressState::Fired;
        let position = self.positions.first().map(|&(_, p)| p);
        log::debug!("long press at {position:?}");
        position
    }

    /// Return to `Idle`, cancelling the timer.
    pub fn reset(&mut self, cx: &mut FilterContext<'_>) {
        if self.state != LongPressState::Idle {
            log::trace!("long press {:?} -> Idle", self.state);
        }
        self.state = LongPressState::Idle;
        if let Some(timer) = self.timer.take() {
            cx.timers.cancel(timer);
        }
        self.positions.clear();
    }

    fn prime(&mut self, cx: &mut FilterContext<'_>) {
        self.state = LongPressState::Primed;
        self.timer = Some(cx.timers.schedule(self.timeout));
        log::trace!("long press primed until t={}", cx.now().saturating_add(self.timeout));
    }

    fn track(&mut self, change: &PointerChange) {
        let slot = self.positions.iter().position(|&(id, _)| id == change.id);
        match (slot, change.pressed()) {
            (Some(i), true) => self.positions[i].1 = change.position(),
            (None, true) => self.positions.push((change.id, change.position())),
            (Some(i), false) => {
                self.positions.remove(i);
            }
            (None, false) => {}
        }
    }
}

/// A [`LongPress`] that reports to a handler.
///
/// ```
/// use kurbo::{Point, Size};
/// use understory_event_state::pass::GestureDetector;
/// use understory_event_state::pointer::{PointerChange, PointerId};
/// use understory_event_state::long_press::LongPressGestureFilter;
///
/// let mut fired = Vec::new();
/// let mut filter = LongPressGestureFilter::new(500, |p| fired.push(p));
/// let mut detector = GestureDetector::new(Size::new(100.0, 100.0));
///
/// let down = PointerChange::down(PointerId(0), 0, Point::new(20.0, 20.0));
/// detector.dispatch(&mut [&mut filter], &mut [down]).unwrap();
/// detector.advance_time(&mut [&mut filter], 499).unwrap();
/// detector.advance_time(&mut [&mut filter], 500).unwrap();
/// detector.advance_time(&mut [&mut filter], 2000).unwrap();
/// drop(filter);
/// assert_eq!(fired, [Point::new(20.0, 20.0)]);
/// ```
pub struct LongPressGestureFilter<H> {
    state: LongPress,
    on_long_press: H,
}

impl<H: FnMut(Point)> LongPressGestureFilter<H> {
    /// A filter that fires after `timeout` milliseconds.
    pub fn new(timeout: u64, on_long_press: H) -> Self {
        Self {
            state: LongPress::new(timeout),
            on_long_press,
        }
    }

    /// Underlying state machine.
    pub fn state(&self) -> &LongPress {
        &self.state
    }
}

impl<H> core::fmt::Debug for LongPressGestureFilter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LongPressGestureFilter")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<H: FnMut(Point)> GestureFilter for LongPressGestureFilter<H> {
    fn on_pointer_event(
        &mut self,
        cx: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        self.state.process(cx, changes, pass);
    }

    fn on_cancel(&mut self, cx: &mut FilterContext<'_>) {
        self.state.reset(cx);
    }

    fn on_timer(&mut self, _: &mut FilterContext<'_>, timer: TimerHandle) {
        if let Some(position) = self.state.on_timer(timer) {
            (self.on_long_press)(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::GestureDetector;
    use kurbo::{Size, Vec2};

    struct Harness {
        detector: GestureDetector,
        fired: Vec<Point>,
        filter: LongPress,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                detector: GestureDetector::new(Size::new(100.0, 100.0)),
                fired: Vec::new(),
                filter: LongPress::new(500),
            }
        }

        fn dispatch(&mut self, changes: &mut [PointerChange]) {
            let mut f = LongPressGestureFilter {
                state: core::mem::take(&mut self.filter),
                on_long_press: |p| self.fired.push(p),
            };
            self.detector.dispatch(&mut [&mut f], changes).unwrap();
            self.filter = f.state;
        }

        fn advance(&mut self, now: u64) {
            let mut f = LongPressGestureFilter {
                state: core::mem::take(&mut self.filter),
                on_long_press: |p| self.fired.push(p),
            };
            self.detector.advance_time(&mut [&mut f], now).unwrap();
            self.filter = f.state;
        }
    }

    #[test]
    fn fires_exactly_once_after_timeout() {
        let mut h = Harness::new();
        let down = PointerChange::down(PointerId(0), 100, Point::new(10.0, 10.0));
        h.dispatch(&mut [down]);
        assert_eq!(h.filter.state(), LongPressState::Primed);
        h.advance(599);
        assert!(h.fired.is_empty());
        h.advance(600);
        h.advance(5000);
        assert_eq!(h.fired, [Point::new(10.0, 10.0)]);
        assert_eq!(h.filter.state(), LongPressState::Fired);
    }

    #[test]
    fn up_before_timeout_returns_to_idle() {
        let mut h = Harness::new();
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
        h.dispatch(&mut [down]);
        h.dispatch(&mut [down.up(200)]);
        assert_eq!(h.filter.state(), LongPressState::Idle);
        assert_eq!(h.detector.timers().pending(), 0);
        h.advance(1000);
        assert!(h.fired.is_empty());
    }

    #[test]
    fn reports_first_pointer_latest_position() {
        let mut h = Harness::new();
        let a = PointerChange::down(PointerId(7), 0, Point::new(10.0, 10.0));
        let b = PointerChange::down(PointerId(2), 0, Point::new(50.0, 50.0));
        h.dispatch(&mut [a, b]);
        h.dispatch(&mut [a.moved_to(100, Point::new(12.0, 11.0)), b.moved_to(100, Point::new(50.0, 50.0))]);
        h.advance(500);
        assert_eq!(h.fired, [Point::new(12.0, 11.0)]);
    }

    #[test]
    fn leaving_bounds_resets() {
        let mut h = Harness::new();
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
        h.dispatch(&mut [down]);
        h.dispatch(&mut [down.moved_to(100, Point::new(100.0, 10.0))]);
        assert_eq!(h.filter.state(), LongPressState::Idle);
        h.advance(600);
        assert!(h.fired.is_empty());
    }

    #[test]
    fn consumed_movement_resets_in_final() {
        let mut timers = crate::scheduler::TaskScope::new();
        let mut cx = FilterContext::new(Size::new(100.0, 100.0), &mut timers);
        let mut lp = LongPress::new(500);
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
        lp.process(&mut cx, &mut [down], PointerEventPass::Main);
        let mut moved = [down.moved_to(10, Point::new(15.0, 10.0))];
        lp.process(&mut cx, &mut moved, PointerEventPass::Main);
        assert_eq!(lp.state(), LongPressState::Primed);
        moved[0].consume_position_change(Vec2::new(5.0, 0.0));
        lp.process(&mut cx, &mut moved, PointerEventPass::Final);
        assert_eq!(lp.state(), LongPressState::Idle);
        assert_eq!(cx.timers.pending(), 0);
    }

    #[test]
    fn fired_press_consumes_release() {
        let mut h = Harness::new();
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
        h.dispatch(&mut [down]);
        h.advance(500);
        let mut up = [down.up(700)];
        h.dispatch(&mut up);
        assert!(up[0].consumed.down_change);
        assert_eq!(h.filter.state(), LongPressState::Idle);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut h = Harness::new();
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
        h.dispatch(&mut [down]);
        let stale = h.filter.timer;
        h.dispatch(&mut [down.up(100)]);
        let again = PointerChange::down(PointerId(0), 200, Point::new(10.0, 10.0));
        h.dispatch(&mut [again]);
        assert_eq!(h.filter.on_timer(stale.unwrap()), None);
        assert_eq!(h.filter.state(), LongPressState::Primed);
        h.advance(700);
        assert_eq!(h.fired.len(), 1);
    }
}
