// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag slop detection.
//!
//! Accumulates the average movement of all pointers per axis and reports once when it leaves
//! the touch slop in a direction the owner allows. After that it stays quiet until every pointer
//! has lifted (or the gesture is cancelled).
//!
//! The `Main` pass records movement as seen there; the `Final` pass adds whatever changed
//! between the two passes, so movement consumed by descendants in `Main` does not count twice.
//! Movement in a direction that may not drag is discarded instead of accumulated, so a user who
//! first pushes against a wall and then pulls away is not penalized.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Vec2;

use crate::config::GestureConfig;
use crate::filter::{FilterContext, GestureFilter};
use crate::pointer::{Direction, PointerChange, PointerEventPass, average_position_change};

/// Core state machine of [`DragSlopExceededGestureFilter`].
#[derive(Clone, Debug)]
pub struct DragSlop {
    touch_slop: f64,
    for_pass: Vec2,
    under_slop: Vec2,
    passed_slop: bool,
}

impl Default for DragSlop {
    fn default() -> Self {
        Self::new(GestureConfig::default().touch_slop)
    }
}

impl DragSlop {
    /// A detector with the given slop in pixels.
    pub fn new(touch_slop: f64) -> Self {
        Self {
            touch_slop,
            for_pass: Vec2::ZERO,
            under_slop: Vec2::ZERO,
            passed_slop: false,
        }
    }

    /// Slop in pixels.
    pub fn touch_slop(&self) -> f64 {
        self.touch_slop
    }

    /// Whether the slop was exceeded in the current gesture.
    pub fn passed_slop(&self) -> bool {
        self.passed_slop
    }

    /// Movement accumulated so far while under the slop.
    pub fn under_slop(&self) -> Vec2 {
        self.under_slop
    }

    /// Process one pass. `can_drag` decides per direction whether movement counts.
    ///
    /// Returns `true` exactly when the slop is exceeded during this call.
    pub fn process(
        &mut self,
        changes: &[PointerChange],
        pass: PointerEventPass,
        can_drag: &mut dyn FnMut(Direction) -> bool,
    ) -> bool {
        if pass == PointerEventPass::Initial {
            return false;
        }
        let mut exceeded = false;
        if !self.passed_slop {
            let avg = average_position_change(changes);
            if pass == PointerEventPass::Main {
                self.for_pass = avg;
                self.under_slop += avg;
            } else {
                self.under_slop += avg - self.for_pass;
            }

            let dir_x = Direction::horizontal(avg);
            let dir_y = Direction::vertical(avg);
            let can_drag_x = dir_x.is_some_and(&mut *can_drag);
            let can_drag_y = dir_y.is_some_and(&mut *can_drag);
            let passed_x = can_drag_x && self.under_slop.x.abs() > self.touch_slop;
            let passed_y = can_drag_y && self.under_slop.y.abs() > self.touch_slop;

            if passed_x || passed_y {
                self.passed_slop = true;
                exceeded = true;
                log::trace!("drag slop exceeded by {:?}", self.under_slop);
            } else {
                if !can_drag_x
                    && matches!(
                        (dir_x, self.under_slop.x < 0.0, self.under_slop.x > 0.0),
                        (Some(Direction::Left), true, _) | (Some(Direction::Right), _, true)
                    )
                {
                    self.under_slop.x = 0.0;
                }
                if !can_drag_y
                    && matches!(
                        (dir_y, self.under_slop.y < 0.0, self.under_slop.y > 0.0),
                        (Some(Direction::Up), true, _) | (Some(Direction::Down), _, true)
                    )
                {
                    self.under_slop.y = 0.0;
                }
            }
        }
        if pass == PointerEventPass::Final
            && changes
                .iter()
                .all(PointerChange::changed_to_up_ignore_consumed)
        {
            self.reset();
        }
        exceeded
    }

    /// Return to the idle state.
    pub fn reset(&mut self) {
        self.passed_slop = false;
        self.for_pass = Vec2::ZERO;
        self.under_slop = Vec2::ZERO;
    }
}

/// A [`DragSlop`] that calls a handler when the slop is exceeded.
///
/// ```
/// use kurbo::{Point, Size};
/// use understory_event_state::pass::GestureDetector;
/// use understory_event_state::pointer::{PointerChange, PointerId};
/// use understory_event_state::slop::DragSlopExceededGestureFilter;
///
/// let mut exceeded = 0;
/// let mut filter = DragSlopExceededGestureFilter::new(18.0, || exceeded += 1);
/// let mut detector = GestureDetector::new(Size::new(200.0, 200.0));
///
/// let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
/// let small = down.moved_to(16, Point::new(20.0, 10.0));
/// let large = small.moved_to(32, Point::new(30.0, 10.0));
/// for change in [down, small, large, large.up(48)] {
///     detector.dispatch(&mut [&mut filter], &mut [change]).unwrap();
/// }
/// drop(filter);
/// assert_eq!(exceeded, 1);
/// ```
pub struct DragSlopExceededGestureFilter<H> {
    state: DragSlop,
    can_drag: Option<alloc::boxed::Box<dyn FnMut(Direction) -> bool>>,
    on_slop_exceeded: H,
}

impl<H: FnMut()> DragSlopExceededGestureFilter<H> {
    /// A filter with `touch_slop` pixels of slop in every direction.
    pub fn new(touch_slop: f64, on_slop_exceeded: H) -> Self {
        Self {
            state: DragSlop::new(touch_slop),
            can_drag: None,
            on_slop_exceeded,
        }
    }

    /// Only count movement in directions for which `can_drag` returns `true`.
    pub fn with_can_drag(mut self, can_drag: impl FnMut(Direction) -> bool + 'static) -> Self {
        self.can_drag = Some(alloc::boxed::Box::new(can_drag));
        self
    }

    /// Underlying state machine.
    pub fn state(&self) -> &DragSlop {
        &self.state
    }
}

impl<H> core::fmt::Debug for DragSlopExceededGestureFilter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DragSlopExceededGestureFilter")
            .field("state", &self.state)
            .field("can_drag", &self.can_drag.is_some())
            .finish_non_exhaustive()
    }
}

impl<H: FnMut()> GestureFilter for DragSlopExceededGestureFilter<H> {
    fn on_pointer_event(
        &mut self,
        _: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        let exceeded = match self.can_drag.as_mut() {
            Some(can_drag) => self.state.process(changes, pass, &mut **can_drag),
            None => self.state.process(changes, pass, &mut |_| true),
        };
        if exceeded {
            (self.on_slop_exceeded)();
        }
    }

    fn on_cancel(&mut self, _: &mut FilterContext<'_>) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::PointerId;
    use kurbo::Point;

    fn any(_: Direction) -> bool {
        true
    }

    fn step(slop: &mut DragSlop, change: &PointerChange, can_drag: &mut dyn FnMut(Direction) -> bool) -> bool {
        let changes = [*change];
        slop.process(&changes, PointerEventPass::Main, can_drag)
            | slop.process(&changes, PointerEventPass::Final, can_drag)
    }

    #[test]
    fn exceeds_only_strictly_beyond_slop() {
        let mut slop = DragSlop::new(18.0);
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        assert!(!step(&mut slop, &down, &mut any));
        let at = down.moved_to(10, Point::new(0.0, 18.0));
        assert!(!step(&mut slop, &at, &mut any));
        let past = at.moved_to(20, Point::new(0.0, 18.5));
        assert!(step(&mut slop, &past, &mut any));
        assert!(slop.passed_slop());
        let more = past.moved_to(30, Point::new(0.0, 60.0));
        assert!(!step(&mut slop, &more, &mut any), "fires once per gesture");
    }

    #[test]
    fn forbidden_direction_is_discarded() {
        let mut slop = DragSlop::new(18.0);
        let mut only_right = |d: Direction| d == Direction::Right;
        let down = PointerChange::down(PointerId(0), 0, Point::new(100.0, 0.0));
        step(&mut slop, &down, &mut only_right);
        let left = down.moved_to(10, Point::new(50.0, 0.0));
        assert!(!step(&mut slop, &left, &mut only_right));
        assert_eq!(slop.under_slop().x, 0.0);
        let right = left.moved_to(20, Point::new(60.0, 0.0));
        assert!(!step(&mut slop, &right, &mut only_right));
        let further = right.moved_to(30, Point::new(70.0, 0.0));
        assert!(step(&mut slop, &further, &mut only_right));
    }

    #[test]
    fn consumed_in_main_is_taken_back_in_final() {
        let mut slop = DragSlop::new(18.0);
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        step(&mut slop, &down, &mut any);
        let mut moved = [down.moved_to(10, Point::new(15.0, 0.0))];
        slop.process(&moved, PointerEventPass::Main, &mut any);
        assert_eq!(slop.under_slop().x, 15.0);
        moved[0].consume_position_change(Vec2::new(15.0, 0.0));
        slop.process(&moved, PointerEventPass::Final, &mut any);
        assert_eq!(slop.under_slop().x, 0.0);
    }

    #[test]
    fn all_up_on_final_resets() {
        let mut slop = DragSlop::new(5.0);
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        let moved = down.moved_to(10, Point::new(10.0, 0.0));
        step(&mut slop, &down, &mut any);
        assert!(step(&mut slop, &moved, &mut any));
        step(&mut slop, &moved.up(20), &mut any);
        assert!(!slop.passed_slop());
        assert_eq!(slop.under_slop(), Vec2::ZERO);
    }

    #[test]
    fn average_spreads_over_all_pointers() {
        let mut slop = DragSlop::new(18.0);
        let a = PointerChange::down(PointerId(0), 0, Point::ZERO);
        let b = PointerChange::down(PointerId(1), 0, Point::new(50.0, 50.0));
        let changes = [a.moved_to(10, Point::new(30.0, 0.0)), b.moved_to(10, Point::new(50.0, 50.0))];
        assert!(!slop.process(&changes, PointerEventPass::Main, &mut any));
        assert_eq!(slop.under_slop().x, 15.0);
    }
}
