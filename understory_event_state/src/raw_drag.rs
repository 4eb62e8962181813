// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw drag tracking.
//!
//! [`RawDrag`] follows every pressed pointer, starts a drag as soon as the pointers move (if the
//! owner allows it), reports the average movement, and on release reports the fling velocity
//! of the last pointer to lift. Down positions and velocity trackers live in a small map keyed
//! by pointer id: inserted on down, removed on up, cleared on stop and cancel.
//!
//! ## Events
//!
//! - [`DragEvent::Start`] with the average position of the pointers that went down.
//! - [`DragEvent::Drag`] with the movement summed over moving pointers, divided by the number of
//!   changes. The handler returns how much of it was used; anything non-zero consumes the
//!   movement of the moving pointers.
//! - [`DragEvent::Stop`] with the velocity in px/s once every pointer is up.
//! - [`DragEvent::Cancel`] when cancelled mid-drag.

use hashbrown::HashMap;
use kurbo::{Point, Vec2};

use crate::filter::{FilterContext, GestureFilter};
use crate::pointer::{PointerChange, PointerEventPass, PointerId, count_as_f64};
use crate::velocity::VelocityTracker;

/// What a drag reports to its handler.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DragEvent {
    /// A drag started; average position of the pointers when they went down.
    Start(Point),
    /// The pointers moved by this average amount.
    Drag(Vec2),
    /// All pointers lifted; fling velocity in px/s.
    Stop(Vec2),
    /// The drag was cancelled.
    Cancel,
}

/// Core state machine of [`RawDragGestureFilter`].
#[derive(Clone, Debug, Default)]
pub struct RawDrag {
    trackers: HashMap<PointerId, VelocityTracker>,
    down_positions: HashMap<PointerId, Point>,
    started: bool,
}

impl RawDrag {
    /// An idle drag tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is in progress.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of pointers currently tracked for velocity.
    pub fn tracked_pointers(&self) -> usize {
        self.trackers.len()
    }

    /// Process one pass.
    ///
    /// `can_start` is asked only while no drag is in progress. `handler` returns the consumed
    /// part of a [`DragEvent::Drag`]; its return value is ignored for other events.
    pub fn process(
        &mut self,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
        can_start: &mut dyn FnMut() -> bool,
        handler: &mut dyn FnMut(DragEvent) -> Vec2,
    ) {
        match pass {
            PointerEventPass::Initial => {
                if self.started {
                    for change in changes.iter_mut().filter(|c| c.changed_to_down()) {
                        change.consume_down_change();
                    }
                }
            }
            PointerEventPass::Main => self.main_pass(changes, can_start, handler),
            PointerEventPass::Final => {}
        }
    }

    fn main_pass(
        &mut self,
        changes: &mut [PointerChange],
        can_start: &mut dyn FnMut() -> bool,
        handler: &mut dyn FnMut(DragEvent) -> Vec2,
    ) {
        if changes
            .iter()
            .any(PointerChange::changed_to_up_ignore_consumed)
        {
            let mut fling = None;
            for change in changes.iter() {
                if change.changed_to_up() {
                    fling = self.trackers.remove(&change.id);
                    self.down_positions.remove(&change.id);
                } else if change.changed_to_up_ignore_consumed() {
                    self.trackers.remove(&change.id);
                }
            }
            if self.started
                && changes
                    .iter()
                    .all(PointerChange::changed_to_up_ignore_consumed)
            {
                let velocity = match fling {
                    Some(tracker) => {
                        changes.iter_mut().for_each(PointerChange::consume_down_change);
                        tracker.velocity()
                    }
                    None => Vec2::ZERO,
                };
                self.started = false;
                log::debug!("drag stopped with velocity {velocity:?}");
                handler(DragEvent::Stop(velocity));
                self.clear();
            }
        }

        for change in changes
            .iter()
            .filter(|c| c.changed_to_down_ignore_consumed())
        {
            self.trackers.insert(
                change.id,
                VelocityTracker::starting_at(change.uptime(), change.position()),
            );
            self.down_positions.insert(change.id, change.position());
        }

        let is_move = |c: &PointerChange| c.pressed() && !c.changed_to_down_ignore_consumed();
        for change in changes.iter().filter(|c| is_move(c)) {
            if let Some(tracker) = self.trackers.get_mut(&change.id) {
                tracker.add_position(change.uptime(), change.position());
            }
        }

        if !self.started && !can_start() {
            return;
        }
        let total = changes
            .iter()
            .filter(|c| is_move(c))
            .fold(Vec2::ZERO, |sum, c| sum + c.position_change());
        if total == Vec2::ZERO {
            return;
        }
        if !self.started {
            self.started = true;
            let start = self.average_down_position();
            log::debug!("drag started at {start:?}");
            handler(DragEvent::Start(start));
            self.down_positions.clear();
        }
        let consumed = handler(DragEvent::Drag(total / count_as_f64(changes.len())));
        if consumed != Vec2::ZERO {
            for change in changes.iter_mut().filter(|c| is_move(c)) {
                change.consume_remaining_position_change();
            }
        }
    }

    /// Cancel the gesture, reporting [`DragEvent::Cancel`] if a drag was in progress.
    pub fn cancel(&mut self, handler: &mut dyn FnMut(DragEvent) -> Vec2) {
        self.clear();
        if self.started {
            self.started = false;
            log::debug!("drag cancelled");
            handler(DragEvent::Cancel);
        }
    }

    fn clear(&mut self) {
        self.trackers.clear();
        self.down_positions.clear();
    }

    fn average_down_position(&self) -> Point {
        if self.down_positions.is_empty() {
            return Point::ZERO;
        }
        let sum = self
            .down_positions
            .values()
            .fold(Vec2::ZERO, |sum, p| sum + p.to_vec2());
        (sum / count_as_f64(self.down_positions.len())).to_point()
    }
}

/// A [`RawDrag`] wired to a handler.
///
/// ```
/// use kurbo::{Point, Size, Vec2};
/// use understory_event_state::pass::GestureDetector;
/// use understory_event_state::pointer::{PointerChange, PointerId};
/// use understory_event_state::raw_drag::{DragEvent, RawDragGestureFilter};
///
/// let mut events = Vec::new();
/// let mut filter = RawDragGestureFilter::new(|e| {
///     events.push(e);
///     Vec2::ZERO
/// });
/// let mut detector = GestureDetector::new(Size::new(100.0, 100.0));
///
/// let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
/// let moved = down.moved_to(16, Point::new(15.0, 10.0));
/// for change in [down, moved, moved.up(32)] {
///     detector.dispatch(&mut [&mut filter], &mut [change]).unwrap();
/// }
/// drop(filter);
/// assert_eq!(events[0], DragEvent::Start(Point::new(10.0, 10.0)));
/// assert_eq!(events[1], DragEvent::Drag(Vec2::new(5.0, 0.0)));
/// assert!(matches!(events[2], DragEvent::Stop(_)));
/// ```
pub struct RawDragGestureFilter<H> {
    state: RawDrag,
    can_start: bool,
    handler: H,
}

impl<H: FnMut(DragEvent) -> Vec2> RawDragGestureFilter<H> {
    /// A filter that may start dragging right away.
    pub fn new(handler: H) -> Self {
        Self {
            state: RawDrag::new(),
            can_start: true,
            handler,
        }
    }

    /// Allow or forbid starting new drags. A drag already in progress continues.
    pub fn set_can_start(&mut self, can_start: bool) {
        self.can_start = can_start;
    }

    /// Underlying state machine.
    pub fn state(&self) -> &RawDrag {
        &self.state
    }
}

impl<H> core::fmt::Debug for RawDragGestureFilter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawDragGestureFilter")
            .field("state", &self.state)
            .field("can_start", &self.can_start)
            .finish_non_exhaustive()
    }
}

impl<H: FnMut(DragEvent) -> Vec2> GestureFilter for RawDragGestureFilter<H> {
    fn on_pointer_event(
        &mut self,
        _: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        let can_start = self.can_start;
        self.state
            .process(changes, pass, &mut || can_start, &mut self.handler);
    }

    fn on_cancel(&mut self, _: &mut FilterContext<'_>) {
        self.state.cancel(&mut self.handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Log {
        events: Vec<DragEvent>,
        consume: bool,
    }

    impl Log {
        fn handle(&mut self, event: DragEvent) -> Vec2 {
            self.events.push(event);
            match event {
                DragEvent::Drag(d) if self.consume => d,
                _ => Vec2::ZERO,
            }
        }
    }

    fn main_pass(drag: &mut RawDrag, log: &mut Log, changes: &mut [PointerChange], can_start: bool) {
        drag.process(
            changes,
            PointerEventPass::Main,
            &mut || can_start,
            &mut |e| log.handle(e),
        );
    }

    #[test]
    fn start_uses_average_down_position() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        let a = PointerChange::down(PointerId(0), 0, Point::new(0.0, 0.0));
        let b = PointerChange::down(PointerId(1), 0, Point::new(10.0, 20.0));
        main_pass(&mut drag, &mut log, &mut [a, b], true);
        assert!(log.events.is_empty());
        assert_eq!(drag.tracked_pointers(), 2);

        let mut moved = [
            a.moved_to(10, Point::new(4.0, 0.0)),
            b.moved_to(10, Point::new(10.0, 20.0)),
        ];
        main_pass(&mut drag, &mut log, &mut moved, true);
        assert_eq!(
            log.events,
            [
                DragEvent::Start(Point::new(5.0, 10.0)),
                DragEvent::Drag(Vec2::new(2.0, 0.0)),
            ]
        );
    }

    #[test]
    fn can_start_gates_only_new_drags() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        main_pass(&mut drag, &mut log, &mut [down], false);
        let m1 = down.moved_to(10, Point::new(3.0, 0.0));
        main_pass(&mut drag, &mut log, &mut [m1], false);
        assert!(!drag.is_started());
        let m2 = m1.moved_to(20, Point::new(6.0, 0.0));
        main_pass(&mut drag, &mut log, &mut [m2], true);
        assert!(drag.is_started());
        let m3 = m2.moved_to(30, Point::new(9.0, 0.0));
        main_pass(&mut drag, &mut log, &mut [m3], false);
        assert_eq!(log.events.len(), 3, "start + two drags");
    }

    #[test]
    fn stop_reports_fling_of_unconsumed_up() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        let mut c = PointerChange::down(PointerId(0), 0, Point::ZERO);
        main_pass(&mut drag, &mut log, &mut [c], true);
        for i in 1..=4_u32 {
            c = c.moved_to(u64::from(i) * 10, Point::new(f64::from(i) * 10.0, 0.0));
            main_pass(&mut drag, &mut log, &mut [c], true);
        }
        let mut up = [c.up(40)];
        main_pass(&mut drag, &mut log, &mut up, true);
        let Some(DragEvent::Stop(v)) = log.events.last().copied() else {
            panic!("expected a stop, got {:?}", log.events);
        };
        assert!((v.x - 1000.0).abs() < 1e-6, "got {v:?}");
        assert!(up[0].consumed.down_change, "fling consumes the up");
        assert!(!drag.is_started());
        assert_eq!(drag.tracked_pointers(), 0);
    }

    #[test]
    fn consumed_up_stops_with_zero_velocity() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        main_pass(&mut drag, &mut log, &mut [down], true);
        let moved = down.moved_to(10, Point::new(30.0, 0.0));
        main_pass(&mut drag, &mut log, &mut [moved], true);
        let mut up = moved.up(20);
        up.consume_down_change();
        main_pass(&mut drag, &mut log, &mut [up], true);
        assert_eq!(log.events.last(), Some(&DragEvent::Stop(Vec2::ZERO)));
    }

    #[test]
    fn lifting_one_of_two_keeps_dragging() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        let a = PointerChange::down(PointerId(0), 0, Point::ZERO);
        let b = PointerChange::down(PointerId(1), 0, Point::new(50.0, 0.0));
        main_pass(&mut drag, &mut log, &mut [a, b], true);
        let (a1, b1) = (
            a.moved_to(10, Point::new(10.0, 0.0)),
            b.moved_to(10, Point::new(60.0, 0.0)),
        );
        main_pass(&mut drag, &mut log, &mut [a1, b1], true);
        main_pass(&mut drag, &mut log, &mut [a1.up(20), b1.moved_to(20, Point::new(70.0, 0.0))], true);
        assert!(drag.is_started());
        assert_eq!(drag.tracked_pointers(), 1);
        assert_eq!(log.events.last(), Some(&DragEvent::Drag(Vec2::new(5.0, 0.0))));
    }

    #[test]
    fn consumed_drag_consumes_moves() {
        let mut drag = RawDrag::new();
        let mut log = Log {
            consume: true,
            ..Log::default()
        };
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        main_pass(&mut drag, &mut log, &mut [down], true);
        let mut moved = [down.moved_to(10, Point::new(0.0, 8.0))];
        main_pass(&mut drag, &mut log, &mut moved, true);
        assert!(moved[0].position_change_consumed());
        assert_eq!(moved[0].position_change(), Vec2::ZERO);
    }

    #[test]
    fn started_drag_consumes_new_downs_in_initial() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        let a = PointerChange::down(PointerId(0), 0, Point::ZERO);
        main_pass(&mut drag, &mut log, &mut [a], true);
        main_pass(&mut drag, &mut log, &mut [a.moved_to(10, Point::new(5.0, 0.0))], true);
        let mut second = [PointerChange::down(PointerId(1), 20, Point::new(40.0, 0.0))];
        drag.process(&mut second, PointerEventPass::Initial, &mut || true, &mut |e| log.handle(e));
        assert!(second[0].consumed.down_change);
    }

    #[test]
    fn cancel_reports_only_when_started() {
        let mut drag = RawDrag::new();
        let mut log = Log::default();
        drag.cancel(&mut |e| log.handle(e));
        assert!(log.events.is_empty());
        let down = PointerChange::down(PointerId(0), 0, Point::ZERO);
        main_pass(&mut drag, &mut log, &mut [down], true);
        main_pass(&mut drag, &mut log, &mut [down.moved_to(5, Point::new(1.0, 1.0))], true);
        drag.cancel(&mut |e| log.handle(e));
        assert_eq!(log.events.last(), Some(&DragEvent::Cancel));
        assert_eq!(drag.tracked_pointers(), 0);
    }
}
