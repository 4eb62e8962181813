// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite drag detectors.
//!
//! Both detectors here own their sub-filters and run them in the order they would run as
//! separate filters in a chain, then reconcile their outputs in one explicit phase enum:
//!
//! - [`DragGestureFilter`]: raw drag (outermost), drag slop, press start (innermost). A drag
//!   starts once the touch slop is exceeded, or immediately on press when configured to.
//! - [`LongPressDragGestureFilter`]: raw drag (outermost), the detector itself, long press
//!   (innermost). A drag is only possible after a long press.
//!
//! Every gesture that reported a start reports exactly one `Stop` or `Cancel`, including a
//! press-started or long-pressed gesture whose pointers lift before moving.
//!
//! ```
//! use kurbo::{Point, Size, Vec2};
//! use understory_event_state::config::GestureConfig;
//! use understory_event_state::drag::DragGestureFilter;
//! use understory_event_state::pass::GestureDetector;
//! use understory_event_state::pointer::{PointerChange, PointerId};
//! use understory_event_state::raw_drag::DragEvent;
//!
//! let mut events = Vec::new();
//! let mut drag = DragGestureFilter::new(GestureConfig::default(), |e| {
//!     events.push(e);
//!     Vec2::ZERO
//! });
//! let mut detector = GestureDetector::new(Size::new(400.0, 400.0));
//!
//! let down = PointerChange::down(PointerId(0), 0, Point::new(100.0, 100.0));
//! let nudge = down.moved_to(16, Point::new(110.0, 100.0)); // within the 18px slop
//! let pull = nudge.moved_to(32, Point::new(130.0, 100.0));
//! for change in [down, nudge, pull, pull.up(48)] {
//!     detector.dispatch(&mut [&mut drag], &mut [change]).unwrap();
//! }
//! drop(drag);
//!
//! assert_eq!(events[0], DragEvent::Start(Point::new(100.0, 100.0)));
//! assert_eq!(events[1], DragEvent::Drag(Vec2::new(20.0, 0.0)));
//! assert!(matches!(events[2], DragEvent::Stop(_)));
//! assert_eq!(events.len(), 3);
//! ```

use kurbo::{Point, Vec2};

use crate::config::GestureConfig;
use crate::filter::{FilterContext, GestureFilter};
use crate::long_press::LongPress;
use crate::pointer::{PointerChange, PointerEventPass};
use crate::press_start::RawPressStart;
use crate::raw_drag::{DragEvent, RawDrag};
use crate::scheduler::TimerHandle;
use crate::slop::DragSlop;

/// Where a [`DragGestureFilter`] is in its gesture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragPhase {
    /// No gesture, or one that has not left the slop.
    #[default]
    Idle,
    /// The slop was exceeded; the next movement starts the drag.
    SlopExceeded,
    /// Started on press; no movement yet.
    PressStarted,
    /// Dragging.
    Dragging,
}

/// Drag detector that waits for the touch slop, or starts right on press.
pub struct DragGestureFilter<H> {
    raw: RawDrag,
    slop: DragSlop,
    press_start: RawPressStart,
    phase: DragPhase,
    handler: H,
}

impl<H: FnMut(DragEvent) -> Vec2> DragGestureFilter<H> {
    /// A detector using `config.touch_slop`, starting only after the slop is exceeded.
    ///
    /// `handler` returns how much of each [`DragEvent::Drag`] it used.
    pub fn new(config: GestureConfig, handler: H) -> Self {
        let mut press_start = RawPressStart::new();
        press_start.set_enabled(false);
        Self {
            raw: RawDrag::new(),
            slop: DragSlop::new(config.touch_slop),
            press_start,
            phase: DragPhase::Idle,
            handler,
        }
    }

    /// Start the drag as soon as the pointers go down, without waiting for the slop.
    pub fn start_immediately(mut self, immediately: bool) -> Self {
        self.press_start.set_enabled(immediately);
        self
    }

    /// Current phase.
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    fn raw_pass(&mut self, changes: &mut [PointerChange], pass: PointerEventPass) {
        let can_start = self.phase != DragPhase::Idle;
        let phase = &mut self.phase;
        let handler = &mut self.handler;
        self.raw.process(changes, pass, &mut || can_start, &mut |event| {
            route_raw(phase, handler, event)
        });
    }

    fn slop_pass(&mut self, changes: &[PointerChange], pass: PointerEventPass) {
        if self.slop.process(changes, pass, &mut |_| true) && self.phase == DragPhase::Idle {
            log::trace!("drag armed by slop");
            self.phase = DragPhase::SlopExceeded;
        }
    }

    fn press_start_pass(&mut self, changes: &mut [PointerChange], pass: PointerEventPass) {
        if let Some(position) = self.press_start.process(changes, pass) {
            self.phase = DragPhase::PressStarted;
            log::debug!("drag started on press at {position:?}");
            (self.handler)(DragEvent::Start(position));
        }
    }

    fn finish_if_lifted(&mut self, changes: &[PointerChange]) {
        if !changes
            .iter()
            .all(PointerChange::changed_to_up_ignore_consumed)
        {
            return;
        }
        match self.phase {
            DragPhase::PressStarted => {
                self.phase = DragPhase::Idle;
                log::debug!("press-started drag lifted without moving");
                (self.handler)(DragEvent::Stop(Vec2::ZERO));
            }
            DragPhase::SlopExceeded => self.phase = DragPhase::Idle,
            DragPhase::Idle | DragPhase::Dragging => {}
        }
    }
}

fn route_raw<H: FnMut(DragEvent) -> Vec2>(
    phase: &mut DragPhase,
    handler: &mut H,
    event: DragEvent,
) -> Vec2 {
    match event {
        DragEvent::Start(_) => {
            let already_reported = *phase == DragPhase::PressStarted;
            *phase = DragPhase::Dragging;
            if !already_reported {
                handler(event);
            }
            Vec2::ZERO
        }
        DragEvent::Drag(_) => handler(event),
        DragEvent::Stop(_) | DragEvent::Cancel => {
            *phase = DragPhase::Idle;
            handler(event)
        }
    }
}

impl<H> core::fmt::Debug for DragGestureFilter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DragGestureFilter")
            .field("raw", &self.raw)
            .field("slop", &self.slop)
            .field("press_start", &self.press_start)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<H: FnMut(DragEvent) -> Vec2> GestureFilter for DragGestureFilter<H> {
    fn on_pointer_event(
        &mut self,
        _: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        if pass.descendants_first() {
            self.press_start_pass(changes, pass);
            self.slop_pass(changes, pass);
            self.raw_pass(changes, pass);
            self.finish_if_lifted(changes);
        } else {
            self.raw_pass(changes, pass);
            self.slop_pass(changes, pass);
            self.press_start_pass(changes, pass);
        }
    }

    fn on_cancel(&mut self, _: &mut FilterContext<'_>) {
        let phase = &mut self.phase;
        let handler = &mut self.handler;
        self.raw.cancel(&mut |event| route_raw(phase, handler, event));
        self.slop.reset();
        self.press_start.cancel();
        if self.phase == DragPhase::PressStarted {
            (self.handler)(DragEvent::Cancel);
        }
        self.phase = DragPhase::Idle;
    }
}

/// What a [`LongPressDragGestureFilter`] reports.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LongPressDragEvent {
    /// The press was held long enough; dragging is now possible.
    LongPress(Point),
    /// The pointers started moving after the long press.
    DragStart,
    /// The pointers moved by this average amount.
    Drag(Vec2),
    /// The gesture ended; fling velocity in px/s.
    Stop(Vec2),
    /// The gesture was cancelled.
    Cancel,
}

/// Where a [`LongPressDragGestureFilter`] is in its gesture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LongPressDragPhase {
    /// No long press yet.
    #[default]
    Idle,
    /// Long-pressed; the next movement starts the drag.
    LongPressed,
    /// Dragging.
    Dragging,
}

/// Drag detector that only starts dragging after a long press.
///
/// ```
/// use kurbo::{Point, Size, Vec2};
/// use understory_event_state::config::GestureConfig;
/// use understory_event_state::drag::{LongPressDragEvent, LongPressDragGestureFilter};
/// use understory_event_state::pass::GestureDetector;
/// use understory_event_state::pointer::{PointerChange, PointerId};
///
/// let mut events = Vec::new();
/// let mut drag = LongPressDragGestureFilter::new(GestureConfig::default(), |e| {
///     events.push(e);
///     Vec2::ZERO
/// });
/// let mut detector = GestureDetector::new(Size::new(400.0, 400.0));
///
/// let down = PointerChange::down(PointerId(0), 0, Point::new(50.0, 50.0));
/// detector.dispatch(&mut [&mut drag], &mut [down]).unwrap();
/// detector.advance_time(&mut [&mut drag], 500).unwrap();
/// detector.dispatch(&mut [&mut drag], &mut [down.up(650)]).unwrap();
/// drop(drag);
///
/// assert_eq!(
///     events,
///     [
///         LongPressDragEvent::LongPress(Point::new(50.0, 50.0)),
///         LongPressDragEvent::Stop(Vec2::ZERO),
///     ]
/// );
/// ```
pub struct LongPressDragGestureFilter<H> {
    raw: RawDrag,
    long_press: LongPress,
    phase: LongPressDragPhase,
    handler: H,
}

impl<H: FnMut(LongPressDragEvent) -> Vec2> LongPressDragGestureFilter<H> {
    /// A detector using `config.long_press_timeout_ms`.
    ///
    /// `handler` returns how much of each [`LongPressDragEvent::Drag`] it used.
    pub fn new(config: GestureConfig, handler: H) -> Self {
        Self {
            raw: RawDrag::new(),
            long_press: LongPress::new(config.long_press_timeout_ms),
            phase: LongPressDragPhase::Idle,
            handler,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> LongPressDragPhase {
        self.phase
    }

    fn raw_pass(&mut self, changes: &mut [PointerChange], pass: PointerEventPass) {
        let can_start = self.phase != LongPressDragPhase::Idle;
        let phase = &mut self.phase;
        let handler = &mut self.handler;
        self.raw.process(changes, pass, &mut || can_start, &mut |event| {
            route_long_press_raw(phase, handler, event)
        });
    }

    fn finish_if_lifted(&mut self, changes: &[PointerChange]) {
        if self.phase == LongPressDragPhase::LongPressed
            && changes
                .iter()
                .all(PointerChange::changed_to_up_ignore_consumed)
        {
            self.phase = LongPressDragPhase::Idle;
            log::debug!("long press lifted without dragging");
            (self.handler)(LongPressDragEvent::Stop(Vec2::ZERO));
        }
    }
}

fn route_long_press_raw<H: FnMut(LongPressDragEvent) -> Vec2>(
    phase: &mut LongPressDragPhase,
    handler: &mut H,
    event: DragEvent,
) -> Vec2 {
    match event {
        DragEvent::Start(_) => {
            *phase = LongPressDragPhase::Dragging;
            handler(LongPressDragEvent::DragStart)
        }
        DragEvent::Drag(delta) => handler(LongPressDragEvent::Drag(delta)),
        DragEvent::Stop(velocity) => {
            *phase = LongPressDragPhase::Idle;
            handler(LongPressDragEvent::Stop(velocity))
        }
        DragEvent::Cancel => {
            *phase = LongPressDragPhase::Idle;
            handler(LongPressDragEvent::Cancel)
        }
    }
}

impl<H> core::fmt::Debug for LongPressDragGestureFilter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LongPressDragGestureFilter")
            .field("raw", &self.raw)
            .field("long_press", &self.long_press)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<H: FnMut(LongPressDragEvent) -> Vec2> GestureFilter for LongPressDragGestureFilter<H> {
    fn on_pointer_event(
        &mut self,
        cx: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        if pass.descendants_first() {
            self.long_press.process(cx, changes, pass);
            self.finish_if_lifted(changes);
            self.raw_pass(changes, pass);
        } else {
            self.raw_pass(changes, pass);
            self.long_press.process(cx, changes, pass);
        }
    }

    fn on_cancel(&mut self, cx: &mut FilterContext<'_>) {
        let phase = &mut self.phase;
        let handler = &mut self.handler;
        self.raw
            .cancel(&mut |event| route_long_press_raw(phase, handler, event));
        self.long_press.reset(cx);
        if self.phase == LongPressDragPhase::LongPressed {
            (self.handler)(LongPressDragEvent::Cancel);
        }
        self.phase = LongPressDragPhase::Idle;
    }

    fn on_timer(&mut self, _: &mut FilterContext<'_>, timer: TimerHandle) {
        if let Some(position) = self.long_press.on_timer(timer) {
            self.phase = LongPressDragPhase::LongPressed;
            (self.handler)(LongPressDragEvent::LongPress(position));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::GestureDetector;
    use crate::pointer::PointerId;
    use alloc::vec::Vec;
    use kurbo::Size;

    fn detector() -> GestureDetector {
        GestureDetector::new(Size::new(400.0, 400.0))
    }

    fn run_drag(immediately: bool, steps: &[PointerChange]) -> (Vec<DragEvent>, DragPhase) {
        let mut events = Vec::new();
        let mut d = detector();
        let mut drag = DragGestureFilter::new(GestureConfig::default(), |e| {
            events.push(e);
            Vec2::ZERO
        })
        .start_immediately(immediately);
        for &change in steps {
            d.dispatch(&mut [&mut drag], &mut [change]).unwrap();
        }
        let phase = drag.phase();
        drop(drag);
        (events, phase)
    }

    #[test]
    fn slop_gates_the_start() {
        let down = PointerChange::down(PointerId(0), 0, Point::new(100.0, 100.0));
        let small = down.moved_to(16, Point::new(100.0, 110.0));
        let (events, phase) = run_drag(false, &[down, small]);
        assert!(events.is_empty());
        assert_eq!(phase, DragPhase::Idle);
    }

    #[test]
    fn slop_then_lift_without_start_rearms() {
        let down = PointerChange::down(PointerId(0), 0, Point::new(100.0, 100.0));
        let small = down.moved_to(16, Point::new(100.0, 110.0));
        let (events, phase) = run_drag(false, &[down, small, small.up(32)]);
        assert!(events.is_empty());
        assert_eq!(phase, DragPhase::Idle);
    }

    #[test]
    fn immediate_press_then_lift_stops_once() {
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 20.0));
        let (events, phase) = run_drag(true, &[down, down.up(100)]);
        assert_eq!(
            events,
            [
                DragEvent::Start(Point::new(10.0, 20.0)),
                DragEvent::Stop(Vec2::ZERO),
            ]
        );
        assert_eq!(phase, DragPhase::Idle);
    }

    #[test]
    fn immediate_press_then_move_starts_once() {
        let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 20.0));
        let m = down.moved_to(16, Point::new(12.0, 20.0));
        let (events, _) = run_drag(true, &[down, m, m.up(32)]);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], DragEvent::Start(Point::new(10.0, 20.0)));
        assert_eq!(events[1], DragEvent::Drag(Vec2::new(2.0, 0.0)));
        assert!(matches!(events[2], DragEvent::Stop(_)));
    }

    #[test]
    fn second_gesture_needs_slop_again() {
        let down = PointerChange::down(PointerId(0), 0, Point::new(100.0, 100.0));
        let far = down.moved_to(16, Point::new(150.0, 100.0));
        let up = far.up(32);
        let again = PointerChange::down(PointerId(0), 100, Point::new(100.0, 100.0));
        let small = again.moved_to(116, Point::new(105.0, 100.0));
        let (events, phase) = run_drag(false, &[down, far, up, again, small]);
        assert_eq!(events.len(), 3, "start, drag, stop of the first gesture only");
        assert_eq!(phase, DragPhase::Idle);
    }

    #[test]
    fn cancel_mid_drag_reports_once() {
        let mut events = Vec::new();
        let mut d = detector();
        let mut drag = DragGestureFilter::new(GestureConfig::default(), |e| {
            events.push(e);
            Vec2::ZERO
        });
        let down = PointerChange::down(PointerId(0), 0, Point::new(0.0, 0.0));
        d.dispatch(&mut [&mut drag], &mut [down]).unwrap();
        d.dispatch(&mut [&mut drag], &mut [down.moved_to(10, Point::new(40.0, 0.0))])
            .unwrap();
        d.cancel(&mut [&mut drag]);
        d.cancel(&mut [&mut drag]);
        drop(drag);
        assert_eq!(events.last(), Some(&DragEvent::Cancel));
        assert_eq!(events.iter().filter(|e| **e == DragEvent::Cancel).count(), 1);
    }

    #[test]
    fn cancel_after_press_start_reports_cancel() {
        let mut events = Vec::new();
        let mut d = detector();
        let mut drag = DragGestureFilter::new(GestureConfig::default(), |e| {
            events.push(e);
            Vec2::ZERO
        })
        .start_immediately(true);
        let down = PointerChange::down(PointerId(0), 0, Point::new(1.0, 1.0));
        d.dispatch(&mut [&mut drag], &mut [down]).unwrap();
        d.cancel(&mut [&mut drag]);
        drop(drag);
        assert_eq!(
            events,
            [DragEvent::Start(Point::new(1.0, 1.0)), DragEvent::Cancel]
        );
    }

    fn run_long_press_drag(
        script: impl FnOnce(&mut GestureDetector, &mut dyn GestureFilter),
    ) -> Vec<LongPressDragEvent> {
        let mut events = Vec::new();
        let mut d = detector();
        let mut drag = LongPressDragGestureFilter::new(GestureConfig::default(), |e| {
            events.push(e);
            Vec2::ZERO
        });
        script(&mut d, &mut drag);
        drop(drag);
        events
    }

    #[test]
    fn long_press_then_drag() {
        let events = run_long_press_drag(|d, drag| {
            let down = PointerChange::down(PointerId(0), 0, Point::new(50.0, 50.0));
            d.dispatch(&mut [&mut *drag], &mut [down]).unwrap();
            let early = down.moved_to(100, Point::new(52.0, 50.0));
            d.dispatch(&mut [&mut *drag], &mut [early]).unwrap();
            d.advance_time(&mut [&mut *drag], 500).unwrap();
            let pull = early.moved_to(600, Point::new(80.0, 50.0));
            d.dispatch(&mut [&mut *drag], &mut [pull]).unwrap();
            d.dispatch(&mut [&mut *drag], &mut [pull.up(616)]).unwrap();
        });
        assert_eq!(events[0], LongPressDragEvent::LongPress(Point::new(52.0, 50.0)));
        assert_eq!(events[1], LongPressDragEvent::DragStart);
        assert_eq!(events[2], LongPressDragEvent::Drag(Vec2::new(28.0, 0.0)));
        assert!(matches!(events[3], LongPressDragEvent::Stop(_)));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn no_drag_before_long_press() {
        let events = run_long_press_drag(|d, drag| {
            let down = PointerChange::down(PointerId(0), 0, Point::new(50.0, 50.0));
            d.dispatch(&mut [&mut *drag], &mut [down]).unwrap();
            let moved = down.moved_to(100, Point::new(90.0, 50.0));
            d.dispatch(&mut [&mut *drag], &mut [moved]).unwrap();
            d.dispatch(&mut [&mut *drag], &mut [moved.up(200)]).unwrap();
            d.advance_time(&mut [&mut *drag], 1000).unwrap();
        });
        assert!(events.is_empty());
    }

    #[test]
    fn cancel_after_long_press_reports_cancel_once() {
        let events = run_long_press_drag(|d, drag| {
            let down = PointerChange::down(PointerId(0), 0, Point::new(50.0, 50.0));
            d.dispatch(&mut [&mut *drag], &mut [down]).unwrap();
            d.advance_time(&mut [&mut *drag], 600).unwrap();
            d.cancel(&mut [&mut *drag]);
            d.cancel(&mut [&mut *drag]);
        });
        assert_eq!(
            events,
            [
                LongPressDragEvent::LongPress(Point::new(50.0, 50.0)),
                LongPressDragEvent::Cancel,
            ]
        );
    }
}
