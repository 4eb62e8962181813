// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite gestures built from the primitive `enqueue_*` operations.

use kurbo::Point;

use crate::clock::EventClock;
use crate::dispatcher::InputDispatcher;
use crate::error::InjectError;
use crate::sink::{EventSink, InjectionRoot};
use crate::types::{MouseButton, PointerId};

impl<R: InjectionRoot, S: EventSink> InputDispatcher<R, S> {
    /// Tap at `position` with pointer `id`: down, one event period, up.
    pub fn click(&mut self, id: PointerId, position: Point) -> Result<(), InjectError> {
        self.enqueue_touch_down(id, position)?;
        self.advance_by_period()?;
        self.enqueue_touch_up(id)
    }

    /// Press at `position` for `duration` milliseconds, then lift.
    pub fn long_click(
        &mut self,
        id: PointerId,
        position: Point,
        duration: i64,
    ) -> Result<(), InjectError> {
        EventClock::check(duration)?;
        self.enqueue_touch_down(id, position)?;
        self.advance_event_time(duration)?;
        self.enqueue_touch_up(id)
    }

    /// Drag pointer `id` in a straight line from `start` to `end` over `duration`
    /// milliseconds.
    ///
    /// Moves are spaced one event period apart, with the last one landing exactly on `end`
    /// at `duration`.
    ///
    /// ```
    /// use kurbo::{Point, Rect};
    /// use understory_inject::dispatcher::InputDispatcher;
    /// use understory_inject::event::TouchAction;
    /// use understory_inject::sink::{FixedRoot, RecordingSink};
    /// use understory_inject::types::PointerId;
    ///
    /// let root = FixedRoot(Rect::new(0.0, 0.0, 200.0, 200.0));
    /// let mut d = InputDispatcher::new(root, RecordingSink::new());
    /// d.swipe(PointerId(0), Point::new(10.0, 10.0), Point::new(110.0, 10.0), 64).unwrap();
    ///
    /// let touch: Vec<_> = d.pending().iter().filter_map(|e| e.as_touch()).collect();
    /// assert_eq!(touch.len(), 6); // down, 4 moves, up
    /// assert_eq!(touch[4].action, TouchAction::Move);
    /// assert_eq!(touch[4].event_time, 64);
    /// assert_eq!(touch[4].pointers[0].position, Point::new(110.0, 10.0));
    /// ```
    pub fn swipe(
        &mut self,
        id: PointerId,
        start: Point,
        end: Point,
        duration: u64,
    ) -> Result<(), InjectError> {
        let period = self.config().event_period.max(1);
        let steps = duration.div_ceil(period).max(1);
        self.enqueue_touch_down(id, start)?;
        let mut elapsed = 0;
        for step in 1..=steps {
            let t = scaled(duration, step, steps);
            self.advance_event_time(to_duration(t - elapsed))?;
            elapsed = t;
            #[allow(
                clippy::cast_precision_loss,
                reason = "step counts stay far below 2^52"
            )]
            let progress = step as f64 / steps as f64;
            self.update_touch_pointer(id, start.lerp(end, progress))?;
            self.enqueue_touch_move()?;
        }
        self.enqueue_touch_up(id)
    }

    /// Click `button` at `position`: move there, press, one event period, release.
    pub fn mouse_click(&mut self, button: MouseButton, position: Point) -> Result<(), InjectError> {
        self.enqueue_mouse_move(position)?;
        self.enqueue_mouse_press(button)?;
        self.advance_by_period()?;
        self.enqueue_mouse_release(button)
    }
}

/// `total * step / steps` without overflowing; `step <= steps`.
fn scaled(total: u64, step: u64, steps: u64) -> u64 {
    let t = u128::from(total) * u128::from(step) / u128::from(steps);
    u64::try_from(t).unwrap_or(total)
}

fn to_duration(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use crate::dispatcher::{DispatcherConfig, InputDispatcher};
    use crate::error::InjectError;
    use crate::event::{InjectedEvent, MouseAction, TouchAction};
    use crate::sink::{FixedRoot, RecordingSink};
    use crate::types::{MouseButton, PointerId};
    use alloc::vec::Vec;
    use kurbo::{Point, Rect};

    fn dispatcher() -> InputDispatcher<FixedRoot, RecordingSink> {
        InputDispatcher::new(
            FixedRoot(Rect::new(0.0, 0.0, 100.0, 100.0)),
            RecordingSink::new(),
        )
    }

    #[test]
    fn click_spans_one_period() {
        let mut d = dispatcher();
        d.click(PointerId(0), Point::new(5.0, 5.0)).unwrap();
        let touch: Vec<_> = d.pending().iter().filter_map(InjectedEvent::as_touch).collect();
        assert_eq!(touch[0].action, TouchAction::Down);
        assert_eq!(touch[1].action, TouchAction::Up);
        assert_eq!(touch[1].event_time - touch[0].event_time, 16);
    }

    #[test]
    fn long_click_holds_for_duration() {
        let mut d = dispatcher();
        d.long_click(PointerId(0), Point::new(5.0, 5.0), 600).unwrap();
        assert_eq!(d.pending().last().map(InjectedEvent::event_time), Some(600));
    }

    #[test]
    fn long_click_rejects_negative_duration_before_pressing() {
        let mut d = dispatcher();
        assert_eq!(
            d.long_click(PointerId(0), Point::new(5.0, 5.0), -1),
            Err(InjectError::NegativeDuration(-1))
        );
        assert!(d.pending().is_empty());
        assert!(!d.is_touch_in_progress());
        assert_eq!(d.now(), 0);
    }

    #[test]
    fn swipe_ends_on_target_with_uneven_steps() {
        let mut d = dispatcher();
        d.swipe(PointerId(1), Point::ZERO, Point::new(50.0, 0.0), 40).unwrap();
        let touch: Vec<_> = d.pending().iter().filter_map(InjectedEvent::as_touch).collect();
        let times: Vec<_> = touch.iter().map(|t| t.event_time).collect();
        assert_eq!(times, [0, 13, 26, 40, 40]);
        let last_move = touch[touch.len() - 2];
        assert_eq!(last_move.pointers[0].position, Point::new(50.0, 0.0));
    }

    #[test]
    fn swipe_interpolates_huge_durations() {
        let config = DispatcherConfig {
            event_period: 1 << 60,
            ..DispatcherConfig::default()
        };
        let mut d = InputDispatcher::with_config(
            FixedRoot(Rect::new(0.0, 0.0, 100.0, 100.0)),
            RecordingSink::new(),
            config,
        );
        d.swipe(PointerId(0), Point::ZERO, Point::new(40.0, 0.0), 1 << 62).unwrap();
        let touch: Vec<_> = d.pending().iter().filter_map(InjectedEvent::as_touch).collect();
        let times: Vec<_> = touch.iter().map(|t| t.event_time).collect();
        assert_eq!(times, [0, 1 << 60, 1 << 61, 3 << 60, 1 << 62, 1 << 62]);
        assert_eq!(touch[2].pointers[0].position, Point::new(20.0, 0.0));
    }

    #[test]
    fn mouse_click_sequence() {
        let mut d = dispatcher();
        d.mouse_click(MouseButton::Secondary, Point::new(5.0, 5.0)).unwrap();
        let actions: Vec<_> = d
            .pending()
            .iter()
            .filter_map(InjectedEvent::as_mouse)
            .map(|m| m.action)
            .collect();
        assert_eq!(
            actions,
            [
                MouseAction::HoverEnter,
                MouseAction::HoverMove,
                MouseAction::HoverExit,
                MouseAction::Down,
                MouseAction::Press,
                MouseAction::Release,
                MouseAction::Up,
                MouseAction::HoverEnter,
                MouseAction::HoverMove,
            ]
        );
    }
}
