// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The gesture filter trait and the context handed to filters.

use kurbo::Size;

use crate::pointer::{PointerChange, PointerEventPass};
use crate::scheduler::{TaskScope, TimerHandle};

/// Environment a filter runs in for one callback.
#[derive(Debug)]
pub struct FilterContext<'a> {
    /// Size of the region the filter is attached to; positions are local to it.
    pub bounds: Size,
    /// Timers shared by the filter chain.
    pub timers: &'a mut TaskScope,
}

impl<'a> FilterContext<'a> {
    /// Context over `bounds` using `timers`.
    pub fn new(bounds: Size, timers: &'a mut TaskScope) -> Self {
        Self { bounds, timers }
    }

    /// Current time of the timer clock.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// Whether `change` is pressed inside the half-open bounds `[0, w) x [0, h)`.
    pub fn pressed_in_bounds(&self, change: &PointerChange) -> bool {
        let p = change.position();
        change.pressed()
            && p.x >= 0.0
            && p.x < self.bounds.width
            && p.y >= 0.0
            && p.y < self.bounds.height
    }
}

/// A reactive state machine over pointer changes.
///
/// Filters see every pointer event three times, once per [`PointerEventPass`], and may consume
/// parts of the changes to hide them from filters visited later.
pub trait GestureFilter {
    /// React to `changes` during `pass`.
    fn on_pointer_event(
        &mut self,
        cx: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    );

    /// The gesture was cancelled from outside; drop all state.
    fn on_cancel(&mut self, cx: &mut FilterContext<'_>);

    /// A timer fired. Filters must ignore handles they did not schedule.
    fn on_timer(&mut self, cx: &mut FilterContext<'_>, timer: TimerHandle) {
        let _ = (cx, timer);
    }
}

impl<F: GestureFilter + ?Sized> GestureFilter for &mut F {
    fn on_pointer_event(
        &mut self,
        cx: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        (**self).on_pointer_event(cx, changes, pass);
    }

    fn on_cancel(&mut self, cx: &mut FilterContext<'_>) {
        (**self).on_cancel(cx);
    }

    fn on_timer(&mut self, cx: &mut FilterContext<'_>, timer: TimerHandle) {
        (**self).on_timer(cx, timer);
    }
}
