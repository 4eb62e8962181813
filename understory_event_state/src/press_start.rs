// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw press-start detection.
//!
//! Fires the moment every change in a pass goes down, then keeps consuming down changes while
//! active so descendants do not see the press. States: `Inactive` → `Active` on press start,
//! back to `Inactive` when everything goes up or the filter is cancelled or disabled.

use kurbo::Point;

use crate::filter::{FilterContext, GestureFilter};
use crate::pointer::{PointerChange, PointerEventPass};

/// Core state machine of [`RawPressStartGestureFilter`], without a handler.
#[derive(Clone, Debug)]
pub struct RawPressStart {
    enabled: bool,
    execution_pass: PointerEventPass,
    active: bool,
}

impl Default for RawPressStart {
    fn default() -> Self {
        Self {
            enabled: true,
            execution_pass: PointerEventPass::Initial,
            active: false,
        }
    }
}

impl RawPressStart {
    /// Enabled, running on the [`Initial`](PointerEventPass::Initial) pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a press is currently being tracked.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the filter may fire.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable; disabling also cancels an active press.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel();
        }
    }

    /// Pass the filter acts on.
    pub fn execution_pass(&self) -> PointerEventPass {
        self.execution_pass
    }

    /// Choose the pass the filter acts on.
    pub fn set_execution_pass(&mut self, pass: PointerEventPass) {
        self.execution_pass = pass;
    }

    /// Process one pass. Returns the press position when a press started.
    pub fn process(
        &mut self,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) -> Option<Point> {
        if pass != self.execution_pass {
            return None;
        }
        let mut started = None;
        if self.enabled && changes.iter().all(PointerChange::changed_to_down) {
            self.active = true;
            started = changes.first().map(PointerChange::position);
            log::trace!("press start at {started:?}");
        } else if changes.iter().all(PointerChange::changed_to_up) {
            self.active = false;
        }
        if self.active {
            changes.iter_mut().for_each(PointerChange::consume_down_change);
        }
        started
    }

    /// Forget the active press.
    pub fn cancel(&mut self) {
        self.active = false;
    }
}

/// A [`RawPressStart`] that reports press starts to a handler.
///
/// ```
/// use kurbo::{Point, Size};
/// use understory_event_state::pass::GestureDetector;
/// use understory_event_state::pointer::{PointerChange, PointerId};
/// use understory_event_state::press_start::RawPressStartGestureFilter;
///
/// let mut presses = Vec::new();
/// let mut filter = RawPressStartGestureFilter::new(|p| presses.push(p));
/// let mut detector = GestureDetector::new(Size::new(100.0, 100.0));
///
/// let mut down = [PointerChange::down(PointerId(0), 0, Point::new(3.0, 4.0))];
/// detector.dispatch(&mut [&mut filter], &mut down).unwrap();
/// assert!(down[0].consumed.down_change);
///
/// drop(filter);
/// assert_eq!(presses, [Point::new(3.0, 4.0)]);
/// ```
pub struct RawPressStartGestureFilter<H> {
    state: RawPressStart,
    on_press_start: H,
}

impl<H: FnMut(Point)> RawPressStartGestureFilter<H> {
    /// An enabled filter on the initial pass.
    pub fn new(on_press_start: H) -> Self {
        Self {
            state: RawPressStart::new(),
            on_press_start,
        }
    }

    /// Underlying state machine.
    pub fn state(&self) -> &RawPressStart {
        &self.state
    }

    /// Underlying state machine, for reconfiguration.
    pub fn state_mut(&mut self) -> &mut RawPressStart {
        &mut self.state
    }
}

impl<H> core::fmt::Debug for RawPressStartGestureFilter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawPressStartGestureFilter")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<H: FnMut(Point)> GestureFilter for RawPressStartGestureFilter<H> {
    fn on_pointer_event(
        &mut self,
        _: &mut FilterContext<'_>,
        changes: &mut [PointerChange],
        pass: PointerEventPass,
    ) {
        if let Some(position) = self.state.process(changes, pass) {
            (self.on_press_start)(position);
        }
    }

    fn on_cancel(&mut self, _: &mut FilterContext<'_>) {
        self.state.cancel();
    }
}
