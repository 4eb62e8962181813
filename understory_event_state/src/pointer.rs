// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer change model shared by every gesture filter.
//!
//! A [`PointerChange`] pairs the previous and current [`PointerSample`] of one pointer with
//! what has already been consumed by filters that saw it earlier. Filters read changes through
//! the consumption-aware helpers ([`PointerChange::changed_to_down`],
//! [`PointerChange::position_change`]) and mark what they handled with the `consume_*` methods,
//! so filters visited later in the same pass (or in a later pass) see less.
//!
//! ```
//! use kurbo::{Point, Vec2};
//! use understory_event_state::pointer::{PointerChange, PointerId};
//!
//! let down = PointerChange::down(PointerId(0), 0, Point::new(10.0, 10.0));
//! assert!(down.changed_to_down());
//!
//! let mut moved = down.moved_to(16, Point::new(14.0, 10.0));
//! assert_eq!(moved.position_change(), Vec2::new(4.0, 0.0));
//!
//! moved.consume_position_change(Vec2::new(4.0, 0.0));
//! assert_eq!(moved.position_change(), Vec2::ZERO);
//! assert!(moved.position_change_consumed());
//! ```

use core::fmt;

use kurbo::{Point, Vec2};

/// Identifier of one pointer (finger, mouse, stylus) for the length of a gesture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerId(pub u64);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pointer state at one instant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerSample {
    /// Milliseconds on the input clock.
    pub uptime: u64,
    /// Position in the filter's local coordinates.
    pub position: Point,
    /// Whether the pointer is touching / a button is held.
    pub pressed: bool,
}

/// What earlier filters have already handled in a [`PointerChange`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ConsumedData {
    /// Amount of the position change that was consumed.
    pub position_change: Vec2,
    /// Whether the pressed/released transition was consumed.
    pub down_change: bool,
}

/// The change of one pointer between two consecutive events.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerChange {
    /// Pointer this change belongs to.
    pub id: PointerId,
    /// State now.
    pub current: PointerSample,
    /// State at the previous event for this pointer.
    pub previous: PointerSample,
    /// Consumption recorded so far.
    pub consumed: ConsumedData,
}

impl PointerChange {
    /// A fresh change with nothing consumed.
    pub fn new(id: PointerId, previous: PointerSample, current: PointerSample) -> Self {
        Self {
            id,
            current,
            previous,
            consumed: ConsumedData::default(),
        }
    }

    /// A pointer pressing down at `position`.
    pub fn down(id: PointerId, uptime: u64, position: Point) -> Self {
        let current = PointerSample {
            uptime,
            position,
            pressed: true,
        };
        Self::new(
            id,
            PointerSample {
                pressed: false,
                ..current
            },
            current,
        )
    }

    /// The next change of this pointer: still pressed, now at `position`.
    pub fn moved_to(&self, uptime: u64, position: Point) -> Self {
        Self::new(
            self.id,
            self.current,
            PointerSample {
                uptime,
                position,
                pressed: true,
            },
        )
    }

    /// The next change of this pointer: released where it currently is.
    pub fn up(&self, uptime: u64) -> Self {
        self.released_at(uptime, self.current.position)
    }

    /// The next change of this pointer: released at `position`.
    pub fn released_at(&self, uptime: u64, position: Point) -> Self {
        Self::new(
            self.id,
            self.current,
            PointerSample {
                uptime,
                position,
                pressed: false,
            },
        )
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.current.position
    }

    /// Current uptime.
    pub fn uptime(&self) -> u64 {
        self.current.uptime
    }

    /// Whether the pointer is currently pressed.
    pub fn pressed(&self) -> bool {
        self.current.pressed
    }

    /// Went from released to pressed, and nobody consumed that yet.
    pub fn changed_to_down(&self) -> bool {
        !self.consumed.down_change && self.changed_to_down_ignore_consumed()
    }

    /// Went from released to pressed.
    pub fn changed_to_down_ignore_consumed(&self) -> bool {
        !self.previous.pressed && self.current.pressed
    }

    /// Went from pressed to released, and nobody consumed that yet.
    pub fn changed_to_up(&self) -> bool {
        !self.consumed.down_change && self.changed_to_up_ignore_consumed()
    }

    /// Went from pressed to released.
    pub fn changed_to_up_ignore_consumed(&self) -> bool {
        self.previous.pressed && !self.current.pressed
    }

    /// Movement since the previous event minus what has been consumed.
    pub fn position_change(&self) -> Vec2 {
        self.position_change_ignore_consumed() - self.consumed.position_change
    }

    /// Movement since the previous event.
    pub fn position_change_ignore_consumed(&self) -> Vec2 {
        self.current.position - self.previous.position
    }

    /// Whether any movement was consumed.
    pub fn position_change_consumed(&self) -> bool {
        self.consumed.position_change != Vec2::ZERO
    }

    /// Whether anything at all was consumed.
    pub fn any_change_consumed(&self) -> bool {
        self.position_change_consumed() || self.consumed.down_change
    }

    /// Mark the press/release transition as handled. No effect if there is none.
    pub fn consume_down_change(&mut self) {
        if self.current.pressed != self.previous.pressed {
            self.consumed.down_change = true;
        }
    }

    /// Mark `amount` of the movement as handled.
    pub fn consume_position_change(&mut self, amount: Vec2) {
        self.consumed.position_change += amount;
    }

    /// Mark whatever movement is left as handled.
    pub fn consume_remaining_position_change(&mut self) {
        let remaining = self.position_change();
        self.consume_position_change(remaining);
    }

    /// Consume both the transition and the movement.
    pub fn consume_all_changes(&mut self) {
        self.consume_down_change();
        self.consume_remaining_position_change();
    }
}

/// The ordered visits every pointer event makes through a filter chain.
///
/// `Initial` runs from the outermost filter inwards so ancestors can pre-empt their
/// descendants, `Main` runs from the innermost filter outwards, and `Final` runs outermost
/// first again so ancestors can react to what descendants consumed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerEventPass {
    /// Ancestors first, before anyone handled the event.
    Initial,
    /// Descendants first; the normal place to react.
    Main,
    /// Ancestors first, after everyone had a chance to consume.
    Final,
}

impl PointerEventPass {
    /// All passes in the order they run.
    pub const ALL: [Self; 3] = [Self::Initial, Self::Main, Self::Final];

    /// Whether this pass visits the innermost filter first.
    pub const fn descendants_first(self) -> bool {
        matches!(self, Self::Main)
    }
}

/// Cardinal direction of movement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Negative x.
    Left,
    /// Negative y.
    Up,
    /// Positive x.
    Right,
    /// Positive y.
    Down,
}

impl Direction {
    /// Horizontal direction of `delta`, if it moves horizontally at all.
    pub fn horizontal(delta: Vec2) -> Option<Self> {
        if delta.x < 0.0 {
            Some(Self::Left)
        } else if delta.x > 0.0 {
            Some(Self::Right)
        } else {
            None
        }
    }

    /// Vertical direction of `delta`, if it moves vertically at all.
    pub fn vertical(delta: Vec2) -> Option<Self> {
        if delta.y < 0.0 {
            Some(Self::Up)
        } else if delta.y > 0.0 {
            Some(Self::Down)
        } else {
            None
        }
    }
}

/// Mean of the consumption-aware position changes; zero for an empty slice.
pub fn average_position_change(changes: &[PointerChange]) -> Vec2 {
    if changes.is_empty() {
        return Vec2::ZERO;
    }
    let sum = changes
        .iter()
        .fold(Vec2::ZERO, |sum, c| sum + c.position_change());
    sum / count_as_f64(changes.len())
}

#[allow(
    clippy::cast_precision_loss,
    reason = "pointer counts are tiny"
)]
pub(crate) fn count_as_f64(n: usize) -> f64 {
    n as f64
}
