// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Low-level event records handed to an [`EventSink`](crate::sink::EventSink).
//!
//! Every record carries its own `event_time` (the virtual clock at enqueue time) and the
//! `down_time` of the press it belongs to, so a sink can rebuild platform events without
//! consulting the dispatcher.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;

use crate::types::{Buttons, Key, MetaState, MouseButton, PointerId, ScrollWheel};

/// A synthesized low-level input event.
#[derive(Clone, Debug, PartialEq)]
pub enum InjectedEvent {
    /// A touch event carrying all active pointers.
    Touch(TouchEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// A key event.
    Key(KeyEvent),
    /// A rotary encoder (crown, knob) scroll.
    Rotary(RotaryEvent),
}

impl InjectedEvent {
    /// Timestamp at which the event was enqueued.
    pub fn event_time(&self) -> u64 {
        match self {
            Self::Touch(e) => e.event_time,
            Self::Mouse(e) => e.event_time,
            Self::Key(e) => e.event_time,
            Self::Rotary(e) => e.event_time,
        }
    }

    /// Start time of the press this event belongs to.
    ///
    /// For events outside of any press (hover, rotary) this is the most recent down time
    /// of the same modality.
    pub fn down_time(&self) -> u64 {
        match self {
            Self::Touch(e) => e.down_time,
            Self::Mouse(e) => e.down_time,
            Self::Key(e) => e.down_time,
            Self::Rotary(e) => e.event_time,
        }
    }

    /// The touch record, if this is one.
    pub fn as_touch(&self) -> Option<&TouchEvent> {
        match self {
            Self::Touch(e) => Some(e),
            _ => None,
        }
    }

    /// The mouse record, if this is one.
    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match self {
            Self::Mouse(e) => Some(e),
            _ => None,
        }
    }

    /// The key record, if this is one.
    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key(e) => Some(e),
            _ => None,
        }
    }
}

/// Kind of a touch event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TouchAction {
    /// The first pointer of a gesture went down.
    Down,
    /// An additional pointer went down.
    PointerDown,
    /// One or more pointers moved.
    Move,
    /// A pointer went up while others remain down.
    PointerUp,
    /// The last pointer went up.
    Up,
    /// The gesture was aborted.
    Cancel,
}

impl fmt::Display for TouchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Down => "DOWN",
            Self::PointerDown => "POINTER_DOWN",
            Self::Move => "MOVE",
            Self::PointerUp => "POINTER_UP",
            Self::Up => "UP",
            Self::Cancel => "CANCEL",
        })
    }
}

/// One pointer inside a [`TouchEvent`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchPointer {
    /// Pointer id.
    pub id: PointerId,
    /// Position at `event_time`.
    pub position: Point,
}

/// Positions of all pointers at one historical instant of a batched move.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricalSample {
    /// Absolute time of the sample.
    pub event_time: u64,
    /// One position per pointer, in the same order as [`TouchEvent::pointers`].
    pub positions: SmallVec<[Point; 4]>,
}

/// A touch event.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchEvent {
    /// What happened.
    pub action: TouchAction,
    /// Index into `pointers` of the pointer that went down or up; `0` for moves and cancels.
    pub action_index: usize,
    /// All pointers of the gesture, sorted by id. Includes the pointer going up on
    /// [`TouchAction::Up`] and [`TouchAction::PointerUp`].
    pub pointers: SmallVec<[TouchPointer; 4]>,
    /// Batched samples preceding `event_time`, oldest first. Only moves carry history.
    pub history: Vec<HistoricalSample>,
    /// Time of the first down of the gesture.
    pub down_time: u64,
    /// Time of this event.
    pub event_time: u64,
    /// Keyboard meta state at the time of this event.
    pub meta: MetaState,
}

impl TouchEvent {
    /// The pointer this event is about, for downs and ups.
    pub fn action_pointer(&self) -> Option<&TouchPointer> {
        match self.action {
            TouchAction::Down | TouchAction::PointerDown | TouchAction::PointerUp | TouchAction::Up => {
                self.pointers.get(self.action_index)
            }
            TouchAction::Move | TouchAction::Cancel => None,
        }
    }

    /// Position of pointer `id` in this event.
    pub fn position_of(&self, id: PointerId) -> Option<Point> {
        self.pointers.iter().find(|p| p.id == id).map(|p| p.position)
    }
}

/// Kind of a mouse event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseAction {
    /// The mouse started hovering over the root.
    HoverEnter,
    /// The mouse moved while hovering.
    HoverMove,
    /// The mouse stopped hovering over the root.
    HoverExit,
    /// The first button went down.
    Down,
    /// The mouse moved, or the button state changed, while a button is down.
    Move,
    /// A button was pressed; follows [`MouseAction::Down`] or [`MouseAction::Move`].
    Press,
    /// A button was released; precedes [`MouseAction::Up`] or [`MouseAction::Move`].
    Release,
    /// The last button went up.
    Up,
    /// The mouse gesture was aborted.
    Cancel,
    /// A wheel was scrolled.
    Scroll,
}

/// Wheel movement carried by a [`MouseAction::Scroll`] event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollDelta {
    /// Which wheel moved.
    pub wheel: ScrollWheel,
    /// Axis value in platform convention: vertical values are the negated wheel delta,
    /// horizontal values are the wheel delta.
    pub axis_value: f32,
}

/// A mouse event.
#[derive(Clone, Debug, PartialEq)]
pub struct MouseEvent {
    /// What happened.
    pub action: MouseAction,
    /// Mouse position.
    pub position: Point,
    /// Buttons down after this event took effect.
    pub buttons: Buttons,
    /// The button pressed or released, for [`MouseAction::Press`] and [`MouseAction::Release`].
    pub action_button: Option<MouseButton>,
    /// Wheel movement, for [`MouseAction::Scroll`].
    pub scroll: Option<ScrollDelta>,
    /// Time at which the first of the currently (or most recently) pressed buttons went down.
    pub down_time: u64,
    /// Time of this event.
    pub event_time: u64,
    /// Keyboard meta state at the time of this event.
    pub meta: MetaState,
}

/// Kind of a key event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Key pressed, or auto-repeated while held.
    Down,
    /// Key released.
    Up,
}

/// A key event.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent {
    /// What happened.
    pub action: KeyAction,
    /// The key.
    pub key: Key,
    /// `0` for the initial down and for ups, then `1`, `2`, … for auto-repeats.
    pub repeat_count: u32,
    /// Modifier and lock state, computed after this event took effect.
    pub meta: MetaState,
    /// Time of the most recent key down.
    pub down_time: u64,
    /// Time of this event.
    pub event_time: u64,
}

/// Axis of a rotary scroll.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RotaryAxis {
    /// Horizontal scroll.
    Horizontal,
    /// Vertical scroll.
    Vertical,
}

/// A rotary encoder scroll.
#[derive(Clone, Debug, PartialEq)]
pub struct RotaryEvent {
    /// Scroll axis.
    pub axis: RotaryAxis,
    /// Scroll amount in pixels.
    pub pixels: f32,
    /// Time of this event.
    pub event_time: u64,
}
