// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by the dispatcher.
//!
//! Every precondition is checked before any state is touched, so an `Err` always leaves
//! the dispatcher exactly as it was before the call.

use kurbo::{Point, Rect};

use crate::event::TouchAction;
use crate::sink::SinkError;
use crate::types::{Buttons, Key, MouseButton, PointerId};

/// Broad classes of [`InjectError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An intent that is illegal in the current input state (double down, up without
    /// down, enter while hovering, ...).
    Protocol,
    /// An invalid duration or timestamp.
    Timing,
    /// The dispatcher has already sent or been disposed.
    Lifecycle,
    /// The sink rejected an event during `send`.
    Delivery,
}

/// Error returned by the dispatcher's fallible operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum InjectError {
    /// `touch_down` for a pointer that is already down.
    #[error("Cannot send DOWN event, a gesture is already in progress for pointer {0}")]
    PointerAlreadyDown(PointerId),
    /// A touch intent other than down while no touch gesture exists.
    #[error("Cannot send {action} event, no gesture is in progress")]
    NoTouchGesture {
        /// The event that could not be sent.
        action: TouchAction,
    },
    /// A touch intent naming a pointer that is not down.
    #[error("Cannot send {action} event for pointer {id}, it is not active in the current gesture")]
    PointerNotActive {
        /// The event that could not be sent.
        action: TouchAction,
        /// The unknown pointer.
        id: PointerId,
    },
    /// A historical sample is not in the past.
    #[error(
        "Relative historical times should be negative, in order to be in the past (offset {index} was: {offset})"
    )]
    HistoryNotInPast {
        /// Index of the offending sample.
        index: usize,
        /// Its relative time.
        offset: i64,
    },
    /// A historical sample predates the previous touch event.
    #[error(
        "Relative historical times should not be earlier than the previous event (offset {index} was: {offset}, {earliest})"
    )]
    HistoryBeforePreviousEvent {
        /// Index of the offending sample.
        index: usize,
        /// Its relative time.
        offset: i64,
        /// The earliest allowed relative time.
        earliest: i64,
    },
    /// Historical coordinates do not have one list per active pointer.
    #[error("Historical coordinates need one list per active pointer ({expected}), got {actual}")]
    HistoryPointerCount {
        /// Number of active pointers.
        expected: usize,
        /// Number of coordinate lists given.
        actual: usize,
    },
    /// A pointer's historical coordinates do not match the number of historical times.
    #[error("Historical coordinates of pointer {id} have {actual} entries, expected {expected}")]
    HistorySampleCount {
        /// The pointer whose list is off.
        id: PointerId,
        /// Number of historical times.
        expected: usize,
        /// Number of coordinates given.
        actual: usize,
    },
    /// `mouse_press` for a button that is already pressed.
    #[error("Cannot send mouse button down event, button {0:?} is already pressed")]
    ButtonAlreadyPressed(MouseButton),
    /// `mouse_press` outside the root with no button down.
    #[error(
        "Cannot start a mouse gesture outside the root bounds, mouse position is {position:?} and bounds are {bounds:?}"
    )]
    GestureOutOfBounds {
        /// Current mouse position.
        position: Point,
        /// Current root bounds.
        bounds: Rect,
    },
    /// `mouse_release` for a button that is not pressed.
    #[error("Cannot send mouse button up event, button {0:?} is not pressed")]
    ButtonNotPressed(MouseButton),
    /// `mouse_enter` while already hovering.
    #[error("Cannot send mouse hover enter event, mouse is already hovering")]
    AlreadyHovering,
    /// `mouse_enter` while buttons are down.
    #[error("Cannot send mouse hover enter event, mouse buttons are down ({0:?})")]
    EnterWithButtonsDown(Buttons),
    /// `mouse_enter` at a position outside the root.
    #[error("Cannot send mouse hover enter event, {position:?} is out of bounds {bounds:?}")]
    EnterOutOfBounds {
        /// Requested position.
        position: Point,
        /// Current root bounds.
        bounds: Rect,
    },
    /// `mouse_exit` while not hovering.
    #[error("Cannot send mouse hover exit event, mouse is not hovering")]
    NotHovering,
    /// `mouse_cancel` with no buttons down.
    #[error("Cannot send mouse cancel event, no mouse buttons are pressed")]
    NoButtonsPressed,
    /// `key_down` for a key that is already down.
    #[error("Cannot send key down event, {0:?} is already pressed down")]
    KeyAlreadyDown(Key),
    /// `key_up` for a key that is not down.
    #[error("Cannot send key up event, {0:?} is not pressed down")]
    KeyNotDown(Key),
    /// `advance_event_time` with a negative duration.
    #[error("duration of a delay can only be positive, not {0}")]
    NegativeDuration(i64),
    /// An enqueue or advance after `send` or `dispose`.
    #[error("events already dispatched or disposed")]
    EnqueueAfterTerminal,
    /// A `send` after `send` or `dispose`.
    #[error("events have already been dispatched or disposed")]
    SendAfterTerminal,
    /// The sink failed part way through a batch. Events after `index` were dropped.
    #[error("sink rejected event {index} of {total}: {source}")]
    Delivery {
        /// Index of the rejected event within the batch.
        index: usize,
        /// Size of the batch.
        total: usize,
        /// What the sink reported.
        #[source]
        source: SinkError,
    },
}

impl InjectError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativeDuration(_)
            | Self::HistoryNotInPast { .. }
            | Self::HistoryBeforePreviousEvent { .. } => ErrorKind::Timing,
            Self::EnqueueAfterTerminal | Self::SendAfterTerminal => ErrorKind::Lifecycle,
            Self::Delivery { .. } => ErrorKind::Delivery,
            _ => ErrorKind::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_offender() {
        let msg = InjectError::PointerAlreadyDown(PointerId(3)).to_string();
        assert!(msg.contains("pointer 3"), "{msg}");

        let msg = InjectError::GestureOutOfBounds {
            position: Point::new(-1.0, 5.0),
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
        }
        .to_string();
        assert!(msg.contains("-1.0"), "{msg}");

        let msg = InjectError::PointerNotActive {
            action: TouchAction::Up,
            id: PointerId(7),
        }
        .to_string();
        assert_eq!(
            msg,
            "Cannot send UP event for pointer 7, it is not active in the current gesture"
        );
    }

    #[test]
    fn lifecycle_messages_are_distinct() {
        assert_eq!(
            InjectError::EnqueueAfterTerminal.to_string(),
            "events already dispatched or disposed"
        );
        assert_eq!(
            InjectError::SendAfterTerminal.to_string(),
            "events have already been dispatched or disposed"
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(InjectError::NegativeDuration(-1).kind(), ErrorKind::Timing);
        assert_eq!(InjectError::SendAfterTerminal.kind(), ErrorKind::Lifecycle);
        assert_eq!(InjectError::NotHovering.kind(), ErrorKind::Protocol);
        assert_eq!(
            InjectError::Delivery {
                index: 0,
                total: 1,
                source: SinkError::new("closed"),
            }
            .kind(),
            ErrorKind::Delivery
        );
    }
}
