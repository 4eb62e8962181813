// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators at the dispatcher boundary.
//!
//! - [`InjectionRoot`] answers "where is the UI root?" for in/out of bounds decisions.
//! - [`EventSink`] receives each synthesized record on `send` and injects it into the
//!   surrounding UI runtime.
//!
//! [`RecordingSink`] and [`FixedRoot`] are ready-made implementations for tests.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::event::InjectedEvent;

/// The UI root events are injected into.
pub trait InjectionRoot {
    /// Current bounds of the root, in the coordinate space of injected positions.
    ///
    /// Queried on every call that needs an in/out of bounds decision.
    fn bounds(&self) -> Rect;
}

impl<R: InjectionRoot + ?Sized> InjectionRoot for &R {
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }
}

/// A root with fixed bounds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedRoot(pub Rect);

impl InjectionRoot for FixedRoot {
    fn bounds(&self) -> Rect {
        self.0
    }
}

/// Error reported by an [`EventSink`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Create an error with a description of what went wrong.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Platform injection point.
///
/// `inject` must deliver synchronously: when it returns `Ok`, the event has been handed to
/// the UI runtime.
pub trait EventSink {
    /// Deliver one event.
    fn inject(&mut self, event: &InjectedEvent) -> Result<(), SinkError>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn inject(&mut self, event: &InjectedEvent) -> Result<(), SinkError> {
        (**self).inject(event)
    }
}

/// Sink that stores everything it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Vec<InjectedEvent>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that rejects the `n`th event it sees (zero based), and everything after.
    pub fn failing_at(n: usize) -> Self {
        Self {
            events: Vec::new(),
            fail_at: Some(n),
        }
    }

    /// Events received so far, in delivery order.
    pub fn events(&self) -> &[InjectedEvent] {
        &self.events
    }

    /// Take the received events, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<InjectedEvent> {
        core::mem::take(&mut self.events)
    }
}

impl EventSink for RecordingSink {
    fn inject(&mut self, event: &InjectedEvent) -> Result<(), SinkError> {
        if self.fail_at.is_some_and(|n| self.events.len() >= n) {
            return Err(SinkError::new("recording sink closed"));
        }
        self.events.push(event.clone());
        Ok(())
    }
}
