// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batching queue: events accumulate until one explicit `send`.
//!
//! ## Lifecycle
//!
//! ```text
//! Open ──send──▶ Sent
//!   │
//!   └──dispose──▶ Disposed
//! ```
//!
//! Both `Sent` and `Disposed` are terminal. Enqueuing in a terminal state fails with
//! [`InjectError::EnqueueAfterTerminal`], sending with [`InjectError::SendAfterTerminal`].
//! Disposing never delivers anything and may be repeated.

use alloc::vec::Vec;

use crate::error::InjectError;
use crate::event::InjectedEvent;
use crate::sink::EventSink;

/// Where an [`EventBatch`] is in its lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BatchState {
    /// Accepting events.
    #[default]
    Open,
    /// Delivered (possibly partially, if the sink failed).
    Sent,
    /// Discarded.
    Disposed,
}

/// An ordered batch of pending events.
#[derive(Clone, Debug, Default)]
pub struct EventBatch {
    events: Vec<InjectedEvent>,
    state: BatchState,
}

impl EventBatch {
    /// An empty, open batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifecycle state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Whether the batch was sent or disposed.
    pub fn is_terminal(&self) -> bool {
        self.state != BatchState::Open
    }

    /// Events waiting for `send`, in enqueue order.
    pub fn pending(&self) -> &[InjectedEvent] {
        &self.events
    }

    /// Fail unless the batch still accepts events.
    pub fn check_open(&self) -> Result<(), InjectError> {
        if self.is_terminal() {
            Err(InjectError::EnqueueAfterTerminal)
        } else {
            Ok(())
        }
    }

    /// Append a group of events produced by one intent.
    pub fn push_group(
        &mut self,
        group: impl IntoIterator<Item = InjectedEvent>,
    ) -> Result<(), InjectError> {
        self.check_open()?;
        for event in group {
            debug_assert!(
                self.events
                    .last()
                    .is_none_or(|last| last.event_time() <= event.event_time()),
                "event timestamps must be non-decreasing within a batch"
            );
            log::trace!("enqueue {event:?}");
            self.events.push(event);
        }
        Ok(())
    }

    /// Deliver every pending event to `sink` in order, then become [`BatchState::Sent`].
    ///
    /// Returns the number of events delivered. If the sink rejects an event, the remaining
    /// events are dropped and the batch is still terminal.
    pub fn send<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, InjectError> {
        if self.is_terminal() {
            return Err(InjectError::SendAfterTerminal);
        }
        self.state = BatchState::Sent;
        let events = core::mem::take(&mut self.events);
        let total = events.len();
        for (index, event) in events.iter().enumerate() {
            if let Err(source) = sink.inject(event) {
                log::warn!(
                    "sink rejected event {index} of {total}, dropping {} more: {source}",
                    total - index - 1
                );
                return Err(InjectError::Delivery {
                    index,
                    total,
                    source,
                });
            }
        }
        log::debug!("sent {total} events");
        Ok(total)
    }

    /// Drop pending events without delivering them and become [`BatchState::Disposed`].
    ///
    /// Returns how many events were dropped.
    pub fn dispose(&mut self) -> usize {
        let dropped = self.events.len();
        if self.state != BatchState::Disposed {
            log::debug!("disposed batch in state {:?}, dropping {dropped} events", self.state);
        }
        self.events.clear();
        self.state = BatchState::Disposed;
        dropped
    }
}
