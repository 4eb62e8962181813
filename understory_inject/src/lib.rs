// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_inject --heading-base-level=0

//! Understory Inject: synthetic input for driving a UI from tests and automation.
//!
//! ## Overview
//!
//! This crate turns high-level input intents ("put a finger down here", "press the primary
//! button", "hold shift") into the exact low-level event sequences a platform would produce,
//! and delivers them in one batch to an [`EventSink`](sink::EventSink).
//!
//! It is organized in layers:
//!
//! - [`clock`]: a virtual millisecond clock that only moves when told to.
//! - [`state`]: the tracker for touch pointers, mouse buttons and hover, and keys.
//! - The synthesizer (internal): one intent in, one ordered bracket group of
//!   [`InjectedEvent`](event::InjectedEvent)s out.
//! - [`queue`]: the batch those groups accumulate in until `send`.
//! - [`dispatcher`]: [`InputDispatcher`](dispatcher::InputDispatcher), the entry point that
//!   ties them together.
//!
//! ## Invariants
//!
//! - Illegal intents (double down, up without down, enter while hovering, ...) fail with an
//!   [`InjectError`](error::InjectError) and change nothing.
//! - Events are stamped with the clock value at enqueue time; timestamps within a batch
//!   never decrease.
//! - Bracket groups (e.g. hover exit, down, press) are never interleaved with other intents.
//! - Touch and mouse are mutually exclusive. Starting one cancels the other.
//! - After `send` or `dispose` the dispatcher rejects everything.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_inject::dispatcher::InputDispatcher;
//! use understory_inject::event::TouchAction;
//! use understory_inject::sink::{FixedRoot, RecordingSink};
//! use understory_inject::types::PointerId;
//!
//! let root = FixedRoot(Rect::new(0.0, 0.0, 400.0, 300.0));
//! let mut dispatcher = InputDispatcher::new(root, RecordingSink::new());
//!
//! dispatcher.enqueue_touch_down(PointerId(0), Point::new(10.0, 10.0)).unwrap();
//! dispatcher.advance_event_time(16).unwrap();
//! dispatcher.update_touch_pointer(PointerId(0), Point::new(30.0, 10.0)).unwrap();
//! dispatcher.enqueue_touch_move().unwrap();
//! dispatcher.advance_event_time(16).unwrap();
//! dispatcher.enqueue_touch_up(PointerId(0)).unwrap();
//!
//! // Nothing is delivered until `send`.
//! assert!(dispatcher.sink().events().is_empty());
//! assert_eq!(dispatcher.send(), Ok(3));
//!
//! let times: Vec<_> = dispatcher
//!     .sink()
//!     .events()
//!     .iter()
//!     .filter_map(|e| e.as_touch())
//!     .map(|t| (t.action, t.event_time))
//!     .collect();
//! assert_eq!(
//!     times,
//!     [(TouchAction::Down, 0), (TouchAction::Move, 16), (TouchAction::Up, 32)]
//! );
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for floating-point math.
//!
//! Diagnostics go through the [`log`] facade: every enqueued event at `trace`, batch
//! send and dispose at `debug`, sink failures at `warn`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod actions;
mod synth;

pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod queue;
pub mod sink;
pub mod state;
pub mod types;

pub use dispatcher::{DispatcherConfig, InputDispatcher};
pub use error::{ErrorKind, InjectError};
pub use event::InjectedEvent;
