// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_event_state --heading-base-level=0

//! Understory Event State: pass-based gesture filters over pointer changes.
//!
//! ## Overview
//!
//! Every pointer event reaches a chain of filters three times, once per
//! [`PointerEventPass`](pointer::PointerEventPass). Filters are small state machines that read
//! [`PointerChange`](pointer::PointerChange)s, consume what they handled, and report gestures
//! through a single handler function taking an event enum.
//!
//! - [`pointer`]: the change model, passes, and directions.
//! - [`filter`]: the [`GestureFilter`](filter::GestureFilter) trait and its context.
//! - [`pass`]: pass ordering and [`GestureDetector`](pass::GestureDetector), which owns the
//!   timers and feeds a chain.
//! - [`scheduler`]: cooperative timers with cancellable, generational handles.
//! - [`velocity`]: fling velocity estimation.
//! - Filters: [`slop`], [`press_start`], [`raw_drag`], [`long_press`].
//! - Composites: [`drag`], combining the filters into touch-slop drags and long-press drags.
//!
//! Each filter exists twice: a core state machine (e.g. [`RawDrag`](raw_drag::RawDrag)) that
//! takes its collaborators as arguments, and a `*GestureFilter` wrapper that owns a handler
//! and implements [`GestureFilter`](filter::GestureFilter). Composites are built from cores.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Size, Vec2};
//! use understory_event_state::config::GestureConfig;
//! use understory_event_state::drag::{LongPressDragEvent, LongPressDragGestureFilter};
//! use understory_event_state::pass::GestureDetector;
//! use understory_event_state::pointer::{PointerChange, PointerId};
//!
//! let mut events = Vec::new();
//! let mut drag = LongPressDragGestureFilter::new(GestureConfig::default(), |e| {
//!     events.push(e);
//!     Vec2::ZERO
//! });
//! let mut detector = GestureDetector::new(Size::new(200.0, 200.0));
//!
//! let down = PointerChange::down(PointerId(0), 0, Point::new(40.0, 40.0));
//! detector.dispatch(&mut [&mut drag], &mut [down]).unwrap();
//!
//! // Held past the timeout: the long press fires before the next move is processed.
//! let moved = down.moved_to(600, Point::new(60.0, 40.0));
//! detector.dispatch(&mut [&mut drag], &mut [moved]).unwrap();
//! drop(drag);
//!
//! assert_eq!(
//!     events,
//!     [
//!         LongPressDragEvent::LongPress(Point::new(40.0, 40.0)),
//!         LongPressDragEvent::DragStart,
//!         LongPressDragEvent::Drag(Vec2::new(20.0, 0.0)),
//!     ]
//! );
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for floating-point math.
//! - `inject_adapter`: the [`adapters`] module's bridge from `understory_inject` records.
//!
//! Filters log state transitions through the [`log`] facade at `trace`, and gesture starts and
//! stops at `debug`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod config;
pub mod drag;
pub mod filter;
pub mod long_press;
pub mod pass;
pub mod pointer;
pub mod press_start;
pub mod raw_drag;
pub mod scheduler;
pub mod slop;
pub mod velocity;

pub use config::GestureConfig;
pub use filter::GestureFilter;
