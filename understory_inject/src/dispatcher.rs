// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The input dispatcher: intents in, one batch of platform-shaped events out.
//!
//! [`InputDispatcher`] ties together the [`EventClock`], the [`InputState`] tracker, the
//! synthesizer, and the [`EventBatch`]. Each `enqueue_*` call validates the intent, updates
//! the tracked state, and appends the resulting events stamped with the current clock value.
//! Nothing reaches the [`EventSink`] until [`InputDispatcher::send`].
//!
//! ## Modalities
//!
//! Touch and mouse never overlap. A mouse intent during a touch gesture cancels the touch
//! first; a touch down while mouse buttons are pressed cancels the mouse gesture, and a touch
//! down while hovering exits the hover first.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_inject::dispatcher::InputDispatcher;
//! use understory_inject::event::{MouseAction, InjectedEvent};
//! use understory_inject::sink::{FixedRoot, RecordingSink};
//! use understory_inject::types::MouseButton;
//!
//! let root = FixedRoot(Rect::new(0.0, 0.0, 100.0, 100.0));
//! let mut dispatcher = InputDispatcher::new(root, RecordingSink::new());
//!
//! dispatcher.enqueue_mouse_move(Point::new(10.0, 10.0)).unwrap();
//! dispatcher.enqueue_mouse_press(MouseButton::Primary).unwrap();
//! dispatcher.advance_event_time(100).unwrap();
//! dispatcher.enqueue_mouse_release(MouseButton::Primary).unwrap();
//! dispatcher.send().unwrap();
//!
//! let actions: Vec<_> = dispatcher
//!     .sink()
//!     .events()
//!     .iter()
//!     .filter_map(InjectedEvent::as_mouse)
//!     .map(|m| m.action)
//!     .collect();
//! assert_eq!(
//!     actions,
//!     [
//!         MouseAction::HoverEnter,
//!         MouseAction::HoverMove,
//!         MouseAction::HoverExit,
//!         MouseAction::Down,
//!         MouseAction::Press,
//!         MouseAction::Release,
//!         MouseAction::Up,
//!         MouseAction::HoverEnter,
//!         MouseAction::HoverMove,
//!     ]
//! );
//!
//! // The dispatcher is spent.
//! assert!(dispatcher.enqueue_mouse_move(Point::ZERO).is_err());
//! ```

use kurbo::Point;

use crate::clock::EventClock;
use crate::error::InjectError;
use crate::event::{InjectedEvent, RotaryAxis};
use crate::queue::EventBatch;
use crate::sink::{EventSink, InjectionRoot};
use crate::state::InputState;
use crate::synth::Synthesizer;
use crate::types::{Key, LockKey, MouseButton, PointerId, ScrollWheel};

/// Timing configuration of an [`InputDispatcher`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Default step for [`InputDispatcher::advance_by_period`] and the helpers in this crate,
    /// in milliseconds.
    pub event_period: u64,
    /// Delay between a key down and its first auto-repeat, in milliseconds.
    pub initial_repeat_delay: u64,
    /// Delay between subsequent auto-repeats, in milliseconds.
    pub subsequent_repeat_delay: u64,
    /// Initial clock reading, in milliseconds.
    pub start_time: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            event_period: 16,
            initial_repeat_delay: 500,
            subsequent_repeat_delay: 50,
            start_time: 0,
        }
    }
}

/// Synthesizes and batches input events for one injection session.
///
/// `R` supplies the root bounds for in/out of bounds decisions, `S` receives the batch on
/// [`InputDispatcher::send`].
#[derive(Debug)]
pub struct InputDispatcher<R, S> {
    root: R,
    sink: S,
    config: DispatcherConfig,
    clock: EventClock,
    state: InputState,
    batch: EventBatch,
}

impl<R: InjectionRoot, S: EventSink> InputDispatcher<R, S> {
    /// A dispatcher with default timing and fresh input state.
    pub fn new(root: R, sink: S) -> Self {
        Self::with_config(root, sink, DispatcherConfig::default())
    }

    /// A dispatcher with custom timing and fresh input state.
    pub fn with_config(root: R, sink: S, config: DispatcherConfig) -> Self {
        Self::with_state(root, sink, config, InputState::new())
    }

    /// A dispatcher that continues from `state`, as returned by
    /// [`InputDispatcher::into_state`] of an earlier session.
    ///
    /// The clock starts at `config.start_time` or at the latest time recorded in `state`,
    /// whichever is later.
    pub fn with_state(root: R, sink: S, config: DispatcherConfig, state: InputState) -> Self {
        let start = config.start_time.max(state.latest_time());
        Self {
            root,
            sink,
            config,
            clock: EventClock::starting_at(start),
            state,
            batch: EventBatch::new(),
        }
    }

    // Queries

    /// Current clock reading.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Timing configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Tracked input state.
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// The root.
    pub fn root(&self) -> &R {
        &self.root
    }

    /// The sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Events enqueued but not yet sent.
    pub fn pending(&self) -> &[InjectedEvent] {
        self.batch.pending()
    }

    /// Whether this dispatcher was sent or disposed.
    pub fn is_terminal(&self) -> bool {
        self.batch.is_terminal()
    }

    /// Whether any touch pointer is down.
    pub fn is_touch_in_progress(&self) -> bool {
        self.state.is_touch_in_progress()
    }

    /// Latest position of touch pointer `id`, or `None` if it is not down.
    pub fn current_touch_position(&self, id: PointerId) -> Option<Point> {
        self.state.touch_position(id)
    }

    /// Current mouse position.
    pub fn current_mouse_position(&self) -> Point {
        self.state.mouse().position()
    }

    /// Whether `key` is held down.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.state.keys().is_key_down(key)
    }

    /// Whether `lock` is toggled on.
    pub fn is_lock_on(&self, lock: LockKey) -> bool {
        self.state.keys().is_lock_on(lock)
    }

    // Time

    /// Advance the clock by `duration` milliseconds.
    ///
    /// Key auto-repeats that fall due within the interval are enqueued at their own
    /// timestamps on the way. Negative durations are rejected before anything changes.
    pub fn advance_event_time(&mut self, duration: i64) -> Result<(), InjectError> {
        self.batch.check_open()?;
        let delta = EventClock::check(duration)?;
        let end = self.clock.now().saturating_add(delta);
        let bounds = self.root.bounds();
        while let Some(tick) = self.state.keys_mut().next_repeat(
            end,
            self.config.initial_repeat_delay,
            self.config.subsequent_repeat_delay,
        ) {
            self.clock.advance_to(tick.time);
            let mut synth = Synthesizer::new(&mut self.state, bounds, tick.time);
            synth.key_repeat(tick.key, tick.count);
            self.batch.push_group(synth.finish())?;
        }
        self.clock.advance_to(end);
        Ok(())
    }

    /// Advance the clock by one configured event period.
    pub fn advance_by_period(&mut self) -> Result<(), InjectError> {
        self.advance_event_time(i64::try_from(self.config.event_period).unwrap_or(i64::MAX))
    }

    fn synthesize(
        &mut self,
        intent: impl FnOnce(&mut Synthesizer<'_>) -> Result<(), InjectError>,
    ) -> Result<(), InjectError> {
        self.batch.check_open()?;
        let mut synth = Synthesizer::new(&mut self.state, self.root.bounds(), self.clock.now());
        intent(&mut synth)?;
        self.batch.push_group(synth.finish())
    }

    // Touch

    /// Put touch pointer `id` down at `position`.
    ///
    /// Starts a gesture if none is in progress. Pending pointer updates are sent as a move
    /// first. Cancels a mouse press, or exits a mouse hover, that is in progress.
    pub fn enqueue_touch_down(&mut self, id: PointerId, position: Point) -> Result<(), InjectError> {
        self.synthesize(|s| s.touch_down(id, position))
    }

    /// Send a move carrying the current position of every pointer.
    pub fn enqueue_touch_move(&mut self) -> Result<(), InjectError> {
        self.synthesize(|s| s.touch_move())
    }

    /// Send a move preceded by historical samples.
    ///
    /// `relative_times` are offsets from now, each negative and not earlier than the previous
    /// touch event. `coordinates` has one list per active pointer in id order, each as long
    /// as `relative_times`.
    pub fn enqueue_touch_moves<C: AsRef<[Point]>>(
        &mut self,
        relative_times: &[i64],
        coordinates: &[C],
    ) -> Result<(), InjectError> {
        self.synthesize(|s| s.touch_moves(relative_times, coordinates))
    }

    /// Move pointer `id` to `position` without sending an event.
    ///
    /// The next [`enqueue_touch_move`](Self::enqueue_touch_move), or the next
    /// [`enqueue_touch_down`](Self::enqueue_touch_down), reports the new position.
    pub fn update_touch_pointer(&mut self, id: PointerId, position: Point) -> Result<(), InjectError> {
        self.batch.check_open()?;
        self.state.update_touch_pointer(id, position)
    }

    /// Lift pointer `id` at its latest position.
    pub fn enqueue_touch_up(&mut self, id: PointerId) -> Result<(), InjectError> {
        self.synthesize(|s| s.touch_up(id))
    }

    /// Abort the touch gesture in progress.
    pub fn enqueue_touch_cancel(&mut self) -> Result<(), InjectError> {
        self.synthesize(|s| s.touch_cancel())
    }

    // Mouse

    /// Press `button` at the current mouse position.
    ///
    /// A gesture can only start inside the root bounds; additional buttons may be pressed
    /// after the mouse drifted out.
    pub fn enqueue_mouse_press(&mut self, button: MouseButton) -> Result<(), InjectError> {
        self.synthesize(|s| s.mouse_press(button))
    }

    /// Move the mouse to `position`, entering or exiting hover as the bounds are crossed.
    pub fn enqueue_mouse_move(&mut self, position: Point) -> Result<(), InjectError> {
        self.synthesize(|s| {
            s.mouse_move(position);
            Ok(())
        })
    }

    /// Move the mouse to `position` without sending an event.
    pub fn update_mouse_position(&mut self, position: Point) -> Result<(), InjectError> {
        self.batch.check_open()?;
        self.state.mouse_mut().set_position(position);
        Ok(())
    }

    /// Release `button`. Releasing the last button inside the root resumes hovering.
    pub fn enqueue_mouse_release(&mut self, button: MouseButton) -> Result<(), InjectError> {
        self.synthesize(|s| s.mouse_release(button))
    }

    /// Start hovering at `position`.
    pub fn enqueue_mouse_enter(&mut self, position: Point) -> Result<(), InjectError> {
        self.synthesize(|s| s.mouse_enter(position))
    }

    /// Stop hovering, leaving the mouse at `position`.
    pub fn enqueue_mouse_exit(&mut self, position: Point) -> Result<(), InjectError> {
        self.synthesize(|s| s.mouse_exit(position))
    }

    /// Abort the mouse gesture, clearing all buttons.
    pub fn enqueue_mouse_cancel(&mut self) -> Result<(), InjectError> {
        self.synthesize(|s| s.mouse_cancel())
    }

    /// Scroll `wheel` by `delta` at the current position.
    ///
    /// Always preceded by a move to the current position. The scroll itself is only sent
    /// inside the root bounds.
    pub fn enqueue_mouse_scroll(&mut self, delta: f32, wheel: ScrollWheel) -> Result<(), InjectError> {
        self.synthesize(|s| {
            s.mouse_scroll(delta, wheel);
            Ok(())
        })
    }

    // Keys

    /// Press `key`.
    pub fn enqueue_key_down(&mut self, key: Key) -> Result<(), InjectError> {
        self.synthesize(|s| s.key_down(key))
    }

    /// Release `key`.
    pub fn enqueue_key_up(&mut self, key: Key) -> Result<(), InjectError> {
        self.synthesize(|s| s.key_up(key))
    }

    // Rotary

    /// Scroll a rotary input horizontally by `pixels`.
    pub fn enqueue_rotary_scroll_horizontally(&mut self, pixels: f32) -> Result<(), InjectError> {
        self.synthesize(|s| {
            s.rotary_scroll(RotaryAxis::Horizontal, pixels);
            Ok(())
        })
    }

    /// Scroll a rotary input vertically by `pixels`.
    pub fn enqueue_rotary_scroll_vertically(&mut self, pixels: f32) -> Result<(), InjectError> {
        self.synthesize(|s| {
            s.rotary_scroll(RotaryAxis::Vertical, pixels);
            Ok(())
        })
    }

    // Lifecycle

    /// Deliver every enqueued event to the sink, in order, and end the session.
    ///
    /// Returns the number of delivered events. After this, every enqueue and send fails.
    #[doc(alias = "flush")]
    pub fn send(&mut self) -> Result<usize, InjectError> {
        self.batch.send(&mut self.sink)
    }

    /// Discard pending events without delivering them and end the session.
    ///
    /// Idempotent. Tracked input state is kept for [`InputDispatcher::into_state`].
    pub fn dispose(&mut self) {
        self.batch.dispose();
    }

    /// Dispose and hand back the tracked input state for a later session.
    pub fn into_state(mut self) -> InputState {
        self.dispose();
        self.state
    }

    /// Dispose and hand back the sink.
    pub fn into_sink(mut self) -> S {
        self.dispose();
        self.sink
    }
}
