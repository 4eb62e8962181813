// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input state tracking: touch pointers, mouse, and keyboard.
//!
//! [`InputState`] is the single source of truth the synthesizer consults to decide which
//! events an intent produces. Each mutating operation validates its precondition first and
//! returns an [`InjectError`] without touching anything when it does not hold. The `check_*`
//! variants run the same validation without mutating, so a caller can validate a whole
//! intent before committing any part of it.
//!
//! The state outlives a dispatcher: [`InputDispatcher::into_state`] hands it back and
//! [`InputDispatcher::with_state`] picks it up again, so a gesture can span sessions.
//!
//! [`InputDispatcher::into_state`]: crate::dispatcher::InputDispatcher::into_state
//! [`InputDispatcher::with_state`]: crate::dispatcher::InputDispatcher::with_state

use alloc::collections::BTreeMap;

use hashbrown::HashSet;
use kurbo::{Point, Rect};

use crate::error::InjectError;
use crate::event::TouchAction;
use crate::types::{Buttons, Key, LockKey, MetaState, MouseButton, PointerId};

/// A touch contact that is currently down.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerState {
    /// Pointer id.
    pub id: PointerId,
    /// Latest position, including updates not yet sent in a move.
    pub position: Point,
    /// Whether the contact is pressed. Always `true` while tracked.
    pub pressed: bool,
}

/// A touch gesture in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchGesture {
    down_time: u64,
    pointers: BTreeMap<PointerId, PointerState>,
    has_pointer_updates: bool,
    last_event_time: u64,
}

impl TouchGesture {
    fn new(down_time: u64) -> Self {
        Self {
            down_time,
            pointers: BTreeMap::new(),
            has_pointer_updates: false,
            last_event_time: down_time,
        }
    }

    /// Time of the first down of this gesture.
    pub fn down_time(&self) -> u64 {
        self.down_time
    }

    /// Time of the most recent touch event of this gesture.
    pub fn last_event_time(&self) -> u64 {
        self.last_event_time
    }

    /// Active pointers, sorted by id.
    pub fn pointers(&self) -> impl ExactSizeIterator<Item = &PointerState> + '_ {
        self.pointers.values()
    }

    /// Number of active pointers.
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// Never true for a tracked gesture; present for symmetry with [`TouchGesture::len`].
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Latest position of `id`.
    pub fn position(&self, id: PointerId) -> Option<Point> {
        self.pointers.get(&id).map(|p| p.position)
    }

    /// Index of `id` among the active pointers sorted by id.
    pub fn index_of(&self, id: PointerId) -> Option<usize> {
        self.pointers.keys().position(|k| *k == id)
    }

    /// Whether a pointer moved since the last touch event was synthesized.
    pub fn has_pointer_updates(&self) -> bool {
        self.has_pointer_updates
    }

    pub(crate) fn mark_sent(&mut self, time: u64) {
        self.has_pointer_updates = false;
        self.last_event_time = time;
    }
}

/// Mouse position, buttons, and hover state.
#[derive(Clone, Debug, PartialEq)]
pub struct MouseState {
    position: Point,
    buttons: Buttons,
    hovering: bool,
    down_time: u64,
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            buttons: Buttons::empty(),
            hovering: false,
            down_time: 0,
        }
    }
}

impl MouseState {
    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Pressed buttons.
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    /// Whether the mouse is hovering over the root with no button pressed.
    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Time the first of the pressed buttons went down.
    pub fn down_time(&self) -> u64 {
        self.down_time
    }

    /// Whether any button is pressed.
    pub fn has_any_button_pressed(&self) -> bool {
        !self.buttons.is_empty()
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    pub(crate) fn clear_buttons(&mut self) {
        self.buttons = Buttons::empty();
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct KeyRepeat {
    key: Key,
    count: u32,
    last_time: u64,
}

/// A key auto-repeat that is due.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RepeatTick {
    pub(crate) key: Key,
    pub(crate) count: u32,
    pub(crate) time: u64,
}

/// Pressed keys and lock toggles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyState {
    down_keys: HashSet<Key>,
    caps_lock: bool,
    num_lock: bool,
    scroll_lock: bool,
    down_time: u64,
    repeat: Option<KeyRepeat>,
}

impl KeyState {
    /// Whether `key` is held down.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.down_keys.contains(&key)
    }

    /// Whether `lock` is toggled on.
    pub fn is_lock_on(&self, lock: LockKey) -> bool {
        match lock {
            LockKey::CapsLock => self.caps_lock,
            LockKey::NumLock => self.num_lock,
            LockKey::ScrollLock => self.scroll_lock,
        }
    }

    /// Time of the most recent key down.
    pub fn down_time(&self) -> u64 {
        self.down_time
    }

    /// OR of the masks of all held modifiers and all toggled locks.
    ///
    /// Recomputed on every call.
    pub fn meta_state(&self) -> MetaState {
        let held = self
            .down_keys
            .iter()
            .fold(MetaState::empty(), |acc, k| acc | k.modifier_meta());
        [LockKey::CapsLock, LockKey::NumLock, LockKey::ScrollLock]
            .into_iter()
            .filter(|l| self.is_lock_on(*l))
            .fold(held, |acc, l| acc | l.meta())
    }

    fn toggle_lock(&mut self, lock: LockKey) {
        let flag = match lock {
            LockKey::CapsLock => &mut self.caps_lock,
            LockKey::NumLock => &mut self.num_lock,
            LockKey::ScrollLock => &mut self.scroll_lock,
        };
        *flag = !*flag;
    }

    /// Next auto-repeat of the most recently pressed key due at or before `end`.
    pub(crate) fn next_repeat(
        &mut self,
        end: u64,
        initial_delay: u64,
        subsequent_delay: u64,
    ) -> Option<RepeatTick> {
        let down_time = self.down_time;
        let repeat = self.repeat.as_mut()?;
        let due = if repeat.count == 0 {
            down_time.saturating_add(initial_delay)
        } else {
            repeat.last_time.saturating_add(subsequent_delay.max(1))
        };
        if due > end {
            return None;
        }
        repeat.count += 1;
        repeat.last_time = due;
        Some(RepeatTick {
            key: repeat.key,
            count: repeat.count,
            time: due,
        })
    }

    fn latest_time(&self) -> u64 {
        self.repeat
            .map_or(self.down_time, |r| r.last_time.max(self.down_time))
    }
}

/// Everything the dispatcher knows about the input devices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputState {
    touch: Option<TouchGesture>,
    mouse: MouseState,
    keys: KeyState,
}

impl InputState {
    /// Fresh state: no touch, mouse at the origin outside any hover, no keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// The touch gesture in progress, if any.
    pub fn touch(&self) -> Option<&TouchGesture> {
        self.touch.as_ref()
    }

    /// Mouse state.
    pub fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Keyboard state.
    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub(crate) fn mouse_mut(&mut self) -> &mut MouseState {
        &mut self.mouse
    }

    pub(crate) fn keys_mut(&mut self) -> &mut KeyState {
        &mut self.keys
    }

    /// Whether any touch pointer is down.
    pub fn is_touch_in_progress(&self) -> bool {
        self.touch.is_some()
    }

    /// Latest position of touch pointer `id`, if it is down.
    pub fn touch_position(&self, id: PointerId) -> Option<Point> {
        self.touch.as_ref().and_then(|g| g.position(id))
    }

    /// The latest timestamp recorded anywhere in this state.
    pub fn latest_time(&self) -> u64 {
        let touch = self.touch.as_ref().map_or(0, |g| g.last_event_time);
        touch.max(self.mouse.down_time).max(self.keys.latest_time())
    }

    // Touch

    /// The gesture in progress, or the error for trying to send `action` without one.
    pub fn require_touch(&self, action: TouchAction) -> Result<&TouchGesture, InjectError> {
        self.touch
            .as_ref()
            .ok_or(InjectError::NoTouchGesture { action })
    }

    pub(crate) fn touch_mut(&mut self) -> Option<&mut TouchGesture> {
        self.touch.as_mut()
    }

    fn require_pointer(&self, action: TouchAction, id: PointerId) -> Result<(), InjectError> {
        let gesture = self.require_touch(action)?;
        if gesture.pointers.contains_key(&id) {
            Ok(())
        } else {
            Err(InjectError::PointerNotActive { action, id })
        }
    }

    /// Validate [`InputState::touch_down`].
    pub fn check_touch_down(&self, id: PointerId) -> Result<(), InjectError> {
        match &self.touch {
            Some(g) if g.pointers.contains_key(&id) => Err(InjectError::PointerAlreadyDown(id)),
            _ => Ok(()),
        }
    }

    /// Put pointer `id` down at `position`, starting a gesture at `now` if none is in progress.
    pub fn touch_down(&mut self, id: PointerId, position: Point, now: u64) -> Result<(), InjectError> {
        self.check_touch_down(id)?;
        let gesture = self.touch.get_or_insert_with(|| TouchGesture::new(now));
        gesture.pointers.insert(
            id,
            PointerState {
                id,
                position,
                pressed: true,
            },
        );
        Ok(())
    }

    /// Validate [`InputState::update_touch_pointer`].
    pub fn check_update_touch_pointer(&self, id: PointerId) -> Result<(), InjectError> {
        self.require_pointer(TouchAction::Move, id)
    }

    /// Record a new position for `id` without producing an event.
    pub fn update_touch_pointer(&mut self, id: PointerId, position: Point) -> Result<(), InjectError> {
        self.check_update_touch_pointer(id)?;
        if let Some(g) = self.touch.as_mut() {
            if let Some(p) = g.pointers.get_mut(&id) {
                p.position = position;
                g.has_pointer_updates = true;
            }
        }
        Ok(())
    }

    /// Validate [`InputState::touch_up`].
    pub fn check_touch_up(&self, id: PointerId) -> Result<(), InjectError> {
        self.require_pointer(TouchAction::Up, id)
    }

    /// Lift pointer `id`, ending the gesture when it was the last one.
    pub fn touch_up(&mut self, id: PointerId) -> Result<(), InjectError> {
        self.check_touch_up(id)?;
        if let Some(g) = self.touch.as_mut() {
            g.pointers.remove(&id);
            if g.pointers.is_empty() {
                self.touch = None;
            }
        }
        Ok(())
    }

    /// End the gesture in progress, returning it.
    pub fn cancel_touch(&mut self) -> Result<TouchGesture, InjectError> {
        self.take_touch().ok_or(InjectError::NoTouchGesture {
            action: TouchAction::Cancel,
        })
    }

    /// End the gesture in progress, if any.
    pub(crate) fn take_touch(&mut self) -> Option<TouchGesture> {
        self.touch.take()
    }

    // Mouse

    /// Validate [`InputState::mouse_press`] against the root `bounds`.
    pub fn check_mouse_press(&self, button: MouseButton, bounds: Rect) -> Result<(), InjectError> {
        if self.mouse.buttons.has(button) {
            return Err(InjectError::ButtonAlreadyPressed(button));
        }
        if !self.mouse.has_any_button_pressed() && !bounds.contains(self.mouse.position) {
            return Err(InjectError::GestureOutOfBounds {
                position: self.mouse.position,
                bounds,
            });
        }
        Ok(())
    }

    /// Press `button`. The first button of a press sets the mouse down time to `now`.
    pub fn mouse_press(&mut self, button: MouseButton, bounds: Rect, now: u64) -> Result<(), InjectError> {
        self.check_mouse_press(button, bounds)?;
        if !self.mouse.has_any_button_pressed() {
            self.mouse.down_time = now;
        }
        self.mouse.buttons |= button.flag();
        Ok(())
    }

    /// Validate [`InputState::mouse_release`].
    pub fn check_mouse_release(&self, button: MouseButton) -> Result<(), InjectError> {
        if self.mouse.buttons.has(button) {
            Ok(())
        } else {
            Err(InjectError::ButtonNotPressed(button))
        }
    }

    /// Release `button`.
    pub fn mouse_release(&mut self, button: MouseButton) -> Result<(), InjectError> {
        self.check_mouse_release(button)?;
        self.mouse.buttons.remove(button.flag());
        Ok(())
    }

    /// Validate a hover enter at `position`.
    pub fn check_mouse_enter(&self, position: Point, bounds: Rect) -> Result<(), InjectError> {
        if self.mouse.hovering {
            return Err(InjectError::AlreadyHovering);
        }
        if self.mouse.has_any_button_pressed() {
            return Err(InjectError::EnterWithButtonsDown(self.mouse.buttons));
        }
        if !bounds.contains(position) {
            return Err(InjectError::EnterOutOfBounds { position, bounds });
        }
        Ok(())
    }

    /// Validate a hover exit.
    pub fn check_mouse_exit(&self) -> Result<(), InjectError> {
        if self.mouse.hovering {
            Ok(())
        } else {
            Err(InjectError::NotHovering)
        }
    }

    /// Validate a mouse cancel.
    pub fn check_mouse_cancel(&self) -> Result<(), InjectError> {
        if self.mouse.has_any_button_pressed() {
            Ok(())
        } else {
            Err(InjectError::NoButtonsPressed)
        }
    }

    // Keys

    /// Validate [`InputState::key_down`].
    pub fn check_key_down(&self, key: Key) -> Result<(), InjectError> {
        if self.keys.is_key_down(key) {
            Err(InjectError::KeyAlreadyDown(key))
        } else {
            Ok(())
        }
    }

    /// Press `key` at `now`. Lock keys toggle here, on the down edge. The key becomes the
    /// one that auto-repeats.
    pub fn key_down(&mut self, key: Key, now: u64) -> Result<(), InjectError> {
        self.check_key_down(key)?;
        let keys = &mut self.keys;
        keys.down_keys.insert(key);
        keys.down_time = now;
        keys.repeat = Some(KeyRepeat {
            key,
            count: 0,
            last_time: now,
        });
        if let Some(lock) = key.lock() {
            keys.toggle_lock(lock);
        }
        Ok(())
    }

    /// Validate [`InputState::key_up`].
    pub fn check_key_up(&self, key: Key) -> Result<(), InjectError> {
        if self.keys.is_key_down(key) {
            Ok(())
        } else {
            Err(InjectError::KeyNotDown(key))
        }
    }

    /// Release `key`, stopping its auto-repeat.
    pub fn key_up(&mut self, key: Key) -> Result<(), InjectError> {
        self.check_key_up(key)?;
        let keys = &mut self.keys;
        keys.down_keys.remove(&key);
        if keys.repeat.is_some_and(|r| r.key == key) {
            keys.repeat = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn touch_down_then_up_ends_gesture() {
        let mut s = InputState::new();
        s.touch_down(PointerId(0), Point::ZERO, 0).unwrap();
        assert!(s.is_touch_in_progress());
        s.touch_up(PointerId(0)).unwrap();
        assert!(!s.is_touch_in_progress());
    }

    #[test]
    fn take_touch_ends_any_gesture() {
        let mut s = InputState::new();
        assert!(s.take_touch().is_none());
        s.touch_down(PointerId(0), Point::ZERO, 0).unwrap();
        s.touch_down(PointerId(4), Point::new(1.0, 1.0), 5).unwrap();
        assert_eq!(s.take_touch().map(|g| g.len()), Some(2));
        assert!(!s.is_touch_in_progress());
        assert!(s.cancel_touch().is_err());
    }

    #[test]
    fn double_down_is_rejected() {
        let mut s = InputState::new();
        s.touch_down(PointerId(1), Point::ZERO, 0).unwrap();
        assert_eq!(
            s.touch_down(PointerId(1), Point::new(5.0, 5.0), 10),
            Err(InjectError::PointerAlreadyDown(PointerId(1)))
        );
        assert_eq!(s.touch_position(PointerId(1)), Some(Point::ZERO));
    }

    #[test]
    fn unknown_pointers_are_rejected() {
        let mut s = InputState::new();
        assert_eq!(
            s.touch_up(PointerId(0)),
            Err(InjectError::NoTouchGesture {
                action: TouchAction::Up
            })
        );
        s.touch_down(PointerId(0), Point::ZERO, 0).unwrap();
        assert_eq!(
            s.update_touch_pointer(PointerId(9), Point::ZERO),
            Err(InjectError::PointerNotActive {
                action: TouchAction::Move,
                id: PointerId(9)
            })
        );
        assert!(!s.touch().unwrap().has_pointer_updates());
    }

    #[test]
    fn pointers_are_sorted_by_id() {
        let mut s = InputState::new();
        s.touch_down(PointerId(5), Point::ZERO, 0).unwrap();
        s.touch_down(PointerId(2), Point::ZERO, 10).unwrap();
        let g = s.touch().unwrap();
        assert_eq!(g.index_of(PointerId(2)), Some(0));
        assert_eq!(g.index_of(PointerId(5)), Some(1));
        assert_eq!(g.down_time(), 0, "down time is the first down of the gesture");
    }

    #[test]
    fn mouse_press_out_of_bounds_only_when_starting() {
        let mut s = InputState::new();
        s.mouse_mut().set_position(Point::new(-1.0, 5.0));
        assert!(matches!(
            s.mouse_press(MouseButton::Primary, BOUNDS, 0),
            Err(InjectError::GestureOutOfBounds { .. })
        ));

        s.mouse_mut().set_position(Point::new(1.0, 5.0));
        s.mouse_press(MouseButton::Primary, BOUNDS, 7).unwrap();
        s.mouse_mut().set_position(Point::new(-1.0, 5.0));
        s.mouse_press(MouseButton::Secondary, BOUNDS, 9).unwrap();
        assert_eq!(s.mouse().down_time(), 7);
        assert_eq!(
            s.mouse_press(MouseButton::Primary, BOUNDS, 9),
            Err(InjectError::ButtonAlreadyPressed(MouseButton::Primary))
        );
    }

    #[test]
    fn bounds_are_half_open() {
        let s = InputState::new();
        assert!(s.check_mouse_enter(Point::new(0.0, 0.0), BOUNDS).is_ok());
        assert!(matches!(
            s.check_mouse_enter(Point::new(100.0, 50.0), BOUNDS),
            Err(InjectError::EnterOutOfBounds { .. })
        ));
    }

    #[test]
    fn lock_toggles_on_down_edge_only() {
        let mut s = InputState::new();
        s.key_down(Key::CapsLock, 0).unwrap();
        assert!(s.keys().is_lock_on(LockKey::CapsLock));
        s.key_up(Key::CapsLock).unwrap();
        assert!(s.keys().is_lock_on(LockKey::CapsLock));
        s.key_down(Key::CapsLock, 10).unwrap();
        s.key_up(Key::CapsLock).unwrap();
        assert!(!s.keys().is_lock_on(LockKey::CapsLock));
    }

    #[test]
    fn meta_state_combines_held_and_locks() {
        let mut s = InputState::new();
        s.key_down(Key::NumLock, 0).unwrap();
        s.key_up(Key::NumLock).unwrap();
        s.key_down(Key::AltLeft, 1).unwrap();
        assert_eq!(
            s.keys().meta_state(),
            MetaState::NUM_LOCK_ON | MetaState::ALT_ON | MetaState::ALT_LEFT_ON
        );
        s.key_up(Key::AltLeft).unwrap();
        assert_eq!(s.keys().meta_state(), MetaState::NUM_LOCK_ON);
    }

    #[test]
    fn repeat_schedule() {
        let mut s = InputState::new();
        s.key_down(Key::Character('a'), 100).unwrap();
        let keys = s.keys_mut();
        assert_eq!(keys.next_repeat(599, 500, 50), None);
        let first = keys.next_repeat(700, 500, 50).unwrap();
        assert_eq!((first.count, first.time), (1, 600));
        let second = keys.next_repeat(700, 500, 50).unwrap();
        assert_eq!((second.count, second.time), (2, 650));
        let third = keys.next_repeat(700, 500, 50).unwrap();
        assert_eq!((third.count, third.time), (3, 700));
        assert_eq!(keys.next_repeat(700, 500, 50), None);
    }

    #[test]
    fn releasing_repeat_key_stops_repeating() {
        let mut s = InputState::new();
        s.key_down(Key::ShiftLeft, 0).unwrap();
        s.key_down(Key::Character('b'), 0).unwrap();
        s.key_up(Key::Character('b')).unwrap();
        assert_eq!(s.keys_mut().next_repeat(10_000, 500, 50), None);
        assert!(s.keys().is_key_down(Key::ShiftLeft));
    }
}
