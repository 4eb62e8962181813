// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event synthesis: one intent in, an ordered bracket group of records out.
//!
//! Every entry point validates the whole intent against [`InputState`] before it mutates
//! anything, then applies the state changes and emits records in platform order.

use alloc::vec::Vec;

use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::error::InjectError;
use crate::event::{
    HistoricalSample, InjectedEvent, KeyAction, KeyEvent, MouseAction, MouseEvent, RotaryAxis,
    RotaryEvent, ScrollDelta, TouchAction, TouchEvent, TouchPointer,
};
use crate::state::InputState;
use crate::types::{Key, MouseButton, PointerId, ScrollWheel};

/// Records produced by one intent. Never interleaved with another intent's records.
pub(crate) type EventGroup = SmallVec<[InjectedEvent; 4]>;

pub(crate) struct Synthesizer<'a> {
    state: &'a mut InputState,
    bounds: Rect,
    now: u64,
    out: EventGroup,
}

impl<'a> Synthesizer<'a> {
    pub(crate) fn new(state: &'a mut InputState, bounds: Rect, now: u64) -> Self {
        Self {
            state,
            bounds,
            now,
            out: EventGroup::new(),
        }
    }

    pub(crate) fn finish(self) -> EventGroup {
        self.out
    }

    fn in_bounds(&self, position: Point) -> bool {
        self.bounds.contains(position)
    }

    // Touch

    pub(crate) fn touch_down(&mut self, id: PointerId, position: Point) -> Result<(), InjectError> {
        self.state.check_touch_down(id)?;

        if self.state.mouse().has_any_button_pressed() {
            self.state.mouse_mut().clear_buttons();
            self.emit_mouse(MouseAction::Cancel, None, None);
        } else if self.state.mouse().is_hovering() {
            self.exit_hover();
        }

        if self.state.touch().is_some_and(|g| g.has_pointer_updates()) {
            self.emit_touch(TouchAction::Move, 0, Vec::new());
        }

        self.state.touch_down(id, position, self.now)?;
        let (action, index) = match self.state.touch() {
            Some(g) if g.len() > 1 => (TouchAction::PointerDown, g.index_of(id).unwrap_or(0)),
            _ => (TouchAction::Down, 0),
        };
        self.emit_touch(action, index, Vec::new());
        Ok(())
    }

    pub(crate) fn touch_move(&mut self) -> Result<(), InjectError> {
        self.state.require_touch(TouchAction::Move)?;
        self.emit_touch(TouchAction::Move, 0, Vec::new());
        Ok(())
    }

    pub(crate) fn touch_moves<C: AsRef<[Point]>>(
        &mut self,
        relative_times: &[i64],
        coordinates: &[C],
    ) -> Result<(), InjectError> {
        let gesture = self.state.require_touch(TouchAction::Move)?;

        let since_previous = self.now.saturating_sub(gesture.last_event_time());
        let earliest = -i64::try_from(since_previous).unwrap_or(i64::MAX);
        for (index, &offset) in relative_times.iter().enumerate() {
            if offset >= 0 {
                return Err(InjectError::HistoryNotInPast { index, offset });
            }
            if offset < earliest {
                return Err(InjectError::HistoryBeforePreviousEvent {
                    index,
                    offset,
                    earliest,
                });
            }
        }
        if coordinates.len() != gesture.len() {
            return Err(InjectError::HistoryPointerCount {
                expected: gesture.len(),
                actual: coordinates.len(),
            });
        }
        for (pointer, coords) in gesture.pointers().zip(coordinates) {
            let actual = coords.as_ref().len();
            if actual != relative_times.len() {
                return Err(InjectError::HistorySampleCount {
                    id: pointer.id,
                    expected: relative_times.len(),
                    actual,
                });
            }
        }

        let history = relative_times
            .iter()
            .enumerate()
            .map(|(i, offset)| HistoricalSample {
                event_time: self.now.saturating_sub(offset.unsigned_abs()),
                positions: coordinates.iter().map(|c| c.as_ref()[i]).collect(),
            })
            .collect();
        self.emit_touch(TouchAction::Move, 0, history);
        Ok(())
    }

    pub(crate) fn touch_up(&mut self, id: PointerId) -> Result<(), InjectError> {
        self.state.check_touch_up(id)?;
        let (action, index) = match self.state.touch() {
            Some(g) if g.len() > 1 => (TouchAction::PointerUp, g.index_of(id).unwrap_or(0)),
            _ => (TouchAction::Up, 0),
        };
        self.emit_touch(action, index, Vec::new());
        self.state.touch_up(id)
    }

    pub(crate) fn touch_cancel(&mut self) -> Result<(), InjectError> {
        self.state.require_touch(TouchAction::Cancel)?;
        self.cancel_touch();
        Ok(())
    }

    fn cancel_touch(&mut self) {
        if self.state.is_touch_in_progress() {
            self.emit_touch(TouchAction::Cancel, 0, Vec::new());
            self.state.take_touch();
        }
    }

    fn emit_touch(&mut self, action: TouchAction, action_index: usize, history: Vec<HistoricalSample>) {
        let meta = self.state.keys().meta_state();
        let now = self.now;
        let Some(gesture) = self.state.touch_mut() else {
            return;
        };
        let event = TouchEvent {
            action,
            action_index,
            pointers: gesture
                .pointers()
                .map(|p| TouchPointer {
                    id: p.id,
                    position: p.position,
                })
                .collect(),
            history,
            down_time: gesture.down_time(),
            event_time: now,
            meta,
        };
        gesture.mark_sent(now);
        self.out.push(InjectedEvent::Touch(event));
    }

    // Mouse

    pub(crate) fn mouse_press(&mut self, button: MouseButton) -> Result<(), InjectError> {
        self.state.check_mouse_press(button, self.bounds)?;
        self.cancel_touch();

        let first = !self.state.mouse().has_any_button_pressed();
        self.state.mouse_press(button, self.bounds, self.now)?;
        if self.state.mouse().is_hovering() {
            self.exit_hover();
        }
        let lead = if first {
            MouseAction::Down
        } else {
            MouseAction::Move
        };
        self.emit_mouse(lead, None, None);
        self.emit_mouse(MouseAction::Press, Some(button), None);
        Ok(())
    }

    pub(crate) fn mouse_move(&mut self, position: Point) {
        self.cancel_touch();
        self.state.mouse_mut().set_position(position);

        let inside = self.in_bounds(position);
        let mouse = self.state.mouse();
        if inside && !mouse.is_hovering() && !mouse.has_any_button_pressed() {
            self.enter_hover();
        } else if !inside && mouse.is_hovering() {
            self.exit_hover();
        }
        self.emit_mouse_move();
    }

    pub(crate) fn mouse_release(&mut self, button: MouseButton) -> Result<(), InjectError> {
        self.state.mouse_release(button)?;
        self.emit_mouse(MouseAction::Release, Some(button), None);

        if self.state.mouse().has_any_button_pressed() {
            self.emit_mouse(MouseAction::Move, None, None);
        } else {
            self.emit_mouse(MouseAction::Up, None, None);
            if self.in_bounds(self.state.mouse().position()) {
                self.enter_hover();
                self.emit_mouse_move();
            }
        }
        Ok(())
    }

    pub(crate) fn mouse_enter(&mut self, position: Point) -> Result<(), InjectError> {
        self.state.check_mouse_enter(position, self.bounds)?;
        self.state.mouse_mut().set_position(position);
        self.enter_hover();
        Ok(())
    }

    pub(crate) fn mouse_exit(&mut self, position: Point) -> Result<(), InjectError> {
        self.state.check_mouse_exit()?;
        self.state.mouse_mut().set_position(position);
        self.exit_hover();
        Ok(())
    }

    pub(crate) fn mouse_cancel(&mut self) -> Result<(), InjectError> {
        self.state.check_mouse_cancel()?;
        self.state.mouse_mut().clear_buttons();
        self.emit_mouse(MouseAction::Cancel, None, None);
        Ok(())
    }

    pub(crate) fn mouse_scroll(&mut self, delta: f32, wheel: ScrollWheel) {
        let position = self.state.mouse().position();
        self.mouse_move(position);
        if self.in_bounds(position) {
            let axis_value = match wheel {
                ScrollWheel::Vertical => -delta,
                ScrollWheel::Horizontal => delta,
            };
            self.emit_mouse(
                MouseAction::Scroll,
                None,
                Some(ScrollDelta { wheel, axis_value }),
            );
        }
    }

    fn enter_hover(&mut self) {
        self.emit_mouse(MouseAction::HoverEnter, None, None);
        self.state.mouse_mut().set_hovering(true);
    }

    fn exit_hover(&mut self) {
        self.emit_mouse(MouseAction::HoverExit, None, None);
        self.state.mouse_mut().set_hovering(false);
    }

    fn emit_mouse_move(&mut self) {
        let mouse = self.state.mouse();
        if mouse.has_any_button_pressed() {
            self.emit_mouse(MouseAction::Move, None, None);
        } else if mouse.is_hovering() {
            self.emit_mouse(MouseAction::HoverMove, None, None);
        }
    }

    fn emit_mouse(
        &mut self,
        action: MouseAction,
        action_button: Option<MouseButton>,
        scroll: Option<ScrollDelta>,
    ) {
        let mouse = self.state.mouse();
        self.out.push(InjectedEvent::Mouse(MouseEvent {
            action,
            position: mouse.position(),
            buttons: mouse.buttons(),
            action_button,
            scroll,
            down_time: mouse.down_time(),
            event_time: self.now,
            meta: self.state.keys().meta_state(),
        }));
    }

    // Keys

    pub(crate) fn key_down(&mut self, key: Key) -> Result<(), InjectError> {
        self.state.key_down(key, self.now)?;
        self.emit_key(KeyAction::Down, key, 0);
        Ok(())
    }

    pub(crate) fn key_up(&mut self, key: Key) -> Result<(), InjectError> {
        self.state.key_up(key)?;
        self.emit_key(KeyAction::Up, key, 0);
        Ok(())
    }

    pub(crate) fn key_repeat(&mut self, key: Key, repeat_count: u32) {
        self.emit_key(KeyAction::Down, key, repeat_count);
    }

    fn emit_key(&mut self, action: KeyAction, key: Key, repeat_count: u32) {
        let keys = self.state.keys();
        self.out.push(InjectedEvent::Key(KeyEvent {
            action,
            key,
            repeat_count,
            meta: keys.meta_state(),
            down_time: keys.down_time(),
            event_time: self.now,
        }));
    }

    // Rotary

    pub(crate) fn rotary_scroll(&mut self, axis: RotaryAxis, pixels: f32) {
        self.out.push(InjectedEvent::Rotary(RotaryEvent {
            axis,
            pixels,
            event_time: self.now,
        }));
    }
}
