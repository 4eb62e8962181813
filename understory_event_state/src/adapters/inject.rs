// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter from [`understory_inject`] event records to pointer changes.
//!
//! ## Feature
//!
//! Enable with `inject_adapter`.
//!
//! ## Notes
//!
//! [`InjectAdapter`] remembers the last sample of every pointer so it can pair it with the
//! next one. Touch pointers keep their ids; the mouse is reported as [`MOUSE_POINTER`]. Touch
//! history samples become their own moves ahead of the event that carries them, so velocity
//! tracking sees every sample. Mouse button changes are reported through `Down`, `Move` and
//! `Up` only; `Press`/`Release` repeat what those already say. Key and rotary records carry no
//! pointer and are skipped.
//!
//! ```
//! use kurbo::{Point, Rect, Size, Vec2};
//! use understory_inject::dispatcher::InputDispatcher;
//! use understory_inject::sink::{FixedRoot, RecordingSink};
//! use understory_inject::types::PointerId;
//! use understory_event_state::adapters::inject::InjectAdapter;
//! use understory_event_state::config::GestureConfig;
//! use understory_event_state::drag::DragGestureFilter;
//! use understory_event_state::pass::GestureDetector;
//! use understory_event_state::raw_drag::DragEvent;
//!
//! let root = FixedRoot(Rect::new(0.0, 0.0, 300.0, 300.0));
//! let mut dispatcher = InputDispatcher::new(root, RecordingSink::new());
//! dispatcher
//!     .swipe(PointerId(0), Point::new(10.0, 10.0), Point::new(110.0, 10.0), 160)
//!     .unwrap();
//! dispatcher.send().unwrap();
//!
//! let mut events = Vec::new();
//! let mut drag = DragGestureFilter::new(GestureConfig::default(), |e| {
//!     events.push(e);
//!     Vec2::ZERO
//! });
//! let mut detector = GestureDetector::new(Size::new(300.0, 300.0));
//! let mut adapter = InjectAdapter::new();
//! for event in dispatcher.sink().events() {
//!     adapter.feed(event, &mut detector, &mut [&mut drag]).unwrap();
//! }
//! drop(drag);
//!
//! assert!(matches!(events.first(), Some(DragEvent::Start(_))));
//! assert!(matches!(events.last(), Some(DragEvent::Stop(_))));
//! ```

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use understory_inject::event::{
    InjectedEvent, MouseAction, MouseEvent, TouchAction, TouchEvent,
};

use crate::filter::GestureFilter;
use crate::pass::GestureDetector;
use crate::pointer::{PointerChange, PointerId, PointerSample};
use crate::scheduler::ScheduleError;

/// Pointer id used for the mouse; above every touch pointer id.
pub const MOUSE_POINTER: PointerId = PointerId(1 << 32);

/// Pointer changes from one event, in pointer order.
pub type PointerChanges = SmallVec<[PointerChange; 4]>;

/// One unit of input for a filter chain.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerInput {
    /// Dispatch these changes.
    Changes(PointerChanges),
    /// Cancel the gesture.
    Cancel,
}

/// Converts injected event records into pointer changes, remembering each pointer's last
/// sample.
#[derive(Clone, Debug, Default)]
pub struct InjectAdapter {
    last: HashMap<PointerId, PointerSample>,
    offset: Vec2,
}

impl InjectAdapter {
    /// An adapter reporting positions in root coordinates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report positions relative to `origin` (the filter's top-left corner in root
    /// coordinates).
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.offset = -origin.to_vec2();
        self
    }

    /// Convert one record. Records without pointer content yield nothing.
    pub fn convert(&mut self, event: &InjectedEvent) -> Vec<PointerInput> {
        match event {
            InjectedEvent::Touch(touch) => self.convert_touch(touch),
            InjectedEvent::Mouse(mouse) => self.convert_mouse(mouse).into_iter().collect(),
            InjectedEvent::Key(_) | InjectedEvent::Rotary(_) => Vec::new(),
        }
    }

    /// Convert `event` and dispatch the result through `detector` to `chain`.
    pub fn feed(
        &mut self,
        event: &InjectedEvent,
        detector: &mut GestureDetector,
        chain: &mut [&mut dyn GestureFilter],
    ) -> Result<(), ScheduleError> {
        for input in self.convert(event) {
            match input {
                PointerInput::Changes(mut changes) => detector.dispatch(chain, &mut changes)?,
                PointerInput::Cancel => {
                    detector.advance_time(chain, event.event_time())?;
                    detector.cancel(chain);
                }
            }
        }
        Ok(())
    }

    fn convert_touch(&mut self, touch: &TouchEvent) -> Vec<PointerInput> {
        let ids: SmallVec<[PointerId; 4]> = touch
            .pointers
            .iter()
            .map(|p| PointerId(u64::from(p.id.0)))
            .collect();
        if touch.action == TouchAction::Cancel {
            for id in &ids {
                self.last.remove(id);
            }
            return alloc::vec![PointerInput::Cancel];
        }

        let mut out = Vec::with_capacity(touch.history.len() + 1);
        for sample in &touch.history {
            let changes = ids
                .iter()
                .zip(&sample.positions)
                .map(|(&id, &position)| self.advance(id, sample.event_time, position, true))
                .collect();
            out.push(PointerInput::Changes(changes));
        }

        let lifting = matches!(touch.action, TouchAction::Up | TouchAction::PointerUp)
            .then_some(touch.action_index);
        let changes = ids
            .iter()
            .zip(&touch.pointers)
            .enumerate()
            .map(|(index, (&id, pointer))| {
                let pressed = lifting != Some(index);
                self.advance(id, touch.event_time, pointer.position, pressed)
            })
            .collect();
        out.push(PointerInput::Changes(changes));
        out
    }

    fn convert_mouse(&mut self, mouse: &MouseEvent) -> Option<PointerInput> {
        let pressed = match mouse.action {
            MouseAction::Down => true,
            MouseAction::Up => false,
            MouseAction::Move | MouseAction::HoverMove => !mouse.buttons.is_empty(),
            MouseAction::Cancel => {
                self.last.remove(&MOUSE_POINTER);
                return Some(PointerInput::Cancel);
            }
            MouseAction::HoverEnter
            | MouseAction::HoverExit
            | MouseAction::Press
            | MouseAction::Release
            | MouseAction::Scroll => return None,
        };
        let change = self.advance(MOUSE_POINTER, mouse.event_time, mouse.position, pressed);
        Some(PointerInput::Changes(smallvec::smallvec![change]))
    }

    fn advance(&mut self, id: PointerId, uptime: u64, position: Point, pressed: bool) -> PointerChange {
        let current = PointerSample {
            uptime,
            position: position + self.offset,
            pressed,
        };
        let previous = self.last.get(&id).copied().unwrap_or(PointerSample {
            pressed: false,
            ..current
        });
        if pressed {
            self.last.insert(id, current);
        } else {
            self.last.remove(&id);
        }
        PointerChange::new(id, previous, current)
    }
}
