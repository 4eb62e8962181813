// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers and bit sets shared by the dispatcher and the event records it produces.

use core::fmt;

/// Identifier of a single touch contact.
///
/// Unique among the pointers that are down at the same time. An id may be reused once
/// its previous owner has gone up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerId(pub u32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PointerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A physical mouse button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Usually the left button.
    Primary,
    /// Usually the right button.
    Secondary,
    /// Usually the wheel button.
    Tertiary,
    /// The "back" side button.
    Back,
    /// The "forward" side button.
    Forward,
}

impl MouseButton {
    /// The bit this button occupies in a [`Buttons`] state.
    pub const fn flag(self) -> Buttons {
        match self {
            Self::Primary => Buttons::PRIMARY,
            Self::Secondary => Buttons::SECONDARY,
            Self::Tertiary => Buttons::TERTIARY,
            Self::Back => Buttons::BACK,
            Self::Forward => Buttons::FORWARD,
        }
    }
}

bitflags::bitflags! {
    /// Set of currently pressed mouse buttons, as reported on every mouse event.
    ///
    /// Bit values match the Android `MotionEvent.BUTTON_*` constants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Buttons: u32 {
        /// [`MouseButton::Primary`].
        const PRIMARY   = 1 << 0;
        /// [`MouseButton::Secondary`].
        const SECONDARY = 1 << 1;
        /// [`MouseButton::Tertiary`].
        const TERTIARY  = 1 << 2;
        /// [`MouseButton::Back`].
        const BACK      = 1 << 3;
        /// [`MouseButton::Forward`].
        const FORWARD   = 1 << 4;
    }
}

impl Default for Buttons {
    fn default() -> Self {
        Self::empty()
    }
}

impl Buttons {
    /// Whether `button` is part of this set.
    pub const fn has(self, button: MouseButton) -> bool {
        self.contains(button.flag())
    }
}

/// A keyboard key.
///
/// Modifier and lock keys are spelled out because they feed the [`MetaState`] of every key
/// event. Everything else is either a printable character or a raw platform key code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Left shift.
    ShiftLeft,
    /// Right shift.
    ShiftRight,
    /// Left control.
    CtrlLeft,
    /// Right control.
    CtrlRight,
    /// Left alt.
    AltLeft,
    /// Right alt (`AltGr` on some layouts).
    AltRight,
    /// Left meta (Windows/Command).
    MetaLeft,
    /// Right meta (Windows/Command).
    MetaRight,
    /// Function modifier.
    Function,
    /// Symbol modifier.
    Symbol,
    /// Caps lock; toggles on each down edge.
    CapsLock,
    /// Num lock; toggles on each down edge.
    NumLock,
    /// Scroll lock; toggles on each down edge.
    ScrollLock,
    /// Enter/Return.
    Enter,
    /// Escape.
    Escape,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Space bar.
    Space,
    /// A key that produces a character.
    Character(char),
    /// Any other key, by platform key code.
    Other(u32),
}

/// The three toggling lock keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Caps lock.
    CapsLock,
    /// Num lock.
    NumLock,
    /// Scroll lock.
    ScrollLock,
}

impl Key {
    /// The meta bits contributed while this key is held down.
    ///
    /// Empty for keys that are not modifiers. Lock keys contribute through their toggle
    /// state instead, see [`LockKey::meta`].
    pub const fn modifier_meta(self) -> MetaState {
        match self {
            Self::ShiftLeft => MetaState::SHIFT_ON.union(MetaState::SHIFT_LEFT_ON),
            Self::ShiftRight => MetaState::SHIFT_ON.union(MetaState::SHIFT_RIGHT_ON),
            Self::CtrlLeft => MetaState::CTRL_ON.union(MetaState::CTRL_LEFT_ON),
            Self::CtrlRight => MetaState::CTRL_ON.union(MetaState::CTRL_RIGHT_ON),
            Self::AltLeft => MetaState::ALT_ON.union(MetaState::ALT_LEFT_ON),
            Self::AltRight => MetaState::ALT_ON.union(MetaState::ALT_RIGHT_ON),
            Self::MetaLeft => MetaState::META_ON.union(MetaState::META_LEFT_ON),
            Self::MetaRight => MetaState::META_ON.union(MetaState::META_RIGHT_ON),
            Self::Function => MetaState::FUNCTION_ON,
            Self::Symbol => MetaState::SYM_ON,
            _ => MetaState::empty(),
        }
    }

    /// The lock this key toggles, if any.
    pub const fn lock(self) -> Option<LockKey> {
        match self {
            Self::CapsLock => Some(LockKey::CapsLock),
            Self::NumLock => Some(LockKey::NumLock),
            Self::ScrollLock => Some(LockKey::ScrollLock),
            _ => None,
        }
    }
}

impl LockKey {
    /// The meta bit reported while this lock is toggled on.
    pub const fn meta(self) -> MetaState {
        match self {
            Self::CapsLock => MetaState::CAPS_LOCK_ON,
            Self::NumLock => MetaState::NUM_LOCK_ON,
            Self::ScrollLock => MetaState::SCROLL_LOCK_ON,
        }
    }
}

bitflags::bitflags! {
    /// Modifier and lock state attached to injected events.
    ///
    /// Bit values match the Android `KeyEvent.META_*` constants so records can be handed to
    /// an Android-shaped sink unchanged.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MetaState: u32 {
        /// Either shift key.
        const SHIFT_ON       = 0x1;
        /// Either alt key.
        const ALT_ON         = 0x2;
        /// Symbol modifier.
        const SYM_ON         = 0x4;
        /// Function modifier.
        const FUNCTION_ON    = 0x8;
        /// Left alt.
        const ALT_LEFT_ON    = 0x10;
        /// Right alt.
        const ALT_RIGHT_ON   = 0x20;
        /// Left shift.
        const SHIFT_LEFT_ON  = 0x40;
        /// Right shift.
        const SHIFT_RIGHT_ON = 0x80;
        /// Either control key.
        const CTRL_ON        = 0x1000;
        /// Left control.
        const CTRL_LEFT_ON   = 0x2000;
        /// Right control.
        const CTRL_RIGHT_ON  = 0x4000;
        /// Either meta key.
        const META_ON        = 0x1_0000;
        /// Left meta.
        const META_LEFT_ON   = 0x2_0000;
        /// Right meta.
        const META_RIGHT_ON  = 0x4_0000;
        /// Caps lock is toggled on.
        const CAPS_LOCK_ON   = 0x10_0000;
        /// Num lock is toggled on.
        const NUM_LOCK_ON    = 0x20_0000;
        /// Scroll lock is toggled on.
        const SCROLL_LOCK_ON = 0x40_0000;
    }
}

impl Default for MetaState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Which wheel a mouse scroll is on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollWheel {
    /// The regular, vertical wheel.
    Vertical,
    /// A horizontal wheel or tilt.
    Horizontal,
}
