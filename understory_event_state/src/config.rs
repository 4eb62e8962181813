// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thresholds shared by the gesture filters.

/// Default touch slop in pixels.
pub const TOUCH_SLOP: f64 = 18.0;

/// Default long-press timeout in milliseconds.
pub const LONG_PRESS_TIMEOUT_MS: u64 = 500;

/// Gesture thresholds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GestureConfig {
    /// Distance a pointer must travel before a drag is recognized.
    pub touch_slop: f64,
    /// How long a press must be held to count as a long press.
    pub long_press_timeout_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: TOUCH_SLOP,
            long_press_timeout_ms: LONG_PRESS_TIMEOUT_MS,
        }
    }
}

impl GestureConfig {
    /// Replace the touch slop.
    pub fn with_touch_slop(self, touch_slop: f64) -> Self {
        Self { touch_slop, ..self }
    }

    /// Replace the long-press timeout.
    pub fn with_long_press_timeout(self, long_press_timeout_ms: u64) -> Self {
        Self {
            long_press_timeout_ms,
            ..self
        }
    }
}
