// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to integrate with other Understory crates.
//!
//! Each adapter is gated behind a feature flag to keep the filters lightweight and `no_std`.
//!
//! ## Available Adapters
//!
//! - [`inject`] (`inject_adapter` feature): turns [`understory_inject`] touch and mouse records
//!   into pointer changes, so synthesized input can drive a filter chain end to end.

#[cfg(feature = "inject_adapter")]
pub mod inject;
