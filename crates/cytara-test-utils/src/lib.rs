// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cytara integration tests.
//!
//! Provides a temp-database harness with seeded fixtures for fast,
//! deterministic, CI-runnable tests without external services.

pub mod harness;

pub use harness::{TestHarness, random_token};
