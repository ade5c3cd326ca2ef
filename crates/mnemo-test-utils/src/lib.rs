// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo integration tests.
//!
//! Provides a mock chat provider for fast, deterministic, CI-runnable
//! tests without external API calls.

pub mod mock_provider;

pub use mock_provider::MockProvider;
