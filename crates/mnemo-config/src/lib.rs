// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Mnemo companion agent.
//!
//! TOML files merged across the XDG hierarchy with `MNEMO_` environment
//! variable overrides, extracted into [`model::MnemoConfig`].

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MnemoConfig;
