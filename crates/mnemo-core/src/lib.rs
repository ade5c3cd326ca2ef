// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo companion agent.
//!
//! Provides the error type, conversation types, and the collaborator
//! traits (`ChatProvider`, `PersonaSource`) that the memory pipeline and
//! agent crates build on. Transport implementations live outside this
//! workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemoError;
pub use traits::{ChatProvider, PersonaSource};
pub use types::{CompletionOverrides, Role, Turn, UserId};
