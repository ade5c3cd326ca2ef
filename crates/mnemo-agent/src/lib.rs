// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation agent: the per-identity chat loop, persona management,
//! and the lazy per-user agent registry.

pub mod agent;
pub mod persona;
pub mod registry;

pub use agent::ChatAgent;
pub use persona::{PersonaField, PersonaManager, PersonaProfile};
pub use registry::AgentRegistry;
