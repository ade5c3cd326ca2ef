// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the boundary of the memory core.
//!
//! The transport layer (HTTP clients, auth, per-provider adapters) lives
//! outside this workspace and is consumed only through these seams.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::{CompletionOverrides, Turn};

/// Chat completion collaborator.
///
/// Implementations wrap a concrete LLM API. The core always passes either
/// the full current window or, for memory classification/extraction, a
/// two-message array of policy prompt plus formatted batch. Transport
/// timeouts and retries are the implementation's concern.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends the ordered messages and returns the assistant reply text.
    async fn complete(
        &self,
        messages: &[Turn],
        overrides: Option<CompletionOverrides>,
    ) -> Result<String, MnemoError>;
}

/// Persona text collaborator.
///
/// Supplies the persona description injected at the head of every system
/// message. Returns an empty string when no persona is configured.
pub trait PersonaSource: Send + Sync {
    fn persona_text(&self) -> String;
}
