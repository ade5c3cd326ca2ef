// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat provider for deterministic testing.
//!
//! `MockProvider` implements `ChatProvider` with pre-scripted outcomes,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mnemo_core::{ChatProvider, CompletionOverrides, MnemoError, Turn};

enum Scripted {
    Reply(String),
    Failure(String),
}

/// A mock chat provider that returns pre-scripted outcomes.
///
/// Outcomes are popped from a FIFO queue; when the queue is empty, a
/// default "mock response" text is returned. Every request's message
/// array is captured for later assertion.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<Vec<Turn>>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            script: Arc::new(Mutex::new(
                responses.into_iter().map(Scripted::Reply).collect(),
            )),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Reply(text.into()));
    }

    /// Queue a transport failure with the given message.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Failure(message.into()));
    }

    /// Message arrays of every `complete` call made so far, in order.
    pub async fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn complete(
        &self,
        messages: &[Turn],
        _overrides: Option<CompletionOverrides>,
    ) -> Result<String, MnemoError> {
        self.calls.lock().await.push(messages.to_vec());
        match self.script.lock().await.pop_front() {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Failure(message)) => Err(MnemoError::provider(message)),
            None => Ok("mock response".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::Role;

    #[tokio::test]
    async fn default_response_when_script_empty() {
        let provider = MockProvider::new();
        let reply = provider.complete(&[], None).await.unwrap();
        assert_eq!(reply, "mock response");
    }

    #[tokio::test]
    async fn scripted_outcomes_in_order() {
        let provider = MockProvider::with_responses(vec!["first".into(), "second".into()]);
        provider.push_failure("boom").await;

        assert_eq!(provider.complete(&[], None).await.unwrap(), "first");
        assert_eq!(provider.complete(&[], None).await.unwrap(), "second");
        let err = provider.complete(&[], None).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        // Script exhausted, falls back to default
        assert_eq!(provider.complete(&[], None).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn captures_request_messages() {
        let provider = MockProvider::new();
        let messages = vec![
            Turn::new(Role::System, "persona"),
            Turn::new(Role::User, "hi"),
        ];
        provider.complete(&messages, None).await.unwrap();

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], messages);
    }
}
