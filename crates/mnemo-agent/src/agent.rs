// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation loop for one identity.
//!
//! Each `ChatAgent` owns a rolling window, a memory orchestrator, and a
//! shared handle to that identity's long-term store. A chat turn is:
//! lazy idle consolidation, append the user turn, one completion call,
//! append the reply, record the exchange. Provider failures roll the
//! window back to its exact prior state so no orphan user turn is left
//! behind.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mnemo_config::MnemoConfig;
use mnemo_core::{ChatProvider, CompletionOverrides, MnemoError, PersonaSource, Role};
use mnemo_memory::{
    ConsolidationOutcome, LongTermStore, MemoryOrchestrator, RollingWindow,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Drives one user's conversation against a completion provider.
///
/// Turns within a conversation are serialized by `&mut self`; hold each
/// agent behind its own lock when sharing across tasks. Distinct agents
/// never share mutable state except the store behind its own mutex.
pub struct ChatAgent {
    provider: Arc<dyn ChatProvider>,
    persona: Arc<dyn PersonaSource>,
    store: Arc<Mutex<LongTermStore>>,
    window: RollingWindow,
    orchestrator: MemoryOrchestrator,
    overrides: Option<CompletionOverrides>,
    system_override: Option<String>,
    memory_enabled: bool,
}

impl ChatAgent {
    /// Build an agent over an already-opened store and assemble its
    /// initial system message.
    pub async fn new(
        provider: Arc<dyn ChatProvider>,
        persona: Arc<dyn PersonaSource>,
        store: Arc<Mutex<LongTermStore>>,
        config: &MnemoConfig,
    ) -> Self {
        let overrides = Some(CompletionOverrides {
            temperature: config.provider.temperature,
            max_tokens: Some(config.provider.max_tokens),
            api_key: None,
        });
        let orchestrator = MemoryOrchestrator::new(
            provider.clone(),
            store.clone(),
            Duration::from_secs(config.memory.idle_timeout_secs),
        );
        let mut agent = Self {
            provider,
            persona,
            store,
            window: RollingWindow::new(config.agent.max_history),
            orchestrator,
            overrides,
            system_override: None,
            memory_enabled: config.memory.enabled,
        };
        agent.rebuild_system_message().await;
        agent
    }

    /// Run one chat turn and return the assistant reply.
    ///
    /// Consolidation is checked first, against the gap since the previous
    /// user turn; a persisted consolidation refreshes the system message
    /// before this turn's completion sees it. On provider failure the
    /// window is restored byte-for-byte and the error propagates.
    pub async fn handle(&mut self, text: &str) -> Result<String, MnemoError> {
        let now = Utc::now();
        if self.memory_enabled
            && self.orchestrator.check_idle(now).await == ConsolidationOutcome::Persisted
        {
            self.rebuild_system_message().await;
        }

        let before = self.window.snapshot();
        self.window.append(Role::User, text);

        let reply = match self
            .provider
            .complete(&self.window.snapshot(), self.overrides.clone())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                self.window.restore(before);
                return Err(e);
            }
        };

        self.window.append(Role::Assistant, &reply);
        if self.memory_enabled {
            self.orchestrator.record_exchange(text, &reply, now);
        }
        debug!(window_len = self.window.len(), "chat turn completed");
        Ok(reply)
    }

    /// Consolidate any pending exchanges now, refreshing the system
    /// message if facts were persisted. For session teardown.
    pub async fn flush_memory(&mut self) -> ConsolidationOutcome {
        if !self.memory_enabled {
            return ConsolidationOutcome::NothingPending;
        }
        let outcome = self.orchestrator.flush().await;
        if outcome == ConsolidationOutcome::Persisted {
            info!("session flush persisted new facts");
            self.rebuild_system_message().await;
        }
        outcome
    }

    /// Pin a caller-supplied system message, suppressing persona and
    /// memory assembly until [`reset_system_message`] is called.
    pub fn set_system_override(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.window.set_system(&content);
        self.system_override = Some(content);
    }

    /// Drop any system override and reassemble persona plus memory.
    pub async fn reset_system_message(&mut self) {
        self.system_override = None;
        self.rebuild_system_message().await;
    }

    /// Forget the live conversation, keeping the system message. The
    /// long-term store is untouched.
    pub fn clear_history(&mut self) {
        self.window.clear();
    }

    /// Ordered copy of the current window, system turn included.
    pub fn history(&self) -> Vec<mnemo_core::Turn> {
        self.window.snapshot()
    }

    /// Shared handle to this identity's long-term store.
    pub fn store(&self) -> Arc<Mutex<LongTermStore>> {
        self.store.clone()
    }

    async fn rebuild_system_message(&mut self) {
        if let Some(content) = &self.system_override {
            let content = content.clone();
            self.window.set_system(content);
            return;
        }
        let persona = self.persona.persona_text();
        let memory = self.store.lock().await.render();
        let system = if memory.is_empty() {
            persona
        } else {
            format!("{persona}\n\n[long-term memory]\n{memory}")
        };
        self.window.set_system(system);
    }
}
