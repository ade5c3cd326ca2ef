// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user agent registry.
//!
//! Agents are created lazily, one per identity, each over its own
//! long-term store file. The provider and persona are shared; all
//! per-user state is isolated.

use std::collections::HashMap;
use std::sync::Arc;

use mnemo_config::MnemoConfig;
use mnemo_core::{ChatProvider, MnemoError, PersonaSource, UserId};
use mnemo_memory::LongTermStore;
use tokio::sync::Mutex;
use tracing::info;

use crate::agent::ChatAgent;

/// Lazily-populated map from identity to its live agent.
pub struct AgentRegistry {
    provider: Arc<dyn ChatProvider>,
    persona: Arc<dyn PersonaSource>,
    config: MnemoConfig,
    agents: HashMap<UserId, ChatAgent>,
}

impl AgentRegistry {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        persona: Arc<dyn PersonaSource>,
        config: MnemoConfig,
    ) -> Self {
        Self {
            provider,
            persona,
            config,
            agents: HashMap::new(),
        }
    }

    /// The agent for `user`, opening its store on first use.
    pub async fn get_or_create(&mut self, user: &UserId) -> Result<&mut ChatAgent, MnemoError> {
        if !self.agents.contains_key(user) {
            let store = LongTermStore::open(self.config.memory.data_dir.clone(), user).await?;
            let agent = ChatAgent::new(
                self.provider.clone(),
                self.persona.clone(),
                Arc::new(Mutex::new(store)),
                &self.config,
            )
            .await;
            info!(user = user.as_str(), "created agent");
            self.agents.insert(user.clone(), agent);
        }
        // Present after the insert above.
        self.agents
            .get_mut(user)
            .ok_or_else(|| MnemoError::Internal("registry entry vanished".into()))
    }

    /// Drop a user's live agent, flushing pending memory first. The
    /// durable store file is untouched.
    pub async fn remove(&mut self, user: &UserId) {
        if let Some(mut agent) = self.agents.remove(user) {
            agent.flush_memory().await;
            info!(user = user.as_str(), "removed agent");
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
