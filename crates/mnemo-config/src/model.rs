// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo companion agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Mnemo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Agent identity and conversation-window settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Completion collaborator settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Long-term memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Agent identity and conversation-window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum number of turns kept in the rolling window. Must be >= 1.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            max_history: default_max_history(),
        }
    }
}

fn default_agent_name() -> String {
    "mnemo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_history() -> usize {
    20
}

/// Completion collaborator configuration.
///
/// The concrete transport adapter lives outside this workspace; these
/// values are handed to it and to per-call overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Model identifier passed to the completion collaborator.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature. `None` leaves the provider default.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

/// Long-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory pipeline. When false, conversation is never
    /// consolidated into long-term facts.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Directory holding per-user memory store files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Seconds of inactivity after which pending conversation is eligible
    /// for consolidation.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            data_dir: default_data_dir(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("mnemo").join("memory"))
        .unwrap_or_else(|| std::path::PathBuf::from("memory"))
        .to_string_lossy()
        .into_owned()
}

fn default_idle_timeout_secs() -> u64 {
    300 // 5 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = MnemoConfig::default();
        assert_eq!(config.agent.name, "mnemo");
        assert_eq!(config.agent.max_history, 20);
        assert_eq!(config.provider.max_tokens, 2048);
        assert!(config.provider.temperature.is_none());
        assert!(config.memory.enabled);
        assert_eq!(config.memory.idle_timeout_secs, 300);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = MnemoConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: MnemoConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.agent.max_history, config.agent.max_history);
        assert_eq!(parsed.memory.data_dir, config.memory.data_dir);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<MnemoConfig, _> = toml::from_str("[agent]\nbogus = 1\n");
        assert!(result.is_err());
    }
}
