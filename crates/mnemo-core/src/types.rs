// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation types shared across the Mnemo workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity handle for the person a conversation belongs to.
///
/// Keys the durable memory store on disk; two distinct `UserId`s never
/// share facts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Speaker role of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation, tagged with its speaker role.
///
/// At most one `system` turn exists per window, always at index 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Optional per-call parameter overrides for a completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionOverrides {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Credential override for callers that manage per-user API keys.
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::System, Role::User, Role::Assistant] {
            let s = role.to_string();
            assert_eq!(Role::from_str(&s).unwrap(), role);
        }
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(parsed, Role::System);
    }

    #[test]
    fn turn_serde_shape() {
        let turn = Turn::new(Role::User, "hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn user_id_equality_and_hash() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(UserId("alice".into()), 1);
        assert_eq!(map.get(&UserId("alice".into())), Some(&1));
        assert_eq!(map.get(&UserId("bob".into())), None);
    }
}
