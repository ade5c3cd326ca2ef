// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types: fact categories, facts, change-sets, and the
//! helpers shared by the retention filter and the summarizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Fixed category a long-term fact belongs to.
///
/// The declared order here is also the deterministic scan order used when
/// resolving fact updates.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PersonalProfile,
    Preference,
    Relationship,
    ImportantEvent,
    Plan,
    LongTermGoal,
    #[default]
    Other,
}

impl Category {
    /// All categories in declared scan order.
    pub const ALL: [Category; 7] = [
        Category::PersonalProfile,
        Category::Preference,
        Category::Relationship,
        Category::ImportantEvent,
        Category::Plan,
        Category::LongTermGoal,
        Category::Other,
    ];

    /// Normalize a raw LLM-produced category string.
    ///
    /// Anything outside the closed enum becomes `Other`.
    pub fn from_raw(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Category::Other)
    }

    /// Human-readable section label used by the rendered memory block.
    pub fn label(&self) -> &'static str {
        match self {
            Category::PersonalProfile => "User profile",
            Category::Preference => "Preferences",
            Category::Relationship => "Key relationships",
            Category::ImportantEvent => "Important events",
            Category::Plan => "Plans and commitments",
            Category::LongTermGoal => "Long-term goals",
            Category::Other => "Other",
        }
    }
}

fn category_from_raw<'de, D>(deserializer: D) -> Result<Category, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Category::from_raw(&raw))
}

/// One atomic piece of long-term information about the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub content: String,
    /// Why this was judged worth remembering.
    pub reason: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_reason: Option<String>,
}

impl Fact {
    pub fn new(content: impl Into<String>, reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            reason: reason.into(),
            created_at: at,
            updated_at: None,
            update_reason: None,
        }
    }
}

/// A fact the summarizer wants added to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactToAdd {
    /// Wire key is `type`; unknown values coerce to `other` on parse.
    #[serde(rename = "type", default, deserialize_with = "category_from_raw")]
    pub category: Category,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reason: String,
}

/// An update to an existing fact, matched by substring against stored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactUpdate {
    /// Description of the existing fact to update.
    #[serde(default)]
    pub target: String,
    /// Replacement content.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reason: String,
}

/// Structured output of one extraction pass over a batch of conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub summary: String,
    pub facts_to_add: Vec<FactToAdd>,
    pub facts_to_update: Vec<FactUpdate>,
    pub should_persist: bool,
    /// Forward-looking guidance for future conversations.
    pub notes: String,
}

/// Raw wire shape of the summarizer reply. Field names match the JSON the
/// extraction prompt asks for; every field is optional.
#[derive(Debug, Deserialize)]
struct RawChangeSet {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    memories_to_add: Vec<FactToAdd>,
    #[serde(default)]
    memories_to_update: Vec<FactUpdate>,
    #[serde(default)]
    should_save_memory: Option<bool>,
    #[serde(default)]
    notes_for_future_conversation: String,
}

impl ChangeSet {
    /// Parse a summarizer reply, tolerating fenced code blocks.
    ///
    /// Missing fields default per contract: absent lists are empty, absent
    /// `should_save_memory` is true iff either list is non-empty, absent
    /// notes are empty.
    pub fn from_response(response: &str) -> Result<Self, serde_json::Error> {
        let raw: RawChangeSet = serde_json::from_str(strip_code_fences(response))?;
        let should_persist = raw
            .should_save_memory
            .unwrap_or(!raw.memories_to_add.is_empty() || !raw.memories_to_update.is_empty());
        Ok(Self {
            summary: raw.summary,
            facts_to_add: raw.memories_to_add,
            facts_to_update: raw.memories_to_update,
            should_persist,
            notes: raw.notes_for_future_conversation,
        })
    }

    /// The degraded change-set used when extraction fails: nothing to
    /// persist, failure description in the summary slot.
    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            summary: description.into(),
            facts_to_add: Vec::new(),
            facts_to_update: Vec::new(),
            should_persist: false,
            notes: String::new(),
        }
    }
}

/// One completed consolidation, recorded alongside the facts it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationRecord {
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "memories_added")]
    pub facts_added: Vec<FactToAdd>,
    #[serde(default, rename = "memories_updated")]
    pub facts_updated: Vec<FactUpdate>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// One user utterance and the assistant reply it received.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangePair {
    pub user: String,
    pub assistant: String,
}

impl ExchangePair {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Format a batch of exchanges as alternating `user:`/`assistant:` lines
/// for the retention and extraction prompts.
pub fn format_batch(batch: &[ExchangePair]) -> String {
    let mut lines = Vec::with_capacity(batch.len() * 2);
    for pair in batch {
        lines.push(format!("user: {}", pair.user));
        lines.push(format!("assistant: {}", pair.assistant));
    }
    lines.join("\n")
}

/// Strip a fenced code block from an LLM reply, returning the inner text.
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences, with or without
/// surrounding prose. Replies without fences pass through trimmed.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    for marker in ["```json", "```"] {
        if let Some(start) = trimmed.find(marker) {
            let inner = &trimmed[start + marker.len()..];
            let end = inner.find("```").unwrap_or(inner.len());
            return inner[..end].trim();
        }
    }
    trimmed
}
