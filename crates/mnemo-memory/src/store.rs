// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable long-term memory store.
//!
//! One JSON file per conversation identity, holding category-keyed fact
//! lists, the consolidation history, and a free-text notes field. The
//! store is write-through: every merge persists the full snapshot, so a
//! crash loses at most the in-flight merge.
//!
//! Loading repairs rather than rejects: a snapshot missing category keys
//! or holding wrong-shaped fields gets the canonical empty defaults.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use mnemo_core::{MnemoError, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Category, ChangeSet, ConsolidationRecord, Fact, FactUpdate};

/// The persisted shape of one identity's long-term memory.
///
/// Field names are the on-disk contract; all seven category keys are
/// always written, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub personal_profile: Vec<Fact>,
    #[serde(default)]
    pub preference: Vec<Fact>,
    #[serde(default)]
    pub relationship: Vec<Fact>,
    #[serde(default)]
    pub important_event: Vec<Fact>,
    #[serde(default)]
    pub plan: Vec<Fact>,
    #[serde(default)]
    pub long_term_goal: Vec<Fact>,
    #[serde(default)]
    pub other: Vec<Fact>,
    #[serde(default)]
    pub conversation_summaries: Vec<ConsolidationRecord>,
    #[serde(default)]
    pub notes_for_future: String,
}

impl StoreSnapshot {
    pub fn facts(&self, category: Category) -> &Vec<Fact> {
        match category {
            Category::PersonalProfile => &self.personal_profile,
            Category::Preference => &self.preference,
            Category::Relationship => &self.relationship,
            Category::ImportantEvent => &self.important_event,
            Category::Plan => &self.plan,
            Category::LongTermGoal => &self.long_term_goal,
            Category::Other => &self.other,
        }
    }

    pub fn facts_mut(&mut self, category: Category) -> &mut Vec<Fact> {
        match category {
            Category::PersonalProfile => &mut self.personal_profile,
            Category::Preference => &mut self.preference,
            Category::Relationship => &mut self.relationship,
            Category::ImportantEvent => &mut self.important_event,
            Category::Plan => &mut self.plan,
            Category::LongTermGoal => &mut self.long_term_goal,
            Category::Other => &mut self.other,
        }
    }

    /// True when no category holds a fact and the notes field is empty.
    /// Consolidation records do not count: they are history, not context.
    pub fn is_blank(&self) -> bool {
        Category::ALL.iter().all(|c| self.facts(*c).is_empty())
            && self.notes_for_future.is_empty()
    }
}

/// Repair an arbitrary JSON value into a well-formed snapshot.
///
/// Each field is recovered independently; anything missing or wrong-shaped
/// falls back to its canonical empty default.
fn repair(value: serde_json::Value) -> StoreSnapshot {
    let mut snapshot = StoreSnapshot::default();
    let Some(map) = value.as_object() else {
        return snapshot;
    };
    for category in Category::ALL {
        if let Some(v) = map.get(&category.to_string()) {
            *snapshot.facts_mut(category) =
                serde_json::from_value(v.clone()).unwrap_or_default();
        }
    }
    if let Some(v) = map.get("conversation_summaries") {
        snapshot.conversation_summaries =
            serde_json::from_value(v.clone()).unwrap_or_default();
    }
    if let Some(v) = map.get("notes_for_future") {
        snapshot.notes_for_future = v.as_str().unwrap_or_default().to_string();
    }
    snapshot
}

/// Durable, per-identity collection of long-term facts.
pub struct LongTermStore {
    path: PathBuf,
    snapshot: StoreSnapshot,
}

impl LongTermStore {
    /// Open (or initialize) the store for one conversation identity.
    ///
    /// The backing file lives at `<data_dir>/user_<id>.json`. A missing
    /// file yields an empty store; a corrupt file is repaired field by
    /// field and the damage logged, never surfaced as an error.
    pub async fn open(data_dir: impl Into<PathBuf>, user: &UserId) -> Result<Self, MnemoError> {
        let dir = data_dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(MnemoError::storage)?;
        let path = dir.join(format!("user_{}.json", user.as_str()));

        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => repair(value),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt memory snapshot, starting empty");
                    StoreSnapshot::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable memory snapshot, starting empty");
                StoreSnapshot::default()
            }
        };

        debug!(path = %path.display(), "opened long-term store");
        Ok(Self { path, snapshot })
    }

    /// Merge a change-set into the store and persist the result.
    ///
    /// Adds append to their (already normalized) category. Updates scan all
    /// facts in declared category order, then insertion order, for the
    /// first whose content contains the target as a case-insensitive
    /// substring; a miss turns the update into an addition under `other`.
    /// Non-empty notes append to the stored notes, never overwrite. The
    /// whole change-set is captured as a consolidation record.
    ///
    /// Not transactional across entries: a persist failure leaves the
    /// in-memory state complete but not yet durable.
    pub async fn merge(&mut self, change_set: &ChangeSet) -> Result<(), MnemoError> {
        let now = Utc::now();

        for add in &change_set.facts_to_add {
            self.snapshot
                .facts_mut(add.category)
                .push(Fact::new(&add.content, &add.reason, now));
        }
        for update in &change_set.facts_to_update {
            self.apply_update(update, now);
        }

        if !change_set.notes.is_empty() {
            if self.snapshot.notes_for_future.is_empty() {
                self.snapshot.notes_for_future = change_set.notes.clone();
            } else {
                self.snapshot.notes_for_future.push('\n');
                self.snapshot.notes_for_future.push_str(&change_set.notes);
            }
        }

        self.snapshot.conversation_summaries.push(ConsolidationRecord {
            summary: change_set.summary.clone(),
            facts_added: change_set.facts_to_add.clone(),
            facts_updated: change_set.facts_to_update.clone(),
            notes: change_set.notes.clone(),
            created_at: now,
        });

        self.persist().await
    }

    /// First-substring-match update. The scan order is deterministic but
    /// the match itself is a heuristic inherited from the stored-content
    /// contract; do not tighten it without changing the contract.
    fn apply_update(&mut self, update: &FactUpdate, now: DateTime<Utc>) {
        let needle = update.target.to_lowercase();
        for category in Category::ALL {
            for fact in self.snapshot.facts_mut(category) {
                if fact.content.to_lowercase().contains(&needle) {
                    fact.content = update.content.clone();
                    fact.updated_at = Some(now);
                    fact.update_reason = Some(update.reason.clone());
                    return;
                }
            }
        }
        self.snapshot
            .facts_mut(Category::Other)
            .push(Fact::new(&update.content, &update.reason, now));
    }

    /// Render the store as a compact text block for context injection.
    ///
    /// One labeled section per non-empty category, then the notes section.
    /// Returns the empty string when there is nothing to show. Display
    /// only; this text is never re-parsed.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();
        for category in Category::ALL {
            let facts = self.snapshot.facts(category);
            if facts.is_empty() {
                continue;
            }
            let mut section = format!("[{}]", category.label());
            for fact in facts {
                section.push_str("\n- ");
                section.push_str(&fact.content);
            }
            sections.push(section);
        }
        if !self.snapshot.notes_for_future.is_empty() {
            sections.push(format!(
                "[Conversation guidance]\n{}",
                self.snapshot.notes_for_future
            ));
        }
        sections.join("\n\n")
    }

    /// Write the full snapshot to disk.
    ///
    /// The snapshot goes to a sibling temp file first and is renamed over
    /// the target, so the store file on disk is always a complete write.
    /// An interrupted persist leaves the previous snapshot untouched.
    pub async fn persist(&self) -> Result<(), MnemoError> {
        let bytes = serde_json::to_vec_pretty(&self.snapshot).map_err(MnemoError::storage)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(MnemoError::storage)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(MnemoError::storage)
    }

    /// Read-only view of the full snapshot.
    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    /// Facts in one category, in insertion order.
    pub fn facts_in(&self, category: Category) -> &[Fact] {
        self.snapshot.facts(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FactToAdd;
    use tempfile::tempdir;

    fn change_set_adding(category: Category, content: &str, reason: &str) -> ChangeSet {
        ChangeSet {
            summary: "test".into(),
            facts_to_add: vec![FactToAdd {
                category,
                content: content.into(),
                reason: reason.into(),
            }],
            facts_to_update: vec![],
            should_persist: true,
            notes: String::new(),
        }
    }

    fn change_set_updating(target: &str, content: &str, reason: &str) -> ChangeSet {
        ChangeSet {
            summary: "test".into(),
            facts_to_add: vec![],
            facts_to_update: vec![FactUpdate {
                target: target.into(),
                content: content.into(),
                reason: reason.into(),
            }],
            should_persist: true,
            notes: String::new(),
        }
    }

    fn notes_only(notes: &str) -> ChangeSet {
        ChangeSet {
            summary: "notes".into(),
            facts_to_add: vec![],
            facts_to_update: vec![],
            should_persist: true,
            notes: notes.into(),
        }
    }

    #[tokio::test]
    async fn open_missing_file_yields_empty_store() {
        let dir = tempdir().unwrap();
        let store = LongTermStore::open(dir.path(), &UserId("alice".into()))
            .await
            .unwrap();
        assert!(store.snapshot().is_blank());
        assert_eq!(store.render(), "");
    }

    #[tokio::test]
    async fn merge_then_reload_round_trips() {
        let dir = tempdir().unwrap();
        let user = UserId("alice".into());

        let mut store = LongTermStore::open(dir.path(), &user).await.unwrap();
        store
            .merge(&change_set_adding(Category::Plan, "remind about exam on Friday", "explicit request"))
            .await
            .unwrap();
        let before = store.snapshot().clone();

        let reloaded = LongTermStore::open(dir.path(), &user).await.unwrap();
        assert_eq!(*reloaded.snapshot(), before);
        assert_eq!(reloaded.facts_in(Category::Plan).len(), 1);
        assert_eq!(reloaded.snapshot().conversation_summaries.len(), 1);
    }

    #[tokio::test]
    async fn load_repairs_missing_category_keys() {
        let dir = tempdir().unwrap();
        let user = UserId("bob".into());
        let path = dir.path().join("user_bob.json");
        // Snapshot written by an older version: only two keys present.
        tokio::fs::write(
            &path,
            r#"{"plan": [{"content": "run daily", "reason": "goal", "created_at": "2026-01-01T00:00:00Z"}], "notes_for_future": "be encouraging"}"#,
        )
        .await
        .unwrap();

        let store = LongTermStore::open(dir.path(), &user).await.unwrap();
        assert_eq!(store.facts_in(Category::Plan).len(), 1);
        assert!(store.facts_in(Category::PersonalProfile).is_empty());
        assert_eq!(store.snapshot().notes_for_future, "be encouraging");
        assert!(store.snapshot().conversation_summaries.is_empty());
    }

    #[tokio::test]
    async fn load_repairs_wrong_shaped_fields() {
        let dir = tempdir().unwrap();
        let user = UserId("carol".into());
        let path = dir.path().join("user_carol.json");
        tokio::fs::write(
            &path,
            r#"{"preference": "not a list", "notes_for_future": 42, "conversation_summaries": {"oops": true}}"#,
        )
        .await
        .unwrap();

        let store = LongTermStore::open(dir.path(), &user).await.unwrap();
        assert!(store.facts_in(Category::Preference).is_empty());
        assert!(store.snapshot().notes_for_future.is_empty());
        assert!(store.snapshot().conversation_summaries.is_empty());
    }

    #[tokio::test]
    async fn load_survives_non_json_file() {
        let dir = tempdir().unwrap();
        let user = UserId("dave".into());
        tokio::fs::write(dir.path().join("user_dave.json"), "%%% not json %%%")
            .await
            .unwrap();

        let store = LongTermStore::open(dir.path(), &user).await.unwrap();
        assert!(store.snapshot().is_blank());
    }

    #[tokio::test]
    async fn persisted_file_always_has_all_category_keys() {
        let dir = tempdir().unwrap();
        let user = UserId("erin".into());
        let mut store = LongTermStore::open(dir.path(), &user).await.unwrap();
        store.persist().await.unwrap();

        let text = tokio::fs::read_to_string(dir.path().join("user_erin.json"))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for category in Category::ALL {
            assert!(
                value.get(category.to_string()).is_some(),
                "missing key {category}"
            );
        }
        assert!(value.get("conversation_summaries").is_some());
        assert!(value.get("notes_for_future").is_some());
    }

    #[tokio::test]
    async fn interrupted_persist_never_drops_prior_facts() {
        let dir = tempdir().unwrap();
        let user = UserId("erin2".into());

        let mut store = LongTermStore::open(dir.path(), &user).await.unwrap();
        store
            .merge(&change_set_adding(Category::Plan, "remind about exam on Friday", "explicit request"))
            .await
            .unwrap();

        // A crash mid-write leaves a torn sibling temp file, never a torn
        // store file.
        let tmp = dir.path().join("user_erin2.json.tmp");
        tokio::fs::write(&tmp, r#"{"plan": [{"cont"#).await.unwrap();

        let reloaded = LongTermStore::open(dir.path(), &user).await.unwrap();
        assert_eq!(reloaded.facts_in(Category::Plan).len(), 1);

        // The next merge replaces the leftover temp file and the target
        // stays a complete, parsable snapshot.
        let mut store = reloaded;
        store
            .merge(&change_set_adding(Category::Preference, "likes jazz", "stated"))
            .await
            .unwrap();
        let text = tokio::fs::read_to_string(dir.path().join("user_erin2.json"))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["plan"].as_array().unwrap().len(), 1);
        assert_eq!(value["preference"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_first_substring_match() {
        let dir = tempdir().unwrap();
        let mut store = LongTermStore::open(dir.path(), &UserId("f".into()))
            .await
            .unwrap();
        store
            .merge(&change_set_adding(Category::PersonalProfile, "Works as a Student", "profile"))
            .await
            .unwrap();
        store
            .merge(&change_set_updating("works as a student", "Works as a product manager", "changed jobs"))
            .await
            .unwrap();

        let facts = store.facts_in(Category::PersonalProfile);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].content, "Works as a product manager");
        assert!(facts[0].updated_at.is_some());
        assert_eq!(facts[0].update_reason.as_deref(), Some("changed jobs"));
    }

    #[tokio::test]
    async fn update_scans_categories_in_declared_order() {
        let dir = tempdir().unwrap();
        let mut store = LongTermStore::open(dir.path(), &UserId("g".into()))
            .await
            .unwrap();
        // Same substring in a later category first, then an earlier one.
        store
            .merge(&change_set_adding(Category::Plan, "likes running at dawn", "plan"))
            .await
            .unwrap();
        store
            .merge(&change_set_adding(Category::Preference, "likes running", "preference"))
            .await
            .unwrap();
        store
            .merge(&change_set_updating("likes running", "prefers evening runs", "schedule change"))
            .await
            .unwrap();

        // Preference precedes Plan in scan order, so it takes the update.
        assert_eq!(store.facts_in(Category::Preference)[0].content, "prefers evening runs");
        assert_eq!(store.facts_in(Category::Plan)[0].content, "likes running at dawn");
    }

    #[tokio::test]
    async fn unmatched_update_falls_back_to_other() {
        let dir = tempdir().unwrap();
        let mut store = LongTermStore::open(dir.path(), &UserId("h".into()))
            .await
            .unwrap();
        store
            .merge(&change_set_updating("nonexistent memory", "moved to Berlin", "relocation"))
            .await
            .unwrap();

        let others = store.facts_in(Category::Other);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].content, "moved to Berlin");
        assert!(others[0].updated_at.is_none(), "fallback is an addition, not an update");
    }

    #[tokio::test]
    async fn notes_append_in_order_never_overwrite() {
        let dir = tempdir().unwrap();
        let mut store = LongTermStore::open(dir.path(), &UserId("i".into()))
            .await
            .unwrap();
        store.merge(&notes_only("first note")).await.unwrap();
        store.merge(&notes_only("second note")).await.unwrap();

        assert_eq!(store.snapshot().notes_for_future, "first note\nsecond note");
        assert_eq!(store.snapshot().conversation_summaries.len(), 2);
    }

    #[tokio::test]
    async fn render_labels_non_empty_sections_only() {
        let dir = tempdir().unwrap();
        let mut store = LongTermStore::open(dir.path(), &UserId("j".into()))
            .await
            .unwrap();
        store
            .merge(&change_set_adding(Category::Plan, "remind about exam on Friday", "explicit request"))
            .await
            .unwrap();
        store.merge(&notes_only("ask about the exam afterwards")).await.unwrap();

        let rendered = store.render();
        assert!(rendered.contains("[Plans and commitments]"));
        assert!(rendered.contains("- remind about exam on Friday"));
        assert!(rendered.contains("[Conversation guidance]\nask about the exam afterwards"));
        assert!(!rendered.contains("[User profile]"));
    }

    #[tokio::test]
    async fn render_empty_store_is_empty_string() {
        let dir = tempdir().unwrap();
        let store = LongTermStore::open(dir.path(), &UserId("k".into()))
            .await
            .unwrap();
        assert_eq!(store.render(), "");
    }

    #[tokio::test]
    async fn distinct_users_do_not_share_files() {
        let dir = tempdir().unwrap();
        let mut store_a = LongTermStore::open(dir.path(), &UserId("a1".into()))
            .await
            .unwrap();
        store_a
            .merge(&change_set_adding(Category::Preference, "likes jazz", "stated"))
            .await
            .unwrap();

        let store_b = LongTermStore::open(dir.path(), &UserId("b1".into()))
            .await
            .unwrap();
        assert!(store_b.snapshot().is_blank());
    }
}
