// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona management: the character sheet the agent speaks from.
//!
//! A persona is a set of free-text fields persisted as one JSON file and
//! rendered into the system message. Empty fields are skipped; a fully
//! empty persona falls back to a default companion voice.

use std::path::PathBuf;
use std::sync::RwLock;

use mnemo_core::{MnemoError, PersonaSource};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

/// Fallback voice used when every persona field is empty.
const DEFAULT_PERSONA_TEXT: &str = "You are a warm, friendly companion. You listen well, \
understand the user's emotional needs, and speak in a gentle, caring tone. You remember \
the context of the conversation so the exchange stays natural.";

/// Editable persona fields, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PersonaField {
    Task,
    Role,
    Appearance,
    Background,
    Personality,
    Likes,
    Catchphrases,
    ExampleLines,
    Notes,
}

impl PersonaField {
    fn label(&self) -> &'static str {
        match self {
            PersonaField::Task => "Task",
            PersonaField::Role => "Role",
            PersonaField::Appearance => "Appearance",
            PersonaField::Background => "Background",
            PersonaField::Personality => "Personality",
            PersonaField::Likes => "Likes",
            PersonaField::Catchphrases => "Catchphrases",
            PersonaField::ExampleLines => "Example lines",
            PersonaField::Notes => "Notes",
        }
    }
}

/// One character sheet. All fields are free text and optional on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub appearance: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub likes: String,
    #[serde(default)]
    pub catchphrases: String,
    #[serde(default)]
    pub example_lines: String,
    #[serde(default)]
    pub notes: String,
}

impl PersonaProfile {
    fn field(&self, field: PersonaField) -> &str {
        match field {
            PersonaField::Task => &self.task,
            PersonaField::Role => &self.role,
            PersonaField::Appearance => &self.appearance,
            PersonaField::Background => &self.background,
            PersonaField::Personality => &self.personality,
            PersonaField::Likes => &self.likes,
            PersonaField::Catchphrases => &self.catchphrases,
            PersonaField::ExampleLines => &self.example_lines,
            PersonaField::Notes => &self.notes,
        }
    }

    fn field_mut(&mut self, field: PersonaField) -> &mut String {
        match field {
            PersonaField::Task => &mut self.task,
            PersonaField::Role => &mut self.role,
            PersonaField::Appearance => &mut self.appearance,
            PersonaField::Background => &mut self.background,
            PersonaField::Personality => &mut self.personality,
            PersonaField::Likes => &mut self.likes,
            PersonaField::Catchphrases => &mut self.catchphrases,
            PersonaField::ExampleLines => &mut self.example_lines,
            PersonaField::Notes => &mut self.notes,
        }
    }

    /// Render the persona as system-message text.
    ///
    /// One labeled line per non-empty field, in declared order, closed by
    /// a consistency instruction. An empty persona yields the default
    /// companion voice instead.
    pub fn to_system_message(&self) -> String {
        const ORDER: [PersonaField; 9] = [
            PersonaField::Task,
            PersonaField::Role,
            PersonaField::Appearance,
            PersonaField::Background,
            PersonaField::Personality,
            PersonaField::Likes,
            PersonaField::Catchphrases,
            PersonaField::ExampleLines,
            PersonaField::Notes,
        ];
        let parts: Vec<String> = ORDER
            .iter()
            .filter(|f| !self.field(**f).is_empty())
            .map(|f| format!("[{}] {}", f.label(), self.field(*f)))
            .collect();
        if parts.is_empty() {
            return DEFAULT_PERSONA_TEXT.to_string();
        }
        let mut text = parts.join("\n");
        text.push_str("\n\nStay strictly in character and keep the persona consistent.");
        text
    }
}

/// Loads, persists, and edits a persona file.
///
/// The profile sits behind a read lock so a shared manager can serve as a
/// live `PersonaSource` while fields are edited.
pub struct PersonaManager {
    path: PathBuf,
    profile: RwLock<PersonaProfile>,
}

impl PersonaManager {
    /// Load the persona at `path`, tolerating a missing or corrupt file.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, MnemoError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(MnemoError::storage)?;
        }
        let profile = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt persona file, using default");
                    PersonaProfile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersonaProfile::default(),
            Err(e) => return Err(MnemoError::storage(e)),
        };
        Ok(Self {
            path,
            profile: RwLock::new(profile),
        })
    }

    /// Replace one field and persist the whole profile.
    pub async fn update_field(
        &self,
        field: PersonaField,
        value: impl Into<String>,
    ) -> Result<(), MnemoError> {
        let snapshot = {
            let mut guard = self
                .profile
                .write()
                .map_err(|_| MnemoError::Internal("persona lock poisoned".into()))?;
            *guard.field_mut(field) = value.into();
            guard.clone()
        };
        self.save(&snapshot).await
    }

    /// Replace the whole profile and persist it.
    pub async fn replace(&self, profile: PersonaProfile) -> Result<(), MnemoError> {
        {
            let mut guard = self
                .profile
                .write()
                .map_err(|_| MnemoError::Internal("persona lock poisoned".into()))?;
            *guard = profile.clone();
        }
        self.save(&profile).await
    }

    /// Owned copy of the current profile.
    pub fn profile(&self) -> PersonaProfile {
        self.profile
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    async fn save(&self, profile: &PersonaProfile) -> Result<(), MnemoError> {
        let bytes = serde_json::to_vec_pretty(profile).map_err(MnemoError::storage)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(MnemoError::storage)
    }
}

impl PersonaSource for PersonaManager {
    fn persona_text(&self) -> String {
        self.profile().to_system_message()
    }
}
