// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory summarizer: a single-shot LLM call that turns a batch of
//! conversation into a structured change-set of long-term facts.
//!
//! Same worth-keeping policy as the retention filter, but asked to produce
//! structured facts rather than a boolean. Like the filter, this boundary
//! absorbs every failure: a bad reply degrades to an empty change-set with
//! `should_persist = false`.

use std::sync::Arc;

use mnemo_core::{ChatProvider, Role, Turn};
use tracing::{debug, warn};

use crate::types::{ChangeSet, ExchangePair, format_batch};

/// Extraction prompt. The JSON field names here are the wire contract the
/// change-set parser expects.
const EXTRACTION_PROMPT: &str = r#"You are the "memory analyst" managing long-term memory for a companion chat bot.

[Task]
You are given a transcript of a text conversation between a user and the bot. Please:
1. Summarize the key information of this conversation;
2. Extract the content worth keeping in long-term memory (e.g. the user's personal information, preferences, important events, future commitments);
3. Discard unimportant chit-chat details. Do not treat everything as memory.

[Memory principles]
Information is worth keeping only when it matches at least one of:
- Personal profile: the user's basic information (name/nickname, age, occupation, city, family situation);
- Stable preferences: long-lasting likes or habits (favorite games, music, daily rhythm, values) or conversational-style requests (how to address the user, what tone to use);
- Significant relationships: key information about important people (partner, family, pets, friends);
- Life-impacting events: things with clear effect on the user's life (changing jobs, exams, a breakup, moving, illness);
- Commitments and plans: future to-dos and agreements ("remind me to get up early tomorrow", "help me revise next week", "call me X from now on");
- Long-term goals: study plans, career plans, long-term habit building ("I plan to study English daily for three months").

Not worth keeping, among others:
- one-off small matters, passing emotional venting, details that will never be needed again;
- pure chit-chat fragments with no information content ("haha", "so sleepy", "cold today");
- technical discussion irrelevant to the user's long-term profile (unless the user explicitly says "talk to me this way from now on").

[Output format]
Reply with the following JSON structure only (no extra explanation):

{
  "summary": "2-4 sentences covering the main content and emotional tone of this conversation.",
  "memories_to_add": [
    {
      "type": "personal_profile | preference | relationship | important_event | plan | long_term_goal | other",
      "content": "One clear, short sentence describing what to remember.",
      "reason": "Why this is worth long-term memory (one sentence)."
    }
  ],
  "memories_to_update": [
    {
      "target": "Brief description of the existing memory to update (e.g. occupation changed from student to product manager).",
      "content": "The updated memory content.",
      "reason": "Why the update is needed (e.g. the user said they changed jobs)."
    }
  ],
  "should_save_memory": true or false,
  "notes_for_future_conversation": "Suggestions for future conversations (tone preferences, topics to avoid, topics to follow up on), or an empty string."
}

[Strict requirements]
- If nothing in this conversation is worth long-term memory, return "memories_to_add": [], "memories_to_update": [], "should_save_memory": false.
- Use exactly the field names and JSON format above.
- Output nothing outside the JSON.

[Companionship notes]
- If the user repeatedly mentions an emotional burden (anxiety, loneliness, insomnia, work stress), treat it as a long-running topic and record it as long_term_goal or important_event (e.g. "check in on their sleep from time to time").
- If the user asks for a conversational style ("don't be so serious", "more encouragement"), record it as preference.
- If the user wants you to remember an anniversary, exam date, or interview date, record it as plan and note in the reason that you may proactively ask about it when the date is near."#;

/// Extracts structured long-term facts from batches of conversation.
pub struct MemorySummarizer {
    provider: Arc<dyn ChatProvider>,
}

impl MemorySummarizer {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Summarize a batch of exchanges into a change-set.
    ///
    /// Transport or parse failures yield an inert change-set with the
    /// failure description in the summary slot; this never raises.
    pub async fn summarize(&self, batch: &[ExchangePair]) -> ChangeSet {
        let messages = [
            Turn::new(Role::System, EXTRACTION_PROMPT),
            Turn::new(
                Role::User,
                format!("Conversation:\n{}", format_batch(batch)),
            ),
        ];

        let response = match self.provider.complete(&messages, None).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "summarizer call failed, nothing to persist");
                return ChangeSet::failure(format!("extraction call failed: {e}"));
            }
        };

        match ChangeSet::from_response(&response) {
            Ok(change_set) => {
                debug!(
                    adds = change_set.facts_to_add.len(),
                    updates = change_set.facts_to_update.len(),
                    should_persist = change_set.should_persist,
                    "extracted change-set"
                );
                change_set
            }
            Err(e) => {
                warn!(error = %e, "unparsable summarizer reply, nothing to persist");
                ChangeSet::failure(format!("unparsable extraction reply: {e}"))
            }
        }
    }
}
