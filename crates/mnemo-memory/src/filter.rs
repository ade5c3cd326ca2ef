// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention filter: a single-shot LLM judgment on whether a batch of
//! conversation is worth keeping in long-term memory.
//!
//! Failures never escape this boundary. A transport error or an
//! unparsable reply degrades to "not worth keeping" so that a flaky
//! provider can never abort the surrounding conversation.

use std::sync::Arc;

use mnemo_core::{ChatProvider, Role, Turn};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{ExchangePair, format_batch, strip_code_fences};

/// Policy prompt for the retention judgment.
const RETENTION_PROMPT: &str = r#"You are the "memory filter" of a companion chat bot.

[Task]
You are given a transcript of a conversation between a user and the bot (plain text). Decide whether the transcript contains information worth keeping in long-term memory.

[What counts as worth keeping]
If the conversation contains any of the following, judge it worth keeping:
1. Personal profile: the user's basic information, e.g. name/nickname, age, occupation, city, school, field of study, family situation.
2. Stable preferences: likes or habits unlikely to change soon, e.g. favorite or disliked food, films/games/music, hobbies, daily rhythm, values, or requests about conversational style ("call me X from now on", "stop lecturing me").
3. Significant relationships: important information about a partner, family member, close friend, or pet (e.g. "my mother's health is poor", "my boyfriend and I are long-distance").
4. Life-impacting events: things with real effect on the user's life or mood, e.g. changing jobs, exams, a breakup, moving, illness, a major decision.
5. Commitments and plans: things the user wants you to remember, remind them of, or act on later (e.g. "remind me to get up early tomorrow", "help me revise next week").
6. Long-term goals: study plans, career plans, self-improvement or habit-building goals (e.g. "I want to run every day", "pass the exam within three months").
7. Requests about future conversations: explicit instructions about how to address the user, what tone to use, or which topics to avoid.

[What is explicitly not worth keeping]
Judge the transcript not worth keeping when it is mainly:
- one-off venting or passing remarks ("so tired", "this rain is annoying") with no request to remember anything;
- generic small talk that reveals no new personal information, preference, event, or plan;
- technical or factual Q&A unrelated to the user's long-term profile;
- restatement of information already known, with nothing new or changed.

[Output]
Reply with a JSON object only, no extra explanation:

{
  "should_save": true or false,
  "reason": "one sentence explaining why (e.g. contains new job information / just small talk)"
}"#;

/// Outcome of one retention judgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub retain: bool,
    pub reason: String,
}

/// Raw wire shape of the filter reply; both fields are optional.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    should_save: bool,
    #[serde(default = "default_reason")]
    reason: String,
}

fn default_reason() -> String {
    "no reason given".to_string()
}

/// Decides whether a batch of conversation is worth long-term retention.
pub struct RetentionFilter {
    provider: Arc<dyn ChatProvider>,
}

impl RetentionFilter {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Judge a batch of exchanges.
    ///
    /// Sends the policy prompt plus the formatted batch as a two-message
    /// array and parses the JSON verdict, tolerating fenced code blocks.
    /// Any transport or parse failure yields `retain = false` with the
    /// failure message as the reason.
    pub async fn should_retain(&self, batch: &[ExchangePair]) -> Verdict {
        let messages = [
            Turn::new(Role::System, RETENTION_PROMPT),
            Turn::new(
                Role::User,
                format!("Conversation:\n{}", format_batch(batch)),
            ),
        ];

        let response = match self.provider.complete(&messages, None).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "retention filter call failed, discarding batch");
                return Verdict {
                    retain: false,
                    reason: e.to_string(),
                };
            }
        };

        match parse_verdict(&response) {
            Ok(verdict) => {
                debug!(retain = verdict.retain, reason = %verdict.reason, "retention verdict");
                verdict
            }
            Err(e) => {
                warn!(error = %e, "unparsable retention reply, discarding batch");
                Verdict {
                    retain: false,
                    reason: format!("unparsable filter reply: {e}"),
                }
            }
        }
    }
}

/// Parse a filter reply into a verdict, stripping any code fences first.
fn parse_verdict(response: &str) -> Result<Verdict, serde_json::Error> {
    let raw: RawVerdict = serde_json::from_str(strip_code_fences(response))?;
    Ok(Verdict {
        retain: raw.should_save,
        reason: raw.reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_test_utils::MockProvider;

    #[test]
    fn parse_plain_verdict() {
        let v = parse_verdict(r#"{"should_save": true, "reason": "new job info"}"#).unwrap();
        assert!(v.retain);
        assert_eq!(v.reason, "new job info");
    }

    #[test]
    fn parse_fenced_verdict() {
        let v = parse_verdict("```json\n{\"should_save\": false, \"reason\": \"small talk\"}\n```")
            .unwrap();
        assert!(!v.retain);
    }

    #[test]
    fn parse_missing_fields_defaults() {
        let v = parse_verdict("{}").unwrap();
        assert!(!v.retain, "absent should_save defaults to false");
        assert_eq!(v.reason, "no reason given");
    }

    #[test]
    fn parse_garbage_is_error() {
        assert!(parse_verdict("not json at all").is_err());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_discard() {
        let provider = Arc::new(MockProvider::new());
        provider.push_failure("rate limited").await;
        let filter = RetentionFilter::new(provider);

        let verdict = filter
            .should_retain(&[ExchangePair::new("it's raining", "that's unfortunate")])
            .await;
        assert!(!verdict.retain);
        assert!(verdict.reason.contains("rate limited"));
    }

    #[tokio::test]
    async fn unparsable_reply_degrades_to_discard() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "I refuse to answer in JSON".to_string(),
        ]));
        let filter = RetentionFilter::new(provider);

        let verdict = filter.should_retain(&[ExchangePair::new("hi", "hello")]).await;
        assert!(!verdict.retain);
        assert!(verdict.reason.contains("unparsable"));
    }

    #[tokio::test]
    async fn sends_policy_prompt_and_formatted_batch() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            r#"{"should_save": false, "reason": "small talk"}"#.to_string(),
        ]));
        let filter = RetentionFilter::new(provider.clone());

        filter
            .should_retain(&[ExchangePair::new("it's raining", "that's unfortunate")])
            .await;

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].role, Role::System);
        assert!(calls[0][0].content.contains("memory filter"));
        assert!(calls[0][1].content.contains("user: it's raining"));
        assert!(calls[0][1].content.contains("assistant: that's unfortunate"));
    }
}
