// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory orchestrator: accumulates completed exchanges and runs the
//! classify-extract-merge pipeline when the conversation goes quiet.
//!
//! There is no background timer. Idleness is checked lazily when the next
//! user turn arrives, so consolidation runs on the conversation's own
//! clock. Every failure inside the pipeline degrades to "nothing
//! persisted"; the surrounding conversation never observes an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mnemo_core::ChatProvider;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::filter::RetentionFilter;
use crate::store::LongTermStore;
use crate::summarizer::MemorySummarizer;
use crate::types::ExchangePair;

/// Observable lifecycle state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// No exchanges pending.
    Idle,
    /// At least one exchange is waiting for consolidation.
    Accumulating,
}

/// How one consolidation attempt ended.
///
/// Pending exchanges are cleared on every attempt regardless of outcome;
/// a batch is judged at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolidationOutcome {
    /// Nothing was pending; no pipeline call was made.
    NothingPending,
    /// The retention filter judged the batch not worth keeping.
    NotWorthKeeping { reason: String },
    /// Extraction produced a change-set that declined persistence.
    Declined,
    /// The change-set was merged and persisted.
    Persisted,
    /// The merge or persist step failed; the batch is dropped.
    Failed,
}

/// Drives the consolidation pipeline over batches of completed exchanges.
pub struct MemoryOrchestrator {
    filter: RetentionFilter,
    summarizer: MemorySummarizer,
    store: Arc<Mutex<LongTermStore>>,
    pending: Vec<ExchangePair>,
    last_user_at: Option<DateTime<Utc>>,
    idle_threshold: Duration,
}

impl MemoryOrchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        store: Arc<Mutex<LongTermStore>>,
        idle_threshold: Duration,
    ) -> Self {
        Self {
            filter: RetentionFilter::new(provider.clone()),
            summarizer: MemorySummarizer::new(provider),
            store,
            pending: Vec::new(),
            last_user_at: None,
            idle_threshold,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        if self.pending.is_empty() {
            OrchestratorState::Idle
        } else {
            OrchestratorState::Accumulating
        }
    }

    /// Shared handle to the backing store.
    pub fn store(&self) -> Arc<Mutex<LongTermStore>> {
        self.store.clone()
    }

    /// Record one completed exchange and the time its user turn arrived.
    pub fn record_exchange(
        &mut self,
        user: impl Into<String>,
        assistant: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.pending.push(ExchangePair::new(user, assistant));
        self.last_user_at = Some(at);
        debug!(pending = self.pending.len(), "recorded exchange");
    }

    /// Consolidate the pending batch if the conversation has been idle for
    /// at least the configured threshold.
    ///
    /// Called with the arrival time of the next user turn, before that turn
    /// is processed. Returns `NothingPending` when the batch is empty or
    /// the gap is still below the threshold.
    pub async fn check_idle(&mut self, now: DateTime<Utc>) -> ConsolidationOutcome {
        let Some(last) = self.last_user_at else {
            return ConsolidationOutcome::NothingPending;
        };
        if self.pending.is_empty() {
            return ConsolidationOutcome::NothingPending;
        }
        let Ok(threshold) = TimeDelta::from_std(self.idle_threshold) else {
            return ConsolidationOutcome::NothingPending;
        };
        if now - last < threshold {
            return ConsolidationOutcome::NothingPending;
        }
        info!(
            idle_secs = (now - last).num_seconds(),
            pending = self.pending.len(),
            "idle threshold crossed, consolidating"
        );
        self.consolidate().await
    }

    /// Consolidate whatever is pending, unconditionally.
    ///
    /// For session teardown. The retention filter and the extractor's own
    /// `should_persist` verdict still gate the merge.
    pub async fn flush(&mut self) -> ConsolidationOutcome {
        self.consolidate().await
    }

    async fn consolidate(&mut self) -> ConsolidationOutcome {
        // Take the batch first: it is judged exactly once, whatever happens.
        let batch = std::mem::take(&mut self.pending);
        self.last_user_at = None;
        if batch.is_empty() {
            return ConsolidationOutcome::NothingPending;
        }

        let verdict = self.filter.should_retain(&batch).await;
        if !verdict.retain {
            debug!(reason = %verdict.reason, "batch not worth keeping");
            return ConsolidationOutcome::NotWorthKeeping {
                reason: verdict.reason,
            };
        }

        let change_set = self.summarizer.summarize(&batch).await;
        if !change_set.should_persist {
            debug!("extractor declined persistence");
            return ConsolidationOutcome::Declined;
        }

        match self.store.lock().await.merge(&change_set).await {
            Ok(()) => {
                info!(
                    adds = change_set.facts_to_add.len(),
                    updates = change_set.facts_to_update.len(),
                    "consolidation persisted"
                );
                ConsolidationOutcome::Persisted
            }
            Err(e) => {
                warn!(error = %e, "merge failed, batch dropped");
                ConsolidationOutcome::Failed
            }
        }
    }
}
