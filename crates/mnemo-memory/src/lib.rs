// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory pipeline: a bounded rolling window over the live
//! conversation, plus a lazy consolidation pipeline (retention filter,
//! summarizer, durable store) that distills quiet conversation segments
//! into persistent facts.

pub mod filter;
pub mod orchestrator;
pub mod store;
pub mod summarizer;
pub mod types;
pub mod window;

pub use filter::{RetentionFilter, Verdict};
pub use orchestrator::{ConsolidationOutcome, MemoryOrchestrator, OrchestratorState};
pub use store::{LongTermStore, StoreSnapshot};
pub use summarizer::MemorySummarizer;
pub use types::{Category, ChangeSet, ConsolidationRecord, ExchangePair, Fact, FactToAdd, FactUpdate};
pub use window::RollingWindow;
