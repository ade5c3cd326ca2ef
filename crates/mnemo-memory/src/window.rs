// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded rolling window over the raw conversation.
//!
//! Keeps the most recent turns up to a fixed capacity. The single system
//! turn, when set, is pinned at index 0 and never evicted; overflow always
//! removes the oldest non-system turn.

use mnemo_core::types::{Role, Turn};

/// In-order buffer of conversation turns with a hard capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    turns: Vec<Turn>,
    max_len: usize,
}

impl RollingWindow {
    /// Creates an empty window holding at most `max_len` turns.
    ///
    /// # Panics
    ///
    /// Panics if `max_len` is zero. Capacity comes from configuration and
    /// a zero-length window is a fatal misconfiguration.
    pub fn new(max_len: usize) -> Self {
        assert!(max_len >= 1, "rolling window capacity must be >= 1");
        Self {
            turns: Vec::new(),
            max_len,
        }
    }

    /// Appends a turn, evicting the oldest non-system turn on overflow.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn::new(role, content));
        if self.turns.len() > self.max_len
            && let Some(pos) = self.turns.iter().position(|t| t.role != Role::System)
        {
            self.turns.remove(pos);
        }
    }

    /// Replaces the pinned system turn, inserting it at index 0.
    pub fn set_system(&mut self, content: impl Into<String>) {
        self.turns.retain(|t| t.role != Role::System);
        self.turns.insert(0, Turn::new(Role::System, content));
    }

    /// Removes every turn except the pinned system turn.
    pub fn clear(&mut self) {
        self.turns.retain(|t| t.role == Role::System);
    }

    /// Returns an owned copy of the full ordered sequence.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Replaces the window contents with a previously taken snapshot.
    ///
    /// Used to roll a failed chat turn back to the exact prior state,
    /// including any turn the failed append evicted.
    pub fn restore(&mut self, snapshot: Vec<Turn>) {
        self.turns = snapshot;
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn append_within_capacity_keeps_everything() {
        let mut window = RollingWindow::new(5);
        window.append(Role::User, "one");
        window.append(Role::Assistant, "two");
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn overflow_evicts_oldest_non_system_turn() {
        let mut window = RollingWindow::new(3);
        window.set_system("persona");
        window.append(Role::User, "a");
        window.append(Role::Assistant, "b");
        window.append(Role::User, "c");

        let turns = window.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].content, "b");
        assert_eq!(turns[2].content, "c");
    }

    #[test]
    fn set_system_replaces_existing() {
        let mut window = RollingWindow::new(4);
        window.set_system("old persona");
        window.append(Role::User, "hi");
        window.set_system("new persona");

        let turns = window.snapshot();
        assert_eq!(turns[0], Turn::new(Role::System, "new persona"));
        assert_eq!(turns.iter().filter(|t| t.role == Role::System).count(), 1);
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn clear_keeps_only_system() {
        let mut window = RollingWindow::new(4);
        window.set_system("persona");
        window.append(Role::User, "hi");
        window.append(Role::Assistant, "hello");
        window.clear();

        assert_eq!(window.snapshot(), vec![Turn::new(Role::System, "persona")]);
    }

    #[test]
    fn restore_returns_exact_prior_state() {
        let mut window = RollingWindow::new(2);
        window.append(Role::User, "a");
        window.append(Role::Assistant, "b");
        let before = window.snapshot();

        // This append evicts "a"; a plain pop could not undo it.
        window.append(Role::User, "c");
        window.restore(before.clone());
        assert_eq!(window.snapshot(), before);
    }

    #[test]
    #[should_panic(expected = "capacity must be >= 1")]
    fn zero_capacity_is_fatal() {
        let _ = RollingWindow::new(0);
    }

    // Scenario A from the conversation-flow contract: L=3, a system turn,
    // and three exchanges leave the system turn plus the two most recent
    // exchanges' worth of turns that fit.
    #[test]
    fn system_turn_survives_repeated_exchanges() {
        let mut window = RollingWindow::new(3);
        window.set_system("persona");
        for (user, reply) in [("hi", "hey"), ("bye", "see you"), ("hi again", "welcome back")] {
            window.append(Role::User, user);
            window.append(Role::Assistant, reply);
        }

        let turns = window.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].content, "hi again");
        assert_eq!(turns[2].content, "welcome back");
    }

    proptest! {
        // Window bound: after every append, len <= L and the system turn
        // (when set) is present at index 0.
        #[test]
        fn bound_holds_for_all_append_sequences(
            max_len in 1usize..8,
            with_system in proptest::bool::ANY,
            appends in proptest::collection::vec(0u8..2, 0..32),
        ) {
            let mut window = RollingWindow::new(max_len);
            if with_system {
                window.set_system("persona");
            }
            for (i, kind) in appends.iter().enumerate() {
                let role = if *kind == 0 { Role::User } else { Role::Assistant };
                window.append(role, format!("turn {i}"));
                prop_assert!(window.len() <= max_len);
                if with_system {
                    let turns = window.snapshot();
                    prop_assert_eq!(turns[0].role, Role::System);
                    prop_assert_eq!(
                        turns.iter().filter(|t| t.role == Role::System).count(),
                        1
                    );
                }
            }
        }
    }
}
