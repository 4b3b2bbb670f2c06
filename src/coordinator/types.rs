// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Batch state types.
//!
//! Defines the state machine a replication batch moves through.
//!
//! # State Transitions
//!
//! ```text
//!        activate_tree()              activate_set()
//! Idle ─────────────────→ ResolvingReferences     │
//!  ↑                              │               │
//!  │                              ↓               │
//!  │                         BuildingSet ─────────┤
//!  │                                              ↓
//!  │                                   Replicating(i/n) ──→ Committing ──→ Done
//!  │                                                                        │
//!  └──────────────────────── (next batch starts from here) ─────────────────┘
//! ```
//!
//! Partial failure is not a state: a batch always reaches `Done`, and the
//! caller compares the planned set with the returned one.

/// State of the current (or last) batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// No batch has run yet.
    #[default]
    Idle,

    /// Collecting the forward reference closure of the start node.
    ResolvingReferences,

    /// Filtering the closure and adding missing structural descendants.
    BuildingSet,

    /// Writing node `index` (1-based) of `total` to the target.
    Replicating { index: usize, total: usize },

    /// Committing replication stamps to the content tree.
    Committing,

    /// Batch finished. Successes are in the returned set.
    Done,
}

impl BatchState {
    /// State name without progress, used as a metric label.
    pub fn label(&self) -> &'static str {
        match self {
            BatchState::Idle => "Idle",
            BatchState::ResolvingReferences => "ResolvingReferences",
            BatchState::BuildingSet => "BuildingSet",
            BatchState::Replicating { .. } => "Replicating",
            BatchState::Committing => "Committing",
            BatchState::Done => "Done",
        }
    }

    /// Whether a batch is in flight.
    pub fn is_active(&self) -> bool {
        !matches!(self, BatchState::Idle | BatchState::Done)
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchState::Replicating { index, total } => write!(f, "Replicating({}/{})", index, total),
            other => write!(f, "{}", other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_state_display() {
        assert_eq!(BatchState::Idle.to_string(), "Idle");
        assert_eq!(BatchState::ResolvingReferences.to_string(), "ResolvingReferences");
        assert_eq!(BatchState::BuildingSet.to_string(), "BuildingSet");
        assert_eq!(
            BatchState::Replicating { index: 3, total: 10 }.to_string(),
            "Replicating(3/10)"
        );
        assert_eq!(BatchState::Committing.to_string(), "Committing");
        assert_eq!(BatchState::Done.to_string(), "Done");
    }

    #[test]
    fn test_batch_state_label_drops_progress() {
        assert_eq!(BatchState::Replicating { index: 1, total: 2 }.label(), "Replicating");
    }

    #[test]
    fn test_batch_state_is_active() {
        assert!(!BatchState::Idle.is_active());
        assert!(BatchState::Committing.is_active());
        assert!(BatchState::Replicating { index: 0, total: 0 }.is_active());
        assert!(!BatchState::Done.is_active());
    }

    #[test]
    fn test_batch_state_default() {
        assert_eq!(BatchState::default(), BatchState::Idle);
    }
}
