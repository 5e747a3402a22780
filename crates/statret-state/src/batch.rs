//! # Batch Lifecycle State Machine
//!
//! Enum states with validated transitions. Every accepted transition is
//! appended to the batch's log, which the store persists row by row and
//! replays through [`BatchLifecycle::restore`] when a batch is loaded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use statret_core::{BatchId, Timestamp};

// ─── Batch State ─────────────────────────────────────────────────────

/// The lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    /// The staging tree is being built. Nothing is visible to consumers.
    Populating,
    /// Population and post-processing committed. No document yet.
    Populated,
    /// A document has been written and recorded.
    Complete,
    /// Population was abandoned (terminal).
    Failed,
}

impl BatchState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Whether the staging tree can be serialized in this state.
    pub fn is_serializable(&self) -> bool {
        matches!(self, Self::Populated | Self::Complete)
    }

    /// Stable storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Populating => "POPULATING",
            Self::Populated => "POPULATED",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BatchState {
    type Err = BatchStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POPULATING" => Ok(Self::Populating),
            "POPULATED" => Ok(Self::Populated),
            "COMPLETE" => Ok(Self::Complete),
            "FAILED" => Ok(Self::Failed),
            other => Err(BatchStateError::UnknownState(other.to_string())),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors that can occur during batch lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchStateError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid batch transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: BatchState,
        /// Attempted target state.
        to: BatchState,
    },

    /// The batch failed and accepts no further transitions.
    #[error("batch {batch} failed and cannot transition")]
    AlreadyFailed {
        /// The batch identifier.
        batch: BatchId,
    },

    /// A stored state name did not match any state.
    #[error("unknown batch state {0:?}")]
    UnknownState(String),

    /// A stored transition log does not chain from `Populating`.
    #[error("batch {batch} transition {index} does not follow from its predecessor")]
    BrokenHistory {
        /// The batch identifier.
        batch: BatchId,
        /// Position of the offending record.
        index: usize,
    },
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of a batch state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTransitionRecord {
    /// State before the transition.
    pub from_state: BatchState,
    /// State after the transition.
    pub to_state: BatchState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Batch Lifecycle ─────────────────────────────────────────────────

/// A batch with its lifecycle state and transition history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLifecycle {
    /// Batch identifier.
    pub batch: BatchId,
    /// Current lifecycle state.
    pub state: BatchState,
    /// When the batch was created.
    pub created_at: Timestamp,
    /// Ordered log of all state transitions.
    pub transitions: Vec<BatchTransitionRecord>,
}

impl BatchLifecycle {
    /// A new batch in the Populating state.
    pub fn new(batch: BatchId, created_at: Timestamp) -> Self {
        Self {
            batch,
            state: BatchState::Populating,
            created_at,
            transitions: Vec::new(),
        }
    }

    /// Rebuild a lifecycle from a stored log, checking that it chains.
    pub fn restore(
        batch: BatchId,
        created_at: Timestamp,
        transitions: Vec<BatchTransitionRecord>,
    ) -> Result<Self, BatchStateError> {
        let mut state = BatchState::Populating;
        for (index, record) in transitions.iter().enumerate() {
            if record.from_state != state || !Self::allowed(state, record.to_state) {
                return Err(BatchStateError::BrokenHistory { batch, index });
            }
            state = record.to_state;
        }
        Ok(Self {
            batch,
            state,
            created_at,
            transitions,
        })
    }

    /// Population committed (POPULATING → POPULATED).
    pub fn mark_populated(&mut self, reason: &str) -> Result<&BatchTransitionRecord, BatchStateError> {
        self.transition(BatchState::Populated, reason)
    }

    /// Document recorded (POPULATED → COMPLETE, or COMPLETE → COMPLETE on
    /// a rewrite).
    pub fn mark_complete(&mut self, reason: &str) -> Result<&BatchTransitionRecord, BatchStateError> {
        self.transition(BatchState::Complete, reason)
    }

    /// Population abandoned (POPULATING → FAILED).
    pub fn mark_failed(&mut self, reason: &str) -> Result<&BatchTransitionRecord, BatchStateError> {
        self.transition(BatchState::Failed, reason)
    }

    /// Whether the batch failed (terminal state).
    pub fn is_failed(&self) -> bool {
        self.state.is_terminal()
    }

    /// Reason recorded on the failing transition.
    pub fn failure_reason(&self) -> Option<&str> {
        self.transitions
            .iter()
            .rev()
            .find(|t| t.to_state == BatchState::Failed)
            .map(|t| t.reason.as_str())
    }

    fn allowed(from: BatchState, to: BatchState) -> bool {
        matches!(
            (from, to),
            (BatchState::Populating, BatchState::Populated)
                | (BatchState::Populating, BatchState::Failed)
                | (BatchState::Populated, BatchState::Complete)
                | (BatchState::Complete, BatchState::Complete)
        )
    }

    fn transition(
        &mut self,
        to: BatchState,
        reason: &str,
    ) -> Result<&BatchTransitionRecord, BatchStateError> {
        if self.state.is_terminal() {
            return Err(BatchStateError::AlreadyFailed { batch: self.batch });
        }
        if !Self::allowed(self.state, to) {
            return Err(BatchStateError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.transitions.push(BatchTransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Timestamp::now(),
            reason: reason.to_string(),
        });
        self.state = to;
        Ok(&self.transitions[self.transitions.len() - 1])
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_batch() -> BatchLifecycle {
        BatchLifecycle::new(BatchId(7), Timestamp::now())
    }

    // ── Basic lifecycle tests ────────────────────────────────────────

    #[test]
    fn test_new_batch_is_populating() {
        let b = make_batch();
        assert_eq!(b.state, BatchState::Populating);
        assert!(!b.state.is_serializable());
        assert!(b.transitions.is_empty());
    }

    #[test]
    fn test_happy_path() {
        let mut b = make_batch();
        b.mark_populated("412 records").unwrap();
        assert!(b.state.is_serializable());
        b.mark_complete("conted_batch_7.xml").unwrap();
        assert_eq!(b.state, BatchState::Complete);
        assert_eq!(b.transitions.len(), 2);
    }

    #[test]
    fn test_complete_can_be_rewritten() {
        let mut b = make_batch();
        b.mark_populated("ok").unwrap();
        b.mark_complete("first").unwrap();
        let record = b.mark_complete("second").unwrap();
        assert_eq!(record.from_state, BatchState::Complete);
        assert_eq!(record.to_state, BatchState::Complete);
    }

    #[test]
    fn test_cannot_complete_while_populating() {
        let mut b = make_batch();
        let err = b.mark_complete("too early").unwrap_err();
        assert_eq!(
            err,
            BatchStateError::InvalidTransition {
                from: BatchState::Populating,
                to: BatchState::Complete,
            }
        );
    }

    #[test]
    fn test_cannot_fail_after_commit() {
        let mut b = make_batch();
        b.mark_populated("ok").unwrap();
        assert!(b.mark_failed("late").is_err());
    }

    // ── Failure tests ────────────────────────────────────────────────

    #[test]
    fn test_failed_is_terminal() {
        let mut b = make_batch();
        b.mark_failed("source query failed").unwrap();
        assert!(b.is_failed());
        assert_eq!(b.failure_reason(), Some("source query failed"));

        match b.mark_populated("retry").unwrap_err() {
            BatchStateError::AlreadyFailed { batch } => assert_eq!(batch, BatchId(7)),
            other => panic!("Expected AlreadyFailed, got: {other:?}"),
        }
    }

    // ── Restore tests ────────────────────────────────────────────────

    #[test]
    fn test_restore_replays_log() {
        let mut b = make_batch();
        b.mark_populated("ok").unwrap();
        b.mark_complete("written").unwrap();

        let restored =
            BatchLifecycle::restore(b.batch, b.created_at, b.transitions.clone()).unwrap();
        assert_eq!(restored.state, BatchState::Complete);
    }

    #[test]
    fn test_restore_rejects_gap() {
        let log = vec![BatchTransitionRecord {
            from_state: BatchState::Populated,
            to_state: BatchState::Complete,
            timestamp: Timestamp::now(),
            reason: "skipped population".to_string(),
        }];
        let err = BatchLifecycle::restore(BatchId(1), Timestamp::now(), log).unwrap_err();
        assert_eq!(err, BatchStateError::BrokenHistory { batch: BatchId(1), index: 0 });
    }

    // ── Display tests ────────────────────────────────────────────────

    #[test]
    fn test_state_names_round_trip() {
        for state in [
            BatchState::Populating,
            BatchState::Populated,
            BatchState::Complete,
            BatchState::Failed,
        ] {
            assert_eq!(state.to_string().parse::<BatchState>().unwrap(), state);
        }
        assert!("DONE".parse::<BatchState>().is_err());
    }

    #[test]
    fn test_serialization_uses_storage_names() {
        let json = serde_json::to_string(&BatchState::Populated).unwrap();
        assert_eq!(json, "\"POPULATED\"");
    }
}
