//! Admission queue for newly submitted votes.

use fpc_core::VoteContext;
use std::collections::{HashSet, VecDeque};

/// Ordered set of contexts awaiting promotion into the active registry.
///
/// A companion id set gives O(1) duplicate detection on submission. The type
/// itself is single-threaded; the engine wraps it in a mutex.
#[derive(Default)]
pub struct SubmissionQueue {
    pending: VecDeque<VoteContext>,
    ids: HashSet<String>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the id is waiting for promotion.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Appends a context. Returns `false` without modifying the queue when
    /// its id is already pending.
    pub fn push(&mut self, context: VoteContext) -> bool {
        if !self.ids.insert(context.id.clone()) {
            return false;
        }
        self.pending.push_back(context);
        true
    }

    /// Removes and returns all pending contexts in insertion order.
    pub fn drain(&mut self) -> Vec<VoteContext> {
        self.ids.clear();
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
