//! Event surface of the voting engine.
//!
//! Four event kinds are emitted: `finalized` and `failed` when a vote leaves
//! the engine, `round_executed` after every successful non-empty round, and
//! `error` for asynchronous out-of-band failures. Handlers run on the thread
//! triggering the event, in registration order; they must not block
//! indefinitely. A panicking handler is isolated so it cannot corrupt engine
//! state, and the remaining handlers still run.

use crate::context::VoteContext;
use crate::opinion::{Opinion, QueriedOpinions};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::warn;

/// Payload of `finalized` and `failed` notifications.
///
/// Carries a value snapshot of the context at emission time; the registry
/// entry itself is already gone when handlers run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpinionEvent {
    pub id: String,
    pub opinion: Opinion,
    pub context: VoteContext,
}

/// Statistics describing one executed round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundStats {
    pub duration: Duration,
    /// The shared random number the round was driven with.
    pub rand_used: f64,
    /// Snapshot of the registry after the round's query pass.
    pub active_vote_contexts: HashMap<String, VoteContext>,
    /// Per-giver opinions gathered during the query pass.
    pub queried_opinions: Vec<QueriedOpinions>,
}

type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Registration-ordered handler lists for the event kinds the engine emits.
#[derive(Default)]
pub struct VoteEvents {
    finalized: RwLock<Vec<Handler<OpinionEvent>>>,
    failed: RwLock<Vec<Handler<OpinionEvent>>>,
    round_executed: RwLock<Vec<Handler<RoundStats>>>,
    error: RwLock<Vec<Handler<anyhow::Error>>>,
}

impl VoteEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_finalized(&self, handler: impl Fn(&OpinionEvent) + Send + Sync + 'static) {
        self.finalized.write().push(Box::new(handler));
    }

    pub fn on_failed(&self, handler: impl Fn(&OpinionEvent) + Send + Sync + 'static) {
        self.failed.write().push(Box::new(handler));
    }

    pub fn on_round_executed(&self, handler: impl Fn(&RoundStats) + Send + Sync + 'static) {
        self.round_executed.write().push(Box::new(handler));
    }

    pub fn on_error(&self, handler: impl Fn(&anyhow::Error) + Send + Sync + 'static) {
        self.error.write().push(Box::new(handler));
    }

    pub fn trigger_finalized(&self, event: &OpinionEvent) {
        Self::dispatch("finalized", &self.finalized, event);
    }

    pub fn trigger_failed(&self, event: &OpinionEvent) {
        Self::dispatch("failed", &self.failed, event);
    }

    pub fn trigger_round_executed(&self, stats: &RoundStats) {
        Self::dispatch("round_executed", &self.round_executed, stats);
    }

    pub fn trigger_error(&self, error: &anyhow::Error) {
        Self::dispatch("error", &self.error, error);
    }

    fn dispatch<T>(kind: &'static str, handlers: &RwLock<Vec<Handler<T>>>, payload: &T) {
        for handler in handlers.read().iter() {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                warn!(kind, "event handler panicked");
            }
        }
    }
}
