//! The opinion giver capability consumed by the engine.

use crate::opinion::Opinion;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A remote participant able to answer a batched opinion query, with an
/// associated mana weight.
#[async_trait]
pub trait OpinionGiver: Send + Sync {
    /// Opaque identifier, used in logs and round stats.
    fn id(&self) -> String;

    /// Non-negative mana weight used for sampling probability and bias.
    fn mana(&self) -> f64;

    /// Answers opinions for the concatenation of `conflict_ids` and
    /// `timestamp_ids`. The response must contain exactly
    /// `conflict_ids.len() + timestamp_ids.len()` opinions in that order;
    /// callers discard responses of any other shape.
    ///
    /// `deadline` is the time budget for this call. The engine also enforces
    /// it externally, so a giver that overruns contributes nothing; passing
    /// it in lets implementations bound their own network round trips.
    async fn query(
        &self,
        deadline: Duration,
        conflict_ids: &[String],
        timestamp_ids: &[String],
    ) -> anyhow::Result<Vec<Opinion>>;
}

/// Supplies the opinion givers reachable this round. Called once per round.
pub type OpinionGiverSupplier =
    Box<dyn Fn() -> anyhow::Result<Vec<Arc<dyn OpinionGiver>>> + Send + Sync>;

/// Retrieves the node's own mana weight. Called once per round.
pub type OwnWeightRetriever = Box<dyn Fn() -> anyhow::Result<f64> + Send + Sync>;
