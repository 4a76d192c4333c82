//! The round-based FPC voting engine.

use crate::config::{rand_uniform_threshold, FpcConfig};
use crate::queue::SubmissionQueue;
use crate::sampler::mana_based_sampling;
use async_trait::async_trait;
use fpc_core::{
    ObjectType, Opinion, OpinionEvent, OpinionGiver, OpinionGiverSupplier, OwnWeightRetriever,
    QueriedOpinions, RoundBasedVoter, RoundStats, VoteContext, VoteError, VoteEvents, Voter,
    VotingWeights,
};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Round-based probabilistic voter.
///
/// Submitted items wait in a queue until the next round promotes them into
/// the active registry. Each round then forms a new opinion per item from
/// the liked proportion gathered in the previous round, finalizes or fails
/// items whose opinion has stabilized or whose round budget ran out, and
/// queries a mana-weighted sample of opinion givers to feed the next round.
///
/// One external ticker drives [`Fpc::round`]; it must not be re-entered
/// concurrently with itself. Submissions and lookups may arrive from
/// arbitrary threads at any time.
pub struct Fpc {
    supplier: OpinionGiverSupplier,
    own_weight: OwnWeightRetriever,
    config: FpcConfig,
    queue: Mutex<SubmissionQueue>,
    contexts: RwLock<HashMap<String, VoteContext>>,
    /// Opinions are only formed when the previous round's query succeeded.
    last_round_successful: Mutex<bool>,
    rng: Mutex<StdRng>,
    events: VoteEvents,
}

impl Fpc {
    /// Creates an engine with default parameters.
    pub fn new(supplier: OpinionGiverSupplier, own_weight: OwnWeightRetriever) -> Self {
        Self::with_config(supplier, own_weight, FpcConfig::default())
    }

    pub fn with_config(
        supplier: OpinionGiverSupplier,
        own_weight: OwnWeightRetriever,
        config: FpcConfig,
    ) -> Self {
        Self {
            supplier,
            own_weight,
            config,
            queue: Mutex::new(SubmissionQueue::new()),
            contexts: RwLock::new(HashMap::new()),
            last_round_successful: Mutex::new(false),
            rng: Mutex::new(StdRng::from_entropy()),
            events: VoteEvents::new(),
        }
    }

    /// Event registration surface.
    pub fn events(&self) -> &VoteEvents {
        &self.events
    }

    /// Replaces the sampler's random source. Intended for deterministic
    /// tests; must not race with an in-flight round.
    pub fn set_rng(&self, rng: StdRng) {
        *self.rng.lock() = rng;
    }

    /// Sets an initial opinion and queues the item for voting.
    ///
    /// Fails with [`VoteError::VoteAlreadyOngoing`] if a vote for the id is
    /// already queued or active.
    pub fn submit(
        &self,
        id: &str,
        object_type: ObjectType,
        initial: Opinion,
    ) -> Result<(), VoteError> {
        let mut queue = self.queue.lock();
        let contexts = self.contexts.read();
        if queue.contains(id) || contexts.contains_key(id) {
            return Err(VoteError::VoteAlreadyOngoing { id: id.to_string() });
        }
        queue.push(VoteContext::new(id, object_type, initial));
        Ok(())
    }

    /// The last formed opinion of an active vote. Items still waiting in the
    /// submission queue are not visible here.
    pub fn intermediate_opinion(&self, id: &str) -> Result<Opinion, VoteError> {
        self.contexts
            .read()
            .get(id)
            .map(|context| context.last_opinion())
            .ok_or_else(|| VoteError::VotingNotFound { id: id.to_string() })
    }

    /// Executes one voting round driven by the shared random number `rand`.
    ///
    /// Promotes queued items, forms and finalizes opinions (when the
    /// previous round's query succeeded), ticks every remaining context, and
    /// queries a fresh sample of opinion givers. Emits `round_executed` after
    /// every successful round that had items to vote on.
    pub async fn round(&self, rand: f64) -> Result<(), VoteError> {
        let started = Instant::now();

        self.enqueue();

        let formed = *self.last_round_successful.lock();
        if formed {
            self.form_opinions(rand);
        }
        self.finalize_opinions(formed);
        self.tick();

        match self.query_opinions().await {
            Ok(Some(queried_opinions)) => {
                *self.last_round_successful.lock() = true;
                let stats = RoundStats {
                    duration: started.elapsed(),
                    rand_used: rand,
                    active_vote_contexts: self.contexts.read().clone(),
                    queried_opinions,
                };
                self.events.trigger_round_executed(&stats);
                Ok(())
            }
            Ok(None) => {
                // nothing was up for vote; the round still counts as
                // successful but emits no stats
                *self.last_round_successful.lock() = true;
                Ok(())
            }
            Err(err) => {
                *self.last_round_successful.lock() = false;
                Err(err)
            }
        }
    }

    /// Promotes queued contexts into the registry in submission order.
    fn enqueue(&self) {
        let mut queue = self.queue.lock();
        let mut contexts = self.contexts.write();
        for context in queue.drain() {
            contexts.insert(context.id.clone(), context);
        }
    }

    /// Appends a fresh opinion to every context that has seen at least one
    /// round, comparing its biased liked proportion against this round's
    /// threshold.
    fn form_opinions(&self, rand: f64) {
        let mut contexts = self.contexts.write();
        for context in contexts.values_mut() {
            if context.is_new() {
                continue;
            }
            let (lower, upper) = self.config.bounds_for(context);
            let threshold = rand_uniform_threshold(rand, lower, upper);
            let eta = bias_towards_own_opinion(context);

            let opinion = if eta >= threshold {
                Opinion::Like
            } else {
                Opinion::Dislike
            };
            debug!(id = %context.id, eta, threshold, opinion = %opinion, "formed opinion");
            context.add_opinion(opinion);
        }
    }

    /// Removes finalized and failed contexts from the registry and emits
    /// their events with value snapshots.
    ///
    /// The finalized check only applies after a formation pass; the
    /// max-rounds failure check always applies, so contexts stuck behind a
    /// prolonged query outage are still cleared eventually.
    fn finalize_opinions(&self, formed: bool) {
        let mut done: Vec<(OpinionEvent, bool)> = Vec::new();
        {
            let mut contexts = self.contexts.write();
            let ids: Vec<String> = contexts.keys().cloned().collect();
            for id in ids {
                let (finalized, failed) = match contexts.get(&id) {
                    Some(context) => {
                        let finalized = formed
                            && context.is_finalized(
                                self.config.cooling_off_period,
                                self.config.finalization_rounds,
                            );
                        let failed = !finalized
                            && context.rounds >= self.config.max_rounds_per_vote_context;
                        (finalized, failed)
                    }
                    None => continue,
                };
                if !finalized && !failed {
                    continue;
                }
                if let Some(context) = contexts.remove(&id) {
                    let event = OpinionEvent {
                        id,
                        opinion: context.last_opinion(),
                        context,
                    };
                    done.push((event, finalized));
                }
            }
        }

        // events run outside the registry lock so handlers may resubmit
        for (event, finalized) in done {
            if finalized {
                info!(id = %event.id, opinion = %event.opinion, rounds = event.context.rounds, "vote finalized");
                self.events.trigger_finalized(&event);
            } else {
                info!(id = %event.id, opinion = %event.opinion, rounds = event.context.rounds, "vote failed to finalize within round budget");
                self.events.trigger_failed(&event);
            }
        }
    }

    /// Marks a round as experienced on every remaining context, whether or
    /// not an opinion was formed.
    fn tick(&self) {
        let mut contexts = self.contexts.write();
        for context in contexts.values_mut() {
            context.rounds += 1;
        }
    }

    /// Queries a mana-weighted sample of opinion givers about every active
    /// item and writes the aggregated liked proportions back into the
    /// registry for the next round.
    ///
    /// Returns `Ok(None)` when there was nothing to vote on.
    async fn query_opinions(&self) -> Result<Option<Vec<QueriedOpinions>>, VoteError> {
        let (conflict_ids, timestamp_ids) = self.vote_context_ids();
        if conflict_ids.is_empty() && timestamp_ids.is_empty() {
            return Ok(None);
        }

        let givers = (self.supplier)().map_err(|err| {
            warn!(error = %err, "opinion giver supplier failed");
            VoteError::Supplier(err)
        })?;
        if givers.is_empty() {
            warn!("no opinion givers available this round");
            return Err(VoteError::NoOpinionGiversAvailable);
        }

        // if the same giver is selected multiple times it is queried once
        // and its opinion counted that many times
        let (selected, sampled_mana) = {
            let mut rng = self.rng.lock();
            mana_based_sampling(
                &givers,
                self.config.max_query_sample_size,
                self.config.query_sample_size,
                &mut *rng,
            )
        };

        let own_mana = (self.own_weight)().map_err(|err| {
            warn!(error = %err, "own weight retrieval failed");
            VoteError::OwnWeight(err)
        })?;
        let total_mana = sampled_mana + own_mana;

        let conflict_ids = Arc::new(conflict_ids);
        let timestamp_ids = Arc::new(timestamp_ids);

        let mut tally: HashMap<String, Vec<Opinion>> = HashMap::new();
        for id in conflict_ids.iter().chain(timestamp_ids.iter()) {
            tally.insert(id.clone(), Vec::new());
        }
        let tally = Arc::new(Mutex::new(tally));
        let queried = Arc::new(Mutex::new(Vec::<QueriedOpinions>::new()));

        let mut tasks = Vec::with_capacity(selected.len());
        for (giver_idx, times_counted) in selected {
            let giver = Arc::clone(&givers[giver_idx]);
            let conflict_ids = Arc::clone(&conflict_ids);
            let timestamp_ids = Arc::clone(&timestamp_ids);
            let tally = Arc::clone(&tally);
            let queried = Arc::clone(&queried);
            let deadline = self.config.query_timeout;

            tasks.push(tokio::spawn(async move {
                let query = giver.query(deadline, &conflict_ids, &timestamp_ids);
                let response = match tokio::time::timeout(deadline, query).await {
                    Ok(Ok(opinions)) => opinions,
                    Ok(Err(err)) => {
                        debug!(giver = %giver.id(), error = %err, "opinion query failed");
                        return;
                    }
                    Err(_) => {
                        debug!(giver = %giver.id(), "opinion query timed out");
                        return;
                    }
                };

                let expected = conflict_ids.len() + timestamp_ids.len();
                if response.len() != expected {
                    debug!(
                        giver = %giver.id(),
                        got = response.len(),
                        expected,
                        "discarding opinion response with unexpected shape"
                    );
                    return;
                }

                let mut record = QueriedOpinions {
                    giver_id: giver.id(),
                    opinions: HashMap::new(),
                    times_counted,
                };
                let mut tally = tally.lock();
                for (id, opinion) in conflict_ids
                    .iter()
                    .chain(timestamp_ids.iter())
                    .zip(response)
                {
                    if let Some(votes) = tally.get_mut(id) {
                        votes.extend(std::iter::repeat(opinion).take(times_counted));
                    }
                    record.opinions.insert(id.clone(), opinion);
                }
                drop(tally);
                queried.lock().push(record);
            }));
        }
        for task in tasks {
            // a panicking query task only forfeits that giver's response
            let _ = task.await;
        }

        let tally = tally.lock();
        let mut contexts = self.contexts.write();
        for (id, votes) in tally.iter() {
            let mut voted = votes.len();
            let mut liked = 0usize;
            for opinion in votes {
                match opinion {
                    Opinion::Unknown => voted -= 1,
                    Opinion::Like => liked += 1,
                    Opinion::Dislike => {}
                }
            }
            if voted < self.config.min_opinions_received {
                debug!(
                    id = %id,
                    voted,
                    required = self.config.min_opinions_received,
                    "not enough opinions received to update liked proportion"
                );
                continue;
            }
            if let Some(context) = contexts.get_mut(id) {
                context.weights = VotingWeights {
                    own: own_mana,
                    total: total_mana,
                };
                context.proportion_liked = liked as f64 / voted as f64;
            }
        }
        drop(contexts);
        drop(tally);

        let taken = std::mem::take(&mut *queried.lock());
        Ok(Some(taken))
    }

    /// The active item ids split into the two query lists presented to
    /// opinion givers.
    fn vote_context_ids(&self) -> (Vec<String>, Vec<String>) {
        let contexts = self.contexts.read();
        let mut conflict_ids = Vec::new();
        let mut timestamp_ids = Vec::new();
        for (id, context) in contexts.iter() {
            match context.object_type {
                ObjectType::Conflict => conflict_ids.push(id.clone()),
                ObjectType::Timestamp => timestamp_ids.push(id.clone()),
            }
        }
        (conflict_ids, timestamp_ids)
    }
}

impl Voter for Fpc {
    fn vote(&self, id: &str, object_type: ObjectType, initial: Opinion) -> Result<(), VoteError> {
        self.submit(id, object_type, initial)
    }

    fn intermediate_opinion(&self, id: &str) -> Result<Opinion, VoteError> {
        Fpc::intermediate_opinion(self, id)
    }
}

#[async_trait]
impl RoundBasedVoter for Fpc {
    async fn round(&self, rand: f64) -> Result<(), VoteError> {
        Fpc::round(self, rand).await
    }
}

/// Blends the node's own current opinion into the received liked proportion
/// using mana shares.
///
/// Contexts with no recorded weights, or whose current opinion has no scalar
/// encoding, keep the raw proportion.
fn bias_towards_own_opinion(context: &VoteContext) -> f64 {
    let own = context.weights.own;
    let total = context.weights.total;
    if own == 0.0 || total == 0.0 {
        return context.proportion_liked;
    }
    let own_opinion = context.last_opinion().as_scalar();
    if own_opinion < 0.0 {
        return context.proportion_liked;
    }
    let share = own / total;
    share * own_opinion + (1.0 - share) * context.proportion_liked
}
