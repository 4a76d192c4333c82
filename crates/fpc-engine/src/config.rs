//! Engine configuration and the threshold policy derived from it.

use fpc_core::VoteContext;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters governing sampling, round accounting, and thresholds.
///
/// All thresholds live in `[0, 1]` with `lower <= upper`. The round counters
/// partition a context's lifetime into a cooling-off phase (no opinions are
/// formed), a first-round/subsequent phase with randomized thresholds, a
/// fixed-threshold tail, and a hard failure cap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FpcConfig {
    /// Target number of distinct opinion givers queried per round.
    pub query_sample_size: usize,
    /// Cap on weighted-sampling attempts per round.
    pub max_query_sample_size: usize,
    /// Minimum non-`Unknown` responses required to update an item's liked
    /// proportion.
    pub min_opinions_received: usize,
    /// Per-giver query deadline.
    pub query_timeout: Duration,
    /// Rounds a context ticks before the first opinion is formed.
    pub cooling_off_period: u32,
    /// Consecutive identical opinions needed to finalize.
    pub finalization_rounds: u32,
    /// Rounds of fixed-threshold operation after the cooling-off and
    /// finalization window.
    pub fixed_threshold_rounds: u32,
    /// Hard cap on rounds; a context reaching it fails.
    pub max_rounds_per_vote_context: u32,
    pub first_round_lower_bound: f64,
    pub first_round_upper_bound: f64,
    pub subsequent_rounds_lower_bound: f64,
    pub subsequent_rounds_upper_bound: f64,
    /// Single value used for both bounds once a context enters the fixed
    /// tail.
    pub ending_rounds_fixed_threshold: f64,
}

impl Default for FpcConfig {
    fn default() -> Self {
        Self {
            query_sample_size: 21,
            max_query_sample_size: 100,
            min_opinions_received: 1,
            query_timeout: Duration::from_millis(1500),
            cooling_off_period: 0,
            finalization_rounds: 10,
            fixed_threshold_rounds: 3,
            max_rounds_per_vote_context: 100,
            first_round_lower_bound: 0.67,
            first_round_upper_bound: 0.67,
            subsequent_rounds_lower_bound: 0.50,
            subsequent_rounds_upper_bound: 0.67,
            ending_rounds_fixed_threshold: 0.50,
        }
    }
}

impl FpcConfig {
    /// Threshold bounds for the context's current voting phase.
    pub fn bounds_for(&self, context: &VoteContext) -> (f64, f64) {
        let mut lower = self.subsequent_rounds_lower_bound;
        let mut upper = self.subsequent_rounds_upper_bound;

        if context.had_first_round(self.cooling_off_period) {
            lower = self.first_round_lower_bound;
            upper = self.first_round_upper_bound;
        }

        if context.had_fixed_round(
            self.cooling_off_period,
            self.finalization_rounds,
            self.fixed_threshold_rounds,
        ) {
            lower = self.ending_rounds_fixed_threshold;
            upper = self.ending_rounds_fixed_threshold;
        }

        (lower, upper)
    }
}

/// Draws the threshold used this round from the shared random number.
///
/// Degenerate bounds (`lower == upper`) yield `lower` regardless of `rand`.
pub fn rand_uniform_threshold(rand: f64, lower: f64, upper: f64) -> f64 {
    lower + rand * (upper - lower)
}
