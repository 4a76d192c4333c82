//! Per-item voting state.

use crate::opinion::{ObjectType, Opinion};
use serde::{Deserialize, Serialize};

/// Mana weights captured from the most recent successful query round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VotingWeights {
    /// The node's own mana.
    pub own: f64,
    /// Own mana plus the summed mana of the sampled opinion givers.
    pub total: f64,
}

/// The state of one ongoing vote.
///
/// A context lives in the engine from its promotion out of the submission
/// queue until it either finalizes or exhausts its round budget. Events carry
/// value snapshots of it, so the type is `Clone`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteContext {
    pub id: String,
    pub object_type: ObjectType,
    /// Ordered opinion history, seeded with the submitted initial opinion.
    /// The last entry is the current opinion.
    pub opinions: Vec<Opinion>,
    /// Number of round ticks this context has experienced, incremented once
    /// per round whether or not an opinion was formed.
    pub rounds: u32,
    /// Liked proportion aggregated from the most recent successful query.
    pub proportion_liked: f64,
    pub weights: VotingWeights,
}

impl VoteContext {
    pub fn new(id: impl Into<String>, object_type: ObjectType, initial: Opinion) -> Self {
        Self {
            id: id.into(),
            object_type,
            opinions: vec![initial],
            rounds: 0,
            proportion_liked: 0.0,
            weights: VotingWeights::default(),
        }
    }

    pub fn add_opinion(&mut self, opinion: Opinion) {
        self.opinions.push(opinion);
    }

    /// The current opinion.
    pub fn last_opinion(&self) -> Opinion {
        *self
            .opinions
            .last()
            .expect("a vote context always holds at least its initial opinion")
    }

    /// Whether no round has ticked for this context yet.
    pub fn is_new(&self) -> bool {
        self.rounds == 0
    }

    /// Whether exactly one post-cooldown opinion exists.
    pub fn had_first_round(&self, cooldown: u32) -> bool {
        self.rounds == cooldown + 1
    }

    /// Whether the context has entered the fixed-threshold tail.
    pub fn had_fixed_round(&self, cooldown: u32, finalization: u32, fixed: u32) -> bool {
        self.rounds > cooldown + finalization + fixed
    }

    /// Whether the opinion has stabilized: enough rounds have passed and the
    /// last `finalization` opinions are identical, none of them `Unknown`.
    pub fn is_finalized(&self, cooldown: u32, finalization: u32) -> bool {
        if self.rounds < cooldown + finalization {
            return false;
        }
        let window = finalization as usize;
        if self.opinions.len() < window {
            return false;
        }
        let tail = &self.opinions[self.opinions.len() - window..];
        match tail.first() {
            Some(first) => *first != Opinion::Unknown && tail.iter().all(|o| o == first),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(opinions: &[Opinion], rounds: u32) -> VoteContext {
        let mut ctx = VoteContext::new("item", ObjectType::Conflict, opinions[0]);
        for &opinion in &opinions[1..] {
            ctx.add_opinion(opinion);
        }
        ctx.rounds = rounds;
        ctx
    }

    #[test]
    fn test_new_context_state() {
        let ctx = VoteContext::new("item", ObjectType::Timestamp, Opinion::Like);
        assert!(ctx.is_new());
        assert_eq!(ctx.last_opinion(), Opinion::Like);
        assert_eq!(ctx.proportion_liked, 0.0);
        assert_eq!(ctx.weights, VotingWeights::default());
    }

    #[test]
    fn test_had_first_round_respects_cooldown() {
        let ctx = context_with(&[Opinion::Like], 3);
        assert!(ctx.had_first_round(2));
        assert!(!ctx.had_first_round(0));
        assert!(!ctx.had_first_round(3));
    }

    #[test]
    fn test_had_fixed_round() {
        let ctx = context_with(&[Opinion::Like], 7);
        assert!(ctx.had_fixed_round(1, 2, 3)); // 7 > 6
        assert!(!ctx.had_fixed_round(1, 3, 3)); // 7 == 7
    }

    #[test]
    fn test_finalized_after_stable_window() {
        let ctx = context_with(&[Opinion::Like, Opinion::Like, Opinion::Like], 3);
        assert!(ctx.is_finalized(0, 2));
        assert!(ctx.is_finalized(1, 2));
    }

    #[test]
    fn test_not_finalized_before_enough_rounds() {
        let ctx = context_with(&[Opinion::Like, Opinion::Like, Opinion::Like], 1);
        assert!(!ctx.is_finalized(0, 2));
    }

    #[test]
    fn test_not_finalized_on_unstable_window() {
        let ctx = context_with(&[Opinion::Like, Opinion::Dislike, Opinion::Like], 5);
        assert!(!ctx.is_finalized(0, 2));
    }

    #[test]
    fn test_unknown_never_finalizes() {
        let ctx = context_with(&[Opinion::Unknown, Opinion::Unknown, Opinion::Unknown], 5);
        assert!(!ctx.is_finalized(0, 2));
    }

    #[test]
    fn test_window_larger_than_history() {
        let ctx = context_with(&[Opinion::Like, Opinion::Like], 10);
        assert!(!ctx.is_finalized(0, 3));
    }
}
