//! Submission-side traits implemented by round-based voters.

use crate::error::VoteError;
use crate::opinion::{ObjectType, Opinion};
use async_trait::async_trait;

/// Anything able to accept vote submissions and report intermediate opinions.
pub trait Voter: Send + Sync {
    /// Sets an initial opinion and enqueues the item for voting.
    fn vote(&self, id: &str, object_type: ObjectType, initial: Opinion) -> Result<(), VoteError>;

    /// The last formed opinion of an active vote.
    fn intermediate_opinion(&self, id: &str) -> Result<Opinion, VoteError>;
}

/// A voter driven by an external ticker feeding one shared random number in
/// `[0, 1]` per round.
#[async_trait]
pub trait RoundBasedVoter: Voter {
    async fn round(&self, rand: f64) -> Result<(), VoteError>;
}
