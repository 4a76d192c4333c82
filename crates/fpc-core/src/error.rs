//! Typed error surface of the voting engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoteError {
    /// A vote for the id is already queued or active.
    #[error("a vote is already ongoing for {id}")]
    VoteAlreadyOngoing { id: String },

    /// No active vote context exists for the id.
    #[error("no ongoing vote found for {id}")]
    VotingNotFound { id: String },

    /// The supplier returned an empty set of opinion givers.
    #[error("can't perform round as no opinion givers are available")]
    NoOpinionGiversAvailable,

    /// The opinion giver supplier failed.
    #[error("opinion giver supplier failed")]
    Supplier(#[source] anyhow::Error),

    /// The own-weight retriever failed.
    #[error("own weight retriever failed")]
    OwnWeight(#[source] anyhow::Error),
}
