//! Core types for the fast probabilistic consensus (FPC) voter.
//!
//! FPC finalizes a binary opinion (like / dislike) on a stream of submitted
//! items by repeatedly sampling the opinions of remote participants and
//! comparing the aggregated liked proportion against a per-round threshold
//! drawn from a shared source of randomness.
//!
//! This crate holds the domain types shared between the engine and its
//! integrators: opinions, per-item voting state, the [`OpinionGiver`]
//! capability the engine queries, the voter traits, the typed error surface,
//! and the event bus.

pub mod context;
pub mod error;
pub mod events;
pub mod giver;
pub mod opinion;
pub mod voter;

pub use context::{VoteContext, VotingWeights};
pub use error::VoteError;
pub use events::{OpinionEvent, RoundStats, VoteEvents};
pub use giver::{OpinionGiver, OpinionGiverSupplier, OwnWeightRetriever};
pub use opinion::{ObjectType, Opinion, QueriedOpinions};
pub use voter::{RoundBasedVoter, Voter};
