//! Fast probabilistic consensus engine.
//!
//! Implements a round-based voter over the types in `fpc-core`:
//! - Submission queue and active context registry
//! - Mana-weighted sampling of opinion givers with a uniform fallback
//! - Per-round threshold policy and own-opinion bias
//! - Parallel query fan-out with per-giver deadlines
//! - Finalized / failed / round-executed event emission
//!
//! The engine is driven from the outside: a ticker calls [`Fpc::round`] with
//! one shared random number per round while submitters call [`Fpc::submit`]
//! concurrently.

pub mod config;
pub mod engine;
pub mod queue;
pub mod sampler;

pub use config::{rand_uniform_threshold, FpcConfig};
pub use engine::Fpc;
pub use queue::SubmissionQueue;
pub use sampler::{mana_based_sampling, uniform_sampling};
