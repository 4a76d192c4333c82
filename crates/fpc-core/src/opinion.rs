//! Opinions and the objects they are held about.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A binary opinion on an item under vote.
///
/// `Unknown` only ever appears as a received answer for items a giver has no
/// opinion on yet; it is never a finalized state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opinion {
    Like,
    Dislike,
    Unknown,
}

impl Opinion {
    /// Scalar encoding used when blending the own opinion into a liked
    /// proportion. `Unknown` maps to a negative value, meaning there is no
    /// usable own opinion.
    pub fn as_scalar(self) -> f64 {
        match self {
            Opinion::Like => 1.0,
            Opinion::Dislike => 0.0,
            Opinion::Unknown => -1.0,
        }
    }
}

impl fmt::Display for Opinion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opinion::Like => "like",
            Opinion::Dislike => "dislike",
            Opinion::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// What an item under vote represents.
///
/// Only used to route the item into one of the two parallel id lists
/// presented to opinion givers in a batched query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Conflict,
    Timestamp,
}

/// The opinions one giver returned during a round, together with the number
/// of times its sampling multiplicity counted them into the tally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueriedOpinions {
    pub giver_id: String,
    /// Item id to the opinion this giver answered for it.
    pub opinions: HashMap<String, Opinion>,
    pub times_counted: usize,
}
