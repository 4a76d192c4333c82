//! Mana-weighted selection of the opinion givers to query.

use fpc_core::OpinionGiver;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Summed mana at or below this magnitude counts as "no mana available".
const TOTAL_MANA_TOLERANCE: f64 = 1e-3;

/// Selects givers by weighted sampling with replacement, keyed by index into
/// `givers`, and returns the selection counts together with the summed mana.
///
/// Up to `max_attempts` draws are made against the mana prefix sums, stopping
/// early once `sample_size` distinct givers have been selected. The count per
/// giver is the replication factor applied to its response when tallying, so
/// a single query round trip preserves the statistical effect of sampling
/// with replacement. When the summed mana is within tolerance of zero the
/// selection falls back to [`uniform_sampling`] and the reported total is 0.
pub fn mana_based_sampling<R: Rng>(
    givers: &[Arc<dyn OpinionGiver>],
    max_attempts: usize,
    sample_size: usize,
    rng: &mut R,
) -> (HashMap<usize, usize>, f64) {
    let mut total_mana = 0.0;
    let mut prefix_sums = Vec::with_capacity(givers.len());
    for giver in givers {
        total_mana += giver.mana();
        prefix_sums.push(total_mana);
    }

    if total_mana.abs() <= TOTAL_MANA_TOLERANCE {
        return (uniform_sampling(givers, sample_size, rng), 0.0);
    }

    let mut selected: HashMap<usize, usize> = HashMap::new();
    for _ in 0..max_attempts {
        if selected.len() >= sample_size {
            break;
        }
        let x = rng.gen::<f64>() * total_mana;
        if let Some(idx) = prefix_sums.iter().position(|&sum| x < sum) {
            *selected.entry(idx).or_insert(0) += 1;
        }
    }

    (selected, total_mana)
}

/// `sample_size` independent uniform draws with replacement.
pub fn uniform_sampling<R: Rng>(
    givers: &[Arc<dyn OpinionGiver>],
    sample_size: usize,
    rng: &mut R,
) -> HashMap<usize, usize> {
    let mut selected: HashMap<usize, usize> = HashMap::new();
    if givers.is_empty() {
        return selected;
    }
    for _ in 0..sample_size {
        let idx = rng.gen_range(0..givers.len());
        *selected.entry(idx).or_insert(0) += 1;
    }
    selected
}
