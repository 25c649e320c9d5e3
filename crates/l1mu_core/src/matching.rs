//! Generated ↔ reconstructed association.
//!
//! `match_candidates` is the greedy nearest-first association used by every
//! analysis. `optimal_assignment` solves the same problem globally and only
//! feeds the greedy-vs-optimal diagnostic counter.

use std::cmp::Ordering;

use fxhash::FxHashSet;
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use serde::{Deserialize, Serialize};

use crate::event::ReconstructedCandidate;
use crate::geometry::{AcceptanceRegion, AcceptedParticle};
use crate::kinematics::delta_r;

/// One retained (generated, reconstructed) association.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub delta_r: f64,
    /// Position in the event's generated list
    pub gen_index: usize,
    /// Position in the source's candidate list
    pub reco_index: usize,
    pub region: AcceptanceRegion,
}

/// Ascending ΔR, then generated index, then reconstructed index.
#[inline]
fn match_order(a: &Match, b: &Match) -> Ordering {
    a.delta_r
        .total_cmp(&b.delta_r)
        .then_with(|| a.gen_index.cmp(&b.gen_index))
        .then_with(|| a.reco_index.cmp(&b.reco_index))
}

/// All pairs with ΔR strictly below `max_delta_r`, in match order.
fn candidate_pairs(
    accepted: &[AcceptedParticle],
    candidates: &[ReconstructedCandidate],
    reco_indices: &[usize],
    max_delta_r: f64,
) -> Vec<Match> {
    let mut pairs = Vec::with_capacity(accepted.len() * reco_indices.len());
    for particle in accepted {
        for &reco_index in reco_indices {
            let candidate = &candidates[reco_index];
            let dr = delta_r(particle.eta, particle.phi, candidate.eta, candidate.phi);
            // NaN fails the comparison and is dropped here
            if dr < max_delta_r {
                pairs.push(Match {
                    delta_r: dr,
                    gen_index: particle.index,
                    reco_index,
                    region: particle.region,
                });
            }
        }
    }
    pairs.sort_by(match_order);
    pairs
}

/// Greedy association: scan pairs nearest-first and keep a pair unless either
/// side is already used.
///
/// `reco_indices` selects which entries of `candidates` may be used (normally
/// the in-time, deduplicated ones). The result is in ascending ΔR order and
/// never reuses a generated or reconstructed index.
pub fn match_candidates(
    accepted: &[AcceptedParticle],
    candidates: &[ReconstructedCandidate],
    reco_indices: &[usize],
    max_delta_r: f64,
) -> Vec<Match> {
    let mut used_gen: FxHashSet<usize> = FxHashSet::default();
    let mut used_reco: FxHashSet<usize> = FxHashSet::default();
    let mut matches = Vec::new();

    for pair in candidate_pairs(accepted, candidates, reco_indices, max_delta_r) {
        if used_gen.contains(&pair.gen_index) || used_reco.contains(&pair.reco_index) {
            continue;
        }
        used_gen.insert(pair.gen_index);
        used_reco.insert(pair.reco_index);
        matches.push(pair);
    }

    #[cfg(feature = "strict_contracts")]
    {
        let gens: FxHashSet<usize> = matches.iter().map(|m| m.gen_index).collect();
        let recos: FxHashSet<usize> = matches.iter().map(|m| m.reco_index).collect();
        if gens.len() != matches.len() || recos.len() != matches.len() {
            panic!("STRICT: greedy matching reused an index: {:?}", matches);
        }
    }

    matches
}

/// Look up the match of one generated particle.
pub fn match_for(matches: &[Match], gen_index: usize) -> Option<&Match> {
    matches.iter().find(|m| m.gen_index == gen_index)
}

pub fn total_delta_r(matches: &[Match]) -> f64 {
    matches.iter().map(|m| m.delta_r).sum()
}

// Fixed-point ΔR for the integer assignment solver.
const COST_SCALE: f64 = 1e6;
// Any disallowed pair costs more than every allowed assignment combined.
const FORBIDDEN_COST: i64 = 1_000_000_000_000;

/// Globally optimal association over the same allowed pairs.
///
/// Maximizes the number of matches, then minimizes the summed ΔR (to 1e-6
/// resolution). Diagnostic only.
pub fn optimal_assignment(
    accepted: &[AcceptedParticle],
    candidates: &[ReconstructedCandidate],
    reco_indices: &[usize],
    max_delta_r: f64,
) -> Vec<Match> {
    if accepted.is_empty() || reco_indices.is_empty() {
        return Vec::new();
    }

    let dr = |g: usize, r: usize| -> Option<f64> {
        let particle = &accepted[g];
        let candidate = &candidates[reco_indices[r]];
        let value = delta_r(particle.eta, particle.phi, candidate.eta, candidate.phi);
        (value < max_delta_r).then_some(value)
    };
    let cost = |value: Option<f64>| -> i64 {
        match value {
            Some(v) => (v * COST_SCALE).round() as i64,
            None => FORBIDDEN_COST,
        }
    };

    // The solver needs rows <= columns
    let transposed = accepted.len() > reco_indices.len();
    let (rows, cols) = if transposed {
        (reco_indices.len(), accepted.len())
    } else {
        (accepted.len(), reco_indices.len())
    };
    let costs = Matrix::from_fn(rows, cols, |(i, j)| {
        if transposed {
            cost(dr(j, i))
        } else {
            cost(dr(i, j))
        }
    });
    let (_, assignments) = kuhn_munkres_min(&costs);

    let mut matches: Vec<Match> = assignments
        .into_iter()
        .enumerate()
        .filter_map(|(row, col)| {
            let (g, r) = if transposed { (col, row) } else { (row, col) };
            dr(g, r).map(|value| Match {
                delta_r: value,
                gen_index: accepted[g].index,
                reco_index: reco_indices[r],
                region: accepted[g].region,
            })
        })
        .collect();
    matches.sort_by(match_order);
    matches
}

/// True when the greedy result is worse than the optimal one: fewer matches,
/// or as many matches with a larger summed ΔR.
pub fn greedy_is_suboptimal(greedy: &[Match], optimal: &[Match]) -> bool {
    match greedy.len().cmp(&optimal.len()) {
        Ordering::Less => true,
        Ordering::Greater => false,
        // Allow for the solver's fixed-point rounding
        Ordering::Equal => {
            total_delta_r(greedy) > total_delta_r(optimal) + greedy.len() as f64 / COST_SCALE
        }
    }
}
