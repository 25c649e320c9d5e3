//! Dimuon pairing of generated muons and resolution against matches.

use serde::{Deserialize, Serialize};

use crate::event::GeneratedParticle;
use crate::matching::{match_for, Match};

/// Two generated muons from the same decay vertex, leading pT first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimuonPair {
    pub leading: usize,
    pub subleading: usize,
}

/// A pair whose both legs were matched in one reconstruction source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPair {
    pub pair: DimuonPair,
    /// Reconstructed indices of the leading and sub-leading legs
    pub reco: [usize; 2],
}

/// Pair every two `selected` particles with bitwise-identical vertices.
///
/// `selected` holds positions into `generated`; pairs come out in (i, j)
/// scan order of that list. Equal pT keeps the earlier-listed particle first.
pub fn pair_up(generated: &[GeneratedParticle], selected: &[usize]) -> Vec<DimuonPair> {
    let mut pairs = Vec::new();
    for (n, &a) in selected.iter().enumerate() {
        for &b in &selected[n + 1..] {
            if !generated[a].shares_vertex_with(&generated[b]) {
                continue;
            }
            let pair = if generated[a].pt >= generated[b].pt {
                DimuonPair { leading: a, subleading: b }
            } else {
                DimuonPair { leading: b, subleading: a }
            };
            pairs.push(pair);
        }
    }
    pairs
}

/// Keep the pairs whose two legs both appear in `matches`.
pub fn resolve_pairs(pairs: &[DimuonPair], matches: &[Match]) -> Vec<ResolvedPair> {
    pairs
        .iter()
        .filter_map(|pair| {
            let leading = match_for(matches, pair.leading)?;
            let subleading = match_for(matches, pair.subleading)?;
            Some(ResolvedPair {
                pair: *pair,
                reco: [leading.reco_index, subleading.reco_index],
            })
        })
        .collect()
}
