//! Collapse candidates that report the same (η, φ).
//!
//! Track finders and the global trigger may emit several entries for one
//! physical muon. Entries are grouped by the exact bit pattern of their
//! stored η and φ; within a group the strictly-highest pT survives, so the
//! first-encountered entry wins ties. Groups are emitted in the order their
//! key was first seen.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::event::ReconstructedCandidate;

/// Which pT estimate ranks duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PtHypothesis {
    #[default]
    VertexConstrained,
    Unconstrained,
    /// The larger of the two estimates
    Larger,
}

impl PtHypothesis {
    #[inline]
    pub fn of(&self, candidate: &ReconstructedCandidate) -> f64 {
        match self {
            PtHypothesis::VertexConstrained => candidate.pt,
            PtHypothesis::Unconstrained => candidate.pt_unconstrained,
            PtHypothesis::Larger => candidate.pt.max(candidate.pt_unconstrained),
        }
    }
}

#[inline]
fn key(candidate: &ReconstructedCandidate) -> (u64, u64) {
    (candidate.eta.to_bits(), candidate.phi.to_bits())
}

/// Deduplicate the candidates at `indices` (positions into `candidates`).
///
/// Returns positions into `candidates`, one per distinct (η, φ).
pub fn dedupe_indices(
    candidates: &[ReconstructedCandidate],
    indices: &[usize],
    pt: PtHypothesis,
) -> Vec<usize> {
    let mut slot_of: FxHashMap<(u64, u64), usize> = FxHashMap::default();
    // (representative index, its pT)
    let mut kept: Vec<(usize, f64)> = Vec::with_capacity(indices.len());

    for &idx in indices {
        let candidate = &candidates[idx];
        let candidate_pt = pt.of(candidate);
        match slot_of.get(&key(candidate)) {
            Some(&slot) => {
                if candidate_pt > kept[slot].1 {
                    kept[slot] = (idx, candidate_pt);
                }
            }
            None => {
                slot_of.insert(key(candidate), kept.len());
                kept.push((idx, candidate_pt));
            }
        }
    }

    kept.into_iter().map(|(idx, _)| idx).collect()
}

/// Deduplicate a whole list.
pub fn dedupe(candidates: &[ReconstructedCandidate], pt: PtHypothesis) -> Vec<usize> {
    let all: Vec<usize> = (0..candidates.len()).collect();
    dedupe_indices(candidates, &all, pt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::candidate;
    use proptest::prelude::*;

    #[test]
    fn test_higher_pt_duplicate_survives() {
        let list = vec![candidate(10.0, 0.5, 1.0), candidate(20.0, 0.5, 1.0)];
        assert_eq!(dedupe(&list, PtHypothesis::VertexConstrained), vec![1]);
    }

    #[test]
    fn test_tie_keeps_first() {
        let list = vec![candidate(10.0, 0.5, 1.0), candidate(10.0, 0.5, 1.0)];
        assert_eq!(dedupe(&list, PtHypothesis::VertexConstrained), vec![0]);
    }

    #[test]
    fn test_key_order_is_first_encounter() {
        let list = vec![
            candidate(5.0, 0.1, 0.1),
            candidate(7.0, 0.2, 0.2),
            candidate(9.0, 0.1, 0.1),
            candidate(3.0, 0.3, 0.3),
        ];
        // Group (0.1, 0.1) was seen first; its representative is the later pT 9 entry
        assert_eq!(dedupe(&list, PtHypothesis::VertexConstrained), vec![2, 1, 3]);
    }

    #[test]
    fn test_hypothesis_changes_winner() {
        let mut a = candidate(10.0, 0.5, 1.0);
        a.pt_unconstrained = 30.0;
        let b = candidate(20.0, 0.5, 1.0);
        let list = vec![a, b];
        assert_eq!(dedupe(&list, PtHypothesis::VertexConstrained), vec![1]);
        assert_eq!(dedupe(&list, PtHypothesis::Unconstrained), vec![0]);
        assert_eq!(dedupe(&list, PtHypothesis::Larger), vec![0]);
    }

    #[test]
    fn test_equality_is_bitwise() {
        // 0.0 and -0.0 compare equal but are different keys
        let list = vec![candidate(10.0, 0.0, 1.0), candidate(20.0, -0.0, 1.0)];
        assert_eq!(dedupe(&list, PtHypothesis::VertexConstrained), vec![0, 1]);
    }

    #[test]
    fn test_subset_indices_refer_to_full_list() {
        let list = vec![
            candidate(50.0, 0.5, 1.0),
            candidate(10.0, 0.5, 1.0),
            candidate(20.0, 0.5, 1.0),
        ];
        assert_eq!(dedupe_indices(&list, &[1, 2], PtHypothesis::VertexConstrained), vec![2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe(&[], PtHypothesis::VertexConstrained).is_empty());
    }

    fn coarse_candidates() -> impl Strategy<Value = Vec<ReconstructedCandidate>> {
        // A coarse (η, φ) grid makes collisions frequent
        prop::collection::vec((0.0f64..50.0, 0i32..4, 0i32..4), 0..24).prop_map(|raw| {
            raw.into_iter()
                .map(|(pt, ieta, iphi)| candidate(pt, ieta as f64 * 0.5, iphi as f64 * 0.5))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_dedupe_is_idempotent(list in coarse_candidates()) {
            let once = dedupe(&list, PtHypothesis::VertexConstrained);
            let survivors: Vec<ReconstructedCandidate> = once.iter().map(|&i| list[i]).collect();
            let twice = dedupe(&survivors, PtHypothesis::VertexConstrained);
            prop_assert_eq!(twice, (0..survivors.len()).collect::<Vec<_>>());
        }

        #[test]
        fn prop_dedupe_keys_unique_and_maximal(list in coarse_candidates()) {
            let kept = dedupe(&list, PtHypothesis::VertexConstrained);
            for (n, &i) in kept.iter().enumerate() {
                for &j in &kept[n + 1..] {
                    prop_assert!(key(&list[i]) != key(&list[j]));
                }
                // No entry with the same key has a higher pT
                for other in list.iter().filter(|c| key(c) == key(&list[i])) {
                    prop_assert!(other.pt <= list[i].pt);
                }
            }
        }
    }
}
