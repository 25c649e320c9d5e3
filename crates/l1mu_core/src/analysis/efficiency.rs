//! Signal dimuon efficiency.
//!
//! Per event: select the generated signal muons, classify them into barrel or
//! endcap acceptance, match them against each reconstruction source, pair
//! them by common vertex and score every pair whose two legs were matched in
//! the trigger source.

use tracing::debug;

use crate::analysis::Analyzer;
use crate::config::AnalysisConfig;
use crate::counters::{names, Counters};
use crate::dedup::dedupe_indices;
use crate::event::{in_time_indices, EventRecord, ReconstructionSource};
use crate::geometry::{classify, AcceptanceRegion, AcceptedParticle};
use crate::matching::{greedy_is_suboptimal, match_candidates, optimal_assignment, Match};
use crate::pairing::{pair_up, resolve_pairs};
use crate::trigger::{evaluate_pair, TriggerLeg};

pub struct EfficiencyAnalyzer {
    config: AnalysisConfig,
}

impl EfficiencyAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Match the accepted muons against one source; also records the
    /// source's candidate statistics when it drives the trigger.
    fn match_source(
        &self,
        event: &EventRecord,
        source: ReconstructionSource,
        accepted: &[AcceptedParticle],
        counters: &mut Counters,
    ) -> Vec<Match> {
        let candidates = event.candidates(source);
        let in_time = in_time_indices(candidates);
        let unique = dedupe_indices(candidates, &in_time, self.config.dedup.hypothesis(source));
        let max_dr = self.config.matching.max_delta_r;
        let matches = match_candidates(accepted, candidates, &unique, max_dr);
        counters.add(&names::matched(source), matches.len() as u64);

        if source == self.config.matching.trigger_source {
            counters.add(names::RECO_MUONS_IN_TIME, in_time.len() as u64);
            counters.add(names::RECO_MUONS_UNIQUE, unique.len() as u64);
            counters.count_if(names::RECO_MUON_EVENTS, !in_time.is_empty());

            if self.config.matching.optimal_diagnostic {
                let optimal = optimal_assignment(accepted, candidates, &unique, max_dr);
                counters.count_if(
                    names::GREEDY_SUBOPTIMAL_EVENTS,
                    greedy_is_suboptimal(&matches, &optimal),
                );
            }
        }
        matches
    }
}

impl Analyzer for EfficiencyAnalyzer {
    fn name(&self) -> &'static str {
        "efficiency"
    }

    fn progress_interval(&self) -> u64 {
        self.config.run.progress_interval
    }

    fn process_event(&self, event: &EventRecord, counters: &mut Counters) {
        counters.increment(names::EVENTS);

        let selected: Vec<usize> = event
            .generated
            .iter()
            .enumerate()
            .filter(|(_, p)| self.config.selection.selects(p))
            .map(|(i, _)| i)
            .collect();
        counters.add(names::GEN_MUONS, selected.len() as u64);
        counters.count_if(names::GEN_MUON_EVENTS, !selected.is_empty());

        let accepted: Vec<AcceptedParticle> = selected
            .iter()
            .filter_map(|&i| classify(i, &event.generated[i]))
            .collect();
        let barrel = accepted.iter().filter(|a| a.region == AcceptanceRegion::Barrel).count();
        counters.add(names::GEN_MUONS_IN_ACCEPTANCE, accepted.len() as u64);
        counters.add(names::GEN_MUONS_BARREL, barrel as u64);
        counters.add(names::GEN_MUONS_ENDCAP, (accepted.len() - barrel) as u64);

        let trigger_source = self.config.matching.trigger_source;
        let mut trigger_matches = Vec::new();
        for source in ReconstructionSource::ALL {
            if !event.has_source(source) {
                continue;
            }
            let matches = self.match_source(event, source, &accepted, counters);
            if source == trigger_source {
                trigger_matches = matches;
            }
        }
        counters.add(names::MATCHED_GEN_MUONS, trigger_matches.len() as u64);
        counters.count_if(names::MATCHED_GEN_MUON_EVENTS, !trigger_matches.is_empty());

        // Pairs are formed among all selected muons; acceptance only
        // enters through the matches
        let pairs = pair_up(&event.generated, &selected);
        counters.add(names::DIMUONS, pairs.len() as u64);
        counters.count_if(names::GEN_DIMUON_EVENTS, !pairs.is_empty());

        let resolved = resolve_pairs(&pairs, &trigger_matches);
        counters.add(names::RESOLVED_DIMUONS, resolved.len() as u64);

        let candidates = event.candidates(trigger_source);
        let coordinates = self.config.trigger.coordinates;
        for pair in &resolved {
            let leading = TriggerLeg::from_candidate(&candidates[pair.reco[0]], coordinates);
            let subleading = TriggerLeg::from_candidate(&candidates[pair.reco[1]], coordinates);
            let outcomes = evaluate_pair(&self.config.trigger.conditions, &leading, &subleading);

            for (name, &fired) in &outcomes {
                counters.count_if(&names::condition(name), fired);
            }
            for definition in &self.config.trigger.definitions {
                counters.count_if(&names::efficiency(&definition.name), definition.fires(&outcomes));
            }
        }

        debug!(
            event = %event.id,
            selected = selected.len(),
            accepted = accepted.len(),
            matched = trigger_matches.len(),
            dimuons = pairs.len(),
            resolved = resolved.len(),
            "efficiency event"
        );
    }
}
