//! # l1mu_core - L1 displaced-muon acceptance, matching and trigger engine
//!
//! Offline estimate of Level-1 muon trigger performance for displaced
//! dimuon signatures.
//!
//! ## Features
//! - Straight-line propagation of generated muons to the barrel cylinder or
//!   endcap disk, with geometric acceptance
//! - Deduplication of track-finder and global-trigger candidates
//! - Greedy ΔR association (with an optimal-assignment diagnostic)
//! - Seed conditions over single muons and dimuons, OR-composed into
//!   efficiency definitions
//! - Efficiency and zero-bias rate analyses whose counters reduce in parallel
//!
//! The core performs no I/O beyond config loading. Events arrive already
//! decoded (see [`decode::RawEvent`]).

pub mod analysis;
pub mod config;
pub mod constants;
pub mod counters;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod event;
pub mod geometry;
pub mod kinematics;
pub mod matching;
pub mod menu;
pub mod pairing;
pub mod report;
pub mod trigger;

pub use analysis::{run_events, run_events_parallel, Analyzer, EfficiencyAnalyzer, RateAnalyzer};
pub use config::AnalysisConfig;
pub use counters::Counters;
pub use decode::RawEvent;
pub use error::{ConfigError, DecodeError};
pub use event::{EventRecord, GeneratedParticle, ReconstructedCandidate, ReconstructionSource};
pub use report::{EfficiencyReport, RateReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items
pub mod prelude {
    pub use crate::analysis::{run_events, run_events_parallel, Analyzer};
    pub use crate::analysis::{EfficiencyAnalyzer, RateAnalyzer};
    pub use crate::config::AnalysisConfig;
    pub use crate::counters::Counters;
    pub use crate::decode::RawEvent;
    pub use crate::dedup::{dedupe, PtHypothesis};
    pub use crate::event::{EventRecord, ReconstructionSource};
    pub use crate::geometry::{classify, AcceptanceRegion};
    pub use crate::matching::{match_candidates, Match};
    pub use crate::pairing::{pair_up, resolve_pairs, DimuonPair};
    pub use crate::report::{EfficiencyReport, RateReport};
    pub use crate::trigger::{evaluate_pair, evaluate_single, TriggerCondition, TriggerLeg};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::counters::names;
    use serde_json::json;

    /// Two displaced barrel muons and two global-trigger muons near them.
    fn raw_event(event: u64) -> RawEvent {
        let line = json!({
            "run": 1,
            "lumi": 2,
            "event": event,
            "generator": {
                "nPart": 3,
                "partId": [13, -13, 211],
                "partParent": [6000113, 6000113, 6000113],
                "partVx": [20.0, 20.0, 0.0],
                "partVy": [0.0, 0.0, 0.0],
                "partVz": [5.0, 5.0, 0.0],
                "partPt": [25.0, 12.0, 5.0],
                "partEta": [0.2, -0.3, 0.0],
                "partPhi": [0.4, -2.0, 0.0]
            },
            "global": {
                "nMuons": 2,
                "muonEt": [24.0, 11.0],
                "muonEtUnconstrained": [26.0, 13.0],
                "muonEta": [0.21, -0.29],
                "muonPhi": [0.41, -1.98],
                "muonEtaAtVtx": [0.2, -0.3],
                "muonPhiAtVtx": [0.4, -2.0],
                "muonChg": [1, -1],
                "muonQual": [12, 12],
                "muonDxy": [1.0, 1.0],
                "muonBx": [0, 0]
            }
        });
        serde_json::from_value(line).unwrap()
    }

    #[test]
    fn test_version() {
        assert!(!crate::VERSION.is_empty());
    }

    #[test]
    fn test_decode_to_efficiency_report() {
        let events: Vec<EventRecord> = (0..5).map(|i| raw_event(i).decode().unwrap()).collect();
        let config = AnalysisConfig::efficiency();
        let analyzer = EfficiencyAnalyzer::new(config.clone());

        let counters = run_events(&analyzer, &events, None);
        assert_eq!(counters.get(names::EVENTS), 5);
        assert_eq!(counters.get(names::GEN_MUONS), 10);
        assert_eq!(counters.get(names::DIMUONS), 5);
        assert_eq!(counters.get(names::RESOLVED_DIMUONS), 5);

        let report = EfficiencyReport::from_counters(&counters, &config);
        let baseline = &report.definitions[0];
        assert_eq!(baseline.count, 5);
        assert_eq!(baseline.efficiency, Some(1.0));
    }

    #[test]
    fn test_decode_to_rate_report() {
        let events: Vec<EventRecord> = (0..4).map(|i| raw_event(i).decode().unwrap()).collect();
        let config = AnalysisConfig::rate();
        let analyzer = RateAnalyzer::new(config.clone());

        let counters = run_events_parallel(&analyzer, &events);
        let report = RateReport::from_counters(&counters, &config);
        let seed = |name: &str| report.seeds.iter().find(|s| s.name == name).unwrap().count;
        assert_eq!(seed("L1_SingleMu22"), 4);
        assert_eq!(seed("L1_SingleMu25"), 0);
        assert_eq!(seed("L1_DoubleMu15_7"), 4);
        assert_eq!(seed("L1_DoubleMu4_SQ_OS"), 4);
    }
}
