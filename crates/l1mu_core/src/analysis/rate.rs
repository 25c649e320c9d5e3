//! Zero-bias trigger rates.
//!
//! An event fires a seed when any in-time trigger muon (single seeds) or any
//! unordered pair of them (double seeds) passes. Candidates are used as
//! delivered: no deduplication, no generator information.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::Analyzer;
use crate::config::AnalysisConfig;
use crate::counters::{names, Counters};
use crate::event::{in_time_indices, EventRecord};
use crate::trigger::{evaluate_pair, evaluate_single, TriggerLeg};

pub struct RateAnalyzer {
    config: AnalysisConfig,
    counter_names: Vec<String>,
}

impl RateAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let counter_names = config
            .trigger
            .conditions
            .iter()
            .map(|c| names::rate(&c.name))
            .collect();
        Self { config, counter_names }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Names of the seeds that fired in this event, in menu order.
    pub fn fired_seeds(&self, event: &EventRecord) -> Vec<&str> {
        let conditions = &self.config.trigger.conditions;
        let candidates = event.candidates(self.config.matching.trigger_source);
        let legs: Vec<TriggerLeg> = in_time_indices(candidates)
            .into_iter()
            .map(|i| TriggerLeg::from_candidate(&candidates[i], self.config.trigger.coordinates))
            .collect();

        let mut fired = vec![false; conditions.len()];
        let mut mark = |outcomes: BTreeMap<String, bool>| {
            for (slot, condition) in fired.iter_mut().zip(conditions) {
                if outcomes.get(&condition.name).copied().unwrap_or(false) {
                    *slot = true;
                }
            }
        };

        for leg in &legs {
            mark(evaluate_single(conditions, leg));
        }
        for (i, a) in legs.iter().enumerate() {
            for b in &legs[i + 1..] {
                mark(evaluate_pair(conditions, a, b));
            }
        }

        conditions
            .iter()
            .zip(fired)
            .filter(|(_, f)| *f)
            .map(|(c, _)| c.name.as_str())
            .collect()
    }
}

impl Analyzer for RateAnalyzer {
    fn name(&self) -> &'static str {
        "rate"
    }

    fn progress_interval(&self) -> u64 {
        self.config.run.progress_interval
    }

    fn process_event(&self, event: &EventRecord, counters: &mut Counters) {
        counters.increment(names::EVENTS);
        let fired = self.fired_seeds(event);
        for (condition, counter) in self.config.trigger.conditions.iter().zip(&self.counter_names) {
            counters.count_if(counter, fired.contains(&condition.name.as_str()));
        }
        debug!(event = %event.id, fired = fired.len(), "rate event");
    }
}
