//! Named, monotonically increasing event counters.
//!
//! `Counters` is a plain value threaded through event processing. Merging is
//! commutative and associative, so per-worker partials can be reduced in any
//! order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters {
    values: BTreeMap<String, u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&mut self, name: &str) {
        self.add(name, 1);
    }

    /// Add `amount` to `name`. Adding zero still registers the counter.
    pub fn add(&mut self, name: &str, amount: u64) {
        match self.values.get_mut(name) {
            Some(value) => *value = value.saturating_add(amount),
            None => {
                self.values.insert(name.to_string(), amount);
            }
        }
    }

    /// Increment when `condition` holds, otherwise only register the name.
    pub fn count_if(&mut self, name: &str, condition: bool) {
        self.add(name, u64::from(condition));
    }

    /// Current value; unknown names read as zero.
    pub fn get(&self, name: &str) -> u64 {
        self.values.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn merge(&mut self, other: &Counters) {
        for (name, &amount) in &other.values {
            self.add(name, amount);
        }
    }

    /// Consuming merge for reductions.
    pub fn merged(mut self, other: Counters) -> Counters {
        if self.values.len() < other.values.len() {
            let mut other = other;
            other.merge(&self);
            return other;
        }
        self.merge(&other);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Counter name helpers.
pub mod names {
    pub const EVENTS: &str = "events";
    pub const GEN_MUONS: &str = "gen_muons";
    pub const GEN_MUONS_IN_ACCEPTANCE: &str = "gen_muons_in_acceptance";
    pub const GEN_MUONS_BARREL: &str = "gen_muons_barrel";
    pub const GEN_MUONS_ENDCAP: &str = "gen_muons_endcap";
    pub const GEN_MUON_EVENTS: &str = "gen_muon_events";
    pub const RECO_MUONS_IN_TIME: &str = "reco_muons_in_time";
    pub const RECO_MUONS_UNIQUE: &str = "reco_muons_unique";
    pub const RECO_MUON_EVENTS: &str = "reco_muon_events";
    pub const MATCHED_GEN_MUONS: &str = "matched_gen_muons";
    pub const MATCHED_GEN_MUON_EVENTS: &str = "matched_gen_muon_events";
    pub const DIMUONS: &str = "dimuons";
    pub const GEN_DIMUON_EVENTS: &str = "gen_dimuon_events";
    pub const RESOLVED_DIMUONS: &str = "resolved_dimuons";
    pub const GREEDY_SUBOPTIMAL_EVENTS: &str = "diagnostic.greedy_suboptimal_events";

    pub fn matched(source: impl std::fmt::Display) -> String {
        format!("matched.{source}")
    }

    pub fn condition(name: &str) -> String {
        format!("condition.{name}")
    }

    pub fn efficiency(name: &str) -> String {
        format!("efficiency.{name}")
    }

    pub fn rate(name: &str) -> String {
        format!("rate.{name}")
    }
}
