//! Summaries derived from accumulated counters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::counters::{names, Counters};

/// `num / den`, or `None` when the denominator is zero.
pub fn ratio(num: u64, den: u64) -> Option<f64> {
    (den != 0).then(|| num as f64 / den as f64)
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionSummary {
    pub name: String,
    pub count: u64,
    /// Relative to all generated dimuons
    pub efficiency: Option<f64>,
    pub vs_baseline: Option<f64>,
    pub vs_extended: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyReport {
    pub events: u64,
    pub gen_muons: u64,
    pub gen_muons_in_acceptance: u64,
    pub matched_gen_muons: u64,
    pub dimuons: u64,
    pub resolved_dimuons: u64,
    pub greedy_suboptimal_events: u64,
    pub conditions: Vec<(String, u64)>,
    pub definitions: Vec<DefinitionSummary>,
}

impl EfficiencyReport {
    pub fn from_counters(counters: &Counters, config: &AnalysisConfig) -> Self {
        let dimuons = counters.get(names::DIMUONS);
        let count_of = |name: &Option<String>| {
            name.as_deref().map(|n| counters.get(&names::efficiency(n)))
        };
        let baseline = count_of(&config.trigger.baseline);
        let extended = count_of(&config.trigger.extended);

        let definitions = config
            .trigger
            .definitions
            .iter()
            .map(|def| {
                let count = counters.get(&names::efficiency(&def.name));
                DefinitionSummary {
                    name: def.name.clone(),
                    count,
                    efficiency: ratio(count, dimuons),
                    vs_baseline: baseline.and_then(|b| ratio(count, b)),
                    vs_extended: extended.and_then(|e| ratio(count, e)),
                }
            })
            .collect();

        let conditions = config
            .trigger
            .conditions
            .iter()
            .map(|c| (c.name.clone(), counters.get(&names::condition(&c.name))))
            .collect();

        Self {
            events: counters.get(names::EVENTS),
            gen_muons: counters.get(names::GEN_MUONS),
            gen_muons_in_acceptance: counters.get(names::GEN_MUONS_IN_ACCEPTANCE),
            matched_gen_muons: counters.get(names::MATCHED_GEN_MUONS),
            dimuons,
            resolved_dimuons: counters.get(names::RESOLVED_DIMUONS),
            greedy_suboptimal_events: counters.get(names::GREEDY_SUBOPTIMAL_EVENTS),
            conditions,
            definitions,
        }
    }
}

impl fmt::Display for EfficiencyReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Events:                  {}", self.events)?;
        writeln!(f, "Generated muons:         {}", self.gen_muons)?;
        writeln!(f, "  in acceptance:         {}", self.gen_muons_in_acceptance)?;
        writeln!(f, "  matched:               {}", self.matched_gen_muons)?;
        writeln!(f, "Dimuons:                 {}", self.dimuons)?;
        writeln!(f, "  resolved:              {}", self.resolved_dimuons)?;
        writeln!(f, "Greedy < optimal events: {}", self.greedy_suboptimal_events)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<40} {:>8} {:>10} {:>10} {:>10}",
            "Definition", "count", "eff", "/base", "/ext"
        )?;
        for d in &self.definitions {
            writeln!(
                f,
                "{:<40} {:>8} {:>10} {:>10} {:>10}",
                d.name,
                d.count,
                fmt_opt(d.efficiency, 4),
                fmt_opt(d.vs_baseline, 4),
                fmt_opt(d.vs_extended, 4)
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRate {
    pub name: String,
    pub count: u64,
    /// Hz; `None` when no events were processed
    pub rate_hz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateReport {
    pub events: u64,
    pub scale_hz: f64,
    pub seeds: Vec<SeedRate>,
}

impl RateReport {
    pub fn from_counters(counters: &Counters, config: &AnalysisConfig) -> Self {
        let events = counters.get(names::EVENTS);
        let scale_hz = config.rate.scale_hz;
        let seeds = config
            .trigger
            .conditions
            .iter()
            .map(|c| {
                let count = counters.get(&names::rate(&c.name));
                SeedRate {
                    name: c.name.clone(),
                    count,
                    rate_hz: ratio(count, events).map(|fraction| fraction * scale_hz),
                }
            })
            .collect();
        Self { events, scale_hz, seeds }
    }
}

impl fmt::Display for RateReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Events run over: {}", self.events)?;
        for (i, seed) in self.seeds.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {:<40} : {:<8} rate : {}",
                i + 1,
                seed.name,
                seed.count,
                fmt_opt(seed.rate_hz, 3)
            )?;
        }
        Ok(())
    }
}
