//! Run summary written next to the printed report

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use l1mu_core::Counters;

use crate::input::ReadStats;

#[derive(Debug, Serialize)]
pub struct Summary<'a, R: Serialize> {
    pub analysis: &'static str,
    /// RFC3339
    pub created_at: String,
    pub input: String,
    pub events: u64,
    pub input_stats: ReadStats,
    pub counters: &'a Counters,
    pub report: &'a R,
}

impl<'a, R: Serialize> Summary<'a, R> {
    pub fn new(
        analysis: &'static str,
        input: &Path,
        input_stats: ReadStats,
        counters: &'a Counters,
        report: &'a R,
    ) -> Self {
        Self {
            analysis,
            created_at: chrono::Utc::now().to_rfc3339(),
            input: input.display().to_string(),
            events: counters.get(l1mu_core::counters::names::EVENTS),
            input_stats,
            counters,
            report,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        info!(path = %path.display(), "summary saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l1mu_core::counters::names;
    use l1mu_core::{AnalysisConfig, RateReport};

    #[test]
    fn test_summary_round_trips_through_json() {
        let mut counters = Counters::new();
        counters.add(names::EVENTS, 10);
        counters.add(&names::rate("L1_SingleMu22"), 1);
        let report = RateReport::from_counters(&counters, &AnalysisConfig::rate());
        let stats = ReadStats { lines: 11, decoded: 10, skipped: 1 };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        Summary::new("rate", Path::new("events.jsonl"), stats, &counters, &report)
            .save(&path)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["analysis"], "rate");
        assert_eq!(value["events"], 10);
        assert_eq!(value["input_stats"]["skipped"], 1);
        assert_eq!(value["counters"]["rate.L1_SingleMu22"], 1);
        assert_eq!(value["report"]["events"], 10);
        assert!(chrono::DateTime::parse_from_rfc3339(value["created_at"].as_str().unwrap()).is_ok());
    }
}
