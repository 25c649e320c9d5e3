//! # Analysis configuration
//!
//! Every tunable literal of the efficiency and rate studies lives here.
//!
//! ```rust
//! use l1mu_core::config::AnalysisConfig;
//!
//! let efficiency = AnalysisConfig::efficiency();
//! let rate = AnalysisConfig::rate();
//! assert!(efficiency.validate().is_ok() && rate.validate().is_ok());
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{physics, rate};
use crate::dedup::PtHypothesis;
use crate::error::ConfigError;
use crate::event::{GeneratedParticle, ReconstructionSource};
use crate::menu;
use crate::trigger::{Coordinates, EfficiencyDefinition, Seed, TriggerCondition};

/// Which generated particles are studied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSelection {
    /// Matched against |pdg id|
    pub pdg_id: i32,
    pub parent_id: i32,
    /// Optional generator status requirement
    pub status: Option<i32>,
}

impl Default for GeneratorSelection {
    fn default() -> Self {
        Self {
            pdg_id: physics::MUON_PDG_ID,
            parent_id: physics::LONG_LIVED_PARENT_ID,
            status: None,
        }
    }
}

impl GeneratorSelection {
    pub fn selects(&self, particle: &GeneratedParticle) -> bool {
        particle.pdg_id.abs() == self.pdg_id
            && particle.parent_id == self.parent_id
            && self.status.map_or(true, |s| particle.status == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Exclusive ΔR cutoff
    pub max_delta_r: f64,
    /// Source whose matches feed the dimuon seeds
    pub trigger_source: ReconstructionSource,
    /// Also solve the optimal assignment and count greedy shortfalls
    pub optimal_diagnostic: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_delta_r: physics::MATCH_MAX_DELTA_R,
            trigger_source: ReconstructionSource::Global,
            optimal_diagnostic: true,
        }
    }
}

/// pT estimate used to rank duplicates, per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub legacy_barrel: PtHypothesis,
    pub kalman_barrel: PtHypothesis,
    pub endcap: PtHypothesis,
    pub global: PtHypothesis,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            legacy_barrel: PtHypothesis::VertexConstrained,
            kalman_barrel: PtHypothesis::VertexConstrained,
            endcap: PtHypothesis::Larger,
            global: PtHypothesis::VertexConstrained,
        }
    }
}

impl DedupConfig {
    pub fn hypothesis(&self, source: ReconstructionSource) -> PtHypothesis {
        match source {
            ReconstructionSource::LegacyBarrel => self.legacy_barrel,
            ReconstructionSource::KalmanBarrel => self.kalman_barrel,
            ReconstructionSource::Endcap => self.endcap,
            ReconstructionSource::Global => self.global,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// (η, φ) the seeds see
    pub coordinates: Coordinates,
    pub conditions: Vec<TriggerCondition>,
    pub definitions: Vec<EfficiencyDefinition>,
    /// Definition the report normalizes ratios to
    pub baseline: Option<String>,
    pub extended: Option<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            coordinates: Coordinates::MuonSystem,
            conditions: menu::efficiency_menu(),
            definitions: menu::efficiency_definitions(),
            baseline: Some(menu::BASELINE.to_string()),
            extended: Some(menu::EXTENDED.to_string()),
        }
    }
}

impl TriggerConfig {
    pub fn condition(&self, name: &str) -> Option<&TriggerCondition> {
        self.conditions.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Hz per fired zero-bias event fraction
    pub scale_hz: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self { scale_hz: rate::ZERO_BIAS_SCALE_HZ }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after this many events
    pub max_events: Option<u64>,
    /// Log progress every N events
    pub progress_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_events: Some(40_000),
            progress_interval: 10_000,
        }
    }
}

/// Full analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub selection: GeneratorSelection,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub rate: RateConfig,
    #[serde(default)]
    pub run: RunConfig,
}

fn invalid(name: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidThreshold {
        name: name.into(),
        reason: reason.into(),
    }
}

fn check_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite, got {value}")))
    }
}

fn check_seed(condition: &TriggerCondition) -> Result<(), ConfigError> {
    let field = |f: &str| format!("{}.{}", condition.name, f);
    match &condition.seed {
        Seed::Single(seed) => {
            check_finite(&field("pt_min"), seed.pt_min)?;
            if seed.quality.is_empty() {
                return Err(invalid(field("quality"), "no quality code accepted"));
            }
            Ok(())
        }
        Seed::Double(seed) => {
            check_finite(&field("leading_pt_min"), seed.leading_pt_min)?;
            check_finite(&field("subleading_pt_min"), seed.subleading_pt_min)?;
            for (name, value) in [
                ("max_delta_r", seed.max_delta_r),
                ("min_mass", seed.min_mass),
                ("min_dxy", seed.min_dxy),
            ] {
                if let Some(v) = value {
                    check_finite(&field(name), v)?;
                }
            }
            if seed.quality.is_empty() {
                return Err(invalid(field("quality"), "no quality code accepted"));
            }
            Ok(())
        }
    }
}

impl AnalysisConfig {
    /// Signal dimuon efficiency study (default)
    pub fn efficiency() -> Self {
        Self::default()
    }

    /// Zero-bias rate study: global-trigger muons at the vertex, full seed menu.
    pub fn rate() -> Self {
        let mut cfg = Self::default();
        cfg.matching.optimal_diagnostic = false;
        cfg.trigger = TriggerConfig {
            coordinates: Coordinates::Vertex,
            conditions: menu::rate_menu(),
            definitions: Vec::new(),
            baseline: None,
            extended: None,
        };
        cfg.run.max_events = None;
        cfg
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load by extension: `.yaml`/`.yml` or `.json`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        match format_of(path)? {
            Format::Yaml => Self::from_yaml_str(&text),
            Format::Json => Self::from_json_str(&text),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = match format_of(path)? {
            Format::Yaml => serde_yaml::to_string(self)?,
            Format::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dr = self.matching.max_delta_r;
        if !(dr.is_finite() && dr > 0.0) {
            return Err(invalid("matching.max_delta_r", format!("must be > 0, got {dr}")));
        }
        let scale = self.rate.scale_hz;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(invalid("rate.scale_hz", format!("must be > 0, got {scale}")));
        }
        if self.run.progress_interval == 0 {
            return Err(invalid("run.progress_interval", "must be > 0"));
        }

        if self.trigger.conditions.is_empty() {
            return Err(ConfigError::EmptyMenu);
        }
        let mut names = BTreeSet::new();
        for condition in &self.trigger.conditions {
            if !names.insert(condition.name.as_str()) {
                return Err(ConfigError::DuplicateCondition(condition.name.clone()));
            }
            check_seed(condition)?;
        }

        let mut definitions = BTreeSet::new();
        for def in &self.trigger.definitions {
            if !definitions.insert(def.name.as_str()) {
                return Err(ConfigError::DuplicateCondition(def.name.clone()));
            }
            if let Some(unknown) = def.any_of.iter().find(|c| !names.contains(c.as_str())) {
                return Err(ConfigError::UnknownCondition {
                    definition: def.name.clone(),
                    condition: unknown.clone(),
                });
            }
        }
        for (field, reference) in [
            ("trigger.baseline", &self.trigger.baseline),
            ("trigger.extended", &self.trigger.extended),
        ] {
            if let Some(name) = reference {
                if !definitions.contains(name.as_str()) {
                    return Err(invalid(field, format!("no efficiency definition named `{name}`")));
                }
            }
        }
        Ok(())
    }
}

enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::muon;
    use crate::trigger::QualitySet;

    #[test]
    fn test_presets_validate() {
        assert!(AnalysisConfig::efficiency().validate().is_ok());
        assert!(AnalysisConfig::rate().validate().is_ok());
    }

    #[test]
    fn test_rate_preset_uses_vertex_coordinates() {
        let efficiency = AnalysisConfig::efficiency();
        let rate = AnalysisConfig::rate();
        assert_eq!(efficiency.trigger.coordinates, Coordinates::MuonSystem);
        assert_eq!(rate.trigger.coordinates, Coordinates::Vertex);
        assert!(rate.trigger.definitions.is_empty());
        assert!(rate.trigger.conditions.len() > efficiency.trigger.conditions.len());
        assert!((rate.rate.scale_hz - 2544.0 * 11246.0).abs() < 1e-6);
    }

    #[test]
    fn test_selection() {
        let sel = GeneratorSelection::default();
        let mut mu = muon((0.0, 0.0, 0.0), 10.0, 0.0, 0.0);
        assert!(sel.selects(&mu));
        mu.pdg_id = -13;
        assert!(sel.selects(&mu));
        mu.parent_id = 23;
        assert!(!sel.selects(&mu));

        let with_status = GeneratorSelection { status: Some(1), ..sel };
        let mut mu = muon((0.0, 0.0, 0.0), 10.0, 0.0, 0.0);
        assert!(with_status.selects(&mu));
        mu.status = 23;
        assert!(!with_status.selects(&mu));
    }

    #[test]
    fn test_endcap_dedup_uses_larger_pt() {
        let dedup = DedupConfig::default();
        assert_eq!(dedup.hypothesis(ReconstructionSource::Endcap), PtHypothesis::Larger);
        assert_eq!(
            dedup.hypothesis(ReconstructionSource::Global),
            PtHypothesis::VertexConstrained
        );
    }

    #[test]
    fn test_rejects_bad_cutoff() {
        let mut cfg = AnalysisConfig::efficiency();
        cfg.matching.max_delta_r = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidThreshold { .. })));
        cfg.matching.max_delta_r = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_menu() {
        let mut cfg = AnalysisConfig::rate();
        cfg.trigger.conditions.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyMenu)));
    }

    #[test]
    fn test_rejects_unknown_condition_in_definition() {
        let mut cfg = AnalysisConfig::efficiency();
        cfg.trigger.definitions.push(EfficiencyDefinition::new("Broken", &["L1_Nope"]));
        match cfg.validate() {
            Err(ConfigError::UnknownCondition { definition, condition }) => {
                assert_eq!(definition, "Broken");
                assert_eq!(condition, "L1_Nope");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_duplicate_condition() {
        let mut cfg = AnalysisConfig::rate();
        let first = cfg.trigger.conditions[0].clone();
        cfg.trigger.conditions.push(first);
        assert!(matches!(cfg.validate(), Err(ConfigError::DuplicateCondition(_))));
    }

    #[test]
    fn test_rejects_empty_single_quality() {
        let mut cfg = AnalysisConfig::rate();
        let single = cfg
            .trigger
            .conditions
            .iter_mut()
            .find_map(|condition| match &mut condition.seed {
                Seed::Single(seed) => Some(seed),
                Seed::Double(_) => None,
            })
            .unwrap();
        single.quality = QualitySet::new(&[]);
        match cfg.validate() {
            Err(ConfigError::InvalidThreshold { name, .. }) => assert!(name.ends_with(".quality")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_dangling_baseline() {
        let mut cfg = AnalysisConfig::efficiency();
        cfg.trigger.baseline = Some("Nonexistent".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let cfg = AnalysisConfig::from_yaml_str("matching:\n  max_delta_r: 0.4\n").unwrap();
        assert!((cfg.matching.max_delta_r - 0.4).abs() < 1e-12);
        assert_eq!(cfg.matching.trigger_source, ReconstructionSource::Global);
        assert_eq!(cfg.trigger.conditions, menu::efficiency_menu());
    }

    #[test]
    fn test_yaml_and_json_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let rate = AnalysisConfig::rate();

        let yaml = dir.path().join("rate.yaml");
        rate.save(&yaml).unwrap();
        assert_eq!(AnalysisConfig::load(&yaml).unwrap(), rate);

        let json = dir.path().join("rate.json");
        rate.save(&json).unwrap();
        assert_eq!(AnalysisConfig::load(&json).unwrap(), rate);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            AnalysisConfig::load(&path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }
}
