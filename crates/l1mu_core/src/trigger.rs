//! Stateless L1 seed conditions over one or two trigger legs.
//!
//! Every comparison is written so that a NaN operand makes the condition
//! false. Nothing here fails.

// `!(x >= min)` is deliberate: NaN must fail the cut
#![allow(clippy::neg_cmp_op_on_partial_ord)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dedup::PtHypothesis;
use crate::event::ReconstructedCandidate;
use crate::kinematics::{delta_r, LorentzVector};

/// Set of accepted hardware quality codes (0..=31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct QualitySet {
    mask: u32,
}

impl QualitySet {
    pub fn new(codes: &[u32]) -> Self {
        let mask = codes
            .iter()
            .filter(|&&q| q < 32)
            .fold(0u32, |mask, &q| mask | (1 << q));
        Self { mask }
    }

    /// Single-muon quality: 12..=15
    pub fn single() -> Self {
        Self::new(&[12, 13, 14, 15])
    }

    /// Double-muon quality: 8..=15
    pub fn double() -> Self {
        Self::new(&[8, 9, 10, 11, 12, 13, 14, 15])
    }

    /// Accepts every code.
    pub fn any() -> Self {
        Self { mask: u32::MAX }
    }

    #[inline]
    pub fn contains(&self, quality: u32) -> bool {
        quality < 32 && self.mask & (1 << quality) != 0
    }

    pub fn codes(&self) -> Vec<u32> {
        (0..32).filter(|&q| self.contains(q)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

impl From<Vec<u32>> for QualitySet {
    fn from(codes: Vec<u32>) -> Self {
        Self::new(&codes)
    }
}

impl From<QualitySet> for Vec<u32> {
    fn from(set: QualitySet) -> Self {
        set.codes()
    }
}

/// One edge of an |η| window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(value: f64) -> Self {
        Self { value, inclusive: true }
    }

    pub fn exclusive(value: f64) -> Self {
        Self { value, inclusive: false }
    }
}

/// Window on |η|; a missing edge is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtaWindow {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl EtaWindow {
    pub fn any() -> Self {
        Self::default()
    }

    /// |η| ≤ `value`
    pub fn up_to(value: f64) -> Self {
        Self { lower: None, upper: Some(Bound::inclusive(value)) }
    }

    /// |η| < `value`
    pub fn below(value: f64) -> Self {
        Self { lower: None, upper: Some(Bound::exclusive(value)) }
    }

    pub fn new(lower: Bound, upper: Bound) -> Self {
        Self { lower: Some(lower), upper: Some(upper) }
    }

    pub fn contains(&self, eta: f64) -> bool {
        let abs_eta = eta.abs();
        let above = match self.lower {
            Some(b) if b.inclusive => abs_eta >= b.value,
            Some(b) => abs_eta > b.value,
            None => true,
        };
        let under = match self.upper {
            Some(b) if b.inclusive => abs_eta <= b.value,
            Some(b) => abs_eta < b.value,
            None => true,
        };
        above && under
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

/// Which (η, φ) a leg is evaluated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coordinates {
    /// As measured at the muon stations
    #[default]
    MuonSystem,
    /// Extrapolated back to the collision vertex
    Vertex,
}

/// The quantities a seed condition looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerLeg {
    pub pt: f64,
    pub pt_unconstrained: f64,
    pub eta: f64,
    pub phi: f64,
    pub charge: i8,
    pub quality: u32,
    pub dxy: f64,
}

impl TriggerLeg {
    pub fn from_candidate(candidate: &ReconstructedCandidate, coordinates: Coordinates) -> Self {
        let (eta, phi) = match coordinates {
            Coordinates::MuonSystem => (candidate.eta, candidate.phi),
            Coordinates::Vertex => (candidate.eta_vtx, candidate.phi_vtx),
        };
        Self {
            pt: candidate.pt,
            pt_unconstrained: candidate.pt_unconstrained,
            eta,
            phi,
            charge: candidate.charge,
            quality: candidate.quality,
            dxy: candidate.dxy,
        }
    }

    fn pt_for(&self, hypothesis: PtHypothesis) -> f64 {
        match hypothesis {
            PtHypothesis::VertexConstrained => self.pt,
            PtHypothesis::Unconstrained => self.pt_unconstrained,
            PtHypothesis::Larger => self.pt.max(self.pt_unconstrained),
        }
    }

    /// Massless four-vector with the vertex-constrained pT.
    pub fn momentum(&self) -> LorentzVector {
        LorentzVector::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleMuSeed {
    pub pt_min: f64,
    #[serde(default)]
    pub pt: PtHypothesis,
    pub quality: QualitySet,
    #[serde(default)]
    pub eta: EtaWindow,
}

impl SingleMuSeed {
    pub fn fires(&self, leg: &TriggerLeg) -> bool {
        self.quality.contains(leg.quality)
            && leg.pt_for(self.pt) >= self.pt_min
            && self.eta.contains(leg.eta)
    }
}

/// Two-leg seed. The pT thresholds apply to the higher and lower leg pT of
/// the chosen hypothesis; the η window applies to both legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleMuSeed {
    pub leading_pt_min: f64,
    pub subleading_pt_min: f64,
    #[serde(default)]
    pub pt: PtHypothesis,
    pub quality: QualitySet,
    #[serde(default)]
    pub eta: EtaWindow,
    #[serde(default)]
    pub opposite_sign: bool,
    /// Inclusive upper bound on ΔR between the legs
    #[serde(default)]
    pub max_delta_r: Option<f64>,
    /// Inclusive lower bound on the pair invariant mass (GeV)
    #[serde(default)]
    pub min_mass: Option<f64>,
    /// Inclusive lower bound on each leg's |dxy|
    #[serde(default)]
    pub min_dxy: Option<f64>,
}

impl DoubleMuSeed {
    pub fn fires(&self, a: &TriggerLeg, b: &TriggerLeg) -> bool {
        if !(self.quality.contains(a.quality) && self.quality.contains(b.quality)) {
            return false;
        }

        let (pa, pb) = (a.pt_for(self.pt), b.pt_for(self.pt));
        // A NaN lands in one of the two slots and fails its comparison
        let (high, low) = if pa >= pb { (pa, pb) } else { (pb, pa) };
        if !(high >= self.leading_pt_min && low >= self.subleading_pt_min) {
            return false;
        }

        if !(self.eta.contains(a.eta) && self.eta.contains(b.eta)) {
            return false;
        }
        if self.opposite_sign && i16::from(a.charge) * i16::from(b.charge) >= 0 {
            return false;
        }
        if let Some(min_dxy) = self.min_dxy {
            if !(a.dxy.abs() >= min_dxy && b.dxy.abs() >= min_dxy) {
                return false;
            }
        }

        // Angular separation comes straight from the stored (η, φ); a leg
        // with zero vertex pT still has a direction
        if let Some(max_dr) = self.max_delta_r {
            if !(delta_r(a.eta, a.phi, b.eta, b.phi) <= max_dr) {
                return false;
            }
        }
        if let Some(min_mass) = self.min_mass {
            if !((a.momentum() + b.momentum()).mass() >= min_mass) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Seed {
    Single(SingleMuSeed),
    Double(DoubleMuSeed),
}

/// A named seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub name: String,
    pub seed: Seed,
}

impl TriggerCondition {
    pub fn single(name: impl Into<String>, seed: SingleMuSeed) -> Self {
        Self { name: name.into(), seed: Seed::Single(seed) }
    }

    pub fn double(name: impl Into<String>, seed: DoubleMuSeed) -> Self {
        Self { name: name.into(), seed: Seed::Double(seed) }
    }

    pub fn is_single(&self) -> bool {
        matches!(self.seed, Seed::Single(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self.seed, Seed::Double(_))
    }
}

/// Outcome of every single-muon condition on one leg.
pub fn evaluate_single(conditions: &[TriggerCondition], leg: &TriggerLeg) -> BTreeMap<String, bool> {
    conditions
        .iter()
        .filter_map(|c| match &c.seed {
            Seed::Single(seed) => Some((c.name.clone(), seed.fires(leg))),
            Seed::Double(_) => None,
        })
        .collect()
}

/// Outcome of every double-muon condition on a pair of legs.
pub fn evaluate_pair(
    conditions: &[TriggerCondition],
    a: &TriggerLeg,
    b: &TriggerLeg,
) -> BTreeMap<String, bool> {
    conditions
        .iter()
        .filter_map(|c| match &c.seed {
            Seed::Double(seed) => Some((c.name.clone(), seed.fires(a, b))),
            Seed::Single(_) => None,
        })
        .collect()
}

/// OR-composite of named conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfficiencyDefinition {
    pub name: String,
    pub any_of: Vec<String>,
}

impl EfficiencyDefinition {
    pub fn new(name: impl Into<String>, any_of: &[&str]) -> Self {
        Self {
            name: name.into(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True if any listed condition fired; unknown names count as not fired.
    pub fn fires(&self, outcomes: &BTreeMap<String, bool>) -> bool {
        self.any_of
            .iter()
            .any(|name| outcomes.get(name).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn leg(pt: f64, eta: f64, phi: f64, charge: i8, quality: u32) -> TriggerLeg {
        TriggerLeg {
            pt,
            pt_unconstrained: pt,
            eta,
            phi,
            charge,
            quality,
            dxy: 0.0,
        }
    }

    fn double_15_7() -> DoubleMuSeed {
        DoubleMuSeed {
            leading_pt_min: 15.0,
            subleading_pt_min: 7.0,
            pt: PtHypothesis::VertexConstrained,
            quality: QualitySet::double(),
            eta: EtaWindow::any(),
            opposite_sign: false,
            max_delta_r: None,
            min_mass: None,
            min_dxy: None,
        }
    }

    #[test]
    fn test_quality_sets() {
        let single = QualitySet::single();
        assert!(single.contains(12) && single.contains(15));
        assert!(!single.contains(11) && !single.contains(16));
        let double = QualitySet::double();
        assert!(double.contains(8) && !double.contains(7));
        assert!(!double.contains(40));
        assert_eq!(double.codes(), (8..=15).collect::<Vec<u32>>());
    }

    #[test]
    fn test_leading_subleading_thresholds() {
        let seed = double_15_7();
        assert!(seed.fires(&leg(20.0, 0.1, 0.0, 1, 12), &leg(10.0, 0.2, 1.0, -1, 8)));
        assert!(!seed.fires(&leg(20.0, 0.1, 0.0, 1, 12), &leg(5.0, 0.2, 1.0, -1, 8)));
        // Leg order does not matter
        assert!(seed.fires(&leg(10.0, 0.2, 1.0, -1, 8), &leg(20.0, 0.1, 0.0, 1, 12)));
    }

    #[test]
    fn test_quality_gates_both_legs() {
        let seed = double_15_7();
        assert!(!seed.fires(&leg(20.0, 0.1, 0.0, 1, 12), &leg(10.0, 0.2, 1.0, -1, 4)));
    }

    #[test]
    fn test_nan_is_false() {
        let seed = double_15_7();
        assert!(!seed.fires(&leg(f64::NAN, 0.1, 0.0, 1, 12), &leg(10.0, 0.2, 1.0, -1, 12)));
        assert!(!seed.fires(&leg(20.0, 0.1, 0.0, 1, 12), &leg(f64::NAN, 0.2, 1.0, -1, 12)));

        let single = SingleMuSeed {
            pt_min: 7.0,
            pt: PtHypothesis::VertexConstrained,
            quality: QualitySet::single(),
            eta: EtaWindow::up_to(1.5),
        };
        assert!(!single.fires(&leg(10.0, f64::NAN, 0.0, 1, 12)));
    }

    #[test]
    fn test_eta_window_edges() {
        let omtf = EtaWindow::new(Bound::exclusive(0.8), Bound::inclusive(1.245));
        assert!(!omtf.contains(0.8));
        assert!(omtf.contains(-1.0));
        assert!(omtf.contains(1.245));
        assert!(!omtf.contains(1.3));
        assert!(EtaWindow::below(0.8).contains(0.79));
        assert!(!EtaWindow::below(0.8).contains(-0.8));
        assert!(EtaWindow::any().contains(5.0));
    }

    #[test]
    fn test_opposite_sign_and_delta_r() {
        let seed = DoubleMuSeed {
            leading_pt_min: 4.5,
            subleading_pt_min: 4.5,
            quality: QualitySet::single(),
            opposite_sign: true,
            max_delta_r: Some(1.2),
            ..double_15_7()
        };
        let a = leg(6.0, 0.0, 0.0, 1, 12);
        assert!(seed.fires(&a, &leg(5.0, 0.0, 1.0, -1, 13)));
        assert!(!seed.fires(&a, &leg(5.0, 0.0, 1.0, 1, 13)));
        assert!(!seed.fires(&a, &leg(5.0, 0.0, 1.3, -1, 13)));
    }

    #[test]
    fn test_zero_vertex_pt_legs_keep_their_separation() {
        let condition = crate::menu::efficiency_menu()
            .into_iter()
            .find(|c| c.name == crate::menu::DOUBLE_MU_0_ER1P5_SQ_OS_DR_MAX1P4)
            .unwrap();
        let Seed::Double(seed) = condition.seed else {
            panic!("expected a double seed");
        };

        let mut a = leg(0.0, 0.3, 0.1, 1, 12);
        a.pt_unconstrained = 20.0;
        let mut b = leg(0.0, 0.4, 0.2, -1, 12);
        b.pt_unconstrained = 20.0;
        assert!(seed.fires(&a, &b));

        // Separation is still enforced
        b.phi = 2.0;
        assert!(!seed.fires(&a, &b));
    }

    #[test]
    fn test_mass_threshold() {
        let seed = DoubleMuSeed {
            leading_pt_min: 4.5,
            subleading_pt_min: 4.5,
            min_mass: Some(7.0),
            ..double_15_7()
        };
        // Back to back: M = 2·√(pt_a·pt_b)
        let a = leg(5.0, 0.0, 0.0, 1, 12);
        assert!(seed.fires(&a, &leg(5.0, 0.0, PI, -1, 12)));
        assert!(!seed.fires(&a, &leg(5.0, 0.0, 0.5, -1, 12)));
    }

    #[test]
    fn test_unconstrained_and_dxy() {
        let seed = DoubleMuSeed {
            pt: PtHypothesis::Unconstrained,
            min_dxy: Some(1.0),
            ..double_15_7()
        };
        let mut a = leg(3.0, 0.1, 0.0, 1, 12);
        a.pt_unconstrained = 20.0;
        a.dxy = 2.0;
        let mut b = leg(3.0, 0.2, 1.0, -1, 12);
        b.pt_unconstrained = 8.0;
        b.dxy = -1.0;
        assert!(seed.fires(&a, &b));
        b.dxy = 0.5;
        assert!(!seed.fires(&a, &b));
    }

    #[test]
    fn test_leg_coordinates() {
        let candidate = ReconstructedCandidate {
            pt: 10.0,
            pt_unconstrained: 12.0,
            eta: 1.0,
            phi: 0.5,
            eta_vtx: 1.1,
            phi_vtx: 0.4,
            charge: -1,
            quality: 12,
            dxy: 0.0,
            bx: 0,
        };
        let muon_system = TriggerLeg::from_candidate(&candidate, Coordinates::MuonSystem);
        let vertex = TriggerLeg::from_candidate(&candidate, Coordinates::Vertex);
        assert_eq!((muon_system.eta, muon_system.phi), (1.0, 0.5));
        assert_eq!((vertex.eta, vertex.phi), (1.1, 0.4));
    }

    #[test]
    fn test_evaluate_splits_by_arity() {
        let conditions = vec![
            TriggerCondition::single(
                "L1_SingleMu7",
                SingleMuSeed {
                    pt_min: 7.0,
                    pt: PtHypothesis::VertexConstrained,
                    quality: QualitySet::single(),
                    eta: EtaWindow::any(),
                },
            ),
            TriggerCondition::double("L1_DoubleMu15_7", double_15_7()),
        ];
        let a = leg(20.0, 0.1, 0.0, 1, 12);
        let b = leg(10.0, 0.2, 1.0, -1, 12);

        let single = evaluate_single(&conditions, &a);
        assert_eq!(single.len(), 1);
        assert_eq!(single.get("L1_SingleMu7"), Some(&true));

        let pair = evaluate_pair(&conditions, &a, &b);
        assert_eq!(pair.len(), 1);
        assert_eq!(pair.get("L1_DoubleMu15_7"), Some(&true));
    }

    #[test]
    fn test_definition_is_or() {
        let def = EfficiencyDefinition::new("Extended", &["A", "B"]);
        let mut outcomes = BTreeMap::new();
        outcomes.insert("A".to_string(), false);
        outcomes.insert("B".to_string(), true);
        assert!(def.fires(&outcomes));
        outcomes.insert("B".to_string(), false);
        assert!(!def.fires(&outcomes));
        assert!(!EfficiencyDefinition::new("Empty", &[]).fires(&outcomes));
    }

    #[test]
    fn test_seed_yaml_shape() {
        let condition = TriggerCondition::double("L1_DoubleMu15_7", double_15_7());
        let yaml = serde_yaml::to_string(&condition).unwrap();
        assert!(yaml.contains("type: double"));
        let back: TriggerCondition = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, condition);
    }
}
