//! Decode boundary: raw ntuple-style branch arrays → [`EventRecord`].
//!
//! All hardware-unit scales live here so that unit semantics can be audited
//! and tested apart from the matching logic. Branch structs mirror the
//! column layout of the L1 ntuples (camelCase field names on the wire).
//! Length mismatches are rejected here; nothing downstream re-validates.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::hardware;
use crate::error::DecodeError;
use crate::event::{
    EventId, EventRecord, GeneratedParticle, ReconstructedCandidate, ReconstructionSource,
};

// ============================================================================
// Hardware unit conversions
// ============================================================================

/// Vertex-constrained pT from the hardware word: `(raw − 1) × 0.5` GeV.
#[inline]
pub fn pt_from_hw(raw: i32) -> f64 {
    (raw as f64 - hardware::PT_OFFSET) * hardware::PT_STEP_GEV
}

/// Vertex-unconstrained pT from the hardware word: `(raw − 1)` GeV.
#[inline]
pub fn pt_unconstrained_from_hw(raw: i32) -> f64 {
    (raw as f64 - hardware::PT_OFFSET) * hardware::PT_UNCONSTRAINED_STEP_GEV
}

#[inline]
pub fn eta_from_hw(raw: i32) -> f64 {
    raw as f64 * hardware::ETA_STEP
}

/// Global φ in (−π, π] from the 576-count hardware word.
///
/// Counts below 287.5 are the positive half-turn; the rest wrap to negative angles.
#[inline]
pub fn phi_from_hw(raw: i32) -> f64 {
    let raw = raw as f64;
    if raw < hardware::PHI_HALF_TURN {
        raw / hardware::PHI_HALF_TURN * PI
    } else {
        (raw - hardware::PHI_FULL_TURN) / hardware::PHI_HALF_TURN * PI
    }
}

/// Sign bit 0 is a positive charge.
#[inline]
pub fn charge_from_hw_sign(sign: i32) -> i8 {
    if sign == 0 {
        1
    } else {
        -1
    }
}

// ============================================================================
// Raw branches
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorBranch {
    pub n_part: i64,
    pub part_id: Vec<i32>,
    pub part_parent: Vec<i32>,
    pub part_stat: Vec<i32>,
    pub part_vx: Vec<f64>,
    pub part_vy: Vec<f64>,
    pub part_vz: Vec<f64>,
    pub part_pt: Vec<f64>,
    pub part_eta: Vec<f64>,
    pub part_phi: Vec<f64>,
}

/// Track-finder output in hardware units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackFinderBranch {
    pub n_tf_muons: i64,
    pub tf_muon_hw_pt: Vec<i32>,
    pub tf_muon_hw_pt_unconstrained: Vec<i32>,
    pub tf_muon_hw_eta: Vec<i32>,
    pub tf_muon_global_phi: Vec<i32>,
    pub tf_muon_hw_sign: Vec<i32>,
    pub tf_muon_hw_qual: Vec<u32>,
    #[serde(rename = "tfMuonHwDXY")]
    pub tf_muon_hw_dxy: Vec<i32>,
    pub tf_muon_bx: Vec<i32>,
}

/// Global trigger muons, already in physical units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalMuonBranch {
    pub n_muons: i64,
    pub muon_et: Vec<f64>,
    pub muon_et_unconstrained: Vec<f64>,
    pub muon_eta: Vec<f64>,
    pub muon_phi: Vec<f64>,
    /// Optional; falls back to `muon_eta` when empty
    pub muon_eta_at_vtx: Vec<f64>,
    /// Optional; falls back to `muon_phi` when empty
    pub muon_phi_at_vtx: Vec<f64>,
    pub muon_chg: Vec<i32>,
    pub muon_qual: Vec<u32>,
    pub muon_dxy: Vec<f64>,
    pub muon_bx: Vec<i32>,
}

/// One event as handed over by the external reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    pub run: u64,
    pub lumi: u64,
    pub event: u64,
    pub generator: GeneratorBranch,
    pub legacy_barrel: Option<TrackFinderBranch>,
    pub kalman_barrel: Option<TrackFinderBranch>,
    pub endcap: Option<TrackFinderBranch>,
    pub global: Option<GlobalMuonBranch>,
}

fn object_count(branch: &'static str, count: i64) -> Result<usize, DecodeError> {
    usize::try_from(count).map_err(|_| DecodeError::NegativeCount { branch, count })
}

fn check_len<T>(
    branch: &'static str,
    field: &'static str,
    values: &[T],
    expected: usize,
) -> Result<(), DecodeError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(DecodeError::LengthMismatch {
            branch,
            field,
            expected,
            found: values.len(),
        })
    }
}

impl GeneratorBranch {
    const NAME: &'static str = "generator";

    pub fn decode(&self) -> Result<Vec<GeneratedParticle>, DecodeError> {
        let n = object_count(Self::NAME, self.n_part)?;
        check_len(Self::NAME, "partId", &self.part_id, n)?;
        check_len(Self::NAME, "partParent", &self.part_parent, n)?;
        check_len(Self::NAME, "partVx", &self.part_vx, n)?;
        check_len(Self::NAME, "partVy", &self.part_vy, n)?;
        check_len(Self::NAME, "partVz", &self.part_vz, n)?;
        check_len(Self::NAME, "partPt", &self.part_pt, n)?;
        check_len(Self::NAME, "partEta", &self.part_eta, n)?;
        check_len(Self::NAME, "partPhi", &self.part_phi, n)?;
        // Status is not written by every producer
        if !self.part_stat.is_empty() {
            check_len(Self::NAME, "partStat", &self.part_stat, n)?;
        }

        Ok((0..n)
            .map(|i| GeneratedParticle {
                pdg_id: self.part_id[i],
                parent_id: self.part_parent[i],
                status: self.part_stat.get(i).copied().unwrap_or(1),
                vertex: Vector3::new(self.part_vx[i], self.part_vy[i], self.part_vz[i]),
                pt: self.part_pt[i],
                eta: self.part_eta[i],
                phi: self.part_phi[i],
            })
            .collect())
    }
}

impl TrackFinderBranch {
    pub fn decode(&self, branch: &'static str) -> Result<Vec<ReconstructedCandidate>, DecodeError> {
        let n = object_count(branch, self.n_tf_muons)?;
        check_len(branch, "tfMuonHwPt", &self.tf_muon_hw_pt, n)?;
        check_len(branch, "tfMuonHwPtUnconstrained", &self.tf_muon_hw_pt_unconstrained, n)?;
        check_len(branch, "tfMuonHwEta", &self.tf_muon_hw_eta, n)?;
        check_len(branch, "tfMuonGlobalPhi", &self.tf_muon_global_phi, n)?;
        check_len(branch, "tfMuonHwSign", &self.tf_muon_hw_sign, n)?;
        check_len(branch, "tfMuonHwQual", &self.tf_muon_hw_qual, n)?;
        check_len(branch, "tfMuonHwDXY", &self.tf_muon_hw_dxy, n)?;
        check_len(branch, "tfMuonBx", &self.tf_muon_bx, n)?;

        Ok((0..n)
            .map(|i| {
                let eta = eta_from_hw(self.tf_muon_hw_eta[i]);
                let phi = phi_from_hw(self.tf_muon_global_phi[i]);
                ReconstructedCandidate {
                    pt: pt_from_hw(self.tf_muon_hw_pt[i]),
                    pt_unconstrained: pt_unconstrained_from_hw(
                        self.tf_muon_hw_pt_unconstrained[i],
                    ),
                    eta,
                    phi,
                    eta_vtx: eta,
                    phi_vtx: phi,
                    charge: charge_from_hw_sign(self.tf_muon_hw_sign[i]),
                    quality: self.tf_muon_hw_qual[i],
                    dxy: self.tf_muon_hw_dxy[i] as f64,
                    bx: self.tf_muon_bx[i],
                }
            })
            .collect())
    }
}

impl GlobalMuonBranch {
    const NAME: &'static str = "global";

    pub fn decode(&self) -> Result<Vec<ReconstructedCandidate>, DecodeError> {
        let n = object_count(Self::NAME, self.n_muons)?;
        check_len(Self::NAME, "muonEt", &self.muon_et, n)?;
        check_len(Self::NAME, "muonEtUnconstrained", &self.muon_et_unconstrained, n)?;
        check_len(Self::NAME, "muonEta", &self.muon_eta, n)?;
        check_len(Self::NAME, "muonPhi", &self.muon_phi, n)?;
        check_len(Self::NAME, "muonChg", &self.muon_chg, n)?;
        check_len(Self::NAME, "muonQual", &self.muon_qual, n)?;
        check_len(Self::NAME, "muonDxy", &self.muon_dxy, n)?;
        check_len(Self::NAME, "muonBx", &self.muon_bx, n)?;
        let has_vtx = !self.muon_eta_at_vtx.is_empty() || !self.muon_phi_at_vtx.is_empty();
        if has_vtx {
            check_len(Self::NAME, "muonEtaAtVtx", &self.muon_eta_at_vtx, n)?;
            check_len(Self::NAME, "muonPhiAtVtx", &self.muon_phi_at_vtx, n)?;
        }

        Ok((0..n)
            .map(|i| ReconstructedCandidate {
                pt: self.muon_et[i],
                pt_unconstrained: self.muon_et_unconstrained[i],
                eta: self.muon_eta[i],
                phi: self.muon_phi[i],
                eta_vtx: if has_vtx { self.muon_eta_at_vtx[i] } else { self.muon_eta[i] },
                phi_vtx: if has_vtx { self.muon_phi_at_vtx[i] } else { self.muon_phi[i] },
                charge: self.muon_chg[i].signum() as i8,
                quality: self.muon_qual[i],
                dxy: self.muon_dxy[i],
                bx: self.muon_bx[i],
            })
            .collect())
    }
}

impl RawEvent {
    /// Parse and decode one JSON-lines record.
    pub fn from_json_line(line: &str) -> Result<EventRecord, DecodeError> {
        let raw: RawEvent =
            serde_json::from_str(line).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        raw.decode()
    }

    pub fn decode(&self) -> Result<EventRecord, DecodeError> {
        let mut sources = BTreeMap::new();
        if let Some(branch) = &self.legacy_barrel {
            sources.insert(ReconstructionSource::LegacyBarrel, branch.decode("legacy_barrel")?);
        }
        if let Some(branch) = &self.kalman_barrel {
            sources.insert(ReconstructionSource::KalmanBarrel, branch.decode("kalman_barrel")?);
        }
        if let Some(branch) = &self.endcap {
            sources.insert(ReconstructionSource::Endcap, branch.decode("endcap")?);
        }
        if let Some(branch) = &self.global {
            sources.insert(ReconstructionSource::Global, branch.decode()?);
        }

        Ok(EventRecord {
            id: EventId {
                run: self.run,
                lumi: self.lumi,
                event: self.event,
            },
            generated: self.generator.decode()?,
            sources,
        })
    }
}

impl TryFrom<&RawEvent> for EventRecord {
    type Error = DecodeError;

    fn try_from(raw: &RawEvent) -> Result<Self, Self::Error> {
        raw.decode()
    }
}
