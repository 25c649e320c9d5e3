//! Decoded, event-scoped domain types.
//!
//! Everything here lives for exactly one event. Candidates and generated
//! particles are identified by their position in the decoded lists.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::physics;

/// Generator-level particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratedParticle {
    pub pdg_id: i32,
    pub parent_id: i32,
    pub status: i32,
    /// Production vertex (cm)
    pub vertex: Vector3<f64>,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
}

impl GeneratedParticle {
    pub fn is_muon(&self) -> bool {
        self.pdg_id.abs() == physics::MUON_PDG_ID
    }

    /// Transverse distance of the production vertex from the beam line.
    #[inline]
    pub fn lxy(&self) -> f64 {
        self.vertex.x.hypot(self.vertex.y)
    }

    /// Unsigned transverse impact parameter of the straight-line trajectory.
    pub fn dxy(&self) -> f64 {
        (self.vertex.x * self.phi.sin() - self.vertex.y * self.phi.cos()).abs()
    }

    /// Bitwise vertex identity, the criterion for two muons sharing a parent decay.
    pub fn shares_vertex_with(&self, other: &GeneratedParticle) -> bool {
        self.vertex.x == other.vertex.x
            && self.vertex.y == other.vertex.y
            && self.vertex.z == other.vertex.z
    }
}

/// Trigger-level muon candidate in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedCandidate {
    /// Vertex-constrained pT (GeV)
    pub pt: f64,
    /// Vertex-unconstrained pT (GeV)
    pub pt_unconstrained: f64,
    /// η at the muon system
    pub eta: f64,
    /// φ at the muon system
    pub phi: f64,
    /// η extrapolated to the vertex; equals `eta` for sources without extrapolation
    pub eta_vtx: f64,
    /// φ extrapolated to the vertex; equals `phi` for sources without extrapolation
    pub phi_vtx: f64,
    pub charge: i8,
    pub quality: u32,
    pub dxy: f64,
    pub bx: i32,
}

impl ReconstructedCandidate {
    /// Only bunch crossing 0 belongs to the triggering collision.
    #[inline]
    pub fn in_time(&self) -> bool {
        self.bx == 0
    }
}

/// Producer of a candidate collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionSource {
    /// Unpacked legacy barrel track finder
    LegacyBarrel,
    /// Emulated Kalman barrel track finder
    KalmanBarrel,
    /// Emulated endcap track finder
    Endcap,
    /// Global muon trigger output
    Global,
}

impl ReconstructionSource {
    pub const ALL: [ReconstructionSource; 4] = [
        ReconstructionSource::LegacyBarrel,
        ReconstructionSource::KalmanBarrel,
        ReconstructionSource::Endcap,
        ReconstructionSource::Global,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReconstructionSource::LegacyBarrel => "legacy_barrel",
            ReconstructionSource::KalmanBarrel => "kalman_barrel",
            ReconstructionSource::Endcap => "endcap",
            ReconstructionSource::Global => "global",
        }
    }
}

impl fmt::Display for ReconstructionSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventId {
    pub run: u64,
    pub lumi: u64,
    pub event: u64,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "run {}, LS {}, event {}", self.run, self.lumi, self.event)
    }
}

/// One fully decoded collision event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub generated: Vec<GeneratedParticle>,
    pub sources: BTreeMap<ReconstructionSource, Vec<ReconstructedCandidate>>,
}

impl EventRecord {
    /// Candidates of one source; empty when the source is absent from the event.
    pub fn candidates(&self, source: ReconstructionSource) -> &[ReconstructedCandidate] {
        self.sources.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_source(&self, source: ReconstructionSource) -> bool {
        self.sources.contains_key(&source)
    }
}

/// Positions of the in-time candidates, in decoded order.
pub fn in_time_indices(candidates: &[ReconstructedCandidate]) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.in_time())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn muon(vertex: (f64, f64, f64), pt: f64, eta: f64, phi: f64) -> GeneratedParticle {
        GeneratedParticle {
            pdg_id: 13,
            parent_id: physics::LONG_LIVED_PARENT_ID,
            status: 1,
            vertex: Vector3::new(vertex.0, vertex.1, vertex.2),
            pt,
            eta,
            phi,
        }
    }

    pub fn candidate(pt: f64, eta: f64, phi: f64) -> ReconstructedCandidate {
        ReconstructedCandidate {
            pt,
            pt_unconstrained: pt,
            eta,
            phi,
            eta_vtx: eta,
            phi_vtx: phi,
            charge: 1,
            quality: 12,
            dxy: 0.0,
            bx: 0,
        }
    }
}
