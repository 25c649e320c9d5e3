//! Straight-line propagation of generated muons to the second muon station
//! and the geometric acceptance of the barrel and endcap track finders.
//!
//! ## Reference surfaces
//!
//! - **Barrel**: cylinder of radius 490 cm around the beam line
//! - **Endcap**: disks at |z| = 800 cm
//!
//! Trajectories are straight lines from the production vertex along the
//! generated (η, φ); bending in the magnetic field is not modelled, so charge
//! does not enter the propagation.
//!
//! A particle is assigned to at most one region. The barrel wins when both
//! would accept it.

use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constants::{barrel, endcap, physics};
use crate::event::GeneratedParticle;

/// Track-finder region a generated muon is reconstructible in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceRegion {
    Barrel,
    Endcap,
}

impl AcceptanceRegion {
    pub fn name(&self) -> &'static str {
        match self {
            AcceptanceRegion::Barrel => "barrel",
            AcceptanceRegion::Endcap => "endcap",
        }
    }
}

/// Intersection of a trajectory with a reference surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Cartesian position of the intersection (cm)
    pub position: Vector3<f64>,
    /// η of the intersection seen from the nominal interaction point
    pub eta: f64,
    /// φ of the intersection
    pub phi: f64,
}

/// A generated particle that passed acceptance, with its propagated coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptedParticle {
    /// Position in the event's generated list
    pub index: usize,
    pub region: AcceptanceRegion,
    pub eta: f64,
    pub phi: f64,
}

/// Azimuth of the transverse point (x, y) by explicit quadrant branching.
///
/// Domain: `x ≠ 0`. Returns `None` when `|x|` is below
/// [`physics::AZIMUTH_DEGENERACY_CM`] (point on the propagation axis, azimuth
/// undefined) or when either input is not finite.
///
/// - `x > 0`: `atan(y/x)`
/// - `x < 0, y ≥ 0`: `π + atan(y/x)`
/// - `x < 0, y < 0`: `atan(y/x) − π`
pub fn quadrant_phi(x: f64, y: f64) -> Option<f64> {
    if !x.is_finite() || !y.is_finite() || x.abs() < physics::AZIMUTH_DEGENERACY_CM {
        return None;
    }
    let base = (y / x).atan();
    Some(if x > 0.0 {
        base
    } else if y >= 0.0 {
        PI + base
    } else {
        base - PI
    })
}

/// Transverse displacement of a vertex from the beam line.
#[inline]
pub fn lxy(vertex: &Vector3<f64>) -> f64 {
    vertex.x.hypot(vertex.y)
}

/// Propagate to the barrel reference cylinder.
///
/// The remaining radial lever arm `R_ref − Lxy` is walked along the
/// generated direction; the resulting point is re-expressed as (η, φ) seen
/// from the nominal interaction point.
pub fn propagate_barrel(vertex: &Vector3<f64>, eta: f64, phi: f64) -> Option<SurfacePoint> {
    let r = barrel::R_REF_CM - lxy(vertex);
    let position = Vector3::new(
        vertex.x + r * phi.cos(),
        vertex.y + r * phi.sin(),
        vertex.z + r * eta.sinh(),
    );

    let gen_phi = quadrant_phi(position.x, position.y)?;
    let gen_eta = (position.z / barrel::R_REF_CM).asinh();

    Some(SurfacePoint {
        position,
        eta: gen_eta,
        phi: gen_phi,
    })
}

/// Propagate to the endcap reference disk on the side the particle heads to.
///
/// Undefined for η = 0 (the trajectory never reaches a disk).
pub fn propagate_endcap(vertex: &Vector3<f64>, eta: f64, phi: f64) -> Option<SurfacePoint> {
    if eta == 0.0 || !eta.is_finite() {
        return None;
    }
    let side = eta.signum();
    let z_disk = endcap::Z_REF_CM * side;
    let r = (z_disk - vertex.z).abs() / eta.sinh().abs();

    let position = Vector3::new(vertex.x + r * phi.cos(), vertex.y + r * phi.sin(), z_disk);
    let r_star = position.x.hypot(position.y);

    let gen_phi = quadrant_phi(position.x, position.y)?;
    let gen_eta = (endcap::Z_REF_CM / r_star).asinh() * side;

    Some(SurfacePoint {
        position,
        eta: gen_eta,
        phi: gen_phi,
    })
}

pub fn propagate(
    vertex: &Vector3<f64>,
    eta: f64,
    phi: f64,
    region: AcceptanceRegion,
) -> Option<SurfacePoint> {
    match region {
        AcceptanceRegion::Barrel => propagate_barrel(vertex, eta, phi),
        AcceptanceRegion::Endcap => propagate_endcap(vertex, eta, phi),
    }
}

/// η window geometrically reachable inside the barrel from this vertex: (min, max), exclusive.
pub fn barrel_eta_envelope(vertex: &Vector3<f64>) -> (f64, f64) {
    let lxy = lxy(vertex);
    let lever = barrel::ENVELOPE_R_CM - lxy;
    let max_eta = -(0.5 * (lever / (barrel::ENVELOPE_Z_CM - vertex.z)).atan()).tan().ln();
    let min_eta = -(0.5 * (PI - (lever / (barrel::ENVELOPE_Z_CM + vertex.z)).atan()))
        .tan()
        .ln();
    (min_eta, max_eta)
}

/// Barrel acceptance from the vertex and the generated η.
pub fn in_barrel_acceptance(vertex: &Vector3<f64>, eta: f64) -> bool {
    if vertex.z.abs() >= barrel::MAX_ABS_VZ_CM {
        return false;
    }
    if lxy(vertex) > barrel::MAX_LXY_CM {
        return false;
    }
    let (min_eta, max_eta) = barrel_eta_envelope(vertex);
    eta > min_eta && eta < max_eta
}

/// Endcap acceptance; requires a well-defined propagation to the disk.
pub fn in_endcap_acceptance(vertex: &Vector3<f64>, eta: f64, phi: f64) -> bool {
    if vertex.z.abs() >= endcap::MAX_ABS_VZ_CM {
        return false;
    }
    if lxy(vertex) > endcap::MAX_LXY_CM {
        return false;
    }
    propagate_endcap(vertex, eta, phi).is_some_and(|point| in_endcap_eta_window(point.eta))
}

/// Both edges of the endcap window are exclusive.
#[inline]
fn in_endcap_eta_window(eta: f64) -> bool {
    let abs_eta = eta.abs();
    abs_eta > endcap::MIN_ABS_ETA && abs_eta < endcap::MAX_ABS_ETA
}

pub fn in_acceptance(particle: &GeneratedParticle, region: AcceptanceRegion) -> bool {
    match region {
        AcceptanceRegion::Barrel => in_barrel_acceptance(&particle.vertex, particle.eta),
        AcceptanceRegion::Endcap => {
            in_endcap_acceptance(&particle.vertex, particle.eta, particle.phi)
        }
    }
}

/// Assign a region and propagated coordinates, barrel first.
///
/// Barrel acceptance decides the region on its own: a barrel-accepted
/// particle whose propagation is degenerate is excluded, not retried
/// against the endcap.
pub fn classify(index: usize, particle: &GeneratedParticle) -> Option<AcceptedParticle> {
    let region = if in_acceptance(particle, AcceptanceRegion::Barrel) {
        AcceptanceRegion::Barrel
    } else if in_acceptance(particle, AcceptanceRegion::Endcap) {
        AcceptanceRegion::Endcap
    } else {
        return None;
    };

    match propagate(&particle.vertex, particle.eta, particle.phi, region) {
        Some(point) => Some(AcceptedParticle {
            index,
            region,
            eta: point.eta,
            phi: point.phi,
        }),
        None => {
            trace!(index, region = region.name(), "degenerate propagation, azimuth undefined");
            None
        }
    }
}
