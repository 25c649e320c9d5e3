//! Four-vectors and angular distances in (η, φ).

use std::f64::consts::{PI, TAU};
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Wrap an azimuthal difference into (−π, π].
#[inline]
pub fn wrap_phi(dphi: f64) -> f64 {
    let d = dphi % TAU;
    if d > PI {
        d - TAU
    } else if d <= -PI {
        d + TAU
    } else {
        d
    }
}

#[inline]
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    wrap_phi(phi1 - phi2)
}

/// ΔR = √(Δη² + Δφ²) with Δφ wrapped.
#[inline]
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    (eta1 - eta2).hypot(delta_phi(phi1, phi2))
}

/// Cartesian four-momentum (GeV).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LorentzVector {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl LorentzVector {
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Build from collider coordinates and a mass hypothesis.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let e = (px * px + py * py + pz * pz + mass * mass).sqrt();
        Self { px, py, pz, e }
    }

    #[inline]
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Pseudorapidity; ±∞ along the beam axis, NaN for a null vector.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            if self.pz == 0.0 {
                return f64::NAN;
            }
            return self.pz.signum() * f64::INFINITY;
        }
        (self.pz / pt).asinh()
    }

    #[inline]
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    pub fn mass_squared(&self) -> f64 {
        self.e * self.e - self.px * self.px - self.py * self.py - self.pz * self.pz
    }

    /// Invariant mass; spacelike vectors (rounding noise) report 0.
    pub fn mass(&self) -> f64 {
        let m2 = self.mass_squared();
        if m2 >= 0.0 {
            m2.sqrt()
        } else {
            0.0
        }
    }

    pub fn delta_r(&self, other: &LorentzVector) -> f64 {
        delta_r(self.eta(), self.phi(), other.eta(), other.phi())
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;

    fn add(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}
