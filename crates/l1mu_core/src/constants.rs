//! Detector geometry and trigger constants
//!
//! Lengths are in cm, momenta in GeV, angles in radians.

// ============================================================
// Barrel muon system (second station reference cylinder)
// ============================================================
pub mod barrel {
    /// Radius of the reference cylinder used for propagation (cm)
    pub const R_REF_CM: f64 = 490.0;

    /// Maximum transverse displacement of a reconstructible vertex (cm)
    pub const MAX_LXY_CM: f64 = 490.0;

    /// Vertices at or beyond this |z| cannot reach the barrel (cm)
    pub const MAX_ABS_VZ_CM: f64 = 650.0;

    /// Outer radius used to bound the geometric η envelope (cm)
    pub const ENVELOPE_R_CM: f64 = 700.0;

    /// Half-length used to bound the geometric η envelope (cm)
    pub const ENVELOPE_Z_CM: f64 = 650.0;
}

// ============================================================
// Endcap muon system (second station disk)
// ============================================================
pub mod endcap {
    /// |z| of the reference disk used for propagation (cm)
    pub const Z_REF_CM: f64 = 800.0;

    pub const MAX_LXY_CM: f64 = 490.0;

    pub const MAX_ABS_VZ_CM: f64 = 800.0;

    /// Exclusive |η| window of the endcap track finder at the reference disk
    pub const MIN_ABS_ETA: f64 = 1.245;
    pub const MAX_ABS_ETA: f64 = 2.450;
}

// ============================================================
// Track-finder hardware scales
// ============================================================
pub mod hardware {
    /// Vertex-constrained pT step (GeV per count)
    pub const PT_STEP_GEV: f64 = 0.5;

    /// Hardware pT word is offset by one count
    pub const PT_OFFSET: f64 = 1.0;

    /// Unconstrained pT step (GeV per count)
    pub const PT_UNCONSTRAINED_STEP_GEV: f64 = 1.0;

    /// η step (per count)
    pub const ETA_STEP: f64 = 0.010875;

    /// Global φ counts at or above half a turn map to negative angles
    pub const PHI_HALF_TURN: f64 = 287.5;
    pub const PHI_FULL_TURN: f64 = 575.0;
}

// ============================================================
// Particles and matching
// ============================================================
pub mod physics {
    /// PDG id of the muon
    pub const MUON_PDG_ID: i32 = 13;

    /// Muon mass (GeV)
    pub const MUON_MASS_GEV: f64 = 0.1057;

    /// Parent id of the long-lived scalar in the H → XX → 4μ signal samples
    pub const LONG_LIVED_PARENT_ID: i32 = 6000113;

    /// Default generator ↔ candidate ΔR cutoff (exclusive)
    pub const MATCH_MAX_DELTA_R: f64 = 0.6;

    /// |xStar| below this is treated as lying on the propagation axis (cm)
    pub const AZIMUTH_DEGENERACY_CM: f64 = 1e-9;
}

// ============================================================
// Luminosity scale for rate estimates
// ============================================================
pub mod rate {
    /// Colliding bunches in the reference fill scheme
    pub const COLLIDING_BUNCHES: f64 = 2544.0;

    /// LHC revolution frequency (Hz)
    pub const REVOLUTION_FREQUENCY_HZ: f64 = 11246.0;

    /// Zero-bias event rate: one event per crossing of a colliding bunch pair
    pub const ZERO_BIAS_SCALE_HZ: f64 = COLLIDING_BUNCHES * REVOLUTION_FREQUENCY_HZ;
}
