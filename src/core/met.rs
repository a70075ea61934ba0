//! Missing transverse energy.

use serde::Serialize;

use crate::core::fourvec::FourMomentum;

/// The event's missing transverse energy. Stored as a full four-vector
/// with the zero-mass convention; physically only the transverse
/// components are measured.
#[derive(Debug, Clone, Serialize)]
pub struct Met {
    pub p4: FourMomentum,
    /// Variant flag for a no-high-frequency reconstruction; a single MET
    /// instance per event is built, so this is currently always false.
    pub is_no_hf: bool,
    /// True if a generator-level true MET could be assembled from the
    /// final-state neutrinos.
    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dphi: f64,
    pub gen_dpt_over_pt: f64,
}
