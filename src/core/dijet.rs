//! Jet-pair composites.

use serde::Serialize;

use crate::core::fourvec::FourMomentum;

/// An unordered pair of preselected jets. Leg 1 is always the earlier
/// (harder) jet in builder order.
#[derive(Debug, Clone, Serialize)]
pub struct Dijet {
    /// Combined four-momentum of the two legs.
    pub p4: FourMomentum,
    /// Upstream collection indices of the two legs.
    pub idxs: (usize, usize),
    /// Position of leg 1 in the jet list.
    pub ijet1: usize,
    /// Position of leg 2 in the jet list.
    pub ijet2: usize,
    // The nine per-pair b-tag combinations (leg1 tier, leg2 tier).
    pub btag_ll: bool,
    pub btag_lm: bool,
    pub btag_lt: bool,
    pub btag_ml: bool,
    pub btag_mm: bool,
    pub btag_mt: bool,
    pub btag_tl: bool,
    pub btag_tm: bool,
    pub btag_tt: bool,
    /// Sum of the first named discriminant over both legs.
    pub sum_csv: f64,
    /// Sum of the second named discriminant over both legs.
    pub sum_jp: f64,
    pub dr_j_j: f64,
    pub dphi_j_j: f64,
    pub gen_matched_bb_partons: bool,
    pub gen_matched_bb_hadrons: bool,
    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dpt_over_pt: f64,
    // Order-symmetric hadron-flavor pair classification.
    pub gen_bb: bool,
    pub gen_bc: bool,
    pub gen_bl: bool,
    pub gen_cc: bool,
    pub gen_cl: bool,
    pub gen_ll: bool,
}
