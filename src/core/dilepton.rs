//! Lepton-pair composites, with and without the MET leg.

use serde::Serialize;

use crate::core::fourvec::FourMomentum;
use crate::wp::LepId;

/// An unordered pair of preselected leptons. Leg 1 is the earlier lepton
/// in the pT-sorted list.
#[derive(Debug, Clone, Serialize)]
pub struct Dilepton {
    /// Combined four-momentum of the two legs.
    pub p4: FourMomentum,
    /// Upstream collection indices of the two legs.
    pub idxs: (usize, usize),
    /// Position of leg 1 in the lepton list.
    pub ilep1: usize,
    /// Position of leg 2 in the lepton list.
    pub ilep2: usize,
    /// Opposite-charge pair.
    pub is_os: bool,
    pub is_mumu: bool,
    pub is_elel: bool,
    pub is_elmu: bool,
    pub is_muel: bool,
    /// Same-flavor pair.
    pub is_sf: bool,
    // Per-pair ID-tier combinations (leg1 tier, leg2 tier). Independent
    // booleans, not a hierarchy.
    pub id_ll: bool,
    pub id_lt: bool,
    pub id_tl: bool,
    pub id_tt: bool,
    // Per-pair isolation-tier combinations.
    pub iso_ll: bool,
    pub iso_lt: bool,
    pub iso_tl: bool,
    pub iso_tt: bool,
    pub dr_l_l: f64,
    pub dphi_l_l: f64,
    /// Online-object indices the two legs matched to, when trigger
    /// matching ran (i.e. the event recorded at least one path).
    pub hlt_idx1: Option<usize>,
    pub hlt_idx2: Option<usize>,
    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dpt_over_pt: f64,
}

impl Dilepton {
    /// The pair-level ID flag for an ordered combination of tiers.
    #[must_use]
    pub fn id_combination(&self, id1: LepId, id2: LepId) -> bool {
        match (id1, id2) {
            (LepId::Loose, LepId::Loose) => self.id_ll,
            (LepId::Loose, LepId::Tight) => self.id_lt,
            (LepId::Tight, LepId::Loose) => self.id_tl,
            (LepId::Tight, LepId::Tight) => self.id_tt,
        }
    }
}

/// A dilepton combined with the event MET.
///
/// The pair content is carried verbatim in `dilepton`; fields here are
/// the MET-leg additions.
#[derive(Debug, Clone, Serialize)]
pub struct DileptonMet {
    /// Combined four-momentum of both leptons and the MET.
    pub p4: FourMomentum,
    /// The lepton-pair content, copied unchanged.
    pub dilepton: Dilepton,
    /// Position of the source pair in the dilepton list.
    pub ill: usize,
    /// Position of the MET in the MET list.
    pub imet: usize,
    pub is_no_hf: bool,
    pub dphi_ll_met: f64,
    pub min_dphi_l_met: f64,
    pub max_dphi_l_met: f64,
    /// Invariant mass of the dilepton+MET four-vector sum.
    pub mt: f64,
    /// Closed-form transverse mass, kept alongside `mt` for
    /// cross-validation.
    pub mt_formula: f64,
    /// MET pT projected onto the direction transverse to the nearest
    /// lepton when that lepton is within a quarter turn.
    pub projected_met: f64,
    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dphi: f64,
    pub gen_dpt_over_pt: f64,
}
