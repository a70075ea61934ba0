//! Preselected jets with identification, b-tagging, and flavor-truth
//! flags.

use serde::Serialize;

use crate::core::fourvec::FourMomentum;
use crate::wp::{BtagWp, JetId};

/// A preselected jet. Builder order is preserved from the upstream
/// (pT-sorted) collection; several invariants downstream rely on it.
#[derive(Debug, Clone, Serialize)]
pub struct Jet {
    pub p4: FourMomentum,
    /// Index into the upstream jet collection.
    pub idx: usize,
    pub id_l: bool,
    pub id_t: bool,
    pub id_tlv: bool,
    /// First named discriminant value.
    pub csv: f64,
    /// Second named discriminant value.
    pub jp: f64,
    pub btag_l: bool,
    pub btag_m: bool,
    pub btag_t: bool,
    /// Parton-flavor truth says b.
    pub gen_matched_b_parton: bool,
    /// Hadron-flavor truth says b.
    pub gen_matched_b_hadron: bool,
    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dpt_over_pt: f64,
    // Mutually exclusive hadron-flavor classification.
    pub gen_b: bool,
    pub gen_c: bool,
    pub gen_light: bool,
}

impl Jet {
    /// Whether this jet passes the given identification tier. The `None`
    /// tier imposes no requirement.
    #[must_use]
    pub fn passes_id(&self, id: JetId) -> bool {
        match id {
            JetId::Loose => self.id_l,
            JetId::Tight => self.id_t,
            JetId::TightLeptonVeto => self.id_tlv,
            JetId::None => true,
        }
    }

    /// Whether this jet passes the given b-tag working point. The `None`
    /// tier imposes no requirement.
    #[must_use]
    pub fn passes_btag(&self, wp: BtagWp) -> bool {
        match wp {
            BtagWp::None => true,
            BtagWp::Loose => self.btag_l,
            BtagWp::Medium => self.btag_m,
            BtagWp::Tight => self.btag_t,
        }
    }
}
