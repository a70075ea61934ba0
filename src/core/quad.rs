//! The full dilepton+MET+dijet candidate.

use serde::Serialize;

use crate::core::dijet::Dijet;
use crate::core::dilepton::DileptonMet;
use crate::core::fourvec::FourMomentum;

/// A four-body candidate: one dilepton+MET composite crossed with one
/// dijet.
///
/// The source composites are carried verbatim in `llmet` and `jj`;
/// fields here are quantities first defined at this level, plus the
/// per-leg four-momenta for convenient downstream access. Candidates
/// whose smallest lepton-jet separation falls below the configured
/// threshold are never constructed into the output collection.
#[derive(Debug, Clone, Serialize)]
pub struct DileptonMetDijet {
    /// Combined four-momentum of both leptons, both jets, and the MET.
    pub p4: FourMomentum,
    /// Position of the source composite in the dilepton+MET list.
    pub illmet: usize,
    /// Position of the source pair in the dijet list.
    pub ijj: usize,
    /// The dilepton+MET content, copied unchanged.
    pub llmet: DileptonMet,
    /// The dijet content, copied unchanged.
    pub jj: Dijet,

    // Per-leg four-momenta.
    pub lep1_p4: FourMomentum,
    pub lep2_p4: FourMomentum,
    pub jet1_p4: FourMomentum,
    pub jet2_p4: FourMomentum,
    pub met_p4: FourMomentum,
    pub ll_p4: FourMomentum,
    pub jj_p4: FourMomentum,
    pub lljj_p4: FourMomentum,

    // Generator-truth twins of the per-leg four-momenta.
    pub gen_lep1_p4: FourMomentum,
    pub gen_lep2_p4: FourMomentum,
    pub gen_jet1_p4: FourMomentum,
    pub gen_jet2_p4: FourMomentum,
    pub gen_met_p4: FourMomentum,
    pub gen_ll_p4: FourMomentum,
    pub gen_jj_p4: FourMomentum,
    pub gen_lljj_p4: FourMomentum,

    // Dijet-MET quantities; first computed here, there is no
    // intermediate dijet+MET collection.
    pub dphi_jj_met: f64,
    pub min_dphi_j_met: f64,
    pub max_dphi_j_met: f64,

    // Lepton-jet topology.
    pub min_dr_l_j: f64,
    pub max_dr_l_j: f64,
    pub dr_ll_jj: f64,
    pub dphi_ll_jj: f64,
    pub dr_llmet_jj: f64,
    pub dphi_llmet_jj: f64,

    /// |cos theta*| of the dilepton+MET system in the Collins-Soper
    /// frame of the full candidate.
    pub cos_theta_star_cs: f64,
    /// Transverse mass of the full-candidate four-vector.
    pub mt_fullsystem: f64,

    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dphi: f64,
    pub gen_dpt_over_pt: f64,
}
