//! The per-event engine: object builders, composite builders, and the
//! combinatorial index-table fills.
//!
//! One [`Pipeline::run`] call processes one event start to finish:
//! leptons, jets, and MET are built first, then the pairwise composites,
//! then the full four-body candidates; each stage's index table is
//! rebuilt from the freshly built composites. The four-body table is
//! assembled as a join over the dilepton+MET and dijet tables rather
//! than by direct combinatorial expansion. Empty inputs degrade to empty
//! outputs at every stage.

use std::collections::HashMap;

use itertools::iproduct;
use serde::Serialize;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::core::dijet::Dijet;
use crate::core::dilepton::{Dilepton, DileptonMet};
use crate::core::fourvec::{cos_theta_star_cs, FourMomentum};
use crate::core::jet::Jet;
use crate::core::lepton::{Lepton, LeptonFlavor};
use crate::core::met::Met;
use crate::core::quad::DileptonMetDijet;
use crate::core::{SENTINEL_DPHI, SENTINEL_DPT_OVER_PT, SENTINEL_DR};
use crate::event::EventRecord;
use crate::index::IndexTable;
use crate::truth::{self, GenSummary};
use crate::wp::{
    BtagWp, DijetKey, DilepKey, JetId, JetKey, LepId, LepIso, LepKey, PairRank, QuadKey,
};

/// Selected-object multiplicities for one event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Counts {
    pub n_jets: usize,
    /// Jets passing loose ID.
    pub n_jets_l: usize,
    /// Loose-ID jets per b-tag tier.
    pub n_bjets_l: usize,
    pub n_bjets_m: usize,
    pub n_bjets_t: usize,
    pub n_muons: usize,
    pub n_muons_l: usize,
    pub n_muons_t: usize,
    pub n_electrons: usize,
    pub n_electrons_l: usize,
    pub n_electrons_t: usize,
    pub n_leptons: usize,
    pub n_leptons_l: usize,
    pub n_leptons_t: usize,
}

/// Everything one event produces: the six composite collections, their
/// index tables, the fixed convenience slices, and the multiplicity
/// counters. Downstream consumers read this after the build completes.
#[derive(Debug, Clone, Serialize)]
pub struct EventCandidates {
    /// Upstream indices of electrons passing preselection.
    pub electrons: Vec<usize>,
    /// Upstream indices of muons passing preselection.
    pub muons: Vec<usize>,
    pub leptons: Vec<Lepton>,
    pub dileptons: Vec<Dilepton>,
    pub met: Vec<Met>,
    pub dilepton_met: Vec<DileptonMet>,
    pub jets: Vec<Jet>,
    pub dijets: Vec<Dijet>,
    pub quads: Vec<DileptonMetDijet>,

    pub lepton_table: IndexTable<LepKey>,
    pub dilepton_table: IndexTable<DilepKey>,
    pub dilepton_met_table: IndexTable<DilepKey>,
    pub jet_table: IndexTable<JetKey>,
    pub dijet_table: IndexTable<DijetKey>,
    pub quad_table: IndexTable<QuadKey>,

    // Fixed convenience slices: all-tight leptons and jets, with and
    // without a loose b-tag on both legs, under three rankings.
    pub all_tight_btag_l_ht: Vec<DileptonMetDijet>,
    pub all_tight_btag_l_pt: Vec<DileptonMetDijet>,
    pub all_tight_btag_l_csv: Vec<DileptonMetDijet>,
    pub all_tight_nobtag_ht: Vec<DileptonMetDijet>,
    pub all_tight_nobtag_pt: Vec<DileptonMetDijet>,
    pub all_tight_nobtag_csv: Vec<DileptonMetDijet>,

    pub counts: Counts,

    /// Generator-truth bolt-on; present for simulation only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truth: Option<GenSummary>,
}

/// The per-event candidate builder. Holds only the immutable
/// configuration; all per-event state lives in [`EventCandidates`].
pub struct Pipeline<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Build every collection, table, and counter for one event.
    #[must_use]
    pub fn run(&self, event: &EventRecord) -> EventCandidates {
        let (electrons, muons, mut leptons) = self.build_leptons(event);
        let lepton_table = self.fill_lepton_table(&leptons);

        let dileptons = self.build_dileptons(&mut leptons, event);
        let dilepton_table = self.fill_dilepton_table(&dileptons, &leptons);

        let met = self.build_met(event);
        let dilepton_met = self.build_dilepton_met(&dileptons, &met, &leptons);
        // A single MET instance keeps the dilepton and dilepton+MET
        // collections index-synchronized, so the table carries over.
        let dilepton_met_table = dilepton_table.clone();

        let jets = self.build_jets(event);
        let jet_table = self.fill_jet_table(&jets);

        let dijets = self.build_dijets(&jets);
        let dijet_table = self.fill_dijet_table(&dijets, &jets);

        let quads = self.build_quads(&dilepton_met, &dijets, &dileptons, &met, &leptons, &jets);
        let quad_table = self.fill_quad_table(&quads, &dilepton_met_table, &dijet_table);

        let counts = self.count_objects(&leptons, &jets, &electrons, &muons);
        let truth = if event.is_real_data {
            None
        } else {
            Some(truth::summarize(event))
        };

        debug!(
            n_leptons = leptons.len(),
            n_jets = jets.len(),
            n_dileptons = dileptons.len(),
            n_dijets = dijets.len(),
            n_quads = quads.len(),
            quad_cells = quad_table.occupancy(),
            "built event candidates"
        );

        let accessor = |btag: BtagWp, rank: PairRank| {
            let key = QuadKey {
                lep1_id: LepId::Tight,
                lep1_iso: LepIso::Tight,
                lep2_id: LepId::Tight,
                lep2_iso: LepIso::Tight,
                jet1_id: JetId::Tight,
                jet2_id: JetId::Tight,
                btag1: btag,
                btag2: btag,
                rank,
            };
            quad_table
                .get(key)
                .iter()
                .map(|&iq| quads[iq].clone())
                .collect::<Vec<_>>()
        };
        let all_tight_btag_l_ht = accessor(BtagWp::Loose, PairRank::Ht);
        let all_tight_btag_l_pt = accessor(BtagWp::Loose, PairRank::Pt);
        let all_tight_btag_l_csv = accessor(BtagWp::Loose, PairRank::SumCsv);
        let all_tight_nobtag_ht = accessor(BtagWp::None, PairRank::Ht);
        let all_tight_nobtag_pt = accessor(BtagWp::None, PairRank::Pt);
        let all_tight_nobtag_csv = accessor(BtagWp::None, PairRank::SumCsv);

        EventCandidates {
            electrons,
            muons,
            leptons,
            dileptons,
            met,
            dilepton_met,
            jets,
            dijets,
            quads,
            lepton_table,
            dilepton_table,
            dilepton_met_table,
            jet_table,
            dijet_table,
            quad_table,
            all_tight_btag_l_ht,
            all_tight_btag_l_pt,
            all_tight_btag_l_csv,
            all_tight_nobtag_ht,
            all_tight_nobtag_pt,
            all_tight_nobtag_csv,
            counts,
            truth,
        }
    }

    /// Preselect electrons and muons, then merge into one pT-sorted
    /// lepton list. Returns the accepted upstream indices per flavor and
    /// the merged list.
    fn build_leptons(&self, event: &EventRecord) -> (Vec<usize>, Vec<usize>, Vec<Lepton>) {
        let cfg = self.config;
        let mut electrons = Vec::new();
        let mut muons = Vec::new();
        let mut leptons = Vec::new();

        for (iele, ele) in event.electrons.iter().enumerate() {
            if ele.p4.pt() <= cfg.subleading_electron_pt_cut
                || ele.p4.eta().abs() >= cfg.electron_eta_cut
            {
                continue;
            }
            electrons.push(iele);
            let (iso_cut_loose, iso_cut_tight) = if ele.is_eb {
                (cfg.electron_iso_cut_eb_loose, cfg.electron_iso_cut_eb_tight)
            } else {
                (cfg.electron_iso_cut_ee_loose, cfg.electron_iso_cut_ee_tight)
            };
            let gen_matched = ele.gen_matched;
            let gen_p4 = if gen_matched {
                ele.gen_p4
            } else {
                FourMomentum::ZERO
            };
            leptons.push(Lepton {
                p4: ele.p4,
                charge: ele.charge,
                idx: iele,
                flavor: LeptonFlavor::Electron,
                id_l: ele.id(&cfg.electron_loose_wp_name),
                id_t: ele.id(&cfg.electron_tight_wp_name),
                iso_l: ele.relative_iso < iso_cut_loose,
                iso_t: ele.relative_iso < iso_cut_tight,
                gen_matched,
                gen_p4,
                gen_dr: if gen_matched {
                    ele.p4.delta_r(&gen_p4)
                } else {
                    SENTINEL_DR
                },
                gen_dpt_over_pt: if gen_matched {
                    (ele.p4.pt() - gen_p4.pt()) / ele.p4.pt()
                } else {
                    SENTINEL_DPT_OVER_PT
                },
                trigger_match: None,
            });
        }

        for (imu, mu) in event.muons.iter().enumerate() {
            if mu.p4.pt() <= cfg.subleading_muon_pt_cut
                || mu.p4.eta().abs() >= cfg.muon_eta_cut
            {
                continue;
            }
            muons.push(imu);
            let gen_matched = mu.gen_matched;
            let gen_p4 = if gen_matched {
                mu.gen_p4
            } else {
                FourMomentum::ZERO
            };
            leptons.push(Lepton {
                p4: mu.p4,
                charge: mu.charge,
                idx: imu,
                flavor: LeptonFlavor::Muon,
                id_l: mu.is_loose,
                id_t: mu.is_tight,
                iso_l: mu.relative_iso < cfg.muon_loose_iso_cut,
                iso_t: mu.relative_iso < cfg.muon_tight_iso_cut,
                gen_matched,
                gen_p4,
                gen_dr: if gen_matched {
                    mu.p4.delta_r(&gen_p4)
                } else {
                    SENTINEL_DR
                },
                gen_dpt_over_pt: if gen_matched {
                    (mu.p4.pt() - gen_p4.pt()) / mu.p4.pt()
                } else {
                    SENTINEL_DPT_OVER_PT
                },
                trigger_match: None,
            });
        }

        // One flavor-agnostic sort; composite leg order depends on it.
        leptons.sort_by(|a, b| b.p4.pt().total_cmp(&a.p4.pt()));

        (electrons, muons, leptons)
    }

    fn fill_lepton_table(&self, leptons: &[Lepton]) -> IndexTable<LepKey> {
        let mut table = IndexTable::new();
        for (ilep, lepton) in leptons.iter().enumerate() {
            for (id, iso) in iproduct!(LepId::ALL, LepIso::ALL) {
                if lepton.passes_id(id) && lepton.passes_iso(iso) {
                    table.push(LepKey { id, iso }, ilep);
                }
            }
        }
        table
    }

    /// Pair every lepton passing its flavor's leading-pT cut with every
    /// later lepton in the sorted list. Only the first leg is held to
    /// the leading cut; the second leg may be any preselected lepton.
    fn build_dileptons(&self, leptons: &mut [Lepton], event: &EventRecord) -> Vec<Dilepton> {
        let cfg = self.config;
        let mut dileptons = Vec::new();

        for ilep1 in 0..leptons.len() {
            let leading_cut = match leptons[ilep1].flavor {
                LeptonFlavor::Muon => cfg.leading_muon_pt_cut,
                LeptonFlavor::Electron => cfg.leading_electron_pt_cut,
            };
            if leptons[ilep1].p4.pt() < leading_cut {
                continue;
            }
            for ilep2 in ilep1 + 1..leptons.len() {
                // Trigger matching is attempted only when the event
                // recorded at least one path; results are cached on the
                // lepton.
                let (hlt_idx1, hlt_idx2) = if event.trigger.paths.is_empty() {
                    (None, None)
                } else {
                    let m1 = leptons[ilep1].ensure_trigger_match(
                        &event.trigger,
                        cfg.hlt_dr_cut,
                        cfg.hlt_dpt_over_pt_cut,
                    );
                    let m2 = leptons[ilep2].ensure_trigger_match(
                        &event.trigger,
                        cfg.hlt_dr_cut,
                        cfg.hlt_dpt_over_pt_cut,
                    );
                    (m1.index, m2.index)
                };

                let l1 = &leptons[ilep1];
                let l2 = &leptons[ilep2];
                let p4 = l1.p4 + l2.p4;
                let gen_matched = l1.gen_matched && l2.gen_matched;
                let gen_p4 = if gen_matched {
                    l1.gen_p4 + l2.gen_p4
                } else {
                    FourMomentum::ZERO
                };
                dileptons.push(Dilepton {
                    p4,
                    idxs: (l1.idx, l2.idx),
                    ilep1,
                    ilep2,
                    is_os: l1.charge * l2.charge < 0,
                    is_mumu: l1.is_muon() && l2.is_muon(),
                    is_elel: l1.is_electron() && l2.is_electron(),
                    is_elmu: l1.is_electron() && l2.is_muon(),
                    is_muel: l1.is_muon() && l2.is_electron(),
                    is_sf: l1.flavor == l2.flavor,
                    id_ll: l1.id_l && l2.id_l,
                    id_lt: l1.id_l && l2.id_t,
                    id_tl: l1.id_t && l2.id_l,
                    id_tt: l1.id_t && l2.id_t,
                    iso_ll: l1.iso_l && l2.iso_l,
                    iso_lt: l1.iso_l && l2.iso_t,
                    iso_tl: l1.iso_t && l2.iso_l,
                    iso_tt: l1.iso_t && l2.iso_t,
                    dr_l_l: l1.p4.delta_r(&l2.p4),
                    dphi_l_l: l1.p4.delta_phi(&l2.p4).abs(),
                    hlt_idx1,
                    hlt_idx2,
                    gen_matched,
                    gen_p4,
                    gen_dr: if gen_matched {
                        p4.delta_r(&gen_p4)
                    } else {
                        SENTINEL_DR
                    },
                    gen_dpt_over_pt: if gen_matched {
                        (p4.pt() - gen_p4.pt()) / p4.pt()
                    } else {
                        SENTINEL_DPT_OVER_PT
                    },
                });
            }
        }
        dileptons
    }

    /// A pair lands in cell (id1, iso1, id2, iso2) when its pair-level
    /// ID combination holds and each leg passes its isolation tier.
    fn fill_dilepton_table(
        &self,
        dileptons: &[Dilepton],
        leptons: &[Lepton],
    ) -> IndexTable<DilepKey> {
        let mut table = IndexTable::new();
        for (ill, pair) in dileptons.iter().enumerate() {
            let l1 = &leptons[pair.ilep1];
            let l2 = &leptons[pair.ilep2];
            for (id1, id2) in iproduct!(LepId::ALL, LepId::ALL) {
                if !pair.id_combination(id1, id2) {
                    continue;
                }
                for (iso1, iso2) in iproduct!(LepIso::ALL, LepIso::ALL) {
                    if l1.passes_iso(iso1) && l2.passes_iso(iso2) {
                        table.push(
                            DilepKey {
                                id1,
                                iso1,
                                id2,
                                iso2,
                            },
                            ill,
                        );
                    }
                }
            }
        }
        table
    }

    /// Build the single MET instance. On simulation, the true MET is
    /// assembled from the final-state neutrinos in the generator record.
    fn build_met(&self, event: &EventRecord) -> Vec<Met> {
        let mut met = Met {
            p4: event.met,
            is_no_hf: false,
            gen_matched: false,
            gen_p4: FourMomentum::ZERO,
            gen_dr: SENTINEL_DR,
            gen_dphi: SENTINEL_DPHI,
            gen_dpt_over_pt: SENTINEL_DPT_OVER_PT,
        };
        if !event.is_real_data {
            for particle in &event.gen_particles {
                if !particle.is_last_copy() {
                    continue;
                }
                if particle.is_neutrino() {
                    met.gen_matched = true;
                    met.gen_p4 += particle.p4;
                }
            }
            if met.gen_matched {
                met.gen_dr = met.p4.delta_r(&met.gen_p4);
                met.gen_dphi = met.p4.delta_phi(&met.gen_p4).abs();
                met.gen_dpt_over_pt = (met.p4.pt() - met.gen_p4.pt()) / met.p4.pt();
            }
        }
        vec![met]
    }

    /// Cross the dilepton list with the MET list (currently size one),
    /// computing the MET-leg derived quantities. No filtering here.
    fn build_dilepton_met(
        &self,
        dileptons: &[Dilepton],
        mets: &[Met],
        leptons: &[Lepton],
    ) -> Vec<DileptonMet> {
        let mut out = Vec::with_capacity(dileptons.len() * mets.len());
        for (imet, met) in mets.iter().enumerate() {
            for (ill, ll) in dileptons.iter().enumerate() {
                let p4 = ll.p4 + met.p4;
                let dphi = ll.p4.delta_phi(&met.p4).abs();
                let dphi1 = leptons[ll.ilep1].p4.delta_phi(&met.p4).abs();
                let dphi2 = leptons[ll.ilep2].p4.delta_phi(&met.p4).abs();
                let min_dphi = dphi1.min(dphi2);
                let max_dphi = dphi1.max(dphi2);
                let gen_matched = ll.gen_matched && met.gen_matched;
                let gen_p4 = if gen_matched {
                    ll.gen_p4 + met.gen_p4
                } else {
                    FourMomentum::ZERO
                };
                out.push(DileptonMet {
                    p4,
                    dilepton: ll.clone(),
                    ill,
                    imet,
                    is_no_hf: met.is_no_hf,
                    dphi_ll_met: dphi,
                    min_dphi_l_met: min_dphi,
                    max_dphi_l_met: max_dphi,
                    mt: p4.mass(),
                    mt_formula: (2.0 * ll.p4.pt() * met.p4.pt() * (1.0 - dphi.cos()))
                        .sqrt(),
                    projected_met: if min_dphi >= std::f64::consts::PI {
                        met.p4.pt()
                    } else {
                        met.p4.pt() * min_dphi.sin()
                    },
                    gen_matched,
                    gen_p4,
                    gen_dr: if gen_matched {
                        p4.delta_r(&gen_p4)
                    } else {
                        SENTINEL_DR
                    },
                    gen_dphi: if gen_matched {
                        p4.delta_phi(&gen_p4).abs()
                    } else {
                        SENTINEL_DPHI
                    },
                    gen_dpt_over_pt: if gen_matched {
                        (p4.pt() - gen_p4.pt()) / p4.pt()
                    } else {
                        SENTINEL_DPT_OVER_PT
                    },
                });
            }
        }
        out
    }

    /// Preselect jets, preserving upstream (pT-sorted) order.
    fn build_jets(&self, event: &EventRecord) -> Vec<Jet> {
        let cfg = self.config;
        let mut jets = Vec::new();
        for (ijet, jet) in event.jets.iter().enumerate() {
            if jet.p4.pt() <= cfg.jet_pt_cut || jet.p4.eta().abs() >= cfg.jet_eta_cut {
                continue;
            }
            let discr = jet.discriminant(&cfg.btag_discriminant_name);
            let gen_matched = jet.gen_matched;
            let gen_p4 = if gen_matched {
                jet.gen_p4
            } else {
                FourMomentum::ZERO
            };
            jets.push(Jet {
                p4: jet.p4,
                idx: ijet,
                id_l: jet.pass_loose_id,
                id_t: jet.pass_tight_id,
                id_tlv: jet.pass_tight_lepton_veto_id,
                csv: jet.discriminant(&cfg.csv_discriminant_name),
                jp: jet.discriminant(&cfg.jp_discriminant_name),
                btag_l: discr > cfg.btag_cut_loose,
                btag_m: discr > cfg.btag_cut_medium,
                btag_t: discr > cfg.btag_cut_tight,
                gen_matched_b_parton: jet.parton_flavor == 5,
                gen_matched_b_hadron: jet.hadron_flavor == 5,
                gen_matched,
                gen_p4,
                gen_dr: if gen_matched {
                    jet.p4.delta_r(&gen_p4)
                } else {
                    SENTINEL_DR
                },
                gen_dpt_over_pt: if gen_matched {
                    (jet.p4.pt() - gen_p4.pt()) / jet.p4.pt()
                } else {
                    SENTINEL_DPT_OVER_PT
                },
                gen_b: jet.hadron_flavor == 5,
                gen_c: jet.hadron_flavor == 4,
                gen_light: jet.hadron_flavor < 4,
            });
        }
        jets
    }

    fn fill_jet_table(&self, jets: &[Jet]) -> IndexTable<JetKey> {
        let mut table = IndexTable::new();
        for (ijet, jet) in jets.iter().enumerate() {
            for (id, btag) in iproduct!(JetId::ALL, BtagWp::ALL) {
                if jet.passes_id(id) && jet.passes_btag(btag) {
                    table.push(JetKey { id, btag }, ijet);
                }
            }
        }
        table
    }

    /// Pair every jet with every later jet, in builder order: entry 0 of
    /// any table cell is built from the leading jets. Do not reorder
    /// these loops.
    fn build_dijets(&self, jets: &[Jet]) -> Vec<Dijet> {
        let mut dijets = Vec::new();
        for ijet1 in 0..jets.len() {
            for ijet2 in ijet1 + 1..jets.len() {
                let j1 = &jets[ijet1];
                let j2 = &jets[ijet2];
                let p4 = j1.p4 + j2.p4;
                let gen_matched = j1.gen_matched && j2.gen_matched;
                let gen_p4 = if gen_matched {
                    j1.gen_p4 + j2.gen_p4
                } else {
                    FourMomentum::ZERO
                };
                dijets.push(Dijet {
                    p4,
                    idxs: (j1.idx, j2.idx),
                    ijet1,
                    ijet2,
                    btag_ll: j1.btag_l && j2.btag_l,
                    btag_lm: j1.btag_l && j2.btag_m,
                    btag_lt: j1.btag_l && j2.btag_t,
                    btag_ml: j1.btag_m && j2.btag_l,
                    btag_mm: j1.btag_m && j2.btag_m,
                    btag_mt: j1.btag_m && j2.btag_t,
                    btag_tl: j1.btag_t && j2.btag_l,
                    btag_tm: j1.btag_t && j2.btag_m,
                    btag_tt: j1.btag_t && j2.btag_t,
                    sum_csv: j1.csv + j2.csv,
                    sum_jp: j1.jp + j2.jp,
                    dr_j_j: j1.p4.delta_r(&j2.p4),
                    dphi_j_j: j1.p4.delta_phi(&j2.p4).abs(),
                    gen_matched_bb_partons: j1.gen_matched_b_parton && j2.gen_matched_b_parton,
                    gen_matched_bb_hadrons: j1.gen_matched_b_hadron && j2.gen_matched_b_hadron,
                    gen_matched,
                    gen_p4,
                    gen_dr: if gen_matched {
                        p4.delta_r(&gen_p4)
                    } else {
                        SENTINEL_DR
                    },
                    gen_dpt_over_pt: if gen_matched {
                        (p4.pt() - gen_p4.pt()) / p4.pt()
                    } else {
                        SENTINEL_DPT_OVER_PT
                    },
                    gen_bb: j1.gen_b && j2.gen_b,
                    gen_bc: (j1.gen_b && j2.gen_c) || (j1.gen_c && j2.gen_b),
                    gen_bl: (j1.gen_b && j2.gen_light) || (j1.gen_light && j2.gen_b),
                    gen_cc: j1.gen_c && j2.gen_c,
                    gen_cl: (j1.gen_c && j2.gen_light) || (j1.gen_light && j2.gen_c),
                    gen_ll: j1.gen_light && j2.gen_light,
                });
            }
        }
        dijets
    }

    /// Fill the baseline (construction-order) dijet cells, then derive
    /// the five re-ranked slices of every cell.
    fn fill_dijet_table(&self, dijets: &[Dijet], jets: &[Jet]) -> IndexTable<DijetKey> {
        let mut table = IndexTable::new();

        // Baseline: a pair lands in (id1, id2, b1, b2) when each leg
        // passes its tier; insertion order equals construction order,
        // which is the Ht ranking.
        for (ijj, pair) in dijets.iter().enumerate() {
            let j1 = &jets[pair.ijet1];
            let j2 = &jets[pair.ijet2];
            for (id1, id2) in iproduct!(JetId::ALL, JetId::ALL) {
                if !j1.passes_id(id1) || !j2.passes_id(id2) {
                    continue;
                }
                for (btag1, btag2) in iproduct!(BtagWp::ALL, BtagWp::ALL) {
                    if j1.passes_btag(btag1) && j2.passes_btag(btag2) {
                        table.push(
                            DijetKey {
                                id1,
                                id2,
                                btag1,
                                btag2,
                                rank: PairRank::Ht,
                            },
                            ijj,
                        );
                    }
                }
            }
        }

        // Re-ranked slices: same index sets, stable-sorted copies. Ties
        // keep the baseline order.
        let target_mass = self.config.target_dijet_mass;
        for (id1, id2, btag1, btag2) in
            iproduct!(JetId::ALL, JetId::ALL, BtagWp::ALL, BtagWp::ALL)
        {
            let base_key = DijetKey {
                id1,
                id2,
                btag1,
                btag2,
                rank: PairRank::Ht,
            };
            let baseline = table.get(base_key).to_vec();
            for rank in [
                PairRank::Mh,
                PairRank::Pt,
                PairRank::SumCsv,
                PairRank::SumJp,
                PairRank::PtOverM,
            ] {
                let mut slice = baseline.clone();
                match rank {
                    PairRank::Mh => slice.sort_by(|&a, &b| {
                        (dijets[a].p4.mass() - target_mass)
                            .abs()
                            .total_cmp(&(dijets[b].p4.mass() - target_mass).abs())
                    }),
                    PairRank::Pt => slice.sort_by(|&a, &b| {
                        dijets[b].p4.pt().total_cmp(&dijets[a].p4.pt())
                    }),
                    PairRank::SumCsv => slice.sort_by(|&a, &b| {
                        dijets[b].sum_csv.total_cmp(&dijets[a].sum_csv)
                    }),
                    PairRank::SumJp => slice.sort_by(|&a, &b| {
                        dijets[b].sum_jp.total_cmp(&dijets[a].sum_jp)
                    }),
                    PairRank::PtOverM => slice.sort_by(|&a, &b| {
                        (dijets[b].p4.pt() / dijets[b].p4.mass())
                            .total_cmp(&(dijets[a].p4.pt() / dijets[a].p4.mass()))
                    }),
                    PairRank::Ht => unreachable!(),
                }
                table.set(base_key.with_rank(rank), slice);
            }
        }

        table
    }

    /// Cross every dilepton+MET composite with every dijet, computing
    /// the full derived set, then apply the minimum lepton-jet
    /// separation veto as the final acceptance step.
    #[allow(clippy::too_many_lines)]
    fn build_quads(
        &self,
        dilepton_met: &[DileptonMet],
        dijets: &[Dijet],
        dileptons: &[Dilepton],
        mets: &[Met],
        leptons: &[Lepton],
        jets: &[Jet],
    ) -> Vec<DileptonMetDijet> {
        let cfg = self.config;
        let mut quads = Vec::new();
        for (illmet, llmet) in dilepton_met.iter().enumerate() {
            let ll = &dileptons[llmet.ill];
            let met = &mets[llmet.imet];
            let l1 = &leptons[ll.ilep1];
            let l2 = &leptons[ll.ilep2];
            for (ijj, jj) in dijets.iter().enumerate() {
                let j1 = &jets[jj.ijet1];
                let j2 = &jets[jj.ijet2];

                let dr_j1l1 = j1.p4.delta_r(&l1.p4);
                let dr_j1l2 = j1.p4.delta_r(&l2.p4);
                let dr_j2l1 = j2.p4.delta_r(&l1.p4);
                let dr_j2l2 = j2.p4.delta_r(&l2.p4);
                let min_dr_l_j = dr_j1l1.min(dr_j1l2).min(dr_j2l1).min(dr_j2l2);
                let max_dr_l_j = dr_j1l1.max(dr_j1l2).max(dr_j2l1).max(dr_j2l2);

                let p4 = ll.p4 + jj.p4 + met.p4;
                let gen_matched = ll.gen_matched && jj.gen_matched && met.gen_matched;
                let gen_p4 = if gen_matched {
                    ll.gen_p4 + jj.gen_p4 + met.gen_p4
                } else {
                    FourMomentum::ZERO
                };

                let candidate = DileptonMetDijet {
                    p4,
                    illmet,
                    ijj,
                    llmet: llmet.clone(),
                    jj: jj.clone(),
                    lep1_p4: l1.p4,
                    lep2_p4: l2.p4,
                    jet1_p4: j1.p4,
                    jet2_p4: j2.p4,
                    met_p4: met.p4,
                    ll_p4: ll.p4,
                    jj_p4: jj.p4,
                    lljj_p4: ll.p4 + jj.p4,
                    gen_lep1_p4: l1.gen_p4,
                    gen_lep2_p4: l2.gen_p4,
                    gen_jet1_p4: j1.gen_p4,
                    gen_jet2_p4: j2.gen_p4,
                    gen_met_p4: met.gen_p4,
                    gen_ll_p4: ll.gen_p4,
                    gen_jj_p4: jj.gen_p4,
                    gen_lljj_p4: ll.gen_p4 + jj.gen_p4,
                    dphi_jj_met: jj.p4.delta_phi(&met.p4).abs(),
                    min_dphi_j_met: j1
                        .p4
                        .delta_phi(&met.p4)
                        .abs()
                        .min(j2.p4.delta_phi(&met.p4).abs()),
                    max_dphi_j_met: j1
                        .p4
                        .delta_phi(&met.p4)
                        .abs()
                        .max(j2.p4.delta_phi(&met.p4).abs()),
                    min_dr_l_j,
                    max_dr_l_j,
                    dr_ll_jj: ll.p4.delta_r(&jj.p4),
                    dphi_ll_jj: ll.p4.delta_phi(&jj.p4).abs(),
                    dr_llmet_jj: llmet.p4.delta_r(&jj.p4),
                    dphi_llmet_jj: llmet.p4.delta_phi(&jj.p4).abs(),
                    cos_theta_star_cs: cos_theta_star_cs(&llmet.p4, &jj.p4, cfg.beam_energy)
                        .abs(),
                    mt_fullsystem: p4.mt(),
                    gen_matched,
                    gen_p4,
                    gen_dr: if gen_matched {
                        p4.delta_r(&gen_p4)
                    } else {
                        SENTINEL_DR
                    },
                    gen_dphi: if gen_matched {
                        p4.delta_phi(&gen_p4).abs()
                    } else {
                        SENTINEL_DPHI
                    },
                    gen_dpt_over_pt: if gen_matched {
                        (p4.pt() - gen_p4.pt()) / p4.pt()
                    } else {
                        SENTINEL_DPT_OVER_PT
                    },
                };

                // Hard filter, applied last: vetoed candidates are never
                // stored or indexed.
                if candidate.min_dr_l_j < cfg.min_dr_lepton_jet {
                    continue;
                }
                quads.push(candidate);
            }
        }
        quads
    }

    /// Join the dilepton+MET and dijet tables cell by cell. A candidate
    /// appears in a cell exactly when its dilepton+MET index is in the
    /// corresponding dilepton+MET cell and its dijet index is in the
    /// corresponding dijet cell. Candidates are pre-indexed by source
    /// pair, so each cell costs one lookup per slot cross-product entry.
    fn fill_quad_table(
        &self,
        quads: &[DileptonMetDijet],
        dilepton_met_table: &IndexTable<DilepKey>,
        dijet_table: &IndexTable<DijetKey>,
    ) -> IndexTable<QuadKey> {
        let mut by_pair: HashMap<(usize, usize), usize> = HashMap::with_capacity(quads.len());
        for (iq, quad) in quads.iter().enumerate() {
            by_pair.insert((quad.illmet, quad.ijj), iq);
        }

        let mut table = IndexTable::new();
        for ll_key in DilepKey::all() {
            let llmet_slot = dilepton_met_table.get(ll_key);
            if llmet_slot.is_empty() {
                continue;
            }
            for jj_key in DijetKey::all() {
                let jj_slot = dijet_table.get(jj_key);
                if jj_slot.is_empty() {
                    continue;
                }
                let quad_key = QuadKey::from_parts(ll_key, jj_key);
                for &ijj in jj_slot {
                    for &illmet in llmet_slot {
                        if let Some(&iq) = by_pair.get(&(illmet, ijj)) {
                            table.push(quad_key, iq);
                        }
                    }
                }
            }
        }
        table
    }

    fn count_objects(
        &self,
        leptons: &[Lepton],
        jets: &[Jet],
        electrons: &[usize],
        muons: &[usize],
    ) -> Counts {
        let mut counts = Counts {
            n_jets: jets.len(),
            n_muons: muons.len(),
            n_electrons: electrons.len(),
            n_leptons: leptons.len(),
            ..Counts::default()
        };
        for jet in jets {
            if !jet.id_l {
                continue;
            }
            counts.n_jets_l += 1;
            if jet.btag_l {
                counts.n_bjets_l += 1;
            }
            if jet.btag_m {
                counts.n_bjets_m += 1;
            }
            if jet.btag_t {
                counts.n_bjets_t += 1;
            }
        }
        for lepton in leptons {
            if lepton.id_l && lepton.iso_l {
                counts.n_leptons_l += 1;
                if lepton.is_muon() {
                    counts.n_muons_l += 1;
                } else {
                    counts.n_electrons_l += 1;
                }
            }
            if lepton.id_t && lepton.iso_t {
                counts.n_leptons_t += 1;
                if lepton.is_muon() {
                    counts.n_muons_t += 1;
                } else {
                    counts.n_electrons_t += 1;
                }
            }
        }
        counts
    }
}
