//! End-to-end pipeline scenarios.
//!
//! These tests drive the full per-event build through `Pipeline::run`
//! and check the contracts downstream selections rely on: cell
//! membership, table nesting, the separation veto, rank-slice
//! equivalence, and the join between the dilepton+MET and dijet tables.

use std::collections::HashSet;

use llbb_candidates::config::AnalysisConfig;
use llbb_candidates::core::fourvec::FourMomentum;
use llbb_candidates::event::{EventRecord, JetRecord, MuonRecord};
use llbb_candidates::pipeline::Pipeline;
use llbb_candidates::wp::{
    BtagWp, DijetKey, DilepKey, JetId, LepId, LepIso, LepKey, PairRank, QuadKey,
};

fn muon(pt: f64, eta: f64, phi: f64, charge: i32) -> MuonRecord {
    MuonRecord {
        p4: FourMomentum::from_ptetaphim(pt, eta, phi, 0.105),
        charge,
        is_loose: true,
        is_tight: true,
        relative_iso: 0.05,
        gen_matched: false,
        gen_p4: FourMomentum::ZERO,
    }
}

fn jet(config: &AnalysisConfig, pt: f64, eta: f64, phi: f64, discr: f64) -> JetRecord {
    let mut record = JetRecord {
        p4: FourMomentum::from_ptetaphim(pt, eta, phi, 10.0),
        pass_loose_id: true,
        pass_tight_id: true,
        pass_tight_lepton_veto_id: false,
        parton_flavor: 0,
        hadron_flavor: 0,
        ..Default::default()
    };
    record
        .discriminants
        .insert(config.btag_discriminant_name.clone(), discr);
    record
        .discriminants
        .insert(config.jp_discriminant_name.clone(), discr / 2.0);
    record
}

/// The reference scenario: two tight opposite-charge muons, two tight
/// jets well separated from them, loose b-tag on the harder jet only,
/// nonzero MET.
fn reference_event(config: &AnalysisConfig) -> EventRecord {
    EventRecord {
        is_real_data: true,
        muons: vec![muon(40.0, 0.5, 0.0, 1), muon(25.0, -0.5, 0.5, -1)],
        jets: vec![
            jet(config, 60.0, 0.8, 2.8, 0.8), // passes loose (0.605) only
            jet(config, 35.0, -1.2, -2.0, 0.1), // passes nothing
        ],
        met: FourMomentum::new(20.0, 10.0, 0.0, 22.4),
        ..Default::default()
    }
}

/// Test the reference scenario end to end: one composite per level and
/// the expected quad-cell memberships.
#[test]
fn test_reference_scenario_counts_and_cells() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let candidates = pipeline.run(&reference_event(&config));

    assert_eq!(candidates.leptons.len(), 2);
    assert_eq!(candidates.dileptons.len(), 1);
    assert_eq!(candidates.jets.len(), 2);
    assert_eq!(candidates.dijets.len(), 1);
    assert_eq!(candidates.dilepton_met.len(), 1);
    assert_eq!(candidates.quads.len(), 1);
    assert!(candidates.quads[0].min_dr_l_j >= config.min_dr_lepton_jet);

    let all_tight = |btag1, btag2| QuadKey {
        lep1_id: LepId::Tight,
        lep1_iso: LepIso::Tight,
        lep2_id: LepId::Tight,
        lep2_iso: LepIso::Tight,
        jet1_id: JetId::Tight,
        jet2_id: JetId::Tight,
        btag1,
        btag2,
        rank: PairRank::Ht,
    };

    // Loose b-tag on leg 1 only: the candidate is there.
    let cell = candidates
        .quad_table
        .get(all_tight(BtagWp::Loose, BtagWp::None));
    assert_eq!(cell, &[0]);
    // Loose b-tag on both legs: empty.
    assert!(candidates
        .quad_table
        .get(all_tight(BtagWp::Loose, BtagWp::Loose))
        .is_empty());
    // No b-tag requirement at all: the candidate is there.
    assert_eq!(
        candidates
            .quad_table
            .get(all_tight(BtagWp::None, BtagWp::None)),
        &[0]
    );

    // Convenience slices agree with the cells they re-slice.
    assert!(candidates.all_tight_btag_l_ht.is_empty());
    assert_eq!(candidates.all_tight_nobtag_ht.len(), 1);
    assert_eq!(candidates.all_tight_nobtag_pt.len(), 1);
}

/// Test that an event with no accepted lepton degrades to empty
/// collections everywhere, with no error.
#[test]
fn test_zero_leptons_degrades_to_empty() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let event = EventRecord {
        is_real_data: true,
        muons: vec![muon(5.0, 0.5, 0.0, 1)], // below the subleading cut
        jets: vec![
            jet(&config, 60.0, 0.8, 2.8, 0.8),
            jet(&config, 35.0, -1.2, -2.0, 0.1),
        ],
        met: FourMomentum::new(20.0, 10.0, 0.0, 22.4),
        ..Default::default()
    };
    let candidates = pipeline.run(&event);

    assert!(candidates.leptons.is_empty());
    assert!(candidates.dileptons.is_empty());
    assert!(candidates.dilepton_met.is_empty());
    assert!(candidates.quads.is_empty());
    for key in LepKey::all() {
        assert!(candidates.lepton_table.get(key).is_empty());
    }
    for key in DilepKey::all() {
        assert!(candidates.dilepton_table.get(key).is_empty());
    }
    assert_eq!(candidates.quad_table.occupancy(), 0);
    // Jets are still built and indexed.
    assert_eq!(candidates.dijets.len(), 1);
    assert!(candidates.dijet_table.occupancy() > 0);
}

/// Test the separation veto: a jet on top of a lepton kills every
/// candidate using it, in the collection and in every table cell.
#[test]
fn test_min_separation_veto_is_a_hard_filter() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let mut event = reference_event(&config);
    // Drop the second jet onto the leading muon.
    event.jets[1] = jet(&config, 35.0, 0.5, 0.1, 0.1);
    let candidates = pipeline.run(&event);

    assert_eq!(candidates.dijets.len(), 1); // pairing itself is unaffected
    assert!(candidates.quads.is_empty());
    assert_eq!(candidates.quad_table.occupancy(), 0);
}

/// Test nesting monotonicity: membership under a finer isolation tier
/// implies membership under the same ID with no isolation requirement.
#[test]
fn test_lepton_table_nesting_monotonicity() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let mut event = reference_event(&config);
    // A third muon: tight ID but only loosely isolated.
    event.muons.push(MuonRecord {
        relative_iso: 0.20,
        ..muon(30.0, 1.0, 2.0, 1)
    });
    let candidates = pipeline.run(&event);

    for id in LepId::ALL {
        let none: HashSet<_> = candidates
            .lepton_table
            .get(LepKey { id, iso: LepIso::None })
            .iter()
            .copied()
            .collect();
        for iso in [LepIso::Loose, LepIso::Tight] {
            for &ilep in candidates.lepton_table.get(LepKey { id, iso }) {
                assert!(none.contains(&ilep), "({id:?}, {iso:?}) not nested");
            }
        }
    }
}

/// Test the dijet ordering invariant over a larger jet multiplicity:
/// leg 1 always precedes leg 2 in builder order, and the first entry of
/// the unfiltered cell pairs the two leading jets.
#[test]
fn test_dijet_ordering_invariant() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let mut event = reference_event(&config);
    event.jets = vec![
        jet(&config, 90.0, 0.8, 2.8, 0.3),
        jet(&config, 70.0, -1.2, -2.0, 0.7),
        jet(&config, 50.0, 1.5, -1.0, 0.95),
        jet(&config, 30.0, -0.4, 1.8, 0.1),
    ];
    let candidates = pipeline.run(&event);

    assert_eq!(candidates.dijets.len(), 6);
    for pair in &candidates.dijets {
        assert!(pair.ijet1 < pair.ijet2);
    }
    let unfiltered = DijetKey {
        id1: JetId::None,
        id2: JetId::None,
        btag1: BtagWp::None,
        btag2: BtagWp::None,
        rank: PairRank::Ht,
    };
    let slot = candidates.dijet_table.get(unfiltered);
    assert_eq!(slot.len(), 6);
    let first = &candidates.dijets[slot[0]];
    assert_eq!((first.ijet1, first.ijet2), (0, 1));
}

/// Test rank-slice equivalence: every ranking of a cell holds the same
/// index set, only ordered differently.
#[test]
fn test_rank_slices_hold_identical_sets() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let mut event = reference_event(&config);
    event.jets = vec![
        jet(&config, 90.0, 0.8, 2.8, 0.7),
        jet(&config, 70.0, -1.2, -2.0, 0.8),
        jet(&config, 50.0, 1.5, -1.0, 0.95),
    ];
    let candidates = pipeline.run(&event);

    for key in DijetKey::all() {
        if key.rank != PairRank::Ht {
            continue;
        }
        let base: HashSet<_> = candidates.dijet_table.get(key).iter().copied().collect();
        for rank in PairRank::ALL {
            let slice: HashSet<_> = candidates
                .dijet_table
                .get(key.with_rank(rank))
                .iter()
                .copied()
                .collect();
            assert_eq!(slice, base, "cell {key} differs under {rank:?}");
        }
    }
}

/// Test the quad-table join contract on a multi-candidate event: an
/// index appears in a cell exactly when its dilepton+MET index and its
/// dijet index appear in the corresponding source cells.
#[test]
fn test_quad_join_iff_contract() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let mut event = reference_event(&config);
    // Three leptons and three jets: three dileptons, three dijets.
    event.muons.push(muon(22.0, 1.2, 1.8, 1));
    event.jets.push(jet(&config, 30.0, 1.8, -0.9, 0.92));
    let candidates = pipeline.run(&event);

    assert!(candidates.quads.len() > 1);
    for ll_key in DilepKey::all() {
        let llmet_cell: HashSet<_> = candidates
            .dilepton_met_table
            .get(ll_key)
            .iter()
            .copied()
            .collect();
        for jj_key in DijetKey::all() {
            let jj_cell: HashSet<_> = candidates
                .dijet_table
                .get(jj_key)
                .iter()
                .copied()
                .collect();
            let quad_cell: HashSet<_> = candidates
                .quad_table
                .get(QuadKey::from_parts(ll_key, jj_key))
                .iter()
                .copied()
                .collect();
            for (iq, quad) in candidates.quads.iter().enumerate() {
                let expected =
                    llmet_cell.contains(&quad.illmet) && jj_cell.contains(&quad.ijj);
                assert_eq!(
                    quad_cell.contains(&iq),
                    expected,
                    "candidate {iq} in cell ({ll_key}, {jj_key})"
                );
            }
        }
    }
}

/// Test that generator truth is produced for simulation and absent on
/// real data, and that the true MET picks up only last-copy neutrinos.
#[test]
fn test_simulation_truth_and_gen_met() {
    use llbb_candidates::event::{status_bits, GenParticleRecord};

    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let mut event = reference_event(&config);
    event.is_real_data = false;
    event.gen_particles = vec![
        GenParticleRecord {
            p4: FourMomentum::from_ptetaphim(18.0, 0.3, 0.4, 0.0),
            pdg_id: 14,
            status_flags: 1 << status_bits::IS_LAST_COPY,
            mothers: vec![],
        },
        // An earlier copy of the same neutrino: must not be double-counted.
        GenParticleRecord {
            p4: FourMomentum::from_ptetaphim(17.0, 0.3, 0.4, 0.0),
            pdg_id: 14,
            status_flags: 0,
            mothers: vec![],
        },
    ];
    let candidates = pipeline.run(&event);

    assert!(candidates.truth.is_some());
    let met = &candidates.met[0];
    assert!(met.gen_matched);
    assert!((met.gen_p4.pt() - 18.0).abs() < 1e-9);
    assert!(met.gen_dr >= 0.0);

    let mut real = reference_event(&config);
    real.is_real_data = true;
    let candidates = pipeline.run(&real);
    assert!(candidates.truth.is_none());
    assert!(!candidates.met[0].gen_matched);
    assert!((candidates.met[0].gen_dpt_over_pt - (-10.0)).abs() < 1e-12);
}

/// Test that every stored quad candidate carries consistent leg
/// four-momenta: the jet legs come from the jet collection.
#[test]
fn test_quad_leg_momenta_consistency() {
    let config = AnalysisConfig::default();
    let pipeline = Pipeline::new(&config);
    let candidates = pipeline.run(&reference_event(&config));

    let quad = &candidates.quads[0];
    let jj = &candidates.dijets[quad.ijj];
    assert_eq!(quad.jet1_p4, candidates.jets[jj.ijet1].p4);
    assert_eq!(quad.jet2_p4, candidates.jets[jj.ijet2].p4);
    let ll = &candidates.dileptons[quad.llmet.ill];
    assert_eq!(quad.lep1_p4, candidates.leptons[ll.ilep1].p4);
    assert_eq!(quad.lep2_p4, candidates.leptons[ll.ilep2].p4);
    // Combined momenta add up.
    let total = quad.ll_p4 + quad.jj_p4 + quad.met_p4;
    assert!((total.e - quad.p4.e).abs() < 1e-9);
    assert!((quad.mt_fullsystem - quad.p4.mt()).abs() < 1e-12);
}
