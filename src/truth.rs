//! Generator-truth bolt-on: hard-process extraction, FSR recovery, and
//! the matching debug quantities.
//!
//! Simulation only. This block produces auxiliary truth summaries for
//! reconstruction studies; nothing in the candidate indexing depends on
//! it.

use serde::Serialize;

use crate::core::fourvec::FourMomentum;
use crate::event::{status_bits, EventRecord, GenParticleRecord};

/// Truth summary of the hard process for one simulated event.
///
/// Indices refer to the event's generator-particle collection; aggregate
/// four-momenta are null when the corresponding legs were not found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenSummary {
    // Hard-process particle indices, in encounter order.
    pub i_x: Option<usize>,
    pub i_h1: Option<usize>,
    pub i_h2: Option<usize>,
    pub i_v1: Option<usize>,
    pub i_v2: Option<usize>,
    pub i_b1: Option<usize>,
    pub i_b2: Option<usize>,
    pub i_l1: Option<usize>,
    pub i_l2: Option<usize>,
    pub i_nu1: Option<usize>,
    pub i_nu2: Option<usize>,
    /// FSR photons recovered for each charged-lepton leg.
    pub photons_l1: Vec<usize>,
    pub photons_l2: Vec<usize>,
    /// FSR gluons recovered for each b-quark leg.
    pub gluons_b1: Vec<usize>,
    pub gluons_b2: Vec<usize>,

    // Aggregate four-momenta, with and without FSR dressing.
    pub b1: FourMomentum,
    pub b2: FourMomentum,
    pub b1_fsr: FourMomentum,
    pub b2_fsr: FourMomentum,
    pub nu1: FourMomentum,
    pub nu2: FourMomentum,
    pub l1: FourMomentum,
    pub l2: FourMomentum,
    pub l1_fsr: FourMomentum,
    pub l2_fsr: FourMomentum,
    pub l1_fsr_nu: FourMomentum,
    pub l2_fsr_nu: FourMomentum,
    pub ll: FourMomentum,
    pub ll_fsr: FourMomentum,
    pub bb: FourMomentum,
    pub bb_fsr: FourMomentum,
    pub nunu: FourMomentum,
    pub ll_nunu: FourMomentum,
    pub ll_fsr_nunu: FourMomentum,
    pub ll_fsr_nunu_bb: FourMomentum,

    // Matching debug: separation of every upstream object's generator
    // four-momentum to each truth leg, plain and FSR-dressed.
    pub dr_jet_b1: Vec<f64>,
    pub dr_jet_b2: Vec<f64>,
    pub dr_jet_b1_fsr: Vec<f64>,
    pub dr_jet_b2_fsr: Vec<f64>,
    pub dr_electron_l1: Vec<f64>,
    pub dr_electron_l2: Vec<f64>,
    pub dr_electron_l1_fsr: Vec<f64>,
    pub dr_electron_l2_fsr: Vec<f64>,
    pub dr_muon_l1: Vec<f64>,
    pub dr_muon_l2: Vec<f64>,
    pub dr_muon_l1_fsr: Vec<f64>,
    pub dr_muon_l2_fsr: Vec<f64>,
}

/// A leg found with the from-hard-process bit but without the
/// hard-process bit itself was radiated after the matrix element; its
/// FSR needs recovering.
fn wants_fsr(particle: &GenParticleRecord) -> bool {
    particle.has_status_bit(status_bits::FROM_HARD_PROCESS)
        && !particle.has_status_bit(status_bits::IS_HARD_PROCESS)
}

fn shares_mother(a: &GenParticleRecord, b: &GenParticleRecord) -> bool {
    a.mothers
        .iter()
        .any(|mother| b.mothers.contains(mother))
}

/// Extract the truth summary from a simulated event's generator record.
#[must_use]
pub fn summarize(event: &EventRecord) -> GenSummary {
    let particles = &event.gen_particles;
    let mut summary = GenSummary::default();
    let mut fsr_l1 = false;
    let mut fsr_l2 = false;
    let mut fsr_b1 = false;
    let mut fsr_b2 = false;

    fn assign(first: &mut Option<usize>, second: Option<&mut Option<usize>>, ip: usize) {
        if first.is_none() {
            *first = Some(ip);
        } else if let Some(second) = second {
            if second.is_none() {
                *second = Some(ip);
            }
        }
    }

    for (ip, particle) in particles.iter().enumerate() {
        if !particle.has_status_bit(status_bits::IS_LAST_COPY_BEFORE_FSR)
            || !particle.has_status_bit(status_bits::FROM_HARD_PROCESS)
        {
            continue;
        }
        match particle.pdg_id.abs() {
            25 => assign(&mut summary.i_h1, Some(&mut summary.i_h2), ip),
            35 | 39 => assign(&mut summary.i_x, None, ip),
            23 | 24 => assign(&mut summary.i_v1, Some(&mut summary.i_v2), ip),
            5 => {
                if summary.i_b1.is_none() {
                    fsr_b1 = wants_fsr(particle);
                    summary.i_b1 = Some(ip);
                } else if summary.i_b2.is_none() {
                    fsr_b2 = wants_fsr(particle);
                    summary.i_b2 = Some(ip);
                }
            }
            11 | 13 => {
                if summary.i_l1.is_none() {
                    fsr_l1 = wants_fsr(particle);
                    summary.i_l1 = Some(ip);
                } else if summary.i_l2.is_none() {
                    fsr_l2 = wants_fsr(particle);
                    summary.i_l2 = Some(ip);
                }
            }
            12 | 14 | 16 => assign(&mut summary.i_nu1, Some(&mut summary.i_nu2), ip),
            _ => {}
        }
    }

    // Recover FSR photons for the lepton legs and gluons for the b legs
    // by shared-mother comparison, last copies only.
    fn collect_fsr(
        particles: &[GenParticleRecord],
        pdg: i32,
        mut legs: [(bool, Option<usize>, &mut Vec<usize>); 2],
    ) {
        if !legs.iter().any(|(wanted, leg, _)| *wanted && leg.is_some()) {
            return;
        }
        for (ip, particle) in particles.iter().enumerate() {
            if particle.pdg_id != pdg
                || !particle.has_status_bit(status_bits::IS_LAST_COPY_BEFORE_FSR)
            {
                continue;
            }
            for (wanted, leg, radiated) in &mut legs {
                if !*wanted {
                    continue;
                }
                if let Some(ileg) = leg {
                    if shares_mother(particle, &particles[*ileg]) {
                        radiated.push(ip);
                    }
                }
            }
        }
    }
    collect_fsr(
        particles,
        22,
        [
            (fsr_l1, summary.i_l1, &mut summary.photons_l1),
            (fsr_l2, summary.i_l2, &mut summary.photons_l2),
        ],
    );
    collect_fsr(
        particles,
        21,
        [
            (fsr_b1, summary.i_b1, &mut summary.gluons_b1),
            (fsr_b2, summary.i_b2, &mut summary.gluons_b2),
        ],
    );

    let p4_of = |index: Option<usize>| {
        index.map_or(FourMomentum::ZERO, |ip| particles[ip].p4)
    };
    summary.b1 = p4_of(summary.i_b1);
    summary.b2 = p4_of(summary.i_b2);
    summary.nu1 = p4_of(summary.i_nu1);
    summary.nu2 = p4_of(summary.i_nu2);
    summary.l1 = p4_of(summary.i_l1);
    summary.l2 = p4_of(summary.i_l2);

    summary.b1_fsr = summary.b1
        + summary
            .gluons_b1
            .iter()
            .map(|&ip| particles[ip].p4)
            .sum::<FourMomentum>();
    summary.b2_fsr = summary.b2
        + summary
            .gluons_b2
            .iter()
            .map(|&ip| particles[ip].p4)
            .sum::<FourMomentum>();
    summary.l1_fsr = summary.l1
        + summary
            .photons_l1
            .iter()
            .map(|&ip| particles[ip].p4)
            .sum::<FourMomentum>();
    summary.l2_fsr = summary.l2
        + summary
            .photons_l2
            .iter()
            .map(|&ip| particles[ip].p4)
            .sum::<FourMomentum>();

    summary.ll = summary.l1 + summary.l2;
    summary.ll_fsr = summary.l1_fsr + summary.l2_fsr;
    summary.bb = summary.b1 + summary.b2;
    summary.bb_fsr = summary.b1_fsr + summary.b2_fsr;
    summary.nunu = summary.nu1 + summary.nu2;
    summary.l1_fsr_nu = summary.l1_fsr + summary.nu1;
    summary.l2_fsr_nu = summary.l2_fsr + summary.nu2;
    summary.ll_nunu = summary.ll + summary.nunu;
    summary.ll_fsr_nunu = summary.ll_fsr + summary.nunu;
    summary.ll_fsr_nunu_bb = summary.ll_fsr_nunu + summary.bb_fsr;

    for jet in &event.jets {
        summary.dr_jet_b1.push(jet.gen_p4.delta_r(&summary.b1));
        summary.dr_jet_b2.push(jet.gen_p4.delta_r(&summary.b2));
        summary
            .dr_jet_b1_fsr
            .push(jet.gen_p4.delta_r(&summary.b1_fsr));
        summary
            .dr_jet_b2_fsr
            .push(jet.gen_p4.delta_r(&summary.b2_fsr));
    }
    for electron in &event.electrons {
        summary
            .dr_electron_l1
            .push(electron.gen_p4.delta_r(&summary.l1));
        summary
            .dr_electron_l2
            .push(electron.gen_p4.delta_r(&summary.l2));
        summary
            .dr_electron_l1_fsr
            .push(electron.gen_p4.delta_r(&summary.l1_fsr));
        summary
            .dr_electron_l2_fsr
            .push(electron.gen_p4.delta_r(&summary.l2_fsr));
    }
    for muon in &event.muons {
        summary.dr_muon_l1.push(muon.gen_p4.delta_r(&summary.l1));
        summary.dr_muon_l2.push(muon.gen_p4.delta_r(&summary.l2));
        summary
            .dr_muon_l1_fsr
            .push(muon.gen_p4.delta_r(&summary.l1_fsr));
        summary
            .dr_muon_l2_fsr
            .push(muon.gen_p4.delta_r(&summary.l2_fsr));
    }

    summary
}
