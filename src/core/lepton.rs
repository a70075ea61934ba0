//! Preselected leptons (electrons and muons, flavor-agnostic afterwards).

use serde::Serialize;

use crate::core::fourvec::FourMomentum;
use crate::event::TriggerInfo;
use crate::wp::{LepId, LepIso};

/// Lepton flavor. Exactly one flavor per lepton, by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeptonFlavor {
    Electron,
    Muon,
}

/// Result of matching a lepton against the online trigger objects.
///
/// Computed at most once per lepton per event and cached on the lepton;
/// repeated requests return the cached value.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TriggerMatch {
    /// Index of the matched online object, if any survived the cuts.
    pub index: Option<usize>,
    /// Separation to the matched object; `f64::MAX` when unmatched.
    pub dr: f64,
    /// Relative pT difference to the matched object; `f64::MAX` when
    /// unmatched.
    pub dpt_over_pt: f64,
}

/// A preselected lepton with its working-point flags and generator
/// bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct Lepton {
    pub p4: FourMomentum,
    pub charge: i32,
    /// Index into the upstream electron or muon collection.
    pub idx: usize,
    pub flavor: LeptonFlavor,
    pub id_l: bool,
    pub id_t: bool,
    pub iso_l: bool,
    pub iso_t: bool,
    pub gen_matched: bool,
    pub gen_p4: FourMomentum,
    pub gen_dr: f64,
    pub gen_dpt_over_pt: f64,
    /// Lazily-populated trigger match; `None` until first requested.
    pub trigger_match: Option<TriggerMatch>,
}

impl Lepton {
    #[must_use]
    pub fn is_electron(&self) -> bool {
        self.flavor == LeptonFlavor::Electron
    }

    #[must_use]
    pub fn is_muon(&self) -> bool {
        self.flavor == LeptonFlavor::Muon
    }

    /// Whether this lepton passes the given identification tier.
    #[must_use]
    pub fn passes_id(&self, id: LepId) -> bool {
        match id {
            LepId::Loose => self.id_l,
            LepId::Tight => self.id_t,
        }
    }

    /// Whether this lepton passes the given isolation tier. The `None`
    /// tier imposes no requirement.
    #[must_use]
    pub fn passes_iso(&self, iso: LepIso) -> bool {
        match iso {
            LepIso::None => true,
            LepIso::Loose => self.iso_l,
            LepIso::Tight => self.iso_t,
        }
    }

    /// Match this lepton against the online trigger objects, caching the
    /// result. Idempotent within the event.
    pub fn ensure_trigger_match(
        &mut self,
        trigger: &TriggerInfo,
        dr_cut: f64,
        dpt_over_pt_cut: f64,
    ) -> TriggerMatch {
        if let Some(cached) = self.trigger_match {
            return cached;
        }

        let mut best = TriggerMatch {
            index: None,
            dr: f64::MAX,
            dpt_over_pt: f64::MAX,
        };
        for (iobj, object) in trigger.objects.iter().enumerate() {
            let dr = self.p4.delta_r(object);
            let dpt_over_pt = (self.p4.pt() - object.pt()).abs() / self.p4.pt();
            if dr > dr_cut || dpt_over_pt > dpt_over_pt_cut {
                continue;
            }
            if dr < best.dr {
                best = TriggerMatch {
                    index: Some(iobj),
                    dr,
                    dpt_over_pt,
                };
            }
        }
        self.trigger_match = Some(best);
        best
    }
}
