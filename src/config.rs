//! Analysis configuration: every kinematic threshold, isolation cut,
//! working-point name, and discriminant name used by the pipeline.
//!
//! Read once at startup and immutable afterwards. All fields carry the
//! standard defaults, so an empty JSON object is a valid configuration;
//! a malformed or unreadable file is fatal before any event is touched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    // Muon preselection and isolation
    pub muon_loose_iso_cut: f64,
    pub muon_tight_iso_cut: f64,
    pub muon_eta_cut: f64,
    pub leading_muon_pt_cut: f64,
    pub subleading_muon_pt_cut: f64,

    // Electron preselection and isolation; isolation cuts are split by
    // detector region (barrel / endcap)
    pub electron_iso_cut_eb_loose: f64,
    pub electron_iso_cut_ee_loose: f64,
    pub electron_iso_cut_eb_tight: f64,
    pub electron_iso_cut_ee_tight: f64,
    pub electron_eta_cut: f64,
    pub leading_electron_pt_cut: f64,
    pub subleading_electron_pt_cut: f64,
    /// Name of the loose electron ID flag in the upstream record.
    pub electron_loose_wp_name: String,
    /// Name of the tight electron ID flag in the upstream record.
    pub electron_tight_wp_name: String,

    // Jet preselection and b-tagging
    pub jet_eta_cut: f64,
    pub jet_pt_cut: f64,
    /// Discriminant the three b-tag working points are evaluated against.
    pub btag_discriminant_name: String,
    /// First named discriminant carried on every jet and summed per pair.
    pub csv_discriminant_name: String,
    /// Second named discriminant carried on every jet and summed per pair.
    pub jp_discriminant_name: String,
    pub btag_cut_loose: f64,
    pub btag_cut_medium: f64,
    pub btag_cut_tight: f64,

    /// Candidates whose smallest lepton-jet separation falls below this
    /// value are dropped outright.
    pub min_dr_lepton_jet: f64,

    // Trigger-object matching
    pub hlt_dr_cut: f64,
    pub hlt_dpt_over_pt_cut: f64,

    /// Target mass for the `mh` jet-pair ranking.
    pub target_dijet_mass: f64,
    /// Beam energy per proton, for the Collins-Soper frame.
    pub beam_energy: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            muon_loose_iso_cut: 0.25,
            muon_tight_iso_cut: 0.15,
            muon_eta_cut: 2.4,
            leading_muon_pt_cut: 20.0,
            subleading_muon_pt_cut: 10.0,
            electron_iso_cut_eb_loose: 0.0893,
            electron_iso_cut_ee_loose: 0.121,
            electron_iso_cut_eb_tight: 0.0354,
            electron_iso_cut_ee_tight: 0.0646,
            electron_eta_cut: 2.5,
            leading_electron_pt_cut: 20.0,
            subleading_electron_pt_cut: 15.0,
            electron_loose_wp_name: "cutBasedElectronID-loose".to_string(),
            electron_tight_wp_name: "cutBasedElectronID-tight".to_string(),
            jet_eta_cut: 2.4,
            jet_pt_cut: 20.0,
            btag_discriminant_name: "pfCombinedInclusiveSecondaryVertexV2BJetTags"
                .to_string(),
            csv_discriminant_name: "pfCombinedInclusiveSecondaryVertexV2BJetTags"
                .to_string(),
            jp_discriminant_name: "pfJetProbabilityBJetTags".to_string(),
            btag_cut_loose: 0.605,
            btag_cut_medium: 0.89,
            btag_cut_tight: 0.97,
            min_dr_lepton_jet: 0.3,
            hlt_dr_cut: f64::MAX,
            hlt_dpt_over_pt_cut: f64::MAX,
            target_dijet_mass: 125.0,
            beam_energy: 6500.0,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file. Any error here is fatal.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no event could ever be processed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("muon_eta_cut", self.muon_eta_cut),
            ("electron_eta_cut", self.electron_eta_cut),
            ("jet_eta_cut", self.jet_eta_cut),
            ("jet_pt_cut", self.jet_pt_cut),
            ("min_dr_lepton_jet", self.min_dr_lepton_jet),
            ("target_dijet_mass", self.target_dijet_mass),
            ("beam_energy", self.beam_energy),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("electron_loose_wp_name", &self.electron_loose_wp_name),
            ("electron_tight_wp_name", &self.electron_tight_wp_name),
            ("btag_discriminant_name", &self.btag_discriminant_name),
            ("csv_discriminant_name", &self.csv_discriminant_name),
            ("jp_discriminant_name", &self.jp_discriminant_name),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
