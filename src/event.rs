//! Upstream event records.
//!
//! One [`EventRecord`] is the read-only view of a single collision event
//! as produced by the reconstruction service: plain per-object records
//! with four-momenta and pass/fail flags, plus the generator-particle
//! and trigger-object collections. The pipeline borrows a record for the
//! duration of one event and never retains it.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::fourvec::FourMomentum;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Failed to read event file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse event file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A reconstructed electron as delivered upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectronRecord {
    pub p4: FourMomentum,
    pub charge: i32,
    /// Named identification flags, keyed by working-point name.
    #[serde(default)]
    pub ids: HashMap<String, bool>,
    /// Whether the electron was reconstructed in the barrel region.
    pub is_eb: bool,
    /// Effective-area-corrected relative isolation.
    pub relative_iso: f64,
    #[serde(default)]
    pub gen_matched: bool,
    #[serde(default)]
    pub gen_p4: FourMomentum,
}

impl ElectronRecord {
    /// Look up a named identification flag; absent names fail the ID.
    #[must_use]
    pub fn id(&self, wp_name: &str) -> bool {
        self.ids.get(wp_name).copied().unwrap_or(false)
    }
}

/// A reconstructed muon as delivered upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuonRecord {
    pub p4: FourMomentum,
    pub charge: i32,
    pub is_loose: bool,
    pub is_tight: bool,
    /// Delta-beta-corrected relative isolation.
    pub relative_iso: f64,
    #[serde(default)]
    pub gen_matched: bool,
    #[serde(default)]
    pub gen_p4: FourMomentum,
}

/// A reconstructed jet as delivered upstream, assumed pT-sorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JetRecord {
    pub p4: FourMomentum,
    pub pass_loose_id: bool,
    pub pass_tight_id: bool,
    pub pass_tight_lepton_veto_id: bool,
    /// Named b-tag discriminant values.
    #[serde(default)]
    pub discriminants: HashMap<String, f64>,
    pub parton_flavor: i32,
    pub hadron_flavor: i32,
    #[serde(default)]
    pub gen_matched: bool,
    #[serde(default)]
    pub gen_p4: FourMomentum,
}

impl JetRecord {
    /// Look up a named discriminant. An absent name yields negative
    /// infinity so that no working point can pass on it.
    #[must_use]
    pub fn discriminant(&self, name: &str) -> f64 {
        match self.discriminants.get(name) {
            Some(&value) => value,
            None => {
                warn!("jet has no discriminant named {name:?}");
                f64::NEG_INFINITY
            }
        }
    }
}

/// A generator-level particle (simulation only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenParticleRecord {
    pub p4: FourMomentum,
    pub pdg_id: i32,
    /// Packed status-flag bits; see the `status_bits` constants.
    pub status_flags: u32,
    /// Indices of this particle's mothers in the same collection.
    #[serde(default)]
    pub mothers: Vec<usize>,
}

/// Bit positions within [`GenParticleRecord::status_flags`].
pub mod status_bits {
    pub const IS_HARD_PROCESS: u32 = 7;
    pub const FROM_HARD_PROCESS: u32 = 8;
    pub const IS_LAST_COPY: u32 = 13;
    pub const IS_LAST_COPY_BEFORE_FSR: u32 = 14;
}

impl GenParticleRecord {
    #[must_use]
    pub fn has_status_bit(&self, bit: u32) -> bool {
        self.status_flags & (1 << bit) != 0
    }

    #[must_use]
    pub fn is_last_copy(&self) -> bool {
        self.has_status_bit(status_bits::IS_LAST_COPY)
    }

    #[must_use]
    pub fn is_neutrino(&self) -> bool {
        matches!(self.pdg_id.abs(), 12 | 14 | 16)
    }
}

/// Trigger paths that fired, and the online objects to match against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerInfo {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub objects: Vec<FourMomentum>,
}

/// The full read-only input for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRecord {
    /// True for recorded collisions, false for simulation.
    #[serde(default)]
    pub is_real_data: bool,
    #[serde(default)]
    pub electrons: Vec<ElectronRecord>,
    #[serde(default)]
    pub muons: Vec<MuonRecord>,
    #[serde(default)]
    pub jets: Vec<JetRecord>,
    /// Missing transverse energy four-vector.
    #[serde(default)]
    pub met: FourMomentum,
    /// Generator particles; empty on real data.
    #[serde(default)]
    pub gen_particles: Vec<GenParticleRecord>,
    #[serde(default)]
    pub trigger: TriggerInfo,
}

/// Load a JSON array of event records.
pub fn load_events(path: &Path) -> Result<Vec<EventRecord>, EventError> {
    let content = std::fs::read_to_string(path)?;
    let events: Vec<EventRecord> = serde_json::from_str(&content)?;
    Ok(events)
}
