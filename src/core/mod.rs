//! Core data types: four-momentum math and the per-event object and
//! composite records.
//!
//! - [`fourvec::FourMomentum`]: Cartesian four-vector with the angular
//!   metrics used throughout
//! - [`lepton::Lepton`], [`jet::Jet`], [`met::Met`]: preselected objects
//!   with their working-point pass flags
//! - [`dilepton::Dilepton`], [`dilepton::DileptonMet`],
//!   [`dijet::Dijet`], [`quad::DileptonMetDijet`]: composites at
//!   increasing levels of combination
//!
//! All records are rebuilt from scratch each event and immutable
//! afterwards, except for the lazily-cached trigger match on
//! [`lepton::Lepton`], which is scoped to the same event.

pub mod dijet;
pub mod dilepton;
pub mod fourvec;
pub mod jet;
pub mod lepton;
pub mod met;
pub mod quad;

/// Sentinel for an angular separation with no generator counterpart.
pub const SENTINEL_DR: f64 = -1.0;
/// Sentinel for an azimuthal separation with no generator counterpart.
pub const SENTINEL_DPHI: f64 = -1.0;
/// Sentinel for a relative pT difference with no generator counterpart.
pub const SENTINEL_DPT_OVER_PT: f64 = -10.0;
