//! # llbb-candidates
//!
//! A library for building the per-event composite physics objects of a
//! dilepton + missing-energy + dijet final state, and indexing them by
//! identification, isolation, and b-tagging working points.
//!
//! Downstream selection code rarely wants "all candidates": it wants the
//! best candidate among those satisfying one particular combination of
//! working points, under one particular ranking. Recomputing that per
//! selection is wasteful and error-prone. `llbb-candidates` builds every
//! composite once per event and maintains index tables over the full
//! combinatorial space of working-point combinations, so any selection
//! is a single table lookup.
//!
//! ## Features
//!
//! - **Object preselection**: kinematic cuts and working-point flags for
//!   electrons, muons, jets, and MET
//! - **Composite construction**: dileptons, dijets, dilepton+MET, and
//!   the full four-body candidates with their derived kinematics
//! - **Combinatorial indexing**: one index table per population, keyed
//!   by typed working-point tuples with bijective flat encodings
//! - **Ranked slices**: dijet and four-body cells pre-sorted under six
//!   ranking criteria
//! - **Truth bookkeeping**: generator-match propagation everywhere, plus
//!   a hard-process truth summary for simulation
//!
//! ## Example
//!
//! ```rust,no_run
//! use llbb_candidates::config::AnalysisConfig;
//! use llbb_candidates::pipeline::Pipeline;
//! use llbb_candidates::wp::{BtagWp, JetId, LepId, LepIso, PairRank, QuadKey};
//!
//! let config = AnalysisConfig::default();
//! let events = llbb_candidates::event::load_events("events.json".as_ref()).unwrap();
//!
//! let pipeline = Pipeline::new(&config);
//! for event in &events {
//!     let candidates = pipeline.run(event);
//!     // The leading all-tight, double-loose-b-tag candidate:
//!     let key = QuadKey {
//!         lep1_id: LepId::Tight,
//!         lep1_iso: LepIso::Tight,
//!         lep2_id: LepId::Tight,
//!         lep2_iso: LepIso::Tight,
//!         jet1_id: JetId::Tight,
//!         jet2_id: JetId::Tight,
//!         btag1: BtagWp::Loose,
//!         btag2: BtagWp::Loose,
//!         rank: PairRank::Ht,
//!     };
//!     if let Some(&best) = candidates.quad_table.get(key).first() {
//!         println!("m_jj = {:.1}", candidates.quads[best].jj_p4.mass());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: four-momentum math and the object/composite records
//! - [`wp`]: working-point enumerations and flat-key encodings
//! - [`event`]: upstream input records
//! - [`config`]: analysis thresholds and names
//! - [`index`]: flat-keyed index tables
//! - [`pipeline`]: the per-event engine
//! - [`truth`]: generator-truth bolt-on
//! - [`cli`]: command-line interface implementation

pub mod cli;
pub mod config;
pub mod core;
pub mod event;
pub mod index;
pub mod pipeline;
pub mod truth;
pub mod wp;

pub use config::AnalysisConfig;
pub use event::EventRecord;
pub use pipeline::{EventCandidates, Pipeline};
