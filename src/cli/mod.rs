//! Command-line interface for llbb-candidates.
//!
//! Available commands:
//!
//! - **process**: Run the full candidate pipeline over a file of event
//!   records
//! - **keys**: Inspect the working-point key spaces and decode flat keys
//!
//! ## Usage
//!
//! ```text
//! # Process events with the default thresholds
//! llbb-candidates process events.json
//!
//! # Process with a custom configuration, JSON output for scripting
//! llbb-candidates process events.json --config cuts.json --format json
//!
//! # Show the combinatorial key spaces
//! llbb-candidates keys
//!
//! # What does quad cell 23818 select on?
//! llbb-candidates keys --level quad --decode 23818
//! ```

use clap::{Parser, Subcommand};

pub mod keys;
pub mod process;

#[derive(Parser)]
#[command(name = "llbb-candidates")]
#[command(version)]
#[command(about = "Build and index dilepton+MET+dijet candidates from event records")]
#[command(
    long_about = "llbb-candidates builds the per-event composite physics objects (dileptons, \
dijets, dilepton+MET, and full four-body candidates) from reconstructed collision events, and \
indexes them by every combination of identification, isolation, and b-tagging working points \
so that downstream selections can look up the best candidate for their criteria directly."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the candidate pipeline over a file of event records
    Process(process::ProcessArgs),

    /// Inspect the working-point key spaces
    Keys(keys::KeysArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
