//! The `process` subcommand: run the candidate pipeline over a file of
//! event records.

use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::config::AnalysisConfig;
use crate::event;
use crate::pipeline::{EventCandidates, Pipeline};

#[derive(Args)]
pub struct ProcessArgs {
    /// JSON file holding an array of event records
    #[arg(required = true)]
    pub events: PathBuf,

    /// Path to an analysis configuration file (defaults are used when
    /// omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only process the first N events
    #[arg(short = 'n', long)]
    pub max_events: Option<usize>,
}

/// Execute process subcommand
///
/// # Errors
///
/// Returns an error if the configuration or event file cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ProcessArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = if let Some(path) = &args.config {
        AnalysisConfig::load_from_file(path)?
    } else {
        AnalysisConfig::default()
    };
    config.validate()?;

    let mut events = event::load_events(&args.events)?;
    if let Some(max) = args.max_events {
        events.truncate(max);
    }
    if verbose {
        eprintln!("Loaded {} event(s)", events.len());
    }

    let pipeline = Pipeline::new(&config);
    let mut results = Vec::with_capacity(events.len());
    for event in &events {
        results.push(pipeline.run(event));
    }

    match format {
        OutputFormat::Json => {
            serde_json::to_writer(std::io::stdout().lock(), &results)?;
            println!();
        }
        OutputFormat::Text => {
            for (ievent, candidates) in results.iter().enumerate() {
                print_summary(ievent, candidates);
            }
        }
    }

    Ok(())
}

fn print_summary(ievent: usize, candidates: &EventCandidates) {
    let counts = &candidates.counts;
    println!(
        "event {ievent}: {} leptons ({} e, {} mu), {} jets, met pt {:.1}",
        counts.n_leptons,
        counts.n_electrons,
        counts.n_muons,
        counts.n_jets,
        candidates.met[0].p4.pt(),
    );
    println!(
        "  composites: {} ll, {} llmet, {} jj, {} llmetjj",
        candidates.dileptons.len(),
        candidates.dilepton_met.len(),
        candidates.dijets.len(),
        candidates.quads.len(),
    );
    println!(
        "  occupied cells: l {}, ll {}, j {}, jj {}, llmetjj {}",
        candidates.lepton_table.occupancy(),
        candidates.dilepton_table.occupancy(),
        candidates.jet_table.occupancy(),
        candidates.dijet_table.occupancy(),
        candidates.quad_table.occupancy(),
    );
    println!(
        "  all-tight slices: btagL {} candidates, no-btag {} candidates",
        candidates.all_tight_btag_l_ht.len(),
        candidates.all_tight_nobtag_ht.len(),
    );
}
