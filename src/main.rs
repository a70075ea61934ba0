use clap::Parser;
use tracing_subscriber::EnvFilter;

use llbb_candidates::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("llbb_candidates=debug,info")
    } else {
        EnvFilter::new("llbb_candidates=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Process(args) => {
            cli::process::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Keys(args) => {
            cli::keys::run(args)?;
        }
    }

    Ok(())
}
