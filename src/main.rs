mod analysis;
mod cli;
mod report;
mod scenario;

use analysis::run_analysis;
use clap::Parser;
use cli::Args;
use report::render_summary;
use scenario::load_scenario;
use std::error::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Read the structure drawn in the editor, the requested test and any
    // parameter overrides.
    let scenario = load_scenario(&args)?;

    // Drive the simulation headlessly until it terminates.
    let summary = run_analysis(&scenario)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary.result)?);
    } else {
        println!("{}", render_summary(&summary));
    }

    Ok(())
}

/// Log to stderr, honouring `RUST_LOG` when set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
