use std::path::PathBuf;

use clap::Parser;

/// Stress test a 2-D truss structure headlessly.
#[derive(Debug, Clone, Parser)]
#[command(name = "trussim", version, about)]
pub struct Args {
    /// Structure document (JSON) listing members, supports and an optional span.
    pub structure: PathBuf,

    /// Load kind: compression, shear or oscillating.
    #[arg(short, long, default_value = "compression")]
    pub test: String,

    /// Target load magnitude reached at the end of the ramp.
    #[arg(short, long)]
    pub magnitude: f64,

    /// Triangle count the structure was designed to reach.
    #[arg(long)]
    pub target_triangles: Option<usize>,

    /// Height the structure was designed to reach.
    #[arg(long)]
    pub target_height: Option<f64>,

    /// JSON file overriding simulation parameters.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the test result as JSON instead of a text report.
    #[arg(long)]
    pub json: bool,

    /// Log member failures and run progress.
    #[arg(short, long)]
    pub verbose: bool,
}
