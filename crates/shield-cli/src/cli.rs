use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Gammashield Developers",
    version,
    about = "shield - Parametric study of gamma-ray dose streaming through a channel in a concrete shielding wall.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run (or resume) the parameter sweep and write the report artifacts.
    Run(RunArgs),
    /// Print the highest-dose configurations from a saved results file.
    Rank(RankArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for checkpoints, run directories and report artifacts.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub results_dir: Option<PathBuf>,

    // --- Transport Engine ---
    /// Transport engine executable, started once per configuration inside its run directory.
    #[arg(short, long, value_name = "PATH")]
    pub engine: Option<PathBuf>,

    /// Extra argument passed to the engine executable. Can be used multiple times.
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Cross-section library handed to the engine through OPENMC_CROSS_SECTIONS.
    #[arg(long, value_name = "PATH")]
    pub cross_sections: Option<PathBuf>,

    /// Choose between the reduced and the full parameter grid, overriding the config file.
    #[command(flatten)]
    pub sweep_size: SweepSize,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S transport.batches=40
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// A group to handle mutually exclusive flags for the sweep size.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct SweepSize {
    /// Sweep the reduced test grid.
    #[arg(long)]
    pub test_mode: bool,
    /// Sweep the full parameter grid.
    #[arg(long)]
    pub full_sweep: bool,
}

/// Arguments for the `rank` subcommand.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Results file written by `run` (intermediate or final).
    #[arg(value_name = "PATH", default_value = "results/final_results.json")]
    pub results: PathBuf,

    /// Number of configurations to list.
    #[arg(short = 'n', long, value_name = "INT", default_value_t = 5)]
    pub top: usize,
}
