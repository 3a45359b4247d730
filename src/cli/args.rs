use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the patchref binary.
#[derive(Parser, Debug)]
#[command(
    name = "patchref",
    version,
    about = "Checks that reflection lookups used by runtime patches name members that exist"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the call sites and coalesce chains of an analysis manifest.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Analysis manifest (JSON).
    pub manifest: PathBuf,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Additional directory to scan for referenced assemblies. Repeatable.
    #[arg(long = "probe", value_name = "DIR")]
    pub probe: Vec<PathBuf>,

    /// Reload assembly images for every lookup instead of caching them.
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of base types walked per lookup.
    #[arg(long, value_name = "N")]
    pub max_base_depth: Option<u32>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
