use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scorebook",
    about = "Scorebook: ball-by-ball cricket scoring engine",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Scorer configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the registered match formats
    Formats(FormatsArgs),
    /// Replay a match script and print the scorecard
    Replay(ReplayArgs),
    /// Replay a match script and check every innings ledger
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct FormatsArgs {}

#[derive(Args)]
pub struct ReplayArgs {
    pub script: PathBuf,
    /// Only print this innings
    #[arg(short, long)]
    pub innings: Option<u32>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub script: PathBuf,
}
