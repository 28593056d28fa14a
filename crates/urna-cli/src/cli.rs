use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "urna",
    about = "Urna: ballot-box terminal server and voting ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Serve ballot-box terminals over TCP
    Serve(ServeArgs),
    /// Run one terminal session over stdin/stdout
    Attach(AttachArgs),
    /// Load and validate a configuration and its fixture
    CheckConfig(CheckConfigArgs),
}

/// Arguments for `urna serve`.
#[derive(Args)]
pub struct ServeArgs {
    /// Server configuration (TOML). Defaults to one loopback terminal.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for `urna attach`.
#[derive(Args)]
pub struct AttachArgs {
    /// Election fixture (TOML)
    #[arg(short, long)]
    pub fixture: PathBuf,
    #[arg(short, long)]
    pub ballot_box: u64,
    /// Line terminator used on stdin/stdout
    #[arg(long, default_value = "\n")]
    pub line_terminator: String,
}

/// Arguments for `urna check-config`.
#[derive(Args)]
pub struct CheckConfigArgs {
    #[arg(short, long)]
    pub config: PathBuf,
}
