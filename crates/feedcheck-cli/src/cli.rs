use clap::Parser;
use std::path::PathBuf;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "feedcheck.toml";

/// Command-line arguments for the feed-reader checker.
#[derive(Debug, Parser)]
#[command(name = "feedcheck")]
#[command(about = "Run the feed-reader behavioral suite", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only run cases whose full name contains this string
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Default bound for asynchronous cases, in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Also write the report as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Log every case and hook
    #[arg(short, long)]
    pub verbose: bool,
}
