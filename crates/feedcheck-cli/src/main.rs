//! Feedcheck CLI - runs the feed-reader behavioral suite and reports outcomes
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]
#![allow(clippy::print_stdout, reason = "CLI binary uses stdout for the report")]

use anyhow::Result;
use clap::Parser as _;
use cli::Cli;
use std::process::ExitCode;

mod cli;
mod config;
mod handlers;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    handlers::init_logging(cli.verbose);

    let report = handlers::handle_run(&cli).await?;
    println!("{report}");

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
