use anyhow::{Context as _, Result};
use feedcheck_harness::{Report, Runner, Suite, TracingReporter};
use feedcheck_reader::{InMemoryReader, register_feedreader_suite};
use std::io::stderr;
use std::path::Path;
use std::sync::Arc;
use tokio::fs as async_fs;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use crate::cli::{Cli, DEFAULT_CONFIG_FILE};
use crate::config::FeedcheckConfig;

/// Log filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "feedcheck=info,feedcheck_harness=info,feedcheck_reader=info";
/// Log filter for `--verbose` when `RUST_LOG` is unset.
const VERBOSE_FILTER: &str = "feedcheck=debug,feedcheck_harness=debug,feedcheck_reader=debug";

/// Send logs to stderr so stdout only carries the report.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };

    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

/// Run the feed-reader suite against the in-memory reader.
///
/// # Errors
/// Returns an error if the config cannot be loaded, the reader or suite cannot
/// be built, or the JSON report cannot be written.
pub async fn handle_run(cli: &Cli) -> Result<Report> {
    let mut config =
        FeedcheckConfig::resolve(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_FILE))?;
    config.apply_overrides(cli);

    let reader = InMemoryReader::new(config.reader).context("Failed to build reader page")?;
    let app = Arc::new(reader);
    let mut suite = Suite::new();
    register_feedreader_suite(&mut suite, &app, config.run.settle)
        .context("Failed to register feed-reader suite")?;

    tracing::info!(
        "Running {} cases in {} groups",
        suite.case_count(),
        suite.group_count()
    );
    let report = Runner::new(config.run)
        .with_reporter(TracingReporter)
        .run(&suite)
        .await;

    if let Some(path) = &cli.json {
        let json = report.to_json().context("Failed to serialize report")?;
        async_fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(report)
}
