//! `feedcheck.toml` loading.

use crate::cli::Cli;
use anyhow::{Context as _, Result};
use feedcheck_harness::RunConfig;
use feedcheck_reader::ReaderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete checker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedcheckConfig {
    /// Harness settings
    pub run: RunConfig,
    /// In-memory reader settings
    pub reader: ReaderConfig,
}

impl FeedcheckConfig {
    /// Load config from a specific file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        tracing::debug!(
            "Loaded config from {}: {} feeds, timeout {}ms",
            path.display(),
            config.reader.feeds.len(),
            config.run.default_timeout_ms
        );
        Ok(config)
    }

    /// Load the explicit config, else `default_path` if it exists, else defaults.
    ///
    /// # Errors
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn resolve(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None if default_path.is_file() => Self::load_from_file(default_path),
            None => {
                tracing::debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Let command-line flags take precedence over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(filter) = &cli.filter {
            self.run.filter = Some(filter.clone());
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.run.default_timeout_ms = timeout_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use tempfile::TempDir;

    #[test]
    fn test_sections_default_independently() {
        let config: FeedcheckConfig = toml::from_str(
            r#"
            [run]
            filter = "RSS"

            [run.settle]
            ceiling_ms = 500

            [[reader.feeds]]
            name = "Only"
            url = "http://only.example.com"
            entries = ["one"]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.run.filter.as_deref(), Some("RSS"));
        assert_eq!(config.run.default_timeout_ms, 5000);
        assert_eq!(config.run.settle.ceiling_ms, 500);
        assert_eq!(config.run.settle.poll_interval_ms, 25);
        assert_eq!(config.reader.feeds.len(), 1);
        assert_eq!(config.reader.latency_ms, 200);
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let temp = TempDir::new().expect("temp dir");
        let explicit = temp.path().join("explicit.toml");
        let fallback = temp.path().join("feedcheck.toml");
        fs::write(&explicit, "[run]\ndefault_timeout_ms = 10\n").expect("write");
        fs::write(&fallback, "[run]\ndefault_timeout_ms = 20\n").expect("write");

        let config = FeedcheckConfig::resolve(Some(&explicit), &fallback).expect("loads");
        assert_eq!(config.run.default_timeout_ms, 10);

        let config = FeedcheckConfig::resolve(None, &fallback).expect("loads");
        assert_eq!(config.run.default_timeout_ms, 20);
    }

    #[test]
    fn test_resolve_without_files_uses_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let config =
            FeedcheckConfig::resolve(None, &temp.path().join("feedcheck.toml")).expect("defaults");
        assert_eq!(config.reader.feeds.len(), 4);

        let missing = temp.path().join("missing.toml");
        assert!(FeedcheckConfig::resolve(Some(&missing), &missing).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = FeedcheckConfig::default();
        let cli = Cli::parse_from(["feedcheck", "--filter", "menu", "--timeout-ms", "750"]);

        config.apply_overrides(&cli);

        assert_eq!(config.run.filter.as_deref(), Some("menu"));
        assert_eq!(config.run.default_timeout_ms, 750);
    }
}
