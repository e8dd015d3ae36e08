//! Command-line interface parsing for fredcat
//!
//! This module handles parsing of CLI arguments using clap, with environment
//! fallbacks for the credential and the common paths, and turns them into a
//! validated `RunConfig`.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{FailurePolicy, StoreBackend};
use crate::data::fred::FRED_BASE_URL;
use crate::data::Column;
use crate::harvest::HarvestConfig;

/// Legacy environment variable still honoured for the API key
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// No usable API key was supplied
    #[error("No FRED API key found. Pass --api-key or set FRED_API_KEY (or API_KEY)")]
    MissingApiKey,

    /// `--columns` was given an empty list
    #[error("At least one output column is required")]
    NoColumns,
}

/// fredcat - harvest FRED series metadata by category into a CSV file
#[derive(Parser, Debug)]
#[command(name = "fredcat")]
#[command(about = "Harvest FRED series metadata by category into a CSV file")]
#[command(version)]
pub struct Cli {
    /// FRED API key
    #[arg(long, env = "FRED_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Number of category ids to walk, starting at 0
    #[arg(long, env = "FREDCAT_CATEGORIES", default_value_t = 100)]
    pub categories: u32,

    /// Rewrite the CSV every N categories (0 = only at the end)
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub flush_every: u32,

    /// Pause before each FRED request, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Store location (sled database path or JSON directory)
    #[arg(long, env = "FREDCAT_STORE", value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Store backend
    #[arg(long, value_enum, default_value_t = StoreBackend::Sled)]
    pub backend: StoreBackend,

    /// CSV output file
    #[arg(long, short, value_name = "FILE", default_value = "series.csv")]
    pub output: PathBuf,

    /// Columns to write, comma separated
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = Column::all())]
    pub columns: Vec<Column>,

    /// Add a leading row-index column to the CSV
    #[arg(long)]
    pub index: bool,

    /// Fetch categories again whose previous fetch failed
    #[arg(long)]
    pub retry_failed: bool,

    /// FRED API base URL
    #[arg(long, env = "FRED_BASE_URL", default_value = FRED_BASE_URL)]
    pub base_url: String,
}

/// Validated settings for one run. Not `Debug`: it carries the API key.
#[derive(Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub base_url: String,
    pub delay: Duration,
    pub backend: StoreBackend,
    pub store_path: Option<PathBuf>,
    pub policy: FailurePolicy,
    pub harvest: HarvestConfig,
}

/// Picks the API key from the flag/`FRED_API_KEY` value, falling back to
/// the legacy variable. Blank values count as missing.
pub fn resolve_api_key(primary: Option<&str>, legacy: Option<&str>) -> Result<String, CliError> {
    [primary, legacy]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or(CliError::MissingApiKey)
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with appropriate settings
    /// * `Err(CliError)` if the key is missing or no columns were selected
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let legacy = std::env::var(LEGACY_API_KEY_ENV).ok();
        let api_key = resolve_api_key(cli.api_key.as_deref(), legacy.as_deref())?;

        if cli.columns.is_empty() {
            return Err(CliError::NoColumns);
        }

        let policy = if cli.retry_failed {
            FailurePolicy::RetryOnNextRun
        } else {
            FailurePolicy::Poison
        };

        Ok(RunConfig {
            api_key,
            base_url: cli.base_url.clone(),
            delay: Duration::from_millis(cli.delay_ms),
            backend: cli.backend,
            store_path: cli.store.clone(),
            policy,
            harvest: HarvestConfig {
                categories: cli.categories,
                flush_every: cli.flush_every,
                output: cli.output.clone(),
                columns: cli.columns.clone(),
                write_index: cli.index,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key_prefers_primary() {
        assert_eq!(resolve_api_key(Some("abc"), Some("legacy")).unwrap(), "abc");
    }

    #[test]
    fn test_resolve_api_key_falls_back_to_legacy() {
        assert_eq!(resolve_api_key(None, Some("legacy")).unwrap(), "legacy");
        assert_eq!(resolve_api_key(Some("  "), Some("legacy")).unwrap(), "legacy");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let err = resolve_api_key(None, None).unwrap_err();
        assert!(err.to_string().contains("API key"));
        assert!(resolve_api_key(Some(""), Some(" ")).is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["fredcat", "--api-key", "k"]);
        assert_eq!(cli.flush_every, 100);
        assert_eq!(cli.delay_ms, 1000);
        assert_eq!(cli.backend, StoreBackend::Sled);
        assert_eq!(cli.output, PathBuf::from("series.csv"));
        assert_eq!(cli.columns, Column::all());
        assert!(!cli.index);
        assert!(!cli.retry_failed);
    }

    #[test]
    fn test_cli_parse_columns_list() {
        let cli = Cli::parse_from(["fredcat", "--columns", "id,title,units"]);
        assert_eq!(cli.columns, vec![Column::Id, Column::Title, Column::Units]);
    }

    #[test]
    fn test_cli_rejects_unknown_column() {
        let result = Cli::try_parse_from(["fredcat", "--columns", "id,frequency"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_json_backend() {
        let cli = Cli::parse_from(["fredcat", "--backend", "json", "--store", "/tmp/fredcat"]);
        assert_eq!(cli.backend, StoreBackend::Json);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/fredcat")));
    }

    #[test]
    fn test_run_config_from_cli() {
        let cli = Cli::parse_from([
            "fredcat",
            "--api-key",
            "secret",
            "--categories",
            "10000",
            "--delay-ms",
            "0",
            "--retry-failed",
            "--index",
        ]);
        let config = RunConfig::from_cli(&cli).unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.policy, FailurePolicy::RetryOnNextRun);
        assert_eq!(config.harvest.categories, 10000);
        assert!(config.harvest.write_index);
    }

    #[test]
    fn test_run_config_default_policy_poisons() {
        let cli = Cli::parse_from(["fredcat", "--api-key", "secret"]);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.policy, FailurePolicy::Poison);
    }
}
