// src/config.rs
//! Configuration file parsing
//!
//! Supports an optional TOML file with the following sections:
//! - [batch] - Failure policy and replacement file handling
//! - [report] - Periodic progress output
//!
//! Every key has a default, so an empty file (or no file) is valid.

use crate::batch::{BatchMode, BatchOptions};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    /// Batch conversion settings
    #[serde(default)]
    pub batch: BatchSection,

    /// Progress report settings
    #[serde(default)]
    pub report: ReportSection,
}

impl ConverterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ConverterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the file if one was given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let suffix = &self.batch.temp_suffix;
        if suffix.is_empty() {
            anyhow::bail!("batch.temp_suffix must not be empty");
        }
        if suffix.contains(std::path::is_separator) {
            anyhow::bail!(
                "batch.temp_suffix must not contain a path separator, got '{}'",
                suffix
            );
        }

        if self.report.interval_secs == 0 {
            anyhow::bail!("report.interval_secs must be at least 1");
        }

        Ok(())
    }

    /// Walker options for a run in the given mode
    pub fn batch_options(&self, mode: BatchMode) -> BatchOptions {
        BatchOptions {
            mode,
            continue_on_error: self.batch.continue_on_error,
            temp_suffix: self.batch.temp_suffix.clone(),
            sync: self.batch.sync,
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report.interval_secs)
    }
}

/// Batch configuration section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    /// Log and skip records that cannot be converted instead of aborting
    #[serde(default)]
    pub continue_on_error: bool,

    /// Suffix for replacement files written next to the original
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,

    /// fsync replacements before renaming them into place
    #[serde(default = "default_true")]
    pub sync: bool,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            temp_suffix: default_temp_suffix(),
            sync: true,
        }
    }
}

fn default_temp_suffix() -> String {
    ".tmp".to_string()
}

fn default_true() -> bool {
    true
}

/// Progress report configuration section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Print periodic snapshots during batch runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between snapshots
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    1
}
