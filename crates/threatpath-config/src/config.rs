// threatpath-config/src/config.rs
// ============================================================================
// Module: ThreatPath Configuration
// Description: TOML configuration model with strict validation.
// Purpose: Centralize pipeline, catalog, governance, and output settings.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! The configuration file (`threatpath.toml`) carries four sections:
//! `[pipeline]` (sessionization window, traversal depth), `[catalog]`
//! (vulnerability database path and timeout), `[governance]` (trust store
//! path), and `[output]` (artifact directory). Every field has a default;
//! validation rejects out-of-range values before any stage runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default sessionization window (minutes).
const DEFAULT_WINDOW_MINUTES: u64 = 60;
/// Largest accepted sessionization window (one day).
const MAX_WINDOW_MINUTES: u64 = 1_440;
/// Default forecast traversal depth.
const DEFAULT_MAX_FORECAST_DEPTH: usize = 3;
/// Largest accepted forecast traversal depth.
const MAX_FORECAST_DEPTH: usize = 6;
/// Default catalog busy timeout (ms).
const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 2_000;
/// Largest accepted catalog busy timeout (one minute).
const MAX_CATALOG_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("failed to read config {path}: {message}")]
    Io {
        /// Offending file path.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Parsing the config file failed.
    #[error("failed to parse config {path}: {message}")]
    Parse {
        /// Offending file path.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// A field value is outside its accepted range.
    #[error("invalid config field '{field}': {message}")]
    Validation {
        /// Offending field name.
        field: String,
        /// Explanation of the failure.
        message: String,
    },
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Pipeline-stage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Sessionization window in minutes.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
    /// Forecast traversal depth.
    #[serde(default = "default_max_forecast_depth")]
    pub max_forecast_depth: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
            max_forecast_depth: DEFAULT_MAX_FORECAST_DEPTH,
        }
    }
}

/// Vulnerability catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    /// Path to the read-only catalog database.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
    /// Catalog busy timeout in milliseconds.
    #[serde(default = "default_catalog_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            busy_timeout_ms: DEFAULT_CATALOG_TIMEOUT_MS,
        }
    }
}

/// Governance store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GovernanceSection {
    /// Path to the governance store database.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for GovernanceSection {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Directory receiving pipeline artifacts.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

// ============================================================================
// SECTION: Config Root
// ============================================================================

/// Root configuration for the ThreatPath pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ThreatPathConfig {
    /// Pipeline-stage settings.
    #[serde(default)]
    pub pipeline: PipelineSection,
    /// Vulnerability catalog settings.
    #[serde(default)]
    pub catalog: CatalogSection,
    /// Governance store settings.
    #[serde(default)]
    pub governance: GovernanceSection,
    /// Output artifact settings.
    #[serde(default)]
    pub output: OutputSection,
}

impl ThreatPathConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every field against its declared range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.window_minutes == 0 || self.pipeline.window_minutes > MAX_WINDOW_MINUTES {
            return Err(ConfigError::Validation {
                field: "pipeline.window_minutes".to_string(),
                message: format!("must be within 1..={MAX_WINDOW_MINUTES}"),
            });
        }
        if self.pipeline.max_forecast_depth == 0
            || self.pipeline.max_forecast_depth > MAX_FORECAST_DEPTH
        {
            return Err(ConfigError::Validation {
                field: "pipeline.max_forecast_depth".to_string(),
                message: format!("must be within 1..={MAX_FORECAST_DEPTH}"),
            });
        }
        if self.catalog.busy_timeout_ms == 0
            || self.catalog.busy_timeout_ms > MAX_CATALOG_TIMEOUT_MS
        {
            return Err(ConfigError::Validation {
                field: "catalog.busy_timeout_ms".to_string(),
                message: format!("must be within 1..={MAX_CATALOG_TIMEOUT_MS}"),
            });
        }
        if self.catalog.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "catalog.path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.governance.store_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "governance.store_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.output.directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "output.directory".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default sessionization window.
const fn default_window_minutes() -> u64 {
    DEFAULT_WINDOW_MINUTES
}

/// Returns the default forecast traversal depth.
const fn default_max_forecast_depth() -> usize {
    DEFAULT_MAX_FORECAST_DEPTH
}

/// Returns the default catalog busy timeout.
const fn default_catalog_timeout_ms() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_MS
}

/// Returns the default catalog database path.
fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/vuln.db")
}

/// Returns the default governance store path.
fn default_store_path() -> PathBuf {
    PathBuf::from("data/governance.db")
}

/// Returns the default artifact directory.
fn default_output_directory() -> PathBuf {
    PathBuf::from("out")
}
