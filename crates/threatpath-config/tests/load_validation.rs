// threatpath-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load and Validation Tests
// Description: Defaults, parsing, and fail-closed range checks.
// ============================================================================
//! ## Overview
//! Exercises the configuration model: built-in defaults, TOML loading,
//! unknown-key rejection, and every range check.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use tempfile::TempDir;
use threatpath_config::ConfigError;
use threatpath_config::ThreatPathConfig;

/// Writes a config file and loads it.
fn load(body: &str) -> Result<ThreatPathConfig, ConfigError> {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("threatpath.toml");
    fs::write(&path, body).expect("write config");
    ThreatPathConfig::load(&path)
}

#[test]
fn defaults_validate() {
    let config = ThreatPathConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.pipeline.window_minutes, 60);
    assert_eq!(config.pipeline.max_forecast_depth, 3);
}

#[test]
fn full_config_round_trips() {
    let config = load(
        r#"
        [pipeline]
        window_minutes = 30
        max_forecast_depth = 4

        [catalog]
        path = "intel/vuln.db"
        busy_timeout_ms = 500

        [governance]
        store_path = "state/governance.db"

        [output]
        directory = "artifacts"
        "#,
    )
    .expect("valid config");
    assert_eq!(config.pipeline.window_minutes, 30);
    assert_eq!(config.pipeline.max_forecast_depth, 4);
    assert_eq!(config.catalog.busy_timeout_ms, 500);
    assert_eq!(config.output.directory.to_string_lossy(), "artifacts");
}

#[test]
fn partial_config_fills_defaults() {
    let config = load(
        r#"
        [pipeline]
        window_minutes = 15
        "#,
    )
    .expect("valid config");
    assert_eq!(config.pipeline.window_minutes, 15);
    assert_eq!(config.pipeline.max_forecast_depth, 3);
    assert_eq!(config.catalog.busy_timeout_ms, 2_000);
}

#[test]
fn zero_window_is_rejected() {
    let err = load("[pipeline]\nwindow_minutes = 0\n").expect_err("invalid");
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "pipeline.window_minutes"));
}

#[test]
fn oversized_window_is_rejected() {
    let err = load("[pipeline]\nwindow_minutes = 2000\n").expect_err("invalid");
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "pipeline.window_minutes"));
}

#[test]
fn zero_depth_is_rejected() {
    let err = load("[pipeline]\nmax_forecast_depth = 0\n").expect_err("invalid");
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "pipeline.max_forecast_depth"));
}

#[test]
fn oversized_timeout_is_rejected() {
    let err = load("[catalog]\nbusy_timeout_ms = 120000\n").expect_err("invalid");
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "catalog.busy_timeout_ms"));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = load("[pipeline]\nwindow_minuets = 60\n").expect_err("invalid");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ThreatPathConfig::load(std::path::Path::new("/nonexistent/threatpath.toml"))
        .expect_err("missing");
    assert!(matches!(err, ConfigError::Io { .. }));
}
