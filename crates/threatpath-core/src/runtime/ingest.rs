// threatpath-core/src/runtime/ingest.rs
// ============================================================================
// Module: Event Ingestion
// Description: Load enriched events from heterogeneous JSON file sets.
// Purpose: Unify upstream schemas and fail closed on missing fields.
// Dependencies: crate::core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Upstream producers materialize enriched events into file sets whose
//! schemas drift over time. Loading unifies them column-wise: unknown keys
//! are ignored, missing optional columns default (list columns become empty
//! lists), the legacy `raw_source` column aliases `raw_text`, and
//! timestamps accept RFC 3339 strings or unix milliseconds. A record
//! missing a mandatory field fails the whole batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::core::CveId;
use crate::core::CweId;
use crate::core::EnrichedEvent;
use crate::core::EventId;
use crate::core::TechniqueId;
use crate::core::Timestamp;
use crate::core::clamp_probability;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading enriched events.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any variant fails the batch; partial batches are never returned.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading an input file failed.
    #[error("failed to read event file {path}: {message}")]
    Io {
        /// Offending file path.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Parsing an input file failed.
    #[error("failed to parse event file {path}: {message}")]
    Parse {
        /// Offending file path.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// A mandatory field is missing or null.
    #[error("event record {record} is missing required field '{field}'")]
    MissingField {
        /// Missing field name.
        field: String,
        /// Zero-based record index within the batch.
        record: usize,
    },
    /// A field value could not be interpreted.
    #[error("event record {record} has invalid field '{field}': {message}")]
    InvalidField {
        /// Offending field name.
        field: String,
        /// Zero-based record index within the batch.
        record: usize,
        /// Explanation of the failure.
        message: String,
    },
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads enriched events from one or more JSON files.
///
/// Each file holds either a JSON array of records or newline-delimited JSON
/// records. Files are unified by diagonal schema union.
///
/// # Errors
///
/// Returns [`IngestError`] when any file cannot be read or any record is
/// missing a mandatory field.
pub fn load_events(paths: &[impl AsRef<Path>]) -> Result<Vec<EnrichedEvent>, IngestError> {
    let mut events = Vec::new();
    let mut record_index = 0usize;
    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| IngestError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let records = parse_records(path, &text)?;
        for record in records {
            events.push(event_from_value(&record, record_index)?);
            record_index += 1;
        }
    }
    info!(event_count = events.len(), file_count = paths.len(), "loaded enriched events");
    Ok(events)
}

/// Parses a file body into raw JSON records.
fn parse_records(path: &Path, text: &str) -> Result<Vec<Value>, IngestError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(text).map_err(|err| IngestError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        return Ok(values);
    }
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|err| IngestError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        records.push(value);
    }
    Ok(records)
}

// ============================================================================
// SECTION: Record Mapping
// ============================================================================

/// Builds an enriched event from a raw JSON record.
fn event_from_value(value: &Value, record: usize) -> Result<EnrichedEvent, IngestError> {
    let event_id = required_string(value, "event_id", record)?;
    let timestamp = required_timestamp(value, record)?;
    let event_type = required_string(value, "event_type", record)?;
    let confidence_score = required_unit_score(value, "confidence_score", record)?;
    let data_quality_score = required_unit_score(value, "data_quality_score", record)?;

    let mitre_technique = optional_string(value, "mitre_technique")
        .filter(|technique| !technique.is_empty() && technique != "Unknown")
        .map(TechniqueId::from);
    let raw_text =
        optional_string(value, "raw_text").or_else(|| optional_string(value, "raw_source"));

    Ok(EnrichedEvent {
        event_id: EventId::from(event_id),
        timestamp,
        user: optional_string(value, "user"),
        source_host: optional_string(value, "source_host"),
        target_host: optional_string(value, "target_host"),
        event_type,
        protocol: optional_string(value, "protocol"),
        mitre_technique,
        observed_cve_ids: string_list(value, "observed_cve_ids").into_iter().map(CveId::from).collect(),
        observed_cwe_ids: string_list(value, "observed_cwe_ids").into_iter().map(CweId::from).collect(),
        confidence_score,
        data_quality_score,
        raw_text,
    })
}

/// Extracts a required string field.
fn required_string(value: &Value, field: &str, record: usize) -> Result<String, IngestError> {
    match value.get(field) {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Null) | None => Err(IngestError::MissingField {
            field: field.to_string(),
            record,
        }),
        Some(other) => Err(IngestError::InvalidField {
            field: field.to_string(),
            record,
            message: format!("expected string, found {other}"),
        }),
    }
}

/// Extracts the required timestamp field (RFC 3339 or unix milliseconds).
fn required_timestamp(value: &Value, record: usize) -> Result<Timestamp, IngestError> {
    match value.get("timestamp") {
        Some(Value::String(text)) => {
            Timestamp::parse_rfc3339(text).map_err(|err| IngestError::InvalidField {
                field: "timestamp".to_string(),
                record,
                message: err.to_string(),
            })
        }
        Some(Value::Number(number)) => {
            number.as_i64().map(Timestamp::from_unix_millis).ok_or_else(|| {
                IngestError::InvalidField {
                    field: "timestamp".to_string(),
                    record,
                    message: "expected integer unix milliseconds".to_string(),
                }
            })
        }
        Some(Value::Null) | None => Err(IngestError::MissingField {
            field: "timestamp".to_string(),
            record,
        }),
        Some(other) => Err(IngestError::InvalidField {
            field: "timestamp".to_string(),
            record,
            message: format!("expected rfc3339 string or unix milliseconds, found {other}"),
        }),
    }
}

/// Extracts a required `[0, 1]` score field, clamping out-of-range values.
fn required_unit_score(value: &Value, field: &str, record: usize) -> Result<f64, IngestError> {
    match value.get(field) {
        Some(Value::Number(number)) => {
            let score = number.as_f64().ok_or_else(|| IngestError::InvalidField {
                field: field.to_string(),
                record,
                message: "expected finite number".to_string(),
            })?;
            Ok(clamp_probability(score, field))
        }
        Some(Value::Null) | None => Err(IngestError::MissingField {
            field: field.to_string(),
            record,
        }),
        Some(other) => Err(IngestError::InvalidField {
            field: field.to_string(),
            record,
            message: format!("expected number, found {other}"),
        }),
    }
}

/// Extracts an optional string field; null and empty map to `None`.
fn optional_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field) {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// Extracts an optional list of strings; missing or null maps to empty.
fn string_list(value: &Value, field: &str) -> Vec<String> {
    match value.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|text| !text.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use serde_json::json;

    use super::IngestError;
    use super::event_from_value;

    #[test]
    fn minimal_record_defaults_optional_columns() {
        let record = json!({
            "event_id": "evt-1",
            "timestamp": "2025-03-01T10:00:00Z",
            "event_type": "auth_failure",
            "confidence_score": 0.5,
            "data_quality_score": 0.9
        });
        let event = event_from_value(&record, 0).unwrap();
        assert!(event.observed_cve_ids.is_empty());
        assert!(event.observed_cwe_ids.is_empty());
        assert!(event.user.is_none());
        assert_eq!(event.surrogate_identity(), "System");
    }

    #[test]
    fn raw_source_aliases_raw_text() {
        let record = json!({
            "event_id": "evt-1",
            "timestamp": 1_700_000_000_000_i64,
            "event_type": "security_alert",
            "confidence_score": 0.5,
            "data_quality_score": 0.9,
            "raw_source": "GET /etc/passwd CWE-22"
        });
        let event = event_from_value(&record, 0).unwrap();
        assert_eq!(event.raw_text.as_deref(), Some("GET /etc/passwd CWE-22"));
    }

    #[test]
    fn missing_timestamp_fails_batch() {
        let record = json!({
            "event_id": "evt-1",
            "event_type": "auth_failure",
            "confidence_score": 0.5,
            "data_quality_score": 0.9
        });
        let err = event_from_value(&record, 3).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { ref field, record: 3 } if field == "timestamp"));
    }

    #[test]
    fn unknown_technique_label_maps_to_none() {
        let record = json!({
            "event_id": "evt-1",
            "timestamp": 1_700_000_000_000_i64,
            "event_type": "scan",
            "confidence_score": 0.2,
            "data_quality_score": 0.8,
            "mitre_technique": "Unknown"
        });
        let event = event_from_value(&record, 0).unwrap();
        assert!(event.mitre_technique.is_none());
    }
}
