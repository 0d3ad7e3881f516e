// threatpath-core/src/core/time.rs
// ============================================================================
// Module: ThreatPath Time Model
// Description: Canonical timestamp representation for events and records.
// Purpose: Provide deterministic, replayable time values across artifacts.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! ThreatPath carries a single timestamp representation, unix epoch
//! milliseconds, through every artifact. RFC 3339 strings are parsed at the
//! ingestion boundary and re-derived deterministically wherever ISO text is
//! required (ledger hashing, report rendering). The engine never reads
//! wall-clock time directly; hosts supply timestamps at the boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when converting timestamps.
#[derive(Debug, Error)]
pub enum TimeError {
    /// RFC 3339 parsing failed.
    #[error("failed to parse rfc3339 timestamp: {0}")]
    Parse(String),
    /// Formatting or range conversion failed.
    #[error("failed to format timestamp: {0}")]
    Format(String),
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp in unix epoch milliseconds (UTC).
///
/// # Invariants
/// - Values are explicitly provided by callers; the engine never reads
///   wall-clock time outside the CLI boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Parses an RFC 3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Parse`] when the string is not valid RFC 3339.
    pub fn parse_rfc3339(value: &str) -> Result<Self, TimeError> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimeError::Parse(err.to_string()))?;
        let nanos = parsed.unix_timestamp_nanos();
        let millis =
            i64::try_from(nanos / 1_000_000).map_err(|err| TimeError::Parse(err.to_string()))?;
        Ok(Self(millis))
    }

    /// Renders the timestamp as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Format`] when the value is out of datetime range.
    pub fn to_rfc3339(self) -> Result<String, TimeError> {
        let nanos = i128::from(self.0) * 1_000_000;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|err| TimeError::Format(err.to_string()))?;
        datetime.format(&Rfc3339).map_err(|err| TimeError::Format(err.to_string()))
    }

    /// Returns whole seconds elapsed since an earlier timestamp.
    ///
    /// Negative when `earlier` is actually later.
    #[must_use]
    pub fn seconds_since(self, earlier: Self) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000.0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use super::Timestamp;

    #[test]
    fn rfc3339_round_trip_is_stable() {
        let ts = Timestamp::parse_rfc3339("2025-03-01T12:30:00Z").unwrap();
        let rendered = ts.to_rfc3339().unwrap();
        let reparsed = Timestamp::parse_rfc3339(&rendered).unwrap();
        assert_eq!(ts, reparsed);
    }

    #[test]
    fn seconds_since_counts_gap() {
        let start = Timestamp::from_unix_millis(1_000_000);
        let end = Timestamp::from_unix_millis(1_090_000);
        assert!((end.seconds_since(start) - 90.0).abs() < f64::EPSILON);
    }
}
