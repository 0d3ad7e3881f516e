// threatpath-core/src/core/governance.rs
// ============================================================================
// Module: ThreatPath Governance Records
// Description: Model configurations, ledger entries, and drift samples.
// Purpose: Model the append-only governance state and feedback inputs.
// Dependencies: crate::core::{decision, identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Governance state is append-only: configurations are superseded (never
//! edited), ledger entries chain by hash, and drift samples accumulate as a
//! time series. Exactly one configuration is active at any moment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::decision::UrgencyLevel;
use crate::core::identifiers::ConfigVersionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Model Configuration
// ============================================================================

/// Adaptive trust model configuration.
///
/// # Invariants
/// - `containment_threshold` is within `[0.40, 0.95]`.
/// - `disruptive_threshold` is within `[0.60, 1.00]`.
/// - `trust_momentum` is within `[-0.35, 0.35]`.
/// - Exactly one configuration row is active at any moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    /// Unique configuration version identifier.
    pub version_id: ConfigVersionId,
    /// Set on the single active configuration.
    pub is_active: bool,
    /// Minimum decision confidence for containment actions.
    pub containment_threshold: f64,
    /// Minimum decision confidence for disruptive actions.
    pub disruptive_threshold: f64,
    /// Bounded EWMA-smoothed trust momentum.
    pub trust_momentum: f64,
    /// Consecutive successful feedback cycles.
    pub success_streak: u32,
    /// Consecutive failed feedback cycles.
    pub failure_streak: u32,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl ModelConfiguration {
    /// Returns the genesis configuration installed on first use.
    #[must_use]
    pub fn genesis(created_at: Timestamp) -> Self {
        Self {
            version_id: ConfigVersionId::new("v1.0-genesis"),
            is_active: true,
            containment_threshold: 0.6,
            disruptive_threshold: 0.85,
            trust_momentum: 0.0,
            success_streak: 0,
            failure_streak: 0,
            created_at,
        }
    }

    /// Returns the trust trend implied by the current momentum.
    #[must_use]
    pub fn trend(&self) -> TrendDirection {
        if self.trust_momentum < -0.001 {
            TrendDirection::Tightening
        } else if self.trust_momentum > 0.001 {
            TrendDirection::Relaxing
        } else {
            TrendDirection::Stable
        }
    }
}

/// Direction the trust posture is drifting in.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Momentum is negative; thresholds are hardening.
    Tightening,
    /// Momentum is positive; thresholds are relaxing.
    Relaxing,
    /// Momentum is effectively zero.
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Tightening => "Tightening (Hardening)",
            Self::Relaxing => "Relaxing (Adapting)",
            Self::Stable => "Stable",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SECTION: Trust Ledger
// ============================================================================

/// Genesis previous-hash value for an empty ledger (64 zero characters).
pub const LEDGER_GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Append-only trust ledger entry.
///
/// # Invariants
/// - `previous_hash` of entry *n* equals `hash_id` of entry *n-1*; the
///   genesis `previous_hash` is 64 zero characters.
/// - `hash_id` is the SHA-256 of `previous_hash || iso_timestamp ||
///   event_type || canonical_json(payload) || actor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry content hash (lowercase hex).
    pub hash_id: String,
    /// Hash of the preceding entry.
    pub previous_hash: String,
    /// Entry timestamp. Informational; chain linkage defines order.
    pub timestamp: Timestamp,
    /// Ledger event type label.
    pub event_type: String,
    /// Structured event payload.
    pub payload: serde_json::Value,
    /// Acting component or operator.
    pub actor: String,
}

// ============================================================================
// SECTION: Drift Samples
// ============================================================================

/// Governance metric sampled for drift analysis.
///
/// # Invariants
/// - Variants are stable for serialization and storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    /// Bounded trust momentum.
    TrustMomentum,
    /// Containment confidence threshold.
    ContainmentThreshold,
    /// Disruptive confidence threshold.
    DisruptiveThreshold,
}

impl MetricName {
    /// Returns the stable storage label for the metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TrustMomentum => "trust_momentum",
            Self::ContainmentThreshold => "containment_threshold",
            Self::DisruptiveThreshold => "disruptive_threshold",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamped governance metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSample {
    /// Sample timestamp.
    pub timestamp: Timestamp,
    /// Sampled metric.
    pub metric_name: MetricName,
    /// Metric value at sampling time.
    pub metric_value: f64,
    /// Set when the sample crossed its alert boundary.
    pub alert_triggered: bool,
}

// ============================================================================
// SECTION: Execution Feedback
// ============================================================================

/// Terminal status of an executed (or generated) action.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Action completed successfully.
    Success,
    /// Action failed outright.
    Failed,
    /// Action was rolled back after execution.
    RolledBack,
}

/// Outcome record for one action in an execution report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Countermeasure name.
    pub action_type: String,
    /// Terminal status.
    pub final_status: ExecutionStatus,
    /// Urgency the action was issued at.
    #[serde(default = "default_urgency")]
    pub urgency: UrgencyLevel,
    /// Set when the action required approval.
    #[serde(default)]
    pub requires_approval: bool,
    /// Operational domain covered by the action, when known.
    #[serde(default)]
    pub domain: Option<String>,
    /// Set when the action addressed a KEV-listed vulnerability.
    #[serde(default)]
    pub is_kev: bool,
}

/// Returns the default urgency for execution records.
const fn default_urgency() -> UrgencyLevel {
    UrgencyLevel::Low
}

/// Execution (or script-generation) feedback report for the learning core.
///
/// # Invariants
/// - Reports bearing `script_filename` treat every record as a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Report identifier, when supplied.
    #[serde(default)]
    pub report_id: Option<String>,
    /// Generated remediation script filename, for script-gen reports.
    #[serde(default)]
    pub script_filename: Option<String>,
    /// Per-action outcome records.
    #[serde(default)]
    pub executions: Vec<ExecutionRecord>,
}

// ============================================================================
// SECTION: Governance Status
// ============================================================================

/// Read-time snapshot of the governance core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceStatus {
    /// Snapshot generation timestamp.
    pub generated_at: Timestamp,
    /// Active configuration.
    pub configuration: ModelConfiguration,
    /// Trust trend implied by the active configuration.
    pub trend: TrendDirection,
    /// Result of full ledger chain verification.
    pub ledger_integrity: bool,
    /// Total ledger entry count.
    pub ledger_entry_count: u64,
    /// Most recent ledger entries, newest first.
    pub recent_ledger_entries: Vec<LedgerEntry>,
    /// Recent configuration versions, newest first.
    pub model_history: Vec<ModelConfiguration>,
    /// Drift alerts derived from the active configuration.
    pub drift_alerts: Vec<String>,
    /// Rolling drift sample series keyed by metric label.
    pub sample_series: BTreeMap<String, Vec<DriftSample>>,
}
