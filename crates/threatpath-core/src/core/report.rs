// threatpath-core/src/core/report.rs
// ============================================================================
// Module: ThreatPath Analysis and Forecast Artifacts
// Description: Path reports, current state, and predicted scenarios.
// Purpose: Model the typed outputs of the path analyzer and forecaster.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A `PathReport` is emitted per session by the path analyzer; a
//! `PredictionSummary` is emitted per session by the trajectory forecaster.
//! Both are immutable once emitted and join downstream stages by session id
//! only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TechniqueId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Business Risk
// ============================================================================

/// Business-facing risk classification for a path report.
///
/// # Invariants
/// - Variants are stable for serialization and ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessRiskLevel {
    /// Routine or baseline activity.
    Informational,
    /// Low-impact anomaly.
    Low,
    /// Meaningful anomaly or severe vulnerability exposure.
    Medium,
    /// High anomaly score or actively exploited vulnerability.
    High,
}

impl fmt::Display for BusinessRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Informational => "Informational",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SECTION: Path Report
// ============================================================================

/// Next-phase estimate emitted with a path report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPrediction {
    /// Kill-chain phase (or activity label) expected next.
    pub next_phase: String,
    /// Estimated branch probability in `[0, 1]`.
    pub probability: f64,
}

/// Per-session output of the path analyzer.
///
/// # Invariants
/// - `path_anomaly_score` is within `[0, 100]`.
/// - `observed_techniques` is order-preserving unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    /// Session this report was derived from.
    pub session_id: SessionId,
    /// Identifier of the first event in the session.
    pub root_cause_node: EventId,
    /// Distinct hosts touched by the session, in first-seen order.
    pub blast_radius: Vec<String>,
    /// Composite anomaly score in `[0, 100]`.
    pub path_anomaly_score: f64,
    /// Initial kill-chain next-phase estimate.
    pub prediction_vector: Vec<PathPrediction>,
    /// Human-readable vulnerability findings.
    pub vulnerability_summary: Vec<String>,
    /// Techniques observed, order-preserving unique.
    pub observed_techniques: Vec<TechniqueId>,
    /// CWE abstraction clusters (excluding unknowns).
    pub cwe_clusters: Vec<String>,
    /// Event counts grouped by event type.
    pub event_summary: BTreeMap<String, u64>,
    /// Analyst-facing narrative.
    pub tactical_narrative: String,
    /// Plain-language summary for non-technical readers.
    pub plain_language_summary: String,
    /// Business risk classification.
    pub business_risk_level: BusinessRiskLevel,
    /// Report generation timestamp.
    pub generated_at: Timestamp,
}

// ============================================================================
// SECTION: Current State
// ============================================================================

/// Observed adversary state feeding the trajectory forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentState {
    /// Techniques observed so far, order-preserving unique.
    pub observed_techniques: Vec<TechniqueId>,
    /// Hosts in the blast radius.
    pub host_scope: Vec<String>,
    /// Observed CVE/CWE identifiers (uppercase canonical strings).
    pub observed_vulnerabilities: Vec<String>,
    /// Depth of the reconstructed attack graph.
    pub graph_depth: usize,
}

// ============================================================================
// SECTION: Predicted Scenarios
// ============================================================================

/// Scenario risk classification derived from the terminal technique.
///
/// # Invariants
/// - Variants are stable for serialization and ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioRiskLevel {
    /// Default scenario severity.
    Medium,
    /// Credential theft or lateral movement terminal.
    High,
    /// Exfiltration or impact terminal.
    Critical,
}

impl fmt::Display for ScenarioRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Rank classification of a predicted scenario.
///
/// # Invariants
/// - Assigned by descending-probability rank: index 0 is `Primary`,
///   1-2 are `Secondary`, 3-4 are `Opportunistic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    /// Highest-probability scenario.
    Primary,
    /// Second and third ranked scenarios.
    Secondary,
    /// Remaining ranked scenarios.
    Opportunistic,
}

/// Reaction window for a predicted scenario, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTimeWindow {
    /// Earliest expected progression, seconds from now.
    pub min_seconds: u64,
    /// Latest expected progression, seconds from now.
    pub max_seconds: u64,
}

/// Evidence lines explaining a predicted scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrajectoryExplainability {
    /// Evidence supporting the projection.
    pub positive_evidence: Vec<String>,
    /// Evidence against the projection.
    pub negative_evidence: Vec<String>,
    /// Known uncertainty factors.
    pub uncertainty_factors: Vec<String>,
}

/// A single projected adversary trajectory.
///
/// # Invariants
/// - `probability` is within `[0, 1]`.
/// - `sequence` is non-empty and at most the traversal depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedScenario {
    /// Projected technique sequence.
    pub sequence: Vec<TechniqueId>,
    /// Humanized rendering of the sequence.
    pub human_readable_sequence: String,
    /// Cumulative path probability in `[0, 1]`.
    pub probability: f64,
    /// Reaction window for the full sequence.
    pub reaction_time_window: ReactionTimeWindow,
    /// Humanized rendering of the reaction window.
    pub time_window_text: String,
    /// Evidence lines for the projection.
    pub explainability: TrajectoryExplainability,
    /// Severity classification from the terminal technique.
    pub risk_level: ScenarioRiskLevel,
    /// Rank classification after merging and sorting.
    pub scenario_type: ScenarioType,
}

// ============================================================================
// SECTION: Prediction Summary
// ============================================================================

/// Confidence component breakdown for a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    /// Vulnerability grounding contribution.
    pub grounding: f64,
    /// Maximum surviving path probability.
    pub max_path_prob: f64,
    /// KEV-derived confidence boost.
    pub kev_boost: f64,
}

/// Per-session output of the trajectory forecaster.
///
/// # Invariants
/// - `predicted_scenarios` holds at most five entries, sorted
///   non-increasing by probability.
/// - `aggregate_confidence` is within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    /// Session this forecast was derived from.
    pub session_id: SessionId,
    /// Observed adversary state the forecast was grounded on.
    pub current_state: CurrentState,
    /// Ranked projected scenarios.
    pub predicted_scenarios: Vec<PredictedScenario>,
    /// Analyst-facing narrative.
    pub mentor_narrative: String,
    /// Forecast model version label.
    pub model_version: String,
    /// Aggregate forecast confidence in `[0, 1]`.
    pub aggregate_confidence: f64,
    /// Confidence component breakdown.
    pub evidence_summary: EvidenceSummary,
    /// Reserved suppression explanation. Currently never populated.
    pub suppression_reason: Option<String>,
}
