// threatpath-core/src/core/decision.rs
// ============================================================================
// Module: ThreatPath Response Decisions
// Description: Ranked, threshold-gated response recommendations.
// Purpose: Model the typed output of the decision engine.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A `ResponseDecision` is emitted per forecast. The first recommended
//! action is primary; rejected candidates carry their rejection reasons so
//! arbitration stays auditable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Urgency and Classification
// ============================================================================

/// Urgency classification for a response decision.
///
/// # Invariants
/// - Variants are stable for serialization and ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// No near-term reaction pressure.
    Low,
    /// Reaction expected within hours.
    Medium,
    /// Reaction expected within the hour.
    High,
    /// Immediate reaction required.
    Critical,
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Operational class of a recommended action.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// Non-disruptive containment or monitoring measure.
    Containment,
    /// Service-disrupting measure.
    Disruptive,
}

/// Kind of entity an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTargetKind {
    /// A user or campaign principal.
    User,
    /// A host or service endpoint.
    Host,
}

/// Concrete target binding for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    /// Target entity kind.
    pub kind: ActionTargetKind,
    /// Target identifier (principal or normalized host).
    pub identifier: String,
}

// ============================================================================
// SECTION: Justification
// ============================================================================

/// Vulnerability context attached to an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityDetails {
    /// Set when any observed CVE is in the KEV catalog.
    pub is_kev: bool,
    /// Highest CVSS score across observed vulnerabilities.
    pub max_cvss: f64,
}

/// Estimated risk reduction for an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReduction {
    /// Absolute probability mass removed from the trajectory.
    pub absolute: f64,
    /// Relative reduction description.
    pub relative: String,
}

/// Confidence lineage from forecast to decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceAlignment {
    /// Aggregate confidence reported by the forecaster.
    pub forecast_confidence: f64,
    /// Boosted confidence the decision was evaluated at.
    pub decision_confidence: f64,
    /// Base confidence threshold of the selected action.
    pub threshold_applied: f64,
}

/// Structured justification for a recommended action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionJustification {
    /// Rendered technique sequences the action responds to.
    pub predicted_scenarios: Vec<String>,
    /// Estimated risk reduction.
    pub risk_reduction: RiskReduction,
    /// Seconds until the projected technique lands.
    pub time_to_impact_seconds: u64,
    /// Confidence lineage.
    pub confidence_alignment: ConfidenceAlignment,
    /// Detection or control gap this action closes.
    pub signal_gap_closed: String,
}

// ============================================================================
// SECTION: Actions
// ============================================================================

/// A recommended countermeasure.
///
/// # Invariants
/// - Disruptive-keyword actions require approval unless the KEV
///   auto-containment override reclassified them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    /// Countermeasure name from the response knowledge base.
    pub action_type: String,
    /// Operational classification.
    pub action_class: ActionClass,
    /// Set when a human must approve before execution.
    pub requires_approval: bool,
    /// Concrete target binding.
    pub target: ActionTarget,
    /// Vulnerability context.
    pub vulnerability_details: VulnerabilityDetails,
    /// Fixed mitigation checklist for the action.
    pub mitigation_guidelines: Vec<String>,
    /// Recommended execution window in seconds.
    pub recommended_within_seconds: u64,
    /// Structured justification.
    pub justification: ActionJustification,
}

/// A candidate action that failed arbitration.
///
/// # Invariants
/// - `rejection_reasons` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedAction {
    /// Candidate countermeasure name.
    pub candidate_action: String,
    /// Reasons the candidate was rejected.
    pub rejection_reasons: Vec<String>,
}

// ============================================================================
// SECTION: Response Decision
// ============================================================================

/// Narrative explainability block for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionExplainability {
    /// Why the action is recommended now.
    pub why_now: String,
    /// Cost of delaying the action.
    pub why_not_later: String,
    /// Consequence of ignoring the recommendation.
    pub what_happens_if_ignored: String,
    /// Campaign correlation context, when the session joined a campaign.
    pub correlation_context: Option<String>,
}

/// Per-forecast output of the decision engine.
///
/// # Invariants
/// - `recommended_actions` is non-empty; the first entry is primary.
/// - `decision_confidence` is within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDecision {
    /// Session this decision was derived from.
    pub session_id: SessionId,
    /// Correlation-boosted decision confidence in `[0, 1]`.
    pub decision_confidence: f64,
    /// Priority rank; higher ranks execute earlier.
    pub priority_rank: i64,
    /// Urgency classification.
    pub urgency_level: UrgencyLevel,
    /// Recommended actions; first is primary.
    pub recommended_actions: Vec<RecommendedAction>,
    /// Candidates rejected during arbitration.
    pub rejected_actions: Vec<RejectedAction>,
    /// Decision model version label.
    pub model_version: String,
    /// Analyst-facing summary.
    pub mentor_summary: String,
    /// Narrative explainability block.
    pub decision_explainability: DecisionExplainability,
}
