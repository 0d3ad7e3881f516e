// threatpath-core/src/core/mod.rs
// ============================================================================
// Module: ThreatPath Core Types
// Description: Canonical data model shared across all pipeline stages.
// Purpose: Re-export identifiers, time, and stage artifacts.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! The core module holds the typed data model of the pipeline: events and
//! sessions, per-stage report artifacts, response decisions, and governance
//! records. All artifacts serialize as stable JSON and are immutable after
//! emission.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bounds;
pub mod decision;
pub mod event;
pub mod governance;
pub mod identifiers;
pub mod report;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bounds::clamp_momentum;
pub use bounds::clamp_probability;
pub use bounds::clamp_score;
pub use bounds::clamp_threshold;
pub use decision::ActionClass;
pub use decision::ActionJustification;
pub use decision::ActionTarget;
pub use decision::ActionTargetKind;
pub use decision::ConfidenceAlignment;
pub use decision::DecisionExplainability;
pub use decision::RecommendedAction;
pub use decision::RejectedAction;
pub use decision::ResponseDecision;
pub use decision::RiskReduction;
pub use decision::UrgencyLevel;
pub use decision::VulnerabilityDetails;
pub use event::EnrichedEvent;
pub use event::Session;
pub use governance::DriftSample;
pub use governance::ExecutionRecord;
pub use governance::ExecutionReport;
pub use governance::ExecutionStatus;
pub use governance::GovernanceStatus;
pub use governance::LEDGER_GENESIS_HASH;
pub use governance::LedgerEntry;
pub use governance::MetricName;
pub use governance::ModelConfiguration;
pub use governance::TrendDirection;
pub use identifiers::ConfigVersionId;
pub use identifiers::CveId;
pub use identifiers::CweId;
pub use identifiers::EventId;
pub use identifiers::SessionId;
pub use identifiers::TechniqueId;
pub use report::BusinessRiskLevel;
pub use report::CurrentState;
pub use report::EvidenceSummary;
pub use report::PathPrediction;
pub use report::PathReport;
pub use report::PredictedScenario;
pub use report::PredictionSummary;
pub use report::ReactionTimeWindow;
pub use report::ScenarioRiskLevel;
pub use report::ScenarioType;
pub use report::TrajectoryExplainability;
pub use time::TimeError;
pub use time::Timestamp;
