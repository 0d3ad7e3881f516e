// threatpath-core/src/runtime/mod.rs
// ============================================================================
// Module: ThreatPath Runtime
// Description: The four-stage reasoning engine and governance computation.
// Purpose: Re-export session building, analysis, forecasting, decisions,
// learning, and the supporting intel cache and in-memory stores.
// Dependencies: crate::runtime submodules
// ============================================================================

//! ## Overview
//! Runtime stages are batch transformations: events become sessions,
//! sessions become path reports, reports become forecasts, forecasts become
//! decisions, and execution feedback becomes governance updates. Stages are
//! synchronous and deterministic; all cross-stage joins key by session id.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod analyzer;
pub mod decision;
pub mod forecaster;
pub mod ingest;
pub mod learning;
pub mod ledger;
pub mod memory;
pub mod session;
pub mod vuln;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use analyzer::AttackGraph;
pub use analyzer::PathAnalyzer;
pub use analyzer::discover_vulnerabilities;
pub use decision::CorrelationContext;
pub use decision::DECISION_MODEL_VERSION;
pub use decision::DecisionEngine;
pub use decision::extract_principal;
pub use forecaster::DEFAULT_MAX_DEPTH;
pub use forecaster::FORECAST_MODEL_VERSION;
pub use forecaster::TrajectoryForecaster;
pub use forecaster::select_seeds;
pub use forecaster::state_from_report;
pub use ingest::IngestError;
pub use ingest::load_events;
pub use learning::LearningEngine;
pub use learning::LearningOutcome;
pub use learning::drift_alerts;
pub use ledger::TrustLedger;
pub use ledger::build_ledger_entry;
pub use ledger::verify_chain;
pub use memory::InMemoryGovernanceStore;
pub use memory::InMemoryVulnCatalog;
pub use session::DEFAULT_SESSION_WINDOW_MINUTES;
pub use session::SessionBuilder;
pub use vuln::VulnIntel;
