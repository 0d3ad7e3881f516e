// threatpath-core/src/lib.rs
// ============================================================================
// Module: ThreatPath Core Library
// Description: Public API surface for the ThreatPath reasoning engine.
// Purpose: Expose the data model, knowledge base, interfaces, and runtime.
// Dependencies: crate::{core, interfaces, knowledge, runtime}
// ============================================================================

//! ## Overview
//! ThreatPath core implements the four-stage security reasoning engine:
//! session building, attack-path analysis, probabilistic trajectory
//! forecasting, and threshold-gated response decisions, together with the
//! governance computation that tunes autonomous authority from execution
//! feedback. It is backend-agnostic and integrates with catalogs and stores
//! through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod knowledge;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::CatalogError;
pub use interfaces::CveRecord;
pub use interfaces::CweRecord;
pub use interfaces::GovernanceError;
pub use interfaces::GovernanceStore;
pub use interfaces::GovernanceUpdate;
pub use interfaces::VulnCatalog;
pub use runtime::CorrelationContext;
pub use runtime::DecisionEngine;
pub use runtime::InMemoryGovernanceStore;
pub use runtime::InMemoryVulnCatalog;
pub use runtime::IngestError;
pub use runtime::LearningEngine;
pub use runtime::LearningOutcome;
pub use runtime::PathAnalyzer;
pub use runtime::SessionBuilder;
pub use runtime::TrajectoryForecaster;
pub use runtime::TrustLedger;
pub use runtime::VulnIntel;
pub use runtime::load_events;
pub use runtime::verify_chain;
