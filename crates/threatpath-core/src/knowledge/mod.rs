// threatpath-core/src/knowledge/mod.rs
// ============================================================================
// Module: ThreatPath Knowledge Base
// Description: Static adversary and response intelligence tables.
// Purpose: Single home for the fixed tables shared by analyzer, forecaster,
// and decision engine.
// Dependencies: crate::knowledge submodules
// ============================================================================

//! ## Overview
//! Every fixed table the reasoning stages consult lives here as pure static
//! data: kill-chain ordering, MITRE phase and CWE mappings, the technique
//! transition matrix with dwell-time priors and prerequisites, technique
//! display names, the CWE humanization dictionary, and the response action
//! tables. Tables are tiny; lookups are linear scans over static slices.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod attack;
pub mod response;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attack::CWE_HUMANIZED_NAMES;
pub use attack::CWE_PROGRESSION_MAP;
pub use attack::CWE_TECHNIQUE_INFERENCE;
pub use attack::DEFAULT_DWELL_SECONDS;
pub use attack::FALLBACK_SEED_TECHNIQUE;
pub use attack::KILL_CHAIN_ORDER;
pub use attack::MITRE_CWE_HEURISTICS;
pub use attack::MITRE_PHASE_MAP;
pub use attack::NEXT_PHASE_MAP;
pub use attack::TECHNIQUE_PREREQUISITES;
pub use attack::TRANSITION_MATRIX;
pub use attack::cwe_enabled_techniques;
pub use attack::dwell_prior;
pub use attack::humanize_cwe;
pub use attack::infer_technique_from_cwe;
pub use attack::kill_chain_rank;
pub use attack::next_phase_branches;
pub use attack::technique_heuristic_cwes;
pub use attack::technique_name;
pub use attack::technique_phase;
pub use attack::technique_prerequisites;
pub use attack::transitions_from;
pub use response::ACTION_COSTS;
pub use response::CONFIDENCE_THRESHOLDS;
pub use response::CWE_HEURISTIC_SEVERITY;
pub use response::DISRUPTIVE_KEYWORDS;
pub use response::MITIGATION_GUIDELINES;
pub use response::MONITOR_ACTION;
pub use response::RISK_REDUCTION_MAP;
pub use response::TECHNIQUE_RESPONSE_MAP;
pub use response::action_cost;
pub use response::action_threshold;
pub use response::cwe_heuristic_severity;
pub use response::is_disruptive_action;
pub use response::mitigation_guidelines;
pub use response::response_candidates;
pub use response::risk_reduction;
