// threatpath-core/tests/proptest_invariants.rs
// ============================================================================
// Module: Property-Based Invariant Tests
// Description: Score, probability, and chain invariants under random input.
// ============================================================================
//! ## Overview
//! Property coverage for the declared ranges: anomaly scores stay within
//! [0, 100], forecast scenarios stay sorted and bounded, learning keeps the
//! governance bands, and the ledger chain verifies for arbitrary payload
//! content while rejecting any mutation.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use proptest::prelude::*;
use threatpath_core::CurrentState;
use threatpath_core::ExecutionRecord;
use threatpath_core::ExecutionReport;
use threatpath_core::ExecutionStatus;
use threatpath_core::InMemoryGovernanceStore;
use threatpath_core::LEDGER_GENESIS_HASH;
use threatpath_core::LearningEngine;
use threatpath_core::PathAnalyzer;
use threatpath_core::SessionId;
use threatpath_core::TechniqueId;
use threatpath_core::Timestamp;
use threatpath_core::TrajectoryForecaster;
use threatpath_core::UrgencyLevel;
use threatpath_core::runtime::build_ledger_entry;
use threatpath_core::runtime::verify_chain;

use common::empty_intel;
use common::event;
use common::sessionize;

/// Pool of techniques the generators draw from.
const TECHNIQUE_POOL: &[&str] = &[
    "T1595", "T1592", "T1190", "T1059", "T1505", "T1078", "T1110", "T1046", "T1083", "T1021",
    "T1003", "T1560", "T1041", "T1562", "T9999",
];

proptest! {
    #[test]
    fn anomaly_scores_stay_in_band(
        technique_picks in proptest::collection::vec(0usize .. TECHNIQUE_POOL.len(), 1 .. 12),
    ) {
        let events: Vec<_> = technique_picks
            .iter()
            .enumerate()
            .map(|(index, pick)| {
                event(&format!("e{index}"), Some(TECHNIQUE_POOL[*pick]), index as i64)
            })
            .collect();
        let sessions = sessionize(events);
        let cache = empty_intel();
        let analyzer = PathAnalyzer::new(&cache);
        for session in &sessions {
            let report = analyzer
                .analyze(session, Timestamp::from_unix_millis(0))
                .expect("non-empty session");
            prop_assert!(report.path_anomaly_score >= 0.0);
            prop_assert!(report.path_anomaly_score <= 100.0);
        }
    }

    #[test]
    fn forecasts_stay_sorted_and_bounded(
        technique_picks in proptest::collection::vec(0usize .. TECHNIQUE_POOL.len(), 0 .. 6),
        host_count in 0usize .. 4,
        risk in 0.0f64 .. 100.0,
    ) {
        let state = CurrentState {
            observed_techniques: technique_picks
                .iter()
                .map(|pick| TechniqueId::from(TECHNIQUE_POOL[*pick]))
                .collect(),
            host_scope: (0 .. host_count).map(|index| format!("host{index}")).collect(),
            observed_vulnerabilities: Vec::new(),
            graph_depth: technique_picks.len(),
        };
        let cache = empty_intel();
        let forecaster = TrajectoryForecaster::new(&cache);
        let summary = forecaster.predict(&SessionId::from("prop_1"), &state, risk);

        prop_assert!(summary.aggregate_confidence >= 0.0);
        prop_assert!(summary.aggregate_confidence <= 1.0);
        prop_assert!(summary.predicted_scenarios.len() <= 5);
        for scenario in &summary.predicted_scenarios {
            prop_assert!(scenario.probability >= 0.0);
            prop_assert!(scenario.probability <= 1.0);
            prop_assert!(!scenario.sequence.is_empty());
            prop_assert!(scenario.sequence.len() <= 3);
        }
        for pair in summary.predicted_scenarios.windows(2) {
            prop_assert!(pair[0].probability >= pair[1].probability);
        }
    }

    #[test]
    fn learning_bands_hold_for_any_feedback(
        statuses in proptest::collection::vec(0u8 .. 3, 1 .. 20),
        kev_flags in proptest::collection::vec(any::<bool>(), 1 .. 20),
    ) {
        let engine = LearningEngine::new(InMemoryGovernanceStore::new());
        for (cycle, status) in statuses.iter().enumerate() {
            let final_status = match status {
                0 => ExecutionStatus::Success,
                1 => ExecutionStatus::Failed,
                _ => ExecutionStatus::RolledBack,
            };
            let report = ExecutionReport {
                report_id: Some(format!("r{cycle}")),
                script_filename: None,
                executions: vec![ExecutionRecord {
                    action_type: "Isolate Host".to_string(),
                    final_status,
                    urgency: UrgencyLevel::High,
                    requires_approval: false,
                    domain: None,
                    is_kev: kev_flags[cycle % kev_flags.len()],
                }],
            };
            let outcome = engine
                .process_execution_feedback(&report, Timestamp::from_unix_millis(cycle as i64))
                .expect("feedback cycle");
            let config = &outcome.configuration;
            prop_assert!(config.trust_momentum >= -0.35 && config.trust_momentum <= 0.35);
            prop_assert!(
                config.containment_threshold >= 0.40 && config.containment_threshold <= 0.95
            );
            prop_assert!(
                config.disruptive_threshold >= 0.60 && config.disruptive_threshold <= 1.00
            );
        }
    }

    #[test]
    fn ledger_chain_verifies_and_rejects_mutation(
        payload_values in proptest::collection::vec("[a-z0-9]{1,16}", 1 .. 8),
        tamper_index in any::<prop::sample::Index>(),
    ) {
        let mut entries = Vec::new();
        let mut previous = LEDGER_GENESIS_HASH.to_string();
        for (index, value) in payload_values.iter().enumerate() {
            let entry = build_ledger_entry(
                previous.clone(),
                Timestamp::from_unix_millis(index as i64 * 1_000),
                "LEARNING_UPDATE",
                serde_json::json!({"value": value}),
                "LearningEngine",
            )
            .expect("entry");
            previous = entry.hash_id.clone();
            entries.push(entry);
        }
        prop_assert!(verify_chain(&entries));

        let target = tamper_index.index(entries.len());
        entries[target].actor = "Mallory".to_string();
        prop_assert!(!verify_chain(&entries));
    }
}
