// threatpath-core/tests/forecaster.rs
// ============================================================================
// Module: Trajectory Forecaster Tests
// Description: Seeding, traversal modifiers, ranking, and confidence.
// ============================================================================
//! ## Overview
//! Exercises seed supersession, the lateral-movement and KEV modifiers,
//! scenario ranking invariants, reaction-window compression, and narrative
//! selection.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use threatpath_core::CurrentState;
use threatpath_core::ScenarioRiskLevel;
use threatpath_core::ScenarioType;
use threatpath_core::SessionId;
use threatpath_core::TechniqueId;
use threatpath_core::TrajectoryForecaster;
use threatpath_core::runtime::select_seeds;

use common::KEV_CVE;
use common::empty_intel;
use common::intel;
use common::kev_catalog;

/// Builds a current state from raw parts.
fn state(techniques: &[&str], hosts: &[&str], vulnerabilities: &[&str]) -> CurrentState {
    CurrentState {
        observed_techniques: techniques.iter().map(|id| TechniqueId::from(*id)).collect(),
        host_scope: hosts.iter().map(ToString::to_string).collect(),
        observed_vulnerabilities: vulnerabilities.iter().map(ToString::to_string).collect(),
        graph_depth: techniques.len(),
    }
}

#[test]
fn prerequisite_seeds_are_superseded() {
    let seeds = select_seeds(&state(&["T1078", "T1021"], &["a", "b"], &[]));
    let ids: Vec<&str> = seeds.iter().map(TechniqueId::as_str).collect();
    assert_eq!(ids, vec!["T1021"]);
}

#[test]
fn empty_evidence_falls_back_to_recon_seed() {
    let seeds = select_seeds(&state(&[], &[], &[]));
    let ids: Vec<&str> = seeds.iter().map(TechniqueId::as_str).collect();
    assert_eq!(ids, vec!["T1595"]);
}

#[test]
fn kev_chain_projects_lateral_movement() {
    let cache = intel(kev_catalog());
    let forecaster = TrajectoryForecaster::new(&cache);
    let observed = state(&["T1190", "T1059", "T1021"], &["web01", "db01", "app01"], &[KEV_CVE]);
    let summary = forecaster.predict(&SessionId::from("webfarm_1"), &observed, 54.0);

    // A lateral-movement terminal must survive with meaningful probability.
    let lateral = summary
        .predicted_scenarios
        .iter()
        .find(|scenario| {
            scenario.sequence.last().is_some_and(|terminal| terminal.as_str() == "T1021")
        })
        .expect("lateral scenario");
    assert!(lateral.probability >= 0.2);
    assert_eq!(lateral.risk_level, ScenarioRiskLevel::High);

    assert!(summary.aggregate_confidence > 0.7);
    assert!(summary.mentor_narrative.starts_with("CRITICAL ALERT:"));

    // KEV compresses every reaction window by 40%.
    let top = summary.predicted_scenarios.first().expect("top scenario");
    assert!(
        top.explainability
            .positive_evidence
            .iter()
            .any(|line| line.contains("compressing reaction window by 40%"))
    );
}

#[test]
fn scenarios_are_ranked_and_bounded() {
    let cache = intel(kev_catalog());
    let forecaster = TrajectoryForecaster::new(&cache);
    let observed = state(&["T1190", "T1059", "T1021"], &["web01", "db01", "app01"], &[KEV_CVE]);
    let summary = forecaster.predict(&SessionId::from("webfarm_1"), &observed, 54.0);

    assert!(!summary.predicted_scenarios.is_empty());
    assert!(summary.predicted_scenarios.len() <= 5);
    for pair in summary.predicted_scenarios.windows(2) {
        assert!(pair[0].probability >= pair[1].probability);
    }
    for scenario in &summary.predicted_scenarios {
        assert!(scenario.probability >= 0.0 && scenario.probability <= 1.0);
        assert!(!scenario.sequence.is_empty());
        assert!(scenario.sequence.len() <= 3);
        assert!(scenario.reaction_time_window.min_seconds <= scenario.reaction_time_window.max_seconds);
    }
    assert_eq!(summary.predicted_scenarios[0].scenario_type, ScenarioType::Primary);
    if summary.predicted_scenarios.len() > 1 {
        assert_eq!(summary.predicted_scenarios[1].scenario_type, ScenarioType::Secondary);
    }
}

#[test]
fn singleton_blast_radius_prunes_lateral_movement() {
    let cache = empty_intel();
    let forecaster = TrajectoryForecaster::new(&cache);
    let observed = state(&["T1078"], &["host42"], &[]);
    let summary = forecaster.predict(&SessionId::from("host42_1"), &observed, 13.0);

    assert!(
        summary
            .predicted_scenarios
            .iter()
            .all(|scenario| scenario.sequence.iter().all(|step| step.as_str() != "T1021"))
    );
    // Brute force remains the leading projection.
    let top = summary.predicted_scenarios.first().expect("top scenario");
    assert_eq!(top.sequence[0].as_str(), "T1110");
    assert!((summary.aggregate_confidence - 0.1).abs() < 1e-9);
}

#[test]
fn pure_recon_stays_low_confidence() {
    let cache = empty_intel();
    let forecaster = TrajectoryForecaster::new(&cache);
    let observed = state(&["T1595"], &["scanner"], &[]);
    let summary = forecaster.predict(&SessionId::from("scanner_1"), &observed, 13.0);

    assert!(summary.aggregate_confidence <= 0.3);
    assert!(summary.mentor_narrative.starts_with("RECONNAISSANCE:"));
    assert!(summary.suppression_reason.is_none());
}

#[test]
fn exfiltration_terminal_is_critical() {
    let cache = empty_intel();
    let forecaster = TrajectoryForecaster::new(&cache);
    let observed = state(&["T1021", "T1560"], &["a", "b"], &[]);
    let summary = forecaster.predict(&SessionId::from("ops_1"), &observed, 40.0);

    let exfil = summary
        .predicted_scenarios
        .iter()
        .find(|scenario| {
            scenario.sequence.last().is_some_and(|terminal| terminal.as_str() == "T1041")
        })
        .expect("exfil scenario");
    assert_eq!(exfil.risk_level, ScenarioRiskLevel::Critical);
}

#[test]
fn collection_synergy_boosts_exfiltration() {
    let cache = empty_intel();
    let forecaster = TrajectoryForecaster::new(&cache);

    // T1560 observed: the T1560 -> T1041 transition gains the 1.5 synergy.
    let with_collection = forecaster.predict(
        &SessionId::from("ops_1"),
        &state(&["T1560"], &["a", "b"], &[]),
        40.0,
    );
    let boosted = with_collection
        .predicted_scenarios
        .iter()
        .find(|scenario| scenario.sequence.first().is_some_and(|step| step.as_str() == "T1041"))
        .expect("exfil scenario");
    assert!((boosted.probability - 1.0).abs() < 1e-9);
}

#[test]
fn duplicate_sequences_keep_maximum_probability() {
    let cache = empty_intel();
    let forecaster = TrajectoryForecaster::new(&cache);
    // Both seeds can reach T1003; the merged list must hold it once.
    let observed = state(&["T1059", "T1562"], &["a", "b"], &[]);
    let summary = forecaster.predict(&SessionId::from("ops_1"), &observed, 40.0);

    let count = summary
        .predicted_scenarios
        .iter()
        .filter(|scenario| {
            scenario.sequence.len() == 1 && scenario.sequence[0].as_str() == "T1003"
        })
        .count();
    assert_eq!(count, 1);
}
