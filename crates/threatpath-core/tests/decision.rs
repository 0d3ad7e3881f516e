// threatpath-core/tests/decision.rs
// ============================================================================
// Module: Decision Engine Tests
// Description: Correlation, arbitration, urgency, and approval behavior.
// ============================================================================
//! ## Overview
//! Exercises campaign correlation, the KEV auto-containment override,
//! confidence-dependent action selection, cost rejections, the monitoring
//! fallback, and the urgency ladder.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use threatpath_core::ActionClass;
use threatpath_core::ActionTargetKind;
use threatpath_core::CurrentState;
use threatpath_core::DecisionEngine;
use threatpath_core::PredictionSummary;
use threatpath_core::SessionId;
use threatpath_core::TechniqueId;
use threatpath_core::TrajectoryForecaster;
use threatpath_core::UrgencyLevel;
use threatpath_core::VulnIntel;
use threatpath_core::runtime::extract_principal;

use common::KEV_CVE;
use common::empty_intel;
use common::intel;
use common::kev_catalog;

/// Builds a forecast through the real forecaster.
fn forecast(
    cache: &VulnIntel,
    session_id: &str,
    techniques: &[&str],
    hosts: &[&str],
    vulnerabilities: &[&str],
    risk: f64,
) -> PredictionSummary {
    let state = CurrentState {
        observed_techniques: techniques.iter().map(|id| TechniqueId::from(*id)).collect(),
        host_scope: hosts.iter().map(ToString::to_string).collect(),
        observed_vulnerabilities: vulnerabilities.iter().map(ToString::to_string).collect(),
        graph_depth: techniques.len(),
    };
    TrajectoryForecaster::new(cache).predict(&SessionId::from(session_id), &state, risk)
}

#[test]
fn principal_extraction_handles_urls_and_prefixes() {
    assert_eq!(extract_principal("https://shop.example.com/checkout"), "shop.example.com");
    assert_eq!(extract_principal("alice_3"), "alice");
    assert_eq!(extract_principal("standalone"), "standalone");
}

#[test]
fn kev_chain_isolates_host_without_approval() {
    let cache = intel(kev_catalog());
    let summary = forecast(
        &cache,
        "webfarm_1",
        &["T1190", "T1059", "T1021"],
        &["web01", "db01", "app01"],
        &[KEV_CVE],
        54.0,
    );
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(std::slice::from_ref(&summary));
    let ctx = contexts.get(&summary.session_id).expect("context");
    assert!(ctx.group_is_kev);

    let decision = engine.evaluate(&summary, ctx);
    let action = decision.recommended_actions.first().expect("primary action");

    assert_eq!(action.action_type, "Isolate Host");
    assert!(!action.requires_approval);
    assert_eq!(action.action_class, ActionClass::Containment);
    assert!(action.vulnerability_details.is_kev);
    assert_eq!(decision.urgency_level, UrgencyLevel::Critical);
    assert_eq!(action.target.kind, ActionTargetKind::Host);
    assert_eq!(action.target.identifier, "app01");
    assert!(decision.priority_rank >= 2_000);
}

#[test]
fn low_confidence_lateral_block_falls_to_auditing() {
    let cache = empty_intel();
    let summary = forecast(&cache, "host42_1", &["T1078"], &["host42"], &[], 13.0);
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(std::slice::from_ref(&summary));
    let decision = engine.evaluate(&summary, contexts.get(&summary.session_id).expect("context"));

    let action = decision.recommended_actions.first().expect("primary action");
    assert_eq!(action.action_type, "Enable Logon Failure Auditing");

    // The higher-impact candidate was considered and rejected with reasons.
    let rejected = decision
        .rejected_actions
        .iter()
        .find(|candidate| candidate.candidate_action == "Disable Account")
        .expect("rejected disable account");
    assert!(!rejected.rejection_reasons.is_empty());
}

#[test]
fn high_confidence_lateral_block_disables_account() {
    let cache = empty_intel();
    let mut summary = forecast(&cache, "host42_1", &["T1078"], &["host42"], &[], 13.0);
    summary.aggregate_confidence = 0.7;
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(std::slice::from_ref(&summary));
    let decision = engine.evaluate(&summary, contexts.get(&summary.session_id).expect("context"));

    let action = decision.recommended_actions.first().expect("primary action");
    assert_eq!(action.action_type, "Disable Account");
    assert_eq!(action.action_class, ActionClass::Disruptive);
    assert!(action.requires_approval);
    assert_eq!(action.target.kind, ActionTargetKind::User);
    assert_eq!(action.target.identifier, "host42");
}

#[test]
fn pure_recon_downgrades_to_monitoring() {
    let cache = empty_intel();
    let summary = forecast(&cache, "scanner_1", &["T1595"], &["scanner"], &[], 13.0);
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(std::slice::from_ref(&summary));
    let decision = engine.evaluate(&summary, contexts.get(&summary.session_id).expect("context"));

    let action = decision.recommended_actions.first().expect("primary action");
    assert!(
        action.action_type == "Monitor User Behavior" || action.action_type == "Block Inbound IP"
    );
    assert_eq!(decision.urgency_level, UrgencyLevel::Low);
}

#[test]
fn empty_scenarios_fall_back_to_monitoring() {
    let cache = empty_intel();
    let mut summary = forecast(&cache, "idle_1", &["T1595"], &[], &[], 0.0);
    summary.predicted_scenarios.clear();
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(std::slice::from_ref(&summary));
    let decision = engine.evaluate(&summary, contexts.get(&summary.session_id).expect("context"));

    let action = decision.recommended_actions.first().expect("primary action");
    assert_eq!(action.action_type, "Monitor User Behavior");
    assert_eq!(decision.priority_rank, 0);
    assert_eq!(decision.decision_explainability.why_now, "No predicted threats found.");
}

#[test]
fn expensive_actions_reject_improbable_scenarios() {
    let cache = empty_intel();
    let mut summary = forecast(&cache, "ops_1", &["T1190"], &["a", "b"], &[], 60.0);
    // Squash every scenario into the improbable band; high confidence keeps
    // the threshold check green so only the cost check can reject.
    summary.aggregate_confidence = 0.9;
    for scenario in &mut summary.predicted_scenarios {
        scenario.probability = 0.15;
    }
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(std::slice::from_ref(&summary));
    let decision = engine.evaluate(&summary, contexts.get(&summary.session_id).expect("context"));

    let isolate = decision
        .rejected_actions
        .iter()
        .find(|candidate| candidate.candidate_action == "Isolate Host")
        .expect("rejected isolate");
    assert!(isolate.rejection_reasons.iter().any(|reason| reason.contains("High Cost")));
}

#[test]
fn campaign_correlation_boosts_confidence() {
    let cache = empty_intel();
    let first = forecast(&cache, "alice_1", &["T1078"], &["h1", "h2"], &[], 20.0);
    let second = forecast(&cache, "alice_2", &["T1110"], &["h1", "h2"], &[], 20.0);
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(&[first.clone(), second]);

    let ctx = contexts.get(&first.session_id).expect("context");
    assert_eq!(ctx.principal_id, "alice");
    assert_eq!(ctx.session_count, 2);
    assert!((ctx.confidence_boost - 1.3).abs() < 1e-9);
    assert!(ctx.correlation_reason.contains("2 correlated sessions"));
}

#[test]
fn disruptive_invariant_holds_for_every_decision() {
    let cache = intel(kev_catalog());
    let forecasts = vec![
        forecast(&cache, "webfarm_1", &["T1190", "T1059", "T1021"], &["w", "d", "a"], &[KEV_CVE], 54.0),
        forecast(&cache, "host42_1", &["T1078"], &["host42"], &[], 13.0),
        forecast(&cache, "scanner_1", &["T1595"], &["scanner"], &[], 13.0),
    ];
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(&forecasts);
    for summary in &forecasts {
        let decision =
            engine.evaluate(summary, contexts.get(&summary.session_id).expect("context"));
        assert!(!decision.recommended_actions.is_empty());
        for rejected in &decision.rejected_actions {
            assert!(!rejected.rejection_reasons.is_empty());
        }
        for action in &decision.recommended_actions {
            let disruptive_name = ["Block", "Isolate", "Disable", "Reset", "Terminate"]
                .iter()
                .any(|keyword| action.action_type.contains(keyword));
            if disruptive_name {
                assert!(
                    action.requires_approval
                        || (action.vulnerability_details.is_kev
                            && action.action_class == ActionClass::Containment)
                );
            }
        }
    }
}
