// threatpath-core/tests/pipeline.rs
// ============================================================================
// Module: End-to-End Pipeline Tests
// Description: Events through sessions, reports, forecasts, and decisions.
// ============================================================================
//! ## Overview
//! Drives the full reasoning chain over the in-memory catalog and checks
//! the cross-stage contracts: session-id joins, artifact serialization
//! stability, and the KEV exploit chain outcome end to end.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use threatpath_core::ActionClass;
use threatpath_core::DecisionEngine;
use threatpath_core::PathAnalyzer;
use threatpath_core::PathReport;
use threatpath_core::PredictionSummary;
use threatpath_core::ResponseDecision;
use threatpath_core::Timestamp;
use threatpath_core::TrajectoryForecaster;
use threatpath_core::UrgencyLevel;
use threatpath_core::runtime::state_from_report;

use common::KEV_CVE;
use common::event_on_host;
use common::intel;
use common::kev_catalog;
use common::sessionize;
use common::with_cve;

#[test]
fn kev_exploit_chain_flows_to_critical_isolation() {
    let events = vec![
        with_cve(event_on_host("e1", Some("T1190"), 0, "web01"), KEV_CVE),
        event_on_host("e2", Some("T1059"), 5, "db01"),
        event_on_host("e3", Some("T1021"), 9, "app01"),
    ];
    let cache = intel(kev_catalog());
    let now = Timestamp::from_unix_millis(1_700_003_600_000);

    // Stage C2: one behavioral session.
    let sessions = sessionize(events);
    assert_eq!(sessions.len(), 1);

    // Stage C3: the path report carries the KEV escalation.
    let analyzer = PathAnalyzer::new(&cache);
    let reports: Vec<PathReport> =
        sessions.iter().filter_map(|session| analyzer.analyze(session, now)).collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].path_anomaly_score >= 40.0);

    // Stage C4: forecasts join by session id.
    let forecaster = TrajectoryForecaster::new(&cache);
    let forecasts: Vec<PredictionSummary> = reports
        .iter()
        .map(|report| {
            let state = state_from_report(report);
            forecaster.predict(&report.session_id, &state, report.path_anomaly_score)
        })
        .collect();
    assert_eq!(forecasts.len(), reports.len());
    assert_eq!(forecasts[0].session_id, reports[0].session_id);
    assert!(forecasts[0].aggregate_confidence > 0.7);

    // Stage C5: the decision isolates the last blast-radius host, auto
    // approved under the KEV containment override.
    let engine = DecisionEngine::new(&cache);
    let contexts = engine.analyze_correlations(&forecasts);
    let decisions: Vec<ResponseDecision> = forecasts
        .iter()
        .map(|forecast| {
            engine.evaluate(forecast, contexts.get(&forecast.session_id).expect("context"))
        })
        .collect();

    let decision = &decisions[0];
    assert_eq!(decision.session_id, reports[0].session_id);
    assert_eq!(decision.urgency_level, UrgencyLevel::Critical);
    let action = decision.recommended_actions.first().expect("primary action");
    assert_eq!(action.action_type, "Isolate Host");
    assert_eq!(action.action_class, ActionClass::Containment);
    assert!(!action.requires_approval);
    assert_eq!(action.target.identifier, "app01");
}

#[test]
fn artifacts_round_trip_through_json() {
    let events = vec![
        with_cve(event_on_host("e1", Some("T1190"), 0, "web01"), KEV_CVE),
        event_on_host("e2", Some("T1059"), 5, "db01"),
    ];
    let cache = intel(kev_catalog());
    let now = Timestamp::from_unix_millis(1_700_003_600_000);

    let sessions = sessionize(events);
    let analyzer = PathAnalyzer::new(&cache);
    let report = analyzer.analyze(&sessions[0], now).expect("report");

    let encoded = serde_json::to_string(&report).expect("encode report");
    let decoded: PathReport = serde_json::from_str(&encoded).expect("decode report");
    assert_eq!(report, decoded);

    let forecaster = TrajectoryForecaster::new(&cache);
    let forecast =
        forecaster.predict(&report.session_id, &state_from_report(&report), report.path_anomaly_score);
    let encoded = serde_json::to_string(&forecast).expect("encode forecast");
    let decoded: PredictionSummary = serde_json::from_str(&encoded).expect("decode forecast");
    assert_eq!(forecast, decoded);
}

#[test]
fn forecast_cardinality_matches_reports() {
    let events = vec![
        event_on_host("e1", Some("T1595"), 0, "scanner"),
        event_on_host("e2", Some("T1110"), 200, "ws1"),
    ];
    let cache = intel(kev_catalog());
    let now = Timestamp::from_unix_millis(1_700_003_600_000);

    // Two windows, two sessions, two reports, two forecasts.
    let sessions = sessionize(events);
    assert_eq!(sessions.len(), 2);
    let analyzer = PathAnalyzer::new(&cache);
    let reports: Vec<PathReport> =
        sessions.iter().filter_map(|session| analyzer.analyze(session, now)).collect();
    assert_eq!(reports.len(), 2);

    let forecaster = TrajectoryForecaster::new(&cache);
    let forecasts: Vec<PredictionSummary> = reports
        .iter()
        .map(|report| {
            forecaster.predict(&report.session_id, &state_from_report(report), report.path_anomaly_score)
        })
        .collect();
    assert_eq!(forecasts.len(), reports.len());
}
