// threatpath-core/tests/analyzer.rs
// ============================================================================
// Module: Path Analyzer Tests
// Description: Scoring, discovery, enrichment, and degradation behavior.
// ============================================================================
//! ## Overview
//! Exercises the path analyzer against the KEV exploit chain, pattern
//! discovery in raw text, technique inference, summary-line fallbacks, and
//! the empty-session contract.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use threatpath_core::BusinessRiskLevel;
use threatpath_core::PathAnalyzer;
use threatpath_core::Session;
use threatpath_core::SessionId;
use threatpath_core::Timestamp;
use threatpath_core::runtime::discover_vulnerabilities;

use common::KEV_CVE;
use common::empty_intel;
use common::event;
use common::event_on_host;
use common::intel;
use common::kev_catalog;
use common::single_session;
use common::with_cve;

/// Fixed report generation time used across assertions.
fn now() -> Timestamp {
    Timestamp::from_unix_millis(1_700_003_600_000)
}

#[test]
fn kev_exploit_chain_scores_high() {
    let session = single_session(vec![
        with_cve(event_on_host("e1", Some("T1190"), 0, "web01"), KEV_CVE),
        event_on_host("e2", Some("T1059"), 5, "db01"),
        event_on_host("e3", Some("T1021"), 9, "app01"),
    ]);
    let intel = intel(kev_catalog());
    let analyzer = PathAnalyzer::new(&intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    // diversity 30 + volume log10(4)*10, escalated by the 1.5 KEV multiplier.
    assert!(report.path_anomaly_score >= 40.0);
    assert!(report.path_anomaly_score <= 100.0);
    assert_eq!(report.business_risk_level, BusinessRiskLevel::High);
    assert_eq!(report.blast_radius, vec!["web01", "db01", "app01"]);
    assert_eq!(report.root_cause_node.as_str(), "e1");

    let kev_line = report.vulnerability_summary.first().expect("summary line");
    assert!(kev_line.starts_with("CVE-2021-44228: Apache Log4j2"));
    assert!(kev_line.ends_with("[KEV]"));
    assert!(report.tactical_narrative.contains("Known Exploited Vulnerabilities"));
    assert!(report.plain_language_summary.starts_with("CRITICAL:"));
}

#[test]
fn discovery_patterns_cover_all_three_forms() {
    let (cves, cwes) = discover_vulnerabilities(
        "blocked cve-2024-12345 probe; classified CWE-89; payload {\"cwe_id\": \"693\"}",
    );
    assert_eq!(cves.len(), 1);
    assert_eq!(cves[0].as_str(), "CVE-2024-12345");
    let cwe_ids: Vec<&str> = cwes.iter().map(|id| id.as_str()).collect();
    assert_eq!(cwe_ids, vec!["CWE-89", "CWE-693"]);
}

#[test]
fn technique_inferred_from_discovered_cwe() {
    let mut raw = event("e1", None, 0);
    raw.raw_text = Some("zap finding: sql injection CWE-89 on /login".to_string());
    let session = single_session(vec![raw]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    // CWE-89 implies exploitation of a public-facing application.
    assert!(report.observed_techniques.iter().any(|technique| technique.as_str() == "T1190"));
    assert!(
        report
            .vulnerability_summary
            .iter()
            .any(|line| line.starts_with("CWE-89: SQL Injection"))
    );
}

#[test]
fn heuristic_cwes_produce_summary_lines() {
    let session = single_session(vec![event("e1", Some("T1110"), 0)]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    // Brute force carries CWE-307/CWE-521 heuristics; both humanize.
    assert!(report.vulnerability_summary.iter().any(|line| line.starts_with("CWE-307:")));
    assert!(report.vulnerability_summary.iter().any(|line| line.starts_with("CWE-521:")));
}

#[test]
fn behavioral_fallback_when_no_identifiers() {
    let session = single_session(vec![event("e1", Some("T1595"), 0)]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    // Active scanning has no CWE heuristics, so the summary falls back to
    // behavioral detection lines.
    assert_eq!(report.vulnerability_summary, vec![
        "Behavioral Detection: Active Scanning (T1595)".to_string()
    ]);
}

#[test]
fn empty_session_yields_no_report() {
    let session = Session {
        session_id: SessionId::from("ghost_1"),
        surrogate: "ghost".to_string(),
        start_time: Timestamp::from_unix_millis(0),
        end_time: Timestamp::from_unix_millis(0),
        events: Vec::new(),
        is_high_priority: false,
    };
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    assert!(analyzer.analyze(&session, now()).is_none());
}

#[test]
fn recon_session_stays_informational_band() {
    let session = single_session(vec![event("e1", Some("T1595"), 0)]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    assert!(report.path_anomaly_score <= 20.0);
    assert!(matches!(
        report.business_risk_level,
        BusinessRiskLevel::Informational | BusinessRiskLevel::Low
    ));
}

#[test]
fn prediction_vector_follows_deepest_phase() {
    let session = single_session(vec![
        event("e1", Some("T1078"), 0),
        event("e2", Some("T1021"), 5),
    ]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    // Lateral Movement is the deepest phase; its branches lead the vector.
    let phases: Vec<&str> =
        report.prediction_vector.iter().map(|branch| branch.next_phase.as_str()).collect();
    assert_eq!(phases, vec!["Collection", "Exfiltration", "Command and Control"]);
}

#[test]
fn event_graph_links_consecutive_events() {
    let session = single_session(vec![
        event("e1", Some("T1190"), 0),
        event("e2", Some("T1059"), 2),
        event("e3", None, 4),
    ]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let graph = analyzer.build_graph(&session);

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 2);
    assert!((graph.edges[0].delta_seconds - 120.0).abs() < f64::EPSILON);
    assert_eq!(graph.root().expect("root").event_id.as_str(), "e1");
    assert_eq!(graph.nodes[0].phase, "Initial Access");
    assert_eq!(graph.nodes[2].phase, "Unknown");
}

#[test]
fn event_summary_counts_by_type() {
    let mut auth = event("e2", None, 1);
    auth.event_type = "auth_failure".to_string();
    let session = single_session(vec![event("e1", Some("T1110"), 0), auth]);
    let analyzer_intel = empty_intel();
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    assert_eq!(report.event_summary.get("security_alert"), Some(&1));
    assert_eq!(report.event_summary.get("auth_failure"), Some(&1));
    assert!(report.tactical_narrative.contains("authentication failures"));
}

#[test]
fn cwe_clusters_exclude_unknown_abstractions() {
    let session = single_session(vec![with_cve(
        event_on_host("e1", Some("T1190"), 0, "web01"),
        KEV_CVE,
    )]);
    let analyzer_intel = intel(kev_catalog());
    let analyzer = PathAnalyzer::new(&analyzer_intel);
    let report = analyzer.analyze(&session, now()).expect("report");

    assert!(report.cwe_clusters.contains(&"Class".to_string()));
    assert!(report.cwe_clusters.contains(&"Base".to_string()));
    assert!(!report.cwe_clusters.contains(&"Unknown".to_string()));
}
