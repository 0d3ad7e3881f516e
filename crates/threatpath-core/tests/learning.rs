// threatpath-core/tests/learning.rs
// ============================================================================
// Module: Learning Engine Tests
// Description: Momentum updates, streaks, drift samples, and the ledger.
// ============================================================================
//! ## Overview
//! Exercises the adaptive feedback loop end to end over the in-memory
//! governance store: genesis installation, tightening on rollbacks,
//! relaxation on successes, drift-sample alerting, single-active-config
//! preservation, and ledger monotonicity.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use threatpath_core::ExecutionRecord;
use threatpath_core::ExecutionReport;
use threatpath_core::ExecutionStatus;
use threatpath_core::GovernanceStore;
use threatpath_core::InMemoryGovernanceStore;
use threatpath_core::LearningEngine;
use threatpath_core::MetricName;
use threatpath_core::Timestamp;
use threatpath_core::TrendDirection;
use threatpath_core::UrgencyLevel;

/// Fixed feedback time used across assertions.
fn now() -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000)
}

/// Builds an execution record with the given status and KEV flag.
fn record(status: ExecutionStatus, is_kev: bool) -> ExecutionRecord {
    ExecutionRecord {
        action_type: "Isolate Host".to_string(),
        final_status: status,
        urgency: UrgencyLevel::High,
        requires_approval: false,
        domain: Some("network".to_string()),
        is_kev,
    }
}

/// Builds a report from records.
fn report(executions: Vec<ExecutionRecord>) -> ExecutionReport {
    ExecutionReport {
        report_id: Some("r-1".to_string()),
        script_filename: None,
        executions,
    }
}

#[test]
fn genesis_installs_once() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    let first = engine.active_or_genesis(now()).unwrap();
    let second = engine.active_or_genesis(now()).unwrap();

    assert_eq!(first.version_id.as_str(), "v1.0-genesis");
    assert_eq!(first.version_id, second.version_id);
    assert!((first.containment_threshold - 0.6).abs() < f64::EPSILON);
    assert!((first.disruptive_threshold - 0.85).abs() < f64::EPSILON);
    assert_eq!(first.trend(), TrendDirection::Stable);
}

#[test]
fn kev_rollbacks_tighten_hard() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    let outcome = engine
        .process_execution_feedback(
            &report(vec![
                record(ExecutionStatus::RolledBack, true),
                record(ExecutionStatus::RolledBack, false),
            ]),
            now(),
        )
        .unwrap();

    // raw delta = -(2 * 0.1 * (1 + 1)) = -0.4, clamped to the momentum floor.
    let config = &outcome.configuration;
    assert!(config.trust_momentum < 0.0);
    assert!((config.trust_momentum + 0.35).abs() < 1e-9);
    assert!(config.containment_threshold > 0.6);
    assert!((config.containment_threshold - 0.95).abs() < 1e-9);
    assert_eq!(config.failure_streak, 1);
    assert_eq!(config.success_streak, 0);

    let momentum_sample = outcome
        .drift_samples
        .iter()
        .find(|sample| sample.metric_name == MetricName::TrustMomentum)
        .expect("momentum sample");
    assert!(momentum_sample.alert_triggered);
    assert!(outcome.narrative.contains("KEV-related failure"));
}

#[test]
fn plain_rollbacks_tighten_without_alert() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    let outcome = engine
        .process_execution_feedback(
            &report(vec![
                record(ExecutionStatus::RolledBack, false),
                record(ExecutionStatus::Failed, false),
            ]),
            now(),
        )
        .unwrap();

    // raw delta = -(2 * 0.1) = -0.2; inside the alert-free band.
    let config = &outcome.configuration;
    assert!((config.trust_momentum + 0.2).abs() < 1e-9);
    assert!((config.containment_threshold - 0.8).abs() < 1e-9);
    assert_eq!(config.failure_streak, 1);

    let momentum_sample = outcome
        .drift_samples
        .iter()
        .find(|sample| sample.metric_name == MetricName::TrustMomentum)
        .expect("momentum sample");
    assert!(!momentum_sample.alert_triggered);
}

#[test]
fn successes_relax_thresholds() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    let outcome = engine
        .process_execution_feedback(
            &report(vec![
                record(ExecutionStatus::Success, true),
                record(ExecutionStatus::Success, false),
                record(ExecutionStatus::Success, false),
            ]),
            now(),
        )
        .unwrap();

    let config = &outcome.configuration;
    assert!(config.trust_momentum > 0.0);
    assert!(config.containment_threshold < 0.6);
    assert_eq!(config.success_streak, 1);
    assert_eq!(config.failure_streak, 0);
    assert_eq!(config.trend(), TrendDirection::Relaxing);
    assert!(outcome.narrative.contains("KEV vulnerability mitigated"));
}

#[test]
fn script_generation_counts_as_success() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    let mut script_report = report(vec![record(ExecutionStatus::Failed, false)]);
    script_report.script_filename = Some("respond_2026.sh".to_string());
    let outcome = engine.process_execution_feedback(&script_report, now()).unwrap();

    assert!(outcome.configuration.trust_momentum > 0.0);
    assert_eq!(outcome.configuration.failure_streak, 0);
    assert!(outcome.narrative.starts_with("Script generated"));
}

#[test]
fn bounds_hold_across_many_cycles() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    for cycle in 0 .. 30 {
        let status = if cycle % 3 == 0 {
            ExecutionStatus::RolledBack
        } else {
            ExecutionStatus::Success
        };
        let outcome = engine
            .process_execution_feedback(&report(vec![record(status, cycle % 2 == 0)]), now())
            .unwrap();
        let config = &outcome.configuration;
        assert!(config.trust_momentum >= -0.35 && config.trust_momentum <= 0.35);
        assert!(config.containment_threshold >= 0.40 && config.containment_threshold <= 0.95);
        assert!(config.disruptive_threshold >= 0.60 && config.disruptive_threshold <= 1.00);
    }
    // Exactly one configuration stays active through every cycle.
    let active = engine.store().active_configuration().unwrap().expect("active configuration");
    assert!(active.is_active);
}

#[test]
fn ledger_append_is_monotonic() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    let before = engine.store().ledger_entry_count().unwrap();
    engine
        .process_execution_feedback(&report(vec![record(ExecutionStatus::Success, false)]), now())
        .unwrap();
    let between = engine.store().ledger_entry_count().unwrap();
    engine
        .process_execution_feedback(&report(vec![record(ExecutionStatus::Success, false)]), now())
        .unwrap();
    let after = engine.store().ledger_entry_count().unwrap();

    assert!(between > before);
    assert!(after > between);
}

#[test]
fn governance_status_reflects_state() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    engine
        .process_execution_feedback(
            &report(vec![
                record(ExecutionStatus::RolledBack, true),
                record(ExecutionStatus::RolledBack, false),
            ]),
            now(),
        )
        .unwrap();
    let status = engine.governance_status(now()).unwrap();

    assert!(status.ledger_integrity);
    assert_eq!(status.ledger_entry_count, 1);
    assert_eq!(status.trend, TrendDirection::Tightening);
    assert!(!status.recent_ledger_entries.is_empty());
    assert!(status.sample_series.contains_key("trust_momentum"));
    // Severe negative momentum raises a drift alert at read time.
    assert!(status.drift_alerts.iter().any(|alert| alert.starts_with("CRITICAL DRIFT")));
}

#[test]
fn failure_streak_raises_drift_alert() {
    let engine = LearningEngine::new(InMemoryGovernanceStore::new());
    for _ in 0 .. 3 {
        engine
            .process_execution_feedback(
                &report(vec![record(ExecutionStatus::Failed, false)]),
                now(),
            )
            .unwrap();
    }
    let status = engine.governance_status(now()).unwrap();
    assert_eq!(status.configuration.failure_streak, 3);
    assert!(status.drift_alerts.iter().any(|alert| alert.starts_with("FAILURE STREAK")));
}
