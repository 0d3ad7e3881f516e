// threatpath-core/src/runtime/learning.rs
// ============================================================================
// Module: Adaptive Learning Engine
// Description: Trust-momentum model tuned from execution feedback.
// Purpose: Derive new threshold configurations and drift samples per cycle.
// Dependencies: crate::{core, interfaces, runtime::ledger}, rand, serde_json
// ============================================================================

//! ## Overview
//! Each execution report is classified into successes and rollbacks, folded
//! into a bounded EWMA trust momentum, and projected onto the containment
//! and disruptive thresholds. The whole update (deactivate old
//! configuration, activate new, ledger append, drift samples) commits as
//! one atomic bundle; a failed write leaves the prior state intact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::json;
use tracing::info;

use crate::core::ConfigVersionId;
use crate::core::DriftSample;
use crate::core::ExecutionReport;
use crate::core::ExecutionStatus;
use crate::core::GovernanceStatus;
use crate::core::LedgerEntry;
use crate::core::MetricName;
use crate::core::ModelConfiguration;
use crate::core::Timestamp;
use crate::core::UrgencyLevel;
use crate::core::clamp_momentum;
use crate::core::clamp_threshold;
use crate::interfaces::GovernanceError;
use crate::interfaces::GovernanceStore;
use crate::interfaces::GovernanceUpdate;
use crate::runtime::ledger::build_ledger_entry;
use crate::runtime::ledger::verify_chain;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Penalty coefficient per rollback.
pub const LEARNING_ALPHA: f64 = 0.1;
/// Reward coefficient per success.
pub const LEARNING_BETA: f64 = 0.01;
/// EWMA decay applied to the prior momentum.
pub const MOMENTUM_DECAY: f64 = 0.85;
/// Absolute momentum value that triggers a drift alert.
const MOMENTUM_ALERT_BOUNDARY: f64 = 0.25;
/// Containment threshold ceiling that triggers a lockdown alert.
const CONTAINMENT_LOCK_BOUNDARY: f64 = 0.90;
/// Containment threshold floor that triggers a permissiveness alert.
const CONTAINMENT_GUARD_BOUNDARY: f64 = 0.45;
/// Failure streak length that triggers a drift alert.
const FAILURE_STREAK_ALERT: u32 = 3;
/// Ledger entries returned in the status snapshot.
const STATUS_LEDGER_LIMIT: usize = 10;
/// Configuration versions returned in the status snapshot.
const STATUS_HISTORY_LIMIT: usize = 5;
/// Drift samples returned per metric in the status snapshot.
const STATUS_SAMPLE_LIMIT: usize = 100;

// ============================================================================
// SECTION: Learning Outcome
// ============================================================================

/// Result of one feedback cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningOutcome {
    /// Newly activated configuration.
    pub configuration: ModelConfiguration,
    /// Human-readable update narrative.
    pub narrative: String,
    /// Drift samples persisted with the update.
    pub drift_samples: Vec<DriftSample>,
    /// Ledger entry recorded for the update.
    pub ledger_entry: LedgerEntry,
}

// ============================================================================
// SECTION: Learning Engine
// ============================================================================

/// Adaptive trust-momentum engine over a governance store.
pub struct LearningEngine<S: GovernanceStore> {
    /// Backing governance store.
    store: S,
}

impl<S: GovernanceStore> LearningEngine<S> {
    /// Creates a learning engine over the provided store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the engine and returns the backing store.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Returns the active configuration, installing genesis when absent.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the store cannot be read or the
    /// genesis write fails.
    pub fn active_or_genesis(&self, now: Timestamp) -> Result<ModelConfiguration, GovernanceError> {
        if let Some(configuration) = self.store.active_configuration()? {
            return Ok(configuration);
        }
        let genesis = ModelConfiguration::genesis(now);
        self.store.install_genesis(&genesis)?;
        info!(version = %genesis.version_id, "installed genesis trust configuration");
        Ok(genesis)
    }

    /// Folds one execution report into the trust model.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when reading state or committing the
    /// update bundle fails.
    pub fn process_execution_feedback(
        &self,
        report: &ExecutionReport,
        now: Timestamp,
    ) -> Result<LearningOutcome, GovernanceError> {
        let current = self.active_or_genesis(now)?;
        let tally = tally_report(report);

        let mut success_streak = current.success_streak;
        let mut failure_streak = current.failure_streak;
        let raw_delta = if tally.rollbacks > 0 {
            success_streak = 0;
            failure_streak += 1;
            let penalty_mult = 1.0 + tally.kev_failures as f64;
            -(tally.rollbacks as f64 * LEARNING_ALPHA * penalty_mult)
        } else if tally.successes > 0 {
            success_streak += 1;
            failure_streak = 0;
            let mut reward_bonus = (tally.kev_successes as f64).mul_add(0.5, 1.0);
            if tally.high_urgency > 0 {
                reward_bonus += 0.1 * tally.high_urgency as f64;
            }
            tally.successes as f64 * LEARNING_BETA * reward_bonus
        } else {
            0.0
        };

        let new_momentum = clamp_momentum(current.trust_momentum.mul_add(MOMENTUM_DECAY, raw_delta));
        let new_containment = round4(clamp_threshold(
            current.containment_threshold - new_momentum,
            0.40,
            0.95,
            "containment_threshold",
        ));
        let new_disruptive = round4(clamp_threshold(
            new_momentum.mul_add(-0.5, current.disruptive_threshold),
            0.60,
            1.00,
            "disruptive_threshold",
        ));

        let narrative = update_narrative(report, &tally);
        let configuration = ModelConfiguration {
            version_id: mint_version_id(),
            is_active: true,
            containment_threshold: new_containment,
            disruptive_threshold: new_disruptive,
            trust_momentum: new_momentum,
            success_streak,
            failure_streak,
            created_at: now,
        };

        let drift_samples = vec![
            DriftSample {
                timestamp: now,
                metric_name: MetricName::TrustMomentum,
                metric_value: new_momentum,
                alert_triggered: new_momentum.abs() >= MOMENTUM_ALERT_BOUNDARY,
            },
            DriftSample {
                timestamp: now,
                metric_name: MetricName::ContainmentThreshold,
                metric_value: new_containment,
                alert_triggered: new_containment >= CONTAINMENT_LOCK_BOUNDARY
                    || new_containment <= CONTAINMENT_GUARD_BOUNDARY,
            },
            DriftSample {
                timestamp: now,
                metric_name: MetricName::DisruptiveThreshold,
                metric_value: new_disruptive,
                alert_triggered: false,
            },
        ];

        let payload = json!({
            "old_ver": current.version_id.as_str(),
            "new_ver": configuration.version_id.as_str(),
            "source": if report.script_filename.is_some() { "script_gen" } else { "execution" },
            "actions_processed": report.executions.len(),
            "domains_covered": tally.domains.iter().collect::<Vec<_>>(),
            "high_urgency_count": tally.high_urgency,
            "approval_required": tally.approval_required,
            "kev_context": {"successes": tally.kev_successes, "failures": tally.kev_failures},
            "reason": format!("{narrative} (Momentum={new_momentum:.4})"),
        });
        let previous_hash = self.store.last_ledger_hash()?;
        let ledger_entry =
            build_ledger_entry(previous_hash, now, "LEARNING_UPDATE", payload, "LearningEngine")?;

        let update = GovernanceUpdate {
            deactivate_version: current.version_id.clone(),
            new_configuration: configuration.clone(),
            ledger_entry: ledger_entry.clone(),
            drift_samples: drift_samples.clone(),
        };
        self.store.commit_update(&update)?;
        info!(
            old = %current.version_id,
            new = %configuration.version_id,
            momentum = new_momentum,
            "trust model updated"
        );

        Ok(LearningOutcome {
            configuration,
            narrative,
            drift_samples,
            ledger_entry,
        })
    }

    /// Assembles the read-time governance status snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Invalid`] when no configuration is active,
    /// or another variant on backend failure.
    pub fn governance_status(&self, now: Timestamp) -> Result<GovernanceStatus, GovernanceError> {
        let configuration = self.store.active_configuration()?.ok_or_else(|| {
            GovernanceError::Invalid("no active configuration; initialize governance first".to_string())
        })?;
        let entries = self.store.ledger_entries_ascending()?;
        let ledger_integrity = verify_chain(&entries);
        let mut sample_series = BTreeMap::new();
        for metric in [
            MetricName::TrustMomentum,
            MetricName::ContainmentThreshold,
            MetricName::DisruptiveThreshold,
        ] {
            sample_series.insert(
                metric.as_str().to_string(),
                self.store.drift_sample_series(metric, STATUS_SAMPLE_LIMIT)?,
            );
        }
        Ok(GovernanceStatus {
            generated_at: now,
            trend: configuration.trend(),
            drift_alerts: drift_alerts(&configuration),
            ledger_integrity,
            ledger_entry_count: self.store.ledger_entry_count()?,
            recent_ledger_entries: self.store.recent_ledger_entries(STATUS_LEDGER_LIMIT)?,
            model_history: self.store.configuration_history(STATUS_HISTORY_LIMIT)?,
            sample_series,
            configuration,
        })
    }
}

// ============================================================================
// SECTION: Drift Alerts
// ============================================================================

/// Derives drift alerts from the active configuration.
#[must_use]
pub fn drift_alerts(configuration: &ModelConfiguration) -> Vec<String> {
    let mut alerts = Vec::new();
    if configuration.trust_momentum <= -MOMENTUM_ALERT_BOUNDARY {
        alerts.push(format!(
            "CRITICAL DRIFT: Trust momentum is severely negative ({:+.4}). Autonomous actions are heavily restricted. Investigate recent failures.",
            configuration.trust_momentum
        ));
    } else if configuration.trust_momentum >= MOMENTUM_ALERT_BOUNDARY {
        alerts.push(format!(
            "HIGH RELAXATION: Trust momentum is very high ({:+.4}). Thresholds are significantly lowered. Verify no false-positive successes.",
            configuration.trust_momentum
        ));
    }
    if configuration.containment_threshold >= CONTAINMENT_LOCK_BOUNDARY {
        alerts.push(format!(
            "THRESHOLD LOCK: Containment threshold is at {:.1}%. Nearly all actions require human approval; system is in near-lockdown.",
            configuration.containment_threshold * 100.0
        ));
    } else if configuration.containment_threshold <= CONTAINMENT_GUARD_BOUNDARY {
        alerts.push(format!(
            "LOW GUARD: Containment threshold is at {:.1}%. System is highly permissive. Ensure this reflects genuine trust.",
            configuration.containment_threshold * 100.0
        ));
    }
    if configuration.failure_streak >= FAILURE_STREAK_ALERT {
        alerts.push(format!(
            "FAILURE STREAK: {} consecutive failures detected. System is tightening posture. Review recent execution reports.",
            configuration.failure_streak
        ));
    }
    alerts
}

// ============================================================================
// SECTION: Report Classification
// ============================================================================

/// Aggregated counts for one execution report.
#[derive(Debug, Default)]
struct ReportTally {
    /// Rolled-back or failed actions.
    rollbacks: usize,
    /// Successful actions.
    successes: usize,
    /// KEV-tagged successes.
    kev_successes: usize,
    /// KEV-tagged failures.
    kev_failures: usize,
    /// Critical or high urgency actions.
    high_urgency: usize,
    /// Actions that required approval.
    approval_required: usize,
    /// Distinct operational domains covered.
    domains: BTreeSet<String>,
}

/// Classifies the actions of one report.
fn tally_report(report: &ExecutionReport) -> ReportTally {
    let is_script_gen = report.script_filename.is_some();
    let mut tally = ReportTally::default();
    for record in &report.executions {
        if let Some(domain) = &record.domain {
            tally.domains.insert(domain.clone());
        }
        if record.requires_approval {
            tally.approval_required += 1;
        }
        if matches!(record.urgency, UrgencyLevel::Critical | UrgencyLevel::High) {
            tally.high_urgency += 1;
        }
        match record.final_status {
            ExecutionStatus::RolledBack | ExecutionStatus::Failed => {
                tally.rollbacks += 1;
                if record.is_kev {
                    tally.kev_failures += 1;
                }
            }
            ExecutionStatus::Success => {
                tally.successes += 1;
                if record.is_kev {
                    tally.kev_successes += 1;
                }
            }
        }
    }
    // Script generation counts as success for every included action.
    if is_script_gen {
        tally.successes = report.executions.len();
        tally.kev_successes = report.executions.iter().filter(|record| record.is_kev).count();
        tally.rollbacks = 0;
        tally.kev_failures = 0;
    }
    tally
}

/// Builds the human-readable update narrative.
fn update_narrative(report: &ExecutionReport, tally: &ReportTally) -> String {
    if report.script_filename.is_some() {
        let domains = if tally.domains.is_empty() {
            "unknown".to_string()
        } else {
            tally.domains.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        let mut narrative = format!(
            "Script generated for {} action(s) across {domains} domain(s). ",
            report.executions.len()
        );
        if tally.approval_required > 0 {
            narrative
                .push_str(&format!("{} action(s) flagged for manual approval. ", tally.approval_required));
        }
        if tally.high_urgency > 0 {
            narrative
                .push_str(&format!("{} high/critical urgency threat(s) addressed. ", tally.high_urgency));
        }
        narrative.push_str("Trust posture updated based on script coverage.");
        return narrative;
    }
    if tally.rollbacks > 0 {
        let mut narrative = format!("Penalty: {} failure(s). Posture tightened.", tally.rollbacks);
        if tally.kev_failures > 0 {
            narrative.push_str(" (WARNING: KEV-related failure detected)");
        }
        return narrative;
    }
    if tally.successes > 0 {
        let mut narrative = format!("Trust: {} success(es). Posture relaxed.", tally.successes);
        if tally.kev_successes > 0 {
            narrative.push_str(" (SUCCESS: KEV vulnerability mitigated)");
        }
        return narrative;
    }
    "Natural trust momentum decay; no significant events.".to_string()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Mints a fresh configuration version identifier.
fn mint_version_id() -> ConfigVersionId {
    ConfigVersionId::new(format!("v{:08x}", rand::random::<u32>()))
}

/// Rounds to four decimal places.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
