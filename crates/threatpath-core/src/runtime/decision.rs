// threatpath-core/src/runtime/decision.rs
// ============================================================================
// Module: Decision Engine
// Description: Threshold-gated action selection with campaign correlation.
// Purpose: Transform forecasts into ranked, auditable response decisions.
// Dependencies: crate::{core, knowledge, runtime::vuln}, regex, tracing
// ============================================================================

//! ## Overview
//! The decision engine first correlates forecasts into campaigns by
//! principal, then evaluates each forecast's scenarios against the response
//! knowledge base: candidate actions are accepted when correlation-boosted
//! confidence clears their (possibly urgency-lowered) threshold and the
//! probability justifies their cost. KEV presence forces auto-approved
//! containment; every rejection is recorded with its reasons.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::core::ActionClass;
use crate::core::ActionJustification;
use crate::core::ActionTarget;
use crate::core::ActionTargetKind;
use crate::core::ConfidenceAlignment;
use crate::core::CveId;
use crate::core::DecisionExplainability;
use crate::core::PredictedScenario;
use crate::core::PredictionSummary;
use crate::core::RecommendedAction;
use crate::core::RejectedAction;
use crate::core::ResponseDecision;
use crate::core::RiskReduction;
use crate::core::SessionId;
use crate::core::UrgencyLevel;
use crate::core::VulnerabilityDetails;
use crate::core::clamp_probability;
use crate::knowledge::MONITOR_ACTION;
use crate::knowledge::action_cost;
use crate::knowledge::action_threshold;
use crate::knowledge::cwe_heuristic_severity;
use crate::knowledge::is_disruptive_action;
use crate::knowledge::mitigation_guidelines;
use crate::knowledge::response_candidates;
use crate::knowledge::risk_reduction;
use crate::runtime::vuln::VulnIntel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Decision model version label.
pub const DECISION_MODEL_VERSION: &str = "v4.1-vuln-driven";

/// Per-session contribution to the campaign confidence boost.
const BOOST_PER_SESSION: f64 = 0.15;
/// Upper bound of the campaign confidence boost.
const BOOST_CAP: f64 = 1.6;
/// Urgency override subtracted from action thresholds.
const URGENCY_THRESHOLD_RELIEF: f64 = 0.2;
/// Floor for urgency-relieved thresholds.
const URGENCY_THRESHOLD_FLOOR: f64 = 0.1;
/// CVSS score opening the critical band.
const CRITICAL_CVSS_BOUNDARY: f64 = 9.0;
/// Margin under which a passing action still requires approval.
const BORDERLINE_MARGIN: f64 = 0.05;

// ============================================================================
// SECTION: Correlation
// ============================================================================

/// Campaign correlation context shared by a principal's sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationContext {
    /// Multiplier applied to forecast confidence.
    pub confidence_boost: f64,
    /// Human-readable correlation reason.
    pub correlation_reason: String,
    /// Campaign principal identifier.
    pub principal_id: String,
    /// Correlated session count for the principal.
    pub session_count: usize,
    /// Set when any session in the campaign observed a KEV exploit.
    pub group_is_kev: bool,
    /// Highest CVSS observed across the campaign.
    pub group_max_cvss: f64,
}

/// Returns the compiled URL-host pattern for principal extraction.
fn url_host_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used, reason = "Pattern literal is verified by tests.")]
        let pattern = Regex::new(r"https?://([^/]+)").unwrap();
        pattern
    })
}

/// Extracts the campaign principal from a session identifier.
#[must_use]
pub fn extract_principal(session_id: &str) -> String {
    if let Some(captures) = url_host_pattern().captures(session_id) {
        if let Some(host) = captures.get(1) {
            return host.as_str().to_string();
        }
    }
    match session_id.split_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => session_id.to_string(),
    }
}

/// Normalizes a raw target (URL or host) to a host identifier.
fn normalize_target(target: &str) -> String {
    url_host_pattern()
        .captures(target)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| target.to_string(), |host| host.as_str().to_string())
}

// ============================================================================
// SECTION: Decision Engine
// ============================================================================

/// Forecast-to-decision arbitration engine.
pub struct DecisionEngine<'a> {
    /// Shared vulnerability intelligence cache.
    intel: &'a VulnIntel,
}

impl<'a> DecisionEngine<'a> {
    /// Creates a decision engine over the shared intel cache.
    #[must_use]
    pub const fn new(intel: &'a VulnIntel) -> Self {
        Self {
            intel,
        }
    }

    /// Groups forecasts into campaigns and derives per-session correlation
    /// context.
    #[must_use]
    pub fn analyze_correlations(
        &self,
        forecasts: &[PredictionSummary],
    ) -> BTreeMap<SessionId, CorrelationContext> {
        let mut campaigns: BTreeMap<String, Vec<&PredictionSummary>> = BTreeMap::new();
        for forecast in forecasts {
            let principal = extract_principal(forecast.session_id.as_str());
            campaigns.entry(principal).or_default().push(forecast);
        }

        let mut contexts = BTreeMap::new();
        for (principal, group) in campaigns {
            let session_count = group.len();
            let boost = f64::min((session_count as f64).mul_add(BOOST_PER_SESSION, 1.0), BOOST_CAP);

            let mut group_max_cvss = 0.0f64;
            let mut group_is_kev = false;
            for forecast in &group {
                let cve_ids = observed_cves(forecast);
                let records = self.intel.lookup_cves(&cve_ids);
                for record in records.values() {
                    group_max_cvss = group_max_cvss.max(record.cvss);
                    group_is_kev = group_is_kev || record.is_kev;
                }
            }

            let mut reason = format!(
                "Aggregated Campaign: {session_count} correlated sessions hit '{principal}'"
            );
            if group_is_kev {
                reason.push_str(" [Group contains KEV exploits]");
            }

            for forecast in group {
                contexts.insert(forecast.session_id.clone(), CorrelationContext {
                    confidence_boost: boost,
                    correlation_reason: reason.clone(),
                    principal_id: principal.clone(),
                    session_count,
                    group_is_kev,
                    group_max_cvss,
                });
            }
        }
        contexts
    }

    /// Evaluates one forecast into a response decision.
    #[must_use]
    pub fn evaluate(
        &self,
        forecast: &PredictionSummary,
        ctx: &CorrelationContext,
    ) -> ResponseDecision {
        let base_conf = forecast.aggregate_confidence;
        let decision_conf = clamp_probability(
            f64::min(base_conf * ctx.confidence_boost, 1.0),
            "decision_confidence",
        );

        // Vulnerability context: CVE scores plus heuristic CWE severities.
        let cve_ids = observed_cves(forecast);
        let records = self.intel.lookup_cves(&cve_ids);
        let mut cvss_list: Vec<f64> = records.values().map(|record| record.cvss).collect();
        for id in &forecast.current_state.observed_vulnerabilities {
            if let Some(severity) = cwe_heuristic_severity(id) {
                cvss_list.push(severity);
            }
        }
        let local_kev = records.values().any(|record| record.is_kev);
        let is_kev = ctx.group_is_kev || local_kev;
        let max_cvss =
            cvss_list.iter().copied().fold(f64::max(ctx.group_max_cvss, 0.0), f64::max);

        // Scenario-by-scenario arbitration.
        let is_urgent = is_kev || max_cvss >= CRITICAL_CVSS_BOUNDARY;
        let mut rejections: Vec<RejectedAction> = Vec::new();
        let mut selected: Option<(&'static str, &PredictedScenario, f64)> = None;
        'scenarios: for scenario in &forecast.predicted_scenarios {
            let Some(target_tech) = scenario.sequence.first() else {
                continue;
            };
            for &action in response_candidates(target_tech.as_str()) {
                let required = action_threshold(action);
                let cost = action_cost(action);
                let effective_threshold = if is_urgent && action != MONITOR_ACTION {
                    f64::max(URGENCY_THRESHOLD_FLOOR, required - URGENCY_THRESHOLD_RELIEF)
                } else {
                    required
                };
                let eval_prob = scenario.probability
                    * ((ctx.session_count.saturating_sub(1)) as f64).mul_add(0.1, 1.0);

                let mut reasons: Vec<String> = Vec::new();
                if decision_conf < effective_threshold {
                    reasons.push(format!(
                        "Confidence ({decision_conf:.2}) < Eff. Threshold ({effective_threshold:.2})"
                    ));
                }
                if eval_prob < 0.2 && cost > 0.6 {
                    reasons.push(format!(
                        "Aggregated Risk ({eval_prob:.2}) too low for High Cost ({cost})"
                    ));
                }
                if reasons.is_empty() {
                    selected = Some((action, scenario, effective_threshold));
                    break 'scenarios;
                }
                rejections.push(RejectedAction {
                    candidate_action: action.to_string(),
                    rejection_reasons: reasons,
                });
            }
        }

        let evaluated_action = selected.map_or(MONITOR_ACTION, |(action, _, _)| action);
        let gated_threshold = selected.map_or_else(
            || action_threshold(evaluated_action),
            |(_, _, effective_threshold)| effective_threshold,
        );
        let primary_scenario = selected
            .map(|(_, scenario, _)| scenario)
            .or_else(|| forecast.predicted_scenarios.first());
        let Some(primary_scenario) = primary_scenario else {
            return monitor_only_decision(
                &forecast.session_id,
                decision_conf,
                base_conf,
                "No predicted threats found.",
            );
        };

        let target_tech = primary_scenario
            .sequence
            .first()
            .map_or_else(String::new, |technique| technique.as_str().to_string());
        let probability = primary_scenario.probability;
        let min_time = primary_scenario.reaction_time_window.min_seconds;

        // Urgency ladder with low-confidence downgrade.
        let mut urgency = if min_time < 300 || is_kev || max_cvss >= CRITICAL_CVSS_BOUNDARY {
            UrgencyLevel::Critical
        } else if min_time < 3_600 || max_cvss >= 7.0 {
            UrgencyLevel::High
        } else if min_time < 14_400 {
            UrgencyLevel::Medium
        } else {
            UrgencyLevel::Low
        };
        if decision_conf < 0.35 && !is_kev {
            urgency = UrgencyLevel::Low;
        }

        // Target binding.
        let (target_kind, target_id) = if evaluated_action.contains("Isolate")
            || evaluated_action.contains("Block")
        {
            let raw = forecast
                .current_state
                .host_scope
                .last()
                .map_or_else(|| "Unknown".to_string(), Clone::clone);
            (ActionTargetKind::Host, normalize_target(&raw))
        } else {
            (ActionTargetKind::User, ctx.principal_id.clone())
        };

        // Approval classification with the KEV auto-containment override.
        let mut action_class = if is_disruptive_action(evaluated_action) {
            ActionClass::Disruptive
        } else {
            ActionClass::Containment
        };
        let mut requires_approval = action_class == ActionClass::Disruptive;
        if is_kev {
            action_class = ActionClass::Containment;
            requires_approval = false;
        }
        // Borderline passes stay gated on the threshold actually applied.
        let threshold = action_threshold(evaluated_action);
        if threshold > 0.0 && (decision_conf - gated_threshold) < BORDERLINE_MARGIN {
            requires_approval = true;
        }

        let reduction = risk_reduction(evaluated_action);
        let absolute_reduction = round2(f64::min(probability * reduction, probability));
        let kev_reason = if is_kev { " [KEV ACTIVE]" } else { "" };
        let probability_percent = (probability * 100.0).round() as i64;

        let recommended = RecommendedAction {
            action_type: evaluated_action.to_string(),
            action_class,
            requires_approval,
            target: ActionTarget {
                kind: target_kind,
                identifier: target_id.clone(),
            },
            vulnerability_details: VulnerabilityDetails {
                is_kev,
                max_cvss,
            },
            mitigation_guidelines: mitigation_guidelines(evaluated_action)
                .iter()
                .map(|line| (*line).to_string())
                .collect(),
            recommended_within_seconds: min_time,
            justification: ActionJustification {
                predicted_scenarios: vec![
                    primary_scenario
                        .sequence
                        .iter()
                        .map(|technique| technique.as_str().to_string())
                        .collect::<Vec<_>>()
                        .join("->"),
                ],
                risk_reduction: RiskReduction {
                    absolute: absolute_reduction,
                    relative: format!(
                        "Mitigates {:.0}% of {target_tech} risk",
                        reduction * 100.0
                    ),
                },
                time_to_impact_seconds: min_time,
                confidence_alignment: ConfidenceAlignment {
                    forecast_confidence: base_conf,
                    decision_confidence: decision_conf,
                    threshold_applied: threshold,
                },
                signal_gap_closed: format!("Controls {target_tech}{kev_reason}"),
            },
        };

        let rank_bonus = if is_kev {
            2_000.0
        } else if urgency == UrgencyLevel::Critical {
            1_000.0
        } else {
            0.0
        };
        let priority_rank = (decision_conf * 100.0 + probability * 100.0 + rank_bonus) as i64;

        // Analyst-facing summary.
        let urgency_note = if is_kev {
            format!("due to the detection of high-risk exploits (Max CVSS {max_cvss:.1}).")
        } else if probability > 0.4 {
            format!("as a countermeasure to a {probability_percent}% probability threat.")
        } else {
            "to ensure defensive depth.".to_string()
        };
        let decision_logic =
            if requires_approval { "Disruptive mitigation" } else { "Automated containment" };
        let target_label = match target_kind {
            ActionTargetKind::User => "User",
            ActionTargetKind::Host => "Host",
        };
        let mut mentor_summary = format!(
            "{decision_logic} strategy for {} has been initiated {urgency_note} The selected action, '{evaluated_action}', targets {target_label} '{target_id}' with an estimated risk reduction of {:.1}% across the predicted trajectory.",
            forecast.session_id,
            absolute_reduction * 100.0
        );
        if requires_approval {
            mentor_summary.push_str(
                " Manual authorization is required before execution due to potential service disruption.",
            );
        }

        debug!(
            session_id = %forecast.session_id,
            action = evaluated_action,
            urgency = %urgency,
            "response decision complete"
        );

        ResponseDecision {
            session_id: forecast.session_id.clone(),
            decision_confidence: round2(decision_conf),
            priority_rank,
            urgency_level: urgency,
            recommended_actions: vec![recommended],
            rejected_actions: rejections,
            model_version: DECISION_MODEL_VERSION.to_string(),
            mentor_summary,
            decision_explainability: DecisionExplainability {
                why_now: format!(
                    "Vulnerability Context: Max CVSS {max_cvss:.1}{kev_reason}. Prob ({probability_percent}%) within {min_time}s."
                ),
                why_not_later: "Delay increases lateral movement window.".to_string(),
                what_happens_if_ignored: format!(
                    "Unmitigated Risk: {probability_percent}% chance of {target_tech} exploiting {max_cvss:.1} CVSS vuln."
                ),
                correlation_context: Some(ctx.correlation_reason.clone()),
            },
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the CVE identifiers observed by a forecast.
fn observed_cves(forecast: &PredictionSummary) -> Vec<CveId> {
    forecast
        .current_state
        .observed_vulnerabilities
        .iter()
        .filter(|id| id.starts_with("CVE-"))
        .map(|id| CveId::from(id.as_str()))
        .collect()
}

/// Builds the monitoring-only fallback decision.
fn monitor_only_decision(
    session_id: &SessionId,
    decision_conf: f64,
    base_conf: f64,
    reason: &str,
) -> ResponseDecision {
    ResponseDecision {
        session_id: session_id.clone(),
        decision_confidence: round2(decision_conf),
        priority_rank: 0,
        urgency_level: UrgencyLevel::Low,
        recommended_actions: vec![RecommendedAction {
            action_type: MONITOR_ACTION.to_string(),
            action_class: ActionClass::Containment,
            requires_approval: false,
            target: ActionTarget {
                kind: ActionTargetKind::User,
                identifier: session_id.as_str().to_string(),
            },
            vulnerability_details: VulnerabilityDetails {
                is_kev: false,
                max_cvss: 0.0,
            },
            mitigation_guidelines: mitigation_guidelines(MONITOR_ACTION)
                .iter()
                .map(|line| (*line).to_string())
                .collect(),
            recommended_within_seconds: 0,
            justification: ActionJustification {
                predicted_scenarios: Vec::new(),
                risk_reduction: RiskReduction {
                    absolute: 0.0,
                    relative: "None".to_string(),
                },
                time_to_impact_seconds: 0,
                confidence_alignment: ConfidenceAlignment {
                    forecast_confidence: base_conf,
                    decision_confidence: decision_conf,
                    threshold_applied: 0.0,
                },
                signal_gap_closed: "Baseline monitoring".to_string(),
            },
        }],
        rejected_actions: Vec::new(),
        model_version: DECISION_MODEL_VERSION.to_string(),
        mentor_summary: "No immediate threat detected. Continuing baseline monitoring.".to_string(),
        decision_explainability: DecisionExplainability {
            why_now: reason.to_string(),
            why_not_later: "N/A".to_string(),
            what_happens_if_ignored: "Unknown".to_string(),
            correlation_context: None,
        },
    }
}

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
