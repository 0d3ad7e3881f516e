// threatpath-core/src/runtime/forecaster.rs
// ============================================================================
// Module: Trajectory Forecaster
// Description: Probabilistic BFS over the technique transition matrix.
// Purpose: Transform observed state into ranked predicted scenarios.
// Dependencies: crate::{core, knowledge, runtime::vuln}, regex, tracing
// ============================================================================

//! ## Overview
//! The forecaster seeds a breadth-first traversal from the deepest observed
//! techniques (prerequisite-superseded seeds are dropped), walks the
//! transition matrix with vulnerability-grounded probability modifiers, and
//! emits at most five deduplicated scenarios ranked by probability. KEV
//! presence compresses every reaction window by 40%.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::core::CurrentState;
use crate::core::CveId;
use crate::core::EvidenceSummary;
use crate::core::PathReport;
use crate::core::PredictedScenario;
use crate::core::PredictionSummary;
use crate::core::ReactionTimeWindow;
use crate::core::ScenarioRiskLevel;
use crate::core::ScenarioType;
use crate::core::SessionId;
use crate::core::TechniqueId;
use crate::core::TrajectoryExplainability;
use crate::core::clamp_probability;
use crate::knowledge::CWE_PROGRESSION_MAP;
use crate::knowledge::FALLBACK_SEED_TECHNIQUE;
use crate::knowledge::cwe_enabled_techniques;
use crate::knowledge::dwell_prior;
use crate::knowledge::technique_name;
use crate::knowledge::technique_prerequisites;
use crate::knowledge::transitions_from;
use crate::runtime::vuln::VulnIntel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Forecast model version label.
pub const FORECAST_MODEL_VERSION: &str = "v4.0-vuln-aware";

/// Default traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Minimum surviving path probability.
const PRUNE_BOUNDARY: f64 = 0.1;
/// Probability boost per CWE-enabled transition.
const CWE_MATCH_BOOST: f64 = 1.4;
/// Global probability boost under KEV presence.
const KEV_BOOST: f64 = 1.2;
/// Reaction-window compression under KEV presence.
const KEV_DWELL_COMPRESSION: f64 = 0.6;
/// Boost for the collection-to-exfiltration synergy.
const COLLECTION_EXFIL_BOOST: f64 = 1.5;
/// Maximum scenarios retained per forecast.
const MAX_SCENARIOS: usize = 5;

/// Techniques implying successful exploitation.
const EXPLOITATION_TECHNIQUES: &[&str] = &["T1190", "T1059", "T1505", "T1110"];
/// Techniques implying reconnaissance.
const RECON_TECHNIQUES: &[&str] = &["T1595", "T1592", "T1046", "T1083"];

// ============================================================================
// SECTION: Current State Extraction
// ============================================================================

/// Returns the compiled vulnerability-id pattern for summary scanning.
fn vuln_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used, reason = "Pattern literal is verified by tests.")]
        let pattern = Regex::new(r"(?i)(CVE-\d{4}-\d+|CWE-\d+)").unwrap();
        pattern
    })
}

/// Derives the forecaster input state from a path report.
///
/// Vulnerability identifiers are re-scanned from the summary lines; when
/// the report carries no techniques, a coarse behavioral inference keeps
/// the traversal seeded.
#[must_use]
pub fn state_from_report(report: &PathReport) -> CurrentState {
    let mut observed = report.observed_techniques.clone();
    if observed.is_empty() {
        observed.push(TechniqueId::from(infer_fallback_technique(report)));
    }
    let mut vulnerabilities: Vec<String> = Vec::new();
    for line in &report.vulnerability_summary {
        for found in vuln_id_pattern().find_iter(line) {
            let id = found.as_str().to_ascii_uppercase();
            if !vulnerabilities.contains(&id) {
                vulnerabilities.push(id);
            }
        }
    }
    let graph_depth = observed.len();
    CurrentState {
        observed_techniques: observed,
        host_scope: report.blast_radius.clone(),
        observed_vulnerabilities: vulnerabilities,
        graph_depth,
    }
}

/// Infers a coarse seed technique from summary keywords.
fn infer_fallback_technique(report: &PathReport) -> &'static str {
    let blob = report.vulnerability_summary.join(" ").to_lowercase();
    if ["cache", "comment", "exposure", "info"].iter().any(|key| blob.contains(key)) {
        "T1592"
    } else if ["permission", "access", "auth"].iter().any(|key| blob.contains(key)) {
        "T1078"
    } else if blob.contains("protection") {
        "T1562"
    } else if report.path_anomaly_score > 30.0 {
        "T1190"
    } else {
        FALLBACK_SEED_TECHNIQUE
    }
}

// ============================================================================
// SECTION: Trajectory Forecaster
// ============================================================================

/// Probabilistic trajectory forecaster.
pub struct TrajectoryForecaster<'a> {
    /// Shared vulnerability intelligence cache.
    intel: &'a VulnIntel,
    /// Maximum traversal depth.
    max_depth: usize,
}

impl<'a> TrajectoryForecaster<'a> {
    /// Creates a forecaster with the default traversal depth.
    #[must_use]
    pub const fn new(intel: &'a VulnIntel) -> Self {
        Self::with_depth(intel, DEFAULT_MAX_DEPTH)
    }

    /// Creates a forecaster with an explicit traversal depth.
    #[must_use]
    pub const fn with_depth(intel: &'a VulnIntel, max_depth: usize) -> Self {
        Self {
            intel,
            max_depth,
        }
    }

    /// Forecasts adversary trajectories for one session.
    #[must_use]
    pub fn predict(
        &self,
        session_id: &SessionId,
        state: &CurrentState,
        current_risk: f64,
    ) -> PredictionSummary {
        let cve_ids: Vec<CveId> = state
            .observed_vulnerabilities
            .iter()
            .filter(|id| id.starts_with("CVE-"))
            .map(|id| CveId::from(id.as_str()))
            .collect();
        let vuln_data = self.intel.lookup_cves(&cve_ids);
        let kev_present = vuln_data.values().any(|record| record.is_kev);
        let kev_count = vuln_data.values().filter(|record| record.is_kev).count();

        // CWEs usable as transition modifiers: catalog weaknesses of the
        // observed CVEs plus directly observed CWE identifiers.
        let mut modifier_cwes: BTreeSet<String> = BTreeSet::new();
        for record in vuln_data.values() {
            for cwe in &record.cwe_ids {
                modifier_cwes.insert(cwe.as_str().to_string());
            }
        }
        for id in &state.observed_vulnerabilities {
            if id.starts_with("CWE-") {
                modifier_cwes.insert(id.clone());
            }
        }

        let seeds = select_seeds(state);
        let mut merged: Vec<PredictedScenario> = Vec::new();
        let mut seen_sequences: BTreeMap<String, usize> = BTreeMap::new();
        for seed in &seeds {
            let scenarios = self.traverse(seed, state, &modifier_cwes, kev_present);
            for scenario in scenarios {
                let key = sequence_key(&scenario.sequence);
                match seen_sequences.get(&key) {
                    Some(&index) => {
                        if scenario.probability > merged[index].probability {
                            merged[index] = scenario;
                        }
                    }
                    None => {
                        seen_sequences.insert(key, merged.len());
                        merged.push(scenario);
                    }
                }
            }
        }
        merged.sort_by(|left, right| {
            right.probability.partial_cmp(&left.probability).unwrap_or(std::cmp::Ordering::Equal)
        });
        merged.truncate(MAX_SCENARIOS);
        for (index, scenario) in merged.iter_mut().enumerate() {
            scenario.scenario_type = classify_rank(index);
        }

        // Aggregate confidence.
        let vuln_match_count = state
            .observed_vulnerabilities
            .iter()
            .filter(|id| !cwe_enabled_techniques(id).is_empty())
            .count();
        let grounding = f64::min(vuln_match_count as f64 * 0.15, 0.45);
        let max_prob = merged.first().map_or(0.4, |scenario| scenario.probability);
        let kev_boost = f64::min(kev_count as f64 * 0.2, 0.4);
        let risk_floor = if current_risk > 50.0 {
            0.4
        } else if current_risk > 15.0 {
            0.2
        } else {
            0.0
        };
        let aggregate_confidence = clamp_probability(
            round2(f64::min(max_prob.mul_add(0.25, grounding + kev_boost + risk_floor), 1.0)),
            "aggregate_confidence",
        );

        let narrative =
            narrative_for(session_id, state, &merged, aggregate_confidence, current_risk, kev_count);

        debug!(
            session_id = %session_id,
            scenario_count = merged.len(),
            confidence = aggregate_confidence,
            "trajectory forecast complete"
        );

        PredictionSummary {
            session_id: session_id.clone(),
            current_state: state.clone(),
            predicted_scenarios: merged,
            mentor_narrative: narrative,
            model_version: FORECAST_MODEL_VERSION.to_string(),
            aggregate_confidence,
            evidence_summary: EvidenceSummary {
                grounding,
                max_path_prob: max_prob,
                kev_boost,
            },
            suppression_reason: None,
        }
    }

    /// Runs one breadth-first traversal from a seed technique.
    fn traverse(
        &self,
        seed: &TechniqueId,
        state: &CurrentState,
        modifier_cwes: &BTreeSet<String>,
        kev_present: bool,
    ) -> Vec<PredictedScenario> {
        let mut scenarios: Vec<PredictedScenario> = Vec::new();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<(TechniqueId, Vec<TechniqueId>, f64, f64, f64)> = VecDeque::new();
        queue.push_back((seed.clone(), Vec::new(), 1.0, 0.0, 0.0));

        while let Some((current, path, prob, t_min, t_max)) = queue.pop_front() {
            if !path.is_empty() {
                scenarios.push(build_scenario(&path, prob, t_min, t_max, state, kev_present));
            }
            if path.len() >= self.max_depth {
                continue;
            }
            for (next, base_prob) in transitions_from(current.as_str()) {
                let mut modifier = 1.0;
                let mut dwell_mult = 1.0;
                for (cwe, enabled) in CWE_PROGRESSION_MAP {
                    if enabled.contains(next) && modifier_cwes.contains(*cwe) {
                        modifier *= CWE_MATCH_BOOST;
                    }
                }
                if kev_present {
                    modifier *= KEV_BOOST;
                    dwell_mult *= KEV_DWELL_COMPRESSION;
                }
                if *next == "T1021" && state.host_scope.len() < 2 {
                    modifier = 0.0;
                }
                if *next == "T1041" && observes(state, "T1560") {
                    modifier *= COLLECTION_EXFIL_BOOST;
                }

                let new_prob = prob * base_prob * modifier;
                if new_prob < PRUNE_BOUNDARY {
                    continue;
                }
                let (dwell_min, dwell_max) = dwell_prior(next);
                let new_min = (dwell_min as f64).mul_add(dwell_mult, t_min);
                let new_max = (dwell_max as f64).mul_add(dwell_mult, t_max);

                let mut new_path = path.clone();
                new_path.push(TechniqueId::from(*next));
                let key = sequence_key(&new_path);
                if visited.insert(key) {
                    queue.push_back((TechniqueId::from(*next), new_path, new_prob, new_min, new_max));
                }
            }
        }

        scenarios.sort_by(|left, right| {
            right.probability.partial_cmp(&left.probability).unwrap_or(std::cmp::Ordering::Equal)
        });
        scenarios.truncate(MAX_SCENARIOS);
        scenarios
    }
}

// ============================================================================
// SECTION: Narrative Selection
// ============================================================================

/// Selects the narrative line for a forecast.
fn narrative_for(
    session_id: &SessionId,
    state: &CurrentState,
    scenarios: &[PredictedScenario],
    aggregate_confidence: f64,
    current_risk: f64,
    kev_count: usize,
) -> String {
    let is_exploitation = state
        .observed_techniques
        .iter()
        .any(|technique| EXPLOITATION_TECHNIQUES.contains(&technique.as_str()))
        || current_risk > 15.0;
    let is_recon = state
        .observed_techniques
        .iter()
        .any(|technique| RECON_TECHNIQUES.contains(&technique.as_str()));

    let mut narrative = if aggregate_confidence > 0.7 {
        format!(
            "CRITICAL ALERT: Session '{session_id}' shows a high-velocity, confirmed attack sequence. "
        )
    } else if is_exploitation {
        format!(
            "URGENT: Verified exploit patterns identified on {session_id}. Attacker has likely bypassed initial defenses. "
        )
    } else if is_recon {
        format!(
            "RECONNAISSANCE: Systematic scanning and information gathering detected on {session_id}. "
        )
    } else if aggregate_confidence > 0.3 {
        format!("ANOMALY: Heuristic patterns on {session_id} suggest emerging adversarial intent. ")
    } else {
        format!("Baseline activity observed for {session_id}. ")
    };

    let enabling: Vec<&str> = state
        .observed_vulnerabilities
        .iter()
        .filter(|id| !cwe_enabled_techniques(id).is_empty())
        .map(String::as_str)
        .take(3)
        .collect();
    if !enabling.is_empty() {
        narrative.push_str(&format!(
            "The specific weaknesses identified ({}) provide the technical logical bridges for the projected trajectory. ",
            enabling.join(", ")
        ));
    }
    if kev_count > 0 {
        let listed: Vec<&str> =
            state.observed_vulnerabilities.iter().map(String::as_str).take(2).collect();
        narrative.push_str(&format!(
            "The presence of documented exploits ({}) has triggered an urgent reaction-window compression. ",
            listed.join(", ")
        ));
    }
    if let Some(top) = scenarios.first() {
        if let Some(first_step) = top.sequence.first() {
            let action_name = technique_name(first_step.as_str());
            let percent = (top.probability * 100.0).round() as i64;
            narrative.push_str(&format!(
                "An attacker exploiting these vulnerabilities is projected to pivot to '{action_name}' next ({percent}% probability)."
            ));
        }
    } else if aggregate_confidence > 0.2 {
        narrative.push_str(
            "While activity is anomalous, it does not currently align with known lateral movement matrices.",
        );
    }
    narrative
}

// ============================================================================
// SECTION: Seed Selection
// ============================================================================

/// Selects traversal seeds with prerequisite supersession.
///
/// A candidate that is a prerequisite of another candidate is dropped;
/// deeper knowledge wins. An empty candidate set falls back to the recon
/// seed.
#[must_use]
pub fn select_seeds(state: &CurrentState) -> Vec<TechniqueId> {
    let mut candidates: Vec<TechniqueId> = Vec::new();
    for technique in &state.observed_techniques {
        if !candidates.contains(technique) {
            candidates.push(technique.clone());
        }
    }
    for id in &state.observed_vulnerabilities {
        for enabled in cwe_enabled_techniques(id) {
            let technique = TechniqueId::from(*enabled);
            if !candidates.contains(&technique) {
                candidates.push(technique);
            }
        }
    }
    if candidates.is_empty() {
        return vec![TechniqueId::from(FALLBACK_SEED_TECHNIQUE)];
    }
    candidates
        .iter()
        .filter(|candidate| {
            !candidates.iter().any(|other| {
                *candidate != other
                    && technique_prerequisites(other.as_str()).contains(&candidate.as_str())
            })
        })
        .cloned()
        .collect()
}

// ============================================================================
// SECTION: Scenario Construction
// ============================================================================

/// Builds a predicted scenario from a traversal path.
fn build_scenario(
    sequence: &[TechniqueId],
    probability: f64,
    t_min: f64,
    t_max: f64,
    state: &CurrentState,
    kev_present: bool,
) -> PredictedScenario {
    let risk_level = sequence.last().map_or(ScenarioRiskLevel::Medium, |terminal| {
        match terminal.as_str() {
            "T1041" | "T1486" => ScenarioRiskLevel::Critical,
            "T1003" | "T1021" => ScenarioRiskLevel::High,
            _ => ScenarioRiskLevel::Medium,
        }
    });

    let mut positive_evidence: Vec<String> = Vec::new();
    if kev_present {
        positive_evidence
            .push("Active KEV exploit detected; compressing reaction window by 40%".to_string());
    }
    let trigger = state.observed_techniques.last();
    if let Some(next_step) = sequence.first() {
        let matching: Vec<&str> = CWE_PROGRESSION_MAP
            .iter()
            .filter(|(cwe, enabled)| {
                let touches_path = enabled.contains(&next_step.as_str())
                    || trigger.is_some_and(|t| enabled.contains(&t.as_str()));
                touches_path && state.observed_vulnerabilities.iter().any(|id| id == cwe)
            })
            .map(|(cwe, _)| *cwe)
            .take(2)
            .collect();
        if matching.is_empty() {
            let trigger_name = trigger
                .map_or_else(|| "Initial Access".to_string(), |t| technique_name(t.as_str()));
            positive_evidence.push(format!("Causal path from {trigger_name}"));
        } else {
            positive_evidence.push(format!(
                "Captured weakness {} allows an attacker to achieve {}",
                matching.join(", "),
                technique_name(next_step.as_str())
            ));
        }
    }

    let human_readable_sequence = sequence
        .iter()
        .map(|technique| technique_name(technique.as_str()))
        .collect::<Vec<_>>()
        .join(" -> ");
    let min_seconds = t_min.max(0.0) as u64;
    let max_seconds = t_max.max(0.0) as u64;

    PredictedScenario {
        sequence: sequence.to_vec(),
        human_readable_sequence,
        probability: round3(probability.min(1.0)),
        reaction_time_window: ReactionTimeWindow {
            min_seconds,
            max_seconds,
        },
        time_window_text: format!(
            "Window: {} to {}",
            format_seconds(min_seconds),
            format_seconds(max_seconds)
        ),
        explainability: TrajectoryExplainability {
            positive_evidence,
            negative_evidence: Vec::new(),
            uncertainty_factors: Vec::new(),
        },
        risk_level,
        scenario_type: ScenarioType::Opportunistic,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns whether the state observed a technique.
fn observes(state: &CurrentState, technique: &str) -> bool {
    state.observed_techniques.iter().any(|observed| observed.as_str() == technique)
}

/// Joins a technique sequence into a stable dedup key.
fn sequence_key(sequence: &[TechniqueId]) -> String {
    sequence.iter().map(TechniqueId::as_str).collect::<Vec<_>>().join("->")
}

/// Classifies a scenario by its sorted rank.
const fn classify_rank(index: usize) -> ScenarioType {
    match index {
        0 => ScenarioType::Primary,
        1 | 2 => ScenarioType::Secondary,
        _ => ScenarioType::Opportunistic,
    }
}

/// Renders a second count as seconds or whole minutes.
fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else {
        format!("{}m", seconds / 60)
    }
}

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds to three decimal places.
fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}
