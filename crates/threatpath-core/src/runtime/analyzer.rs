// threatpath-core/src/runtime/analyzer.rs
// ============================================================================
// Module: Path Analyzer
// Description: Attack-graph construction, scoring, and vuln enrichment.
// Purpose: Transform one session into a PathReport.
// Dependencies: crate::{core, knowledge, runtime::vuln}, regex, tracing
// ============================================================================

//! ## Overview
//! The path analyzer reconstructs a session's attack graph, discovers
//! vulnerability identifiers in raw event text, infers missing techniques
//! from weaknesses, scores anomaly as diversity + volume with an impact
//! multiplier, and emits the per-session `PathReport`. An empty session
//! yields no report; unknown techniques and phases degrade gracefully.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::core::BusinessRiskLevel;
use crate::core::CveId;
use crate::core::CweId;
use crate::core::EnrichedEvent;
use crate::core::EventId;
use crate::core::PathPrediction;
use crate::core::PathReport;
use crate::core::Session;
use crate::core::TechniqueId;
use crate::core::Timestamp;
use crate::core::clamp_score;
use crate::knowledge::infer_technique_from_cwe;
use crate::knowledge::kill_chain_rank;
use crate::knowledge::next_phase_branches;
use crate::knowledge::technique_heuristic_cwes;
use crate::knowledge::technique_name;
use crate::knowledge::technique_phase;
use crate::runtime::vuln::VulnIntel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum contribution of technique diversity to the anomaly score.
const DIVERSITY_CAP: f64 = 70.0;
/// Maximum contribution of event volume to the anomaly score.
const VOLUME_CAP: f64 = 30.0;
/// Score multiplier when any observed CVE is actively exploited.
const KEV_MULTIPLIER: f64 = 1.5;
/// Score multiplier when the highest CVSS reaches the critical band.
const CRITICAL_CVSS_MULTIPLIER: f64 = 1.25;
/// CVSS score opening the critical band.
const CRITICAL_CVSS_BOUNDARY: f64 = 9.0;

// ============================================================================
// SECTION: Attack Graph
// ============================================================================

/// A node of the reconstructed attack graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Event backing the node.
    pub event_id: EventId,
    /// Technique attributed to the event, possibly inferred.
    pub technique: Option<TechniqueId>,
    /// Kill-chain phase of the technique, `Unknown` when unmapped.
    pub phase: &'static str,
    /// Source host of the event, when known.
    pub host: Option<String>,
}

/// A temporal edge between consecutive events.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    /// Index of the earlier node.
    pub from: usize,
    /// Index of the later node.
    pub to: usize,
    /// Seconds elapsed between the two events.
    pub delta_seconds: f64,
}

/// Directed attack graph keyed by event id with edge-only temporal
/// attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttackGraph {
    /// Nodes in timestamp order.
    pub nodes: Vec<GraphNode>,
    /// Edges between consecutive nodes.
    pub edges: Vec<GraphEdge>,
}

impl AttackGraph {
    /// Returns the root-cause node (the earliest event), when present.
    #[must_use]
    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }
}

// ============================================================================
// SECTION: Path Analyzer
// ============================================================================

/// Per-session attack-path analyzer.
pub struct PathAnalyzer<'a> {
    /// Shared vulnerability intelligence cache.
    intel: &'a VulnIntel,
}

impl<'a> PathAnalyzer<'a> {
    /// Creates an analyzer over the shared intel cache.
    #[must_use]
    pub const fn new(intel: &'a VulnIntel) -> Self {
        Self {
            intel,
        }
    }

    /// Builds the attack graph for a session.
    #[must_use]
    pub fn build_graph(&self, session: &Session) -> AttackGraph {
        let events = sorted_events(session);
        let mut graph = AttackGraph::default();
        for (index, event) in events.iter().enumerate() {
            let technique = attributed_technique(event);
            let phase = technique.as_ref().map_or("Unknown", |id| technique_phase(id.as_str()));
            graph.nodes.push(GraphNode {
                event_id: event.event_id.clone(),
                technique,
                phase,
                host: event.source_host.clone(),
            });
            if index > 0 {
                let delta_seconds = event.timestamp.seconds_since(events[index - 1].timestamp);
                graph.edges.push(GraphEdge {
                    from: index - 1,
                    to: index,
                    delta_seconds,
                });
            }
        }
        graph
    }

    /// Analyzes one session into a path report.
    ///
    /// Returns `None` for an empty session.
    #[must_use]
    pub fn analyze(&self, session: &Session, generated_at: Timestamp) -> Option<PathReport> {
        let events = sorted_events(session);
        if events.is_empty() {
            return None;
        }
        let graph = self.build_graph(session);

        // Vulnerability discovery and technique inference per event.
        let mut effective_techniques: Vec<Option<TechniqueId>> = Vec::with_capacity(events.len());
        let mut all_cves: Vec<CveId> = Vec::new();
        let mut explicit_cwes: Vec<CweId> = Vec::new();
        for event in &events {
            let scan_text = event.raw_text.clone().unwrap_or_else(|| {
                let technique = event.mitre_technique.as_ref().map_or("", TechniqueId::as_str);
                format!("{} {}", event.event_type, technique)
            });
            let (cves, cwes) = discover_vulnerabilities(&scan_text);

            let mut technique = attributed_technique(event);
            if technique.is_none() {
                for cwe in &cwes {
                    if let Some(inferred) = infer_technique_from_cwe(cwe.as_str()) {
                        technique = Some(TechniqueId::from(inferred));
                        break;
                    }
                }
            }
            effective_techniques.push(technique);

            push_unique(&mut all_cves, cves);
            push_unique(&mut all_cves, event.observed_cve_ids.clone());
            push_unique(&mut explicit_cwes, cwes);
            push_unique(&mut explicit_cwes, event.observed_cwe_ids.clone());
        }

        let vuln_data = self.intel.lookup_cves(&all_cves);
        let kev_count = vuln_data.values().filter(|record| record.is_kev).count();
        let highest_cvss = vuln_data.values().map(|record| record.cvss).fold(0.0, f64::max);

        // CWE clustering: catalog weaknesses plus proactive heuristics.
        let mut all_cwes: Vec<CweId> = Vec::new();
        for record in vuln_data.values() {
            push_unique(&mut all_cwes, record.cwe_ids.clone());
        }
        for technique in effective_techniques.iter().flatten() {
            let heuristics: Vec<CweId> = technique_heuristic_cwes(technique.as_str())
                .iter()
                .map(|cwe| CweId::from(*cwe))
                .collect();
            push_unique(&mut all_cwes, heuristics.clone());
            push_unique(&mut explicit_cwes, heuristics);
        }
        let cwe_details = self.intel.lookup_cwes(&all_cwes);
        let mut cwe_clusters: Vec<String> = Vec::new();
        for cwe in &all_cwes {
            if let Some(record) = cwe_details.get(cwe) {
                if record.abstraction != "Unknown" && !cwe_clusters.contains(&record.abstraction) {
                    cwe_clusters.push(record.abstraction.clone());
                }
            }
        }

        // Order-preserving unique techniques.
        let mut observed: Vec<TechniqueId> = Vec::new();
        for technique in effective_techniques.iter().flatten() {
            if !observed.contains(technique) {
                observed.push(technique.clone());
            }
        }

        // Vulnerability summary lines.
        let mut summary: Vec<String> = Vec::new();
        let covered_cwes: BTreeSet<&CweId> =
            vuln_data.values().flat_map(|record| record.cwe_ids.iter()).collect();
        for (cve_id, record) in &vuln_data {
            for cwe in &record.cwe_ids {
                promote_technique(&mut observed, cwe);
            }
            let kev_suffix = if record.is_kev { " [KEV]" } else { "" };
            let attack_name = record.kev_name.clone().or_else(|| {
                let names: Vec<String> = record
                    .cwe_ids
                    .iter()
                    .filter_map(|cwe| cwe_details.get(cwe))
                    .map(|detail| detail.name.clone())
                    .filter(|name| name != "Unknown")
                    .collect();
                if names.is_empty() { None } else { Some(names.join(", ")) }
            });
            let attack_name = attack_name
                .or_else(|| first_sentence(&record.description))
                .unwrap_or_else(|| "Vulnerability Match".to_string());
            summary.push(format!("{cve_id}: {attack_name} (CVSS: {:.1}){kev_suffix}", record.cvss));
        }
        for cwe in &explicit_cwes {
            promote_technique(&mut observed, cwe);
            if covered_cwes.contains(cwe) {
                continue;
            }
            let display_name = cwe_details.get(cwe).map_or_else(
                || "Security Policy Weakness".to_string(),
                |detail| {
                    if detail.name == "Unknown" {
                        "Security Weakness (Research Required)".to_string()
                    } else {
                        detail.name.clone()
                    }
                },
            );
            summary.push(format!("{cwe}: {display_name}"));
        }
        if summary.is_empty() {
            for technique in &observed {
                summary.push(format!(
                    "Behavioral Detection: {} ({technique})",
                    technique_name(technique.as_str())
                ));
            }
        }

        // Forecast seeding: deepest kill-chain phase reached.
        let mut deepest_phase = "Unknown";
        let mut max_rank = -1i32;
        for technique in &observed {
            let phase = technique_phase(technique.as_str());
            let rank = i32::from(kill_chain_rank(phase));
            if rank > max_rank {
                max_rank = rank;
                deepest_phase = phase;
            }
        }
        let prediction_vector: Vec<PathPrediction> = next_phase_branches(deepest_phase)
            .iter()
            .map(|(phase, probability)| PathPrediction {
                next_phase: (*phase).to_string(),
                probability: *probability,
            })
            .collect();

        // Event summary and blast radius.
        let mut event_summary: BTreeMap<String, u64> = BTreeMap::new();
        for event in &events {
            *event_summary.entry(event.event_type.clone()).or_insert(0) += 1;
        }
        let mut blast_radius: Vec<String> = Vec::new();
        for event in &events {
            for host in [event.source_host.as_ref(), event.target_host.as_ref()].into_iter().flatten()
            {
                if !blast_radius.contains(host) {
                    blast_radius.push(host.clone());
                }
            }
        }

        // Tactical narrative.
        let mut narrative =
            format!("Detected {} correlated events in this behavioral session. ", events.len());
        if kev_count > 0 {
            narrative.push_str(&format!(
                "CRITICAL: Found {kev_count} vulnerabilities from the CISA Known Exploited Vulnerabilities (KEV) catalog! "
            ));
        } else if highest_cvss >= CRITICAL_CVSS_BOUNDARY {
            narrative.push_str("ALERT: High-severity vulnerabilities detected. ");
        }
        if let Some(count) = event_summary.get("security_alert") {
            narrative.push_str(&format!("Analysis reveals {count} explicit security alerts. "));
        }
        if let Some(count) = event_summary.get("auth_failure") {
            narrative.push_str(&format!(
                "Detected {count} authentication failures suggesting brute-force attempts. "
            ));
        }
        if event_summary.contains_key("system_audit") {
            narrative
                .push_str("Integrity monitoring has flagged unauthorized system modifications. ");
        }

        // Anomaly scoring: diversity + volume, impact-escalated.
        let diversity_score = f64::min(observed.len() as f64 * 10.0, DIVERSITY_CAP);
        let volume_score = f64::min((events.len() as f64 + 1.0).log10() * 10.0, VOLUME_CAP);
        let mut final_score = diversity_score + volume_score;
        if final_score > 0.0 {
            if kev_count > 0 {
                final_score = f64::min(final_score * KEV_MULTIPLIER, 100.0);
            } else if highest_cvss >= CRITICAL_CVSS_BOUNDARY {
                final_score = f64::min(final_score * CRITICAL_CVSS_MULTIPLIER, 95.0);
            }
        }
        let final_score = clamp_score(final_score, "path_anomaly_score");

        let business_risk_level = if final_score > 70.0 || kev_count > 0 {
            BusinessRiskLevel::High
        } else if final_score > 30.0 || highest_cvss >= CRITICAL_CVSS_BOUNDARY {
            BusinessRiskLevel::Medium
        } else if final_score > 10.0 {
            BusinessRiskLevel::Low
        } else {
            BusinessRiskLevel::Informational
        };

        let plain_language_summary = plain_language(
            kev_count,
            max_rank,
            &summary,
            &event_summary,
            final_score,
        );

        debug!(
            session_id = %session.session_id,
            score = final_score,
            techniques = observed.len(),
            "path analysis complete"
        );

        Some(PathReport {
            session_id: session.session_id.clone(),
            root_cause_node: graph
                .root()
                .map_or_else(|| events[0].event_id.clone(), |node| node.event_id.clone()),
            blast_radius,
            path_anomaly_score: round2(final_score),
            prediction_vector,
            vulnerability_summary: summary,
            observed_techniques: observed,
            cwe_clusters,
            event_summary,
            tactical_narrative: narrative,
            plain_language_summary,
            business_risk_level,
            generated_at,
        })
    }
}

// ============================================================================
// SECTION: Discovery Patterns
// ============================================================================

/// Returns the compiled CVE pattern.
fn cve_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used, reason = "Pattern literal is verified by tests.")]
        let pattern = Regex::new(r"(?i)CVE-\d{4}-\d{4,7}").unwrap();
        pattern
    })
}

/// Returns the compiled CWE pattern.
fn cwe_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used, reason = "Pattern literal is verified by tests.")]
        let pattern = Regex::new(r"(?i)CWE-\d{1,5}").unwrap();
        pattern
    })
}

/// Returns the compiled structural CWE pattern (JSON-ified payloads).
fn structural_cwe_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used, reason = "Pattern literal is verified by tests.")]
        let pattern = Regex::new(r#"(?i)['"]cwe_?id['"]:\s*['"]?(\d+)['"]?"#).unwrap();
        pattern
    })
}

/// Scans text for CVE and CWE identifiers.
///
/// Order-preserving unique; structural `"cwe_id": <digits>` hits merge into
/// the CWE list.
#[must_use]
pub fn discover_vulnerabilities(text: &str) -> (Vec<CveId>, Vec<CweId>) {
    let mut cves: Vec<CveId> = Vec::new();
    for found in cve_pattern().find_iter(text) {
        let id = CveId::from(found.as_str());
        if !cves.contains(&id) {
            cves.push(id);
        }
    }
    let mut cwes: Vec<CweId> = Vec::new();
    for found in cwe_pattern().find_iter(text) {
        let id = CweId::from(found.as_str());
        if !cwes.contains(&id) {
            cwes.push(id);
        }
    }
    for captures in structural_cwe_pattern().captures_iter(text) {
        if let Some(digits) = captures.get(1) {
            let id = CweId::new(format!("CWE-{}", digits.as_str()));
            if !cwes.contains(&id) {
                cwes.push(id);
            }
        }
    }
    (cves, cwes)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns session events sorted by timestamp (then id for stability).
fn sorted_events(session: &Session) -> Vec<&EnrichedEvent> {
    let mut events: Vec<&EnrichedEvent> = session.events.iter().collect();
    events.sort_by(|left, right| {
        left.timestamp.cmp(&right.timestamp).then_with(|| left.event_id.cmp(&right.event_id))
    });
    events
}

/// Returns the upstream technique attribution, treating placeholder labels
/// as missing.
fn attributed_technique(event: &EnrichedEvent) -> Option<TechniqueId> {
    event
        .mitre_technique
        .clone()
        .filter(|technique| !technique.as_str().is_empty() && technique.as_str() != "Unknown")
}

/// Appends items that are not yet present, preserving order.
fn push_unique<T: PartialEq>(target: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Adds the technique inferred from a CWE to the observed list.
fn promote_technique(observed: &mut Vec<TechniqueId>, cwe: &CweId) {
    if let Some(inferred) = infer_technique_from_cwe(cwe.as_str()) {
        let technique = TechniqueId::from(inferred);
        if !observed.contains(&technique) {
            observed.push(technique);
        }
    }
}

/// Returns the first sentence of a description, when non-empty.
fn first_sentence(description: &str) -> Option<String> {
    let sentence = description.split('.').next().unwrap_or("").trim();
    if sentence.is_empty() { None } else { Some(sentence.to_string()) }
}

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Builds the plain-language summary ladder.
fn plain_language(
    kev_count: usize,
    max_rank: i32,
    summary: &[String],
    event_summary: &BTreeMap<String, u64>,
    final_score: f64,
) -> String {
    if kev_count > 0 {
        let top_attack = summary
            .first()
            .and_then(|line| line.split_once(':'))
            .map(|(_, rest)| rest.split(" (CVSS").next().unwrap_or(rest).trim().to_string())
            .unwrap_or_else(|| "critical vulnerabilities".to_string());
        return format!(
            "CRITICAL: Identified known exploit attempts involving {top_attack}. Immediate containment recommended."
        );
    }
    if max_rank >= 5 {
        return "URGENT: Attacker has successfully achieved persistence or internal lateral movement. Data access is likely imminent.".to_string();
    }
    if max_rank >= 4 {
        return "ALERT: Unauthorized code execution detected. The attacker is actively running commands on your assets.".to_string();
    }
    if event_summary.contains_key("security_alert") {
        return "Unusual security patterns detected. System behavior matches known attacker techniques.".to_string();
    }
    if final_score > 50.0 {
        return "Highly suspicious movement identified. Multiple high-risk vulnerabilities are being probed.".to_string();
    }
    "Routine system activity or reconnaissance. No immediate compromise of core logic detected."
        .to_string()
}
