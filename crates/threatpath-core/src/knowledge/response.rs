// threatpath-core/src/knowledge/response.rs
// ============================================================================
// Module: Response Knowledge Tables
// Description: Countermeasure costs, thresholds, mappings, and guidelines.
// Purpose: Ground decision arbitration in fixed response intelligence.
// Dependencies: none (pure static data)
// ============================================================================

//! ## Overview
//! The response tables define the candidate countermeasure per predicted
//! technique (sorted by descending impact), the base confidence threshold
//! and operational cost of each action, heuristic risk-reduction estimates,
//! fixed mitigation checklists, and heuristic CWE severities used when no
//! CVSS score is available.

// ============================================================================
// SECTION: Action Economics
// ============================================================================

/// Baseline monitoring action used as the universal fallback.
pub const MONITOR_ACTION: &str = "Monitor User Behavior";

/// Base operational cost per action, in `[0, 1]`.
pub const ACTION_COSTS: &[(&str, f64)] = &[
    ("Monitor User Behavior", 0.0),
    ("Enable Process Auditing", 0.1),
    ("Enable Logon Failure Auditing", 0.1),
    ("Alert SOC (High Priority)", 0.2),
    ("Block Inbound SMB", 0.5),
    ("Block Inbound IP", 0.5),
    ("Disable Account", 0.6),
    ("Terminate Web Shell Process", 0.7),
    ("Restore Security Configurations", 0.4),
    ("Restrict File Access", 0.5),
    ("Isolate Host", 0.9),
];

/// Returns the operational cost of an action, 0 when unmapped.
#[must_use]
pub fn action_cost(action: &str) -> f64 {
    ACTION_COSTS.iter().find(|(name, _)| *name == action).map_or(0.0, |(_, cost)| *cost)
}

/// Base decision-confidence thresholds per action.
pub const CONFIDENCE_THRESHOLDS: &[(&str, f64)] = &[
    ("Monitor User Behavior", 0.0),
    ("Enable Process Auditing", 0.1),
    ("Enable Logon Failure Auditing", 0.1),
    ("Alert SOC (High Priority)", 0.35),
    ("Block Inbound SMB", 0.6),
    ("Block Inbound IP", 0.6),
    ("Disable Account", 0.75),
    ("Terminate Web Shell Process", 0.7),
    ("Restore Security Configurations", 0.5),
    ("Restrict File Access", 0.6),
    ("Isolate Host", 0.85),
];

/// Returns the base confidence threshold of an action.
///
/// Unknown actions demand full confidence.
#[must_use]
pub fn action_threshold(action: &str) -> f64 {
    CONFIDENCE_THRESHOLDS
        .iter()
        .find(|(name, _)| *name == action)
        .map_or(1.0, |(_, threshold)| *threshold)
}

/// Heuristic risk-reduction estimates per action.
pub const RISK_REDUCTION_MAP: &[(&str, f64)] = &[
    ("Enable Logon Failure Auditing", 0.2),
    ("Disable Account", 0.95),
    ("Isolate Host", 0.99),
    ("Enable Process Auditing", 0.25),
    ("Block Inbound SMB", 0.8),
    ("Alert SOC (High Priority)", 0.5),
    ("Block Inbound IP", 0.7),
    ("Terminate Web Shell Process", 0.9),
    ("Restore Security Configurations", 0.4),
    ("Restrict File Access", 0.6),
    ("Monitor User Behavior", 0.1),
];

/// Returns the risk-reduction estimate for an action, 0.1 when unmapped.
#[must_use]
pub fn risk_reduction(action: &str) -> f64 {
    RISK_REDUCTION_MAP
        .iter()
        .find(|(name, _)| *name == action)
        .map_or(0.1, |(_, reduction)| *reduction)
}

// ============================================================================
// SECTION: Technique Responses
// ============================================================================

/// Candidate countermeasures per predicted technique, descending impact.
pub const TECHNIQUE_RESPONSE_MAP: &[(&str, &[&str])] = &[
    ("T1078", &["Disable Account", "Enable Logon Failure Auditing"]),
    ("T1110", &["Disable Account", "Enable Logon Failure Auditing"]),
    ("T1046", &["Isolate Host", "Enable Process Auditing"]),
    ("T1021", &["Isolate Host", "Block Inbound SMB"]),
    ("T1003", &["Isolate Host", "Alert SOC (High Priority)"]),
    ("T1560", &["Isolate Host", "Alert SOC (High Priority)"]),
    ("T1041", &["Isolate Host", "Alert SOC (High Priority)"]),
    ("T1486", &["Isolate Host"]),
    ("T1190", &["Isolate Host", "Enable Process Auditing"]),
    ("T1059", &["Isolate Host", "Enable Process Auditing"]),
    ("T1505", &["Isolate Host", "Terminate Web Shell Process"]),
    ("T1562", &["Isolate Host", "Restore Security Configurations"]),
    ("T1592", &["Enable Process Auditing", "Monitor User Behavior"]),
    ("T1595", &["Block Inbound IP", "Monitor User Behavior"]),
    ("T1083", &["Enable Process Auditing", "Restrict File Access"]),
];

/// Returns candidate countermeasures for a technique, monitoring fallback
/// when unmapped.
#[must_use]
pub fn response_candidates(technique: &str) -> &'static [&'static str] {
    TECHNIQUE_RESPONSE_MAP
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or(&[MONITOR_ACTION], |(_, actions)| *actions)
}

/// Keywords marking an action as service-disrupting.
pub const DISRUPTIVE_KEYWORDS: &[&str] = &["Block", "Isolate", "Disable", "Reset", "Terminate"];

/// Returns whether an action name matches a disruptive keyword.
#[must_use]
pub fn is_disruptive_action(action: &str) -> bool {
    DISRUPTIVE_KEYWORDS.iter().any(|keyword| action.contains(keyword))
}

// ============================================================================
// SECTION: Mitigation Guidelines
// ============================================================================

/// Fixed mitigation checklists per action.
pub const MITIGATION_GUIDELINES: &[(&str, &[&str])] = &[
    ("Monitor User Behavior", &[
        "Increase telemetry depth for this principal.",
        "Scan session logs for unusual data access patterns.",
        "Cross-reference activity with known baseline for this role.",
    ]),
    ("Enable Process Auditing", &[
        "Activate Sysmon or similar tool to track process creation.",
        "Review command-line arguments for suspicious encoded strings.",
        "Monitor for unauthorized use of living-off-the-land (LotL) binaries.",
    ]),
    ("Enable Logon Failure Auditing", &[
        "Track source IPs of failed authentication attempts.",
        "Implement account lockout policies if not already present.",
        "Review VPN/Remote access logs for anomalous geolocation.",
    ]),
    ("Alert SOC (High Priority)", &[
        "Immediate notification to IR team for deep-dive analysis.",
        "Preserve volatile memory and artifacts on the source host.",
        "Initiate comprehensive threat hunting in the surrounding segment.",
    ]),
    ("Block Inbound SMB", &[
        "Disable NetBIOS and SMB over port 445 on the host.",
        "Verify firewall rules to restrict SMB to admin-only IPs.",
        "Review for lateral movement attempts via PsExec or WMI.",
    ]),
    ("Disable Account", &[
        "Revoke all active tokens and sessions immediately.",
        "Reset all associated secrets (passwords, MFA keys).",
        "Conduct audit of last 24 hours of account history.",
    ]),
    ("Isolate Host", &[
        "Disconnect host from all internal and external networks.",
        "For Cloud/Web assets: Suspend deployment or enable 'Maintenance Mode' in console.",
        "Scan all other hosts in the same segment for persistence.",
    ]),
    ("Block Inbound IP", &[
        "Add source IP to global edge firewall deny list.",
        "Verify if any other internal assets have communicated with this IP.",
        "Initiate WHOIS investigation to determine actor origin.",
    ]),
    ("Terminate Web Shell Process", &[
        "Identify parent process (often httpd/nginx/iis) for exploit path.",
        "Quarantine the suspected web shell file for analysis.",
        "Patch the vulnerability used to upload the shell (check CWE-434).",
    ]),
    ("Restore Security Configurations", &[
        "Re-enable Defender/AV that was likely disabled by the actor.",
        "Audit firewall rules for new 'allow' entries.",
        "Verify integrity of security logging configuration.",
    ]),
    ("Restrict File Access", &[
        "Apply Principle of Least Privilege to sensitive directories.",
        "Enable File Integrity Monitoring (FIM) for core files.",
        "Review for unauthorized modification of permission masks (CWE-264).",
    ]),
];

/// Returns the mitigation checklist for an action, empty when unmapped.
#[must_use]
pub fn mitigation_guidelines(action: &str) -> &'static [&'static str] {
    MITIGATION_GUIDELINES
        .iter()
        .find(|(name, _)| *name == action)
        .map_or(&[], |(_, guidelines)| *guidelines)
}

// ============================================================================
// SECTION: Heuristic Severities
// ============================================================================

/// Heuristic severity scores for CWEs observed without a scored CVE.
pub const CWE_HEURISTIC_SEVERITY: &[(&str, f64)] = &[
    ("CWE-78", 9.8),
    ("CWE-89", 9.8),
    ("CWE-434", 8.5),
    ("CWE-94", 9.8),
    ("CWE-287", 7.5),
    ("CWE-20", 7.0),
    ("CWE-79", 6.1),
];

/// Returns the heuristic severity for a CWE, when one exists.
#[must_use]
pub fn cwe_heuristic_severity(cwe: &str) -> Option<f64> {
    CWE_HEURISTIC_SEVERITY
        .iter()
        .find(|(id, _)| *id == cwe)
        .map(|(_, severity)| *severity)
}
