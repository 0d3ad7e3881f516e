// threatpath-core/src/knowledge/attack.rs
// ============================================================================
// Module: Adversary Knowledge Tables
// Description: Kill chain, MITRE mappings, transitions, priors, prerequisites.
// Purpose: Ground analysis and forecasting in fixed adversary intelligence.
// Dependencies: none (pure static data)
// ============================================================================

//! ## Overview
//! The attack tables encode the kill-chain ordering, technique-to-phase and
//! CWE-to-technique relationships, the probabilistic technique transition
//! matrix with dwell-time priors, and prerequisite relations used for seed
//! supersession. Probabilities are heuristic priors, not observed rates.

// ============================================================================
// SECTION: Kill Chain
// ============================================================================

/// The 14 kill-chain phases, ordered 1..14 by adversary progression.
pub const KILL_CHAIN_ORDER: &[(&str, u8)] = &[
    ("Reconnaissance", 1),
    ("Resource Development", 2),
    ("Initial Access", 3),
    ("Execution", 4),
    ("Persistence", 5),
    ("Privilege Escalation", 6),
    ("Defense Evasion", 7),
    ("Credential Access", 8),
    ("Discovery", 9),
    ("Lateral Movement", 10),
    ("Collection", 11),
    ("Command and Control", 12),
    ("Exfiltration", 13),
    ("Impact", 14),
];

/// Returns the kill-chain rank of a phase, 0 for unknown phases.
#[must_use]
pub fn kill_chain_rank(phase: &str) -> u8 {
    KILL_CHAIN_ORDER
        .iter()
        .find(|(name, _)| *name == phase)
        .map_or(0, |(_, rank)| *rank)
}

/// MITRE technique to kill-chain phase.
pub const MITRE_PHASE_MAP: &[(&str, &str)] = &[
    ("T1078", "Initial Access"),
    ("T1110", "Credential Access"),
    ("T1046", "Discovery"),
    ("T1021", "Lateral Movement"),
    ("T1003", "Credential Access"),
    ("T1560", "Collection"),
    ("T1041", "Exfiltration"),
    ("T1558", "Credential Access"),
    ("T1550", "Defense Evasion"),
    ("T1059", "Execution"),
    ("T1190", "Initial Access"),
    ("T1562.001", "Defense Evasion"),
    ("T1562", "Defense Evasion"),
    ("T1083", "Discovery"),
    ("T1505", "Persistence"),
    ("T1595", "Reconnaissance"),
    ("T1592", "Reconnaissance"),
    ("T1486", "Impact"),
];

/// Returns the kill-chain phase of a technique, `Unknown` when unmapped.
#[must_use]
pub fn technique_phase(technique: &str) -> &'static str {
    MITRE_PHASE_MAP
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or("Unknown", |(_, phase)| *phase)
}

/// Phase-to-next-phase branching used to seed the initial prediction vector.
pub const NEXT_PHASE_MAP: &[(&str, &[(&str, f64)])] = &[
    ("Initial Access", &[("Discovery", 0.5), ("Execution", 0.3), ("Persistence", 0.2)]),
    ("Execution", &[("Privilege Escalation", 0.4), ("Persistence", 0.4), ("Defense Evasion", 0.2)]),
    ("Persistence", &[
        ("Privilege Escalation", 0.4),
        ("Credential Access", 0.4),
        ("Lateral Movement", 0.2),
    ]),
    ("Privilege Escalation", &[
        ("Defense Evasion", 0.5),
        ("Credential Access", 0.3),
        ("Discovery", 0.2),
    ]),
    ("Defense Evasion", &[
        ("Credential Access", 0.4),
        ("Discovery", 0.4),
        ("Lateral Movement", 0.2),
    ]),
    ("Credential Access", &[
        ("Lateral Movement", 0.5),
        ("Discovery", 0.3),
        ("Collection", 0.2),
    ]),
    ("Discovery", &[
        ("Lateral Movement", 0.6),
        ("Collection", 0.3),
        ("Command and Control", 0.1),
    ]),
    ("Lateral Movement", &[
        ("Collection", 0.5),
        ("Exfiltration", 0.3),
        ("Command and Control", 0.2),
    ]),
    ("Collection", &[("Exfiltration", 0.8), ("Command and Control", 0.2)]),
    ("Command and Control", &[("Exfiltration", 0.9), ("Impact", 0.1)]),
    ("Exfiltration", &[("Impact", 0.9)]),
    ("Impact", &[("Re-infection", 0.5), ("Persistence", 0.5)]),
    ("Reconnaissance", &[("Initial Access", 0.5), ("Resource Development", 0.2)]),
];

/// Default branching when the deepest phase is unknown.
pub const UNKNOWN_PHASE_BRANCHES: &[(&str, f64)] =
    &[("Discovery", 0.3), ("Credential Access", 0.2), ("Standard User Activity", 0.5)];

/// Returns the next-phase branches for a phase, defaulting to the unknown
/// branching.
#[must_use]
pub fn next_phase_branches(phase: &str) -> &'static [(&'static str, f64)] {
    NEXT_PHASE_MAP
        .iter()
        .find(|(name, _)| *name == phase)
        .map_or(UNKNOWN_PHASE_BRANCHES, |(_, branches)| *branches)
}

// ============================================================================
// SECTION: CWE Relationships
// ============================================================================

/// Technique to likely-CWE heuristics used for proactive enrichment.
pub const MITRE_CWE_HEURISTICS: &[(&str, &[&str])] = &[
    ("T1190", &["CWE-20", "CWE-78", "CWE-89", "CWE-434"]),
    ("T1059", &["CWE-94", "CWE-77"]),
    ("T1110", &["CWE-307", "CWE-521"]),
    ("T1078", &["CWE-287", "CWE-284"]),
    ("T1046", &["CWE-200"]),
    ("T1021", &["CWE-285", "CWE-306"]),
    ("T1550", &["CWE-287"]),
    ("T1558", &["CWE-312", "CWE-287"]),
    ("T1112", &["CWE-284"]),
];

/// Returns the heuristic CWE list for a technique.
#[must_use]
pub fn technique_heuristic_cwes(technique: &str) -> &'static [&'static str] {
    MITRE_CWE_HEURISTICS
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or(&[], |(_, cwes)| *cwes)
}

/// Single-valued CWE to technique inference used when an event carries no
/// attributed technique.
pub const CWE_TECHNIQUE_INFERENCE: &[(&str, &str)] = &[
    ("CWE-798", "T1078"),
    ("CWE-287", "T1078"),
    ("CWE-306", "T1078"),
    ("CWE-94", "T1059"),
    ("CWE-89", "T1190"),
    ("CWE-78", "T1059"),
    ("CWE-434", "T1505"),
    ("CWE-22", "T1083"),
    ("CWE-20", "T1190"),
    ("CWE-79", "T1190"),
    ("CWE-264", "T1078"),
    ("CWE-693", "T1562"),
    ("CWE-525", "T1046"),
    ("CWE-615", "T1592"),
    ("CWE-1021", "T1204"),
    ("CWE-200", "T1046"),
];

/// Infers the most likely technique for a CWE, when mapped.
#[must_use]
pub fn infer_technique_from_cwe(cwe: &str) -> Option<&'static str> {
    CWE_TECHNIQUE_INFERENCE
        .iter()
        .find(|(id, _)| *id == cwe)
        .map(|(_, technique)| *technique)
}

/// Multi-valued CWE to technique progression hints used by the forecaster.
pub const CWE_PROGRESSION_MAP: &[(&str, &[&str])] = &[
    ("CWE-798", &["T1078"]),
    ("CWE-287", &["T1078", "T1110"]),
    ("CWE-306", &["T1078"]),
    ("CWE-94", &["T1059", "T1190"]),
    ("CWE-89", &["T1190", "T1059"]),
    ("CWE-78", &["T1059", "T1190"]),
    ("CWE-434", &["T1505", "T1190"]),
    ("CWE-22", &["T1083"]),
    ("CWE-20", &["T1190"]),
    ("CWE-79", &["T1190"]),
    ("CWE-264", &["T1078"]),
    ("CWE-693", &["T1562"]),
    ("CWE-525", &["T1046"]),
    ("CWE-615", &["T1592"]),
    ("CWE-1021", &["T1204"]),
    ("CWE-209", &["T1592", "T1046"]),
    ("CWE-307", &["T1110"]),
];

/// Returns the techniques a CWE enables, empty when unmapped.
#[must_use]
pub fn cwe_enabled_techniques(cwe: &str) -> &'static [&'static str] {
    CWE_PROGRESSION_MAP
        .iter()
        .find(|(id, _)| *id == cwe)
        .map_or(&[], |(_, techniques)| *techniques)
}

// ============================================================================
// SECTION: Transition Matrix
// ============================================================================

/// Seed used when no technique or vulnerability evidence exists.
pub const FALLBACK_SEED_TECHNIQUE: &str = "T1595";

/// Technique transition matrix: `technique -> [(next, base probability)]`.
pub const TRANSITION_MATRIX: &[(&str, &[(&str, f64)])] = &[
    ("T1595", &[("T1592", 0.30), ("T1190", 0.25)]),
    ("T1592", &[("T1190", 0.40)]),
    ("T1190", &[("T1059", 0.50), ("T1505", 0.30), ("T1046", 0.20)]),
    ("T1059", &[("T1003", 0.45), ("T1021", 0.35), ("T1562", 0.20)]),
    ("T1505", &[("T1059", 0.50), ("T1083", 0.30)]),
    ("T1078", &[("T1021", 0.50), ("T1110", 0.40), ("T1003", 0.25)]),
    ("T1110", &[("T1078", 0.45)]),
    ("T1046", &[("T1021", 0.55), ("T1083", 0.25)]),
    ("T1083", &[("T1560", 0.40)]),
    ("T1562", &[("T1003", 0.40), ("T1021", 0.30)]),
    ("T1003", &[("T1021", 0.55), ("T1550", 0.35)]),
    ("T1550", &[("T1021", 0.60)]),
    ("T1021", &[("T1560", 0.50), ("T1003", 0.30)]),
    ("T1560", &[("T1041", 0.70)]),
    ("T1041", &[("T1486", 0.40)]),
    ("T1558", &[("T1550", 0.50)]),
    ("T1204", &[("T1059", 0.60)]),
];

/// Returns the outgoing transitions for a technique.
#[must_use]
pub fn transitions_from(technique: &str) -> &'static [(&'static str, f64)] {
    TRANSITION_MATRIX
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or(&[], |(_, transitions)| *transitions)
}

/// Dwell-time priors per technique: `(min_seconds, max_seconds)`.
pub const TIME_PRIORS: &[(&str, (u64, u64))] = &[
    ("T1595", (60, 3_600)),
    ("T1592", (300, 7_200)),
    ("T1190", (120, 3_600)),
    ("T1059", (60, 1_800)),
    ("T1505", (300, 7_200)),
    ("T1078", (300, 14_400)),
    ("T1110", (600, 7_200)),
    ("T1046", (120, 3_600)),
    ("T1083", (60, 1_800)),
    ("T1562", (120, 1_800)),
    ("T1003", (60, 1_800)),
    ("T1550", (300, 3_600)),
    ("T1021", (300, 7_200)),
    ("T1560", (300, 7_200)),
    ("T1041", (120, 3_600)),
    ("T1486", (60, 900)),
];

/// Fallback dwell prior for unmapped techniques.
pub const DEFAULT_DWELL_SECONDS: (u64, u64) = (60, 3_600);

/// Returns the dwell prior for a technique.
#[must_use]
pub fn dwell_prior(technique: &str) -> (u64, u64) {
    TIME_PRIORS
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or(DEFAULT_DWELL_SECONDS, |(_, prior)| *prior)
}

/// Prerequisite relations: a seed already implied by deeper knowledge is
/// superseded during seed selection.
pub const TECHNIQUE_PREREQUISITES: &[(&str, &[&str])] = &[
    ("T1059", &["T1190"]),
    ("T1505", &["T1190"]),
    ("T1021", &["T1078"]),
    ("T1550", &["T1003", "T1558"]),
    ("T1041", &["T1560"]),
    ("T1486", &["T1021"]),
];

/// Returns the prerequisites of a technique.
#[must_use]
pub fn technique_prerequisites(technique: &str) -> &'static [&'static str] {
    TECHNIQUE_PREREQUISITES
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or(&[], |(_, prerequisites)| *prerequisites)
}

// ============================================================================
// SECTION: Display Names
// ============================================================================

/// Canonical display names for known MITRE techniques.
pub const TECHNIQUE_NAMES: &[(&str, &str)] = &[
    ("T1078", "Valid Accounts"),
    ("T1110", "Brute Force"),
    ("T1059", "Command and Scripting Interpreter"),
    ("T1046", "Network Service Discovery"),
    ("T1190", "Exploit Public-Facing Application"),
    ("T1558", "Steal or Forge Kerberos Tickets"),
    ("T1550", "Use Alternate Authentication Material"),
    ("T1021", "Remote Services"),
    ("T1112", "Modify Registry"),
    ("T1562.001", "Impair Defenses: Disable or Modify Tools"),
    ("T1562", "Impair Defenses"),
    ("T1041", "Exfiltration Over C2 Channel"),
    ("T1595", "Active Scanning"),
    ("T1592", "Gather Victim Host Information"),
    ("T1003", "OS Credential Dumping"),
    ("T1560", "Archive Collected Data"),
    ("T1486", "Data Encrypted for Impact"),
    ("T1083", "File and Directory Discovery"),
    ("T1505", "Server Software Component"),
    ("T1204", "User Execution"),
];

/// Returns the display name for a technique, with a generic fallback.
#[must_use]
pub fn technique_name(technique: &str) -> String {
    TECHNIQUE_NAMES
        .iter()
        .find(|(id, _)| *id == technique)
        .map_or_else(|| format!("Adversary Technique {technique}"), |(_, name)| (*name).to_string())
}

/// Plain-language names for a closed set of common CWEs. These win over
/// catalog names wherever both exist.
pub const CWE_HUMANIZED_NAMES: &[(&str, &str)] = &[
    ("CWE-89", "SQL Injection"),
    ("CWE-78", "OS Command Injection"),
    ("CWE-79", "Cross-site Scripting (XSS)"),
    ("CWE-434", "Unrestricted File Upload"),
    ("CWE-22", "Path Traversal (File Access)"),
    ("CWE-94", "Code Injection"),
    ("CWE-20", "Improper Input Validation"),
    ("CWE-352", "Cross-Site Request Forgery (CSRF)"),
    ("CWE-611", "XML External Entity (XXE)"),
    ("CWE-918", "Server-Side Request Forgery (SSRF)"),
    ("CWE-287", "Improper Authentication"),
    ("CWE-798", "Hardcoded Credentials"),
    ("CWE-200", "Information Exposure"),
    ("CWE-693", "Protection Mechanism Failure"),
    ("CWE-264", "Incorrect Permissions (Access Control)"),
    ("CWE-525", "Sensitive Information in Browser Cache"),
    ("CWE-1021", "Clickjacking (UI Redressing)"),
    ("CWE-615", "Sensitive Info in Source Comments"),
    ("CWE-276", "Incorrect Default Permissions"),
    ("CWE-284", "Improper Access Control"),
    ("CWE-306", "Missing Authentication for Critical Function"),
    ("CWE-307", "Improper Restriction of Excessive Authentication Attempts (Brute Force)"),
    ("CWE-521", "Weak Password Requirements"),
    ("CWE-285", "Improper Authorization"),
    ("CWE-77", "Command Injection"),
    ("CWE-209", "Information Exposure through an Error Message"),
];

/// Returns the humanized name for a CWE, when one exists.
#[must_use]
pub fn humanize_cwe(cwe: &str) -> Option<&'static str> {
    CWE_HUMANIZED_NAMES
        .iter()
        .find(|(id, _)| *id == cwe)
        .map(|(_, name)| *name)
}
