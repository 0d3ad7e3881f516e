// threatpath-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Event, session, and catalog builders for integration tests.
// ============================================================================
//! ## Overview
//! Builders shared by the core integration suites: enriched events with
//! minute-granular timestamps, sessionization shortcuts, and a small
//! in-memory catalog seeded with a KEV-listed CVE.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures; not every suite uses every builder."
)]

use std::sync::Arc;

use threatpath_core::CveId;
use threatpath_core::CveRecord;
use threatpath_core::CweRecord;
use threatpath_core::EnrichedEvent;
use threatpath_core::EventId;
use threatpath_core::InMemoryVulnCatalog;
use threatpath_core::Session;
use threatpath_core::SessionBuilder;
use threatpath_core::TechniqueId;
use threatpath_core::Timestamp;
use threatpath_core::VulnIntel;

/// The KEV-listed CVE used across suites.
pub const KEV_CVE: &str = "CVE-2021-44228";

/// Builds an enriched event at the given minute offset.
#[must_use]
pub fn event(id: &str, technique: Option<&str>, minute: i64) -> EnrichedEvent {
    EnrichedEvent {
        event_id: EventId::from(id),
        timestamp: Timestamp::from_unix_millis(1_700_000_000_000 + minute * 60_000),
        user: Some("webfarm".to_string()),
        source_host: None,
        target_host: None,
        event_type: "security_alert".to_string(),
        protocol: None,
        mitre_technique: technique.map(TechniqueId::from),
        observed_cve_ids: Vec::new(),
        observed_cwe_ids: Vec::new(),
        confidence_score: 0.5,
        data_quality_score: 0.9,
        raw_text: None,
    }
}

/// Builds an event bound to a source host.
#[must_use]
pub fn event_on_host(id: &str, technique: Option<&str>, minute: i64, host: &str) -> EnrichedEvent {
    let mut built = event(id, technique, minute);
    built.source_host = Some(host.to_string());
    built
}

/// Sessionizes events with the default one-hour window.
#[must_use]
pub fn sessionize(events: Vec<EnrichedEvent>) -> Vec<Session> {
    SessionBuilder::default().build(events)
}

/// Sessionizes events and returns the single expected session.
#[must_use]
pub fn single_session(events: Vec<EnrichedEvent>) -> Session {
    let mut sessions = sessionize(events);
    assert_eq!(sessions.len(), 1, "fixture expects one session");
    sessions.remove(0)
}

/// Builds a catalog seeded with the KEV-listed Log4j CVE.
#[must_use]
pub fn kev_catalog() -> InMemoryVulnCatalog {
    let mut catalog = InMemoryVulnCatalog::new();
    catalog.insert_cve(KEV_CVE, CveRecord {
        cvss: 10.0,
        description: "Apache Log4j2 JNDI features do not protect against attacker controlled \
                      endpoints. Remote code execution follows."
            .to_string(),
        cwe_ids: vec!["CWE-20".into(), "CWE-502".into()],
        is_kev: true,
        kev_name: Some("Apache Log4j2 Remote Code Execution Vulnerability".to_string()),
    });
    catalog.insert_cwe("CWE-20", CweRecord {
        name: "Improper Input Validation".to_string(),
        abstraction: "Class".to_string(),
    });
    catalog.insert_cwe("CWE-502", CweRecord {
        name: "Deserialization of Untrusted Data".to_string(),
        abstraction: "Base".to_string(),
    });
    catalog
}

/// Wraps a catalog in the engine-facing intel cache.
#[must_use]
pub fn intel(catalog: InMemoryVulnCatalog) -> VulnIntel {
    VulnIntel::new(Arc::new(catalog))
}

/// Returns an intel cache over an empty catalog.
#[must_use]
pub fn empty_intel() -> VulnIntel {
    intel(InMemoryVulnCatalog::new())
}

/// Attaches an observed CVE to an event.
#[must_use]
pub fn with_cve(mut built: EnrichedEvent, cve: &str) -> EnrichedEvent {
    built.observed_cve_ids.push(CveId::from(cve));
    built
}
