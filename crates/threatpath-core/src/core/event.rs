// threatpath-core/src/core/event.rs
// ============================================================================
// Module: ThreatPath Events and Sessions
// Description: Enriched security events and windowed behavioral sessions.
// Purpose: Model the immutable pipeline input and its sessionized grouping.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Enriched events are produced upstream and are immutable once ingested.
//! Sessions group events that share a surrogate identity within a bounded
//! time window; they are derived per analytical cycle and never mutated
//! after emission.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CveId;
use crate::core::identifiers::CweId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TechniqueId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Enriched Event
// ============================================================================

/// A single enriched security event.
///
/// # Invariants
/// - Immutable after ingestion.
/// - `confidence_score` and `data_quality_score` are within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    /// Unique event identifier.
    pub event_id: EventId,
    /// Event timestamp (UTC).
    pub timestamp: Timestamp,
    /// Acting user, when known.
    pub user: Option<String>,
    /// Originating host, when known.
    pub source_host: Option<String>,
    /// Targeted host, when known.
    pub target_host: Option<String>,
    /// Upstream event type label.
    pub event_type: String,
    /// Network protocol, when known. Carried through, not interpreted.
    pub protocol: Option<String>,
    /// MITRE technique, when already attributed upstream.
    pub mitre_technique: Option<TechniqueId>,
    /// CVE identifiers attached upstream.
    pub observed_cve_ids: Vec<CveId>,
    /// CWE identifiers attached upstream.
    pub observed_cwe_ids: Vec<CweId>,
    /// Detection confidence in `[0, 1]`.
    pub confidence_score: f64,
    /// Data quality estimate in `[0, 1]`.
    pub data_quality_score: f64,
    /// Raw log text used for pattern discovery, when retained.
    pub raw_text: Option<String>,
}

impl EnrichedEvent {
    /// Returns the surrogate identity used for sessionization.
    ///
    /// First non-null of `user`, `source_host`, or the literal `System`.
    #[must_use]
    pub fn surrogate_identity(&self) -> &str {
        self.user
            .as_deref()
            .or(self.source_host.as_deref())
            .unwrap_or("System")
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// An ordered collection of events sharing one surrogate identity.
///
/// # Invariants
/// - `events` are sorted ascending by timestamp.
/// - `start_time <= end_time`.
/// - No inter-event gap exceeds the builder's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (`{surrogate}_{ordinal}`).
    pub session_id: SessionId,
    /// Surrogate identity shared by every event in the session.
    pub surrogate: String,
    /// Timestamp of the first event.
    pub start_time: Timestamp,
    /// Timestamp of the last event.
    pub end_time: Timestamp,
    /// Events in ascending timestamp order.
    pub events: Vec<EnrichedEvent>,
    /// Set when the session switched source hosts or carries a
    /// high-confidence event.
    pub is_high_priority: bool,
}
