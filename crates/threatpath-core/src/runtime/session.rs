// threatpath-core/src/runtime/session.rs
// ============================================================================
// Module: Session Builder
// Description: Group enriched events into windowed behavioral sessions.
// Purpose: Derive deterministic sessions keyed by surrogate identity.
// Dependencies: crate::core, tracing
// ============================================================================

//! ## Overview
//! Sessionization derives a surrogate identity per event (first non-null of
//! user, source host, or `System`), sorts by (surrogate, timestamp), and
//! opens a new session whenever the gap from the predecessor exceeds the
//! window. Running the builder twice over the same events yields identical
//! sessions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;

use crate::core::EnrichedEvent;
use crate::core::Session;
use crate::core::SessionId;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default sessionization window in minutes.
pub const DEFAULT_SESSION_WINDOW_MINUTES: u64 = 60;

/// High-priority confidence boundary: any event above it flags the session.
const HIGH_CONFIDENCE_BOUNDARY: f64 = 0.8;

// ============================================================================
// SECTION: Session Builder
// ============================================================================

/// Groups enriched events into time-windowed sessions.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    /// Maximum inter-event gap within one session, in minutes.
    window_minutes: u64,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_WINDOW_MINUTES)
    }
}

impl SessionBuilder {
    /// Creates a builder with the provided window, in minutes.
    #[must_use]
    pub const fn new(window_minutes: u64) -> Self {
        Self {
            window_minutes,
        }
    }

    /// Builds sessions from a bag of events.
    ///
    /// Output is deterministic: sessions ordered by (surrogate, start
    /// time), events within each session ordered by timestamp.
    #[must_use]
    pub fn build(&self, events: Vec<EnrichedEvent>) -> Vec<Session> {
        if events.is_empty() {
            return Vec::new();
        }
        let mut keyed: Vec<(String, EnrichedEvent)> = events
            .into_iter()
            .map(|event| (event.surrogate_identity().to_string(), event))
            .collect();
        keyed.sort_by(|(left_key, left), (right_key, right)| {
            left_key
                .cmp(right_key)
                .then(left.timestamp.cmp(&right.timestamp))
                .then(left.event_id.cmp(&right.event_id))
        });

        let window_seconds = (self.window_minutes * 60) as f64;
        let mut sessions = Vec::new();
        let mut current: Vec<EnrichedEvent> = Vec::new();
        let mut current_surrogate = String::new();
        let mut ordinal = 0u32;

        for (surrogate, event) in keyed {
            let gap_exceeded = current.last().is_some_and(|last: &EnrichedEvent| {
                event.timestamp.seconds_since(last.timestamp) > window_seconds
            });
            if surrogate != current_surrogate {
                if !current.is_empty() {
                    sessions.push(seal_session(&current_surrogate, ordinal, std::mem::take(&mut current)));
                }
                current_surrogate = surrogate;
                ordinal = 1;
            } else if gap_exceeded {
                sessions.push(seal_session(&current_surrogate, ordinal, std::mem::take(&mut current)));
                ordinal += 1;
            }
            current.push(event);
        }
        if !current.is_empty() {
            sessions.push(seal_session(&current_surrogate, ordinal, current));
        }
        debug!(session_count = sessions.len(), "sessionization complete");
        sessions
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Seals a run of events into a session.
fn seal_session(surrogate: &str, ordinal: u32, events: Vec<EnrichedEvent>) -> Session {
    let start_time = events.first().map_or_else(Timestamp::default, |event| event.timestamp);
    let end_time = events.last().map_or_else(Timestamp::default, |event| event.timestamp);

    let mut source_hosts: Vec<&str> = Vec::new();
    let mut high_confidence = false;
    for event in &events {
        if let Some(host) = event.source_host.as_deref() {
            if !source_hosts.contains(&host) {
                source_hosts.push(host);
            }
        }
        if event.confidence_score > HIGH_CONFIDENCE_BOUNDARY {
            high_confidence = true;
        }
    }

    let is_high_priority = source_hosts.len() > 1 || high_confidence;

    Session {
        session_id: SessionId::new(format!("{surrogate}_{ordinal}")),
        surrogate: surrogate.to_string(),
        start_time,
        end_time,
        events,
        is_high_priority,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use crate::core::EnrichedEvent;
    use crate::core::EventId;
    use crate::core::Timestamp;

    use super::SessionBuilder;

    fn event(id: &str, user: Option<&str>, host: Option<&str>, minute: i64, conf: f64) -> EnrichedEvent {
        EnrichedEvent {
            event_id: EventId::from(id),
            timestamp: Timestamp::from_unix_millis(minute * 60_000),
            user: user.map(ToString::to_string),
            source_host: host.map(ToString::to_string),
            target_host: None,
            event_type: "auth_failure".to_string(),
            protocol: None,
            mitre_technique: None,
            observed_cve_ids: Vec::new(),
            observed_cwe_ids: Vec::new(),
            confidence_score: conf,
            data_quality_score: 1.0,
            raw_text: None,
        }
    }

    #[test]
    fn splits_on_window_gap() {
        let events = vec![
            event("a", Some("alice"), Some("ws1"), 0, 0.2),
            event("b", Some("alice"), Some("ws1"), 30, 0.2),
            event("c", Some("alice"), Some("ws1"), 120, 0.2),
        ];
        let sessions = SessionBuilder::new(60).build(events);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id.as_str(), "alice_1");
        assert_eq!(sessions[1].session_id.as_str(), "alice_2");
        assert_eq!(sessions[0].events.len(), 2);
        assert_eq!(sessions[1].events.len(), 1);
    }

    #[test]
    fn surrogate_falls_back_to_host_then_system() {
        let events = vec![
            event("a", None, Some("web01"), 0, 0.2),
            event("b", None, None, 0, 0.2),
        ];
        let sessions = SessionBuilder::default().build(events);
        let surrogates: Vec<&str> = sessions.iter().map(|s| s.surrogate.as_str()).collect();
        assert_eq!(surrogates, vec!["System", "web01"]);
    }

    #[test]
    fn priority_set_by_host_switch_or_confidence() {
        let switched = SessionBuilder::default().build(vec![
            event("a", Some("bob"), Some("ws1"), 0, 0.1),
            event("b", Some("bob"), Some("ws2"), 1, 0.1),
        ]);
        assert!(switched[0].is_high_priority);

        let confident = SessionBuilder::default().build(vec![
            event("a", Some("bob"), Some("ws1"), 0, 0.95),
        ]);
        assert!(confident[0].is_high_priority);

        let quiet = SessionBuilder::default().build(vec![
            event("a", Some("bob"), Some("ws1"), 0, 0.1),
        ]);
        assert!(!quiet[0].is_high_priority);
    }

    #[test]
    fn sessionization_is_idempotent() {
        let events = vec![
            event("a", Some("alice"), Some("ws1"), 0, 0.2),
            event("b", None, Some("web01"), 5, 0.9),
            event("c", Some("alice"), Some("ws1"), 200, 0.3),
        ];
        let first = SessionBuilder::default().build(events.clone());
        let second = SessionBuilder::default().build(events);
        assert_eq!(first, second);
    }
}
