// threatpath-core/src/runtime/ledger.rs
// ============================================================================
// Module: Trust Ledger
// Description: Hash-chained append-only event log with verification.
// Purpose: Provide tamper-evident governance history over any store.
// Dependencies: crate::{core, interfaces}, serde_jcs, serde_json, sha2
// ============================================================================

//! ## Overview
//! Every ledger entry hashes `previous_hash || iso_timestamp || event_type
//! || canonical_json(payload) || actor` with SHA-256. Payloads enter the
//! digest as lexicographically key-sorted canonical JSON (RFC 8785), never
//! as insertion-order serialization. The chain starts from a 64-zero
//! genesis hash; verification re-derives every hash in insertion order and
//! never mutates state. Wall-clock timestamps are informational; hash
//! linkage is the sole source of ordering truth.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;

use crate::core::LEDGER_GENESIS_HASH;
use crate::core::LedgerEntry;
use crate::core::Timestamp;
use crate::interfaces::GovernanceError;
use crate::interfaces::GovernanceStore;

// ============================================================================
// SECTION: Entry Hashing
// ============================================================================

/// Computes the content hash for a ledger entry.
///
/// # Errors
///
/// Returns [`GovernanceError::Invalid`] when the payload cannot be
/// canonicalized.
pub fn compute_entry_hash(
    previous_hash: &str,
    iso_timestamp: &str,
    event_type: &str,
    payload: &Value,
    actor: &str,
) -> Result<String, GovernanceError> {
    let payload_json = serde_jcs::to_string(payload).map_err(|err| {
        GovernanceError::Invalid(format!("failed to canonicalize ledger payload: {err}"))
    })?;
    let raw = format!("{previous_hash}{iso_timestamp}{event_type}{payload_json}{actor}");
    Ok(sha256_hex(&raw))
}

/// Returns the lowercase hex SHA-256 digest of a string.
fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes()).iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Builds a chained ledger entry from its fields.
///
/// # Errors
///
/// Returns [`GovernanceError::Invalid`] when the timestamp cannot be
/// rendered or the payload cannot be canonicalized.
pub fn build_ledger_entry(
    previous_hash: String,
    timestamp: Timestamp,
    event_type: &str,
    payload: Value,
    actor: &str,
) -> Result<LedgerEntry, GovernanceError> {
    let iso_timestamp =
        timestamp.to_rfc3339().map_err(|err| GovernanceError::Invalid(err.to_string()))?;
    let hash_id = compute_entry_hash(&previous_hash, &iso_timestamp, event_type, &payload, actor)?;
    Ok(LedgerEntry {
        hash_id,
        previous_hash,
        timestamp,
        event_type: event_type.to_string(),
        payload,
        actor: actor.to_string(),
    })
}

// ============================================================================
// SECTION: Chain Verification
// ============================================================================

/// Verifies a full ledger chain in insertion order.
///
/// Returns `false` on any broken link, hash mismatch, or entry that can no
/// longer be re-hashed. Does not mutate state.
#[must_use]
pub fn verify_chain(entries: &[LedgerEntry]) -> bool {
    let mut previous_hash = LEDGER_GENESIS_HASH;
    for entry in entries {
        if entry.previous_hash != previous_hash {
            return false;
        }
        let Ok(iso_timestamp) = entry.timestamp.to_rfc3339() else {
            return false;
        };
        let Ok(expected) = compute_entry_hash(
            previous_hash,
            &iso_timestamp,
            &entry.event_type,
            &entry.payload,
            &entry.actor,
        ) else {
            return false;
        };
        if entry.hash_id != expected {
            return false;
        }
        previous_hash = &entry.hash_id;
    }
    true
}

// ============================================================================
// SECTION: Trust Ledger
// ============================================================================

/// Hash-chained event log bound to a governance store.
pub struct TrustLedger<S: GovernanceStore> {
    /// Backing governance store.
    store: S,
}

impl<S: GovernanceStore> TrustLedger<S> {
    /// Creates a ledger over the provided store.
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

    /// Consumes the ledger and returns the backing store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Appends a new chained event to the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the head cannot be read or the
    /// append fails.
    pub fn log_event(
        &self,
        event_type: &str,
        payload: Value,
        actor: &str,
        timestamp: Timestamp,
    ) -> Result<LedgerEntry, GovernanceError> {
        let previous_hash = self.store.last_ledger_hash()?;
        let entry = build_ledger_entry(previous_hash, timestamp, event_type, payload, actor)?;
        self.store.append_ledger_entry(&entry)?;
        Ok(entry)
    }

    /// Verifies the full chain held by the store.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when entries cannot be read.
    pub fn verify_integrity(&self) -> Result<bool, GovernanceError> {
        let entries = self.store.ledger_entries_ascending()?;
        Ok(verify_chain(&entries))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use serde_json::json;

    use crate::core::LEDGER_GENESIS_HASH;
    use crate::core::Timestamp;

    use super::build_ledger_entry;
    use super::sha256_hex;
    use super::verify_chain;

    #[test]
    fn digest_matches_known_value() {
        // SHA-256 of "test".
        assert_eq!(
            sha256_hex("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn chain_of_three_verifies() {
        let ts = Timestamp::from_unix_millis(1_700_000_000_000);
        let first = build_ledger_entry(
            LEDGER_GENESIS_HASH.to_string(),
            ts,
            "INGEST_REPORT",
            json!({"report_id": "r1"}),
            "CliUser",
        )
        .unwrap();
        let second = build_ledger_entry(
            first.hash_id.clone(),
            ts,
            "LEARNING_UPDATE",
            json!({"old_ver": "a", "new_ver": "b"}),
            "LearningEngine",
        )
        .unwrap();
        let third = build_ledger_entry(
            second.hash_id.clone(),
            ts,
            "LEARNING_UPDATE",
            json!({"old_ver": "b", "new_ver": "c"}),
            "LearningEngine",
        )
        .unwrap();
        assert!(verify_chain(&[first, second, third]));
    }

    #[test]
    fn mutated_actor_breaks_chain() {
        let ts = Timestamp::from_unix_millis(1_700_000_000_000);
        let first = build_ledger_entry(
            LEDGER_GENESIS_HASH.to_string(),
            ts,
            "INGEST_REPORT",
            json!({"report_id": "r1"}),
            "CliUser",
        )
        .unwrap();
        let mut second = build_ledger_entry(
            first.hash_id.clone(),
            ts,
            "LEARNING_UPDATE",
            json!({}),
            "LearningEngine",
        )
        .unwrap();
        second.actor = "Mallory".to_string();
        assert!(!verify_chain(&[first, second]));
    }

    #[test]
    fn payload_key_order_does_not_affect_hash() {
        let ts = Timestamp::from_unix_millis(1_700_000_000_000);
        let left = build_ledger_entry(
            LEDGER_GENESIS_HASH.to_string(),
            ts,
            "LEARNING_UPDATE",
            json!({"a": 1, "b": 2}),
            "LearningEngine",
        )
        .unwrap();
        let right = build_ledger_entry(
            LEDGER_GENESIS_HASH.to_string(),
            ts,
            "LEARNING_UPDATE",
            json!({"b": 2, "a": 1}),
            "LearningEngine",
        )
        .unwrap();
        assert_eq!(left.hash_id, right.hash_id);
    }
}
