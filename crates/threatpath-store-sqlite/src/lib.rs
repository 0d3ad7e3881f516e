// threatpath-store-sqlite/src/lib.rs
// ============================================================================
// Module: ThreatPath SQLite Store Library
// Description: Durable governance store backed by SQLite.
// Purpose: Expose the SQLite GovernanceStore implementation.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! `threatpath-store-sqlite` persists the governance core: model
//! configurations with an exactly-one-active invariant, the hash-chained
//! trust ledger (append-only, no updates, no deletes), and drift samples.
//! Feedback cycles commit as single transactions so a failed write leaves
//! the prior active configuration intact.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteGovernanceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
