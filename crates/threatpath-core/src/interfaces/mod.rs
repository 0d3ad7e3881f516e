// threatpath-core/src/interfaces/mod.rs
// ============================================================================
// Module: ThreatPath Interfaces
// Description: Backend-agnostic interfaces for intel catalogs and governance.
// Purpose: Define the contract surfaces used by the ThreatPath runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the reasoning engine integrates with the
//! vulnerability catalog and the governance store without embedding
//! backend-specific details. Implementations must be deterministic; catalog
//! implementations may fail (the runtime cache degrades failures to zero
//! records), while governance implementations must fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ConfigVersionId;
use crate::core::CveId;
use crate::core::CweId;
use crate::core::DriftSample;
use crate::core::LedgerEntry;
use crate::core::MetricName;
use crate::core::ModelConfiguration;

// ============================================================================
// SECTION: Vulnerability Catalog
// ============================================================================

/// Catalog record for a CVE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveRecord {
    /// CVSS v3 base score; 0 when unscored.
    pub cvss: f64,
    /// Vulnerability description; empty when unknown.
    pub description: String,
    /// CWE weaknesses mapped to the CVE.
    pub cwe_ids: Vec<CweId>,
    /// Set when the CVE appears in the KEV catalog.
    pub is_kev: bool,
    /// KEV vulnerability name, when listed.
    pub kev_name: Option<String>,
}

impl CveRecord {
    /// Returns the zero record used for unknown or unavailable CVEs.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            cvss: 0.0,
            description: String::new(),
            cwe_ids: Vec::new(),
            is_kev: false,
            kev_name: None,
        }
    }
}

/// Catalog record for a CWE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CweRecord {
    /// Weakness display name.
    pub name: String,
    /// Weakness abstraction level (for example `Base`, `Class`).
    pub abstraction: String,
}

impl CweRecord {
    /// Returns the unknown record used for unmapped CWEs.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            abstraction: "Unknown".to_string(),
        }
    }
}

/// Catalog access errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog backend is unavailable or timed out.
    #[error("vulnerability catalog unavailable: {0}")]
    Unavailable(String),
    /// The catalog returned malformed data.
    #[error("vulnerability catalog invalid data: {0}")]
    Invalid(String),
}

/// Read-only batch-queryable vulnerability catalog.
pub trait VulnCatalog {
    /// Looks up catalog records for the provided CVE identifiers.
    ///
    /// Implementations return entries only for identifiers present in the
    /// catalog; callers fill zero records for the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the backend cannot be queried.
    fn batch_lookup_cves(&self, ids: &[CveId]) -> Result<BTreeMap<CveId, CveRecord>, CatalogError>;

    /// Looks up catalog records for the provided CWE identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the backend cannot be queried.
    fn batch_lookup_cwes(&self, ids: &[CweId]) -> Result<BTreeMap<CweId, CweRecord>, CatalogError>;
}

// ============================================================================
// SECTION: Governance Store
// ============================================================================

/// Governance store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Store I/O error.
    #[error("governance store io error: {0}")]
    Io(String),
    /// Store backend error.
    #[error("governance store error: {0}")]
    Store(String),
    /// Stored data is corrupted.
    #[error("governance store corruption: {0}")]
    Corrupt(String),
    /// Ledger chain verification failed.
    #[error("trust ledger integrity failure: {0}")]
    IntegrityFailure(String),
    /// More than one active configuration was found.
    #[error("configuration conflict: {0}")]
    ConfigurationConflict(String),
    /// Invalid data or request.
    #[error("governance store invalid data: {0}")]
    Invalid(String),
}

/// Atomic governance update bundle.
///
/// # Invariants
/// - Applied in a single transaction; a failed write leaves the prior
///   active configuration intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceUpdate {
    /// Version of the configuration to deactivate.
    pub deactivate_version: ConfigVersionId,
    /// New configuration to insert and activate.
    pub new_configuration: ModelConfiguration,
    /// Ledger entry recording the update.
    pub ledger_entry: LedgerEntry,
    /// Drift samples recorded with the update.
    pub drift_samples: Vec<DriftSample>,
}

/// Persistent governance state store.
///
/// Implementations permit many concurrent readers but exactly one writer;
/// writes are serialized behind a process-wide mutex or transactional
/// equivalent.
pub trait GovernanceStore {
    /// Returns the active configuration, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::ConfigurationConflict`] when more than one
    /// configuration is active, or another variant on backend failure.
    fn active_configuration(&self) -> Result<Option<ModelConfiguration>, GovernanceError>;

    /// Installs the genesis configuration when no configuration is active.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when a configuration already exists or
    /// the write fails.
    fn install_genesis(&self, configuration: &ModelConfiguration) -> Result<(), GovernanceError>;

    /// Applies an atomic governance update bundle.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when any part of the bundle fails; the
    /// prior state is left unchanged.
    fn commit_update(&self, update: &GovernanceUpdate) -> Result<(), GovernanceError>;

    /// Appends a standalone ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the append fails or the entry does
    /// not chain from the current head.
    fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), GovernanceError>;

    /// Returns the hash of the newest ledger entry, or the genesis hash.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the read fails.
    fn last_ledger_hash(&self) -> Result<String, GovernanceError>;

    /// Returns every ledger entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the read fails.
    fn ledger_entries_ascending(&self) -> Result<Vec<LedgerEntry>, GovernanceError>;

    /// Returns the most recent ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the read fails.
    fn recent_ledger_entries(&self, limit: usize) -> Result<Vec<LedgerEntry>, GovernanceError>;

    /// Returns the total ledger entry count.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the read fails.
    fn ledger_entry_count(&self) -> Result<u64, GovernanceError>;

    /// Returns recent configuration versions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the read fails.
    fn configuration_history(
        &self,
        limit: usize,
    ) -> Result<Vec<ModelConfiguration>, GovernanceError>;

    /// Returns the rolling drift-sample series for a metric, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when the read fails.
    fn drift_sample_series(
        &self,
        metric: MetricName,
        limit: usize,
    ) -> Result<Vec<DriftSample>, GovernanceError>;
}
