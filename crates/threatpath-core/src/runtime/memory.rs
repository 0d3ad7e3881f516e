// threatpath-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Stores
// Description: In-memory catalog and governance store for tests and demos.
// Purpose: Provide deterministic implementations without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides simple in-memory implementations of [`VulnCatalog`]
//! and [`GovernanceStore`] for tests and local demos. They are not intended
//! for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::CveId;
use crate::core::CweId;
use crate::core::DriftSample;
use crate::core::LEDGER_GENESIS_HASH;
use crate::core::LedgerEntry;
use crate::core::MetricName;
use crate::core::ModelConfiguration;
use crate::interfaces::CatalogError;
use crate::interfaces::CveRecord;
use crate::interfaces::CweRecord;
use crate::interfaces::GovernanceError;
use crate::interfaces::GovernanceStore;
use crate::interfaces::GovernanceUpdate;
use crate::interfaces::VulnCatalog;

// ============================================================================
// SECTION: In-Memory Catalog
// ============================================================================

/// In-memory vulnerability catalog for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVulnCatalog {
    /// CVE records keyed by identifier.
    cves: BTreeMap<CveId, CveRecord>,
    /// CWE records keyed by identifier.
    cwes: BTreeMap<CweId, CweRecord>,
}

impl InMemoryVulnCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a CVE record.
    pub fn insert_cve(&mut self, id: impl Into<CveId>, record: CveRecord) {
        self.cves.insert(id.into(), record);
    }

    /// Inserts a CWE record.
    pub fn insert_cwe(&mut self, id: impl Into<CweId>, record: CweRecord) {
        self.cwes.insert(id.into(), record);
    }
}

impl VulnCatalog for InMemoryVulnCatalog {
    fn batch_lookup_cves(&self, ids: &[CveId]) -> Result<BTreeMap<CveId, CveRecord>, CatalogError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.cves.get(id).map(|record| (id.clone(), record.clone())))
            .collect())
    }

    fn batch_lookup_cwes(&self, ids: &[CweId]) -> Result<BTreeMap<CweId, CweRecord>, CatalogError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.cwes.get(id).map(|record| (id.clone(), record.clone())))
            .collect())
    }
}

// ============================================================================
// SECTION: In-Memory Governance Store
// ============================================================================

/// Mutable governance state behind the store mutex.
#[derive(Debug, Default)]
struct GovernanceState {
    /// All configuration rows, insertion order.
    configurations: Vec<ModelConfiguration>,
    /// Ledger entries, insertion order.
    ledger: Vec<LedgerEntry>,
    /// Drift samples, insertion order.
    samples: Vec<DriftSample>,
}

/// In-memory governance store for tests and examples.
#[derive(Debug, Default)]
pub struct InMemoryGovernanceStore {
    /// Guarded state; single-writer discipline via the mutex.
    state: Mutex<GovernanceState>,
}

impl InMemoryGovernanceStore {
    /// Creates an empty governance store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a closure over the locked state.
    fn with_state<T>(
        &self,
        apply: impl FnOnce(&mut GovernanceState) -> Result<T, GovernanceError>,
    ) -> Result<T, GovernanceError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| GovernanceError::Store("governance store mutex poisoned".to_string()))?;
        apply(&mut guard)
    }
}

impl GovernanceStore for InMemoryGovernanceStore {
    fn active_configuration(&self) -> Result<Option<ModelConfiguration>, GovernanceError> {
        self.with_state(|state| {
            let active: Vec<&ModelConfiguration> =
                state.configurations.iter().filter(|config| config.is_active).collect();
            match active.as_slice() {
                [] => Ok(None),
                [config] => Ok(Some((*config).clone())),
                many => Err(GovernanceError::ConfigurationConflict(format!(
                    "{} active configurations found",
                    many.len()
                ))),
            }
        })
    }

    fn install_genesis(&self, configuration: &ModelConfiguration) -> Result<(), GovernanceError> {
        self.with_state(|state| {
            if state.configurations.iter().any(|config| config.is_active) {
                return Err(GovernanceError::Invalid(
                    "an active configuration already exists".to_string(),
                ));
            }
            state.configurations.push(configuration.clone());
            Ok(())
        })
    }

    fn commit_update(&self, update: &GovernanceUpdate) -> Result<(), GovernanceError> {
        self.with_state(|state| {
            let Some(position) = state
                .configurations
                .iter()
                .position(|config| config.version_id == update.deactivate_version && config.is_active)
            else {
                return Err(GovernanceError::ConfigurationConflict(format!(
                    "active configuration {} not found",
                    update.deactivate_version
                )));
            };
            let head =
                state.ledger.last().map_or(LEDGER_GENESIS_HASH, |entry| entry.hash_id.as_str());
            if update.ledger_entry.previous_hash != head {
                return Err(GovernanceError::Corrupt(
                    "ledger entry does not chain from the current head".to_string(),
                ));
            }
            state.configurations[position].is_active = false;
            let mut configuration = update.new_configuration.clone();
            configuration.is_active = true;
            state.configurations.push(configuration);
            state.ledger.push(update.ledger_entry.clone());
            state.samples.extend(update.drift_samples.iter().cloned());
            Ok(())
        })
    }

    fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), GovernanceError> {
        self.with_state(|state| {
            let head =
                state.ledger.last().map_or(LEDGER_GENESIS_HASH, |chained| chained.hash_id.as_str());
            if entry.previous_hash != head {
                return Err(GovernanceError::Corrupt(
                    "ledger entry does not chain from the current head".to_string(),
                ));
            }
            state.ledger.push(entry.clone());
            Ok(())
        })
    }

    fn last_ledger_hash(&self) -> Result<String, GovernanceError> {
        self.with_state(|state| {
            Ok(state
                .ledger
                .last()
                .map_or_else(|| LEDGER_GENESIS_HASH.to_string(), |entry| entry.hash_id.clone()))
        })
    }

    fn ledger_entries_ascending(&self) -> Result<Vec<LedgerEntry>, GovernanceError> {
        self.with_state(|state| Ok(state.ledger.clone()))
    }

    fn recent_ledger_entries(&self, limit: usize) -> Result<Vec<LedgerEntry>, GovernanceError> {
        self.with_state(|state| Ok(state.ledger.iter().rev().take(limit).cloned().collect()))
    }

    fn ledger_entry_count(&self) -> Result<u64, GovernanceError> {
        self.with_state(|state| Ok(state.ledger.len() as u64))
    }

    fn configuration_history(
        &self,
        limit: usize,
    ) -> Result<Vec<ModelConfiguration>, GovernanceError> {
        self.with_state(|state| {
            Ok(state.configurations.iter().rev().take(limit).cloned().collect())
        })
    }

    fn drift_sample_series(
        &self,
        metric: MetricName,
        limit: usize,
    ) -> Result<Vec<DriftSample>, GovernanceError> {
        self.with_state(|state| {
            let matching: Vec<DriftSample> = state
                .samples
                .iter()
                .filter(|sample| sample.metric_name == metric)
                .cloned()
                .collect();
            let skip = matching.len().saturating_sub(limit);
            Ok(matching.into_iter().skip(skip).collect())
        })
    }
}
