// threatpath-core/src/runtime/vuln.rs
// ============================================================================
// Module: Vulnerability Intel Cache
// Description: Per-cycle memoizing read-through cache over a catalog.
// Purpose: Guarantee at-most-once fetches and zero-record degradation.
// Dependencies: crate::{core, interfaces, knowledge}, tracing
// ============================================================================

//! ## Overview
//! [`VulnIntel`] is the engine-facing vulnerability intelligence surface.
//! It wraps any [`VulnCatalog`] in a read-through cache keyed by identifier:
//! a given id is fetched at most once per engine instance, misses are
//! memoized as zero records so failing lookups never repeat, and catalog
//! failures degrade to zero records after a warning instead of raising.
//! Humanized CWE names win over catalog names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use tracing::warn;

use crate::core::CveId;
use crate::core::CweId;
use crate::interfaces::CveRecord;
use crate::interfaces::CweRecord;
use crate::interfaces::VulnCatalog;
use crate::knowledge::humanize_cwe;

// ============================================================================
// SECTION: Intel Cache
// ============================================================================

/// Memoizing vulnerability intelligence access layer.
pub struct VulnIntel {
    /// Underlying read-only catalog.
    catalog: Arc<dyn VulnCatalog + Send + Sync>,
    /// CVE record cache, including memoized misses.
    cves: RwLock<HashMap<CveId, CveRecord>>,
    /// CWE record cache, including memoized misses.
    cwes: RwLock<HashMap<CweId, CweRecord>>,
}

impl VulnIntel {
    /// Creates an intel cache over the provided catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn VulnCatalog + Send + Sync>) -> Self {
        Self {
            catalog,
            cves: RwLock::new(HashMap::new()),
            cwes: RwLock::new(HashMap::new()),
        }
    }

    /// Looks up CVE records, filling zero records for unknown identifiers.
    ///
    /// Never fails: catalog errors degrade to zero records.
    #[must_use]
    pub fn lookup_cves(&self, ids: &[CveId]) -> BTreeMap<CveId, CveRecord> {
        if ids.is_empty() {
            return BTreeMap::new();
        }
        let missing = {
            let cache = match self.cves.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            ids.iter().filter(|id| !cache.contains_key(*id)).cloned().collect::<Vec<_>>()
        };
        if !missing.is_empty() {
            let fetched = match self.catalog.batch_lookup_cves(&missing) {
                Ok(records) => records,
                Err(err) => {
                    warn!(error = %err, "cve catalog lookup degraded to zero records");
                    BTreeMap::new()
                }
            };
            let mut cache = match self.cves.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            for id in missing {
                let record = fetched.get(&id).cloned().unwrap_or_else(CveRecord::zero);
                cache.entry(id).or_insert(record);
            }
        }
        let cache = match self.cves.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ids.iter()
            .map(|id| (id.clone(), cache.get(id).cloned().unwrap_or_else(CveRecord::zero)))
            .collect()
    }

    /// Looks up CWE records, filling humanized unknown records for unmapped
    /// identifiers.
    ///
    /// Never fails: catalog errors degrade to unknown records.
    #[must_use]
    pub fn lookup_cwes(&self, ids: &[CweId]) -> BTreeMap<CweId, CweRecord> {
        if ids.is_empty() {
            return BTreeMap::new();
        }
        let missing = {
            let cache = match self.cwes.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            ids.iter().filter(|id| !cache.contains_key(*id)).cloned().collect::<Vec<_>>()
        };
        if !missing.is_empty() {
            let fetched = match self.catalog.batch_lookup_cwes(&missing) {
                Ok(records) => records,
                Err(err) => {
                    warn!(error = %err, "cwe catalog lookup degraded to unknown records");
                    BTreeMap::new()
                }
            };
            let mut cache = match self.cwes.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            for id in missing {
                let record = fetched
                    .get(&id)
                    .cloned()
                    .map_or_else(|| unknown_cwe_record(&id), |record| humanized(&id, record));
                cache.entry(id).or_insert(record);
            }
        }
        let cache = match self.cwes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ids.iter()
            .map(|id| (id.clone(), cache.get(id).cloned().unwrap_or_else(|| unknown_cwe_record(id))))
            .collect()
    }
}

// ============================================================================
// SECTION: Humanization Helpers
// ============================================================================

/// Applies the humanization dictionary over a catalog CWE record.
fn humanized(id: &CweId, record: CweRecord) -> CweRecord {
    match humanize_cwe(id.as_str()) {
        Some(name) => CweRecord {
            name: name.to_string(),
            abstraction: record.abstraction,
        },
        None => record,
    }
}

/// Builds the degraded record for a CWE absent from the catalog.
fn unknown_cwe_record(id: &CweId) -> CweRecord {
    CweRecord {
        name: humanize_cwe(id.as_str()).unwrap_or("Unknown").to_string(),
        abstraction: "Unknown".to_string(),
    }
}
