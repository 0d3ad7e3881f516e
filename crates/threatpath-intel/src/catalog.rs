// threatpath-intel/src/catalog.rs
// ============================================================================
// Module: SQLite Vulnerability Catalog
// Description: Read-only batch lookups over the pre-indexed intel database.
// Purpose: Implement the core VulnCatalog trait for SQLite catalogs.
// Dependencies: rusqlite, threatpath-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! The catalog database is produced by an upstream intelligence pipeline and
//! is strictly read-only here: connections open with read-only flags and a
//! short busy timeout. Batch lookups run one `IN`-list query per table;
//! missing identifiers are simply absent from the result map (the core
//! cache fills zero records). Any failure maps to
//! [`threatpath_core::CatalogError`], which the cache degrades to zero
//! records rather than raising.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::types::Value as SqlValue;
use thiserror::Error;
use threatpath_core::CatalogError;
use threatpath_core::CveId;
use threatpath_core::CveRecord;
use threatpath_core::CweId;
use threatpath_core::CweRecord;
use threatpath_core::VulnCatalog;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout for catalog connections (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 2_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` vulnerability catalog.
#[derive(Debug, Clone)]
pub struct SqliteCatalogConfig {
    /// Path to the catalog database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteCatalogConfig {
    /// Creates a config with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` catalog errors.
#[derive(Debug, Error)]
pub enum SqliteCatalogError {
    /// The catalog database could not be opened.
    #[error("catalog open error: {0}")]
    Open(String),
    /// A catalog query failed.
    #[error("catalog query error: {0}")]
    Query(String),
}

impl From<SqliteCatalogError> for CatalogError {
    fn from(error: SqliteCatalogError) -> Self {
        match error {
            SqliteCatalogError::Open(message) => Self::Unavailable(message),
            SqliteCatalogError::Query(message) => Self::Unavailable(message),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Read-only `SQLite`-backed vulnerability catalog.
#[derive(Clone)]
pub struct SqliteVulnCatalog {
    /// Shared read-only connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteVulnCatalog {
    /// Opens the catalog database read-only.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCatalogError::Open`] when the file cannot be opened.
    pub fn open(config: &SqliteCatalogConfig) -> Result<Self, SqliteCatalogError> {
        let connection = open_read_only(&config.path, config.busy_timeout_ms)?;
        debug!(path = %config.path.display(), "vulnerability catalog opened");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

impl VulnCatalog for SqliteVulnCatalog {
    fn batch_lookup_cves(&self, ids: &[CveId]) -> Result<BTreeMap<CveId, CveRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let guard = self
            .connection
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))?;
        let placeholders = placeholder_list(ids.len());
        let sql = format!(
            "SELECT c.cve_id, c.cvss_v3_score, c.description, \
             (SELECT GROUP_CONCAT(m.cwe_id) FROM cve_cwe_map m WHERE m.cve_id = c.cve_id), \
             (SELECT 1 FROM kev k WHERE k.cve_id = c.cve_id), \
             (SELECT k.vulnerability_name FROM kev k WHERE k.cve_id = c.cve_id) \
             FROM cve c WHERE c.cve_id IN ({placeholders})"
        );
        let mut statement =
            guard.prepare(&sql).map_err(|err| CatalogError::Unavailable(err.to_string()))?;
        let params: Vec<SqlValue> =
            ids.iter().map(|id| SqlValue::Text(id.as_str().to_string())).collect();
        let rows = statement
            .query_map(rusqlite::params_from_iter(params), |row| {
                let cve_id: String = row.get(0)?;
                let cvss: Option<f64> = row.get(1)?;
                let description: Option<String> = row.get(2)?;
                let cwe_list: Option<String> = row.get(3)?;
                let is_kev: Option<i64> = row.get(4)?;
                let kev_name: Option<String> = row.get(5)?;
                Ok((cve_id, cvss, description, cwe_list, is_kev, kev_name))
            })
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

        let mut records = BTreeMap::new();
        for row in rows {
            let (cve_id, cvss, description, cwe_list, is_kev, kev_name) =
                row.map_err(|err| CatalogError::Invalid(err.to_string()))?;
            let cwe_ids = cwe_list
                .unwrap_or_default()
                .split(',')
                .filter(|part| !part.is_empty())
                .map(CweId::from)
                .collect();
            records.insert(CveId::from(cve_id), CveRecord {
                cvss: cvss.unwrap_or(0.0),
                description: description.unwrap_or_default(),
                cwe_ids,
                is_kev: is_kev.is_some(),
                kev_name,
            });
        }
        Ok(records)
    }

    fn batch_lookup_cwes(&self, ids: &[CweId]) -> Result<BTreeMap<CweId, CweRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let guard = self
            .connection
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))?;
        let placeholders = placeholder_list(ids.len());
        let sql =
            format!("SELECT cwe_id, name, abstraction FROM cwe WHERE cwe_id IN ({placeholders})");
        let mut statement =
            guard.prepare(&sql).map_err(|err| CatalogError::Unavailable(err.to_string()))?;
        let params: Vec<SqlValue> =
            ids.iter().map(|id| SqlValue::Text(id.as_str().to_string())).collect();
        let rows = statement
            .query_map(rusqlite::params_from_iter(params), |row| {
                let cwe_id: String = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                let abstraction: Option<String> = row.get(2)?;
                Ok((cwe_id, name, abstraction))
            })
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

        let mut records = BTreeMap::new();
        for row in rows {
            let (cwe_id, name, abstraction) =
                row.map_err(|err| CatalogError::Invalid(err.to_string()))?;
            records.insert(CweId::from(cwe_id), CweRecord {
                name: name.unwrap_or_else(|| "Unknown".to_string()),
                abstraction: abstraction.unwrap_or_else(|| "Unknown".to_string()),
            });
        }
        Ok(records)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens a read-only connection with the busy timeout applied.
fn open_read_only(path: &Path, busy_timeout_ms: u64) -> Result<Connection, SqliteCatalogError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)
        .map_err(|err| SqliteCatalogError::Open(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(busy_timeout_ms))
        .map_err(|err| SqliteCatalogError::Open(err.to_string()))?;
    Ok(connection)
}

/// Builds a `?1, ?2, …` placeholder list.
fn placeholder_list(count: usize) -> String {
    (1 ..= count).map(|index| format!("?{index}")).collect::<Vec<_>>().join(", ")
}
