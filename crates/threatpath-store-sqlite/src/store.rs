// threatpath-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Governance Store
// Description: Durable GovernanceStore backed by SQLite WAL.
// Purpose: Persist configurations, the trust ledger, and drift samples.
// Dependencies: rusqlite, serde_json, threatpath-core, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`GovernanceStore`] using `SQLite`.
//! Ledger rows are append-only; configuration rows are superseded, never
//! edited, and a partial unique index enforces the exactly-one-active
//! invariant at the storage layer. The update bundle (deactivate old,
//! activate new, ledger append, drift samples) runs in one transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use thiserror::Error;
use threatpath_core::ConfigVersionId;
use threatpath_core::DriftSample;
use threatpath_core::GovernanceError;
use threatpath_core::GovernanceStore;
use threatpath_core::GovernanceUpdate;
use threatpath_core::LEDGER_GENESIS_HASH;
use threatpath_core::LedgerEntry;
use threatpath_core::MetricName;
use threatpath_core::ModelConfiguration;
use threatpath_core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` governance store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with durable defaults.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` governance store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite governance store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite governance store db error: {0}")]
    Db(String),
    /// Store corruption or chain mismatch.
    #[error("sqlite governance store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite governance store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite governance store invalid data: {0}")]
    Invalid(String),
    /// Active-configuration invariant violated.
    #[error("sqlite governance store configuration conflict: {0}")]
    Conflict(String),
}

impl From<SqliteStoreError> for GovernanceError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) | SqliteStoreError::Invalid(message) => {
                Self::Invalid(message)
            }
            SqliteStoreError::Conflict(message) => Self::ConfigurationConflict(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed governance store with WAL support.
#[derive(Clone)]
pub struct SqliteGovernanceStore {
    /// Shared `SQLite` connection guarded by a mutex (single writer).
    connection: Arc<Mutex<Connection>>,
}

impl SqliteGovernanceStore {
    /// Opens an `SQLite`-backed governance store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs a closure inside a transaction on the locked connection.
    fn with_transaction<T>(
        &self,
        apply: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("governance store mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let value = apply(&tx)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(value)
    }
}

impl GovernanceStore for SqliteGovernanceStore {
    fn active_configuration(&self) -> Result<Option<ModelConfiguration>, GovernanceError> {
        self.with_transaction(|tx| {
            let configs = query_configurations(
                tx,
                "SELECT version_id, is_active, containment_threshold, disruptive_threshold, \
                 trust_momentum, success_streak, failure_streak, created_at FROM \
                 model_configuration WHERE is_active = 1",
            )?;
            match configs.len() {
                0 => Ok(None),
                1 => Ok(configs.into_iter().next()),
                count => Err(SqliteStoreError::Conflict(format!(
                    "{count} active configurations found"
                ))),
            }
        })
        .map_err(GovernanceError::from)
    }

    fn install_genesis(&self, configuration: &ModelConfiguration) -> Result<(), GovernanceError> {
        self.with_transaction(|tx| {
            let active: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM model_configuration WHERE is_active = 1",
                    params![],
                    |row| row.get(0),
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if active > 0 {
                return Err(SqliteStoreError::Invalid(
                    "an active configuration already exists".to_string(),
                ));
            }
            insert_configuration(tx, configuration)
        })
        .map_err(GovernanceError::from)
    }

    fn commit_update(&self, update: &GovernanceUpdate) -> Result<(), GovernanceError> {
        self.with_transaction(|tx| {
            let deactivated = tx
                .execute(
                    "UPDATE model_configuration SET is_active = 0 WHERE version_id = ?1 AND \
                     is_active = 1",
                    params![update.deactivate_version.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if deactivated != 1 {
                return Err(SqliteStoreError::Conflict(format!(
                    "active configuration {} not found",
                    update.deactivate_version
                )));
            }
            insert_configuration(tx, &update.new_configuration)?;

            let active: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM model_configuration WHERE is_active = 1",
                    params![],
                    |row| row.get(0),
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if active != 1 {
                return Err(SqliteStoreError::Conflict(format!(
                    "{active} active configurations after update"
                )));
            }

            append_entry(tx, &update.ledger_entry)?;
            for sample in &update.drift_samples {
                insert_sample(tx, sample)?;
            }
            Ok(())
        })
        .map_err(GovernanceError::from)
    }

    fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), GovernanceError> {
        self.with_transaction(|tx| append_entry(tx, entry)).map_err(GovernanceError::from)
    }

    fn last_ledger_hash(&self) -> Result<String, GovernanceError> {
        self.with_transaction(|tx| last_hash(tx)).map_err(GovernanceError::from)
    }

    fn ledger_entries_ascending(&self) -> Result<Vec<LedgerEntry>, GovernanceError> {
        self.with_transaction(|tx| {
            query_entries(
                tx,
                "SELECT hash_id, previous_hash, timestamp, event_type, payload_json, actor FROM \
                 trust_ledger ORDER BY seq ASC",
            )
        })
        .map_err(GovernanceError::from)
    }

    fn recent_ledger_entries(&self, limit: usize) -> Result<Vec<LedgerEntry>, GovernanceError> {
        self.with_transaction(|tx| {
            let limit = i64::try_from(limit)
                .map_err(|_| SqliteStoreError::Invalid("limit too large".to_string()))?;
            let mut statement = tx
                .prepare(
                    "SELECT hash_id, previous_hash, timestamp, event_type, payload_json, actor \
                     FROM trust_ledger ORDER BY seq DESC LIMIT ?1",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![limit], map_entry_row)
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            rows.map(|row| {
                row.map_err(|err| SqliteStoreError::Db(err.to_string())).and_then(build_entry)
            })
            .collect()
        })
        .map_err(GovernanceError::from)
    }

    fn ledger_entry_count(&self) -> Result<u64, GovernanceError> {
        self.with_transaction(|tx| {
            let count: i64 = tx
                .query_row("SELECT COUNT(*) FROM trust_ledger", params![], |row| row.get(0))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            u64::try_from(count)
                .map_err(|_| SqliteStoreError::Corrupt("negative ledger count".to_string()))
        })
        .map_err(GovernanceError::from)
    }

    fn configuration_history(
        &self,
        limit: usize,
    ) -> Result<Vec<ModelConfiguration>, GovernanceError> {
        self.with_transaction(|tx| {
            let limit = i64::try_from(limit)
                .map_err(|_| SqliteStoreError::Invalid("limit too large".to_string()))?;
            let mut statement = tx
                .prepare(
                    "SELECT version_id, is_active, containment_threshold, disruptive_threshold, \
                     trust_momentum, success_streak, failure_streak, created_at FROM \
                     model_configuration ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![limit], map_configuration_row)
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            rows.map(|row| row.map_err(|err| SqliteStoreError::Db(err.to_string()))).collect()
        })
        .map_err(GovernanceError::from)
    }

    fn drift_sample_series(
        &self,
        metric: MetricName,
        limit: usize,
    ) -> Result<Vec<DriftSample>, GovernanceError> {
        self.with_transaction(|tx| {
            let limit = i64::try_from(limit)
                .map_err(|_| SqliteStoreError::Invalid("limit too large".to_string()))?;
            let mut statement = tx
                .prepare(
                    "SELECT timestamp, metric_value, alert_triggered FROM (SELECT id, timestamp, \
                     metric_value, alert_triggered FROM drift_samples WHERE metric_name = ?1 \
                     ORDER BY id DESC LIMIT ?2) ORDER BY id ASC",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![metric.as_str(), limit], |row| {
                    let timestamp: i64 = row.get(0)?;
                    let metric_value: f64 = row.get(1)?;
                    let alert_triggered: i64 = row.get(2)?;
                    Ok(DriftSample {
                        timestamp: Timestamp::from_unix_millis(timestamp),
                        metric_name: metric,
                        metric_value,
                        alert_triggered: alert_triggered != 0,
                    })
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            rows.map(|row| row.map_err(|err| SqliteStoreError::Db(err.to_string()))).collect()
        })
        .map_err(GovernanceError::from)
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS model_configuration (
                    version_id TEXT NOT NULL PRIMARY KEY,
                    is_active INTEGER NOT NULL,
                    containment_threshold REAL NOT NULL,
                    disruptive_threshold REAL NOT NULL,
                    trust_momentum REAL NOT NULL,
                    success_streak INTEGER NOT NULL,
                    failure_streak INTEGER NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_model_configuration_active
                    ON model_configuration (is_active) WHERE is_active = 1;
                CREATE TABLE IF NOT EXISTS trust_ledger (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    hash_id TEXT NOT NULL UNIQUE,
                    previous_hash TEXT NOT NULL,
                    timestamp INTEGER NOT NULL,
                    event_type TEXT NOT NULL,
                    payload_json TEXT NOT NULL,
                    actor TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS drift_samples (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp INTEGER NOT NULL,
                    metric_name TEXT NOT NULL,
                    metric_value REAL NOT NULL,
                    alert_triggered INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_drift_samples_metric
                    ON drift_samples (metric_name, id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw ledger row tuple.
type EntryRow = (String, String, i64, String, String, String);

/// Maps a ledger row into its raw tuple.
fn map_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

/// Builds a ledger entry from a raw row tuple.
fn build_entry(row: EntryRow) -> Result<LedgerEntry, SqliteStoreError> {
    let (hash_id, previous_hash, timestamp, event_type, payload_json, actor) = row;
    let payload: serde_json::Value = serde_json::from_str(&payload_json)
        .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    Ok(LedgerEntry {
        hash_id,
        previous_hash,
        timestamp: Timestamp::from_unix_millis(timestamp),
        event_type,
        payload,
        actor,
    })
}

/// Queries ledger entries with a fixed statement.
fn query_entries(tx: &Transaction<'_>, sql: &str) -> Result<Vec<LedgerEntry>, SqliteStoreError> {
    let mut statement = tx.prepare(sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params![], map_entry_row)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    rows.map(|row| row.map_err(|err| SqliteStoreError::Db(err.to_string())).and_then(build_entry))
        .collect()
}

/// Maps a configuration row.
fn map_configuration_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelConfiguration> {
    let version_id: String = row.get(0)?;
    let is_active: i64 = row.get(1)?;
    let containment_threshold: f64 = row.get(2)?;
    let disruptive_threshold: f64 = row.get(3)?;
    let trust_momentum: f64 = row.get(4)?;
    let success_streak: i64 = row.get(5)?;
    let failure_streak: i64 = row.get(6)?;
    let created_at: i64 = row.get(7)?;
    Ok(ModelConfiguration {
        version_id: ConfigVersionId::from(version_id),
        is_active: is_active != 0,
        containment_threshold,
        disruptive_threshold,
        trust_momentum,
        success_streak: u32::try_from(success_streak).unwrap_or(0),
        failure_streak: u32::try_from(failure_streak).unwrap_or(0),
        created_at: Timestamp::from_unix_millis(created_at),
    })
}

/// Queries configurations with a fixed statement.
fn query_configurations(
    tx: &Transaction<'_>,
    sql: &str,
) -> Result<Vec<ModelConfiguration>, SqliteStoreError> {
    let mut statement = tx.prepare(sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params![], map_configuration_row)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    rows.map(|row| row.map_err(|err| SqliteStoreError::Db(err.to_string()))).collect()
}

// ============================================================================
// SECTION: Write Helpers
// ============================================================================

/// Inserts a configuration row.
fn insert_configuration(
    tx: &Transaction<'_>,
    configuration: &ModelConfiguration,
) -> Result<(), SqliteStoreError> {
    tx.execute(
        "INSERT INTO model_configuration (version_id, is_active, containment_threshold, \
         disruptive_threshold, trust_momentum, success_streak, failure_streak, created_at) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            configuration.version_id.as_str(),
            i64::from(configuration.is_active),
            configuration.containment_threshold,
            configuration.disruptive_threshold,
            configuration.trust_momentum,
            i64::from(configuration.success_streak),
            i64::from(configuration.failure_streak),
            configuration.created_at.as_unix_millis(),
        ],
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the newest ledger hash, or the genesis hash when empty.
fn last_hash(tx: &Transaction<'_>) -> Result<String, SqliteStoreError> {
    let hash: Option<String> = tx
        .query_row("SELECT hash_id FROM trust_ledger ORDER BY seq DESC LIMIT 1", params![], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(hash.unwrap_or_else(|| LEDGER_GENESIS_HASH.to_string()))
}

/// Appends a ledger entry, verifying it chains from the current head.
fn append_entry(tx: &Transaction<'_>, entry: &LedgerEntry) -> Result<(), SqliteStoreError> {
    let head = last_hash(tx)?;
    if entry.previous_hash != head {
        return Err(SqliteStoreError::Corrupt(
            "ledger entry does not chain from the current head".to_string(),
        ));
    }
    let payload_json = serde_json::to_string(&entry.payload)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    tx.execute(
        "INSERT INTO trust_ledger (hash_id, previous_hash, timestamp, event_type, payload_json, \
         actor) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.hash_id,
            entry.previous_hash,
            entry.timestamp.as_unix_millis(),
            entry.event_type,
            payload_json,
            entry.actor,
        ],
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Inserts a drift sample row.
fn insert_sample(tx: &Transaction<'_>, sample: &DriftSample) -> Result<(), SqliteStoreError> {
    tx.execute(
        "INSERT INTO drift_samples (timestamp, metric_name, metric_value, alert_triggered) VALUES \
         (?1, ?2, ?3, ?4)",
        params![
            sample.timestamp.as_unix_millis(),
            sample.metric_name.as_str(),
            sample.metric_value,
            i64::from(sample.alert_triggered),
        ],
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
