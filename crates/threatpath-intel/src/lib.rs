// threatpath-intel/src/lib.rs
// ============================================================================
// Module: ThreatPath Intel Library
// Description: SQLite-backed vulnerability catalog access.
// Purpose: Expose the read-only catalog implementation.
// Dependencies: crate::catalog
// ============================================================================

//! ## Overview
//! `threatpath-intel` implements the core [`threatpath_core::VulnCatalog`]
//! trait over a pre-indexed read-only `SQLite` catalog (CVE, CWE, KEV, and
//! the CVE-to-CWE junction). Engines consume it through the core
//! `VulnIntel` cache, which adds per-cycle memoization and zero-record
//! degradation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::SqliteCatalogConfig;
pub use catalog::SqliteCatalogError;
pub use catalog::SqliteVulnCatalog;
