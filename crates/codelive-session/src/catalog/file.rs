//! JSON-file exercise catalog.
//!
//! Exercise definitions are read once at startup from a JSON array and
//! served from memory afterwards, matching the catalog's read-only
//! contract.

use std::path::Path;

use codelive_core::{CatalogError, Exercise};

use super::memory::MemoryCatalog;

/// Load a catalog from a JSON file containing an array of exercises.
///
/// # Errors
/// `Internal` on I/O or parse failure, `DuplicateId` if two entries
/// share an id.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MemoryCatalog, CatalogError> {
    let raw = std::fs::read_to_string(path.as_ref())
        .map_err(|e| CatalogError::Internal(format!("read {}: {e}", path.as_ref().display())))?;
    from_json(&raw)
}

/// Parse a catalog from a JSON array of exercises.
///
/// # Errors
/// `Internal` on parse failure, `DuplicateId` if two entries share an
/// id.
pub fn from_json(raw: &str) -> Result<MemoryCatalog, CatalogError> {
    let exercises: Vec<Exercise> =
        serde_json::from_str(raw).map_err(|e| CatalogError::Internal(format!("parse: {e}")))?;
    MemoryCatalog::new(exercises)
}
