//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the indexer begins
//! writing blocks.

use std::path::Path;

use heed::Env;

use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that a valid stakescan environment holds.
pub const EXPECTED_DATABASES: &[&str] = &[
    "staking_events",
    "token_events",
    "accounts",
    "nodes",
    "redemptions",
    "snapshots",
    "meta",
];

/// Open each expected database and count its entries. Read failures are
/// recorded in the report rather than causing a hard error.
pub fn check_integrity(env: &Env) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    Ok(report)
}

/// Check that the LMDB data directory looks valid before opening.
///
/// A nonexistent or empty directory is a fresh start. A non-empty directory
/// without `data.mdb` suggests misconfiguration and is rejected.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    if path.join("data.mdb").exists() {
        return Ok(());
    }
    let is_empty = std::fs::read_dir(path)
        .map_err(|e| format!("cannot read data directory {}: {}", path.display(), e))?
        .next()
        .is_none();
    if is_empty {
        return Ok(());
    }
    Err(format!(
        "data directory {} is not empty but data.mdb is missing",
        path.display()
    ))
}
