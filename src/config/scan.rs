//! Dump location, scan and title-pass configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the dump lives and where its index is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Uncompressed XML dump file
    pub path: PathBuf,
    /// Directory holding `index.db`
    pub index_dir: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            index_dir: PathBuf::from(".geodump"),
        }
    }
}

impl DumpConfig {
    /// Path of the SQLite index inside `index_dir`
    pub fn index_path(&self) -> PathBuf {
        self.index_dir.join("index.db")
    }
}

/// Offset scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Commit the index store every N persisted records
    pub commit_every: usize,
    /// Fraction of `estimated_records` to scan (1.0 = full scan)
    pub sample_fraction: f64,
    /// Estimated record count of the dump, used by sampled scans
    pub estimated_records: u64,
    /// Read buffer size of the sequential cursor in bytes
    pub buffer_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            commit_every: 1000,
            sample_fraction: 1.0,
            estimated_records: 21_000_000, // English Wikipedia, all namespaces
            buffer_capacity: 1024 * 1024,
        }
    }
}

impl ScanConfig {
    pub fn is_sampled(&self) -> bool {
        self.sample_fraction < 1.0
    }

    /// Record count after which a sampled scan stops; `None` for a full scan
    pub fn sample_limit(&self) -> Option<u64> {
        if self.is_sampled() {
            Some((self.estimated_records as f64 * self.sample_fraction) as u64)
        } else {
            None
        }
    }
}

/// Title and coordinate backfill configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Commit every N backfilled rows
    pub batch_size: usize,
    /// Rows fetched from the index per query
    pub page_size: usize,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            page_size: 10_000,
        }
    }
}
