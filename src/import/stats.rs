//! Per-pass statistics

use serde::{Deserialize, Serialize};

/// Outcome of an offset scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Records found by the scanner during this run
    pub records_scanned: u64,
    /// Records newly persisted (others were already present)
    pub records_inserted: u64,
    /// Records carrying at least one coordinate template
    pub coordinates_found: u64,
    /// Records skipped because their coordinate page failed to parse
    pub records_errored: u64,
    /// Bytes covered by the spans found during this run
    pub bytes_scanned: u64,
    /// Record number the scan resumed after, if any
    pub resumed_after: Option<u64>,
    /// Whether the dump was scanned to its end
    pub complete: bool,
    /// Total record count, set once a full scan completes
    pub total_records: Option<u64>,
    pub elapsed_seconds: f64,
    pub records_per_second: f64,
}

/// Outcome of a title backfill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleStats {
    /// Titles written back to the offset table
    pub indexed: u64,
    /// Titles already claimed by an earlier record
    pub duplicate_titles: u64,
    /// Records skipped as malformed or undecodable
    pub malformed: u64,
    /// First record number visited by this run
    pub first_record: Option<u64>,
    pub elapsed_seconds: f64,
    pub records_per_second: f64,
}

/// Outcome of a coordinate backfill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackfillStats {
    /// Offset rows visited
    pub examined: u64,
    /// Coordinate rows newly written
    pub inserted: u64,
    /// Coordinate rows that already existed
    pub already_present: u64,
    /// Coordinate rows written without a position
    pub unparsed: u64,
    /// Records skipped as malformed or undecodable
    pub malformed: u64,
    pub elapsed_seconds: f64,
    pub records_per_second: f64,
}

fn rate(count: u64, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        count as f64 / elapsed_seconds
    } else {
        0.0
    }
}

impl ScanStats {
    pub fn finish(&mut self, elapsed_seconds: f64) {
        self.elapsed_seconds = elapsed_seconds;
        self.records_per_second = rate(self.records_scanned, elapsed_seconds);
    }
}

impl TitleStats {
    /// Records visited by this run
    pub fn visited(&self) -> u64 {
        self.indexed + self.duplicate_titles + self.malformed
    }

    pub fn finish(&mut self, elapsed_seconds: f64) {
        self.elapsed_seconds = elapsed_seconds;
        self.records_per_second = rate(self.visited(), elapsed_seconds);
    }
}

impl BackfillStats {
    pub fn finish(&mut self, elapsed_seconds: f64) {
        self.elapsed_seconds = elapsed_seconds;
        self.records_per_second = rate(self.examined, elapsed_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let mut stats = ScanStats {
            records_scanned: 500,
            ..Default::default()
        };
        stats.finish(2.0);
        assert_eq!(stats.records_per_second, 250.0);

        let mut titles = TitleStats {
            indexed: 3,
            duplicate_titles: 1,
            malformed: 1,
            ..Default::default()
        };
        titles.finish(0.0);
        assert_eq!(titles.visited(), 5);
        assert_eq!(titles.records_per_second, 0.0);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = TitleStats {
            indexed: 2,
            first_record: Some(0),
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["indexed"], 2);
        assert_eq!(json["first_record"], 0);
    }
}
