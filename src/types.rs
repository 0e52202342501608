//! Core types for the geodump index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Record number, assigned in scan order starting at 0
pub type RecordNum = u64;

/// Named template arguments kept on a coordinate record.
///
/// Keys outside this set are dropped during extraction. The order here is the
/// column order of the `coordinates` table.
pub const COORDINATE_ATTRIBUTES: [&str; 20] = [
    "display",
    "format",
    "name",
    "notes",
    "region",
    "scale",
    "source",
    "type",
    "dim",
    "globe",
    "elevation",
    "title",
    "article",
    "accuracy",
    "altitude",
    "country",
    "heading",
    "zoom",
    "icon",
    "qid",
];

/// Whether `key` is one of the known coordinate attributes
pub fn is_coordinate_attribute(key: &str) -> bool {
    COORDINATE_ATTRIBUTES.contains(&key)
}

// ============================================================================
// Offsets
// ============================================================================

/// Half-open byte interval `[start, end)` into the dump file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

impl ByteSpan {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start < end, "empty span [{start}, {end})");
        Self { start, end }
    }

    /// Number of bytes covered by the span
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for ByteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One row of the offset index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRecord {
    pub record_num: RecordNum,
    /// Filled in by the title indexer
    pub title: Option<String>,
    pub span: ByteSpan,
    /// Bodies of every coordinate template found, joined with `||`
    pub raw_coord_text: Option<String>,
}

/// Last persisted scan position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// Highest record number persisted
    pub record_num: RecordNum,
    /// End offset of that record; the next record starts here
    pub end: u64,
}

impl Watermark {
    /// Record number the next scanned record receives
    pub fn next_record_num(&self) -> RecordNum {
        self.record_num + 1
    }
}

/// Result of a keyed insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written
    Inserted,
    /// A row with the same key already existed and was left untouched
    AlreadyPresent,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

// ============================================================================
// Coordinates
// ============================================================================

/// A location in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Structured coordinate data extracted from a record's canonical template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRecord {
    pub record_num: RecordNum,
    /// Body of the chosen template
    pub raw_text: String,
    /// `None` when the template could not be converted to decimal degrees
    pub position: Option<GeoPoint>,
    /// Template is displayed next to the article title (`display=title` and variants)
    pub on_title: bool,
    /// Known attributes present on the template
    pub attributes: BTreeMap<String, String>,
}

impl CoordinateRecord {
    /// Value of a known attribute, empty when absent
    pub fn attribute(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Which coordinate rows `list_records_matching` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFilter {
    /// Every record with a coordinate row
    All,
    /// Records whose coordinate converted to a position
    Parsed,
    /// Records whose canonical template is displayed next to the title
    CanonicalDisplay,
}

// ============================================================================
// Metadata
// ============================================================================

/// Keys of the metadata table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// Total record count, written once a full scan completes
    Size,
    /// RFC 3339 timestamp of the completed full scan
    CompletedAt,
    /// Layout version of the coordinates table
    CoordinateSchema,
}

impl MetadataKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::CompletedAt => "completed_at",
            Self::CoordinateSchema => "coordinate_schema",
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over the metadata table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DumpMetadata {
    /// Total record count; absent until a full scan has completed
    pub size: Option<u64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub coordinate_schema: Option<u32>,
}

impl DumpMetadata {
    /// Whether a full scan has ever completed
    pub fn is_fully_scanned(&self) -> bool {
        self.size.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        let span = ByteSpan::new(10, 25);
        assert_eq!(span.len(), 15);
        assert!(!span.is_empty());
        assert_eq!(span.to_string(), "[10, 25)");
    }

    #[test]
    fn test_watermark_next_record() {
        let wm = Watermark { record_num: 41, end: 9000 };
        assert_eq!(wm.next_record_num(), 42);
    }

    #[test]
    fn test_attribute_defaults_to_empty() {
        let mut attributes = BTreeMap::new();
        attributes.insert("display".to_string(), "inline,title".to_string());
        let record = CoordinateRecord {
            record_num: 1,
            raw_text: "coord|1|2|display=inline,title".to_string(),
            position: Some(GeoPoint::new(1.0, 2.0)),
            on_title: true,
            attributes,
        };
        assert_eq!(record.attribute("display"), "inline,title");
        assert_eq!(record.attribute("region"), "");
    }

    #[test]
    fn test_known_attributes() {
        assert!(is_coordinate_attribute("display"));
        assert!(is_coordinate_attribute("qid"));
        assert!(!is_coordinate_attribute("bogus"));
        assert_eq!(COORDINATE_ATTRIBUTES.len(), 20);
    }
}
