//! Error types shared by every pass

use thiserror::Error;

/// Errors produced while scanning, indexing or reading a dump
#[derive(Debug, Error)]
pub enum Error {
    /// Offset, title, coordinate row or metadata key is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Bytes are present but lack the expected title/body elements
    #[error("malformed page {record_num}: {reason}")]
    MalformedPage { record_num: u64, reason: String },

    /// Coordinate template has a compass-letter count other than two
    #[error("ambiguous coordinate: expected 2 compass letters, found {compass_count}")]
    ParseAmbiguity { compass_count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `MalformedPage` error for a record
    pub fn malformed(record_num: u64, reason: impl Into<String>) -> Self {
        Error::MalformedPage {
            record_num,
            reason: reason.into(),
        }
    }

    /// Whether the failure is confined to a single record and a pass may continue
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            Error::MalformedPage { .. } | Error::ParseAmbiguity { .. } | Error::Utf8(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_scoped_errors() {
        assert!(Error::malformed(3, "no title").is_record_scoped());
        assert!(Error::ParseAmbiguity { compass_count: 3 }.is_record_scoped());
        assert!(!Error::NotFound("offset 7".into()).is_record_scoped());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!Error::from(io).is_record_scoped());
    }

    #[test]
    fn test_malformed_message() {
        let err = Error::malformed(42, "missing <title>");
        assert_eq!(err.to_string(), "malformed page 42: missing <title>");
    }
}
