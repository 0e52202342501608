//! Streaming record-boundary scanner
//!
//! Walks the dump line by line with one sequential buffered cursor. A record
//! starts at every line whose content (after leading whitespace) begins with
//! the opening marker, and ends where the next such line begins. Bytes before
//! the first marker are preamble and are never emitted.

use crate::error::Result;
use crate::types::{ByteSpan, RecordNum, Watermark};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// One record boundary found by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub record_num: RecordNum,
    pub span: ByteSpan,
    /// Record bytes, exactly `span.len()` long
    pub raw: Vec<u8>,
}

/// Record currently being accumulated
struct OpenRecord {
    start: u64,
    raw: Vec<u8>,
}

/// Sequential scanner over a dump stream
pub struct DumpScanner<R> {
    reader: R,
    marker: Vec<u8>,
    /// Byte offset of the next unread line
    pos: u64,
    next_record_num: RecordNum,
    /// Stop once more than this many records have been found
    limit: Option<u64>,
    open: Option<OpenRecord>,
    line: Vec<u8>,
    done: bool,
}

impl DumpScanner<BufReader<File>> {
    /// Scan a dump file from the beginning
    pub fn open(path: impl AsRef<Path>, marker: &str, buffer_capacity: usize) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(
            BufReader::with_capacity(buffer_capacity, file),
            marker,
        ))
    }

    /// Continue a scan after the last persisted record
    pub fn resume_from(
        path: impl AsRef<Path>,
        marker: &str,
        buffer_capacity: usize,
        watermark: Watermark,
    ) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        file.seek(SeekFrom::Start(watermark.end))?;
        debug!(
            "Resuming scan at byte {} with record {}",
            watermark.end,
            watermark.next_record_num()
        );
        let reader = BufReader::with_capacity(buffer_capacity, file);
        Ok(Self::new(reader, marker).starting_at(watermark.end, watermark.next_record_num()))
    }
}

impl<R: BufRead> DumpScanner<R> {
    /// Scan `reader` from its current position, treated as byte 0
    pub fn new(reader: R, marker: &str) -> Self {
        Self {
            reader,
            marker: marker.as_bytes().to_vec(),
            pos: 0,
            next_record_num: 0,
            limit: None,
            open: None,
            line: Vec::new(),
            done: false,
        }
    }

    /// Offset and numbering of the reader's current position
    pub fn starting_at(mut self, offset: u64, next_record_num: RecordNum) -> Self {
        self.pos = offset;
        self.next_record_num = next_record_num;
        self
    }

    /// Stop once the count of records found exceeds `limit`
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Byte offset the scanner has read up to
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Whether the scan stopped because of its sample limit rather than EOF
    pub fn hit_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.next_record_num > limit)
    }

    fn is_marker(&self, line: &[u8]) -> bool {
        let content = match line.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(i) => &line[i..],
            None => return false,
        };
        content.starts_with(&self.marker)
    }

    fn close(&mut self, end: u64) -> Option<ScannedRecord> {
        let open = self.open.take()?;
        let record = ScannedRecord {
            record_num: self.next_record_num,
            span: ByteSpan::new(open.start, end),
            raw: open.raw,
        };
        self.next_record_num += 1;
        Some(record)
    }

    fn next_record(&mut self) -> Result<Option<ScannedRecord>> {
        loop {
            self.line.clear();
            let read = self.reader.read_until(b'\n', &mut self.line)?;
            if read == 0 {
                return Ok(self.close(self.pos));
            }

            let line_start = self.pos;
            self.pos += read as u64;

            if self.is_marker(&self.line) {
                let finished = self.close(line_start);
                self.open = Some(OpenRecord {
                    start: line_start,
                    raw: std::mem::take(&mut self.line),
                });
                if finished.is_some() {
                    return Ok(finished);
                }
            } else if let Some(open) = self.open.as_mut() {
                open.raw.extend_from_slice(&self.line);
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpScanner<R> {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.hit_limit() {
            self.done = true;
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const DUMP: &str = "<mediawiki>\n  <siteinfo>x</siteinfo>\n  <page>\n    <title>A</title>\n  </page>\n  <page>\n    <title>B</title>\n  </page>\n</mediawiki>\n";

    fn scan(input: &str) -> Vec<ScannedRecord> {
        DumpScanner::new(Cursor::new(input.as_bytes()), "<page>")
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_spans_are_contiguous_after_preamble() {
        let records = scan(DUMP);
        assert_eq!(records.len(), 2);

        let preamble = DUMP.find("  <page>").unwrap() as u64;
        assert_eq!(records[0].record_num, 0);
        assert_eq!(records[0].span.start, preamble);
        assert_eq!(records[0].span.end, records[1].span.start);
        assert_eq!(records[1].record_num, 1);
        assert_eq!(records[1].span.end, DUMP.len() as u64);

        let total: u64 = records.iter().map(|r| r.span.len()).sum();
        assert_eq!(total, DUMP.len() as u64 - preamble);
    }

    #[test]
    fn test_raw_matches_span() {
        let records = scan(DUMP);
        for record in &records {
            let expected = &DUMP.as_bytes()[record.span.start as usize..record.span.end as usize];
            assert_eq!(record.raw, expected);
        }
        assert!(records[1].raw.ends_with(b"</mediawiki>\n"));
    }

    #[test]
    fn test_no_markers_yields_nothing() {
        assert!(scan("<mediawiki>\n</mediawiki>\n").is_empty());
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_marker_must_start_the_line() {
        let records = scan("<page>a</page>\ntext <page> inline\n<page>b</page>");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw, b"<page>a</page>\ntext <page> inline\n");
        assert_eq!(records[1].raw, b"<page>b</page>");
    }

    #[test]
    fn test_sample_limit_stops_early() {
        let input = "<page>0\n<page>1\n<page>2\n<page>3\n<page>4\n";
        let mut scanner =
            DumpScanner::new(Cursor::new(input.as_bytes()), "<page>").with_limit(Some(2));
        let records: Vec<_> = scanner.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 3);
        assert!(scanner.hit_limit());
    }

    #[test]
    fn test_resume_from_watermark() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();

        let full = scan(DUMP);
        let watermark = Watermark {
            record_num: full[0].record_num,
            end: full[0].span.end,
        };
        let resumed: Vec<_> = DumpScanner::resume_from(file.path(), "<page>", 64, watermark)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(resumed, full[1..].to_vec());
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(DumpScanner::open("/nonexistent/dump.xml", "<page>", 1024).is_err());
    }
}
