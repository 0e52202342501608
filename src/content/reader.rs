//! Byte-span random access into the dump

use super::page::Page;
use crate::config::MarkupConfig;
use crate::error::{Error, Result};
use crate::index::IndexStore;
use crate::types::RecordNum;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Fetches records by number through the offset index.
///
/// Owns its own file handle, independent of any running scan.
pub struct PageReader<'a> {
    store: &'a IndexStore,
    file: File,
    /// Dump length at open time
    len: u64,
    page_close: Vec<u8>,
}

impl<'a> PageReader<'a> {
    /// Open the dump for random access against `store`
    pub fn open(
        dump_path: impl AsRef<Path>,
        store: &'a IndexStore,
        markup: &MarkupConfig,
    ) -> Result<Self> {
        let file = File::open(dump_path.as_ref())?;
        let len = file.metadata()?.len();
        Ok(Self {
            store,
            file,
            len,
            page_close: markup.page_close.as_bytes().to_vec(),
        })
    }

    /// Exact bytes of a record.
    ///
    /// The final record's span runs to the end of the file, so it is cut
    /// right after its last closing marker to drop the dump's trailer.
    pub fn raw_bytes(&mut self, record_num: RecordNum) -> Result<Vec<u8>> {
        let span = self.store.lookup_span(record_num)?;
        self.file.seek(SeekFrom::Start(span.start))?;

        if span.end < self.len {
            let mut buf = vec![0u8; span.len() as usize];
            self.file.read_exact(&mut buf)?;
            return Ok(buf);
        }

        let mut buf = Vec::new();
        self.file.read_to_end(&mut buf)?;
        let cut = last_closing(&buf, &self.page_close).ok_or_else(|| {
            Error::malformed(record_num, "final record has no closing marker")
        })?;
        debug!(
            "Record {} is final, truncated {} trailing bytes",
            record_num,
            buf.len() - cut
        );
        buf.truncate(cut);
        Ok(buf)
    }

    /// Record text as UTF-8
    pub fn raw(&mut self, record_num: RecordNum) -> Result<String> {
        Ok(String::from_utf8(self.raw_bytes(record_num)?)?)
    }

    /// Parsed title and body of a record
    pub fn page(&mut self, record_num: RecordNum) -> Result<Page> {
        let raw = self.raw(record_num)?;
        Page::parse(&raw, record_num)
    }
}

/// Offset just past the last occurrence of `marker`
fn last_closing(buf: &[u8], marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || buf.len() < marker.len() {
        return None;
    }
    buf.windows(marker.len())
        .rposition(|w| w == marker)
        .map(|pos| pos + marker.len())
}
