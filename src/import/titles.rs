//! Title backfill over the offset index

use super::progress::PassProgress;
use super::stats::TitleStats;
use crate::config::TitleConfig;
use crate::content::PageReader;
use crate::error::Result;
use crate::index::IndexStore;
use crate::types::InsertOutcome;
use tracing::{info, warn};

/// Fills in the title of every untitled offset row
pub struct TitleIndexer<'a> {
    store: &'a IndexStore,
    reader: PageReader<'a>,
    config: TitleConfig,
    /// Stop after visiting this many records
    max_records: Option<u64>,
    quiet: bool,
}

impl<'a> TitleIndexer<'a> {
    pub fn new(store: &'a IndexStore, reader: PageReader<'a>, config: TitleConfig) -> Self {
        Self {
            store,
            reader,
            config,
            max_records: None,
            quiet: false,
        }
    }

    /// Visit at most `max` records this run
    pub fn with_max_records(mut self, max: Option<u64>) -> Self {
        self.max_records = max;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Walk untitled records in ascending order and write their titles back.
    ///
    /// Records that fail to parse are logged and left untitled. Titles become
    /// durable every `batch_size` rows and once more at the end.
    pub fn run(&mut self) -> Result<TitleStats> {
        let remaining = self
            .store
            .offset_count()?
            .saturating_sub(self.store.titled_count()?);
        let expected = match self.max_records {
            Some(max) => max.min(remaining),
            None => remaining,
        };
        info!("Indexing titles for {} records", expected);

        let progress = PassProgress::new(Some(expected), "titles", self.quiet);
        let mut stats = TitleStats::default();
        let mut cursor = None;
        let mut pending = 0usize;

        'pages: loop {
            let batch = self.store.untitled_after(cursor, self.config.page_size)?;
            if batch.is_empty() {
                break;
            }

            for record_num in batch {
                if self.max_records.is_some_and(|max| stats.visited() >= max) {
                    info!("Reached max records limit after record {:?}", cursor);
                    break 'pages;
                }
                cursor = Some(record_num);
                stats.first_record.get_or_insert(record_num);

                match self.reader.page(record_num) {
                    Ok(page) => {
                        match self.store.set_title(record_num, &page.title)? {
                            InsertOutcome::Inserted => stats.indexed += 1,
                            InsertOutcome::AlreadyPresent => stats.duplicate_titles += 1,
                        }
                        progress.record_processed(&page.title);
                    }
                    Err(e) if e.is_record_scoped() => {
                        warn!("Skipping record {}: {}", record_num, e);
                        stats.malformed += 1;
                        progress.record_error();
                    }
                    Err(e) => return Err(e),
                }

                pending += 1;
                if pending >= self.config.batch_size {
                    self.store.commit()?;
                    pending = 0;
                }
            }
        }
        self.store.commit()?;

        progress.finish();
        stats.finish(progress.elapsed_seconds());
        info!(
            "Indexed {} titles ({} duplicates, {} malformed) in {:.1}s",
            stats.indexed, stats.duplicate_titles, stats.malformed, stats.elapsed_seconds
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkupConfig;
    use crate::types::ByteSpan;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Dump of `pages` records, each either well formed or missing its title
    fn fixture(pages: &[Option<&str>]) -> (NamedTempFile, IndexStore) {
        let mut file = NamedTempFile::new().unwrap();
        let store = IndexStore::open_in_memory().unwrap();
        let mut offset = 0u64;
        for (i, title) in pages.iter().enumerate() {
            let record = match title {
                Some(title) => format!(
                    "<page><title>{}</title><revision><text>body</text></revision></page>\n",
                    title
                ),
                None => "<page><revision><text>body</text></revision></page>\n".to_string(),
            };
            file.write_all(record.as_bytes()).unwrap();
            let end = offset + record.len() as u64;
            store.record_offset(i as u64, ByteSpan::new(offset, end), None).unwrap();
            offset = end;
        }
        store.commit().unwrap();
        (file, store)
    }

    fn indexer<'a>(file: &NamedTempFile, store: &'a IndexStore) -> TitleIndexer<'a> {
        let reader = PageReader::open(file.path(), store, &MarkupConfig::default()).unwrap();
        let config = TitleConfig {
            batch_size: 2,
            page_size: 2,
        };
        TitleIndexer::new(store, reader, config).with_quiet(true)
    }

    #[test]
    fn test_titles_written_and_malformed_skipped() {
        let (file, store) = fixture(&[Some("Alpha"), None, Some("Gamma"), Some("Alpha")]);
        let stats = indexer(&file, &store).run().unwrap();

        assert_eq!(stats.indexed, 2);
        assert_eq!(stats.duplicate_titles, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.first_record, Some(0));

        assert_eq!(store.lookup_title("Gamma").unwrap(), 2);
        assert_eq!(store.lookup_title("Alpha").unwrap(), 0);
        assert_eq!(store.offset(1).unwrap().title, None);
        assert_eq!(store.untitled_after(None, 10).unwrap(), vec![1]);
    }

    #[test]
    fn test_max_records_then_resume() {
        let titles: Vec<String> = (0..5).map(|i| format!("T{}", i)).collect();
        let pages: Vec<Option<&str>> = titles.iter().map(|t| Some(t.as_str())).collect();
        let (file, store) = fixture(&pages);

        let first = indexer(&file, &store).with_max_records(Some(3)).run().unwrap();
        assert_eq!(first.indexed, 3);
        assert_eq!(store.titled_count().unwrap(), 3);

        let second = indexer(&file, &store).run().unwrap();
        assert_eq!(second.first_record, Some(3));
        assert_eq!(second.indexed, 2);
        assert_eq!(store.titled_count().unwrap(), 5);
    }
}
