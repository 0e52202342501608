//! Coordinate regeneration from persisted offsets

use super::progress::PassProgress;
use super::stats::BackfillStats;
use crate::config::{MarkupConfig, TitleConfig};
use crate::content::PageReader;
use crate::error::Result;
use crate::geo::CoordinateExtractor;
use crate::index::IndexStore;
use tracing::{debug, info, warn};

/// Rebuilds coordinate rows for records already in the offset index.
///
/// Only records whose offset row carries raw coordinate text are re-read;
/// that text is recorded by the scan whenever a template was found.
pub struct CoordinateBackfill<'a> {
    store: &'a IndexStore,
    reader: PageReader<'a>,
    extractor: CoordinateExtractor,
    config: TitleConfig,
    quiet: bool,
}

impl<'a> CoordinateBackfill<'a> {
    pub fn new(
        store: &'a IndexStore,
        reader: PageReader<'a>,
        markup: &MarkupConfig,
        config: TitleConfig,
    ) -> Result<Self> {
        Ok(Self {
            store,
            reader,
            extractor: CoordinateExtractor::new(markup)?,
            config,
            quiet: false,
        })
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn run(&mut self) -> Result<BackfillStats> {
        let total = self.store.offset_count()?;
        info!("Backfilling coordinates over {} records", total);

        let progress = PassProgress::new(Some(total), "records", self.quiet);
        let mut stats = BackfillStats::default();
        let mut cursor = None;
        let mut pending = 0usize;

        loop {
            let batch = self.store.offsets_after(cursor, self.config.page_size)?;
            if batch.is_empty() {
                break;
            }

            for offset in batch {
                cursor = Some(offset.record_num);
                stats.examined += 1;
                progress.record_processed(offset.title.as_deref().unwrap_or(""));

                if offset.raw_coord_text.is_none() {
                    continue;
                }

                let page = match self.reader.page(offset.record_num) {
                    Ok(page) => page,
                    Err(e) if e.is_record_scoped() => {
                        warn!("Skipping record {}: {}", offset.record_num, e);
                        stats.malformed += 1;
                        progress.record_error();
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let Some(extraction) = self.extractor.extract(offset.record_num, &page.body)
                else {
                    debug!("Record {} no longer yields a template", offset.record_num);
                    continue;
                };

                if extraction.record.position.is_none() {
                    stats.unparsed += 1;
                }
                if self.store.record_coordinates(&extraction.record)?.is_inserted() {
                    stats.inserted += 1;
                } else {
                    stats.already_present += 1;
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
            "Backfilled {} coordinate rows ({} already present, {} without position)",
            stats.inserted, stats.already_present, stats.unparsed
        );
        Ok(stats)
    }
}
