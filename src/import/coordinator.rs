//! Scan coordinator that drives the offset pass

use super::progress::PassProgress;
use super::scanner::{DumpScanner, ScannedRecord};
use super::stats::ScanStats;
use crate::config::{MarkupConfig, ScanConfig};
use crate::content::Page;
use crate::error::Result;
use crate::geo::{CoordinateExtractor, Extraction};
use crate::index::IndexStore;
use crate::util::preview_bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persists every record span of a dump, plus coordinates where present
pub struct ScanCoordinator<'a> {
    store: &'a IndexStore,
    dump_path: PathBuf,
    config: ScanConfig,
    markup: MarkupConfig,
    extractor: CoordinateExtractor,
    quiet: bool,
}

impl<'a> ScanCoordinator<'a> {
    /// Create a coordinator writing into `store`
    pub fn new(
        store: &'a IndexStore,
        dump_path: impl AsRef<Path>,
        config: ScanConfig,
        markup: MarkupConfig,
    ) -> Result<Self> {
        let extractor = CoordinateExtractor::new(&markup)?;
        Ok(Self {
            store,
            dump_path: dump_path.as_ref().to_path_buf(),
            config,
            markup,
            extractor,
            quiet: false,
        })
    }

    /// Set quiet mode (no progress output)
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run the scan, resuming after the store's watermark.
    ///
    /// A dump whose `size` is already recorded is not scanned again.
    pub fn run(&self) -> Result<ScanStats> {
        let metadata = self.store.metadata()?;
        if let Some(size) = metadata.size {
            info!("Dump already fully scanned ({} records), skipping", size);
            return Ok(ScanStats {
                complete: true,
                total_records: Some(size),
                ..Default::default()
            });
        }

        let watermark = self.store.watermark()?;
        let scanner = match watermark {
            Some(watermark) => {
                info!(
                    "Resuming scan of {} after record {} (byte {})",
                    self.dump_path.display(),
                    watermark.record_num,
                    watermark.end
                );
                DumpScanner::resume_from(
                    &self.dump_path,
                    &self.markup.page_open,
                    self.config.buffer_capacity,
                    watermark,
                )?
            }
            None => {
                info!("Starting scan of {}", self.dump_path.display());
                DumpScanner::open(
                    &self.dump_path,
                    &self.markup.page_open,
                    self.config.buffer_capacity,
                )?
            }
        };
        let mut scanner = scanner.with_limit(self.config.sample_limit());

        let progress = PassProgress::new(self.config.sample_limit(), "records", self.quiet);
        let mut stats = ScanStats {
            resumed_after: watermark.map(|w| w.record_num),
            ..Default::default()
        };
        let mut pending = 0usize;

        for record in scanner.by_ref() {
            let record = record?;
            stats.records_scanned += 1;
            stats.bytes_scanned += record.span.len();

            let extraction = match self.extract(&record) {
                Ok(extraction) => extraction,
                Err(e) if e.is_record_scoped() => {
                    warn!(
                        "Record {} at {}: coordinates skipped: {} ({})",
                        record.record_num,
                        record.span,
                        e,
                        preview_bytes(&record.raw, 40)
                    );
                    stats.records_errored += 1;
                    progress.record_error();
                    None
                }
                Err(e) => return Err(e),
            };

            let raw_coord_text = extraction.as_ref().map(|x| x.raw_coord_text.as_str());
            let outcome = self
                .store
                .record_offset(record.record_num, record.span, raw_coord_text)?;
            if outcome.is_inserted() {
                stats.records_inserted += 1;
            }
            if let Some(extraction) = &extraction {
                stats.coordinates_found += 1;
                self.store.record_coordinates(&extraction.record)?;
            }

            progress.record_processed(&format!("record {}", record.record_num));

            pending += 1;
            if pending >= self.config.commit_every {
                self.store.commit()?;
                pending = 0;
            }
        }
        self.store.commit()?;

        if self.config.is_sampled() {
            info!(
                "Sampled scan stopped after {} records; dump size left unset",
                stats.records_scanned
            );
        } else if !scanner.hit_limit() {
            let total = self
                .store
                .watermark()?
                .map(|w| w.next_record_num())
                .unwrap_or(0);
            self.store.mark_scan_complete(total)?;
            stats.complete = true;
            stats.total_records = Some(total);
            info!("Scan complete: {} records in dump", total);
        }

        progress.finish();
        stats.finish(progress.elapsed_seconds());
        info!(
            "Scanned {} records ({} new, {} with coordinates, {} errors) in {:.1}s",
            stats.records_scanned,
            stats.records_inserted,
            stats.coordinates_found,
            stats.records_errored,
            stats.elapsed_seconds
        );
        Ok(stats)
    }

    /// Coordinates of a scanned record, if its text carries a template
    fn extract(&self, record: &ScannedRecord) -> Result<Option<Extraction>> {
        if !self.extractor.contains_marker(&record.raw) {
            return Ok(None);
        }
        let text = String::from_utf8(record.raw.clone())?;
        let page = Page::parse(&text, record.record_num)?;
        let extraction = self.extractor.extract(record.record_num, &page.body);
        if extraction.is_none() {
            debug!("Record {} has a marker but no complete template", record.record_num);
        }
        Ok(extraction)
    }
}

/// Builder for ScanCoordinator with sensible defaults
pub struct ScanCoordinatorBuilder {
    dump_path: PathBuf,
    config: ScanConfig,
    markup: MarkupConfig,
    quiet: bool,
}

impl ScanCoordinatorBuilder {
    /// Create a new builder with default settings
    pub fn new(dump_path: impl AsRef<Path>) -> Self {
        Self {
            dump_path: dump_path.as_ref().to_path_buf(),
            config: ScanConfig::default(),
            markup: MarkupConfig::default(),
            quiet: false,
        }
    }

    /// Set scan configuration
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Set markup conventions
    pub fn with_markup(mut self, markup: MarkupConfig) -> Self {
        self.markup = markup;
        self
    }

    /// Commit every N records
    pub fn with_commit_every(mut self, commit_every: usize) -> Self {
        self.config.commit_every = commit_every;
        self
    }

    /// Scan only `fraction` of `estimated_records`
    pub fn with_sample(mut self, fraction: f64, estimated_records: u64) -> Self {
        self.config.sample_fraction = fraction;
        self.config.estimated_records = estimated_records;
        self
    }

    /// Set quiet mode
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the coordinator
    pub fn build(self, store: &IndexStore) -> Result<ScanCoordinator<'_>> {
        ScanCoordinator::new(store, self.dump_path, self.config, self.markup)
            .map(|c| c.with_quiet(self.quiet))
    }
}
