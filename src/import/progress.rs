//! Progress reporting for long-running passes

use crate::util::truncate_str;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Progress tracker for one pass over the dump or the index
pub struct PassProgress {
    /// Progress bar (None if running in quiet mode)
    progress_bar: Option<ProgressBar>,
    start_time: Instant,
    /// Records visited
    processed: AtomicU64,
    /// Records that failed and were skipped
    errored: AtomicU64,
    /// Unit shown in the rate, e.g. "records"
    unit: &'static str,
}

impl PassProgress {
    /// Create a tracker; a known total shows a bar, otherwise a spinner
    pub fn new(total_expected: Option<u64>, unit: &'static str, quiet: bool) -> Self {
        let progress_bar = if !quiet {
            let pb = match total_expected {
                Some(total) => ProgressBar::new(total),
                None => ProgressBar::new_spinner(),
            };
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        Self {
            progress_bar,
            start_time: Instant::now(),
            processed: AtomicU64::new(0),
            errored: AtomicU64::new(0),
            unit,
        }
    }

    /// Count one visited record, labelled in the bar message
    pub fn record_processed(&self, label: &str) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(processed);
            // Redrawing the message on every record is costly on big dumps
            if processed % 100 == 0 {
                pb.set_message(format!(
                    "{:.1} {}/s | {}",
                    self.rate(),
                    self.unit,
                    truncate_str(label, 30)
                ));
            }
        }
    }

    /// Count one skipped record
    pub fn record_error(&self) {
        self.errored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn errored(&self) -> u64 {
        self.errored.load(Ordering::Relaxed)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    fn rate(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 {
            self.processed() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Finish the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!(
                "Done! {} {}, {} errors, {:.1} {}/s",
                self.processed(),
                self.unit,
                self.errored(),
                self.rate(),
                self.unit
            ));
        }
    }
}
