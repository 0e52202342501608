//! Passes over the dump and the offset index
//!
//! ```text
//! ┌──────────────┐  spans + coordinates   ┌─────────────┐
//! │ DumpScanner  │ ─────────────────────▶ │ IndexStore  │
//! │ (sequential) │   ScanCoordinator      │  (SQLite)   │
//! └──────────────┘                        └─────────────┘
//!                                           ▲       │
//!                          titles /         │       │ spans
//!                          coordinates      │       ▼
//!                                         ┌─────────────┐
//!                                         │ PageReader  │
//!                                         │ (random)    │
//!                                         └─────────────┘
//! ```
//!
//! The scan runs first and is the only pass that reads the dump
//! sequentially. The title indexer and coordinate backfill then walk the
//! persisted offsets and fetch records by span. Every pass commits in
//! batches and picks up from what the store already holds.

pub mod backfill;
pub mod coordinator;
pub mod progress;
pub mod scanner;
pub mod stats;
pub mod titles;

pub use backfill::CoordinateBackfill;
pub use coordinator::{ScanCoordinator, ScanCoordinatorBuilder};
pub use progress::PassProgress;
pub use scanner::{DumpScanner, ScannedRecord};
pub use stats::{BackfillStats, ScanStats, TitleStats};
pub use titles::TitleIndexer;
