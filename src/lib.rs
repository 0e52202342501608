//! geodump: random-access index and coordinate extraction for MediaWiki dumps
//!
//! Turns a multi-gigabyte, append-only XML dump into:
//! - an offset index mapping record numbers to byte spans (O(1) seek)
//! - a coordinate table extracted from `{{Coord}}` templates
//! - a title table backfilled from the indexed spans
//!
//! Every pass is sequential, batched and resumable from what the index
//! store has already committed.

pub mod config;
pub mod content;
pub mod error;
pub mod geo;
pub mod import;
pub mod index;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
