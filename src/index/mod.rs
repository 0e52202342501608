//! Offset index store
//!
//! A single SQLite file holding:
//! - `offsets`: record number → byte span, title, raw coordinate text
//! - `coordinates`: structured coordinate row per record
//! - `titles`: title → record number
//! - `metadata`: typed key/value record (total size, completion time, schema)
//!
//! Writes are batched: every mutation joins an open transaction that only
//! becomes durable on [`IndexStore::commit`]. Keyed inserts never overwrite,
//! so re-running a pass after a crash re-derives the same rows.

mod schema;
mod storage;

pub use schema::COORDINATE_SCHEMA_VERSION;
pub use storage::IndexStore;
