//! Random access to individual dump records
//!
//! A record is fetched by record number through the offset index, then
//! parsed just far enough to recover its title and body text.

mod page;
mod reader;

pub use page::Page;
pub use reader::PageReader;
