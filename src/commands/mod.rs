//! Subcommand implementations

mod coords;
mod scan;
mod show;
mod status;
mod titles;

pub use coords::backfill_coordinates;
pub use scan::scan_dump;
pub use show::{lookup_title, show_record};
pub use status::show_status;
pub use titles::index_titles;

use anyhow::{Context, Result};
use geodump::{config::Config, index::IndexStore};
use std::path::Path;

/// Open the index store named by the configuration
fn open_store(config: &Config) -> Result<IndexStore> {
    IndexStore::open(&config.dump.index_dir).with_context(|| {
        format!(
            "Failed to open index store in {}",
            config.dump.index_dir.display()
        )
    })
}

/// Dump path from the configuration, which must point at an existing file
fn dump_path(config: &Config) -> Result<&Path> {
    let path = config.dump.path.as_path();
    if path.as_os_str().is_empty() {
        anyhow::bail!("No dump file configured. Pass --dump or set dump.path in the config file");
    }
    if !path.is_file() {
        anyhow::bail!("Dump file not found: {}", path.display());
    }
    Ok(path)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
