use super::{dump_path, open_store, print_json};
use anyhow::Result;
use geodump::{config::Config, content::PageReader, import::CoordinateBackfill};
use tracing::info;

pub fn backfill_coordinates(config: Config, rebuild: bool, json: bool, quiet: bool) -> Result<()> {
    let path = dump_path(&config)?;
    let store = open_store(&config)?;

    if rebuild {
        info!("Dropping {} coordinate rows", store.coordinate_count()?);
        store.rebuild_coordinates()?;
    }

    let reader = PageReader::open(path, &store, &config.markup)?;
    let stats = CoordinateBackfill::new(&store, reader, &config.markup, config.titles.clone())?
        .with_quiet(quiet)
        .run()?;

    if json {
        return print_json(&stats);
    }

    println!("\nCoordinate Summary");
    println!("==================");
    println!("Records examined:    {}", stats.examined);
    println!("Rows inserted:       {}", stats.inserted);
    println!("Already present:     {}", stats.already_present);
    println!("Without position:    {}", stats.unparsed);
    println!("Malformed records:   {}", stats.malformed);
    Ok(())
}
