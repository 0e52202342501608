use super::open_store;
use anyhow::Result;
use geodump::{config::Config, index::COORDINATE_SCHEMA_VERSION, types::CoordinateFilter};
use serde_json::json;

pub fn show_status(config: Config, json: bool) -> Result<()> {
    let store = open_store(&config)?;
    let metadata = store.metadata()?;
    let watermark = store.watermark()?;
    let offsets = store.offset_count()?;
    let titled = store.titled_count()?;
    let coordinates = store.coordinate_count()?;
    let parsed = store.list_records_matching(CoordinateFilter::Parsed)?.len();
    let canonical = store
        .list_records_matching(CoordinateFilter::CanonicalDisplay)?
        .len();

    if json {
        let value = json!({
            "index": store.path(),
            "dump": config.dump.path,
            "metadata": metadata,
            "watermark": watermark,
            "offsets": offsets,
            "titled": titled,
            "coordinates": coordinates,
            "parsed_coordinates": parsed,
            "title_coordinates": canonical,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\ngeodump Status");
    println!("==============");
    if let Some(path) = store.path() {
        println!("Index:               {}", path.display());
    }
    println!("Dump:                {}", config.dump.path.display());
    match (metadata.size, metadata.completed_at) {
        (Some(size), Some(at)) => println!("Scan:                complete, {} records ({})", size, at),
        (Some(size), None) => println!("Scan:                complete, {} records", size),
        _ => match watermark {
            Some(w) => println!("Scan:                partial, up to record {} (byte {})", w.record_num, w.end),
            None => println!("Scan:                not started"),
        },
    }
    println!("Offsets:             {}", offsets);
    println!("Titled:              {}", titled);
    println!("Coordinates:         {} ({} parsed, {} title)", coordinates, parsed, canonical);
    println!(
        "Coordinate schema:   {} (current {})",
        metadata
            .coordinate_schema
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unset".to_string()),
        COORDINATE_SCHEMA_VERSION
    );
    Ok(())
}
