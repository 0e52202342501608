use super::{dump_path, open_store, print_json};
use anyhow::{Context, Result};
use geodump::{config::Config, import::ScanCoordinatorBuilder};
use tracing::info;

pub fn scan_dump(config: Config, json: bool, quiet: bool) -> Result<()> {
    let path = dump_path(&config)?;
    let store = open_store(&config)?;

    if let Some(limit) = config.scan.sample_limit() {
        info!(
            "Sampled scan: {:.2}% of ~{} records (stops after {})",
            config.scan.sample_fraction * 100.0,
            config.scan.estimated_records,
            limit
        );
    }

    let stats = ScanCoordinatorBuilder::new(path)
        .with_config(config.scan.clone())
        .with_markup(config.markup.clone())
        .with_quiet(quiet)
        .build(&store)?
        .run()
        .with_context(|| format!("Scan of {} failed", path.display()))?;

    if json {
        return print_json(&stats);
    }

    println!("\nScan Summary");
    println!("============");
    if let Some(after) = stats.resumed_after {
        println!("Resumed after:       record {}", after);
    }
    println!("Records scanned:     {}", stats.records_scanned);
    println!("Records inserted:    {}", stats.records_inserted);
    println!("With coordinates:    {}", stats.coordinates_found);
    println!("Errors:              {}", stats.records_errored);
    println!("Bytes scanned:       {} MB", stats.bytes_scanned / 1_000_000);
    println!("Elapsed time:        {:.1}s", stats.elapsed_seconds);
    println!("Processing rate:     {:.1} records/s", stats.records_per_second);
    match stats.total_records {
        Some(total) => println!("Dump complete:       {} records", total),
        None => println!("Dump complete:       no (run scan again to continue)"),
    }
    Ok(())
}
