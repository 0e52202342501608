use super::{dump_path, open_store, print_json};
use anyhow::Result;
use geodump::{config::Config, content::PageReader, import::TitleIndexer};

pub fn index_titles(config: Config, max: Option<u64>, json: bool, quiet: bool) -> Result<()> {
    let path = dump_path(&config)?;
    let store = open_store(&config)?;
    let reader = PageReader::open(path, &store, &config.markup)?;

    let stats = TitleIndexer::new(&store, reader, config.titles.clone())
        .with_max_records(max)
        .with_quiet(quiet)
        .run()?;

    if json {
        return print_json(&stats);
    }

    println!("\nTitle Summary");
    println!("=============");
    if let Some(first) = stats.first_record {
        println!("Started at:          record {}", first);
    }
    println!("Titles indexed:      {}", stats.indexed);
    println!("Duplicate titles:    {}", stats.duplicate_titles);
    println!("Malformed records:   {}", stats.malformed);
    println!("Titled in index:     {}/{}", store.titled_count()?, store.offset_count()?);
    Ok(())
}
