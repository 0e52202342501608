use super::{dump_path, open_store};
use anyhow::{Context, Result};
use geodump::{config::Config, content::PageReader, util::truncate_str, Error, RecordNum};
use serde_json::json;

pub fn show_record(config: Config, record_num: RecordNum, json: bool, raw: bool) -> Result<()> {
    let path = dump_path(&config)?;
    let store = open_store(&config)?;
    let offset = store
        .offset(record_num)
        .with_context(|| format!("Record {} is not in the index", record_num))?;

    let mut reader = PageReader::open(path, &store, &config.markup)?;
    if raw {
        print!("{}", reader.raw(record_num)?);
        return Ok(());
    }
    let page = reader.page(record_num)?;

    let coordinates = match store.coordinates(record_num) {
        Ok(coordinates) => Some(coordinates),
        Err(Error::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    if json {
        let value = json!({
            "record_num": offset.record_num,
            "title": page.title,
            "span": { "start": offset.span.start, "end": offset.span.end },
            "raw_coord_text": offset.raw_coord_text,
            "coordinates": coordinates,
            "body": page.body,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\nRecord {}", record_num);
    println!("==========");
    println!("Title:       {}", page.title);
    println!("Span:        {} ({} bytes)", offset.span, offset.span.len());
    if let Some(coordinates) = coordinates {
        match coordinates.position {
            Some(position) => println!("Position:    {}", position),
            None => println!("Position:    unparsed"),
        }
        println!("Template:    {}", coordinates.raw_text);
        for (name, value) in &coordinates.attributes {
            println!("  {:<10} {}", name, value);
        }
    }
    println!("\n{}", truncate_str(&page.body, 2000));
    Ok(())
}

pub fn lookup_title(config: Config, title: &str, json: bool) -> Result<()> {
    let store = open_store(&config)?;
    let record_num = match store.lookup_title(title) {
        Ok(record_num) => record_num,
        Err(Error::NotFound(_)) => {
            if store.titled_count()? == 0 {
                anyhow::bail!("No titles indexed yet. Run `geodump titles` first");
            }
            anyhow::bail!("No record titled '{}'", title);
        }
        Err(e) => return Err(e.into()),
    };
    let span = store.lookup_span(record_num)?;

    if json {
        let value = json!({
            "title": title,
            "record_num": record_num,
            "span": { "start": span.start, "end": span.end },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}\t{}\t{}", record_num, span, title);
    }
    Ok(())
}
