//! Integration tests for geodump
//!
//! These tests run the scan, title and coordinate passes end to end over
//! synthetic dumps written to temporary files.

use geodump::{
    config::{MarkupConfig, ScanConfig, TitleConfig},
    content::PageReader,
    import::{CoordinateBackfill, DumpScanner, ScanCoordinatorBuilder, TitleIndexer},
    index::IndexStore,
    types::{CoordinateFilter, GeoPoint, InsertOutcome},
    Error,
};
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

const PREAMBLE: &str = "<mediawiki xmlns=\"http://www.mediawiki.org/xml/export-0.10/\">\n  <siteinfo>\n    <sitename>Wikipedia</sitename>\n  </siteinfo>\n";
const TRAILER: &str = "</mediawiki>\n";

fn page(title: &str, text: &str) -> String {
    format!(
        "  <page>\n    <title>{}</title>\n    <ns>0</ns>\n    <revision>\n      <text bytes=\"{}\" xml:space=\"preserve\">{}</text>\n    </revision>\n  </page>\n",
        title,
        text.len(),
        text
    )
}

/// Write a dump with `count` generated pages; every seventh carries coordinates
fn write_dump(count: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PREAMBLE.as_bytes()).unwrap();
    for i in 0..count {
        let text = if i % 7 == 0 {
            format!(
                "Place {} is at {{{{coord|{}|N|{}|W|display=inline,title}}}} near {{{{coord|1|2}}}}.",
                i,
                i % 90,
                i % 180
            )
        } else {
            format!("Article number {} has no location.", i)
        };
        file.write_all(page(&format!("Article {}", i), &text).as_bytes())
            .unwrap();
    }
    file.write_all(TRAILER.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn scan(store: &IndexStore, dump: &Path) {
    ScanCoordinatorBuilder::new(dump)
        .with_commit_every(100)
        .with_quiet(true)
        .build(store)
        .unwrap()
        .run()
        .unwrap();
}

fn title_indexer<'a>(store: &'a IndexStore, dump: &Path, max: Option<u64>) -> TitleIndexer<'a> {
    let reader = PageReader::open(dump, store, &MarkupConfig::default()).unwrap();
    let config = TitleConfig {
        batch_size: 100,
        page_size: 250,
    };
    TitleIndexer::new(store, reader, config)
        .with_max_records(max)
        .with_quiet(true)
}

#[test]
fn test_full_scan_spans_are_contiguous() {
    let dump = write_dump(50);
    let dir = TempDir::new().unwrap();
    let store = IndexStore::open(dir.path()).unwrap();
    scan(&store, dump.path());

    let offsets = store.offsets_after(None, 1000).unwrap();
    assert_eq!(offsets.len(), 50);
    assert_eq!(store.metadata().unwrap().size, Some(50));

    assert_eq!(offsets[0].span.start, PREAMBLE.len() as u64);
    for pair in offsets.windows(2) {
        assert_eq!(pair[0].span.end, pair[1].span.start);
        assert!(pair[0].span.start < pair[1].span.start);
        assert_eq!(pair[0].record_num + 1, pair[1].record_num);
    }

    let file_len = std::fs::metadata(dump.path()).unwrap().len();
    let total: u64 = offsets.iter().map(|o| o.span.len()).sum();
    assert_eq!(total, file_len - PREAMBLE.len() as u64);
}

#[test]
fn test_rescan_is_idempotent() {
    let dump = write_dump(30);
    let dir = TempDir::new().unwrap();
    let store = IndexStore::open(dir.path()).unwrap();
    scan(&store, dump.path());
    let before = store.offsets_after(None, 1000).unwrap();

    // Replaying every boundary inserts nothing new
    let scanner = DumpScanner::open(dump.path(), "<page>", 4096).unwrap();
    for record in scanner {
        let record = record.unwrap();
        let outcome = store.record_offset(record.record_num, record.span, None).unwrap();
        assert_eq!(outcome, InsertOutcome::AlreadyPresent);
    }
    store.commit().unwrap();

    // A second coordinator run is skipped outright
    scan(&store, dump.path());
    assert_eq!(store.offsets_after(None, 1000).unwrap(), before);
}

#[test]
fn test_interrupted_scan_resumes_from_watermark() {
    let dump = write_dump(40);

    let reference = IndexStore::open_in_memory().unwrap();
    scan(&reference, dump.path());

    let dir = TempDir::new().unwrap();
    {
        let store = IndexStore::open(dir.path()).unwrap();
        // A sampled run stands in for a scan cut short
        let config = ScanConfig {
            sample_fraction: 0.5,
            estimated_records: 30,
            ..Default::default()
        };
        ScanCoordinatorBuilder::new(dump.path())
            .with_config(config)
            .with_quiet(true)
            .build(&store)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(store.offset_count().unwrap(), 16);
        assert_eq!(store.metadata().unwrap().size, None);
    }

    let store = IndexStore::open(dir.path()).unwrap();
    scan(&store, dump.path());
    assert_eq!(store.metadata().unwrap().size, Some(40));
    assert_eq!(
        store.offsets_after(None, 1000).unwrap(),
        reference.offsets_after(None, 1000).unwrap()
    );
}

#[test]
fn test_title_indexer_resumes_after_interruption() {
    let dump = write_dump(1000);
    let dir = TempDir::new().unwrap();
    let store = IndexStore::open(dir.path()).unwrap();
    scan(&store, dump.path());

    let first = title_indexer(&store, dump.path(), Some(500)).run().unwrap();
    assert_eq!(first.indexed, 500);
    assert_eq!(store.titled_count().unwrap(), 500);
    drop(store);

    let store = IndexStore::open(dir.path()).unwrap();
    assert_eq!(store.untitled_after(None, 1).unwrap(), vec![500]);
    let second = title_indexer(&store, dump.path(), None).run().unwrap();
    assert_eq!(second.first_record, Some(500));
    assert_eq!(second.indexed, 500);
    assert_eq!(second.duplicate_titles, 0);
    assert_eq!(store.titled_count().unwrap(), 1000);

    for record_num in [0u64, 499, 500, 999] {
        assert_eq!(
            store.lookup_title(&format!("Article {}", record_num)).unwrap(),
            record_num
        );
    }
}

#[test]
fn test_reader_titles_match_indexed_titles() {
    let dump = write_dump(60);
    let store = IndexStore::open_in_memory().unwrap();
    scan(&store, dump.path());
    title_indexer(&store, dump.path(), None).run().unwrap();

    let mut reader = PageReader::open(dump.path(), &store, &MarkupConfig::default()).unwrap();
    for offset in store.offsets_after(None, 1000).unwrap() {
        let page = reader.page(offset.record_num).unwrap();
        assert_eq!(offset.title.as_deref(), Some(page.title.as_str()));
    }

    // The final record is cut before the dump trailer
    let last = reader.raw(59).unwrap();
    assert!(last.trim_end().ends_with("</page>"));
    assert!(!last.contains("</mediawiki>"));
}

#[test]
fn test_coordinates_prefer_title_display() {
    let dump = write_dump(22);
    let store = IndexStore::open_in_memory().unwrap();
    scan(&store, dump.path());

    assert_eq!(
        store
            .list_records_matching(CoordinateFilter::CanonicalDisplay)
            .unwrap(),
        vec![0, 7, 14, 21]
    );
    let coords = store.coordinates(14).unwrap();
    assert_eq!(coords.position, Some(GeoPoint::new(14.0, -14.0)));
    assert_eq!(coords.attribute("display"), "inline,title");
    assert_eq!(
        store.offset(14).unwrap().raw_coord_text.as_deref(),
        Some("coord|14|N|14|W|display=inline,title||coord|1|2")
    );
    assert!(matches!(store.coordinates(1), Err(Error::NotFound(_))));
}

#[test]
fn test_backfill_after_rebuild_restores_coordinates() {
    let dump = write_dump(15);
    let store = IndexStore::open_in_memory().unwrap();
    scan(&store, dump.path());
    let before = store.list_records_matching(CoordinateFilter::All).unwrap();
    assert_eq!(before, vec![0, 7, 14]);

    store.rebuild_coordinates().unwrap();
    assert_eq!(store.coordinate_count().unwrap(), 0);

    let markup = MarkupConfig::default();
    let reader = PageReader::open(dump.path(), &store, &markup).unwrap();
    let stats = CoordinateBackfill::new(&store, reader, &markup, TitleConfig::default())
        .unwrap()
        .with_quiet(true)
        .run()
        .unwrap();

    assert_eq!(stats.examined, 15);
    assert_eq!(stats.inserted, 3);
    assert_eq!(store.list_records_matching(CoordinateFilter::All).unwrap(), before);
}

#[test]
fn test_dump_without_pages() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}{}", PREAMBLE, TRAILER).unwrap();
    let store = IndexStore::open_in_memory().unwrap();
    scan(&store, file.path());

    assert_eq!(store.offset_count().unwrap(), 0);
    assert_eq!(store.metadata().unwrap().size, Some(0));
}
