//! Table layout of the index database

use crate::types::COORDINATE_ATTRIBUTES;

/// Version of the `coordinates` layout; a mismatch drops and recreates the table
pub const COORDINATE_SCHEMA_VERSION: u32 = 2;

pub(crate) const PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
";

pub(crate) const BASE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS offsets (
        record_num INTEGER PRIMARY KEY,
        title TEXT,
        start_idx INTEGER NOT NULL,
        end_idx INTEGER NOT NULL,
        raw_coord_text TEXT
    );
    CREATE TABLE IF NOT EXISTS titles (
        title TEXT PRIMARY KEY,
        record_num INTEGER NOT NULL REFERENCES offsets(record_num)
    );
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_offsets_untitled ON offsets(record_num) WHERE title IS NULL;
";

/// Quote an identifier for use in generated SQL
fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}

/// `CREATE TABLE` for the coordinates table
pub(crate) fn coordinates_ddl() -> String {
    let attributes: Vec<String> = COORDINATE_ATTRIBUTES
        .iter()
        .map(|name| format!("        {} TEXT NOT NULL DEFAULT ''", quoted(name)))
        .collect();
    format!(
        "CREATE TABLE coordinates (
        record_num INTEGER PRIMARY KEY REFERENCES offsets(record_num),
        raw_text TEXT NOT NULL,
        lat REAL,
        lon REAL,
        on_title INTEGER NOT NULL DEFAULT 0,
{}
    );
    CREATE INDEX idx_coordinates_on_title ON coordinates(on_title);",
        attributes.join(",\n")
    )
}

/// Column list shared by coordinate inserts and selects
pub(crate) fn coordinate_columns() -> String {
    let mut columns = vec![
        "record_num".to_string(),
        "raw_text".to_string(),
        "lat".to_string(),
        "lon".to_string(),
        "on_title".to_string(),
    ];
    columns.extend(COORDINATE_ATTRIBUTES.iter().map(|name| quoted(name)));
    columns.join(", ")
}

/// Number of fixed columns before the attribute columns
pub(crate) const COORDINATE_FIXED_COLUMNS: usize = 5;

pub(crate) fn coordinate_insert_sql() -> String {
    let placeholders: Vec<String> = (1..=COORDINATE_FIXED_COLUMNS + COORDINATE_ATTRIBUTES.len())
        .map(|i| format!("?{}", i))
        .collect();
    format!(
        "INSERT OR IGNORE INTO coordinates ({}) VALUES ({})",
        coordinate_columns(),
        placeholders.join(", ")
    )
}

pub(crate) fn coordinate_select_sql() -> String {
    format!(
        "SELECT {} FROM coordinates WHERE record_num = ?1",
        coordinate_columns()
    )
}
