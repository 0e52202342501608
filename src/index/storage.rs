//! SQLite-backed offset index store

use super::schema::{
    coordinate_insert_sql, coordinate_select_sql, coordinates_ddl, BASE_TABLES,
    COORDINATE_FIXED_COLUMNS, COORDINATE_SCHEMA_VERSION, PRAGMAS,
};
use crate::error::{Error, Result};
use crate::types::{
    ByteSpan, CoordinateFilter, CoordinateRecord, DumpMetadata, GeoPoint, InsertOutcome,
    MetadataKey, OffsetRecord, RecordNum, Watermark, COORDINATE_ATTRIBUTES,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Durable offset, coordinate, title and metadata store.
///
/// Single writer: whichever pass is running owns the store. Mutations join an
/// open transaction that becomes durable on [`IndexStore::commit`].
pub struct IndexStore {
    conn: Connection,
    /// Database file, `None` for in-memory stores
    path: Option<PathBuf>,
    coordinate_insert: String,
    coordinate_select: String,
}

impl IndexStore {
    /// Open (or create) `index.db` inside `index_dir` and ensure its schema
    pub fn open(index_dir: impl AsRef<Path>) -> Result<Self> {
        let index_dir = index_dir.as_ref();
        std::fs::create_dir_all(index_dir)?;
        let path = index_dir.join("index.db");
        info!("Opening index store at {}", path.display());

        let conn = Connection::open(&path)?;
        conn.execute_batch(PRAGMAS)?;
        Self::from_connection(conn, Some(path))
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        let store = Self {
            conn,
            path,
            coordinate_insert: coordinate_insert_sql(),
            coordinate_select: coordinate_select_sql(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Database file backing this store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create missing tables.
    ///
    /// Idempotent. The coordinates table is dropped and recreated when its
    /// recorded layout version differs from [`COORDINATE_SCHEMA_VERSION`].
    pub fn ensure_schema(&self) -> Result<()> {
        self.begin()?;
        self.conn.execute_batch(BASE_TABLES)?;

        let current = self.metadata_value(MetadataKey::CoordinateSchema)?;
        if current.as_deref() != Some(COORDINATE_SCHEMA_VERSION.to_string().as_str()) {
            if let Some(old) = current {
                info!(
                    "Coordinate schema changed ({} -> {}), regenerating coordinates table",
                    old, COORDINATE_SCHEMA_VERSION
                );
            }
            self.recreate_coordinates()?;
        }
        self.commit()
    }

    /// Drop and recreate the coordinates table, discarding every row
    pub fn rebuild_coordinates(&self) -> Result<()> {
        self.begin()?;
        self.recreate_coordinates()?;
        self.commit()
    }

    fn recreate_coordinates(&self) -> Result<()> {
        self.conn.execute_batch("DROP TABLE IF EXISTS coordinates;")?;
        self.conn.execute_batch(&coordinates_ddl())?;
        self.set_metadata(
            MetadataKey::CoordinateSchema,
            &COORDINATE_SCHEMA_VERSION.to_string(),
        )
    }

    // ------------------------------------------------------------------------
    // Batching
    // ------------------------------------------------------------------------

    fn begin(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Make every mutation since the last commit durable
    pub fn commit(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Discard every mutation since the last commit
    pub fn rollback(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Offsets
    // ------------------------------------------------------------------------

    /// Persist a record span; an existing row for `record_num` is left untouched
    pub fn record_offset(
        &self,
        record_num: RecordNum,
        span: ByteSpan,
        raw_coord_text: Option<&str>,
    ) -> Result<InsertOutcome> {
        self.begin()?;
        let changed = self
            .conn
            .prepare_cached(
                "INSERT OR IGNORE INTO offsets (record_num, title, start_idx, end_idx, raw_coord_text)
                 VALUES (?1, NULL, ?2, ?3, ?4)",
            )?
            .execute(params![
                record_num as i64,
                span.start as i64,
                span.end as i64,
                raw_coord_text
            ])?;
        Ok(outcome(changed))
    }

    /// Byte span of a record
    pub fn lookup_span(&self, record_num: RecordNum) -> Result<ByteSpan> {
        self.conn
            .prepare_cached("SELECT start_idx, end_idx FROM offsets WHERE record_num = ?1")?
            .query_row([record_num as i64], |row| {
                Ok(ByteSpan {
                    start: row.get::<_, i64>(0)? as u64,
                    end: row.get::<_, i64>(1)? as u64,
                })
            })
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("offset for record {}", record_num)))
    }

    /// Full offset row of a record
    pub fn offset(&self, record_num: RecordNum) -> Result<OffsetRecord> {
        self.conn
            .prepare_cached(
                "SELECT record_num, title, start_idx, end_idx, raw_coord_text
                 FROM offsets WHERE record_num = ?1",
            )?
            .query_row([record_num as i64], offset_from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("offset for record {}", record_num)))
    }

    /// Up to `limit` offset rows after `cursor`, ascending
    pub fn offsets_after(
        &self,
        cursor: Option<RecordNum>,
        limit: usize,
    ) -> Result<Vec<OffsetRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT record_num, title, start_idx, end_idx, raw_coord_text
             FROM offsets WHERE record_num > ?1 ORDER BY record_num LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![cursor_value(cursor), limit as i64], offset_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Up to `limit` record numbers after `cursor` that have no title yet, ascending
    pub fn untitled_after(
        &self,
        cursor: Option<RecordNum>,
        limit: usize,
    ) -> Result<Vec<RecordNum>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT record_num FROM offsets
             WHERE record_num > ?1 AND title IS NULL
             ORDER BY record_num LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![cursor_value(cursor), limit as i64], |row| {
            row.get::<_, i64>(0).map(|n| n as u64)
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Highest persisted record and where it ends
    pub fn watermark(&self) -> Result<Option<Watermark>> {
        let watermark = self
            .conn
            .prepare_cached(
                "SELECT record_num, end_idx FROM offsets ORDER BY record_num DESC LIMIT 1",
            )?
            .query_row([], |row| {
                Ok(Watermark {
                    record_num: row.get::<_, i64>(0)? as u64,
                    end: row.get::<_, i64>(1)? as u64,
                })
            })
            .optional()?;
        Ok(watermark)
    }

    pub fn offset_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM offsets")
    }

    pub fn titled_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM offsets WHERE title IS NOT NULL")
    }

    fn count(&self, sql: &str) -> Result<u64> {
        let n: i64 = self.conn.prepare_cached(sql)?.query_row([], |row| row.get(0))?;
        Ok(n as u64)
    }

    // ------------------------------------------------------------------------
    // Titles
    // ------------------------------------------------------------------------

    /// Write a record's title and register it for title lookup.
    ///
    /// Returns whether the title was new to the titles table; a title already
    /// claimed by another record keeps its first owner.
    pub fn set_title(&self, record_num: RecordNum, title: &str) -> Result<InsertOutcome> {
        self.begin()?;
        let updated = self
            .conn
            .prepare_cached("UPDATE offsets SET title = ?1 WHERE record_num = ?2")?
            .execute(params![title, record_num as i64])?;
        if updated == 0 {
            return Err(Error::NotFound(format!("offset for record {}", record_num)));
        }

        let changed = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO titles (title, record_num) VALUES (?1, ?2)")?
            .execute(params![title, record_num as i64])?;
        if changed == 0 {
            debug!("Title '{}' already indexed, record {} not registered", title, record_num);
        }
        Ok(outcome(changed))
    }

    /// Record number carrying `title`
    pub fn lookup_title(&self, title: &str) -> Result<RecordNum> {
        self.conn
            .prepare_cached("SELECT record_num FROM titles WHERE title = ?1")?
            .query_row([title], |row| row.get::<_, i64>(0))
            .optional()?
            .map(|n| n as u64)
            .ok_or_else(|| Error::NotFound(format!("title '{}'", title)))
    }

    // ------------------------------------------------------------------------
    // Coordinates
    // ------------------------------------------------------------------------

    /// Persist a coordinate row; an existing row for the record is left untouched
    pub fn record_coordinates(&self, record: &CoordinateRecord) -> Result<InsertOutcome> {
        self.begin()?;
        let mut values: Vec<Value> = Vec::with_capacity(
            COORDINATE_FIXED_COLUMNS + COORDINATE_ATTRIBUTES.len(),
        );
        values.push(Value::Integer(record.record_num as i64));
        values.push(Value::Text(record.raw_text.clone()));
        match record.position {
            Some(point) => {
                values.push(Value::Real(point.lat));
                values.push(Value::Real(point.lon));
            }
            None => {
                values.push(Value::Null);
                values.push(Value::Null);
            }
        }
        values.push(Value::Integer(record.on_title as i64));
        values.extend(
            COORDINATE_ATTRIBUTES
                .iter()
                .map(|name| Value::Text(record.attribute(name).to_string())),
        );

        let changed = self
            .conn
            .prepare_cached(&self.coordinate_insert)?
            .execute(params_from_iter(values))?;
        Ok(outcome(changed))
    }

    /// Coordinate row of a record
    pub fn coordinates(&self, record_num: RecordNum) -> Result<CoordinateRecord> {
        self.conn
            .prepare_cached(&self.coordinate_select)?
            .query_row([record_num as i64], coordinate_from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("coordinates for record {}", record_num)))
    }

    /// Record numbers whose coordinate row matches `filter`, ascending
    pub fn list_records_matching(&self, filter: CoordinateFilter) -> Result<Vec<RecordNum>> {
        let sql = match filter {
            CoordinateFilter::All => "SELECT record_num FROM coordinates ORDER BY record_num",
            CoordinateFilter::Parsed => {
                "SELECT record_num FROM coordinates WHERE lat IS NOT NULL ORDER BY record_num"
            }
            CoordinateFilter::CanonicalDisplay => {
                "SELECT record_num FROM coordinates WHERE on_title = 1 ORDER BY record_num"
            }
        };
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0).map(|n| n as u64))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    pub fn coordinate_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM coordinates")
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    fn metadata_value(&self, key: MetadataKey) -> Result<Option<String>> {
        let value = self
            .conn
            .prepare_cached("SELECT value FROM metadata WHERE key = ?1")?
            .query_row([key.as_str()], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    /// Raw value of a metadata key
    pub fn get_metadata(&self, key: MetadataKey) -> Result<String> {
        self.metadata_value(key)?
            .ok_or_else(|| Error::NotFound(format!("metadata key '{}'", key)))
    }

    /// Set a metadata key, replacing any previous value
    pub fn set_metadata(&self, key: MetadataKey, value: &str) -> Result<()> {
        self.begin()?;
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)")?
            .execute(params![key.as_str(), value])?;
        Ok(())
    }

    /// Typed view of every metadata key
    pub fn metadata(&self) -> Result<DumpMetadata> {
        Ok(DumpMetadata {
            size: self
                .metadata_value(MetadataKey::Size)?
                .and_then(|v| v.parse().ok()),
            completed_at: self
                .metadata_value(MetadataKey::CompletedAt)?
                .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            coordinate_schema: self
                .metadata_value(MetadataKey::CoordinateSchema)?
                .and_then(|v| v.parse().ok()),
        })
    }

    /// Record the total size of a fully scanned dump and commit
    pub fn mark_scan_complete(&self, size: u64) -> Result<()> {
        self.set_metadata(MetadataKey::Size, &size.to_string())?;
        self.set_metadata(MetadataKey::CompletedAt, &Utc::now().to_rfc3339())?;
        self.commit()
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            debug!("Index store dropped with an uncommitted batch; it will be discarded");
        }
    }
}

fn outcome(changed: usize) -> InsertOutcome {
    if changed > 0 {
        InsertOutcome::Inserted
    } else {
        InsertOutcome::AlreadyPresent
    }
}

fn cursor_value(cursor: Option<RecordNum>) -> i64 {
    cursor.map(|c| c as i64).unwrap_or(-1)
}

fn offset_from_row(row: &Row<'_>) -> rusqlite::Result<OffsetRecord> {
    Ok(OffsetRecord {
        record_num: row.get::<_, i64>(0)? as u64,
        title: row.get(1)?,
        span: ByteSpan {
            start: row.get::<_, i64>(2)? as u64,
            end: row.get::<_, i64>(3)? as u64,
        },
        raw_coord_text: row.get(4)?,
    })
}

fn coordinate_from_row(row: &Row<'_>) -> rusqlite::Result<CoordinateRecord> {
    let lat: Option<f64> = row.get(2)?;
    let lon: Option<f64> = row.get(3)?;
    let position = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
        _ => None,
    };

    let mut attributes = BTreeMap::new();
    for (i, name) in COORDINATE_ATTRIBUTES.iter().enumerate() {
        let value: String = row.get(COORDINATE_FIXED_COLUMNS + i)?;
        if !value.is_empty() {
            attributes.insert(name.to_string(), value);
        }
    }

    Ok(CoordinateRecord {
        record_num: row.get::<_, i64>(0)? as u64,
        raw_text: row.get(1)?,
        position,
        on_title: row.get::<_, i64>(4)? != 0,
        attributes,
    })
}
