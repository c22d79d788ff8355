//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, Params, Statement, params, types::ValueRef};
use serde::{Deserialize, Serialize};
use crate::{Error, Result};
use crate::staging::StagedBatch;
use super::schema::{self, Table};

/// How migrate treats color rows that already exist in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Every migrate appends every staged color row
    #[default]
    Append,
    /// Skip a row when an identical one (NULL-aware) is already stored
    SkipDuplicates,
}

const INSERT_ARTIFACT: &str = r#"
INSERT OR IGNORE INTO artifact_metadata (
    id, title, culture, period, century, medium,
    dimensions, description, department,
    classification, accessionyear, accessionmethod
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

const INSERT_MEDIA: &str = r#"
INSERT OR IGNORE INTO artifact_media (
    objectid, imagecount, mediacount, colorcount, rank, datebegin, dateend
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

const INSERT_COLOR: &str = r#"
INSERT INTO artifact_colors (objectid, color, spectrum, hue, percent, css3)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

const INSERT_COLOR_UNLESS_PRESENT: &str = r#"
INSERT INTO artifact_colors (objectid, color, spectrum, hue, percent, css3)
SELECT ?1, ?2, ?3, ?4, ?5, ?6
WHERE NOT EXISTS (
    SELECT 1 FROM artifact_colors
    WHERE objectid IS ?1 AND color IS ?2 AND spectrum IS ?3
      AND hue IS ?4 AND percent IS ?5 AND css3 IS ?6
)
"#;

/// SQLite-backed storage for collected artifacts
pub struct ArtifactStore {
    conn: Connection,
}

impl ArtifactStore {
    /// Open a database file (creates if doesn't exist) and ensure the schema
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::StoreUnavailable(format!("{}: {}", path.display(), e)))?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create missing tables, then check existing ones expose our columns.
    ///
    /// The media and color tables reference `artifact_metadata` for
    /// documentation only; enforcement is switched off per connection.
    fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = OFF")
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        for stmt in schema::all_schema_statements() {
            self.conn
                .execute(stmt, [])
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        }
        self.verify_schema().map_err(|e| match e {
            Error::Storage(inner) => Error::StoreUnavailable(inner.to_string()),
            other => other,
        })
    }

    fn verify_schema(&self) -> Result<()> {
        for table in Table::all() {
            let mut stmt = self
                .conn
                .prepare(&format!("PRAGMA table_info({})", table.name()))?;
            let columns = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for expected in table.columns() {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(expected)) {
                    return Err(Error::StoreUnavailable(format!(
                        "table {} exists without column {}",
                        table, expected
                    )));
                }
            }
        }
        Ok(())
    }

    // ========== Migrate ==========

    /// Write a staged batch in a single transaction.
    ///
    /// Metadata and media rows with an existing id are ignored. Color rows
    /// follow `colors`. Nothing is committed unless all three tables are
    /// written.
    pub fn migrate(&mut self, batch: &StagedBatch, colors: ColorPolicy) -> Result<MigrateReport> {
        let tx = self.conn.transaction()?;
        let mut report = MigrateReport::default();

        {
            let mut stmt_artifact = tx.prepare(INSERT_ARTIFACT)?;
            for a in &batch.artifacts {
                let changed = stmt_artifact.execute(params![
                    a.id,
                    a.title,
                    a.culture,
                    a.period,
                    a.century,
                    a.medium,
                    a.dimensions,
                    a.description,
                    a.department,
                    a.classification,
                    a.accessionyear,
                    a.accessionmethod,
                ])?;
                report.artifacts.record(changed);
            }

            let mut stmt_media = tx.prepare(INSERT_MEDIA)?;
            for m in &batch.media {
                let changed = stmt_media.execute(params![
                    m.objectid,
                    m.imagecount,
                    m.mediacount,
                    m.colorcount,
                    m.rank,
                    m.datebegin,
                    m.dateend,
                ])?;
                report.media.record(changed);
            }

            let color_sql = match colors {
                ColorPolicy::Append => INSERT_COLOR,
                ColorPolicy::SkipDuplicates => INSERT_COLOR_UNLESS_PRESENT,
            };
            let mut stmt_color = tx.prepare(color_sql)?;
            for c in &batch.colors {
                let changed = stmt_color.execute(params![
                    c.objectid,
                    c.color,
                    c.spectrum,
                    c.hue,
                    c.percent,
                    c.css3,
                ])?;
                report.colors.record(changed);
            }
        }

        tx.commit()?;
        tracing::info!("Migrated batch: {}", report.summary());
        Ok(report)
    }

    // ========== Queries ==========

    /// Run a read-only statement and return its result as a table.
    ///
    /// Statements that would modify the database are refused before they
    /// execute.
    pub fn query_table(&self, sql: &str) -> Result<QueryTable> {
        let mut stmt = self.conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(Error::NotReadOnly(sql.trim().to_string()));
        }
        collect_table(&mut stmt, [])
    }

    /// First `limit` rows of one of the persisted tables
    pub fn table_rows(&self, table: Table, limit: usize) -> Result<QueryTable> {
        let sql = format!("SELECT * FROM {} LIMIT ?1", table.name());
        let mut stmt = self.conn.prepare(&sql)?;
        collect_table(&mut stmt, [limit as i64])
    }

    /// Count rows in one table
    pub fn count(&self, table: Table) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            artifacts: self.count(Table::Metadata)?,
            media: self.count(Table::Media)?,
            colors: self.count(Table::Colors)?,
        })
    }

    // ========== Clear ==========

    /// Delete every row from all three tables, then compact the file.
    ///
    /// A failed compaction is logged and does not undo or fail the delete.
    pub fn clear_all(&mut self) -> Result<ClearReport> {
        let report = self.delete_all()?;
        if let Err(e) = self.compact() {
            tracing::warn!("Rows deleted but VACUUM failed: {}", e);
        }
        tracing::info!(
            "Cleared store: {} artifacts, {} media rows, {} colors",
            report.artifacts,
            report.media,
            report.colors
        );
        Ok(report)
    }

    fn delete_all(&mut self) -> Result<ClearReport> {
        let tx = self.conn.transaction()?;
        let colors = tx.execute("DELETE FROM artifact_colors", [])?;
        let media = tx.execute("DELETE FROM artifact_media", [])?;
        let artifacts = tx.execute("DELETE FROM artifact_metadata", [])?;
        tx.commit()?;
        Ok(ClearReport { artifacts, media, colors })
    }

    /// VACUUM cannot run inside a transaction
    fn compact(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM")?;
        Ok(())
    }
}

fn collect_table<P: Params>(stmt: &mut Statement<'_>, params: P) -> Result<QueryTable> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(cell_value(row.get_ref(i)?));
        }
        out.push(cells);
    }

    Ok(QueryTable { columns, rows: out })
}

fn cell_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
    }
}

/// Tabular result of a query: named columns and ordered rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&serde_json::Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Inserted vs. ignored rows for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertCounts {
    pub inserted: usize,
    pub skipped: usize,
}

impl InsertCounts {
    fn record(&mut self, changed: usize) {
        if changed == 0 {
            self.skipped += 1;
        } else {
            self.inserted += changed;
        }
    }
}

/// Outcome of one migrate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrateReport {
    pub artifacts: InsertCounts,
    pub media: InsertCounts,
    pub colors: InsertCounts,
}

impl MigrateReport {
    pub fn summary(&self) -> String {
        format!(
            "{} artifacts ({} skipped), {} media ({} skipped), {} colors ({} skipped)",
            self.artifacts.inserted,
            self.artifacts.skipped,
            self.media.inserted,
            self.media.skipped,
            self.colors.inserted,
            self.colors.skipped
        )
    }
}

/// Rows removed by a clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub artifacts: usize,
    pub media: usize,
    pub colors: usize,
}

/// Database statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub artifacts: usize,
    pub media: usize,
    pub colors: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Artifacts: {}", self.artifacts)?;
        writeln!(f, "  Media: {}", self.media)?;
        writeln!(f, "  Colors: {}", self.colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ColorRow, MediaRow, RawColor, RawRecord};

    fn sample_record(id: i64, colors: usize) -> RawRecord {
        RawRecord {
            id: Some(id),
            title: Some(format!("Coin {}", id)),
            culture: Some("Byzantine".to_string()),
            classification: Some("Coins".to_string()),
            accessionyear: Some(1950 + id),
            imagecount: Some(2),
            mediacount: Some(1),
            colorcount: Some(colors as i64),
            rank: Some(100.0 + id as f64),
            colors: Some(
                (0..colors)
                    .map(|i| RawColor {
                        color: Some(format!("#00000{}", i)),
                        hue: Some("Grey".to_string()),
                        percent: Some(0.1 * (i + 1) as f64),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn batch(ids: &[i64], colors: usize) -> StagedBatch {
        let records: Vec<_> = ids.iter().map(|&id| sample_record(id, colors)).collect();
        StagedBatch::from_records(&records)
    }

    #[test]
    fn test_migrate_inserts_all_tables() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        let report = store.migrate(&batch(&[1, 2], 3), ColorPolicy::Append).unwrap();

        assert_eq!(report.artifacts.inserted, 2);
        assert_eq!(report.media.inserted, 2);
        assert_eq!(report.colors.inserted, 6);
        assert_eq!(
            store.stats().unwrap(),
            DbStats { artifacts: 2, media: 2, colors: 6 }
        );
    }

    #[test]
    fn test_migrate_twice_ignores_known_ids_but_appends_colors() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        let staged = batch(&[1, 2, 3], 2);

        store.migrate(&staged, ColorPolicy::Append).unwrap();
        let second = store.migrate(&staged, ColorPolicy::Append).unwrap();

        assert_eq!(second.artifacts, InsertCounts { inserted: 0, skipped: 3 });
        assert_eq!(second.media, InsertCounts { inserted: 0, skipped: 3 });
        assert_eq!(second.colors.inserted, 6);
        assert_eq!(
            store.stats().unwrap(),
            DbStats { artifacts: 3, media: 3, colors: 12 }
        );
    }

    #[test]
    fn test_skip_duplicates_policy_keeps_colors_stable() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        let staged = batch(&[1, 2], 3);

        store.migrate(&staged, ColorPolicy::SkipDuplicates).unwrap();
        let second = store.migrate(&staged, ColorPolicy::SkipDuplicates).unwrap();

        assert_eq!(second.colors, InsertCounts { inserted: 0, skipped: 6 });
        assert_eq!(store.count(Table::Colors).unwrap(), 6);
    }

    #[test]
    fn test_first_write_wins_for_metadata() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.migrate(&batch(&[5], 0), ColorPolicy::Append).unwrap();

        let mut changed = sample_record(5, 0);
        changed.title = Some("Renamed".to_string());
        store
            .migrate(&StagedBatch::from_records(&[changed]), ColorPolicy::Append)
            .unwrap();

        let table = store.query_table("SELECT title FROM artifact_metadata WHERE id = 5").unwrap();
        assert_eq!(table.rows, vec![vec![serde_json::json!("Coin 5")]]);
    }

    #[test]
    fn test_failed_migrate_commits_nothing() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.conn.execute("DROP TABLE artifact_colors", []).unwrap();

        assert!(store.migrate(&batch(&[1, 2], 1), ColorPolicy::Append).is_err());
        assert_eq!(store.count(Table::Metadata).unwrap(), 0);
        assert_eq!(store.count(Table::Media).unwrap(), 0);
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.migrate(&batch(&[1, 2, 3], 2), ColorPolicy::Append).unwrap();

        let report = store.clear_all().unwrap();
        assert_eq!(report, ClearReport { artifacts: 3, media: 3, colors: 6 });
        assert_eq!(store.stats().unwrap(), DbStats::default());
    }

    #[test]
    fn test_artifact_references_are_not_enforced() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        let enforced: i64 = store
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enforced, 0);

        let mut staged = batch(&[1], 1);
        staged.colors.push(ColorRow {
            objectid: Some(999),
            color: Some("#ffffff".to_string()),
            spectrum: None,
            hue: Some("White".to_string()),
            percent: Some(1.0),
            css3: None,
        });
        staged.media.push(MediaRow {
            objectid: Some(998),
            imagecount: Some(0),
            mediacount: None,
            colorcount: None,
            rank: None,
            datebegin: None,
            dateend: None,
        });

        let report = store.migrate(&staged, ColorPolicy::Append).unwrap();
        assert_eq!(report.colors.inserted, 2);
        assert_eq!(report.media.inserted, 2);

        let cleared = store.clear_all().unwrap();
        assert_eq!(cleared, ClearReport { artifacts: 1, media: 2, colors: 2 });
        assert_eq!(store.stats().unwrap(), DbStats::default());
    }

    #[test]
    fn test_clear_on_disk_file_deletes_and_compacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.db");
        let mut store = ArtifactStore::open(&path).unwrap();
        store.migrate(&batch(&(1..=200).collect::<Vec<_>>(), 3), ColorPolicy::Append).unwrap();
        let populated = std::fs::metadata(&path).unwrap().len();

        let report = store.clear_all().unwrap();
        assert_eq!(report.artifacts, 200);
        assert_eq!(report.colors, 600);
        assert!(std::fs::metadata(&path).unwrap().len() < populated);
    }

    #[test]
    fn test_deleted_rows_stay_deleted_when_compaction_fails() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.migrate(&batch(&[1, 2], 2), ColorPolicy::Append).unwrap();

        store.delete_all().unwrap();
        store.conn.execute_batch("BEGIN").unwrap();
        assert!(store.compact().is_err());
        store.conn.execute_batch("COMMIT").unwrap();

        assert_eq!(store.stats().unwrap(), DbStats::default());
    }

    #[test]
    fn test_query_table_preserves_columns_and_types() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.migrate(&batch(&[1], 0), ColorPolicy::Append).unwrap();

        let table = store
            .query_table("SELECT objectid, rank, datebegin FROM artifact_media")
            .unwrap();
        assert_eq!(table.columns, vec!["objectid", "rank", "datebegin"]);
        assert_eq!(
            table.rows,
            vec![vec![
                serde_json::json!(1),
                serde_json::json!(101.0),
                serde_json::Value::Null
            ]]
        );
        assert_eq!(table.to_records()[0]["objectid"], serde_json::json!(1));
    }

    #[test]
    fn test_query_table_refuses_writes() {
        let store = ArtifactStore::open_in_memory().unwrap();
        let err = store.query_table("DELETE FROM artifact_metadata").unwrap_err();
        assert!(matches!(err, Error::NotReadOnly(_)));
    }

    #[test]
    fn test_query_table_reports_sql_errors() {
        let store = ArtifactStore::open_in_memory().unwrap();
        let err = store.query_table("SELECT nope FROM artifact_media").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_table_rows_respects_limit() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.migrate(&batch(&[1, 2, 3, 4], 1), ColorPolicy::Append).unwrap();

        let table = store.table_rows(Table::Metadata, 3).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns.len(), Table::Metadata.columns().len());
    }

    #[test]
    fn test_open_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.db");

        {
            let mut store = ArtifactStore::open(&path).unwrap();
            store.migrate(&batch(&[1], 1), ColorPolicy::Append).unwrap();
        }
        let store = ArtifactStore::open(&path).unwrap();
        assert_eq!(store.count(Table::Metadata).unwrap(), 1);
    }

    #[test]
    fn test_conflicting_schema_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conflict.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute("CREATE TABLE artifact_media (objectid INTEGER, note TEXT)", [])
                .unwrap();
        }

        let err = ArtifactStore::open(&path).err().unwrap();
        assert!(matches!(err, Error::StoreUnavailable(ref m) if m.contains("artifact_media")));
    }

    #[test]
    fn test_non_database_file_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

        let err = ArtifactStore::open(&path).err().unwrap();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
