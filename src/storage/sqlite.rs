use super::{AtlasStore, validate_table_name};
use crate::types::{AtlasColumn, OverlapQuery, QtlRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, Row, params, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Atlas table in a SQLite database.
///
/// rusqlite is blocking, so every call runs on the tokio blocking pool.
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteStore {
    /// Open (or create) a database for writing
    pub fn create<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        let connection = Connection::open(path)?;
        Ok(Self::from_connection(connection, table))
    }

    /// Open an existing database read-only. The table must exist.
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!("database {}", path.display())));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path, flags)?;
        let has_table: bool = connection.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(Error::NotFound(format!(
                "table {} in database {}",
                table,
                path.display()
            )));
        }

        Ok(Self::from_connection(connection, table))
    }

    /// Private in-memory database, mostly for tests
    pub fn in_memory(table: &str) -> Result<Self> {
        validate_table_name(table)?;
        let connection = Connection::open_in_memory()?;
        Ok(Self::from_connection(connection, table))
    }

    fn from_connection(connection: Connection, table: &str) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
            table: table.to_string(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut guard = connection
                .lock()
                .map_err(|_| Error::Internal("database connection lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| Error::Internal(format!("database task failed: {}", e)))?
    }
}

#[async_trait]
impl AtlasStore for SqliteStore {
    async fn replace_all(&self, records: Vec<QtlRecord>) -> Result<usize> {
        let table = self.table.clone();
        self.with_connection(move |connection: &mut Connection| -> Result<usize> {
            let transaction = connection.transaction()?;
            transaction.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table), ())?;
            transaction.execute(&create_table_sql(&table), ())?;
            {
                let mut insert = transaction.prepare(&insert_sql(&table))?;
                for r in &records {
                    insert.execute(params![
                        r.id,
                        r.qtl_id,
                        r.publication,
                        r.population,
                        r.trait_description,
                        r.locus_span,
                        r.genes_under_qtl,
                        r.synteny,
                        r.chr,
                        r.start,
                        r.stop,
                    ])?;
                }
            }
            transaction.commit()?;
            Ok(records.len())
        })
        .await
    }

    async fn overlapping(&self, query: &OverlapQuery) -> Result<Vec<QtlRecord>> {
        let sql = select_sql(&self.table, query);
        let mut values = vec![
            Value::Integer(query.chr),
            Value::Integer(query.start),
            Value::Integer(query.end()),
            Value::Integer(query.tolerance),
        ];
        values.extend(query.filters.iter().map(|f| Value::Text(f.needle.clone())));

        self.with_connection(move |connection: &mut Connection| -> Result<Vec<QtlRecord>> {
            let mut statement = connection.prepare(&sql)?;
            let records = statement
                .query_map(params_from_iter(values.iter()), row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
        self.with_connection(move |connection: &mut Connection| -> Result<usize> {
            let count: i64 = connection.query_row(&sql, (), |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = AtlasColumn::ALL
        .iter()
        .map(|column| {
            let ty = match column {
                AtlasColumn::Index => "INTEGER PRIMARY KEY",
                c if c.is_numeric() => "INTEGER NOT NULL",
                _ => "TEXT NOT NULL",
            };
            format!("\"{}\" {}", column.name(), ty)
        })
        .collect();
    format!("CREATE TABLE \"{}\" ({})", table, columns.join(", "))
}

fn insert_sql(table: &str) -> String {
    let names: Vec<String> = AtlasColumn::ALL
        .iter()
        .map(|c| format!("\"{}\"", c.name()))
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Column expression with an explicit type. Databases written by the older
/// pandas pipeline store Chr/Start/Stop as TEXT.
fn typed_column(column: AtlasColumn) -> String {
    let ty = if column.is_numeric() { "INTEGER" } else { "TEXT" };
    format!("CAST(\"{}\" AS {})", column.name(), ty)
}

/// Parameters: ?1 chr, ?2 marker start, ?3 marker end, ?4 tolerance, then one
/// needle per substring filter.
fn select_sql(table: &str, query: &OverlapQuery) -> String {
    let columns: Vec<String> = AtlasColumn::ALL.iter().map(|c| typed_column(*c)).collect();
    let chr = typed_column(AtlasColumn::Chr);
    let start = typed_column(AtlasColumn::Start);
    let stop = typed_column(AtlasColumn::Stop);

    let mut sql = format!(
        "SELECT {columns} FROM \"{table}\" \
         WHERE {chr} = ?1 \
         AND ((?2 BETWEEN {start} - ?4 AND {stop} + ?4) \
           OR (?3 BETWEEN {start} - ?4 AND {stop} + ?4) \
           OR (?2 <= {start} AND ?3 >= {stop}))",
        columns = columns.join(", "),
    );
    for (i, filter) in query.filters.iter().enumerate() {
        let text = format!("CAST(\"{}\" AS TEXT)", filter.column.name());
        sql.push_str(&format!(" AND instr({}, ?{}) > 0", text, i + 5));
    }
    sql.push_str(&format!(" ORDER BY {}", typed_column(AtlasColumn::Index)));
    sql
}

fn row_to_record(row: &Row) -> rusqlite::Result<QtlRecord> {
    let text = |i: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
    };
    Ok(QtlRecord {
        id: row.get(0)?,
        qtl_id: text(1)?,
        publication: text(2)?,
        population: text(3)?,
        trait_description: text(4)?,
        locus_span: text(5)?,
        genes_under_qtl: text(6)?,
        synteny: text(7)?,
        chr: row.get(8)?,
        start: row.get(9)?,
        stop: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::SubstringFilter;

    fn record(id: i64, qtl_id: &str, chr: i64, start: i64, stop: i64) -> QtlRecord {
        QtlRecord {
            id,
            qtl_id: qtl_id.to_string(),
            publication: format!("Author {} et al.", id),
            population: if id % 2 == 0 { "BTx623" } else { "IS3620C" }.to_string(),
            trait_description: "plant height".to_string(),
            locus_span: format!("{}:{}-{}", chr, start, stop),
            genes_under_qtl: String::new(),
            synteny: "Zm".to_string(),
            chr,
            start,
            stop,
        }
    }

    fn fixture() -> Vec<QtlRecord> {
        vec![
            record(0, "QTL_A", 3, 100, 200),
            record(1, "QTL_B", 3, 20_000, 30_000),
            record(2, "QTL_C", 1, 100, 200),
            record(3, "QTL_D", 3, 150, 160),
            record(4, "QTL_E", 13, 100, 200),
            record(5, "QTL_F", 3, 0, 9_000_000),
        ]
    }

    fn query(chr: i64, start: i64, stop: Option<i64>, tolerance: i64) -> OverlapQuery {
        OverlapQuery {
            chr,
            start,
            stop,
            tolerance,
            filters: vec![],
        }
    }

    fn ids(records: &[QtlRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_replace_and_count() {
        let store = SqliteStore::in_memory("atlas").unwrap();
        assert_eq!(store.replace_all(fixture()).await.unwrap(), 6);
        assert_eq!(store.count().await.unwrap(), 6);

        // Second build overwrites instead of appending
        assert_eq!(store.replace_all(fixture()[..2].to_vec()).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_records_round_trip() {
        let store = SqliteStore::in_memory("atlas").unwrap();
        store.replace_all(fixture()).await.unwrap();
        let found = store.overlapping(&query(1, 150, None, 0)).await.unwrap();
        assert_eq!(found, vec![fixture()[2].clone()]);
    }

    #[tokio::test]
    async fn test_point_query() {
        let store = SqliteStore::in_memory("atlas").unwrap();
        store.replace_all(fixture()).await.unwrap();

        let found = store.overlapping(&query(3, 155, None, 0)).await.unwrap();
        assert_eq!(ids(&found), vec![0, 3, 5]);

        let found = store.overlapping(&query(3, 10_000, None, 10_000)).await.unwrap();
        assert_eq!(ids(&found), vec![0, 1, 3, 5]);
    }

    #[tokio::test]
    async fn test_interval_query_contains_record() {
        let store = SqliteStore::in_memory("atlas").unwrap();
        store.replace_all(fixture()).await.unwrap();

        let found = store
            .overlapping(&query(3, 10_000, Some(40_000), 0))
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![1, 5]);
    }

    #[tokio::test]
    async fn test_substring_filters() {
        let store = SqliteStore::in_memory("atlas").unwrap();
        store.replace_all(fixture()).await.unwrap();

        let mut q = query(3, 155, None, 0);
        q.filters = SubstringFilter::parse_lists("3", "BTx").unwrap();
        assert_eq!(ids(&store.overlapping(&q).await.unwrap()), vec![0]);

        q.filters = SubstringFilter::parse_lists("3", "btx").unwrap();
        assert!(store.overlapping(&q).await.unwrap().is_empty());

        q.filters = SubstringFilter::parse_lists("1,10", "QTL,00").unwrap();
        assert_eq!(ids(&store.overlapping(&q).await.unwrap()), vec![0, 5]);
    }

    #[tokio::test]
    async fn test_matches_memory_store() {
        let sqlite = SqliteStore::in_memory("atlas").unwrap();
        let memory = MemoryStore::new();
        sqlite.replace_all(fixture()).await.unwrap();
        memory.replace_all(fixture()).await.unwrap();

        let filters = SubstringFilter::parse_lists("8", "3").unwrap();
        for chr in [1, 3, 13] {
            for (start, stop) in [(0, None), (150, None), (201, None), (50, Some(99)), (199, Some(25_000))] {
                for tolerance in [0, 1, 10_000] {
                    let mut q = query(chr, start, stop, tolerance);
                    assert_eq!(
                        sqlite.overlapping(&q).await.unwrap(),
                        memory.overlapping(&q).await.unwrap(),
                        "{q:?}"
                    );
                    q.filters = filters.clone();
                    assert_eq!(
                        sqlite.overlapping(&q).await.unwrap(),
                        memory.overlapping(&q).await.unwrap(),
                        "{q:?}"
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_open_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.db");
        {
            let store = SqliteStore::create(&path, "atlas").unwrap();
            store.replace_all(fixture()).await.unwrap();
        }

        let store = SqliteStore::open(&path, "atlas").unwrap();
        assert_eq!(store.count().await.unwrap(), 6);
        assert!(store.replace_all(vec![]).await.is_err());

        assert!(matches!(
            SqliteStore::open(&path, "leaf"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            SqliteStore::open(dir.path().join("missing.db"), "atlas"),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_legacy_text_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let connection = Connection::open(&path).unwrap();
            connection
                .execute_batch(
                    "CREATE TABLE atlas (\"index\" INTEGER, \"QTL Id\" TEXT, \"Publication\" TEXT, \
                     \"Population\" TEXT, \"Trait Description\" TEXT, \"LG:Start-End (v3.0)\" TEXT, \
                     \"Genes Under QTL (v3.0)\" TEXT, \"Synteny\" TEXT, \"Chr\" TEXT, \"Start\" TEXT, \"Stop\" TEXT);
                     INSERT INTO atlas VALUES (0, 'QTL1', 'PubA', 'PopA', 'desc', '3:100-200', NULL, 'synA', '3', '100', '200');
                     INSERT INTO atlas VALUES (1, 'QTL2', 'PubB', 'PopB', 'desc', '3:900-1000', 'g', 's', '3', '900', '1000');",
                )
                .unwrap();
        }

        let store = SqliteStore::open(&path, "atlas").unwrap();
        let found = store.overlapping(&query(3, 90, Some(150), 0)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].qtl_id, "QTL1");
        assert_eq!(found[0].genes_under_qtl, "");
        assert_eq!((found[0].chr, found[0].start, found[0].stop), (3, 100, 200));
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(matches!(
            SqliteStore::in_memory("atlas;--"),
            Err(Error::Config(_))
        ));
    }
}
