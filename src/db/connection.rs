// src/db/connection.rs

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::cell::RefCell;

use crate::db::conform::PersistedRecord;
use crate::db::gateway::{StoreError, StoreGateway, TxReport};
use crate::db::marshal::StoreValue;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slot, keyed by path so handles to different
// databases on one thread don't share a connection.
thread_local! {
    static DB_CONN: RefCell<Option<(String, Connection)>> = RefCell::new(None);
}

#[derive(Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let stale = match slot.as_ref() {
                    Some((path, _)) => path != &self.path,
                    None => true,
                };
                if stale {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| StoreError::Backend(format!("Open DB failed: {e}")))?;
                    *slot = Some((self.path.clone(), conn));
                }
                let (_, conn) = slot.as_mut().unwrap();
                f(conn)
            })
            .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    /// Applies the fact-store schema.
    pub fn init(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA_SQL)
                .map_err(|e| StoreError::Backend(format!("Init failed: {e}")))?;
            Ok(())
        })
    }
}

/// Sqlite-backed fact store behind the `StoreGateway` seam.
pub struct SqliteGateway {
    db: Database,
}

impl SqliteGateway {
    pub fn open(path: impl Into<String>) -> Result<Self, StoreError> {
        let db = Database::new(path);
        db.init()?;
        Ok(Self { db })
    }
}

/// A record keeps its entity across re-ingestion: if the incoming
/// `listing/url` value is already stored, its entity's facts are replaced
/// instead of a new entity being minted.
fn resolve_entity(tx: &Transaction, record: &PersistedRecord) -> Result<i64, StoreError> {
    if let Some(url) = record.get("listing/url") {
        let json =
            serde_json::to_string(url).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let existing = tx
            .query_row(
                "SELECT entity FROM facts WHERE attribute = 'listing/url' AND value = ?1",
                params![json],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        if let Some(entity) = existing {
            return Ok(entity);
        }
    }

    tx.query_row("SELECT COALESCE(MAX(entity), 0) + 1 FROM facts", [], |row| {
        row.get(0)
    })
    .map_err(|e| StoreError::Rejected(e.to_string()))
}

impl StoreGateway for SqliteGateway {
    fn transact(&self, records: Vec<PersistedRecord>) -> Result<TxReport, StoreError> {
        let count = records.len();

        self.db.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| StoreError::Rejected(e.to_string()))?;

            for record in &records {
                let entity = resolve_entity(&tx, record)?;

                tx.execute("DELETE FROM facts WHERE entity = ?1", params![entity])
                    .map_err(|e| StoreError::Rejected(e.to_string()))?;

                for (attribute, value) in record {
                    let json = serde_json::to_string(value)
                        .map_err(|e| StoreError::Rejected(e.to_string()))?;
                    tx.execute(
                        "INSERT INTO facts (entity, attribute, value) VALUES (?1, ?2, ?3)",
                        params![entity, attribute, json],
                    )
                    .map_err(|e| StoreError::Rejected(e.to_string()))?;
                }
            }

            let committed_at = chrono::Utc::now().to_rfc3339();
            tx.execute(
                "INSERT INTO tx_log (committed_at, records) VALUES (?1, ?2)",
                params![committed_at, count as i64],
            )
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
            let tx_id = tx.last_insert_rowid();

            tx.commit().map_err(|e| StoreError::Rejected(e.to_string()))?;

            Ok(TxReport {
                tx_id,
                records_written: count,
            })
        })
    }

    fn query(&self, attribute: &str) -> Result<Vec<PersistedRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT f.entity, f.attribute, f.value FROM facts f
                     WHERE f.entity IN (SELECT entity FROM facts WHERE attribute = ?1)
                     ORDER BY f.entity, f.attribute",
                )
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let rows = stmt
                .query_map(params![attribute], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let mut records: Vec<(i64, PersistedRecord)> = Vec::new();
            for row in rows {
                let (entity, attr, json) = row.map_err(|e| StoreError::Query(e.to_string()))?;
                let value: StoreValue = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                match records.last_mut() {
                    Some((current, record)) if *current == entity => {
                        record.insert(attr, value);
                    }
                    _ => {
                        let mut record = PersistedRecord::new();
                        record.insert(attr, value);
                        records.push((entity, record));
                    }
                }
            }

            Ok(records.into_iter().map(|(_, record)| record).collect())
        })
    }
}
