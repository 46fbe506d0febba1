use crate::errors::StoreError;
use crate::models::ServiceRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open or create the SQLite database with WAL mode enabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                identifier  TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT,
                fetched_at  TEXT NOT NULL
            );
            "#,
        )?;

        Ok(Self { conn })
    }

    /// Insert or update a record keyed by its identifier, so repeated
    /// fetches never produce duplicate rows.
    pub fn upsert(&self, record: &ServiceRecord) -> Result<(), StoreError> {
        if record.identifier.is_empty() {
            return Err(StoreError::EmptyIdentifier);
        }

        self.conn.execute(
            r#"
            INSERT INTO records (identifier, title, description, fetched_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(identifier) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                fetched_at = excluded.fetched_at
            "#,
            params![
                &record.identifier,
                &record.title,
                &record.description,
                record.fetched_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// All records, oldest fetch first.
    pub fn list(&self) -> Result<Vec<ServiceRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT identifier, title, description, fetched_at
             FROM records
             ORDER BY fetched_at, identifier",
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

        Ok(count)
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<ServiceRecord, rusqlite::Error> {
        let fetched_at_raw: String = row.get(3)?;
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at_raw)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&Utc);

        Ok(ServiceRecord {
            identifier: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            fetched_at,
        })
    }
}
