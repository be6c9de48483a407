//! SQLite-backed implementation of the offline queue port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use sensorlink_core::OfflineQueue;
use sensorlink_domain::{CachedEntry, Result, SensorLinkError};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use crate::errors::InfraError;

/// Offline queue persisted in the `cached_messages` table.
///
/// Rows are append-only: the only mutation after insert is deletion through
/// [`OfflineQueue::acknowledge`]. FIFO order is the `id` order.
pub struct SqliteOfflineQueue {
    db: Arc<DbManager>,
}

impl SqliteOfflineQueue {
    /// Construct a queue backed by the shared manager. The schema must
    /// already exist (see [`DbManager::run_migrations`]).
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_entry(
        conn: &Connection,
        endpoint: &str,
        body: &str,
        token: &str,
    ) -> Result<CachedEntry> {
        let enqueued_at = Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO cached_messages (endpoint, body, token, enqueued_at) VALUES (?1, ?2, ?3, ?4)",
            params![endpoint, body, token, enqueued_at],
        )
        .map_err(map_sql_error)?;

        Ok(CachedEntry {
            id: conn.last_insert_rowid(),
            endpoint: endpoint.to_owned(),
            body: body.to_owned(),
            token: token.to_owned(),
            enqueued_at,
        })
    }

    fn fetch_after(conn: &Connection, after_id: i64, limit: usize) -> Result<Vec<CachedEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, endpoint, body, token, enqueued_at
                 FROM cached_messages
                 WHERE id > ?1
                 ORDER BY id ASC
                 LIMIT ?2",
            )
            .map_err(map_sql_error)?;

        let rows = stmt
            .query_map(params![after_id, usize_to_i64(limit)], map_cached_row)
            .map_err(map_sql_error)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }

    /// Run `op` on a pooled connection off the async runtime.
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<T> {
            let conn = db.get_connection()?;
            op(&*conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl OfflineQueue for SqliteOfflineQueue {
    async fn enqueue(&self, endpoint: &str, body: &str, token: &str) -> Result<CachedEntry> {
        let (endpoint, body, token) = (endpoint.to_owned(), body.to_owned(), token.to_owned());

        self.with_connection(move |conn| Self::insert_entry(conn, &endpoint, &body, &token)).await
    }

    async fn list_after(&self, after_id: i64, limit: usize) -> Result<Vec<CachedEntry>> {
        self.with_connection(move |conn| Self::fetch_after(conn, after_id, limit)).await
    }

    async fn acknowledge(&self, id: i64) -> Result<bool> {
        self.with_connection(move |conn| {
            let removed = conn
                .execute("DELETE FROM cached_messages WHERE id = ?1", params![id])
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn len(&self) -> Result<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM cached_messages", [], |row| row.get(0))
                .map_err(map_sql_error)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}

fn map_cached_row(row: &Row<'_>) -> rusqlite::Result<CachedEntry> {
    Ok(CachedEntry {
        id: row.get("id")?,
        endpoint: row.get("endpoint")?,
        body: row.get("body")?,
        token: row.get("token")?,
        enqueued_at: row.get("enqueued_at")?,
    })
}

fn map_join_error(err: task::JoinError) -> SensorLinkError {
    SensorLinkError::from(InfraError::from(err))
}

fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
