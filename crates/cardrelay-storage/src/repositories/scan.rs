use crate::error::StorageResult;
use crate::models::PersistedScan;
use crate::models::scan::ScanRow;
use cardrelay_core::ScanId;
use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::SqlitePool;
use std::future::Future;
use tracing::debug;

/// Repository trait for the scan backlog
///
/// Methods return `Send` futures so a worker generic over the repository
/// can run on a spawned task.
pub trait ScanRepository: Send + Sync {
    /// Store `rows`, skipping any whose `scan_id` is already present.
    ///
    /// Returns how many rows were actually added.
    fn insert(&self, rows: &[PersistedScan]) -> impl Future<Output = StorageResult<u64>> + Send;

    /// Stream every stored row, oldest first.
    ///
    /// A row with a missing column is yielded as `StorageError::Corrupt`
    /// and the stream carries on with the next row.
    fn all(&self) -> BoxStream<'_, StorageResult<PersistedScan>>;

    /// Remove the rows with the given ids. Unknown ids are ignored.
    ///
    /// Returns how many rows were removed.
    fn delete(&self, ids: &[ScanId]) -> impl Future<Output = StorageResult<u64>> + Send;

    /// Number of rows stored.
    fn count(&self) -> impl Future<Output = StorageResult<i64>> + Send;
}

/// SQLite implementation of ScanRepository
#[derive(Debug, Clone)]
pub struct SqliteScanRepository {
    pool: SqlitePool,
}

impl SqliteScanRepository {
    /// Create a new SQLite scan repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Pool the repository queries through
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl ScanRepository for SqliteScanRepository {
    async fn insert(&self, rows: &[PersistedScan]) -> StorageResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO scans (card_number, time_stamp, scan_id)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(&row.card_number)
            .bind(&row.time_stamp)
            .bind(&row.scan_id)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        if inserted < rows.len() as u64 {
            debug!(
                skipped = rows.len() as u64 - inserted,
                "Scans already in backlog"
            );
        }
        Ok(inserted)
    }

    fn all(&self) -> BoxStream<'_, StorageResult<PersistedScan>> {
        sqlx::query_as::<_, ScanRow>(
            r#"
            SELECT card_number, time_stamp, scan_id
            FROM scans
            ORDER BY rowid
            "#,
        )
        .fetch(&self.pool)
        .map(|row| row.map_err(Into::into).and_then(PersistedScan::try_from))
        .boxed()
    }

    async fn delete(&self, ids: &[ScanId]) -> StorageResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for id in ids {
            let result = sqlx::query("DELETE FROM scans WHERE scan_id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;

            deleted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }

    async fn count(&self) -> StorageResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scans")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
