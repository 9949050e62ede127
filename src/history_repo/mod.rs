// SQLite store for container snapshots and availability reports.
// Uses sqlx for async + connection pooling. Timestamps are stored as UTC epoch millis,
// report dates as ISO `YYYY-MM-DD` text (sorts and compares correctly as strings).

mod reports;

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite};
use tracing::instrument;

use crate::models::ContainerSnapshot;
use crate::ports::SnapshotStore;

const SNAPSHOT_COLUMNS: &str = "container_id, name, status, image, checked_at";

pub struct HistoryRepo {
    pool: SqlitePool,
}

impl HistoryRepo {
    /// Connect to SQLite at `path`, create parent dir and DB if missing, enable WAL + pragmas.
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Creates tables and indexes if not present. Safe to call repeatedly.
    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS container_snapshot (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container_id TEXT NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                image TEXT NOT NULL,
                checked_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_snapshot_checked_at ON container_snapshot(checked_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_snapshot_name_checked_at ON container_snapshot(name, checked_at)",
        )
        .execute(&self.pool)
        .await?;

        reports::init_report_tables(&self.pool).await?;

        Ok(())
    }

    async fn fetch_snapshots<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(parse_snapshot_row).collect()
    }
}

#[async_trait]
impl SnapshotStore for HistoryRepo {
    #[instrument(
        skip(self, snapshots),
        fields(repo = "history", operation = "save_all", snapshots_count = snapshots.len())
    )]
    async fn save_all(&self, snapshots: &[ContainerSnapshot]) -> anyhow::Result<()> {
        if snapshots.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for s in snapshots {
            sqlx::query(
                "INSERT INTO container_snapshot (container_id, name, status, image, checked_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&s.id)
            .bind(&s.name)
            .bind(&s.raw_status)
            .bind(&s.image)
            .bind(s.checked_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(
        skip(self),
        fields(repo = "history", operation = "find_by_checked_at_between")
    )]
    async fn find_by_checked_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM container_snapshot
             WHERE checked_at >= $1 AND checked_at <= $2 ORDER BY checked_at ASC, id ASC"
        );
        self.fetch_snapshots(
            sqlx::query(&sql)
                .bind(start.timestamp_millis())
                .bind(end.timestamp_millis()),
        )
        .await
    }

    #[instrument(skip(self), fields(repo = "history", operation = "find_by_checked_at_after"))]
    async fn find_by_checked_at_after(
        &self,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM container_snapshot
             WHERE checked_at > $1 ORDER BY checked_at ASC, id ASC"
        );
        self.fetch_snapshots(sqlx::query(&sql).bind(since.timestamp_millis()))
            .await
    }

    #[instrument(
        skip(self),
        fields(repo = "history", operation = "find_by_name_and_checked_at_after")
    )]
    async fn find_by_name_and_checked_at_after(
        &self,
        name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM container_snapshot
             WHERE name = $1 AND checked_at > $2 ORDER BY checked_at ASC, id ASC"
        );
        self.fetch_snapshots(
            sqlx::query(&sql)
                .bind(name)
                .bind(since.timestamp_millis()),
        )
        .await
    }

    #[instrument(
        skip(self),
        fields(repo = "history", operation = "delete_by_checked_at_before")
    )]
    async fn delete_by_checked_at_before(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let r = sqlx::query("DELETE FROM container_snapshot WHERE checked_at < $1")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }
}

fn parse_snapshot_row(row: &SqliteRow) -> anyhow::Result<ContainerSnapshot> {
    let checked_at_ms: i64 = row.try_get("checked_at")?;
    Ok(ContainerSnapshot {
        id: row.try_get("container_id")?,
        name: row.try_get("name")?,
        raw_status: row.try_get("status")?,
        image: row.try_get("image")?,
        checked_at: millis_to_utc(checked_at_ms)?,
    })
}

pub(crate) fn millis_to_utc(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow::anyhow!("timestamp out of range: {}", ms))
}
