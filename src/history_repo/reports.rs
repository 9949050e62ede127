// Daily and monthly report tables. Rows are only ever inserted; there is no unique
// key on (container, period), so writing the same period twice keeps both rows.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use tracing::instrument;

use super::{HistoryRepo, millis_to_utc};
use crate::models::{DailyReport, MonthlyReport};
use crate::ports::{DailyReportStore, MonthlyReportStore};

const DAILY_COLUMNS: &str = "container_name, report_date, total_snapshots, running_snapshots, \
     uptime_percentage, incident_count, generated_at";
const MONTHLY_COLUMNS: &str = "container_name, report_month, report_year, \
     average_uptime_percentage, total_incidents, days_with_incidents, total_days_reported, \
     generated_at";

pub(super) async fn init_report_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_report (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_name TEXT NOT NULL,
            report_date TEXT NOT NULL,
            total_snapshots INTEGER NOT NULL,
            running_snapshots INTEGER NOT NULL,
            uptime_percentage REAL NOT NULL,
            incident_count INTEGER NOT NULL,
            generated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_daily_report_date ON daily_report(report_date, container_name)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monthly_report (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_name TEXT NOT NULL,
            report_month INTEGER NOT NULL,
            report_year INTEGER NOT NULL,
            average_uptime_percentage REAL NOT NULL,
            total_incidents INTEGER NOT NULL,
            days_with_incidents INTEGER NOT NULL,
            total_days_reported INTEGER NOT NULL,
            generated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_monthly_report_period ON monthly_report(report_year, report_month)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_daily_row(row: &SqliteRow) -> anyhow::Result<DailyReport> {
    let report_date: String = row.try_get("report_date")?;
    let generated_at: i64 = row.try_get("generated_at")?;
    Ok(DailyReport {
        container_name: row.try_get("container_name")?,
        report_date: NaiveDate::parse_from_str(&report_date, "%Y-%m-%d")?,
        total_snapshots: row.try_get::<i64, _>("total_snapshots")?.try_into()?,
        running_snapshots: row.try_get::<i64, _>("running_snapshots")?.try_into()?,
        uptime_percentage: row.try_get("uptime_percentage")?,
        incident_count: row.try_get::<i64, _>("incident_count")?.try_into()?,
        generated_at: millis_to_utc(generated_at)?,
    })
}

fn parse_monthly_row(row: &SqliteRow) -> anyhow::Result<MonthlyReport> {
    let generated_at: i64 = row.try_get("generated_at")?;
    Ok(MonthlyReport {
        container_name: row.try_get("container_name")?,
        report_month: row.try_get::<i64, _>("report_month")?.try_into()?,
        report_year: row.try_get::<i64, _>("report_year")?.try_into()?,
        average_uptime_percentage: row.try_get("average_uptime_percentage")?,
        total_incidents: row.try_get::<i64, _>("total_incidents")?.try_into()?,
        days_with_incidents: row.try_get::<i64, _>("days_with_incidents")?.try_into()?,
        total_days_reported: row.try_get::<i64, _>("total_days_reported")?.try_into()?,
        generated_at: millis_to_utc(generated_at)?,
    })
}

#[async_trait]
impl DailyReportStore for HistoryRepo {
    #[instrument(skip(self, report), fields(repo = "reports", operation = "save_daily", container = %report.container_name))]
    async fn save(&self, report: &DailyReport) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO daily_report ({DAILY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(&report.container_name)
        .bind(date_key(report.report_date))
        .bind(report.total_snapshots as i64)
        .bind(report.running_snapshots as i64)
        .bind(report.uptime_percentage)
        .bind(report.incident_count as i64)
        .bind(report.generated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "reports", operation = "find_by_report_date_between"))]
    async fn find_by_report_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_report
             WHERE report_date >= $1 AND report_date <= $2 ORDER BY report_date ASC, id ASC"
        ))
        .bind(date_key(start))
        .bind(date_key(end))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_daily_row).collect()
    }

    #[instrument(skip(self), fields(repo = "reports", operation = "find_by_report_date"))]
    async fn find_by_report_date(&self, date: NaiveDate) -> anyhow::Result<Vec<DailyReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_report WHERE report_date = $1 ORDER BY id ASC"
        ))
        .bind(date_key(date))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_daily_row).collect()
    }

    #[instrument(skip(self), fields(repo = "reports", operation = "find_by_container_name_and_report_date_between"))]
    async fn find_by_container_name_and_report_date_between(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_report
             WHERE container_name = $1 AND report_date >= $2 AND report_date <= $3
             ORDER BY report_date ASC, id ASC"
        ))
        .bind(name)
        .bind(date_key(start))
        .bind(date_key(end))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_daily_row).collect()
    }
}

#[async_trait]
impl MonthlyReportStore for HistoryRepo {
    #[instrument(skip(self, report), fields(repo = "reports", operation = "save_monthly", container = %report.container_name))]
    async fn save(&self, report: &MonthlyReport) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO monthly_report ({MONTHLY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(&report.container_name)
        .bind(report.report_month as i64)
        .bind(report.report_year as i64)
        .bind(report.average_uptime_percentage)
        .bind(report.total_incidents as i64)
        .bind(report.days_with_incidents as i64)
        .bind(report.total_days_reported as i64)
        .bind(report.generated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "reports", operation = "find_by_report_month_and_report_year"))]
    async fn find_by_report_month_and_report_year(
        &self,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlyReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {MONTHLY_COLUMNS} FROM monthly_report
             WHERE report_month = $1 AND report_year = $2 ORDER BY id ASC"
        ))
        .bind(month as i64)
        .bind(year as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_monthly_row).collect()
    }

    #[instrument(skip(self), fields(repo = "reports", operation = "find_by_report_year_order_by_report_month"))]
    async fn find_by_report_year_order_by_report_month(
        &self,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlyReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {MONTHLY_COLUMNS} FROM monthly_report
             WHERE report_year = $1 ORDER BY report_month ASC, id ASC"
        ))
        .bind(year as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_monthly_row).collect()
    }

    #[instrument(skip(self), fields(repo = "reports", operation = "find_by_container_name"))]
    async fn find_by_container_name(&self, name: &str) -> anyhow::Result<Vec<MonthlyReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {MONTHLY_COLUMNS} FROM monthly_report
             WHERE container_name = $1 ORDER BY report_year ASC, report_month ASC, id ASC"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_monthly_row).collect()
    }
}
