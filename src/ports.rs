// Collaborator seams: inventory source, persistent stores, event channel.
// Each store exposes only the range/filter operations the monitor needs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::oneshot;

use crate::models::{
    ContainerEvent, ContainerInfo, ContainerSnapshot, DailyReport, MonthlyReport,
};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("docker api: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

/// Lists live containers and acts on them by id.
#[async_trait]
pub trait InventoryPort: Send + Sync {
    async fn list(&self, include_stopped: bool) -> Result<Vec<ContainerInfo>, InventoryError>;
    async fn restart(&self, id: &str) -> Result<(), InventoryError>;
    async fn stop(&self, id: &str) -> Result<(), InventoryError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Writes one poll cycle's snapshots in a single batch.
    async fn save_all(&self, snapshots: &[ContainerSnapshot]) -> anyhow::Result<()>;
    /// Snapshots with `start <= checked_at <= end`, in chronological order.
    async fn find_by_checked_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>>;
    async fn find_by_checked_at_after(
        &self,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>>;
    async fn find_by_name_and_checked_at_after(
        &self,
        name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>>;
    /// Deletes snapshots with `checked_at < cutoff`. Returns rows removed.
    async fn delete_by_checked_at_before(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;
}

/// Append-only: `save` never replaces an existing row.
#[async_trait]
pub trait DailyReportStore: Send + Sync {
    async fn save(&self, report: &DailyReport) -> anyhow::Result<()>;
    /// Inclusive on both ends.
    async fn find_by_report_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyReport>>;
    async fn find_by_report_date(&self, date: NaiveDate) -> anyhow::Result<Vec<DailyReport>>;
    async fn find_by_container_name_and_report_date_between(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyReport>>;
}

/// Append-only: `save` never replaces an existing row.
#[async_trait]
pub trait MonthlyReportStore: Send + Sync {
    async fn save(&self, report: &MonthlyReport) -> anyhow::Result<()>;
    async fn find_by_report_month_and_report_year(
        &self,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlyReport>>;
    async fn find_by_report_year_order_by_report_month(
        &self,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlyReport>>;
    /// Ordered by year, then month, ascending.
    async fn find_by_container_name(&self, name: &str) -> anyhow::Result<Vec<MonthlyReport>>;
}

/// Best-effort outbound channel for transition events.
///
/// `publish` must never block the caller and must never retry. Delivery happens in the
/// background; failures are logged by the implementation and otherwise dropped. The returned
/// receiver resolves to `true` once the event was delivered and may simply be ignored.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: &str, event: ContainerEvent) -> oneshot::Receiver<bool>;
}
