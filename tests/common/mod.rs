// Shared test helpers: in-memory fakes for every port
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use homelab_monitor::models::*;
use homelab_monitor::ports::*;
use tokio::sync::{Notify, Semaphore, oneshot};

pub fn container(id: &str, name: &str, raw_status: &str) -> ContainerInfo {
    ContainerInfo {
        id: id.into(),
        name: name.into(),
        raw_status: raw_status.into(),
        image: format!("{}:latest", name),
    }
}

pub fn snapshot(name: &str, raw_status: &str, checked_at: DateTime<Utc>) -> ContainerSnapshot {
    ContainerSnapshot {
        id: format!("{}-id", name),
        name: name.into(),
        raw_status: raw_status.into(),
        image: format!("{}:latest", name),
        checked_at,
    }
}

pub fn daily(name: &str, date: NaiveDate, uptime: f64, incidents: u32) -> DailyReport {
    DailyReport {
        container_name: name.into(),
        report_date: date,
        total_snapshots: 10,
        running_snapshots: (uptime / 10.0) as u32,
        uptime_percentage: uptime,
        incident_count: incidents,
        generated_at: Utc::now(),
    }
}

// --- inventory ---

#[derive(Default)]
pub struct FakeInventory {
    containers: Mutex<Vec<ContainerInfo>>,
    fail_list: AtomicBool,
    fail_actions: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    /// Notified each time `list` is entered.
    pub entered: Notify,
    pub restarted: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
}

impl FakeInventory {
    pub fn new(containers: Vec<ContainerInfo>) -> Self {
        let inv = Self::default();
        inv.set(containers);
        inv
    }

    pub fn set(&self, containers: Vec<ContainerInfo>) {
        *self.containers.lock().unwrap() = containers;
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `list` calls wait until a permit is added to the returned semaphore.
    pub fn block_list(&self) -> Arc<Semaphore> {
        let sem = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(sem.clone());
        sem
    }

    pub fn unblock(&self) {
        if let Some(sem) = self.gate.lock().unwrap().take() {
            sem.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    fn check_actions(&self) -> Result<(), InventoryError> {
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable("action refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryPort for FakeInventory {
    async fn list(&self, _include_stopped: bool) -> Result<Vec<ContainerInfo>, InventoryError> {
        self.entered.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(sem) = gate {
            let permit = sem.acquire().await.unwrap();
            permit.forget();
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable("daemon unreachable".into()));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn restart(&self, id: &str) -> Result<(), InventoryError> {
        self.check_actions()?;
        self.restarted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn stop(&self, id: &str) -> Result<(), InventoryError> {
        self.check_actions()?;
        self.stopped.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

// --- stores ---

/// Holds store reads open until the test adds a permit.
#[derive(Default)]
pub struct ReadGate {
    gate: Mutex<Option<Arc<Semaphore>>>,
    /// Notified each time a gated read is entered.
    pub entered: Notify,
}

impl ReadGate {
    pub fn block(&self) -> Arc<Semaphore> {
        let sem = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(sem.clone());
        sem
    }

    async fn pass(&self) {
        self.entered.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(sem) = gate {
            sem.acquire().await.unwrap().forget();
        }
    }
}


#[derive(Default)]
pub struct MemorySnapshotStore {
    rows: Mutex<Vec<ContainerSnapshot>>,
    fail_save: AtomicBool,
    fail_find: AtomicBool,
    fail_delete: AtomicBool,
    /// Gates `find_by_checked_at_between`.
    pub reads: ReadGate,
}

impl MemorySnapshotStore {
    pub fn with_rows(rows: Vec<ContainerSnapshot>) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        store
    }

    pub fn rows(&self) -> Vec<ContainerSnapshot> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn fail_find(&self, fail: bool) {
        self.fail_find.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    fn select(
        &self,
        keep: impl Fn(&ContainerSnapshot) -> bool,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        anyhow::ensure!(!self.fail_find.load(Ordering::SeqCst), "snapshot store offline");
        let mut out: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| keep(s))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.checked_at);
        Ok(out)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save_all(&self, snapshots: &[ContainerSnapshot]) -> anyhow::Result<()> {
        anyhow::ensure!(!self.fail_save.load(Ordering::SeqCst), "snapshot store offline");
        self.rows.lock().unwrap().extend_from_slice(snapshots);
        Ok(())
    }

    async fn find_by_checked_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        self.reads.pass().await;
        self.select(|s| s.checked_at >= start && s.checked_at <= end)
    }

    async fn find_by_checked_at_after(
        &self,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        self.select(|s| s.checked_at > since)
    }

    async fn find_by_name_and_checked_at_after(
        &self,
        name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        self.select(|s| s.name == name && s.checked_at > since)
    }

    async fn delete_by_checked_at_before(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        anyhow::ensure!(!self.fail_delete.load(Ordering::SeqCst), "snapshot store offline");
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|s| s.checked_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

// --- report stores ---

#[derive(Default)]
pub struct MemoryDailyStore {
    rows: Mutex<Vec<DailyReport>>,
    fail_save: AtomicBool,
    /// Gates `find_by_report_date_between`.
    pub reads: ReadGate,
}

impl MemoryDailyStore {
    pub fn with_rows(rows: Vec<DailyReport>) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        store
    }

    pub fn rows(&self) -> Vec<DailyReport> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DailyReportStore for MemoryDailyStore {
    async fn save(&self, report: &DailyReport) -> anyhow::Result<()> {
        anyhow::ensure!(!self.fail_save.load(Ordering::SeqCst), "report store offline");
        self.rows.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn find_by_report_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyReport>> {
        self.reads.pass().await;
        Ok(self
            .rows()
            .into_iter()
            .filter(|r| r.report_date >= start && r.report_date <= end)
            .collect())
    }

    async fn find_by_report_date(&self, date: NaiveDate) -> anyhow::Result<Vec<DailyReport>> {
        Ok(self.rows().into_iter().filter(|r| r.report_date == date).collect())
    }

    async fn find_by_container_name_and_report_date_between(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyReport>> {
        Ok(self
            .rows()
            .into_iter()
            .filter(|r| r.container_name == name && r.report_date >= start && r.report_date <= end)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryMonthlyStore {
    rows: Mutex<Vec<MonthlyReport>>,
    fail_save: AtomicBool,
}

impl MemoryMonthlyStore {
    pub fn rows(&self) -> Vec<MonthlyReport> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MonthlyReportStore for MemoryMonthlyStore {
    async fn save(&self, report: &MonthlyReport) -> anyhow::Result<()> {
        anyhow::ensure!(!self.fail_save.load(Ordering::SeqCst), "report store offline");
        self.rows.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn find_by_report_month_and_report_year(
        &self,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlyReport>> {
        Ok(self
            .rows()
            .into_iter()
            .filter(|r| r.report_month == month && r.report_year == year)
            .collect())
    }

    async fn find_by_report_year_order_by_report_month(
        &self,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlyReport>> {
        let mut out: Vec<_> = self.rows().into_iter().filter(|r| r.report_year == year).collect();
        out.sort_by_key(|r| r.report_month);
        Ok(out)
    }

    async fn find_by_container_name(&self, name: &str) -> anyhow::Result<Vec<MonthlyReport>> {
        let mut out: Vec<_> = self
            .rows()
            .into_iter()
            .filter(|r| r.container_name == name)
            .collect();
        out.sort_by_key(|r| (r.report_year, r.report_month));
        Ok(out)
    }
}

// --- publisher ---

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, ContainerEvent)>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(String, ContainerEvent)> {
        self.published.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<ContainerEvent> {
        self.published().into_iter().map(|(_, e)| e).collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, topic: &str, event: ContainerEvent) -> oneshot::Receiver<bool> {
        self.published.lock().unwrap().push((topic.to_string(), event));
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(true);
        rx
    }
}
