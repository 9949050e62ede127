// Daily and monthly report jobs.
// Store failures propagate: a failed job writes no more rows and (daily) skips the
// retention sweep, so the caller sees the failure instead of a partial report.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Days, Duration, Local, NaiveDate, Utc};
use tracing::{info, instrument};

use crate::aggregation::{self, day_bounds, month_bounds, previous_month};
use crate::models::{DailyReport, MonthlyReport};
use crate::ports::{DailyReportStore, MonthlyReportStore, SnapshotStore};

/// Raw snapshots older than this are deleted by the daily job.
pub const SNAPSHOT_RETENTION_DAYS: i64 = 7;

#[derive(Debug)]
pub enum DailyOutcome {
    /// Another invocation of this job was still running.
    AlreadyRunning,
    /// No snapshots in the window; nothing written, nothing pruned.
    NoSnapshots,
    Generated {
        reports: Vec<DailyReport>,
        pruned: u64,
    },
}

#[derive(Debug)]
pub enum MonthlyOutcome {
    AlreadyRunning,
    NoDailyReports,
    Generated { reports: Vec<MonthlyReport> },
}

/// Clears the running flag on drop so a failed run does not wedge the job.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DailyReportJob {
    snapshots: Arc<dyn SnapshotStore>,
    reports: Arc<dyn DailyReportStore>,
    running: AtomicBool,
}

impl DailyReportJob {
    pub fn new(snapshots: Arc<dyn SnapshotStore>, reports: Arc<dyn DailyReportStore>) -> Self {
        Self {
            snapshots,
            reports,
            running: AtomicBool::new(false),
        }
    }

    /// Reports on yesterday (local calendar).
    pub async fn run(&self) -> anyhow::Result<DailyOutcome> {
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        self.run_for(yesterday, Utc::now()).await
    }

    /// Reports on `day`; `now` stamps the rows and anchors the retention cutoff.
    /// Re-running for a day that was already reported appends a second set of rows.
    #[instrument(skip(self), fields(job = "daily_report"))]
    pub async fn run_for(
        &self,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> anyhow::Result<DailyOutcome> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("daily report job already running; skipping");
            return Ok(DailyOutcome::AlreadyRunning);
        };
        info!(%day, "starting daily report job");

        let (start, end) = day_bounds(day);
        let snapshots = self.snapshots.find_by_checked_at_between(start, end).await?;
        if snapshots.is_empty() {
            info!(%day, "no snapshots found");
            return Ok(DailyOutcome::NoSnapshots);
        }

        let groups = aggregation::group_by_name(snapshots, |s| s.name.as_str());
        let mut reports = Vec::with_capacity(groups.len());
        for (name, group) in &groups {
            let Some(report) = aggregation::summarize_day(name, group, day, now) else {
                continue;
            };
            self.reports.save(&report).await?;
            info!(
                container = %name,
                uptime_percentage = report.uptime_percentage,
                incidents = report.incident_count,
                "daily report saved"
            );
            reports.push(report);
        }

        let cutoff = now - Duration::days(SNAPSHOT_RETENTION_DAYS);
        let pruned = self.snapshots.delete_by_checked_at_before(cutoff).await?;
        info!(pruned, %cutoff, "pruned snapshots past retention");

        Ok(DailyOutcome::Generated { reports, pruned })
    }
}

pub struct MonthlyReportJob {
    daily: Arc<dyn DailyReportStore>,
    monthly: Arc<dyn MonthlyReportStore>,
    running: AtomicBool,
}

impl MonthlyReportJob {
    pub fn new(daily: Arc<dyn DailyReportStore>, monthly: Arc<dyn MonthlyReportStore>) -> Self {
        Self {
            daily,
            monthly,
            running: AtomicBool::new(false),
        }
    }

    /// Reports on the previous calendar month (local calendar).
    pub async fn run(&self) -> anyhow::Result<MonthlyOutcome> {
        let (year, month) = previous_month(Local::now().date_naive());
        self.run_for(year, month, Utc::now()).await
    }

    /// Reports on `year`/`month` from its daily rows. Re-running appends rows.
    #[instrument(skip(self), fields(job = "monthly_report"))]
    pub async fn run_for(
        &self,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> anyhow::Result<MonthlyOutcome> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("monthly report job already running; skipping");
            return Ok(MonthlyOutcome::AlreadyRunning);
        };
        let Some((first, last)) = month_bounds(year, month) else {
            anyhow::bail!("invalid report month {}-{}", year, month);
        };
        info!(year, month, "starting monthly report job");

        let daily = self.daily.find_by_report_date_between(first, last).await?;
        if daily.is_empty() {
            info!(year, month, "no daily reports found");
            return Ok(MonthlyOutcome::NoDailyReports);
        }

        let groups = aggregation::group_by_name(daily, |r| r.container_name.as_str());
        let mut reports = Vec::with_capacity(groups.len());
        for (name, group) in &groups {
            let Some(report) = aggregation::summarize_month(name, group, year, month, now) else {
                continue;
            };
            self.monthly.save(&report).await?;
            info!(container = %name, "monthly report saved");
            reports.push(report);
        }

        Ok(MonthlyOutcome::Generated { reports })
    }
}
