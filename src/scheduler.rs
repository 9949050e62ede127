// Background scheduler: fixed-interval poll plus cron-driven daily and monthly report jobs.
// Each task is its own tokio task; stop() signals all of them and waits for the one in
// flight to finish, cancel() aborts a single task.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use cron::Schedule;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::poller::{PollOutcome, Poller};
use crate::report_jobs::{DailyReportJob, MonthlyReportJob};

/// Spring-style six-field cron (sec min hour dom month dow), local time.
pub const DEFAULT_DAILY_SCHEDULE: &str = "0 0 2 * * *";
pub const DEFAULT_MONTHLY_SCHEDULE: &str = "0 0 3 1 * *";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval_ms: u64,
    pub daily_schedule: String,
    pub monthly_schedule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Poll,
    DailyReport,
    MonthlyReport,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Poll => "poll",
            Task::DailyReport => "daily_report",
            Task::MonthlyReport => "monthly_report",
        }
    }
}

pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(Task, JoinHandle<()>)>,
}

impl Scheduler {
    /// Parses both cron expressions up front, then spawns the three tasks.
    pub fn start(
        poller: Arc<Poller>,
        daily: Arc<DailyReportJob>,
        monthly: Arc<MonthlyReportJob>,
        config: &SchedulerConfig,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(config.poll_interval_ms > 0, "poll interval must be > 0");
        let daily_schedule = parse_schedule(&config.daily_schedule)?;
        let monthly_schedule = parse_schedule(&config.monthly_schedule)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let interval = Duration::from_millis(config.poll_interval_ms);

        let tasks = vec![
            (
                Task::Poll,
                tokio::spawn(poll_loop(poller, interval, shutdown_rx.clone())),
            ),
            (
                Task::DailyReport,
                tokio::spawn(cron_loop(
                    Task::DailyReport,
                    daily_schedule,
                    shutdown_rx.clone(),
                    move || {
                        let job = daily.clone();
                        async move {
                            let outcome = job.run().await?;
                            debug!(?outcome, "daily report job finished");
                            Ok(())
                        }
                    },
                )),
            ),
            (
                Task::MonthlyReport,
                tokio::spawn(cron_loop(
                    Task::MonthlyReport,
                    monthly_schedule,
                    shutdown_rx,
                    move || {
                        let job = monthly.clone();
                        async move {
                            let outcome = job.run().await?;
                            debug!(?outcome, "monthly report job finished");
                            Ok(())
                        }
                    },
                )),
            ),
        ];
        info!(poll_interval_ms = config.poll_interval_ms, "scheduler started");
        Ok(Self { shutdown_tx, tasks })
    }

    /// Aborts one task; the others keep running.
    pub fn cancel(&mut self, task: Task) {
        self.tasks.retain(|(t, handle)| {
            if *t == task {
                handle.abort();
                info!(task = task.as_str(), "scheduled task cancelled");
                false
            } else {
                true
            }
        });
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.tasks.iter().any(|(t, _)| *t == task)
    }

    /// Signals shutdown and waits for every task to finish its current run.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for (task, handle) in self.tasks {
            if let Err(e) = handle.await
                && !e.is_cancelled()
            {
                warn!(task = task.as_str(), error = %e, "scheduled task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

pub fn parse_schedule(expr: &str) -> anyhow::Result<Schedule> {
    Schedule::from_str(expr)
        .map_err(|e| anyhow::anyhow!("invalid cron expression {:?}: {}", expr, e))
}

async fn poll_loop(
    poller: Arc<Poller>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let PollOutcome::Completed { observed, events, .. } = poller.poll_once().await {
                    debug!(observed, events = events.len(), "scheduled poll finished");
                }
            }
            _ = shutdown_rx.changed() => {
                debug!("poll task shutting down");
                break;
            }
        }
    }
}

/// Sleeps until each upcoming cron time (local), then runs `job` to completion.
async fn cron_loop<F, Fut>(
    task: Task,
    schedule: Schedule,
    mut shutdown_rx: watch::Receiver<bool>,
    job: F,
) where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    loop {
        let now = chrono::Local::now();
        let Some(next) = schedule.after(&now).next() else {
            warn!(
                task = task.as_str(),
                "cron schedule has no upcoming time; task stopping"
            );
            return;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
        debug!(task = task.as_str(), next = %next, "next scheduled run");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                if let Err(e) = job().await {
                    warn!(task = task.as_str(), error = %e, "scheduled job failed");
                }
            }
            _ = shutdown_rx.changed() => {
                debug!(task = task.as_str(), "task shutting down");
                return;
            }
        }
    }
}
