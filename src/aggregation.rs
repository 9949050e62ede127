// Rollup arithmetic: snapshots -> daily report, daily reports -> monthly report.
// Pure functions; fetching, writing and pruning live in report_jobs.

use std::collections::BTreeMap;

use chrono::{
    DateTime, Datelike, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

use crate::models::{ContainerSnapshot, DailyReport, MonthlyReport};

/// Daily uptime counts a snapshot as up only when its raw status starts with "up".
/// This is deliberately narrower than `ContainerState::normalize`, which also treats
/// "restarting" as running; the two can disagree for the same snapshot.
pub fn is_up(raw_status: &str) -> bool {
    raw_status.to_lowercase().starts_with("up")
}

/// Round half up to one decimal place (values are non-negative percentages).
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Adjacent pairs where the earlier snapshot is up and the later one is not.
/// Expects `snapshots` in chronological order.
pub fn count_incidents(snapshots: &[ContainerSnapshot]) -> u32 {
    snapshots
        .windows(2)
        .filter(|pair| is_up(&pair[0].raw_status) && !is_up(&pair[1].raw_status))
        .count() as u32
}

/// Group by container name, keeping each group's input order.
pub fn group_by_name<T, F>(items: Vec<T>, name_of: F) -> BTreeMap<String, Vec<T>>
where
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        groups
            .entry(name_of(&item).to_string())
            .or_default()
            .push(item);
    }
    groups
}

/// One container's day. Returns None for an empty group.
pub fn summarize_day(
    container_name: &str,
    snapshots: &[ContainerSnapshot],
    report_date: NaiveDate,
    generated_at: DateTime<Utc>,
) -> Option<DailyReport> {
    if snapshots.is_empty() {
        return None;
    }
    let total = snapshots.len() as u32;
    let running = snapshots.iter().filter(|s| is_up(&s.raw_status)).count() as u32;
    let uptime = running as f64 * 100.0 / total as f64;

    Some(DailyReport {
        container_name: container_name.to_string(),
        report_date,
        total_snapshots: total,
        running_snapshots: running,
        uptime_percentage: round_one_decimal(uptime),
        incident_count: count_incidents(snapshots),
        generated_at,
    })
}

/// One container's month from its daily rows. Returns None for an empty group.
pub fn summarize_month(
    container_name: &str,
    reports: &[DailyReport],
    year: i32,
    month: u32,
    generated_at: DateTime<Utc>,
) -> Option<MonthlyReport> {
    if reports.is_empty() {
        return None;
    }
    let days = reports.len() as u32;
    let uptime_sum: f64 = reports.iter().map(|r| r.uptime_percentage).sum();
    let total_incidents = reports.iter().map(|r| r.incident_count).sum();
    let days_with_incidents = reports.iter().filter(|r| r.incident_count > 0).count() as u32;

    Some(MonthlyReport {
        container_name: container_name.to_string(),
        report_month: month,
        report_year: year,
        average_uptime_percentage: round_one_decimal(uptime_sum / days as f64),
        total_incidents,
        days_with_incidents,
        total_days_reported: days,
        generated_at,
    })
}

/// Local-time window `[day 00:00:00, day 23:59:59]` as UTC instants.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN);
    let end = day.and_hms_opt(23, 59, 59).unwrap_or(start);
    (local_to_utc(start, true), local_to_utc(end, false))
}

/// Resolve a local wall-clock time; ambiguous times take the widest interpretation
/// and non-existent ones (DST gap) fall back to reading the wall clock as UTC.
fn local_to_utc(naive: NaiveDateTime, earliest: bool) -> DateTime<Utc> {
    let resolved = Local.from_local_datetime(&naive);
    let picked = if earliest {
        resolved.earliest()
    } else {
        resolved.latest()
    };
    picked
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// (year, month) of the calendar month before `today`.
pub fn previous_month(today: NaiveDate) -> (i32, u32) {
    let first = today.with_day(1).unwrap_or(today);
    let prev = first.checked_sub_months(Months::new(1)).unwrap_or(first);
    (prev.year(), prev.month())
}

/// First and last day of a month, or None for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}
