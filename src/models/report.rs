// Availability rollups: one daily row per container per date, one monthly row per container per month

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub container_name: String,
    pub report_date: NaiveDate,
    pub total_snapshots: u32,
    /// Always <= total_snapshots.
    pub running_snapshots: u32,
    /// 0-100, one decimal place.
    pub uptime_percentage: f64,
    pub incident_count: u32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub container_name: String,
    /// 1-12.
    pub report_month: u32,
    pub report_year: i32,
    pub average_uptime_percentage: f64,
    pub total_incidents: u32,
    pub days_with_incidents: u32,
    pub total_days_reported: u32,
    pub generated_at: DateTime<Utc>,
}
