// REST handlers: live containers, snapshot history, commands, daily/monthly reports

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::AppState;
use crate::models::{ContainerSnapshot, DailyReport, MonthlyReport};
use crate::poller::{DEFAULT_HISTORY_HOURS, history_since};
use crate::ports::InventoryError;
use crate::version::{NAME, VERSION};

/// Handler failure rendered as a plain-text body.
pub(super) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, error = %self.message, "request failed");
        (self.status, self.message).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    hours: Option<i64>,
}

impl HistoryParams {
    /// Window in hours; a value whose window cannot be computed is the caller's fault.
    fn hours(&self) -> Result<i64, ApiError> {
        let hours = self.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
        history_since(hours, Utc::now()).map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(hours)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/containers: live inventory, including stopped containers.
pub(super) async fn current_containers(
    State(state): State<AppState>,
) -> ApiResult<Vec<ContainerSnapshot>> {
    Ok(Json(state.poller.current_containers().await?))
}

/// GET /api/containers/history?hours=24
pub(super) async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Vec<ContainerSnapshot>> {
    Ok(Json(state.poller.recent_history(params.hours()?).await?))
}

/// GET /api/containers/history/{name}?hours=24
pub(super) async fn history_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Vec<ContainerSnapshot>> {
    Ok(Json(
        state
            .poller
            .recent_history_for(&name, params.hours()?)
            .await?,
    ))
}

// Commands answer the same way whether or not the container existed; the outcome is logged.
pub(super) async fn restart_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> String {
    state.poller.restart(&name).await;
    format!("Restart triggered for: {}", name)
}

pub(super) async fn stop_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> String {
    state.poller.stop(&name).await;
    format!("Stop triggered for: {}", name)
}

/// POST /api/containers/poll: runs one observation cycle in the background.
pub(super) async fn trigger_poll(State(state): State<AppState>) -> &'static str {
    let poller = state.poller.clone();
    tokio::spawn(async move {
        let outcome = poller.poll_once().await;
        info!(?outcome, "manual poll finished");
    });
    "Poll Triggered"
}

/// GET /api/reports?start=YYYY-MM-DD&end=YYYY-MM-DD
pub(super) async fn daily_reports(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<DailyReport>> {
    Ok(Json(
        state
            .daily_reports
            .find_by_report_date_between(range.start, range.end)
            .await?,
    ))
}

pub(super) async fn daily_reports_by_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Vec<DailyReport>> {
    Ok(Json(state.daily_reports.find_by_report_date(date).await?))
}

pub(super) async fn daily_reports_by_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<DailyReport>> {
    Ok(Json(
        state
            .daily_reports
            .find_by_container_name_and_report_date_between(&name, range.start, range.end)
            .await?,
    ))
}

/// POST /api/reports/generate: daily job for yesterday, in the background.
pub(super) async fn generate_daily(State(state): State<AppState>) -> &'static str {
    let job = state.daily_job.clone();
    tokio::spawn(async move {
        match job.run().await {
            Ok(outcome) => info!(?outcome, "manual daily report finished"),
            Err(e) => warn!(error = %e, "manual daily report failed"),
        }
    });
    "Report Generation Triggered"
}

/// POST /api/reports/generate/monthly: monthly job for last month, in the background.
pub(super) async fn generate_monthly(State(state): State<AppState>) -> &'static str {
    let job = state.monthly_job.clone();
    tokio::spawn(async move {
        match job.run().await {
            Ok(outcome) => info!(?outcome, "manual monthly report finished"),
            Err(e) => warn!(error = %e, "manual monthly report failed"),
        }
    });
    "Monthly Report Generation Triggered"
}

pub(super) async fn monthly_reports(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Vec<MonthlyReport>> {
    Ok(Json(
        state
            .monthly_reports
            .find_by_report_month_and_report_year(month, year)
            .await?,
    ))
}

pub(super) async fn monthly_reports_by_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> ApiResult<Vec<MonthlyReport>> {
    Ok(Json(
        state
            .monthly_reports
            .find_by_report_year_order_by_report_month(year)
            .await?,
    ))
}

pub(super) async fn monthly_reports_by_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Vec<MonthlyReport>> {
    Ok(Json(state.monthly_reports.find_by_container_name(&name).await?))
}
