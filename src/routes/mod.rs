// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::models::ContainerEvent;
use crate::poller::Poller;
use crate::ports::{DailyReportStore, MonthlyReportStore};
use crate::report_jobs::{DailyReportJob, MonthlyReportJob};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) poller: Arc<Poller>,
    pub(crate) daily_job: Arc<DailyReportJob>,
    pub(crate) monthly_job: Arc<MonthlyReportJob>,
    pub(crate) daily_reports: Arc<dyn DailyReportStore>,
    pub(crate) monthly_reports: Arc<dyn MonthlyReportStore>,
    pub(crate) events_tx: broadcast::Sender<ContainerEvent>,
}

pub fn app(
    poller: Arc<Poller>,
    daily_job: Arc<DailyReportJob>,
    monthly_job: Arc<MonthlyReportJob>,
    daily_reports: Arc<dyn DailyReportStore>,
    monthly_reports: Arc<dyn MonthlyReportStore>,
    events_tx: broadcast::Sender<ContainerEvent>,
) -> Router {
    let state = AppState {
        poller,
        daily_job,
        monthly_job,
        daily_reports,
        monthly_reports,
        events_tx,
    };
    Router::new()
        .route("/", get(|| async { "homelab-monitor is running" }))
        .route("/version", get(http::version_handler))
        .route("/api/containers", get(http::current_containers))
        .route("/api/containers/history", get(http::history))
        .route("/api/containers/history/{name}", get(http::history_by_name))
        .route("/api/containers/restart/{name}", post(http::restart_container))
        .route("/api/containers/stop/{name}", post(http::stop_container))
        .route("/api/containers/poll", post(http::trigger_poll))
        .route("/api/reports", get(http::daily_reports))
        .route("/api/reports/date/{date}", get(http::daily_reports_by_date))
        .route(
            "/api/reports/container/{name}",
            get(http::daily_reports_by_container),
        )
        .route("/api/reports/generate", post(http::generate_daily))
        .route("/api/reports/generate/monthly", post(http::generate_monthly))
        .route(
            "/api/reports/monthly/{year}/{month}",
            get(http::monthly_reports),
        )
        .route("/api/reports/monthly/{year}", get(http::monthly_reports_by_year))
        .route(
            "/api/reports/monthly/container/{name}",
            get(http::monthly_reports_by_container),
        )
        .route("/ws/events", get(ws::ws_events))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
