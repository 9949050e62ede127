use anyhow::Result;
use homelab_monitor::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(name = version::NAME, version = version::VERSION, "starting");

    let docker_repo = Arc::new(docker_repo::DockerRepo::connect(
        app_config.docker.host.as_deref(),
    )?);
    let history_repo = Arc::new(
        history_repo::HistoryRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
        )
        .await?,
    );
    history_repo.init().await?;

    let mut bus = events::EventBus::new(app_config.events.broadcast_capacity);
    if let Some(url) = &app_config.events.webhook_url {
        bus = bus.with_webhook(
            url,
            Duration::from_millis(app_config.events.webhook_timeout_ms),
        )?;
        tracing::info!(url = %url, topic = %app_config.events.topic, "event webhook enabled");
    }
    let bus = Arc::new(bus);

    let poller = Arc::new(poller::Poller::new(
        docker_repo,
        history_repo.clone(),
        bus.clone(),
        app_config.events.topic.clone(),
    ));
    let daily_job = Arc::new(report_jobs::DailyReportJob::new(
        history_repo.clone(),
        history_repo.clone(),
    ));
    let monthly_job = Arc::new(report_jobs::MonthlyReportJob::new(
        history_repo.clone(),
        history_repo.clone(),
    ));

    let scheduler = scheduler::Scheduler::start(
        poller.clone(),
        daily_job.clone(),
        monthly_job.clone(),
        &scheduler::SchedulerConfig {
            poll_interval_ms: app_config.monitoring.poll_interval_ms,
            daily_schedule: app_config.monitoring.daily_report_schedule.clone(),
            monthly_schedule: app_config.monitoring.monthly_report_schedule.clone(),
        },
    )?;

    let app = routes::app(
        poller,
        daily_job,
        monthly_job,
        history_repo.clone(),
        history_repo,
        bus.sender(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Received shutdown signal");
        })
        .await?;

    scheduler.stop().await;
    Ok(())
}
