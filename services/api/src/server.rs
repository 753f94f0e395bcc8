use crate::cli::ServeArgs;
use crate::infra::{load_collection, load_preferences, AppState, InMemoryTastingRepository};
use crate::routes::with_schedule_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dram_planner::config::{AppConfig, PlannerConfig};
use dram_planner::error::AppError;
use dram_planner::telemetry;
use dram_planner::workflows::tasting::{ServiceError, TastingScheduleService, UserId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(seeded_repository(&config.planner)?);
    let service = Arc::new(
        TastingScheduleService::new(repository).with_timeout(config.planner.generation_timeout),
    );

    let app = with_schedule_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dram planner ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Loads the configured collection for the default user, if one is configured.
fn seeded_repository(planner: &PlannerConfig) -> Result<InMemoryTastingRepository, AppError> {
    let repository = InMemoryTastingRepository::default();
    let Some(path) = planner.collection_file.as_deref() else {
        info!("no collection file configured; repository starts empty");
        return Ok(repository);
    };

    let items = load_collection(path)?;
    let preferences = load_preferences(planner.preferences_file.as_deref())?;
    let user = UserId::new(planner.default_user.clone());
    info!(user = %user, bottles = items.len(), path = %path.display(), "collection loaded");
    repository
        .seed(user, items, preferences)
        .map_err(ServiceError::from)?;
    Ok(repository)
}
