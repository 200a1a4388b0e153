use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryCourseRepository, InMemoryNotificationSink, InMemoryRosterStore,
};
use crate::routes::with_training_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use training_compliance::config::AppConfig;
use training_compliance::courses::TrainingService;
use training_compliance::error::AppError;
use training_compliance::telemetry;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let courses = Arc::new(InMemoryCourseRepository::default());
    let roster = Arc::new(InMemoryRosterStore::default());
    let notifications = Arc::new(InMemoryNotificationSink::default());
    let training_service = Arc::new(TrainingService::new(courses, roster, notifications));

    let app = with_training_routes(training_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "training compliance tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
