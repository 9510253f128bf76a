use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPatientRepository};
use crate::routes::with_adherence_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use saarthi::config::AppConfig;
use saarthi::error::AppError;
use saarthi::telemetry;
use saarthi::workflows::adherence::AdherenceService;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryPatientRepository::default());
    let adherence_service = Arc::new(AdherenceService::new(repository, config.adherence));

    let app = with_adherence_routes(adherence_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        utc_offset_minutes = config.adherence.calendar.offset_minutes(),
        summary_window_days = config.adherence.summary_window_days,
        "adherence service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
