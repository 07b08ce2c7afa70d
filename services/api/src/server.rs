use crate::cli::ServeArgs;
use crate::infra::{settings_store, AppState};
use crate::routes::with_highlight_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grade_highlighter::config::AppConfig;
use grade_highlighter::error::AppError;
use grade_highlighter::highlight::HighlightService;
use grade_highlighter::telemetry;
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

    let store = settings_store(&config, args.settings.take());
    info!(path = %store.path().display(), "using highlight settings file");
    let service = Arc::new(HighlightService::new(Arc::new(store)));

    let app = with_highlight_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "grade highlighter ready");

    axum::serve(listener, app).await?;
    Ok(())
}
