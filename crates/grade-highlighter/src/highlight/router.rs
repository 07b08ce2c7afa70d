use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::palette::{legend, LegendEntry};
use super::scan::{HighlightReport, ScanInput, ScanSummary};
use super::service::{HighlightService, HighlightServiceError};
use super::settings::{RuleSettings, SettingsStore};

/// Router exposing highlight passes and reviewer settings.
pub fn highlight_router<S>(service: Arc<HighlightService<S>>) -> Router
where
    S: SettingsStore + 'static,
{
    Router::new()
        .route("/api/v1/highlights/scan", post(scan_handler::<S>))
        .route(
            "/api/v1/settings",
            get(settings_handler::<S>).put(update_settings_handler::<S>),
        )
        .route("/api/v1/settings/reset", post(reset_settings_handler::<S>))
        .route("/api/v1/legend", get(legend_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(flatten)]
    pub input: ScanInput,
    #[serde(default)]
    pub settings: Option<RuleSettings>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub report: HighlightReport,
    pub summary: ScanSummary,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: RuleSettings,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

pub(crate) async fn scan_handler<S>(
    State(service): State<Arc<HighlightService<S>>>,
    Json(request): Json<ScanRequest>,
) -> Response
where
    S: SettingsStore + 'static,
{
    match blocking(service, move |service| {
        service.scan(&request.input, request.settings)
    })
    .await
    {
        Ok(report) => {
            let summary = report.summary();
            (StatusCode::OK, Json(ScanResponse { report, summary })).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn settings_handler<S>(State(service): State<Arc<HighlightService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    match blocking(service, |service| service.settings()).await {
        Ok(settings) => settings_response(settings, Vec::new()),
        Err(response) => response,
    }
}

pub(crate) async fn update_settings_handler<S>(
    State(service): State<Arc<HighlightService<S>>>,
    Json(overrides): Json<BTreeMap<String, bool>>,
) -> Response
where
    S: SettingsStore + 'static,
{
    match blocking(service, move |service| service.update_settings(&overrides)).await {
        Ok(update) => settings_response(update.settings, update.ignored),
        Err(response) => response,
    }
}

pub(crate) async fn reset_settings_handler<S>(
    State(service): State<Arc<HighlightService<S>>>,
) -> Response
where
    S: SettingsStore + 'static,
{
    match blocking(service, |service| service.reset_settings()).await {
        Ok(settings) => settings_response(settings, Vec::new()),
        Err(response) => response,
    }
}

pub(crate) async fn legend_handler() -> Json<Vec<LegendEntry>> {
    Json(legend())
}

/// Stores may touch the filesystem, so service calls run off the async workers.
async fn blocking<S, T, F>(service: Arc<HighlightService<S>>, task: F) -> Result<T, Response>
where
    S: SettingsStore + 'static,
    T: Send + 'static,
    F: FnOnce(&HighlightService<S>) -> Result<T, HighlightServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || task(&service)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(error_response(error.to_string())),
        Err(join_error) => Err(error_response(join_error.to_string())),
    }
}

fn settings_response(settings: RuleSettings, ignored: Vec<String>) -> Response {
    (StatusCode::OK, Json(SettingsResponse { settings, ignored })).into_response()
}

fn error_response(message: String) -> Response {
    let payload = json!({
        "error": message,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
