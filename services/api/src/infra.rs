use grade_highlighter::config::AppConfig;
use grade_highlighter::highlight::FileSettingsStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Settings store at the CLI override, falling back to the configured path.
pub(crate) fn settings_store(config: &AppConfig, path: Option<PathBuf>) -> FileSettingsStore {
    FileSettingsStore::new(path.unwrap_or_else(|| config.highlight.settings_path.clone()))
}
