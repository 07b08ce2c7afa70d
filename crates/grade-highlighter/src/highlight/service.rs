use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::scan::{HighlightReport, HighlightScanner, ScanInput};
use super::settings::{RuleSettings, SettingsStore, SettingsStoreError};

/// Service pairing the settings store with highlight passes.
///
/// Writes go through `write_lock` so a load-modify-save cycle never
/// interleaves with another update.
pub struct HighlightService<S> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S> HighlightService<S>
where
    S: SettingsStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> Result<RuleSettings, HighlightServiceError> {
        Ok(self.store.load()?)
    }

    /// Merges toggles into the stored settings and persists the result.
    pub fn update_settings(
        &self,
        overrides: &BTreeMap<String, bool>,
    ) -> Result<SettingsUpdate, HighlightServiceError> {
        let _guard = self.exclusive()?;
        let mut settings = self.store.load()?;
        let ignored = settings.apply_overrides(overrides);
        if !ignored.is_empty() {
            warn!(?ignored, "ignoring unknown highlight settings");
        }

        self.store.save(&settings)?;
        info!(settings = ?settings.to_map(), "highlight settings updated");

        Ok(SettingsUpdate { settings, ignored })
    }

    pub fn reset_settings(&self) -> Result<RuleSettings, HighlightServiceError> {
        let _guard = self.exclusive()?;
        let settings = self.store.reset()?;
        info!("highlight settings reset to defaults");
        Ok(settings)
    }

    /// Runs one pass, preferring explicit settings over the stored ones.
    pub fn scan(
        &self,
        input: &ScanInput,
        settings: Option<RuleSettings>,
    ) -> Result<HighlightReport, HighlightServiceError> {
        let settings = match settings {
            Some(settings) => settings,
            None => self.store.load()?,
        };
        Ok(HighlightScanner::new(settings).scan(input))
    }

    fn exclusive(&self) -> Result<MutexGuard<'_, ()>, HighlightServiceError> {
        self.write_lock.lock().map_err(|_| {
            SettingsStoreError::Unavailable("settings write lock poisoned".to_string()).into()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub settings: RuleSettings,
    pub ignored: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum HighlightServiceError {
    #[error(transparent)]
    Store(#[from] SettingsStoreError),
}
