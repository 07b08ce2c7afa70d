use super::{RuleSettings, SETTINGS_SCHEMA_VERSION};
use serde::Serialize;
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Storage abstraction for reviewer toggles.
pub trait SettingsStore: Send + Sync {
    /// Returns the stored settings, or defaults when nothing usable is stored.
    fn load(&self) -> Result<RuleSettings, SettingsStoreError>;
    fn save(&self, settings: &RuleSettings) -> Result<(), SettingsStoreError>;

    fn reset(&self) -> Result<RuleSettings, SettingsStoreError> {
        let settings = RuleSettings::default();
        self.save(&settings)?;
        Ok(settings)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsStoreError {
    #[error("failed to write settings to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Serialize)]
struct SettingsDocument<'a> {
    version: u32,
    rules: &'a RuleSettings,
}

/// JSON file persistence. Unreadable or corrupt files fall back to defaults.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<RuleSettings, SettingsStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored settings, using defaults");
                return Ok(RuleSettings::default());
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "settings unreadable, using defaults");
                return Ok(RuleSettings::default());
            }
        };

        match decode_document(&raw) {
            Some(settings) => Ok(settings),
            None => {
                warn!(path = %self.path.display(), "settings file is not a JSON object, using defaults");
                Ok(RuleSettings::default())
            }
        }
    }

    fn save(&self, settings: &RuleSettings) -> Result<(), SettingsStoreError> {
        let document = SettingsDocument {
            version: SETTINGS_SCHEMA_VERSION,
            rules: settings,
        };
        let encoded = serde_json::to_string_pretty(&document)?;

        let parent = match self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|source| SettingsStoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
                parent
            }
            None => Path::new("."),
        };

        // Same directory as the target so the rename stays atomic.
        let mut staged =
            tempfile::NamedTempFile::new_in(parent).map_err(|source| SettingsStoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        staged
            .write_all(encoded.as_bytes())
            .map_err(|source| SettingsStoreError::Io {
                path: staged.path().to_path_buf(),
                source,
            })?;
        staged
            .persist(&self.path)
            .map_err(|err| SettingsStoreError::Io {
                path: self.path.clone(),
                source: err.error,
            })?;

        Ok(())
    }
}

/// Accepts the versioned document or a bare legacy flag object.
fn decode_document(raw: &str) -> Option<RuleSettings> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    match (object.get("version"), object.get("rules")) {
        (Some(_), Some(Value::Object(rules))) => Some(RuleSettings::from_raw(rules)),
        _ => Some(RuleSettings::from_raw(object)),
    }
}

/// Process-local store used by tests and when no settings file is configured.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<RuleSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: RuleSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<RuleSettings, SettingsStoreError> {
        self.settings
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| SettingsStoreError::Unavailable("settings mutex poisoned".to_string()))
    }

    fn save(&self, settings: &RuleSettings) -> Result<(), SettingsStoreError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|_| SettingsStoreError::Unavailable("settings mutex poisoned".to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}
