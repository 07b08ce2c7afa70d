//! Reviewer-facing toggles for each highlight rule.
//!
//! Persisted settings have drifted across releases (`borderlineF1`,
//! `between55and58`), so every externally supplied key goes through
//! [`SettingKey::parse`], which resolves legacy aliases to the canonical key.

mod store;

pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore, SettingsStoreError};

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Version tag written alongside persisted settings.
pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

/// Canonical toggle keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    Borderline,
    BorderlineSecondary,
    Between55And59,
    Between50And54,
    IncompleteOrContinue,
    FinalZero,
    DistH,
    DistMax,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::Borderline,
        SettingKey::BorderlineSecondary,
        SettingKey::Between55And59,
        SettingKey::Between50And54,
        SettingKey::IncompleteOrContinue,
        SettingKey::FinalZero,
        SettingKey::DistH,
        SettingKey::DistMax,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Borderline => "borderline",
            SettingKey::BorderlineSecondary => "borderlineSecondary",
            SettingKey::Between55And59 => "between55and59",
            SettingKey::Between50And54 => "between50and54",
            SettingKey::IncompleteOrContinue => "incompleteOrContinue",
            SettingKey::FinalZero => "finalZero",
            SettingKey::DistH => "distH",
            SettingKey::DistMax => "distMax",
        }
    }

    /// Resolves a canonical key or one of its legacy aliases.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::canonical(raw).or_else(|| Self::alias(raw))
    }

    fn canonical(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }

    fn alias(raw: &str) -> Option<Self> {
        match raw {
            "borderlineF1" => Some(SettingKey::BorderlineSecondary),
            "between55and58" => Some(SettingKey::Between55And59),
            _ => None,
        }
    }

    /// Toggle caption shown to reviewers.
    pub fn label(self) -> &'static str {
        match self {
            SettingKey::Borderline => "Borderline totals (4,9)",
            SettingKey::BorderlineSecondary => "Borderline totals (3,8)",
            SettingKey::Between55And59 => "Total 55-59",
            SettingKey::Between50And54 => "Total 50-54",
            SettingKey::IncompleteOrContinue => "Incomplete / Continuing",
            SettingKey::FinalZero => "Final = 0 (not absent)",
            SettingKey::DistH => "Distribution: هـ > 10%",
            SettingKey::DistMax => "Distribution: highest grade",
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enabled flags per toggle. Keys never set read as enabled.
#[derive(Debug, Clone, Default)]
pub struct RuleSettings {
    flags: BTreeMap<SettingKey, bool>,
}

impl PartialEq for RuleSettings {
    fn eq(&self, other: &Self) -> bool {
        self.to_map() == other.to_map()
    }
}

impl Eq for RuleSettings {}

impl RuleSettings {
    pub fn is_enabled(&self, key: SettingKey) -> bool {
        self.flags.get(&key).copied().unwrap_or(true)
    }

    pub fn set(&mut self, key: SettingKey, enabled: bool) {
        self.flags.insert(key, enabled);
    }

    pub fn with(mut self, key: SettingKey, enabled: bool) -> Self {
        self.set(key, enabled);
        self
    }

    /// Builds settings from an untyped key/value map, as read from storage.
    ///
    /// Alias keys are applied first so a canonical key present in the same
    /// document takes precedence. Unknown keys and values that are neither
    /// booleans nor numbers are ignored.
    pub fn from_raw(raw: &serde_json::Map<String, Value>) -> Self {
        let mut settings = Self::default();
        let (canonical, aliased): (Vec<_>, Vec<_>) = raw
            .iter()
            .filter_map(|(name, value)| {
                let key = SettingKey::parse(name)?;
                let enabled = flag_value(value)?;
                Some((SettingKey::canonical(name).is_some(), key, enabled))
            })
            .partition(|(is_canonical, _, _)| *is_canonical);

        for (_, key, enabled) in aliased.into_iter().chain(canonical) {
            settings.set(key, enabled);
        }
        settings
    }

    /// Merges a partial set of toggles, returning the names that matched no key.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, bool>) -> Vec<String> {
        let mut ignored = Vec::new();
        for (name, enabled) in overrides {
            match SettingKey::parse(name) {
                Some(key) => self.set(key, *enabled),
                None => ignored.push(name.clone()),
            }
        }
        ignored
    }

    /// Every canonical key with its effective value.
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        SettingKey::ALL
            .into_iter()
            .map(|key| (key.as_str(), self.is_enabled(key)))
            .collect()
    }
}

fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

impl Serialize for RuleSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RuleSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn missing_keys_default_to_enabled() {
        let settings = RuleSettings::default();
        assert!(SettingKey::ALL.iter().all(|key| settings.is_enabled(*key)));
    }

    #[test]
    fn legacy_aliases_resolve_to_canonical_keys() {
        let settings = RuleSettings::from_raw(&raw(json!({
            "borderlineF1": false,
            "between55and58": false,
        })));

        assert!(!settings.is_enabled(SettingKey::BorderlineSecondary));
        assert!(!settings.is_enabled(SettingKey::Between55And59));
        assert!(settings.is_enabled(SettingKey::Borderline));
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let settings = RuleSettings::from_raw(&raw(json!({
            "between55and59": true,
            "between55and58": false,
        })));
        assert!(settings.is_enabled(SettingKey::Between55And59));
    }

    #[test]
    fn unknown_keys_and_odd_values_are_ignored() {
        let settings = RuleSettings::from_raw(&raw(json!({
            "somethingElse": false,
            "distH": "nope",
            "distMax": 0,
        })));
        assert!(settings.is_enabled(SettingKey::DistH));
        assert!(!settings.is_enabled(SettingKey::DistMax));
    }

    #[test]
    fn apply_overrides_reports_unknown_names() {
        let mut settings = RuleSettings::default();
        let overrides = BTreeMap::from([
            ("finalZero".to_string(), false),
            ("bogus".to_string(), false),
        ]);

        let ignored = settings.apply_overrides(&overrides);

        assert_eq!(ignored, vec!["bogus".to_string()]);
        assert!(!settings.is_enabled(SettingKey::FinalZero));
    }

    #[test]
    fn serializes_every_canonical_key() {
        let settings = RuleSettings::default().with(SettingKey::DistH, false);
        let value = serde_json::to_value(&settings).expect("serializes");

        assert_eq!(value.as_object().map(|map| map.len()), Some(8));
        assert_eq!(value["distH"], json!(false));
        assert_eq!(value["borderlineSecondary"], json!(true));

        let restored: RuleSettings = serde_json::from_value(value).expect("deserializes");
        assert_eq!(restored, settings);
    }
}
