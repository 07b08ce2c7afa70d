use super::distribution::DistributionFlagKind;
use super::rules::RuleKey;
use super::settings::SettingKey;
use serde::Serialize;

/// Anything the driver may need to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum HighlightKey {
    Rule(RuleKey),
    Distribution(DistributionFlagKind),
}

impl HighlightKey {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightKey::Rule(rule) => rule.as_str(),
            HighlightKey::Distribution(kind) => kind.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HighlightKey::Rule(rule) => rule.label(),
            HighlightKey::Distribution(kind) => kind.label(),
        }
    }

    pub fn setting(self) -> Option<SettingKey> {
        match self {
            HighlightKey::Rule(rule) => rule.setting(),
            HighlightKey::Distribution(kind) => Some(kind.setting()),
        }
    }
}

impl From<RuleKey> for HighlightKey {
    fn from(value: RuleKey) -> Self {
        Self::Rule(value)
    }
}

impl From<DistributionFlagKind> for HighlightKey {
    fn from(value: DistributionFlagKind) -> Self {
        Self::Distribution(value)
    }
}

/// Fill and outline colors for a highlighted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDescriptor {
    pub fill_color: &'static str,
    pub outline_color: &'static str,
}

impl StyleDescriptor {
    const fn new(fill_color: &'static str, outline_color: &'static str) -> Self {
        Self {
            fill_color,
            outline_color,
        }
    }

    /// CSS `outline` shorthand the highlight is drawn with.
    pub fn outline_css(&self) -> String {
        format!("2px solid {}", self.outline_color)
    }
}

const ROW_OUTLINE: &str = "rgba(18, 219, 14, 0.95)";
const STATUS_OUTLINE: &str = "rgba(247, 9, 9, 0.95)";
const STATUS_FILL: &str = "rgba(249, 245, 3, 0.18)";

const PALETTE: [(HighlightKey, StyleDescriptor); 9] = [
    (
        HighlightKey::Rule(RuleKey::Borderline),
        StyleDescriptor::new("rgba(0, 13, 255, 0.35)", ROW_OUTLINE),
    ),
    (
        HighlightKey::Rule(RuleKey::EqualTo59),
        StyleDescriptor::new("rgba(255, 0, 0, 0.70)", ROW_OUTLINE),
    ),
    (
        HighlightKey::Rule(RuleKey::BorderlineSecondary),
        StyleDescriptor::new("rgba(0, 13, 255, 0.15)", ROW_OUTLINE),
    ),
    (
        HighlightKey::Rule(RuleKey::Between55And59),
        StyleDescriptor::new("rgba(255, 0, 0, 0.50)", ROW_OUTLINE),
    ),
    (
        HighlightKey::Rule(RuleKey::Between50And54),
        StyleDescriptor::new("rgba(255, 0, 0, 0.30)", ROW_OUTLINE),
    ),
    (
        HighlightKey::Rule(RuleKey::IncompleteOrContinuing),
        StyleDescriptor::new(STATUS_FILL, STATUS_OUTLINE),
    ),
    (
        HighlightKey::Rule(RuleKey::FinalMarkZero),
        StyleDescriptor::new(STATUS_FILL, STATUS_OUTLINE),
    ),
    (
        HighlightKey::Distribution(DistributionFlagKind::HighAbsenceRatio),
        StyleDescriptor::new("rgba(255, 235, 59, 0.25)", "rgba(255, 193, 7, 0.8)"),
    ),
    (
        HighlightKey::Distribution(DistributionFlagKind::MaxNonAbsenceBucket),
        StyleDescriptor::new("rgba(25, 135, 84, 0.18)", "rgba(25, 135, 84, 0.65)"),
    ),
];

/// Looks up the style for `key`; `None` means leave the element unstyled.
pub fn style_for(key: impl Into<HighlightKey>) -> Option<StyleDescriptor> {
    let key = key.into();
    PALETTE
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, style)| *style)
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting: Option<SettingKeyView>,
    pub style: StyleDescriptor,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingKeyView {
    pub key: &'static str,
    pub label: &'static str,
}

/// One entry per paintable key, in priority order.
pub fn legend() -> Vec<LegendEntry> {
    PALETTE
        .iter()
        .map(|(key, style)| LegendEntry {
            key: key.as_str(),
            label: key.label(),
            setting: key.setting().map(|setting| SettingKeyView {
                key: setting.as_str(),
                label: setting.label(),
            }),
            style: *style,
        })
        .collect()
}
