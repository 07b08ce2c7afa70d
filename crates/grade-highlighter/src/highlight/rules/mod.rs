mod chain;

use super::record::GradeRecord;
use super::settings::{RuleSettings, SettingKey};
use chain::RULE_CHAIN;
use serde::{Deserialize, Serialize};

/// Row-level highlight rules, declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKey {
    #[serde(rename = "borderline")]
    Borderline,
    #[serde(rename = "equalTo59")]
    EqualTo59,
    #[serde(rename = "borderlineSecondary")]
    BorderlineSecondary,
    #[serde(rename = "between55and59")]
    Between55And59,
    #[serde(rename = "between50and54")]
    Between50And54,
    #[serde(rename = "incompleteOrContinuing")]
    IncompleteOrContinuing,
    #[serde(rename = "finalMarkZero")]
    FinalMarkZero,
}

impl RuleKey {
    pub const ALL: [RuleKey; 7] = [
        RuleKey::Borderline,
        RuleKey::EqualTo59,
        RuleKey::BorderlineSecondary,
        RuleKey::Between55And59,
        RuleKey::Between50And54,
        RuleKey::IncompleteOrContinuing,
        RuleKey::FinalMarkZero,
    ];

    /// Toggle gating this rule. `EqualTo59` is always on.
    pub fn setting(self) -> Option<SettingKey> {
        match self {
            RuleKey::Borderline => Some(SettingKey::Borderline),
            RuleKey::EqualTo59 => None,
            RuleKey::BorderlineSecondary => Some(SettingKey::BorderlineSecondary),
            RuleKey::Between55And59 => Some(SettingKey::Between55And59),
            RuleKey::Between50And54 => Some(SettingKey::Between50And54),
            RuleKey::IncompleteOrContinuing => Some(SettingKey::IncompleteOrContinue),
            RuleKey::FinalMarkZero => Some(SettingKey::FinalZero),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKey::Borderline => "borderline",
            RuleKey::EqualTo59 => "equalTo59",
            RuleKey::BorderlineSecondary => "borderlineSecondary",
            RuleKey::Between55And59 => "between55and59",
            RuleKey::Between50And54 => "between50and54",
            RuleKey::IncompleteOrContinuing => "incompleteOrContinuing",
            RuleKey::FinalMarkZero => "finalMarkZero",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RuleKey::Borderline => "Borderline total (4,9)",
            RuleKey::EqualTo59 => "Total equal to 59",
            RuleKey::BorderlineSecondary => "Borderline (3,8)",
            RuleKey::Between55And59 => "Total between 55 and 59",
            RuleKey::Between50And54 => "Total between 50 and 54",
            RuleKey::IncompleteOrContinuing => "Incomplete or continuing",
            RuleKey::FinalMarkZero => "Final grade = 0 and is not Absent",
        }
    }

    fn enabled(self, settings: &RuleSettings) -> bool {
        self.setting()
            .map(|key| settings.is_enabled(key))
            .unwrap_or(true)
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every rule that fired for a record, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    fired: Vec<RuleKey>,
}

impl RuleMatch {
    pub fn active(&self) -> Option<RuleKey> {
        self.fired.first().copied()
    }

    pub fn fired(&self) -> &[RuleKey] {
        &self.fired
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Stateless evaluator applying the reviewer's toggles to grade records.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    settings: RuleSettings,
}

impl RuleEngine {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    pub fn matches(&self, record: &GradeRecord) -> RuleMatch {
        if record.is_excluded() {
            return RuleMatch::default();
        }

        let fired = RULE_CHAIN
            .iter()
            .filter(|rule| rule.key.enabled(&self.settings) && (rule.predicate)(record))
            .map(|rule| rule.key)
            .collect();

        RuleMatch { fired }
    }

    /// Highest-priority enabled rule matching `record`.
    pub fn evaluate(&self, record: &GradeRecord) -> Option<RuleKey> {
        if record.is_excluded() {
            return None;
        }

        RULE_CHAIN
            .iter()
            .find(|rule| rule.key.enabled(&self.settings) && (rule.predicate)(record))
            .map(|rule| rule.key)
    }

    pub fn evaluate_all<'a, I>(&self, records: I) -> Vec<Option<RuleKey>>
    where
        I: IntoIterator<Item = &'a GradeRecord>,
    {
        records
            .into_iter()
            .map(|record| self.evaluate(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::chain::{BORDERLINE_SECONDARY_TOTALS, BORDERLINE_TOTALS};
    use super::*;

    fn record(final_mark: &str, total_mark: &str, status: &str) -> GradeRecord {
        GradeRecord::from_cells(final_mark, total_mark, status)
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(RuleSettings::default())
    }

    #[test]
    fn borderline_totals_win_regardless_of_final_mark() {
        let engine = engine();
        for total in BORDERLINE_TOTALS {
            for final_mark in ["0", "35", "", "x"] {
                let record = record(final_mark, &total.to_string(), "ناجح");
                assert_eq!(
                    engine.evaluate(&record),
                    Some(RuleKey::Borderline),
                    "total {total} final {final_mark:?}"
                );
            }
        }
    }

    #[test]
    fn total_99_never_matches() {
        let record = record("0", "99", "غير مكتمل");
        let everything_off = SettingKey::ALL
            .into_iter()
            .fold(RuleSettings::default(), |settings, key| settings.with(key, false));

        assert_eq!(engine().evaluate(&record), None);
        assert!(engine().matches(&record).is_empty());
        assert_eq!(RuleEngine::new(everything_off).evaluate(&record), None);
    }

    #[test]
    fn equal_to_59_outranks_between_55_and_59() {
        let record = record("30", "59", "ناجح");

        let matched = engine().matches(&record);

        assert_eq!(matched.active(), Some(RuleKey::EqualTo59));
        assert_eq!(
            matched.fired(),
            &[RuleKey::EqualTo59, RuleKey::Between55And59]
        );
    }

    #[test]
    fn equal_to_59_ignores_settings() {
        let settings = RuleSettings::default().with(SettingKey::Between55And59, false);
        let record = record("30", "59", "");
        assert_eq!(
            RuleEngine::new(settings).evaluate(&record),
            Some(RuleKey::EqualTo59)
        );
    }

    #[test]
    fn absent_59_falls_through_to_status_rules() {
        let record = record("0", "59", "غائب");
        assert_eq!(engine().evaluate(&record), None);
    }

    #[test]
    fn disabling_a_rule_promotes_the_next_match() {
        let record = record("0", "64", "مستمر");
        assert_eq!(engine().evaluate(&record), Some(RuleKey::Borderline));

        let settings = RuleSettings::default().with(SettingKey::Borderline, false);
        let engine = RuleEngine::new(settings.clone());
        assert_eq!(
            engine.evaluate(&record),
            Some(RuleKey::IncompleteOrContinuing)
        );

        let settings = settings.with(SettingKey::IncompleteOrContinue, false);
        assert_eq!(
            RuleEngine::new(settings).evaluate(&record),
            Some(RuleKey::FinalMarkZero)
        );
    }

    #[test]
    fn secondary_borderline_and_ranges() {
        let engine = engine();
        for total in BORDERLINE_SECONDARY_TOTALS {
            assert_eq!(
                engine.evaluate(&record("10", &total.to_string(), "")),
                Some(RuleKey::BorderlineSecondary)
            );
        }
        assert_eq!(
            engine.evaluate(&record("10", "55", "")),
            Some(RuleKey::Between55And59)
        );
        assert_eq!(
            engine.evaluate(&record("10", "50", "")),
            Some(RuleKey::Between50And54)
        );
        assert_eq!(
            engine.evaluate(&record("10", "54", "")),
            Some(RuleKey::Between50And54)
        );
        assert_eq!(engine.evaluate(&record("10", "49", "")), None);
        assert_eq!(engine.evaluate(&record("10", "60", "")), None);
    }

    #[test]
    fn range_rules_skip_absent_records() {
        let engine = engine();
        assert_eq!(engine.evaluate(&record("10", "57", "غياب")), None);
        assert_eq!(engine.evaluate(&record("10", "52", "غائب")), None);
    }

    #[test]
    fn incomplete_status_counts_as_absent_for_range_rules() {
        // "غير مكتمل" contains the single-letter absence marker
        let record = record("10", "57", "غير مكتمل");
        assert_eq!(
            engine().evaluate(&record),
            Some(RuleKey::IncompleteOrContinuing)
        );
    }

    #[test]
    fn final_zero_distinguishes_absence() {
        let engine = engine();
        assert_eq!(
            engine.evaluate(&record("0", "40", "12345")),
            Some(RuleKey::FinalMarkZero)
        );
        assert_eq!(
            engine.matches(&record("0", "40", "12345")).fired(),
            &[RuleKey::FinalMarkZero]
        );
        assert_eq!(engine.evaluate(&record("0", "40", "غائب")), None);
    }

    #[test]
    fn unparseable_marks_match_nothing_numeric() {
        let engine = engine();
        assert_eq!(engine.evaluate(&record("-", "-", "ناجح")), None);
        assert_eq!(
            engine.evaluate(&record("-", "-", "مستمر")),
            Some(RuleKey::IncompleteOrContinuing)
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let engine = engine();
        let records = vec![
            record("0", "64", ""),
            record("12", "59", ""),
            record("0", "40", ""),
            record("80", "99", ""),
        ];

        let first = engine.evaluate_all(&records);
        let second = engine.evaluate_all(&records);

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Some(RuleKey::Borderline),
                Some(RuleKey::EqualTo59),
                Some(RuleKey::FinalMarkZero),
                None,
            ]
        );
    }

    #[test]
    fn every_gated_rule_maps_to_a_distinct_setting() {
        let gated: Vec<_> = RuleKey::ALL
            .into_iter()
            .filter_map(RuleKey::setting)
            .collect();
        assert_eq!(gated.len(), 6);
        assert!(!gated.contains(&SettingKey::DistH));
        assert!(!gated.contains(&SettingKey::DistMax));
    }
}
