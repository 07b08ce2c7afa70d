use super::settings::{RuleSettings, SettingKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Share of absences above which the `هـ` bucket is flagged.
pub const ABSENCE_RATIO_THRESHOLD: f64 = 0.10;

/// Grade buckets of the distribution widget, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeBucket {
    #[serde(rename = "أ+")]
    APlus,
    #[serde(rename = "أ")]
    A,
    #[serde(rename = "ب+")]
    BPlus,
    #[serde(rename = "ب")]
    B,
    #[serde(rename = "ج+")]
    CPlus,
    #[serde(rename = "ج")]
    C,
    #[serde(rename = "د+")]
    DPlus,
    #[serde(rename = "د")]
    D,
    #[serde(rename = "هـ")]
    H,
    #[serde(rename = "غ")]
    Absent,
    #[serde(rename = "ح")]
    Deprived,
    #[serde(rename = "ع")]
    Excused,
}

impl GradeBucket {
    pub const ALL: [GradeBucket; 12] = [
        GradeBucket::APlus,
        GradeBucket::A,
        GradeBucket::BPlus,
        GradeBucket::B,
        GradeBucket::CPlus,
        GradeBucket::C,
        GradeBucket::DPlus,
        GradeBucket::D,
        GradeBucket::H,
        GradeBucket::Absent,
        GradeBucket::Deprived,
        GradeBucket::Excused,
    ];

    /// The bucket whose ratio is checked and which never competes for the maximum.
    pub const ABSENCE: GradeBucket = GradeBucket::H;

    /// Presence of this bucket's counter marks the widget as rendered.
    pub const ANCHOR: GradeBucket = GradeBucket::APlus;

    pub fn label(self) -> &'static str {
        match self {
            GradeBucket::APlus => "أ+",
            GradeBucket::A => "أ",
            GradeBucket::BPlus => "ب+",
            GradeBucket::B => "ب",
            GradeBucket::CPlus => "ج+",
            GradeBucket::C => "ج",
            GradeBucket::DPlus => "د+",
            GradeBucket::D => "د",
            GradeBucket::H => "هـ",
            GradeBucket::Absent => "غ",
            GradeBucket::Deprived => "ح",
            GradeBucket::Excused => "ع",
        }
    }

    /// Counter element id on the host page.
    pub fn element_id(self) -> &'static str {
        match self {
            GradeBucket::APlus => "myFrm:a_plus",
            GradeBucket::A => "myFrm:a",
            GradeBucket::BPlus => "myFrm:b_plus",
            GradeBucket::B => "myFrm:b",
            GradeBucket::CPlus => "myFrm:g_plus",
            GradeBucket::C => "myFrm:g",
            GradeBucket::DPlus => "myFrm:d_plus",
            GradeBucket::D => "myFrm:d",
            GradeBucket::H => "myFrm:h",
            GradeBucket::Absent => "myFrm:gaen",
            GradeBucket::Deprived => "myFrm:hh",
            GradeBucket::Excused => "myFrm:ean",
        }
    }

    /// Matches either the bucket label or its element id.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.label() == trimmed || bucket.element_id() == trimmed)
    }
}

impl std::fmt::Display for GradeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Counter values for one pass. A bucket that is present with `None` had a
/// counter whose text carried no digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionCounts {
    pub counts: BTreeMap<GradeBucket, Option<u64>>,
    pub total_students: Option<u64>,
}

impl DistributionCounts {
    pub fn new(total_students: Option<u64>) -> Self {
        Self {
            counts: BTreeMap::new(),
            total_students,
        }
    }

    pub fn with_count(mut self, bucket: GradeBucket, count: u64) -> Self {
        self.counts.insert(bucket, Some(count));
        self
    }

    pub fn insert(&mut self, bucket: GradeBucket, count: Option<u64>) {
        self.counts.insert(bucket, count);
    }

    pub fn count(&self, bucket: GradeBucket) -> Option<u64> {
        self.counts.get(&bucket).copied().flatten()
    }

    pub fn contains(&self, bucket: GradeBucket) -> bool {
        self.counts.contains_key(&bucket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistributionFlagKind {
    #[serde(rename = "highAbsenceRatio")]
    HighAbsenceRatio,
    #[serde(rename = "maxNonAbsenceBucket")]
    MaxNonAbsenceBucket,
}

impl DistributionFlagKind {
    pub fn setting(self) -> SettingKey {
        match self {
            DistributionFlagKind::HighAbsenceRatio => SettingKey::DistH,
            DistributionFlagKind::MaxNonAbsenceBucket => SettingKey::DistMax,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistributionFlagKind::HighAbsenceRatio => "highAbsenceRatio",
            DistributionFlagKind::MaxNonAbsenceBucket => "maxNonAbsenceBucket",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistributionFlagKind::HighAbsenceRatio => "هـ above 10% of students",
            DistributionFlagKind::MaxNonAbsenceBucket => "Most frequent grade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionFlag {
    pub bucket: GradeBucket,
    pub kind: DistributionFlagKind,
}

/// Flags skewed grade distributions.
#[derive(Debug, Clone, Default)]
pub struct DistributionAnalyzer {
    settings: RuleSettings,
}

impl DistributionAnalyzer {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }

    /// Returns up to two flags. An unknown or zero student total disables
    /// the analysis for this pass.
    pub fn analyze(&self, counts: &DistributionCounts) -> Vec<DistributionFlag> {
        let total = match counts.total_students {
            Some(total) if total > 0 => total,
            _ => return Vec::new(),
        };

        let mut flags = Vec::new();

        if self.settings.is_enabled(SettingKey::DistH) {
            if let Some(absences) = counts.count(GradeBucket::ABSENCE) {
                if absences as f64 / total as f64 > ABSENCE_RATIO_THRESHOLD {
                    flags.push(DistributionFlag {
                        bucket: GradeBucket::ABSENCE,
                        kind: DistributionFlagKind::HighAbsenceRatio,
                    });
                }
            }
        }

        if self.settings.is_enabled(SettingKey::DistMax) {
            if let Some(bucket) = max_non_absence_bucket(counts) {
                flags.push(DistributionFlag {
                    bucket,
                    kind: DistributionFlagKind::MaxNonAbsenceBucket,
                });
            }
        }

        flags
    }
}

/// First bucket in display order holding the strictly greatest count.
fn max_non_absence_bucket(counts: &DistributionCounts) -> Option<GradeBucket> {
    let mut best: Option<(GradeBucket, u64)> = None;

    for bucket in GradeBucket::ALL {
        if bucket == GradeBucket::ABSENCE {
            continue;
        }
        let Some(count) = counts.count(bucket) else {
            continue;
        };
        if best.map_or(true, |(_, current)| count > current) {
            best = Some((bucket, count));
        }
    }

    best.map(|(bucket, _)| bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> DistributionAnalyzer {
        DistributionAnalyzer::new(RuleSettings::default())
    }

    fn absence_flag() -> DistributionFlag {
        DistributionFlag {
            bucket: GradeBucket::H,
            kind: DistributionFlagKind::HighAbsenceRatio,
        }
    }

    #[test]
    fn absence_ratio_must_exceed_ten_percent() {
        let over = DistributionCounts::new(Some(100)).with_count(GradeBucket::H, 11);
        assert!(analyzer().analyze(&over).contains(&absence_flag()));

        let at = DistributionCounts::new(Some(100)).with_count(GradeBucket::H, 10);
        assert!(!analyzer().analyze(&at).contains(&absence_flag()));
    }

    #[test]
    fn tie_resolves_to_first_bucket_in_display_order() {
        let mut counts = DistributionCounts::new(Some(10));
        for bucket in GradeBucket::ALL {
            counts.insert(bucket, Some(0));
        }
        counts.insert(GradeBucket::A, Some(5));
        counts.insert(GradeBucket::B, Some(5));

        let flags = analyzer().analyze(&counts);

        assert_eq!(
            flags,
            vec![DistributionFlag {
                bucket: GradeBucket::A,
                kind: DistributionFlagKind::MaxNonAbsenceBucket,
            }]
        );
    }

    #[test]
    fn maximum_ignores_absence_bucket() {
        let counts = DistributionCounts::new(Some(40))
            .with_count(GradeBucket::H, 30)
            .with_count(GradeBucket::C, 6)
            .with_count(GradeBucket::D, 4);

        let flags = analyzer().analyze(&counts);

        assert_eq!(
            flags,
            vec![
                absence_flag(),
                DistributionFlag {
                    bucket: GradeBucket::C,
                    kind: DistributionFlagKind::MaxNonAbsenceBucket,
                },
            ]
        );
    }

    #[test]
    fn unparseable_counts_are_skipped() {
        let mut counts = DistributionCounts::new(Some(20));
        counts.insert(GradeBucket::APlus, None);
        counts.insert(GradeBucket::B, Some(0));
        let flags = analyzer().analyze(&counts);
        assert_eq!(flags[0].bucket, GradeBucket::B);

        let mut counts = DistributionCounts::new(Some(20));
        counts.insert(GradeBucket::APlus, None);
        counts.insert(GradeBucket::H, None);
        assert!(analyzer().analyze(&counts).is_empty());
    }

    #[test]
    fn missing_or_zero_total_disables_analysis() {
        let counts = DistributionCounts::new(None).with_count(GradeBucket::H, 50);
        assert!(analyzer().analyze(&counts).is_empty());

        let counts = DistributionCounts::new(Some(0)).with_count(GradeBucket::A, 3);
        assert!(analyzer().analyze(&counts).is_empty());
    }

    #[test]
    fn settings_gate_each_flag() {
        let counts = DistributionCounts::new(Some(10))
            .with_count(GradeBucket::H, 5)
            .with_count(GradeBucket::A, 5);

        let no_ratio =
            DistributionAnalyzer::new(RuleSettings::default().with(SettingKey::DistH, false));
        let flags = no_ratio.analyze(&counts);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, DistributionFlagKind::MaxNonAbsenceBucket);

        let no_max =
            DistributionAnalyzer::new(RuleSettings::default().with(SettingKey::DistMax, false));
        assert_eq!(no_max.analyze(&counts), vec![absence_flag()]);
    }

    #[test]
    fn parse_accepts_labels_and_element_ids() {
        assert_eq!(GradeBucket::parse(" هـ "), Some(GradeBucket::H));
        assert_eq!(GradeBucket::parse("myFrm:g_plus"), Some(GradeBucket::CPlus));
        assert_eq!(GradeBucket::parse("Z"), None);
    }
}
