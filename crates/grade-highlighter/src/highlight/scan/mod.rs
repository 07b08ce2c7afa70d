//! One highlighting pass over a scraped students table and distribution widget.
//!
//! Every pass recomputes from the supplied cells. Rows that no longer match
//! come back with `style: None` so the caller clears whatever it painted on
//! the previous pass.

pub mod render;
pub mod table;

use super::distribution::{
    DistributionAnalyzer, DistributionCounts, DistributionFlagKind, GradeBucket,
};
use super::palette::{style_for, StyleDescriptor};
use super::record::{extract_mark, GradeRecord};
use super::rules::{RuleEngine, RuleKey};
use super::settings::RuleSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const FINAL_MARK_COLUMN: usize = 4;
pub const TOTAL_MARK_COLUMN: usize = 5;
pub const STATUS_COLUMN: usize = 7;
/// Rows with fewer cells are headers, footers, or summaries.
pub const MIN_DATA_CELLS: usize = 8;

/// Raw text scraped from the host page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInput {
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub distribution: Option<DistributionInput>,
}

/// Counter text keyed by bucket label or element id, plus the student total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInput {
    #[serde(default)]
    pub counters: BTreeMap<String, String>,
    #[serde(default)]
    pub total_students: Option<String>,
}

impl DistributionInput {
    /// Resolves counter names to buckets. When a bucket appears under both its
    /// label and its element id, the label entry is used.
    pub fn bucket_counters(&self) -> BTreeMap<GradeBucket, &str> {
        let mut resolved = BTreeMap::new();
        for (name, text) in &self.counters {
            let Some(bucket) = GradeBucket::parse(name) else {
                continue;
            };
            if name.trim() == bucket.label() || !resolved.contains_key(&bucket) {
                resolved.insert(bucket, text.as_str());
            }
        }
        resolved
    }

    /// Parses counter text. Returns `None` when the anchor counter is missing,
    /// meaning the widget is not on the page this pass.
    pub fn counts(&self) -> Option<DistributionCounts> {
        let mut counts =
            DistributionCounts::new(self.total_students.as_deref().and_then(extract_mark));

        for (bucket, text) in self.bucket_counters() {
            counts.insert(bucket, extract_mark(text));
        }

        counts.contains(GradeBucket::ANCHOR).then_some(counts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowHighlight {
    /// Position of the row in [`ScanInput::rows`].
    pub index: usize,
    pub rule: Option<RuleKey>,
    pub style: Option<StyleDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketHighlight {
    pub bucket: GradeBucket,
    pub flag: DistributionFlagKind,
    pub style: Option<StyleDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightReport {
    pub evaluated_at: DateTime<Utc>,
    pub rows: Vec<RowHighlight>,
    pub skipped_rows: Vec<usize>,
    pub distribution_applicable: bool,
    pub distribution: Vec<BucketHighlight>,
}

impl HighlightReport {
    pub fn row(&self, index: usize) -> Option<&RowHighlight> {
        self.rows.iter().find(|row| row.index == index)
    }

    pub fn bucket_style(&self, bucket: GradeBucket) -> Option<StyleDescriptor> {
        self.distribution
            .iter()
            .find(|highlight| highlight.bucket == bucket)
            .and_then(|highlight| highlight.style)
    }

    pub fn summary(&self) -> ScanSummary {
        let mut per_rule = BTreeMap::new();
        for rule in self.rows.iter().filter_map(|row| row.rule) {
            *per_rule.entry(rule).or_insert(0) += 1;
        }

        ScanSummary {
            data_rows: self.rows.len(),
            highlighted_rows: per_rule.values().sum(),
            skipped_rows: self.skipped_rows.len(),
            per_rule,
            distribution_flags: self
                .distribution
                .iter()
                .map(|highlight| (highlight.flag, highlight.bucket))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub data_rows: usize,
    pub highlighted_rows: usize,
    pub skipped_rows: usize,
    pub per_rule: BTreeMap<RuleKey, usize>,
    pub distribution_flags: Vec<(DistributionFlagKind, GradeBucket)>,
}

/// Runs the rule engine and distribution analyzer over scraped input.
#[derive(Debug, Clone, Default)]
pub struct HighlightScanner {
    engine: RuleEngine,
    analyzer: DistributionAnalyzer,
}

impl HighlightScanner {
    pub fn new(settings: RuleSettings) -> Self {
        Self {
            engine: RuleEngine::new(settings.clone()),
            analyzer: DistributionAnalyzer::new(settings),
        }
    }

    pub fn scan(&self, input: &ScanInput) -> HighlightReport {
        let mut rows = Vec::new();
        let mut skipped_rows = Vec::new();

        for (index, cells) in input.rows.iter().enumerate() {
            match record_from_cells(cells) {
                Some(record) => {
                    let rule = self.engine.evaluate(&record);
                    rows.push(RowHighlight {
                        index,
                        rule,
                        style: rule.and_then(|rule| style_for(rule)),
                    });
                }
                None => skipped_rows.push(index),
            }
        }

        let counts = input.distribution.as_ref().and_then(DistributionInput::counts);
        let distribution_applicable = counts.is_some();
        let distribution = counts
            .map(|counts| {
                self.analyzer
                    .analyze(&counts)
                    .into_iter()
                    .map(|flag| BucketHighlight {
                        bucket: flag.bucket,
                        flag: flag.kind,
                        style: style_for(flag.kind),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let report = HighlightReport {
            evaluated_at: Utc::now(),
            rows,
            skipped_rows,
            distribution_applicable,
            distribution,
        };

        debug!(
            data_rows = report.rows.len(),
            skipped = report.skipped_rows.len(),
            distribution_flags = report.distribution.len(),
            "highlight pass complete"
        );

        report
    }
}

/// Pulls the final, total, and status cells out of a table row.
pub fn record_from_cells<S: AsRef<str>>(cells: &[S]) -> Option<GradeRecord> {
    if cells.len() < MIN_DATA_CELLS {
        return None;
    }

    Some(GradeRecord::from_cells(
        cells[FINAL_MARK_COLUMN].as_ref(),
        cells[TOTAL_MARK_COLUMN].as_ref(),
        cells[STATUS_COLUMN].as_ref(),
    ))
}
