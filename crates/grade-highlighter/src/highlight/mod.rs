//! Grade highlighting: rule evaluation, distribution analysis, and the
//! palette a driver paints with.

pub mod distribution;
pub mod palette;
pub mod record;
pub mod router;
pub mod rules;
pub mod scan;
pub mod service;
pub mod settings;

pub use distribution::{
    DistributionAnalyzer, DistributionCounts, DistributionFlag, DistributionFlagKind, GradeBucket,
};
pub use palette::{legend, style_for, HighlightKey, LegendEntry, StyleDescriptor};
pub use record::GradeRecord;
pub use router::highlight_router;
pub use rules::{RuleEngine, RuleKey, RuleMatch};
pub use scan::render::render_html;
pub use scan::table::{TableImportError, TableImporter};
pub use scan::{
    DistributionInput, HighlightReport, HighlightScanner, RowHighlight, ScanInput, ScanSummary,
};
pub use service::{HighlightService, HighlightServiceError, SettingsUpdate};
pub use settings::{
    FileSettingsStore, MemorySettingsStore, RuleSettings, SettingKey, SettingsStore,
    SettingsStoreError,
};
