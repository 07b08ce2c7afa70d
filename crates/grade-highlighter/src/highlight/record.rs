use serde::{Deserialize, Serialize};

/// Placeholder total used by administrative rows; such rows never highlight.
pub const EXCLUDED_TOTAL: u64 = 99;

/// Substrings marking a student as absent. The bare `غ` marker matches inside
/// longer words too; that looseness is kept as-is.
pub const ABSENCE_MARKERS: [&str; 3] = ["غائب", "غياب", "غ"];

pub const INCOMPLETE_MARKER: &str = "غير مكتمل";
pub const CONTINUING_MARKER: &str = "مستمر";

/// One student row as seen by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    /// `None` when the cell carried no digits.
    pub final_mark: Option<u64>,
    pub total_mark: Option<u64>,
    pub status_text: String,
}

impl GradeRecord {
    pub fn new(
        final_mark: Option<u64>,
        total_mark: Option<u64>,
        status_text: impl AsRef<str>,
    ) -> Self {
        Self {
            final_mark,
            total_mark,
            status_text: normalize_status(status_text.as_ref()),
        }
    }

    /// Builds a record from raw cell text.
    pub fn from_cells(final_cell: &str, total_cell: &str, status_cell: &str) -> Self {
        Self::new(
            extract_mark(final_cell),
            extract_mark(total_cell),
            status_cell,
        )
    }

    pub fn is_excluded(&self) -> bool {
        self.total_mark == Some(EXCLUDED_TOTAL)
    }

    pub fn is_absent(&self) -> bool {
        ABSENCE_MARKERS
            .iter()
            .any(|marker| self.status_text.contains(marker))
    }

    pub fn is_incomplete_or_continuing(&self) -> bool {
        self.status_text.contains(INCOMPLETE_MARKER) || self.status_text.contains(CONTINUING_MARKER)
    }

    pub(crate) fn total_in(&self, low: u64, high: u64) -> bool {
        self.total_mark
            .map(|total| (low..=high).contains(&total))
            .unwrap_or(false)
    }

    pub(crate) fn total_is_one_of(&self, candidates: &[u64]) -> bool {
        self.total_mark
            .map(|total| candidates.contains(&total))
            .unwrap_or(false)
    }
}

/// Reads the first run of ASCII digits in `raw` as an integer.
pub fn extract_mark(raw: &str) -> Option<u64> {
    let start = raw.find(|ch: char| ch.is_ascii_digit())?;
    let digits = &raw[start..];
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn normalize_status(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_mark_reads_first_digit_run() {
        assert_eq!(extract_mark("64"), Some(64));
        assert_eq!(extract_mark("  mark: 57 / 100"), Some(57));
        assert_eq!(extract_mark("0"), Some(0));
        assert_eq!(extract_mark("007x"), Some(7));
    }

    #[test]
    fn extract_mark_without_digits_is_unparseable() {
        assert_eq!(extract_mark(""), None);
        assert_eq!(extract_mark("غائب"), None);
        assert_eq!(extract_mark("-"), None);
    }

    #[test]
    fn extract_mark_overflowing_digit_run_is_unparseable() {
        assert_eq!(extract_mark("99999999999999999999999"), None);
        assert_eq!(extract_mark("18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn extract_mark_ignores_non_ascii_digits() {
        assert_eq!(extract_mark("٦٤"), None);
        assert_eq!(extract_mark("٦٤ (64)"), Some(64));
    }

    #[test]
    fn normalize_status_collapses_whitespace() {
        assert_eq!(normalize_status("  غير \n\t مكتمل  "), "غير مكتمل");
        assert_eq!(normalize_status(""), "");
    }

    #[test]
    fn absence_uses_substring_containment() {
        assert!(GradeRecord::from_cells("0", "0", "غائب").is_absent());
        assert!(GradeRecord::from_cells("0", "0", "غياب بعذر").is_absent());
        // the single-letter marker also fires inside unrelated words
        assert!(GradeRecord::from_cells("0", "0", "غير مكتمل").is_absent());
        assert!(!GradeRecord::from_cells("0", "0", "ناجح").is_absent());
    }

    #[test]
    fn incomplete_or_continuing_detects_either_marker() {
        assert!(GradeRecord::from_cells("", "", "غير   مكتمل").is_incomplete_or_continuing());
        assert!(GradeRecord::from_cells("", "", "مستمر").is_incomplete_or_continuing());
        assert!(!GradeRecord::from_cells("", "", "ناجح").is_incomplete_or_continuing());
    }

    #[test]
    fn total_99_is_excluded() {
        assert!(GradeRecord::from_cells("40", "99", "").is_excluded());
        assert!(!GradeRecord::from_cells("40", "98", "").is_excluded());
        assert!(!GradeRecord::from_cells("40", "", "").is_excluded());
    }
}
