use super::DistributionInput;
use crate::highlight::distribution::GradeBucket;
use std::io::Read;
use std::path::Path;

/// Failure reading an exported students table or distribution file.
#[derive(Debug)]
pub enum TableImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for TableImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableImportError::Io(err) => write!(f, "failed to read table export: {}", err),
            TableImportError::Csv(err) => write!(f, "invalid table CSV data: {}", err),
        }
    }
}

impl std::error::Error for TableImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableImportError::Io(err) => Some(err),
            TableImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TableImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TableImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads CSV exports of the host page.
///
/// The students table is taken as-is: every record becomes a row of cell
/// texts, and rows of any width are accepted because the scanner decides
/// which rows hold data.
pub struct TableImporter;

impl TableImporter {
    pub fn rows_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>, TableImportError> {
        let file = std::fs::File::open(path)?;
        Self::rows_from_reader(file)
    }

    pub fn rows_from_reader<R: Read>(reader: R) -> Result<Vec<Vec<String>>, TableImportError> {
        let mut rows = Vec::new();
        for record in csv_reader(reader).records() {
            let record = record?;
            rows.push(record.iter().map(strip_invisible).collect());
        }
        Ok(rows)
    }

    pub fn distribution_from_path<P: AsRef<Path>>(
        path: P,
        total_students: Option<String>,
    ) -> Result<DistributionInput, TableImportError> {
        let file = std::fs::File::open(path)?;
        Self::distribution_from_reader(file, total_students)
    }

    /// Reads `label,count` pairs. Element ids are stored under the bucket
    /// label, the first row for a bucket wins, and rows with fewer than two
    /// fields are ignored.
    pub fn distribution_from_reader<R: Read>(
        reader: R,
        total_students: Option<String>,
    ) -> Result<DistributionInput, TableImportError> {
        let mut input = DistributionInput {
            counters: Default::default(),
            total_students,
        };

        for record in csv_reader(reader).records() {
            let record = record?;
            if let (Some(label), Some(count)) = (record.get(0), record.get(1)) {
                let label = strip_invisible(label);
                let name = match GradeBucket::parse(&label) {
                    Some(bucket) => bucket.label().to_string(),
                    None => label,
                };
                input
                    .counters
                    .entry(name)
                    .or_insert_with(|| count.to_string());
            }
        }

        Ok(input)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn strip_invisible(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}', '\u{200f}'], "")
}
