//! Result types returned by the conversion entry points.

use crate::pipeline::geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal findings about one input file.
///
/// Returned alongside a successful conversion and logged with
/// `tracing::warn!`; they never stop a run unless
/// [`crate::ConversionConfig::strict_count`] is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionWarning {
    /// The first page announces a different number of records than were read.
    CountMismatch {
        file: String,
        expected: usize,
        found: usize,
    },
    /// The first page does not state a record count; nothing was checked.
    CountUnknown { file: String },
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch {
                file,
                expected,
                found,
            } => write!(f, "{file}: announced {expected} records but found {found}"),
            Self::CountUnknown { file } => {
                write!(f, "{file}: no announced record count on page 1")
            }
        }
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// The input as given (path or URL).
    pub input: String,
    pub page_count: usize,
    pub row_count: usize,
    pub announced_count: Option<usize>,
    pub record_count: usize,
    pub warnings: Vec<ConversionWarning>,
    pub duration_ms: u64,
}

/// Run totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_files: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub total_warnings: usize,
    pub total_duration_ms: u64,
}

/// Everything a conversion produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub collection: FeatureCollection,
    pub files: Vec<FileReport>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// All warnings across files, in input order.
    pub fn warnings(&self) -> impl Iterator<Item = &ConversionWarning> {
        self.files.iter().flat_map(|f| f.warnings.iter())
    }
}

/// PDF metadata plus the announced record count, as reported by `inspect`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub announced_count: Option<usize>,
}
