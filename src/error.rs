//! Error types for the gcgn-geojson library.
//!
//! Three layers of failure, from the innermost outwards:
//!
//! * [`CoordinateError`] — a single `degrees°minutes` string could not be
//!   read.
//! * [`ReassembleError`] — a table row could not be folded into a record
//!   (bad or missing coordinates); carries the page and reference so the
//!   offending row can be found in the PDF.
//! * [`ConvertError`] — **Fatal**: the run cannot produce output at all.
//!   Returned as `Err(ConvertError)` from the top-level `convert*` functions.
//!
//! Non-fatal findings (announced count does not match, count header missing)
//! are not errors; they are reported as [`crate::output::ConversionWarning`]
//! values alongside a successful result.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the gcgn-geojson library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No input files were given.
    #[error("No input PDF files were given")]
    NoInputs,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Text or glyph extraction failed on a specific page.
    #[error("Table extraction failed for '{path}' page {page}: {detail}")]
    ExtractionFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Record errors ─────────────────────────────────────────────────────
    /// A row could not be folded into a record.
    #[error("Failed to read records from '{path}' ({records_read} records read before the failure): {source}")]
    Reassembly {
        path: PathBuf,
        records_read: usize,
        #[source]
        source: ReassembleError,
    },

    /// Announced and reassembled record counts differ (strict mode only).
    #[error("'{path}' announces {expected} records but {found} were found")]
    CountMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not serialise the feature collection.
    #[error("Failed to serialise GeoJSON: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Could not create or write the output GeoJSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A table row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReassembleError {
    /// One of the two coordinate halves is not `degrees°minutes`.
    #[error("record '{reference}' on page {page}: {source}")]
    Coordinate {
        page: usize,
        reference: String,
        #[source]
        source: CoordinateError,
    },

    /// The coordinate cell does not hold a latitude line and a longitude line.
    #[error("record '{reference}' on page {page}: coordinate cell {cell:?} is not '<lat>\\n<lon>'")]
    MissingCoordinates {
        page: usize,
        reference: String,
        cell: String,
    },
}

/// A coordinate string that is not `<degrees>°<minutes>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// The string does not start with `<digits>°<digits or dots>`.
    #[error("'{input}' is not a degrees°minutes coordinate")]
    Malformed { input: String },

    /// The pattern matched but a component is not a number (e.g. `12°3.4.5`).
    #[error("'{input}' has a non-numeric degree or minute component")]
    InvalidNumber { input: String },
}
