//! # gcgn-geojson
//!
//! Convert volumes of the State Catalogue of Geographical Names (GCGN)
//! toponym registry, published as PDF tables, into a GeoJSON
//! `FeatureCollection` of points.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF(s)
//!  │
//!  ├─ 1. Input       resolve local file or download from URL
//!  ├─ 2. Extract     pdfium glyphs → table rows (spawn_blocking)
//!  ├─ 3. Header      announced record count from page 1
//!  ├─ 4. Reassemble  continuation rows folded into records
//!  ├─ 5. Coordinates 45°30.0 → 45.5
//!  └─ 6. Output      Point features, [lon, lat]
//! ```
//!
//! Files are processed one at a time; their records are concatenated in
//! input order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gcgn_geojson::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_to_file(&["vol-1.pdf", "vol-2.pdf"], "toponyms.geojson", &config).await?;
//!     for warning in output.warnings() {
//!         eprintln!("warning: {warning}");
//!     }
//!     eprintln!("{} features", output.stats.total_records);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gcgn-convert` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, TableArea, TableLayout};
pub use convert::{convert, convert_sync, convert_to_file, inspect};
pub use error::{CoordinateError, ConvertError, ReassembleError};
pub use output::{ConversionOutput, ConversionStats, ConversionWarning, DocumentMetadata, FileReport};
pub use pipeline::extract::{ExtractRequest, ExtractedDocument, PdfiumExtractor, RawRow, TableExtractor};
pub use pipeline::geojson::{Feature, FeatureCollection};
pub use pipeline::reassemble::{reassemble, Reassembler, Record};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
