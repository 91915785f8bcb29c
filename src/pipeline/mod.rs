//! Pipeline stages for registry-to-GeoJSON conversion.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ header ──▶ reassemble ──▶ geojson
//! (path/URL) (pdfium)  (count)    (rows→records) (features)
//!                                  └─ coordinate
//! ```
//!
//! 1. [`input`]      — canonicalise a user-supplied path or URL to a local PDF
//! 2. [`extract`]    — cut every page's glyphs into table rows
//! 3. [`header`]     — read the record count announced on page 1
//! 4. [`reassemble`] — fold continuation rows into records
//! 5. [`coordinate`] — `degrees°minutes` → decimal degrees
//! 6. [`geojson`]    — records → `FeatureCollection`

pub mod coordinate;
pub mod extract;
pub mod geojson;
pub mod header;
pub mod input;
pub mod reassemble;
