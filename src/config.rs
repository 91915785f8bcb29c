//! Configuration types for registry-to-GeoJSON conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The table geometry lives in two
//! [`TableLayout`]s: the first page of every registry volume has a taller
//! title block, so its table starts lower than on the pages that follow.

use crate::error::ConvertError;
use crate::pipeline::extract::TableExtractor;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use gcgn_geojson::{ConversionConfig, TableLayout};
///
/// let config = ConversionConfig::builder()
///     .first_page_layout(TableLayout::first_page())
///     .strict_count(true)
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Table geometry on page 1. Default: [`TableLayout::first_page`].
    pub first_page_layout: TableLayout,

    /// Table geometry on pages 2..N. Default: [`TableLayout::other_pages`].
    pub page_layout: TableLayout,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Treat a mismatch between the announced and the reassembled record
    /// count as fatal. Default: false (the mismatch is only a warning).
    pub strict_count: bool,

    /// Indent the GeoJSON output. Default: false.
    pub pretty: bool,

    /// Pre-constructed table extractor. Default: pdfium.
    pub extractor: Option<Arc<dyn TableExtractor>>,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            first_page_layout: TableLayout::first_page(),
            page_layout: TableLayout::other_pages(),
            password: None,
            download_timeout_secs: 120,
            strict_count: false,
            pretty: false,
            extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("first_page_layout", &self.first_page_layout)
            .field("page_layout", &self.page_layout)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("strict_count", &self.strict_count)
            .field("pretty", &self.pretty)
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TableExtractor>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn first_page_layout(mut self, layout: TableLayout) -> Self {
        self.config.first_page_layout = layout;
        self
    }

    pub fn page_layout(mut self, layout: TableLayout) -> Self {
        self.config.page_layout = layout;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn strict_count(mut self, v: bool) -> Self {
        self.config.strict_count = v;
        self
    }

    pub fn pretty(mut self, v: bool) -> Self {
        self.config.pretty = v;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TableExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating both table layouts.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        self.config.first_page_layout.validate("first page")?;
        self.config.page_layout.validate("page")?;
        Ok(self.config)
    }
}

// ── Table geometry ───────────────────────────────────────────────────────

/// Rectangle of the page that holds the table, in PDF points with the
/// origin at the bottom-left corner.
///
/// Parses from `"left,top,right,bottom"`, e.g. `"0,395,810,27"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableArea {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl TableArea {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

impl FromStr for TableArea {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = parse_points(s)?;
        match v.as_slice() {
            &[left, top, right, bottom] => Ok(Self {
                left,
                top,
                right,
                bottom,
            }),
            _ => Err(ConvertError::InvalidConfig(format!(
                "Table area needs 4 numbers 'left,top,right,bottom', got '{s}'"
            ))),
        }
    }
}

/// Where the table sits on a page and where its columns split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub area: TableArea,
    /// X coordinates of the column boundaries, left to right. `n` separators
    /// give `n + 1` columns.
    pub columns: Vec<f32>,
    /// Minimum vertical overlap, in points, for two text lines to be read as
    /// the same table row.
    pub row_tolerance: f32,
}

/// Column separators shared by every page of the registry.
const REGISTRY_COLUMNS: [f32; 5] = [115.0, 320.0, 438.0, 603.0, 752.0];

/// Default row tolerance in points.
const DEFAULT_ROW_TOLERANCE: f32 = 0.5;

impl TableLayout {
    /// Page 1 of a registry volume: table below the title block.
    pub fn first_page() -> Self {
        Self {
            area: TableArea {
                left: 0.0,
                top: 395.0,
                right: 810.0,
                bottom: 27.0,
            },
            columns: REGISTRY_COLUMNS.to_vec(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
        }
    }

    /// Pages 2..N: table below the running column header.
    pub fn other_pages() -> Self {
        Self {
            area: TableArea {
                left: 0.0,
                top: 550.0,
                right: 810.0,
                bottom: 27.0,
            },
            columns: REGISTRY_COLUMNS.to_vec(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
        }
    }

    /// Number of column bands the separators produce.
    pub fn column_count(&self) -> usize {
        self.columns.len() + 1
    }

    /// Column band holding horizontal position `x`.
    pub fn column_of(&self, x: f32) -> usize {
        self.columns.iter().take_while(|&&sep| x >= sep).count()
    }

    fn validate(&self, which: &str) -> Result<(), ConvertError> {
        let a = &self.area;
        if !(a.left < a.right && a.bottom < a.top) {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} table area must have left < right and bottom < top, got {a:?}"
            )));
        }
        if self.columns.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} column separators must be strictly increasing, got {:?}",
                self.columns
            )));
        }
        if self.columns.iter().any(|&c| c <= a.left || c >= a.right) {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} column separators must lie inside the table area, got {:?}",
                self.columns
            )));
        }
        if !(self.row_tolerance >= 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} row tolerance must be ≥ 0, got {}",
                self.row_tolerance
            )));
        }
        Ok(())
    }
}

/// Parse comma-separated column separators, e.g. `"115,320,438,603,752"`.
pub fn parse_columns(s: &str) -> Result<Vec<f32>, ConvertError> {
    parse_points(s)
}

fn parse_points(s: &str) -> Result<Vec<f32>, ConvertError> {
    s.split(',')
        .map(|p| {
            p.trim().parse::<f32>().map_err(|_| {
                ConvertError::InvalidConfig(format!("'{}' in '{s}' is not a number", p.trim()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layouts_are_valid() {
        assert!(ConversionConfig::builder().build().is_ok());
        assert_eq!(TableLayout::first_page().column_count(), 6);
    }

    #[test]
    fn first_page_table_starts_lower() {
        assert!(TableLayout::first_page().area.top < TableLayout::other_pages().area.top);
    }

    #[test]
    fn column_of_buckets_by_separator() {
        let layout = TableLayout::other_pages();
        assert_eq!(layout.column_of(10.0), 0);
        assert_eq!(layout.column_of(115.0), 1);
        assert_eq!(layout.column_of(300.0), 1);
        assert_eq!(layout.column_of(500.0), 3);
        assert_eq!(layout.column_of(700.0), 4);
        assert_eq!(layout.column_of(790.0), 5);
    }

    #[test]
    fn table_area_parses_left_top_right_bottom() {
        let a: TableArea = "0,395,810,27".parse().unwrap();
        assert_eq!(a, TableLayout::first_page().area);
        assert!(a.contains(100.0, 200.0));
        assert!(!a.contains(100.0, 400.0));
        assert!("0,395,810".parse::<TableArea>().is_err());
        assert!("0,x,810,27".parse::<TableArea>().is_err());
    }

    #[test]
    fn parse_columns_accepts_spaces() {
        assert_eq!(
            parse_columns("115, 320,438 ,603,752").unwrap(),
            REGISTRY_COLUMNS.to_vec()
        );
    }

    #[test]
    fn build_rejects_unsorted_columns() {
        let mut layout = TableLayout::other_pages();
        layout.columns = vec![320.0, 115.0];
        let err = ConversionConfig::builder().page_layout(layout).build().unwrap_err();
        assert!(err.to_string().contains("strictly increasing"), "got: {err}");
    }

    #[test]
    fn build_rejects_inverted_area() {
        let mut layout = TableLayout::first_page();
        layout.area.top = 10.0;
        assert!(ConversionConfig::builder()
            .first_page_layout(layout)
            .build()
            .is_err());
    }

    #[test]
    fn build_rejects_columns_outside_area() {
        let mut layout = TableLayout::first_page();
        layout.columns.push(900.0);
        assert!(ConversionConfig::builder()
            .first_page_layout(layout)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
