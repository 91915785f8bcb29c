//! Table extraction: turn registry pages into ordered rows of cell text.
//!
//! The registry tables have no ruling lines, so cells are recovered from
//! glyph positions alone:
//!
//! 1. Keep glyphs whose centre falls inside the layout's table area.
//! 2. Bucket each glyph into a column band by its centre x.
//! 3. Within a column, group glyphs into text lines by vertical overlap
//!    with each line's running box, so small marks like `°` or `.` stay
//!    on the line whose digits surround them.
//! 4. Merge lines from all columns into table rows: a line joins the row
//!    above when their vertical extents overlap by more than
//!    `row_tolerance`. A coordinate cell printed as two stacked lines next
//!    to a vertically centred single-line name therefore stays in one row.
//! 5. Lines within one cell are joined with `'\n'`, top to bottom.
//!
//! Steps 1–5 are the pure function [`rows_from_glyphs`]. Reading glyphs out
//! of a PDF is behind the [`TableExtractor`] trait; [`PdfiumExtractor`] is
//! the default implementation.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to call
//! from async contexts. [`extract_document`] moves the work onto tokio's
//! blocking thread pool.

use crate::config::TableLayout;
use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use crate::pipeline::header;
use pdfium_render::prelude::*;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One physical table row as printed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    /// 1-indexed page number.
    pub page: usize,
    /// Cell text per column band, left to right.
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<S: Into<String>>(page: usize, cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            page,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Text of column `idx`; empty when the row is shorter.
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map_or("", String::as_str)
    }

    /// A row whose reference cell is empty continues the record above it.
    pub fn is_continuation(&self) -> bool {
        self.cell(0).is_empty()
    }
}

/// A positioned character, in PDF points with the origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Glyph {
    fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    fn center_y(&self) -> f32 {
        (self.bottom + self.top) / 2.0
    }

    fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }
}

/// Which layout applies to which pages of a document.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Layout for page 1.
    pub first_page: TableLayout,
    /// Layout for pages 2..N.
    pub other_pages: TableLayout,
    pub password: Option<String>,
}

impl ExtractRequest {
    /// Layout for a 0-indexed page.
    pub fn layout_for(&self, page_idx: usize) -> &TableLayout {
        if page_idx == 0 {
            &self.first_page
        } else {
            &self.other_pages
        }
    }
}

/// Everything the pipeline needs from one PDF.
#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    pub page_count: usize,
    /// Plain text of page 1, used to read the announced record count.
    pub header_text: String,
    /// Rows of every page, in page order.
    pub rows: Vec<RawRow>,
}

/// Source of table rows.
///
/// Implementations are called from a blocking thread and must not assume an
/// async runtime.
pub trait TableExtractor: Send + Sync {
    /// Read page-1 text and the rows of every page.
    fn extract(&self, path: &Path, request: &ExtractRequest) -> Result<ExtractedDocument, ConvertError>;

    /// Read document metadata without building rows.
    fn metadata(&self, path: &Path, password: Option<&str>) -> Result<DocumentMetadata, ConvertError>;
}

/// Run an extractor on tokio's blocking pool.
pub async fn extract_document(
    extractor: Arc<dyn TableExtractor>,
    pdf_path: &Path,
    request: ExtractRequest,
) -> Result<ExtractedDocument, ConvertError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extractor.extract(&path, &request))
        .await
        .map_err(|e| ConvertError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Run [`TableExtractor::metadata`] on tokio's blocking pool.
pub async fn extract_metadata(
    extractor: Arc<dyn TableExtractor>,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ConvertError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extractor.metadata(&path, pwd.as_deref()))
        .await
        .map_err(|e| ConvertError::Internal(format!("Metadata task panicked: {}", e)))?
}

// ── Geometry → rows ──────────────────────────────────────────────────────

/// A horizontal gap wider than this fraction of the line's tallest glyph
/// is a space.
const SPACE_GAP_RATIO: f32 = 0.25;

#[derive(Debug)]
struct TextLine {
    column: usize,
    text: String,
    top: f32,
    bottom: f32,
}

/// Cut a page's glyphs into table rows using `layout`.
///
/// Every returned row has exactly `layout.column_count()` cells.
pub fn rows_from_glyphs(glyphs: &[Glyph], layout: &TableLayout, page: usize) -> Vec<RawRow> {
    let mut by_column: Vec<Vec<Glyph>> = vec![Vec::new(); layout.column_count()];
    for g in glyphs {
        if g.ch.is_whitespace() || !layout.area.contains(g.center_x(), g.center_y()) {
            continue;
        }
        by_column[layout.column_of(g.center_x())].push(*g);
    }

    let mut lines: Vec<TextLine> = by_column
        .into_iter()
        .enumerate()
        .flat_map(|(column, glyphs)| column_lines(column, glyphs))
        .collect();

    // Top of page first; left to right within a band.
    lines.sort_by(|a, b| {
        b.top
            .partial_cmp(&a.top)
            .unwrap_or(Ordering::Equal)
            .then(a.column.cmp(&b.column))
    });

    let mut rows = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();
    let mut row_bottom = f32::INFINITY;

    for line in lines {
        let overlap = line.top - row_bottom.max(line.bottom);
        if !current.is_empty() && overlap <= layout.row_tolerance {
            rows.push(build_row(&current, layout, page));
            current.clear();
            row_bottom = f32::INFINITY;
        }
        row_bottom = if current.is_empty() {
            line.bottom
        } else {
            row_bottom.min(line.bottom)
        };
        current.push(line);
    }
    if !current.is_empty() {
        rows.push(build_row(&current, layout, page));
    }

    rows
}

/// Vertical extent of a text line, grown as glyphs join it.
#[derive(Debug, Clone, Copy)]
struct LineBox {
    bottom: f32,
    top: f32,
}

impl LineBox {
    fn of(g: &Glyph) -> Self {
        Self {
            bottom: g.bottom,
            top: g.top,
        }
    }

    /// Shared vertical extent with `g`; negative when they are apart.
    fn overlap(&self, g: &Glyph) -> f32 {
        self.top.min(g.top) - self.bottom.max(g.bottom)
    }

    /// Whether `g` sits on this line. Punctuation and the degree sign have
    /// small tight bounds that sit inside the line box rather than around
    /// its centre, so only overlap with the whole box counts. Zero-height
    /// glyphs join when they lie within the box.
    fn holds(&self, g: &Glyph) -> bool {
        let overlap = self.overlap(g);
        overlap > 0.0 || (g.height() == 0.0 && overlap >= 0.0)
    }

    fn grow(&mut self, g: &Glyph) {
        self.bottom = self.bottom.min(g.bottom);
        self.top = self.top.max(g.top);
    }
}

/// Group one column's glyphs into text lines.
///
/// Glyphs are visited tallest-top first, so full-height characters open
/// each line and the box they span then takes in the small ones.
fn column_lines(column: usize, mut glyphs: Vec<Glyph>) -> Vec<TextLine> {
    glyphs.sort_by(|a, b| {
        b.top
            .partial_cmp(&a.top)
            .unwrap_or(Ordering::Equal)
            .then(a.left.partial_cmp(&b.left).unwrap_or(Ordering::Equal))
    });

    let mut groups: Vec<(LineBox, Vec<Glyph>)> = Vec::new();
    for g in glyphs {
        let best = groups
            .iter_mut()
            .filter(|(bounds, _)| bounds.holds(&g))
            .max_by(|(a, _), (b, _)| {
                a.overlap(&g)
                    .partial_cmp(&b.overlap(&g))
                    .unwrap_or(Ordering::Equal)
            });
        match best {
            Some((bounds, line)) => {
                bounds.grow(&g);
                line.push(g);
            }
            None => groups.push((LineBox::of(&g), vec![g])),
        }
    }

    groups
        .into_iter()
        .map(|(bounds, mut line)| {
            line.sort_by(|a, b| a.left.partial_cmp(&b.left).unwrap_or(Ordering::Equal));
            TextLine {
                column,
                text: line_text(&line),
                top: bounds.top,
                bottom: bounds.bottom,
            }
        })
        .collect()
}

/// Join left-sorted glyphs, inserting a space at wide gaps.
fn line_text(glyphs: &[Glyph]) -> String {
    let line_height = glyphs.iter().map(Glyph::height).fold(0.0, f32::max);
    let space_gap = line_height * SPACE_GAP_RATIO;

    let mut text = String::new();
    let mut prev: Option<&Glyph> = None;
    for g in glyphs {
        if let Some(p) = prev {
            if g.left - p.right > space_gap {
                text.push(' ');
            }
        }
        text.push(g.ch);
        prev = Some(g);
    }
    text
}

fn build_row(lines: &[TextLine], layout: &TableLayout, page: usize) -> RawRow {
    let mut cells = vec![String::new(); layout.column_count()];
    for line in lines {
        let cell = &mut cells[line.column];
        if !cell.is_empty() {
            cell.push('\n');
        }
        cell.push_str(&line.text);
    }
    RawRow { page, cells }
}

// ── Pdfium implementation ────────────────────────────────────────────────

/// Reads glyphs through pdfium.
///
/// pdfium is bound through `pdfium-auto`, which downloads and caches the
/// shared library on first use (or honours `PDFIUM_LIB_PATH`).
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumExtractor;

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self
    }

    fn bind() -> Result<Pdfium, ConvertError> {
        pdfium_auto::bind_pdfium_silent().map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))
    }
}

impl TableExtractor for PdfiumExtractor {
    fn extract(&self, path: &Path, request: &ExtractRequest) -> Result<ExtractedDocument, ConvertError> {
        let pdfium = Self::bind()?;
        let document = load_document(&pdfium, path, request.password.as_deref())?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("PDF loaded: {} pages", page_count);

        let mut extracted = ExtractedDocument {
            page_count,
            ..Default::default()
        };

        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let failed = |e: PdfiumError| ConvertError::ExtractionFailed {
                path: path.to_path_buf(),
                page: page_num,
                detail: format!("{:?}", e),
            };

            let text = page.text().map_err(failed)?;
            if idx == 0 {
                extracted.header_text = text.all();
            }

            let glyphs = page_glyphs(&text);
            let rows = rows_from_glyphs(&glyphs, request.layout_for(idx), page_num);
            debug!(
                "Page {}: {} glyphs → {} rows",
                page_num,
                glyphs.len(),
                rows.len()
            );
            extracted.rows.extend(rows);
        }

        Ok(extracted)
    }

    fn metadata(&self, path: &Path, password: Option<&str>) -> Result<DocumentMetadata, ConvertError> {
        let pdfium = Self::bind()?;
        let document = load_document(&pdfium, path, password)?;

        let metadata = document.metadata();
        let pages = document.pages();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        let announced_count = match pages.first() {
            Ok(page) => page
                .text()
                .ok()
                .and_then(|text| header::announced_count(&text.all())),
            Err(_) => None,
        };

        Ok(DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: pages.len() as usize,
            pdf_version: format!("{:?}", document.version()),
            announced_count,
        })
    }
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ConvertError> {
    let path: PathBuf = pdf_path.to_path_buf();
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ConvertError::WrongPassword { path }
            } else {
                ConvertError::PasswordRequired { path }
            }
        } else {
            ConvertError::CorruptPdf {
                path,
                detail: err_str,
            }
        }
    })
}

#[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
fn page_glyphs(text: &PdfPageText) -> Vec<Glyph> {
    text.chars()
        .iter()
        .filter_map(|ch| match (ch.unicode_char(), ch.tight_bounds()) {
            (Some(c), Ok(rect)) => Some(Glyph {
                ch: c,
                left: rect.left.value,
                right: rect.right.value,
                bottom: rect.bottom.value,
                top: rect.top.value,
            }),
            _ => None,
        })
        .collect()
}
