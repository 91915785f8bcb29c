//! Conversion entry points: many registry PDFs in, one FeatureCollection out.
//!
//! Files are processed strictly one after another, in the order given. Each
//! file goes through resolve → extract → reassemble; the first fatal error
//! stops the whole run. Records from all files are concatenated in input
//! order.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::{ConversionOutput, ConversionStats, ConversionWarning, DocumentMetadata, FileReport};
use crate::pipeline::extract::{self, ExtractRequest, PdfiumExtractor, TableExtractor};
use crate::pipeline::geojson::FeatureCollection;
use crate::pipeline::reassemble::{Reassembler, Record};
use crate::pipeline::{header, input};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one or more registry PDFs (paths or URLs) to a FeatureCollection.
///
/// # Returns
/// `Ok(ConversionOutput)` when every file converted; non-fatal findings are
/// in each [`FileReport::warnings`].
///
/// # Errors
/// Returns `Err(ConvertError)` for the first fatal problem in any file:
/// unreadable input, pdfium failure, or a row whose coordinates cannot be
/// read. No partial collection is returned.
pub async fn convert<S: AsRef<str>>(
    inputs: &[S],
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    if inputs.is_empty() {
        return Err(ConvertError::NoInputs);
    }

    let total_start = Instant::now();
    let total_files = inputs.len();
    let extractor = resolve_extractor(config);
    info!("Starting conversion of {} file(s)", total_files);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_files);
    }

    let mut records: Vec<Record> = Vec::new();
    let mut files = Vec::with_capacity(total_files);

    for (idx, input_str) in inputs.iter().enumerate() {
        let input_str = input_str.as_ref();
        let file_num = idx + 1;

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(file_num, total_files, input_str);
        }

        match convert_file(input_str, &extractor, config).await {
            Ok((file_records, report)) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(file_num, total_files, report.record_count);
                }
                records.extend(file_records);
                files.push(report);
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(file_num, total_files, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    let stats = ConversionStats {
        total_files,
        total_pages: files.iter().map(|f| f.page_count).sum(),
        total_records: records.len(),
        total_warnings: files.iter().map(|f| f.warnings.len()).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} records from {} file(s), {}ms total",
        stats.total_records, total_files, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_files, stats.total_records);
    }

    Ok(ConversionOutput {
        collection: FeatureCollection::from_records(records),
        files,
        stats,
    })
}

/// Convert and write the GeoJSON to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial output file behind.
pub async fn convert_to_file<S: AsRef<str>>(
    inputs: &[S],
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let output = convert(inputs, config).await?;
    let json = output.collection.to_json(config.pretty)?;
    write_atomic(output_path.as_ref(), json.as_bytes()).await?;
    info!(
        "Wrote {} features to {}",
        output.collection.len(),
        output_path.as_ref().display()
    );
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(inputs, config))
}

/// Read PDF metadata and the announced record count without reassembling.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, ConvertError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_metadata(
        resolve_extractor(config),
        resolved.path(),
        config.password.as_deref(),
    )
    .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Use the configured extractor, falling back to pdfium.
fn resolve_extractor(config: &ConversionConfig) -> Arc<dyn TableExtractor> {
    match config.extractor {
        Some(ref extractor) => Arc::clone(extractor),
        None => Arc::new(PdfiumExtractor::new()),
    }
}

/// Resolve, extract and reassemble a single input.
async fn convert_file(
    input_str: &str,
    extractor: &Arc<dyn TableExtractor>,
    config: &ConversionConfig,
) -> Result<(Vec<Record>, FileReport), ConvertError> {
    let start = Instant::now();
    info!("Converting {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    let request = ExtractRequest {
        first_page: config.first_page_layout.clone(),
        other_pages: config.page_layout.clone(),
        password: config.password.clone(),
    };
    let document = extract::extract_document(Arc::clone(extractor), resolved.path(), request).await?;
    let row_count = document.rows.len();
    debug!("{}: {} pages, {} rows", input_str, document.page_count, row_count);

    let announced = header::announced_count(&document.header_text);

    let mut records = Vec::new();
    for item in Reassembler::new(document.rows) {
        match item {
            Ok(record) => records.push(record),
            Err(source) => {
                return Err(ConvertError::Reassembly {
                    path: PathBuf::from(input_str),
                    records_read: records.len(),
                    source,
                })
            }
        }
    }

    let warning = check_count(input_str, announced, records.len());
    if let Some(ConversionWarning::CountMismatch { expected, found, .. }) = warning {
        if config.strict_count {
            return Err(ConvertError::CountMismatch {
                path: PathBuf::from(input_str),
                expected,
                found,
            });
        }
    }
    if let Some(ref w) = warning {
        warn!("{}", w);
        if let Some(ref cb) = config.progress_callback {
            cb.on_warning(w);
        }
    }

    info!("{}: {} records", input_str, records.len());

    let report = FileReport {
        input: input_str.to_string(),
        page_count: document.page_count,
        row_count,
        announced_count: announced,
        record_count: records.len(),
        warnings: warning.into_iter().collect(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    Ok((records, report))
}

/// Compare the announced count with what was read.
fn check_count(file: &str, announced: Option<usize>, found: usize) -> Option<ConversionWarning> {
    match announced {
        None => Some(ConversionWarning::CountUnknown {
            file: file.to_string(),
        }),
        Some(expected) if expected != found => Some(ConversionWarning::CountMismatch {
            file: file.to_string(),
            expected,
            found,
        }),
        Some(_) => None,
    }
}

/// Write to `<path>.tmp`, then rename over `path`.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConvertError> {
    let write_failed = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    tokio::fs::write(&tmp_path, contents).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    Ok(())
}
