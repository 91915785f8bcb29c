//! Integration tests for the conversion pipeline.
//!
//! pdfium is replaced by an in-memory `TableExtractor` that serves canned
//! rows per file name, so these run without the pdfium library. Inputs are
//! still real files on disk, because input resolution checks for `%PDF`.

use gcgn_geojson::{
    convert, convert_sync, convert_to_file, inspect, ConversionConfig, ConversionProgressCallback,
    ConversionWarning, ConvertError, DocumentMetadata, ExtractRequest, ExtractedDocument, RawRow,
    ReassembleError, TableExtractor,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const HEADER: &str = "Государственный каталог географических названий\n\
                      Количество записей - {n}\n";

fn header(count: usize) -> String {
    HEADER.replace("{n}", &count.to_string())
}

/// Serves a fixed `ExtractedDocument` per file name.
#[derive(Default)]
struct FakeExtractor {
    documents: HashMap<String, ExtractedDocument>,
}

impl FakeExtractor {
    fn with(mut self, file_name: &str, header_text: String, rows: Vec<RawRow>) -> Self {
        let page_count = rows.iter().map(|r| r.page).max().unwrap_or(1);
        self.documents.insert(
            file_name.to_string(),
            ExtractedDocument {
                page_count,
                header_text,
                rows,
            },
        );
        self
    }

    fn lookup(&self, path: &Path) -> Result<&ExtractedDocument, ConvertError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.documents
            .get(name)
            .ok_or_else(|| ConvertError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "no canned document".into(),
            })
    }
}

impl TableExtractor for FakeExtractor {
    fn extract(&self, path: &Path, _request: &ExtractRequest) -> Result<ExtractedDocument, ConvertError> {
        self.lookup(path).cloned()
    }

    fn metadata(&self, path: &Path, _password: Option<&str>) -> Result<DocumentMetadata, ConvertError> {
        let doc = self.lookup(path)?;
        Ok(DocumentMetadata {
            page_count: doc.page_count,
            pdf_version: "Pdf1_7".into(),
            announced_count: gcgn_geojson::pipeline::header::announced_count(&doc.header_text),
            ..Default::default()
        })
    }
}

/// Temp directory holding stub PDFs for the given names.
fn pdf_dir(names: &[&str]) -> (TempDir, Vec<String>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"%PDF-1.7\n%stub\n").unwrap();
            path.to_str().unwrap().to_string()
        })
        .collect();
    (dir, paths)
}

fn config_with(extractor: FakeExtractor) -> ConversionConfig {
    ConversionConfig::builder()
        .extractor(Arc::new(extractor))
        .build()
        .unwrap()
}

fn row(page: usize, cells: [&str; 5]) -> RawRow {
    RawRow::new(page, cells)
}

fn mount_x() -> RawRow {
    row(1, ["001", "Mount X", "peak", "RegionA", "45°30.0\n60°15.0"])
}

/// Four well-formed records spread over two pages.
fn four_records() -> Vec<RawRow> {
    vec![
        row(1, ["1", "Ак-Тау", "гора", "Респ. Алтай", "50°12.0\n87°30.0"]),
        row(1, ["", "", "", "Кош-Агачский р-н", "северный склон"]),
        row(1, ["2", "Белая", "река", "Респ. Адыгея", "45°1.5\n40°6.0"]),
        row(2, ["3", "Вишера", "река", "Пермский край", "60°24.0\n57°12.0"]),
        row(2, ["4", "Гора", "урочище", "Тверская обл.", "57°0.0\n35°0.0"]),
    ]
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_conversion_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("start {total_files}"));
    }
    fn on_file_start(&self, file_num: usize, _total_files: usize, _input: &str) {
        self.events.lock().unwrap().push(format!("file {file_num}"));
    }
    fn on_warning(&self, warning: &ConversionWarning) {
        let kind = match warning {
            ConversionWarning::CountMismatch { .. } => "mismatch",
            ConversionWarning::CountUnknown { .. } => "unknown",
        };
        self.events.lock().unwrap().push(format!("warn {kind}"));
    }
    fn on_file_complete(&self, file_num: usize, _total_files: usize, record_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {file_num} {record_count}"));
    }
    fn on_file_error(&self, file_num: usize, _total_files: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {file_num}"));
    }
    fn on_conversion_complete(&self, _total_files: usize, total_records: usize) {
        self.events.lock().unwrap().push(format!("complete {total_records}"));
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_record_becomes_one_point() {
    let (_dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let config = config_with(FakeExtractor::default().with("vol-1.pdf", header(1), vec![mount_x()]));

    let output = convert(&inputs, &config).await.unwrap();
    let value = serde_json::to_value(&output.collection).unwrap();

    assert_eq!(
        value,
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [60.25, 45.5] },
                "properties": {
                    "ref": "001",
                    "name": "Mount X",
                    "type": "peak",
                    "administrative_location": "RegionA",
                    "geo_location": null
                }
            }]
        })
    );
    assert!(output.files[0].warnings.is_empty());
    assert_eq!(output.stats.total_records, 1);
}

#[tokio::test]
async fn continuation_row_extends_locations() {
    let (_dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let rows = vec![mount_x(), row(1, ["", "", "", "Sub", "extra"])];
    let config = config_with(FakeExtractor::default().with("vol-1.pdf", header(1), rows));

    let output = convert(&inputs, &config).await.unwrap();
    let props = &output.collection.features[0].properties;

    assert_eq!(output.collection.len(), 1);
    assert_eq!(props.administrative_location, "RegionA Sub");
    assert_eq!(props.geo_location.as_deref(), Some("extra"));
}

#[tokio::test]
async fn count_mismatch_warns_and_still_writes() {
    let (dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConversionConfig::builder()
        .extractor(Arc::new(
            FakeExtractor::default().with("vol-1.pdf", header(5), four_records()),
        ))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let out = dir.path().join("out.geojson");

    let output = convert_to_file(&inputs, &out, &config).await.unwrap();

    assert_eq!(
        output.files[0].warnings,
        vec![ConversionWarning::CountMismatch {
            file: inputs[0].clone(),
            expected: 5,
            found: 4,
        }]
    );
    assert_eq!(output.files[0].announced_count, Some(5));
    assert_eq!(output.files[0].row_count, 5);
    assert_eq!(output.files[0].page_count, 2);
    assert_eq!(output.stats.total_warnings, 1);

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["features"].as_array().unwrap().len(), 4);

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["start 1", "file 1", "warn mismatch", "done 1 4", "complete 4"]
    );
}

#[tokio::test]
async fn strict_count_turns_mismatch_into_error() {
    let (dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let config = ConversionConfig::builder()
        .extractor(Arc::new(
            FakeExtractor::default().with("vol-1.pdf", header(5), four_records()),
        ))
        .strict_count(true)
        .build()
        .unwrap();
    let out = dir.path().join("out.geojson");

    let err = convert_to_file(&inputs, &out, &config).await.unwrap_err();

    assert!(matches!(
        err,
        ConvertError::CountMismatch {
            expected: 5,
            found: 4,
            ..
        }
    ));
    assert!(!out.exists());
}

#[tokio::test]
async fn missing_header_count_is_unknown_not_fatal() {
    let (_dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let config = ConversionConfig::builder()
        .extractor(Arc::new(FakeExtractor::default().with(
            "vol-1.pdf",
            "Каталог без счётчика".into(),
            four_records(),
        )))
        .strict_count(true)
        .build()
        .unwrap();

    let output = convert(&inputs, &config).await.unwrap();

    assert_eq!(output.collection.len(), 4);
    assert_eq!(output.files[0].announced_count, None);
    assert!(matches!(
        output.files[0].warnings.as_slice(),
        [ConversionWarning::CountUnknown { .. }]
    ));
}

#[tokio::test]
async fn files_concatenate_in_input_order() {
    let (_dir, inputs) = pdf_dir(&["vol-2.pdf", "vol-1.pdf"]);
    let config = config_with(
        FakeExtractor::default()
            .with("vol-1.pdf", header(1), vec![mount_x()])
            .with("vol-2.pdf", header(4), four_records()),
    );

    let output = convert(&inputs, &config).await.unwrap();
    let refs: Vec<&str> = output
        .collection
        .features
        .iter()
        .map(|f| f.properties.reference.as_str())
        .collect();

    assert_eq!(refs, vec!["1", "2", "3", "4", "001"]);
    assert_eq!(output.files.len(), 2);
    assert_eq!(output.files[0].input, inputs[0]);
    assert_eq!(output.stats.total_files, 2);
    assert_eq!(output.stats.total_pages, 3);
}

#[tokio::test]
async fn bad_coordinate_aborts_without_output() {
    let (dir, inputs) = pdf_dir(&["vol-1.pdf", "vol-2.pdf"]);
    let recorder = Arc::new(RecordingCallback::default());
    let broken = vec![
        mount_x(),
        row(3, ["002", "Broken", "peak", "RegionB", "north\n60°15.0"]),
    ];
    let config = ConversionConfig::builder()
        .extractor(Arc::new(
            FakeExtractor::default()
                .with("vol-1.pdf", header(1), vec![mount_x()])
                .with("vol-2.pdf", header(2), broken),
        ))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let out = dir.path().join("out.geojson");

    let err = convert_to_file(&inputs, &out, &config).await.unwrap_err();

    match err {
        ConvertError::Reassembly {
            path,
            records_read,
            source: ReassembleError::Coordinate { page, reference, .. },
        } => {
            assert_eq!(path, PathBuf::from(&inputs[1]));
            assert_eq!(records_read, 1);
            assert_eq!(page, 3);
            assert_eq!(reference, "002");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!out.exists());

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events.last().map(String::as_str), Some("error 2"));
}

#[tokio::test]
async fn missing_input_file_is_fatal() {
    let (dir, mut inputs) = pdf_dir(&["vol-1.pdf"]);
    inputs.push(dir.path().join("absent.pdf").to_str().unwrap().to_string());
    let config = config_with(FakeExtractor::default().with("vol-1.pdf", header(1), vec![mount_x()]));

    let err = convert(&inputs, &config).await.unwrap_err();
    assert!(matches!(err, ConvertError::FileNotFound { .. }));
}

#[tokio::test]
async fn rerun_is_byte_identical() {
    let (dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let config = ConversionConfig::builder()
        .extractor(Arc::new(
            FakeExtractor::default().with("vol-1.pdf", header(4), four_records()),
        ))
        .pretty(true)
        .build()
        .unwrap();
    let first = dir.path().join("first.geojson");
    let second = dir.path().join("second.geojson");

    convert_to_file(&inputs, &first, &config).await.unwrap();
    convert_to_file(&inputs, &second, &config).await.unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[tokio::test]
async fn inspect_reads_announced_count() {
    let (_dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let config = config_with(FakeExtractor::default().with("vol-1.pdf", header(4), four_records()));

    let meta = inspect(&inputs[0], &config).await.unwrap();

    assert_eq!(meta.page_count, 2);
    assert_eq!(meta.announced_count, Some(4));
}

#[test]
fn convert_sync_matches_async() {
    let (_dir, inputs) = pdf_dir(&["vol-1.pdf"]);
    let config = config_with(FakeExtractor::default().with("vol-1.pdf", header(4), four_records()));

    let sync_output = convert_sync(&inputs, &config).unwrap();
    let async_output = tokio_test::block_on(convert(&inputs, &config)).unwrap();

    assert_eq!(
        sync_output.collection.to_json(false).unwrap(),
        async_output.collection.to_json(false).unwrap()
    );
    assert_eq!(sync_output.collection.len(), 4);
}
