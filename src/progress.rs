//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through its input files. The CLI uses this
//! to drive its progress bar; library callers can forward the events
//! anywhere they like.
//!
//! # Example
//!
//! ```rust
//! use gcgn_geojson::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     records: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, file_num: usize, total_files: usize, record_count: usize) {
//!         self.records.fetch_add(record_count, Ordering::SeqCst);
//!         eprintln!("File {}/{} done ({} records)", file_num, total_files, record_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     records: AtomicUsize::new(0),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConversionWarning;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each input file.
///
/// Files are processed one after another, so calls never overlap, but the
/// trait is `Send + Sync` because blocking extraction runs on tokio's
/// blocking pool. All methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first file is opened.
    fn on_conversion_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is resolved and extracted.
    ///
    /// # Arguments
    /// * `file_num`   : 1-indexed position in the input list
    /// * `total_files`: number of inputs
    /// * `input`      : the path or URL as given
    fn on_file_start(&self, file_num: usize, total_files: usize, input: &str) {
        let _ = (file_num, total_files, input);
    }

    /// Called when a non-fatal problem is found in a file.
    fn on_warning(&self, warning: &ConversionWarning) {
        let _ = warning;
    }

    /// Called when a file's records have been reassembled.
    fn on_file_complete(&self, file_num: usize, total_files: usize, record_count: usize) {
        let _ = (file_num, total_files, record_count);
    }

    /// Called when a file fails; the run stops after this.
    fn on_file_error(&self, file_num: usize, total_files: usize, error: &str) {
        let _ = (file_num, total_files, error);
    }

    /// Called once after every file has been converted.
    fn on_conversion_complete(&self, total_files: usize, total_records: usize) {
        let _ = (total_files, total_records);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
