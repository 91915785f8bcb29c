//! CLI binary for gcgn-geojson.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use gcgn_geojson::{
    config::parse_columns, convert_to_file, inspect, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, ConversionWarning, ProgressCallback, TableArea, TableLayout,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ─────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar over the input files, with a log line per file and per warning.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            warnings: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} registry file(s)…"))
        ));
    }

    fn on_file_start(&self, _file_num: usize, _total_files: usize, input: &str) {
        self.bar.set_message(display_name(input));
    }

    fn on_warning(&self, warning: &ConversionWarning) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("⚠"), warning));
    }

    fn on_file_complete(&self, file_num: usize, total_files: usize, record_count: usize) {
        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {}",
            green("✓"),
            file_num,
            total_files,
            dim(&format!("{record_count:>6} records")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, file_num: usize, total_files: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {}",
            red("✗"),
            file_num,
            total_files,
            red(&msg),
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, total_files: usize, total_records: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);
        eprintln!(
            "{} {} records from {} file(s){}",
            if warnings == 0 { green("✔") } else { cyan("⚠") },
            bold(&total_records.to_string()),
            total_files,
            if warnings == 0 {
                String::new()
            } else {
                format!("  ({} warning(s))", yellow(&warnings.to_string()))
            },
        );
    }
}

/// File name of a path or URL, for the progress message.
fn display_name(input: &str) -> String {
    input
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(input)
        .to_string()
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one registry volume
  gcgn-convert vol-1.pdf -o toponyms.geojson

  # Several volumes into one collection, in order
  gcgn-convert vol-1.pdf vol-2.pdf vol-3.pdf -o toponyms.geojson

  # Straight from the publisher
  gcgn-convert https://example.org/gcgn/vol-1.pdf -o vol-1.geojson

  # Fail when the announced record count does not match
  gcgn-convert --strict-count vol-1.pdf -o vol-1.geojson

  # Run report as JSON on stdout
  gcgn-convert --json vol-1.pdf -o vol-1.geojson > report.json

  # Inspect PDF metadata and the announced record count
  gcgn-convert --inspect-only vol-1.pdf

TABLE GEOMETRY:
  Areas are "left,top,right,bottom" in PDF points, origin bottom-left.
  Defaults: first page 0,395,810,27; other pages 0,550,810,27;
  column separators 115,320,438,603,752.

ENVIRONMENT VARIABLES:
  GCGN_*                  Every flag, e.g. GCGN_PRETTY=true
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                tracing filter, overrides -v / -q
"#;

/// Convert GCGN toponym registry PDFs to a GeoJSON FeatureCollection.
#[derive(Parser, Debug)]
#[command(
    name = "gcgn-convert",
    version,
    about = "Convert GCGN toponym registry PDFs to a GeoJSON FeatureCollection",
    long_about = "Extract the toponym table from one or more registry PDFs (local files or \
URLs), fold continuation rows into records, convert degrees°minutes to decimal degrees, and \
write a single GeoJSON FeatureCollection of points.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Registry PDF paths or HTTP/HTTPS URLs, converted in this order.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<String>,

    /// Write the FeatureCollection to this file.
    #[arg(
        short,
        long,
        env = "GCGN_OUTPUT",
        required_unless_present = "inspect_only"
    )]
    output: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "GCGN_PASSWORD")]
    password: Option<String>,

    /// Indent the GeoJSON output.
    #[arg(long, env = "GCGN_PRETTY")]
    pretty: bool,

    /// Print the run report (or metadata with --inspect-only) as JSON on stdout.
    #[arg(long, env = "GCGN_JSON")]
    json: bool,

    /// Treat a record-count mismatch as a fatal error.
    #[arg(long, env = "GCGN_STRICT_COUNT")]
    strict_count: bool,

    /// Table area on page 1: left,top,right,bottom.
    #[arg(long, env = "GCGN_FIRST_PAGE_AREA", value_parser = parse_area)]
    first_page_area: Option<TableArea>,

    /// Table area on pages 2..N: left,top,right,bottom.
    #[arg(long, env = "GCGN_PAGE_AREA", value_parser = parse_area)]
    page_area: Option<TableArea>,

    /// Column separators shared by all pages, e.g. 115,320,438,603,752.
    #[arg(long, env = "GCGN_COLUMNS")]
    columns: Option<String>,

    /// Disable progress bar.
    #[arg(long, env = "GCGN_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GCGN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GCGN_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "GCGN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

fn parse_area(s: &str) -> Result<TableArea, String> {
    s.parse::<TableArea>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the bar active only warnings are logged, so they interleave
    // with the per-file lines instead of flooding them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    ensure_pdfium(cli.quiet)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for input in &cli.inputs {
            let meta = inspect(input, &config)
                .await
                .with_context(|| format!("Failed to inspect {input}"))?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
                );
                continue;
            }

            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            match meta.announced_count {
                Some(n) => println!("Records:      {} (announced)", n),
                None => println!("Records:      {}", dim("not announced")),
            }
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref d) = meta.creation_date {
                println!("Created:      {}", d);
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output_path = cli
        .output
        .as_deref()
        .context("--output is required unless --inspect-only is given")?;

    let output = convert_to_file(&cli.inputs, output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&Report::new(&output, output_path))
                .context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&output, output_path, show_progress);
    }

    Ok(())
}

/// Make sure the pdfium shared library is available before any file is opened.
///
/// The first run downloads it into the pdfium-auto cache; later runs find it
/// there, or use `PDFIUM_LIB_PATH` directly.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut first_page = TableLayout::first_page();
    let mut other_pages = TableLayout::other_pages();

    if let Some(area) = cli.first_page_area {
        first_page.area = area;
    }
    if let Some(area) = cli.page_area {
        other_pages.area = area;
    }
    if let Some(ref columns) = cli.columns {
        let columns = parse_columns(columns).context("Invalid --columns")?;
        first_page.columns = columns.clone();
        other_pages.columns = columns;
    }

    let mut builder = ConversionConfig::builder()
        .first_page_layout(first_page)
        .page_layout(other_pages)
        .download_timeout_secs(cli.download_timeout)
        .strict_count(cli.strict_count)
        .pretty(cli.pretty);

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &ConversionOutput, output_path: &Path, show_progress: bool) {
    let stats = &output.stats;
    if !show_progress {
        // The bar already printed warnings and the per-file lines.
        for warning in output.warnings() {
            eprintln!("{} {}", yellow("⚠"), warning);
        }
    }
    eprintln!(
        "{}  {} records  {} pages  {}ms  →  {}",
        if stats.total_warnings == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.total_records,
        stats.total_pages,
        stats.total_duration_ms,
        bold(&output_path.display().to_string()),
    );
}

/// `--json` report: everything in the run output except the features.
#[derive(serde::Serialize)]
struct Report<'a> {
    output: &'a Path,
    files: &'a [gcgn_geojson::FileReport],
    stats: &'a gcgn_geojson::ConversionStats,
}

impl<'a> Report<'a> {
    fn new(output: &'a ConversionOutput, path: &'a Path) -> Self {
        Self {
            output: path,
            files: &output.files,
            stats: &output.stats,
        }
    }
}
