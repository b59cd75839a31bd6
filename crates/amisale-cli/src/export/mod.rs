//! Output sinks for a finished crawl.
//!
//! Every sink receives the same sorted records and writes one file into the
//! output directory. Sinks are independent: a failing sink is logged and
//! the others still run, and the export as a whole fails afterwards.

mod csv_sink;
mod markdown_sink;
mod xlsx_sink;

use std::path::{Path, PathBuf};

use amisale_core::{NormalizedRecord, ReportRow};

pub(crate) use csv_sink::write_csv;
pub(crate) use markdown_sink::write_markdown;
pub(crate) use xlsx_sink::write_xlsx;

pub(crate) const CSV_FILE_NAME: &str = "amiami_sales.csv";
pub(crate) const MARKDOWN_FILE_NAME: &str = "README.md";
pub(crate) const XLSX_FILE_NAME: &str = "amiami_sales.xlsx";

type Sink = fn(&Path, &[ReportRow]) -> anyhow::Result<()>;

/// Writes every enabled sink into `dir`, creating it if needed.
///
/// Returns the paths written.
///
/// # Errors
///
/// Returns an error if `dir` cannot be created or if any sink failed. Sinks
/// after a failing one are still attempted.
pub(crate) fn export_all(
    records: &[NormalizedRecord],
    dir: &Path,
    include_xlsx: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("cannot create output directory {}: {e}", dir.display()))?;

    let rows: Vec<ReportRow> = records.iter().map(NormalizedRecord::to_report_row).collect();

    let mut sinks: Vec<(&str, &str, Sink)> = vec![
        ("csv", CSV_FILE_NAME, write_csv as Sink),
        ("markdown", MARKDOWN_FILE_NAME, write_markdown as Sink),
    ];
    if include_xlsx {
        sinks.push(("xlsx", XLSX_FILE_NAME, write_xlsx as Sink));
    }

    let mut written = Vec::with_capacity(sinks.len());
    let mut failed = Vec::new();
    for (name, file_name, sink) in sinks {
        let path = dir.join(file_name);
        match sink(&path, &rows) {
            Ok(()) => {
                tracing::info!(sink = name, path = %path.display(), rows = rows.len(), "export written");
                written.push(path);
            }
            Err(e) => {
                tracing::error!(sink = name, path = %path.display(), error = %e, "export failed");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("export failed for sink(s): {}", failed.join(", "));
    }
    Ok(written)
}
