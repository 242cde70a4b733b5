//! CSV export
//!
//! Each row type names its own header. The header is always written, so an
//! empty result still produces a valid file.

use super::error::ExportError;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

/// A row type that can be written to CSV
pub trait CsvRow: Serialize {
    /// Column names, in field order
    const HEADERS: &'static [&'static str];
}

/// Write a header and one record per row
///
/// Returns the number of data rows written.
pub fn write_csv<R, W>(writer: W, rows: &[R]) -> Result<usize, ExportError>
where
    R: CsvRow,
    W: Write,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(R::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}

/// Write rows to a CSV file, creating parent directories as needed
#[instrument(skip(rows), fields(path = %path.as_ref().display(), rows = rows.len()))]
pub fn export_csv<R: CsvRow>(path: impl AsRef<Path>, rows: &[R]) -> Result<usize, ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let written = write_csv(File::create(path)?, rows)?;
    info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}
