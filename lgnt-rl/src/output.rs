//! Tab-separated reading-list output

use crate::leganto::{LegantoRow, HEADERS};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Output file name for a run stamp
pub fn reading_list_filename(stamp: &str) -> String {
    format!("reading_list_{}.tsv", stamp)
}

/// Write the Leganto rows, header first, to `<dir>/reading_list_<stamp>.tsv`
pub fn write_reading_list(rows: &[LegantoRow], dir: &Path, stamp: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(reading_list_filename(stamp));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = rows.len(), "Reading list written");
    Ok(path)
}
