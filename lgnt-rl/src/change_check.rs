//! Last-checked snapshot of spreadsheet course ids
//!
//! A spreadsheet-driven run only does work when the requested course list
//! differs from the list saved by the previous run.

use anyhow::{Context, Result};
use lgnt_common::json_store::{read_json_optional, write_json_atomic};
use std::path::Path;
use tracing::{debug, info, warn};

/// Compare `sorted_ids` with the saved snapshot; save and return `true` when they differ
///
/// A missing or unreadable snapshot counts as different.
pub fn check_for_updates(sorted_ids: &[String], path: &Path) -> Result<bool> {
    let saved: Option<Vec<String>> = match read_json_optional(path) {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Last-checked snapshot {} unreadable: {}", path.display(), e);
            None
        }
    };

    if let Some(mut saved) = saved {
        saved.sort();
        if saved.as_slice() == sorted_ids {
            info!("Course list unchanged since last check");
            return Ok(false);
        }
        debug!(previous = saved.len(), current = sorted_ids.len(), "Course list changed");
    }

    write_json_atomic(sorted_ids, path)
        .with_context(|| format!("Failed to save last-checked snapshot {}", path.display()))?;
    info!(count = sorted_ids.len(), "Course list updated; snapshot saved");
    Ok(true)
}
