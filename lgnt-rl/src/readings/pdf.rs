//! Pre-extracted scanned-PDF data
//!
//! A JSON object mapping OCRA article ids to PDF filenames. The data is
//! produced elsewhere; here it is only read and checked for staleness.

use super::PdfLink;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const FILENAME_PLACEHOLDER: &str = "{FILENAME}";

#[derive(Debug, Clone, Default)]
pub struct PdfData {
    files: HashMap<String, String>,
    url_pattern: String,
}

impl PdfData {
    /// Load the id -> filename map
    pub fn load(path: &Path, url_pattern: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read PDF data {}", path.display()))?;
        let files: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse PDF data {}", path.display()))?;
        debug!(entries = files.len(), "PDF data loaded");
        Ok(Self::from_map(files, url_pattern))
    }

    pub fn from_map(files: HashMap<String, String>, url_pattern: &str) -> Self {
        if !url_pattern.contains(FILENAME_PLACEHOLDER) {
            warn!("PDF url pattern has no {} placeholder", FILENAME_PLACEHOLDER);
        }
        Self {
            files,
            url_pattern: url_pattern.to_string(),
        }
    }

    /// Link for an article id; `NotFound` when no scan is on file
    pub fn link_for(&self, article_id: Option<&str>) -> PdfLink {
        let Some(id) = article_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return PdfLink::NotFound;
        };
        match self.files.get(id) {
            Some(filename) if !filename.trim().is_empty() => {
                PdfLink::Found(self.url_pattern.replace(FILENAME_PLACEHOLDER, filename.trim()))
            }
            _ => PdfLink::NotFound,
        }
    }
}

/// `true` when the file's mtime plus `days` is before `now`
pub fn needs_refresh(path: &Path, days: u32, now: DateTime<Local>) -> Result<bool> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let modified: DateTime<Local> = modified.into();
    let cutoff = modified + Duration::days(i64::from(days));
    debug!(cutoff = %cutoff, now = %now, "PDF data freshness cutoff");
    Ok(cutoff < now)
}
