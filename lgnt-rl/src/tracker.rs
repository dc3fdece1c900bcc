//! JSON tracker of processed OIT courses
//!
//! The tracker lets repeated `oit_file` runs pick up where the last one
//! stopped. Courses already in the file are skipped and re-stamped; the
//! in-memory entries are merged over the file on write.

use crate::leganto::LegantoRow;
use crate::NO_OCRA_MARKER;
use anyhow::{Context, Result};
use chrono::Local;
use lgnt_common::json_store::{read_json_optional, write_json_atomic};
use lgnt_common::time::iso_stamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// Document
// ============================================================================

/// Counts kept alongside the entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerMeta {
    #[serde(default)]
    pub processed_oit_course_count: usize,
    #[serde(default)]
    pub total_oit_course_count: usize,
}

/// Status record for one OIT course
///
/// Pending entries have neither field and serialize as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_stamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TrackerEntry {
    fn stamped(status: impl Into<String>) -> Self {
        Self {
            datetime_stamp: Some(iso_stamp(Local::now())),
            status: Some(status.into()),
        }
    }
}

/// On-disk tracker layout
///
/// Fields and map keys serialize in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerDocument {
    #[serde(default)]
    pub meta: TrackerMeta,
    #[serde(default)]
    pub oit_courses_processed: BTreeMap<String, TrackerEntry>,
    #[serde(default)]
    pub recent_course_data: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Status rules
// ============================================================================

pub const STATUS_PROCESSED: &str = "processed";
pub const STATUS_ALREADY_PROCESSED: &str = "already_processed";

fn no_ocra_already_processed() -> String {
    format!("{}_{}", NO_OCRA_MARKER, STATUS_ALREADY_PROCESSED)
}

/// Status to record for a course found again in the tracker file
pub fn reprocessed_status(existing: Option<&str>) -> String {
    match existing {
        Some(status) if status == NO_OCRA_MARKER => no_ocra_already_processed(),
        Some(status) if status == no_ocra_already_processed() => status.to_string(),
        _ => STATUS_ALREADY_PROCESSED.to_string(),
    }
}

// ============================================================================
// Tracker
// ============================================================================

#[derive(Debug, Clone)]
pub struct Tracker {
    doc: TrackerDocument,
}

impl Tracker {
    /// Fresh tracker for an OIT extract of `total_oit_course_count` rows
    pub fn new(total_oit_course_count: usize) -> Self {
        Self {
            doc: TrackerDocument {
                meta: TrackerMeta {
                    processed_oit_course_count: 0,
                    total_oit_course_count,
                },
                ..Default::default()
            },
        }
    }

    pub fn document(&self) -> &TrackerDocument {
        &self.doc
    }

    /// Drop codes the tracker file already lists, re-stamping them in memory
    ///
    /// A missing or unreadable file means nothing has been processed yet.
    pub fn remove_already_processed(&mut self, codes: Vec<String>, path: &Path) -> Vec<String> {
        let existing = load_document(path).unwrap_or_default();

        let mut remaining = Vec::with_capacity(codes.len());
        let mut skipped = 0usize;
        for code in codes {
            match existing.oit_courses_processed.get(&code) {
                Some(entry) => {
                    let status = reprocessed_status(entry.status.as_deref());
                    debug!(course = %code, status = %status, "Course already processed");
                    skipped += 1;
                    self.doc
                        .oit_courses_processed
                        .insert(code, TrackerEntry::stamped(status));
                }
                None => remaining.push(code),
            }
        }

        info!(remaining = remaining.len(), skipped, "Tracker dedup complete");
        remaining
    }

    /// Add pending entries for the courses about to run
    pub fn populate(&mut self, codes: &[String]) {
        for code in codes {
            self.doc
                .oit_courses_processed
                .insert(code.clone(), TrackerEntry::default());
        }
        debug!(count = codes.len(), "Tracker populated with pending courses");
    }

    /// Stamp each row's course with its outcome
    pub fn record_results(&mut self, rows: &[LegantoRow]) {
        for row in rows {
            let code = row.get("coursecode");
            if code.trim().is_empty() {
                continue;
            }
            let status = if row.get("citation_library_note") == NO_OCRA_MARKER {
                NO_OCRA_MARKER
            } else {
                STATUS_PROCESSED
            };
            self.doc
                .oit_courses_processed
                .insert(code.to_string(), TrackerEntry::stamped(status));
        }
    }

    /// Persist, merging over whatever the file already holds
    ///
    /// An unparseable file is replaced by the in-memory document.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        self.doc.meta.processed_oit_course_count = self.doc.oit_courses_processed.len();

        let merged = match read_json_optional::<TrackerDocument>(path) {
            Ok(None) => {
                debug!("Creating tracker file {}", path.display());
                self.doc.clone()
            }
            Ok(Some(mut existing)) => {
                for (code, entry) in &self.doc.oit_courses_processed {
                    existing
                        .oit_courses_processed
                        .insert(code.clone(), entry.clone());
                }
                existing.meta.processed_oit_course_count = existing.oit_courses_processed.len();
                existing
            }
            Err(e) => {
                warn!("Tracker file {} unreadable ({}); overwriting", path.display(), e);
                self.doc.clone()
            }
        };

        write_json_atomic(&merged, path)
            .with_context(|| format!("Failed to write tracker {}", path.display()))?;
        info!(
            processed = merged.meta.processed_oit_course_count,
            total = merged.meta.total_oit_course_count,
            "Tracker written"
        );
        Ok(())
    }
}

fn load_document(path: &Path) -> Option<TrackerDocument> {
    match read_json_optional::<TrackerDocument>(path) {
        Ok(Some(doc)) => Some(doc),
        Ok(None) => {
            debug!("No tracker file at {}", path.display());
            None
        }
        Err(e) => {
            warn!("Problem loading tracker {}: {}", path.display(), e);
            None
        }
    }
}
