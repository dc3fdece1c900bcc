//! lgnt-rl library interface
//!
//! Builds Leganto reading lists from OCRA course-reserves data and OIT
//! course-catalog data, publishes them to a spreadsheet and a delimited file,
//! and tracks processed courses across runs.

pub mod change_check;
pub mod cli;
pub mod db;
pub mod error;
pub mod leganto;
pub mod oit;
pub mod output;
pub mod pipeline;
pub mod readings;
pub mod sheets;
pub mod subset;
pub mod tracker;

pub use crate::error::{SheetsError, SheetsResult};

/// Marker written where a course has no OCRA books, articles or excerpts
pub const NO_OCRA_MARKER: &str = "NO-OCRA-BOOKS/ARTICLES/EXCERPTS-FOUND";

/// Prefix for Leganto course ids of courses missing from the OIT extract
pub const OIT_NOT_FOUND_MARKER: &str = "oit_course_code_not_found";
