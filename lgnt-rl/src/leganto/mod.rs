//! Leganto citation schema
//!
//! Every output row has the same fixed columns. Most stay blank; the ones
//! this tool knows about are filled from a [`BasicRecord`].

pub mod fields;

use crate::readings::BasicRecord;
use tracing::{debug, warn};

pub use fields::{
    citation_source, clean_citation_author, clean_citation_title, leganto_course_code,
    leganto_type, staff_note,
};

pub const CITATION_STATUS: &str = "BeingPrepared";
pub const READING_LIST_STATUS: &str = "BeingPrepared";
pub const SECTION_NAME: &str = "Resources";
pub const VISIBILITY: &str = "RESTRICTED";

/// Leganto import columns, in order
pub const HEADERS: [&str; 67] = [
    "coursecode",
    "section_id",
    "searchable_id1",
    "searchable_id2",
    "searchable_id3",
    "reading_list_code",
    "reading_list_name",
    "reading_list_description",
    "reading_list_subject",
    "reading_list_status",
    "RLStatus",
    "visibility",
    "reading_list_assigned_to",
    "reading_list_library_note",
    "reading_list_instructor_note",
    "owner_user_name",
    "creativecommon",
    "section_name",
    "section_description",
    "section_start_date",
    "section_end_date",
    "section_tags",
    "citation_secondary_type",
    "citation_status",
    "citation_tags",
    "citation_mms_id",
    "citation_original_system_id",
    "citation_title",
    "citation_journal_title",
    "citation_author",
    "citation_publication_date",
    "citation_edition",
    "citation_isbn",
    "citation_issn",
    "citation_place_of_publication",
    "citation_publisher",
    "citation_volume",
    "citation_issue",
    "citation_pages",
    "citation_start_page",
    "citation_end_page",
    "citation_doi",
    "citation_oclc",
    "citation_lccn",
    "citation_chapter",
    "rlterms_chapter_title",
    "citation_chapter_author",
    "editor",
    "citation_source",
    "citation_source1",
    "citation_source2",
    "citation_source3",
    "citation_source4",
    "citation_source5",
    "citation_source6",
    "citation_source7",
    "citation_source8",
    "citation_source9",
    "citation_source10",
    "citation_note",
    "additional_person_name",
    "file_name",
    "citation_public_note",
    "license_type",
    "citation_instructor_note",
    "citation_library_note",
    "external_system_id",
];

/// One row of the Leganto schema; every column starts blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegantoRow {
    values: Vec<String>,
}

impl Default for LegantoRow {
    fn default() -> Self {
        Self::new()
    }
}

impl LegantoRow {
    pub fn new() -> Self {
        Self {
            values: vec![String::new(); HEADERS.len()],
        }
    }

    fn index_of(column: &str) -> Option<usize> {
        HEADERS.iter().position(|h| *h == column)
    }

    /// Value of a column; blank for unknown columns
    pub fn get(&self, column: &str) -> &str {
        Self::index_of(column)
            .map(|i| self.values[i].as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        match Self::index_of(column) {
            Some(i) => self.values[i] = value.into(),
            None => warn!(column, "Ignoring value for unknown Leganto column"),
        }
    }

    /// Values in header order
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Turn basic records into Leganto rows
///
/// Citation-level fields are only filled for records backed by an OCRA id.
/// List-level fields are filled for every row, placeholders included, so
/// an empty course still produces a reading list.
pub fn build_rows(records: &[BasicRecord], public_note: &str) -> Vec<LegantoRow> {
    let rows: Vec<LegantoRow> = records
        .iter()
        .map(|record| {
            let has_ocra_id = !record.external_system_id.trim().is_empty();
            let coursecode = leganto_course_code(&record.coursecode);

            let mut row = LegantoRow::new();
            row.set("citation_author", clean_citation_author(&record.author));
            row.set("citation_doi", record.doi.as_str());
            row.set("citation_end_page", record.end_page.as_str());
            row.set("citation_isbn", record.isbn.as_str());
            row.set("citation_issn", record.issn.as_str());
            row.set("citation_issue", record.issue.as_str());
            row.set("citation_journal_title", record.journal_title.as_str());
            row.set("citation_publication_date", record.publication_date.as_str());
            row.set("citation_secondary_type", leganto_type(record.type_label()));
            row.set("citation_source", citation_source(record));
            row.set("citation_start_page", record.start_page.as_str());
            row.set("citation_title", clean_citation_title(&record.title));
            row.set("citation_volume", record.volume.as_str());
            row.set("citation_library_note", staff_note(record));
            row.set("section_id", record.section_id.as_str());

            if has_ocra_id {
                row.set("citation_public_note", public_note);
                row.set("citation_status", CITATION_STATUS);
                row.set("reading_list_code", coursecode.as_str());
            }

            row.set("coursecode", coursecode);
            row.set("reading_list_name", record.reading_list_name.as_str());
            row.set("reading_list_status", READING_LIST_STATUS);
            row.set("section_name", SECTION_NAME);
            row.set("visibility", VISIBILITY);
            row
        })
        .collect();

    debug!(rows = rows.len(), "Leganto rows built");
    rows
}
