//! Google-Sheets publishing
//!
//! The pipeline talks to a [`SpreadsheetClient`]; [`GoogleSheetsClient`] is
//! the live implementation. Publishing keeps the course-id worksheet first,
//! puts the new Leganto worksheet second, drops everything older, and ends
//! with a staff worksheet for the same run.

pub mod auth;
pub mod client;

pub use client::GoogleSheetsClient;

use crate::error::{SheetsError, SheetsResult};
use crate::leganto::{LegantoRow, HEADERS};
use crate::readings::BasicRecord;
use crate::NO_OCRA_MARKER;
use async_trait::async_trait;
use tracing::{debug, info};

/// Worksheet listing the course ids to process
pub const COURSE_IDS_WORKSHEET: &str = "course_ids_to_check";
pub const COURSE_ID_COLUMN: &str = "course_id";

const MIN_ROWS: usize = 100;
const MIN_COLS: usize = 20;

/// Staff worksheet columns
pub const STAFF_HEADERS: [&str; 19] = [
    "coursecode",
    "section_id",
    "citation_secondary_type",
    "citation_title",
    "citation_journal_title",
    "citation_author",
    "citation_publication_date",
    "citation_doi",
    "citation_isbn",
    "citation_issn",
    "citation_volume",
    "citation_issue",
    "citation_start_page",
    "citation_end_page",
    "citation_source1",
    "citation_source2",
    "citation_source3",
    "citation_source4",
    "external_system_id",
];

/// A worksheet (tab) within the spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetInfo {
    pub sheet_id: i64,
    pub title: String,
    pub index: usize,
}

/// Values for one A1 range of a worksheet, e.g. `A1:BO1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

/// Operations the publisher needs from a spreadsheet
#[async_trait]
pub trait SpreadsheetClient: Send + Sync {
    /// Worksheets ordered by index
    async fn worksheets(&self) -> SheetsResult<Vec<WorksheetInfo>>;

    async fn add_worksheet(&self, title: &str, rows: usize, cols: usize)
        -> SheetsResult<WorksheetInfo>;

    /// Write raw (unparsed) values to ranges of one worksheet in one call
    async fn write_values(&self, worksheet: &str, ranges: Vec<ValueRange>) -> SheetsResult<()>;

    /// Bold the first row across `columns` columns and freeze it
    async fn format_header(&self, sheet_id: i64, columns: usize) -> SheetsResult<()>;

    async fn move_worksheet(&self, sheet_id: i64, index: usize) -> SheetsResult<()>;

    async fn delete_worksheet(&self, sheet_id: i64) -> SheetsResult<()>;

    /// All populated rows of a worksheet, header row included
    async fn read_values(&self, worksheet: &str) -> SheetsResult<Vec<Vec<String>>>;
}

/// Spreadsheet column letters for a 1-based column number (1 = A, 27 = AA)
pub fn end_column(n: usize) -> String {
    let mut n = n;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Staff worksheet row for a basic record
pub fn staff_row(record: &BasicRecord) -> Vec<String> {
    let external_id = if record.external_system_id.trim().is_empty() {
        NO_OCRA_MARKER.to_string()
    } else {
        record.external_system_id.clone()
    };
    vec![
        record.coursecode.clone(),
        record.section_id.clone(),
        record.type_label().to_string(),
        record.title.clone(),
        record.journal_title.clone(),
        record.author.clone(),
        record.publication_date.clone(),
        record.doi.clone(),
        record.isbn.clone(),
        record.issn.clone(),
        record.volume.clone(),
        record.issue.clone(),
        record.start_page.clone(),
        record.end_page.clone(),
        record.source1.to_string(),
        record.source2.clone().unwrap_or_default(),
        record.source3.clone().unwrap_or_default(),
        record.source4.to_string(),
        external_id,
    ]
}

/// Course ids listed on the course-id worksheet, blanks dropped, sorted
pub async fn read_course_ids(client: &dyn SpreadsheetClient) -> SheetsResult<Vec<String>> {
    let rows = client.read_values(COURSE_IDS_WORKSHEET).await?;
    let Some((header, data)) = rows.split_first() else {
        debug!("Course-id worksheet is empty");
        return Ok(Vec::new());
    };
    let column = header
        .iter()
        .position(|h| h.trim() == COURSE_ID_COLUMN)
        .ok_or_else(|| {
            SheetsError::NotFound(format!(
                "column '{}' in worksheet '{}'",
                COURSE_ID_COLUMN, COURSE_IDS_WORKSHEET
            ))
        })?;

    let mut ids: Vec<String> = data
        .iter()
        .filter_map(|row| row.get(column))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    ids.sort();
    debug!(count = ids.len(), "Course ids read from spreadsheet");
    Ok(ids)
}

fn header_and_rows(
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> (Vec<ValueRange>, usize, usize) {
    let last_col = end_column(headers.len());
    let row_count = rows.len();
    let mut ranges = vec![ValueRange {
        range: format!("A1:{}1", last_col),
        values: vec![headers.iter().map(|h| h.to_string()).collect()],
    }];
    if row_count > 0 {
        ranges.push(ValueRange {
            range: format!("A2:{}{}", last_col, row_count + 1),
            values: rows,
        });
    }
    let sheet_rows = MIN_ROWS.max(row_count + 1);
    let sheet_cols = MIN_COLS.max(headers.len());
    (ranges, sheet_rows, sheet_cols)
}

/// Publish one run's Leganto and staff worksheets
///
/// `stamp` names both worksheets (`leganto_<stamp>`, `staff_<stamp>`).
pub async fn publish(
    client: &dyn SpreadsheetClient,
    records: &[BasicRecord],
    rows: &[LegantoRow],
    stamp: &str,
) -> SheetsResult<()> {
    // Leganto worksheet
    let leganto_title = format!("leganto_{}", stamp);
    let (ranges, sheet_rows, sheet_cols) = header_and_rows(
        &HEADERS,
        rows.iter().map(|r| r.values().to_vec()).collect(),
    );
    let leganto = client
        .add_worksheet(&leganto_title, sheet_rows, sheet_cols)
        .await?;
    client.write_values(&leganto_title, ranges).await?;
    client.format_header(leganto.sheet_id, HEADERS.len()).await?;
    client.move_worksheet(leganto.sheet_id, 1).await?;
    info!(worksheet = %leganto_title, rows = rows.len(), "Leganto worksheet written");

    // Anything after the new worksheet belongs to an earlier run
    let stale: Vec<WorksheetInfo> = client
        .worksheets()
        .await?
        .into_iter()
        .filter(|ws| ws.index > 1 && ws.sheet_id != leganto.sheet_id)
        .collect();
    for ws in &stale {
        debug!(worksheet = %ws.title, "Deleting old worksheet");
        client.delete_worksheet(ws.sheet_id).await?;
    }

    // Staff worksheet
    let staff_title = format!("staff_{}", stamp);
    let (ranges, sheet_rows, sheet_cols) =
        header_and_rows(&STAFF_HEADERS, records.iter().map(staff_row).collect());
    let staff = client
        .add_worksheet(&staff_title, sheet_rows, sheet_cols)
        .await?;
    client.write_values(&staff_title, ranges).await?;
    client.format_header(staff.sheet_id, STAFF_HEADERS.len()).await?;
    info!(
        worksheet = %staff_title,
        rows = records.len(),
        deleted = stale.len(),
        "Staff worksheet written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::{PdfLink, PrimaryLink, ReadingKind};

    #[test]
    fn test_end_column() {
        assert_eq!(end_column(1), "A");
        assert_eq!(end_column(19), "S");
        assert_eq!(end_column(26), "Z");
        assert_eq!(end_column(27), "AA");
        assert_eq!(end_column(52), "AZ");
        assert_eq!(end_column(67), "BO");
        assert_eq!(end_column(0), "");
    }

    #[test]
    fn test_staff_row_for_reading() {
        let record = BasicRecord {
            coursecode: "brown.hist.1234.2023-fall.s01".into(),
            kind: Some(ReadingKind::Book),
            title: "Beloved".into(),
            source1: PrimaryLink::CdlNotFound,
            source3: Some("https://lib/openurl?genre=book".into()),
            source4: PdfLink::NotFound,
            external_system_id: "12".into(),
            ..Default::default()
        };
        let row = staff_row(&record);
        assert_eq!(row.len(), STAFF_HEADERS.len());
        assert_eq!(row[2], "BK");
        assert_eq!(row[14], "no CDL link found");
        assert_eq!(row[15], "");
        assert_eq!(row[16], "https://lib/openurl?genre=book");
        assert_eq!(row[17], "no_pdf_found");
        assert_eq!(row[18], "12");
    }

    #[test]
    fn test_staff_row_for_placeholder() {
        let row = staff_row(&BasicRecord::default());
        assert_eq!(row[2], "");
        assert_eq!(row[18], NO_OCRA_MARKER);
    }

    #[test]
    fn test_header_and_rows_sizes() {
        let (ranges, rows, cols) = header_and_rows(&STAFF_HEADERS, Vec::new());
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].range, "A1:S1");
        assert_eq!((rows, cols), (100, 20));

        let data = vec![vec!["x".to_string(); 67]; 150];
        let (ranges, rows, cols) = header_and_rows(&HEADERS, data);
        assert_eq!(ranges[1].range, "A2:BO151");
        assert_eq!((rows, cols), (151, 67));
    }
}
