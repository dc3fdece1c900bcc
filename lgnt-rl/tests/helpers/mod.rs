//! Shared fixtures for lgnt-rl integration tests
//!
//! In-memory stand-ins for OCRA and the spreadsheet, plus a workspace of
//! temp files wired into [`Settings`].

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use lgnt_common::config::{Settings, TomlConfig};
use lgnt_rl::db::{ArticleRow, BookRow, OcraSource, TrackRow};
use lgnt_rl::sheets::{SpreadsheetClient, ValueRange, WorksheetInfo};
use lgnt_rl::SheetsResult;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

// ============================================================================
// OCRA
// ============================================================================

#[derive(Default)]
pub struct FakeOcra {
    pub class_ids: HashMap<String, Vec<String>>,
    pub books: HashMap<String, Vec<BookRow>>,
    pub articles: HashMap<String, Vec<ArticleRow>>,
    pub tracks: HashMap<String, Vec<TrackRow>>,
}

impl FakeOcra {
    pub fn with_class(mut self, course_id: &str, class_id: &str) -> Self {
        self.class_ids
            .entry(course_id.to_string())
            .or_default()
            .push(class_id.to_string());
        self
    }

    pub fn with_book(mut self, class_id: &str, book: BookRow) -> Self {
        self.books.entry(class_id.to_string()).or_default().push(book);
        self
    }

    pub fn with_article(mut self, class_id: &str, article: ArticleRow) -> Self {
        self.articles
            .entry(class_id.to_string())
            .or_default()
            .push(article);
        self
    }
}

#[async_trait]
impl OcraSource for FakeOcra {
    async fn class_ids(&self, course_id: &str) -> Result<Vec<String>> {
        Ok(self.class_ids.get(course_id).cloned().unwrap_or_default())
    }

    async fn book_readings(&self, class_id: &str) -> Result<Vec<BookRow>> {
        Ok(self.books.get(class_id).cloned().unwrap_or_default())
    }

    async fn article_readings(&self, class_id: &str) -> Result<Vec<ArticleRow>> {
        Ok(self.articles.get(class_id).cloned().unwrap_or_default())
    }

    async fn track_readings(&self, class_id: &str) -> Result<Vec<TrackRow>> {
        Ok(self.tracks.get(class_id).cloned().unwrap_or_default())
    }
}

pub fn book(id: &str, title: &str, author: &str) -> BookRow {
    BookRow {
        bookid: Some(id.to_string()),
        bk_title: Some(title.to_string()),
        bk_author: Some(author.to_string()),
        ..Default::default()
    }
}

pub fn article(id: &str, format: &str, title: &str) -> ArticleRow {
    ArticleRow {
        articleid: Some(id.to_string()),
        format: Some(format.to_string()),
        art_title: Some(title.to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Spreadsheet
// ============================================================================

#[derive(Debug, Clone)]
pub struct FakeWorksheet {
    pub info: WorksheetInfo,
    pub cells: Vec<Vec<String>>,
    pub header_formatted_cols: Option<usize>,
    pub rows: usize,
    pub cols: usize,
}

#[derive(Default)]
struct FakeState {
    sheets: Vec<FakeWorksheet>,
    next_id: i64,
}

impl FakeState {
    fn reindex(&mut self) {
        for (i, ws) in self.sheets.iter_mut().enumerate() {
            ws.info.index = i;
        }
    }

    fn position(&self, sheet_id: i64) -> Option<usize> {
        self.sheets.iter().position(|ws| ws.info.sheet_id == sheet_id)
    }
}

/// Spreadsheet kept in memory; worksheets are ordered by index
#[derive(Default)]
pub struct FakeSpreadsheet {
    state: Mutex<FakeState>,
}

impl FakeSpreadsheet {
    pub fn with_worksheet(self, title: &str, cells: Vec<Vec<&str>>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let sheet_id = state.next_id;
            state.next_id += 1;
            let index = state.sheets.len();
            state.sheets.push(FakeWorksheet {
                info: WorksheetInfo {
                    sheet_id,
                    title: title.to_string(),
                    index,
                },
                cells: cells
                    .into_iter()
                    .map(|row| row.into_iter().map(str::to_string).collect())
                    .collect(),
                header_formatted_cols: None,
                rows: 100,
                cols: 20,
            });
        }
        self
    }

    /// Course-id worksheet with the given ids under a `course_id` header
    pub fn with_course_ids(self, ids: &[&str]) -> Self {
        let mut cells = vec![vec!["course_id", "notes"]];
        cells.extend(ids.iter().map(|id| vec![*id, ""]));
        self.with_worksheet("course_ids_to_check", cells)
    }

    pub fn titles(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.sheets.iter().map(|ws| ws.info.title.clone()).collect()
    }

    pub fn worksheet(&self, title: &str) -> Option<FakeWorksheet> {
        let state = self.state.lock().unwrap();
        state.sheets.iter().find(|ws| ws.info.title == title).cloned()
    }

    pub fn worksheet_starting_with(&self, prefix: &str) -> Option<FakeWorksheet> {
        let state = self.state.lock().unwrap();
        state
            .sheets
            .iter()
            .find(|ws| ws.info.title.starts_with(prefix))
            .cloned()
    }
}

#[async_trait]
impl SpreadsheetClient for FakeSpreadsheet {
    async fn worksheets(&self) -> SheetsResult<Vec<WorksheetInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state.sheets.iter().map(|ws| ws.info.clone()).collect())
    }

    async fn add_worksheet(
        &self,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> SheetsResult<WorksheetInfo> {
        let mut state = self.state.lock().unwrap();
        let sheet_id = state.next_id;
        state.next_id += 1;
        let info = WorksheetInfo {
            sheet_id,
            title: title.to_string(),
            index: state.sheets.len(),
        };
        state.sheets.push(FakeWorksheet {
            info: info.clone(),
            cells: Vec::new(),
            header_formatted_cols: None,
            rows,
            cols,
        });
        Ok(info)
    }

    async fn write_values(&self, worksheet: &str, ranges: Vec<ValueRange>) -> SheetsResult<()> {
        let mut state = self.state.lock().unwrap();
        let ws = state
            .sheets
            .iter_mut()
            .find(|ws| ws.info.title == worksheet)
            .ok_or_else(|| lgnt_rl::SheetsError::NotFound(worksheet.to_string()))?;
        for range in ranges {
            ws.cells.extend(range.values);
        }
        Ok(())
    }

    async fn format_header(&self, sheet_id: i64, columns: usize) -> SheetsResult<()> {
        let mut state = self.state.lock().unwrap();
        let pos = state
            .position(sheet_id)
            .ok_or_else(|| lgnt_rl::SheetsError::NotFound(sheet_id.to_string()))?;
        state.sheets[pos].header_formatted_cols = Some(columns);
        Ok(())
    }

    async fn move_worksheet(&self, sheet_id: i64, index: usize) -> SheetsResult<()> {
        let mut state = self.state.lock().unwrap();
        let pos = state
            .position(sheet_id)
            .ok_or_else(|| lgnt_rl::SheetsError::NotFound(sheet_id.to_string()))?;
        let ws = state.sheets.remove(pos);
        let index = index.min(state.sheets.len());
        state.sheets.insert(index, ws);
        state.reindex();
        Ok(())
    }

    async fn delete_worksheet(&self, sheet_id: i64) -> SheetsResult<()> {
        let mut state = self.state.lock().unwrap();
        let pos = state
            .position(sheet_id)
            .ok_or_else(|| lgnt_rl::SheetsError::NotFound(sheet_id.to_string()))?;
        state.sheets.remove(pos);
        state.reindex();
        Ok(())
    }

    async fn read_values(&self, worksheet: &str) -> SheetsResult<Vec<Vec<String>>> {
        self.worksheet(worksheet)
            .map(|ws| ws.cells)
            .ok_or_else(|| lgnt_rl::SheetsError::NotFound(worksheet.to_string()))
    }
}

// ============================================================================
// Workspace
// ============================================================================

pub const OIT_EXTRACT: &str = "COURSE_CODE\tCOURSE_TITLE\tSECTION_ID\tALL_INSTRUCTORS\n\
brown.hist.1234.2023-fall.s01\tModern History\tS01\tDoe, J\n\
brown.hist.1234.2023-fall.s02\tModern History\tS02\tDoe, J\n\
brown.educ.1000.2023-fall.s01\tLearning\tS01\tRoe, K\n\
brown.math.0100.2023-fall.s01\tCalculus\tS01\tPoe, E\n";

/// Temp directory holding every file a build run reads or writes
pub struct TestWorkspace {
    pub dir: TempDir,
    pub settings: Settings,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let courses = root.join("oit_courses.tsv");
        std::fs::write(&courses, OIT_EXTRACT).unwrap();

        let pdf = root.join("pdf_data.json");
        std::fs::write(&pdf, r#"{"501": "scan_501.pdf"}"#).unwrap();

        let cdl = root.join("cdl.json");
        std::fs::write(
            &cdl,
            r#"[{"title": "The Souls of Black Folk", "url": "https://cdl.example.edu/souls"}]"#,
        )
        .unwrap();

        let toml = TomlConfig {
            courses_filepath: Some(courses),
            pdf_json_path: Some(pdf),
            files_url_pattern: Some("https://files.example.edu/{FILENAME}".to_string()),
            tracker_json_filepath: Some(root.join("tracker.json")),
            last_checked_path: Some(root.join("last_checked.json")),
            output_dir: Some(root.join("output")),
            cdl_json_path: Some(cdl),
            openurl_base: Some("https://library.example.edu/openurl".to_string()),
            public_note: Some("Contact reserves.".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve_with(&toml, |_| None).unwrap();
        Self { dir, settings }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.path("output")) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
