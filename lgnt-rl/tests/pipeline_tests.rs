//! End-to-end build runs against in-memory OCRA and spreadsheet fakes

mod helpers;

use helpers::{article, book, FakeOcra, FakeSpreadsheet, TestWorkspace};
use lgnt_rl::leganto::HEADERS;
use lgnt_rl::oit::OitCourseLoader;
use lgnt_rl::pipeline::{BuildOptions, CourseSelection, ReadingListBuilder};
use lgnt_rl::sheets::{SpreadsheetClient, STAFF_HEADERS};
use lgnt_rl::tracker::TrackerDocument;
use lgnt_rl::NO_OCRA_MARKER;
use std::collections::HashMap;
use std::path::Path;

fn ocra() -> FakeOcra {
    FakeOcra::default()
        .with_class("HIST1234", "c1")
        .with_article("c1", article("501", "article", "On Things."))
        .with_book("c1", book("77", "The Souls of Black Folk", "Du Bois, W. E. B."))
}

fn options(selection: CourseSelection, update_ss: bool, force: bool) -> BuildOptions {
    BuildOptions {
        selection,
        update_ss,
        force,
        range: None,
    }
}

/// Data rows of a written reading list, keyed by column name
fn read_rows(path: &Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), HEADERS.len());
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            headers
                .iter()
                .zip(r.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_build_for_course_list() {
    let ws = TestWorkspace::new();
    let oit = OitCourseLoader::load(ws.settings.courses_filepath().unwrap()).unwrap();
    let ocra = ocra();
    let builder = ReadingListBuilder::new(&ws.settings, &oit, &ocra, None).unwrap();

    let selection = CourseSelection::parse("HIST1234,EDUC1000,ZZZZ9999");
    let report = builder.run(&options(selection, false, false)).await.unwrap();

    // HIST1234 has two sections with two readings each; the others are placeholders
    assert_eq!(report.course_ids, 3);
    assert_eq!(report.records, 6);
    assert!(!report.published);

    let path = report.output_path.expect("output written");
    let rows = read_rows(&path);
    assert_eq!(rows.len(), 6);

    let first = &rows[0];
    assert_eq!(first["coursecode"], "brown.hist.1234.2023-fall.s01");
    assert_eq!(first["reading_list_name"], "Modern History");
    assert_eq!(first["citation_secondary_type"], "JR");
    assert_eq!(first["citation_title"], "On Things");
    assert_eq!(first["citation_source"], "https://files.example.edu/scan_501.pdf");
    assert_eq!(first["citation_public_note"], "Contact reserves.");

    let book_row = &rows[1];
    assert_eq!(book_row["citation_secondary_type"], "BK");
    assert_eq!(book_row["citation_source"], "https://cdl.example.edu/souls");

    assert_eq!(rows[2]["coursecode"], "brown.hist.1234.2023-fall.s02");

    let no_class = &rows[4];
    assert_eq!(no_class["coursecode"], "brown.educ.1000.2023-fall.s01");
    assert_eq!(no_class["citation_library_note"], NO_OCRA_MARKER);
    assert_eq!(no_class["citation_public_note"], "");

    let not_in_oit = &rows[5];
    assert_eq!(not_in_oit["coursecode"], "");
    assert_eq!(not_in_oit["citation_library_note"], NO_OCRA_MARKER);

    // Only OIT-file runs touch the tracker
    assert!(!ws.path("tracker.json").exists());
}

#[tokio::test]
async fn test_spreadsheet_run_publishes_and_skips_unchanged() {
    let ws = TestWorkspace::new();
    let oit = OitCourseLoader::load(ws.settings.courses_filepath().unwrap()).unwrap();
    let ocra = ocra();
    let sheet = FakeSpreadsheet::default()
        .with_course_ids(&["HIST1234", "", " EDUC1000 "])
        .with_worksheet("leganto_old", vec![vec!["coursecode"]])
        .with_worksheet("staff_old", vec![vec!["coursecode"]]);
    let client: &dyn SpreadsheetClient = &sheet;
    let builder = ReadingListBuilder::new(&ws.settings, &oit, &ocra, Some(client)).unwrap();

    let report = builder
        .run(&options(CourseSelection::Spreadsheet, true, false))
        .await
        .unwrap();
    assert_eq!(report.course_ids, 2);
    assert!(report.published);
    assert!(report.output_path.is_some());

    // Snapshot saved, sorted
    let saved: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(ws.path("last_checked.json")).unwrap())
            .unwrap();
    assert_eq!(saved, vec!["EDUC1000", "HIST1234"]);

    // Course ids first, then the new leganto and staff worksheets; old ones gone
    let titles = sheet.titles();
    assert_eq!(titles.len(), 3);
    assert_eq!(titles[0], "course_ids_to_check");
    assert!(titles[1].starts_with("leganto_"));
    assert!(titles[2].starts_with("staff_"));

    let leganto = sheet.worksheet_starting_with("leganto_").unwrap();
    assert_eq!(leganto.cells[0].len(), HEADERS.len());
    assert_eq!(leganto.cells.len(), 1 + report.records);
    assert_eq!(leganto.header_formatted_cols, Some(67));
    assert_eq!(leganto.rows, 100);

    let staff = sheet.worksheet_starting_with("staff_").unwrap();
    assert_eq!(staff.cells[0].len(), STAFF_HEADERS.len());
    assert_eq!(staff.header_formatted_cols, Some(19));
    // EDUC1000 sorts first and has no class, so its staff row is a placeholder
    assert_eq!(staff.cells[1][0], "brown.educ.1000.2023-fall.s01");
    assert_eq!(staff.cells[1][18], NO_OCRA_MARKER);

    // Same list again: nothing happens
    let before = ws.output_files().len();
    let report = builder
        .run(&options(CourseSelection::Spreadsheet, true, false))
        .await
        .unwrap();
    assert!(report.output_path.is_none());
    assert_eq!(ws.output_files().len(), before);
    assert_eq!(sheet.titles(), titles);
}

#[tokio::test]
async fn test_force_skips_change_check() {
    let ws = TestWorkspace::new();
    std::fs::write(ws.path("last_checked.json"), r#"["HIST1234"]"#).unwrap();

    let oit = OitCourseLoader::load(ws.settings.courses_filepath().unwrap()).unwrap();
    let ocra = ocra();
    let sheet = FakeSpreadsheet::default().with_course_ids(&["HIST1234"]);
    let client: &dyn SpreadsheetClient = &sheet;
    let builder = ReadingListBuilder::new(&ws.settings, &oit, &ocra, Some(client)).unwrap();

    let unforced = builder
        .run(&options(CourseSelection::Spreadsheet, false, false))
        .await
        .unwrap();
    assert!(unforced.output_path.is_none());

    let forced = builder
        .run(&options(CourseSelection::Spreadsheet, false, true))
        .await
        .unwrap();
    assert_eq!(forced.records, 4);
    assert!(forced.output_path.is_some());
    // Not publishing leaves the spreadsheet alone
    assert_eq!(sheet.titles(), vec!["course_ids_to_check"]);
}

#[tokio::test]
async fn test_spreadsheet_run_without_client_fails() {
    let ws = TestWorkspace::new();
    let oit = OitCourseLoader::load(ws.settings.courses_filepath().unwrap()).unwrap();
    let ocra = ocra();
    let builder = ReadingListBuilder::new(&ws.settings, &oit, &ocra, None).unwrap();

    let result = builder
        .run(&options(CourseSelection::Spreadsheet, false, true))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_oit_file_run_updates_tracker() {
    let ws = TestWorkspace::new();
    std::fs::write(
        ws.path("tracker.json"),
        r#"{
  "meta": {"processed_oit_course_count": 1, "total_oit_course_count": 4},
  "oit_courses_processed": {
    "brown.math.0100.2023-fall.s01": {"datetime_stamp": "2023-08-01T10:00:00", "status": "processed"}
  },
  "recent_course_data": {}
}"#,
    )
    .unwrap();

    let oit = OitCourseLoader::load(ws.settings.courses_filepath().unwrap()).unwrap();
    let ocra = ocra();
    let builder = ReadingListBuilder::new(&ws.settings, &oit, &ocra, None).unwrap();

    let report = builder
        .run(&options(CourseSelection::OitFile, false, false))
        .await
        .unwrap();
    // math was already processed
    assert_eq!(report.course_ids, 3);
    assert_eq!(report.records, 5);

    let doc: TrackerDocument =
        serde_json::from_str(&std::fs::read_to_string(ws.path("tracker.json")).unwrap()).unwrap();
    assert_eq!(doc.meta.processed_oit_course_count, 4);
    assert_eq!(doc.meta.total_oit_course_count, 4);

    let status = |code: &str| {
        doc.oit_courses_processed[code]
            .status
            .clone()
            .unwrap_or_default()
    };
    assert_eq!(status("brown.hist.1234.2023-fall.s01"), "processed");
    assert_eq!(status("brown.hist.1234.2023-fall.s02"), "processed");
    assert_eq!(status("brown.educ.1000.2023-fall.s01"), NO_OCRA_MARKER);
    assert_eq!(status("brown.math.0100.2023-fall.s01"), "already_processed");

    // A second run finds everything processed and produces an empty list
    let report = builder
        .run(&options(CourseSelection::OitFile, false, false))
        .await
        .unwrap();
    assert_eq!(report.course_ids, 0);
    assert_eq!(report.records, 0);
}

#[tokio::test]
async fn test_oit_file_range() {
    let ws = TestWorkspace::new();
    let oit = OitCourseLoader::load(ws.settings.courses_filepath().unwrap()).unwrap();
    let ocra = ocra();
    let builder = ReadingListBuilder::new(&ws.settings, &oit, &ocra, None).unwrap();

    // File lines 2..=3 are the two HIST1234 sections
    let mut opts = options(CourseSelection::OitFile, false, false);
    opts.range = Some(lgnt_rl::oit::RowRange::from_inclusive_lines(2, 3).unwrap());
    let report = builder.run(&opts).await.unwrap();

    assert_eq!(report.course_ids, 2);
    assert_eq!(report.records, 4);
}
