//! OIT course-catalog extract
//!
//! The extract is a tab-separated file with a header row. Only four columns
//! matter here; any others are ignored.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// One row of the OIT extract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OitCourse {
    /// Full OIT code, e.g. `brown.afri.0090.2023-fall.s01`
    #[serde(rename = "COURSE_CODE")]
    pub course_code: String,
    #[serde(rename = "COURSE_TITLE", default)]
    pub course_title: String,
    #[serde(rename = "SECTION_ID", default)]
    pub section_id: String,
    #[serde(rename = "ALL_INSTRUCTORS", default)]
    pub all_instructors: String,
}

/// Half-open row slice `[start, end)` over the course-code list
///
/// Built from the inclusive file line numbers a user sees in an editor,
/// where line 1 is the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    /// Convert inclusive file line numbers into a slice over data rows
    pub fn from_inclusive_lines(start_line: usize, end_line: usize) -> Result<Self> {
        if start_line < 1 {
            bail!("range start must be at least 1, got {}", start_line);
        }
        if start_line > end_line {
            bail!("range start {} is after range end {}", start_line, end_line);
        }
        // Line 1 is the header, so it contributes nothing.
        let start = if start_line == 1 { 0 } else { start_line - 2 };
        let end = if end_line == 1 { 0 } else { end_line - 1 };
        Ok(Self { start, end })
    }

    /// Apply to a slice, clamping both bounds to its length
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        let start = self.start.min(end);
        &items[start..end]
    }
}

/// `brown.afri.0090.2023-fall.s01` -> `AFRI0090`; empty when malformed
pub fn plain_course_code(oit_code: &str) -> String {
    let mut parts = oit_code.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(dept), Some(number)) => {
            format!("{}{}", dept.to_uppercase(), number.to_uppercase())
        }
        _ => {
            warn!("Cannot derive plain course code from `{}`", oit_code);
            String::new()
        }
    }
}

/// In-memory OIT extract
#[derive(Debug, Clone, Default)]
pub struct OitCourseLoader {
    courses: Vec<OitCourse>,
}

impl OitCourseLoader {
    /// Load the tab-separated extract from disk
    pub fn load(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .from_path(path)
            .with_context(|| format!("Failed to open OIT course file {}", path.display()))?;
        Self::from_reader(reader)
            .with_context(|| format!("Failed to parse OIT course file {}", path.display()))
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut courses = Vec::new();
        for record in reader.deserialize::<OitCourse>() {
            courses.push(record?);
        }
        if let Some(first) = courses.first() {
            debug!(first = ?first, total = courses.len(), "Loaded OIT course data");
        }
        Ok(Self { courses })
    }

    pub fn from_courses(courses: Vec<OitCourse>) -> Self {
        Self { courses }
    }

    pub fn courses(&self) -> &[OitCourse] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// All course codes in file order, optionally sliced
    pub fn course_codes(&self, range: Option<RowRange>) -> Vec<String> {
        let codes: Vec<String> = self.courses.iter().map(|c| c.course_code.clone()).collect();
        let selected = match range {
            Some(range) => range.apply(&codes).to_vec(),
            None => codes,
        };
        debug!(count = selected.len(), "Course codes selected from OIT data");
        selected
    }

    /// Look up OIT rows for a course id
    ///
    /// A dotted id is a full OIT code and yields at most the first exact
    /// match. A plain id such as `HIST1234` yields every section whose plain
    /// code matches.
    pub fn find(&self, course_id: &str) -> Vec<&OitCourse> {
        let found: Vec<&OitCourse> = if course_id.contains('.') {
            self.courses
                .iter()
                .find(|c| c.course_code == course_id)
                .into_iter()
                .collect()
        } else {
            self.courses
                .iter()
                .filter(|c| plain_course_code(&c.course_code) == course_id)
                .collect()
        };
        debug!(course_id, matches = found.len(), "OIT lookup");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "COURSE_CODE\tCOURSE_TITLE\tSECTION_ID\tALL_INSTRUCTORS\tEXTRA\n\
brown.afri.0090.2023-fall.s01\tAfricana Intro\tS01\t12345\tx\n\
brown.afri.0090.2023-fall.s02\tAfricana Intro\tS02\t12345\tx\n\
brown.hist.1234.2023-fall.s01\tModern History\tS01\t\tx\n";

    fn loader() -> OitCourseLoader {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .from_reader(SAMPLE.as_bytes());
        OitCourseLoader::from_reader(reader).unwrap()
    }

    #[test]
    fn test_loads_rows_and_ignores_extra_columns() {
        let loader = loader();
        assert_eq!(loader.len(), 3);
        assert_eq!(loader.courses()[0].course_title, "Africana Intro");
        assert_eq!(loader.courses()[2].all_instructors, "");
    }

    #[test]
    fn test_plain_course_code() {
        assert_eq!(plain_course_code("brown.afri.0090.2023-fall.s01"), "AFRI0090");
        assert_eq!(plain_course_code("brown.afri"), "");
        assert_eq!(plain_course_code(""), "");
    }

    #[test]
    fn test_find_by_full_code_returns_first_exact_match() {
        let loader = loader();
        let found = loader.find("brown.afri.0090.2023-fall.s02");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].section_id, "S02");
    }

    #[test]
    fn test_find_by_plain_code_returns_all_sections() {
        let loader = loader();
        assert_eq!(loader.find("AFRI0090").len(), 2);
        assert!(loader.find("CHEM0100").is_empty());
    }

    #[test]
    fn test_range_from_inclusive_lines() {
        // Lines 2..=3 are the first two data rows.
        assert_eq!(RowRange::from_inclusive_lines(2, 3).unwrap(), RowRange { start: 0, end: 2 });
        assert_eq!(RowRange::from_inclusive_lines(1, 1).unwrap(), RowRange { start: 0, end: 0 });
        assert_eq!(RowRange::from_inclusive_lines(1, 4).unwrap(), RowRange { start: 0, end: 3 });
    }

    #[test]
    fn test_range_rejects_bad_bounds() {
        assert!(RowRange::from_inclusive_lines(0, 3).is_err());
        assert!(RowRange::from_inclusive_lines(5, 3).is_err());
    }

    #[test]
    fn test_course_codes_with_range_clamps() {
        let loader = loader();
        let range = RowRange::from_inclusive_lines(3, 100).unwrap();
        let codes = loader.course_codes(Some(range));
        assert_eq!(
            codes,
            vec![
                "brown.afri.0090.2023-fall.s02".to_string(),
                "brown.hist.1234.2023-fall.s01".to_string()
            ]
        );
        assert_eq!(loader.course_codes(None).len(), 3);
    }
}
