//! Leganto field calculations and string cleanup

use crate::readings::{BasicRecord, PdfLink, PrimaryLink};
use crate::{NO_OCRA_MARKER, OIT_NOT_FOUND_MARKER};
use reqwest::Url;

const EXCERPT_TAG: &str = "(EXCERPT)";
const SMART_OPEN: char = '\u{201C}';
const SMART_CLOSE: char = '\u{201D}';
const STRAIGHT: char = '"';

fn strip_first(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.as_str()
}

fn strip_last(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str()
}

fn count(s: &str, c: char) -> usize {
    s.chars().filter(|&x| x == c).count()
}

/// Tidy an OCRA title for Leganto
pub fn clean_citation_title(title: &str) -> String {
    let cleaned = title.trim().replace(EXCERPT_TAG, "");
    let mut t = cleaned.trim();

    if let Some(rest) = t.strip_suffix(':') {
        t = rest;
    }
    if let Some(rest) = t.strip_suffix('.') {
        t = rest;
    }

    // A smart-quoted title loses its quotes only when they wrap the whole thing.
    if t.starts_with(SMART_OPEN)
        && count(t, SMART_OPEN) == 1
        && count(t, SMART_CLOSE) == 1
        && t.ends_with(SMART_CLOSE)
    {
        t = strip_last(strip_first(t));
    }
    if t.starts_with(SMART_OPEN) && count(t, SMART_OPEN) == 1 {
        t = strip_first(t);
    }

    if t.starts_with(STRAIGHT) && count(t, STRAIGHT) == 2 && t.ends_with(STRAIGHT) {
        t = strip_last(strip_first(t));
    }
    if t.starts_with(STRAIGHT) && count(t, STRAIGHT) == 1 {
        t = strip_first(t);
    }

    t.trim().to_string()
}

/// Drop one stray comma at each end of an author string
pub fn clean_citation_author(author: &str) -> String {
    let mut a = author.trim();
    if let Some(rest) = a.strip_prefix(',') {
        a = rest;
    }
    if let Some(rest) = a.strip_suffix(',') {
        a = rest;
    }
    a.trim().to_string()
}

/// Leganto type code for a staff-sheet type label
pub fn leganto_type(label: &str) -> String {
    match label {
        "ARTICLE" => "JR".to_string(),
        other => other.to_string(),
    }
}

/// Blank out course codes that only mark a missing OIT entry
pub fn leganto_course_code(coursecode: &str) -> String {
    if coursecode.contains(OIT_NOT_FOUND_MARKER) {
        String::new()
    } else {
        coursecode.to_string()
    }
}

/// Best link for `citation_source`: a scanned PDF, else the primary link
///
/// A reading that should have a scan but has none gets no link at all.
pub fn citation_source(record: &BasicRecord) -> String {
    match &record.source4 {
        PdfLink::Found(url) => url.clone(),
        PdfLink::NotFound => String::new(),
        PdfLink::NotApplicable => record.source1.url().unwrap_or("").to_string(),
    }
}

fn has_query_params(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.query().map(|q| !q.is_empty()))
        .unwrap_or(false)
}

/// Staff-facing `citation_library_note`
pub fn staff_note(record: &BasicRecord) -> String {
    if record.external_system_id.trim().is_empty() {
        return NO_OCRA_MARKER.to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    if !record.library_note.trim().is_empty() {
        parts.push(record.library_note.trim().to_string());
    }
    if let Some(full_text) = &record.source2 {
        parts.push(format!("Possible full-text link: <{}>.", full_text));
    }
    if let Some(openurl) = record.source3.as_deref().filter(|u| has_query_params(u)) {
        parts.push(format!("Occasionally-helpful link: <{}>.", openurl));
    }
    if let PrimaryLink::CdlPossibly(url) = &record.source1 {
        parts.push(format!("CDL link possibly: <{}>.", url));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_trailing_punctuation_and_excerpt() {
        assert_eq!(clean_citation_title("  Some Title (EXCERPT) : "), "Some Title");
        assert_eq!(clean_citation_title("Some Title."), "Some Title");
        assert_eq!(clean_citation_title("Some Title:."), "Some Title:");
        assert_eq!(clean_citation_title(""), "");
    }

    #[test]
    fn test_clean_title_smart_quotes() {
        assert_eq!(clean_citation_title("\u{201C}Quoted Title\u{201D}"), "Quoted Title");
        assert_eq!(clean_citation_title("\u{201C}Lone opener"), "Lone opener");
        assert_eq!(
            clean_citation_title("\u{201C}Two\u{201D} and \u{201C}Three\u{201D}"),
            "\u{201C}Two\u{201D} and \u{201C}Three\u{201D}"
        );
    }

    #[test]
    fn test_clean_title_straight_quotes() {
        assert_eq!(clean_citation_title("\"Quoted Title\""), "Quoted Title");
        assert_eq!(clean_citation_title("\"Lone opener"), "Lone opener");
        assert_eq!(clean_citation_title("\"A\" and \"B\""), "\"A\" and \"B\"");
    }

    #[test]
    fn test_clean_author() {
        assert_eq!(clean_citation_author(" , Smith, Jane, "), "Smith, Jane");
        assert_eq!(clean_citation_author(""), "");
    }

    #[test]
    fn test_leganto_type_and_course_code() {
        assert_eq!(leganto_type("ARTICLE"), "JR");
        assert_eq!(leganto_type("BK"), "BK");
        assert_eq!(leganto_course_code("oit_course_code_not_found_for__HIST1234"), "");
        assert_eq!(leganto_course_code("brown.hist.1234.2023-fall.s01"), "brown.hist.1234.2023-fall.s01");
    }

    #[test]
    fn test_citation_source_prefers_pdf() {
        let mut record = BasicRecord {
            source1: PrimaryLink::CdlLikely("https://cdl/1".into()),
            source4: PdfLink::Found("https://pdf/1".into()),
            ..Default::default()
        };
        assert_eq!(citation_source(&record), "https://pdf/1");

        record.source4 = PdfLink::NotFound;
        assert_eq!(citation_source(&record), "");

        record.source4 = PdfLink::NotApplicable;
        assert_eq!(citation_source(&record), "https://cdl/1");

        record.source1 = PrimaryLink::CdlMultiple;
        assert_eq!(citation_source(&record), "");
    }

    #[test]
    fn test_staff_note_without_ocra_id() {
        let record = BasicRecord::default();
        assert_eq!(staff_note(&record), NO_OCRA_MARKER);
    }

    #[test]
    fn test_staff_note_joins_messages() {
        let record = BasicRecord {
            external_system_id: "42".into(),
            source1: PrimaryLink::CdlPossibly("https://cdl/9".into()),
            source2: Some("https://ft/1".into()),
            source3: Some("https://lib/openurl?genre=book&title=X".into()),
            ..Default::default()
        };
        assert_eq!(
            staff_note(&record),
            "Possible full-text link: <https://ft/1>. \
             Occasionally-helpful link: <https://lib/openurl?genre=book&title=X>. \
             CDL link possibly: <https://cdl/9>."
        );
    }

    #[test]
    fn test_staff_note_skips_bare_openurl() {
        let record = BasicRecord {
            external_system_id: "42".into(),
            source3: Some("https://lib/openurl?".into()),
            ..Default::default()
        };
        assert_eq!(staff_note(&record), "");
    }
}
