//! OCRA rows -> basic reading records
//!
//! A [`BasicRecord`] is the intermediate shape shared by the staff sheet and
//! the Leganto processor: one citation in one course section, with up to
//! four candidate links.

pub mod cdl;
pub mod mapper;
pub mod pdf;

use crate::db::ArticleRow;
use std::fmt;
use tracing::{debug, warn};

// ============================================================================
// Kinds and links
// ============================================================================

/// What a reading is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    Article,
    Audio,
    Book,
    Ebook,
    Excerpt,
    Track,
    Video,
    Website,
}

impl ReadingKind {
    /// Type label shown on the staff sheet
    pub fn staff_label(&self) -> &'static str {
        match self {
            ReadingKind::Article => "ARTICLE",
            other => other.leganto_code(),
        }
    }

    /// Leganto `citation_secondary_type` code
    pub fn leganto_code(&self) -> &'static str {
        match self {
            ReadingKind::Article => "JR",
            ReadingKind::Audio | ReadingKind::Track => "AUDIO_DISC",
            ReadingKind::Book => "BK",
            ReadingKind::Ebook => "E_BK",
            ReadingKind::Excerpt => "BOOK_EXTRACT",
            ReadingKind::Video => "VD",
            ReadingKind::Website => "WS",
        }
    }
}

/// Primary link for a reading (`citation_source1`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrimaryLink {
    /// Exactly one CDL title match
    CdlLikely(String),
    /// Close, but not exact, CDL title match
    CdlPossibly(String),
    /// Several exact CDL title matches
    CdlMultiple,
    /// CDL list searched without a match
    CdlNotFound,
    /// URL stored in OCRA
    Direct(String),
    #[default]
    None,
}

impl PrimaryLink {
    /// The usable URL, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            PrimaryLink::CdlLikely(url) | PrimaryLink::CdlPossibly(url) | PrimaryLink::Direct(url) => {
                Some(url.as_str())
            }
            _ => None,
        }
    }
}

impl fmt::Display for PrimaryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryLink::CdlLikely(url) => write!(f, "CDL link likely: <{}>", url),
            PrimaryLink::CdlPossibly(url) => write!(f, "CDL link possibly: <{}>", url),
            PrimaryLink::CdlMultiple => write!(f, "multiple possible CDL links found"),
            PrimaryLink::CdlNotFound => write!(f, "no CDL link found"),
            PrimaryLink::Direct(url) => write!(f, "{}", url),
            PrimaryLink::None => Ok(()),
        }
    }
}

/// Scanned-PDF link for a reading (`citation_source4`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PdfLink {
    Found(String),
    /// Looked up, but no scan exists
    NotFound,
    /// Kind of reading that is never scanned
    #[default]
    NotApplicable,
}

impl fmt::Display for PdfLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfLink::Found(url) => write!(f, "{}", url),
            PdfLink::NotFound => write!(f, "no_pdf_found"),
            PdfLink::NotApplicable => Ok(()),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Course section a reading belongs to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CourseContext {
    /// OIT course code, or the not-found marker id
    pub leganto_course_id: String,
    pub section_id: String,
    /// Course title, used as the reading list name
    pub course_title: String,
}

/// One reading in one course section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BasicRecord {
    pub coursecode: String,
    pub section_id: String,
    pub reading_list_name: String,
    /// `None` for the placeholder of a course without readings
    pub kind: Option<ReadingKind>,
    pub title: String,
    pub journal_title: String,
    pub author: String,
    pub publication_date: String,
    pub doi: String,
    pub isbn: String,
    pub issn: String,
    pub volume: String,
    pub issue: String,
    pub start_page: String,
    pub end_page: String,
    pub source1: PrimaryLink,
    /// Possible full-text link
    pub source2: Option<String>,
    /// OpenURL built from citation metadata
    pub source3: Option<String>,
    pub source4: PdfLink,
    /// OCRA id; empty for placeholders
    pub external_system_id: String,
    pub library_note: String,
}

impl BasicRecord {
    pub fn for_course(course: &CourseContext, kind: Option<ReadingKind>) -> Self {
        Self {
            coursecode: course.leganto_course_id.clone(),
            section_id: course.section_id.clone(),
            reading_list_name: course.course_title.clone(),
            kind,
            ..Default::default()
        }
    }

    pub fn type_label(&self) -> &'static str {
        self.kind.map(|k| k.staff_label()).unwrap_or("")
    }
}

// ============================================================================
// Article-table buckets
// ============================================================================

/// Article-table rows split by `format`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleBuckets {
    pub articles: Vec<ArticleRow>,
    pub audios: Vec<ArticleRow>,
    pub ebooks: Vec<ArticleRow>,
    pub excerpts: Vec<ArticleRow>,
    pub videos: Vec<ArticleRow>,
    pub websites: Vec<ArticleRow>,
}

/// Bucket article-table rows by trimmed `format`; anything else is dropped
pub fn filter_article_results(rows: Vec<ArticleRow>) -> ArticleBuckets {
    let mut buckets = ArticleBuckets::default();
    for row in rows {
        let format = row.format.as_deref().map(str::trim).unwrap_or("");
        match format {
            "article" => buckets.articles.push(row),
            "audio" => buckets.audios.push(row),
            "ebook" => buckets.ebooks.push(row),
            "excerpt" => buckets.excerpts.push(row),
            "video" => buckets.videos.push(row),
            "website" => buckets.websites.push(row),
            other => warn!(
                articleid = ?row.articleid,
                format = other,
                "Unhandled article-table format; skipping row"
            ),
        }
    }
    debug!(
        articles = buckets.articles.len(),
        audios = buckets.audios.len(),
        ebooks = buckets.ebooks.len(),
        excerpts = buckets.excerpts.len(),
        videos = buckets.videos.len(),
        websites = buckets.websites.len(),
        "Article-table rows bucketed"
    );
    buckets
}
