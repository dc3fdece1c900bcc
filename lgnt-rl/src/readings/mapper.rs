//! Per-kind mapping of OCRA rows to basic records

use super::cdl::CdlChecker;
use super::pdf::PdfData;
use super::{filter_article_results, BasicRecord, CourseContext, PdfLink, PrimaryLink, ReadingKind};
use crate::db::{ArticleRow, BookRow, TrackRow};
use reqwest::Url;
use tracing::{debug, warn};

/// Library note for readings with several equally good CDL matches
pub const CDL_MULTIPLE_NOTE: &str = "Multiple CDL matches; check the CDL list.";

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or("").to_string()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    Some(text(value)).filter(|v| !v.is_empty())
}

fn direct_link(url: &Option<String>) -> PrimaryLink {
    match non_empty(url) {
        Some(url) => PrimaryLink::Direct(url),
        None => PrimaryLink::None,
    }
}

/// Maps OCRA rows for one course section, with shared lookup data
pub struct ReadingMapper<'a> {
    cdl: &'a CdlChecker,
    pdf: &'a PdfData,
    openurl_base: &'a str,
}

impl<'a> ReadingMapper<'a> {
    pub fn new(cdl: &'a CdlChecker, pdf: &'a PdfData, openurl_base: &'a str) -> Self {
        Self {
            cdl,
            pdf,
            openurl_base,
        }
    }

    /// OpenURL carrying whichever citation fields are present
    ///
    /// With no fields the bare resolver URL is returned, which staff notes skip.
    pub fn openurl(&self, params: &[(&str, &str)]) -> Option<String> {
        if self.openurl_base.trim().is_empty() {
            return None;
        }
        let present: Vec<(&str, &str)> = params
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (*k, v.trim()))
            .collect();
        match Url::parse_with_params(self.openurl_base, &present) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!("Invalid OpenURL base `{}`: {}", self.openurl_base, e);
                None
            }
        }
    }

    fn cdl_link(&self, record: &mut BasicRecord, title: &str) {
        record.source1 = self.cdl.check(title);
        if record.source1 == PrimaryLink::CdlMultiple {
            record.library_note = CDL_MULTIPLE_NOTE.to_string();
        }
    }

    fn article_base(course: &CourseContext, kind: ReadingKind, row: &ArticleRow) -> BasicRecord {
        let mut record = BasicRecord::for_course(course, Some(kind));
        record.title = text(&row.art_title);
        record.journal_title = text(&row.art_journal);
        record.author = text(&row.art_author);
        record.publication_date = text(&row.art_date);
        record.doi = text(&row.art_doi);
        record.isbn = text(&row.art_isbn);
        record.issn = text(&row.art_issn);
        record.volume = text(&row.art_volume);
        record.issue = text(&row.art_issue);
        record.start_page = text(&row.art_start_page);
        record.end_page = text(&row.art_end_page);
        record.source2 = non_empty(&row.art_fulltext_url);
        record.external_system_id = text(&row.articleid);
        record
    }

    pub fn map_articles(&self, rows: &[ArticleRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = Self::article_base(course, ReadingKind::Article, row);
                record.source1 = direct_link(&row.art_url);
                let doi = if record.doi.is_empty() {
                    String::new()
                } else {
                    format!("doi:{}", record.doi)
                };
                record.source3 = self.openurl(&[
                    ("genre", "article"),
                    ("atitle", record.title.as_str()),
                    ("title", record.journal_title.as_str()),
                    ("au", record.author.as_str()),
                    ("volume", record.volume.as_str()),
                    ("issue", record.issue.as_str()),
                    ("spage", record.start_page.as_str()),
                    ("epage", record.end_page.as_str()),
                    ("date", record.publication_date.as_str()),
                    ("issn", record.issn.as_str()),
                    ("id", doi.as_str()),
                ]);
                record.source4 = self.pdf.link_for(row.articleid.as_deref());
                record
            })
            .collect()
    }

    pub fn map_audios(&self, rows: &[ArticleRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = Self::article_base(course, ReadingKind::Audio, row);
                record.source1 = direct_link(&row.art_url);
                record
            })
            .collect()
    }

    pub fn map_books(&self, rows: &[BookRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = BasicRecord::for_course(course, Some(ReadingKind::Book));
                record.title = text(&row.bk_title);
                record.author = text(&row.bk_author);
                record.publication_date = text(&row.bk_year);
                record.isbn = text(&row.isbn);
                record.external_system_id = text(&row.bookid);
                let title = record.title.clone();
                self.cdl_link(&mut record, &title);
                record.source3 = self.openurl(&[
                    ("genre", "book"),
                    ("title", record.title.as_str()),
                    ("au", record.author.as_str()),
                    ("isbn", record.isbn.as_str()),
                    ("date", record.publication_date.as_str()),
                ]);
                record
            })
            .collect()
    }

    pub fn map_ebooks(&self, rows: &[ArticleRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = Self::article_base(course, ReadingKind::Ebook, row);
                record.source1 = direct_link(&row.art_url);
                if record.source1 == PrimaryLink::None {
                    let title = record.title.clone();
                    self.cdl_link(&mut record, &title);
                }
                record.source3 = self.openurl(&[
                    ("genre", "book"),
                    ("title", record.title.as_str()),
                    ("au", record.author.as_str()),
                    ("isbn", record.isbn.as_str()),
                    ("date", record.publication_date.as_str()),
                ]);
                record
            })
            .collect()
    }

    /// Excerpts are looked up in CDL by the title of the book they come from
    pub fn map_excerpts(&self, rows: &[ArticleRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = Self::article_base(course, ReadingKind::Excerpt, row);
                let book_title = if record.journal_title.is_empty() {
                    record.title.clone()
                } else {
                    record.journal_title.clone()
                };
                self.cdl_link(&mut record, &book_title);
                record.source3 = self.openurl(&[
                    ("genre", "bookitem"),
                    ("atitle", record.title.as_str()),
                    ("title", record.journal_title.as_str()),
                    ("au", record.author.as_str()),
                    ("spage", record.start_page.as_str()),
                    ("epage", record.end_page.as_str()),
                    ("isbn", record.isbn.as_str()),
                    ("date", record.publication_date.as_str()),
                ]);
                record.source4 = self.pdf.link_for(row.articleid.as_deref());
                record
            })
            .collect()
    }

    pub fn map_tracks(&self, rows: &[TrackRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = BasicRecord::for_course(course, Some(ReadingKind::Track));
                record.title = text(&row.track_title);
                record.journal_title = text(&row.album_title);
                record.author = text(&row.artist);
                record.source1 = direct_link(&row.track_url);
                record.external_system_id = text(&row.trackid);
                record
            })
            .collect()
    }

    pub fn map_videos(&self, rows: &[ArticleRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = Self::article_base(course, ReadingKind::Video, row);
                record.source1 = direct_link(&row.art_url);
                record
            })
            .collect()
    }

    pub fn map_websites(&self, rows: &[ArticleRow], course: &CourseContext) -> Vec<BasicRecord> {
        rows.iter()
            .map(|row| {
                let mut record = Self::article_base(course, ReadingKind::Website, row);
                record.source1 = direct_link(&row.art_url);
                record
            })
            .collect()
    }

    /// All records for one class, in the fixed kind order
    ///
    /// A class with nothing on reserve still yields one placeholder.
    pub fn map_class(
        &self,
        course: &CourseContext,
        books: Vec<BookRow>,
        articles: Vec<ArticleRow>,
        tracks: Vec<TrackRow>,
    ) -> Vec<BasicRecord> {
        let buckets = filter_article_results(articles);

        let mut records = Vec::new();
        records.extend(self.map_articles(&buckets.articles, course));
        records.extend(self.map_audios(&buckets.audios, course));
        records.extend(self.map_books(&books, course));
        records.extend(self.map_ebooks(&buckets.ebooks, course));
        records.extend(self.map_excerpts(&buckets.excerpts, course));
        records.extend(self.map_tracks(&tracks, course));
        records.extend(self.map_videos(&buckets.videos, course));
        records.extend(self.map_websites(&buckets.websites, course));

        if records.is_empty() {
            debug!(course = %course.leganto_course_id, "No OCRA readings; using placeholder");
            records.push(map_empty(course));
        }
        records
    }
}

/// Placeholder record for a course without readings
pub fn map_empty(course: &CourseContext) -> BasicRecord {
    let mut record = BasicRecord::for_course(course, None);
    record.source4 = PdfLink::NotApplicable;
    record
}
