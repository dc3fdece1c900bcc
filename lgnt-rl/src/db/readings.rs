//! OCRA reading queries
//!
//! Columns are cast to text in SQL so row types stay uniform regardless of
//! how OCRA declares them.

use anyhow::{Context, Result};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

/// Row from the OCRA `books` table
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct BookRow {
    pub bookid: Option<String>,
    pub bk_title: Option<String>,
    pub bk_author: Option<String>,
    pub isbn: Option<String>,
    pub bk_year: Option<String>,
    pub bk_updated: Option<String>,
}

/// Row from the OCRA `articles` table
///
/// Despite the name the table also holds audio, ebooks, excerpts, videos
/// and websites, told apart by `format`.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct ArticleRow {
    pub articleid: Option<String>,
    pub format: Option<String>,
    pub art_title: Option<String>,
    pub art_author: Option<String>,
    pub art_journal: Option<String>,
    pub art_date: Option<String>,
    pub art_volume: Option<String>,
    pub art_issue: Option<String>,
    pub art_start_page: Option<String>,
    pub art_end_page: Option<String>,
    pub art_doi: Option<String>,
    pub art_issn: Option<String>,
    pub art_isbn: Option<String>,
    pub art_url: Option<String>,
    pub art_fulltext_url: Option<String>,
    pub art_updated: Option<String>,
}

/// Row from the OCRA `tracks` table
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct TrackRow {
    pub trackid: Option<String>,
    pub track_title: Option<String>,
    pub album_title: Option<String>,
    pub artist: Option<String>,
    pub track_url: Option<String>,
}

pub async fn book_readings(pool: &MySqlPool, class_id: &str) -> Result<Vec<BookRow>> {
    let rows: Vec<BookRow> = sqlx::query_as(
        r#"
        SELECT
            CAST(bookid AS CHAR) AS bookid,
            bk_title,
            bk_author,
            CAST(isbn AS CHAR) AS isbn,
            CAST(bk_year AS CHAR) AS bk_year,
            CAST(bk_updated AS CHAR) AS bk_updated
        FROM books
        WHERE classid = ?
        ORDER BY bookid
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Book query failed for class {}", class_id))?;

    debug!(class_id, count = rows.len(), "Book readings fetched");
    Ok(rows)
}

pub async fn article_readings(pool: &MySqlPool, class_id: &str) -> Result<Vec<ArticleRow>> {
    let rows: Vec<ArticleRow> = sqlx::query_as(
        r#"
        SELECT
            CAST(articleid AS CHAR) AS articleid,
            format,
            art_title,
            art_author,
            art_journal,
            CAST(art_date AS CHAR) AS art_date,
            CAST(art_volume AS CHAR) AS art_volume,
            CAST(art_issue AS CHAR) AS art_issue,
            CAST(art_start_page AS CHAR) AS art_start_page,
            CAST(art_end_page AS CHAR) AS art_end_page,
            art_doi,
            art_issn,
            art_isbn,
            art_url,
            art_fulltext_url,
            CAST(art_updated AS CHAR) AS art_updated
        FROM articles
        WHERE classid = ?
        ORDER BY articleid
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Article query failed for class {}", class_id))?;

    debug!(class_id, count = rows.len(), "Article-table readings fetched");
    Ok(rows)
}

pub async fn track_readings(pool: &MySqlPool, class_id: &str) -> Result<Vec<TrackRow>> {
    let rows: Vec<TrackRow> = sqlx::query_as(
        r#"
        SELECT
            CAST(trackid AS CHAR) AS trackid,
            track_title,
            album_title,
            artist,
            track_url
        FROM tracks
        WHERE classid = ?
        ORDER BY trackid
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Track query failed for class {}", class_id))?;

    debug!(class_id, count = rows.len(), "Track readings fetched");
    Ok(rows)
}
