//! Course -> class id resolution

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::debug;

/// Split `HIST1234` into (`HIST`, `1234`) at the first non-alphabetic character
///
/// An all-alphabetic id has an empty subject and the whole id as course.
pub fn split_course_id(course_id: &str) -> (String, String) {
    match course_id.char_indices().find(|(_, c)| !c.is_alphabetic()) {
        Some((idx, _)) => (course_id[..idx].to_string(), course_id[idx..].to_string()),
        None => (String::new(), course_id.to_string()),
    }
}

/// Non-empty class ids for a subject/course pair, newest term first
pub async fn class_ids(pool: &MySqlPool, subject: &str, course: &str) -> Result<Vec<String>> {
    let rows: Vec<(Option<String>,)> = sqlx::query_as(
        r#"
        SELECT CAST(classid AS CHAR) AS classid
        FROM banner_courses
        WHERE subject LIKE ? AND course LIKE ?
        ORDER BY term DESC
        "#,
    )
    .bind(subject)
    .bind(course)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Class id query failed for {}{}", subject, course))?;

    let ids: Vec<String> = rows
        .into_iter()
        .filter_map(|(id,)| id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    debug!(subject, course, class_ids = ?ids, "Class ids resolved");
    Ok(ids)
}
