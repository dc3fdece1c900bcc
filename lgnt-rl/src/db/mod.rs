//! OCRA course-reserves database access
//!
//! Everything the pipeline needs from OCRA goes through [`OcraSource`], so
//! tests can swap in an in-memory source.

pub mod courses;
pub mod readings;

pub use readings::{ArticleRow, BookRow, TrackRow};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lgnt_common::config::{DatabaseSettings, ENV_DB_DATABASE_NAME, ENV_DB_HOST, ENV_DB_USERNAME};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

/// Read-only view of OCRA
#[async_trait]
pub trait OcraSource: Send + Sync {
    /// Class ids for a plain course id such as `HIST1234`, newest term first
    async fn class_ids(&self, course_id: &str) -> Result<Vec<String>>;

    async fn book_readings(&self, class_id: &str) -> Result<Vec<BookRow>>;

    /// Rows from the article table; the `format` column says what each really is
    async fn article_readings(&self, class_id: &str) -> Result<Vec<ArticleRow>>;

    async fn track_readings(&self, class_id: &str) -> Result<Vec<TrackRow>>;
}

/// Open a connection pool to OCRA
pub async fn connect(settings: &DatabaseSettings) -> Result<MySqlPool> {
    let host = settings
        .host
        .as_deref()
        .with_context(|| format!("{} is not set", ENV_DB_HOST))?;
    let username = settings
        .username
        .as_deref()
        .with_context(|| format!("{} is not set", ENV_DB_USERNAME))?;
    let database = settings
        .database_name
        .as_deref()
        .with_context(|| format!("{} is not set", ENV_DB_DATABASE_NAME))?;

    let mut options = MySqlConnectOptions::new()
        .host(host)
        .port(settings.port)
        .username(username)
        .database(database)
        .charset("utf8mb4");
    if let Some(password) = settings.password.as_deref() {
        options = options.password(password);
    }

    tracing::debug!(host, port = settings.port, database, "Connecting to OCRA");

    let pool = MySqlPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to OCRA at {}:{}", host, settings.port))?;

    tracing::info!("OCRA connection established");
    Ok(pool)
}

/// [`OcraSource`] backed by the live MySQL database
#[derive(Clone)]
pub struct MySqlOcra {
    pool: MySqlPool,
}

impl MySqlOcra {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OcraSource for MySqlOcra {
    async fn class_ids(&self, course_id: &str) -> Result<Vec<String>> {
        let (subject, course) = courses::split_course_id(course_id);
        courses::class_ids(&self.pool, &subject, &course).await
    }

    async fn book_readings(&self, class_id: &str) -> Result<Vec<BookRow>> {
        readings::book_readings(&self.pool, class_id).await
    }

    async fn article_readings(&self, class_id: &str) -> Result<Vec<ArticleRow>> {
        readings::article_readings(&self.pool, class_id).await
    }

    async fn track_readings(&self, class_id: &str) -> Result<Vec<TrackRow>> {
        readings::track_readings(&self.pool, class_id).await
    }
}
