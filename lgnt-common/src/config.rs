//! Configuration loading and settings resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (config file path only)
//! 2. Environment variable (`LGNT__*`)
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing TOML file is not an error; the tools run on environment
//! variables alone. Settings that a command cannot run without are checked
//! when that command asks for them, so `subset` never demands database
//! credentials and `build` never demands a target season.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_COURSES_FILEPATH: &str = "LGNT__COURSES_FILEPATH";
pub const ENV_PDF_JSON_PATH: &str = "LGNT__PDF_JSON_PATH";
pub const ENV_PDF_OLDER_THAN_DAYS: &str = "LGNT__PDF_OLDER_THAN_DAYS";
pub const ENV_FILES_URL_PATTERN: &str = "LGNT__FILES_URL_PATTERN";
pub const ENV_TRACKER_JSON_FILEPATH: &str = "LGNT__TRACKER_JSON_FILEPATH";
pub const ENV_LAST_CHECKED_PATH: &str = "LGNT__LAST_CHECKED_JSON_PATH";
pub const ENV_SHEET_CREDENTIALS_JSON: &str = "LGNT__SHEET_CREDENTIALS_JSON";
pub const ENV_SHEET_NAME: &str = "LGNT__SHEET_NAME";
pub const ENV_SHEET_ID: &str = "LGNT__SHEET_ID";
pub const ENV_DB_HOST: &str = "LGNT__DB_HOST";
pub const ENV_DB_PORT: &str = "LGNT__DB_PORT";
pub const ENV_DB_USERNAME: &str = "LGNT__DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "LGNT__DB_PASSWORD";
pub const ENV_DB_DATABASE_NAME: &str = "LGNT__DB_DATABASE_NAME";
pub const ENV_OUTPUT_DIR: &str = "LGNT__CSV_OUTPUT_DIR_PATH";
pub const ENV_CDL_JSON_PATH: &str = "LGNT__CDL_JSON_PATH";
pub const ENV_OPENURL_BASE: &str = "LGNT__OPENURL_BASE";
pub const ENV_PUBLIC_NOTE: &str = "LGNT__PUBLIC_NOTE";
pub const ENV_SEASON: &str = "LGNT__SEASON";
pub const ENV_YEAR: &str = "LGNT__YEAR";
pub const ENV_LEGIT_SECTIONS_JSON: &str = "LGNT__LEGIT_SECTIONS_JSON";
pub const ENV_LOG_LEVEL: &str = "LGNT__LOG_LEVEL";
pub const ENV_LOG_PATH: &str = "LGNT__LOG_PATH";

pub const DEFAULT_PDF_OLDER_THAN_DAYS: u32 = 30;
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_OPENURL_BASE: &str = "https://bruknow.library.brown.edu/discovery/openurl";
pub const DEFAULT_PUBLIC_NOTE: &str =
    "Please contact rock-reserves@brown.edu if you have problem accessing the course-reserves material.";

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL or tracing names)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[database]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DatabaseToml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database_name: Option<String>,
}

/// `[sheet]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SheetToml {
    pub name: Option<String>,
    pub id: Option<String>,
    pub credentials_json: Option<String>,
}

/// `[subset]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SubsetToml {
    pub season: Option<String>,
    pub year: Option<String>,
    pub legit_sections: Option<Vec<String>>,
}

/// TOML configuration file contents; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    pub courses_filepath: Option<PathBuf>,
    pub pdf_json_path: Option<PathBuf>,
    pub pdf_older_than_days: Option<u32>,
    pub files_url_pattern: Option<String>,
    pub tracker_json_filepath: Option<PathBuf>,
    pub last_checked_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub cdl_json_path: Option<PathBuf>,
    pub openurl_base: Option<String>,
    pub public_note: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseToml,
    #[serde(default)]
    pub sheet: SheetToml,
    #[serde(default)]
    pub subset: SubsetToml,
}

/// Resolved OCRA database connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database_name: Option<String>,
}

/// Resolved spreadsheet settings
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSettings {
    pub credentials_json: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
}

/// Resolved OIT subset settings
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetSettings {
    pub season: Option<String>,
    pub year: Option<String>,
    pub legit_sections: Option<Vec<String>>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub courses_filepath: Option<PathBuf>,
    pub pdf_json_path: Option<PathBuf>,
    pub pdf_older_than_days: u32,
    pub files_url_pattern: Option<String>,
    pub tracker_json_filepath: Option<PathBuf>,
    pub last_checked_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub cdl_json_path: Option<PathBuf>,
    pub openurl_base: String,
    pub public_note: String,
    pub logging: LoggingConfig,
    pub database: DatabaseSettings,
    pub sheet: SheetSettings,
    pub subset: SubsetSettings,
}

impl Settings {
    /// Resolve settings from the process environment over the given TOML config
    pub fn resolve(toml_config: &TomlConfig) -> Result<Self> {
        Self::resolve_with(toml_config, |name| std::env::var(name).ok())
    }

    /// Resolve settings using `lookup` for environment values
    ///
    /// Blank environment values count as unset.
    pub fn resolve_with<F>(toml_config: &TomlConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let env_path = |name: &str| env(name).map(PathBuf::from);

        let pdf_older_than_days = match env(ENV_PDF_OLDER_THAN_DAYS) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                Error::Config(format!("{} must be a whole number of days: {}", ENV_PDF_OLDER_THAN_DAYS, e))
            })?,
            None => toml_config
                .pdf_older_than_days
                .unwrap_or(DEFAULT_PDF_OLDER_THAN_DAYS),
        };

        let db_port = match env(ENV_DB_PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("{} must be a port number: {}", ENV_DB_PORT, e)))?,
            None => toml_config.database.port.unwrap_or(DEFAULT_DB_PORT),
        };

        let legit_sections = match env(ENV_LEGIT_SECTIONS_JSON) {
            Some(raw) => Some(serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
                Error::Config(format!("{} must be a JSON list of strings: {}", ENV_LEGIT_SECTIONS_JSON, e))
            })?),
            None => toml_config.subset.legit_sections.clone(),
        };

        let logging = LoggingConfig {
            level: env(ENV_LOG_LEVEL).unwrap_or_else(|| toml_config.logging.level.clone()),
            file: env_path(ENV_LOG_PATH).or_else(|| toml_config.logging.file.clone()),
        };

        let settings = Self {
            courses_filepath: env_path(ENV_COURSES_FILEPATH)
                .or_else(|| toml_config.courses_filepath.clone()),
            pdf_json_path: env_path(ENV_PDF_JSON_PATH).or_else(|| toml_config.pdf_json_path.clone()),
            pdf_older_than_days,
            files_url_pattern: env(ENV_FILES_URL_PATTERN)
                .or_else(|| toml_config.files_url_pattern.clone()),
            tracker_json_filepath: env_path(ENV_TRACKER_JSON_FILEPATH)
                .or_else(|| toml_config.tracker_json_filepath.clone()),
            last_checked_path: env_path(ENV_LAST_CHECKED_PATH)
                .or_else(|| toml_config.last_checked_path.clone()),
            output_dir: env_path(ENV_OUTPUT_DIR)
                .or_else(|| toml_config.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            cdl_json_path: env_path(ENV_CDL_JSON_PATH).or_else(|| toml_config.cdl_json_path.clone()),
            openurl_base: env(ENV_OPENURL_BASE)
                .or_else(|| toml_config.openurl_base.clone())
                .unwrap_or_else(|| DEFAULT_OPENURL_BASE.to_string()),
            public_note: env(ENV_PUBLIC_NOTE)
                .or_else(|| toml_config.public_note.clone())
                .unwrap_or_else(|| DEFAULT_PUBLIC_NOTE.to_string()),
            logging,
            database: DatabaseSettings {
                host: env(ENV_DB_HOST).or_else(|| toml_config.database.host.clone()),
                port: db_port,
                username: env(ENV_DB_USERNAME).or_else(|| toml_config.database.username.clone()),
                password: env(ENV_DB_PASSWORD).or_else(|| toml_config.database.password.clone()),
                database_name: env(ENV_DB_DATABASE_NAME)
                    .or_else(|| toml_config.database.database_name.clone()),
            },
            sheet: SheetSettings {
                credentials_json: env(ENV_SHEET_CREDENTIALS_JSON)
                    .or_else(|| toml_config.sheet.credentials_json.clone()),
                name: env(ENV_SHEET_NAME).or_else(|| toml_config.sheet.name.clone()),
                id: env(ENV_SHEET_ID).or_else(|| toml_config.sheet.id.clone()),
            },
            subset: SubsetSettings {
                season: env(ENV_SEASON).or_else(|| toml_config.subset.season.clone()),
                year: env(ENV_YEAR).or_else(|| toml_config.subset.year.clone()),
                legit_sections,
            },
        };

        debug!(
            courses = ?settings.courses_filepath,
            tracker = ?settings.tracker_json_filepath,
            output_dir = %settings.output_dir.display(),
            "Settings resolved"
        );

        Ok(settings)
    }

    pub fn courses_filepath(&self) -> Result<&Path> {
        required(&self.courses_filepath, ENV_COURSES_FILEPATH).map(PathBuf::as_path)
    }

    pub fn pdf_json_path(&self) -> Result<&Path> {
        required(&self.pdf_json_path, ENV_PDF_JSON_PATH).map(PathBuf::as_path)
    }

    pub fn files_url_pattern(&self) -> Result<&str> {
        required(&self.files_url_pattern, ENV_FILES_URL_PATTERN).map(String::as_str)
    }

    pub fn tracker_json_filepath(&self) -> Result<&Path> {
        required(&self.tracker_json_filepath, ENV_TRACKER_JSON_FILEPATH).map(PathBuf::as_path)
    }

    pub fn last_checked_path(&self) -> Result<&Path> {
        required(&self.last_checked_path, ENV_LAST_CHECKED_PATH).map(PathBuf::as_path)
    }

    pub fn sheet_credentials_json(&self) -> Result<&str> {
        required(&self.sheet.credentials_json, ENV_SHEET_CREDENTIALS_JSON).map(String::as_str)
    }

    pub fn subset_season(&self) -> Result<&str> {
        required(&self.subset.season, ENV_SEASON).map(String::as_str)
    }

    pub fn subset_year(&self) -> Result<&str> {
        required(&self.subset.year, ENV_YEAR).map(String::as_str)
    }

    pub fn subset_legit_sections(&self) -> Result<&[String]> {
        required(&self.subset.legit_sections, ENV_LEGIT_SECTIONS_JSON).map(Vec::as_slice)
    }
}

fn required<'a, T>(value: &'a Option<T>, env_var: &str) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| {
        Error::Config(format!(
            "{} is not set (environment variable or TOML config)",
            env_var
        ))
    })
}

/// Load the TOML config file
///
/// An explicit path must exist and parse. Without one, the platform
/// locations are tried and a missing file yields the defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(path) => path,
            None => {
                debug!("No TOML config file found; using environment and defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read config {} failed: {}", path.display(), e)))?;
    match toml::from_str::<TomlConfig>(&content) {
        Ok(config) => {
            debug!("Loaded TOML config from {}", path.display());
            Ok(config)
        }
        Err(e) if explicit.is_none() => {
            warn!("Ignoring unparseable config {}: {}", path.display(), e);
            Ok(TomlConfig::default())
        }
        Err(e) => Err(Error::Config(format!(
            "Parse config {} failed: {}",
            path.display(),
            e
        ))),
    }
}

/// Get the configuration file path for the platform, if one exists
///
/// Tries `~/.config/lgnt/config.toml` first, then `/etc/lgnt/config.toml`.
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("lgnt").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/lgnt/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}
