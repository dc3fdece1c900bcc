//! Error types for lgnt-rl
//!
//! Pipeline code reports failures through `anyhow`; the spreadsheet adapter
//! keeps a typed error so callers can tell auth problems from API refusals.

use thiserror::Error;

/// Spreadsheet adapter result
pub type SheetsResult<T> = std::result::Result<T, SheetsError>;

/// Spreadsheet adapter error type
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Credentials missing, malformed, or rejected by the token endpoint
    #[error("Auth error: {0}")]
    Auth(String),

    /// Transport failure (DNS, TLS, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status from the API
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Spreadsheet, worksheet or column not found
    #[error("Not found: {0}")]
    NotFound(String),
}
