//! # LGNT Common Library
//!
//! Shared code for the Leganto reading-list tools including:
//! - Error type
//! - Settings resolution (environment, TOML, defaults)
//! - Logging initialization
//! - Atomic JSON persistence
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod json_store;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
