//! JSON file persistence
//!
//! Writes go to `<file>.tmp` first and are renamed onto the target, so a
//! crash mid-write never leaves a truncated tracker or snapshot behind.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Serialize `value` as two-space-indented JSON and atomically replace `target`
pub fn write_json_atomic<T: Serialize + ?Sized>(value: &T, target: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(target);
    std::fs::write(&temp_path, json.as_bytes())?;
    if let Err(e) = std::fs::rename(&temp_path, target) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    debug!("Wrote {} bytes to {}", json.len(), target.display());
    Ok(())
}

/// Read and parse a JSON file; `Ok(None)` when the file does not exist
///
/// Parse failures are returned as `Error::Json` so callers can choose to
/// start fresh or bail.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };
    let value = serde_json::from_str(&content)?;
    Ok(Some(value))
}
