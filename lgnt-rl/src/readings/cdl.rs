//! Controlled-digital-lending title lookup
//!
//! Book titles are matched against a JSON list of CDL items. An exact match
//! on the normalized title is "likely"; a near match is only "possibly".

use super::PrimaryLink;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Minimum normalized Levenshtein similarity for a "possibly" match
pub const POSSIBLE_MATCH_THRESHOLD: f64 = 0.9;

/// One entry of the CDL list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CdlItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub bib_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CdlChecker {
    items: Vec<(String, CdlItem)>,
}

/// Lowercase, keep letters and digits, collapse everything else to single spaces
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl CdlChecker {
    /// Load the CDL list; no path means an empty checker
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No CDL list configured");
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CDL list {}", path.display()))?;
        let items: Vec<CdlItem> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse CDL list {}", path.display()))?;
        debug!(items = items.len(), "CDL list loaded");
        Ok(Self::from_items(items))
    }

    pub fn from_items(items: Vec<CdlItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| (normalize_title(&item.title), item))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a title
    ///
    /// Returns [`PrimaryLink::None`] when no CDL list is loaded.
    pub fn check(&self, title: &str) -> PrimaryLink {
        if self.items.is_empty() {
            return PrimaryLink::None;
        }
        let wanted = normalize_title(title);
        if wanted.is_empty() {
            return PrimaryLink::CdlNotFound;
        }

        let exact: Vec<&CdlItem> = self
            .items
            .iter()
            .filter(|(normalized, _)| *normalized == wanted)
            .map(|(_, item)| item)
            .collect();
        match exact.as_slice() {
            [only] => return PrimaryLink::CdlLikely(only.url.clone()),
            [_, _, ..] => {
                debug!(title, matches = exact.len(), "Multiple CDL matches");
                return PrimaryLink::CdlMultiple;
            }
            [] => {}
        }

        let best = self
            .items
            .iter()
            .map(|(normalized, item)| (strsim::normalized_levenshtein(&wanted, normalized), item))
            .max_by(|a, b| a.0.total_cmp(&b.0));
        match best {
            Some((score, item)) if score >= POSSIBLE_MATCH_THRESHOLD => {
                debug!(title, candidate = %item.title, score, "Possible CDL match");
                PrimaryLink::CdlPossibly(item.url.clone())
            }
            _ => PrimaryLink::CdlNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> CdlItem {
        CdlItem {
            title: title.to_string(),
            url: url.to_string(),
            bib_id: None,
        }
    }

    fn checker() -> CdlChecker {
        CdlChecker::from_items(vec![
            item("The Souls of Black Folk", "https://cdl/souls"),
            item("Invisible Man", "https://cdl/invisible-1"),
            item("Invisible Man", "https://cdl/invisible-2"),
            item("A People's History of the United States", "https://cdl/zinn"),
        ])
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  The Souls of Black-Folk: "), "the souls of black folk");
    }

    #[test]
    fn test_exact_match_is_likely() {
        assert_eq!(
            checker().check("the souls of black folk."),
            PrimaryLink::CdlLikely("https://cdl/souls".into())
        );
    }

    #[test]
    fn test_several_exact_matches_is_multiple() {
        assert_eq!(checker().check("Invisible Man"), PrimaryLink::CdlMultiple);
    }

    #[test]
    fn test_near_match_is_possibly() {
        assert_eq!(
            checker().check("A Peoples History of the United State"),
            PrimaryLink::CdlPossibly("https://cdl/zinn".into())
        );
    }

    #[test]
    fn test_unrelated_title_not_found() {
        assert_eq!(checker().check("Beloved"), PrimaryLink::CdlNotFound);
        assert_eq!(checker().check(""), PrimaryLink::CdlNotFound);
    }

    #[test]
    fn test_empty_checker_yields_no_link() {
        assert_eq!(CdlChecker::default().check("Beloved"), PrimaryLink::None);
    }
}
