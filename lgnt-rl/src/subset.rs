//! OIT extract subset tool
//!
//! Narrows the raw OIT extract to one term's courses that have a
//! legitimate section and at least one instructor, and summarizes what was
//! kept. Kept lines are copied byte-for-byte so the subset can be fed back
//! in as a courses file.

use anyhow::{bail, Context, Result};
use lgnt_common::config::Settings;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SUBSET_FILENAME: &str = "oit_subset_01.tsv";
const INSTRUCTORS_COLUMN: &str = "ALL_INSTRUCTORS";
const EMPTY_SECTION: &str = "EMPTY";

/// Which rows to keep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetCriteria {
    pub year: String,
    pub season: String,
    pub legit_sections: Vec<String>,
}

/// `institution.department.number.year-term[.section]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCodeParts {
    pub institution: String,
    pub department: String,
    pub number: String,
    pub year: String,
    pub term: String,
    pub section: String,
}

/// Split an OIT course code; `None` when it lacks the year-term part
pub fn parse_course_code(code: &str) -> Option<CourseCodeParts> {
    let parts: Vec<&str> = code.trim().split('.').collect();
    if parts.len() < 4 {
        return None;
    }
    let (year, term) = parts[3].split_once('-')?;
    Some(CourseCodeParts {
        institution: parts[0].to_string(),
        department: parts[1].to_string(),
        number: parts[2].to_string(),
        year: year.to_string(),
        term: term.to_string(),
        section: parts
            .get(4)
            .map(|s| s.to_string())
            .unwrap_or_else(|| EMPTY_SECTION.to_string()),
    })
}

/// `(value, count)` pairs, most common first, ties by value
pub fn count_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut pairs: Vec<(String, usize)> =
        counts.into_iter().map(|(v, n)| (v.to_string(), n)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

/// Counts describing the subset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubsetSummary {
    pub subset_institutions: Vec<(String, usize)>,
    pub subset_departments: Vec<(String, usize)>,
    pub subset_years: Vec<(String, usize)>,
    pub subset_terms: Vec<(String, usize)>,
    pub subset_sections: Vec<(String, usize)>,
    pub skipped_sections_for_target_year_and_season: Vec<(String, usize)>,
    pub skipped_instructor_count_for_target_year_and_season_and_section: usize,
    pub kept: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone)]
pub struct Subset {
    /// Header line, line ending included
    pub header: String,
    /// Kept data lines, line endings included
    pub lines: Vec<String>,
    pub summary: SubsetSummary,
}

/// Filter raw extract text
pub fn build_subset(content: &str, criteria: &SubsetCriteria) -> Result<Subset> {
    let mut raw_lines = content.split_inclusive('\n');
    let Some(header) = raw_lines.next() else {
        bail!("OIT extract is empty");
    };
    let instructors_idx = header
        .split('\t')
        .position(|h| h.trim() == INSTRUCTORS_COLUMN)
        .with_context(|| format!("OIT extract has no {} column", INSTRUCTORS_COLUMN))?;

    let mut kept: Vec<(String, CourseCodeParts)> = Vec::new();
    let mut skipped_sections: Vec<String> = Vec::new();
    let mut skipped_no_instructor = 0usize;
    let mut malformed = 0usize;

    for (i, line) in raw_lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let code = fields.first().copied().unwrap_or("");
        let Some(parts) = parse_course_code(code) else {
            warn!(line = i + 2, code, "Malformed OIT course code; skipping");
            malformed += 1;
            continue;
        };
        if parts.year != criteria.year || parts.term != criteria.season {
            continue;
        }

        let legit = criteria.legit_sections.contains(&parts.section);
        if !legit {
            skipped_sections.push(parts.section.clone());
        }
        let has_instructor = fields
            .get(instructors_idx)
            .is_some_and(|v| !v.is_empty());
        if legit && has_instructor {
            kept.push((line.to_string(), parts));
        } else {
            debug!(code, legit, has_instructor, "Row left out of subset");
            skipped_no_instructor += 1;
        }
    }

    let summary = SubsetSummary {
        subset_institutions: count_values(kept.iter().map(|(_, p)| p.institution.as_str())),
        subset_departments: count_values(kept.iter().map(|(_, p)| p.department.as_str())),
        subset_years: count_values(kept.iter().map(|(_, p)| p.year.as_str())),
        subset_terms: count_values(kept.iter().map(|(_, p)| p.term.as_str())),
        subset_sections: count_values(kept.iter().map(|(_, p)| p.section.as_str())),
        skipped_sections_for_target_year_and_season: count_values(
            skipped_sections.iter().map(String::as_str),
        ),
        skipped_instructor_count_for_target_year_and_season_and_section: skipped_no_instructor,
        kept: kept.len(),
        malformed,
    };

    Ok(Subset {
        header: header.to_string(),
        lines: kept.into_iter().map(|(line, _)| line).collect(),
        summary,
    })
}

/// Write the header and kept lines to `<dir>/oit_subset_01.tsv`
pub fn write_subset(subset: &Subset, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(SUBSET_FILENAME);
    let mut out = subset.header.clone();
    for line in &subset.lines {
        out.push_str(line);
    }
    std::fs::write(&path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Build and write the subset described by the settings
pub fn run(settings: &Settings) -> Result<SubsetSummary> {
    let criteria = SubsetCriteria {
        year: settings.subset_year()?.to_string(),
        season: settings.subset_season()?.to_string(),
        legit_sections: settings.subset_legit_sections()?.to_vec(),
    };
    let source = settings.courses_filepath()?;
    info!(
        source = %source.display(),
        year = %criteria.year,
        season = %criteria.season,
        sections = ?criteria.legit_sections,
        "Building OIT subset"
    );

    // read_to_string also rejects non-UTF-8 input
    let content = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read OIT extract {}", source.display()))?;
    let subset = build_subset(&content, &criteria)?;
    let path = write_subset(&subset, &settings.output_dir)?;

    match serde_json::to_string_pretty(&subset.summary) {
        Ok(json) => info!("Subset summary:\n{}", json),
        Err(e) => warn!("Could not render subset summary: {}", e),
    }
    info!(path = %path.display(), kept = subset.summary.kept, "OIT subset written");
    Ok(subset.summary)
}
