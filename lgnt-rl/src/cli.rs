//! Command-line interface

use crate::oit::RowRange;
use crate::pipeline::{BuildOptions, CourseSelection, OIT_FILE_SELECTOR};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

const MIN_COURSE_ID_LEN: usize = 8;

/// Build Leganto reading lists from OCRA course reserves
#[derive(Parser, Debug)]
#[clap(name = "lgnt-rl", version)]
#[clap(about = "Build Leganto reading lists from OCRA course reserves")]
pub struct Cli {
    /// TOML config file (default: ~/.config/lgnt/config.toml, then /etc/lgnt/config.toml)
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build reading lists and write them out
    ///
    /// Examples:
    ///   lgnt-rl build --course-id oit_file --range-inclusive '{"start": 5, "end": 10}'
    ///   lgnt-rl build --course-id EAST0402,TAPS1600 --update-ss true
    ///   lgnt-rl build --course-id SPREADSHEET --update-ss true --force true
    #[clap(verbatim_doc_comment)]
    Build(BuildArgs),

    /// Write the OIT extract subset for the configured term
    Subset,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// `SPREADSHEET`, `oit_file`, or course ids like `EDUC1234` (comma-separated)
    #[clap(long)]
    pub course_id: String,

    /// Whether to update the spreadsheet (required unless course id is `oit_file`)
    #[clap(long, value_name = "BOOL", value_parser = parse_bool)]
    pub update_ss: Option<bool>,

    /// Skip the spreadsheet recently-updated check
    #[clap(long, value_name = "BOOL", value_parser = parse_bool)]
    pub force: Option<bool>,

    /// Inclusive OIT file line range as JSON, e.g. '{"start": 5, "end": 10}' (oit_file only)
    #[clap(long, value_name = "JSON")]
    pub range_inclusive: Option<String>,
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected `true` or `false`, got `{}`", other)),
    }
}

#[derive(Debug, Deserialize)]
struct InclusiveRange {
    start: usize,
    end: usize,
}

impl BuildArgs {
    /// Validate the arguments and turn them into pipeline options
    pub fn to_options(&self) -> Result<BuildOptions> {
        let course_id = self.course_id.trim();
        if course_id.len() < MIN_COURSE_ID_LEN {
            bail!(
                "course id `{}` is too short (at least {} characters)",
                course_id,
                MIN_COURSE_ID_LEN
            );
        }
        let is_oit_file = course_id == OIT_FILE_SELECTOR;

        if self.update_ss.is_none() && !is_oit_file {
            bail!("--update-ss must be given unless course id is `{}`", OIT_FILE_SELECTOR);
        }

        let range = match &self.range_inclusive {
            Some(_) if !is_oit_file => {
                bail!("--range-inclusive can only be used with course id `{}`", OIT_FILE_SELECTOR)
            }
            Some(json) => {
                let parsed: InclusiveRange = serde_json::from_str(json)
                    .with_context(|| format!("--range-inclusive is not valid JSON: {}", json))?;
                Some(RowRange::from_inclusive_lines(parsed.start, parsed.end)?)
            }
            None => None,
        };

        Ok(BuildOptions {
            selection: CourseSelection::parse(course_id),
            update_ss: self.update_ss.unwrap_or(false),
            force: self.force.unwrap_or(false),
            range,
        })
    }
}
