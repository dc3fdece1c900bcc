//! lgnt-rl - Leganto reading-list builder
//!
//! `build` assembles reading lists for the selected courses; `subset` cuts
//! the OIT extract down to one term.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use lgnt_common::config::{load_toml_config, Settings};
use lgnt_common::logging;
use lgnt_rl::cli::{BuildArgs, Cli, Command};
use lgnt_rl::db::{self, MySqlOcra};
use lgnt_rl::oit::OitCourseLoader;
use lgnt_rl::pipeline::{CourseSelection, ReadingListBuilder};
use lgnt_rl::sheets::auth::ServiceAccountCredentials;
use lgnt_rl::sheets::{GoogleSheetsClient, SpreadsheetClient};
use lgnt_rl::subset;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config = load_toml_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&toml_config)?;
    logging::init(&settings.logging)?;

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Build(args) => build(&args, &settings).await,
        Command::Subset => {
            subset::run(&settings)?;
            Ok(())
        }
    }
}

async fn build(args: &BuildArgs, settings: &Settings) -> Result<()> {
    let options = match args.to_options() {
        Ok(options) => options,
        Err(e) => Cli::command()
            .error(ErrorKind::ValueValidation, format!("{:#}", e))
            .exit(),
    };
    info!(course_id = %args.course_id, ?options, "Parsed build arguments");

    let oit = OitCourseLoader::load(settings.courses_filepath()?)?;
    info!(courses = oit.len(), "OIT course data loaded");

    let pool = db::connect(&settings.database).await?;
    let ocra = MySqlOcra::new(pool);

    let needs_sheet = options.update_ss || options.selection == CourseSelection::Spreadsheet;
    let sheet = if needs_sheet {
        let creds = ServiceAccountCredentials::from_setting(settings.sheet_credentials_json()?)?;
        Some(
            GoogleSheetsClient::open(
                creds,
                settings.sheet.id.as_deref(),
                settings.sheet.name.as_deref(),
            )
            .await?,
        )
    } else {
        None
    };

    let builder = ReadingListBuilder::new(
        settings,
        &oit,
        &ocra,
        sheet.as_ref().map(|s| s as &dyn SpreadsheetClient),
    )?;
    let report = builder.run(&options).await?;

    match &report.output_path {
        Some(path) => info!(
            records = report.records,
            published = report.published,
            "Done; reading list at {}",
            path.display()
        ),
        None => info!("Done; course list unchanged"),
    }
    Ok(())
}
