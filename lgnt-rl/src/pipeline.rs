//! Reading-list build pipeline
//!
//! One run, in order:
//! 1. warn when the PDF data is stale
//! 2. pick course ids (spreadsheet, OIT file or an explicit list)
//! 3. resolve each course id to OIT sections and OCRA class ids
//! 4. map each class's OCRA readings to basic records
//! 5. turn basic records into Leganto rows
//! 6. update the tracker (OIT-file runs only)
//! 7. publish to the spreadsheet when asked
//! 8. write the tab-separated file

use crate::change_check::check_for_updates;
use crate::db::OcraSource;
use crate::leganto::{build_rows, LegantoRow};
use crate::oit::{plain_course_code, OitCourseLoader, RowRange};
use crate::output::write_reading_list;
use crate::readings::cdl::CdlChecker;
use crate::readings::mapper::{map_empty, ReadingMapper};
use crate::readings::pdf::{needs_refresh, PdfData};
use crate::readings::{BasicRecord, CourseContext};
use crate::sheets::{self, SpreadsheetClient};
use crate::tracker::Tracker;
use crate::OIT_NOT_FOUND_MARKER;
use anyhow::{Context, Result};
use chrono::Local;
use lgnt_common::config::Settings;
use lgnt_common::time::{file_stamp, iso_stamp};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const SPREADSHEET_SELECTOR: &str = "SPREADSHEET";
pub const OIT_FILE_SELECTOR: &str = "oit_file";

// ============================================================================
// Options
// ============================================================================

/// Where the course ids for a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseSelection {
    /// The spreadsheet's course-id worksheet
    Spreadsheet,
    /// Every course in the OIT extract, minus those already tracked
    OitFile,
    /// Explicit ids, plain (`HIST1234`) or full OIT codes
    Ids(Vec<String>),
}

impl CourseSelection {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            SPREADSHEET_SELECTOR => CourseSelection::Spreadsheet,
            OIT_FILE_SELECTOR => CourseSelection::OitFile,
            list => CourseSelection::Ids(
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub selection: CourseSelection,
    pub update_ss: bool,
    /// Skip the spreadsheet change check
    pub force: bool,
    /// Slice of the OIT extract; only used with [`CourseSelection::OitFile`]
    pub range: Option<RowRange>,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub course_ids: usize,
    pub classes: usize,
    pub records: usize,
    pub published: bool,
    /// `None` when the run stopped early because nothing changed
    pub output_path: Option<PathBuf>,
}

/// One class to pull readings for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Id as requested
    pub course_id: String,
    /// OCRA class id; `None` when OCRA has no class for the course
    pub class_id: Option<String>,
    pub course: CourseContext,
}

// ============================================================================
// Builder
// ============================================================================

pub struct ReadingListBuilder<'a> {
    settings: &'a Settings,
    oit: &'a OitCourseLoader,
    ocra: &'a dyn OcraSource,
    sheets: Option<&'a dyn SpreadsheetClient>,
    cdl: CdlChecker,
    pdf: PdfData,
}

impl<'a> ReadingListBuilder<'a> {
    /// Check and load the PDF data and CDL list named in the settings
    pub fn new(
        settings: &'a Settings,
        oit: &'a OitCourseLoader,
        ocra: &'a dyn OcraSource,
        sheets: Option<&'a dyn SpreadsheetClient>,
    ) -> Result<Self> {
        let pdf_path = settings.pdf_json_path()?;
        if needs_refresh(pdf_path, settings.pdf_older_than_days, Local::now())? {
            warn!(
                path = %pdf_path.display(),
                days = settings.pdf_older_than_days,
                "PDF data is stale; rebuild it before relying on scan links"
            );
        }
        let pdf = PdfData::load(pdf_path, settings.files_url_pattern()?)?;
        let cdl = CdlChecker::load(settings.cdl_json_path.as_deref())?;
        Ok(Self::with_lookups(settings, oit, ocra, sheets, cdl, pdf))
    }

    pub fn with_lookups(
        settings: &'a Settings,
        oit: &'a OitCourseLoader,
        ocra: &'a dyn OcraSource,
        sheets: Option<&'a dyn SpreadsheetClient>,
        cdl: CdlChecker,
        pdf: PdfData,
    ) -> Self {
        Self {
            settings,
            oit,
            ocra,
            sheets,
            cdl,
            pdf,
        }
    }

    fn sheets(&self) -> Result<&'a dyn SpreadsheetClient> {
        self.sheets
            .context("Spreadsheet access is needed but no spreadsheet client is configured")
    }

    pub async fn run(&self, options: &BuildOptions) -> Result<BuildReport> {
        info!(
            selection = ?options.selection,
            update_ss = options.update_ss,
            force = options.force,
            range = ?options.range,
            "Building reading lists"
        );

        let mut tracker = match options.selection {
            CourseSelection::OitFile => Some(Tracker::new(self.oit.len())),
            _ => None,
        };

        let Some(course_ids) = self.course_ids(options, tracker.as_mut()).await? else {
            info!("No changes to the course list; nothing to do");
            return Ok(BuildReport::default());
        };

        let classes = self.classes_info(&course_ids).await?;
        let records = self.basic_data(&classes).await?;
        let rows = build_rows(&records, &self.settings.public_note);

        if let Some(tracker) = tracker.as_mut() {
            tracker.record_results(&rows);
            tracker.write(self.settings.tracker_json_filepath()?)?;
        }

        let now = Local::now();
        if options.update_ss {
            self.publish(&records, &rows, &iso_stamp(now)).await?;
        } else {
            debug!("Not updating spreadsheet");
        }

        let output_path = write_reading_list(&rows, &self.settings.output_dir, &file_stamp(now))?;

        let report = BuildReport {
            course_ids: course_ids.len(),
            classes: classes.len(),
            records: records.len(),
            published: options.update_ss,
            output_path: Some(output_path),
        };
        info!(?report, "Reading lists built");
        Ok(report)
    }

    /// Course ids for the run; `None` when the spreadsheet list is unchanged
    pub async fn course_ids(
        &self,
        options: &BuildOptions,
        tracker: Option<&mut Tracker>,
    ) -> Result<Option<Vec<String>>> {
        let ids = match &options.selection {
            CourseSelection::Spreadsheet => {
                let ids = sheets::read_course_ids(self.sheets()?)
                    .await
                    .context("Failed to read course ids from spreadsheet")?;
                if options.force {
                    info!("Skipping recent-updates check");
                } else if !check_for_updates(&ids, self.settings.last_checked_path()?)? {
                    return Ok(None);
                }
                ids
            }
            CourseSelection::OitFile => {
                let codes = self.oit.course_codes(options.range);
                match tracker {
                    Some(tracker) => {
                        let path = self.settings.tracker_json_filepath()?;
                        let codes = tracker.remove_already_processed(codes, path);
                        tracker.populate(&codes);
                        codes
                    }
                    None => codes,
                }
            }
            CourseSelection::Ids(ids) => ids.clone(),
        };
        debug!(count = ids.len(), ids = ?ids, "Course ids selected");
        Ok(Some(ids))
    }

    /// Resolve course ids to class entries
    ///
    /// Courses missing from the OIT data, or with no OCRA class, still get
    /// one entry without a class id so they surface as empty reading lists.
    pub async fn classes_info(&self, course_ids: &[String]) -> Result<Vec<ClassInfo>> {
        let mut classes = Vec::new();
        for course_id in course_ids {
            let sections = self.oit.find(course_id);
            if sections.is_empty() {
                warn!(course_id = %course_id, "Course not found in OIT data");
                classes.push(ClassInfo {
                    course_id: course_id.clone(),
                    class_id: None,
                    course: CourseContext {
                        leganto_course_id: format!("{}_for__{}", OIT_NOT_FOUND_MARKER, course_id),
                        ..Default::default()
                    },
                });
                continue;
            }

            for section in sections {
                let course = CourseContext {
                    leganto_course_id: section.course_code.clone(),
                    section_id: section.section_id.clone(),
                    course_title: section.course_title.clone(),
                };
                let plain = plain_course_code(&section.course_code);
                let class_ids = self
                    .ocra
                    .class_ids(&plain)
                    .await
                    .with_context(|| format!("Failed to look up class ids for {}", plain))?;
                if class_ids.len() > 1 {
                    debug!(course = %plain, count = class_ids.len(), "Several class ids");
                }
                if class_ids.is_empty() {
                    debug!(course = %plain, "No OCRA class id");
                    classes.push(ClassInfo {
                        course_id: course_id.clone(),
                        class_id: None,
                        course,
                    });
                    continue;
                }
                for class_id in class_ids {
                    classes.push(ClassInfo {
                        course_id: course_id.clone(),
                        class_id: Some(class_id),
                        course: course.clone(),
                    });
                }
            }
        }
        info!(courses = course_ids.len(), classes = classes.len(), "Class info prepared");
        Ok(classes)
    }

    /// Query OCRA for every class and map the readings
    pub async fn basic_data(&self, classes: &[ClassInfo]) -> Result<Vec<BasicRecord>> {
        let mapper = ReadingMapper::new(&self.cdl, &self.pdf, &self.settings.openurl_base);
        let mut records = Vec::new();
        for class in classes {
            let Some(class_id) = class.class_id.as_deref() else {
                records.push(map_empty(&class.course));
                continue;
            };
            let books = self
                .ocra
                .book_readings(class_id)
                .await
                .with_context(|| format!("Failed to query books for class {}", class_id))?;
            let articles = self
                .ocra
                .article_readings(class_id)
                .await
                .with_context(|| format!("Failed to query articles for class {}", class_id))?;
            let tracks = self
                .ocra
                .track_readings(class_id)
                .await
                .with_context(|| format!("Failed to query tracks for class {}", class_id))?;
            debug!(
                class_id,
                books = books.len(),
                articles = articles.len(),
                tracks = tracks.len(),
                "OCRA readings fetched"
            );
            records.extend(mapper.map_class(&class.course, books, articles, tracks));
        }
        info!(records = records.len(), "Basic records prepared");
        Ok(records)
    }

    async fn publish(&self, records: &[BasicRecord], rows: &[LegantoRow], stamp: &str) -> Result<()> {
        info!("Updating spreadsheet");
        sheets::publish(self.sheets()?, records, rows, stamp)
            .await
            .context("Failed to publish to spreadsheet")
    }
}
