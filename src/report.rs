//! CSV report writing and replay.
//!
//! The report is both the audit output of a run and the resume input of a
//! later run. The column set and status vocabulary are a persisted-state
//! contract: changing either breaks resumability.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;

use crate::types::{MoveStatus, OutcomeRecord, TIMESTAMP_FORMAT};

/// Report column set, in order.
pub const REPORT_COLUMNS: [&str; 6] = ["timestamp", "case_id", "status", "source_path", "dest_path", "message"];

/// Status string for preamble rows carrying run parameters.
const PARAMETER_STATUS: &str = "PARAMETER";

/// Marker message terminating the parameter preamble.
const END_PARAMETERS: &str = "--- END PARAMETERS ---";

/// Appends outcome rows to a CSV report, flushing after every row so an
/// interrupted run leaves a valid, resumable file.
pub struct ReportWriter {
    writer: csv::Writer<File>,
}

impl ReportWriter {
    /// Create the report file and write the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create report file: '{}'", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(REPORT_COLUMNS).context("Failed to write report header")?;
        writer.flush().context("Failed to flush report header")?;
        Ok(Self { writer })
    }

    /// Write one `key=value` parameter preamble row.
    pub fn write_parameter(&mut self, key: &str, value: &str) -> Result<()> {
        self.write_parameter_row(&format!("{key}={value}"))
    }

    /// Terminate the parameter preamble.
    pub fn end_parameters(&mut self) -> Result<()> {
        self.write_parameter_row(END_PARAMETERS)
    }

    fn write_parameter_row(&mut self, message: &str) -> Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.writer
            .write_record([timestamp.as_str(), "", PARAMETER_STATUS, "", "", message])
            .context("Failed to write report parameter row")?;
        self.writer.flush().context("Failed to flush report")?;
        Ok(())
    }

    /// Append one outcome record. The multi-match qualifier becomes message
    /// text here and nowhere else.
    pub fn write_record(&mut self, record: &OutcomeRecord) -> Result<()> {
        let message = if record.multi_match {
            format!("{} (multiple matches for this CaseID)", record.message)
        } else {
            record.message.clone()
        };
        self.writer
            .write_record([
                record.timestamp.as_str(),
                record.case_id.as_str(),
                record.status.as_str(),
                record.source_path.as_str(),
                record.dest_path.as_str(),
                message.as_str(),
            ])
            .context("Failed to write report record")?;
        self.writer.flush().context("Failed to flush report")?;
        Ok(())
    }
}

/// One parsed report row, fields trimmed. Status stays a string so rows
/// written by other tool versions survive the round trip.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub timestamp: String,
    pub case_id: String,
    pub status: String,
    pub source_path: String,
    pub dest_path: String,
    pub message: String,
}

/// Fully parse a report file, skipping parameter preamble rows.
pub fn read_report(path: &Path) -> Result<Vec<ReportRow>> {
    if !path.exists() {
        bail!("Report file does not exist: '{}'", path.display());
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open report file: '{}'", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Report file is empty or invalid: '{}'", path.display()))?
        .clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        bail!("Report file is empty or invalid: '{}'", path.display());
    }

    // Columns are located by name so extra columns in future versions do
    // not break replay.
    let mut positions = Vec::with_capacity(REPORT_COLUMNS.len());
    for column in REPORT_COLUMNS {
        match headers.iter().position(|h| h == column) {
            Some(position) => positions.push(position),
            None => bail!("Report file '{}' is missing required columns: {column}", path.display()),
        }
    }

    let field = |row: &csv::StringRecord, i: usize| row.get(positions[i]).unwrap_or_default().to_string();

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("Failed to parse report file: '{}'", path.display()))?;
        let status = field(&row, 2);
        if status == PARAMETER_STATUS {
            continue;
        }
        rows.push(ReportRow {
            timestamp: field(&row, 0),
            case_id: field(&row, 1),
            status,
            source_path: field(&row, 3),
            dest_path: field(&row, 4),
            message: field(&row, 5),
        });
    }
    Ok(rows)
}

/// Pairs already terminally resolved by a prior run.
///
/// Keyed by `(case_id, source_path)`; `NOT_FOUND` rows use an empty source
/// path. Only unambiguous terminal statuses suppress reprocessing: `ERROR`
/// rows are retried and dry-run rows are always reprocessed.
#[derive(Debug, Default)]
pub struct ResumeState {
    skip: HashSet<(String, String)>,
}

impl ResumeState {
    /// Build the skip set from a prior report. Fatal if the file is missing,
    /// empty, or lacks the required columns.
    pub fn load(path: &Path) -> Result<Self> {
        let rows = read_report(path)?;
        let mut skip = HashSet::new();
        for row in rows {
            let Some(status) = MoveStatus::parse(&row.status) else {
                continue;
            };
            if !status.is_resume_skippable() {
                continue;
            }
            // Move-family rows without a source path are malformed; keep
            // them out of the skip set rather than matching everything.
            if row.source_path.is_empty() && status != MoveStatus::NotFound {
                continue;
            }
            skip.insert((row.case_id, row.source_path));
        }
        Ok(Self { skip })
    }

    #[must_use]
    pub fn should_skip(&self, case_id: &str, source_path: &str) -> bool {
        self.skip.contains(&(case_id.to_string(), source_path.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skip.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skip.is_empty()
    }
}
