//! # ledger: the flushable record of one archival run
//!
//! [`ArchivalLedger`] accumulates one [`ArchivalRecord`] per archived item and one
//! [`ErrorRecord`] per failure, in processing order. It is an owned value: the run that
//! creates it lends it to the item loop and flushes it afterwards, whether the loop
//! completed or was interrupted.
//!
//! Flushing renders the ledger into [`Sheet`]s and hands them to a [`TableWriter`]. The
//! `Errors` sheet is only present when at least one error was recorded. Flushing is
//! idempotent: each call rewrites the same artifact from the current state.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use tracing::{info, warn};

use crate::contract::{Sheet, TableWriter};
use crate::error::{ArchiveError, Result};

pub const COLLECTION_SHEET: &str = "Collection";
pub const ERRORS_SHEET: &str = "Errors";

pub const COLLECTION_HEADER: [&str; 8] = [
    "Title",
    "Other Title",
    "Summary",
    "Names",
    "Notes",
    "Call Number",
    "Format",
    "Filename",
];
pub const ERRORS_HEADER: [&str; 2] = ["Url", "Error"];

/// One successfully archived concrete item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivalRecord {
    pub title: String,
    pub alternate_title: String,
    pub summary: String,
    /// Newline-joined
    pub contributor_names: String,
    /// Newline-joined
    pub notes: String,
    pub call_number: String,
    pub media_type: String,
    pub file_name: String,
}

impl ArchivalRecord {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.alternate_title.clone(),
            self.summary.clone(),
            self.contributor_names.clone(),
            self.notes.clone(),
            self.call_number.clone(),
            self.media_type.clone(),
            self.file_name.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub source_url: String,
    pub message: String,
}

/// Counts reported after a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReport {
    pub path: PathBuf,
    pub records: usize,
    pub errors: usize,
}

#[derive(Debug)]
pub struct ArchivalLedger {
    path: PathBuf,
    records: Vec<ArchivalRecord>,
    errors: Vec<ErrorRecord>,
}

impl ArchivalLedger {
    /// A ledger that flushes to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_success(&mut self, record: ArchivalRecord) {
        self.records.push(record);
    }

    pub fn record_error(&mut self, source_url: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ErrorRecord {
            source_url: source_url.into(),
            message: message.into(),
        });
    }

    pub fn records(&self) -> &[ArchivalRecord] {
        &self.records
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The sheets a flush would write right now.
    pub fn sheets(&self) -> Vec<Sheet> {
        let mut sheets = vec![Sheet {
            name: COLLECTION_SHEET.to_string(),
            header: COLLECTION_HEADER.iter().map(|h| h.to_string()).collect(),
            rows: self.records.iter().map(ArchivalRecord::to_row).collect(),
        }];
        if self.has_errors() {
            sheets.push(Sheet {
                name: ERRORS_SHEET.to_string(),
                header: ERRORS_HEADER.iter().map(|h| h.to_string()).collect(),
                rows: self
                    .errors
                    .iter()
                    .map(|e| vec![e.source_url.clone(), e.message.clone()])
                    .collect(),
            });
        }
        sheets
    }

    /// Write the current state through `writer`. Safe to call any number of times.
    pub fn flush(&self, writer: &dyn TableWriter) -> Result<LedgerReport> {
        if self.has_errors() {
            warn!(
                errors = self.errors.len(),
                "Some collection items could not be archived"
            );
            for error in &self.errors {
                warn!(url = %error.source_url, error = %error.message, "Archive error");
            }
        }
        writer.write(&self.path, &self.sheets())?;
        info!(
            path = %self.path.display(),
            records = self.records.len(),
            errors = self.errors.len(),
            "Ledger flushed"
        );
        Ok(self.report())
    }

    pub fn report(&self) -> LedgerReport {
        LedgerReport {
            path: self.path.clone(),
            records: self.records.len(),
            errors: self.errors.len(),
        }
    }
}

/// Longest string a worksheet cell accepts, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// `value` cut to [`MAX_CELL_CHARS`] characters.
fn fit_cell(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => Cow::Owned(value[..end].to_string()),
        None => Cow::Borrowed(value),
    }
}

/// Writes sheets as an `.xlsx` workbook.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxTableWriter {
    /// Document creation date; the current time when unset.
    created: Option<NaiveDate>,
}

impl XlsxTableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the creation date recorded in the document properties, so repeated flushes of
    /// the same ledger produce identical files.
    pub fn with_creation_date(created: NaiveDate) -> Self {
        Self {
            created: Some(created),
        }
    }

    fn build(&self, sheets: &[Sheet]) -> std::result::Result<Workbook, rust_xlsxwriter::XlsxError> {
        let mut workbook = Workbook::new();
        if let Some(created) = self.created {
            let created = ExcelDateTime::from_ymd(
                created.year() as u16,
                created.month() as u8,
                created.day() as u8,
            )?;
            workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));
        }
        let bold = Format::new().set_bold();
        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            for (col, value) in sheet.header.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, value, &bold)?;
            }
            for (row_index, row) in sheet.rows.iter().enumerate() {
                for (col, value) in row.iter().enumerate() {
                    let cell = fit_cell(value);
                    if cell.len() < value.len() {
                        warn!(
                            sheet = %sheet.name,
                            row = row_index + 1,
                            column = sheet.header.get(col).map(String::as_str).unwrap_or_default(),
                            chars = value.chars().count(),
                            "Cell exceeds the worksheet limit, truncated"
                        );
                    }
                    worksheet.write_string(row_index as u32 + 1, col as u16, cell.as_ref())?;
                }
            }
        }
        Ok(workbook)
    }
}

impl TableWriter for XlsxTableWriter {
    fn write(&self, path: &Path, sheets: &[Sheet]) -> Result<()> {
        let export_error = |reason: String| ArchiveError::Export {
            path: path.to_path_buf(),
            reason,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut workbook = self.build(sheets).map_err(|e| export_error(e.to_string()))?;
        workbook
            .save(path)
            .map_err(|e| export_error(e.to_string()))?;
        Ok(())
    }
}
