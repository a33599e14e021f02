//! Spreadsheet export of business records.

use super::BusinessRecord;
use super::xlsx::XlsxRecordSink;
use crate::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column headers, in order.
pub const RECORD_COLUMNS: [&str; 6] = [
    "business", "name", "address", "phone", "industry", "amount",
];

/// Spreadsheet file formats, chosen by output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values (`.csv`).
    Csv,
    /// Office Open XML workbook (`.xlsx`).
    Xlsx,
}

impl ExportFormat {
    /// Supported file extensions.
    pub const EXTENSIONS: [&'static str; 2] = ["csv", "xlsx"];

    /// Returns the file extension.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Picks the format from the extension of `path`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the extension is missing or is
    /// not one of [`EXTENSIONS`](Self::EXTENSIONS).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(Error::InvalidInput(format!(
                "unsupported output file '{}': expected a .{} file",
                path.display(),
                Self::EXTENSIONS.join(" or .")
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Destination for exported records.
pub trait RecordSink {
    /// Writes a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails.
    fn write(&mut self, record: &BusinessRecord) -> Result<()>;

    /// Finalizes the export, writing headers if nothing was written yet and
    /// flushing buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails.
    fn finalize(self: Box<Self>) -> Result<()>;
}

/// CSV record sink.
pub struct CsvRecordSink<W: Write> {
    writer: csv::Writer<W>,
    headers_written: bool,
}

impl<W: Write> CsvRecordSink<W> {
    /// Creates a new CSV sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false) // headers are written manually
            .from_writer(writer);
        Self {
            writer,
            headers_written: false,
        }
    }

    fn ensure_headers(&mut self) -> Result<()> {
        if !self.headers_written {
            self.writer
                .write_record(RECORD_COLUMNS)
                .map_err(|e| Error::OperationFailed {
                    operation: "write_csv_headers".to_string(),
                    cause: e.to_string(),
                })?;
            self.headers_written = true;
        }
        Ok(())
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write(&mut self, record: &BusinessRecord) -> Result<()> {
        self.ensure_headers()?;
        self.writer
            .write_record(record.values())
            .map_err(|e| Error::OperationFailed {
                operation: "write_csv".to_string(),
                cause: e.to_string(),
            })
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.ensure_headers()?;
        self.writer.flush().map_err(|e| Error::OperationFailed {
            operation: "flush_csv".to_string(),
            cause: e.to_string(),
        })
    }
}

fn write_records<S: RecordSink + ?Sized>(
    records: &[BusinessRecord],
    mut sink: Box<S>,
) -> Result<()> {
    for record in records {
        sink.write(record)?;
    }
    sink.finalize()
}

/// Writes `records` as CSV to `writer`. An empty slice yields only the header
/// row.
pub fn export_to_writer<W: Write>(records: &[BusinessRecord], writer: W) -> Result<()> {
    write_records(records, Box::new(CsvRecordSink::new(writer)))
}

/// Writes `records` to the spreadsheet file at `path`, replacing it.
///
/// The format follows the file extension (see [`ExportFormat::from_path`]).
/// An unsupported extension is rejected before anything is created.
pub fn export(records: &[BusinessRecord], path: &Path) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_export_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }
    let file = File::create(path).map_err(|e| Error::OperationFailed {
        operation: "create_export_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    let sink: Box<dyn RecordSink> = match format {
        ExportFormat::Csv => Box::new(CsvRecordSink::new(file)),
        ExportFormat::Xlsx => Box::new(XlsxRecordSink::new(file)),
    };
    write_records(records, sink)?;
    tracing::info!(
        path = %path.display(),
        %format,
        rows = records.len(),
        "Exported records"
    );
    Ok(())
}
