//! Minimal Office Open XML workbook writer.
//!
//! Produces a single-sheet `.xlsx` package with inline string cells. The
//! package holds exactly the parts a reader needs to locate the sheet.

use super::BusinessRecord;
use super::export::{RECORD_COLUMNS, RecordSink};
use crate::{Error, Result};
use std::fmt::Write as _;
use std::io::{Seek, Write};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Name of the only worksheet.
pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

const SHEET_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#;

const SHEET_TAIL: &str = "</sheetData></worksheet>";

/// Column letters for the six record fields.
const COLUMN_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

fn workbook_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        SHEET_NAME
    )
}

/// Drops characters XML 1.0 cannot carry.
fn xml_text(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

/// XLSX record sink.
///
/// Rows are buffered as sheet XML and the package is assembled on
/// [`finalize`](RecordSink::finalize). The header row is always row 1.
pub struct XlsxRecordSink<W: Write + Seek> {
    output: W,
    sheet: String,
    rows: usize,
}

impl<W: Write + Seek> XlsxRecordSink<W> {
    /// Creates a sink that writes the workbook to `output`.
    #[must_use]
    pub fn new(output: W) -> Self {
        let mut sink = Self {
            output,
            sheet: String::from(SHEET_HEAD),
            rows: 0,
        };
        sink.push_row(&RECORD_COLUMNS);
        sink
    }

    fn push_row(&mut self, values: &[&str; 6]) {
        self.rows += 1;
        let row = self.rows;
        let _ = write!(self.sheet, r#"<row r="{row}">"#);
        for (column, value) in COLUMN_LETTERS.iter().zip(values) {
            let _ = write!(
                self.sheet,
                r#"<c r="{column}{row}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                xml_text(value)
            );
        }
        self.sheet.push_str("</row>");
    }
}

fn zip_error(operation: &str, e: &impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

impl<W: Write + Seek> RecordSink for XlsxRecordSink<W> {
    fn write(&mut self, record: &BusinessRecord) -> Result<()> {
        self.push_row(&record.values());
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<()> {
        let Self { output, mut sheet, .. } = *self;
        sheet.push_str(SHEET_TAIL);

        let workbook = workbook_xml();
        let parts: [(&str, &str); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", &workbook),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", &sheet),
        ];

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut archive = zip::ZipWriter::new(output);
        for (name, body) in parts {
            archive
                .start_file(name, options)
                .map_err(|e| zip_error("start_xlsx_part", &e))?;
            archive
                .write_all(body.as_bytes())
                .map_err(|e| zip_error("write_xlsx_part", &e))?;
        }
        let mut output = archive.finish().map_err(|e| zip_error("finish_xlsx", &e))?;
        output.flush().map_err(|e| zip_error("flush_xlsx", &e))
    }
}
