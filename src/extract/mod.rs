//! Business record extraction.
//!
//! Pulls six-field business blocks out of free-form text:
//!
//! ```text
//! Business: Acme
//! Name: Jane Doe
//! Address: 1 Main St
//! Phone: 555-1234
//! Industry: Retail
//! Amount: $1,200.50
//! ```
//!
//! Labels are case-insensitive and each value runs to the end of its line.
//! Blocks that are incomplete or out of order are skipped.

// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

mod export;
mod xlsx;

pub use export::{
    CsvRecordSink, ExportFormat, RECORD_COLUMNS, RecordSink, export, export_to_writer,
};
pub use xlsx::{SHEET_NAME, XlsxRecordSink};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A business block.
static BUSINESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?im)Business:\s*(?P<business>.+?)\n",
        r"Name:\s*(?P<name>.+?)\n",
        r"Address:\s*(?P<address>.+?)\n",
        r"Phone:\s*(?P<phone>.+?)\n",
        r"Industry:\s*(?P<industry>.+?)\n",
        r"Amount:\s*\$?(?P<amount>[0-9,\.]+)",
    ))
    .expect("static regex: business record pattern")
});

/// One extracted business record. All values are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Business name.
    pub business: String,
    /// Contact name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Phone number.
    pub phone: String,
    /// Industry.
    pub industry: String,
    /// Amount, digits with separators, without the currency sign.
    pub amount: String,
}

impl BusinessRecord {
    /// Field values in column order.
    #[must_use]
    pub fn values(&self) -> [&str; 6] {
        [
            &self.business,
            &self.name,
            &self.address,
            &self.phone,
            &self.industry,
            &self.amount,
        ]
    }

    fn from_captures(caps: &Captures<'_>) -> Self {
        let field = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim_end_matches('\r').to_string())
                .unwrap_or_default()
        };
        Self {
            business: field("business"),
            name: field("name"),
            address: field("address"),
            phone: field("phone"),
            industry: field("industry"),
            amount: field("amount"),
        }
    }
}

/// Extracts every business record in `text`, in order of appearance.
#[must_use]
pub fn extract(text: &str) -> Vec<BusinessRecord> {
    let records: Vec<BusinessRecord> = BUSINESS_REGEX
        .captures_iter(text)
        .map(|caps| BusinessRecord::from_captures(&caps))
        .collect();
    tracing::debug!(count = records.len(), "Extracted business records");
    records
}
