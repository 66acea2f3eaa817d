//! Case report table reconstruction.
//!
//! A report is a sequence of council district sections. Each section opens
//! with a `Council District -- N` title followed by a header line and one
//! line per case. Long cells wrap onto continuation lines, and tables
//! continue across page breaks. [`parse_pages`] walks the positioned words
//! line by line and rebuilds the rows in document order; a continuation
//! line adds each fragment to the column it sits under.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use planning_cases_permit_models::Column;
use regex::Regex;

use crate::header::ColumnMapping;
use crate::text_table::{PageLayout, TextLine, group_lines};

/// District assigned when a title has no readable number.
pub const UNKNOWN_DISTRICT: &str = "Unknown";

static DISTRICT_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^council\s+district\b\s*(?:-+|:)?\s*(\d+)?").unwrap_or_else(|_| unreachable!())
});

static PAGE_FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^page\s+\d+(?:\s+of\s+\d+)?$").unwrap_or_else(|_| unreachable!())
});

/// One table row as read from the PDF, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Council district of the section the row was found in.
    pub district: String,
    /// 1-based page number where the row starts.
    pub page: usize,
    /// Raw cell text by column. Columns missing from the line are absent.
    pub cells: BTreeMap<Column, String>,
}

impl RawRow {
    /// Raw text of `column`, or `""`.
    #[must_use]
    pub fn get(&self, column: Column) -> &str {
        self.cells.get(&column).map_or("", String::as_str)
    }
}

/// Rows reconstructed from one document, with structure statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedReport {
    /// Rows in document order.
    pub rows: Vec<RawRow>,
    /// Number of pages read.
    pub pages: usize,
    /// Number of district titles seen.
    pub districts: usize,
    /// Number of header lines seen.
    pub headers: usize,
    /// Non-blank lines that could not be placed in any table.
    pub ignored_lines: usize,
}

impl ExtractedReport {
    /// Returns `true` if no table header was found anywhere in the document.
    #[must_use]
    pub const fn has_no_table(&self) -> bool {
        self.headers == 0
    }
}

/// Returns the district number if `line` is a district title.
///
/// Titles without a readable number yield [`UNKNOWN_DISTRICT`].
#[must_use]
pub fn district_title(line: &str) -> Option<String> {
    let caps = DISTRICT_TITLE.captures(line.trim())?;
    Some(
        caps.get(1)
            .map_or_else(|| UNKNOWN_DISTRICT.to_string(), |m| m.as_str().to_string()),
    )
}

#[derive(Default)]
struct ReportParser {
    district: Option<String>,
    mapping: Option<ColumnMapping>,
    report: ExtractedReport,
}

impl ReportParser {
    fn push_line(&mut self, page: usize, line: &TextLine) {
        let text = line.text();
        let text = text.trim();
        if text.is_empty() || PAGE_FOOTER.is_match(text) {
            return;
        }

        if let Some(district) = district_title(text) {
            log::debug!("Page {page}: council district {district}");
            self.district = Some(district);
            self.mapping = None;
            self.report.districts += 1;
            return;
        }

        if let Some(mapping) = ColumnMapping::from_header(line) {
            if self.mapping.as_ref() != Some(&mapping) {
                log::debug!("Page {page}: header with columns {:?}", mapping.columns());
            }
            self.mapping = Some(mapping);
            self.report.headers += 1;
            return;
        }

        let (Some(district), Some(mapping)) = (&self.district, &self.mapping) else {
            self.report.ignored_lines += 1;
            return;
        };

        let values = mapping.assign(line);

        if mapping.starts_record(&values) {
            self.report.rows.push(RawRow {
                district: district.clone(),
                page,
                cells: values,
            });
            return;
        }

        match self.report.rows.last_mut() {
            Some(last) if last.district == *district && !values.is_empty() => {
                for (column, fragment) in values {
                    let cell = last.cells.entry(column).or_default();
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(&fragment);
                }
            }
            _ => self.report.ignored_lines += 1,
        }
    }
}

/// Rebuilds the case table rows from positioned page words.
#[must_use]
pub fn parse_pages(pages: &[PageLayout]) -> ExtractedReport {
    let mut parser = ReportParser::default();

    for (i, page) in pages.iter().enumerate() {
        for line in group_lines(&page.words) {
            parser.push_line(i + 1, &line);
        }
    }

    let mut report = parser.report;
    report.pages = pages.len();
    report
}
