//! Report date parsing and local file naming.
//!
//! The index publishes a free-form date string per report; the same date is
//! baked into the local file name so that documents found on disk can be
//! placed in the right reporting period without the index.

use std::sync::LazyLock;

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use planning_cases_source_models::{DocumentRef, IndexEntry};
use regex::Regex;

/// Date formats seen in the index's `Date` field.
const INDEX_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"];

/// Datetime formats seen in the index's `Date` field.
const INDEX_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// `MM_DD_YYYY`, as produced by [`sanitize_label`] from `MM/DD/YYYY`.
static US_DATE_IN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(\d{1,2})_(\d{1,2})_(\d{4})(?:[^0-9]|$)")
        .unwrap_or_else(|_| unreachable!())
});

/// `YYYY-MM-DD` or `YYYY_MM_DD`.
static ISO_DATE_IN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(\d{4})[-_](\d{2})[-_](\d{2})(?:[^0-9]|$)")
        .unwrap_or_else(|_| unreachable!())
});

/// `YYYY-MM` or `YYYY_MM` with no day.
static YEAR_MONTH_IN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(\d{4})[-_](\d{2})(?:[^0-9]|$)").unwrap_or_else(|_| unreachable!())
});

/// The reporting period a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// Reporting year.
    pub year: i32,
    /// Reporting month, if known.
    pub month: Option<u32>,
    /// Full report date, if known.
    pub date: Option<NaiveDate>,
}

impl From<NaiveDate> for Period {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: Some(date.month()),
            date: Some(date),
        }
    }
}

/// Parses an index date string.
#[must_use]
pub fn parse_report_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    INDEX_DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            // `%Y` happily reads "23" as the year 23.
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .filter(|d| d.year() >= 1900)
        })
        .or_else(|| {
            INDEX_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Infers the reporting period from a file name.
#[must_use]
pub fn period_from_file_name(file_name: &str) -> Option<Period> {
    if let Some(caps) = ISO_DATE_IN_NAME.captures(file_name)
        && let Some(date) = ymd(&caps[1], &caps[2], &caps[3])
    {
        return Some(date.into());
    }

    if let Some(caps) = US_DATE_IN_NAME.captures(file_name)
        && let Some(date) = ymd(&caps[3], &caps[1], &caps[2])
    {
        return Some(date.into());
    }

    let caps = YEAR_MONTH_IN_NAME.captures(file_name)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok().filter(|m| (1..=12).contains(m))?;
    Some(Period {
        year,
        month: Some(month),
        date: None,
    })
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Replaces every character outside `[A-Za-z0-9-]` with `_`, so that
/// `03/10/2023` becomes `03_10_2023`.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Returns the last path segment of `url` if it names a PDF.
fn pdf_name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let is_pdf = std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    is_pdf.then(|| name.to_string())
}

/// Local file name for an index entry: `{prefix}_{label}.pdf`, or the URL's
/// own PDF name when the entry has no date.
#[must_use]
pub fn file_name_for_entry(prefix: &str, entry: &IndexEntry) -> Option<String> {
    match entry.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => Some(format!("{prefix}_{}.pdf", sanitize_label(date))),
        _ => entry.url.as_deref().and_then(pdf_name_from_url),
    }
}

/// Builds a [`DocumentRef`] from an index entry returned for `queried_year`.
///
/// Returns `None` when the entry has no URL or no usable file name.
#[must_use]
pub fn document_from_entry(
    prefix: &str,
    entry: &IndexEntry,
    queried_year: i32,
) -> Option<DocumentRef> {
    let url = entry.url.as_deref()?.trim();
    if url.is_empty() {
        return None;
    }
    let file_name = file_name_for_entry(prefix, entry)?;
    let label = entry.date.as_deref().unwrap_or_default().trim().to_string();

    let period = parse_report_date(&label)
        .map(Period::from)
        .or_else(|| period_from_file_name(&file_name))
        .unwrap_or(Period {
            year: queried_year,
            month: None,
            date: None,
        });

    Some(DocumentRef {
        url: Some(url.to_string()),
        file_name,
        label,
        report_date: period.date,
        year: period.year,
        month: period.month,
    })
}

/// Builds a [`DocumentRef`] for a PDF found on disk with no index entry.
///
/// Returns `None` when the reporting period cannot be inferred from the
/// file name.
#[must_use]
pub fn document_from_file_name(file_name: &str) -> Option<DocumentRef> {
    let period = period_from_file_name(file_name)?;
    let label = match (period.date, period.month) {
        (Some(date), _) => date.format("%m/%d/%Y").to_string(),
        (None, Some(month)) => format!("{}-{month:02}", period.year),
        (None, None) => period.year.to_string(),
    };

    Some(DocumentRef {
        url: None,
        file_name: file_name.to_string(),
        label,
        report_date: period.date,
        year: period.year,
        month: period.month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: Option<&str>, date: Option<&str>) -> IndexEntry {
        IndexEntry {
            url: url.map(str::to_string),
            date: date.map(str::to_string),
        }
    }

    #[test]
    fn parses_index_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 10);
        assert_eq!(parse_report_date("03/10/2023"), expected);
        assert_eq!(parse_report_date(" 3/10/2023 "), expected);
        assert_eq!(parse_report_date("2023-03-10"), expected);
        assert_eq!(parse_report_date("2023-03-10T00:00:00"), expected);
        assert_eq!(parse_report_date("03/10/23"), expected);
        assert_eq!(parse_report_date("March 10"), None);
    }

    #[test]
    fn infers_period_from_file_names() {
        let p = period_from_file_name("biweekly_case_report_03_10_2023.pdf").unwrap();
        assert_eq!((p.year, p.month), (2023, Some(3)));
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2023, 3, 10));

        let p = period_from_file_name("report_2023-07-21.pdf").unwrap();
        assert_eq!((p.year, p.month), (2023, Some(7)));

        let p = period_from_file_name("report_2022-11.pdf").unwrap();
        assert_eq!((p.year, p.month, p.date), (2022, Some(11), None));

        assert!(period_from_file_name("report_final.pdf").is_none());
        assert!(period_from_file_name("report_2022-13.pdf").is_none());
    }

    #[test]
    fn names_files_after_the_index_date() {
        let e = entry(Some("https://x/file.pdf"), Some("03/10/2023"));
        assert_eq!(
            file_name_for_entry("biweekly_case_report", &e).as_deref(),
            Some("biweekly_case_report_03_10_2023.pdf")
        );

        let undated = entry(Some("https://x/docs/Report%201.PDF?v=2"), None);
        assert_eq!(
            file_name_for_entry("biweekly_case_report", &undated).as_deref(),
            Some("Report%201.PDF")
        );

        let opaque = entry(Some("https://x/download?id=7"), Some("  "));
        assert_eq!(file_name_for_entry("biweekly_case_report", &opaque), None);
    }

    #[test]
    fn builds_document_from_entry() {
        let e = entry(Some("https://x/a.pdf"), Some("07/21/2023"));
        let doc = document_from_entry("biweekly_case_report", &e, 2023).unwrap();
        assert_eq!(doc.file_name, "biweekly_case_report_07_21_2023.pdf");
        assert_eq!(doc.label, "07/21/2023");
        assert_eq!((doc.year, doc.month), (2023, Some(7)));
        assert_eq!(doc.url.as_deref(), Some("https://x/a.pdf"));
    }

    #[test]
    fn falls_back_to_queried_year_without_a_date() {
        let e = entry(Some("https://x/summary.pdf"), None);
        let doc = document_from_entry("biweekly_case_report", &e, 2021).unwrap();
        assert_eq!((doc.year, doc.month), (2021, None));
        assert!(document_from_entry("p", &entry(None, Some("03/10/2023")), 2023).is_none());
    }

    #[test]
    fn local_file_round_trips_the_label() {
        let doc = document_from_file_name("biweekly_case_report_03_10_2023.pdf").unwrap();
        assert_eq!(doc.label, "03/10/2023");
        assert!(doc.url.is_none());
        assert_eq!(doc.stem(), "biweekly_case_report_03_10_2023");
    }
}
