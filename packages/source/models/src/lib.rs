#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report index types, document references and date range filters.
//!
//! The planning department publishes one PDF per reporting period. The
//! index endpoint lists them as [`IndexEntry`] values; each becomes a
//! [`DocumentRef`] once its local file name and reporting month are known.
//! A [`DateFilter`] from the command line is resolved into an
//! [`EffectiveRange`] that decides which documents are processed and how the
//! combined output file is named.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of the report index endpoint (`/dcpapi/general/biweeklycase/CD/{year}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Published reports for the queried year.
    #[serde(rename = "Entries", default)]
    pub entries: Vec<IndexEntry>,
}

/// A single report listed by the index endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Absolute URL of the PDF. Entries without one are ignored.
    #[serde(default)]
    pub url: Option<String>,
    /// Report date as published (usually `MM/DD/YYYY`).
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
}

/// A tracked source PDF.
///
/// Created from the index (or from a file already on disk) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Where the PDF can be downloaded from. `None` for documents that were
    /// only found in the local download directory.
    pub url: Option<String>,
    /// File name inside the download directory (always ends in `.pdf`).
    pub file_name: String,
    /// Human-readable report label, the index date as published.
    pub label: String,
    /// Parsed report date, when the label or file name contains one.
    pub report_date: Option<NaiveDate>,
    /// Reporting year.
    pub year: i32,
    /// Reporting month (1-12), if it could be inferred.
    pub month: Option<u32>,
}

impl DocumentRef {
    /// File name without the `.pdf` extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    /// Path of the PDF inside `dir`.
    #[must_use]
    pub fn local_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }

    /// Path of the per-document CSV inside `dir`.
    #[must_use]
    pub fn csv_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.csv", self.stem()))
    }

    /// Deterministic processing order: by report period, then file name.
    #[must_use]
    pub fn sort_key(&self) -> (i32, u32, Option<NaiveDate>, &str) {
        (
            self.year,
            self.month.unwrap_or(0),
            self.report_date,
            &self.file_name,
        )
    }
}

/// Optional inclusive year/month bounds from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    /// First year to include.
    pub start_year: Option<i32>,
    /// Last year to include.
    pub end_year: Option<i32>,
    /// First month (1-12) to include in every selected year.
    pub start_month: Option<u32>,
    /// Last month (1-12) to include in every selected year.
    pub end_month: Option<u32>,
}

impl DateFilter {
    /// Returns `true` when no bound was given at all.
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.start_year.is_none()
            && self.end_year.is_none()
            && self.start_month.is_none()
            && self.end_month.is_none()
    }

    /// Fills in missing bounds and validates the result.
    ///
    /// A missing start year falls back to `earliest_year` and a missing end
    /// year to `current_year`, widened if needed so that a single given
    /// bound never produces an inverted range. Missing months fall back to
    /// January and December.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFilterError`] if a month lies outside 1-12 or if a
    /// start bound is after its end bound.
    pub fn resolve(
        &self,
        earliest_year: i32,
        current_year: i32,
    ) -> Result<EffectiveRange, InvalidFilterError> {
        for (flag, month) in [
            ("--start-month", self.start_month),
            ("--end-month", self.end_month),
        ] {
            if let Some(value) = month
                && !(1..=12).contains(&value)
            {
                return Err(InvalidFilterError::MonthOutOfRange { flag, value });
            }
        }

        let start_year = self
            .start_year
            .unwrap_or_else(|| self.end_year.map_or(earliest_year, |e| e.min(earliest_year)));
        let end_year = self
            .end_year
            .unwrap_or_else(|| self.start_year.map_or(current_year, |s| s.max(current_year)));
        if start_year > end_year {
            return Err(InvalidFilterError::YearsReversed {
                start: start_year,
                end: end_year,
            });
        }

        let start_month = self.start_month.unwrap_or(1);
        let end_month = self.end_month.unwrap_or(12);
        if start_month > end_month {
            return Err(InvalidFilterError::MonthsReversed {
                start: start_month,
                end: end_month,
            });
        }

        Ok(EffectiveRange {
            start_year,
            end_year,
            start_month,
            end_month,
            filtered: !self.is_unfiltered(),
            month_bounded: self.start_month.is_some() || self.end_month.is_some(),
        })
    }
}

/// A fully resolved date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRange {
    /// First year included.
    pub start_year: i32,
    /// Last year included.
    pub end_year: i32,
    /// First month included.
    pub start_month: u32,
    /// Last month included.
    pub end_month: u32,
    /// Whether any bound came from the user.
    pub filtered: bool,
    /// Whether a month bound came from the user.
    pub month_bounded: bool,
}

impl EffectiveRange {
    /// Years whose index must be queried.
    #[must_use]
    pub const fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Returns `true` if a report for `year`/`month` is selected.
    ///
    /// A report whose month is unknown is only selected when the user gave
    /// no month bound.
    #[must_use]
    pub fn contains(&self, year: i32, month: Option<u32>) -> bool {
        if !self.years().contains(&year) {
            return false;
        }
        month.map_or(!self.month_bounded, |m| {
            (self.start_month..=self.end_month).contains(&m)
        })
    }

    /// Returns `true` if `document` is selected.
    #[must_use]
    pub fn selects(&self, document: &DocumentRef) -> bool {
        self.contains(document.year, document.month)
    }

    /// Name of the combined CSV for this range.
    #[must_use]
    pub fn combined_file_name(&self) -> String {
        if self.filtered {
            format!(
                "combined_biweekly_reports_{}-{:02}_to_{}-{:02}.csv",
                self.start_year, self.start_month, self.end_year, self.end_month
            )
        } else {
            "combined_biweekly_reports_all.csv".to_string()
        }
    }
}

/// Error returned when a [`DateFilter`] cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidFilterError {
    /// A month flag was not in 1-12.
    MonthOutOfRange {
        /// The offending flag.
        flag: &'static str,
        /// The value that was given.
        value: u32,
    },
    /// The start year is after the end year.
    YearsReversed {
        /// Effective start year.
        start: i32,
        /// Effective end year.
        end: i32,
    },
    /// The start month is after the end month.
    MonthsReversed {
        /// Effective start month.
        start: u32,
        /// Effective end month.
        end: u32,
    },
}

impl std::fmt::Display for InvalidFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MonthOutOfRange { flag, value } => {
                write!(f, "invalid {flag} {value}: expected 1-12")
            }
            Self::YearsReversed { start, end } => {
                write!(f, "start year {start} is after end year {end}")
            }
            Self::MonthsReversed { start, end } => {
                write!(f, "start month {start} is after end month {end}")
            }
        }
    }
}

impl std::error::Error for InvalidFilterError {}
