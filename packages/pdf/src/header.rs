//! Header recognition and column mapping.
//!
//! Report templates have drifted over the years ("Case" vs "Case Number",
//! "Applicant" vs "Applicant Contact"), so header cells are matched against
//! a list of aliases: exact matches first, then the first alias contained in
//! the cell text.
//!
//! A recognised header also fixes where each column sits on the page. Data
//! words are assigned to the header column they fall under, so a blank cell
//! stays blank instead of shifting its neighbours.

use std::collections::BTreeMap;

use planning_cases_permit_models::Column;

use crate::text_table::{Segment, TextLine, clean_text, is_date_cell};

/// Header aliases in priority order.
const ALIASES: &[(&str, Column)] = &[
    ("filing date", Column::FilingDate),
    ("date filed", Column::FilingDate),
    ("case number", Column::CaseNumber),
    ("case", Column::CaseNumber),
    ("address", Column::Address),
    ("cnc", Column::Cnc),
    ("community plan area", Column::CommunityPlanArea),
    ("community plan", Column::CommunityPlanArea),
    ("project description", Column::ProjectDescription),
    ("description", Column::ProjectDescription),
    ("request type", Column::RequestType),
    ("request", Column::RequestType),
    ("applicant contact", Column::ApplicantContact),
    ("applicant", Column::ApplicantContact),
    ("contact", Column::ApplicantContact),
];

/// Minimum number of distinct columns a line must name to count as a header.
const MIN_HEADER_COLUMNS: usize = 2;

/// Maps a header cell to a standard column.
#[must_use]
pub fn map_column_name(header: &str) -> Option<Column> {
    let header = clean_text(header).to_lowercase();
    if header.is_empty() {
        return None;
    }

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == header)
        .or_else(|| ALIASES.iter().find(|(alias, _)| header.contains(alias)))
        .map(|(_, column)| *column)
}

/// One header cell and the horizontal band it owns.
#[derive(Debug, Clone, PartialEq)]
struct ColumnSpan {
    /// `None` for unrecognised or repeated header cells; words under them
    /// are dropped.
    column: Option<Column>,
    /// Left boundary of the band: halfway between this header cell and the
    /// previous one.
    left: f64,
}

/// Column bands learned from a header line.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    spans: Vec<ColumnSpan>,
}

impl ColumnMapping {
    /// Builds a mapping if `line` is a header line.
    ///
    /// A header names at least two distinct columns, at least half of its
    /// segments are recognised, and it contains no date-like segment (data
    /// rows whose description happens to mention "address" or "request" are
    /// therefore not mistaken for headers).
    #[must_use]
    pub fn from_header(line: &TextLine) -> Option<Self> {
        Self::from_segments(&line.segments())
    }

    fn from_segments(segments: &[Segment]) -> Option<Self> {
        if segments.is_empty() || segments.iter().any(|s| is_date_cell(&s.text)) {
            return None;
        }

        let mut spans: Vec<ColumnSpan> = Vec::with_capacity(segments.len());
        let mut recognised = 0;
        let mut previous_right = None;

        for segment in segments {
            let mut column = map_column_name(&segment.text);
            if column.is_some() {
                recognised += 1;
            }
            if column.is_some() && spans.iter().any(|s| s.column == column) {
                column = None;
            }

            let left = previous_right.map_or(f64::NEG_INFINITY, |right: f64| {
                f64::midpoint(right, segment.x0)
            });
            spans.push(ColumnSpan { column, left });
            previous_right = Some(segment.x1);
        }

        let mapped = spans.iter().filter(|s| s.column.is_some()).count();

        (mapped >= MIN_HEADER_COLUMNS && recognised * 2 >= segments.len())
            .then_some(Self { spans })
    }

    /// Standard columns the header names, left to right.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        self.spans.iter().filter_map(|s| s.column).collect()
    }

    /// Column whose band contains the horizontal position `x`.
    #[must_use]
    pub fn column_at(&self, x: f64) -> Option<Column> {
        self.spans
            .iter()
            .rev()
            .find(|s| s.left <= x)
            .and_then(|s| s.column)
    }

    /// Returns `true` if `values` (as produced by [`Self::assign`]) begin a
    /// new table row rather than continue the previous one.
    ///
    /// With a filing-date column the row must carry a date there. Without
    /// one, the case number column (or the leftmost column) must be filled.
    #[must_use]
    pub fn starts_record(&self, values: &BTreeMap<Column, String>) -> bool {
        let columns = self.columns();
        if columns.contains(&Column::FilingDate) {
            return values
                .get(&Column::FilingDate)
                .is_some_and(|date| is_date_cell(date));
        }

        let key = if columns.contains(&Column::CaseNumber) {
            Some(Column::CaseNumber)
        } else {
            columns.first().copied()
        };
        key.is_some_and(|key| values.contains_key(&key))
    }

    /// Assigns each word of `line` to the column whose band holds its left
    /// edge. Words of one column are joined with single spaces; columns with
    /// no words are absent.
    #[must_use]
    pub fn assign(&self, line: &TextLine) -> BTreeMap<Column, String> {
        let mut values: BTreeMap<Column, String> = BTreeMap::new();

        for word in &line.words {
            let Some(column) = self.column_at(word.x0) else {
                continue;
            };
            let value = values.entry(column).or_default();
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(&word.text);
        }

        values
    }
}
