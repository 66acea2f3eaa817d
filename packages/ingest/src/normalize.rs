//! Normalizes reconstructed table rows into [`PermitRecord`] values.
//!
//! Text fields are whitespace-collapsed, the filing date is rewritten as
//! `YYYY-MM-DD` when it parses, and the ADU flag is derived from the
//! project description. A malformed field is passed through; only a row
//! without a case number is rejected.

use std::sync::LazyLock;

use planning_cases_pdf::report::RawRow;
use planning_cases_pdf::text_table::clean_text;
use planning_cases_permit_models::{Column, PermitRecord};
use planning_cases_source::parsing::parse_report_date;
use regex::Regex;

static ADU_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\badu\b").unwrap_or_else(|_| unreachable!()));

/// Why a row could not become a [`PermitRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The row has no case number, so it cannot be identified.
    #[error("row on page {page} (district {district}) has no case number")]
    MissingCaseNumber {
        /// Page the row starts on.
        page: usize,
        /// District section of the row.
        district: String,
    },
}

/// Normalizes one raw row from the report labelled `report_label`.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingCaseNumber`] if the case number cell
/// is missing or blank.
pub fn normalize_row(row: &RawRow, report_label: &str) -> Result<PermitRecord, NormalizeError> {
    let case_number = normalize_case_number(row.get(Column::CaseNumber));
    if case_number.is_empty() {
        return Err(NormalizeError::MissingCaseNumber {
            page: row.page,
            district: row.district.clone(),
        });
    }

    let project_description = clean_text(row.get(Column::ProjectDescription));

    Ok(PermitRecord {
        council_district: clean_text(&row.district),
        filing_date: normalize_date(row.get(Column::FilingDate)),
        case_number,
        address: clean_text(row.get(Column::Address)),
        cnc: clean_text(row.get(Column::Cnc)),
        community_plan_area: clean_text(row.get(Column::CommunityPlanArea)),
        is_adu: is_adu(&project_description),
        project_description,
        request_type: clean_text(row.get(Column::RequestType)),
        applicant_contact: clean_text(row.get(Column::ApplicantContact)),
        report_date: report_label.to_string(),
    })
}

/// Removes all whitespace from a case number and uppercases it.
#[must_use]
pub fn normalize_case_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Rewrites a parseable date as `YYYY-MM-DD`; anything else is returned
/// whitespace-collapsed but otherwise untouched.
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    let cleaned = clean_text(raw);
    parse_report_date(&cleaned).map_or(cleaned, |date| date.format("%Y-%m-%d").to_string())
}

/// Returns `true` if `description` mentions "ADU" as a whole word.
#[must_use]
pub fn is_adu(description: &str) -> bool {
    ADU_WORD.is_match(description)
}
