#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Permit record schema and CSV column definitions.
//!
//! Every bi-weekly case report, whatever its page layout, is reduced to
//! [`PermitRecord`] rows. The CSV column order is fixed by [`Column::ALL`]
//! and matches the field order of [`PermitRecord`] exactly, so records can
//! be serialized straight into a writer whose header was written from
//! [`Column::ALL`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// A column of the permit CSV schema.
///
/// The string form of each variant is the CSV header text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum Column {
    /// Council district the case was filed under.
    #[strum(serialize = "Council District")]
    CouncilDistrict,
    /// Date the application was filed.
    #[strum(serialize = "Filing Date")]
    FilingDate,
    /// Case (permit) number, e.g. `ZA-2023-1234-CUB`.
    #[strum(serialize = "Case Number")]
    CaseNumber,
    /// Site address.
    #[strum(serialize = "Address")]
    Address,
    /// Certified neighborhood council.
    #[strum(serialize = "CNC")]
    Cnc,
    /// Community plan area.
    #[strum(serialize = "Community Plan Area")]
    CommunityPlanArea,
    /// Free-text project description.
    #[strum(serialize = "Project Description")]
    ProjectDescription,
    /// Entitlement request type(s).
    #[strum(serialize = "Request Type")]
    RequestType,
    /// Applicant or representative contact.
    #[strum(serialize = "Applicant Contact")]
    ApplicantContact,
    /// Whether the project description mentions an ADU.
    #[strum(serialize = "Is ADU")]
    IsAdu,
    /// Label of the report the row came from.
    #[strum(serialize = "Report Date")]
    ReportDate,
}

impl Column {
    /// All columns in CSV order.
    pub const ALL: &[Self] = &[
        Self::CouncilDistrict,
        Self::FilingDate,
        Self::CaseNumber,
        Self::Address,
        Self::Cnc,
        Self::CommunityPlanArea,
        Self::ProjectDescription,
        Self::RequestType,
        Self::ApplicantContact,
        Self::IsAdu,
        Self::ReportDate,
    ];

    /// Columns that are read from the report table itself (everything
    /// except the derived ones).
    pub const EXTRACTED: &[Self] = &[
        Self::FilingDate,
        Self::CaseNumber,
        Self::Address,
        Self::Cnc,
        Self::CommunityPlanArea,
        Self::ProjectDescription,
        Self::RequestType,
        Self::ApplicantContact,
    ];

    /// Returns the CSV header row.
    #[must_use]
    pub fn header_row() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.header()).collect()
    }

    /// Returns the CSV header text for this column.
    #[must_use]
    pub fn header(self) -> &'static str {
        self.into()
    }
}

/// One normalized row of a case filing report.
///
/// Field order is the CSV column order; see [`Column::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitRecord {
    /// Council district number (e.g. `"5"`), or `"Unknown"`.
    #[serde(rename = "Council District")]
    pub council_district: String,
    /// Filing date as `YYYY-MM-DD`, or the raw text when it does not parse.
    #[serde(rename = "Filing Date")]
    pub filing_date: String,
    /// Case number with internal whitespace removed.
    #[serde(rename = "Case Number")]
    pub case_number: String,
    /// Site address.
    #[serde(rename = "Address")]
    pub address: String,
    /// Certified neighborhood council.
    #[serde(rename = "CNC")]
    pub cnc: String,
    /// Community plan area.
    #[serde(rename = "Community Plan Area")]
    pub community_plan_area: String,
    /// Project description.
    #[serde(rename = "Project Description")]
    pub project_description: String,
    /// Request type(s).
    #[serde(rename = "Request Type")]
    pub request_type: String,
    /// Applicant contact.
    #[serde(rename = "Applicant Contact")]
    pub applicant_contact: String,
    /// `true` when the project description mentions an ADU.
    #[serde(rename = "Is ADU")]
    pub is_adu: bool,
    /// Label of the source report (the index date of the PDF).
    #[serde(rename = "Report Date")]
    pub report_date: String,
}
