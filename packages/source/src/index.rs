//! Per-year report index client and document selection.
//!
//! The planning department exposes one JSON listing per calendar year.
//! [`HttpIndex`] turns each listing into [`DocumentRef`]s;
//! [`collect_documents`] queries every year of an [`EffectiveRange`],
//! keeps the documents it selects, and orders them deterministically.

use std::collections::BTreeMap;

use planning_cases_source_models::{DocumentRef, EffectiveRange, IndexResponse};

use crate::source_def::SourceDefinition;
use crate::{ReportIndex, SourceError};

/// Index backed by the agency's JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpIndex {
    client: reqwest::Client,
    definition: SourceDefinition,
}

impl HttpIndex {
    /// Creates an index client for `definition` using a shared `client`.
    #[must_use]
    pub const fn new(client: reqwest::Client, definition: SourceDefinition) -> Self {
        Self { client, definition }
    }
}

impl ReportIndex for HttpIndex {
    async fn documents(&self, year: i32) -> Result<Vec<DocumentRef>, SourceError> {
        let url = self.definition.index_url(year);
        log::info!("Querying index: {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let listing: IndexResponse = serde_json::from_str(&body)?;

        let total = listing.entries.len();
        let documents: Vec<DocumentRef> = listing
            .entries
            .iter()
            .filter_map(|entry| {
                let doc = crate::parsing::document_from_entry(
                    &self.definition.file_prefix,
                    entry,
                    year,
                );
                if doc.is_none() {
                    log::debug!("Ignoring index entry without a usable URL: {entry:?}");
                }
                doc
            })
            .collect();

        log::info!(
            "Found {} PDF link(s) for {year} ({} entries listed)",
            documents.len(),
            total
        );

        Ok(documents)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.definition.name, self.definition.base_url)
    }
}

/// Documents selected for a run, plus the years whose listing failed.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected documents in processing order.
    pub documents: Vec<DocumentRef>,
    /// Listed documents that fell outside the range.
    pub excluded: usize,
    /// Years whose index could not be retrieved.
    pub failed_years: Vec<i32>,
    /// Listings dropped because an earlier listing with a different URL
    /// maps to the same file name.
    pub name_conflicts: usize,
}

/// Queries `index` for every year in `range` and returns the selected
/// documents, de-duplicated by file name and ordered by report period.
///
/// The first listing of a file name wins. A later listing of the same name
/// with a different URL (two reports posted for the same date) is dropped
/// with a warning naming both URLs.
///
/// A failing year is logged and recorded in [`Selection::failed_years`];
/// the remaining years are still queried.
pub async fn collect_documents(
    index: &impl ReportIndex,
    range: &EffectiveRange,
) -> Selection {
    let mut selection = Selection::default();
    let mut seen: BTreeMap<String, Option<String>> = BTreeMap::new();

    for year in range.years() {
        let documents = match index.documents(year).await {
            Ok(documents) => documents,
            Err(e) => {
                log::error!("Failed to list reports for {year}: {e}");
                selection.failed_years.push(year);
                continue;
            }
        };

        for document in documents {
            if !range.selects(&document) {
                log::debug!(
                    "Skipping {} ({}-{:?}): outside the requested range",
                    document.file_name,
                    document.year,
                    document.month
                );
                selection.excluded += 1;
                continue;
            }
            if let Some(kept) = seen.get(&document.file_name) {
                if *kept == document.url {
                    log::debug!("Skipping duplicate listing of {}", document.file_name);
                } else {
                    log::warn!(
                        "Two reports map to {}: keeping {}, dropping {}",
                        document.file_name,
                        kept.as_deref().unwrap_or("<local>"),
                        document.url.as_deref().unwrap_or("<local>")
                    );
                    selection.name_conflicts += 1;
                }
                continue;
            }
            seen.insert(document.file_name.clone(), document.url.clone());
            selection.documents.push(document);
        }
    }

    selection
        .documents
        .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    selection
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use planning_cases_source_models::DateFilter;

    use super::*;
    use crate::test_http::{response, serve_once};

    /// In-memory index keyed by year; missing years fail.
    struct FixedIndex(BTreeMap<i32, Vec<DocumentRef>>);

    impl ReportIndex for FixedIndex {
        async fn documents(&self, year: i32) -> Result<Vec<DocumentRef>, SourceError> {
            self.0.get(&year).cloned().ok_or(SourceError::HttpStatus {
                url: format!("test://{year}"),
                status: 500,
            })
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn doc(name: &str, year: i32, month: u32) -> DocumentRef {
        DocumentRef {
            url: Some(format!("https://example.com/{name}")),
            file_name: name.to_string(),
            label: format!("{month:02}/01/{year}"),
            report_date: chrono::NaiveDate::from_ymd_opt(year, month, 1),
            year,
            month: Some(month),
        }
    }

    #[tokio::test]
    async fn selects_in_range_documents_in_period_order() {
        let index = FixedIndex(BTreeMap::from([
            (
                2023,
                vec![
                    doc("b.pdf", 2023, 7),
                    doc("a.pdf", 2023, 3),
                    doc("c.pdf", 2023, 5),
                ],
            ),
            (2024, vec![doc("d.pdf", 2024, 2)]),
        ]));
        let range = DateFilter {
            start_year: Some(2023),
            end_year: Some(2024),
            start_month: Some(1),
            end_month: Some(6),
        }
        .resolve(2020, 2024)
        .unwrap();

        let selection = collect_documents(&index, &range).await;

        let names: Vec<&str> = selection
            .documents
            .iter()
            .map(|d| d.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.pdf", "c.pdf", "d.pdf"]);
        assert_eq!(selection.excluded, 1);
        assert!(selection.failed_years.is_empty());
    }

    #[tokio::test]
    async fn failed_year_does_not_stop_other_years() {
        let index = FixedIndex(BTreeMap::from([(2022, vec![doc("x.pdf", 2022, 4)])]));
        let range = DateFilter::default().resolve(2021, 2022).unwrap();

        let selection = collect_documents(&index, &range).await;

        assert_eq!(selection.failed_years, vec![2021]);
        assert_eq!(selection.documents.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_listings_are_processed_once() {
        let index = FixedIndex(BTreeMap::from([(
            2023,
            vec![doc("a.pdf", 2023, 3), doc("a.pdf", 2023, 3)],
        )]));
        let range = DateFilter::default().resolve(2023, 2023).unwrap();

        let selection = collect_documents(&index, &range).await;

        assert_eq!(selection.documents.len(), 1);
    }

    #[tokio::test]
    async fn same_name_with_another_url_is_counted_as_a_conflict() {
        let mut repost = doc("a.pdf", 2023, 3);
        repost.url = Some("https://example.com/a-revised.pdf".to_string());
        let index = FixedIndex(BTreeMap::from([(
            2023,
            vec![doc("a.pdf", 2023, 3), repost, doc("a.pdf", 2023, 3)],
        )]));
        let range = DateFilter::default().resolve(2023, 2023).unwrap();

        let selection = collect_documents(&index, &range).await;

        assert_eq!(selection.documents.len(), 1);
        assert_eq!(
            selection.documents[0].url.as_deref(),
            Some("https://example.com/a.pdf")
        );
        assert_eq!(selection.name_conflicts, 1);
    }

    #[tokio::test]
    async fn parses_served_index_listing() {
        let body = br#"{"Entries":[
            {"url":"https://example.com/files/CD_03-10-2023.pdf","Date":"03/10/2023"},
            {"Date":"03/24/2023"},
            {"url":"https://example.com/files/CD_04-07-2023.pdf","Date":"04/07/2023"}
        ]}"#;
        let base = serve_once(response("200 OK", "application/json", body)).await;
        let definition = crate::registry::embedded_source()
            .unwrap()
            .with_base_url(&base);
        let index = HttpIndex::new(reqwest::Client::new(), definition);

        let documents = index.documents(2023).await.unwrap();

        let names: Vec<(&str, Option<u32>)> = documents
            .iter()
            .map(|d| (d.file_name.as_str(), d.month))
            .collect();
        assert_eq!(
            names,
            vec![
                ("biweekly_case_report_03_10_2023.pdf", Some(3)),
                ("biweekly_case_report_04_07_2023.pdf", Some(4)),
            ]
        );
        assert_eq!(
            documents[0].url.as_deref(),
            Some("https://example.com/files/CD_03-10-2023.pdf")
        );
    }

    #[tokio::test]
    async fn index_error_status_is_reported() {
        let base = serve_once(response("500 Internal Server Error", "text/plain", b"down")).await;
        let definition = crate::registry::embedded_source()
            .unwrap()
            .with_base_url(&base);
        let index = HttpIndex::new(reqwest::Client::new(), definition);

        let result = index.documents(2023).await;

        assert!(matches!(
            result,
            Err(SourceError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_index_reports_an_error() {
        let definition = crate::registry::embedded_source()
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let client = crate::build_client(&definition).unwrap();
        let index = HttpIndex::new(client, definition);

        assert!(index.documents(2023).await.is_err());
    }
}
