#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Harvests the planning department's biweekly case reports into CSV.
//!
//! [`run`] drives one pass: list the reports selected by the date range,
//! make sure each PDF is on disk, rebuild its case table, normalize the
//! rows, write one CSV per report and finally the combined CSV. Documents
//! are handled one at a time; a document that cannot be fetched or read is
//! logged and counted, and the run moves on. Only output failures abort.

pub mod csv_output;
pub mod normalize;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use planning_cases_pdf::{PdfTextExtractor, TextExtractor, extract_report};
use planning_cases_permit_models::PermitRecord;
use planning_cases_source::download::{DownloadOutcome, ensure_local};
use planning_cases_source::index::{HttpIndex, collect_documents};
use planning_cases_source::local::LocalIndex;
use planning_cases_source::progress::ProgressCallback;
use planning_cases_source::source_def::SourceDefinition;
use planning_cases_source::{ReportIndex, SourceError, build_client};
use planning_cases_source_models::{DocumentRef, EffectiveRange, InvalidFilterError};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Source setup failed (bad definition, HTTP client, local scan).
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The date filter is invalid.
    #[error("Invalid date filter: {0}")]
    Filter(#[from] InvalidFilterError),

    /// A directory or file could not be created or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A CSV file could not be read or written.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path to the CSV file.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A per-document CSV does not carry the permit header.
    #[error("{path} does not have the permit CSV header")]
    HeaderMismatch {
        /// Path to the CSV file.
        path: String,
    },
}

/// Where the pipeline reads and writes files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding downloaded PDFs.
    pub pdf_dir: PathBuf,
    /// Directory receiving per-document CSVs and the combined CSV.
    pub csv_dir: PathBuf,
    /// List reports from `pdf_dir` instead of the online index.
    pub offline: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("pdfs"),
            csv_dir: PathBuf::from("csvs"),
            offline: false,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents selected by the date range.
    pub selected: usize,
    /// Listed documents outside the date range.
    pub excluded: usize,
    /// Years whose index could not be listed.
    pub failed_years: Vec<i32>,
    /// Listings dropped because another report already claimed the file
    /// name.
    pub name_conflicts: usize,
    /// PDFs downloaded during this run.
    pub downloaded: usize,
    /// PDFs that were already on disk.
    pub already_present: usize,
    /// Documents skipped because the server did not return a PDF.
    pub skipped_not_pdf: usize,
    /// Documents whose PDF could not be fetched.
    pub fetch_failures: usize,
    /// Documents whose PDF could not be read.
    pub parse_failures: usize,
    /// Readable documents that yielded no rows.
    pub empty_documents: usize,
    /// Rows written across all per-document CSVs.
    pub rows_written: u64,
    /// Rows dropped by the normalizer.
    pub rows_rejected: u64,
    /// Path of the combined CSV.
    pub combined_path: PathBuf,
    /// Rows in the combined CSV.
    pub combined_rows: u64,
}

impl RunSummary {
    /// Logs the summary at `info` level.
    pub fn log(&self) {
        log::info!(
            "Documents: {} selected ({} outside range), {} downloaded, {} already present, {} not PDF",
            self.selected,
            self.excluded,
            self.downloaded,
            self.already_present,
            self.skipped_not_pdf,
        );
        log::info!(
            "Failures: {} fetch, {} parse, {} empty document(s), {} index year(s), {} name conflict(s)",
            self.fetch_failures,
            self.parse_failures,
            self.empty_documents,
            self.failed_years.len(),
            self.name_conflicts,
        );
        log::info!(
            "Rows: {} written, {} rejected; combined {} row(s) into {}",
            self.rows_written,
            self.rows_rejected,
            self.combined_rows,
            self.combined_path.display(),
        );
    }
}

/// Runs the pipeline against the configured source, using the online index
/// or, with [`PipelineConfig::offline`], the PDFs already on disk.
///
/// # Errors
///
/// Returns [`IngestError`] if the HTTP client cannot be built, the local
/// directory cannot be scanned, or any output cannot be written.
pub async fn harvest(
    definition: &SourceDefinition,
    config: &PipelineConfig,
    range: &EffectiveRange,
    progress: Arc<dyn ProgressCallback>,
) -> Result<RunSummary, IngestError> {
    let client = build_client(definition)?;

    if config.offline {
        let index = LocalIndex::scan(&config.pdf_dir).await?;
        run(config, range, &index, &client, &PdfTextExtractor, progress).await
    } else {
        let index = HttpIndex::new(client.clone(), definition.clone());
        run(config, range, &index, &client, &PdfTextExtractor, progress).await
    }
}

/// Processes every document `index` lists within `range`.
///
/// # Errors
///
/// Returns [`IngestError`] if an output directory or CSV cannot be written.
/// Fetch and parse failures of individual documents are counted in the
/// returned [`RunSummary`] instead.
pub async fn run(
    config: &PipelineConfig,
    range: &EffectiveRange,
    index: &impl ReportIndex,
    client: &reqwest::Client,
    extractor: &impl TextExtractor,
    progress: Arc<dyn ProgressCallback>,
) -> Result<RunSummary, IngestError> {
    let start = Instant::now();

    for dir in [&config.pdf_dir, &config.csv_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| IngestError::Io {
                path: dir.display().to_string(),
                source,
            })?;
    }

    log::info!(
        "Collecting reports from {} for {}-{:02} to {}-{:02}",
        index.describe(),
        range.start_year,
        range.start_month,
        range.end_year,
        range.end_month,
    );
    let selection = collect_documents(index, range).await;

    let mut summary = RunSummary {
        selected: selection.documents.len(),
        excluded: selection.excluded,
        failed_years: selection.failed_years,
        name_conflicts: selection.name_conflicts,
        ..RunSummary::default()
    };
    log::info!("{} report(s) selected", summary.selected);

    progress.set_total(selection.documents.len() as u64);
    let mut produced = Vec::with_capacity(selection.documents.len());

    for document in &selection.documents {
        progress.set_message(document.label.clone());

        if let Some(csv_path) =
            process_document(config, client, extractor, document, &mut summary).await?
        {
            produced.push(csv_path);
        }

        progress.inc(1);
    }

    summary.combined_path = config.csv_dir.join(range.combined_file_name());
    summary.combined_rows = csv_output::combine_csvs(&produced, &summary.combined_path)?;

    progress.finish(format!(
        "{} report(s), {} row(s)",
        produced.len(),
        summary.combined_rows
    ));

    summary.log();
    log::info!("Run complete in {:.1}s", start.elapsed().as_secs_f64());

    Ok(summary)
}

/// Fetches, reads and writes one document. Returns the per-document CSV
/// path, or `None` if the document was skipped.
async fn process_document(
    config: &PipelineConfig,
    client: &reqwest::Client,
    extractor: &impl TextExtractor,
    document: &DocumentRef,
    summary: &mut RunSummary,
) -> Result<Option<PathBuf>, IngestError> {
    let pdf_path = match ensure_local(client, document, &config.pdf_dir).await {
        Ok(DownloadOutcome::AlreadyPresent(path)) => {
            summary.already_present += 1;
            path
        }
        Ok(DownloadOutcome::Downloaded { path, .. }) => {
            summary.downloaded += 1;
            path
        }
        Ok(DownloadOutcome::NotPdf { content_type }) => {
            log::warn!(
                "Skipping {}: server returned {content_type}",
                document.file_name
            );
            summary.skipped_not_pdf += 1;
            return Ok(None);
        }
        Err(e) => {
            log::error!("Failed to fetch {}: {e}", document.file_name);
            summary.fetch_failures += 1;
            return Ok(None);
        }
    };

    let records = read_records(extractor, &pdf_path, document, summary);

    let csv_path = document.csv_path(&config.csv_dir);
    let written = csv_output::write_document_csv(&csv_path, &records)?;
    summary.rows_written += written;

    log::info!(
        "{}: {written} row(s) -> {}",
        document.label,
        csv_path.display()
    );

    Ok(Some(csv_path))
}

fn read_records(
    extractor: &impl TextExtractor,
    pdf_path: &Path,
    document: &DocumentRef,
    summary: &mut RunSummary,
) -> Vec<PermitRecord> {
    let report = match extract_report(extractor, pdf_path) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Failed to read {}: {e}", pdf_path.display());
            summary.parse_failures += 1;
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(report.rows.len());
    for row in &report.rows {
        match normalize::normalize_row(row, &document.label) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("{}: skipping {e}", document.file_name);
                summary.rows_rejected += 1;
            }
        }
    }

    if records.is_empty() {
        log::warn!("{}: no case rows found", document.file_name);
        summary.empty_documents += 1;
    }

    records
}

#[cfg(test)]
mod tests {
    use planning_cases_pdf::PdfError;
    use planning_cases_pdf::text_table::{PageLayout, PlacedWord};
    use planning_cases_permit_models::Column;
    use planning_cases_source::progress::null_progress;
    use planning_cases_source_models::DateFilter;

    use super::*;

    const MARCH: &str = "biweekly_case_report_03_10_2023.pdf";
    const JULY: &str = "biweekly_case_report_07_14_2023.pdf";

    /// Reads fixture "PDFs" as monospace text: pages are separated by form
    /// feeds and every character occupies a 5pt by 14pt cell.
    struct TextFileExtractor;

    #[allow(clippy::cast_precision_loss)]
    fn layout(page: &str) -> PageLayout {
        let mut words = Vec::new();
        for (row, line) in page.lines().enumerate() {
            let top = row as f64 * 14.0;
            let mut column = 0usize;
            for word in line.split(' ') {
                let len = word.chars().count();
                if !word.is_empty() {
                    let x0 = column as f64 * 5.0;
                    words.push(PlacedWord::new(word, x0, top, x0 + len as f64 * 5.0, top + 10.0));
                }
                column += len + 1;
            }
        }
        PageLayout { words }
    }

    impl TextExtractor for TextFileExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageLayout>, PdfError> {
            let text = std::fs::read_to_string(path).map_err(|source| PdfError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if text.starts_with("%CORRUPT") {
                return Err(PdfError::Extraction("corrupt fixture".to_string()));
            }
            Ok(text.split('\x0c').map(layout).collect())
        }
    }

    /// Index returning a fixed document list.
    struct FixedIndex(Vec<DocumentRef>);

    impl ReportIndex for FixedIndex {
        async fn documents(&self, year: i32) -> Result<Vec<DocumentRef>, SourceError> {
            Ok(self.0.iter().filter(|d| d.year == year).cloned().collect())
        }

        fn describe(&self) -> String {
            "fixture index".to_string()
        }
    }

    struct Workspace {
        _dir: tempfile::TempDir,
        config: PipelineConfig,
    }

    fn workspace() -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            pdf_dir: dir.path().join("pdfs"),
            csv_dir: dir.path().join("csvs"),
            offline: true,
        };
        std::fs::create_dir_all(&config.pdf_dir).unwrap();
        Workspace { _dir: dir, config }
    }

    const WIDTHS: [usize; 8] = [14, 20, 16, 12, 22, 26, 16, 20];

    /// One table line with every cell padded to its column width.
    fn aligned(cells: [&str; 8]) -> String {
        cells
            .iter()
            .zip(WIDTHS)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn report_text(district: &str, rows: &[(&str, &str, &str)]) -> String {
        let mut lines = vec![
            "Department of City Planning".to_string(),
            format!("Council District -- {district}"),
            aligned([
                "Filing Date",
                "Case Number",
                "Address",
                "CNC",
                "Community Plan Area",
                "Project Description",
                "Request Type",
                "Applicant Contact",
            ]),
        ];
        for &(date, case, description) in rows {
            lines.push(aligned([
                date,
                case,
                "100 N Main St",
                "Westwood",
                "Westwood",
                description,
                "CUB",
                "Jane Doe",
            ]));
        }
        lines.join("\n")
    }

    fn write_pdf(config: &PipelineConfig, name: &str, contents: &str) {
        std::fs::write(config.pdf_dir.join(name), contents).unwrap();
    }

    fn range(filter: DateFilter) -> EffectiveRange {
        filter.resolve(2020, 2023).unwrap()
    }

    async fn run_offline(config: &PipelineConfig, range: &EffectiveRange) -> RunSummary {
        let index = LocalIndex::scan(&config.pdf_dir).await.unwrap();
        run(
            config,
            range,
            &index,
            &reqwest::Client::new(),
            &TextFileExtractor,
            null_progress(),
        )
        .await
        .unwrap()
    }

    fn case_numbers(path: &Path) -> Vec<String> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .deserialize::<PermitRecord>()
            .map(|r| r.unwrap().case_number)
            .collect()
    }

    #[tokio::test]
    async fn month_filter_selects_only_matching_reports() {
        let ws = workspace();
        write_pdf(
            &ws.config,
            MARCH,
            &report_text(
                "5",
                &[
                    ("03/01/2023", "ZA-2023-1001-CUB", "New restaurant"),
                    ("03/02/2023", "ADM-2023-1002-ADU", "Detached ADU"),
                ],
            ),
        );
        write_pdf(
            &ws.config,
            JULY,
            &report_text("5", &[("07/01/2023", "ZA-2023-2001-CUB", "Bar")]),
        );

        let range = range(DateFilter {
            start_month: Some(1),
            end_month: Some(6),
            ..DateFilter::default()
        });
        let summary = run_offline(&ws.config, &range).await;

        assert_eq!(summary.selected, 1);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.already_present, 1);
        assert_eq!(
            summary.combined_path,
            ws.config
                .csv_dir
                .join("combined_biweekly_reports_2020-01_to_2023-06.csv")
        );
        assert_eq!(
            case_numbers(&summary.combined_path),
            vec!["ZA-2023-1001-CUB", "ADM-2023-1002-ADU"]
        );
        assert!(!ws.config.csv_dir.join("biweekly_case_report_07_14_2023.csv").exists());

        let mut reader = csv::Reader::from_path(&summary.combined_path).unwrap();
        let records: Vec<PermitRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records[0].council_district, "5");
        assert_eq!(records[0].filing_date, "2023-03-01");
        assert_eq!(records[0].report_date, "03/10/2023");
        assert!(!records[0].is_adu);
        assert!(records[1].is_adu);
    }

    #[tokio::test]
    async fn empty_report_gets_header_only_csv_and_run_continues() {
        let ws = workspace();
        write_pdf(&ws.config, MARCH, "Memorandum\nNo cases this period.");
        write_pdf(
            &ws.config,
            JULY,
            &report_text("2", &[("07/01/2023", "ZA-2023-2001-CUB", "Bar")]),
        );

        let summary = run_offline(&ws.config, &range(DateFilter::default())).await;

        assert_eq!(summary.selected, 2);
        assert_eq!(summary.empty_documents, 1);
        let empty_csv = ws.config.csv_dir.join("biweekly_case_report_03_10_2023.csv");
        assert_eq!(
            std::fs::read_to_string(empty_csv).unwrap(),
            format!("{}\n", Column::header_row().join(","))
        );
        assert_eq!(
            summary.combined_path,
            ws.config.csv_dir.join("combined_biweekly_reports_all.csv")
        );
        assert_eq!(case_numbers(&summary.combined_path), vec!["ZA-2023-2001-CUB"]);
    }

    #[tokio::test]
    async fn unreadable_pdf_counts_as_parse_failure() {
        let ws = workspace();
        write_pdf(&ws.config, MARCH, "%CORRUPT");
        write_pdf(
            &ws.config,
            JULY,
            &report_text("2", &[("07/01/2023", "ZA-2023-2001-CUB", "Bar")]),
        );

        let summary = run_offline(&ws.config, &range(DateFilter::default())).await;

        assert_eq!(summary.parse_failures, 1);
        assert_eq!(summary.empty_documents, 0);
        assert_eq!(summary.combined_rows, 1);
        assert!(ws.config.csv_dir.join("biweekly_case_report_03_10_2023.csv").exists());
    }

    #[tokio::test]
    async fn combined_rows_equal_sum_of_document_rows() {
        let ws = workspace();
        write_pdf(
            &ws.config,
            MARCH,
            &[
                report_text("1", &[("03/01/2023", "ZA-1", "A")]),
                report_text("4", &[("03/02/2023", "ZA-2", "B"), ("03/03/2023", "ZA-3", "C")]),
            ]
            .join("\x0c"),
        );
        write_pdf(
            &ws.config,
            JULY,
            &report_text("2", &[("07/01/2023", "ZA-4", "D")]),
        );

        let summary = run_offline(&ws.config, &range(DateFilter::default())).await;

        assert_eq!(summary.rows_written, 4);
        assert_eq!(summary.combined_rows, summary.rows_written);
        assert_eq!(
            case_numbers(&summary.combined_path),
            vec!["ZA-1", "ZA-2", "ZA-3", "ZA-4"]
        );
    }

    #[tokio::test]
    async fn rerun_produces_identical_combined_output() {
        let ws = workspace();
        write_pdf(
            &ws.config,
            MARCH,
            &report_text("5", &[("03/01/2023", "ZA-1", "Detached ADU, two-story")]),
        );
        let range = range(DateFilter {
            start_year: Some(2023),
            ..DateFilter::default()
        });

        let first = run_offline(&ws.config, &range).await;
        let first_bytes = std::fs::read(&first.combined_path).unwrap();
        let second = run_offline(&ws.config, &range).await;

        assert_eq!(first.combined_path, second.combined_path);
        assert_eq!(std::fs::read(&second.combined_path).unwrap(), first_bytes);
    }

    #[tokio::test]
    async fn rows_without_case_number_are_rejected() {
        let ws = workspace();
        let text = format!(
            "{}\n03/02/2023",
            report_text("5", &[("03/01/2023", "ZA-1", "Kept")])
        );
        write_pdf(&ws.config, MARCH, &text);

        let summary = run_offline(&ws.config, &range(DateFilter::default())).await;

        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.rows_rejected, 1);
    }

    #[tokio::test]
    async fn fetch_failure_does_not_stop_the_run() {
        let ws = workspace();
        write_pdf(
            &ws.config,
            JULY,
            &report_text("2", &[("07/01/2023", "ZA-2023-2001-CUB", "Bar")]),
        );

        let mut unreachable = planning_cases_source::parsing::document_from_file_name(MARCH).unwrap();
        unreachable.url = Some("http://127.0.0.1:9/report.pdf".to_string());
        let present = planning_cases_source::parsing::document_from_file_name(JULY).unwrap();
        let index = FixedIndex(vec![unreachable, present]);

        let summary = run(
            &ws.config,
            &range(DateFilter::default()),
            &index,
            &reqwest::Client::new(),
            &TextFileExtractor,
            null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.already_present, 1);
        assert_eq!(case_numbers(&summary.combined_path), vec!["ZA-2023-2001-CUB"]);
        assert!(!ws.config.pdf_dir.join(MARCH).exists());
    }
}
