#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case report PDF reading.
//!
//! The biweekly case reports are laid out as one table per council
//! district. This crate reads every word of a report together with its
//! position ([`pdfplumber`]) and rebuilds the table rows from where the
//! words sit under the header ([`report::parse_pages`]).
//!
//! Extraction sits behind the [`TextExtractor`] trait so the pipeline can
//! be exercised against fixtures.

pub mod header;
pub mod report;
pub mod text_table;

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use report::ExtractedReport;
use text_table::{PageLayout, PlacedWord};

/// Errors specific to PDF reading.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The PDF file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The extraction library panicked on a malformed document.
    #[error("PDF extraction panicked on {path} (malformed document)")]
    Panicked {
        /// File being read.
        path: PathBuf,
    },
}

/// Produces the positioned words of every page of a document.
pub trait TextExtractor: Send + Sync {
    /// Extracts the words of every page of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or is not a
    /// readable PDF.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageLayout>, PdfError>;
}

/// [`TextExtractor`] backed by [`pdfplumber`] word extraction.
///
/// The parser is exercised on arbitrary downloads, so every call runs
/// inside [`std::panic::catch_unwind`] and a panic becomes
/// [`PdfError::Panicked`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageLayout>, PdfError> {
        let data = std::fs::read(path).map_err(|source| PdfError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let result = panic::catch_unwind(AssertUnwindSafe(|| read_layout(&data)));

        match result {
            Ok(Ok(pages)) => {
                log::debug!("Extracted {} page(s) from {}", pages.len(), path.display());
                Ok(pages)
            }
            Ok(Err(e)) => Err(PdfError::Extraction(format!(
                "failed to extract text from {}: {e}",
                path.display()
            ))),
            Err(_) => Err(PdfError::Panicked {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn read_layout(data: &[u8]) -> Result<Vec<PageLayout>, String> {
    let pdf = pdfplumber::Pdf::open(data, None).map_err(|e| e.to_string())?;
    let options = pdfplumber::WordOptions::default();

    pdf.pages_iter()
        .map(|page| {
            let page = page.map_err(|e| e.to_string())?;
            let words = page
                .extract_words(&options)
                .into_iter()
                .map(|word| {
                    PlacedWord::new(
                        word.text,
                        word.bbox.x0,
                        word.bbox.top,
                        word.bbox.x1,
                        word.bbox.bottom,
                    )
                })
                .collect();
            Ok(PageLayout { words })
        })
        .collect()
}

/// Extracts `path` with `extractor` and rebuilds its table rows.
///
/// # Errors
///
/// Returns [`PdfError`] if text extraction fails.
pub fn extract_report(
    extractor: &impl TextExtractor,
    path: &Path,
) -> Result<ExtractedReport, PdfError> {
    let pages = extractor.extract_pages(path)?;
    let report = report::parse_pages(&pages);

    if report.has_no_table() {
        log::warn!("No case table found in {}", path.display());
    } else {
        log::debug!(
            "{}: {} row(s) across {} district section(s), {} line(s) ignored",
            path.display(),
            report.rows.len(),
            report.districts,
            report.ignored_lines
        );
    }

    Ok(report)
}
