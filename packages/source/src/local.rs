//! Offline index over the PDFs already present in the download directory.

use std::path::{Path, PathBuf};

use planning_cases_source_models::DocumentRef;

use crate::{ReportIndex, SourceError};

/// Index built by scanning a directory for `*.pdf` files whose names carry
/// a report date.
#[derive(Debug, Clone)]
pub struct LocalIndex {
    dir: PathBuf,
    documents: Vec<DocumentRef>,
}

impl LocalIndex {
    /// Scans `dir` once and keeps every PDF whose reporting period can be
    /// inferred from its file name.
    ///
    /// A missing directory yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the directory exists but cannot be read.
    pub async fn scan(dir: &Path) -> Result<Self, SourceError> {
        let mut documents = Vec::new();

        if !tokio::fs::try_exists(dir)
            .await
            .map_err(|e| SourceError::io(dir, e))?
        {
            log::warn!("{} does not exist; no local reports", dir.display());
            return Ok(Self {
                dir: dir.to_path_buf(),
                documents,
            });
        }

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| SourceError::io(dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SourceError::io(dir, e))?
        {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match crate::parsing::document_from_file_name(file_name) {
                Some(doc) => documents.push(doc),
                None => log::warn!("Cannot infer a report date from {file_name}; skipping"),
            }
        }

        documents.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        log::info!(
            "Found {} local report(s) in {}",
            documents.len(),
            dir.display()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            documents,
        })
    }
}

impl ReportIndex for LocalIndex {
    async fn documents(&self, year: i32) -> Result<Vec<DocumentRef>, SourceError> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.year == year)
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        format!("local reports in {}", self.dir.display())
    }
}
