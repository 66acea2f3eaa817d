#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report index client and PDF downloader.
//!
//! A [`ReportIndex`] lists the reports published for a year, either by
//! querying the planning department's JSON index ([`index::HttpIndex`]) or
//! by scanning PDFs already on disk ([`local::LocalIndex`]).
//! [`index::collect_documents`] merges the per-year listings into the
//! ordered set of [`DocumentRef`]s selected by an
//! [`EffectiveRange`](planning_cases_source_models::EffectiveRange), and
//! [`download::ensure_local`] makes sure each one has a local copy.

pub mod download;
pub mod index;
pub mod local;
pub mod parsing;
pub mod progress;
pub mod registry;
pub mod source_def;

#[cfg(test)]
mod test_http;

use std::time::Duration;

use planning_cases_source_models::DocumentRef;

use crate::source_def::SourceDefinition;

/// Errors that can occur while listing or downloading reports.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A document has no local copy and no URL to fetch it from.
    #[error("{file_name} is not on disk and has no download URL")]
    NotAvailable {
        /// File name of the document.
        file_name: String,
    },

    /// The source definition is invalid.
    #[error("Invalid source definition: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl SourceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Something that can list the reports published for a given year.
pub trait ReportIndex: Send + Sync {
    /// Returns the documents published in `year`, in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the listing cannot be retrieved.
    fn documents(
        &self,
        year: i32,
    ) -> impl std::future::Future<Output = Result<Vec<DocumentRef>, SourceError>> + Send;

    /// Short description of the listing for log messages.
    fn describe(&self) -> String;
}

/// Builds the HTTP client shared by the index and the downloader.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be constructed.
pub fn build_client(definition: &SourceDefinition) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(&definition.user_agent)
        .timeout(Duration::from_secs(definition.request_timeout_secs))
        .build()
        .map_err(SourceError::Http)
}
