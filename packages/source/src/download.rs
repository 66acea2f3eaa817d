//! PDF download helpers.
//!
//! Reports are downloaded once; a file already in the download directory is
//! reused as-is. Downloads stream into a `.part` file that is renamed only
//! after the last chunk is flushed, so an interrupted run never leaves a
//! truncated PDF behind under its final name.

use std::path::{Path, PathBuf};

use futures::StreamExt as _;
use planning_cases_source_models::DocumentRef;
use tokio::io::AsyncWriteExt as _;

use crate::SourceError;

/// What [`ensure_local`] did for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The PDF was already on disk.
    AlreadyPresent(PathBuf),
    /// The PDF was downloaded.
    Downloaded {
        /// Where it was written.
        path: PathBuf,
        /// Number of bytes written.
        bytes: u64,
    },
    /// The server answered with something other than a PDF; nothing was
    /// written.
    NotPdf {
        /// The `Content-Type` the server sent.
        content_type: String,
    },
}

impl DownloadOutcome {
    /// Path of the local PDF, if there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::AlreadyPresent(path) | Self::Downloaded { path, .. } => Some(path),
            Self::NotPdf { .. } => None,
        }
    }
}

/// Makes sure `document` has a local copy in `dir`, downloading it if
/// needed.
///
/// # Errors
///
/// Returns [`SourceError`] if the document is missing and cannot be
/// downloaded (no URL, HTTP failure, non-success status, or a write error).
pub async fn ensure_local(
    client: &reqwest::Client,
    document: &DocumentRef,
    dir: &Path,
) -> Result<DownloadOutcome, SourceError> {
    let dest = document.local_path(dir);

    if tokio::fs::try_exists(&dest)
        .await
        .map_err(|e| SourceError::io(&dest, e))?
    {
        log::debug!("{} already downloaded", dest.display());
        return Ok(DownloadOutcome::AlreadyPresent(dest));
    }

    let Some(url) = document.url.as_deref() else {
        return Err(SourceError::NotAvailable {
            file_name: document.file_name.clone(),
        });
    };

    download_pdf(client, url, &dest).await
}

/// Downloads the PDF at `url` to `dest`.
///
/// Uses streaming to avoid loading the entire file into memory.
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the response is not
/// successful, or the local file cannot be written.
pub async fn download_pdf(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<DownloadOutcome, SourceError> {
    log::info!("Downloading {url}");

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.to_ascii_lowercase().contains("application/pdf") {
        log::info!("Skipping {url} - not a PDF (content-type: {content_type})");
        return Ok(DownloadOutcome::NotPdf { content_type });
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SourceError::io(parent, e))?;
    }

    let part = part_path(dest);
    let result = stream_to_file(response, &part).await;
    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            tokio::fs::remove_file(&part).await.ok();
            return Err(e);
        }
    };

    tokio::fs::rename(&part, dest)
        .await
        .map_err(|e| SourceError::io(dest, e))?;

    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    log::info!("Saved {} ({kb:.1} KB)", dest.display());

    Ok(DownloadOutcome::Downloaded {
        path: dest.to_path_buf(),
        bytes,
    })
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64, SourceError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| SourceError::io(path, e))?;

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| SourceError::io(path, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| SourceError::io(path, e))?;

    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
