//! Per-document CSV files and the combined CSV.
//!
//! Every CSV starts with the [`Column::header_row`] header, even when it
//! has no rows, and is always created fresh.

use std::path::{Path, PathBuf};

use planning_cases_permit_models::{Column, PermitRecord};

use crate::IngestError;

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> IngestError + '_ {
    move |source| IngestError::Csv {
        path: path.display().to_string(),
        source,
    }
}

fn create_writer(path: &Path) -> Result<csv::Writer<std::fs::File>, IngestError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error(path))?;
    writer
        .write_record(Column::header_row())
        .map_err(csv_error(path))?;
    Ok(writer)
}

fn finish(mut writer: csv::Writer<std::fs::File>, path: &Path) -> Result<(), IngestError> {
    writer.flush().map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Writes `records` to `path` with a header row. Returns the number of
/// rows written.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] or [`IngestError::Io`] if the file cannot
/// be written.
pub fn write_document_csv(path: &Path, records: &[PermitRecord]) -> Result<u64, IngestError> {
    let mut writer = create_writer(path)?;

    for record in records {
        writer.serialize(record).map_err(csv_error(path))?;
    }
    finish(writer, path)?;

    log::debug!("Wrote {} row(s) to {}", records.len(), path.display());

    Ok(records.len() as u64)
}

/// Concatenates the per-document CSVs in `inputs`, in the given order, into
/// `output` with a single header row. Returns the number of data rows
/// written.
///
/// # Errors
///
/// Returns [`IngestError::HeaderMismatch`] if an input's header is not the
/// permit schema, or a CSV/I/O error if any file cannot be read or written.
pub fn combine_csvs(inputs: &[PathBuf], output: &Path) -> Result<u64, IngestError> {
    let expected = Column::header_row();
    let mut writer = create_writer(output)?;
    let mut total = 0u64;

    for input in inputs {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(input)
            .map_err(csv_error(input))?;

        let header = reader.headers().map_err(csv_error(input))?;
        if !header.iter().eq(expected.iter().copied()) {
            return Err(IngestError::HeaderMismatch {
                path: input.display().to_string(),
            });
        }

        let mut rows = 0u64;
        for record in reader.records() {
            let record = record.map_err(csv_error(input))?;
            writer.write_record(&record).map_err(csv_error(output))?;
            rows += 1;
        }

        log::debug!("Combined {rows} row(s) from {}", input.display());
        total += rows;
    }

    finish(writer, output)?;

    Ok(total)
}
