//! Typed errors for dataset loading.
//!
//! Pipeline code propagates failures with anyhow; this module covers the
//! dataset seam, where callers need to tell a schema problem apart from a
//! missing file or a corrupt workbook.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening and parsing the incident spreadsheet.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset file does not exist on disk.
    #[error("dataset file not found: {0}")]
    NotFound(PathBuf),

    /// The file extension is not one the reader handles.
    #[error("unsupported dataset format '{0}' (expected an .xlsx or .xlsm workbook)")]
    UnsupportedFormat(PathBuf),

    /// The workbook contains no worksheets at all.
    #[error("workbook has no worksheets: {0}")]
    NoWorksheet(PathBuf),

    /// A column the loader cannot work without is absent from the header row.
    #[error("required column '{0}' missing from header row")]
    MissingColumn(&'static str),

    /// The sheet has a header row but nothing underneath it.
    #[error("dataset contains no data rows")]
    Empty,

    /// Underlying spreadsheet reader failure.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatasetError::MissingColumn("iyear");
        assert_eq!(
            err.to_string(),
            "required column 'iyear' missing from header row"
        );

        let err = DatasetError::NotFound(PathBuf::from("gtd.xlsx"));
        assert_eq!(err.to_string(), "dataset file not found: gtd.xlsx");
    }

    #[test]
    fn test_empty_display() {
        assert_eq!(
            DatasetError::Empty.to_string(),
            "dataset contains no data rows"
        );
    }
}
