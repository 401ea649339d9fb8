//! Thin adapter over the Excel reader.
//!
//! Converts worksheet cells into a small neutral [`Cell`] type so the table
//! parser never touches the spreadsheet backend directly.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use crate::error::DatasetError;

/// A single worksheet cell, reduced to the shapes the parser cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

/// Reads the first worksheet of the workbook at `path` into rows of cells.
///
/// The first returned row is the header row. Formula errors are surfaced as
/// empty cells, and serial date values keep their numeric form.
pub fn read_first_sheet(path: &Path) -> Result<Vec<Vec<Cell>>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    if !extension.eq_ignore_ascii_case("xlsx") && !extension.eq_ignore_ascii_case("xlsm") {
        return Err(DatasetError::UnsupportedFormat(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DatasetError::NoWorksheet(path.to_path_buf()))?;

    let range = workbook.worksheet_range(&sheet)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(convert).collect())
        .collect())
}

fn convert(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(number) => Cell::Number(*number),
        Data::Int(number) => Cell::Number(*number as f64),
        Data::Bool(flag) => Cell::Bool(*flag),
        Data::DateTime(stamp) => Cell::Number(stamp.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rejects_unsupported_extension() {
        let err = read_first_sheet(Path::new("Cargo.toml")).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_reported_before_format() {
        let path = PathBuf::from("no-such-dir/gtd.csv");
        let err = read_first_sheet(&path).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(_)));
    }

    #[test]
    fn test_convert_flattens_backend_variants() {
        assert_eq!(convert(&Data::Int(1998)), Cell::Number(1998.0));
        assert_eq!(convert(&Data::Float(2.5)), Cell::Number(2.5));
        assert_eq!(
            convert(&Data::String("Kazakhstan".into())),
            Cell::Text("Kazakhstan".into())
        );
        assert_eq!(convert(&Data::Empty), Cell::Empty);
        assert_eq!(convert(&Data::Bool(true)), Cell::Bool(true));
    }
}
