//! Workbook loading and row parsing.
//!
//! [`Dataset::load`] reads an `.xlsx` export, renames the raw headers to
//! their canonical working names and turns each row into an [`Incident`].
//! Rows without a usable year are dropped and counted rather than failing
//! the whole load.

pub mod columns;
pub mod xlsx;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::DatasetError;
use crate::models::{Incident, UNKNOWN_GROUP};
use columns::ColumnIndex;

pub use xlsx::Cell;

/// Outcome of parsing one worksheet into incidents.
#[derive(Debug)]
pub struct ParsedTable {
    pub incidents: Vec<Incident>,
    pub columns: Vec<&'static str>,
    pub skipped_rows: usize,
}

/// The loaded dataset plus enough provenance for the overview report.
#[derive(Debug)]
pub struct Dataset {
    pub incidents: Vec<Incident>,
    pub columns: Vec<&'static str>,
    pub source: PathBuf,
    pub skipped_rows: usize,
}

impl Dataset {
    /// Loads the workbook at `path` and parses its first worksheet.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let rows = xlsx::read_first_sheet(path)?;
        let table = parse_table(&rows)?;

        if table.skipped_rows > 0 {
            warn!(
                skipped = table.skipped_rows,
                "dropped rows without a usable year"
            );
        }
        info!(
            rows = table.incidents.len(),
            columns = table.columns.len(),
            source = %path.display(),
            "dataset parsed"
        );

        Ok(Self {
            incidents: table.incidents,
            columns: table.columns,
            source: path.to_path_buf(),
            skipped_rows: table.skipped_rows,
        })
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Row and column counts, in that order.
    pub fn shape(&self) -> (usize, usize) {
        (self.incidents.len(), self.columns.len())
    }

    pub fn in_country<'a>(&'a self, country: &str) -> Vec<&'a Incident> {
        self.incidents
            .iter()
            .filter(|incident| incident.country.as_deref() == Some(country))
            .collect()
    }

    pub fn in_region<'a>(&'a self, region: &str) -> Vec<&'a Incident> {
        self.incidents
            .iter()
            .filter(|incident| incident.region.as_deref() == Some(region))
            .collect()
    }

    /// Incidents attributed to a named perpetrator group.
    pub fn with_known_group(&self) -> Vec<&Incident> {
        self.incidents
            .iter()
            .filter(|incident| incident.has_known_group())
            .collect()
    }

    /// Distinct country names, sorted alphabetically.
    pub fn unique_countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = self
            .incidents
            .iter()
            .filter_map(|incident| incident.country.clone())
            .collect();
        countries.sort();
        countries.dedup();
        countries
    }
}

/// Parses raw worksheet rows into incidents. The first row is the header.
pub fn parse_table(rows: &[Vec<Cell>]) -> Result<ParsedTable, DatasetError> {
    let (header, data_rows) = rows.split_first().ok_or(DatasetError::Empty)?;

    let headers: Vec<String> = header.iter().map(header_text).collect();
    let index = ColumnIndex::resolve(&headers)?;

    let mut incidents = Vec::with_capacity(data_rows.len());
    let mut skipped_rows = 0usize;
    for row in data_rows {
        match parse_row(&index, row) {
            Some(incident) => incidents.push(incident),
            None => skipped_rows += 1,
        }
    }

    if incidents.is_empty() {
        return Err(DatasetError::Empty);
    }

    Ok(ParsedTable {
        incidents,
        columns: index.canonical_columns(),
        skipped_rows,
    })
}

fn parse_row(index: &ColumnIndex, row: &[Cell]) -> Option<Incident> {
    let year = numeric_value(row.get(index.year))? as i32;

    Some(Incident {
        year,
        month: month_or_day(row, index.month),
        day: month_or_day(row, index.day),
        country: text_value(row.get(index.country)),
        state: text_value(cell_at(row, index.state)),
        region: text_value(row.get(index.region)),
        city: text_value(cell_at(row, index.city)),
        attack_type: text_value(cell_at(row, index.attack_type)),
        target: text_value(cell_at(row, index.target)),
        target_type: text_value(cell_at(row, index.target_type)),
        group: text_value(cell_at(row, index.group))
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string()),
        weapon_type: text_value(cell_at(row, index.weapon_type)),
        killed: numeric_value(cell_at(row, index.killed)),
        wounded: numeric_value(cell_at(row, index.wounded)),
        success: success_value(cell_at(row, index.success)),
        summary: text_value(cell_at(row, index.summary)),
        motive: text_value(cell_at(row, index.motive)),
    })
}

fn cell_at(row: &[Cell], index: Option<usize>) -> Option<&Cell> {
    index.and_then(|position| row.get(position))
}

fn month_or_day(row: &[Cell], index: Option<usize>) -> u32 {
    numeric_value(cell_at(row, index))
        .map(|value| value.max(0.0) as u32)
        .unwrap_or(0)
}

fn header_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => text.trim().to_string(),
        Cell::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

/// Trimmed, non-empty text. Numeric cells keep their printed form so
/// numeric city names survive the conversion.
fn text_value(cell: Option<&Cell>) -> Option<String> {
    match cell? {
        Cell::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Cell::Number(number) => {
            if number.fract() == 0.0 {
                Some(format!("{}", *number as i64))
            } else {
                Some(number.to_string())
            }
        }
        _ => None,
    }
}

/// Numeric coercion. Text that fails to parse counts as absent, matching
/// how the casualty columns are cleaned before aggregation.
fn numeric_value(cell: Option<&Cell>) -> Option<f64> {
    match cell? {
        Cell::Number(number) => Some(*number),
        Cell::Text(text) => text.trim().parse().ok(),
        Cell::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Cell::Empty => None,
    }
}

fn success_value(cell: Option<&Cell>) -> Option<bool> {
    match cell? {
        Cell::Bool(flag) => Some(*flag),
        Cell::Number(number) if *number == 1.0 => Some(true),
        Cell::Number(number) if *number == 0.0 => Some(false),
        Cell::Number(_) => None,
        Cell::Text(text) => match text.trim() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        },
        Cell::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn number(value: f64) -> Cell {
        Cell::Number(value)
    }

    fn make_sheet() -> Vec<Vec<Cell>> {
        vec![
            vec![
                text("iyear"),
                text("imonth"),
                text("iday"),
                text("country_txt"),
                text("region_txt"),
                text("city"),
                text("gname"),
                text("nkill"),
                text("nwound"),
                text("success"),
            ],
            vec![
                number(2011.0),
                number(7.0),
                number(5.0),
                text("Kazakhstan"),
                text("Central Asia"),
                text("Aktobe"),
                text("Unknown"),
                number(2.0),
                number(0.0),
                number(1.0),
            ],
            vec![
                number(2016.0),
                number(6.0),
                number(0.0),
                text("Kazakhstan"),
                text("Central Asia"),
                text("Almaty"),
                text("Jund al-Khilafah"),
                text("4"),
                Cell::Empty,
                number(1.0),
            ],
            vec![
                number(2014.0),
                number(1.0),
                number(12.0),
                text("Iraq"),
                text("Middle East & North Africa"),
                text("Baghdad"),
                text("ISIL"),
                number(18.0),
                number(30.0),
                number(0.0),
            ],
        ]
    }

    #[test]
    fn test_parse_table_counts_and_columns() {
        let table = parse_table(&make_sheet()).unwrap();
        assert_eq!(table.incidents.len(), 3);
        assert_eq!(table.skipped_rows, 0);
        assert_eq!(
            table.columns,
            vec![
                "Year", "Month", "Day", "Country", "Region", "City", "Group", "Killed",
                "Wounded", "Success"
            ]
        );
    }

    #[test]
    fn test_rows_without_year_are_skipped() {
        let mut sheet = make_sheet();
        sheet.push(vec![
            Cell::Empty,
            number(3.0),
            number(1.0),
            text("Iraq"),
            text("Middle East & North Africa"),
            text("Mosul"),
            text("ISIL"),
            number(1.0),
            number(0.0),
            number(1.0),
        ]);
        let table = parse_table(&sheet).unwrap();
        assert_eq!(table.incidents.len(), 3);
        assert_eq!(table.skipped_rows, 1);
    }

    #[test]
    fn test_numeric_text_is_coerced() {
        let table = parse_table(&make_sheet()).unwrap();
        let almaty = &table.incidents[1];
        assert_eq!(almaty.killed, Some(4.0));
        assert_eq!(almaty.wounded, None);
        assert_eq!(almaty.casualties(), 4.0);
    }

    #[test]
    fn test_success_flag_parsing() {
        let table = parse_table(&make_sheet()).unwrap();
        assert_eq!(table.incidents[0].success, Some(true));
        assert_eq!(table.incidents[2].success, Some(false));
    }

    #[test]
    fn test_short_rows_leave_fields_absent() {
        let sheet = vec![
            vec![text("iyear"), text("country_txt"), text("region_txt"), text("gname")],
            vec![number(1999.0), text("Tajikistan"), text("Central Asia")],
        ];
        let table = parse_table(&sheet).unwrap();
        let incident = &table.incidents[0];
        assert_eq!(incident.group, UNKNOWN_GROUP);
        assert_eq!(incident.month, 0);
        assert!(incident.killed.is_none());
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let sheet = vec![make_sheet().remove(0)];
        assert!(matches!(parse_table(&sheet), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        let sheet = vec![
            vec![text("iyear"), text("country_txt")],
            vec![number(2001.0), text("United States")],
        ];
        assert!(matches!(
            parse_table(&sheet),
            Err(DatasetError::MissingColumn("region_txt"))
        ));
    }

    #[test]
    fn test_dataset_views() {
        let table = parse_table(&make_sheet()).unwrap();
        let dataset = Dataset {
            incidents: table.incidents,
            columns: table.columns,
            source: PathBuf::from("gtd-mini.xlsx"),
            skipped_rows: 0,
        };

        assert_eq!(dataset.shape(), (3, 10));
        assert_eq!(dataset.in_country("Kazakhstan").len(), 2);
        assert_eq!(dataset.in_region("Central Asia").len(), 2);
        assert_eq!(dataset.with_known_group().len(), 2);
        assert_eq!(
            dataset.unique_countries(),
            vec!["Iraq".to_string(), "Kazakhstan".to_string()]
        );
    }
}
