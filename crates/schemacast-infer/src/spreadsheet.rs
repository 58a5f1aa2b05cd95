//! Spreadsheet backend (XLSX, XLS) built on calamine
//!
//! Spreadsheets carry no declared column types, so classification is a tally
//! over cell values: the first row is the header, every following row votes.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use schemacast_core::{Column, ColumnType};

use crate::backend::{extension_lower, InferError, InferenceBackend};

/// Fallback backend for spreadsheet formats
pub struct SpreadsheetBackend;

impl SpreadsheetBackend {
    /// Infer columns from a workbook, optionally from a named sheet.
    /// Defaults to the first sheet.
    pub fn infer_sheet(path: &Path, sheet: Option<&str>) -> Result<Vec<Column>, InferError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| InferError::data_format(path, e))?;

        let sheet_name = match sheet {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| InferError::data_format(path, "workbook has no sheets"))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| InferError::data_format(path, e))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| InferError::data_format(path, format!("sheet '{sheet_name}' is empty")))?;

        let names: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => format!("column_{}", i + 1),
                other => other.to_string(),
            })
            .collect();

        let mut tallies = vec![CellTally::default(); names.len()];
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(tally) = tallies.get_mut(i) {
                    tally.add(cell);
                }
            }
        }

        Ok(names
            .into_iter()
            .zip(tallies)
            .map(|(name, tally)| Column::new(name, tally.classify()).with_description(""))
            .collect())
    }
}

impl InferenceBackend for SpreadsheetBackend {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(extension_lower(path).as_str(), "xlsx" | "xls")
    }

    fn infer(&self, path: &Path) -> Result<Vec<Column>, InferError> {
        Self::infer_sheet(path, None)
    }
}

/// Vote counts for one column's cells
#[derive(Debug, Clone, Copy, Default)]
struct CellTally {
    ints: usize,
    floats: usize,
    bools: usize,
    datetimes: usize,
    strings: usize,
}

impl CellTally {
    fn add(&mut self, cell: &Data) {
        match cell {
            Data::Int(_) => self.ints += 1,
            // Excel stores whole numbers as floats; count them as integers
            // so an all-whole column types as integer, like pandas does
            Data::Float(f) if f.fract() == 0.0 => self.ints += 1,
            Data::Float(_) => self.floats += 1,
            Data::Bool(_) => self.bools += 1,
            Data::DateTime(_) | Data::DateTimeIso(_) => self.datetimes += 1,
            Data::String(_) | Data::DurationIso(_) => self.strings += 1,
            Data::Empty | Data::Error(_) => {}
        }
    }

    fn classify(&self) -> ColumnType {
        let numeric = self.ints + self.floats;
        if self.strings > 0 {
            ColumnType::String
        } else if self.datetimes > 0 && numeric == 0 && self.bools == 0 {
            ColumnType::Datetime
        } else if self.bools > 0 && numeric == 0 && self.datetimes == 0 {
            ColumnType::Boolean
        } else if self.floats > 0 && self.bools == 0 && self.datetimes == 0 {
            ColumnType::Float
        } else if self.ints > 0 && self.bools == 0 && self.datetimes == 0 {
            ColumnType::Integer
        } else if numeric + self.bools + self.datetimes == 0 {
            ColumnType::Unknown
        } else {
            // Mixed value kinds in one column
            ColumnType::String
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tally(cells: &[Data]) -> ColumnType {
        let mut t = CellTally::default();
        for cell in cells {
            t.add(cell);
        }
        t.classify()
    }

    #[test]
    fn whole_floats_classify_as_integer() {
        assert_eq!(
            tally(&[Data::Float(1.0), Data::Float(2.0), Data::Float(3.0)]),
            ColumnType::Integer
        );
    }

    #[test]
    fn fractional_floats_classify_as_float() {
        assert_eq!(
            tally(&[Data::Float(1.0), Data::Float(2.5)]),
            ColumnType::Float
        );
    }

    #[test]
    fn strings_win_over_numbers() {
        assert_eq!(
            tally(&[Data::Int(1), Data::String("n/a".to_string())]),
            ColumnType::String
        );
    }

    #[test]
    fn bools_classify_as_boolean() {
        assert_eq!(tally(&[Data::Bool(true), Data::Bool(false)]), ColumnType::Boolean);
    }

    #[test]
    fn iso_datetimes_classify_as_datetime() {
        assert_eq!(
            tally(&[Data::DateTimeIso("2024-01-01T00:00:00".to_string())]),
            ColumnType::Datetime
        );
    }

    #[test]
    fn empty_column_is_unknown() {
        assert_eq!(tally(&[Data::Empty, Data::Empty]), ColumnType::Unknown);
        assert_eq!(tally(&[]), ColumnType::Unknown);
    }

    #[test]
    fn mixed_bool_and_number_is_string() {
        assert_eq!(tally(&[Data::Bool(true), Data::Int(1)]), ColumnType::String);
    }

    #[test]
    fn supports_spreadsheet_extensions_only() {
        assert!(SpreadsheetBackend.supports(Path::new("book.xlsx")));
        assert!(SpreadsheetBackend.supports(Path::new("book.XLS")));
        assert!(!SpreadsheetBackend.supports(Path::new("book.csv")));
    }
}
