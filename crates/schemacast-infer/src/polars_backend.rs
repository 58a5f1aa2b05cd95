//! Dataframe backend (CSV, Parquet) built on polars
//!
//! Dtype introspection does the heavy lifting: polars infers a typed schema
//! while reading and we fold its dtypes into the semantic `ColumnType` set.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use schemacast_core::{Column, ColumnType};

use crate::backend::{extension_lower, InferError, InferenceBackend};

/// Primary backend: CSV and Parquet via polars
pub struct PolarsBackend;

impl PolarsBackend {
    fn read(path: &Path) -> Result<DataFrame, InferError> {
        let err = |e: PolarsError| InferError::data_format(path, e);
        match extension_lower(path).as_str() {
            "csv" => LazyCsvReader::new(path)
                .with_infer_schema_length(Some(1000))
                .with_has_header(true)
                .with_try_parse_dates(true)
                .finish()
                .map_err(err)?
                .collect()
                .map_err(err),
            "parquet" => {
                let file =
                    File::open(path).map_err(|e| InferError::data_format(path, e))?;
                ParquetReader::new(file).finish().map_err(err)
            }
            other => Err(InferError::data_format(
                path,
                format!("unsupported extension '{other}'"),
            )),
        }
    }
}

impl InferenceBackend for PolarsBackend {
    fn name(&self) -> &'static str {
        "polars"
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(extension_lower(path).as_str(), "csv" | "parquet")
    }

    fn infer(&self, path: &Path) -> Result<Vec<Column>, InferError> {
        let df = Self::read(path)?;
        let schema = df.schema();
        Ok(schema
            .iter()
            .map(|(name, dtype)| {
                Column::new(name.to_string(), classify(dtype)).with_description("")
            })
            .collect())
    }
}

/// Fold a polars dtype into the semantic type set
fn classify(dtype: &DataType) -> ColumnType {
    if dtype.is_bool() {
        ColumnType::Boolean
    } else if dtype.is_integer() {
        ColumnType::Integer
    } else if dtype.is_float() {
        ColumnType::Float
    } else {
        match dtype {
            DataType::String => ColumnType::String,
            // Dictionary-encoded strings are still strings
            DataType::Categorical(_, _) | DataType::Enum(_, _) => ColumnType::String,
            DataType::Decimal(_, _) => ColumnType::Float,
            DataType::Date | DataType::Datetime(_, _) => ColumnType::Datetime,
            _ => ColumnType::Unknown,
        }
    }
}
