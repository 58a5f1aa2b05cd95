//! Inference backend selection
//!
//! Backends are tried as an explicit ordered list: the dataframe backend
//! first, the spreadsheet backend second. A file only fails once every
//! backend claiming its extension has failed.

use std::path::Path;

use schemacast_core::{Column, Table};
use tracing::{debug, warn};

use crate::polars_backend::PolarsBackend;
use crate::spreadsheet::SpreadsheetBackend;

/// Per-file inference errors
#[derive(Debug, thiserror::Error)]
pub enum InferError {
    #[error("unreadable or corrupt data file {path}: {reason}")]
    DataFormat { path: String, reason: String },

    #[error("no backend supports {path}")]
    UnsupportedExtension { path: String },
}

impl InferError {
    pub(crate) fn data_format(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::DataFormat {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A source format a backend can read and classify column types for
pub trait InferenceBackend {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Whether this backend claims the file's extension
    fn supports(&self, path: &Path) -> bool;

    /// Read the file and classify one `Column` per source field
    fn infer(&self, path: &Path) -> Result<Vec<Column>, InferError>;
}

/// The backend list, in the order they are tried
pub fn backends() -> Vec<Box<dyn InferenceBackend>> {
    vec![Box::new(PolarsBackend), Box::new(SpreadsheetBackend)]
}

/// Infer columns for a file, trying each supporting backend in order
pub fn infer_columns(path: &Path) -> Result<Vec<Column>, InferError> {
    let mut last_err = None;
    for backend in backends() {
        if !backend.supports(path) {
            continue;
        }
        match backend.infer(path) {
            Ok(columns) => {
                debug!(backend = backend.name(), path = %path.display(), columns = columns.len(), "inferred schema");
                return Ok(columns);
            }
            Err(err) => {
                warn!(backend = backend.name(), path = %path.display(), %err, "backend failed");
                last_err = Some(err);
            }
        }
    }
    match last_err {
        Some(err) => Err(err),
        None => Err(InferError::UnsupportedExtension {
            path: path.display().to_string(),
        }),
    }
}

/// Infer a full `Table` for a file, named after its stem
pub fn infer_table(path: &Path) -> Result<Table, InferError> {
    let columns = infer_columns(path)?;
    Ok(Table::new(table_name_from(path), columns))
}

/// Table name from a file path: stem, lowercased, spaces to underscores
pub fn table_name_from(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_lowercase()
        .replace(' ', "_")
}

pub(crate) fn extension_lower(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}
