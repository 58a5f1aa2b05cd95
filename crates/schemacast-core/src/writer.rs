//! Schema document serialization and atomic file writes
//!
//! Every artifact write goes through `write_atomic`: the content lands in a
//! sibling `.tmp` file first and is renamed over the final path, so readers
//! never observe a partially written document.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::schema::{SchemaDocument, Table};

/// Output write errors; fatal for the run
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize YAML: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Serialize any document to YAML with deterministic field order
pub fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String, WriteError> {
    Ok(serde_yaml::to_string(value)?)
}

/// Write `contents` to `path` via a temp file and rename
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), WriteError> {
    let tmp = tmp_path(path);
    std::fs::write(&tmp, contents).map_err(|source| WriteError::Write {
        path: tmp.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        WriteError::Write {
            path: path.display().to_string(),
            source,
        }
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Create a directory and its parents, with path context on failure
pub fn ensure_dir(path: &Path) -> Result<(), WriteError> {
    std::fs::create_dir_all(path).map_err(|source| WriteError::CreateDir {
        path: path.display().to_string(),
        source,
    })
}

/// Writes inferred schema documents into an output directory
///
/// One `<table>.schema.yaml` per table plus an `_all_schemas.yaml`
/// aggregate; never touches unrelated files already present.
pub struct SchemaWriter {
    out_dir: PathBuf,
}

impl SchemaWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Write per-table documents and the aggregate, returning written paths
    pub fn write_tables(&self, tables: &[Table]) -> Result<Vec<PathBuf>, WriteError> {
        ensure_dir(&self.out_dir)?;

        let mut written = Vec::with_capacity(tables.len() + 1);
        for table in tables {
            let doc = SchemaDocument::new(vec![table.clone()]);
            let path = self.out_dir.join(format!("{}.schema.yaml", table.name));
            write_atomic(&path, &to_yaml(&doc)?)?;
            debug!(path = %path.display(), "wrote table schema");
            written.push(path);
        }

        let combined = SchemaDocument::new(tables.to_vec());
        let path = self.out_dir.join("_all_schemas.yaml");
        write_atomic(&path, &to_yaml(&combined)?)?;
        written.push(path);

        Ok(written)
    }
}
