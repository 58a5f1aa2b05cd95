//! Source discovery: directory scans and sources.yaml configs
//!
//! Per-file failures never abort a scan; the file is skipped and the run
//! carries a warning diagnostic for it.

use std::path::{Path, PathBuf};

use schemacast_core::{Diagnostic, DiagnosticCode, Severity, Table};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::backend::{extension_lower, infer_columns, infer_table, table_name_from};
use crate::spreadsheet::SpreadsheetBackend;

/// Extensions picked up by a plain directory scan
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "parquet", "xlsx", "xls"];

/// Result of scanning one or more sources
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Inferred tables, in scan order
    pub tables: Vec<Table>,

    /// Per-file findings (skipped files)
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanOutcome {
    fn skip(&mut self, path: &Path, err: impl std::fmt::Display) {
        warn!(path = %path.display(), %err, "skipping source file");
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SourceUnreadable,
                Severity::Warn,
                format!("skipped {}: {err}", path.display()),
            )
            .with_table(table_name_from(path)),
        );
    }
}

/// Infer a table per supported file directly under `data_dir`, sorted by
/// path. A missing or empty directory yields zero tables, not an error.
pub fn scan_dir(data_dir: &Path) -> ScanOutcome {
    let mut files: Vec<PathBuf> = WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| SUPPORTED_EXTENSIONS.contains(&extension_lower(path).as_str()))
        .collect();
    files.sort();

    debug!(dir = %data_dir.display(), files = files.len(), "scanning data directory");

    let mut outcome = ScanOutcome::default();
    for path in files {
        match infer_table(&path) {
            Ok(table) => outcome.tables.push(table),
            Err(err) => outcome.skip(&path, err),
        }
    }
    outcome
}

/// sources.yaml configuration errors; fatal
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("source #{index} must have either 'path' or 'glob'")]
    MissingPathOrGlob { index: usize },
}

/// Top-level sources.yaml structure
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Directory relative paths resolve against; defaults to the config
    /// file's directory
    #[serde(default)]
    pub base_dir: Option<String>,

    pub sources: Vec<SourceSpec>,
}

/// One source entry: a single file or a glob of files
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub glob: Option<String>,

    /// Declared format; only consulted for spreadsheet sheet selection
    #[serde(default)]
    pub format: Option<String>,

    /// Spreadsheet sheet to read instead of the first one
    #[serde(default)]
    pub sheet: Option<String>,

    /// Explicit table name override
    #[serde(default)]
    pub table: Option<String>,

    /// Derive the table name from the file stem even when `table` is set
    #[serde(default)]
    pub table_from_stem: bool,
}

impl SourceSpec {
    fn wants_sheet(&self, path: &Path) -> bool {
        if self.sheet.is_none() {
            return false;
        }
        let declared = self.format.as_deref().map(str::to_lowercase);
        matches!(declared.as_deref(), Some("xlsx") | Some("xls"))
            || matches!(extension_lower(path).as_str(), "xlsx" | "xls")
    }

    fn table_name(&self, path: &Path) -> String {
        match (&self.table, self.table_from_stem) {
            (Some(table), false) => table.clone(),
            _ => table_name_from(path),
        }
    }
}

/// Scan the sources listed in a config file
pub fn scan_config(config_path: &Path) -> Result<ScanOutcome, ConfigError> {
    let text = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.display().to_string(),
        source,
    })?;
    let config: SourcesConfig = serde_yaml::from_str(&text)?;

    let base_dir = resolve_base_dir(config_path, config.base_dir.as_deref());
    let mut outcome = ScanOutcome::default();

    for (index, source) in config.sources.iter().enumerate() {
        let paths = if let Some(path) = &source.path {
            let mut p = PathBuf::from(path);
            if p.is_relative() {
                p = base_dir.join(p);
            }
            vec![p]
        } else if let Some(pattern) = &source.glob {
            glob_files(&base_dir, pattern)
        } else {
            return Err(ConfigError::MissingPathOrGlob { index });
        };

        for path in paths {
            let columns = if source.wants_sheet(&path) {
                SpreadsheetBackend::infer_sheet(&path, source.sheet.as_deref())
            } else {
                infer_columns(&path)
            };
            match columns {
                Ok(columns) => outcome
                    .tables
                    .push(Table::new(source.table_name(&path), columns)),
                Err(err) => outcome.skip(&path, err),
            }
        }
    }

    Ok(outcome)
}

/// Resolve the base directory for relative source paths
fn resolve_base_dir(config_path: &Path, base_dir: Option<&str>) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    match base_dir {
        None => parent,
        Some(dir) => {
            let p = PathBuf::from(dir);
            if p.is_absolute() {
                p
            } else {
                parent.join(p)
            }
        }
    }
}

/// Files under `base` whose path relative to `base` matches `pattern`,
/// sorted
fn glob_files(base: &Path, pattern: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.strip_prefix(base)
                .ok()
                .and_then(|rel| rel.to_str())
                .is_some_and(|rel| glob_match(pattern, rel))
        })
        .collect();
    files.sort();
    files
}

/// Simple glob matching. `*` matches within one path segment; `**` is the
/// only way to cross directory separators.
fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once("**") {
        Some((prefix, suffix)) => {
            if !text.starts_with(prefix) {
                return false;
            }
            let suffix = suffix.trim_start_matches('/');
            if suffix.is_empty() {
                return true;
            }
            let suffix_segments: Vec<&str> = suffix.split('/').collect();
            let text_segments: Vec<&str> = text.split('/').collect();
            suffix_segments.len() <= text_segments.len()
                && suffix_segments
                    .iter()
                    .rev()
                    .zip(text_segments.iter().rev())
                    .all(|(p, t)| segment_match(p, t))
        }
        None => {
            let pattern_segments: Vec<&str> = pattern.split('/').collect();
            let text_segments: Vec<&str> = text.split('/').collect();
            pattern_segments.len() == text_segments.len()
                && pattern_segments
                    .iter()
                    .zip(&text_segments)
                    .all(|(p, t)| segment_match(p, t))
        }
    }
}

/// Match one path segment against a pattern segment with at most one `*`
fn segment_match(pattern: &str, text: &str) -> bool {
    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];
        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}
