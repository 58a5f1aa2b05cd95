//! Governance document loading and invariant validation
//!
//! Malformed documents are fatal before any emission happens; per-rule
//! problems (a regex that does not compile) downgrade to diagnostics so the
//! rest of the run can proceed.

use std::collections::HashSet;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use crate::schema::{Column, DatasetDocument, GovernanceDoc, Rule, SchemaDocument};

/// Governance document format errors; all fatal
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read governance file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid governance YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("governance document must be a YAML mapping")]
    NotAMapping,

    #[error("governance document is missing the top-level 'version' tag")]
    MissingVersion,

    #[error("governance document must declare either 'tables' or 'dataset'")]
    UnrecognizedForm,

    #[error("duplicate table name '{name}' in governance document")]
    DuplicateTable { name: String },

    #[error("duplicate column name '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("accepted_range on {table}.{column} has min {min} greater than max {max}")]
    InvalidRange {
        table: String,
        column: String,
        min: f64,
        max: f64,
    },
}

/// A validated governance document plus the non-fatal findings collected
/// while loading it
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGovernance {
    pub doc: GovernanceDoc,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadedGovernance {
    /// Load and validate a governance file
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loading governance document");
        Self::from_str(&text)
    }

    /// Load and validate a governance document from YAML text
    pub fn from_str(text: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_yaml::from_str(text)?;
        let map = value.as_mapping().ok_or(SchemaError::NotAMapping)?;

        let mut doc = if contains_key(map, "tables") {
            if !contains_key(map, "version") {
                return Err(SchemaError::MissingVersion);
            }
            let doc: SchemaDocument = serde_yaml::from_value(value)?;
            validate_tables(&doc)?;
            GovernanceDoc::Tables(doc)
        } else if contains_key(map, "dataset") {
            let doc: DatasetDocument = serde_yaml::from_value(value)?;
            validate_columns(&doc.dataset.name, &doc.columns)?;
            GovernanceDoc::Dataset(doc)
        } else {
            return Err(SchemaError::UnrecognizedForm);
        };

        let diagnostics = sanitize_rules(&mut doc);
        Ok(Self { doc, diagnostics })
    }
}

fn contains_key(map: &Mapping, key: &str) -> bool {
    map.keys()
        .any(|k| matches!(k, Value::String(s) if s == key))
}

fn validate_tables(doc: &SchemaDocument) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for table in &doc.tables {
        if !seen.insert(table.name.as_str()) {
            return Err(SchemaError::DuplicateTable {
                name: table.name.clone(),
            });
        }
        validate_columns(&table.name, &table.columns)?;
    }
    Ok(())
}

fn validate_columns(table: &str, columns: &[Column]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
        for rule in &column.rules {
            if let Rule::AcceptedRange {
                min: Some(min),
                max: Some(max),
            } = rule
            {
                if let (Some(min), Some(max)) = (as_f64(min), as_f64(max)) {
                    if min > max {
                        return Err(SchemaError::InvalidRange {
                            table: table.to_string(),
                            column: column.name.clone(),
                            min,
                            max,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Drop regex rules whose pattern does not compile, recording one warning
/// diagnostic per dropped rule
fn sanitize_rules(doc: &mut GovernanceDoc) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    match doc {
        GovernanceDoc::Tables(doc) => {
            for table in &mut doc.tables {
                let name = table.name.clone();
                for column in &mut table.columns {
                    sanitize_column(&name, column, &mut diagnostics);
                }
            }
        }
        GovernanceDoc::Dataset(doc) => {
            let name = doc.dataset.name.clone();
            for column in &mut doc.columns {
                sanitize_column(&name, column, &mut diagnostics);
            }
        }
    }
    diagnostics
}

fn sanitize_column(table: &str, column: &mut Column, diagnostics: &mut Vec<Diagnostic>) {
    let mut dropped = Vec::new();
    column.rules.retain(|rule| match rule {
        Rule::Regex { pattern } => {
            if regex::Regex::new(pattern).is_ok() {
                true
            } else {
                dropped.push(pattern.clone());
                false
            }
        }
        _ => true,
    });
    for pattern in dropped {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::RuleInvalidRegex,
                Severity::Warn,
                format!("pattern '{pattern}' is not a valid regex; rule skipped"),
            )
            .with_table(table)
            .with_column(&column.name),
        );
    }
}
