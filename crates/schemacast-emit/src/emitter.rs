//! Artifact emission
//!
//! Runs the mapper once, then writes the requested target families under
//! `out/dbt/` and `out/ge/`. All writes are atomic.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use schemacast_core::{ensure_dir, to_yaml, write_atomic, Diagnostic, GovernanceDoc, WriteError};
use tracing::info;

use crate::mapping::map_document;
use crate::{dbt, ge};

/// A target family to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitTarget {
    Dbt,
    Ge,
}

impl EmitTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dbt => "dbt",
            Self::Ge => "ge",
        }
    }
}

impl std::fmt::Display for EmitTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown emit target '{0}' (expected 'dbt' or 'ge')")]
pub struct ParseTargetError(String);

impl FromStr for EmitTarget {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dbt" => Ok(Self::Dbt),
            "ge" | "great_expectations" => Ok(Self::Ge),
            other => Err(ParseTargetError(other.to_string())),
        }
    }
}

/// Parse a comma-separated target list, deduplicated in given order
pub fn parse_targets(list: &str) -> Result<Vec<EmitTarget>, ParseTargetError> {
    let mut targets = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let target = part.parse::<EmitTarget>()?;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    Ok(targets)
}

/// What an emission run produced
#[derive(Debug)]
pub struct EmitOutcome {
    /// Paths written, in write order
    pub written: Vec<PathBuf>,

    /// Mapping findings (unsupported rules)
    pub diagnostics: Vec<Diagnostic>,

    pub tables: usize,
    pub rules_mapped: usize,
    pub rules_skipped: usize,
}

/// Map the document once and emit every requested target family
pub fn emit(
    doc: &GovernanceDoc,
    out_dir: &Path,
    targets: &[EmitTarget],
) -> Result<EmitOutcome, WriteError> {
    let mapped = map_document(doc);
    ensure_dir(out_dir)?;

    let mut written = Vec::new();
    for target in targets {
        match target {
            EmitTarget::Dbt => {
                let dir = out_dir.join("dbt");
                ensure_dir(&dir)?;
                let (file, filename) = dbt::render(doc, &mapped);
                let path = dir.join(filename);
                write_atomic(&path, &to_yaml(&file)?)?;
                written.push(path);
            }
            EmitTarget::Ge => {
                let dir = out_dir.join("ge");
                ensure_dir(&dir)?;
                for suite in ge::render(&mapped) {
                    let path = dir.join(format!("{}_suite.yml", suite.expectation_suite_name));
                    write_atomic(&path, &to_yaml(&suite)?)?;
                    written.push(path);
                }
            }
        }
    }

    info!(
        files = written.len(),
        tables = mapped.tables.len(),
        rules_mapped = mapped.rules_mapped,
        rules_skipped = mapped.rules_skipped,
        "emission complete"
    );

    Ok(EmitOutcome {
        written,
        diagnostics: mapped.diagnostics,
        tables: mapped.tables.len(),
        rules_mapped: mapped.rules_mapped,
        rules_skipped: mapped.rules_skipped,
    })
}
