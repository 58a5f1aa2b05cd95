//! Schemacast Core
//!
//! Domain model shared by the inference and emission crates: governance
//! documents, the rule vocabulary, diagnostics, and the run report.

pub mod diagnostic;
pub mod loader;
pub mod report;
pub mod schema;
pub mod writer;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use loader::{LoadedGovernance, SchemaError};
pub use report::{Report, ReportSummary, ReportVersion};
pub use schema::{
    Column, ColumnType, DatasetDocument, DatasetMeta, GovernanceDoc, Rule, RuleSet,
    SchemaDocument, Table, SCHEMA_VERSION,
};
pub use writer::{ensure_dir, to_yaml, write_atomic, SchemaWriter, WriteError};
