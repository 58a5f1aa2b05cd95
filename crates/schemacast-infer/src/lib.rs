//! Schemacast Infer
//!
//! Best-effort column type inference over tabular files. Two backends, tried
//! in order: polars for CSV/Parquet, calamine for spreadsheets. Discovery is
//! either a flat directory scan or a sources.yaml config.

pub mod backend;
pub mod polars_backend;
pub mod scan;
pub mod spreadsheet;

pub use backend::{backends, infer_columns, infer_table, table_name_from, InferError, InferenceBackend};
pub use polars_backend::PolarsBackend;
pub use scan::{scan_config, scan_dir, ConfigError, ScanOutcome, SourceSpec, SourcesConfig, SUPPORTED_EXTENSIONS};
pub use spreadsheet::SpreadsheetBackend;
