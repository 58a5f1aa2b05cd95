//! Schemacast Emit
//!
//! Translates governance rules into dbt test declarations and Great
//! Expectations suites. The mapper runs once per document; the two
//! renderers consume its output so every unsupported rule is reported
//! exactly once no matter how many targets are emitted.

pub mod dbt;
pub mod emitter;
pub mod ge;
pub mod mapping;

pub use dbt::{DbtColumn, DbtModel, DbtSchemaFile, DbtSource, DBT_SCHEMA_VERSION};
pub use emitter::{emit, parse_targets, EmitOutcome, EmitTarget, ParseTargetError};
pub use ge::{GeExpectation, GeSuite};
pub use mapping::{
    lookup, map_document, map_rule, MappedColumn, MappedDocument, MappedRule, MappedTable,
    MappingEntry, RuleMapping,
};
