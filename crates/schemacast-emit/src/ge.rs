//! Great Expectations suite rendering
//!
//! One suite per table, one expectation per mapped rule. Suites serialize
//! to YAML; GE accepts both YAML and JSON suite files.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::mapping::MappedDocument;

/// A single expectation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeExpectation {
    pub expectation_type: String,

    /// Keyword arguments; `column` always present and first
    pub kwargs: Mapping,
}

/// An expectation suite for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeSuite {
    pub expectation_suite_name: String,

    #[serde(default)]
    pub expectations: Vec<GeExpectation>,
}

/// Render one suite per table, expectations in declared column and rule
/// order. The suite is named after the bare table; the `_suite` suffix
/// belongs to the filename only.
pub fn render(mapped: &MappedDocument) -> Vec<GeSuite> {
    mapped
        .tables
        .iter()
        .map(|table| GeSuite {
            expectation_suite_name: table.name.clone(),
            expectations: table
                .columns
                .iter()
                .flat_map(|column| column.rules.iter().map(|rule| rule.ge.clone()))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::map_document;
    use pretty_assertions::assert_eq;
    use schemacast_core::{Column, ColumnType, GovernanceDoc, Rule, SchemaDocument, Table};
    use serde_yaml::Value;

    #[test]
    fn one_suite_per_table_with_ordered_expectations() {
        let doc = GovernanceDoc::Tables(SchemaDocument::new(vec![Table::new(
            "customers",
            vec![
                Column::new("customer_id", ColumnType::Integer)
                    .with_rules(vec![Rule::NotNull, Rule::Unique]),
                Column::new("age", ColumnType::Integer).with_rules(vec![Rule::AcceptedRange {
                    min: Some(Value::from(0)),
                    max: Some(Value::from(120)),
                }]),
            ],
        )]));

        let suites = render(&map_document(&doc));
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].expectation_suite_name, "customers");

        let types: Vec<&str> = suites[0]
            .expectations
            .iter()
            .map(|e| e.expectation_type.as_str())
            .collect();
        assert_eq!(
            types,
            vec![
                "expect_column_values_to_not_be_null",
                "expect_column_values_to_be_unique",
                "expect_column_values_to_be_between",
            ]
        );
        assert_eq!(
            suites[0].expectations[2].kwargs.get("column"),
            Some(&Value::String("age".into()))
        );
    }

    #[test]
    fn table_without_rules_renders_an_empty_suite() {
        let doc = GovernanceDoc::Tables(SchemaDocument::new(vec![Table::new(
            "audit_log",
            vec![Column::new("id", ColumnType::Integer)],
        )]));

        let suites = render(&map_document(&doc));
        assert_eq!(suites.len(), 1);
        assert!(suites[0].expectations.is_empty());
    }
}
