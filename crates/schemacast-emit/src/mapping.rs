//! Rule-to-target mapping
//!
//! The mapping table is process-wide, read-only state: one row per rule
//! kind, giving the dbt test identifier and the GE expectation name. Adding
//! a row is a deliberate code change, not a runtime extension point.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use schemacast_core::{Diagnostic, DiagnosticCode, GovernanceDoc, Rule, Severity};
use serde_yaml::{Mapping, Value};

use crate::ge::GeExpectation;

/// One row of the rule mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub dbt_test: &'static str,
    pub ge_expectation: &'static str,
}

static RULE_MAPPINGS: Lazy<HashMap<&'static str, MappingEntry>> = Lazy::new(|| {
    HashMap::from([
        (
            "not_null",
            MappingEntry {
                dbt_test: "not_null",
                ge_expectation: "expect_column_values_to_not_be_null",
            },
        ),
        (
            "unique",
            MappingEntry {
                dbt_test: "unique",
                ge_expectation: "expect_column_values_to_be_unique",
            },
        ),
        (
            "accepted_range",
            MappingEntry {
                dbt_test: "dbt_expectations.expect_column_values_to_be_between",
                ge_expectation: "expect_column_values_to_be_between",
            },
        ),
        (
            "regex",
            MappingEntry {
                dbt_test: "dbt_expectations.expect_column_values_to_match_regex",
                ge_expectation: "expect_column_values_to_match_regex",
            },
        ),
    ])
});

/// Look up the mapping row for a rule kind
pub fn lookup(kind: &str) -> Option<&'static MappingEntry> {
    RULE_MAPPINGS.get(kind)
}

/// A rule translated into both target vocabularies
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRule {
    /// Entry for a dbt column `tests` list: a bare test name or a
    /// single-key mapping of test name to parameters
    pub dbt: Value,

    /// GE expectation record
    pub ge: GeExpectation,
}

/// Outcome of mapping one rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleMapping {
    Mapped(MappedRule),
    /// No registered mapping; carries the diagnostic to report
    Unsupported(Diagnostic),
}

/// Map one rule into both target vocabularies, with parameters passed
/// through verbatim
pub fn map_rule(table: &str, column: &str, rule: &Rule) -> RuleMapping {
    let Some(entry) = lookup(rule.kind()) else {
        return unsupported(table, column, rule.kind());
    };

    let mut kwargs = Mapping::new();
    kwargs.insert(
        Value::String("column".into()),
        Value::String(column.to_string()),
    );

    let dbt = match rule {
        Rule::NotNull | Rule::Unique => Value::String(entry.dbt_test.to_string()),
        Rule::AcceptedRange { min, max } => {
            let mut params = Mapping::new();
            if let Some(min) = min {
                params.insert(Value::String("min_value".into()), min.clone());
                kwargs.insert(Value::String("min_value".into()), min.clone());
            }
            if let Some(max) = max {
                params.insert(Value::String("max_value".into()), max.clone());
                kwargs.insert(Value::String("max_value".into()), max.clone());
            }
            single_entry(entry.dbt_test, Value::Mapping(params))
        }
        Rule::Regex { pattern } => {
            let mut params = Mapping::new();
            params.insert(
                Value::String("regex".into()),
                Value::String(pattern.clone()),
            );
            kwargs.insert(
                Value::String("regex".into()),
                Value::String(pattern.clone()),
            );
            single_entry(entry.dbt_test, Value::Mapping(params))
        }
        Rule::Other { .. } => return unsupported(table, column, rule.kind()),
    };

    RuleMapping::Mapped(MappedRule {
        dbt,
        ge: GeExpectation {
            expectation_type: entry.ge_expectation.to_string(),
            kwargs,
        },
    })
}

fn unsupported(table: &str, column: &str, kind: &str) -> RuleMapping {
    RuleMapping::Unsupported(
        Diagnostic::new(
            DiagnosticCode::UnsupportedRule,
            Severity::Warn,
            format!("no dbt/GE mapping registered for rule kind '{kind}'"),
        )
        .with_table(table)
        .with_column(column),
    )
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut map = Mapping::new();
    map.insert(Value::String(key.to_string()), value);
    Value::Mapping(map)
}

/// A column with its rules already mapped, in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct MappedColumn {
    pub name: String,
    pub description: Option<String>,
    pub rules: Vec<MappedRule>,
}

/// A table with all columns mapped
#[derive(Debug, Clone, PartialEq)]
pub struct MappedTable {
    pub name: String,
    pub columns: Vec<MappedColumn>,
}

/// The whole governance document run through the mapper once; emitters for
/// both targets consume this so each skipped rule is diagnosed exactly once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedDocument {
    pub tables: Vec<MappedTable>,
    pub diagnostics: Vec<Diagnostic>,
    pub rules_mapped: usize,
    pub rules_skipped: usize,
}

/// Map every rule of every column, preserving declared order throughout
pub fn map_document(doc: &GovernanceDoc) -> MappedDocument {
    let mut mapped = MappedDocument::default();

    for (table_name, columns) in doc.table_sets() {
        let mut table = MappedTable {
            name: table_name.to_string(),
            columns: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            let mut rules = Vec::with_capacity(column.rules.len());
            for rule in &column.rules {
                match map_rule(table_name, &column.name, rule) {
                    RuleMapping::Mapped(rule) => {
                        mapped.rules_mapped += 1;
                        rules.push(rule);
                    }
                    RuleMapping::Unsupported(diagnostic) => {
                        mapped.rules_skipped += 1;
                        mapped.diagnostics.push(diagnostic);
                    }
                }
            }
            table.columns.push(MappedColumn {
                name: column.name.clone(),
                description: column.description.clone(),
                rules,
            });
        }
        mapped.tables.push(table);
    }

    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemacast_core::{Column, ColumnType, SchemaDocument, Table};

    fn mapped(rule: &Rule) -> MappedRule {
        match map_rule("t", "c", rule) {
            RuleMapping::Mapped(m) => m,
            RuleMapping::Unsupported(d) => panic!("unexpectedly unsupported: {d}"),
        }
    }

    #[test]
    fn every_registered_kind_maps_to_both_targets() {
        for kind in ["not_null", "unique", "accepted_range", "regex"] {
            assert!(lookup(kind).is_some(), "missing mapping for {kind}");
        }
    }

    #[test]
    fn boolean_rules_map_to_bare_test_names() {
        let m = mapped(&Rule::NotNull);
        assert_eq!(m.dbt, Value::String("not_null".into()));
        assert_eq!(m.ge.expectation_type, "expect_column_values_to_not_be_null");
        assert_eq!(m.ge.kwargs.get("column"), Some(&Value::String("c".into())));

        let m = mapped(&Rule::Unique);
        assert_eq!(m.dbt, Value::String("unique".into()));
        assert_eq!(m.ge.expectation_type, "expect_column_values_to_be_unique");
    }

    #[test]
    fn range_parameters_pass_through_verbatim() {
        let m = mapped(&Rule::AcceptedRange {
            min: Some(Value::from(0)),
            max: Some(Value::from(120)),
        });

        let Value::Mapping(dbt) = &m.dbt else {
            panic!("expected parameterized dbt test");
        };
        let params = dbt
            .get("dbt_expectations.expect_column_values_to_be_between")
            .unwrap();
        assert_eq!(
            params.get("min_value"),
            Some(&Value::from(0)),
            "min must stay an integer"
        );
        assert_eq!(params.get("max_value"), Some(&Value::from(120)));

        assert_eq!(m.ge.expectation_type, "expect_column_values_to_be_between");
        assert_eq!(m.ge.kwargs.get("min_value"), Some(&Value::from(0)));
        assert_eq!(m.ge.kwargs.get("max_value"), Some(&Value::from(120)));
    }

    #[test]
    fn open_ended_range_only_carries_present_bounds() {
        let m = mapped(&Rule::AcceptedRange {
            min: Some(Value::from(0)),
            max: None,
        });
        assert_eq!(m.ge.kwargs.get("min_value"), Some(&Value::from(0)));
        assert_eq!(m.ge.kwargs.get("max_value"), None);
    }

    #[test]
    fn regex_pattern_passes_through_verbatim() {
        let m = mapped(&Rule::Regex {
            pattern: r"^\d{4}-\d{2}$".to_string(),
        });
        assert_eq!(
            m.ge.kwargs.get("regex"),
            Some(&Value::String(r"^\d{4}-\d{2}$".into()))
        );
    }

    #[test]
    fn unregistered_kind_yields_unsupported_marker() {
        let rule = Rule::Other {
            kind: "foo_bar".to_string(),
            params: Value::Null,
        };
        let RuleMapping::Unsupported(diag) = map_rule("customers", "x", &rule) else {
            panic!("expected unsupported");
        };
        assert_eq!(diag.code, DiagnosticCode::UnsupportedRule);
        assert_eq!(diag.table.as_deref(), Some("customers"));
        assert_eq!(diag.column.as_deref(), Some("x"));
        assert!(diag.message.contains("foo_bar"));
    }

    #[test]
    fn document_mapping_counts_and_orders() {
        let doc = GovernanceDoc::Tables(SchemaDocument::new(vec![Table::new(
            "customers",
            vec![Column::new("customer_id", ColumnType::Integer).with_rules(vec![
                Rule::NotNull,
                Rule::Unique,
                Rule::Other {
                    kind: "foo_bar".to_string(),
                    params: Value::Null,
                },
            ])],
        )]));

        let mapped = map_document(&doc);
        assert_eq!(mapped.rules_mapped, 2);
        assert_eq!(mapped.rules_skipped, 1);
        assert_eq!(mapped.diagnostics.len(), 1);

        let rules = &mapped.tables[0].columns[0].rules;
        assert_eq!(rules[0].dbt, Value::String("not_null".into()));
        assert_eq!(rules[1].dbt, Value::String("unique".into()));
    }
}
