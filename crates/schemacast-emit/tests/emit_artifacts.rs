//! End-to-end emission: governance YAML in, dbt and GE artifacts out.

use pretty_assertions::assert_eq;
use schemacast_core::{DiagnosticCode, LoadedGovernance};
use schemacast_emit::{emit, parse_targets, DbtSchemaFile, GeSuite};
use serde_yaml::Value;

const GOVERNANCE: &str = r#"
version: 1
tables:
  - name: customers
    columns:
      - name: customer_id
        type: integer
        rules:
          not_null: true
          unique: true
      - name: age
        type: integer
        rules:
          accepted_range:
            min: 0
            max: 120
      - name: email
        type: string
        rules:
          regex: "^[^@]+@[^@]+$"
          foo_bar: true
"#;

#[test]
fn governance_emits_both_target_families() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = LoadedGovernance::from_str(GOVERNANCE).unwrap();
    let targets = parse_targets("dbt,ge").unwrap();

    let outcome = emit(&loaded.doc, dir.path(), &targets).unwrap();

    assert_eq!(outcome.tables, 1);
    assert_eq!(outcome.rules_mapped, 4);
    assert_eq!(outcome.rules_skipped, 1);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::UnsupportedRule);

    let dbt_path = dir.path().join("dbt").join("schema.yml");
    let ge_path = dir.path().join("ge").join("customers_suite.yml");
    assert_eq!(outcome.written, vec![dbt_path.clone(), ge_path.clone()]);

    let dbt: DbtSchemaFile =
        serde_yaml::from_str(&std::fs::read_to_string(&dbt_path).unwrap()).unwrap();
    assert_eq!(dbt.version, 2);
    let model = &dbt.models[0];
    assert_eq!(model.name, "customers");

    // Declared rule order survives into the tests list
    assert_eq!(
        model.columns[0].tests,
        vec![Value::String("not_null".into()), Value::String("unique".into())]
    );

    // Range bounds pass through as integers, not strings
    let Value::Mapping(range_test) = &model.columns[1].tests[0] else {
        panic!("expected parameterized range test");
    };
    let params = range_test
        .get("dbt_expectations.expect_column_values_to_be_between")
        .unwrap();
    assert_eq!(params.get("min_value"), Some(&Value::from(0)));
    assert_eq!(params.get("max_value"), Some(&Value::from(120)));

    // The unmapped foo_bar rule is absent from the artifact
    assert_eq!(model.columns[2].tests.len(), 1);

    let suite: GeSuite =
        serde_yaml::from_str(&std::fs::read_to_string(&ge_path).unwrap()).unwrap();
    // Suite named after the bare table; only the filename carries _suite
    assert_eq!(suite.expectation_suite_name, "customers");

    let types: Vec<&str> = suite
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
            "expect_column_values_to_match_regex",
        ]
    );
    assert_eq!(
        suite.expectations[3].kwargs.get("regex"),
        Some(&Value::String("^[^@]+@[^@]+$".into()))
    );
}

#[test]
fn emission_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = LoadedGovernance::from_str(GOVERNANCE).unwrap();
    let targets = parse_targets("dbt,ge").unwrap();

    let first = emit(&loaded.doc, dir.path(), &targets).unwrap();
    let snapshot: Vec<String> = first
        .written
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect();

    let second = emit(&loaded.doc, dir.path(), &targets).unwrap();
    for (path, before) in second.written.iter().zip(&snapshot) {
        assert_eq!(&std::fs::read_to_string(path).unwrap(), before);
    }
}

#[test]
fn table_without_rules_still_gets_a_suite() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = LoadedGovernance::from_str(
        "version: 1\ntables:\n  - name: audit_log\n    columns:\n      - name: id\n",
    )
    .unwrap();

    let outcome = emit(&loaded.doc, dir.path(), &parse_targets("ge").unwrap()).unwrap();
    assert_eq!(outcome.rules_mapped, 0);

    let suite: GeSuite = serde_yaml::from_str(
        &std::fs::read_to_string(dir.path().join("ge").join("audit_log_suite.yml")).unwrap(),
    )
    .unwrap();
    assert_eq!(suite.expectation_suite_name, "audit_log");
    assert!(suite.expectations.is_empty());
}

#[test]
fn no_temp_files_remain_after_emission() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = LoadedGovernance::from_str(GOVERNANCE).unwrap();
    emit(&loaded.doc, dir.path(), &parse_targets("dbt,ge").unwrap()).unwrap();

    for entry in walk(dir.path()) {
        assert!(
            !entry.to_string_lossy().ends_with(".tmp"),
            "leftover temp file: {}",
            entry.display()
        );
    }
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut paths = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                paths.extend(walk(&path));
            } else {
                paths.push(path);
            }
        }
    }
    paths
}
