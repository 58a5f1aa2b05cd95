//! dbt schema file rendering
//!
//! Tables-form governance renders a `schema.yml` with a `models` list.
//! Dataset-form governance with `kind: source` renders a `sources.yml`
//! instead, nesting the tables under a source named after the domain.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::mapping::{MappedDocument, MappedTable};
use schemacast_core::GovernanceDoc;

/// Schema file format version dbt expects
pub const DBT_SCHEMA_VERSION: u32 = 2;

/// Top-level dbt schema file; carries models or sources, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtSchemaFile {
    pub version: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<DbtModel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<DbtSource>,
}

/// A model (or a table under a source)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtModel {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<DbtColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtColumn {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Bare test names or single-key mappings with parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtSource {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<DbtModel>,
}

/// Render the dbt schema file plus the filename it should be written as
pub fn render(doc: &GovernanceDoc, mapped: &MappedDocument) -> (DbtSchemaFile, &'static str) {
    let models: Vec<DbtModel> = mapped.tables.iter().map(render_table).collect();

    match doc {
        GovernanceDoc::Dataset(dataset) if dataset.dataset.is_source() => {
            let meta = &dataset.dataset;
            let source = DbtSource {
                name: meta
                    .domain
                    .clone()
                    .unwrap_or_else(|| meta.name.clone()),
                database: meta.database.clone(),
                schema: meta.schema.clone(),
                tables: models,
            };
            (
                DbtSchemaFile {
                    version: DBT_SCHEMA_VERSION,
                    models: Vec::new(),
                    sources: vec![source],
                },
                "sources.yml",
            )
        }
        _ => (
            DbtSchemaFile {
                version: DBT_SCHEMA_VERSION,
                models,
                sources: Vec::new(),
            },
            "schema.yml",
        ),
    }
}

fn render_table(table: &MappedTable) -> DbtModel {
    DbtModel {
        name: table.name.clone(),
        columns: table
            .columns
            .iter()
            .map(|column| DbtColumn {
                name: column.name.clone(),
                description: column.description.clone().unwrap_or_default(),
                tests: column.rules.iter().map(|rule| rule.dbt.clone()).collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::map_document;
    use pretty_assertions::assert_eq;
    use schemacast_core::{Column, ColumnType, LoadedGovernance, Rule, SchemaDocument, Table};

    #[test]
    fn tables_form_renders_models_in_schema_yml() {
        let doc = GovernanceDoc::Tables(SchemaDocument::new(vec![Table::new(
            "customers",
            vec![Column::new("customer_id", ColumnType::Integer)
                .with_description("primary key")
                .with_rules(vec![Rule::NotNull, Rule::Unique])],
        )]));

        let (file, filename) = render(&doc, &map_document(&doc));
        assert_eq!(filename, "schema.yml");
        assert_eq!(file.version, 2);
        assert!(file.sources.is_empty());
        assert_eq!(file.models[0].name, "customers");

        let column = &file.models[0].columns[0];
        assert_eq!(column.description, "primary key");
        assert_eq!(
            column.tests,
            vec![Value::String("not_null".into()), Value::String("unique".into())]
        );
    }

    #[test]
    fn source_dataset_renders_sources_yml() {
        let loaded = LoadedGovernance::from_str(
            r#"
dataset:
  name: raw_orders
  kind: source
  domain: sales
  database: analytics
  schema: raw
columns:
  - name: order_id
    type: integer
    rules:
      not_null: true
"#,
        )
        .unwrap();

        let (file, filename) = render(&loaded.doc, &map_document(&loaded.doc));
        assert_eq!(filename, "sources.yml");
        assert!(file.models.is_empty());

        let source = &file.sources[0];
        assert_eq!(source.name, "sales");
        assert_eq!(source.database.as_deref(), Some("analytics"));
        assert_eq!(source.schema.as_deref(), Some("raw"));
        assert_eq!(source.tables[0].name, "raw_orders");
        assert_eq!(
            source.tables[0].columns[0].tests,
            vec![Value::String("not_null".into())]
        );
    }

    #[test]
    fn non_source_dataset_stays_a_model() {
        let loaded = LoadedGovernance::from_str(
            "dataset:\n  name: orders\ncolumns:\n  - name: id\n",
        )
        .unwrap();

        let (file, filename) = render(&loaded.doc, &map_document(&loaded.doc));
        assert_eq!(filename, "schema.yml");
        assert_eq!(file.models[0].name, "orders");
    }

    #[test]
    fn serialized_schema_yml_omits_empty_fields() {
        let doc = GovernanceDoc::Tables(SchemaDocument::new(vec![Table::new(
            "t",
            vec![Column::new("c", ColumnType::String)],
        )]));
        let (file, _) = render(&doc, &map_document(&doc));

        let yaml = serde_yaml::to_string(&file).unwrap();
        assert!(!yaml.contains("sources"));
        assert!(!yaml.contains("description"));
        assert!(!yaml.contains("tests"));
    }
}
