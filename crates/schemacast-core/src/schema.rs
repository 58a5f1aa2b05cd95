//! Schema and governance document types
//!
//! The governance YAML is the single source of truth for tables, columns,
//! and validation rules. Rule vocabularies found in the wild vary (dbt test
//! names, GE expectation names, shorthand flags), so deserialization
//! canonicalizes them into the `Rule` enum while preserving declared order.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

/// Current governance/schema document version
pub const SCHEMA_VERSION: u32 = 1;

/// Semantic column type, best-effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
    Datetime,
    /// Anything the backends cannot classify; also absorbs unrecognized
    /// type strings in governance files instead of failing the parse
    #[serde(other)]
    Unknown,
}

impl ColumnType {
    /// Stable lowercase name, matching the YAML spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single validation rule on a column
///
/// Parameters are carried verbatim as YAML values so that `min: 0` stays an
/// integer all the way into the emitted artifacts.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    NotNull,
    Unique,
    AcceptedRange {
        min: Option<Value>,
        max: Option<Value>,
    },
    Regex {
        pattern: String,
    },
    /// A rule kind with no registered mapping; kept so the mapper can
    /// report it instead of silently dropping it
    Other {
        kind: String,
        params: Value,
    },
}

impl Rule {
    /// Canonical rule kind name
    pub fn kind(&self) -> &str {
        match self {
            Self::NotNull => "not_null",
            Self::Unique => "unique",
            Self::AcceptedRange { .. } => "accepted_range",
            Self::Regex { .. } => "regex",
            Self::Other { kind, .. } => kind.as_str(),
        }
    }
}

// Accepted spellings for each canonical rule kind. Sourced from dbt test
// names, GE expectation names, and common governance shorthand.
const NOT_NULL_KEYS: &[&str] = &["not_null", "notnull", "expect_column_values_to_not_be_null"];

const UNIQUE_KEYS: &[&str] = &["unique", "distinct", "expect_column_values_to_be_unique"];

const RANGE_KEYS: &[&str] = &[
    "accepted_range",
    "range",
    "between",
    "expect_column_values_to_be_between",
    "dbt_expectations.expect_column_values_to_be_between",
];

const REGEX_KEYS: &[&str] = &["regex", "pattern", "match", "matches", "expression"];

const MIN_KEYS: &[&str] = &["min", "min_value", "gte", "lower_bound"];
const MAX_KEYS: &[&str] = &["max", "max_value", "lte", "upper_bound"];

// Keys under which a column may carry its rule collection.
const COLLECTION_KEYS: &[&str] = &["rules", "tests", "constraints"];

/// Ordered set of rules on a column
///
/// Serializes as a YAML mapping keyed by canonical kind; deserializes from
/// the full alias vocabulary (see the `KEYS` tables above).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.0.iter().any(|r| r.kind() == kind)
    }

    /// Drop rules not matching the predicate, in place
    pub fn retain(&mut self, f: impl FnMut(&Rule) -> bool) {
        self.0.retain(f);
    }

    fn push_if_absent(&mut self, rule: Rule) {
        if !self.has_kind(rule.kind()) {
            self.0.push(rule);
        }
    }

    /// Apply one rule key/value pair from a rule collection
    fn apply(&mut self, key: &str, value: &Value) {
        let lowered = key.to_lowercase();
        let lowered = lowered.as_str();

        if NOT_NULL_KEYS.contains(&lowered) {
            if !matches!(value, Value::Bool(false)) {
                self.push_if_absent(Rule::NotNull);
            }
        } else if UNIQUE_KEYS.contains(&lowered) {
            if !matches!(value, Value::Bool(false)) {
                self.push_if_absent(Rule::Unique);
            }
        } else if RANGE_KEYS.contains(&lowered) {
            if let Some((min, max)) = parse_range(value) {
                self.merge_range(min, max);
            }
        } else if REGEX_KEYS.contains(&lowered) {
            if let Some(pattern) = parse_regex(value) {
                self.set_regex(pattern);
            }
        } else {
            self.push_if_absent(Rule::Other {
                kind: key.to_string(),
                params: value.clone(),
            });
        }
    }

    /// Merge range bounds into an existing range rule, or append a new one.
    /// Later bounds win, mirroring how column-level hints override.
    fn merge_range(&mut self, min: Option<Value>, max: Option<Value>) {
        if min.is_none() && max.is_none() {
            return;
        }
        for rule in &mut self.0 {
            if let Rule::AcceptedRange {
                min: existing_min,
                max: existing_max,
            } = rule
            {
                if min.is_some() {
                    *existing_min = min;
                }
                if max.is_some() {
                    *existing_max = max;
                }
                return;
            }
        }
        self.0.push(Rule::AcceptedRange { min, max });
    }

    fn set_regex(&mut self, pattern: String) {
        for rule in &mut self.0 {
            if let Rule::Regex { pattern: existing } = rule {
                *existing = pattern;
                return;
            }
        }
        self.0.push(Rule::Regex { pattern });
    }

    /// Fold an explicit rule collection (mapping, or list of names and
    /// single-entry mappings) into the set
    fn apply_collection(&mut self, collection: &Value) {
        match collection {
            Value::Mapping(map) => {
                for (key, value) in map {
                    if let Value::String(key) = key {
                        self.apply(key, value);
                    }
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    match item {
                        Value::String(name) => self.apply(name, &Value::Bool(true)),
                        Value::Mapping(map) => {
                            for (key, value) in map {
                                if let Value::String(key) = key {
                                    self.apply(key, value);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for RuleSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = Mapping::new();
        for rule in &self.0 {
            match rule {
                Rule::NotNull => {
                    map.insert(Value::String("not_null".into()), Value::Bool(true));
                }
                Rule::Unique => {
                    map.insert(Value::String("unique".into()), Value::Bool(true));
                }
                Rule::AcceptedRange { min, max } => {
                    let mut range = Mapping::new();
                    if let Some(min) = min {
                        range.insert(Value::String("min".into()), min.clone());
                    }
                    if let Some(max) = max {
                        range.insert(Value::String("max".into()), max.clone());
                    }
                    map.insert(
                        Value::String("accepted_range".into()),
                        Value::Mapping(range),
                    );
                }
                Rule::Regex { pattern } => {
                    map.insert(
                        Value::String("regex".into()),
                        Value::String(pattern.clone()),
                    );
                }
                Rule::Other { kind, params } => {
                    map.insert(Value::String(kind.clone()), params.clone());
                }
            }
        }
        map.serialize(serializer)
    }
}

/// Extract (min, max) bounds from a range value: a mapping with aliased
/// bound keys, or a two-element sequence
fn parse_range(value: &Value) -> Option<(Option<Value>, Option<Value>)> {
    match value {
        Value::Mapping(map) => {
            let min = first_value(map, MIN_KEYS).cloned();
            let max = first_value(map, MAX_KEYS).cloned();
            if min.is_none() && max.is_none() {
                None
            } else {
                Some((min, max))
            }
        }
        Value::Sequence(items) if items.len() == 2 => {
            Some((Some(items[0].clone()), Some(items[1].clone())))
        }
        _ => None,
    }
}

/// Extract a regex pattern from a scalar or an aliased mapping
fn parse_regex(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Mapping(map) => match first_value(map, REGEX_KEYS) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// First non-null value in `map` for the given keys, in key-priority order
fn first_value<'a>(map: &'a Mapping, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        for (k, v) in map {
            if let Value::String(k) = k {
                if k == key && !matches!(v, Value::Null) {
                    return Some(v);
                }
            }
        }
    }
    None
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// A column in a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name, unique within its table
    pub name: String,

    /// Declared or inferred semantic type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,

    /// Free-form description, carried through to dbt output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rules in declared order
    #[serde(skip_serializing_if = "RuleSet::is_empty")]
    pub rules: RuleSet,
}

impl Column {
    /// Create a column with a known type and no rules
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type: Some(column_type),
            description: None,
            rules: RuleSet::default(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the rules
    pub fn with_rules(mut self, rules: impl Into<RuleSet>) -> Self {
        self.rules = rules.into();
        self
    }
}

/// Raw column as written in YAML; extra keys hold the rule collection and
/// any column-level rule hints
#[derive(Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type", default)]
    column_type: Option<ColumnType>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: Mapping,
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawColumn::deserialize(deserializer)?;
        if raw.name.is_empty() {
            return Err(D::Error::custom("column name must not be empty"));
        }

        let mut rules = RuleSet::default();

        // Explicit rule collection first, checked in key-priority order.
        for key in COLLECTION_KEYS {
            if let Some(collection) = first_value(&raw.extra, &[key]) {
                rules.apply_collection(collection);
                break;
            }
        }

        // Column-level hints: shorthand flags and bare bounds next to the
        // column fields. Bounds and patterns override collection values.
        if first_value(&raw.extra, &["unique", "distinct"]).is_some_and(is_truthy) {
            rules.push_if_absent(Rule::Unique);
        }
        let nullable_false = matches!(
            first_value(&raw.extra, &["nullable"]),
            Some(Value::Bool(false))
        );
        if first_value(&raw.extra, &["not_null"]).is_some_and(is_truthy) || nullable_false {
            rules.push_if_absent(Rule::NotNull);
        }

        let min_hint = first_value(&raw.extra, MIN_KEYS).cloned();
        let max_hint = first_value(&raw.extra, MAX_KEYS).cloned();
        rules.merge_range(min_hint, max_hint);

        if let Some(Value::String(pattern)) = first_value(&raw.extra, &["regex", "pattern"]) {
            if !pattern.is_empty() {
                rules.set_regex(pattern.clone());
            }
        }

        Ok(Column {
            name: raw.name,
            column_type: raw.column_type,
            description: raw.description,
            rules,
        })
    }
}

/// A named table with ordered columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A versioned, ordered collection of tables
///
/// Either synthesized by inference and written once, or parsed from a
/// governance file and treated as read-only input to the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub version: u32,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl SchemaDocument {
    pub fn new(tables: Vec<Table>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            tables,
        }
    }

    /// Find a table by name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Metadata for a dataset-form governance document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub name: String,

    /// "source" emits a dbt sources.yml instead of schema.yml
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Source name in dbt sources.yml
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl DatasetMeta {
    pub fn is_source(&self) -> bool {
        self.kind.as_deref() == Some("source")
    }
}

/// Dataset-form governance document: one dataset, top-level column list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub dataset: DatasetMeta,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// A parsed governance document in either of its two forms
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GovernanceDoc {
    Tables(SchemaDocument),
    Dataset(DatasetDocument),
}

impl GovernanceDoc {
    /// All (table name, columns) pairs in declared order, regardless of form
    pub fn table_sets(&self) -> Vec<(&str, &[Column])> {
        match self {
            Self::Tables(doc) => doc
                .tables
                .iter()
                .map(|t| (t.name.as_str(), t.columns.as_slice()))
                .collect(),
            Self::Dataset(doc) => vec![(doc.dataset.name.as_str(), doc.columns.as_slice())],
        }
    }
}
