//! Canonical result and schema shapes
//!
//! Whatever a backend natively returns, the executor and the introspection
//! path normalize it into the types in this module: [`QueryResult`] with
//! inferred [`ColumnDescriptor`]s, [`SchemaInfo`] with per-table columns,
//! and the fixed [`CanonicalType`] taxonomy native types are mapped into.

use crate::types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The canonical scalar-type taxonomy
///
/// Mapping into this taxonomy is a total function: any native tag the
/// mapping does not recognize becomes [`CanonicalType::Unknown`]. It never
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    String,
    Number,
    Boolean,
    Binary,
    Null,
    List,
    Map,
    Mixed,
    Unknown,
}

impl CanonicalType {
    /// Infer the canonical type of a JSON value
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
            Value::Array(_) => Self::List,
            Value::Object(_) => Self::Map,
        }
    }

    /// Map a backend-native type tag into the canonical taxonomy.
    ///
    /// Total over arbitrary input; unrecognized tags map to `Unknown`.
    pub fn from_native_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        // Strip a parameterized suffix: "varchar(255)" -> "varchar"
        let base = tag.split('(').next().unwrap_or("").trim();

        match base {
            "string" | "str" | "text" | "varchar" | "char" | "character" | "nvarchar"
            | "uuid" | "date" | "time" | "datetime" | "timestamp" | "timestamptz" => Self::String,
            "number" | "int" | "integer" | "smallint" | "bigint" | "tinyint" | "float"
            | "float4" | "float8" | "double" | "real" | "decimal" | "numeric" | "counter" => {
                Self::Number
            }
            "bool" | "boolean" | "bit" => Self::Boolean,
            "binary" | "varbinary" | "blob" | "bytea" | "bytes" => Self::Binary,
            "null" | "void" => Self::Null,
            "array" | "list" | "set" | "vector" => Self::List,
            "map" | "object" | "json" | "jsonb" | "struct" | "document" | "record" => Self::Map,
            "variant" | "mixed" | "any" | "union" => Self::Mixed,
            _ => Self::Unknown,
        }
    }

    /// Lowercase name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::Null => "null",
            Self::List => "list",
            Self::Map => "map",
            Self::Mixed => "mixed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Description of one result or table column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Canonical type
    pub canonical_type: CanonicalType,
    /// Whether null values were observed or declared for this column
    pub nullable: bool,
    /// Declared default value, when the backend reports one
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl ColumnDescriptor {
    /// Create a column descriptor
    pub fn new(name: impl Into<String>, canonical_type: CanonicalType) -> Self {
        Self {
            name: name.into(),
            canonical_type,
            nullable: false,
            default_value: None,
        }
    }

    /// Mark the column nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Attach a declared default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Normalized result of one query execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Ordered canonical records
    pub rows: Vec<Record>,
    /// Columns inferred from the key set of the first row; empty when the
    /// result has no rows. Consumers must treat an empty result's columns
    /// as unknown, not as "no columns exist".
    pub columns: Vec<ColumnDescriptor>,
    /// Number of rows returned
    pub row_count: usize,
    /// Wall-clock execution time measured by the executor, not the backend
    pub execution_time_ms: u64,
    /// Opaque unique id for correlation only
    pub query_id: String,
}

impl QueryResult {
    /// Build a result from normalized rows, inferring columns.
    ///
    /// Column names and types come from the first row only. Nullability is
    /// refined by scanning the remaining rows for nulls or missing values
    /// under those same keys; no additional columns are ever added.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let columns = infer_columns(&rows);
        let row_count = rows.len();
        Self {
            rows,
            columns,
            row_count,
            execution_time_ms: 0,
            query_id: Uuid::new_v4().to_string(),
        }
    }

    /// An empty result
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// Whether the result contains no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Infer column descriptors from the first row's key set
pub fn infer_columns(rows: &[Record]) -> Vec<ColumnDescriptor> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    first
        .iter()
        .map(|(name, value)| {
            let canonical_type = CanonicalType::of_value(value);
            let nullable = value.is_null()
                || rows[1..]
                    .iter()
                    .any(|row| row.get(name).map_or(true, Value::is_null));
            ColumnDescriptor {
                name: name.clone(),
                canonical_type,
                nullable,
                default_value: None,
            }
        })
        .collect()
}

/// Description of one table-like container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Container name
    pub name: String,
    /// Owning schema or database id, when the backend has one
    #[serde(default)]
    pub schema: Option<String>,
    /// Columns; empty when introspection of this container failed
    pub columns: Vec<ColumnDescriptor>,
}

impl TableInfo {
    /// Create a table descriptor
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns,
        }
    }

    /// A descriptor with no column information, used when per-container
    /// introspection failed but enumeration should continue
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Set the owning schema id
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Normalized schema introspection result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Table-like containers, in enumeration order
    pub tables: Vec<TableInfo>,
    /// Views, often empty
    #[serde(default)]
    pub views: Vec<TableInfo>,
}

impl SchemaInfo {
    /// An empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table descriptor
    pub fn add_table(mut self, table: TableInfo) -> Self {
        self.tables.push(table);
        self
    }

    /// Find a table by name
    pub fn find_table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config_from_value;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        config_from_value(value).unwrap()
    }

    #[test]
    fn test_native_tag_mapping_is_total() {
        assert_eq!(CanonicalType::from_native_tag("VARCHAR(255)"), CanonicalType::String);
        assert_eq!(CanonicalType::from_native_tag("bigint"), CanonicalType::Number);
        assert_eq!(CanonicalType::from_native_tag("BYTEA"), CanonicalType::Binary);
        assert_eq!(CanonicalType::from_native_tag("jsonb"), CanonicalType::Map);
        assert_eq!(CanonicalType::from_native_tag("variant"), CanonicalType::Mixed);
        assert_eq!(
            CanonicalType::from_native_tag("geography_point_3d"),
            CanonicalType::Unknown
        );
        assert_eq!(CanonicalType::from_native_tag(""), CanonicalType::Unknown);
    }

    #[test]
    fn test_columns_inferred_from_first_row() {
        let rows = vec![
            record(json!({"id": 1, "name": "alpha"})),
            record(json!({"id": 2, "name": "beta", "extra": true})),
        ];
        let result = QueryResult::from_rows(rows);

        // "extra" appears only in the second row and must not become a column.
        assert_eq!(result.columns.len(), 2);
        let names: Vec<_> = result.columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"id"));
        assert!(names.contains(&"name"));
        assert_eq!(result.row_count, 2);
    }

    #[test]
    fn test_empty_result_has_no_columns() {
        let result = QueryResult::from_rows(Vec::new());
        assert!(result.columns.is_empty());
        assert_eq!(result.row_count, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_nullability_scans_later_rows() {
        let rows = vec![
            record(json!({"id": 1, "note": "x"})),
            record(json!({"id": 2, "note": null})),
            record(json!({"id": 3})),
        ];
        let result = QueryResult::from_rows(rows);
        let note = result.columns.iter().find(|c| c.name == "note").unwrap();
        let id = result.columns.iter().find(|c| c.name == "id").unwrap();
        assert!(note.nullable);
        assert!(!id.nullable);
    }

    #[test]
    fn test_query_ids_are_unique() {
        let a = QueryResult::empty();
        let b = QueryResult::empty();
        assert_ne!(a.query_id, b.query_id);
    }

    #[test]
    fn test_schema_info_lookup() {
        let schema = SchemaInfo::new()
            .add_table(TableInfo::new(
                "users",
                vec![ColumnDescriptor::new("id", CanonicalType::Number)],
            ))
            .add_table(TableInfo::empty("broken"));

        assert_eq!(schema.tables.len(), 2);
        assert!(schema.find_table("users").is_some());
        assert!(schema.find_table("broken").unwrap().columns.is_empty());
        assert!(schema.find_table("absent").is_none());
    }
}
