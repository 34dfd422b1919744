//! In-memory data-source backend
//!
//! Holds named datasets supplied through the connection config. Queries
//! address a dataset by name with an optional row limit
//! (`"<dataset>"` or `"<dataset> limit <n>"`); schema introspection infers
//! columns per dataset. Intended for demo dashboards and tests — the
//! smallest complete data source the plugin contract admits.

use crate::config_schema::{ConfigSchema, FieldSpec};
use crate::descriptor::{BackendCategory, BackendDescriptor, Capabilities};
use crate::error::{BackendError, Result};
use crate::plugin::{BackendPlugin, Connection};
use crate::result::{infer_columns, QueryResult, SchemaInfo, TableInfo};
use crate::types::{ConnectionConfig, Record};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;
use validator::Validate;

pub(crate) const BACKEND_NAME: &str = "memory";

/// Configuration for the memory backend
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct MemoryConfig {
    /// Named datasets: dataset name → rows
    pub datasets: BTreeMap<String, Vec<Record>>,

    /// Cap on rows returned per query
    #[serde(default = "default_max_rows")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_rows: usize,
}

fn default_max_rows() -> usize {
    10_000
}

/// In-memory data-source plugin
pub struct MemoryBackend;

/// A parsed memory query: dataset name plus optional limit
fn parse_query(query: &str) -> Result<(&str, Option<usize>)> {
    let parts: Vec<&str> = query.split_whitespace().collect();
    match parts.as_slice() {
        [dataset] => Ok((dataset, None)),
        [dataset, keyword, n] if keyword.eq_ignore_ascii_case("limit") => {
            let limit = n.parse::<usize>().map_err(|_| {
                BackendError::query(BACKEND_NAME, format!("invalid limit '{n}'"))
            })?;
            Ok((dataset, Some(limit)))
        }
        _ => Err(BackendError::query(
            BACKEND_NAME,
            format!("expected '<dataset>' or '<dataset> limit <n>', got '{query}'"),
        )),
    }
}

#[async_trait]
impl BackendPlugin for MemoryBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor::new(BACKEND_NAME, BackendCategory::Utility)
            .config_schema(
                ConfigSchema::new()
                    .field("datasets", FieldSpec::object("Datasets").required())
                    .field(
                        "max_rows",
                        FieldSpec::number("Max rows per query").with_default(json!(10_000)),
                    ),
            )
            .capabilities(Capabilities::new().bulk_insert().max_connections(32))
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        let typed: MemoryConfig = super::typed_config(BACKEND_NAME, config)?;
        debug!(datasets = typed.datasets.len(), "memory backend connected");
        Ok(Connection::open(BACKEND_NAME, config.clone(), Box::new(typed)))
    }

    async fn execute_query(
        &self,
        conn: &mut Connection,
        query: &str,
        _params: Option<&[Value]>,
    ) -> Result<QueryResult> {
        conn.ensure_open()?;
        let (dataset, limit) = parse_query(query)?;

        let state = conn
            .native_ref::<MemoryConfig>()
            .ok_or_else(|| BackendError::query(BACKEND_NAME, "connection has no native state"))?;
        let rows = state.datasets.get(dataset).ok_or_else(|| {
            BackendError::query(BACKEND_NAME, format!("unknown dataset '{dataset}'"))
        })?;

        let cap = limit.unwrap_or(state.max_rows).min(state.max_rows);
        Ok(QueryResult::from_rows(rows.iter().take(cap).cloned().collect()))
    }

    async fn get_schema(&self, conn: &mut Connection) -> Result<SchemaInfo> {
        conn.ensure_open()?;
        let state = conn
            .native_ref::<MemoryConfig>()
            .ok_or_else(|| BackendError::query(BACKEND_NAME, "connection has no native state"))?;

        let mut schema = SchemaInfo::new();
        for (name, rows) in &state.datasets {
            schema.tables.push(
                TableInfo::new(name.clone(), infer_columns(rows)).in_schema(BACKEND_NAME),
            );
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config_from_value;

    fn sample_config() -> ConnectionConfig {
        config_from_value(json!({
            "datasets": {
                "sales": [
                    {"region": "north", "revenue": 1200},
                    {"region": "south", "revenue": 950},
                    {"region": "west", "revenue": 1430},
                ],
                "empty": [],
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_dataset_rows() {
        let backend = MemoryBackend;
        let mut conn = backend.connect(&sample_config()).await.unwrap();

        let result = backend
            .execute_query(&mut conn, "sales", None)
            .await
            .unwrap();
        assert_eq!(result.row_count, 3);
        assert_eq!(result.columns.len(), 2);
    }

    #[tokio::test]
    async fn test_query_limit_clause() {
        let backend = MemoryBackend;
        let mut conn = backend.connect(&sample_config()).await.unwrap();

        let result = backend
            .execute_query(&mut conn, "sales limit 2", None)
            .await
            .unwrap();
        assert_eq!(result.row_count, 2);

        let err = backend
            .execute_query(&mut conn, "sales limit many", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::QueryExecution { .. }));
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_a_query_error() {
        let backend = MemoryBackend;
        let mut conn = backend.connect(&sample_config()).await.unwrap();

        let err = backend
            .execute_query(&mut conn, "absent", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::QueryExecution { backend, .. } if backend == "memory"));
    }

    #[tokio::test]
    async fn test_schema_lists_all_datasets() {
        let backend = MemoryBackend;
        let mut conn = backend.connect(&sample_config()).await.unwrap();

        let schema = backend.get_schema(&mut conn).await.unwrap();
        assert_eq!(schema.tables.len(), 2);
        // The empty dataset yields a table with unknown (empty) columns.
        assert!(schema.find_table("empty").unwrap().columns.is_empty());
        assert_eq!(schema.find_table("sales").unwrap().columns.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_config() {
        let backend = MemoryBackend;
        let config = config_from_value(json!({"datasets": "not-a-map"})).unwrap();
        let err = backend.connect(&config).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidConfig { .. }));
    }
}
