//! Testing utilities
//!
//! [`MockBackend`] is an in-process plugin with injectable failures so the
//! registry, lifecycle manager, executor and contract properties can be
//! tested without any external system.
//!
//! # Example
//!
//! ```rust,ignore
//! use vantage_backends::testing::{mock_config, MockBackend};
//!
//! let backend = MockBackend::new("flaky")
//!     .with_containers(["orders", "users"])
//!     .failing_container("users")
//!     .fail_query("simulated outage");
//! ```

use crate::descriptor::{BackendCategory, BackendDescriptor, Capabilities};
use crate::error::{BackendError, Result};
use crate::plugin::{BackendPlugin, Connection};
use crate::result::{infer_columns, QueryResult, SchemaInfo, TableInfo};
use crate::types::{config_from_value, ConnectionConfig, Record};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// An empty config accepted by [`MockBackend`]
pub fn mock_config() -> ConnectionConfig {
    ConnectionConfig::new()
}

/// Three canned rows with stable keys, for result-shape assertions
pub fn rows_fixture() -> Vec<Record> {
    [
        json!({"id": 1, "name": "alpha", "score": 10.5}),
        json!({"id": 2, "name": "beta", "score": 7.25}),
        json!({"id": 3, "name": "gamma", "score": null}),
    ]
    .into_iter()
    .filter_map(config_from_value)
    .collect()
}

/// A configurable in-process backend for tests
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    category: BackendCategory,
    capabilities: Capabilities,
    rows: Vec<Record>,
    containers: Vec<(String, bool)>,
    connect_error: Option<String>,
    query_error: Option<String>,
    query_delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock backend with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: BackendCategory::Utility,
            capabilities: Capabilities::default(),
            rows: Vec::new(),
            containers: Vec::new(),
            connect_error: None,
            query_error: None,
            query_delay: None,
        }
    }

    /// Override the backend category
    pub fn with_category(mut self, category: BackendCategory) -> Self {
        self.category = category;
        self
    }

    /// Override the concurrent-connection ceiling
    pub fn with_max_connections(mut self, limit: usize) -> Self {
        self.capabilities = self.capabilities.max_connections(limit);
        self
    }

    /// Set the rows every query returns
    pub fn with_rows(mut self, rows: Vec<Record>) -> Self {
        self.rows = rows;
        self
    }

    /// Declare containers for schema introspection
    pub fn with_containers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.containers = names.into_iter().map(|n| (n.into(), false)).collect();
        self
    }

    /// Make introspection of one declared container fail
    pub fn failing_container(mut self, name: &str) -> Self {
        for (container, fails) in &mut self.containers {
            if container == name {
                *fails = true;
            }
        }
        self
    }

    /// Make `connect` fail with the given message
    pub fn fail_connect(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Make `execute_query` fail with the given message
    pub fn fail_query(mut self, message: impl Into<String>) -> Self {
        self.query_error = Some(message.into());
        self
    }

    /// Delay every query, for timeout tests
    pub fn with_query_delay_ms(mut self, millis: u64) -> Self {
        self.query_delay = Some(Duration::from_millis(millis));
        self
    }
}

#[async_trait]
impl BackendPlugin for MockBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor::new(self.name.clone(), self.category)
            .capabilities(self.capabilities)
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        if let Some(message) = &self.connect_error {
            return Err(BackendError::connect_failed(&self.name, message));
        }
        Ok(Connection::open(&self.name, config.clone(), Box::new(())))
    }

    async fn execute_query(
        &self,
        conn: &mut Connection,
        _query: &str,
        _params: Option<&[Value]>,
    ) -> Result<QueryResult> {
        conn.ensure_open()?;
        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.query_error {
            return Err(BackendError::query(&self.name, message));
        }
        Ok(QueryResult::from_rows(self.rows.clone()))
    }

    async fn get_schema(&self, conn: &mut Connection) -> Result<SchemaInfo> {
        conn.ensure_open()?;
        let mut schema = SchemaInfo::new();
        for (name, fails) in &self.containers {
            let table = if *fails {
                TableInfo::empty(name.clone())
            } else {
                TableInfo::new(name.clone(), infer_columns(&self.rows))
            };
            schema.tables.push(table.in_schema(self.name.clone()));
        }
        Ok(schema)
    }
}
