//! JSON-over-HTTP data-source backend
//!
//! Treats a REST-style API as a data source: the connection config names a
//! base URL plus a catalog of named endpoints, and a query addresses an
//! endpoint by name (or a raw path starting with `/`). Responses are
//! normalized into canonical rows from a JSON array of objects, a
//! `{"data": [...]}` envelope, or a single object.
//!
//! Introspection fetches each cataloged endpoint once and infers columns
//! from the first returned row; a failing endpoint yields an empty column
//! list and never aborts enumeration of the rest.

use crate::config_schema::{ConfigSchema, FieldSpec};
use crate::descriptor::{BackendCategory, BackendDescriptor, Capabilities};
use crate::error::{BackendError, Result};
use crate::plugin::{BackendPlugin, Connection};
use crate::result::{infer_columns, QueryResult, SchemaInfo, TableInfo};
use crate::types::{ConnectionConfig, Record, SensitiveString};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use validator::Validate;

pub(crate) const BACKEND_NAME: &str = "http-api";

/// Configuration for the HTTP API backend
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct HttpApiConfig {
    /// Base URL of the API (e.g. `https://api.example.com/v1`)
    #[validate(url)]
    pub base_url: String,

    /// Bearer token attached to every request
    #[serde(default)]
    pub bearer_token: Option<SensitiveString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    /// Named endpoint catalog: endpoint name → path
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,

    /// Additional headers attached to every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Native connection state: a configured client plus the typed config
struct HttpApiState {
    client: reqwest::Client,
    config: HttpApiConfig,
}

/// HTTP API data-source plugin
pub struct HttpApiBackend;

impl HttpApiBackend {
    fn build_state(config: &HttpApiConfig) -> Result<HttpApiState> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                BackendError::connect_failed(BACKEND_NAME, format!("invalid header '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                BackendError::connect_failed(BACKEND_NAME, format!("invalid header value: {e}"))
            })?;
            headers.insert(name, value);
        }
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| {
                    BackendError::connect_failed(BACKEND_NAME, format!("invalid bearer token: {e}"))
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::connect_failed(BACKEND_NAME, e.to_string()))?;

        Ok(HttpApiState {
            client,
            config: config.clone(),
        })
    }

    fn resolve_path<'a>(state: &'a HttpApiState, query: &'a str) -> Result<&'a str> {
        if let Some(path) = state.config.endpoints.get(query) {
            return Ok(path);
        }
        if query.starts_with('/') {
            return Ok(query);
        }
        Err(BackendError::query(
            BACKEND_NAME,
            format!("unknown endpoint '{query}' (not in catalog, not a path)"),
        ))
    }

    async fn fetch_rows(
        state: &HttpApiState,
        path: &str,
        params: Option<&[Value]>,
    ) -> Result<Vec<Record>> {
        let url = format!(
            "{}{}",
            state.config.base_url.trim_end_matches('/'),
            path
        );
        let mut request = state.client.get(&url);

        // Positional params are not meaningful over HTTP; a single object
        // parameter is sent as query-string pairs.
        if let Some([Value::Object(query_params)]) = params {
            for (key, value) in query_params {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.query(&[(key.as_str(), rendered.as_str())]);
            }
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::query(BACKEND_NAME, e.to_string()))?;

        rows_from_json(body).ok_or_else(|| {
            BackendError::query(BACKEND_NAME, format!("response from '{path}' is not row-shaped"))
        })
    }
}

/// Normalize a JSON response body into canonical rows.
///
/// Accepts an array of objects, a `{"data": [...]}` envelope, or a single
/// object. Non-object array items are wrapped as `{"value": item}` so a
/// scalar list still yields one column.
fn rows_from_json(body: Value) -> Option<Vec<Record>> {
    match body {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => obj,
                    other => {
                        let mut row = Record::new();
                        row.insert("value".to_string(), other);
                        row
                    }
                })
                .collect(),
        ),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(data @ Value::Array(_)) => rows_from_json(data),
            Some(other) => {
                obj.insert("data".to_string(), other);
                Some(vec![obj])
            }
            None => Some(vec![obj]),
        },
        _ => None,
    }
}

#[async_trait]
impl BackendPlugin for HttpApiBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor::new(BACKEND_NAME, BackendCategory::CloudNative)
            .config_schema(
                ConfigSchema::new()
                    .field("base_url", FieldSpec::string("Base URL").required())
                    .field("bearer_token", FieldSpec::string("Bearer token"))
                    .field(
                        "timeout_secs",
                        FieldSpec::number("Request timeout (s)").with_default(json!(30)),
                    )
                    .field("endpoints", FieldSpec::object("Endpoint catalog"))
                    .field("headers", FieldSpec::object("Extra headers")),
            )
            .capabilities(Capabilities::new().max_connections(8))
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        let typed: HttpApiConfig = super::typed_config(BACKEND_NAME, config)?;
        let state = Self::build_state(&typed)?;
        debug!(base_url = %typed.base_url, endpoints = typed.endpoints.len(), "http-api connected");
        Ok(Connection::open(BACKEND_NAME, config.clone(), Box::new(state)))
    }

    async fn test_connection(&self, config: &ConnectionConfig) -> bool {
        let Ok(typed) = super::typed_config::<HttpApiConfig>(BACKEND_NAME, config) else {
            return false;
        };
        let Ok(state) = Self::build_state(&typed) else {
            return false;
        };
        match state.client.get(&typed.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn execute_query(
        &self,
        conn: &mut Connection,
        query: &str,
        params: Option<&[Value]>,
    ) -> Result<QueryResult> {
        conn.ensure_open()?;
        let state = conn
            .native_ref::<HttpApiState>()
            .ok_or_else(|| BackendError::query(BACKEND_NAME, "connection has no native state"))?;

        let path = Self::resolve_path(state, query)?;
        let rows = Self::fetch_rows(state, path, params).await?;
        Ok(QueryResult::from_rows(rows))
    }

    async fn get_schema(&self, conn: &mut Connection) -> Result<SchemaInfo> {
        conn.ensure_open()?;
        let state = conn
            .native_ref::<HttpApiState>()
            .ok_or_else(|| BackendError::query(BACKEND_NAME, "connection has no native state"))?;

        let mut schema = SchemaInfo::new();
        for (name, path) in &state.config.endpoints {
            let table = match Self::fetch_rows(state, path, None).await {
                Ok(rows) => TableInfo::new(name.clone(), infer_columns(&rows)),
                Err(err) => {
                    // Partial schema information beats total failure.
                    warn!(endpoint = %name, error = %err, "endpoint introspection failed");
                    TableInfo::empty(name.clone())
                }
            };
            schema.tables.push(table.in_schema(state.config.base_url.clone()));
        }
        Ok(schema)
    }
}
