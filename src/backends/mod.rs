//! Built-in backends
//!
//! Data sources:
//! - [`memory`] — in-process named datasets (category: utility)
//! - [`http_api`] — JSON-over-HTTP API source (category: cloud-native)
//!
//! Chart libraries:
//! - [`chartjs`] — Chart.js
//! - [`echarts`] — Apache ECharts
//!
//! All of them are registered by `registry::initialize`; custom plugins
//! register alongside them on a caller-owned
//! [`BackendRegistry`](crate::registry::BackendRegistry).

pub mod chartjs;
pub mod echarts;
pub mod http_api;
pub mod memory;

pub use chartjs::ChartJsBackend;
pub use echarts::EChartsBackend;
pub use http_api::HttpApiBackend;
pub use memory::MemoryBackend;

use crate::config_schema::{violations_from_validator, ConfigViolation};
use crate::error::{BackendError, Result};
use crate::plugin::BackendPlugin;
use crate::types::ConnectionConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// The built-in plugin set, in registration order
pub fn builtins() -> Vec<Arc<dyn BackendPlugin>> {
    vec![
        Arc::new(MemoryBackend),
        Arc::new(HttpApiBackend),
        Arc::new(ChartJsBackend),
        Arc::new(EChartsBackend),
    ]
}

/// Deserialize a raw connection config into a typed plugin config and run
/// its field validations, reporting every violation.
pub(crate) fn typed_config<T>(backend: &str, config: &ConnectionConfig) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let typed: T = serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
        BackendError::invalid_config(backend, vec![ConfigViolation::new("<config>", e.to_string())])
    })?;
    typed
        .validate()
        .map_err(|e| BackendError::invalid_config(backend, violations_from_validator(&e)))?;
    Ok(typed)
}
