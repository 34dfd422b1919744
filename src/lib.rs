//! vantage-backends - Backend plugin SDK for the Vantage dashboard platform
//!
//! This crate provides the pluggable backend abstraction Vantage uses to
//! attach external data stores and chart-rendering libraries without the
//! core dispatch logic knowing their internals: one mechanism, instantiated
//! twice.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  vantage-backends (SDK + runtime)               │
//! │  BackendPlugin, BackendDescriptor, BackendRegistry,             │
//! │  ConnectionManager, QueryExecutor, compile/validate             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                    Built-in Backends                            │
//! │  ├── Data sources  (memory, http-api)                           │
//! │  └── Chart libraries (chartjs, echarts)                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │            External collaborators (out of scope)                │
//! │  └── editor UI, auth, rendering widgets                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Data-source usage
//!
//! ```rust,ignore
//! use vantage_backends::prelude::*;
//!
//! let manager = ConnectionManager::default();
//! let executor = QueryExecutor::default();
//!
//! let mut conn = manager.connect("memory", &config).await?;
//! let result = executor.execute_query(&mut conn, "sales", None, None).await?;
//! let schema = executor.get_schema(&mut conn).await?;
//! manager.disconnect(&mut conn).await?;
//! ```
//!
//! # Chart-config compilation
//!
//! ```rust,ignore
//! use vantage_backends::prelude::*;
//!
//! let target = registry::global().descriptor("chartjs")?;
//! let assignment = FieldAssignment::new()
//!     .assign(EncodingChannel::XAxis, FieldRef::new("month", SemanticType::Date))
//!     .assign(EncodingChannel::YAxis, FieldRef::new("revenue", SemanticType::Number));
//!
//! let config = compile(&assignment, &aggregations, &filters, &custom, &target);
//! let outcome = validate(&config, &target, &assignment);
//! ```

// SDK: plugin contract and canonical shapes
pub mod config_schema;
pub mod descriptor;
pub mod plugin;
pub mod result;
pub mod types;

// Error types
pub mod error;

// Runtime: registry, lifecycle, execution
pub mod executor;
pub mod manager;
pub mod registry;

// Configuration compilation engine
pub mod compile;

// Built-in backends
pub mod backends;

// Mock backend and helpers for tests
pub mod testing;

// Re-export core types at crate root for ergonomic use
pub use config_schema::{ConfigSchema, ConfigViolation, FieldSpec, FieldType};
pub use descriptor::{BackendCategory, BackendDescriptor, Capabilities, EncodingChannel};
pub use error::{BackendError, Result};
pub use executor::QueryExecutor;
pub use manager::ConnectionManager;
pub use plugin::{BackendPlugin, Connection};
pub use registry::BackendRegistry;
pub use result::{
    CanonicalType, ColumnDescriptor, QueryResult, SchemaInfo, TableInfo,
};
pub use types::{ConnectionConfig, Record, SensitiveString};

pub use compile::{
    compile, validate, AggregateOp, AggregationSettings, FactoryConfig, FieldAssignment,
    FieldRef, FilterOp, FilterRule, SemanticType, ValidationError, ValidationResult,
    ValidationWarning, WarningSeverity,
};

// Re-export commonly used dependencies for plugin implementations
pub use async_trait::async_trait;
pub use serde_json::Value as JsonValue;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        async_trait,
        compile,
        registry,
        validate,
        AggregateOp,
        AggregationSettings,
        BackendCategory,
        BackendDescriptor,
        BackendError,
        BackendPlugin,
        BackendRegistry,
        CanonicalType,
        Capabilities,
        ColumnDescriptor,
        ConfigSchema,
        ConfigViolation,
        Connection,
        ConnectionConfig,
        ConnectionManager,
        EncodingChannel,
        FactoryConfig,
        FieldAssignment,
        FieldRef,
        FieldSpec,
        FieldType,
        FilterOp,
        FilterRule,
        JsonValue,
        QueryExecutor,
        QueryResult,
        Record,
        Result,
        SchemaInfo,
        SemanticType,
        SensitiveString,
        TableInfo,
        ValidationError,
        ValidationResult,
        ValidationWarning,
        WarningSeverity,
    };

    // Re-export validation and schema derives used by typed plugin configs
    pub use schemars::JsonSchema;
    pub use validator::Validate;
}
