//! Backend descriptors: the capability contract plugins register under
//!
//! A [`BackendDescriptor`] is the immutable, self-describing record the
//! registry holds per backend: unique name, category, configuration schema,
//! capability flags and, for chart-library backends, the encoding-channel
//! key table the configuration compiler consumes. Descriptors are created
//! at registration time and never mutated afterwards.

use crate::config_schema::ConfigSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category a backend belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendCategory {
    /// Relational databases
    Relational,
    /// Document stores
    Document,
    /// Wide-column stores
    WideColumn,
    /// Cloud-native APIs and managed services
    CloudNative,
    /// In-process utility backends (testing, demo data)
    Utility,
    /// Chart-rendering libraries
    ChartLibrary,
}

impl BackendCategory {
    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Relational => "Relational Databases",
            Self::Document => "Document Stores",
            Self::WideColumn => "Wide-Column Stores",
            Self::CloudNative => "Cloud-Native Services",
            Self::Utility => "Utility Backends",
            Self::ChartLibrary => "Chart Libraries",
        }
    }

    /// Whether backends in this category hold data (as opposed to
    /// rendering it)
    pub fn is_data_source(&self) -> bool {
        !matches!(self, Self::ChartLibrary)
    }

    /// All categories
    pub fn all() -> &'static [Self] {
        &[
            Self::Relational,
            Self::Document,
            Self::WideColumn,
            Self::CloudNative,
            Self::Utility,
            Self::ChartLibrary,
        ]
    }
}

impl std::fmt::Display for BackendCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Visual/semantic encoding channels a dataset field can be assigned to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingChannel {
    XAxis,
    YAxis,
    Series,
    Category,
    Value,
    Size,
    Color,
}

impl EncodingChannel {
    /// Kebab-case name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XAxis => "x-axis",
            Self::YAxis => "y-axis",
            Self::Series => "series",
            Self::Category => "category",
            Self::Value => "value",
            Self::Size => "size",
            Self::Color => "color",
        }
    }

    /// All channels, in compilation order
    pub fn all() -> &'static [Self] {
        &[
            Self::XAxis,
            Self::YAxis,
            Self::Series,
            Self::Category,
            Self::Value,
            Self::Size,
            Self::Color,
        ]
    }
}

impl std::fmt::Display for EncodingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static capability flags a backend declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Supports bulk inserts
    pub bulk_insert: bool,
    /// Supports transactions
    pub transactions: bool,
    /// Ceiling on concurrently open connections; the lifecycle manager
    /// rejects (never queues) attempts beyond it
    pub max_concurrent_connections: usize,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            bulk_insert: false,
            transactions: false,
            max_concurrent_connections: 16,
        }
    }
}

impl Capabilities {
    /// Create capabilities with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable bulk inserts
    pub fn bulk_insert(mut self) -> Self {
        self.bulk_insert = true;
        self
    }

    /// Enable transactions
    pub fn transactions(mut self) -> Self {
        self.transactions = true;
        self
    }

    /// Set the concurrent-connection ceiling
    pub fn max_connections(mut self, limit: usize) -> Self {
        self.max_concurrent_connections = limit;
        self
    }
}

/// Immutable, self-describing record for one registered backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique backend name, the registry key
    pub name: String,

    /// Category for grouping and filtered listing
    pub category: BackendCategory,

    /// Declarative configuration schema; validates connection configs and
    /// supplies factory-config defaults
    pub config_schema: ConfigSchema,

    /// Capability flags
    pub capabilities: Capabilities,

    /// Chart-library backends only: encoding channel → backend-specific
    /// configuration key. Channels absent from this table are not
    /// recognized by the backend and are dropped during compilation.
    #[serde(default)]
    pub channel_keys: BTreeMap<EncodingChannel, String>,
}

impl BackendDescriptor {
    /// Create a descriptor with empty schema and default capabilities
    pub fn new(name: impl Into<String>, category: BackendCategory) -> Self {
        Self {
            name: name.into(),
            category,
            config_schema: ConfigSchema::new(),
            capabilities: Capabilities::default(),
            channel_keys: BTreeMap::new(),
        }
    }

    /// Set the configuration schema
    pub fn config_schema(mut self, schema: ConfigSchema) -> Self {
        self.config_schema = schema;
        self
    }

    /// Set the capability flags
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Bind an encoding channel to a backend-specific config key
    pub fn channel_key(mut self, channel: EncodingChannel, key: impl Into<String>) -> Self {
        self.channel_keys.insert(channel, key.into());
        self
    }

    /// Config key bound to the given channel, if the backend recognizes it
    pub fn key_for(&self, channel: EncodingChannel) -> Option<&str> {
        self.channel_keys.get(&channel).map(String::as_str)
    }
}
