//! Common types for vantage-backends
//!
//! Shared type aliases for configuration and record maps, plus the
//! [`SensitiveString`] wrapper used for credentials in connection configs.

use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// A raw connection configuration: a key/value map validated against a
/// backend's [`ConfigSchema`](crate::config_schema::ConfigSchema) before
/// the plugin's `connect` is invoked.
///
/// Created per connection attempt; the successful
/// [`Connection`](crate::plugin::Connection) keeps the originating copy.
pub type ConnectionConfig = serde_json::Map<String, serde_json::Value>;

/// A canonical record: one normalized row of a query result.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Build a [`ConnectionConfig`] from any JSON value, returning `None` when
/// the value is not an object.
pub fn config_from_value(value: serde_json::Value) -> Option<ConnectionConfig> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

/// A wrapper around `SecretString` for credentials in backend configs.
///
/// - Redacts the value in `Debug` and `Display` output
/// - Serializes as `"***REDACTED***"` so config dumps never leak secrets
/// - `expose_secret()` grants access when the value is actually needed
///   (e.g. building an `Authorization` header)
#[derive(Clone)]
pub struct SensitiveString(SecretString);

impl SensitiveString {
    /// Create a new sensitive string from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into().into_boxed_str()))
    }

    /// Expose the secret value. Use sparingly.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for SensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SensitiveString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***REDACTED***")
    }
}

impl<'de> Deserialize<'de> for SensitiveString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

impl JsonSchema for SensitiveString {
    fn schema_name() -> String {
        "SensitiveString".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema = gen.subschema_for::<String>();
        if let schemars::schema::Schema::Object(obj) = &mut schema {
            obj.format = Some("password".to_string());
            obj.metadata().description =
                Some("Sensitive value (passwords, API keys). Redacted in logs.".to_string());
        }
        schema
    }
}
