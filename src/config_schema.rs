//! Declarative per-backend configuration schemas
//!
//! Every backend descriptor carries a [`ConfigSchema`]: a flat map from
//! field name to [`FieldSpec`] (`{type, title, required, default?, enum?}`).
//! The same schema serves two purposes:
//!
//! - connection-config validation before a plugin's `connect` runs
//!   (all violations are reported, never just the first)
//! - default application for compiled factory configurations
//!
//! Dotted field names (`xAxis.field`) are permitted; they address nested
//! settings in a flattened form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The declared type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// Whether a JSON value matches this declared type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    /// Lowercase name used in violation messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Declaration of a single configuration field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Declared value type
    pub field_type: FieldType,

    /// Human-readable title for editors
    pub title: String,

    /// Whether the field must be present in a connection config
    #[serde(default)]
    pub required: bool,

    /// Default value, applied to factory configs for required fields
    /// still unset after compilation
    #[serde(default)]
    pub default: Option<Value>,

    /// Closed set of permitted values, when applicable
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
}

impl FieldSpec {
    /// Create a field spec of the given type
    pub fn new(field_type: FieldType, title: impl Into<String>) -> Self {
        Self {
            field_type,
            title: title.into(),
            required: false,
            default: None,
            allowed: None,
        }
    }

    /// String field shorthand
    pub fn string(title: impl Into<String>) -> Self {
        Self::new(FieldType::String, title)
    }

    /// Number field shorthand
    pub fn number(title: impl Into<String>) -> Self {
        Self::new(FieldType::Number, title)
    }

    /// Boolean field shorthand
    pub fn boolean(title: impl Into<String>) -> Self {
        Self::new(FieldType::Boolean, title)
    }

    /// Object field shorthand
    pub fn object(title: impl Into<String>) -> Self {
        Self::new(FieldType::Object, title)
    }

    /// Array field shorthand
    pub fn array(title: impl Into<String>) -> Self {
        Self::new(FieldType::Array, title)
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restrict the field to a closed set of values
    pub fn one_of<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.allowed = Some(values.into_iter().collect());
        self
    }
}

/// A single configuration violation: which field, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigViolation {
    /// The violated field name
    pub field: String,
    /// Why the field is invalid
    pub message: String,
}

impl ConfigViolation {
    /// Create a new violation
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Convert `validator` crate errors into the uniform violation list.
///
/// Plugins deserialize raw configs into typed structs and validate them
/// with `validator`; this keeps their error shape identical to schema-level
/// violations.
pub fn violations_from_validator(errors: &validator::ValidationErrors) -> Vec<ConfigViolation> {
    let mut out: Vec<ConfigViolation> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed '{}' validation", e.code));
                ConfigViolation::new(field.to_string(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Declarative configuration schema for one backend
///
/// Field order is deterministic (sorted by name), so validation output and
/// default application are stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl ConfigSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field declaration
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Whether the schema declares a field with this name
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Look up a field declaration
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Iterate declared fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.fields.iter()
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a connection config against this schema.
    ///
    /// Returns *every* violation: missing required fields, type mismatches
    /// and values outside a field's allowed set. Keys not declared by the
    /// schema are tolerated; plugins may accept extras.
    pub fn validate(&self, config: &crate::types::ConnectionConfig) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();

        for (name, spec) in &self.fields {
            match config.get(name) {
                None | Some(Value::Null) => {
                    if spec.required && spec.default.is_none() {
                        violations.push(ConfigViolation::new(name, "required field is missing"));
                    }
                }
                Some(value) => {
                    if !spec.field_type.matches(value) {
                        violations.push(ConfigViolation::new(
                            name,
                            format!("expected {}", spec.field_type.as_str()),
                        ));
                    } else if let Some(allowed) = &spec.allowed {
                        if !allowed.contains(value) {
                            let permitted = allowed
                                .iter()
                                .map(|v| v.to_string())
                                .collect::<Vec<_>>()
                                .join(", ");
                            violations.push(ConfigViolation::new(
                                name,
                                format!("must be one of [{}]", permitted),
                            ));
                        }
                    }
                }
            }
        }

        violations
    }

    /// Apply schema-declared defaults for required fields still unset.
    ///
    /// Used as the final compilation stage for factory configs; only adds
    /// keys, never overwrites one already present.
    pub fn apply_defaults(&self, target: &mut BTreeMap<String, Value>) {
        for (name, spec) in &self.fields {
            if spec.required && !target.contains_key(name) {
                if let Some(default) = &spec.default {
                    target.insert(name.clone(), default.clone());
                }
            }
        }
    }
}
