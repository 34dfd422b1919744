//! Factory-config compilation
//!
//! [`compile`] maps a user's semantic field assignments plus aggregation,
//! filter and custom settings into a flat, backend-specific configuration
//! map, then fills schema-declared and universal defaults. The stage order
//! is fixed and significant; every stage only adds or overwrites keys.
//!
//! Compilation is a pure function of its declared inputs: identical inputs
//! always yield an identical (byte-identical when serialized) result. All
//! intermediate containers are ordered maps for exactly this reason.

use crate::compile::assignment::{AggregationSettings, FieldAssignment, FilterRule};
use crate::descriptor::BackendDescriptor;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// A compiled, backend-specific rendering configuration.
///
/// Flat key/value map; dotted-path keys (`xAxis.field`) address nested
/// settings in flattened form.
pub type FactoryConfig = BTreeMap<String, Value>;

/// Custom-setting keys honored regardless of the target schema
const WELL_KNOWN_KEYS: &[&str] = &[
    "title",
    "colors",
    "showLegend",
    "showGrid",
    "xLabel",
    "yLabel",
    "width",
    "height",
];

/// Default categorical palette applied when the user picked no colors
const DEFAULT_PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// Compile user intent into a factory configuration for one backend.
///
/// Stages, in order:
///
/// 1. **Channels** — each assigned channel maps to the backend's key for
///    it; one field yields a scalar value, several yield a list. Channels
///    the backend does not recognize are silently dropped.
/// 2. **Aggregations** — `<field>.aggregation` keys plus an optional
///    `groupBy`.
/// 3. **Filters** — enabled rules become a uniform
///    `{field, operator, value, type}` list; disabled rules are dropped.
/// 4. **Custom settings** — merged when the key exists in the target
///    schema or is one of the well-known aliases. Keys containing a dotted
///    path pass through *unchecked*: this is a deliberate escape hatch for
///    backend-specific nested settings the schema does not declare, and
///    such keys reach the rendering layer unvalidated.
/// 5. **Defaults** — schema-declared defaults for required keys still
///    unset, then universal defaults (animation, responsive, palette).
pub fn compile(
    assignment: &FieldAssignment,
    aggregations: &AggregationSettings,
    filters: &[FilterRule],
    custom: &BTreeMap<String, Value>,
    target: &BackendDescriptor,
) -> FactoryConfig {
    let mut config = FactoryConfig::new();

    // Stage 1: channel mapping
    for (channel, fields) in assignment.iter() {
        let Some(key) = target.key_for(channel) else {
            debug!(backend = %target.name, channel = %channel, "channel not recognized, dropped");
            continue;
        };
        if fields.is_empty() {
            continue;
        }
        let value = if fields.len() == 1 {
            Value::String(fields[0].name.clone())
        } else {
            Value::Array(
                fields
                    .iter()
                    .map(|f| Value::String(f.name.clone()))
                    .collect(),
            )
        };
        config.insert(key.to_string(), value);
    }

    // Stage 2: aggregations
    for (field, op) in aggregations.iter() {
        config.insert(
            format!("{field}.aggregation"),
            Value::String(op.as_str().to_string()),
        );
    }
    if let Some(group) = aggregations.grouping() {
        config.insert("groupBy".to_string(), Value::String(group.to_string()));
    }

    // Stage 3: filters
    let compiled_filters: Vec<Value> = filters
        .iter()
        .filter(|rule| rule.enabled)
        .map(|rule| {
            json!({
                "field": rule.field,
                "operator": rule.op.as_str(),
                "value": rule.value,
                "type": rule.field_type.as_str(),
            })
        })
        .collect();
    if !compiled_filters.is_empty() {
        config.insert("filters".to_string(), Value::Array(compiled_filters));
    }

    // Stage 4: custom settings
    for (key, value) in custom {
        let recognized = target.config_schema.contains(key)
            || key.contains('.')
            || WELL_KNOWN_KEYS.contains(&key.as_str());
        if recognized {
            config.insert(key.clone(), value.clone());
        } else {
            debug!(backend = %target.name, key = %key, "custom key not in schema, dropped");
        }
    }

    // Stage 5: defaults
    target.config_schema.apply_defaults(&mut config);
    config
        .entry("animation".to_string())
        .or_insert(Value::Bool(true));
    config
        .entry("responsive".to_string())
        .or_insert(Value::Bool(true));
    config.entry("colors".to_string()).or_insert_with(|| {
        Value::Array(
            DEFAULT_PALETTE
                .iter()
                .map(|c| Value::String((*c).to_string()))
                .collect(),
        )
    });

    debug!(backend = %target.name, keys = config.len(), "factory config compiled");
    config
}
