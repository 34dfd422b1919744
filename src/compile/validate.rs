//! Factory-config validation
//!
//! Validation is independent of compilation and may be run against a
//! hand-built config. Errors block use of the configuration; warnings are
//! advisory and never do.

use crate::compile::assignment::FieldAssignment;
use crate::compile::compiler::FactoryConfig;
use crate::descriptor::{BackendDescriptor, EncodingChannel};
use serde::{Deserialize, Serialize};

/// Severity of a validation warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Low,
    Medium,
}

/// A blocking validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field or channel the problem concerns
    pub field: String,
    /// What is wrong
    pub message: String,
}

impl ValidationError {
    /// Create an error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A non-blocking validation concern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Field or channel the concern relates to
    pub field: String,
    /// What to look at
    pub message: String,
    /// How much it matters
    pub severity: WarningSeverity,
}

impl ValidationWarning {
    /// Create a warning
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Outcome of validating a factory configuration
///
/// Carries the complete list of problems, never just the first, so a UI
/// can highlight everything at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the configuration is usable
    pub valid: bool,
    /// Blocking problems
    pub errors: Vec<ValidationError>,
    /// Advisory concerns
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// A passing result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Consume the outcome, failing with `BackendError::Validation` when
    /// errors block use. Warnings never block.
    pub fn ensure_valid(self) -> crate::error::Result<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(crate::error::BackendError::Validation(self))
        }
    }
}

/// Chart types that encode one categorical dimension against one value
const CATEGORY_CHART_TYPES: &[&str] = &["pie", "doughnut", "donut", "funnel"];

/// Chart types whose x-axis is expected to be continuous
const LINE_CHART_TYPES: &[&str] = &["line", "area", "spline"];

/// Validate a factory configuration for a target backend.
///
/// Checks, in order: required channel assignments (x-axis and y-axis),
/// presence of the compiled key for each required channel the backend
/// recognizes, then backend-specific structural rules keyed off the
/// configured chart type.
pub fn validate(
    config: &FactoryConfig,
    target: &BackendDescriptor,
    assignment: &FieldAssignment,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Required channels must be assigned.
    for channel in [EncodingChannel::XAxis, EncodingChannel::YAxis] {
        if !assignment.has(channel) {
            errors.push(ValidationError::new(
                channel.as_str(),
                format!("{} field assignment is required", channel.as_str()),
            ));
        }
    }

    // The compiled config must carry the backend's key for each required
    // channel it recognizes.
    for channel in [EncodingChannel::XAxis, EncodingChannel::YAxis] {
        if let Some(key) = target.key_for(channel) {
            if assignment.has(channel) && !config.contains_key(key) {
                errors.push(ValidationError::new(
                    key,
                    format!("compiled config is missing the {} key", channel.as_str()),
                ));
            }
        }
    }

    // Structural rules keyed off the chart type.
    let chart_type = config
        .get("chartType")
        .and_then(|v| v.as_str())
        .or_else(|| {
            target
                .config_schema
                .get("chartType")
                .and_then(|spec| spec.default.as_ref())
                .and_then(|v| v.as_str())
        })
        .unwrap_or("");

    if CATEGORY_CHART_TYPES.contains(&chart_type) {
        if !assignment.has(EncodingChannel::Category) {
            errors.push(ValidationError::new(
                "category",
                format!("{chart_type} charts require a category field"),
            ));
        }
        if !assignment.has(EncodingChannel::Value) {
            errors.push(ValidationError::new(
                "value",
                format!("{chart_type} charts require a value field"),
            ));
        }
    }

    if LINE_CHART_TYPES.contains(&chart_type) {
        if let Some(x) = assignment.fields(EncodingChannel::XAxis).first() {
            if !x.field_type.is_continuous() {
                warnings.push(ValidationWarning::new(
                    "x-axis",
                    format!(
                        "{chart_type} charts usually plot a date or number on the x-axis, got {}",
                        x.field_type.as_str()
                    ),
                    WarningSeverity::Medium,
                ));
            }
        }
    }

    ValidationResult::finish(errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::assignment::{FieldRef, SemanticType};
    use crate::compile::compiler::compile;
    use crate::compile::AggregationSettings;
    use crate::config_schema::{ConfigSchema, FieldSpec};
    use crate::descriptor::BackendCategory;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn chart_backend() -> BackendDescriptor {
        BackendDescriptor::new("chartlib", BackendCategory::ChartLibrary)
            .config_schema(
                ConfigSchema::new()
                    .field(
                        "chartType",
                        FieldSpec::string("Chart type")
                            .required()
                            .with_default(json!("bar")),
                    )
                    .field("xField", FieldSpec::string("X field").required())
                    .field("yField", FieldSpec::string("Y field").required()),
            )
            .channel_key(EncodingChannel::XAxis, "xField")
            .channel_key(EncodingChannel::YAxis, "yField")
            .channel_key(EncodingChannel::Category, "categoryField")
            .channel_key(EncodingChannel::Value, "valueField")
    }

    fn xy_assignment() -> FieldAssignment {
        FieldAssignment::new()
            .assign(EncodingChannel::XAxis, FieldRef::new("ts", SemanticType::Date))
            .assign(EncodingChannel::YAxis, FieldRef::new("value", SemanticType::Number))
    }

    fn compiled(assignment: &FieldAssignment) -> FactoryConfig {
        compile(
            assignment,
            &AggregationSettings::new(),
            &[],
            &BTreeMap::new(),
            &chart_backend(),
        )
    }

    #[test]
    fn test_valid_config_passes() {
        let assignment = xy_assignment();
        let result = validate(&compiled(&assignment), &chart_backend(), &assignment);
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_ensure_valid_carries_full_result() {
        let assignment = FieldAssignment::new();
        let result = validate(&FactoryConfig::new(), &chart_backend(), &assignment);

        match result.ensure_valid() {
            Err(crate::error::BackendError::Validation(inner)) => {
                assert!(inner.errors.len() >= 2);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_y_axis_is_an_error() {
        let assignment = FieldAssignment::new()
            .assign(EncodingChannel::XAxis, FieldRef::new("ts", SemanticType::Date));
        let result = validate(&compiled(&assignment), &chart_backend(), &assignment);

        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("y-axis")));
    }

    #[test]
    fn test_missing_compiled_key_is_an_error() {
        let assignment = xy_assignment();
        // Hand-built config without the yField the backend expects.
        let mut config = FactoryConfig::new();
        config.insert("xField".to_string(), json!("ts"));

        let result = validate(&config, &chart_backend(), &assignment);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.field == "yField"));
    }

    #[test]
    fn test_category_chart_requires_category_and_value() {
        let assignment = xy_assignment();
        let mut config = compiled(&assignment);
        config.insert("chartType".to_string(), json!("pie"));

        let result = validate(&config, &chart_backend(), &assignment);
        assert!(!result.valid);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"category"));
        assert!(fields.contains(&"value"));
    }

    #[test]
    fn test_line_chart_with_string_x_warns_but_passes() {
        let assignment = FieldAssignment::new()
            .assign(EncodingChannel::XAxis, FieldRef::new("label", SemanticType::String))
            .assign(EncodingChannel::YAxis, FieldRef::new("value", SemanticType::Number));
        let mut config = compiled(&assignment);
        config.insert("chartType".to_string(), json!("line"));

        let result = validate(&config, &chart_backend(), &assignment);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, WarningSeverity::Medium);
    }
}
