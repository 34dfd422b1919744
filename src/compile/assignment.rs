//! User intent: field assignments, aggregations and filters
//!
//! These types capture what the editor UI hands the compiler: dataset
//! fields mapped onto encoding channels, per-field aggregation settings,
//! and filter rules. All containers are ordered so compilation stays a
//! pure, deterministic function of its inputs.

use crate::descriptor::EncodingChannel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Semantic type of a dataset field, as reported by the field catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Number,
    Date,
    Boolean,
}

impl SemanticType {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }

    /// Whether values of this type have a natural axis ordering
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Number | Self::Date)
    }
}

/// A dataset field carried into an assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Field name in the dataset
    pub name: String,
    /// Semantic type from the field catalog
    pub field_type: SemanticType,
}

impl FieldRef {
    /// Create a field reference
    pub fn new(name: impl Into<String>, field_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A user's mapping of dataset fields onto encoding channels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldAssignment {
    channels: BTreeMap<EncodingChannel, Vec<FieldRef>>,
}

impl FieldAssignment {
    /// Create an empty assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a field to a channel (channels accept multiple fields)
    pub fn assign(mut self, channel: EncodingChannel, field: FieldRef) -> Self {
        self.channels.entry(channel).or_default().push(field);
        self
    }

    /// Fields assigned to a channel, empty when unassigned
    pub fn fields(&self, channel: EncodingChannel) -> &[FieldRef] {
        self.channels
            .get(&channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a channel has at least one field
    pub fn has(&self, channel: EncodingChannel) -> bool {
        !self.fields(channel).is_empty()
    }

    /// Iterate assigned channels in fixed channel order
    pub fn iter(&self) -> impl Iterator<Item = (EncodingChannel, &[FieldRef])> {
        self.channels.iter().map(|(c, f)| (*c, f.as_slice()))
    }
}

/// Aggregation function applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    Distinct,
}

impl AggregateOp {
    /// Lowercase name used as the compiled value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::Distinct => "distinct",
        }
    }
}

/// Aggregation settings: per-field functions plus an optional grouping key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationSettings {
    per_field: BTreeMap<String, AggregateOp>,
    group_by: Option<String>,
}

impl AggregationSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a field with the given function
    pub fn aggregate(mut self, field: impl Into<String>, op: AggregateOp) -> Self {
        self.per_field.insert(field.into(), op);
        self
    }

    /// Group results by a field
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Iterate aggregated fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, AggregateOp)> {
        self.per_field.iter().map(|(f, op)| (f, *op))
    }

    /// The grouping field, when set
    pub fn grouping(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    /// Whether no aggregation is configured
    pub fn is_empty(&self) -> bool {
        self.per_field.is_empty() && self.group_by.is_none()
    }
}

/// Comparison operator of a filter rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    In,
}

impl FilterOp {
    /// Lowercase name used as the compiled value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::In => "in",
        }
    }
}

/// One user-entered filter rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    /// Field the rule applies to
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Comparison value
    pub value: Value,
    /// Semantic type of the field
    pub field_type: SemanticType,
    /// Disabled rules are dropped during compilation
    pub enabled: bool,
}

impl FilterRule {
    /// Create an enabled rule
    pub fn new(
        field: impl Into<String>,
        op: FilterOp,
        value: Value,
        field_type: SemanticType,
    ) -> Self {
        Self {
            field: field.into(),
            op,
            value,
            field_type,
            enabled: true,
        }
    }

    /// Disable the rule
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assignment_accumulates_fields_per_channel() {
        let assignment = FieldAssignment::new()
            .assign(EncodingChannel::YAxis, FieldRef::new("revenue", SemanticType::Number))
            .assign(EncodingChannel::YAxis, FieldRef::new("cost", SemanticType::Number));

        assert_eq!(assignment.fields(EncodingChannel::YAxis).len(), 2);
        assert!(assignment.has(EncodingChannel::YAxis));
        assert!(!assignment.has(EncodingChannel::XAxis));
        assert!(assignment.fields(EncodingChannel::Size).is_empty());
    }

    #[test]
    fn test_aggregation_settings_ordering() {
        let settings = AggregationSettings::new()
            .aggregate("zeta", AggregateOp::Sum)
            .aggregate("alpha", AggregateOp::Avg)
            .group_by("region");

        let fields: Vec<_> = settings.iter().map(|(f, _)| f.clone()).collect();
        assert_eq!(fields, vec!["alpha", "zeta"]);
        assert_eq!(settings.grouping(), Some("region"));
    }

    #[test]
    fn test_filter_rule_flags() {
        let rule = FilterRule::new("status", FilterOp::Eq, json!("active"), SemanticType::String);
        assert!(rule.enabled);
        assert!(!rule.clone().disabled().enabled);
        assert_eq!(rule.op.as_str(), "eq");
    }

    #[test]
    fn test_semantic_type_continuity() {
        assert!(SemanticType::Number.is_continuous());
        assert!(SemanticType::Date.is_continuous());
        assert!(!SemanticType::String.is_continuous());
        assert!(!SemanticType::Boolean.is_continuous());
    }
}
