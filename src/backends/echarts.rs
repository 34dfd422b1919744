//! Apache ECharts chart-library backend
//!
//! ECharts nests its options, so its channel keys are dotted paths
//! (`xAxis.field`) in the flattened factory config. The size channel is
//! deliberately unbound: assignments to it are dropped during compilation
//! for this backend.

use crate::config_schema::{ConfigSchema, FieldSpec};
use crate::descriptor::{BackendCategory, BackendDescriptor, Capabilities, EncodingChannel};
use crate::error::{BackendError, Result};
use crate::plugin::{BackendPlugin, Connection};
use crate::result::{QueryResult, SchemaInfo};
use crate::types::ConnectionConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

pub(crate) const BACKEND_NAME: &str = "echarts";

/// Apache ECharts plugin
pub struct EChartsBackend;

#[async_trait]
impl BackendPlugin for EChartsBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor::new(BACKEND_NAME, BackendCategory::ChartLibrary)
            .config_schema(
                ConfigSchema::new()
                    .field(
                        "chartType",
                        FieldSpec::string("Chart type")
                            .required()
                            .with_default(json!("bar"))
                            .one_of([
                                json!("bar"),
                                json!("line"),
                                json!("pie"),
                                json!("scatter"),
                                json!("heatmap"),
                                json!("funnel"),
                            ]),
                    )
                    .field("xAxis.field", FieldSpec::string("X-axis field").required())
                    .field("yAxis.field", FieldSpec::string("Y-axis field").required())
                    .field("series.field", FieldSpec::string("Series field"))
                    .field("category.field", FieldSpec::string("Category field"))
                    .field("value.field", FieldSpec::string("Value field"))
                    .field("color.field", FieldSpec::string("Color field"))
                    .field(
                        "theme",
                        FieldSpec::string("Theme")
                            .required()
                            .with_default(json!("light"))
                            .one_of([json!("light"), json!("dark")]),
                    )
                    .field("title", FieldSpec::string("Title"))
                    .field("colors", FieldSpec::array("Color palette"))
                    .field(
                        "showLegend",
                        FieldSpec::boolean("Show legend").required().with_default(json!(true)),
                    )
                    .field(
                        "showGrid",
                        FieldSpec::boolean("Show grid").required().with_default(json!(true)),
                    )
                    .field("xLabel", FieldSpec::string("X-axis label"))
                    .field("yLabel", FieldSpec::string("Y-axis label"))
                    .field("toolbox", FieldSpec::boolean("Show toolbox"))
                    .field("width", FieldSpec::number("Width (px)"))
                    .field("height", FieldSpec::number("Height (px)"))
                    .field("animation", FieldSpec::boolean("Animate"))
                    .field("responsive", FieldSpec::boolean("Responsive"))
                    .field("filters", FieldSpec::array("Filters"))
                    .field("groupBy", FieldSpec::string("Group by")),
            )
            .capabilities(Capabilities::new().max_connections(64))
            .channel_key(EncodingChannel::XAxis, "xAxis.field")
            .channel_key(EncodingChannel::YAxis, "yAxis.field")
            .channel_key(EncodingChannel::Series, "series.field")
            .channel_key(EncodingChannel::Category, "category.field")
            .channel_key(EncodingChannel::Value, "value.field")
            .channel_key(EncodingChannel::Color, "color.field")
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        Ok(Connection::open(BACKEND_NAME, config.clone(), Box::new(())))
    }

    async fn execute_query(
        &self,
        conn: &mut Connection,
        _query: &str,
        _params: Option<&[Value]>,
    ) -> Result<QueryResult> {
        conn.ensure_open()?;
        Err(BackendError::query(
            BACKEND_NAME,
            "chart-library backends do not execute queries",
        ))
    }

    async fn get_schema(&self, conn: &mut Connection) -> Result<SchemaInfo> {
        conn.ensure_open()?;
        Ok(SchemaInfo::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, AggregationSettings, FieldAssignment, FieldRef, SemanticType};
    use std::collections::BTreeMap;

    #[test]
    fn test_size_channel_is_unbound() {
        let descriptor = EChartsBackend.descriptor();
        assert!(descriptor.key_for(EncodingChannel::Size).is_none());
        assert_eq!(descriptor.key_for(EncodingChannel::XAxis), Some("xAxis.field"));
    }

    #[test]
    fn test_compilation_uses_dotted_keys() {
        let assignment = FieldAssignment::new()
            .assign(EncodingChannel::XAxis, FieldRef::new("month", SemanticType::Date))
            .assign(EncodingChannel::YAxis, FieldRef::new("total", SemanticType::Number))
            .assign(EncodingChannel::Size, FieldRef::new("pop", SemanticType::Number));

        let config = compile(
            &assignment,
            &AggregationSettings::new(),
            &[],
            &BTreeMap::new(),
            &EChartsBackend.descriptor(),
        );

        assert_eq!(config.get("xAxis.field"), Some(&json!("month")));
        assert_eq!(config.get("yAxis.field"), Some(&json!("total")));
        // Size is unbound for echarts, so "pop" appears nowhere.
        assert!(!config.values().any(|v| v == &json!("pop")));
        // Schema default for the required theme key.
        assert_eq!(config.get("theme"), Some(&json!("light")));
    }
}
