//! Chart.js chart-library backend
//!
//! Chart libraries implement the same plugin contract as data sources, but
//! their substance is static: the config schema and the channel-key table
//! the configuration compiler consumes. `connect` hands out a lightweight
//! handle so lifecycle semantics (liveness, idempotent disconnect) hold
//! uniformly across both instantiations of the mechanism.

use crate::config_schema::{ConfigSchema, FieldSpec};
use crate::descriptor::{BackendCategory, BackendDescriptor, Capabilities, EncodingChannel};
use crate::error::{BackendError, Result};
use crate::plugin::{BackendPlugin, Connection};
use crate::result::{QueryResult, SchemaInfo};
use crate::types::ConnectionConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

pub(crate) const BACKEND_NAME: &str = "chartjs";

/// Chart.js plugin
pub struct ChartJsBackend;

#[async_trait]
impl BackendPlugin for ChartJsBackend {
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
                                json!("area"),
                                json!("pie"),
                                json!("doughnut"),
                                json!("scatter"),
                                json!("radar"),
                            ]),
                    )
                    .field("xField", FieldSpec::string("X-axis field").required())
                    .field("yField", FieldSpec::string("Y-axis field").required())
                    .field("seriesField", FieldSpec::string("Series field"))
                    .field("categoryField", FieldSpec::string("Category field"))
                    .field("valueField", FieldSpec::string("Value field"))
                    .field("sizeField", FieldSpec::string("Size field"))
                    .field("colorField", FieldSpec::string("Color field"))
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
                    .field(
                        "legendPosition",
                        FieldSpec::string("Legend position")
                            .with_default(json!("top"))
                            .one_of([json!("top"), json!("bottom"), json!("left"), json!("right")]),
                    )
                    .field("xLabel", FieldSpec::string("X-axis label"))
                    .field("yLabel", FieldSpec::string("Y-axis label"))
                    .field("stacked", FieldSpec::boolean("Stacked"))
                    .field("width", FieldSpec::number("Width (px)"))
                    .field("height", FieldSpec::number("Height (px)"))
                    .field("animation", FieldSpec::boolean("Animate"))
                    .field("responsive", FieldSpec::boolean("Responsive"))
                    .field("filters", FieldSpec::array("Filters"))
                    .field("groupBy", FieldSpec::string("Group by")),
            )
            .capabilities(Capabilities::new().max_connections(64))
            .channel_key(EncodingChannel::XAxis, "xField")
            .channel_key(EncodingChannel::YAxis, "yField")
            .channel_key(EncodingChannel::Series, "seriesField")
            .channel_key(EncodingChannel::Category, "categoryField")
            .channel_key(EncodingChannel::Value, "valueField")
            .channel_key(EncodingChannel::Size, "sizeField")
            .channel_key(EncodingChannel::Color, "colorField")
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
