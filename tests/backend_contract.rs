//! Contract properties every registered backend must satisfy

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vantage_backends::prelude::*;
use vantage_backends::registry;
use vantage_backends::testing::{mock_config, rows_fixture, MockBackend};
use vantage_backends::types::config_from_value;

/// A valid connection config for each built-in backend
fn connect_config_for(name: &str) -> ConnectionConfig {
    let value = match name {
        "memory" => json!({
            "datasets": {"events": [{"kind": "click", "count": 3}]}
        }),
        "http-api" => json!({
            "base_url": "http://127.0.0.1:1/api"
        }),
        "chartjs" => json!({
            "chartType": "bar", "xField": "a", "yField": "b"
        }),
        "echarts" => json!({
            "chartType": "bar", "xAxis.field": "a", "yAxis.field": "b"
        }),
        other => panic!("no config fixture for backend '{other}'"),
    };
    config_from_value(value).expect("fixture is an object")
}

#[tokio::test]
async fn connect_then_disconnect_leaves_closed_for_every_backend() {
    let registry = registry::initialize();
    let manager = ConnectionManager::new(registry.clone());

    for descriptor in registry.list(None) {
        let config = connect_config_for(&descriptor.name);
        let mut conn = manager
            .connect(&descriptor.name, &config)
            .await
            .unwrap_or_else(|e| panic!("connect to '{}' failed: {e}", descriptor.name));
        assert!(conn.is_connected, "{}", descriptor.name);

        manager.disconnect(&mut conn).await.unwrap();
        assert!(!conn.is_connected, "{}", descriptor.name);

        // Second disconnect is a no-op, not an error.
        manager.disconnect(&mut conn).await.unwrap();
        assert!(!conn.is_connected, "{}", descriptor.name);
    }
}

#[tokio::test]
async fn execute_after_disconnect_fails_closed_for_every_backend() {
    let registry = registry::initialize();
    let manager = ConnectionManager::new(registry.clone());
    let executor = QueryExecutor::new(registry.clone());

    for descriptor in registry.list(None) {
        let config = connect_config_for(&descriptor.name);
        let mut conn = manager.connect(&descriptor.name, &config).await.unwrap();
        manager.disconnect(&mut conn).await.unwrap();

        let err = executor
            .execute_query(&mut conn, "anything", None, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, BackendError::ConnectionClosed(_)),
            "backend '{}' returned {err}",
            descriptor.name
        );
    }
}

#[tokio::test]
async fn initialize_twice_registers_builtins_once() {
    let first = registry::initialize();
    let count = first.len();
    assert!(count >= 4, "built-ins missing: {count}");

    let second = registry::initialize();
    assert_eq!(second.len(), count);
    assert!(Arc::ptr_eq(&first, &second));

    for name in ["memory", "http-api", "chartjs", "echarts"] {
        assert!(first.contains(name), "missing built-in '{name}'");
    }
}

#[tokio::test]
async fn duplicate_registration_fails_on_second_attempt() {
    let mut registry = BackendRegistry::new();
    registry
        .register(Arc::new(MockBackend::new("dup")))
        .unwrap();

    let err = registry
        .register(Arc::new(MockBackend::new("dup")))
        .unwrap_err();
    assert!(matches!(err, BackendError::DuplicateBackend(name) if name == "dup"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_connection_reports_failures_as_false() {
    let mut local = BackendRegistry::new();
    local
        .register(Arc::new(MockBackend::new("broken").fail_connect("simulated refusal")))
        .unwrap();
    local.register(Arc::new(MockBackend::new("healthy"))).unwrap();
    let manager = ConnectionManager::new(Arc::new(local));

    assert!(!manager.test_connection("broken", &mock_config()).await);
    assert!(!manager.test_connection("no-such-backend", &mock_config()).await);
    assert!(manager.test_connection("healthy", &mock_config()).await);

    // Built-in chart libraries probe cleanly with a valid config.
    let manager = ConnectionManager::new(registry::initialize());
    assert!(
        manager
            .test_connection("chartjs", &connect_config_for("chartjs"))
            .await
    );
}

#[tokio::test]
async fn partial_introspection_keeps_all_containers() {
    let mut local = BackendRegistry::new();
    local
        .register(Arc::new(
            MockBackend::new("flaky")
                .with_rows(rows_fixture())
                .with_containers(["alpha", "beta", "gamma", "delta"])
                .failing_container("beta"),
        ))
        .unwrap();
    let registry = Arc::new(local);
    let executor = QueryExecutor::new(registry.clone());

    let mut conn = registry
        .get("flaky")
        .unwrap()
        .connect(&mock_config())
        .await
        .unwrap();
    let schema = executor.get_schema(&mut conn).await.unwrap();

    assert_eq!(schema.tables.len(), 4);
    for table in &schema.tables {
        if table.name == "beta" {
            assert!(table.columns.is_empty());
        } else {
            assert!(!table.columns.is_empty(), "{} lost its columns", table.name);
        }
    }
}

#[tokio::test]
async fn query_timeout_leaves_connection_open() {
    let mut local = BackendRegistry::new();
    local
        .register(Arc::new(MockBackend::new("slow").with_query_delay_ms(10_000)))
        .unwrap();
    let registry = Arc::new(local);
    let executor = QueryExecutor::new(registry.clone());

    let mut conn = registry
        .get("slow")
        .unwrap()
        .connect(&mock_config())
        .await
        .unwrap();

    let err = executor
        .execute_query(&mut conn, "q", None, Some(Duration::from_millis(25)))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::QueryTimeout { .. }));
    assert!(conn.is_connected, "timeout must not close the connection");
}

#[tokio::test]
async fn invalid_config_lists_every_violated_field() {
    let manager = ConnectionManager::new(registry::initialize());
    // Missing base_url AND wrongly typed timeout.
    let config = config_from_value(json!({"timeout_secs": "soon"})).unwrap();

    let err = manager.connect("http-api", &config).await.unwrap_err();
    match err {
        BackendError::InvalidConfig { violations, .. } => {
            let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
            assert!(fields.contains(&"base_url"));
            assert!(fields.contains(&"timeout_secs"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn memory_roundtrip_through_manager_and_executor() {
    let registry = registry::initialize();
    let manager = ConnectionManager::new(registry.clone());
    let executor = QueryExecutor::new(registry);

    let config = config_from_value(json!({
        "datasets": {
            "sales": [
                {"region": "north", "revenue": 1200},
                {"region": "south", "revenue": 950},
            ]
        }
    }))
    .unwrap();

    let mut conn = manager.connect("memory", &config).await.unwrap();
    let result = executor
        .execute_query(&mut conn, "sales", None, Some(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(result.row_count, 2);
    assert_eq!(result.columns.len(), 2);
    let types: Vec<_> = result.columns.iter().map(|c| c.canonical_type).collect();
    assert!(types.contains(&CanonicalType::String));
    assert!(types.contains(&CanonicalType::Number));

    let schema = executor.get_schema(&mut conn).await.unwrap();
    assert_eq!(schema.tables.len(), 1);
    assert_eq!(schema.tables[0].name, "sales");

    manager.disconnect(&mut conn).await.unwrap();
}
