//! Connection lifecycle management
//!
//! The [`ConnectionManager`] is the front door for opening, probing and
//! closing connections. It validates configurations against the backend's
//! schema before delegating, enforces each backend's declared
//! concurrent-connection ceiling, and keeps `disconnect` idempotent.
//!
//! Per-backend live-connection counters are the only shared state; they are
//! touched strictly outside of awaits, so no lock is ever held across
//! backend I/O.

use crate::error::{BackendError, Result};
use crate::plugin::Connection;
use crate::registry::BackendRegistry;
use crate::types::ConnectionConfig;
use metrics::counter;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Manages connection lifecycles across all registered backends
pub struct ConnectionManager {
    registry: Arc<BackendRegistry>,
    active: Mutex<HashMap<String, usize>>,
}

impl ConnectionManager {
    /// Create a manager over the given registry
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Open a connection to a named backend.
    ///
    /// The raw config is validated against the descriptor's schema first;
    /// `InvalidConfig` carries every violated field. Attempts beyond the
    /// backend's `max_concurrent_connections` ceiling are rejected with
    /// `TooManyConnections`, never queued — backoff is the caller's job.
    pub async fn connect(&self, backend: &str, config: &ConnectionConfig) -> Result<Connection> {
        let plugin = self.registry.get(backend)?;
        let descriptor = plugin.descriptor();

        let violations = descriptor.config_schema.validate(config);
        if !violations.is_empty() {
            return Err(BackendError::invalid_config(backend, violations));
        }

        self.reserve_slot(backend, descriptor.capabilities.max_concurrent_connections)?;

        match plugin.connect(config).await {
            Ok(conn) => {
                counter!("vantage.connections.opened", "backend" => backend.to_string())
                    .increment(1);
                debug!(backend, connection = %conn.id, "connection opened");
                Ok(conn)
            }
            Err(err) => {
                self.release_slot(backend);
                warn!(backend, error = %err, "connect failed");
                Err(err)
            }
        }
    }

    /// Probe a backend with a connect → probe → disconnect cycle.
    ///
    /// Never fails: unknown backends, invalid configs and probe errors of
    /// any kind are all reported as `false`.
    pub async fn test_connection(&self, backend: &str, config: &ConnectionConfig) -> bool {
        let Ok(plugin) = self.registry.get(backend) else {
            return false;
        };
        if !plugin.descriptor().config_schema.validate(config).is_empty() {
            return false;
        }
        plugin.test_connection(config).await
    }

    /// Close a connection. Idempotent: closing an already-closed
    /// connection is a no-op, and the live-connection count is only
    /// decremented once.
    pub async fn disconnect(&self, conn: &mut Connection) -> Result<()> {
        if !conn.is_connected {
            return Ok(());
        }

        let plugin = self.registry.get(&conn.backend)?;
        plugin.disconnect(conn).await?;
        conn.is_connected = false;
        self.release_slot(&conn.backend);
        counter!("vantage.connections.closed", "backend" => conn.backend.clone()).increment(1);
        debug!(backend = %conn.backend, connection = %conn.id, "connection closed");
        Ok(())
    }

    /// Number of live connections currently tracked for a backend
    pub fn active_connections(&self, backend: &str) -> usize {
        self.active.lock().get(backend).copied().unwrap_or(0)
    }

    fn reserve_slot(&self, backend: &str, limit: usize) -> Result<()> {
        let mut active = self.active.lock();
        let count = active.entry(backend.to_string()).or_insert(0);
        if *count >= limit {
            return Err(BackendError::too_many(backend, limit));
        }
        *count += 1;
        Ok(())
    }

    fn release_slot(&self, backend: &str) {
        let mut active = self.active.lock();
        if let Some(count) = active.get_mut(backend) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(backend);
            }
        }
    }
}

impl Default for ConnectionManager {
    /// A manager over the process-wide registry
    fn default() -> Self {
        Self::new(crate::registry::global())
    }
}
