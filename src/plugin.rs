//! The backend plugin contract
//!
//! Every backend, data source or chart library, implements [`BackendPlugin`]:
//! five operations plus a static [`BackendDescriptor`]. Dispatch goes through
//! the registry by name; nothing in the core ever inspects a plugin's shape.
//!
//! # Example
//!
//! ```rust,ignore
//! use vantage_backends::prelude::*;
//!
//! pub struct MyBackend;
//!
//! #[async_trait]
//! impl BackendPlugin for MyBackend {
//!     fn descriptor(&self) -> BackendDescriptor {
//!         BackendDescriptor::new("my-backend", BackendCategory::CloudNative)
//!     }
//!
//!     async fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
//!         let client = build_client(config)?;
//!         Ok(Connection::open("my-backend", config.clone(), Box::new(client)))
//!     }
//!
//!     // execute_query / get_schema / disconnect ...
//! }
//! ```

use crate::descriptor::BackendDescriptor;
use crate::error::Result;
use crate::result::{QueryResult, SchemaInfo};
use crate::types::ConnectionConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::any::Any;
use uuid::Uuid;

/// An open connection to a backend
///
/// Owned exclusively by the caller that created it. The `native` handle is
/// opaque plugin state; only the owning plugin downcasts it. `is_connected`
/// is true strictly between a successful `connect` and the next
/// `disconnect`, and is never reset to true afterwards.
pub struct Connection {
    /// Unique id: backend name, creation timestamp, random suffix
    pub id: String,
    /// Name of the backend that opened this connection
    pub backend: String,
    /// The originating, schema-validated configuration
    pub config: ConnectionConfig,
    /// Opaque native-client state owned by the plugin
    pub native: Box<dyn Any + Send + Sync>,
    /// Liveness flag
    pub is_connected: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Completion time of the most recent successful operation. Written
    /// only by this connection's own operations; not comparable across
    /// distinct connections.
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    /// Open a new connection handle for a backend
    pub fn open(
        backend: impl Into<String>,
        config: ConnectionConfig,
        native: Box<dyn Any + Send + Sync>,
    ) -> Self {
        let backend = backend.into();
        let created_at = Utc::now();
        let id = format!(
            "{}-{}-{}",
            backend,
            created_at.timestamp_millis(),
            Uuid::new_v4().simple()
        );
        Self {
            id,
            backend,
            config,
            native,
            is_connected: true,
            created_at,
            last_activity: created_at,
        }
    }

    /// Borrow the native handle as a concrete type
    pub fn native_ref<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref::<T>()
    }

    /// Mutably borrow the native handle as a concrete type
    pub fn native_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.native.downcast_mut::<T>()
    }

    /// Refresh `last_activity` to now
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Fail with `ConnectionClosed` unless the connection is live
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_connected {
            Ok(())
        } else {
            Err(crate::error::BackendError::closed(self.id.clone()))
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("is_connected", &self.is_connected)
            .field("created_at", &self.created_at)
            .field("last_activity", &self.last_activity)
            .finish_non_exhaustive()
    }
}

/// Contract implemented once per backend, data source or chart library
///
/// Implementations must be stateless between calls apart from what they
/// store in a [`Connection`]'s native handle; the same plugin instance
/// serves every connection to its backend.
#[async_trait]
pub trait BackendPlugin: Send + Sync {
    /// The backend's static descriptor
    fn descriptor(&self) -> BackendDescriptor;

    /// Open a connection using a schema-validated configuration
    async fn connect(&self, config: &ConnectionConfig) -> Result<Connection>;

    /// Probe connectivity with a connect → probe → disconnect cycle.
    ///
    /// Never fails: probe errors of any kind (network, auth, malformed
    /// response) are reported as `false`.
    async fn test_connection(&self, config: &ConnectionConfig) -> bool {
        match self.connect(config).await {
            Ok(mut conn) => {
                let _ = self.disconnect(&mut conn).await;
                true
            }
            Err(_) => false,
        }
    }

    /// Execute an opaque query against an open connection.
    ///
    /// The returned result's `execution_time_ms` is overwritten by the
    /// executor with its own wall-clock measurement.
    async fn execute_query(
        &self,
        conn: &mut Connection,
        query: &str,
        params: Option<&[Value]>,
    ) -> Result<QueryResult>;

    /// Enumerate backend-native containers and their columns.
    ///
    /// Per-container introspection failures must be isolated: the failing
    /// container yields a descriptor with an empty column list and
    /// enumeration continues.
    async fn get_schema(&self, conn: &mut Connection) -> Result<SchemaInfo>;

    /// Close the connection. Idempotent: closing an already-closed
    /// connection is a no-op, not an error.
    async fn disconnect(&self, conn: &mut Connection) -> Result<()> {
        conn.is_connected = false;
        Ok(())
    }
}
