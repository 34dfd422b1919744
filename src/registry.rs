//! Backend registry: name-keyed plugin lookup
//!
//! The registry holds, per backend name, a capability-tagged descriptor and
//! the plugin implementing its operations. Writes only happen while the
//! registry is being populated; once [`initialize`] has run, the process-wide
//! registry is immutable and safe for concurrent reads without locking.
//!
//! # Example
//!
//! ```rust,ignore
//! use vantage_backends::registry;
//!
//! let registry = registry::initialize();
//! let plugin = registry.get("memory")?;
//! let charts = registry.list(Some(BackendCategory::ChartLibrary));
//! ```

use crate::descriptor::{BackendCategory, BackendDescriptor};
use crate::error::{BackendError, Result};
use crate::plugin::BackendPlugin;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Registry of available backends
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn BackendPlugin>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register a plugin under its descriptor's name.
    ///
    /// Fails with `DuplicateBackend` when the name is already taken; the
    /// existing registration is left untouched.
    pub fn register(&mut self, plugin: Arc<dyn BackendPlugin>) -> Result<()> {
        let name = plugin.descriptor().name;
        if self.backends.contains_key(&name) {
            return Err(BackendError::duplicate(name));
        }
        self.backends.insert(name, plugin);
        Ok(())
    }

    /// Look up a plugin by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn BackendPlugin>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::unknown(name))
    }

    /// Look up a backend's descriptor by name
    pub fn descriptor(&self, name: &str) -> Result<BackendDescriptor> {
        Ok(self.get(name)?.descriptor())
    }

    /// List descriptors, optionally filtered by category, sorted by name
    pub fn list(&self, category: Option<BackendCategory>) -> Vec<BackendDescriptor> {
        let mut descriptors: Vec<_> = self
            .backends
            .values()
            .map(|p| p.descriptor())
            .filter(|d| category.map_or(true, |c| d.category == c))
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Whether a backend is registered under this name
    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.backends.keys().collect();
        names.sort();
        f.debug_struct("BackendRegistry")
            .field("backends", &names)
            .finish()
    }
}

static GLOBAL: OnceLock<Arc<BackendRegistry>> = OnceLock::new();

/// Initialize the process-wide registry with the built-in backends.
///
/// Idempotent and race-safe: even when several callers hit the first
/// initialization simultaneously, at most one registration sequence runs;
/// every other call observes the finished registry. Subsequent calls are
/// no-ops returning the same instance.
pub fn initialize() -> Arc<BackendRegistry> {
    GLOBAL
        .get_or_init(|| {
            let mut registry = BackendRegistry::new();
            for plugin in crate::backends::builtins() {
                let name = plugin.descriptor().name;
                if let Err(err) = registry.register(plugin) {
                    // Built-in names are unique; a duplicate here means a
                    // broken build, not a runtime condition worth aborting.
                    warn!(backend = %name, error = %err, "skipping built-in backend");
                }
            }
            info!(backends = registry.len(), "backend registry initialized");
            Arc::new(registry)
        })
        .clone()
}

/// The process-wide registry, initializing it on first use
pub fn global() -> Arc<BackendRegistry> {
    initialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[test]
    fn test_register_and_get() {
        let mut registry = BackendRegistry::new();
        assert!(registry.is_empty());

        registry
            .register(Arc::new(MockBackend::new("mock-a")))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("mock-a"));
        assert!(registry.get("mock-a").is_ok());
        assert!(matches!(
            registry.get("absent"),
            Err(BackendError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = BackendRegistry::new();
        registry
            .register(Arc::new(MockBackend::new("mock-a")))
            .unwrap();
        let err = registry
            .register(Arc::new(MockBackend::new("mock-a")))
            .unwrap_err();
        assert!(matches!(err, BackendError::DuplicateBackend(name) if name == "mock-a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_filters_by_category() {
        use crate::descriptor::BackendCategory;

        let mut registry = BackendRegistry::new();
        registry
            .register(Arc::new(MockBackend::new("mock-b")))
            .unwrap();
        registry
            .register(Arc::new(
                MockBackend::new("mock-chart").with_category(BackendCategory::ChartLibrary),
            ))
            .unwrap();

        assert_eq!(registry.list(None).len(), 2);
        let charts = registry.list(Some(BackendCategory::ChartLibrary));
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].name, "mock-chart");

        // Sorted by name regardless of insertion order.
        let all = registry.list(None);
        assert_eq!(all[0].name, "mock-b");
        assert_eq!(all[1].name, "mock-chart");
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let first = initialize();
        let count = first.len();
        let second = initialize();
        assert_eq!(second.len(), count);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
