//! Engine configuration.

use glossa_core::defaults;

/// Configuration for [`TermService`](crate::TermService) and its components.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Capacity of the LRU entity cache.
    pub cache_capacity: usize,
    /// Depth limit when walking `Contains` descendants.
    pub max_cascade_depth: usize,
    /// Whether search notifications are sent.
    pub search_sync_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: defaults::CACHE_CAPACITY,
            max_cascade_depth: defaults::MAX_CASCADE_DEPTH,
            search_sync_enabled: defaults::SEARCH_SYNC_ENABLED,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GLOSSA_CACHE_CAPACITY` | `1000` | Max cached terms |
    /// | `GLOSSA_MAX_CASCADE_DEPTH` | `64` | Descendant walk depth limit |
    /// | `GLOSSA_SEARCH_SYNC_ENABLED` | `true` | Enable/disable search notifications |
    pub fn from_env() -> Self {
        let cache_capacity = std::env::var("GLOSSA_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::CACHE_CAPACITY)
            .max(1);

        let max_cascade_depth = std::env::var("GLOSSA_MAX_CASCADE_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_CASCADE_DEPTH)
            .max(1);

        let search_sync_enabled = std::env::var("GLOSSA_SEARCH_SYNC_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(defaults::SEARCH_SYNC_ENABLED);

        Self {
            cache_capacity,
            max_cascade_depth,
            search_sync_enabled,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth.max(1);
        self
    }

    /// Enable or disable search notifications.
    pub fn with_search_sync(mut self, enabled: bool) -> Self {
        self.search_sync_enabled = enabled;
        self
    }
}
