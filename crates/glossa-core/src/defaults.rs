//! Centralized default constants for glossa.
//!
//! Every crate reads shared defaults from here instead of defining its own
//! magic numbers. Organized by area.

// =============================================================================
// CACHE
// =============================================================================

/// Maximum number of materialized terms held by the entity cache.
pub const CACHE_CAPACITY: usize = 1000;

// =============================================================================
// CASCADE
// =============================================================================

/// Depth limit for cache invalidation over `Contains` descendants.
///
/// Glossary trees are shallow in practice; the limit only stops a corrupted
/// (cyclic or runaway) edge set from recursing without bound.
pub const MAX_CASCADE_DEPTH: usize = 64;

// =============================================================================
// SEARCH
// =============================================================================

/// Default search engine base URL.
pub const SEARCH_URL: &str = "http://127.0.0.1:9200";

/// Index holding glossary term documents.
pub const SEARCH_INDEX: &str = "glossary_term_search_index";

/// Alias covering every index that may embed tag labels.
pub const SEARCH_ALIAS: &str = "all";

/// Timeout for search requests in seconds.
pub const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Field path of embedded tag labels in search documents.
pub const TAG_FIELD_PATH: &str = "tags.tagFQN";

/// Whether search notifications are sent by default.
pub const SEARCH_SYNC_ENABLED: bool = true;

// =============================================================================
// DATABASE
// =============================================================================

/// Default connection URL for local development.
pub const DATABASE_URL: &str = "postgres://localhost/glossa";

/// Maximum pool connections.
pub const DB_MAX_CONNECTIONS: u32 = 20;

/// Minimum idle pool connections.
pub const DB_MIN_CONNECTIONS: u32 = 2;

/// Seconds to wait for a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds before an idle connection is closed.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Maximum lifetime of a connection in seconds.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// LOGGING
// =============================================================================

/// Filter used when `RUST_LOG` is unset.
pub const LOG_FILTER: &str = "glossa_engine=info,glossa_db=info,glossa_search=info";

/// File name used when `LOG_FILE` names a directory-less path without a file.
pub const LOG_FILE_NAME: &str = "glossa.log";
