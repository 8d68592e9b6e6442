//! # glossa-engine
//!
//! Glossary term hierarchy and cascading-consistency engine.
//!
//! This crate provides:
//! - Term creation, update, soft/hard delete and restore ([`TermService`])
//! - Hierarchy validation before any write
//! - Cascading FQN rewrites over descendants, tag usage and the entity cache
//! - Tag-usage synchronization and derived-label propagation
//! - Fire-and-forget search index notifications
//! - An LRU entity cache and an in-memory backend
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use glossa_engine::{Backends, EngineConfig, LruEntityCache, TermService};
//! use glossa_engine::memory::{InMemoryStore, RecordingSearchClient};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let service = TermService::new(
//!     Backends {
//!         lookup: store.clone(),
//!         terms: store.clone(),
//!         relationships: store.clone(),
//!         tag_usage: store.clone(),
//!         cache: Arc::new(LruEntityCache::new(1000)),
//!         search: Arc::new(RecordingSearchClient::new()),
//!     },
//!     EngineConfig::from_env(),
//! );
//!
//! let glossary = store.insert_glossary("Business").await?;
//! let term = service.create_term(CreateTermRequest {
//!     glossary_id: glossary.id,
//!     name: "Revenue".into(),
//!     ..Default::default()
//! }).await?;
//! assert_eq!(term.fully_qualified_name, "Business.Revenue");
//! ```

pub mod cache;
pub mod cascade;
pub mod config;
pub mod memory;
pub mod search_sync;
pub mod tag_usage;
pub mod term_service;
mod updater;
pub mod validator;

// Re-export core types
pub use glossa_core::*;

pub use cache::LruEntityCache;
pub use cascade::{CascadePropagator, CascadeReport};
pub use config::EngineConfig;
pub use search_sync::{SearchSyncTrigger, TAG_CLEANUP_SCRIPT};
pub use tag_usage::TagUsageSynchronizer;
pub use term_service::{Backends, TermService, TermUpdate};
