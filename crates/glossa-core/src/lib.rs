//! # glossa-core
//!
//! Core types, traits, and abstractions for the glossa glossary engine.
//!
//! This crate provides the foundational data structures (glossaries, terms,
//! relationship edges, tag-usage records), the fully-qualified-name engine,
//! and the collaborator trait definitions that the other glossa crates
//! implement or depend on.

pub mod change;
pub mod defaults;
pub mod error;
pub mod fqn;
pub mod logging;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use change::{ChangeDescription, FieldChange};
pub use error::{Error, Result};
pub use logging::{init_tracing, LogConfig};
pub use models::*;
pub use tags::*;
pub use traits::*;
