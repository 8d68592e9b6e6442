//! # glossa-search
//!
//! Search index client for glossa.
//!
//! Keeps the glossary term index in line with the store: term documents are
//! (re)indexed on create and cascade, flagged on soft delete or restore, and
//! removed on hard delete along with every embedded label that points at
//! the term.

pub mod client;
pub mod config;
pub mod document;

pub use client::{HttpSearchClient, LABEL_DELETED_SCRIPT};
pub use config::SearchConfig;
pub use document::{term_document, SearchSuggest};
