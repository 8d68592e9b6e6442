//! Collaborator traits for glossa.
//!
//! The engine owns no storage. Entity records, relationship edges, tag usage,
//! the entity cache and the search index are all reached through these
//! traits, shared as `Arc<dyn Trait>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::tags::{TagSource, TagUsage};

// =============================================================================
// ENTITY LOOKUP
// =============================================================================

/// Read access to stored entity records.
///
/// Returned terms carry only their stored attributes; parent, glossary,
/// children, related terms and reviewers are derived from edges by the engine.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn get_term(&self, id: Uuid, include: Include) -> Result<Option<GlossaryTerm>>;

    async fn get_term_by_name(&self, fqn: &str, include: Include) -> Result<Option<GlossaryTerm>>;

    async fn get_glossary(&self, id: Uuid, include: Include) -> Result<Option<Glossary>>;

    async fn get_glossary_by_name(&self, name: &str, include: Include)
        -> Result<Option<Glossary>>;

    /// Resolve any entity id to a reference.
    async fn get_reference(
        &self,
        entity_type: EntityType,
        id: Uuid,
        include: Include,
    ) -> Result<Option<EntityReference>>;

    /// Resolve a label target (glossary, term, classification or tag) by FQN.
    async fn get_label_scope(
        &self,
        entity_type: EntityType,
        fqn: &str,
        include: Include,
    ) -> Result<Option<LabelScope>>;
}

// =============================================================================
// TERM RECORDS
// =============================================================================

/// Writer for the canonical term record.
#[async_trait]
pub trait TermStore: Send + Sync {
    /// Insert or replace a term record. Derived fields are not persisted.
    async fn upsert(&self, term: &GlossaryTerm) -> Result<()>;

    /// Upsert the record and apply `edges` as one unit: either all of it is
    /// stored or none of it is.
    async fn write_with_edges(&self, term: &GlossaryTerm, edges: &EdgeChanges) -> Result<()>;

    /// Rewrite the FQN of every record strictly beneath `old_prefix`.
    ///
    /// Returns the number of records rewritten.
    async fn update_fqn_prefix(&self, old_prefix: &str, new_prefix: &str) -> Result<u64>;

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<()>;

    /// Remove the record permanently.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// RELATIONSHIPS
// =============================================================================

/// Typed edge storage.
///
/// Adding an existing edge and deleting an absent one are both no-ops.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Add an edge; `bidirectional` also adds the reversed edge.
    async fn add_edge(&self, edge: &EntityRelationship, bidirectional: bool) -> Result<()>;

    /// Delete an edge; `bidirectional` also deletes the reversed edge.
    async fn delete_edge(&self, edge: &EntityRelationship, bidirectional: bool) -> Result<()>;

    /// Entities that `from_id` points to with `relation`.
    async fn find_to(
        &self,
        from_id: Uuid,
        from_type: EntityType,
        relation: Relationship,
        to_type: EntityType,
    ) -> Result<Vec<EntityRelationshipRecord>>;

    /// Entities pointing at `to_id` with `relation`.
    async fn find_from(
        &self,
        to_id: Uuid,
        to_type: EntityType,
        relation: Relationship,
        from_type: EntityType,
    ) -> Result<Vec<EntityRelationshipRecord>>;

    /// Remove every edge touching the entity, in either direction.
    async fn delete_all(&self, id: Uuid, entity_type: EntityType) -> Result<u64>;
}

// =============================================================================
// TAG USAGE
// =============================================================================

/// The tag-usage reverse index.
#[async_trait]
pub trait TagUsageStore: Send + Sync {
    /// Number of usages whose tag is exactly `tag_fqn`.
    async fn get_count(&self, source: TagSource, tag_fqn: &str) -> Result<i64>;

    /// FQNs of entities labelled with `tag_fqn`.
    async fn get_target_fqns(&self, source: TagSource, tag_fqn: &str) -> Result<Vec<String>>;

    /// Rewrite `tag_fqn` for usages of `old_prefix` and its descendants.
    async fn rename(&self, source: TagSource, old_prefix: &str, new_prefix: &str) -> Result<u64>;

    /// Rewrite `target_fqn` for usages applied to `old_prefix` and its descendants.
    async fn rename_targets(&self, old_prefix: &str, new_prefix: &str) -> Result<u64>;

    /// Delete usages of `tag_fqn` and its descendants.
    async fn delete_by_source(&self, source: TagSource, tag_fqn: &str) -> Result<u64>;

    /// Record a usage; re-applying an existing usage replaces it.
    async fn apply(&self, usage: &TagUsage) -> Result<()>;

    async fn delete_by_target(
        &self,
        source: TagSource,
        tag_fqn: &str,
        target_fqn: &str,
    ) -> Result<u64>;
}

// =============================================================================
// CACHE
// =============================================================================

/// Process-wide cache of materialized terms.
///
/// Entries are invalidated, never updated in place.
#[async_trait]
pub trait EntityCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<GlossaryTerm>;

    async fn put(&self, key: CacheKey, term: GlossaryTerm);

    /// Drop an entry. Returns true if one was present.
    async fn invalidate(&self, key: &CacheKey) -> bool;
}

// =============================================================================
// SEARCH
// =============================================================================

/// Client for the external search index.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Index (or re-index) the materialized term.
    async fn update_entity(&self, term: &GlossaryTerm) -> Result<()>;

    /// Flag the entity's document deleted (or active), and flag embedded
    /// references at `field_path` in other documents the same way.
    async fn soft_delete_or_restore(
        &self,
        entity: &EntityReference,
        deleted: bool,
        field_path: &str,
    ) -> Result<()>;

    /// Delete the entity's document and run `cleanup_script` over documents
    /// embedding it at `field_path`.
    async fn delete_and_clean_references(
        &self,
        entity: &EntityReference,
        cleanup_script: &str,
        field_path: &str,
    ) -> Result<()>;
}
