//! Glossary domain models.
//!
//! Terms are never linked to each other by embedded pointers. Parents,
//! children, related terms and reviewers are all derived from
//! [`EntityRelationship`] edges and materialized as [`EntityReference`]s on
//! read; the durable term record carries only its own attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tags::TagLabel;

// =============================================================================
// ENUMS
// =============================================================================

/// Entity types that participate in the glossary relationship graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Glossary,
    GlossaryTerm,
    User,
    Classification,
    Tag,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glossary => write!(f, "glossary"),
            Self::GlossaryTerm => write!(f, "glossaryTerm"),
            Self::User => write!(f, "user"),
            Self::Classification => write!(f, "classification"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glossary" => Ok(Self::Glossary),
            "glossaryTerm" => Ok(Self::GlossaryTerm),
            "user" => Ok(Self::User),
            "classification" => Ok(Self::Classification),
            "tag" => Ok(Self::Tag),
            _ => Err(format!("Invalid entity type: {}", s)),
        }
    }
}

/// Which entities a lookup may return with respect to soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Include {
    /// Only active entities.
    #[default]
    NonDeleted,
    /// Only soft-deleted entities.
    Deleted,
    /// Both.
    All,
}

impl Include {
    /// Whether an entity with the given deleted flag passes this filter.
    pub fn admits(self, deleted: bool) -> bool {
        match self {
            Include::NonDeleted => !deleted,
            Include::Deleted => deleted,
            Include::All => true,
        }
    }
}

/// Edge kinds in the relationship graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relationship {
    /// Tree-parent edge: glossary → root term, or term → child term.
    Contains,
    /// Index edge from a glossary to each of its non-root terms.
    Has,
    /// Symmetric term ↔ term association, stored as two directed edges.
    RelatedTo,
    /// User → term review assignment.
    Reviews,
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contains => write!(f, "contains"),
            Self::Has => write!(f, "has"),
            Self::RelatedTo => write!(f, "relatedTo"),
            Self::Reviews => write!(f, "reviews"),
        }
    }
}

impl std::str::FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(Self::Contains),
            "has" => Ok(Self::Has),
            "relatedTo" => Ok(Self::RelatedTo),
            "reviews" => Ok(Self::Reviews),
            _ => Err(format!("Invalid relationship: {}", s)),
        }
    }
}

/// Workflow status of a glossary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TermStatus {
    #[default]
    Draft,
    InReview,
    Approved,
    Deprecated,
    Rejected,
}

impl std::fmt::Display for TermStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "Draft"),
            Self::InReview => write!(f, "InReview"),
            Self::Approved => write!(f, "Approved"),
            Self::Deprecated => write!(f, "Deprecated"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Who manages a term. System-managed terms cannot be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    User,
    System,
}

// =============================================================================
// REFERENCES
// =============================================================================

/// Canonical pointer to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub fully_qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    /// Set when the reference was filled from an ancestor on read.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherited: bool,
}

impl EntityReference {
    pub fn new(
        id: Uuid,
        entity_type: EntityType,
        name: impl Into<String>,
        fully_qualified_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            entity_type,
            name: name.into(),
            fully_qualified_name: fully_qualified_name.into(),
            display_name: None,
            deleted: false,
            inherited: false,
        }
    }

    /// Copy of this reference marked as inherited.
    pub fn as_inherited(&self) -> Self {
        Self {
            inherited: true,
            ..self.clone()
        }
    }
}

/// External reference attached to a term (a named link).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermReference {
    pub name: String,
    pub endpoint: String,
}

/// Resolved label target used for tag application and mutual exclusivity.
///
/// Either a glossary / classification (the container) or a glossary term /
/// classification tag (a node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelScope {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub name: String,
    pub fully_qualified_name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub mutually_exclusive: bool,
    pub deleted: bool,
}

// =============================================================================
// GLOSSARY
// =============================================================================

/// Root container owning a tree of terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glossary {
    pub id: Uuid,
    pub name: String,
    pub fully_qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mutually_exclusive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<EntityReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<EntityReference>,
    #[serde(default)]
    pub deleted: bool,
}

impl Glossary {
    pub fn entity_reference(&self) -> EntityReference {
        EntityReference {
            display_name: self.display_name.clone(),
            deleted: self.deleted,
            ..EntityReference::new(
                self.id,
                EntityType::Glossary,
                &self.name,
                &self.fully_qualified_name,
            )
        }
    }
}

// =============================================================================
// GLOSSARY TERM
// =============================================================================

/// A node in a glossary hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTerm {
    pub id: Uuid,
    /// Local label, unique among siblings.
    pub name: String,
    /// Derived from the parent (or glossary) FQN and `name`; never caller-assigned.
    pub fully_qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // Derived from relationship edges, never part of the stored record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossary: Option<EntityReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_terms: Vec<EntityReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<EntityReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<i64>,

    #[serde(default)]
    pub status: TermStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<TermReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<EntityReference>,
    #[serde(default)]
    pub provider: ProviderType,
    #[serde(default)]
    pub mutually_exclusive: bool,
    #[serde(default)]
    pub deleted: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl GlossaryTerm {
    /// A draft, user-provided term with no relationships.
    pub fn new(id: Uuid, name: impl Into<String>, fully_qualified_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fully_qualified_name: fully_qualified_name.into(),
            display_name: None,
            description: None,
            glossary: None,
            parent: None,
            children: Vec::new(),
            related_terms: Vec::new(),
            reviewers: Vec::new(),
            usage_count: None,
            status: TermStatus::default(),
            synonyms: Vec::new(),
            references: Vec::new(),
            tags: Vec::new(),
            owner: None,
            domain: None,
            provider: ProviderType::default(),
            mutually_exclusive: false,
            deleted: false,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    /// Copy with every edge-derived field cleared, as persisted.
    pub fn stripped(&self) -> Self {
        Self {
            glossary: None,
            parent: None,
            children: Vec::new(),
            related_terms: Vec::new(),
            reviewers: Vec::new(),
            usage_count: None,
            ..self.clone()
        }
    }

    pub fn entity_reference(&self) -> EntityReference {
        EntityReference {
            display_name: self.display_name.clone(),
            deleted: self.deleted,
            ..EntityReference::new(
                self.id,
                EntityType::GlossaryTerm,
                &self.name,
                &self.fully_qualified_name,
            )
        }
    }

    pub fn is_system(&self) -> bool {
        self.provider == ProviderType::System
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn glossary_id(&self) -> Option<Uuid> {
        self.glossary.as_ref().map(|g| g.id)
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        self.parent.as_ref().map(|p| p.id)
    }
}

/// Request to create a glossary term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermRequest {
    pub glossary_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TermStatus,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub references: Vec<TermReference>,
    #[serde(default)]
    pub related_term_ids: Vec<Uuid>,
    #[serde(default)]
    pub reviewer_ids: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
    #[serde(default)]
    pub provider: ProviderType,
    #[serde(default)]
    pub mutually_exclusive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Full replacement of a term's mutable fields.
///
/// Structural fields (`name`, `glossary_id`, `parent_id`) may change here;
/// doing so triggers a cascade over the term's subtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTermRequest {
    pub glossary_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TermStatus,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub references: Vec<TermReference>,
    #[serde(default)]
    pub related_term_ids: Vec<Uuid>,
    #[serde(default)]
    pub reviewer_ids: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
    #[serde(default)]
    pub mutually_exclusive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl UpdateTermRequest {
    /// Request that leaves every field of `term` as it is.
    ///
    /// Reviewers inherited from an ancestor are not the term's own and are
    /// left out.
    pub fn from_term(term: &GlossaryTerm) -> Self {
        Self {
            glossary_id: term.glossary_id().unwrap_or_default(),
            parent_id: term.parent_id(),
            name: term.name.clone(),
            display_name: term.display_name.clone(),
            description: term.description.clone(),
            status: term.status,
            synonyms: term.synonyms.clone(),
            references: term.references.clone(),
            related_term_ids: term.related_terms.iter().map(|r| r.id).collect(),
            reviewer_ids: term
                .reviewers
                .iter()
                .filter(|r| !r.inherited)
                .map(|r| r.id)
                .collect(),
            tags: term.tags.clone(),
            mutually_exclusive: term.mutually_exclusive,
            updated_by: term.updated_by.clone(),
        }
    }
}

/// Which derived fields to materialize when reading a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermFields {
    pub children: bool,
    pub related_terms: bool,
    pub reviewers: bool,
    pub usage_count: bool,
}

impl TermFields {
    /// Every derived field.
    pub fn all() -> Self {
        Self {
            children: true,
            related_terms: true,
            reviewers: true,
            usage_count: true,
        }
    }

    /// Parse a comma-separated field list such as `"relatedTerms,usageCount"`.
    pub fn parse(fields: &str) -> Self {
        let mut parsed = Self::default();
        for field in fields.split(',').map(str::trim) {
            match field {
                "children" => parsed.children = true,
                "relatedTerms" => parsed.related_terms = true,
                "reviewers" => parsed.reviewers = true,
                "usageCount" => parsed.usage_count = true,
                "*" => return Self::all(),
                _ => {}
            }
        }
        parsed
    }
}

// =============================================================================
// RELATIONSHIPS & CACHE
// =============================================================================

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelationship {
    pub from_id: Uuid,
    pub from_type: EntityType,
    pub to_id: Uuid,
    pub to_type: EntityType,
    pub relation: Relationship,
}

impl EntityRelationship {
    pub fn new(
        from_id: Uuid,
        from_type: EntityType,
        to_id: Uuid,
        to_type: EntityType,
        relation: Relationship,
    ) -> Self {
        Self {
            from_id,
            from_type,
            to_id,
            to_type,
            relation,
        }
    }

    /// The same edge pointing the other way.
    pub fn reversed(&self) -> Self {
        Self {
            from_id: self.to_id,
            from_type: self.to_type,
            to_id: self.from_id,
            to_type: self.from_type,
            relation: self.relation,
        }
    }
}

/// Edge additions and removals written together with one term record.
///
/// Bidirectional edges are expanded into both directed rows on insertion,
/// so stores apply the lists as they are: removals first, then additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeChanges {
    pub removed: Vec<EntityRelationship>,
    pub added: Vec<EntityRelationship>,
}

impl EdgeChanges {
    pub fn add(&mut self, edge: EntityRelationship, bidirectional: bool) {
        self.added.push(edge);
        if bidirectional {
            self.added.push(edge.reversed());
        }
    }

    pub fn remove(&mut self, edge: EntityRelationship, bidirectional: bool) {
        self.removed.push(edge);
        if bidirectional {
            self.removed.push(edge.reversed());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The far end of an edge returned by a relationship query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelationshipRecord {
    pub id: Uuid,
    pub entity_type: EntityType,
}

/// Cache key: entity type plus id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity_type: EntityType,
    pub id: Uuid,
}

impl CacheKey {
    pub fn term(id: Uuid) -> Self {
        Self {
            entity_type: EntityType::GlossaryTerm,
            id,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trip_strings() {
        for t in [
            EntityType::Glossary,
            EntityType::GlossaryTerm,
            EntityType::User,
            EntityType::Classification,
            EntityType::Tag,
        ] {
            assert_eq!(t.to_string().parse::<EntityType>().unwrap(), t);
        }
        assert!("table".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_relationship_serialization_matches_display() {
        for r in [
            Relationship::Contains,
            Relationship::Has,
            Relationship::RelatedTo,
            Relationship::Reviews,
        ] {
            let json = serde_json::to_string(&r).unwrap();
            assert_eq!(json, format!("\"{}\"", r));
        }
    }

    #[test]
    fn test_include_admits() {
        assert!(Include::NonDeleted.admits(false));
        assert!(!Include::NonDeleted.admits(true));
        assert!(Include::Deleted.admits(true));
        assert!(!Include::Deleted.admits(false));
        assert!(Include::All.admits(true) && Include::All.admits(false));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TermStatus::default(), TermStatus::Draft);
        assert_eq!(ProviderType::default(), ProviderType::User);
        assert_eq!(Include::default(), Include::NonDeleted);
    }

    #[test]
    fn test_term_fields_parse() {
        let f = TermFields::parse("relatedTerms, usageCount");
        assert!(f.related_terms && f.usage_count);
        assert!(!f.children && !f.reviewers);
        assert_eq!(TermFields::parse("*"), TermFields::all());
        assert_eq!(TermFields::parse("owner"), TermFields::default());
    }

    #[test]
    fn test_reversed_edge() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let edge = EntityRelationship::new(
            a,
            EntityType::GlossaryTerm,
            b,
            EntityType::GlossaryTerm,
            Relationship::RelatedTo,
        );
        let rev = edge.reversed();
        assert_eq!(rev.from_id, b);
        assert_eq!(rev.to_id, a);
        assert_eq!(rev.reversed(), edge);
    }

    #[test]
    fn test_reference_serializes_type_field() {
        let r = EntityReference::new(Uuid::nil(), EntityType::GlossaryTerm, "Apple", "G.Apple");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type"], "glossaryTerm");
        assert_eq!(json["fullyQualifiedName"], "G.Apple");
        assert!(json.get("inherited").is_none());
        assert!(r.as_inherited().inherited);
    }

    #[test]
    fn test_cache_key_display() {
        let id = Uuid::nil();
        assert_eq!(CacheKey::term(id).to_string(), format!("glossaryTerm:{}", id));
    }

    #[test]
    fn test_edge_changes_expand_bidirectional() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let edge = EntityRelationship::new(
            a,
            EntityType::GlossaryTerm,
            b,
            EntityType::GlossaryTerm,
            Relationship::RelatedTo,
        );
        let mut changes = EdgeChanges::default();
        assert!(changes.is_empty());
        changes.add(edge, true);
        changes.remove(edge, false);
        assert_eq!(changes.added, vec![edge, edge.reversed()]);
        assert_eq!(changes.removed, vec![edge]);
    }

    #[test]
    fn test_update_request_from_term_skips_inherited_reviewers() {
        let own = EntityReference::new(Uuid::new_v4(), EntityType::User, "bob", "bob");
        let inherited =
            EntityReference::new(Uuid::new_v4(), EntityType::User, "alice", "alice").as_inherited();
        let mut term = GlossaryTerm::new(Uuid::new_v4(), "Apple", "G.Apple");
        term.reviewers = vec![inherited, own.clone()];

        let request = UpdateTermRequest::from_term(&term);
        assert_eq!(request.reviewer_ids, vec![own.id]);
    }
}
