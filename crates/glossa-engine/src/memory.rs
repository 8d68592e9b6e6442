//! In-memory backend.
//!
//! [`InMemoryStore`] implements every store contract over maps guarded by
//! `tokio::sync::RwLock`; [`RecordingSearchClient`] records search calls
//! instead of sending them. Used by the engine's tests and by embedders that
//! need no persistence.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use glossa_core::{
    fqn, EdgeChanges, EntityLookup, EntityReference, EntityRelationship, EntityRelationshipRecord,
    EntityType, Error, Glossary, GlossaryTerm, Include, LabelScope, Relationship,
    RelationshipStore, Result, SearchClient, TagSource, TagUsage, TagUsageStore, TermStore,
};

type UsageKey = (TagSource, String, String);

/// Every glossa store in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    glossaries: RwLock<HashMap<Uuid, Glossary>>,
    terms: RwLock<HashMap<Uuid, GlossaryTerm>>,
    users: RwLock<HashMap<Uuid, EntityReference>>,
    /// Classifications and classification tags, keyed by FQN.
    label_scopes: RwLock<HashMap<String, LabelScope>>,
    edges: RwLock<BTreeSet<EntityRelationship>>,
    usages: RwLock<HashMap<UsageKey, TagUsage>>,
    fail_fqn_rewrites: AtomicBool,
    fail_edge_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an active glossary.
    pub async fn insert_glossary(&self, name: &str) -> Result<Glossary> {
        let glossary = Glossary {
            id: Uuid::now_v7(),
            name: name.to_string(),
            fully_qualified_name: fqn::build(&[name])?,
            display_name: None,
            description: None,
            mutually_exclusive: false,
            owner: None,
            reviewers: Vec::new(),
            domain: None,
            deleted: false,
        };
        self.glossaries
            .write()
            .await
            .insert(glossary.id, glossary.clone());
        Ok(glossary)
    }

    /// Replace a stored glossary (e.g. to flag it deleted or mutually exclusive).
    pub async fn put_glossary(&self, glossary: Glossary) {
        self.glossaries.write().await.insert(glossary.id, glossary);
    }

    pub async fn insert_user(&self, name: &str) -> EntityReference {
        let user = EntityReference::new(Uuid::now_v7(), EntityType::User, name, name);
        self.users.write().await.insert(user.id, user.clone());
        user
    }

    pub async fn insert_classification(
        &self,
        name: &str,
        mutually_exclusive: bool,
    ) -> Result<LabelScope> {
        let scope = LabelScope {
            id: Uuid::now_v7(),
            entity_type: EntityType::Classification,
            name: name.to_string(),
            fully_qualified_name: fqn::build(&[name])?,
            display_name: None,
            description: None,
            mutually_exclusive,
            deleted: false,
        };
        self.label_scopes
            .write()
            .await
            .insert(scope.fully_qualified_name.clone(), scope.clone());
        Ok(scope)
    }

    /// Create a classification tag beneath `parent_fqn` (a classification or tag).
    pub async fn insert_tag(
        &self,
        parent_fqn: &str,
        name: &str,
        description: Option<&str>,
        mutually_exclusive: bool,
    ) -> Result<LabelScope> {
        let scope = LabelScope {
            id: Uuid::now_v7(),
            entity_type: EntityType::Tag,
            name: name.to_string(),
            fully_qualified_name: fqn::add(parent_fqn, name)?,
            display_name: None,
            description: description.map(str::to_string),
            mutually_exclusive,
            deleted: false,
        };
        self.label_scopes
            .write()
            .await
            .insert(scope.fully_qualified_name.clone(), scope.clone());
        Ok(scope)
    }

    /// Stored FQN of a term, deleted or not.
    pub async fn term_fqn(&self, id: Uuid) -> Option<String> {
        self.terms
            .read()
            .await
            .get(&id)
            .map(|t| t.fully_qualified_name.clone())
    }

    pub async fn term_count(&self) -> usize {
        self.terms.read().await.len()
    }

    /// Snapshot of every edge.
    pub async fn edges(&self) -> Vec<EntityRelationship> {
        self.edges.read().await.iter().copied().collect()
    }

    /// Snapshot of every tag usage.
    pub async fn usages(&self) -> Vec<TagUsage> {
        self.usages.read().await.values().cloned().collect()
    }

    /// Make subsequent FQN prefix rewrites fail.
    pub fn fail_fqn_rewrites(&self, fail: bool) {
        self.fail_fqn_rewrites.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent record-and-edge writes fail.
    pub fn fail_edge_writes(&self, fail: bool) {
        self.fail_edge_writes.store(fail, Ordering::SeqCst);
    }
}

fn term_scope(term: &GlossaryTerm) -> LabelScope {
    LabelScope {
        id: term.id,
        entity_type: EntityType::GlossaryTerm,
        name: term.name.clone(),
        fully_qualified_name: term.fully_qualified_name.clone(),
        display_name: term.display_name.clone(),
        description: term.description.clone(),
        mutually_exclusive: term.mutually_exclusive,
        deleted: term.deleted,
    }
}

fn glossary_scope(glossary: &Glossary) -> LabelScope {
    LabelScope {
        id: glossary.id,
        entity_type: EntityType::Glossary,
        name: glossary.name.clone(),
        fully_qualified_name: glossary.fully_qualified_name.clone(),
        display_name: glossary.display_name.clone(),
        description: glossary.description.clone(),
        mutually_exclusive: glossary.mutually_exclusive,
        deleted: glossary.deleted,
    }
}

#[async_trait]
impl EntityLookup for InMemoryStore {
    async fn get_term(&self, id: Uuid, include: Include) -> Result<Option<GlossaryTerm>> {
        Ok(self
            .terms
            .read()
            .await
            .get(&id)
            .filter(|t| include.admits(t.deleted))
            .cloned())
    }

    async fn get_term_by_name(&self, fqn: &str, include: Include) -> Result<Option<GlossaryTerm>> {
        Ok(self
            .terms
            .read()
            .await
            .values()
            .find(|t| t.fully_qualified_name == fqn && include.admits(t.deleted))
            .cloned())
    }

    async fn get_glossary(&self, id: Uuid, include: Include) -> Result<Option<Glossary>> {
        Ok(self
            .glossaries
            .read()
            .await
            .get(&id)
            .filter(|g| include.admits(g.deleted))
            .cloned())
    }

    async fn get_glossary_by_name(&self, name: &str, include: Include) -> Result<Option<Glossary>> {
        Ok(self
            .glossaries
            .read()
            .await
            .values()
            .find(|g| g.name == name && include.admits(g.deleted))
            .cloned())
    }

    async fn get_reference(
        &self,
        entity_type: EntityType,
        id: Uuid,
        include: Include,
    ) -> Result<Option<EntityReference>> {
        let reference = match entity_type {
            EntityType::Glossary => self
                .get_glossary(id, include)
                .await?
                .map(|g| g.entity_reference()),
            EntityType::GlossaryTerm => self
                .get_term(id, include)
                .await?
                .map(|t| t.entity_reference()),
            EntityType::User => self
                .users
                .read()
                .await
                .get(&id)
                .filter(|u| include.admits(u.deleted))
                .cloned(),
            EntityType::Classification | EntityType::Tag => self
                .label_scopes
                .read()
                .await
                .values()
                .find(|s| s.id == id && s.entity_type == entity_type && include.admits(s.deleted))
                .map(|s| {
                    EntityReference::new(s.id, s.entity_type, &s.name, &s.fully_qualified_name)
                }),
        };
        Ok(reference)
    }

    async fn get_label_scope(
        &self,
        entity_type: EntityType,
        fqn: &str,
        include: Include,
    ) -> Result<Option<LabelScope>> {
        let scope = match entity_type {
            EntityType::Glossary => self
                .glossaries
                .read()
                .await
                .values()
                .find(|g| g.fully_qualified_name == fqn)
                .map(glossary_scope),
            EntityType::GlossaryTerm => self
                .get_term_by_name(fqn, Include::All)
                .await?
                .as_ref()
                .map(term_scope),
            EntityType::Classification | EntityType::Tag => self
                .label_scopes
                .read()
                .await
                .get(fqn)
                .filter(|s| s.entity_type == entity_type)
                .cloned(),
            EntityType::User => None,
        };
        Ok(scope.filter(|s| include.admits(s.deleted)))
    }
}

#[async_trait]
impl TermStore for InMemoryStore {
    async fn upsert(&self, term: &GlossaryTerm) -> Result<()> {
        self.terms.write().await.insert(term.id, term.stripped());
        Ok(())
    }

    async fn write_with_edges(&self, term: &GlossaryTerm, changes: &EdgeChanges) -> Result<()> {
        let mut terms = self.terms.write().await;
        let mut edges = self.edges.write().await;
        if self.fail_edge_writes.load(Ordering::SeqCst) && !changes.is_empty() {
            return Err(Error::Internal("injected edge write failure".to_string()));
        }
        for edge in &changes.removed {
            edges.remove(edge);
        }
        edges.extend(changes.added.iter().copied());
        terms.insert(term.id, term.stripped());
        Ok(())
    }

    async fn update_fqn_prefix(&self, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        if self.fail_fqn_rewrites.load(Ordering::SeqCst) {
            return Err(Error::Internal("injected FQN rewrite failure".to_string()));
        }
        let mut rows = 0;
        for term in self.terms.write().await.values_mut() {
            if !fqn::is_descendant(old_prefix, &term.fully_qualified_name) {
                continue;
            }
            if let Some(rewritten) =
                fqn::replace_prefix(&term.fully_qualified_name, old_prefix, new_prefix)
            {
                term.fully_qualified_name = rewritten;
                rows += 1;
            }
        }
        Ok(rows)
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<()> {
        let mut terms = self.terms.write().await;
        let term = terms.get_mut(&id).ok_or(Error::TermNotFound(id))?;
        term.deleted = deleted;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.terms.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl RelationshipStore for InMemoryStore {
    async fn add_edge(&self, edge: &EntityRelationship, bidirectional: bool) -> Result<()> {
        let mut edges = self.edges.write().await;
        edges.insert(*edge);
        if bidirectional {
            edges.insert(edge.reversed());
        }
        Ok(())
    }

    async fn delete_edge(&self, edge: &EntityRelationship, bidirectional: bool) -> Result<()> {
        let mut edges = self.edges.write().await;
        edges.remove(edge);
        if bidirectional {
            edges.remove(&edge.reversed());
        }
        Ok(())
    }

    async fn find_to(
        &self,
        from_id: Uuid,
        from_type: EntityType,
        relation: Relationship,
        to_type: EntityType,
    ) -> Result<Vec<EntityRelationshipRecord>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| {
                e.from_id == from_id
                    && e.from_type == from_type
                    && e.relation == relation
                    && e.to_type == to_type
            })
            .map(|e| EntityRelationshipRecord {
                id: e.to_id,
                entity_type: e.to_type,
            })
            .collect())
    }

    async fn find_from(
        &self,
        to_id: Uuid,
        to_type: EntityType,
        relation: Relationship,
        from_type: EntityType,
    ) -> Result<Vec<EntityRelationshipRecord>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| {
                e.to_id == to_id
                    && e.to_type == to_type
                    && e.relation == relation
                    && e.from_type == from_type
            })
            .map(|e| EntityRelationshipRecord {
                id: e.from_id,
                entity_type: e.from_type,
            })
            .collect())
    }

    async fn delete_all(&self, id: Uuid, entity_type: EntityType) -> Result<u64> {
        let mut edges = self.edges.write().await;
        let before = edges.len();
        edges.retain(|e| {
            !((e.from_id == id && e.from_type == entity_type)
                || (e.to_id == id && e.to_type == entity_type))
        });
        Ok((before - edges.len()) as u64)
    }
}

#[async_trait]
impl TagUsageStore for InMemoryStore {
    async fn get_count(&self, source: TagSource, tag_fqn: &str) -> Result<i64> {
        Ok(self
            .usages
            .read()
            .await
            .values()
            .filter(|u| u.source == source && u.tag_fqn == tag_fqn)
            .count() as i64)
    }

    async fn get_target_fqns(&self, source: TagSource, tag_fqn: &str) -> Result<Vec<String>> {
        let mut targets: Vec<String> = self
            .usages
            .read()
            .await
            .values()
            .filter(|u| u.source == source && u.tag_fqn == tag_fqn)
            .map(|u| u.target_fqn.clone())
            .collect();
        targets.sort();
        Ok(targets)
    }

    async fn rename(&self, source: TagSource, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        let mut usages = self.usages.write().await;
        let keys: Vec<UsageKey> = usages
            .keys()
            .filter(|(s, tag, _)| *s == source && fqn::is_ancestor(old_prefix, tag))
            .cloned()
            .collect();
        for key in &keys {
            if let Some(mut usage) = usages.remove(key) {
                usage.tag_fqn = fqn::replace_prefix(&usage.tag_fqn, old_prefix, new_prefix)
                    .unwrap_or(usage.tag_fqn);
                usages.insert(
                    (usage.source, usage.tag_fqn.clone(), usage.target_fqn.clone()),
                    usage,
                );
            }
        }
        Ok(keys.len() as u64)
    }

    async fn rename_targets(&self, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        let mut usages = self.usages.write().await;
        let keys: Vec<UsageKey> = usages
            .keys()
            .filter(|(_, _, target)| fqn::is_ancestor(old_prefix, target))
            .cloned()
            .collect();
        for key in &keys {
            if let Some(mut usage) = usages.remove(key) {
                usage.target_fqn = fqn::replace_prefix(&usage.target_fqn, old_prefix, new_prefix)
                    .unwrap_or(usage.target_fqn);
                usages.insert(
                    (usage.source, usage.tag_fqn.clone(), usage.target_fqn.clone()),
                    usage,
                );
            }
        }
        Ok(keys.len() as u64)
    }

    async fn delete_by_source(&self, source: TagSource, tag_fqn: &str) -> Result<u64> {
        let mut usages = self.usages.write().await;
        let before = usages.len();
        usages.retain(|(s, tag, _), _| !(*s == source && fqn::is_ancestor(tag_fqn, tag)));
        Ok((before - usages.len()) as u64)
    }

    async fn apply(&self, usage: &TagUsage) -> Result<()> {
        self.usages.write().await.insert(
            (usage.source, usage.tag_fqn.clone(), usage.target_fqn.clone()),
            usage.clone(),
        );
        Ok(())
    }

    async fn delete_by_target(
        &self,
        source: TagSource,
        tag_fqn: &str,
        target_fqn: &str,
    ) -> Result<u64> {
        let removed = self
            .usages
            .write()
            .await
            .remove(&(source, tag_fqn.to_string(), target_fqn.to_string()));
        Ok(removed.map_or(0, |_| 1))
    }
}

// =============================================================================
// RECORDING SEARCH CLIENT
// =============================================================================

/// A call received by [`RecordingSearchClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCall {
    Update {
        id: Uuid,
        fqn: String,
    },
    SoftDeleteOrRestore {
        id: Uuid,
        deleted: bool,
        field_path: String,
    },
    DeleteAndClean {
        id: Uuid,
        fqn: String,
        script: String,
        field_path: String,
    },
}

/// Search client that records calls, optionally failing them.
#[derive(Clone, Default)]
pub struct RecordingSearchClient {
    calls: Arc<Mutex<Vec<SearchCall>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail (after being recorded).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Get all recorded calls for assertion.
    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn record(&self, call: SearchCall) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Search("injected search failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchClient for RecordingSearchClient {
    async fn update_entity(&self, term: &GlossaryTerm) -> Result<()> {
        self.record(SearchCall::Update {
            id: term.id,
            fqn: term.fully_qualified_name.clone(),
        })
    }

    async fn soft_delete_or_restore(
        &self,
        entity: &EntityReference,
        deleted: bool,
        field_path: &str,
    ) -> Result<()> {
        self.record(SearchCall::SoftDeleteOrRestore {
            id: entity.id,
            deleted,
            field_path: field_path.to_string(),
        })
    }

    async fn delete_and_clean_references(
        &self,
        entity: &EntityReference,
        cleanup_script: &str,
        field_path: &str,
    ) -> Result<()> {
        self.record(SearchCall::DeleteAndClean {
            id: entity.id,
            fqn: entity.fully_qualified_name.clone(),
            script: cleanup_script.to_string(),
            field_path: field_path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::TagLabel;

    fn edge(from: Uuid, to: Uuid, relation: Relationship) -> EntityRelationship {
        EntityRelationship::new(
            from,
            EntityType::GlossaryTerm,
            to,
            EntityType::GlossaryTerm,
            relation,
        )
    }

    #[tokio::test]
    async fn test_add_edge_is_upsert_and_delete_absent_is_noop() {
        let store = InMemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let e = edge(a, b, Relationship::Contains);

        store.add_edge(&e, false).await.unwrap();
        store.add_edge(&e, false).await.unwrap();
        assert_eq!(store.edges().await.len(), 1);

        store.delete_edge(&e, false).await.unwrap();
        store.delete_edge(&e, false).await.unwrap();
        assert!(store.edges().await.is_empty());
    }

    #[tokio::test]
    async fn test_bidirectional_edges() {
        let store = InMemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .add_edge(&edge(a, b, Relationship::RelatedTo), true)
            .await
            .unwrap();

        let from_b = store
            .find_to(
                b,
                EntityType::GlossaryTerm,
                Relationship::RelatedTo,
                EntityType::GlossaryTerm,
            )
            .await
            .unwrap();
        assert_eq!(from_b[0].id, a);

        store
            .delete_edge(&edge(b, a, Relationship::RelatedTo), true)
            .await
            .unwrap();
        assert!(store.edges().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_touches_both_directions() {
        let store = InMemoryStore::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.add_edge(&edge(a, b, Relationship::Contains), false).await.unwrap();
        store.add_edge(&edge(b, c, Relationship::Contains), false).await.unwrap();
        store.add_edge(&edge(a, c, Relationship::RelatedTo), false).await.unwrap();

        assert_eq!(store.delete_all(b, EntityType::GlossaryTerm).await.unwrap(), 2);
        assert_eq!(store.edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_write_with_edges_failure_writes_nothing() {
        let store = InMemoryStore::new();
        let fruit = GlossaryTerm::new(Uuid::new_v4(), "Fruit", "G.Fruit");
        let mut changes = EdgeChanges::default();
        changes.add(edge(Uuid::new_v4(), fruit.id, Relationship::Contains), false);

        store.fail_edge_writes(true);
        assert!(store.write_with_edges(&fruit, &changes).await.is_err());
        assert_eq!(store.term_count().await, 0);
        assert!(store.edges().await.is_empty());

        store.fail_edge_writes(false);
        store.write_with_edges(&fruit, &changes).await.unwrap();
        assert_eq!(store.term_count().await, 1);
        assert_eq!(store.edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_usage_rename_onto_existing_usage_merges() {
        let store = InMemoryStore::new();
        for tag in ["G.Fruit", "G.Produce"] {
            store
                .apply(&TagUsage::from_label(&TagLabel::glossary_term(tag), "db.a"))
                .await
                .unwrap();
        }

        let rows = store
            .rename(TagSource::Glossary, "G.Fruit", "G.Produce")
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(store.usages().await.len(), 1);
        assert_eq!(
            store.get_target_fqns(TagSource::Glossary, "G.Produce").await.unwrap(),
            vec!["db.a".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_fqn_prefix_is_strict_and_boundary_aware() {
        let store = InMemoryStore::new();
        for (name, fqn) in [
            ("Fruit", "G.Fruit"),
            ("Apple", "G.Fruit.Apple"),
            ("FruitBowl", "G.FruitBowl"),
        ] {
            store
                .upsert(&GlossaryTerm::new(Uuid::new_v4(), name, fqn))
                .await
                .unwrap();
        }

        let rows = store.update_fqn_prefix("G.Fruit", "G.Produce").await.unwrap();
        assert_eq!(rows, 1);
        assert!(store
            .get_term_by_name("G.Produce.Apple", Include::All)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_term_by_name("G.FruitBowl", Include::All)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_term_by_name("G.Fruit", Include::All)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_upsert_strips_derived_fields() {
        let store = InMemoryStore::new();
        let mut term = GlossaryTerm::new(Uuid::new_v4(), "Apple", "G.Apple");
        term.related_terms
            .push(EntityReference::new(Uuid::new_v4(), EntityType::GlossaryTerm, "Pear", "G.Pear"));
        term.usage_count = Some(4);
        store.upsert(&term).await.unwrap();

        let stored = store.get_term(term.id, Include::All).await.unwrap().unwrap();
        assert!(stored.related_terms.is_empty());
        assert_eq!(stored.usage_count, None);
    }

    #[tokio::test]
    async fn test_tag_usage_rename_and_delete() {
        let store = InMemoryStore::new();
        for (tag, target) in [
            ("G.Fruit", "db.a"),
            ("G.Fruit.Apple", "db.b"),
            ("G.FruitBowl", "db.c"),
        ] {
            store
                .apply(&TagUsage::from_label(&TagLabel::glossary_term(tag), target))
                .await
                .unwrap();
        }

        assert_eq!(
            store.rename(TagSource::Glossary, "G.Fruit", "G.Produce").await.unwrap(),
            2
        );
        assert_eq!(store.get_count(TagSource::Glossary, "G.Produce.Apple").await.unwrap(), 1);
        assert_eq!(store.get_count(TagSource::Glossary, "G.FruitBowl").await.unwrap(), 1);

        assert_eq!(
            store.delete_by_source(TagSource::Glossary, "G.Produce").await.unwrap(),
            2
        );
        assert_eq!(store.usages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_label_scope_resolution() {
        let store = InMemoryStore::new();
        let g = store.insert_glossary("G").await.unwrap();
        store.insert_classification("PII", true).await.unwrap();
        store
            .insert_tag("PII", "Sensitive", Some("Sensitive data"), false)
            .await
            .unwrap();

        let scope = store
            .get_label_scope(EntityType::Glossary, "G", Include::NonDeleted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scope.id, g.id);

        let tag = store
            .get_label_scope(EntityType::Tag, "PII.Sensitive", Include::NonDeleted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tag.description.as_deref(), Some("Sensitive data"));

        assert!(store
            .get_label_scope(EntityType::Classification, "PII.Sensitive", Include::All)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_recording_client_fails_after_recording() {
        let client = RecordingSearchClient::new();
        let term = GlossaryTerm::new(Uuid::new_v4(), "Apple", "G.Apple");
        client.update_entity(&term).await.unwrap();

        client.set_fail(true);
        assert!(matches!(
            client.update_entity(&term).await,
            Err(Error::Search(_))
        ));
        assert_eq!(client.calls().len(), 2);
    }
}
