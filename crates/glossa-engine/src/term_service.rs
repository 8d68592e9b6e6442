//! Term mutation engine.
//!
//! [`TermService`] is the entry point for every glossary term operation.
//! A mutation runs in two phases: `prepare` resolves and validates every
//! referenced entity without writing anything, then the record, its edges
//! and the dependent representations are written. Post-validation failures
//! in the cascade, cache or search index are logged, never rolled back.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use glossa_core::{
    fqn, CacheKey, ChangeDescription, CreateTermRequest, EdgeChanges, EntityCache, EntityLookup,
    EntityReference, EntityRelationship, EntityType, Error, GlossaryTerm, Include,
    LabelType, Relationship, RelationshipStore, Result, SearchClient, TagLabel, TagUsageStore,
    TermFields, TermStore, UpdateTermRequest,
};

use crate::cascade::{CascadePropagator, CascadeReport};
use crate::config::EngineConfig;
use crate::search_sync::SearchSyncTrigger;
use crate::tag_usage::TagUsageSynchronizer;
use crate::updater::TermUpdater;
use crate::validator;

/// Collaborators the engine writes through.
#[derive(Clone)]
pub struct Backends {
    pub lookup: Arc<dyn EntityLookup>,
    pub terms: Arc<dyn TermStore>,
    pub relationships: Arc<dyn RelationshipStore>,
    pub tag_usage: Arc<dyn TagUsageStore>,
    pub cache: Arc<dyn EntityCache>,
    pub search: Arc<dyn SearchClient>,
}

/// Result of [`TermService::update_term`].
#[derive(Debug, Clone)]
pub struct TermUpdate {
    pub term: GlossaryTerm,
    pub change: ChangeDescription,
    /// Cascades run for the rename and/or move, in trigger order.
    pub cascades: Vec<CascadeReport>,
}

/// A term with its references resolved, ready to be written.
pub(crate) struct Prepared {
    pub term: GlossaryTerm,
    pub parent: Option<GlossaryTerm>,
}

/// Creates, updates, reads and deletes glossary terms.
pub struct TermService {
    pub(crate) lookup: Arc<dyn EntityLookup>,
    pub(crate) terms: Arc<dyn TermStore>,
    pub(crate) relationships: Arc<dyn RelationshipStore>,
    pub(crate) cache: Arc<dyn EntityCache>,
    pub(crate) cascade: CascadePropagator,
    pub(crate) tags: TagUsageSynchronizer,
    pub(crate) search: SearchSyncTrigger,
    config: EngineConfig,
}

impl TermService {
    pub fn new(backends: Backends, config: EngineConfig) -> Self {
        let cascade = CascadePropagator::new(
            backends.terms.clone(),
            backends.relationships.clone(),
            backends.tag_usage.clone(),
            backends.cache.clone(),
            config.max_cascade_depth,
        );
        let tags = TagUsageSynchronizer::new(backends.lookup.clone(), backends.tag_usage);
        let search = SearchSyncTrigger::new(backends.search, config.search_sync_enabled);

        Self {
            lookup: backends.lookup,
            terms: backends.terms,
            relationships: backends.relationships,
            cache: backends.cache,
            cascade,
            tags,
            search,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cascade(&self) -> &CascadePropagator {
        &self.cascade
    }

    /// Wait for outstanding search notifications.
    pub async fn flush(&self) {
        self.search.flush().await;
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    #[instrument(skip(self, request), fields(subsystem = "engine", component = "term_service", op = "create_term", name = %request.name))]
    pub async fn create_term(&self, request: CreateTermRequest) -> Result<GlossaryTerm> {
        let start = Instant::now();
        let mut term = GlossaryTerm::new(Uuid::now_v7(), &request.name, String::new());
        term.display_name = request.display_name;
        term.description = request.description;
        term.status = request.status;
        term.synonyms = dedup(request.synonyms);
        term.references = request.references;
        term.tags = request.tags;
        term.provider = request.provider;
        term.mutually_exclusive = request.mutually_exclusive;
        term.updated_by = request.updated_by;

        let prepared = self
            .prepare(
                term,
                request.glossary_id,
                request.parent_id,
                &request.related_term_ids,
                &request.reviewer_ids,
            )
            .await?;
        self.ensure_unique(&prepared.term.fully_qualified_name, None)
            .await?;

        let term = prepared.term;
        self.store(&term, &relationship_edges(&term)).await?;
        self.tags.propagate_term_tags(&term.fully_qualified_name, &[], &term.tags).await?;
        self.invalidate_neighbours(&term).await;

        let created = self.load(term.id, Include::All, true).await?;
        self.search.on_upsert(&created).await;

        info!(
            term_id = %created.id,
            fqn = %created.fully_qualified_name,
            glossary_id = ?created.glossary_id(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Glossary term created"
        );
        Ok(created)
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Replace a term's mutable fields.
    ///
    /// A change of name, parent or glossary cascades over the subtree.
    #[instrument(skip(self, request), fields(subsystem = "engine", component = "term_service", op = "update_term", term_id = %id))]
    pub async fn update_term(&self, id: Uuid, request: UpdateTermRequest) -> Result<TermUpdate> {
        let start = Instant::now();
        let original = self.load(id, Include::NonDeleted, false).await?;

        let mut draft = original.stripped();
        draft.name = request.name;
        draft.display_name = request.display_name;
        draft.description = request.description;
        draft.status = request.status;
        draft.synonyms = dedup(request.synonyms);
        draft.references = request.references;
        draft.tags = request.tags;
        draft.mutually_exclusive = request.mutually_exclusive;
        draft.updated_by = request.updated_by;
        draft.updated_at = Utc::now();

        let prepared = self
            .prepare(
                draft,
                request.glossary_id,
                request.parent_id,
                &request.related_term_ids,
                &request.reviewer_ids,
            )
            .await?;
        validator::validate_rename(&original, &prepared.term.name)?;
        if let Some(parent) = &prepared.parent {
            validator::validate_move(&original.fully_qualified_name, &parent.fully_qualified_name)?;
        }
        if prepared.term.fully_qualified_name != original.fully_qualified_name {
            self.ensure_unique(&prepared.term.fully_qualified_name, Some(id))
                .await?;
        }

        // Validation complete; everything below writes
        let updated = prepared.term;
        let outcome = TermUpdater::new(self, &original, &updated).update().await?;
        self.cache.invalidate(&CacheKey::term(id)).await;
        let fqn_changed = original.fully_qualified_name != updated.fully_qualified_name;
        if fqn_changed {
            self.invalidate_subtree_neighbours(&original).await;
        }

        let term = self.load(id, Include::All, true).await?;
        self.search.on_upsert(&term).await;
        if fqn_changed {
            self.reindex(id, false).await;
        }

        info!(
            term_id = %id,
            fqn = %term.fully_qualified_name,
            changed = ?outcome.change.changed_fields(),
            cascades = outcome.cascades.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Glossary term updated"
        );
        Ok(TermUpdate {
            term,
            change: outcome.change,
            cascades: outcome.cascades,
        })
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Read an active term, materializing the requested derived fields.
    pub async fn get_term(&self, id: Uuid, fields: TermFields) -> Result<GlossaryTerm> {
        self.get_term_with(id, fields, Include::NonDeleted).await
    }

    pub async fn get_term_with(
        &self,
        id: Uuid,
        fields: TermFields,
        include: Include,
    ) -> Result<GlossaryTerm> {
        let key = CacheKey::term(id);
        let term = match self.cache.get(&key).await {
            Some(cached) if include.admits(cached.deleted) => cached,
            Some(_) => return Err(Error::TermNotFound(id)),
            None => {
                debug!(subsystem = "engine", component = "term_service", term_id = %id, "Cache miss");
                let term = self.load(id, include, true).await?;
                self.cache.put(key, term.clone()).await;
                term
            }
        };
        self.select_fields(term, fields).await
    }

    /// Read an active term by FQN.
    pub async fn get_term_by_name(&self, fqn: &str, fields: TermFields) -> Result<GlossaryTerm> {
        let record = self
            .lookup
            .get_term_by_name(fqn, Include::NonDeleted)
            .await?
            .ok_or_else(|| Error::NotFound(format!("glossaryTerm [{}]", fqn)))?;
        self.get_term(record.id, fields).await
    }

    /// Number of entities labelled with the term.
    pub async fn usage_count(&self, id: Uuid) -> Result<i64> {
        let term = self
            .lookup
            .get_term(id, Include::NonDeleted)
            .await?
            .ok_or(Error::TermNotFound(id))?;
        self.tags.usage_count(&term).await
    }

    // =========================================================================
    // LABELS
    // =========================================================================

    /// Apply the term at `term_fqn` as a label to the entity at `target_fqn`.
    pub async fn apply_label(
        &self,
        term_fqn: &str,
        target_fqn: &str,
        label_type: LabelType,
    ) -> Result<()> {
        let term = self
            .lookup
            .get_term_by_name(term_fqn, Include::NonDeleted)
            .await?
            .ok_or_else(|| Error::NotFound(format!("glossaryTerm [{}]", term_fqn)))?;
        self.tags.on_label_applied(&term, target_fqn, label_type).await
    }

    // =========================================================================
    // DELETE / RESTORE
    // =========================================================================

    /// Flag a term (and with `recursive`, its subtree) deleted.
    ///
    /// Edges and tag usage are kept so the term can be restored.
    #[instrument(skip(self), fields(subsystem = "engine", component = "term_service", op = "soft_delete"))]
    pub async fn soft_delete(&self, id: Uuid, recursive: bool) -> Result<Vec<Uuid>> {
        let term = self
            .lookup
            .get_term(id, Include::NonDeleted)
            .await?
            .ok_or(Error::TermNotFound(id))?;
        self.ensure_deletable(&term, recursive, Include::NonDeleted)
            .await?;

        let mut deleted = Vec::new();
        for node in self.subtree_descendants_first(id).await {
            let Some(record) = self.lookup.get_term(node, Include::NonDeleted).await? else {
                continue;
            };
            self.terms.set_deleted(node, true).await?;
            self.cache.invalidate(&CacheKey::term(node)).await;
            self.search
                .on_soft_delete_or_restore(&record.entity_reference(), true)
                .await;
            deleted.push(node);
        }
        self.invalidate_neighbours(&self.load(id, Include::All, false).await?)
            .await;

        info!(
            term_id = %id,
            fqn = %term.fully_qualified_name,
            rows = deleted.len(),
            "Glossary term soft-deleted"
        );
        Ok(deleted)
    }

    /// Reverse a soft delete of the term and its deleted descendants.
    #[instrument(skip(self), fields(subsystem = "engine", component = "term_service", op = "restore"))]
    pub async fn restore(&self, id: Uuid) -> Result<GlossaryTerm> {
        let term = self.load(id, Include::Deleted, false).await?;
        if let Some(glossary) = &term.glossary {
            self.lookup
                .get_glossary(glossary.id, Include::NonDeleted)
                .await?
                .ok_or(Error::GlossaryNotFound(glossary.id))?;
        }
        if let Some(parent) = &term.parent {
            let active = self
                .lookup
                .get_term(parent.id, Include::NonDeleted)
                .await?
                .is_some();
            if !active {
                return Err(Error::InvalidInput(format!(
                    "cannot restore [{}] while its parent [{}] is deleted",
                    term.fully_qualified_name, parent.fully_qualified_name
                )));
            }
        }

        let mut restored = 0usize;
        for node in self.subtree_descendants_first(id).await.into_iter().rev() {
            let Some(record) = self.lookup.get_term(node, Include::Deleted).await? else {
                continue;
            };
            self.terms.set_deleted(node, false).await?;
            self.cache.invalidate(&CacheKey::term(node)).await;
            self.search
                .on_soft_delete_or_restore(&record.entity_reference(), false)
                .await;
            restored += 1;
        }
        self.invalidate_neighbours(&term).await;

        info!(
            term_id = %id,
            fqn = %term.fully_qualified_name,
            rows = restored,
            "Glossary term restored"
        );
        self.get_term(id, TermFields::default()).await
    }

    /// Permanently remove a term (and with `recursive`, its subtree), its
    /// edges, its tag usage and its search document.
    #[instrument(skip(self), fields(subsystem = "engine", component = "term_service", op = "hard_delete"))]
    pub async fn hard_delete(&self, id: Uuid, recursive: bool) -> Result<Vec<Uuid>> {
        let term = self.load(id, Include::All, false).await?;
        self.ensure_deletable(&term, recursive, Include::All).await?;

        // Neighbours are resolved before the edges go away
        self.invalidate_neighbours(&term).await;

        let mut deleted = Vec::new();
        for node in self.subtree_descendants_first(id).await {
            let Some(record) = self.lookup.get_term(node, Include::All).await? else {
                continue;
            };
            self.tags.on_term_delete(&record).await?;
            let edges = self
                .relationships
                .delete_all(node, EntityType::GlossaryTerm)
                .await?;
            self.terms.delete(node).await?;
            self.cache.invalidate(&CacheKey::term(node)).await;
            self.search.on_hard_delete(&record.entity_reference()).await;
            debug!(term_id = %node, fqn = %record.fully_qualified_name, edges, "Term removed");
            deleted.push(node);
        }

        info!(
            term_id = %id,
            fqn = %term.fully_qualified_name,
            rows = deleted.len(),
            "Glossary term hard-deleted"
        );
        Ok(deleted)
    }

    // =========================================================================
    // PREPARE / STORE
    // =========================================================================

    /// Resolve the glossary, parent, related terms and reviewers of `term`,
    /// validate the hierarchy and labels, and derive the FQN. Writes nothing.
    pub(crate) async fn prepare(
        &self,
        mut term: GlossaryTerm,
        glossary_id: Uuid,
        parent_id: Option<Uuid>,
        related_ids: &[Uuid],
        reviewer_ids: &[Uuid],
    ) -> Result<Prepared> {
        validator::validate_name(&term.name)?;

        let glossary = self
            .lookup
            .get_glossary(glossary_id, Include::NonDeleted)
            .await?
            .ok_or(Error::GlossaryNotFound(glossary_id))?;

        let parent = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .lookup
                    .get_term(parent_id, Include::All)
                    .await?
                    .ok_or(Error::TermNotFound(parent_id))?;
                validator::validate_new_parent(&glossary, &parent)?;
                Some(parent)
            }
            None => None,
        };

        let scope_fqn = parent
            .as_ref()
            .map_or(&glossary.fully_qualified_name, |p| &p.fully_qualified_name);
        term.fully_qualified_name = fqn::add(scope_fqn, &term.name)?;
        term.glossary = Some(glossary.entity_reference());
        term.parent = parent.as_ref().map(GlossaryTerm::entity_reference);

        term.related_terms = Vec::new();
        for related_id in unique(related_ids) {
            if related_id == term.id {
                return Err(Error::InvalidInput(format!(
                    "term [{}] cannot be related to itself",
                    term.name
                )));
            }
            let reference = self
                .lookup
                .get_reference(EntityType::GlossaryTerm, related_id, Include::NonDeleted)
                .await?
                .ok_or_else(|| Error::NotFound(format!("glossaryTerm {}", related_id)))?;
            term.related_terms.push(reference);
        }

        term.reviewers = Vec::new();
        for reviewer_id in unique(reviewer_ids) {
            let reference = self
                .lookup
                .get_reference(EntityType::User, reviewer_id, Include::NonDeleted)
                .await?
                .ok_or_else(|| Error::NotFound(format!("user {}", reviewer_id)))?;
            term.reviewers.push(reference);
        }

        self.tags.check_mutually_exclusive(&term.tags).await?;
        let mut labels: Vec<TagLabel> = Vec::with_capacity(term.tags.len());
        for mut label in std::mem::take(&mut term.tags) {
            if labels.iter().any(|l| l.same_tag(&label)) {
                continue;
            }
            if label.tag_fqn == term.fully_qualified_name {
                return Err(Error::InvalidInput(format!(
                    "term [{}] cannot be labelled with itself",
                    label.tag_fqn
                )));
            }
            self.tags.apply_common_fields(&mut label).await?;
            labels.push(label);
        }
        term.tags = labels;

        Ok(Prepared { term, parent })
    }

    async fn ensure_unique(&self, fqn: &str, except: Option<Uuid>) -> Result<()> {
        if let Some(existing) = self.lookup.get_term_by_name(fqn, Include::All).await? {
            if Some(existing.id) != except {
                return Err(Error::InvalidInput(format!(
                    "glossary term [{}] already exists",
                    fqn
                )));
            }
        }
        Ok(())
    }

    async fn ensure_deletable(
        &self,
        term: &GlossaryTerm,
        recursive: bool,
        include: Include,
    ) -> Result<()> {
        if recursive {
            return Ok(());
        }
        for child in self.child_ids(term.id).await? {
            if self.lookup.get_term(child, include).await?.is_some() {
                return Err(Error::InvalidInput(format!(
                    "term [{}] has children; delete recursively",
                    term.fully_qualified_name
                )));
            }
        }
        Ok(())
    }

    /// Persist the record, with every edge-derived field cleared, together
    /// with `edges`.
    pub(crate) async fn store(&self, term: &GlossaryTerm, edges: &EdgeChanges) -> Result<()> {
        self.terms.write_with_edges(&term.stripped(), edges).await
    }

    // =========================================================================
    // MATERIALIZATION
    // =========================================================================

    /// Load a term record and derive its edge-backed fields.
    ///
    /// With `inherit`, missing owner, domain and reviewers are filled from the
    /// nearest ancestor term or the glossary.
    pub(crate) async fn load(&self, id: Uuid, include: Include, inherit: bool) -> Result<GlossaryTerm> {
        let mut term = self
            .lookup
            .get_term(id, include)
            .await?
            .ok_or(Error::TermNotFound(id))?;

        term.glossary = self.glossary_of(id).await?;
        term.parent = self.parent_of(id).await?;
        term.children = self
            .references(EntityType::GlossaryTerm, self.child_ids(id).await?)
            .await?;
        let related = self
            .relationships
            .find_to(
                id,
                EntityType::GlossaryTerm,
                Relationship::RelatedTo,
                EntityType::GlossaryTerm,
            )
            .await?;
        term.related_terms = self
            .references(EntityType::GlossaryTerm, related.into_iter().map(|r| r.id).collect())
            .await?;
        term.reviewers = self.reviewers_of(id).await?;

        if inherit {
            self.inherit_fields(&mut term).await?;
        }
        Ok(term)
    }

    async fn glossary_of(&self, id: Uuid) -> Result<Option<EntityReference>> {
        for relation in [Relationship::Contains, Relationship::Has] {
            let owners = self
                .relationships
                .find_from(id, EntityType::GlossaryTerm, relation, EntityType::Glossary)
                .await?;
            if let Some(owner) = owners.first() {
                return self
                    .lookup
                    .get_reference(EntityType::Glossary, owner.id, Include::All)
                    .await;
            }
        }
        Ok(None)
    }

    async fn parent_of(&self, id: Uuid) -> Result<Option<EntityReference>> {
        let parents = self
            .relationships
            .find_from(
                id,
                EntityType::GlossaryTerm,
                Relationship::Contains,
                EntityType::GlossaryTerm,
            )
            .await?;
        match parents.first() {
            Some(parent) => {
                self.lookup
                    .get_reference(EntityType::GlossaryTerm, parent.id, Include::All)
                    .await
            }
            None => Ok(None),
        }
    }

    pub(crate) async fn child_ids(&self, id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .relationships
            .find_to(
                id,
                EntityType::GlossaryTerm,
                Relationship::Contains,
                EntityType::GlossaryTerm,
            )
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    async fn reviewers_of(&self, id: Uuid) -> Result<Vec<EntityReference>> {
        let reviewers = self
            .relationships
            .find_from(id, EntityType::GlossaryTerm, Relationship::Reviews, EntityType::User)
            .await?;
        self.references(EntityType::User, reviewers.into_iter().map(|r| r.id).collect())
            .await
    }

    async fn references(
        &self,
        entity_type: EntityType,
        ids: Vec<Uuid>,
    ) -> Result<Vec<EntityReference>> {
        let mut references = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(reference) = self.lookup.get_reference(entity_type, id, Include::All).await? {
                references.push(reference);
            }
        }
        references.sort_by(|a, b| a.fully_qualified_name.cmp(&b.fully_qualified_name));
        Ok(references)
    }

    async fn inherit_fields(&self, term: &mut GlossaryTerm) -> Result<()> {
        let mut current = term.parent_id();
        let mut depth = 0;
        while let Some(ancestor_id) = current {
            if term.owner.is_some() && term.domain.is_some() && !term.reviewers.is_empty() {
                return Ok(());
            }
            if depth >= self.config.max_cascade_depth {
                break;
            }
            depth += 1;

            let Some(ancestor) = self.lookup.get_term(ancestor_id, Include::All).await? else {
                break;
            };
            if term.owner.is_none() {
                term.owner = ancestor.owner.as_ref().map(EntityReference::as_inherited);
            }
            if term.domain.is_none() {
                term.domain = ancestor.domain.as_ref().map(EntityReference::as_inherited);
            }
            if term.reviewers.is_empty() {
                term.reviewers = self
                    .reviewers_of(ancestor_id)
                    .await?
                    .iter()
                    .map(EntityReference::as_inherited)
                    .collect();
            }
            current = self.parent_of(ancestor_id).await?.map(|p| p.id);
        }

        if let Some(glossary_ref) = &term.glossary {
            if let Some(glossary) = self.lookup.get_glossary(glossary_ref.id, Include::All).await? {
                if term.owner.is_none() {
                    term.owner = glossary.owner.as_ref().map(EntityReference::as_inherited);
                }
                if term.domain.is_none() {
                    term.domain = glossary.domain.as_ref().map(EntityReference::as_inherited);
                }
                if term.reviewers.is_empty() {
                    term.reviewers = glossary
                        .reviewers
                        .iter()
                        .map(EntityReference::as_inherited)
                        .collect();
                }
            }
        }
        Ok(())
    }

    async fn select_fields(&self, mut term: GlossaryTerm, fields: TermFields) -> Result<GlossaryTerm> {
        if !fields.children {
            term.children.clear();
        }
        if !fields.related_terms {
            term.related_terms.clear();
        }
        if !fields.reviewers {
            term.reviewers.clear();
        }
        term.usage_count = if fields.usage_count {
            Some(self.tags.usage_count(&term).await?)
        } else {
            None
        };
        Ok(term)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// `root` and its descendants, children before parents.
    async fn subtree_descendants_first(&self, root: Uuid) -> Vec<Uuid> {
        let mut report = CascadeReport::default();
        let mut subtree = self.cascade.collect_subtree(root, &mut report).await;
        subtree.reverse();
        subtree
    }

    /// Drop cached materializations that list `term` as parent, child or
    /// related term.
    pub(crate) async fn invalidate_neighbours(&self, term: &GlossaryTerm) {
        let neighbours = term
            .parent
            .iter()
            .chain(&term.related_terms)
            .chain(&term.children)
            .map(|r| r.id);
        for id in neighbours {
            self.cache.invalidate(&CacheKey::term(id)).await;
        }
    }

    /// Drop cached terms outside the subtree of `original` that embed an FQN
    /// from it: its parent and the related terms of every node.
    async fn invalidate_subtree_neighbours(&self, original: &GlossaryTerm) {
        self.invalidate_neighbours(original).await;

        let mut report = CascadeReport::default();
        for id in self.cascade.collect_subtree(original.id, &mut report).await {
            let related = self
                .relationships
                .find_to(
                    id,
                    EntityType::GlossaryTerm,
                    Relationship::RelatedTo,
                    EntityType::GlossaryTerm,
                )
                .await;
            match related {
                Ok(related) => {
                    for r in related {
                        self.cache.invalidate(&CacheKey::term(r.id)).await;
                    }
                }
                Err(e) => warn!(
                    subsystem = "engine",
                    component = "term_service",
                    term_id = %id,
                    error = %e,
                    "Could not resolve related terms to invalidate"
                ),
            }
        }
    }

    /// Re-send the search documents of `root` and its descendants so they
    /// carry the current FQNs.
    ///
    /// Returns the number of documents queued.
    pub async fn reindex_subtree(&self, root: Uuid) -> usize {
        self.reindex(root, true).await
    }

    async fn reindex(&self, root: Uuid, include_root: bool) -> usize {
        let mut report = CascadeReport::default();
        let mut queued = 0;
        for id in self.cascade.collect_subtree(root, &mut report).await {
            if id == root && !include_root {
                continue;
            }
            match self.load(id, Include::All, true).await {
                Ok(term) => {
                    self.search.on_upsert(&term).await;
                    queued += 1;
                }
                Err(e) => warn!(
                    subsystem = "engine",
                    component = "term_service",
                    term_id = %id,
                    error = %e,
                    "Could not reindex term"
                ),
            }
        }
        queued
    }
}

// =============================================================================
// EDGE BUILDERS
// =============================================================================

/// Glossary, parent, related-term and reviewer edges of a new term.
pub(crate) fn relationship_edges(term: &GlossaryTerm) -> EdgeChanges {
    let mut edges = EdgeChanges::default();
    if let Some(glossary) = &term.glossary {
        edges.add(glossary_edge(glossary.id, term.id, term.is_root()), false);
    }
    if let Some(parent) = &term.parent {
        edges.add(parent_edge(parent.id, term.id), false);
    }
    for related in &term.related_terms {
        edges.add(related_edge(term.id, related.id), true);
    }
    for reviewer in &term.reviewers {
        edges.add(reviewer_edge(reviewer.id, term.id), false);
    }
    edges
}

/// Glossary → term edge: `Contains` for a root term, `Has` otherwise.
pub(crate) fn glossary_edge(glossary_id: Uuid, term_id: Uuid, root: bool) -> EntityRelationship {
    EntityRelationship::new(
        glossary_id,
        EntityType::Glossary,
        term_id,
        EntityType::GlossaryTerm,
        if root {
            Relationship::Contains
        } else {
            Relationship::Has
        },
    )
}

pub(crate) fn parent_edge(parent_id: Uuid, term_id: Uuid) -> EntityRelationship {
    EntityRelationship::new(
        parent_id,
        EntityType::GlossaryTerm,
        term_id,
        EntityType::GlossaryTerm,
        Relationship::Contains,
    )
}

pub(crate) fn related_edge(term_id: Uuid, related_id: Uuid) -> EntityRelationship {
    EntityRelationship::new(
        term_id,
        EntityType::GlossaryTerm,
        related_id,
        EntityType::GlossaryTerm,
        Relationship::RelatedTo,
    )
}

pub(crate) fn reviewer_edge(user_id: Uuid, term_id: Uuid) -> EntityRelationship {
    EntityRelationship::new(
        user_id,
        EntityType::User,
        term_id,
        EntityType::GlossaryTerm,
        Relationship::Reviews,
    )
}

fn unique(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glossary_edge_relation_depends_on_root() {
        let (g, t) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(glossary_edge(g, t, true).relation, Relationship::Contains);
        assert_eq!(glossary_edge(g, t, false).relation, Relationship::Has);
        assert_eq!(glossary_edge(g, t, false).from_type, EntityType::Glossary);
    }

    #[test]
    fn test_reviewer_edge_points_from_user() {
        let (u, t) = (Uuid::new_v4(), Uuid::new_v4());
        let edge = reviewer_edge(u, t);
        assert_eq!(edge.from_type, EntityType::User);
        assert_eq!(edge.to_id, t);
    }

    #[test]
    fn test_unique_and_dedup_keep_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(unique(&[a, b, a]), vec![a, b]);
        assert_eq!(
            dedup(vec!["x".into(), "y".into(), "x".into()]),
            vec!["x".to_string(), "y".to_string()]
        );
    }
}
