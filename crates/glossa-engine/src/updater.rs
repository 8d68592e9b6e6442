//! Field-by-field application of a term update.
//!
//! Fields are diffed in a fixed order: status, synonyms, references, related
//! terms, reviewers, descriptive fields, labels, then name and finally
//! parent/glossary. Diffing writes nothing; it collects the edge changes,
//! which are stored with the record in one unit. Cache invalidation and
//! cascades follow. The structural steps both cascade from the FQN captured
//! before either ran; when both fire the second cascade finds nothing left
//! to rewrite.

use tracing::debug;
use uuid::Uuid;

use glossa_core::{CacheKey, ChangeDescription, EdgeChanges, EntityReference, GlossaryTerm, Result};

use crate::cascade::CascadeReport;
use crate::term_service::{glossary_edge, parent_edge, related_edge, reviewer_edge, TermService};

/// Output of [`TermUpdater::update`].
pub(crate) struct UpdateOutcome {
    pub change: ChangeDescription,
    pub cascades: Vec<CascadeReport>,
}

/// Applies the difference between `original` and a validated `updated` term,
/// the record included.
pub(crate) struct TermUpdater<'a> {
    service: &'a TermService,
    original: &'a GlossaryTerm,
    updated: &'a GlossaryTerm,
    change: ChangeDescription,
    edges: EdgeChanges,
    /// Terms whose cached materialization lists this one.
    stale: Vec<Uuid>,
    reviewers_changed: bool,
    tags_changed: bool,
    renamed: bool,
    moved: bool,
}

impl<'a> TermUpdater<'a> {
    pub fn new(
        service: &'a TermService,
        original: &'a GlossaryTerm,
        updated: &'a GlossaryTerm,
    ) -> Self {
        Self {
            service,
            original,
            updated,
            change: ChangeDescription::default(),
            edges: EdgeChanges::default(),
            stale: Vec::new(),
            reviewers_changed: false,
            tags_changed: false,
            renamed: false,
            moved: false,
        }
    }

    pub async fn update(mut self) -> Result<UpdateOutcome> {
        self.update_status();
        self.update_synonyms();
        self.update_references();
        self.update_related_terms();
        self.update_reviewers();
        self.update_descriptive_fields();
        self.update_tags();
        self.update_name();
        self.update_parent();

        // Usage rows are keyed by the pre-rename FQN; the cascade rewrites them
        if self.tags_changed {
            self.service
                .tags
                .propagate_term_tags(
                    &self.original.fully_qualified_name,
                    &self.original.tags,
                    &self.updated.tags,
                )
                .await?;
        }

        self.service.store(self.updated, &self.edges).await?;

        for id in &self.stale {
            self.service.cache.invalidate(&CacheKey::term(*id)).await;
        }
        if self.reviewers_changed {
            // Descendants may inherit these reviewers
            let mut report = CascadeReport::default();
            self.service
                .cascade
                .invalidate_subtree(self.original.id, &mut report)
                .await;
        }
        let cascades = self.cascade().await;

        Ok(UpdateOutcome {
            change: self.change,
            cascades,
        })
    }

    fn update_status(&mut self) {
        self.change.record_change(
            "status",
            &Some(self.original.status),
            &Some(self.updated.status),
        );
    }

    fn update_synonyms(&mut self) {
        self.change.record_list_change(
            "synonyms",
            &self.original.synonyms,
            &self.updated.synonyms,
            |a, b| a == b,
        );
    }

    fn update_references(&mut self) {
        self.change.record_list_change(
            "references",
            &self.original.references,
            &self.updated.references,
            |a, b| a.name == b.name && a.endpoint == b.endpoint,
        );
    }

    fn update_related_terms(&mut self) {
        let (added, deleted) = self.change.record_list_change(
            "relatedTerms",
            &self.original.related_terms,
            &self.updated.related_terms,
            same_entity,
        );
        let id = self.original.id;
        for related in &deleted {
            self.edges.remove(related_edge(id, related.id), true);
        }
        for related in &added {
            self.edges.add(related_edge(id, related.id), true);
        }
        // The other side of each pair lists this term too
        self.stale
            .extend(added.iter().chain(&deleted).map(|r| r.id));
    }

    fn update_reviewers(&mut self) {
        let (added, deleted) = self.change.record_list_change(
            "reviewers",
            &self.original.reviewers,
            &self.updated.reviewers,
            same_entity,
        );
        let id = self.original.id;
        for reviewer in &deleted {
            self.edges.remove(reviewer_edge(reviewer.id, id), false);
        }
        for reviewer in &added {
            self.edges.add(reviewer_edge(reviewer.id, id), false);
        }
        self.reviewers_changed = !added.is_empty() || !deleted.is_empty();
    }

    fn update_descriptive_fields(&mut self) {
        self.change.record_change(
            "displayName",
            &self.original.display_name,
            &self.updated.display_name,
        );
        self.change.record_change(
            "description",
            &self.original.description,
            &self.updated.description,
        );
        self.change.record_change(
            "mutuallyExclusive",
            &Some(self.original.mutually_exclusive),
            &Some(self.updated.mutually_exclusive),
        );
    }

    fn update_tags(&mut self) {
        let (added, deleted) = self.change.record_list_change(
            "tags",
            &self.original.tags,
            &self.updated.tags,
            |a, b| a.same_tag(b),
        );
        self.tags_changed = !added.is_empty() || !deleted.is_empty();
    }

    fn update_name(&mut self) {
        if self.original.name == self.updated.name {
            return;
        }
        self.change.record_change(
            "name",
            &Some(&self.original.name),
            &Some(&self.updated.name),
        );
        self.renamed = true;
    }

    fn update_parent(&mut self) {
        let original_glossary = self.original.glossary_id();
        let updated_glossary = self.updated.glossary_id();
        let glossary_changed = original_glossary != updated_glossary;
        let parent_changed = self.original.parent_id() != self.updated.parent_id();
        if !glossary_changed && !parent_changed {
            return;
        }
        self.moved = true;
        let id = self.original.id;

        // The glossary edge kind depends on root-ness, so it is replaced on
        // any structural change
        if let Some(glossary) = original_glossary {
            self.edges
                .remove(glossary_edge(glossary, id, self.original.is_root()), false);
        }
        if let Some(glossary) = updated_glossary {
            self.edges
                .add(glossary_edge(glossary, id, self.updated.is_root()), false);
        }

        if parent_changed {
            if let Some(parent) = self.original.parent_id() {
                self.edges.remove(parent_edge(parent, id), false);
                self.stale.push(parent);
            }
            if let Some(parent) = self.updated.parent_id() {
                self.edges.add(parent_edge(parent, id), false);
                self.stale.push(parent);
            }
            self.change
                .record_change("parent", &self.original.parent, &self.updated.parent);
        }
        if glossary_changed {
            self.change
                .record_change("glossary", &self.original.glossary, &self.updated.glossary);
        }

        debug!(
            subsystem = "engine",
            component = "updater",
            term_id = %id,
            glossary_changed,
            parent_changed,
            "Term moved"
        );
    }

    /// Run the rename and move cascades, in that order.
    async fn cascade(&self) -> Vec<CascadeReport> {
        let id = self.original.id;
        let old_fqn = &self.original.fully_qualified_name;
        let new_fqn = &self.updated.fully_qualified_name;
        let mut cascades = Vec::new();

        if self.renamed {
            cascades.push(self.service.cascade.propagate(id, old_fqn, new_fqn).await);
        }
        if self.moved {
            cascades.push(self.service.cascade.propagate(id, old_fqn, new_fqn).await);
            if let (Some(old), Some(new)) =
                (self.original.glossary_id(), self.updated.glossary_id())
            {
                if old != new {
                    cascades.push(self.service.cascade.reassign_glossary(id, old, new).await);
                }
            }
        }
        cascades
    }
}

fn same_entity(a: &EntityReference, b: &EntityReference) -> bool {
    a.id == b.id
}
