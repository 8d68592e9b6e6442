//! Tag-usage synchronization for glossary terms.
//!
//! A glossary term can be applied as a label to other entities, and can
//! itself carry labels. The reverse index ([`TagUsageStore`]) tracks both;
//! this module keeps it in step with term lifecycle and label changes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use glossa_core::{
    fqn, EntityLookup, Error, GlossaryTerm, Include, LabelScope, LabelType, Result, TagLabel,
    TagSource, TagUsage, TagUsageStore,
};

/// Keeps the tag-usage index consistent with terms and their labels.
#[derive(Clone)]
pub struct TagUsageSynchronizer {
    lookup: Arc<dyn EntityLookup>,
    tag_usage: Arc<dyn TagUsageStore>,
}

impl TagUsageSynchronizer {
    pub fn new(lookup: Arc<dyn EntityLookup>, tag_usage: Arc<dyn TagUsageStore>) -> Self {
        Self { lookup, tag_usage }
    }

    /// Number of entities labelled with `term`.
    pub async fn usage_count(&self, term: &GlossaryTerm) -> Result<i64> {
        self.tag_usage
            .get_count(TagSource::Glossary, &term.fully_qualified_name)
            .await
    }

    /// Remove every usage of the (hard-deleted) term, plus the usages of the
    /// labels the term itself carried.
    pub async fn on_term_delete(&self, term: &GlossaryTerm) -> Result<u64> {
        let fqn = &term.fully_qualified_name;
        let mut rows = self
            .tag_usage
            .delete_by_source(TagSource::Glossary, fqn)
            .await?;
        for label in &term.tags {
            rows += self
                .tag_usage
                .delete_by_target(label.source, &label.tag_fqn, fqn)
                .await?;
        }
        debug!(
            subsystem = "engine",
            component = "tag_usage",
            op = "on_term_delete",
            term_id = %term.id,
            fqn = %fqn,
            rows,
            "Tag usage removed for deleted term"
        );
        Ok(rows)
    }

    /// Record that `term` was applied to `target_fqn`.
    ///
    /// The labels the term carries are applied to the target as `Derived`.
    pub async fn on_label_applied(
        &self,
        term: &GlossaryTerm,
        target_fqn: &str,
        label_type: LabelType,
    ) -> Result<()> {
        let label =
            TagLabel::glossary_term(&term.fully_qualified_name).with_label_type(label_type);
        self.tag_usage
            .apply(&TagUsage::from_label(&label, target_fqn))
            .await?;

        for derived in &term.tags {
            let derived = derived.clone().with_label_type(LabelType::Derived);
            self.tag_usage
                .apply(&TagUsage::from_label(&derived, target_fqn))
                .await?;
        }

        info!(
            subsystem = "engine",
            component = "tag_usage",
            op = "apply_label",
            term_id = %term.id,
            tag_fqn = %term.fully_qualified_name,
            target_fqn,
            derived = term.tags.len(),
            "Glossary term applied"
        );
        Ok(())
    }

    /// Fill a label's name, display name and description from the tag or
    /// term it points at.
    pub async fn apply_common_fields(&self, label: &mut TagLabel) -> Result<()> {
        let scope = self
            .lookup
            .get_label_scope(label.source.node_type(), &label.tag_fqn, Include::NonDeleted)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "{} [{}]",
                    label.source.node_type(),
                    label.tag_fqn
                ))
            })?;
        label.name = Some(scope.name);
        label.display_name = scope.display_name;
        label.description = scope.description;
        Ok(())
    }

    /// Reject label sets that apply two labels from the same mutually
    /// exclusive scope.
    pub async fn check_mutually_exclusive(&self, labels: &[TagLabel]) -> Result<()> {
        // Scope FQN -> first label seen under that scope
        let mut seen: HashMap<(TagSource, String), &TagLabel> = HashMap::new();
        let mut scopes: HashMap<(TagSource, String), Option<LabelScope>> = HashMap::new();

        for label in labels {
            let parts = fqn::split(&label.tag_fqn)?;
            let Some(scope_fqn) = fqn::parent_of(&label.tag_fqn)? else {
                continue;
            };
            let key = (label.source, scope_fqn);

            if !scopes.contains_key(&key) {
                let scope = self
                    .lookup
                    .get_label_scope(label.source.scope_type(parts.len()), &key.1, Include::All)
                    .await?;
                scopes.insert(key.clone(), scope);
            }
            let exclusive = scopes
                .get(&key)
                .and_then(|s| s.as_ref())
                .is_some_and(|s| s.mutually_exclusive);
            if !exclusive {
                continue;
            }

            if let Some(other) = seen.get(&key) {
                if !other.same_tag(label) {
                    return Err(Error::InvalidInput(format!(
                        "tag labels [{}] and [{}] are mutually exclusive and cannot be assigned together",
                        other.tag_fqn, label.tag_fqn
                    )));
                }
            } else {
                seen.insert(key, label);
            }
        }
        Ok(())
    }

    /// Bring tag usage in line with a change to the labels carried by the
    /// term at `term_fqn`.
    ///
    /// Removed labels are deleted, added labels applied. Every entity
    /// labelled with the term receives the added labels as `Derived`.
    pub async fn propagate_term_tags(
        &self,
        term_fqn: &str,
        original: &[TagLabel],
        updated: &[TagLabel],
    ) -> Result<()> {
        let added: Vec<&TagLabel> = updated
            .iter()
            .filter(|u| !original.iter().any(|o| o.same_tag(u)))
            .collect();
        let removed: Vec<&TagLabel> = original
            .iter()
            .filter(|o| !updated.iter().any(|u| u.same_tag(o)))
            .collect();

        for label in &removed {
            self.tag_usage
                .delete_by_target(label.source, &label.tag_fqn, term_fqn)
                .await?;
        }
        for label in &added {
            self.tag_usage
                .apply(&TagUsage::from_label(label, term_fqn))
                .await?;
        }
        if added.is_empty() {
            return Ok(());
        }

        let targets = self
            .tag_usage
            .get_target_fqns(TagSource::Glossary, term_fqn)
            .await?;
        for target in &targets {
            for label in &added {
                let derived = (*label).clone().with_label_type(LabelType::Derived);
                if let Err(e) = self
                    .tag_usage
                    .apply(&TagUsage::from_label(&derived, target.as_str()))
                    .await
                {
                    warn!(
                        subsystem = "engine",
                        component = "tag_usage",
                        tag_fqn = %derived.tag_fqn,
                        target_fqn = %target,
                        error = %e,
                        "Failed to propagate derived label"
                    );
                }
            }
        }

        debug!(
            subsystem = "engine",
            component = "tag_usage",
            op = "propagate_term_tags",
            fqn = term_fqn,
            added = added.len(),
            removed = removed.len(),
            targets = targets.len(),
            "Term labels propagated"
        );
        Ok(())
    }
}
