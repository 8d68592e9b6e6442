//! Cascading propagation of structural changes.
//!
//! When a term's FQN changes, every dependent representation is rewritten:
//! descendant records, tag usage keyed by the old FQN, and cached
//! materializations of the subtree. Steps are independent and best effort. A
//! failing step is logged and recorded in the [`CascadeReport`], and the
//! remaining steps still run. Every step is idempotent, so re-running a
//! cascade repairs a partial one.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use glossa_core::{
    CacheKey, EntityCache, EntityRelationship, EntityType, Relationship, RelationshipStore,
    Result, TagSource, TagUsageStore, TermStore,
};

/// Outcome of one cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Descendant records whose FQN was rewritten.
    pub records_rewritten: u64,
    /// Tag-usage rows whose tag or target FQN was rewritten.
    pub usages_rewritten: u64,
    /// Cache entries invalidated.
    pub invalidated: usize,
    /// Messages of steps that failed.
    pub errors: Vec<String>,
}

impl CascadeReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn absorb<T: Default>(&mut self, step: &str, result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    component = "cascade",
                    step,
                    error = %e,
                    "Cascade step failed, continuing"
                );
                self.errors.push(format!("{}: {}", step, e));
                T::default()
            }
        }
    }
}

/// Rewrites FQN-dependent state beneath a renamed or moved term.
#[derive(Clone)]
pub struct CascadePropagator {
    terms: Arc<dyn TermStore>,
    relationships: Arc<dyn RelationshipStore>,
    tag_usage: Arc<dyn TagUsageStore>,
    cache: Arc<dyn EntityCache>,
    max_depth: usize,
}

impl CascadePropagator {
    pub fn new(
        terms: Arc<dyn TermStore>,
        relationships: Arc<dyn RelationshipStore>,
        tag_usage: Arc<dyn TagUsageStore>,
        cache: Arc<dyn EntityCache>,
        max_depth: usize,
    ) -> Self {
        Self {
            terms,
            relationships,
            tag_usage,
            cache,
            max_depth: max_depth.max(1),
        }
    }

    /// Propagate an FQN change of term `root` from `old_fqn` to `new_fqn`.
    ///
    /// The root's own record is written by its caller; this rewrites strict
    /// descendants only. No-op when the FQN is unchanged.
    pub async fn propagate(&self, root: Uuid, old_fqn: &str, new_fqn: &str) -> CascadeReport {
        let mut report = CascadeReport::default();
        if old_fqn == new_fqn {
            debug!(
                subsystem = "engine",
                component = "cascade",
                term_id = %root,
                fqn = old_fqn,
                "FQN unchanged, nothing to propagate"
            );
            return report;
        }
        let start = Instant::now();

        // 1. Descendant records
        report.records_rewritten = report.absorb(
            "rewrite_records",
            self.terms.update_fqn_prefix(old_fqn, new_fqn).await,
        );

        // 2. Tag usage: usages of the subtree as a label, then labels applied to it
        let tags = report.absorb(
            "rename_tag_usage",
            self.tag_usage.rename(TagSource::Glossary, old_fqn, new_fqn).await,
        );
        let targets = report.absorb(
            "rename_tag_targets",
            self.tag_usage.rename_targets(old_fqn, new_fqn).await,
        );
        report.usages_rewritten = tags + targets;

        // 3. Cached materializations
        let invalidated = self.invalidate_subtree(root, &mut report).await;
        report.invalidated = invalidated;

        info!(
            subsystem = "engine",
            component = "cascade",
            op = "propagate",
            term_id = %root,
            old_fqn,
            new_fqn,
            rows = report.records_rewritten,
            usages = report.usages_rewritten,
            invalidated = report.invalidated,
            failed_steps = report.errors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Cascade complete"
        );
        report
    }

    /// Invalidate `root` and every `Contains` descendant, depth first.
    ///
    /// Returns the number of cache entries actually dropped.
    pub async fn invalidate_subtree(&self, root: Uuid, report: &mut CascadeReport) -> usize {
        let mut invalidated = 0;
        for id in self.collect_subtree(root, report).await {
            if self.cache.invalidate(&CacheKey::term(id)).await {
                invalidated += 1;
            }
        }
        invalidated
    }

    /// Ids of `root` and its descendants, in depth-first pre-order.
    ///
    /// Guarded against cycles by a visited set and against runaway depth by
    /// the configured limit.
    pub async fn collect_subtree(&self, root: Uuid, report: &mut CascadeReport) -> Vec<Uuid> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                warn!(
                    subsystem = "engine",
                    component = "cascade",
                    term_id = %id,
                    "Term reached twice while walking descendants, skipping"
                );
                continue;
            }
            order.push(id);
            if depth >= self.max_depth {
                warn!(
                    subsystem = "engine",
                    component = "cascade",
                    term_id = %id,
                    max_depth = self.max_depth,
                    "Maximum cascade depth reached, not descending further"
                );
                report
                    .errors
                    .push(format!("max depth {} reached at {}", self.max_depth, id));
                continue;
            }

            let children = report.absorb(
                "find_children",
                self.relationships
                    .find_to(
                        id,
                        EntityType::GlossaryTerm,
                        Relationship::Contains,
                        EntityType::GlossaryTerm,
                    )
                    .await,
            );
            // Reverse so the first child is visited first
            for child in children.into_iter().rev() {
                trace!(subsystem = "engine", component = "cascade", parent = %id, child = %child.id, "Descending");
                stack.push((child.id, depth + 1));
            }
        }
        order
    }

    /// Re-point the `Has` edges of `root`'s strict descendants from
    /// `old_glossary` to `new_glossary`.
    pub async fn reassign_glossary(
        &self,
        root: Uuid,
        old_glossary: Uuid,
        new_glossary: Uuid,
    ) -> CascadeReport {
        let mut report = CascadeReport::default();
        if old_glossary == new_glossary {
            return report;
        }

        let subtree = self.collect_subtree(root, &mut report).await;
        let mut moved = 0u64;
        for id in subtree.into_iter().filter(|id| *id != root) {
            let old_edge = EntityRelationship::new(
                old_glossary,
                EntityType::Glossary,
                id,
                EntityType::GlossaryTerm,
                Relationship::Has,
            );
            let new_edge = EntityRelationship {
                from_id: new_glossary,
                ..old_edge
            };
            let result = match self.relationships.delete_edge(&old_edge, false).await {
                Ok(()) => self.relationships.add_edge(&new_edge, false).await,
                Err(e) => Err(e),
            };
            if result.is_ok() {
                moved += 1;
            }
            report.absorb("reassign_glossary_edge", result);
        }

        info!(
            subsystem = "engine",
            component = "cascade",
            op = "reassign_glossary",
            term_id = %root,
            old_glossary = %old_glossary,
            new_glossary = %new_glossary,
            rows = moved,
            failed_steps = report.errors.len(),
            "Descendant glossary edges reassigned"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LruEntityCache;
    use crate::memory::InMemoryStore;
    use glossa_core::{GlossaryTerm, TagLabel, TagUsage};

    struct Fixture {
        store: Arc<InMemoryStore>,
        cache: Arc<LruEntityCache>,
        propagator: CascadePropagator,
    }

    fn fixture(max_depth: usize) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(LruEntityCache::new(100));
        let propagator = CascadePropagator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
            max_depth,
        );
        Fixture {
            store,
            cache,
            propagator,
        }
    }

    async fn add_term(f: &Fixture, name: &str, fqn: &str, parent: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        f.store
            .upsert(&GlossaryTerm::new(id, name, fqn))
            .await
            .unwrap();
        if let Some(parent) = parent {
            f.store
                .add_edge(
                    &EntityRelationship::new(
                        parent,
                        EntityType::GlossaryTerm,
                        id,
                        EntityType::GlossaryTerm,
                        Relationship::Contains,
                    ),
                    false,
                )
                .await
                .unwrap();
        }
        f.cache
            .put(CacheKey::term(id), GlossaryTerm::new(id, name, fqn))
            .await;
        id
    }

    #[tokio::test]
    async fn test_same_fqn_is_noop() {
        let f = fixture(8);
        let id = add_term(&f, "Fruit", "G.Fruit", None).await;
        let report = f.propagator.propagate(id, "G.Fruit", "G.Fruit").await;
        assert_eq!(report, CascadeReport::default());
        assert!(f.cache.contains(&CacheKey::term(id)).await);
    }

    #[tokio::test]
    async fn test_propagate_rewrites_descendants_and_usage() {
        let f = fixture(8);
        let fruit = add_term(&f, "Fruit", "G.Fruit", None).await;
        let apple = add_term(&f, "Apple", "G.Fruit.Apple", Some(fruit)).await;
        let red = add_term(&f, "Red", "G.Fruit.Apple.Red", Some(apple)).await;
        f.store
            .apply(&TagUsage::from_label(
                &TagLabel::glossary_term("G.Fruit.Apple"),
                "db.orders",
            ))
            .await
            .unwrap();

        let report = f.propagator.propagate(fruit, "G.Fruit", "G.Produce").await;

        assert!(report.is_clean());
        assert_eq!(report.records_rewritten, 2);
        assert_eq!(report.usages_rewritten, 1);
        assert_eq!(report.invalidated, 3);
        assert_eq!(
            f.store.term_fqn(red).await.as_deref(),
            Some("G.Produce.Apple.Red")
        );
        // Root record is written by the caller, not the cascade
        assert_eq!(f.store.term_fqn(fruit).await.as_deref(), Some("G.Fruit"));
        assert_eq!(
            f.store
                .get_count(TagSource::Glossary, "G.Produce.Apple")
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_propagate_twice_is_idempotent() {
        let f = fixture(8);
        let fruit = add_term(&f, "Fruit", "G.Fruit", None).await;
        add_term(&f, "Apple", "G.Fruit.Apple", Some(fruit)).await;

        let first = f.propagator.propagate(fruit, "G.Fruit", "G.Produce").await;
        let second = f.propagator.propagate(fruit, "G.Fruit", "G.Produce").await;
        assert_eq!(first.records_rewritten, 1);
        assert_eq!(second.records_rewritten, 0);
        assert_eq!(second.usages_rewritten, 0);
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn test_cycle_and_depth_guard() {
        let f = fixture(2);
        let a = add_term(&f, "A", "G.A", None).await;
        let b = add_term(&f, "B", "G.A.B", Some(a)).await;
        let c = add_term(&f, "C", "G.A.B.C", Some(b)).await;
        add_term(&f, "D", "G.A.B.C.D", Some(c)).await;
        // Corrupt edge closing a cycle
        f.store
            .add_edge(
                &EntityRelationship::new(
                    b,
                    EntityType::GlossaryTerm,
                    a,
                    EntityType::GlossaryTerm,
                    Relationship::Contains,
                ),
                false,
            )
            .await
            .unwrap();

        let mut report = CascadeReport::default();
        let subtree = f.propagator.collect_subtree(a, &mut report).await;
        // a (depth 0), b (1), c (2, limit); d never reached
        assert_eq!(subtree, vec![a, b, c]);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_step_is_reported_and_others_run() {
        let f = fixture(8);
        let fruit = add_term(&f, "Fruit", "G.Fruit", None).await;
        add_term(&f, "Apple", "G.Fruit.Apple", Some(fruit)).await;
        f.store.fail_fqn_rewrites(true);

        let report = f.propagator.propagate(fruit, "G.Fruit", "G.Produce").await;
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("rewrite_records"));
        // Cache invalidation still ran
        assert_eq!(report.invalidated, 2);
    }

    #[tokio::test]
    async fn test_reassign_glossary_moves_has_edges() {
        let f = fixture(8);
        let (g1, g2) = (Uuid::new_v4(), Uuid::new_v4());
        let fruit = add_term(&f, "Fruit", "G.Fruit", None).await;
        let apple = add_term(&f, "Apple", "G.Fruit.Apple", Some(fruit)).await;
        f.store
            .add_edge(
                &EntityRelationship::new(
                    g1,
                    EntityType::Glossary,
                    apple,
                    EntityType::GlossaryTerm,
                    Relationship::Has,
                ),
                false,
            )
            .await
            .unwrap();

        let report = f.propagator.reassign_glossary(fruit, g1, g2).await;
        assert!(report.is_clean());

        let owners = f
            .store
            .find_from(
                apple,
                EntityType::GlossaryTerm,
                Relationship::Has,
                EntityType::Glossary,
            )
            .await
            .unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].id, g2);
    }
}
