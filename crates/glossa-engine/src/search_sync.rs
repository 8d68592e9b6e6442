//! Search index synchronization.
//!
//! Notifications are fire-and-forget: they are queued on one channel and a
//! single worker task sends them in the order the mutations happened. A
//! failure is logged and never undoes the mutation that triggered it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

use glossa_core::defaults::TAG_FIELD_PATH;
use glossa_core::{EntityReference, GlossaryTerm, Result, SearchClient};

/// Script removing embedded tag labels whose `tagFQN` equals `params.fqn`.
///
/// Iterates backwards so removals do not skip the following element.
pub const TAG_CLEANUP_SCRIPT: &str = "if (ctx._source.tags != null) { \
for (int i = ctx._source.tags.length - 1; i >= 0; i--) { \
if (ctx._source.tags[i].tagFQN == params.fqn) { ctx._source.tags.remove(i); } } }";

enum Job {
    Notify {
        op: &'static str,
        entity: EntityReference,
        task: BoxFuture<'static, Result<()>>,
    },
    /// Acknowledged once every job queued before it has run.
    Flush(oneshot::Sender<()>),
}

/// Sends index updates after term mutations.
pub struct SearchSyncTrigger {
    client: Arc<dyn SearchClient>,
    enabled: bool,
    queue: Mutex<Option<mpsc::UnboundedSender<Job>>>,
}

impl SearchSyncTrigger {
    pub fn new(client: Arc<dyn SearchClient>, enabled: bool) -> Self {
        Self {
            client,
            enabled,
            queue: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-index a created or updated term.
    pub async fn on_upsert(&self, term: &GlossaryTerm) {
        let client = self.client.clone();
        let term = term.clone();
        self.enqueue("update_entity", term.entity_reference(), async move {
            client.update_entity(&term).await
        })
        .await;
    }

    /// Flag a soft-deleted (or restored) term and the labels embedding it.
    pub async fn on_soft_delete_or_restore(&self, entity: &EntityReference, deleted: bool) {
        let client = self.client.clone();
        let target = entity.clone();
        self.enqueue("soft_delete_or_restore", entity.clone(), async move {
            client
                .soft_delete_or_restore(&target, deleted, TAG_FIELD_PATH)
                .await
        })
        .await;
    }

    /// Remove a hard-deleted term's document and strip it from documents
    /// that embed it as a label.
    pub async fn on_hard_delete(&self, entity: &EntityReference) {
        let client = self.client.clone();
        let target = entity.clone();
        self.enqueue("delete_and_clean_references", entity.clone(), async move {
            client
                .delete_and_clean_references(&target, TAG_CLEANUP_SCRIPT, TAG_FIELD_PATH)
                .await
        })
        .await;
    }

    /// Wait for every outstanding notification.
    pub async fn flush(&self) {
        let sender = match self.queue.lock().await.as_ref() {
            Some(sender) => sender.clone(),
            None => return,
        };
        let (ack, done) = oneshot::channel();
        if sender.send(Job::Flush(ack)).is_ok() {
            // Err means the worker is gone, so nothing is left to wait for
            let _ = done.await;
        }
    }

    async fn enqueue<F>(&self, op: &'static str, entity: EntityReference, notify: F)
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        if !self.enabled {
            debug!(
                subsystem = "engine",
                component = "search_sync",
                op,
                term_id = %entity.id,
                "Search sync disabled, dropping notification"
            );
            return;
        }

        let mut queue = self.queue.lock().await;
        let sender = match queue.as_ref() {
            Some(sender) if !sender.is_closed() => sender.clone(),
            _ => {
                let (sender, receiver) = mpsc::unbounded_channel();
                tokio::spawn(run_worker(receiver));
                *queue = Some(sender.clone());
                sender
            }
        };
        let job = Job::Notify {
            op,
            entity,
            task: notify.boxed(),
        };
        if let Err(mpsc::error::SendError(job)) = sender.send(job) {
            if let Job::Notify { op, entity, .. } = job {
                error!(
                    subsystem = "engine",
                    component = "search_sync",
                    op,
                    term_id = %entity.id,
                    "Search notification worker stopped, dropping notification"
                );
            }
        }
    }
}

/// Runs queued notifications one at a time.
async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = receiver.recv().await {
        let (op, entity, task) = match job {
            Job::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
            Job::Notify { op, entity, task } => (op, entity, task),
        };

        match AssertUnwindSafe(task).catch_unwind().await {
            Ok(Ok(())) => debug!(
                subsystem = "engine",
                component = "search_sync",
                op,
                term_id = %entity.id,
                fqn = %entity.fully_qualified_name,
                "Search index notified"
            ),
            Ok(Err(e)) => warn!(
                subsystem = "engine",
                component = "search_sync",
                op,
                term_id = %entity.id,
                fqn = %entity.fully_qualified_name,
                error = %e,
                "Search index notification failed"
            ),
            Err(_) => error!(
                subsystem = "engine",
                component = "search_sync",
                op,
                term_id = %entity.id,
                "Search notification task panicked"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{RecordingSearchClient, SearchCall};
    use uuid::Uuid;

    fn term() -> GlossaryTerm {
        GlossaryTerm::new(Uuid::new_v4(), "Apple", "G.Fruit.Apple")
    }

    #[tokio::test]
    async fn test_hard_delete_sends_cleanup_script() {
        let client = RecordingSearchClient::new();
        let trigger = SearchSyncTrigger::new(Arc::new(client.clone()), true);
        let t = term();

        trigger.on_hard_delete(&t.entity_reference()).await;
        trigger.flush().await;

        match &client.calls()[..] {
            [SearchCall::DeleteAndClean {
                id,
                fqn,
                script,
                field_path,
            }] => {
                assert_eq!(*id, t.id);
                assert_eq!(fqn, "G.Fruit.Apple");
                assert!(script.contains("params.fqn"));
                assert_eq!(field_path, "tags.tagFQN");
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let client = RecordingSearchClient::new();
        let trigger = SearchSyncTrigger::new(Arc::new(client.clone()), true);
        let t = term();

        trigger.on_soft_delete_or_restore(&t.entity_reference(), true).await;
        trigger.flush().await;
        trigger.on_soft_delete_or_restore(&t.entity_reference(), false).await;
        trigger.flush().await;

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            calls[0],
            SearchCall::SoftDeleteOrRestore { deleted: true, .. }
        ));
        assert!(matches!(
            calls[1],
            SearchCall::SoftDeleteOrRestore { deleted: false, .. }
        ));
    }

    /// Deleting takes longer than restoring, so only queue order keeps the
    /// restore last.
    struct SlowDeleteClient {
        flags: std::sync::Mutex<Vec<bool>>,
    }

    #[async_trait::async_trait]
    impl SearchClient for SlowDeleteClient {
        async fn update_entity(&self, _term: &GlossaryTerm) -> Result<()> {
            Ok(())
        }

        async fn soft_delete_or_restore(
            &self,
            _entity: &EntityReference,
            deleted: bool,
            _field_path: &str,
        ) -> Result<()> {
            if deleted {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.flags.lock().unwrap().push(deleted);
            Ok(())
        }

        async fn delete_and_clean_references(
            &self,
            _entity: &EntityReference,
            _cleanup_script: &str,
            _field_path: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notifications_complete_in_mutation_order() {
        let client = Arc::new(SlowDeleteClient {
            flags: std::sync::Mutex::new(Vec::new()),
        });
        let trigger = SearchSyncTrigger::new(client.clone(), true);
        let t = term();

        trigger.on_soft_delete_or_restore(&t.entity_reference(), true).await;
        trigger.on_soft_delete_or_restore(&t.entity_reference(), false).await;
        trigger.flush().await;

        assert_eq!(*client.flags.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_flush_without_notifications_returns() {
        let trigger = SearchSyncTrigger::new(Arc::new(RecordingSearchClient::new()), true);
        trigger.flush().await;
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let client = RecordingSearchClient::new();
        client.set_fail(true);
        let trigger = SearchSyncTrigger::new(Arc::new(client.clone()), true);

        trigger.on_upsert(&term()).await;
        trigger.flush().await;
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_trigger_drops_notifications() {
        let client = RecordingSearchClient::new();
        let trigger = SearchSyncTrigger::new(Arc::new(client.clone()), false);

        trigger.on_upsert(&term()).await;
        trigger.flush().await;
        assert!(client.calls().is_empty());
        assert!(!trigger.is_enabled());
    }

    #[test]
    fn test_cleanup_script_iterates_backwards() {
        assert!(TAG_CLEANUP_SCRIPT.contains("i--"));
        assert!(TAG_CLEANUP_SCRIPT.contains("tags.remove(i)"));
    }
}
