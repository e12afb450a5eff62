//! Cascading deletion
//!
//! Deleting a node deletes its whole subtree and clears every test-run
//! reference to the removed ids. There is no transaction to lean on, so the
//! work is split in two phases:
//!
//! 1. **Plan** (read-only): explore the subtree, disabled nodes included,
//!    using each node's own child lookup.
//! 2. **Execute**: walk the plan in post-order and, per node, run
//!    `DetachTestRuns` then `DeleteNode`.
//!
//! Each step is idempotent. A failing step stops the cascade and surfaces
//! [`EngineError::CascadeIncomplete`] with the nodes already removed; running
//! the delete again resumes from what is left, because the root is always
//! removed last.

use crate::error::{CascadeStep, EngineError, EngineResult};
use crate::hierarchy::{Hierarchy, Walk};
use rca_core::{RootCause, RootCauseId, RootCauseStore, TestRunLinkBreaker};
use std::sync::Arc;

/// Outcome of a completed cascade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Removed nodes, in removal order (root last)
    pub removed: Vec<RootCauseId>,
    /// Test runs whose root-cause reference was cleared
    pub detached_test_runs: u64,
}

/// Removes a node together with its descendants
#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn RootCauseStore>,
    link_breaker: Arc<dyn TestRunLinkBreaker>,
    max_depth: usize,
}

impl CascadeDeleter {
    /// Create deleter
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn RootCauseStore>, link_breaker: Arc<dyn TestRunLinkBreaker>) -> Self {
        Self {
            store,
            link_breaker,
            max_depth: 64,
        }
    }

    /// With max hierarchy depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Delete `root` and its subtree
    ///
    /// # Errors
    /// - Planning errors (`Store`, `CyclicHierarchy`, `HierarchyTooDeep`) are
    ///   returned as-is; nothing has been changed yet
    /// - `CascadeIncomplete` if a step fails after planning
    pub async fn delete_hierarchy(&self, root: &RootCause) -> EngineResult<CascadeReport> {
        let walk = Walk {
            project_id: None,
            prune_disabled: false,
            max_depth: self.max_depth,
        };
        let plan = Hierarchy::explore(self.store.as_ref(), vec![root.clone()], walk).await?;
        tracing::debug!(root = %root.id, nodes = plan.len(), "cascade planned");

        let mut report = CascadeReport::default();
        for node in plan.post_order() {
            let step = CascadeStep::DetachTestRuns(node.id);
            match self.link_breaker.unset_root_cause_for_linked_test_runs(node.id).await {
                Ok(detached) => report.detached_test_runs += detached,
                Err(e) => return Err(incomplete(root.id, step, report, e.into())),
            }

            let step = CascadeStep::DeleteNode(node.id);
            match self.store.delete(node).await {
                Ok(()) => report.removed.push(node.id),
                Err(e) => return Err(incomplete(root.id, step, report, e.into())),
            }
        }

        Ok(report)
    }
}

fn incomplete(
    root: RootCauseId,
    step: CascadeStep,
    report: CascadeReport,
    source: EngineError,
) -> EngineError {
    tracing::warn!(
        %root,
        %step,
        removed = report.removed.len(),
        "cascade delete stopped: {source}"
    );
    EngineError::CascadeIncomplete {
        root,
        step,
        removed: report.removed,
        source: Box::new(source),
    }
}

impl std::fmt::Debug for CascadeDeleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeDeleter")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use rca_core::{LinkError, NewRootCause, RootCauseScope, TestRunId};
    use rca_memory::{InMemoryStore, TestRunRegistry};

    mock! {
        LinkBreaker {}

        #[async_trait::async_trait]
        impl TestRunLinkBreaker for LinkBreaker {
            async fn unset_root_cause_for_linked_test_runs(
                &self,
                root_cause_id: RootCauseId,
            ) -> Result<u64, LinkError>;
        }
    }

    async fn seed(store: &InMemoryStore, candidate: NewRootCause) -> RootCause {
        store
            .save(RootCause::from_new(RootCauseId::new(), candidate))
            .await
            .unwrap()
    }

    /// A -> B -> C, plus an unrelated root Z
    async fn chain(store: &InMemoryStore) -> (RootCause, RootCause, RootCause, RootCause) {
        let a = seed(store, NewRootCause::new("A", RootCauseScope::Global)).await;
        let b = seed(store, NewRootCause::new("B", RootCauseScope::Global).with_parent(a.id)).await;
        let c = seed(
            store,
            NewRootCause::new("C", RootCauseScope::Global)
                .with_parent(b.id)
                .disabled(),
        )
        .await;
        let z = seed(store, NewRootCause::new("Z", RootCauseScope::Global)).await;
        (a, b, c, z)
    }

    #[tokio::test]
    async fn removes_subtree_post_order_and_detaches_runs() {
        let store = Arc::new(InMemoryStore::new());
        let runs = Arc::new(TestRunRegistry::new());
        let (a, b, c, z) = chain(&store).await;

        let run_a = runs.insert(TestRunId::new(), Some(a.id));
        let run_c = runs.insert(TestRunId::new(), Some(c.id));
        let run_z = runs.insert(TestRunId::new(), Some(z.id));

        let deleter = CascadeDeleter::new(store.clone(), runs.clone());
        let report = deleter.delete_hierarchy(&a).await.unwrap();

        assert_eq!(report.removed, vec![c.id, b.id, a.id]);
        assert_eq!(report.detached_test_runs, 2);
        for id in [a.id, b.id, c.id] {
            assert!(!store.exists(id).await.unwrap());
        }
        assert!(store.exists(z.id).await.unwrap());
        assert_eq!(runs.root_cause_of(run_a), Some(None));
        assert_eq!(runs.root_cause_of(run_c), Some(None));
        assert_eq!(runs.root_cause_of(run_z), Some(Some(z.id)));
    }

    #[tokio::test]
    async fn failing_detach_stops_before_parent_is_removed() {
        let store = Arc::new(InMemoryStore::new());
        let (a, b, c, _) = chain(&store).await;

        let failing = b.id;
        let mut breaker = MockLinkBreaker::new();
        breaker
            .expect_unset_root_cause_for_linked_test_runs()
            .returning(move |id| {
                if id == failing {
                    Err(LinkError::Unavailable("test run service down".into()))
                } else {
                    Ok(0)
                }
            });

        let deleter = CascadeDeleter::new(store.clone(), Arc::new(breaker));
        let err = deleter.delete_hierarchy(&a).await.unwrap_err();

        match &err {
            EngineError::CascadeIncomplete {
                root,
                step,
                removed,
                ..
            } => {
                assert_eq!(*root, a.id);
                assert_eq!(*step, CascadeStep::DetachTestRuns(b.id));
                assert_eq!(removed, &vec![c.id]);
            }
            other => panic!("expected CascadeIncomplete, got {other:?}"),
        }
        assert!(err.is_retryable());
        assert!(err.committed_partially());
        assert!(store.exists(a.id).await.unwrap());
        assert!(store.exists(b.id).await.unwrap());
        assert!(!store.exists(c.id).await.unwrap());
    }

    #[tokio::test]
    async fn rerun_resumes_after_partial_failure() {
        let store = Arc::new(InMemoryStore::new());
        let runs = Arc::new(TestRunRegistry::new());
        let (a, b, c, _) = chain(&store).await;
        store.fail_deletes_of(b.id);

        let deleter = CascadeDeleter::new(store.clone(), runs);
        let err = deleter.delete_hierarchy(&a).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::CascadeIncomplete { step: CascadeStep::DeleteNode(id), .. } if id == b.id
        ));

        store.clear_failures();
        let report = deleter.delete_hierarchy(&a).await.unwrap();
        assert_eq!(report.removed, vec![b.id, a.id]);
        assert!(!store.exists(c.id).await.unwrap());
        assert!(store.find_all().await.unwrap().iter().all(|rc| rc.name == "Z"));
    }

    #[tokio::test]
    async fn custom_subtree_stays_within_its_project() {
        let store = Arc::new(InMemoryStore::new());
        let runs = Arc::new(TestRunRegistry::new());
        let parent = seed(&store, NewRootCause::new("P", RootCauseScope::custom("p1"))).await;
        let own = seed(
            &store,
            NewRootCause::new("own", RootCauseScope::custom("p1")).with_parent(parent.id),
        )
        .await;

        let report = CascadeDeleter::new(store.clone(), runs)
            .delete_hierarchy(&parent)
            .await
            .unwrap();

        assert_eq!(report.removed, vec![own.id, parent.id]);
    }
}
