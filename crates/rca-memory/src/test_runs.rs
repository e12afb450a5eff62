//! In-memory test-run registry
//!
//! Tracks only what the engine cares about: which root cause, if any, a test
//! run is attributed to.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use rca_core::{LinkError, RootCauseId, TestRunId, TestRunLinkBreaker};

/// Test runs and their root-cause attribution
#[derive(Debug, Default)]
pub struct TestRunRegistry {
    runs: DashMap<TestRunId, Option<RootCauseId>>,
    /// Root causes whose detach fails with a transient error
    failing: DashSet<RootCauseId>,
}

impl TestRunRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test run, returning its id
    pub fn insert(&self, run: TestRunId, root_cause_id: Option<RootCauseId>) -> TestRunId {
        self.runs.insert(run, root_cause_id);
        run
    }

    /// Attribution of `run`; `None` if the run is unknown
    #[must_use]
    pub fn root_cause_of(&self, run: TestRunId) -> Option<Option<RootCauseId>> {
        self.runs.get(&run).map(|entry| *entry.value())
    }

    /// Runs currently attributed to `root_cause_id`
    #[must_use]
    pub fn linked_to(&self, root_cause_id: RootCauseId) -> Vec<TestRunId> {
        self.runs
            .iter()
            .filter(|entry| *entry.value() == Some(root_cause_id))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Number of registered runs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Make detaching from `root_cause_id` fail until cleared
    pub fn fail_detach_of(&self, root_cause_id: RootCauseId) {
        self.failing.insert(root_cause_id);
    }

    /// Drop all injected failures
    pub fn clear_failures(&self) {
        self.failing.clear();
    }
}

#[async_trait]
impl TestRunLinkBreaker for TestRunRegistry {
    async fn unset_root_cause_for_linked_test_runs(
        &self,
        root_cause_id: RootCauseId,
    ) -> Result<u64, LinkError> {
        if self.failing.contains(&root_cause_id) {
            return Err(LinkError::Unavailable(format!(
                "injected detach failure for {root_cause_id}"
            )));
        }

        let mut detached = 0;
        for mut entry in self.runs.iter_mut() {
            if *entry.value() == Some(root_cause_id) {
                *entry.value_mut() = None;
                detached += 1;
            }
        }
        Ok(detached)
    }
}
