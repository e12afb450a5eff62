//! Testing utilities for RCA workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use rca_core::{NewRootCause, ProjectId, RootCause, RootCauseId, RootCauseScope, TestRunId, TreeNode};
use rca_engine::{EngineConfig, RootCauseEngine};
use rca_memory::{InMemoryStore, SwitchableAccessPolicy, TestRunRegistry};
use std::sync::Arc;

/// Engine wired to in-memory adapters, with handles on each adapter
pub struct Harness {
    pub engine: RootCauseEngine,
    pub store: Arc<InMemoryStore>,
    pub runs: Arc<TestRunRegistry>,
    pub policy: Arc<SwitchableAccessPolicy>,
}

impl Harness {
    /// Create through the engine, panicking on rejection
    pub async fn create(&self, candidate: NewRootCause) -> RootCause {
        self.engine.create(candidate).await.unwrap()
    }

    /// Create a child of `parent`, panicking on rejection
    pub async fn create_under(&self, parent: &RootCause, candidate: NewRootCause) -> RootCause {
        self.create(candidate.with_parent(parent.id)).await
    }

    /// Attribute a fresh test run to `root_cause`
    pub fn link_run(&self, root_cause: &RootCause) -> TestRunId {
        self.runs.insert(TestRunId::new(), Some(root_cause.id))
    }

    /// Act as an administrator
    pub fn as_admin(&self) -> &Self {
        self.policy.set_admin(true);
        self
    }

    /// Act as a regular user
    pub fn as_user(&self) -> &Self {
        self.policy.set_admin(false);
        self
    }
}

pub fn setup_engine(admin: bool) -> Harness {
    setup_engine_with(EngineConfig::new(), admin)
}

pub fn setup_engine_with(config: EngineConfig, admin: bool) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let runs = Arc::new(TestRunRegistry::new());
    let policy = Arc::new(SwitchableAccessPolicy::new(admin));
    let engine = RootCauseEngine::new(config, store.clone(), runs.clone(), policy.clone());

    Harness {
        engine,
        store,
        runs,
        policy,
    }
}

pub fn global(name: &str) -> NewRootCause {
    NewRootCause::new(name, RootCauseScope::Global)
}

pub fn custom(name: &str, project: &str) -> NewRootCause {
    NewRootCause::new(name, RootCauseScope::custom(project))
}

pub fn project(key: &str) -> ProjectId {
    ProjectId::from(key)
}

/// Names of a forest as `(root, [child, ...])` pairs
pub fn shape(forest: &[TreeNode]) -> Vec<(String, Vec<String>)> {
    forest
        .iter()
        .map(|node| {
            (
                node.value.name.clone(),
                node.children.iter().map(|c| c.value.name.clone()).collect(),
            )
        })
        .collect()
}

pub fn expect_node(name: &str, children: &[&str]) -> (String, Vec<String>) {
    (
        name.to_string(),
        children.iter().map(|c| (*c).to_string()).collect(),
    )
}

/// Every id in the forest, pre-order
pub fn forest_ids(forest: &[TreeNode]) -> Vec<RootCauseId> {
    forest.iter().flat_map(TreeNode::ids).collect()
}
