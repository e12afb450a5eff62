//! Tree projection
//!
//! Builds the taxonomy forest a project sees: every top-level GLOBAL node,
//! then the project's top-level CUSTOM nodes, each with its subtree.

use crate::error::EngineResult;
use crate::hierarchy::{Hierarchy, Walk};
use rca_core::{ProjectId, RootCauseStore, RootCauseType, TreeNode};
use std::sync::Arc;

/// Assembles the taxonomy forest for a project
#[derive(Clone)]
pub struct TreeBuilder {
    store: Arc<dyn RootCauseStore>,
    max_depth: usize,
}

impl TreeBuilder {
    /// Create builder over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn RootCauseStore>) -> Self {
        Self {
            store,
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

    /// Build the forest visible to `project_id`
    ///
    /// Roots keep store order, GLOBAL before CUSTOM. With `filter_disabled`
    /// a disabled node is dropped together with its whole subtree, whatever
    /// the flags of its descendants.
    ///
    /// # Errors
    /// - `Store` if a query fails
    /// - `CyclicHierarchy` / `HierarchyTooDeep` on a malformed hierarchy
    pub async fn build_tree(
        &self,
        project_id: &ProjectId,
        filter_disabled: bool,
    ) -> EngineResult<Vec<TreeNode>> {
        let mut roots = self.store.find_top_level(RootCauseType::Global).await?;
        roots.extend(
            self.store
                .find_top_level_in_project(project_id, RootCauseType::Custom)
                .await?,
        );

        let walk = Walk {
            project_id: Some(project_id),
            prune_disabled: filter_disabled,
            max_depth: self.max_depth,
        };
        let arena = Hierarchy::explore(self.store.as_ref(), roots, walk).await?;
        tracing::debug!(
            project = %project_id,
            filter_disabled,
            nodes = arena.len(),
            "tree built"
        );

        Ok(arena.into_forest())
    }
}

impl std::fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
