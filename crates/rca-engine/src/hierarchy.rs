//! Hierarchy walking
//!
//! The forest is stored flat: a node knows its parent id, never its children.
//! Children are resolved through the store with a lookup that depends on the
//! node's taxonomy:
//!
//! | node type | children query                                 |
//! |-----------|------------------------------------------------|
//! | GLOBAL    | by `parentId` alone (children span all projects) |
//! | CUSTOM    | by `(parentId, projectId)`                     |
//!
//! [`Hierarchy::explore`] walks breadth-first from a set of roots, fetching
//! each level's children concurrently, and records every node in an arena
//! indexed by position. Tree projection and cascade deletion both read from
//! that arena, so neither needs recursive async code nor owning pointers
//! between nodes.

use crate::error::{EngineError, EngineResult};
use futures::future::try_join_all;
use rca_core::{ProjectId, RootCause, RootCauseId, RootCauseScope, RootCauseStore, StoreError, TreeNode};
use std::collections::HashSet;

/// Store query resolving one node's direct children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildLookup {
    /// Children by parent id across all projects
    AllProjects(RootCauseId),
    /// Children by parent id within one project
    InProject(RootCauseId, ProjectId),
}

impl ChildLookup {
    /// Lookup for `node`
    ///
    /// CUSTOM nodes are scoped to `project_id` when given, otherwise to their
    /// own project.
    #[must_use]
    pub fn for_node(node: &RootCause, project_id: Option<&ProjectId>) -> Self {
        match &node.scope {
            RootCauseScope::Global => Self::AllProjects(node.id),
            RootCauseScope::Custom(own) => {
                Self::InProject(node.id, project_id.unwrap_or(own).clone())
            }
        }
    }

    /// Run the lookup
    pub async fn fetch(&self, store: &dyn RootCauseStore) -> Result<Vec<RootCause>, StoreError> {
        match self {
            Self::AllProjects(parent_id) => store.find_children(*parent_id).await,
            Self::InProject(parent_id, project_id) => {
                store.find_children_in_project(*parent_id, project_id).await
            }
        }
    }
}

/// Parameters of one walk
#[derive(Debug, Clone, Copy)]
pub(crate) struct Walk<'a> {
    /// Project CUSTOM children are scoped to; `None` uses each node's own
    pub(crate) project_id: Option<&'a ProjectId>,
    /// Drop disabled nodes (and so never descend into them)
    pub(crate) prune_disabled: bool,
    /// Deepest level allowed below a root
    pub(crate) max_depth: usize,
}

#[derive(Debug)]
struct Slot {
    value: RootCause,
    depth: usize,
    root: RootCauseId,
    children: Vec<usize>,
}

/// Arena of explored nodes
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    seen: HashSet<RootCauseId>,
}

impl Hierarchy {
    /// Explore the subtrees below `roots`
    ///
    /// # Errors
    /// - `CyclicHierarchy` if a node is reached twice
    /// - `HierarchyTooDeep` if a level beyond `walk.max_depth` has nodes
    /// - `Store` if a child query fails
    pub(crate) async fn explore(
        store: &dyn RootCauseStore,
        roots: Vec<RootCause>,
        walk: Walk<'_>,
    ) -> EngineResult<Self> {
        let mut arena = Self::default();

        for root in roots {
            if walk.prune_disabled && root.disabled {
                continue;
            }
            let root_id = root.id;
            let idx = arena.push(root, 0, root_id)?;
            arena.roots.push(idx);
        }

        let mut frontier = arena.roots.clone();
        while !frontier.is_empty() {
            let lookups: Vec<ChildLookup> = frontier
                .iter()
                .map(|&idx| ChildLookup::for_node(&arena.slots[idx].value, walk.project_id))
                .collect();
            let fetched = try_join_all(lookups.iter().map(|lookup| lookup.fetch(store))).await?;

            let mut next = Vec::new();
            for (parent, children) in frontier.into_iter().zip(fetched) {
                let depth = arena.slots[parent].depth + 1;
                let root = arena.slots[parent].root;

                for child in children {
                    if walk.prune_disabled && child.disabled {
                        continue;
                    }
                    if depth > walk.max_depth {
                        return Err(EngineError::HierarchyTooDeep {
                            root,
                            limit: walk.max_depth,
                        });
                    }
                    let idx = arena.push(child, depth, root)?;
                    arena.slots[parent].children.push(idx);
                    next.push(idx);
                }
            }
            frontier = next;
        }

        Ok(arena)
    }

    fn push(&mut self, value: RootCause, depth: usize, root: RootCauseId) -> EngineResult<usize> {
        if !self.seen.insert(value.id) {
            return Err(EngineError::CyclicHierarchy(value.id));
        }
        self.slots.push(Slot {
            value,
            depth,
            root,
            children: Vec::new(),
        });
        Ok(self.slots.len() - 1)
    }

    /// Number of explored nodes
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Materialize the forest, roots in input order
    pub(crate) fn into_forest(self) -> Vec<TreeNode> {
        self.roots.iter().map(|&idx| self.materialize(idx)).collect()
    }

    fn materialize(&self, idx: usize) -> TreeNode {
        let slot = &self.slots[idx];
        TreeNode {
            value: slot.value.clone(),
            children: slot
                .children
                .iter()
                .map(|&child| self.materialize(child))
                .collect(),
        }
    }

    /// Nodes in post-order: every node after all of its descendants
    pub(crate) fn post_order(&self) -> Vec<&RootCause> {
        let mut out = Vec::with_capacity(self.slots.len());
        // (slot, children already pushed)
        let mut stack: Vec<(usize, bool)> = self.roots.iter().rev().map(|&idx| (idx, false)).collect();

        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                out.push(&self.slots[idx].value);
                continue;
            }
            stack.push((idx, true));
            for &child in self.slots[idx].children.iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }
}
