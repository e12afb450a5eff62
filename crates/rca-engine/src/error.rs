//! Error types for the engine
//!
//! Validation failures (`NotFound`, `AlreadyExists`, `IllegalAccess`,
//! `IllegalType`, ...) are synchronous and never retried. Collaborator
//! failures are passed through and only transient ones are retryable.

use rca_core::{
    LinkError, ModelError, ProjectId, RootCauseId, RootCauseScope, RootCauseType, StoreError,
};
use std::fmt;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Unknown root-cause id
    #[error("root cause not found: {0}")]
    NotFound(RootCauseId),

    /// `parentId` points at a record that does not exist
    #[error("parent root cause not found: {0}")]
    ParentNotFound(RootCauseId),

    /// Parent cannot hold a child of this scope
    #[error("root cause {parent} cannot hold a {} child{}", .child_kind, describe_child_project(.child_project.as_ref()))]
    IllegalParent {
        /// Rejected parent
        parent: RootCauseId,
        /// Type of the child
        child_kind: RootCauseType,
        /// Project of the child, CUSTOM only
        child_project: Option<ProjectId>,
    },

    /// Name already taken within the scope
    #[error("root cause '{name}' already exists in {}", describe_scope(.project_id.as_ref()))]
    AlreadyExists {
        /// Conflicting name
        name: String,
        /// Project of the conflict, `None` for the GLOBAL taxonomy
        project_id: Option<ProjectId>,
    },

    /// Non-administrator writing a GLOBAL node
    #[error("only administrators may modify GLOBAL root causes")]
    IllegalAccess,

    /// Unknown type, or type/project mismatch
    #[error("illegal root cause type: {0}")]
    IllegalType(String),

    /// Blank name
    #[error("invalid root cause name: {0}")]
    InvalidName(String),

    /// A node reached again while walking the hierarchy
    #[error("cyclic hierarchy detected at root cause {0}")]
    CyclicHierarchy(RootCauseId),

    /// Hierarchy deeper than the configured limit
    #[error("hierarchy below {root} exceeds {limit} levels")]
    HierarchyTooDeep {
        /// Node the walk started from
        root: RootCauseId,
        /// Configured depth limit
        limit: usize,
    },

    /// Cascade delete stopped part way
    #[error("cascade delete of {root} stopped at {step} after removing {} node(s): {source}", .removed.len())]
    CascadeIncomplete {
        /// Node the cascade was started for
        root: RootCauseId,
        /// Step that failed
        step: CascadeStep,
        /// Nodes removed before the failure, in removal order
        removed: Vec<RootCauseId>,
        /// Underlying failure
        #[source]
        source: Box<EngineError>,
    },

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Test-run service failure
    #[error("test run link error: {0}")]
    LinkBreaker(#[from] LinkError),
}

impl EngineError {
    /// Create already-exists error for a scope
    pub fn already_exists(name: impl Into<String>, scope: &RootCauseScope) -> Self {
        Self::AlreadyExists {
            name: name.into(),
            project_id: scope.project_id().cloned(),
        }
    }

    /// Create illegal-parent error for a child of `scope`
    pub fn illegal_parent(parent: RootCauseId, scope: &RootCauseScope) -> Self {
        Self::IllegalParent {
            parent,
            child_kind: scope.kind(),
            child_project: scope.project_id().cloned(),
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::LinkBreaker(e) => e.is_transient(),
            Self::CascadeIncomplete { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Check if a failed write may have changed stored state
    #[inline]
    #[must_use]
    pub fn committed_partially(&self) -> bool {
        matches!(self, Self::CascadeIncomplete { removed, .. } if !removed.is_empty())
    }
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::IllegalType(detail) => Self::IllegalType(detail),
        }
    }
}

/// Step of a cascade delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    /// Clear test-run references to the node
    DetachTestRuns(RootCauseId),
    /// Remove the node from the store
    DeleteNode(RootCauseId),
}

impl CascadeStep {
    /// Node the step operates on
    #[inline]
    #[must_use]
    pub fn target(&self) -> RootCauseId {
        match self {
            Self::DetachTestRuns(id) | Self::DeleteNode(id) => *id,
        }
    }
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetachTestRuns(id) => write!(f, "detach-test-runs({id})"),
            Self::DeleteNode(id) => write!(f, "delete-node({id})"),
        }
    }
}

fn describe_scope(project_id: Option<&ProjectId>) -> String {
    match project_id {
        Some(project_id) => format!("project '{project_id}'"),
        None => "the GLOBAL taxonomy".to_string(),
    }
}

fn describe_child_project(project_id: Option<&ProjectId>) -> String {
    project_id.map_or_else(String::new, |p| format!(" of project '{p}'"))
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
