//! Root-cause taxonomy nodes
//!
//! A [`RootCause`] carries its taxonomy as a [`RootCauseScope`]: either
//! `Global`, or `Custom` bound to exactly one project. Holding the project
//! inside the scope variant keeps "GLOBAL has no project, CUSTOM always has
//! one" true by construction. On the wire the scope is flattened back to the
//! `type` / `projectId` pair the reporting UI expects.

use crate::error::ModelError;
use crate::types::{ProjectId, RootCauseId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxonomy tier of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootCauseType {
    /// Curated system-wide, administrators only
    Global,
    /// Owned by a single project
    Custom,
}

impl RootCauseType {
    /// Wire name of the type
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RootCauseType::Global => "GLOBAL",
            RootCauseType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for RootCauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RootCauseType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GLOBAL" => Ok(RootCauseType::Global),
            "CUSTOM" => Ok(RootCauseType::Custom),
            other => Err(ModelError::IllegalType(other.to_string())),
        }
    }
}

/// Scope of a node: its type plus, for CUSTOM nodes, the owning project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr", into = "ScopeRepr")]
pub enum RootCauseScope {
    /// GLOBAL taxonomy, no project
    Global,
    /// CUSTOM taxonomy of one project
    Custom(ProjectId),
}

impl RootCauseScope {
    /// GLOBAL scope
    #[inline]
    #[must_use]
    pub fn global() -> Self {
        Self::Global
    }

    /// CUSTOM scope of `project_id`
    #[inline]
    #[must_use]
    pub fn custom(project_id: impl Into<ProjectId>) -> Self {
        Self::Custom(project_id.into())
    }

    /// Build a scope from loose `type` / `projectId` values
    ///
    /// # Errors
    /// `ModelError::IllegalType` for an unknown type, a GLOBAL type with a
    /// project, or a CUSTOM type without one.
    pub fn from_parts(kind: &str, project_id: Option<ProjectId>) -> Result<Self, ModelError> {
        match (kind.parse::<RootCauseType>()?, project_id) {
            (RootCauseType::Global, None) => Ok(Self::Global),
            (RootCauseType::Custom, Some(project_id)) => Ok(Self::Custom(project_id)),
            (RootCauseType::Global, Some(project_id)) => Err(ModelError::IllegalType(format!(
                "GLOBAL root cause cannot belong to project '{project_id}'"
            ))),
            (RootCauseType::Custom, None) => Err(ModelError::IllegalType(
                "CUSTOM root cause requires a project".to_string(),
            )),
        }
    }

    /// Taxonomy type
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RootCauseType {
        match self {
            Self::Global => RootCauseType::Global,
            Self::Custom(_) => RootCauseType::Custom,
        }
    }

    /// Owning project, CUSTOM only
    #[inline]
    #[must_use]
    pub fn project_id(&self) -> Option<&ProjectId> {
        match self {
            Self::Global => None,
            Self::Custom(project_id) => Some(project_id),
        }
    }

    /// Check if a node of scope `child` may sit directly below this one
    ///
    /// A GLOBAL parent takes children of any scope. A CUSTOM parent only
    /// finds children of its own project, so it accepts nothing else.
    #[inline]
    #[must_use]
    pub fn admits_child(&self, child: &RootCauseScope) -> bool {
        match self {
            Self::Global => true,
            Self::Custom(_) => child == self,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeRepr {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
}

impl TryFrom<ScopeRepr> for RootCauseScope {
    type Error = ModelError;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        Self::from_parts(&repr.kind, repr.project_id)
    }
}

impl From<RootCauseScope> for ScopeRepr {
    fn from(scope: RootCauseScope) -> Self {
        let kind = scope.kind().as_str().to_string();
        match scope {
            RootCauseScope::Global => Self {
                kind,
                project_id: None,
            },
            RootCauseScope::Custom(project_id) => Self {
                kind,
                project_id: Some(project_id),
            },
        }
    }
}

/// A taxonomy node
///
/// `parent_id` is a back-reference by id only; `None` marks a top-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCause {
    /// Assigned at creation, immutable
    pub id: RootCauseId,
    /// Display name, unique within its scope
    pub name: String,
    /// Type and owning project, immutable
    #[serde(flatten)]
    pub scope: RootCauseScope,
    /// Parent node, if any
    #[serde(default)]
    pub parent_id: Option<RootCauseId>,
    /// Hidden (with its subtree) from filtered trees
    #[serde(default)]
    pub disabled: bool,
}

impl RootCause {
    /// Materialize a create candidate under a freshly assigned id
    #[must_use]
    pub fn from_new(id: RootCauseId, candidate: NewRootCause) -> Self {
        Self {
            id,
            name: candidate.name,
            scope: candidate.scope,
            parent_id: candidate.parent_id,
            disabled: candidate.disabled,
        }
    }

    /// Taxonomy type
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RootCauseType {
        self.scope.kind()
    }

    /// Owning project, CUSTOM only
    #[inline]
    #[must_use]
    pub fn project_id(&self) -> Option<&ProjectId> {
        self.scope.project_id()
    }

    /// Whether this is a top-level node
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Create candidate (id not yet assigned)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRootCause {
    /// Display name
    pub name: String,
    /// Type and owning project
    #[serde(flatten)]
    pub scope: RootCauseScope,
    /// Parent node, if any
    #[serde(default)]
    pub parent_id: Option<RootCauseId>,
    /// Initial disabled flag
    #[serde(default)]
    pub disabled: bool,
}

impl NewRootCause {
    /// Create top-level, enabled candidate
    #[must_use]
    pub fn new(name: impl Into<String>, scope: RootCauseScope) -> Self {
        Self {
            name: name.into(),
            scope,
            parent_id: None,
            disabled: false,
        }
    }

    /// Place under `parent_id`
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent_id: RootCauseId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Start disabled
    #[inline]
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Partial update of the mutable fields
///
/// Type and project are fixed at creation and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCausePatch {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the node to the top level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<RootCauseId>>,
    /// New disabled flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl RootCausePatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With new name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With new parent (`None` = top level)
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<RootCauseId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// With new disabled flag
    #[inline]
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Merge the patch onto an existing record
    #[must_use]
    pub fn apply_to(&self, mut record: RootCause) -> RootCause {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        if let Some(parent_id) = self.parent_id {
            record.parent_id = parent_id;
        }
        if let Some(disabled) = self.disabled {
            record.disabled = disabled;
        }
        record
    }
}

/// A node with its resolved children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// The node itself
    pub value: RootCause,
    /// Children in store order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Node without children
    #[inline]
    #[must_use]
    pub fn leaf(value: RootCause) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }

    /// Total node count of this subtree
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Always false; a subtree contains at least its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ids of this subtree in pre-order
    #[must_use]
    pub fn ids(&self) -> Vec<RootCauseId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.value.id);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}
