//! Write-side validation
//!
//! [`Candidate`] is the shape both `create` and `update` validate: a name in
//! a scope, plus the id of the record being replaced (absent on create).
//!
//! - [`UniquenessValidator`]: scope-dependent name collisions
//! - [`AccessGate`]: GLOBAL writes are reserved to administrators
//!
//! Uniqueness is check-then-write and therefore racy; the store's unique
//! indexes are the authoritative backstop.

use crate::error::{EngineError, EngineResult};
use rca_core::{
    AccessPolicy, NewRootCause, RootCause, RootCauseId, RootCauseScope, RootCauseStore,
    RootCauseType,
};
use std::sync::Arc;

/// A record about to be written
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Id of the record being replaced, `None` on create
    pub id: Option<RootCauseId>,
    /// Name to be written
    pub name: &'a str,
    /// Scope to be written
    pub scope: &'a RootCauseScope,
}

impl<'a> Candidate<'a> {
    /// Candidate for a create
    #[inline]
    #[must_use]
    pub fn new(candidate: &'a NewRootCause) -> Self {
        Self {
            id: None,
            name: &candidate.name,
            scope: &candidate.scope,
        }
    }

    /// Candidate for an update of `record`
    #[inline]
    #[must_use]
    pub fn existing(record: &'a RootCause) -> Self {
        Self {
            id: Some(record.id),
            name: &record.name,
            scope: &record.scope,
        }
    }
}

/// Enforces name uniqueness per scope
///
/// GLOBAL names are unique among GLOBAL records system-wide; CUSTOM names are
/// unique within their project. The two taxonomies never conflict with each
/// other.
#[derive(Clone)]
pub struct UniquenessValidator {
    store: Arc<dyn RootCauseStore>,
}

impl UniquenessValidator {
    /// Create validator over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn RootCauseStore>) -> Self {
        Self { store }
    }

    /// Validate `candidate` against the records already stored
    ///
    /// # Errors
    /// - `AlreadyExists` if another record holds the name in the same scope
    /// - `Store` if the lookup fails
    pub async fn validate(&self, candidate: Candidate<'_>) -> EngineResult<()> {
        let existing = match candidate.scope {
            RootCauseScope::Global => {
                self.store
                    .find_by_name_and_type(candidate.name, RootCauseType::Global)
                    .await?
            }
            RootCauseScope::Custom(project_id) => {
                self.store
                    .find_by_name_and_project(candidate.name, project_id)
                    .await?
            }
        };

        match existing {
            Some(found) if Some(found.id) != candidate.id => Err(EngineError::already_exists(
                candidate.name,
                candidate.scope,
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for UniquenessValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniquenessValidator").finish_non_exhaustive()
    }
}

/// Reserves GLOBAL writes to administrators
#[derive(Clone)]
pub struct AccessGate {
    policy: Arc<dyn AccessPolicy>,
}

impl AccessGate {
    /// Create gate over `policy`
    #[inline]
    #[must_use]
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        Self { policy }
    }

    /// Authorize a write whose resulting scope is `scope`
    ///
    /// # Errors
    /// `IllegalAccess` for a GLOBAL scope when the acting principal is not an
    /// administrator.
    pub fn authorize_write(&self, scope: &RootCauseScope) -> EngineResult<()> {
        match scope {
            RootCauseScope::Global if !self.policy.is_current_user_admin() => {
                Err(EngineError::IllegalAccess)
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}
