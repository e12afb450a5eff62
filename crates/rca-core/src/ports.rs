//! Collaborator ports
//!
//! The engine owns none of these: durable storage, test-run bookkeeping and
//! principal resolution live in sibling services. Adapters implement the
//! traits; the engine holds them as `Arc<dyn ...>`.

use crate::error::{LinkError, StoreError};
use crate::root_cause::{RootCause, RootCauseType};
use crate::types::{ProjectId, RootCauseId};
use async_trait::async_trait;

/// Durable keyed storage for root-cause records
///
/// Listing methods return records in a stable store order; tree projections
/// rely on it for deterministic output.
///
/// Implementations must enforce two unique indexes as the backstop for the
/// engine's check-then-write validation: `name` among GLOBAL records, and
/// `(name, projectId)` among CUSTOM records. A violating `save` fails with
/// [`StoreError::UniqueViolation`].
#[async_trait]
pub trait RootCauseStore: Send + Sync {
    /// All records
    async fn find_all(&self) -> Result<Vec<RootCause>, StoreError>;

    /// Record by id
    async fn find_by_id(&self, id: RootCauseId) -> Result<Option<RootCause>, StoreError>;

    /// Records for the given ids; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[RootCauseId]) -> Result<Vec<RootCause>, StoreError>;

    /// CUSTOM record named `name` in `project_id`
    async fn find_by_name_and_project(
        &self,
        name: &str,
        project_id: &ProjectId,
    ) -> Result<Option<RootCause>, StoreError>;

    /// Record named `name` among records of type `kind`
    async fn find_by_name_and_type(
        &self,
        name: &str,
        kind: RootCauseType,
    ) -> Result<Option<RootCause>, StoreError>;

    /// Direct children of `parent_id` across all projects
    async fn find_children(&self, parent_id: RootCauseId) -> Result<Vec<RootCause>, StoreError>;

    /// Direct children of `parent_id` that belong to `project_id`
    async fn find_children_in_project(
        &self,
        parent_id: RootCauseId,
        project_id: &ProjectId,
    ) -> Result<Vec<RootCause>, StoreError>;

    /// Top-level records of type `kind`
    async fn find_top_level(&self, kind: RootCauseType) -> Result<Vec<RootCause>, StoreError>;

    /// Top-level records of type `kind` in `project_id`
    async fn find_top_level_in_project(
        &self,
        project_id: &ProjectId,
        kind: RootCauseType,
    ) -> Result<Vec<RootCause>, StoreError>;

    /// Insert or replace a record, returning what was stored
    async fn save(&self, record: RootCause) -> Result<RootCause, StoreError>;

    /// Remove a record; removing an absent record succeeds
    async fn delete(&self, record: &RootCause) -> Result<(), StoreError>;

    /// Whether a record with `id` exists
    async fn exists(&self, id: RootCauseId) -> Result<bool, StoreError>;
}

/// Clears root-cause references held by test runs
#[async_trait]
pub trait TestRunLinkBreaker: Send + Sync {
    /// Unset `rootCauseId` on every test run pointing at `root_cause_id`
    ///
    /// Returns the number of test runs changed. Calling it again for the same
    /// id is harmless and returns 0.
    async fn unset_root_cause_for_linked_test_runs(
        &self,
        root_cause_id: RootCauseId,
    ) -> Result<u64, LinkError>;
}

/// Answers questions about the acting principal
pub trait AccessPolicy: Send + Sync {
    /// Whether the acting principal is an administrator
    fn is_current_user_admin(&self) -> bool;
}
