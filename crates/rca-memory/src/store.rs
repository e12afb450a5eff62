//! In-memory root-cause store
//!
//! Records live in an insertion-ordered map, so every listing follows the
//! order records were first saved in. Replacing a record keeps its position.
//!
//! Both unique indexes are enforced on `save`:
//! - `global_name`: name among GLOBAL records
//! - `project_name`: `(projectId, name)` among CUSTOM records

use async_trait::async_trait;
use dashmap::DashSet;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rca_core::{
    ProjectId, RootCause, RootCauseId, RootCauseScope, RootCauseStore, RootCauseType, StoreError,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Index over GLOBAL names
pub const GLOBAL_NAME_INDEX: &str = "global_name";
/// Index over CUSTOM `(projectId, name)` pairs
pub const PROJECT_NAME_INDEX: &str = "project_name";

/// Root-cause store backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<IndexMap<RootCauseId, RootCause>>,
    /// Ids whose deletion fails with a backend error
    failing_deletes: DashSet<RootCauseId>,
    /// When set, every call fails with `Unavailable`
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store pre-loaded with `records`, in order
    ///
    /// # Errors
    /// `UniqueViolation` if two records clash on a unique index.
    pub fn with_records(records: impl IntoIterator<Item = RootCause>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                insert_checked(&mut map, record)?;
            }
        }
        Ok(store)
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Make deleting `id` fail until [`clear_failures`](Self::clear_failures)
    pub fn fail_deletes_of(&self, id: RootCauseId) {
        self.failing_deletes.insert(id);
    }

    /// Make every call fail with `Unavailable`, or recover
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Drop all injected failures
    pub fn clear_failures(&self) {
        self.failing_deletes.clear();
        self.set_unavailable(false);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }

    fn select(&self, predicate: impl Fn(&RootCause) -> bool) -> Result<Vec<RootCause>, StoreError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .values()
            .filter(|rc| predicate(rc))
            .cloned()
            .collect())
    }

    fn select_one(
        &self,
        predicate: impl Fn(&RootCause) -> bool,
    ) -> Result<Option<RootCause>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().values().find(|rc| predicate(rc)).cloned())
    }
}

/// Insert or replace `record`, enforcing both unique indexes
fn insert_checked(
    map: &mut IndexMap<RootCauseId, RootCause>,
    record: RootCause,
) -> Result<(), StoreError> {
    let clash = map
        .values()
        .filter(|other| other.id != record.id && other.name == record.name)
        .find_map(|other| match (&record.scope, &other.scope) {
            (RootCauseScope::Global, RootCauseScope::Global) => Some(GLOBAL_NAME_INDEX),
            (RootCauseScope::Custom(a), RootCauseScope::Custom(b)) if a == b => {
                Some(PROJECT_NAME_INDEX)
            }
            _ => None,
        });

    if let Some(index) = clash {
        return Err(StoreError::unique_violation(index, record.name));
    }
    map.insert(record.id, record);
    Ok(())
}

#[async_trait]
impl RootCauseStore for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<RootCause>, StoreError> {
        self.select(|_| true)
    }

    async fn find_by_id(&self, id: RootCauseId) -> Result<Option<RootCause>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[RootCauseId]) -> Result<Vec<RootCause>, StoreError> {
        self.check_available()?;
        let records = self.records.read();
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn find_by_name_and_project(
        &self,
        name: &str,
        project_id: &ProjectId,
    ) -> Result<Option<RootCause>, StoreError> {
        self.select_one(|rc| rc.name == name && rc.project_id() == Some(project_id))
    }

    async fn find_by_name_and_type(
        &self,
        name: &str,
        kind: RootCauseType,
    ) -> Result<Option<RootCause>, StoreError> {
        self.select_one(|rc| rc.name == name && rc.kind() == kind)
    }

    async fn find_children(&self, parent_id: RootCauseId) -> Result<Vec<RootCause>, StoreError> {
        self.select(|rc| rc.parent_id == Some(parent_id))
    }

    async fn find_children_in_project(
        &self,
        parent_id: RootCauseId,
        project_id: &ProjectId,
    ) -> Result<Vec<RootCause>, StoreError> {
        self.select(|rc| rc.parent_id == Some(parent_id) && rc.project_id() == Some(project_id))
    }

    async fn find_top_level(&self, kind: RootCauseType) -> Result<Vec<RootCause>, StoreError> {
        self.select(|rc| rc.is_root() && rc.kind() == kind)
    }

    async fn find_top_level_in_project(
        &self,
        project_id: &ProjectId,
        kind: RootCauseType,
    ) -> Result<Vec<RootCause>, StoreError> {
        self.select(|rc| rc.is_root() && rc.kind() == kind && rc.project_id() == Some(project_id))
    }

    async fn save(&self, record: RootCause) -> Result<RootCause, StoreError> {
        self.check_available()?;
        insert_checked(&mut self.records.write(), record.clone())?;
        Ok(record)
    }

    async fn delete(&self, record: &RootCause) -> Result<(), StoreError> {
        self.check_available()?;
        if self.failing_deletes.contains(&record.id) {
            return Err(StoreError::Backend(format!(
                "injected delete failure for {}",
                record.id
            )));
        }
        self.records.write().shift_remove(&record.id);
        Ok(())
    }

    async fn exists(&self, id: RootCauseId) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.records.read().contains_key(&id))
    }
}
