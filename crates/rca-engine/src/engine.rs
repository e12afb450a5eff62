//! Root Cause Engine
//!
//! The public contract of the classification hierarchy:
//! - Cached reads (`get`, `get_all`, `get_all_by_project`, `get_by_ids`, `get_tree`)
//! - Validated writes (`create`, `update`, `enable`, `disable`)
//! - Cascading deletion (`delete_by_id`)
//!
//! Every write runs access gate -> uniqueness -> store -> full cache
//! eviction, in that order. A write that fails before reaching the store
//! leaves the cache untouched.

use crate::cache::{CacheKey, CacheStats, RootCauseCache};
use crate::cascade::CascadeDeleter;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::hierarchy::ChildLookup;
use crate::tree::TreeBuilder;
use crate::validation::{AccessGate, Candidate, UniquenessValidator};
use rca_core::{
    AccessPolicy, NewRootCause, ProjectId, RootCause, RootCauseId, RootCausePatch,
    RootCauseScope, RootCauseStore, StoreError, TestRunLinkBreaker, TreeNode,
};
use std::sync::Arc;

/// The root-cause classification hierarchy engine
pub struct RootCauseEngine {
    /// Configuration
    config: EngineConfig,
    /// Durable records
    store: Arc<dyn RootCauseStore>,
    /// Shared read cache
    cache: RootCauseCache,
    /// Admin-only GLOBAL writes
    access: AccessGate,
    /// Scoped name uniqueness
    validator: UniquenessValidator,
    /// Forest projection
    tree_builder: TreeBuilder,
    /// Subtree removal
    deleter: CascadeDeleter,
}

impl RootCauseEngine {
    /// Create new engine over its collaborators
    #[must_use]
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RootCauseStore>,
        link_breaker: Arc<dyn TestRunLinkBreaker>,
        access_policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            cache: RootCauseCache::from_config(&config),
            access: AccessGate::new(access_policy),
            validator: UniquenessValidator::new(store.clone()),
            tree_builder: TreeBuilder::new(store.clone())
                .with_max_depth(config.max_hierarchy_depth),
            deleter: CascadeDeleter::new(store.clone(), link_breaker)
                .with_max_depth(config.max_hierarchy_depth),
            store,
            config,
        }
    }

    /// Get record by id
    ///
    /// # Errors
    /// `NotFound` if no record has `id`.
    pub async fn get(&self, id: RootCauseId) -> EngineResult<RootCause> {
        self.cache
            .try_get_or_load(CacheKey::ById(id), || self.require(id))
            .await
    }

    /// Get all records, store order
    pub async fn get_all(&self) -> EngineResult<Vec<RootCause>> {
        self.cache
            .try_get_or_load(CacheKey::All, || async {
                self.store.find_all().await.map_err(EngineError::from)
            })
            .await
    }

    /// Get all GLOBAL records plus the CUSTOM records of `project_id`
    pub async fn get_all_by_project(&self, project_id: &ProjectId) -> EngineResult<Vec<RootCause>> {
        self.cache
            .try_get_or_load(CacheKey::AllByProject(project_id.clone()), || async {
                let all = self.store.find_all().await.map_err(EngineError::from)?;
                Ok(all
                    .into_iter()
                    .filter(|rc| rc.project_id().map_or(true, |p| p == project_id))
                    .collect())
            })
            .await
    }

    /// Get records for `ids`; unknown ids are skipped
    pub async fn get_by_ids(&self, ids: &[RootCauseId]) -> EngineResult<Vec<RootCause>> {
        self.cache
            .try_get_or_load(CacheKey::ByIds(ids.to_vec()), || async {
                self.store.find_by_ids(ids).await.map_err(EngineError::from)
            })
            .await
    }

    /// Get the taxonomy forest visible to `project_id`
    pub async fn get_tree(
        &self,
        project_id: &ProjectId,
        filter_disabled: bool,
    ) -> EngineResult<Vec<TreeNode>> {
        let key = CacheKey::Tree {
            project_id: project_id.clone(),
            filter_disabled,
        };
        self.cache
            .try_get_or_load(key, || {
                self.tree_builder.build_tree(project_id, filter_disabled)
            })
            .await
    }

    /// Direct children of `node`, one level only
    ///
    /// GLOBAL nodes list children from every project; CUSTOM nodes only those
    /// of `project_id`.
    pub async fn children_of(
        &self,
        node: &RootCause,
        project_id: &ProjectId,
    ) -> EngineResult<Vec<RootCause>> {
        Ok(ChildLookup::for_node(node, Some(project_id))
            .fetch(self.store.as_ref())
            .await?)
    }

    /// Create a record
    ///
    /// # Errors
    /// - `InvalidName` for a blank name
    /// - `IllegalAccess` for a GLOBAL candidate and a non-admin principal
    /// - `AlreadyExists` if the name is taken in the candidate's scope
    /// - `ParentNotFound` if `parent_id` is unknown
    /// - `IllegalParent` if the parent is CUSTOM and the candidate is not
    ///   CUSTOM in the same project
    pub async fn create(&self, mut candidate: NewRootCause) -> EngineResult<RootCause> {
        let result = async {
            candidate.name = normalize_name(&candidate.name)?;
            self.access.authorize_write(&candidate.scope)?;
            self.validator.validate(Candidate::new(&candidate)).await?;
            if let Some(parent_id) = candidate.parent_id {
                self.check_parent(parent_id, &candidate.scope).await?;
            }

            let saved = self
                .persist(RootCause::from_new(RootCauseId::new(), candidate))
                .await?;
            self.cache.evict_all();
            Ok(saved)
        }
        .await;

        match &result {
            Ok(saved) => tracing::info!(
                id = %saved.id,
                kind = %saved.kind(),
                "root cause '{}' created",
                saved.name
            ),
            Err(e) => tracing::warn!("create rejected: {e}"),
        }
        result
    }

    /// Update a record with `patch`
    ///
    /// Access and uniqueness are checked against the merged record.
    ///
    /// # Errors
    /// As [`create`](Self::create), plus `NotFound` for an unknown `id`,
    /// `CyclicHierarchy` when re-parenting under the node's own subtree and
    /// `HierarchyTooDeep` when the new position is below the depth limit.
    pub async fn update(&self, id: RootCauseId, patch: RootCausePatch) -> EngineResult<RootCause> {
        let result = async {
            let existing = self.require(id).await?;
            let mut merged = patch.apply_to(existing.clone());
            merged.name = normalize_name(&merged.name)?;

            self.access.authorize_write(&merged.scope)?;
            self.validator.validate(Candidate::existing(&merged)).await?;
            if merged.parent_id != existing.parent_id {
                if let Some(parent_id) = merged.parent_id {
                    self.check_parent(parent_id, &merged.scope).await?;
                    self.check_reparent(id, parent_id).await?;
                }
            }

            let saved = self.persist(merged).await?;
            self.cache.evict_all();
            Ok(saved)
        }
        .await;

        match &result {
            Ok(saved) => tracing::info!(id = %saved.id, "root cause updated"),
            Err(e) => tracing::warn!(%id, "update rejected: {e}"),
        }
        result
    }

    /// Delete a record and its whole subtree, detaching test runs
    ///
    /// # Errors
    /// - `NotFound` for an unknown `id`
    /// - `IllegalAccess` for a GLOBAL node and a non-admin principal
    /// - `CascadeIncomplete` if the cascade stopped part way; the cache is
    ///   still evicted when any node was already removed
    pub async fn delete_by_id(&self, id: RootCauseId) -> EngineResult<()> {
        let root = self.require(id).await?;
        self.access.authorize_write(&root.scope)?;

        match self.deleter.delete_hierarchy(&root).await {
            Ok(report) => {
                self.cache.evict_all();
                tracing::info!(
                    %id,
                    removed = report.removed.len(),
                    detached_test_runs = report.detached_test_runs,
                    "root cause hierarchy deleted"
                );
                Ok(())
            }
            Err(e) => {
                if e.committed_partially() {
                    self.cache.evict_all();
                }
                Err(e)
            }
        }
    }

    /// Mark a record disabled
    ///
    /// Descendants keep their own flag; filtered trees hide them anyway.
    pub async fn disable(&self, id: RootCauseId) -> EngineResult<RootCause> {
        self.set_disabled(id, true).await
    }

    /// Mark a record enabled
    pub async fn enable(&self, id: RootCauseId) -> EngineResult<RootCause> {
        self.set_disabled(id, false).await
    }

    async fn set_disabled(&self, id: RootCauseId, disabled: bool) -> EngineResult<RootCause> {
        let mut record = self.require(id).await?;
        self.access.authorize_write(&record.scope)?;

        record.disabled = disabled;
        let saved = self.persist(record).await?;
        self.cache.evict_all();
        tracing::info!(%id, disabled, "root cause flag changed");
        Ok(saved)
    }

    /// Load from the store, bypassing the cache
    async fn require(&self, id: RootCauseId) -> EngineResult<RootCause> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    /// Save, mapping the store's unique-index backstop to `AlreadyExists`
    async fn persist(&self, record: RootCause) -> EngineResult<RootCause> {
        let name = record.name.clone();
        let scope = record.scope.clone();
        self.store.save(record).await.map_err(|e| match e {
            StoreError::UniqueViolation { .. } => EngineError::already_exists(name, &scope),
            other => other.into(),
        })
    }

    /// Reject an unknown parent, or one whose children query never returns a
    /// node of `scope`
    async fn check_parent(
        &self,
        parent_id: RootCauseId,
        scope: &RootCauseScope,
    ) -> EngineResult<()> {
        let parent = self
            .store
            .find_by_id(parent_id)
            .await?
            .ok_or(EngineError::ParentNotFound(parent_id))?;
        if !parent.scope.admits_child(scope) {
            return Err(EngineError::illegal_parent(parent_id, scope));
        }
        Ok(())
    }

    /// Reject moving `id` below itself or one of its descendants
    async fn check_reparent(&self, id: RootCauseId, parent_id: RootCauseId) -> EngineResult<()> {
        let mut cursor = Some(parent_id);
        let mut hops = 0;

        while let Some(current) = cursor {
            if current == id {
                return Err(EngineError::CyclicHierarchy(id));
            }
            // One more ancestor would place `id` below the deepest level a walk visits
            if hops >= self.config.max_hierarchy_depth {
                return Err(EngineError::HierarchyTooDeep {
                    root: parent_id,
                    limit: self.config.max_hierarchy_depth,
                });
            }
            let node = self.store.find_by_id(current).await?.ok_or(if hops == 0 {
                EngineError::ParentNotFound(parent_id)
            } else {
                EngineError::NotFound(current)
            })?;
            cursor = node.parent_id;
            hops += 1;
        }
        Ok(())
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get the shared cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &RootCauseCache {
        &self.cache
    }
}

impl std::fmt::Debug for RootCauseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCauseEngine")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

fn normalize_name(name: &str) -> EngineResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName("name must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}
