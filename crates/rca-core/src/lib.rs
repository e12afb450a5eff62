//! RCA Core
//!
//! Data model and collaborator ports for the root-cause classification
//! hierarchy.
//!
//! # Overview
//!
//! - **RootCause**: a taxonomy node, either GLOBAL (curated system-wide) or
//!   CUSTOM (owned by one project)
//! - **TreeNode**: a node materialized together with its resolved children
//! - **Ports**: the storage, test-run and access collaborators the engine
//!   consumes but does not implement
//!
//! The hierarchy is a forest stored flat: every node points at its parent by
//! id only, and children are reconstructed through store lookups.
//!
//! # Example
//!
//! ```rust
//! use rca_core::{NewRootCause, ProjectId, RootCauseScope, RootCauseType};
//!
//! let candidate = NewRootCause::new("Flaky locator", RootCauseScope::custom("checkout"));
//! assert_eq!(candidate.scope.kind(), RootCauseType::Custom);
//! assert_eq!(candidate.scope.project_id(), Some(&ProjectId::from("checkout")));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ports;
pub mod root_cause;
pub mod types;

// Re-exports
pub use error::{LinkError, ModelError, StoreError};
pub use ports::{AccessPolicy, RootCauseStore, TestRunLinkBreaker};
pub use root_cause::{
    NewRootCause, RootCause, RootCausePatch, RootCauseScope, RootCauseType, TreeNode,
};
pub use types::{ProjectId, RootCauseId, TestRunId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the taxonomy model
    pub use crate::{
        AccessPolicy, NewRootCause, ProjectId, RootCause, RootCauseId, RootCausePatch,
        RootCauseScope, RootCauseStore, RootCauseType, StoreError, TestRunLinkBreaker, TreeNode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
