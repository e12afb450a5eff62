//! RCA Engine - Root-cause classification hierarchy
//!
//! Manages a two-taxonomy forest of root causes:
//! - Resolves the tree a project sees (GLOBAL nodes plus its own CUSTOM nodes)
//! - Enforces scoped name uniqueness and admin-only GLOBAL writes
//! - Deletes whole subtrees, detaching linked test runs first
//! - Serves reads from one coarse cache keyspace evicted on every write
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_engine::{EngineConfig, RootCauseEngine};
//! use rca_core::{NewRootCause, ProjectId, RootCauseScope};
//!
//! # async fn example(engine: RootCauseEngine) -> Result<(), Box<dyn std::error::Error>> {
//! let flaky = engine
//!     .create(NewRootCause::new("Flaky locator", RootCauseScope::custom("checkout")))
//!     .await?;
//!
//! let forest = engine.get_tree(&ProjectId::from("checkout"), true).await?;
//! println!("{} top-level nodes, new id {}", forest.len(), flaky.id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod cache;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod tree;
pub mod validation;

// Re-exports for convenience
pub use cache::{CacheKey, CacheStats, RootCauseCache, KEYSPACE};
pub use cascade::{CascadeDeleter, CascadeReport};
pub use config::EngineConfig;
pub use engine::RootCauseEngine;
pub use error::{CascadeStep, EngineError, EngineResult};
pub use hierarchy::ChildLookup;
pub use tree::TreeBuilder;
pub use validation::{AccessGate, Candidate, UniquenessValidator};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{EngineConfig, EngineError, EngineResult, RootCauseEngine};
    pub use rca_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
