//! RCA Memory
//!
//! In-memory adapters for the engine's ports:
//! - [`InMemoryStore`]: ordered record storage with both unique indexes
//! - [`TestRunRegistry`]: test runs and their root-cause attribution
//! - [`SwitchableAccessPolicy`]: admin flag that can be flipped at runtime
//!
//! Used by the CLI and by tests; the store and registry can also inject
//! failures so partial cascades can be exercised.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod access;
pub mod store;
pub mod test_runs;

pub use access::SwitchableAccessPolicy;
pub use store::{InMemoryStore, GLOBAL_NAME_INDEX, PROJECT_NAME_INDEX};
pub use test_runs::TestRunRegistry;
