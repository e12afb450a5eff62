//! RCA CLI
//!
//! Runs engine operations against in-memory adapters loaded from a seed
//! file. Each invocation starts from the seed; nothing is written back.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod commands;
pub mod seed;
pub mod settings;

pub use commands::{cli, execute, GlobalOptions, Request};
pub use seed::{Seed, SeedTestRun};
pub use settings::load_config;

use anyhow::Result;
use rca_engine::RootCauseEngine;
use rca_memory::{InMemoryStore, SwitchableAccessPolicy, TestRunRegistry};
use std::sync::Arc;

/// Wire an engine to the adapters described by `options`
///
/// # Errors
/// Fails if the config or seed file cannot be loaded.
pub fn build_engine(options: &GlobalOptions) -> Result<RootCauseEngine> {
    let config = load_config(options.config.as_deref())?;
    let (store, runs) = match &options.seed {
        Some(path) => Seed::load(path)?.into_adapters()?,
        None => (InMemoryStore::new(), TestRunRegistry::new()),
    };
    tracing::info!(
        records = store.len(),
        test_runs = runs.len(),
        admin = options.admin,
        "engine ready"
    );

    Ok(RootCauseEngine::new(
        config,
        Arc::new(store),
        Arc::new(runs),
        Arc::new(SwitchableAccessPolicy::new(options.admin)),
    ))
}
