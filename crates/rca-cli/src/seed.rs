//! Seed files
//!
//! A seed is a snapshot of the records and test runs the in-memory adapters
//! start from. JSON and YAML are accepted, chosen by file extension:
//!
//! ```yaml
//! rootCauses:
//!   - id: 01HZX3V8Q0Y7M3T2C9J4K5N6P7
//!     name: Infrastructure
//!     type: GLOBAL
//!   - id: 01HZX3V8Q0Y7M3T2C9J4K5N6P8
//!     name: Flaky locator
//!     type: CUSTOM
//!     projectId: checkout
//!     parentId: 01HZX3V8Q0Y7M3T2C9J4K5N6P7
//! testRuns:
//!   - id: 01HZX3W1D2E3F4G5H6J7K8M9N0
//!     rootCauseId: 01HZX3V8Q0Y7M3T2C9J4K5N6P8
//! ```

use anyhow::{bail, Context, Result};
use rca_core::{RootCause, RootCauseId, TestRunId};
use rca_memory::{InMemoryStore, TestRunRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A test run and its attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTestRun {
    /// Test run id
    pub id: TestRunId,
    /// Attributed root cause, if any
    #[serde(default)]
    pub root_cause_id: Option<RootCauseId>,
}

/// Contents of a seed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    /// Records, in store order
    #[serde(default)]
    pub root_causes: Vec<RootCause>,
    /// Test runs
    #[serde(default)]
    pub test_runs: Vec<SeedTestRun>,
}

impl Seed {
    /// Read a seed from `path`
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;

        let seed: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing YAML seed {}", path.display()))?,
            _ => serde_json::from_str(&raw)
                .with_context(|| format!("parsing JSON seed {}", path.display()))?,
        };

        tracing::debug!(
            path = %path.display(),
            root_causes = seed.root_causes.len(),
            test_runs = seed.test_runs.len(),
            "seed loaded"
        );
        Ok(seed)
    }

    /// Check references between seeded records
    ///
    /// # Errors
    /// Fails on a duplicate id, a parent or test-run reference to an unknown
    /// record, or a record below a CUSTOM parent it does not share a project
    /// with.
    pub fn validate(&self) -> Result<()> {
        let mut scopes = HashMap::new();
        for record in &self.root_causes {
            if scopes.insert(record.id, &record.scope).is_some() {
                bail!("duplicate root cause id {}", record.id);
            }
        }

        for record in &self.root_causes {
            if let Some(parent_id) = record.parent_id {
                let Some(parent_scope) = scopes.get(&parent_id) else {
                    bail!("root cause {} has unknown parent {parent_id}", record.id);
                };
                if !parent_scope.admits_child(&record.scope) {
                    bail!(
                        "root cause {} ({}) cannot sit below CUSTOM parent {parent_id} of another scope",
                        record.id,
                        record.kind()
                    );
                }
            }
        }

        for run in &self.test_runs {
            if let Some(root_cause_id) = run.root_cause_id {
                if !scopes.contains_key(&root_cause_id) {
                    bail!("test run {} references unknown root cause {root_cause_id}", run.id);
                }
            }
        }
        Ok(())
    }

    /// Build the in-memory adapters holding this seed
    ///
    /// # Errors
    /// Fails if [`validate`](Self::validate) fails or two records clash on a
    /// unique index.
    pub fn into_adapters(self) -> Result<(InMemoryStore, TestRunRegistry)> {
        self.validate()?;

        let store = InMemoryStore::with_records(self.root_causes).context("seeding store")?;
        let runs = TestRunRegistry::new();
        for run in self.test_runs {
            runs.insert(run.id, run.root_cause_id);
        }
        Ok((store, runs))
    }
}
