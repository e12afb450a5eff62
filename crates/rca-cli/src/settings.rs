//! Engine configuration file

use anyhow::{Context, Result};
use rca_engine::EngineConfig;
use std::path::Path;

/// Read engine configuration from a TOML file, or use defaults
///
/// # Errors
/// Fails if `path` is given but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?;

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
