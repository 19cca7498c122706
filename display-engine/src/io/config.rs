//! Engine configuration stored in `display-engine.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "display-engine.toml";

/// Engine configuration (TOML).
///
/// Missing fields default to the values a host integration would use.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluate environment snapshots whose `expiresAt` has elapsed.
    pub allow_stale_environment: bool,

    /// Evaluate visitor snapshots whose `expiresAt` has elapsed.
    pub allow_stale_user: bool,

    /// Apply survey `displayPercentage` rollouts.
    pub percentage_gate: bool,

    /// Query parameter that switches the widget into debug mode.
    pub debug_query_param: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_stale_environment: false,
            allow_stale_user: true,
            percentage_gate: true,
            debug_query_param: "formbricksDebug".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let param = self.debug_query_param.as_str();
        if param.is_empty() {
            return Err(anyhow!("debug_query_param must be non-empty"));
        }
        if param.trim() != param {
            return Err(anyhow!(
                "debug_query_param must not have surrounding whitespace"
            ));
        }
        if param.contains(['=', '&', '?']) {
            return Err(anyhow!(
                "debug_query_param must not contain '=', '&' or '?'"
            ));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
