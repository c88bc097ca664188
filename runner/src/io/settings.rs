//! Environment settings and the engine configuration file.
//!
//! The environment variables keep the names the original deployment used
//! (including their mixed casing); existing setups keep working unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Search root for account config files.
pub const ENV_CONFIG_PATH: &str = "AUTOMIHOYOBBS_CONFIG_PATH";
/// Optional base-name prefix filter for discovered config files.
pub const ENV_CONFIG_PREFIX: &str = "AUTOMIHOYOBBS_CONFIG_PREFIX";
/// Path of the engine TOML config.
pub const ENV_ENGINE_CONFIG: &str = "AUTOMIHOYOBBS_ENGINE_CONFIG";
/// Unattended-mode trigger specific to this tool (`1` activates).
pub const ENV_AUTORUN: &str = "AutoMihoyoBBS_autorun";
/// Qinglong panel multi-account marker; with [`ENV_QINGLONG_DIR`], forces the `mhy_` prefix.
pub const ENV_QINGLONG_MULTI: &str = "AutoMihoyoBBS_config_multi";
/// Qinglong panel install directory marker.
pub const ENV_QINGLONG_DIR: &str = "QL_DIR";
/// CI marker honored as an unattended-mode trigger (`true` activates).
pub const ENV_GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";

/// Settings resolved from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root path searched for account config files.
    pub config_path: PathBuf,
    /// Optional filename prefix filter.
    pub prefix: Option<String>,
    /// Qinglong naming convention active (`mhy_` prefix required).
    pub qinglong: bool,
    /// Unattended mode requested via environment.
    pub autorun: bool,
    /// Path of the engine TOML config.
    pub engine_config_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary lookup. Tests pass closures instead
    /// of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config_path = lookup(ENV_CONFIG_PATH)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "config".to_string());
        let prefix = lookup(ENV_CONFIG_PREFIX).filter(|value| !value.is_empty());
        let qinglong = lookup(ENV_QINGLONG_MULTI).as_deref() == Some("1")
            && lookup(ENV_QINGLONG_DIR).is_some_and(|value| !value.is_empty());
        let autorun = lookup(ENV_AUTORUN).as_deref() == Some("1")
            || lookup(ENV_GITHUB_ACTIONS).as_deref() == Some("true");
        let engine_config_path = lookup(ENV_ENGINE_CONFIG)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "engine.toml".to_string());

        Self {
            config_path: PathBuf::from(config_path),
            prefix,
            qinglong,
            autorun,
            engine_config_path: PathBuf::from(engine_config_path),
        }
    }
}

/// Task engine and notifier configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// values matching the original deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Task engine argv; the account config path is appended per invocation.
    pub command: Vec<String>,

    /// Wall-clock budget for one engine invocation, in seconds.
    pub task_timeout_secs: u64,

    /// Truncate captured engine stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Lower bound of the random inter-account delay, in seconds.
    pub delay_min_secs: u64,

    /// Upper bound (inclusive) of the random inter-account delay, in seconds.
    pub delay_max_secs: u64,

    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotifyConfig {
    /// Command receiving the JSON report on stdin. Empty disables push.
    pub command: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string(), "main.py".to_string()],
            task_timeout_secs: 15 * 60,
            output_limit_bytes: 100_000,
            delay_min_secs: 3,
            delay_max_secs: 10,
            notify: NotifyConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(anyhow!("command must be a non-empty array"));
        }
        if self.task_timeout_secs == 0 {
            return Err(anyhow!("task_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.delay_min_secs > self.delay_max_secs {
            return Err(anyhow!("delay_min_secs must not exceed delay_max_secs"));
        }
        Ok(())
    }
}

/// Load the engine config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
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
