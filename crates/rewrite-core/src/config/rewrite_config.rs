//! Configuration schema

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::RewriteError;
use crate::result::Result;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewriteConfig {
    pub rpc: RpcConfig,
    pub scheduler: SchedulerConfig,
}

/// RPC session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RpcConfig {
    /// Records per `GetObject` response batch
    pub batch_size: usize,
    /// Log every sent and received record at trace level
    pub trace_messages: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            trace_messages: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    pub max_cycles: usize,
    /// Source files visited at once
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_cycles: 3,
            concurrency: 8,
        }
    }
}

impl RewriteConfig {
    /// Load from a `.json`, `.toml`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RewriteError::io_error(path, e))?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed: std::result::Result<Self, String> = match ext {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            // `.rewriterc` without extension is JSON
            None if file_name.starts_with('.') => {
                serde_json::from_str(&content).map_err(|e| e.to_string())
            }
            _ => Err("unsupported file extension (expected .json, .toml, .yaml or .yml)".into()),
        };

        let config: Self = parsed.map_err(|message| {
            RewriteError::config_error(format!("{}: {message}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc.batch_size == 0 {
            return Err(RewriteError::config_error("rpc.batchSize must be at least 1"));
        }
        if self.scheduler.max_cycles == 0 {
            return Err(RewriteError::config_error(
                "scheduler.maxCycles must be at least 1",
            ));
        }
        if self.scheduler.concurrency == 0 {
            return Err(RewriteError::config_error(
                "scheduler.concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}
