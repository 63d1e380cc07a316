//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use super::rewrite_config::RewriteConfig;
use crate::error::RewriteError;
use crate::result::Result;

/// File names searched in each directory, highest priority first
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".rewriterc.json",
    ".rewriterc",
    "rewrite.toml",
    "rewrite.yaml",
    "rewrite.yml",
    "rewrite.json",
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Walk upward from `start_path` to the first directory holding a config file
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| RewriteError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    pub fn load_from_file(path: &Path) -> Result<RewriteConfig> {
        RewriteConfig::load(path)
    }

    /// Load `custom_path`, or discover from `start_dir`; defaults when nothing is found
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<RewriteConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(RewriteError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(RewriteConfig::default())
            }
        }
    }
}
