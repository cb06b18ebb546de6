//! Machine configuration, read from `stg.toml`.
//!
//! Searches the given directory then its ancestors; every field falls back
//! to its default when absent.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "stg.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Transition budget for one run; `None` means unbounded.
    pub max_steps: Option<u64>,
    /// Maximum number of continuation frames on the control stack.
    pub max_stack_depth: usize,
    /// Maximum number of ids kept in the diagnostic evaluation stack.
    pub eval_stack_limit: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_stack_depth: 1 << 20,
            eval_stack_limit: 64,
        }
    }
}

impl MachineConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load the nearest `stg.toml` at or above `start`, or the defaults if
    /// there is none.
    pub fn discover(start: &Path) -> Result<Self, ConfigError> {
        match find_config_file(start) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}
