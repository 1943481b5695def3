use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::defrag::DEFAULT_MAX_TRACKERS;
use crate::flow::DEFAULT_MAX_FLOWS;
use crate::packet::DEFAULT_POOL_SIZE;

pub const DUMP_DIR_ENV: &str = "REDUMP_DUMP_DIR";
pub const DEFAULT_DUMP_DIR: &str = "dump";
pub const DEFAULT_CONFIG_FILE: &str = "redump.toml";
pub const DEFAULT_PERSISTENT_ITERATIONS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct HarnessPaths {
    pub dump_dir: PathBuf,
}

impl HarnessPaths {
    /// `--dump-dir`, then `REDUMP_DUMP_DIR`, then `./dump`.
    pub fn discover_with_override(override_dir: Option<&Path>) -> Self {
        if let Some(dir) = override_dir {
            return Self::from_dump_dir(dir.to_path_buf());
        }

        if let Ok(dir) = env::var(DUMP_DIR_ENV)
            && !dir.trim().is_empty()
        {
            return Self::from_dump_dir(PathBuf::from(dir));
        }

        Self::from_dump_dir(PathBuf::from(DEFAULT_DUMP_DIR))
    }

    pub fn from_dump_dir(dump_dir: PathBuf) -> Self {
        Self { dump_dir }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_defrag_trackers: Option<usize>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_flows: Option<usize>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_iterations: Option<u64>,
}

impl HarnessConfig {
    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config: {}", path.display()));
            }
        };
        toml::from_str::<Self>(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// An explicitly named config file has to exist; the implicit
    /// `redump.toml` may be absent.
    pub fn load_with_override(override_path: Option<&Path>) -> Result<Self> {
        match override_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                Self::load(path)
            }
            None => Self::load(Path::new(DEFAULT_CONFIG_FILE)),
        }
    }

    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1)
    }

    pub fn effective_max_defrag_trackers(&self) -> usize {
        self.max_defrag_trackers
            .unwrap_or(DEFAULT_MAX_TRACKERS)
            .max(1)
    }

    pub fn effective_max_flows(&self) -> usize {
        self.max_flows.unwrap_or(DEFAULT_MAX_FLOWS).max(1)
    }

    pub fn effective_persistent_iterations(&self, cli_override: Option<u64>) -> u64 {
        cli_override
            .or(self.persistent_iterations)
            .unwrap_or(DEFAULT_PERSISTENT_ITERATIONS)
            .max(1)
    }
}
