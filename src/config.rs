use crate::cli::ColorChoice;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file. An empty value
/// disables config lookup; a missing file is treated like no config.
pub const CONFIG_PATH_ENV: &str = "SEEKR_CONFIG_PATH";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchDefaults,
    pub display: DisplayDefaults,
    pub ignore: IgnoreDefaults,
    pub types: TypeDefaults,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub threads: Option<usize>,
    pub mmap: Option<bool>,
    pub mmap_threshold: Option<u64>,
    pub smart_case: bool,
    pub hidden: bool,
    pub follow: bool,
    /// 0 means unlimited.
    pub max_columns: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayDefaults {
    pub color: Option<ColorChoice>,
    pub context_separator: Option<String>,
    /// Absent means decide by terminal detection.
    pub heading: Option<bool>,
    /// `--colors` specs applied before the command-line ones.
    pub colors: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreDefaults {
    /// Applied before any `--glob`.
    pub globs: Vec<String>,
    /// Read before any `--ignore-file`.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDefaults {
    pub clear: Vec<String>,
    pub add: Vec<String>,
}

impl Config {
    /// Loads the first config file found, or the defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            return explicit_config_path(&explicit);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("seekr/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".seekr.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }
}

fn explicit_config_path(value: &OsStr) -> Option<PathBuf> {
    if value.is_empty() {
        return None;
    }
    let path = PathBuf::from(value);
    if !path.is_file() {
        debug!("{CONFIG_PATH_ENV} names {}, which does not exist; using defaults", path.display());
        return None;
    }
    Some(path)
}
