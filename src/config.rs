use crate::app_dirs::AppDirs;
use crate::catalog::{Catalog, Selection, SelectionError};
use crate::drill::DEFAULT_HOLD_MS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for the remote evaluation backend. The key itself is read from
/// the environment variable named by `api_key_env`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Catalog ids to practice. `None` means the default first few entries.
    pub selected: Option<Vec<String>>,
    pub random_mode: bool,
    pub hold_ms: u64,
    pub offline_delay_ms: u64,
    pub offline: bool,
    pub evaluator: EvaluatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selected: None,
            random_mode: false,
            hold_ms: DEFAULT_HOLD_MS,
            offline_delay_ms: 1500,
            offline: false,
            evaluator: EvaluatorConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the configured ids against the catalog
    pub fn selection(&self, catalog: &Catalog) -> Result<Selection, SelectionError> {
        match &self.selected {
            Some(ids) => Selection::from_ids(catalog, ids),
            None => Ok(Selection::default_for(catalog)),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = %self.path.display(), "ignoring bad config: {}", e),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::from)?;
        fs::write(&self.path, data)
    }
}
