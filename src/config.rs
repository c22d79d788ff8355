use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::collector::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::collector::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::staging::StagePolicy;
use crate::storage::ColorPolicy;

/// Environment variable that overrides `api.api_key`
pub const API_KEY_ENV: &str = "HARVEST_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarvestConfig {
    pub database: Option<String>,
    pub api: ApiConfig,
    pub collect: CollectConfig,
    pub migrate: MigrateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    pub page_size: u32,
    pub max_pages: u32,
    pub categories: Vec<String>,
    pub stage_policy: StagePolicy,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            categories: default_categories(),
            stage_policy: StagePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MigrateConfig {
    pub colors: ColorPolicy,
}

pub fn default_categories() -> Vec<String> {
    ["Coins", "Paintings", "Drawings", "Vessels", "Sculpture"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("harvest.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("harvest.db")
}

impl HarvestConfig {
    /// Database path: explicit override, then config, then default
    pub fn database_path(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path)
    }

    /// API key from the environment, falling back to the config file
    pub fn api_key(&self) -> anyhow::Result<String> {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.api.api_key.as_deref())
    }
}

fn resolve_api_key(env: Option<String>, configured: Option<&str>) -> anyhow::Result<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| configured.filter(|k| !k.trim().is_empty()).map(str::to_string))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no API key configured (set {} or api.api_key in harvest.toml)",
                API_KEY_ENV
            )
        })
}

/// Load the config file; a missing file yields the defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<HarvestConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(HarvestConfig::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: HarvestConfig = toml::from_str(&contents)?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &HarvestConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
