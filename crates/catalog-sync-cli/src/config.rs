use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use catalog_sync::{CatalogVersion, FailurePolicy, MissingJob, SyncOptions};
use serde::Deserialize;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub platform: PlatformSection,
    #[serde(default)]
    pub store: StoreSection,
    pub pipeline: Option<PipelineSection>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Where the catalog platform lives.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSection {
    pub base_url: String,
    /// Name of the environment variable holding the API token.
    pub token_env: Option<String>,
}

impl PlatformSection {
    pub fn token(&self) -> Option<String> {
        self.token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_import_root")]
    pub import_root: PathBuf,
    pub catalog: String,
    #[serde(default)]
    pub policy: FailurePolicy,
    pub deadline_secs: Option<u64>,
}

/// One configured pipeline step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StepConfig {
    /// Import one file through the platform.
    #[serde(rename = "import")]
    Import {
        name: Option<String>,
        path: String,
        #[serde(default)]
        legacy_mode: bool,
    },

    /// Propagate one catalog version to another.
    #[serde(rename = "sync")]
    Sync {
        name: String,
        source: CatalogVersion,
        target: CatalogVersion,
        #[serde(default)]
        on_missing: MissingJob,
        #[serde(default)]
        options: SyncOptions,
    },
}

fn default_import_root() -> PathBuf {
    PathBuf::from(".")
}

/// Config file path: `~/.config/catalog-sync/pipeline.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("catalog-sync").join("pipeline.toml"))
}

/// History database path: `~/.local/share/catalog-sync/history.db`
pub fn default_store_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("could not determine data directory")?;
    let dir = base.join("catalog-sync");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory: {}", dir.display()))?;
    Ok(dir.join("history.db"))
}

/// Load config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path().context("could not determine config directory")?,
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;

    parse_config(&contents).with_context(|| format!("failed to parse config at {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}
