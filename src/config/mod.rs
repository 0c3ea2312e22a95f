use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::i18n::Lang;
use crate::search::SortSpec;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "DraftBox";
const APP_NAME: &str = "draftbox";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("DRAFTBOX_CONFIG").ok().map(PathBuf::from);
        let override_export = env::var("DRAFTBOX_EXPORT_DIR").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = project_dirs.data_dir().to_path_buf();
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("state"));
        let log_dir = state_dir.join("logs");
        let export_dir = override_export.unwrap_or_else(|| data_dir.join("exports"));

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
            export_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.state_dir,
            &self.log_dir,
            &self.export_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub language: Lang,
    pub default_sort: SortSpec,
    pub auto_save: AutoSaveConfig,
    pub backend: BackendOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: Lang::default(),
            default_sort: SortSpec::default(),
            auto_save: AutoSaveConfig::default(),
            backend: BackendOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        self.backend.apply_env_overrides();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Quiet period after the last edit before a field is written.
    pub debounce_ms: u64,
    /// How long saved/error stay on screen before returning to idle.
    pub status_display_ms: u64,
    pub toast_display_ms: u64,
    pub enabled: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 700,
            status_display_ms: 1_200,
            toast_display_ms: 2_600,
            enabled: true,
        }
    }
}

impl AutoSaveConfig {
    pub fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn status_display(&self) -> Duration {
        Duration::from_millis(self.status_display_ms)
    }

    pub fn toast_display(&self) -> Duration {
        Duration::from_millis(self.toast_display_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// Project base URL of the hosted backend.
    pub base_url: String,
    /// Public API key sent with every request.
    pub api_key: String,
    /// Base URL share links are built against.
    pub site_url: String,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            site_url: String::new(),
        }
    }
}

impl BackendOptions {
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("DRAFTBOX_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(key) = env::var("DRAFTBOX_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = env::var("DRAFTBOX_SITE_URL") {
            self.site_url = url;
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}
