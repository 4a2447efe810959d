use magnet_feed_core::error::Result;
use magnet_feed_core::FeedError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use surf::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const BASE_URL_ENV: &str = "MAGNET_FEED_BASE_URL";
pub const CONFIG_DIR_ENV: &str = "MAGNET_FEED_CONFIG_DIR";
const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub base_url: Option<String>,
}

/// Process-wide settings, resolved once at startup and handed to the client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: Url,
    /// Where `config.toml` was looked up, if a config directory could be found.
    pub config_dir: Option<PathBuf>,
}

impl FeedConfig {
    /// Resolve from an explicit override, the environment and the config file.
    pub fn load(override_url: Option<&str>) -> Result<Self> {
        let config_dir = config_dir();
        let env = std::env::var(BASE_URL_ENV).ok();
        let explicit = [override_url, env.as_deref()]
            .into_iter()
            .flatten()
            .any(|s| !s.trim().is_empty());

        // The file is only consulted when nothing above it is set.
        let file = match &config_dir {
            Some(dir) if !explicit => read_config_file(&dir.join(CONFIG_FILE))?,
            _ => None,
        };

        let base_url = Self::resolve(override_url, env.as_deref(), file.as_ref())?;
        log::debug!("Resolved feed base URL: {}", base_url);

        Ok(Self {
            base_url,
            config_dir,
        })
    }

    pub fn from_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            config_dir: None,
        })
    }

    /// First non-empty source wins: override, environment, file, default.
    pub fn resolve(
        override_url: Option<&str>,
        env: Option<&str>,
        file: Option<&ConfigFile>,
    ) -> Result<Url> {
        let file_url = file.and_then(|f| f.base_url.as_deref());
        let raw = [override_url, env, file_url]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        parse_base_url(raw)
    }

    pub fn config_file(&self) -> Option<PathBuf> {
        self.config_dir.as_ref().map(|dir| dir.join(CONFIG_FILE))
    }
}

fn config_dir() -> Option<PathBuf> {
    if let Ok(custom_path) = std::env::var(CONFIG_DIR_ENV) {
        if !custom_path.is_empty() {
            return Some(PathBuf::from(custom_path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("magnet-feed-sync"))
}

fn read_config_file(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| FeedError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let parsed = toml::from_str(&content)
        .map_err(|e| FeedError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
    Ok(Some(parsed))
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| FeedError::Config(format!("invalid base URL '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(FeedError::Config(format!(
            "base URL '{}' must be an http(s) URL",
            raw
        )));
    }
    Ok(url)
}
