use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const QUALIFIER: &str = "org";
pub const ORG: &str = "sitemark";
pub const APP: &str = "sitemark";
pub const APPID: &str = constcat::concat!(QUALIFIER, ".", ORG, ".", APP);

pub const CONFIG_VERSION: u64 = 1;
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Default)]
pub enum SortOption {
    #[default]
    SitesDateNewest,
    SitesDateOldest,
    SitesAlphabeticalAscending,
    SitesAlphabeticalDescending,
}

impl SortOption {
    pub fn order_by_clause(self) -> &'static str {
        match self {
            SortOption::SitesDateNewest => "Sites.date_added DESC, Sites.id DESC",
            SortOption::SitesDateOldest => "Sites.date_added ASC, Sites.id ASC",
            SortOption::SitesAlphabeticalAscending => "Sites.title COLLATE NOCASE ASC, Sites.id ASC",
            SortOption::SitesAlphabeticalDescending => "Sites.title COLLATE NOCASE DESC, Sites.id DESC",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: u64,
    pub sort_option: SortOption,
    pub items_per_page: u8,
    pub enable_favicons: bool,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sort_option: SortOption::SitesDateNewest,
            items_per_page: 10,
            enable_favicons: true,
            database_path: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from(QUALIFIER, ORG, APP)
            .map(|directories| directories.config_dir().join(CONFIG_FILE))
    }

    /// Loads the user config, falling back to defaults when it is missing or unreadable.
    pub fn config() -> Config {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::info!("errors loading config: {e:?}");
                Config::default()
            }),
            _ => Config::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if config.version != CONFIG_VERSION {
            log::warn!(
                "config version {} differs from supported version {CONFIG_VERSION}",
                config.version
            );
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}
