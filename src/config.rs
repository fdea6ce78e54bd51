use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ScoutError;

pub const DEFAULT_CONFIG_FILE: &str = "fabric-scout.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub store_path: Option<String>,
    #[serde(default)]
    pub image_dir: Option<String>,
    #[serde(default)]
    pub media_base_url: Option<String>,
    #[serde(default)]
    pub listing_block: Option<String>,
    #[serde(default)]
    pub detail_block: Option<String>,
    #[serde(default)]
    pub material_attribute: Option<String>,
    #[serde(default)]
    pub pattern_attribute: Option<String>,
    #[serde(default)]
    pub cards_per_row: Option<usize>,
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Names of the embedded JSON blocks and attributes read from catalog pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub listing_block: String,
    pub detail_block: String,
    pub material_attribute: String,
    pub pattern_attribute: String,
    pub media_base_url: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            listing_block: "z-nvg-cognac-props".to_string(),
            detail_block: "z-vegas-pdp-props".to_string(),
            material_attribute: "Material".to_string(),
            pattern_attribute: "Tyg".to_string(),
            media_base_url: "https://img01.ztat.net/article/".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub cache_dir: Utf8PathBuf,
    pub store_path: Utf8PathBuf,
    pub image_dir: Utf8PathBuf,
    pub layout: PageLayout,
    pub cards_per_row: usize,
    pub max_pages: Option<usize>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        // Infallible for an empty config.
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `fabric-scout.json` from the working directory when
    /// present. A missing default file resolves to defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ScoutError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ScoutError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ScoutError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let defaults = PageLayout::default();
        let cache_dir = Utf8PathBuf::from(config.cache_dir.unwrap_or_else(|| "cache".to_string()));
        let image_dir = config
            .image_dir
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| cache_dir.join("images"));

        ResolvedConfig {
            store_path: Utf8PathBuf::from(
                config.store_path.unwrap_or_else(|| "store.json".to_string()),
            ),
            image_dir,
            cache_dir,
            layout: PageLayout {
                listing_block: config.listing_block.unwrap_or(defaults.listing_block),
                detail_block: config.detail_block.unwrap_or(defaults.detail_block),
                material_attribute: config
                    .material_attribute
                    .unwrap_or(defaults.material_attribute),
                pattern_attribute: config
                    .pattern_attribute
                    .unwrap_or(defaults.pattern_attribute),
                media_base_url: config.media_base_url.unwrap_or(defaults.media_base_url),
            },
            cards_per_row: config.cards_per_row.unwrap_or(3).max(1),
            max_pages: config.max_pages,
            timeout_secs: config.timeout_secs.unwrap_or(30),
            user_agent: config
                .user_agent
                .unwrap_or_else(|| format!("fabric-scout/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}
