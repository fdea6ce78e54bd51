#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use camino::Utf8PathBuf;

use fabric_scout::client::CatalogClient;
use fabric_scout::config::{Config, ConfigLoader, ResolvedConfig};
use fabric_scout::error::ScoutError;

/// In-memory catalog. Unknown URLs answer like a 404.
#[derive(Default)]
pub struct MockCatalog {
    pub pages: HashMap<String, String>,
    pub requests: Mutex<Vec<String>>,
    pub downloads: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

impl CatalogClient for MockCatalog {
    fn fetch(&self, url: &str, _status: &str) -> Result<String, ScoutError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }

    fn download(&self, url: &str, destination: &Path) -> Result<bool, ScoutError> {
        self.downloads.lock().unwrap().push(url.to_string());
        if url.contains("missing") {
            return Ok(false);
        }
        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
        std::fs::write(destination, b"jpeg").unwrap();
        Ok(true)
    }
}

/// Client for code paths that must not touch the network.
pub struct FailingCatalog;

impl CatalogClient for FailingCatalog {
    fn fetch(&self, url: &str, _status: &str) -> Result<String, ScoutError> {
        Err(ScoutError::Transport(format!("unexpected request: {url}")))
    }

    fn download(&self, url: &str, _destination: &Path) -> Result<bool, ScoutError> {
        Err(ScoutError::Transport(format!("unexpected download: {url}")))
    }
}

pub fn temp_config(root: &Path) -> ResolvedConfig {
    let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).unwrap();
    ConfigLoader::resolve_config(Config {
        cache_dir: Some(root.join("cache").to_string()),
        store_path: Some(root.join("store.json").to_string()),
        ..Config::default()
    })
}

pub struct Listed<'a> {
    pub brand: &'a str,
    pub name: &'a str,
    pub key: &'a str,
}

pub fn listing_page(articles: &[Listed<'_>], next: Option<&str>) -> String {
    let records = articles
        .iter()
        .map(|article| {
            format!(
                r#"{{"brand_name": "{}", "name": "{}", "url_key": "{}", "media": [{{"path": "spp/{}.jpg"}}]}}"#,
                article.brand, article.name, article.key, article.key
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let next_json = next
        .map(|path| format!(r#", "next_page_path": "{path}""#))
        .unwrap_or_default();
    let anchor = next
        .map(|path| format!(r#"<a rel="next" href="{path}">next</a>"#))
        .unwrap_or_default();
    format!(
        r#"<html><body>
<script type="application/json" id="z-nvg-cognac-props"><![CDATA[{{"articles": [{records}]{next_json}}}]]></script>
{anchor}
</body></html>"#
    )
}

pub fn detail_page(material: &str, pattern: Option<&str>) -> String {
    let pattern = pattern
        .map(|value| format!(r#", {{"name": "Tyg", "values": "{value}"}}"#))
        .unwrap_or_default();
    format!(
        r#"<html><body>
<script type="application/json" id="z-vegas-pdp-props"><![CDATA[{{"model": {{"articleInfo": {{"attributes": [
    {{"category": "heading_material", "data": [{{"name": "Material", "values": "{material}"}}{pattern}]}}
]}}}}}}]]></script>
</body></html>"#
    )
}
