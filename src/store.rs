use std::collections::HashSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::{Article, ArticleInfo};
use crate::error::ScoutError;
use crate::material::Composition;

/// Every known article in discovery order. URLs are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    pub articles: Vec<Article>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        let mut store = Self::new();
        store.merge(articles);
        store
    }

    /// Appends articles whose URL is not yet known and returns how many were
    /// added. Known articles keep their existing record.
    pub fn merge(&mut self, articles: impl IntoIterator<Item = Article>) -> usize {
        let mut known: HashSet<String> = self.articles.iter().map(|a| a.url.clone()).collect();
        let before = self.articles.len();
        for article in articles {
            if known.insert(article.url.clone()) {
                self.articles.push(article);
            }
        }
        self.articles.len() - before
    }

    pub fn get(&self, url: &str) -> Option<&Article> {
        self.articles.iter().find(|article| article.url == url)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn enriched(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter().filter(|article| article.is_enriched())
    }
}

// On-disk shape. Each entity carries a `kind` tag; decoding fails on a
// missing or unknown tag.

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StoreDocument {
    Store { items: Vec<ArticleDocument> },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ArticleDocument {
    Item {
        brand: String,
        name: String,
        url: String,
        media: String,
        info: Option<InfoDocument>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InfoDocument {
    Attributes {
        material: Composition,
        pattern: String,
    },
}

impl From<&Store> for StoreDocument {
    fn from(store: &Store) -> Self {
        StoreDocument::Store {
            items: store.articles.iter().map(ArticleDocument::from).collect(),
        }
    }
}

impl From<&Article> for ArticleDocument {
    fn from(article: &Article) -> Self {
        ArticleDocument::Item {
            brand: article.brand.clone(),
            name: article.name.clone(),
            url: article.url.clone(),
            media: article.media.clone(),
            info: article.info.as_ref().map(|info| InfoDocument::Attributes {
                material: info.material.clone(),
                pattern: info.pattern.clone(),
            }),
        }
    }
}

impl From<StoreDocument> for Store {
    fn from(document: StoreDocument) -> Self {
        let StoreDocument::Store { items } = document;
        Store {
            articles: items.into_iter().map(Article::from).collect(),
        }
    }
}

impl From<ArticleDocument> for Article {
    fn from(document: ArticleDocument) -> Self {
        let ArticleDocument::Item {
            brand,
            name,
            url,
            media,
            info,
        } = document;
        Article {
            brand,
            name,
            url,
            media,
            info: info.map(|InfoDocument::Attributes { material, pattern }| {
                ArticleInfo { material, pattern }
            }),
        }
    }
}

/// The single snapshot file holding the whole store.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: Utf8PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.as_std_path().exists()
    }

    pub fn load(&self) -> Result<Store, ScoutError> {
        if !self.exists() {
            return Err(ScoutError::StoreNotFound(self.path.clone().into_std_path_buf()));
        }
        let content = fs::read_to_string(self.path.as_std_path())
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        Self::decode(&content)
    }

    pub fn load_or_default(&self) -> Result<Store, ScoutError> {
        if self.exists() {
            self.load()
        } else {
            Ok(Store::new())
        }
    }

    /// Replaces the whole file through a temporary sibling and a rename.
    pub fn save(&self, store: &Store) -> Result<(), ScoutError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        }
        let content = Self::encode(store)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), content)
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), self.path.as_std_path())
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn encode(store: &Store) -> Result<Vec<u8>, ScoutError> {
        let mut content = serde_json::to_vec_pretty(&StoreDocument::from(store))
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        content.push(b'\n');
        Ok(content)
    }

    pub fn decode(content: &str) -> Result<Store, ScoutError> {
        let document: StoreDocument = serde_json::from_str(content)
            .map_err(|err| ScoutError::CorruptStore(err.to_string()))?;
        Ok(document.into())
    }
}
