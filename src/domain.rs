use serde::Serialize;

use crate::material::Composition;

/// One product discovered on a catalog listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub brand: String,
    pub name: String,
    pub url: String,
    pub media: String,
    /// `None` until the detail page has been enriched.
    pub info: Option<ArticleInfo>,
}

impl Article {
    pub fn new(
        brand: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        media: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            name: name.into(),
            url: url.into(),
            media: media.into(),
            info: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.info.is_some()
    }

    pub fn has_remote_media(&self) -> bool {
        self.media.starts_with("http")
    }
}

/// Attributes parsed from an article's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleInfo {
    pub material: Composition,
    /// Pattern/weave; empty when the page does not list it.
    pub pattern: String,
}

impl ArticleInfo {
    pub fn new(material: Composition, pattern: impl Into<String>) -> Self {
        Self {
            material,
            pattern: pattern.into(),
        }
    }

    /// Record for a detail page that carries no material data.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.material.is_empty() && self.pattern.is_empty()
    }

    pub fn has_pattern(&self) -> bool {
        !self.pattern.is_empty()
    }
}
