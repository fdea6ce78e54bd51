use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::PageCache;
use crate::client::CatalogClient;
use crate::config::PageLayout;
use crate::domain::{Article, ArticleInfo};
use crate::error::ScoutError;
use crate::extract::EmbeddedData;
use crate::material::Composition;

const MATERIAL_HEADING: &str = "heading_material";

/// Reads the material attributes from a detail page.
///
/// A missing pattern attribute yields an empty pattern. A missing detail
/// block, material heading or material attribute is `MissingData`.
pub fn article_info(html: &str, layout: &PageLayout) -> Result<ArticleInfo, ScoutError> {
    let data = EmbeddedData::from_html(html);
    let attributes = data
        .block(&layout.detail_block)?
        .pointer("/model/articleInfo/attributes")
        .and_then(Value::as_array)
        .ok_or_else(|| ScoutError::MissingData("no article attributes".to_string()))?;

    let heading = attributes
        .iter()
        .find(|attribute| {
            attribute.get("category").and_then(Value::as_str) == Some(MATERIAL_HEADING)
        })
        .and_then(|attribute| attribute.get("data"))
        .and_then(Value::as_array)
        .ok_or_else(|| ScoutError::MissingData(format!("no `{MATERIAL_HEADING}` attributes")))?;

    let lookup = |wanted: &str| {
        heading.iter().find_map(|entry| {
            let name = entry.get("name").and_then(Value::as_str)?;
            (name == wanted)
                .then(|| entry.get("values").and_then(Value::as_str))
                .flatten()
        })
    };

    let material = lookup(layout.material_attribute.as_str()).ok_or_else(|| {
        ScoutError::MissingData(format!("no `{}` attribute", layout.material_attribute))
    })?;
    let pattern = lookup(layout.pattern_attribute.as_str()).unwrap_or_else(|| {
        warn!(attribute = %layout.pattern_attribute, "pattern attribute missing");
        ""
    });

    Ok(ArticleInfo::new(Composition::parse(material), pattern))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectSummary {
    pub processed: usize,
    pub changed: usize,
    /// Articles recorded as unknown because their page had no material data.
    pub unknown: usize,
}

impl CollectSummary {
    pub fn has_changes(&self) -> bool {
        self.changed > 0
    }
}

pub struct Enricher<'a, C: CatalogClient + ?Sized> {
    cache: &'a PageCache,
    client: &'a C,
    layout: &'a PageLayout,
}

impl<'a, C: CatalogClient + ?Sized> Enricher<'a, C> {
    pub fn new(cache: &'a PageCache, client: &'a C, layout: &'a PageLayout) -> Self {
        Self {
            cache,
            client,
            layout,
        }
    }

    pub fn enrich(&self, url: &str) -> Result<ArticleInfo, ScoutError> {
        let html = self.cache.get_or_fetch(url, "detail", self.client)?;
        article_info(&html, self.layout)
    }

    /// Attaches records to articles that lack one, or to every article when
    /// `force` is set. Missing data attaches an unknown record; transport
    /// failures abort the batch.
    pub fn collect(
        &self,
        articles: &mut [Article],
        force: bool,
    ) -> Result<CollectSummary, ScoutError> {
        let mut summary = CollectSummary::default();
        for article in articles.iter_mut() {
            if !force && article.is_enriched() {
                continue;
            }
            summary.processed += 1;
            info!(url = %article.url, "getting article info");
            let info = match self.enrich(&article.url) {
                Ok(info) => info,
                Err(ScoutError::MissingData(reason)) => {
                    warn!(url = %article.url, %reason, "no material data, recording as unknown");
                    summary.unknown += 1;
                    ArticleInfo::unknown()
                }
                Err(err) => return Err(err),
            };
            if article.info.as_ref() != Some(&info) {
                article.info = Some(info);
                summary.changed += 1;
            }
        }
        Ok(summary)
    }
}
