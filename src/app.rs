use std::collections::HashMap;
use std::fs;

use camino::Utf8PathBuf;
use reqwest::Url;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::PageCache;
use crate::catalog::Crawler;
use crate::client::CatalogClient;
use crate::config::ResolvedConfig;
use crate::domain::{Article, ArticleInfo};
use crate::enrich::{CollectSummary, Enricher};
use crate::error::ScoutError;
use crate::extract::EmbeddedData;
use crate::report::{self, ReportFilter, ReportFormat};
use crate::store::{SnapshotFile, Store};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResult {
    pub pages: usize,
    pub discovered: usize,
    pub added: usize,
    pub total: usize,
    pub collect: Option<CollectSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub pages: usize,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LocalizeResult {
    pub downloaded: usize,
    pub rewritten: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugResult {
    pub url: String,
    pub bytes: usize,
    pub blocks: Vec<String>,
    pub dumped: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub filter: ReportFilter,
    /// Material to group by; falls back to the filter's material.
    pub group_by: Option<String>,
    pub format: Option<ReportFormat>,
}

pub struct App<C: CatalogClient> {
    config: ResolvedConfig,
    cache: PageCache,
    snapshot: SnapshotFile,
    client: C,
}

impl<C: CatalogClient> App<C> {
    pub fn new(config: ResolvedConfig, client: C) -> Self {
        Self {
            cache: PageCache::new(config.cache_dir.clone()),
            snapshot: SnapshotFile::new(config.store_path.clone()),
            config,
            client,
        }
    }

    pub fn snapshot(&self) -> &SnapshotFile {
        &self.snapshot
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    fn crawler(&self) -> Result<Crawler<'_, C>, ScoutError> {
        Ok(Crawler::new(&self.cache, &self.client, &self.config.layout)?
            .with_max_pages(self.config.max_pages))
    }

    fn enricher(&self) -> Enricher<'_, C> {
        Enricher::new(&self.cache, &self.client, &self.config.layout)
    }

    /// Crawls `url` into the store, keeping records of known articles.
    pub fn generate(&self, url: &str, collect: bool) -> Result<GenerateResult, ScoutError> {
        let outcome = self.crawler()?.crawl(url)?;
        let discovered = outcome.articles.len();

        let mut store = self.snapshot.load_or_default()?;
        let added = store.merge(outcome.articles);
        info!(discovered, added, total = store.len(), "crawl finished");

        let collect = if collect {
            Some(self.enricher().collect(&mut store.articles, false)?)
        } else {
            None
        };

        self.snapshot.save(&store)?;
        Ok(GenerateResult {
            pages: outcome.pages,
            discovered,
            added,
            total: store.len(),
            collect,
        })
    }

    pub fn list_articles(&self, url: &str) -> Result<ListResult, ScoutError> {
        let outcome = self.crawler()?.crawl(url)?;
        Ok(ListResult {
            pages: outcome.pages,
            articles: outcome.articles,
        })
    }

    pub fn article_info(&self, url: &str) -> Result<ArticleInfo, ScoutError> {
        self.enricher().enrich(url)
    }

    /// Enriches stored articles; the snapshot is rewritten only when a
    /// record changed.
    pub fn collect(&self, force: bool) -> Result<CollectSummary, ScoutError> {
        let mut store = self.snapshot.load()?;
        let summary = self.enricher().collect(&mut store.articles, force)?;
        if summary.has_changes() {
            info!(changed = summary.changed, "change detected, writing store");
            self.snapshot.save(&store)?;
        }
        Ok(summary)
    }

    /// Downloads remote media into the image directory and points the
    /// articles at the local copies.
    pub fn localize_media(&self) -> Result<LocalizeResult, ScoutError> {
        let mut store = self.snapshot.load()?;
        let mut result = LocalizeResult::default();

        for article in store.articles.iter_mut().filter(|a| a.has_remote_media()) {
            let target = self.local_media_path(&article.media)?;
            if !target.as_std_path().exists() {
                if self.client.download(&article.media, target.as_std_path())? {
                    result.downloaded += 1;
                } else {
                    warn!(media = %article.media, "media not found, keeping remote reference");
                    result.missing += 1;
                    continue;
                }
            }
            article.media = target.to_string();
            result.rewritten += 1;
        }

        if result.rewritten > 0 {
            info!(rewritten = result.rewritten, "change detected, writing store");
            self.snapshot.save(&store)?;
        }
        Ok(result)
    }

    fn local_media_path(&self, media: &str) -> Result<Utf8PathBuf, ScoutError> {
        let url =
            Url::parse(media).map_err(|err| ScoutError::InvalidUrl(format!("{media}: {err}")))?;
        let relative = url.path().trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return Err(ScoutError::InvalidUrl(media.to_string()));
        }
        Ok(self.config.image_dir.join(relative))
    }

    pub fn material_counts(&self) -> Result<Vec<CountEntry>, ScoutError> {
        let store = self.snapshot.load()?;
        Ok(count_values(store.enriched().flat_map(|article| {
            article
                .info
                .iter()
                .flat_map(|info| info.material.names().map(str::to_string))
        })))
    }

    pub fn pattern_counts(&self) -> Result<Vec<CountEntry>, ScoutError> {
        let store = self.snapshot.load()?;
        Ok(count_values(
            store
                .enriched()
                .filter_map(|article| article.info.as_ref().map(|info| info.pattern.clone())),
        ))
    }

    pub fn report(&self, options: &ReportOptions) -> Result<String, ScoutError> {
        let store = self.snapshot.load()?;
        render_report(&store, options, self.config.cards_per_row)
    }

    /// Lists the embedded JSON blocks of a page; with `dump`, writes each to
    /// `dump-<id>.json` in the working directory.
    pub fn debug_page(&self, url: &str, dump: bool) -> Result<DebugResult, ScoutError> {
        let html = self.cache.get_or_fetch(url, "debug", &self.client)?;
        let data = EmbeddedData::from_html(&html);
        let mut dumped = Vec::new();
        if dump {
            for (id, value) in data.iter() {
                let path = format!("dump-{id}.json");
                let content = serde_json::to_vec_pretty(value)
                    .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
                fs::write(&path, content).map_err(|err| ScoutError::Filesystem(err.to_string()))?;
                dumped.push(path);
            }
        }
        Ok(DebugResult {
            url: url.to_string(),
            bytes: html.len(),
            blocks: data.ids().map(str::to_string).collect(),
            dumped,
        })
    }
}

pub fn render_report(
    store: &Store,
    options: &ReportOptions,
    width: usize,
) -> Result<String, ScoutError> {
    let articles = report::filter(&store.articles, &options.filter);
    let group_by = options
        .group_by
        .as_deref()
        .or(options.filter.material.as_deref());
    let groups = report::group(articles, group_by)?;
    Ok(report::render(
        &groups,
        width,
        options.format.unwrap_or(ReportFormat::Text),
    ))
}

/// Occurrences per value, most frequent first; ties keep first-seen order.
pub fn count_values(values: impl IntoIterator<Item = String>) -> Vec<CountEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<CountEntry> = Vec::new();
    for value in values {
        match index.get(&value) {
            Some(&position) => entries[position].count += 1,
            None => {
                index.insert(value.clone(), entries.len());
                entries.push(CountEntry { value, count: 1 });
            }
        }
    }
    entries.sort_by(|left, right| right.count.cmp(&left.count));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_keep_first_seen_order_on_ties() {
        let values = ["Wool", "Cotton", "Cotton", "Silk", "Wool", "Linen"]
            .into_iter()
            .map(str::to_string);
        let counts = count_values(values);
        let flat: Vec<_> = counts
            .iter()
            .map(|entry| (entry.value.as_str(), entry.count))
            .collect();
        assert_eq!(
            flat,
            vec![("Wool", 2), ("Cotton", 2), ("Silk", 1), ("Linen", 1)]
        );
    }
}
