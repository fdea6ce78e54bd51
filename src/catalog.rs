use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::PageCache;
use crate::client::CatalogClient;
use crate::config::PageLayout;
use crate::domain::Article;
use crate::error::ScoutError;
use crate::extract::EmbeddedData;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static NEXT_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[rel="next"][href], a.catalog-pagination__next[href]"#));
static LEGACY_CARD: LazyLock<Selector> = LazyLock::new(|| selector("article.catalog-article"));
static LEGACY_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("a.catalog-article__link[href]"));
static LEGACY_BRAND: LazyLock<Selector> = LazyLock::new(|| selector(".catalog-article__brand"));
static LEGACY_NAME: LazyLock<Selector> = LazyLock::new(|| selector(".catalog-article__name"));
static LEGACY_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| selector("img.catalog-article__image[src]"));

/// A fetched listing page, parsed once and shared by every format.
pub struct ListingPage<'a> {
    pub url: &'a Url,
    pub document: Html,
    pub data: EmbeddedData,
}

impl<'a> ListingPage<'a> {
    pub fn parse(url: &'a Url, html: &str) -> Self {
        let document = Html::parse_document(html);
        let data = EmbeddedData::from_document(&document);
        Self {
            url,
            document,
            data,
        }
    }
}

/// One markup convention for listing pages. Returns `None` when the page
/// does not use this convention, so the next format can be tried.
pub trait ListingFormat {
    fn name(&self) -> &'static str;
    fn articles(&self, page: &ListingPage<'_>) -> Option<Vec<Article>>;
}

/// Current pages: an embedded JSON block with an `articles` array.
pub struct EmbeddedJsonListing {
    block: String,
    media_base: Url,
}

impl EmbeddedJsonListing {
    pub fn new(layout: &PageLayout) -> Result<Self, ScoutError> {
        let media_base = Url::parse(&layout.media_base_url)
            .map_err(|err| ScoutError::InvalidUrl(format!("{}: {err}", layout.media_base_url)))?;
        Ok(Self {
            block: layout.listing_block.clone(),
            media_base,
        })
    }

    fn article(&self, record: &Value, site_root: &Url) -> Option<Article> {
        let brand = record.get("brand_name")?.as_str()?;
        let name = record.get("name")?.as_str()?;
        let url_key = record.get("url_key")?.as_str()?;
        let media_path = record
            .get("media")?
            .as_array()?
            .first()?
            .get("path")?
            .as_str()?;

        let url = site_root.join(&format!("{url_key}.html")).ok()?;
        let media = self.media_base.join(media_path).ok()?;
        Some(Article::new(brand, name, url.as_str(), media.as_str()))
    }
}

impl ListingFormat for EmbeddedJsonListing {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn articles(&self, page: &ListingPage<'_>) -> Option<Vec<Article>> {
        let records = page.data.get(&self.block)?.get("articles")?.as_array()?;
        let site_root = page.url.join("/").ok()?;
        let articles = records
            .iter()
            .filter_map(|record| {
                let article = self.article(record, &site_root);
                if article.is_none() {
                    warn!(page = %page.url, "skipping incomplete article record");
                }
                article
            })
            .collect();
        Some(articles)
    }
}

/// Older pages: article cards marked up with `catalog-article` classes.
pub struct LegacyMarkupListing;

impl LegacyMarkupListing {
    fn article(card: ElementRef<'_>, page_url: &Url) -> Option<Article> {
        let href = card.select(&LEGACY_LINK).next()?.value().attr("href")?;
        let url = page_url.join(href).ok()?;
        let media = card
            .select(&LEGACY_IMAGE)
            .next()
            .and_then(|image| image.value().attr("src"))
            .and_then(|src| page_url.join(src).ok())
            .map(|media| media.to_string())
            .unwrap_or_default();
        Some(Article::new(
            text_of(card, &LEGACY_BRAND),
            text_of(card, &LEGACY_NAME),
            url.as_str(),
            media,
        ))
    }
}

impl ListingFormat for LegacyMarkupListing {
    fn name(&self) -> &'static str {
        "legacy-markup"
    }

    fn articles(&self, page: &ListingPage<'_>) -> Option<Vec<Article>> {
        let cards: Vec<_> = page.document.select(&LEGACY_CARD).collect();
        if cards.is_empty() {
            return None;
        }
        Some(
            cards
                .into_iter()
                .filter_map(|card| Self::article(card, page.url))
                .collect(),
        )
    }
}

fn text_of(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// What a single listing page contributes to the crawl.
#[derive(Debug, Default)]
pub struct PageResult {
    pub format: Option<&'static str>,
    pub articles: Vec<Article>,
    pub next_pages: Vec<Url>,
}

#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Discovery order; the same article may appear on several pages.
    pub articles: Vec<Article>,
    pub pages: usize,
}

pub struct Crawler<'a, C: CatalogClient + ?Sized> {
    cache: &'a PageCache,
    client: &'a C,
    formats: Vec<Box<dyn ListingFormat>>,
    listing_block: String,
    max_pages: Option<usize>,
}

impl<'a, C: CatalogClient + ?Sized> Crawler<'a, C> {
    /// Formats are tried in order: embedded JSON first, legacy markup second.
    pub fn new(cache: &'a PageCache, client: &'a C, layout: &PageLayout) -> Result<Self, ScoutError> {
        Ok(Self {
            cache,
            client,
            formats: vec![
                Box::new(EmbeddedJsonListing::new(layout)?),
                Box::new(LegacyMarkupListing),
            ],
            listing_block: layout.listing_block.clone(),
            max_pages: None,
        })
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Walks listing pages breadth-first from `start_url`, following every
    /// next-page signal. Each page URL is fetched at most once.
    pub fn crawl(&self, start_url: &str) -> Result<CrawlOutcome, ScoutError> {
        let start = Url::parse(start_url)
            .map_err(|err| ScoutError::InvalidUrl(format!("{start_url}: {err}")))?;
        let mut queue = VecDeque::from([start.clone()]);
        let mut visited = HashSet::from([start]);
        let mut outcome = CrawlOutcome::default();

        while let Some(url) = queue.pop_front() {
            if self.max_pages.is_some_and(|max| outcome.pages >= max) {
                warn!(
                    pages = outcome.pages,
                    pending = queue.len() + 1,
                    "page limit reached, stopping crawl"
                );
                break;
            }
            let status = format!("page {}", outcome.pages + 1);
            let html = self.cache.get_or_fetch(url.as_str(), &status, self.client)?;
            outcome.pages += 1;

            let page = self.read_page(&url, &html);
            info!(
                url = %url,
                format = page.format.unwrap_or("none"),
                articles = page.articles.len(),
                "listing page read"
            );
            outcome.articles.extend(page.articles);
            for next in page.next_pages {
                if visited.insert(next.clone()) {
                    queue.push_back(next);
                } else {
                    debug!(url = %next, "next page already seen");
                }
            }
        }

        Ok(outcome)
    }

    pub fn read_page(&self, url: &Url, html: &str) -> PageResult {
        if html.is_empty() {
            warn!(url = %url, "empty listing page");
            return PageResult::default();
        }
        let page = ListingPage::parse(url, html);
        let mut result = PageResult {
            next_pages: self.next_pages(&page),
            ..PageResult::default()
        };
        for format in &self.formats {
            if let Some(articles) = format.articles(&page) {
                result.format = Some(format.name());
                result.articles = articles;
                break;
            }
        }
        if result.format.is_none() {
            warn!(url = %url, "no known listing format on page");
        }
        result
    }

    /// Both signals are honoured; they often point at the same page.
    fn next_pages(&self, page: &ListingPage<'_>) -> Vec<Url> {
        let from_json = page
            .data
            .get(&self.listing_block)
            .and_then(|block| block.get("next_page_path"))
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty());
        let from_anchors = page
            .document
            .select(&NEXT_ANCHOR)
            .filter_map(|anchor| anchor.value().attr("href"));

        from_json
            .into_iter()
            .chain(from_anchors)
            .filter_map(|target| page.url.join(target).ok())
            .collect()
    }
}
