use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;
use tracing::debug;

use crate::client::CatalogClient;
use crate::error::ScoutError;

/// A cached response. An empty file on disk is a tombstone for a page the
/// server reported as not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Body(String),
    Absent,
}

impl CacheEntry {
    pub fn into_body(self) -> String {
        match self {
            CacheEntry::Body(body) => body,
            CacheEntry::Absent => String::new(),
        }
    }
}

/// Flat directory of response bodies, one file per percent-encoded URL.
///
/// Entries are never refreshed or evicted.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: Utf8PathBuf,
}

impl PageCache {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// No query normalization: `?a=1&b=2` and `?b=2&a=1` are distinct keys.
    pub fn key(url: &str) -> String {
        urlencoding::encode(url).into_owned()
    }

    pub fn entry_path(&self, url: &str) -> Utf8PathBuf {
        self.root.join(Self::key(url))
    }

    pub fn ensure_root(&self) -> Result<(), ScoutError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| ScoutError::Filesystem(err.to_string()))
    }

    pub fn lookup(&self, url: &str) -> Result<Option<CacheEntry>, ScoutError> {
        let path = self.entry_path(url);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let bytes =
            fs::read(path.as_std_path()).map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        if bytes.is_empty() {
            return Ok(Some(CacheEntry::Absent));
        }
        let body = String::from_utf8(bytes)
            .map_err(|err| ScoutError::Filesystem(format!("cached body for {url}: {err}")))?;
        Ok(Some(CacheEntry::Body(body)))
    }

    pub fn insert(&self, url: &str, body: &str) -> Result<(), ScoutError> {
        self.ensure_root()?;
        let mut temp = Builder::new()
            .prefix("fabric-scout-page")
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        temp.write_all(body.as_bytes())
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        temp.persist(self.entry_path(url).as_std_path())
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Returns the cached body for `url`, fetching and recording it on a miss.
    /// Not-found pages are recorded as tombstones and come back empty.
    pub fn get_or_fetch<C>(&self, url: &str, status: &str, client: &C) -> Result<String, ScoutError>
    where
        C: CatalogClient + ?Sized,
    {
        if let Some(entry) = self.lookup(url)? {
            debug!(url, "cache hit");
            return Ok(entry.into_body());
        }
        let body = client.fetch(url, status)?;
        self.insert(url, &body)?;
        Ok(body)
    }
}
