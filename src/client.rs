use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tempfile::Builder;
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::error::ScoutError;

/// Network seam for catalog pages and media.
///
/// A missing resource (404) is not an error: `fetch` returns an empty body
/// and `download` returns `false`.
pub trait CatalogClient: Send + Sync {
    fn fetch(&self, url: &str, status: &str) -> Result<String, ScoutError>;
    fn download(&self, url: &str, destination: &Path) -> Result<bool, ScoutError>;
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
}

impl HttpCatalogClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, ScoutError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|err| ScoutError::Transport(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ScoutError::Transport(err.to_string()))?;
        Ok(Self::from_client(client))
    }

    /// Wraps an already configured reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn send(&self, url: &str) -> Result<Option<Response>, ScoutError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ScoutError::Transport(err.to_string()))?;
        Self::handle_status(url, response)
    }

    fn handle_status(url: &str, response: Response) -> Result<Option<Response>, ScoutError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(url, "404 not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ScoutError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(Some(response))
    }
}

impl CatalogClient for HttpCatalogClient {
    fn fetch(&self, url: &str, status: &str) -> Result<String, ScoutError> {
        if status.is_empty() {
            info!(url, "requesting url");
        } else {
            info!(url, status, "requesting url");
        }
        let Some(response) = self.send(url)? else {
            return Ok(String::new());
        };
        response
            .text()
            .map_err(|err| ScoutError::Transport(err.to_string()))
    }

    /// Streams into a temporary file next to `destination` and persists it
    /// only once the whole body arrived.
    fn download(&self, url: &str, destination: &Path) -> Result<bool, ScoutError> {
        info!(url, to = %destination.display(), "downloading file");
        let Some(mut response) = self.send(url)? else {
            return Ok(false);
        };
        let parent = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("fabric-scout-media")
            .tempfile_in(parent)
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        io::copy(&mut response, temp.as_file_mut())
            .map_err(|err| ScoutError::Transport(format!("{url}: {err}")))?;
        temp.persist(destination)
            .map_err(|err| ScoutError::Filesystem(err.to_string()))?;
        Ok(true)
    }
}
