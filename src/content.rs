//! Gallery content sources.
//!
//! The gallery is fetched once per generation from a [`ContentSource`]. Two
//! sources exist: the headless CMS the live site uses, and a local JSON file
//! for offline builds and fixtures. Both yield at most `limit` items, newest
//! first.
//!
//! A failed fetch never surfaces to the page. [`fetch_or_empty`] logs the
//! error and hands back an empty gallery; there is no retry.

use crate::config::ContentConfig;
use crate::types::GalleryItem;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("content source not configured: {0}")]
    NotConfigured(String),
}

/// Supplies the ordered list of gallery records.
pub trait ContentSource {
    fn fetch_gallery(&self) -> Result<Vec<GalleryItem>, ContentError>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Fetch the gallery, or an empty one if anything goes wrong.
pub fn fetch_or_empty(source: &dyn ContentSource) -> Vec<GalleryItem> {
    match source.fetch_gallery() {
        Ok(items) => {
            log::info!("fetched {} gallery items from {}", items.len(), source.describe());
            items
        }
        Err(e) => {
            log::warn!("gallery fetch from {} failed: {e}", source.describe());
            Vec::new()
        }
    }
}

/// Build the source described by `config`. A `local_path` wins over the CMS.
pub fn source_from_config(
    config: &ContentConfig,
    config_dir: &Path,
) -> Result<Box<dyn ContentSource>, ContentError> {
    if let Some(local) = &config.local_path {
        return Ok(Box::new(JsonFileSource::new(config_dir.join(local), config.limit)));
    }
    if config.service_domain.is_empty() {
        return Err(ContentError::NotConfigured(
            "set content.service_domain or content.local_path".into(),
        ));
    }
    let api_key = std::env::var(&config.api_key_env).map_err(|_| {
        ContentError::NotConfigured(format!(
            "environment variable {} is not set",
            config.api_key_env
        ))
    })?;
    Ok(Box::new(CmsSource::new(config, api_key)))
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// List response envelope used by the CMS.
#[derive(Debug, Deserialize)]
struct ListResponse {
    contents: Vec<GalleryItem>,
}

/// Local files may hold the raw envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocalDocument {
    Envelope(ListResponse),
    Items(Vec<GalleryItem>),
}

/// Headless CMS list endpoint.
#[derive(Debug, Clone)]
pub struct CmsSource {
    base_url: String,
    endpoint: String,
    limit: usize,
    orders: String,
    api_key: String,
}

impl CmsSource {
    pub fn new(config: &ContentConfig, api_key: String) -> Self {
        Self {
            base_url: format!("https://{}.microcms.io/api/v1", config.service_domain),
            endpoint: config.endpoint.clone(),
            limit: config.limit,
            orders: config.orders.clone(),
            api_key,
        }
    }

    /// Point at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.endpoint)
    }
}

impl ContentSource for CmsSource {
    fn fetch_gallery(&self) -> Result<Vec<GalleryItem>, ContentError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        let response: ListResponse = client
            .get(self.url())
            .header("X-MICROCMS-API-KEY", &self.api_key)
            .query(&[("limit", self.limit.to_string()), ("orders", self.orders.clone())])
            .send()?
            .error_for_status()?
            .json()?;
        let mut items = response.contents;
        items.truncate(self.limit);
        Ok(items)
    }

    fn describe(&self) -> String {
        self.url()
    }
}

/// Gallery records from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    limit: usize,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }
}

impl ContentSource for JsonFileSource {
    fn fetch_gallery(&self) -> Result<Vec<GalleryItem>, ContentError> {
        let content = fs::read_to_string(&self.path)?;
        let doc: LocalDocument = serde_json::from_str(&content)?;
        let mut items = match doc {
            LocalDocument::Envelope(list) => list.contents,
            LocalDocument::Items(items) => items,
        };
        sort_newest_first(&mut items);
        items.truncate(self.limit);
        Ok(items)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Order by creation date descending. Undated items keep their relative
/// order after all dated ones.
pub fn sort_newest_first(items: &mut [GalleryItem]) {
    // Stable sort; ISO-8601 timestamps compare correctly as strings.
    items.sort_by(|a, b| match (&a.create_date, &b.create_date) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
