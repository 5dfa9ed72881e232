//! Crawler module: the concurrent crawl pipeline
//!
//! The crawl runs as three stages connected by channels:
//! - the fetch stage retrieves page bytes concurrently
//! - the extract stage turns page bytes into resolved, deduplicated links
//! - the coordinator tracks pending work, filters links, and detects completion
//!
//! Shutdown cascades downstream: the coordinator drops the address sender once
//! nothing is pending, the fetch stage closes its output after joining every
//! in-flight fetch, and the extract stage closes the links channel, which ends
//! the coordinator's loop.

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{map_site, CrawlState};
pub use extractor::{extract_links, start_extractor, HtmlLinkParser, LinkParser, ParseError};
pub use fetcher::{build_http_client, start_fetchers, Fetch, FetchError, HttpFetcher};

use crate::config::{Config, PipelineConfig};
use crate::SitemapError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// A fetched page: its address and raw body
///
/// A failed fetch still produces a `Page`, with an empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub address: Url,
    pub body: Vec<u8>,
}

/// The links found on a single page
///
/// Targets are absolute, free of duplicates, and in the order they first
/// appear in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub address: Url,
    pub links: Vec<Url>,
}

/// The result of a crawl: every visited page mapped to the links it contains
///
/// The graph may contain cycles. The root is always a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMap {
    root: Url,
    pages: HashMap<Url, Vec<Url>>,
}

impl SiteMap {
    pub fn new(root: Url, pages: HashMap<Url, Vec<Url>>) -> Self {
        Self { root, pages }
    }

    /// The address the crawl started from
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Links found on `page`, or `None` if the page was never visited
    pub fn links(&self, page: &Url) -> Option<&[Url]> {
        self.pages.get(page).map(Vec::as_slice)
    }

    pub fn contains(&self, page: &Url) -> bool {
        self.pages.contains_key(page)
    }

    /// Number of visited pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Url, &[Url])> {
        self.pages
            .iter()
            .map(|(page, links)| (page, links.as_slice()))
    }

    pub fn into_inner(self) -> HashMap<Url, Vec<Url>> {
        self.pages
    }
}

/// Runs a complete crawl from `root` with the given capabilities
///
/// Wires the fetch stage, the extract stage and the coordinator together and
/// returns once the cascading shutdown has completed.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sitemapper::config::Config;
/// use sitemapper::crawler::{crawl, HtmlLinkParser, HttpFetcher};
/// use sitemapper::url::parse_root;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let root = parse_root("https://example.com/")?;
/// let fetcher = Arc::new(HttpFetcher::new(&config)?);
/// let site_map = crawl(root, fetcher, Arc::new(HtmlLinkParser), &config.pipeline).await?;
/// println!("Visited {} pages", site_map.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    root: Url,
    fetcher: Arc<dyn Fetch>,
    parser: Arc<dyn LinkParser>,
    pipeline: &PipelineConfig,
) -> Result<SiteMap, SitemapError> {
    let capacity = pipeline.channel_capacity.max(1);

    let (address_tx, address_rx) = mpsc::channel(capacity);
    let pages_rx = start_fetchers(address_rx, fetcher, capacity);
    let links_rx = start_extractor(pages_rx, parser, capacity);

    map_site(root, address_tx, links_rx).await
}

/// Runs a crawl over HTTP using the settings in `config`
pub async fn crawl_with_config(root: Url, config: &Config) -> Result<SiteMap, SitemapError> {
    let fetcher = Arc::new(HttpFetcher::new(config)?);
    crawl(root, fetcher, Arc::new(HtmlLinkParser), &config.pipeline).await
}
