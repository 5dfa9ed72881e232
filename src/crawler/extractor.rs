//! Extract stage
//!
//! This module turns fetched pages into resolved link lists:
//! - The pluggable [`LinkParser`] capability and its `scraper` implementation
//! - Resolution of relative references against the page address
//! - Deduplication of links found more than once on the same page
//!
//! Pages are processed one at a time and every page produces exactly one
//! [`PageLinks`], even when its body cannot be parsed.

use crate::crawler::{Page, PageLinks};
use crate::url::resolve_reference;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender};

/// Elements whose `href` is followed
const HYPERLINK_SELECTOR: &str = "a[href], area[href]";

/// Errors produced while parsing a page body
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Parse capability used by the extract stage
///
/// Returns the raw `href` values of hyperlink elements, in document order.
/// Links inside comments are not elements and must not be reported.
pub trait LinkParser: Send + Sync {
    fn hrefs(&self, body: &[u8]) -> Result<Vec<String>, ParseError>;
}

/// [`LinkParser`] backed by the `scraper` HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkParser;

impl LinkParser for HtmlLinkParser {
    fn hrefs(&self, body: &[u8]) -> Result<Vec<String>, ParseError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyDocument);
        }

        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let selector = Selector::parse(HYPERLINK_SELECTOR)
            .map_err(|e| ParseError::Selector(format!("{:?}", e)))?;

        Ok(document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect())
    }
}

/// Extracts the links of a single page
///
/// Parse failures give an empty list. References that cannot be parsed as a
/// URL are logged and skipped without affecting the rest of the page. The
/// result keeps the first occurrence of each target in document order.
pub fn extract_links(page: &Page, parser: &dyn LinkParser) -> PageLinks {
    tracing::debug!("Parsing document {}", page.address);

    let hrefs = match parser.hrefs(&page.body) {
        Ok(hrefs) => hrefs,
        Err(e) => {
            tracing::debug!("Can't parse document {}: {}", page.address, e);
            return PageLinks {
                address: page.address.clone(),
                links: Vec::new(),
            };
        }
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in hrefs {
        match resolve_reference(&page.address, href.trim()) {
            Ok(target) => {
                if seen.insert(target.clone()) {
                    links.push(target);
                }
            }
            Err(e) => {
                tracing::warn!("Can't parse address {:?} on {}: {}", href, page.address, e);
            }
        }
    }

    tracing::debug!("Extracted {} links from {}", links.len(), page.address);

    PageLinks {
        address: page.address.clone(),
        links,
    }
}

/// Starts the extract stage
///
/// A single task parses pages in arrival order and publishes their links on
/// the returned channel, which is closed once `pages` closes.
pub fn start_extractor(
    pages: Receiver<Page>,
    parser: Arc<dyn LinkParser>,
    capacity: usize,
) -> Receiver<PageLinks> {
    let (links_tx, links_rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(run_extractor(pages, parser, links_tx));

    links_rx
}

async fn run_extractor(
    mut pages: Receiver<Page>,
    parser: Arc<dyn LinkParser>,
    links_tx: Sender<PageLinks>,
) {
    while let Some(page) = pages.recv().await {
        let page_links = extract_links(&page, parser.as_ref());
        if links_tx.send(page_links).await.is_err() {
            tracing::warn!("Links channel closed, stopping extractor");
            return;
        }
    }

    tracing::info!("Page channel closed, closing links channel");
}
