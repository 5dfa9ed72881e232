//! Crawler coordinator - the crawl state machine
//!
//! The coordinator seeds the root address, consumes the links reported by the
//! extract stage, submits every new in-scope address to the fetch stage, and
//! decides when the crawl is over.
//!
//! All bookkeeping lives in a [`CrawlState`] owned by a single loop, so the
//! scope and novelty checks and the state update that follows them can never
//! interleave with another report.

use crate::crawler::{PageLinks, SiteMap};
use crate::url::is_same_host;
use crate::SitemapError;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::{Receiver, Sender};
use url::Url;

/// Bookkeeping for a single crawl
///
/// An address is in exactly one of three situations: never seen, pending
/// (submitted but not yet reported), or retrieved. Once retrieved it is never
/// submitted again.
#[derive(Debug, Default)]
pub struct CrawlState {
    pending: HashSet<Url>,
    retrieved: HashMap<Url, Vec<Url>>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `url` has been submitted for fetching
    pub fn on_requested(&mut self, url: Url) {
        tracing::debug!("Requesting {}", url);
        self.pending.insert(url);
    }

    /// Records the links reported for `url`
    ///
    /// Returns `false` and leaves the state untouched when `url` was not
    /// pending: a page is only ever reported once.
    pub fn on_retrieved(&mut self, url: Url, links: Vec<Url>) -> bool {
        if !self.pending.remove(&url) {
            return false;
        }

        tracing::debug!("Retrieved {} ({} links)", url, links.len());
        self.retrieved.insert(url, links);
        true
    }

    /// Whether `url` has never been submitted
    pub fn should_be_requested(&self, url: &Url) -> bool {
        !self.pending.contains(url) && !self.retrieved.contains_key(url)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn retrieved_count(&self) -> usize {
        self.retrieved.len()
    }

    pub fn into_retrieved(self) -> HashMap<Url, Vec<Url>> {
        self.retrieved
    }
}

/// Maps the site reachable from `root`
///
/// Sends `root` on `submit`, then processes reports from `links` until that
/// channel closes. `submit` is dropped as soon as no address is pending, which
/// starts the cascading shutdown that eventually closes `links`.
///
/// # Errors
///
/// Returns [`SitemapError::PipelineClosed`] if the fetch stage stops accepting
/// addresses while work is still pending.
pub async fn map_site(
    root: Url,
    submit: Sender<Url>,
    mut links: Receiver<PageLinks>,
) -> Result<SiteMap, SitemapError> {
    tracing::info!("Starting crawl from root {}", root);

    let mut state = CrawlState::new();
    let mut submit = Some(submit);

    state.on_requested(root.clone());
    send_address(&submit, root.clone()).await?;

    while let Some(PageLinks {
        address,
        links: targets,
    }) = links.recv().await
    {
        let in_scope: Vec<Url> = targets
            .iter()
            .filter(|target| is_same_host(&root, target))
            .cloned()
            .collect();

        if !state.on_retrieved(address.clone(), targets) {
            tracing::warn!("Ignoring unexpected report for {}", address);
            continue;
        }

        for target in in_scope {
            if state.should_be_requested(&target) {
                state.on_requested(target.clone());
                send_address(&submit, target).await?;
            } else {
                tracing::trace!("Skipping {}", target);
            }
        }

        if !state.has_pending() && submit.take().is_some() {
            // Everything submitted has come back; closing the address channel
            // shuts the fetch and extract stages down, which ends this loop
            tracing::info!(
                "Fetching completed: {} pages retrieved",
                state.retrieved_count()
            );
        }
    }

    if state.has_pending() {
        return Err(SitemapError::PipelineClosed(format!(
            "links channel closed with {} addresses pending",
            state.pending_count()
        )));
    }

    Ok(SiteMap::new(root, state.into_retrieved()))
}

async fn send_address(submit: &Option<Sender<Url>>, address: Url) -> Result<(), SitemapError> {
    let Some(submit) = submit else {
        return Err(SitemapError::PipelineClosed(format!(
            "address channel already closed when submitting {}",
            address
        )));
    };

    submit.send(address).await.map_err(|e| {
        SitemapError::PipelineClosed(format!("fetch stage stopped accepting {}", e.0))
    })
}
