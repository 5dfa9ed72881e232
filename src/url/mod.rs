//! URL handling module for Sitemapper
//!
//! Addresses are plain [`url::Url`] values compared structurally. This module
//! validates the crawl root, resolves link references against their source page,
//! and decides whether an address belongs to the crawled host.

mod host;
mod resolve;

pub use host::is_same_host;
pub use resolve::{parse_root, resolve_reference};
