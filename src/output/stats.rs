//! Statistics derived from a completed site map
//!
//! This module summarises a crawl result: how many pages were visited, how
//! many links they carry, and how many of those links leave the crawled host.

use crate::crawler::SiteMap;
use crate::url::is_same_host;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of pages visited (map keys)
    pub total_pages: usize,

    /// Number of links across all visited pages
    pub total_links: usize,

    /// Links pointing at the crawled host
    pub internal_links: usize,

    /// Links pointing anywhere else
    pub external_links: usize,

    /// Visited pages with no outgoing links (includes failed fetches)
    pub leaf_pages: usize,

    /// Distinct hosts referenced by external links, sorted
    pub external_hosts: Vec<String>,
}

impl CrawlStatistics {
    pub fn from_site_map(site_map: &SiteMap) -> Self {
        let root = site_map.root();
        let mut stats = CrawlStatistics {
            total_pages: site_map.len(),
            ..Default::default()
        };
        let mut external_hosts = BTreeSet::new();

        for (_, links) in site_map.iter() {
            if links.is_empty() {
                stats.leaf_pages += 1;
            }

            stats.total_links += links.len();

            for link in links {
                if is_same_host(root, link) {
                    stats.internal_links += 1;
                } else {
                    stats.external_links += 1;
                    if let Some(host) = link.host_str() {
                        external_hosts.insert(host.to_string());
                    }
                }
            }
        }

        stats.external_hosts = external_hosts.into_iter().collect();
        stats
    }
}

/// Writes statistics in a formatted manner
pub fn write_statistics<W: Write>(stats: &CrawlStatistics, out: &mut W) -> io::Result<()> {
    writeln!(out, "=== Crawl Statistics ===\n")?;

    writeln!(out, "Overview:")?;
    writeln!(out, "  Pages visited: {}", stats.total_pages)?;
    writeln!(out, "  Total links found: {}", stats.total_links)?;
    writeln!(out, "  Internal links: {}", stats.internal_links)?;
    writeln!(out, "  External links: {}", stats.external_links)?;
    writeln!(out, "  Pages without links: {}", stats.leaf_pages)?;

    if !stats.external_hosts.is_empty() {
        writeln!(out)?;
        writeln!(out, "External Hosts ({}):", stats.external_hosts.len())?;
        for host in &stats.external_hosts {
            writeln!(out, "  - {}", host)?;
        }
    }

    Ok(())
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_statistics(stats, &mut handle)?;
    handle.flush()
}
