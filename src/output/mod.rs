//! Output module for presenting crawl results
//!
//! This module handles:
//! - Rendering the site map as an indented tree
//! - Computing and printing crawl statistics

pub mod stats;
mod tree;

pub use stats::{print_statistics, write_statistics, CrawlStatistics};
pub use tree::{print_tree, render_tree, write_tree, SEE_ABOVE};
