//! Integration tests for Sitemapper
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch / extract / coordinate pipeline end-to-end over real HTTP.

mod config_tests;
mod crawl_tests;
