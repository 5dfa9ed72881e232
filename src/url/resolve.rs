use crate::UrlError;
use url::Url;

/// Parses the crawl root
///
/// The root must be an absolute `http` or `https` URL with a host. Anything
/// else is a fatal startup error: the pipeline is never started.
///
/// # Examples
///
/// ```
/// use sitemapper::url::parse_root;
///
/// let root = parse_root("https://example.com/").unwrap();
/// assert_eq!(root.host_str(), Some("example.com"));
///
/// assert!(parse_root("/relative/path").is_err());
/// assert!(parse_root("ftp://example.com/").is_err());
/// ```
pub fn parse_root(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host().is_none() {
        return Err(UrlError::MissingHost(input.to_string()));
    }

    Ok(url)
}

/// Resolves a link reference against the address of the page it was found on
///
/// Absolute references are returned as parsed; relative ones are resolved per
/// RFC 3986. No other normalization is applied, so two addresses are the same
/// page only when every component matches.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, url::ParseError> {
    base.join(reference)
}
