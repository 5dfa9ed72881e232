use url::Url;

/// Checks whether two addresses live on the same host
///
/// The comparison is exact on the host and the explicit port, which together
/// form the URL authority the crawl is confined to. Sub-domains never match
/// their parent domain, and addresses without a host (such as `mailto:` links)
/// never match anything.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemapper::url::is_same_host;
///
/// let root = Url::parse("https://example.com/").unwrap();
/// let about = Url::parse("https://example.com/about").unwrap();
/// let blog = Url::parse("https://blog.example.com/").unwrap();
///
/// assert!(is_same_host(&root, &about));
/// assert!(!is_same_host(&root, &blog));
/// ```
pub fn is_same_host(root: &Url, other: &Url) -> bool {
    match (root.host(), other.host()) {
        (Some(root_host), Some(other_host)) => {
            root_host == other_host && root.port() == other.port()
        }
        _ => false,
    }
}
