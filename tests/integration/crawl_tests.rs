use sitemapper::config::Config;
use sitemapper::crawler::crawl_with_config;
use sitemapper::output::{render_tree, CrawlStatistics};
use sitemapper::url::parse_root;
use sitemapper::SiteMap;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page that must be requested exactly once
async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

async fn run_crawl(root: &str, config: &Config) -> SiteMap {
    let root = parse_root(root).expect("Failed to parse root");
    tokio::time::timeout(Duration::from_secs(10), crawl_with_config(root, config))
        .await
        .expect("Crawl did not terminate")
        .expect("Crawl failed")
}

fn at(base: &str, page_path: &str) -> Url {
    Url::parse(&format!("{}{}", base, page_path)).unwrap()
}

#[tokio::test]
async fn test_root_without_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", "<html><body>Nothing to see</body></html>").await;

    let site_map = run_crawl(&format!("{}/", base_url), &Config::default()).await;

    assert_eq!(site_map.len(), 1);
    assert_eq!(site_map.links(&at(&base_url, "/")), Some(&[][..]));
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/b">B</a>
        <a href="/c">C</a>
        </body></html>"#,
    )
    .await;
    mount_page(&mock_server, "/b", "<html><body>B has no links</body></html>").await;
    mount_page(
        &mock_server,
        "/c",
        r#"<html><body><a href="d">D, relative to /c</a><a href="/">home</a></body></html>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/d",
        r#"<html><body><a href="/c">back to C</a></body></html>"#,
    )
    .await;

    let site_map = run_crawl(&format!("{}/", base_url), &Config::default()).await;

    assert_eq!(site_map.len(), 4);
    assert_eq!(
        site_map.links(&at(&base_url, "/")).unwrap(),
        &[at(&base_url, "/b"), at(&base_url, "/c")]
    );
    assert_eq!(
        site_map.links(&at(&base_url, "/c")).unwrap(),
        &[at(&base_url, "/d"), at(&base_url, "/")]
    );
    assert_eq!(
        site_map.links(&at(&base_url, "/d")).unwrap(),
        &[at(&base_url, "/c")]
    );

    let tree = render_tree(&site_map);
    assert!(tree.starts_with(&format!("{}/\n", base_url)));
    assert!(tree.contains("(see above)"));

    // Each mounted page expects exactly one request; verified on drop
    mock_server.verify().await;
}

#[tokio::test]
async fn test_external_host_is_never_fetched() {
    let mock_server = MockServer::start().await;
    let external_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let external_url = external_server.uri();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&external_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        &format!(r#"<a href="{}/elsewhere">E</a>"#, external_url),
    )
    .await;

    let site_map = run_crawl(&format!("{}/", base_url), &Config::default()).await;

    let external = at(&external_url, "/elsewhere");
    assert_eq!(site_map.len(), 1);
    assert_eq!(
        site_map.links(&at(&base_url, "/")).unwrap(),
        &[external.clone()]
    );
    assert!(!site_map.contains(&external));

    let stats = CrawlStatistics::from_site_map(&site_map);
    assert_eq!(stats.external_links, 1);

    external_server.verify().await;
}

#[tokio::test]
async fn test_failed_fetch_is_mapped_without_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/broken">broken</a><a href="/missing">missing</a><a href="/ok">ok</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500).set_body_raw(r#"<a href="/secret">x</a>"#, "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", "<p>fine</p>").await;
    // /missing is not mounted: wiremock answers 404

    let site_map = run_crawl(&format!("{}/", base_url), &Config::default()).await;

    assert_eq!(site_map.len(), 4);
    assert_eq!(
        site_map.links(&at(&base_url, "/broken")).unwrap(),
        &[] as &[Url]
    );
    assert_eq!(
        site_map.links(&at(&base_url, "/missing")).unwrap(),
        &[] as &[Url]
    );
    assert!(!site_map.contains(&at(&base_url, "/secret")));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_html_only_skips_other_content_types() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/report.pdf">report</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/hidden">not html</a>"#, "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.fetch.html_only = true;

    let site_map = run_crawl(&format!("{}/", base_url), &config).await;

    assert_eq!(site_map.len(), 2);
    assert!(site_map
        .links(&at(&base_url, "/report.pdf"))
        .unwrap()
        .is_empty());
    assert!(!site_map.contains(&at(&base_url, "/hidden")));
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">a</a><a href="/a">a again</a><a href="/b">b</a>"#,
    )
    .await;
    mount_page(&mock_server, "/a", r#"<a href="/b">b</a><a href="/a">self</a>"#).await;
    mount_page(&mock_server, "/b", r#"<a href="/a">a</a><a href="/">home</a>"#).await;

    let site_map = run_crawl(&format!("{}/", base_url), &Config::default()).await;

    assert_eq!(site_map.len(), 3);
    assert_eq!(
        site_map.links(&at(&base_url, "/")).unwrap(),
        &[at(&base_url, "/a"), at(&base_url, "/b")]
    );

    mock_server.verify().await;
}
