use sitemapper::config::load_config_with_hash;
use sitemapper::crawler::crawl_with_config;
use sitemapper::url::parse_root;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_temp_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush config");
    file
}

#[tokio::test]
async fn test_crawl_uses_configured_user_agent_and_buffers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let file = create_temp_config(
        r#"
[fetch]
request-timeout-secs = 5
connect-timeout-secs = 2

[user-agent]
crawler-name = "TestMapper"
crawler-version = "0.1"
contact-url = "https://example.com/bot"

[pipeline]
channel-capacity = 32
"#,
    );
    let (config, hash) = load_config_with_hash(file.path()).expect("Failed to load config");
    assert_eq!(hash.len(), 64);

    // Only requests carrying the configured user agent are answered with links
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestMapper/0.1 (+https://example.com/bot)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="/one">1</a><a href="/two">2</a>"#,
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    for page in ["/one", "/two"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>leaf</p>", "text/html"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let root = parse_root(&format!("{}/", base_url)).unwrap();
    let site_map = tokio::time::timeout(Duration::from_secs(10), crawl_with_config(root, &config))
        .await
        .expect("Crawl did not terminate")
        .expect("Crawl failed");

    assert_eq!(site_map.len(), 3);
    mock_server.verify().await;
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let file = create_temp_config("[pipeline]\nchannel-capacity = 0\n");
    assert!(load_config_with_hash(file.path()).is_err());
}
