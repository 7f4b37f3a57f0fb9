//! End-to-end tests for the fetch, merge, publish, serve pipeline.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use epgmux::config::{FeedsConfig, ServerConfig};
use epgmux::web::handlers::{ARTIFACT_CONTENT_TYPE, INDEX_TEXT, NOT_READY_TEXT};
use epgmux::web::{create_router, AppState};
use epgmux::{GuideStore, GuideUpdater, WebServer};

const FEED_A: &str = r#"<tv><channel id="a1"><display-name>Alpha</display-name></channel><programme channel="a1" start="20250101000000 +0000">A show</programme></tv>"#;
const FEED_C: &str = r#"<tv><channel id="c1"/><programme channel="c1" start="20250101000000 +0000">C one</programme><programme channel="c1" start="20250101010000 +0000">C two</programme></tv>"#;

/// Merge of FEED_A then FEED_C, as served.
const MERGED_A_C: &str = r#"<?xml version="1.0" encoding="UTF-8"?><tv><channel id="a1"><display-name>Alpha</display-name></channel><programme channel="a1" start="20250101000000 +0000">A show</programme><channel id="c1"/><programme channel="c1" start="20250101000000 +0000">C one</programme><programme channel="c1" start="20250101010000 +0000">C two</programme></tv>"#;

fn gzip(data: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn gunzip(bytes: &[u8]) -> String {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = String::new();
    decoder.read_to_string(&mut out).unwrap();
    out
}

async fn mount_feed(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(gzip(body), "application/gzip"))
        .mount(server)
        .await;
}

fn feeds_config(urls: Vec<String>) -> FeedsConfig {
    FeedsConfig {
        urls,
        update_interval_secs: 3600,
        timeout_secs: 2,
        connect_timeout_secs: 2,
        max_redirects: 5,
        max_feed_size_bytes: 10 * 1024 * 1024,
    }
}

fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        artifact_filename: "merged_epg.xml.gz".to_string(),
    }
}

#[tokio::test]
async fn test_artifact_unavailable_before_first_cycle() {
    let store = Arc::new(GuideStore::new());
    let app_state = Arc::new(AppState::new(store));
    let server = axum_test::TestServer::new(create_router(app_state, "merged_epg.xml.gz")).unwrap();

    let response = server.get("/merged_epg.xml.gz").await;
    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    response.assert_text(NOT_READY_TEXT);
}

#[tokio::test]
async fn test_cycle_publishes_feeds_in_configured_order() {
    let mock = MockServer::start().await;
    mount_feed(&mock, "/a.xml.gz", FEED_A).await;
    mount_feed(&mock, "/c.xml.gz", FEED_C).await;

    let store = Arc::new(GuideStore::new());
    let updater = GuideUpdater::new(
        &feeds_config(vec![
            format!("{}/a.xml.gz", mock.uri()),
            format!("{}/c.xml.gz", mock.uri()),
        ]),
        store.clone(),
    )
    .unwrap();

    let result = updater.run_cycle().await;

    assert_eq!(result.attempted, 2);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.entries, 5);

    let guide = store.current().unwrap();
    assert_eq!(guide.entry_count, 5);
    assert_eq!(gunzip(&guide.bytes), MERGED_A_C);
}

#[tokio::test]
async fn test_failing_feed_is_excluded_from_merge() {
    let mock = MockServer::start().await;
    mount_feed(&mock, "/a.xml.gz", FEED_A).await;
    // Feed B answers slower than the configured fetch timeout
    Mock::given(method("GET"))
        .and(path("/b.xml.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(gzip("<tv></tv>"), "application/gzip")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock)
        .await;
    mount_feed(&mock, "/c.xml.gz", FEED_C).await;

    let store = Arc::new(GuideStore::new());
    let updater = GuideUpdater::new(
        &feeds_config(vec![
            format!("{}/a.xml.gz", mock.uri()),
            format!("{}/b.xml.gz", mock.uri()),
            format!("{}/c.xml.gz", mock.uri()),
        ]),
        store.clone(),
    )
    .unwrap();

    let result = updater.run_cycle().await;

    assert_eq!(result.attempted, 3);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.entries, 5);

    // The remaining feeds keep their relative order
    assert_eq!(gunzip(&store.current().unwrap().bytes), MERGED_A_C);
}

#[tokio::test]
async fn test_cycle_with_no_successful_feeds_still_publishes() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down.xml.gz"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let store = Arc::new(GuideStore::new());
    let updater = GuideUpdater::new(
        &feeds_config(vec![format!("{}/down.xml.gz", mock.uri())]),
        store.clone(),
    )
    .unwrap();

    let result = updater.run_cycle().await;

    assert_eq!(result.attempted, 1);
    assert_eq!(result.succeeded, 0);
    assert_eq!(result.entries, 0);
    assert_eq!(
        gunzip(&store.current().unwrap().bytes),
        r#"<?xml version="1.0" encoding="UTF-8"?><tv></tv>"#
    );
}

#[tokio::test]
async fn test_artifact_is_served_byte_exact() {
    let mock = MockServer::start().await;
    mount_feed(&mock, "/a.xml.gz", FEED_A).await;
    mount_feed(&mock, "/c.xml.gz", FEED_C).await;

    let store = Arc::new(GuideStore::new());
    let updater = GuideUpdater::new(
        &feeds_config(vec![
            format!("{}/a.xml.gz", mock.uri()),
            format!("{}/c.xml.gz", mock.uri()),
        ]),
        store.clone(),
    )
    .unwrap();
    updater.run_cycle().await;
    let published = store.current().unwrap();

    let server = WebServer::new(&server_config(), store).unwrap();
    let addr = server.run_with_addr().await.unwrap();

    let resp = reqwest::get(format!("http://{}/merged_epg.xml.gz", addr))
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some(ARTIFACT_CONTENT_TYPE)
    );
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), &published.bytes[..]);
    assert_eq!(gunzip(&body), MERGED_A_C);
}

#[tokio::test]
async fn test_next_cycle_replaces_artifact() {
    let mock = MockServer::start().await;

    // First cycle sees version one, later cycles see version two
    Mock::given(method("GET"))
        .and(path("/feed.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            gzip(r#"<tv><programme channel="x">version one</programme></tv>"#),
            "application/gzip",
        ))
        .up_to_n_times(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            gzip(r#"<tv><programme channel="x">version two</programme></tv>"#),
            "application/gzip",
        ))
        .mount(&mock)
        .await;

    let store = Arc::new(GuideStore::new());
    let updater = GuideUpdater::new(
        &feeds_config(vec![format!("{}/feed.xml.gz", mock.uri())]),
        store.clone(),
    )
    .unwrap();

    updater.run_cycle().await;
    assert!(gunzip(&store.current().unwrap().bytes).contains("version one"));

    updater.run_cycle().await;
    assert!(gunzip(&store.current().unwrap().bytes).contains("version two"));
}

#[tokio::test]
async fn test_readers_always_get_complete_artifacts() {
    let doc_a = epgmux::feed::MergedDocument {
        entries: vec![r#"<channel id="a"/>"#.to_string()],
    };
    let doc_b = epgmux::feed::MergedDocument {
        entries: vec![
            r#"<channel id="b"/>"#.to_string(),
            r#"<channel id="c"/>"#.to_string(),
        ],
    };
    let expected_a = r#"<?xml version="1.0" encoding="UTF-8"?><tv><channel id="a"/></tv>"#;
    let expected_b =
        r#"<?xml version="1.0" encoding="UTF-8"?><tv><channel id="b"/><channel id="c"/></tv>"#;

    let store = Arc::new(GuideStore::new());
    store.publish(&doc_a).unwrap();

    let server = WebServer::new(&server_config(), store.clone()).unwrap();
    let addr = server.run_with_addr().await.unwrap();

    let publisher = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..20 {
                if i % 2 == 0 {
                    store.publish(&doc_b).unwrap();
                } else {
                    store.publish(&doc_a).unwrap();
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        readers.push(tokio::spawn(async move {
            let client = reqwest::Client::new();
            for _ in 0..30 {
                let resp = client
                    .get(format!("http://{}/merged_epg.xml.gz", addr))
                    .send()
                    .await
                    .unwrap();
                assert!(resp.status().is_success());
                let xml = gunzip(&resp.bytes().await.unwrap());
                assert!(xml == expected_a || xml == expected_b);
            }
        }));
    }

    publisher.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_index_and_health_endpoints() {
    let server = WebServer::new(&server_config(), Arc::new(GuideStore::new())).unwrap();
    let addr = server.run_with_addr().await.unwrap();

    let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), INDEX_TEXT);

    let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "OK");
}
