//! Watch Mode Integration Tests
//!
//! Drives the change handler directly: events before watching starts must
//! be ignored, a resolved change publishes exactly once and syncs assets,
//! and unresolved paths are dropped quietly.

use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mdpress::{
    ApiClient, ExifImageValidator, FileStore, SiteConfig, WatchController, WatchOptions,
};

fn site_config() -> SiteConfig {
    serde_yaml::from_str("url: https://example.com").unwrap()
}

async fn corpus() -> (TempDir, FileStore) {
    let temp = TempDir::new().unwrap();
    let posts = temp.path().join("source/_posts");
    tokio::fs::create_dir_all(&posts).await.unwrap();

    tokio::fs::write(
        posts.join("alpha.md"),
        "---\ntitle: Alpha\ndate: 2024-01-01 00:00:00\n---\nAlpha body\n",
    )
    .await
    .unwrap();

    let alpha_assets = posts.join("alpha");
    tokio::fs::create_dir_all(&alpha_assets).await.unwrap();
    tokio::fs::write(alpha_assets.join("diagram.svg"), b"<svg/>")
        .await
        .unwrap();

    let store = FileStore::new(temp.path().join("source"));
    (temp, store)
}

fn options(deploy: &std::path::Path) -> WatchOptions {
    let mut options = WatchOptions::new("blog", "alice", deploy);
    options.settle_delay = Duration::ZERO;
    options
}

#[tokio::test]
async fn events_before_watching_never_publish() {
    let (temp, store) = corpus().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/contents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let deploy = temp.path().join("deploy");
    let mut controller = WatchController::new(
        ApiClient::new(server.uri()),
        store,
        ExifImageValidator,
        &site_config(),
        temp.path().join("source"),
        options(&deploy),
    );
    controller.mark_authenticated("jwt".to_string());
    // watching is intentionally not started

    controller
        .handle_change(&temp.path().join("source/_posts/alpha.md"))
        .await;

    assert!(!controller.state().is_watching());
    server.verify().await;
}

#[tokio::test]
async fn a_resolved_change_publishes_exactly_once() {
    let (temp, store) = corpus().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/contents"))
        .and(bearer_token("jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "c1",
            "path": "/articles/alpha/"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let deploy = temp.path().join("deploy");
    let mut controller = WatchController::new(
        ApiClient::new(server.uri()),
        store,
        ExifImageValidator,
        &site_config(),
        temp.path().join("source"),
        options(&deploy),
    );
    controller.mark_authenticated("jwt".to_string());
    controller.mark_watching();

    controller
        .handle_change(&temp.path().join("source/_posts/alpha.md"))
        .await;

    // success also triggers exactly one asset-sync pass
    assert!(deploy.join("articles/alpha/diagram.svg").exists());
    server.verify().await;
}

#[tokio::test]
async fn unresolved_paths_are_ignored() {
    let (temp, store) = corpus().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/contents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let deploy = temp.path().join("deploy");
    let mut controller = WatchController::new(
        ApiClient::new(server.uri()),
        store,
        ExifImageValidator,
        &site_config(),
        temp.path().join("source"),
        options(&deploy),
    );
    controller.mark_authenticated("jwt".to_string());
    controller.mark_watching();

    // a file the store does not know about
    controller
        .handle_change(&temp.path().join("source/_posts/missing.md"))
        .await;
    // a non-markdown file
    controller
        .handle_change(&temp.path().join("source/_posts/alpha/diagram.svg"))
        .await;

    server.verify().await;
}

#[tokio::test]
async fn a_failed_publish_skips_asset_sync() {
    let (temp, store) = corpus().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/contents"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let deploy = temp.path().join("deploy");
    let mut controller = WatchController::new(
        ApiClient::new(server.uri()),
        store,
        ExifImageValidator,
        &site_config(),
        temp.path().join("source"),
        options(&deploy),
    );
    controller.mark_authenticated("jwt".to_string());
    controller.mark_watching();

    controller
        .handle_change(&temp.path().join("source/_posts/alpha.md"))
        .await;

    assert!(!deploy.join("articles/alpha/diagram.svg").exists());
    server.verify().await;
}
