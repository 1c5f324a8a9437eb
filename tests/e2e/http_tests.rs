//! `HttpReleaseClient` against a local axum stub feed.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use native_updater::release::AssetNaming;
use native_updater::{
    ArtifactStore, Error, HostVersion, HttpConfig, HttpReleaseClient, Outcome, Platform,
    Reconciler, ReleaseClient, UpdaterConfig,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const BINARY: &[u8] = b"\x7fELF widget build 4.1";

/// Start the stub and return its base URL plus a hit counter for `/flaky`.
async fn spawn_stub() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let flaky_hits = Arc::new(AtomicUsize::new(0));

    let release = json!({
        "tag_name": "v4.1.0",
        "name": "Widget 4.1",
        "prerelease": false,
        "assets": [
            { "name": "Widget-4.0.so", "browser_download_url": format!("{base}/download/Widget-4.0.so"), "size": 10 },
            { "name": "Widget-4.1.so", "browser_download_url": format!("{base}/download/Widget-4.1.so"), "size": 21 },
            { "name": "Widget-4.1.dll", "browser_download_url": format!("{base}/download/Widget-4.1.dll"), "size": 21 }
        ]
    });

    let hits = Arc::clone(&flaky_hits);
    let app = Router::new()
        .route(
            "/repos/acme/widget/releases/latest",
            get(move || {
                let release = release.clone();
                async move { Json(release) }
            }),
        )
        .route(
            "/repos/acme/broken/releases/latest",
            get(|| async { Json(json!({ "assets": [] })) }),
        )
        .route("/download/Widget-4.1.so", get(|| async { BINARY }))
        .route(
            "/flaky",
            get(move || {
                let hits = Arc::clone(&hits);
                async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::SERVICE_UNAVAILABLE, "busy")
                    } else {
                        (StatusCode::OK, "finally")
                    }
                }
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (base, flaky_hits)
}

fn fast_retry() -> HttpConfig {
    HttpConfig {
        timeout_secs: 1,
        connect_timeout_secs: 1,
        max_attempts: 3,
        retry_backoff_ms: 1,
        ..HttpConfig::default()
    }
}

fn client(base: &str, repo: &str) -> HttpReleaseClient {
    let config = UpdaterConfig {
        api_base_url: base.to_string(),
        repository: repo.to_string(),
        ..UpdaterConfig::default()
    };
    HttpReleaseClient::new(config.feed_url(), &fast_retry()).unwrap()
}

#[tokio::test]
async fn test_latest_release_parses_github_payload() {
    let (base, _) = spawn_stub().await;

    let release = client(&base, "acme/widget").latest_release().await.unwrap();

    assert_eq!(release.tag_name, "v4.1.0");
    assert_eq!(release.assets.len(), 3);
    assert_eq!(release.assets[1].name, "Widget-4.1.so");
    assert_eq!(
        release.assets[1].download_url,
        format!("{base}/download/Widget-4.1.so")
    );
}

#[tokio::test]
async fn test_missing_tag_is_malformed() {
    let (base, _) = spawn_stub().await;

    let err = client(&base, "acme/broken").latest_release().await.unwrap_err();

    assert!(matches!(err, Error::Transport(ref msg) if msg.contains("Malformed")));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let (base, _) = spawn_stub().await;

    let err = client(&base, "acme/missing").latest_release().await.unwrap_err();

    assert!(matches!(err, Error::Transport(ref msg) if msg.contains("HTTP 404")));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (base, hits) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("flaky.txt");

    client(&base, "acme/widget")
        .download(&format!("{base}/flaky"), &dest)
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(std::fs::read(&dest).unwrap(), b"finally");
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (base, hits) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let http = HttpConfig {
        max_attempts: 2,
        ..fast_retry()
    };
    let client = HttpReleaseClient::new(format!("{base}/unused"), &http).unwrap();

    let err = client
        .download(&format!("{base}/flaky"), &dir.path().join("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(ref msg) if msg.contains("HTTP 503")));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let (base, _) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let http = HttpConfig {
        max_attempts: 1,
        ..fast_retry()
    };
    let client = HttpReleaseClient::new(format!("{base}/unused"), &http).unwrap();
    let dest = dir.path().join("slow.bin");

    let err = client
        .download(&format!("{base}/slow"), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_download_writes_only_final_file() {
    let (base, _) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("Widget-4.1.so");

    client(&base, "acme/widget")
        .download(&format!("{base}/download/Widget-4.1.so"), &dest)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), BINARY);
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "temp file must be renamed away");
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let (base, _) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("Widget-4.0.so");

    let err = client(&base, "acme/widget")
        .download(&format!("{base}/download/Widget-4.0.so"), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_reconcile_over_http() {
    let (base, _) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let config = UpdaterConfig {
        api_base_url: base.clone(),
        repository: "acme/widget".to_string(),
        product_name: "Widget".to_string(),
        install_dir: dir.path().join("plugins"),
        ..UpdaterConfig::default()
    };
    let reconciler = Reconciler::new(
        HttpReleaseClient::new(config.feed_url(), &fast_retry()).unwrap(),
        ArtifactStore::new(config.layout()),
        AssetNaming::new(config.product_name.clone(), Platform::Linux),
        HostVersion::parse("4.1 Personal"),
    );

    let first = reconciler.run().await.unwrap();
    let second = reconciler.run().await.unwrap();

    assert!(matches!(first, Outcome::Installed { ref filename, .. } if filename == "Widget-4.1.so"));
    assert!(matches!(second, Outcome::UpToDate { ref version } if version == "v4.1.0"));
    assert_eq!(
        std::fs::read(config.install_dir.join("Widget-4.1.so")).unwrap(),
        BINARY
    );
}
