//! API integration tests.
//!
//! Tests HTTP endpoints against a [`TestHarness`] server running on a random
//! port with scripted providers.

mod common;

use std::time::Duration;

use common::{expect_event, TestHarness};

use cheerdeck::actions::ActionKey;
use cheerdeck::state::EngineEvent;

fn is_ready_for(key: ActionKey) -> impl FnMut(&EngineEvent) -> bool {
    move |event| matches!(event, EngineEvent::ActionReady { key: k, .. } if *k == key)
}

// ---------------------------------------------------------------------------
// Health and version
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_200() {
    let (_harness, addr) = TestHarness::with_server().await;
    let url = format!("http://{addr}/health");

    let resp = reqwest::get(&url).await.expect("request failed");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn api_health_reports_status_and_version() {
    let (_harness, addr) = TestHarness::with_server().await;
    let url = format!("http://{addr}/api/health");

    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["active"], serde_json::Value::Null);
    assert_eq!(json["playing"], serde_json::Value::Null);
}

#[tokio::test]
async fn version_endpoint_matches_the_package() {
    let (_harness, addr) = TestHarness::with_server().await;
    let url = format!("http://{addr}/api/version");

    let json: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// ---------------------------------------------------------------------------
// Action snapshots
// ---------------------------------------------------------------------------

#[tokio::test]
async fn actions_start_out_idle() {
    let (_harness, addr) = TestHarness::with_server().await;
    let url = format!("http://{addr}/api/actions");

    let json: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    let actions = json.as_array().expect("actions is an array");
    assert_eq!(actions.len(), 4);

    let keys: Vec<_> = actions.iter().map(|a| a["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["idea", "support", "published", "smile"]);

    for action in actions {
        assert_eq!(action["status"], "idle");
        assert!(action.get("content").is_none(), "idle action has no content");
    }
}

#[tokio::test]
async fn unknown_action_is_404() {
    let (_harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let resp = reqwest::get(format!("{base}/api/actions/flurb")).await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{base}/api/actions/flurb/click"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{base}/api/actions/flurb/play"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn click_lifecycle_over_http() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.text.push_ok("Film your workspace tour.");
    let mut rx = harness.engine.subscribe();
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    // first click starts a run
    let resp = client
        .post(format!("{base}/api/actions/idea/click"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["key"], "idea");
    assert_eq!(json["outcome"], "loading");

    expect_event(&mut rx, is_ready_for(ActionKey::Idea)).await;

    // the snapshot now carries the generated content
    let json: serde_json::Value = reqwest::get(format!("{base}/api/actions/idea"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["status"], "active");
    assert_eq!(json["content"]["type"], "text");
    assert_eq!(json["content"]["title"], "Creative Challenge 💡");
    assert_eq!(json["content"]["text"], "Film your workspace tour.");

    // second click closes the panel
    let json: serde_json::Value = client
        .post(format!("{base}/api/actions/idea/click"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["outcome"], "closed");

    let json: serde_json::Value = reqwest::get(format!("{base}/api/actions/idea"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["status"], "idle");
    assert!(json.get("content").is_none());
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn playback_requests_without_active_media_are_409() {
    let (harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    // nothing active yet
    for op in ["play", "pause", "toggle", "ready"] {
        let resp = client
            .post(format!("{base}/api/actions/support/{op}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409, "op {op} should conflict");
    }

    // active text content is not playable either
    harness.text.push_ok("A text-only idea.");
    let mut rx = harness.engine.subscribe();
    client
        .post(format!("{base}/api/actions/idea/click"))
        .send()
        .await
        .unwrap();
    expect_event(&mut rx, is_ready_for(ActionKey::Idea)).await;

    let resp = client
        .post(format!("{base}/api/actions/idea/play"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn playback_flow_over_http() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.text.push_ok("an encouraging word");
    harness.speech.push_ok(b"mp3 bytes");
    let mut rx = harness.engine.subscribe();
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    client
        .post(format!("{base}/api/actions/support/click"))
        .send()
        .await
        .unwrap();
    expect_event(&mut rx, is_ready_for(ActionKey::Support)).await;

    // play is parked until the client reports the media loaded
    let json: serde_json::Value = client
        .post(format!("{base}/api/actions/support/play"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["playing"], serde_json::Value::Null);

    let json: serde_json::Value = client
        .post(format!("{base}/api/actions/support/ready"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["playing"], "support");

    let json: serde_json::Value = reqwest::get(format!("{base}/api/playback"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["playing"], "support");

    let json: serde_json::Value = client
        .post(format!("{base}/api/actions/support/pause"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["playing"], serde_json::Value::Null);

    let json: serde_json::Value = client
        .post(format!("{base}/api/actions/support/toggle"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["playing"], "support");

    let json: serde_json::Value = client
        .post(format!("{base}/api/actions/support/ended"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["playing"], serde_json::Value::Null);
}

// ---------------------------------------------------------------------------
// Server-sent events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sse_stream_connects() {
    let (_harness, addr) = TestHarness::with_server().await;
    let url = format!("http://{addr}/api/events");

    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("text/event-stream"),
        "got content-type: {content_type}"
    );
}

#[tokio::test]
async fn sse_delivers_action_events() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.text.push_ok("an idea over sse");
    let base = format!("http://{addr}");

    let mut resp = reqwest::get(format!("{base}/api/events")).await.unwrap();
    assert_eq!(resp.status(), 200);

    // trigger a run while the stream is attached
    reqwest::Client::new()
        .post(format!("{base}/api/actions/idea/click"))
        .send()
        .await
        .unwrap();

    let body = tokio::time::timeout(Duration::from_secs(5), async {
        let mut seen = String::new();
        while let Some(chunk) = resp.chunk().await.unwrap() {
            seen.push_str(&String::from_utf8_lossy(&chunk));
            if seen.contains("action_ready") {
                return seen;
            }
        }
        panic!("stream ended before the run finished: {seen}");
    })
    .await
    .expect("timed out waiting for SSE events");

    assert!(body.contains(r#""event_type":"action_loading""#), "got: {body}");
    assert!(body.contains(r#""event_type":"action_ready""#), "got: {body}");
    assert!(body.contains(r#""key":"idea""#), "got: {body}");
}
