//! HTTP-level tests for the mock poll service.

use poll_mock::{MockConfig, MockServer, StatusResponse};
use serde_json::{json, Value};

// ─────────────────────── helpers ───────────────────────

async fn spawn(max_votes_per_sec: Option<u32>) -> MockServer {
    MockServer::spawn(MockConfig {
        port: 0,
        polls: vec![(81, vec![374, 375])],
        max_votes_per_sec,
    })
    .await
    .unwrap()
}

fn vote(voter: &str, candidate: u32) -> Value {
    json!({
        "id": 81,
        "competitorId": candidate,
        "voter_id": voter,
        "name": "Wanjiru Otieno",
        "gender": "Female",
        "region": "National",
        "county": "All",
        "constituency": "",
        "ward": ""
    })
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn binds_loopback_only() {
    let server = spawn(None).await;
    assert!(server.addr().ip().is_loopback());
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn status_vote_status_cycle() {
    let server = spawn(None).await;
    let base = format!("http://{}", server.addr());
    let http = reqwest::Client::new();

    let status: StatusResponse = http
        .get(format!("{base}/api/votes/status?pollId=81&voter_id=abc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!status.already_voted);

    let resp = http
        .post(format!("{base}/api/votes"))
        .json(&vote("abc", 374))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["accepted"], true);
    assert_eq!(body["tally"], 1);

    let status: StatusResponse = http
        .get(format!("{base}/api/votes/status?pollId=81&voter_id=abc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(status.already_voted);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn duplicate_vote_is_conflict() {
    let server = spawn(None).await;
    let base = format!("http://{}", server.addr());
    let http = reqwest::Client::new();

    for _ in 0..2 {
        http.post(format!("{base}/api/votes"))
            .json(&vote("dup", 375))
            .send()
            .await
            .unwrap();
    }
    let resp = http
        .post(format!("{base}/api/votes"))
        .json(&vote("dup", 374))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["accepted"], false);

    let tally: Value = http
        .get(format!("{base}/api/votes/tally?pollId=81"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tally["voters"], 1);
    assert_eq!(tally["candidates"]["375"], 1);
    assert_eq!(tally["candidates"]["374"], 0);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn error_status_codes() {
    let server = spawn(Some(1)).await;
    let base = format!("http://{}", server.addr());
    let http = reqwest::Client::new();

    let resp = http
        .get(format!("{base}/api/votes/status?pollId=5&voter_id=x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = http
        .post(format!("{base}/api/votes"))
        .json(&vote("x", 999))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    let first = http
        .post(format!("{base}/api/votes"))
        .json(&vote("first", 374))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);
    let second = http
        .post(format!("{base}/api/votes"))
        .json(&vote("second", 374))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);

    server.shutdown().await.unwrap();
}
