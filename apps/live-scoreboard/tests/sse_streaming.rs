//! SSE Streaming Integration Tests
//!
//! Opens event streams through the API router and checks the frames that
//! reach the client.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, BodyDataStream};
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use live_scoreboard::{EventRequest, ScoreboardConfig, ScoreboardService, SharedScoreboard, create_router};

fn app() -> (SharedScoreboard, Router) {
    let scoreboard: SharedScoreboard = Arc::new(ScoreboardService::new());
    let router = create_router(
        Arc::clone(&scoreboard),
        &ScoreboardConfig::default(),
        CancellationToken::new(),
    );
    (scoreboard, router)
}

async fn open(router: Router, uri: &str) -> BodyDataStream {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
    response.into_body().into_data_stream()
}

/// Read the next `data:` frame and parse its JSON payload.
async fn next_frame(stream: &mut BodyDataStream) -> serde_json::Value {
    let mut buffer = String::new();
    loop {
        let chunk = timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());

        if let Some(end) = buffer.find("\n\n") {
            let frame = &buffer[..end];
            if let Some(data) = frame.strip_prefix("data: ") {
                return serde_json::from_str(data).unwrap();
            }
            // Skip keep-alive comments
            buffer.drain(..end + 2);
        }
    }
}

#[tokio::test]
async fn live_stream_starts_with_current_list() {
    let (scoreboard, router) = app();
    let created = scoreboard.create_match("Red", "Blue").unwrap();
    scoreboard.start_match(created.id()).unwrap();

    let mut stream = open(router, "/events/matches").await;
    let frame = next_frame(&mut stream).await;

    assert_eq!(frame.as_array().unwrap().len(), 1);
    assert_eq!(frame[0]["id"], created.id());
    assert_eq!(frame[0]["status"], "live");
}

#[tokio::test]
async fn live_stream_follows_goals() {
    let (scoreboard, router) = app();
    let created = scoreboard.create_match("Red", "Blue").unwrap();
    scoreboard.start_match(created.id()).unwrap();

    let mut stream = open(router, "/events/matches").await;
    next_frame(&mut stream).await;

    scoreboard
        .record_event(
            created.id(),
            EventRequest::new("goal", Some("A"), Some("Alves")),
        )
        .unwrap();
    let frame = next_frame(&mut stream).await;

    assert_eq!(frame[0]["scoreA"], 1);
    assert_eq!(frame[0]["logs"][1]["description"], "Goal! Scored by Alves");
}

#[tokio::test]
async fn match_stream_sends_full_state() {
    let (scoreboard, router) = app();
    let created = scoreboard.create_match("Red", "Blue").unwrap();

    let mut stream = open(router, &format!("/events/matches/{}", created.id())).await;
    let initial = next_frame(&mut stream).await;
    assert_eq!(initial["status"], "scheduled");
    assert!(initial["logs"].as_array().unwrap().is_empty());

    scoreboard.start_match(created.id()).unwrap();
    let started = next_frame(&mut stream).await;
    assert_eq!(started["status"], "live");
    assert_eq!(started["logs"][0]["time"], "0'");

    scoreboard.end_match(created.id()).unwrap();
    let ended = next_frame(&mut stream).await;
    assert_eq!(ended["status"], "finished");
    assert_eq!(ended["logs"][1]["time"], "FT");
}

#[tokio::test]
async fn closing_stream_deregisters_subscriber() {
    let (scoreboard, router) = app();
    let created = scoreboard.create_match("Red", "Blue").unwrap();

    let mut global = open(router.clone(), "/events/matches").await;
    let mut single = open(router, &format!("/events/matches/{}", created.id())).await;
    next_frame(&mut global).await;
    next_frame(&mut single).await;

    let stats = scoreboard.subscriber_stats();
    assert_eq!((stats.global, stats.per_match), (1, 1));

    drop(global);
    drop(single);

    assert_eq!(scoreboard.subscriber_stats().total(), 0);
    // Broadcasting after disconnect is harmless
    scoreboard.start_match(created.id()).unwrap();
}

#[tokio::test]
async fn unknown_match_stream_is_not_found() {
    let (scoreboard, router) = app();

    let response = router
        .oneshot(
            Request::get("/events/matches/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(scoreboard.subscriber_stats().total(), 0);
}
