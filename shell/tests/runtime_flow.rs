mod common;

use std::time::Duration;

use shared::capabilities::{HttpMethod, REQUEST_ID_HEADER};
use shared::Event;

use common::{
    geolocation, guarded_runtime, ip, runtime, verdict, FakeTransport, Reply, CLASSIFIER,
    GEOLOCATION, IP_ECHO,
};

#[tokio::test]
async fn location_chain_runs_to_completion() {
    let transport = FakeTransport::new()
        .reply(IP_ECHO, ip("203.0.113.9"))
        .reply(GEOLOCATION, geolocation("Paris", 48.8, 2.3));
    let mut runtime = runtime(transport);

    runtime.dispatch(Event::EmailChanged("someone@example.com".into()));
    assert!(runtime.dispatch(Event::FetchLocationRequested));
    assert_eq!(runtime.pending(), 1);
    assert!(runtime.view().locating);

    runtime.settle().await;

    assert_eq!(runtime.pending(), 0);
    let view = runtime.view();
    assert!(!view.locating);
    assert_eq!(view.location.unwrap().label, "Paris, Region, Country");

    let seen = runtime.transport().seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].method(), HttpMethod::Get);
    assert_eq!(seen[1].method(), HttpMethod::Post);
    let body: serde_json::Value = serde_json::from_slice(seen[1].body().unwrap()).unwrap();
    assert_eq!(body["ip"], "203.0.113.9");
    assert_eq!(body["email"], "someone@example.com");
    assert!(seen[1].headers().get(REQUEST_ID_HEADER).is_some());
}

#[tokio::test]
async fn spam_after_location_is_flagged() {
    let transport = FakeTransport::new()
        .reply(IP_ECHO, ip("203.0.113.9"))
        .reply(GEOLOCATION, geolocation("Paris", 48.8, 2.3))
        .reply(CLASSIFIER, verdict("Buy now", true));
    let mut runtime = runtime(transport);

    runtime.dispatch(Event::FetchLocationRequested);
    runtime.settle().await;
    runtime.dispatch(Event::MessageChanged("Buy now".into()));
    runtime.dispatch(Event::CheckSpamRequested);
    runtime.settle().await;

    let map = runtime.view().map;
    assert_eq!(map.flagged_count(), 1);
    let flagged = map.markers.last().unwrap();
    assert_eq!((flagged.lat, flagged.lng), (48.8, 2.3));

    let sent = runtime.transport().seen().pop().unwrap();
    let body: serde_json::Value = serde_json::from_slice(sent.body().unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({ "message": "Buy now", "location": "Paris" }));
}

#[tokio::test]
async fn collaborator_failures_are_swallowed() {
    let transport = FakeTransport::new()
        .reply(IP_ECHO, Reply::Unreachable)
        .reply(CLASSIFIER, Reply::Status(503));
    let mut runtime = runtime(transport);

    runtime.dispatch(Event::FetchLocationRequested);
    runtime.dispatch(Event::CheckSpamRequested);
    runtime.settle().await;

    let view = runtime.view();
    assert!(view.location.is_none());
    assert!(view.verdict.is_none());
    assert!(!view.locating && !view.checking);
    assert_eq!(runtime.transport().seen().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn late_response_wins_without_guard() {
    let transport = FakeTransport::new()
        .reply_after(IP_ECHO, Duration::from_millis(500), ip("203.0.113.1"))
        .reply(IP_ECHO, ip("203.0.113.2"))
        .reply(GEOLOCATION, geolocation("Lyon", 45.76, 4.84))
        .reply(GEOLOCATION, geolocation("Paris", 48.8, 2.3));
    let mut runtime = runtime(transport);

    runtime.dispatch(Event::FetchLocationRequested);
    runtime.dispatch(Event::FetchLocationRequested);
    runtime.settle().await;

    assert!(runtime.view().location.unwrap().label.starts_with("Paris"));
    assert_eq!(runtime.transport().seen().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn late_response_is_dropped_with_guard() {
    let transport = FakeTransport::new()
        .reply_after(IP_ECHO, Duration::from_millis(500), ip("203.0.113.1"))
        .reply(IP_ECHO, ip("203.0.113.2"))
        .reply(GEOLOCATION, geolocation("Lyon", 45.76, 4.84));
    let mut runtime = guarded_runtime(transport);

    runtime.dispatch(Event::FetchLocationRequested);
    runtime.dispatch(Event::FetchLocationRequested);
    runtime.settle().await;

    assert!(runtime.view().location.unwrap().label.starts_with("Lyon"));
    // The superseded chain stops after its IP lookup.
    assert_eq!(runtime.transport().seen().len(), 3);
    assert_eq!(runtime.pending(), 0);
    assert!(!runtime.view().locating);
}

#[tokio::test]
async fn crashed_request_task_still_settles() {
    let transport = FakeTransport::new()
        .reply(IP_ECHO, Reply::Crash)
        .reply(CLASSIFIER, verdict("hello", false));
    let mut runtime = runtime(transport);

    runtime.dispatch(Event::FetchLocationRequested);
    runtime.dispatch(Event::CheckSpamRequested);
    tokio::time::timeout(Duration::from_secs(5), runtime.settle())
        .await
        .expect("settle returns after a task panic");

    assert_eq!(runtime.pending(), 0);
    let view = runtime.view();
    assert!(!view.locating);
    assert!(view.location.is_none());
    assert_eq!(view.verdict.unwrap().spam, "No");
}
