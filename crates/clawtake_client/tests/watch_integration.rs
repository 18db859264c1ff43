//! Integration tests for the feed poller: acknowledgment rules, ordering of
//! display and acknowledgment, single-shot termination and failure handling.

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clawtake_client::{
    Client, ClientError, Credentials, CycleOutcome, FeedPoller, WatchError, WatchOptions,
};
use common::{feed_question, free_port, Reply, TestServer};

fn client_for(url: &str) -> Client {
    Client::new(Credentials {
        service_url: url.to_string(),
        api_key: "agent-key".to_string(),
        agent_name: Some("bot-1".to_string()),
    })
    .unwrap()
}

fn single_shot() -> WatchOptions {
    WatchOptions {
        interval_secs: 0,
        limit: Some(10),
        show_body: false,
        max_consecutive_failures: 1,
    }
}

/// Writer that appends each completed output line to the shared event log, so
/// output can be ordered against requests the server receives.
struct EventWriter {
    events: Arc<Mutex<Vec<String>>>,
    pending: String,
}

impl EventWriter {
    fn new(events: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            events,
            pending: String::new(),
        }
    }
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            self.events
                .lock()
                .unwrap()
                .push(format!("out {}", line.trim_end()));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn empty_batch_is_not_acknowledged() {
    let server = TestServer::start(vec![Reply::ok(
        serde_json::json!({"questions": [], "has_more": false}),
    )]);
    let client = client_for(&server.url);
    let mut poller = FeedPoller::new(&client, Vec::new(), single_shot());

    let outcome = poller.poll_once().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Empty);

    let out = String::from_utf8(poller.into_inner()).unwrap();
    assert!(out.contains("No new questions."));

    let requests = server.join();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/agents/me/feed?limit=10");
    assert_eq!(requests[0].header("x-agent-key"), Some("agent-key"));
}

#[tokio::test]
async fn batch_is_acknowledged_once_after_display() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let server = TestServer::start_with_events(
        vec![
            Reply::ok(serde_json::json!({
                "questions": [
                    feed_question("q-3", "Third"),
                    feed_question("q-1", "First"),
                    feed_question("q-3", "Third again"),
                ],
                "has_more": true
            })),
            Reply::ok(serde_json::json!({"acknowledged": 3})),
        ],
        events.clone(),
    );
    let client = client_for(&server.url);
    let mut poller = FeedPoller::new(&client, EventWriter::new(events.clone()), single_shot());

    poller.run().await.expect("single cycle should succeed");

    let requests = server.join();
    assert_eq!(requests.len(), 2);
    let ack = &requests[1];
    assert_eq!(ack.method, "POST");
    assert_eq!(ack.path, "/agents/me/feed/ack");
    assert_eq!(
        ack.json(),
        serde_json::json!({"question_ids": ["q-3", "q-1", "q-3"]})
    );

    let log = events.lock().unwrap().clone();
    let ack_at = log
        .iter()
        .position(|e| e == "POST /agents/me/feed/ack")
        .expect("ack should be logged");
    for title in ["[q-3] Third", "[q-1] First", "[q-3] Third again"] {
        let shown_at = log
            .iter()
            .position(|e| e.starts_with("out") && e.contains(title))
            .unwrap_or_else(|| panic!("{} should be displayed", title));
        assert!(shown_at < ack_at, "{} displayed after acknowledgment", title);
    }
    assert!(log[ack_at..]
        .iter()
        .any(|e| e.contains("(more questions available)")));
}

#[tokio::test]
async fn show_body_prints_question_text() {
    let server = TestServer::start(vec![
        Reply::ok(serde_json::json!({"questions": [feed_question("q-1", "First")]})),
        Reply::ok(serde_json::json!({"acknowledged": 1})),
    ]);
    let client = client_for(&server.url);
    let mut options = single_shot();
    options.show_body = true;
    let mut poller = FeedPoller::new(&client, Vec::new(), options);

    let outcome = poller.poll_once().await.unwrap();
    assert_eq!(
        outcome,
        CycleOutcome::Delivered {
            acknowledged: 1,
            has_more: false
        }
    );
    let out = String::from_utf8(poller.into_inner()).unwrap();
    assert!(out.contains("--- QUESTION ---\nBody of First\n--- END QUESTION ---"));
    assert!(out.contains("Acknowledged 1 question(s)."));
    assert!(!out.contains("more questions available"));
}

#[tokio::test]
async fn single_shot_returns_without_sleeping() {
    let server = TestServer::start(vec![Reply::ok(serde_json::json!({"questions": []}))]);
    let client = client_for(&server.url);
    let mut options = single_shot();
    options.interval_secs = -1;
    let mut poller = FeedPoller::new(&client, Vec::new(), options);

    let started = Instant::now();
    poller.run().await.unwrap();
    assert!(started.elapsed().as_secs() < 5);
    assert_eq!(server.join().len(), 1);
}

#[tokio::test]
async fn failed_acknowledgment_ends_session() {
    let server = TestServer::start(vec![
        Reply::ok(serde_json::json!({"questions": [feed_question("q-1", "First")]})),
        Reply::json(503, serde_json::json!({"error": {"message": "try later"}})),
    ]);
    let client = client_for(&server.url);
    let mut options = single_shot();
    options.interval_secs = 3600;
    let mut poller = FeedPoller::new(&client, Vec::new(), options);

    let err = poller.run().await.unwrap_err();
    match err {
        WatchError::Client(ClientError::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "try later");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    let out = String::from_utf8(poller.into_inner()).unwrap();
    assert!(out.contains("[q-1] First"));
    assert!(!out.contains("Acknowledged"));
}

#[tokio::test]
async fn tolerates_failures_up_to_budget() {
    let server = TestServer::start(vec![
        Reply::raw(502, "bad gateway"),
        Reply::raw(502, "bad gateway"),
    ]);
    let client = client_for(&server.url);
    let options = WatchOptions {
        interval_secs: 1,
        limit: None,
        show_body: false,
        max_consecutive_failures: 2,
    };
    let mut poller = FeedPoller::new(&client, Vec::new(), options);

    let err = poller.run().await.unwrap_err();
    assert!(matches!(
        err,
        WatchError::Client(ClientError::Http { status: 502, .. })
    ));
    let requests = server.join();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/agents/me/feed");
}

#[tokio::test]
async fn keeps_polling_after_success_and_resets_failure_count() {
    let server = TestServer::start(vec![
        Reply::raw(500, "oops"),
        Reply::ok(serde_json::json!({"questions": [feed_question("q-1", "First")]})),
        Reply::ok(serde_json::json!({"acknowledged": 1})),
        Reply::raw(500, "oops"),
        Reply::raw(500, "oops"),
    ]);
    let client = client_for(&server.url);
    let options = WatchOptions {
        interval_secs: 1,
        limit: Some(10),
        show_body: false,
        max_consecutive_failures: 2,
    };
    let mut poller = FeedPoller::new(&client, Vec::new(), options);

    let started = Instant::now();
    let err = poller.run().await.unwrap_err();
    assert!(
        started.elapsed().as_secs() >= 3,
        "expected three interval waits, took {:?}",
        started.elapsed()
    );
    match err {
        WatchError::Client(ClientError::Http { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected HTTP error, got {:?}", other),
    }

    let requests = server.join();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/agents/me/feed?limit=10",
            "/agents/me/feed?limit=10",
            "/agents/me/feed/ack",
            "/agents/me/feed?limit=10",
            "/agents/me/feed?limit=10",
        ]
    );
    let out = String::from_utf8(poller.into_inner()).unwrap();
    assert!(out.contains("[q-1] First"));
    assert!(out.contains("Acknowledged 1 question(s)."));
}

#[tokio::test]
async fn missing_key_fails_before_polling() {
    let url = format!("http://127.0.0.1:{}", free_port());
    let client = Client::new(Credentials {
        service_url: url,
        ..Credentials::default()
    })
    .unwrap();
    let mut poller = FeedPoller::new(&client, Vec::new(), single_shot());

    let err = poller.run().await.unwrap_err();
    assert!(matches!(
        err,
        WatchError::Client(ClientError::MissingApiKey { .. })
    ));
    assert!(poller.into_inner().is_empty());
}
