//! End-to-end session tests against an HTTP daemon stand-in.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use presence_core::{
    DaemonRpc, DisplayStatus, Document, EditorBridge, EditorEvent, HttpTransport, Outcome,
    SelectionKind, SessionClient, StatusSink, Transport,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Recorder(Mutex<Vec<DisplayStatus>>);

impl Recorder {
    fn last(&self) -> Option<DisplayStatus> {
        self.0.lock().unwrap().last().cloned()
    }
}

impl StatusSink for Recorder {
    fn render(&self, status: &DisplayStatus) {
        self.0.lock().unwrap().push(status.clone());
    }
}

fn snapshot(pushed: i64, ahead: i64) -> Value {
    json!({
        "valid": true,
        "name": "presence",
        "prettyName": "Presence",
        "branch": "master",
        "path": "/home/me/presence",
        "hasOrigin": true,
        "cache": {
            "localCommistOnStart": 0,
            "aheadOfLocal": 0,
            "remoteCommitsOnStart": 0,
            "aheadOfRemote": ahead,
            "pushedToRemote": pushed
        }
    })
}

async fn mount(server: &MockServer, name: &str, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": name})))
        .respond_with(reply)
        .mount(server)
        .await;
}

fn session(address: &str, sink: Arc<Recorder>, interval: Duration) -> SessionClient {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(address).unwrap());
    let rpc = DaemonRpc::new(transport, "Visual Studio Code", 31337);
    SessionClient::new(rpc, sink, interval)
}

async fn bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

#[tokio::test]
async fn report_heartbeat_and_leave() {
    let server = MockServer::start().await;
    mount(
        &server,
        "set_path",
        ResponseTemplate::new(200).set_body_json(snapshot(0, 2)),
    )
    .await;
    mount(
        &server,
        "ping",
        ResponseTemplate::new(200).set_body_json(snapshot(3, 5)),
    )
    .await;
    mount(&server, "im_leaving", ResponseTemplate::new(200)).await;

    let sink = Arc::new(Recorder::default());
    let client = session(&server.uri(), sink.clone(), Duration::from_millis(100));

    let outcome = client.report_path("/home/me/presence/src/lib.rs", "rust").await;
    assert!(outcome.is_success());
    assert_eq!(sink.last(), Some(DisplayStatus::Ahead(2)));

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(
        sink.last(),
        Some(DisplayStatus::Pushed {
            pushed: 3,
            ahead: 5
        })
    );

    client.notify_leaving().await;
    // Let any request already on the wire land before counting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let sent = bodies(&server).await;
    let pings_at_leave = sent.iter().filter(|body| body["method"] == "ping").count();
    assert!(pings_at_leave >= 2);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let sent = bodies(&server).await;
    assert_eq!(
        sent.iter().filter(|body| body["method"] == "ping").count(),
        pings_at_leave
    );
    assert_eq!(
        sent.iter().filter(|body| body["method"] == "im_leaving").count(),
        1
    );

    let first = &sent[0];
    assert_eq!(first["editor"], "Visual Studio Code");
    assert_eq!(first["id"], 31337);
    assert_eq!(first["params"]["path"], "/home/me/presence/src/lib.rs");
    assert_eq!(first["params"]["language"], "rust");
}

#[tokio::test]
async fn unreachable_daemon_renders_offline() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let sink = Arc::new(Recorder::default());
    let client = session(&address, sink.clone(), Duration::from_secs(15));

    match client.report_path("/repo/a.rs", "rust").await {
        Outcome::Failed(err) => assert!(err.is_unreachable()),
        other => panic!("expected failure, got {:?}", other),
    }
    let status = sink.last().unwrap();
    assert!(status.is_alert());
    assert_eq!(status.action().map(|action| action.command()), Some("start"));
    assert!(!client.probe_liveness().await);
}

#[tokio::test]
async fn bridge_reports_once_per_document() {
    let server = MockServer::start().await;
    mount(
        &server,
        "set_path",
        ResponseTemplate::new(200).set_body_json(json!({"valid": false})),
    )
    .await;

    let sink = Arc::new(Recorder::default());
    let mut bridge = EditorBridge::new(session(&server.uri(), sink.clone(), Duration::from_secs(3600)));

    bridge.attach(Some(Document::new("/tmp/notes.txt", "plaintext"))).await;
    for _ in 0..3 {
        bridge
            .handle(EditorEvent::WindowFocusChanged { focused: false })
            .await;
        bridge
            .handle(EditorEvent::WindowFocusChanged { focused: true })
            .await;
        bridge
            .handle(EditorEvent::SelectionChanged {
                kind: SelectionKind::Keyboard,
                document: None,
            })
            .await;
    }

    let sent = bodies(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sink.last(), Some(DisplayStatus::NotInRepository));
}
