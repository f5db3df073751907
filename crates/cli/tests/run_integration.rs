//! Whole-run tests: configuration merge, the standard task graph, a mocked
//! Web API and a local realtime server.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use httpmock::prelude::*;
use serde_json::json;
use slackline_config::{FileConfig, RunConfig, RunOptions};
use slackline_core::{ConfigIssue, Error};
use slackline_workflow::{Executor, SlackTasks};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

// ── Helpers ─────────────────────────────────────────────────────────────

fn run_config(server: &MockServer, options: RunOptions) -> RunConfig {
    let file = FileConfig {
        api_base: Some(format!("{}/", server.base_url())),
        ..FileConfig::default()
    };
    RunConfig::merge(options, file, Some("xoxb-env".into()))
}

fn tasks(config: RunConfig, stdin: &'static str) -> SlackTasks<&'static [u8], Vec<u8>> {
    SlackTasks::with_io(config, stdin.as_bytes(), Vec::new()).unwrap()
}

fn mock_channels(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/channels.list");
        then.status(200).json_body(json!({
            "ok": true,
            "channels": [{"id": "C7", "name": "builds"}]
        }));
    })
}

/// Accept one realtime client, send `frames`, then close from the server side.
async fn realtime_server(frames: Vec<&'static str>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    (url, handle)
}

// ── Runs ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn env_token_and_file_base_reach_the_api() {
    let server = MockServer::start();
    let channels = server.mock(|when, then| {
        when.method(POST)
            .path("/channels.list")
            .query_param("token", "xoxb-env");
        then.status(200).json_body(json!({
            "ok": true,
            "channels": [{"id": "C7", "name": "builds"}]
        }));
    });
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .query_param("token", "xoxb-env")
            .body_includes("channel=C7")
            .body_includes("link_names=1");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C7", "ts": "10.1"}));
    });

    let options = RunOptions {
        channel: Some("#builds".into()),
        message: Some("green".into()),
        link_names: true,
        ..RunOptions::default()
    };
    let pipe = Executor::standard()
        .execute(&tasks(run_config(&server, options), ""))
        .await
        .unwrap();

    channels.assert();
    post.assert();
    assert_eq!(pipe.destination().map(|d| d.as_str()), Some("C7"));
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = MockServer::start();
    let channels = mock_channels(&server);

    let options = RunOptions {
        channel: Some("builds".into()),
        message: Some("green".into()),
        ..RunOptions::default()
    };
    let file = FileConfig {
        api_base: Some(server.base_url()),
        ..FileConfig::default()
    };
    let config = RunConfig::merge(options, file, None);
    let err = Executor::standard()
        .execute(&tasks(config, ""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ConfigurationInvalid(ConfigIssue::MissingToken)
    ));
    channels.assert_calls(0);
}

#[tokio::test]
async fn both_destinations_rejected() {
    let server = MockServer::start();
    let channels = mock_channels(&server);

    let options = RunOptions {
        group: Some("ops".into()),
        channel: Some("builds".into()),
        message: Some("green".into()),
        ..RunOptions::default()
    };
    let err = Executor::standard()
        .execute(&tasks(run_config(&server, options), ""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ConfigurationInvalid(ConfigIssue::ConflictingDestination)
    ));
    channels.assert_calls(0);
}

#[tokio::test]
async fn upload_failure_posts_nothing() {
    let server = MockServer::start();
    mock_channels(&server);
    let post = server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C7", "ts": "1.0"}));
    });

    let options = RunOptions {
        channel: Some("builds".into()),
        message: Some("report".into()),
        file: Some("/nonexistent/report.csv".into()),
        ..RunOptions::default()
    };
    let err = Executor::standard()
        .execute(&tasks(run_config(&server, options), ""))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FileUnreadable { .. }));
    post.assert_calls(0);
}

#[tokio::test]
async fn wait_for_text_matches_over_realtime() {
    let (ws_url, ws_server) = realtime_server(vec![
        r#"{"type":"hello"}"#,
        r#"{"type":"message","channel":"C7","text":"deploy?"}"#,
        r#"{"type":"message","channel":"C7","text":"deploy!","ts":"3.3"}"#,
    ])
    .await;

    let server = MockServer::start();
    mock_channels(&server);
    let rtm = server.mock(|when, then| {
        when.method(POST).path("/rtm.start");
        then.status(200).json_body(json!({"ok": true, "url": ws_url}));
    });

    let options = RunOptions {
        channel: Some("builds".into()),
        wait_for_text: Some("deploy!".into()),
        timeout_secs: Some(5),
        ..RunOptions::default()
    };
    let pipe = Executor::standard()
        .execute(&tasks(run_config(&server, options), ""))
        .await
        .unwrap();

    rtm.assert();
    assert_eq!(pipe.wait_for_text.unwrap().ts.as_deref(), Some("3.3"));
    ws_server.await.unwrap();
}

#[tokio::test]
async fn read_prints_destination_messages() {
    let (ws_url, ws_server) = realtime_server(vec![
        r#"{"type":"message","channel":"C7","text":"one"}"#,
        r#"{"type":"message","channel":"C1","text":"noise"}"#,
        r#"{"type":"message","channel":"C7","text":"two"}"#,
    ])
    .await;

    let server = MockServer::start();
    mock_channels(&server);
    server.mock(|when, then| {
        when.method(POST).path("/rtm.start");
        then.status(200).json_body(json!({"ok": true, "url": ws_url}));
    });

    let options = RunOptions {
        channel: Some("builds".into()),
        read: true,
        ..RunOptions::default()
    };
    let runner = tasks(run_config(&server, options), "");
    let pipe = tokio::time::timeout(Duration::from_secs(5), Executor::standard().execute(&runner))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(pipe.read, Some(2));
    assert_eq!(String::from_utf8(runner.into_output()).unwrap(), "one\ntwo\n");
    ws_server.await.unwrap();
}

#[tokio::test]
async fn console_and_message_run_side_by_side() {
    let server = MockServer::start();
    mock_channels(&server);
    let posts = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("channel=C7");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C7", "ts": "4.0"}));
    });

    let options = RunOptions {
        channel: Some("builds".into()),
        message: Some("starting".into()),
        console: true,
        ..RunOptions::default()
    };
    let pipe = Executor::standard()
        .execute(&tasks(run_config(&server, options), "line one\nline two\n"))
        .await
        .unwrap();

    posts.assert_calls(3);
    assert!(pipe.send_message.is_some());
    assert_eq!(pipe.send_console_message.map(|v| v.len()), Some(2));
}
