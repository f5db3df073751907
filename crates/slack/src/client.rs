//! Slack Web API client.
//!
//! Every call is a single-attempt POST to `{api_base}/{method}` with the token
//! injected as the `token` query parameter. Slack answers most failures with
//! HTTP 200 and `{"ok": false, "error": "..."}`, so the decoded body is checked
//! separately from the transport result (see [`ApiClient::ensure_ok`]).

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use slackline_core::{
    Conversation, DestinationId, DestinationKind, Error, PostOptions, Result, SentMessage,
    UploadedFile,
};
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// An authenticated Slack Web API client.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `https://slack.com/api`).
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::transport("client", e))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Call `method` with a form-encoded payload and return the decoded body.
    ///
    /// Only transport and decoding failures are errors here; an `ok: false`
    /// body is returned as-is.
    pub async fn call(&self, method: &str, payload: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint(method);
        debug!(%url, ?payload, "Calling Slack API");

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.token.as_str())])
            .form(payload)
            .send()
            .await
            .map_err(|e| Error::transport(method, e))?;

        Self::decode(method, response).await
    }

    /// Call `method` with a multipart form (file uploads).
    pub async fn upload(&self, method: &str, form: Form) -> Result<Value> {
        let url = self.endpoint(method);
        debug!(%url, "Uploading to Slack API");

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.token.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::transport(method, e))?;

        Self::decode(method, response).await
    }

    async fn decode(method: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(method, e))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                debug!(method, %status, %body, "Slack API response");
                Ok(body)
            }
            Err(e) => {
                warn!(method, %status, "Slack API returned a non-JSON body");
                Err(Error::transport(
                    method,
                    format!("HTTP {status}, undecodable body: {e}"),
                ))
            }
        }
    }

    /// Turn an `ok: false` body into [`Error::RemoteRejected`].
    pub fn ensure_ok(method: &str, body: Value) -> Result<Value> {
        if body["ok"].as_bool() == Some(true) {
            return Ok(body);
        }
        Err(Error::RemoteRejected {
            method: method.to_string(),
            error: body["error"].as_str().unwrap_or("unknown_error").to_string(),
        })
    }

    async fn call_ok(&self, method: &str, payload: &[(&str, String)]) -> Result<Value> {
        let body = self.call(method, payload).await?;
        Self::ensure_ok(method, body)
    }

    /// Fetch the full `groups.list` or `channels.list` listing.
    pub async fn list(&self, kind: DestinationKind) -> Result<Vec<Conversation>> {
        let method = kind.list_method();
        let mut body = self.call_ok(method, &[]).await?;
        let listing = body[kind.listing_key()].take();
        if listing.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(listing).map_err(|e| Error::transport(method, e))
    }

    /// Post `text` to `channel` via `chat.postMessage`.
    pub async fn post_message(
        &self,
        channel: &DestinationId,
        text: &str,
        options: &PostOptions,
    ) -> Result<SentMessage> {
        const METHOD: &str = "chat.postMessage";

        let payload = post_payload(channel, text, options);
        let body = self.call_ok(METHOD, &payload).await?;

        let ts = body["ts"]
            .as_str()
            .ok_or_else(|| Error::transport(METHOD, "response has no ts"))?
            .to_string();
        let channel = body["channel"]
            .as_str()
            .map(DestinationId::from)
            .unwrap_or_else(|| channel.clone());

        info!(%channel, %ts, "Message posted");
        Ok(SentMessage { channel, ts })
    }

    /// Stream the file at `path` to `channel` via `files.upload`.
    pub async fn upload_file(&self, channel: &DestinationId, path: &Path) -> Result<UploadedFile> {
        const METHOD: &str = "files.upload";

        let unreadable = |e: std::io::Error| Error::FileUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let file = tokio::fs::File::open(path).await.map_err(unreadable)?;
        let len = file.metadata().await.map_err(unreadable)?.len();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let part = Part::stream_with_length(reqwest::Body::from(file), len)
            .file_name(file_name.clone());
        let form = Form::new()
            .text("channels", channel.to_string())
            .text("filename", file_name.clone())
            .part("file", part);

        let mut body = Self::ensure_ok(METHOD, self.upload(METHOD, form).await?)?;
        let file = body["file"].take();

        let uploaded = UploadedFile {
            id: file["id"].as_str().unwrap_or_default().to_string(),
            name: file["name"].as_str().unwrap_or(&file_name).to_string(),
            permalink: file["permalink"].as_str().unwrap_or_default().to_string(),
            permalink_public: file["permalink_public"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            channel: channel.clone(),
        };

        info!(file_id = %uploaded.id, name = %uploaded.name, %channel, "File uploaded");
        Ok(uploaded)
    }

    /// Pin a previously posted message via `pins.add`.
    pub async fn pin_message(&self, message: &SentMessage) -> Result<()> {
        self.call_ok(
            "pins.add",
            &[
                ("channel", message.channel.to_string()),
                ("timestamp", message.ts.clone()),
            ],
        )
        .await?;

        info!(channel = %message.channel, ts = %message.ts, "Message pinned");
        Ok(())
    }

    /// Start a realtime session via `rtm.start` and return its WebSocket URL.
    pub async fn rtm_start(&self) -> Result<String> {
        const METHOD: &str = "rtm.start";

        let body = self.call(METHOD, &[]).await?;
        match body["url"].as_str().filter(|url| !url.trim().is_empty()) {
            Some(url) => Ok(url.to_string()),
            None => {
                warn!(error = ?body["error"].as_str(), "rtm.start returned no url");
                Err(Error::NoSessionUrl)
            }
        }
    }
}

fn post_payload(
    channel: &DestinationId,
    text: &str,
    options: &PostOptions,
) -> Vec<(&'static str, String)> {
    let mut payload = vec![("channel", channel.to_string()), ("text", text.to_string())];

    if options.link_names {
        payload.push(("link_names", "1".into()));
    }
    if options.as_user {
        payload.push(("as_user", "true".into()));
    }
    if let Some(username) = &options.username {
        payload.push(("username", username.clone()));
    }
    if let Some(icon_url) = &options.icon_url {
        payload.push(("icon_url", icon_url.clone()));
    }
    if let Some(icon_emoji) = &options.icon_emoji {
        payload.push(("icon_emoji", icon_emoji.clone()));
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.base_url(), "xoxb-test").unwrap()
    }

    #[test]
    fn payload_includes_only_set_options() {
        let channel = DestinationId::from("C1");
        let plain = post_payload(&channel, "hi", &PostOptions::default());
        assert_eq!(plain.len(), 2);

        let full = post_payload(
            &channel,
            "hi",
            &PostOptions {
                link_names: true,
                as_user: true,
                username: Some("bot".into()),
                icon_url: None,
                icon_emoji: Some(":ghost:".into()),
            },
        );
        assert!(full.contains(&("link_names", "1".to_string())));
        assert!(full.contains(&("as_user", "true".to_string())));
        assert!(full.contains(&("icon_emoji", ":ghost:".to_string())));
        assert!(!full.iter().any(|(k, _)| *k == "icon_url"));
    }

    #[test]
    fn ensure_ok_maps_rejection() {
        let err = ApiClient::ensure_ok(
            "chat.postMessage",
            json!({"ok": false, "error": "not_in_channel"}),
        )
        .unwrap_err();
        match err {
            Error::RemoteRejected { method, error } => {
                assert_eq!(method, "chat.postMessage");
                assert_eq!(error, "not_in_channel");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ApiClient::ensure_ok("auth.test", json!({"ok": true})).is_ok());
    }

    #[tokio::test]
    async fn token_sent_as_query_parameter() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth.test")
                .query_param("token", "xoxb-test");
            then.status(200).json_body(json!({"ok": true}));
        });

        let body = client(&server).call("auth.test", &[]).await.unwrap();
        assert_eq!(body["ok"], true);
        mock.assert();
    }

    #[tokio::test]
    async fn rejected_body_is_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/groups.list");
            then.status(200)
                .json_body(json!({"ok": false, "error": "invalid_auth"}));
        });

        let body = client(&server).call("groups.list", &[]).await.unwrap();
        assert_eq!(body["error"], "invalid_auth");
    }

    #[tokio::test]
    async fn non_json_body_is_transport_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat.postMessage");
            then.status(502).body("<html>bad gateway</html>");
        });

        let err = client(&server)
            .call("chat.postMessage", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransportFailure { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_failure() {
        let client = ApiClient::new("http://127.0.0.1:9", "xoxb-test").unwrap();
        let err = client.call("auth.test", &[]).await.unwrap_err();
        assert!(matches!(err, Error::TransportFailure { .. }));
    }

    #[tokio::test]
    async fn post_message_returns_record() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .body_includes("channel=G1")
                .body_includes("text=hello")
                .body_includes("as_user=true");
            then.status(200)
                .json_body(json!({"ok": true, "channel": "G1", "ts": "1700000000.000100"}));
        });

        let options = PostOptions {
            as_user: true,
            ..PostOptions::default()
        };
        let sent = client(&server)
            .post_message(&"G1".into(), "hello", &options)
            .await
            .unwrap();
        assert_eq!(sent.channel.as_str(), "G1");
        assert_eq!(sent.ts, "1700000000.000100");
        mock.assert();
    }

    #[tokio::test]
    async fn list_decodes_conversations() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/channels.list");
            then.status(200).json_body(json!({
                "ok": true,
                "channels": [
                    {"id": "C1", "name": "general", "is_archived": false},
                    {"id": "C2", "name": "random"}
                ]
            }));
        });

        let listing = client(&server).list(DestinationKind::Channel).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[1].name, "random");
    }

    #[tokio::test]
    async fn upload_missing_file_is_unreadable() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/files.upload");
            then.status(200).json_body(json!({"ok": true}));
        });

        let err = client(&server)
            .upload_file(&"G1".into(), Path::new("/nonexistent/report.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileUnreadable { .. }));
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn upload_file_returns_permalinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "all green").unwrap();

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/files.upload")
                .body_includes("all green")
                .body_includes("report.txt");
            then.status(200).json_body(json!({
                "ok": true,
                "file": {
                    "id": "F1",
                    "name": "report.txt",
                    "permalink": "https://team.slack.com/files/U1/F1/report.txt",
                    "permalink_public": "https://slack-files.com/T1-F1-abc"
                }
            }));
        });

        let uploaded = client(&server)
            .upload_file(&"G1".into(), &path)
            .await
            .unwrap();
        assert_eq!(uploaded.id, "F1");
        assert_eq!(uploaded.channel.as_str(), "G1");
        assert!(uploaded.permalink_public.contains("slack-files.com"));
        mock.assert();
    }

    #[tokio::test]
    async fn rtm_start_without_url_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rtm.start");
            then.status(200)
                .json_body(json!({"ok": false, "error": "not_authed"}));
        });

        let err = client(&server).rtm_start().await.unwrap_err();
        assert!(matches!(err, Error::NoSessionUrl));
    }

    #[tokio::test]
    async fn pin_rejection_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/pins.add")
                .body_includes("timestamp=1.2");
            then.status(200)
                .json_body(json!({"ok": false, "error": "already_pinned"}));
        });

        let err = client(&server)
            .pin_message(&SentMessage {
                channel: "G1".into(),
                ts: "1.2".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RemoteRejected { .. }));
    }
}
