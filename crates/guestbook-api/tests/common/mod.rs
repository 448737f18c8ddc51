#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use guestbook_api::config::Config;
use guestbook_api::notify::{MailTransport, Notification, Notifier};
use guestbook_api::router;
use guestbook_api::state::{AppState, AppStateInner};
use guestbook_db::Database;

pub const TOKEN: &str = "test-admin-token";
pub const BASE_URL: &str = "https://guestbook.test";

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "GUESTBOOK_ADMIN_TOKEN" => Some(TOKEN.to_string()),
        "GUESTBOOK_BASE_URL" => Some(BASE_URL.to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state(notifier: Notifier) -> AppState {
    AppStateInner::new(test_config(), Database::open_in_memory().unwrap(), notifier).unwrap()
}

pub fn notifier_with(transport: Arc<dyn MailTransport>, timeout: Duration) -> Notifier {
    Notifier::new(transport, BASE_URL, TOKEN, timeout)
}

pub fn app(state: &AppState) -> Router {
    router(state.clone())
}

/// Records every notification it is asked to send.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn send(&self, _notification: &Notification) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

/// Records after a short delay, like a slow but healthy mail server.
#[derive(Default)]
pub struct SlowTransport {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl MailTransport for SlowTransport {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Never finishes on its own; only the notifier timeout ends it.
pub struct HangingTransport;

#[async_trait]
impl MailTransport for HangingTransport {
    async fn send(&self, _notification: &Notification) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let (status, body) = get(app, uri).await;
    (status, String::from_utf8(body).unwrap())
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Submit an entry and return its id.
pub async fn submit(app: &Router, name: &str, message: &str) -> i64 {
    let (status, body) = post_json(
        app,
        "/api/entries",
        serde_json::json!({ "name": name, "message": message }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit failed: {body}");
    body["id"].as_i64().unwrap()
}

pub fn ids(listing: &serde_json::Value) -> Vec<i64> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect()
}
