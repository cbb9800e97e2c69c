//! Minimal stand-in for the SendGrid v3 API.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

pub const MAIL_SEND_ROUTE: &str = "/v3/mail/send";
pub const SCOPES_ROUTE: &str = "/v3/scopes";

pub const INVALID_API_KEY_MESSAGE: &str = "The provided API key is invalid";

/// Fake SendGrid server that accepts a single API key and records every
/// accepted mail send request.
#[derive(Debug, Clone)]
pub struct FakeSendgrid(Arc<FakeSendgridState>);

#[derive(Debug)]
struct FakeSendgridState {
    api_key: String,
    messages: Mutex<Vec<Value>>,
}

impl FakeSendgrid {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(Arc::new(FakeSendgridState {
            api_key: api_key.into(),
            messages: Default::default(),
        }))
    }

    pub fn router(&self) -> Router<()> {
        Router::new()
            .route(MAIL_SEND_ROUTE, routing::post(mail_send))
            .route(SCOPES_ROUTE, routing::get(scopes))
            .with_state(self.clone())
    }

    /// Request bodies of all accepted mail send requests, oldest first.
    pub fn messages(&self) -> Vec<Value> {
        self.0
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Serve on an ephemeral port on localhost in a background task.
    pub async fn spawn(&self) -> anyhow::Result<SocketAddr> {
        let listener = TcpListener::bind((IpAddr::from([127, 0, 0, 1]), 0))
            .await
            .context("Failed to bind to an ephemeral port")?;
        let addr = listener.local_addr()?;
        let router = self.router();
        tokio::spawn(async move { axum::serve(listener, router).await });
        Ok(addr)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|key| key == self.0.api_key)
    }
}

pub async fn start_server(host: IpAddr, port: u16, api_key: String) -> anyhow::Result<()> {
    info!("Starting SendGrid testing server on {host}:{port}");
    info!("SendGrid endpoint: http://{host}:{port}");
    info!("API key: {api_key:?}");

    let router = FakeSendgrid::new(api_key).router();

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router)
        .await
        .context("Failed to start HTTP server")
}

#[derive(Serialize)]
struct ErrorResponse {
    errors: Vec<ErrorEntry>,
}

#[derive(Serialize)]
struct ErrorEntry {
    message: &'static str,
    field: Option<&'static str>,
    help: Option<&'static str>,
}

fn errors(status: StatusCode, message: &'static str, field: Option<&'static str>) -> Response {
    let body = ErrorResponse {
        errors: vec![ErrorEntry {
            message,
            field,
            help: None,
        }],
    };
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    errors(StatusCode::UNAUTHORIZED, INVALID_API_KEY_MESSAGE, None)
}

async fn mail_send(
    State(sendgrid): State<FakeSendgrid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !sendgrid.authorized(&headers) {
        return unauthorized();
    }

    if let Some((message, field)) = validate_mail_send(&body) {
        return errors(StatusCode::BAD_REQUEST, message, Some(field));
    }

    sendgrid
        .0
        .messages
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body);

    StatusCode::ACCEPTED.into_response()
}

fn validate_mail_send(body: &Value) -> Option<(&'static str, &'static str)> {
    let non_empty_str = |value: &Value| value.as_str().is_some_and(|s| !s.is_empty());

    if !non_empty_str(&body["personalizations"][0]["to"][0]["email"]) {
        return Some((
            "The to array is required for all personalization objects, and must have at least \
             one email object with a valid email address.",
            "personalizations.0.to",
        ));
    }
    if !non_empty_str(&body["from"]["email"]) {
        return Some(("The from email does not contain a valid address.", "from.email"));
    }
    if !non_empty_str(&body["subject"]) {
        return Some((
            "The subject is required. You can get around this requirement if you use a template \
             with a subject defined or if every personalization has a subject defined.",
            "subject",
        ));
    }
    if !body["content"].as_array().is_some_and(|c| !c.is_empty()) {
        return Some((
            "Unless a valid template_id is provided, the content parameter is required.",
            "content",
        ));
    }
    None
}

async fn scopes(State(sendgrid): State<FakeSendgrid>, headers: HeaderMap) -> Response {
    if !sendgrid.authorized(&headers) {
        return unauthorized();
    }

    Json(json!({ "scopes": ["mail.send"] })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_complete_request() {
        let body = json!({
            "personalizations": [{ "to": [{ "email": "owner@example.com" }] }],
            "from": { "email": "contact@example.com" },
            "subject": "Hello",
            "content": [{ "type": "text/plain", "value": "Hi" }],
        });
        assert_eq!(validate_mail_send(&body), None);
    }

    #[test]
    fn validate_missing_subject() {
        let body = json!({
            "personalizations": [{ "to": [{ "email": "owner@example.com" }] }],
            "from": { "email": "contact@example.com" },
            "subject": "",
            "content": [{ "type": "text/plain", "value": "Hi" }],
        });
        assert_eq!(validate_mail_send(&body).map(|(_, field)| field), Some("subject"));
    }

    #[test]
    fn authorization() {
        let sendgrid = FakeSendgrid::new("SG.key");
        let mut headers = HeaderMap::new();
        assert!(!sendgrid.authorized(&headers));
        headers.insert(AUTHORIZATION, "Bearer SG.other".parse().unwrap());
        assert!(!sendgrid.authorized(&headers));
        headers.insert(AUTHORIZATION, "Bearer SG.key".parse().unwrap());
        assert!(sendgrid.authorized(&headers));
    }
}
