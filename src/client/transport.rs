//! Transport layer
//!
//! The only place that touches the network. Everything above it works with
//! [`TransportRequest`] and [`ApiResponse`] values so it can be driven by a
//! scripted transport in tests.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::endpoint::Method;
use super::error::{ClientError, Failure};
use super::request::{ApiResponse, RequestBody};

/// A fully resolved outgoing request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Failures where no response was received
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<TransportError> for Failure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => Failure::timeout(),
            TransportError::Connect(reason) | TransportError::Other(reason) => {
                Failure::unreachable(reason)
            }
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport backed by `reqwest`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("claimsight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        builder = builder.timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::File {
                field,
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|e| TransportError::Other(e.to_string()))?;
                builder.multipart(Form::new().part(field, part))
            }
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Form as AxumForm,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route(
                "/me",
                get(|headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(json!({ "authorization": auth }))
                }),
            )
            .route(
                "/login",
                post(|AxumForm(form): AxumForm<HashMap<String, String>>| async move {
                    if form.get("password").map(String::as_str) == Some("secret") {
                        (StatusCode::OK, Json(json!({ "access_token": "jwt", "email": form["username"] })))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Incorrect email or password" })))
                    }
                }),
            )
            .route(
                "/predict",
                post(|Json(body): Json<Value>| async move { Json(json!({ "echo": body })) }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(method: Method, url: String, body: RequestBody) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: Vec::new(),
            body,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_headers_are_sent() {
        let base = spawn_stub().await;
        let transport = ReqwestTransport::new().unwrap();
        let mut req = request(Method::Get, format!("{}/me", base), RequestBody::Empty);
        req.headers.push(("Authorization".into(), "Bearer abc".into()));

        let response = transport.execute(req).await.unwrap();
        assert_eq!(response.status, 200);
        let body: Value = response.json().unwrap();
        assert_eq!(body["authorization"], "Bearer abc");
    }

    #[tokio::test]
    async fn test_form_and_status_passthrough() {
        let base = spawn_stub().await;
        let transport = ReqwestTransport::new().unwrap();

        let ok = transport
            .execute(request(
                Method::Post,
                format!("{}/login", base),
                RequestBody::Form(vec![
                    ("username".into(), "a@b.co".into()),
                    ("password".into(), "secret".into()),
                ]),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status, 200);

        let rejected = transport
            .execute(request(
                Method::Post,
                format!("{}/login", base),
                RequestBody::Form(vec![
                    ("username".into(), "a@b.co".into()),
                    ("password".into(), "wrong".into()),
                ]),
            ))
            .await
            .unwrap();
        assert_eq!(rejected.status, 401);
        let failure = Failure::from_response(rejected.status, &rejected.body);
        assert_eq!(failure.detail.as_deref(), Some("Incorrect email or password"));
    }

    #[tokio::test]
    async fn test_json_body() {
        let base = spawn_stub().await;
        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .execute(request(
                Method::Post,
                format!("{}/predict", base),
                RequestBody::Json(json!({ "age": 40 })),
            ))
            .await
            .unwrap();
        let body: Value = response.json().unwrap();
        assert_eq!(body["echo"]["age"], 40);
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let base = spawn_stub().await;
        let transport = ReqwestTransport::new().unwrap();
        let mut req = request(Method::Get, format!("{}/slow", base), RequestBody::Empty);
        req.timeout = Duration::from_millis(100);

        let err = transport.execute(req).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .execute(request(Method::Get, format!("http://{}/health", addr), RequestBody::Empty))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)));
        assert_eq!(
            Failure::from(err).class,
            crate::client::FailureClass::NetworkUnreachable
        );
    }
}
