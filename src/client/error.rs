//! Failure classification

use serde_json::Value;
use thiserror::Error;

/// Coarse class of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FailureClass {
    /// No response: connection refused, DNS, reset
    NetworkUnreachable,
    /// No response within the tier timeout
    Timeout,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 5xx
    ServerError,
    /// Any other non-2xx status
    ClientError,
}

impl FailureClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureClass::Unauthorized,
            403 => FailureClass::Forbidden,
            500..=599 => FailureClass::ServerError,
            _ => FailureClass::ClientError,
        }
    }

    /// Worth retrying
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureClass::NetworkUnreachable | FailureClass::Timeout | FailureClass::ServerError
        )
    }

    pub fn is_auth(self) -> bool {
        matches!(self, FailureClass::Unauthorized | FailureClass::Forbidden)
    }

    /// No response reached the client
    pub fn is_unreachable(self) -> bool {
        matches!(self, FailureClass::NetworkUnreachable | FailureClass::Timeout)
    }
}

/// A classified failure from one call
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub class: FailureClass,
    pub status: Option<u16>,
    /// Message extracted from the response body
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(class: FailureClass) -> Self {
        Self {
            class,
            status: None,
            detail: None,
        }
    }

    pub fn timeout() -> Self {
        Self::new(FailureClass::Timeout)
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            detail: Some(reason.into()),
            ..Self::new(FailureClass::NetworkUnreachable)
        }
    }

    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        Self {
            class: FailureClass::from_status(status),
            status: Some(status),
            detail,
        }
    }

    /// Classify a non-2xx response, pulling `detail` or `message` out of a
    /// JSON body
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        Self::from_status(status, extract_detail(body))
    }

    /// Single human-readable summary
    pub fn user_message(&self) -> String {
        if let Some(detail) = self.detail.as_deref().filter(|d| !d.is_empty()) {
            if !self.class.is_unreachable() {
                return detail.to_string();
            }
        }
        match self.class {
            FailureClass::NetworkUnreachable => {
                "Network error - unable to reach the server".to_string()
            }
            FailureClass::Timeout => "Request timed out - the server may be starting up".to_string(),
            FailureClass::Unauthorized => "Authentication required".to_string(),
            FailureClass::Forbidden => "Access denied".to_string(),
            FailureClass::ServerError => match self.status {
                Some(status) => format!("Server error ({})", status),
                None => "Server error".to_string(),
            },
            FailureClass::ClientError => match self.status {
                Some(status) => format!("Request rejected ({})", status),
                None => "Request rejected".to_string(),
            },
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for Failure {}

fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let field = value.get("detail").or_else(|| value.get("message"))?;
    match field {
        Value::String(s) => Some(s.clone()),
        // FastAPI validation errors: [{"loc": [...], "msg": "...", ...}]
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                Some(field.to_string())
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Errors constructing the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
