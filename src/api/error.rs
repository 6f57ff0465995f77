//! API Error Types
//!
//! Errors surfaced to callers of [`ClaimsApi`](super::ClaimsApi), each with a
//! single user-facing message.

use serde::Serialize;
use thiserror::Error;

use crate::client::{ClientError, Failure, RetryError};
use crate::session::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend could not be reached during login
    #[error("Backend unavailable. Try demo accounts: admin@example.com / admin123 or admin@gmail.com / admin123")]
    BackendUnavailable,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Server error. Please try again later.")]
    Server,

    #[error("Request timeout - server may be slow")]
    Timeout,

    #[error("Email already exists. Please use a different email.")]
    DuplicateEmail,

    /// Backend rejected the request with its own message
    #[error("{0}")]
    Rejected(String),

    /// Client-side admin gate
    #[error("Admin access required for {0}")]
    AdminRequired(&'static str),

    #[error("Authentication failed. Please login as admin and try again.")]
    AdminAuthFailed,

    #[error("No access token received from server")]
    MissingToken,

    /// Input failed client-side validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// 2xx response whose body did not match the expected shape
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("{0}")]
    Request(Failure),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Server => "SERVER_ERROR",
            ApiError::Timeout => "TIMEOUT",
            ApiError::DuplicateEmail => "DUPLICATE_EMAIL",
            ApiError::Rejected(_) => "REJECTED",
            ApiError::AdminRequired(_) => "ADMIN_REQUIRED",
            ApiError::AdminAuthFailed => "ADMIN_AUTH_FAILED",
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
            ApiError::Request(_) => "REQUEST_FAILED",
            ApiError::Cancelled => "CANCELLED",
            ApiError::Client(_) => "CLIENT_ERROR",
            ApiError::Store(_) => "STORE_ERROR",
            ApiError::Io(_) => "IO_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<RetryError> for ApiError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Failed(failure) => ApiError::Request(failure),
            RetryError::Cancelled => ApiError::Cancelled,
        }
    }
}

/// Error details for JSON output
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
