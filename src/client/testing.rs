//! Scripted transport for unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::request::ApiResponse;
use super::transport::{Transport, TransportError, TransportRequest};

pub type Reply = Result<ApiResponse, TransportError>;

/// Replays queued replies in order, then repeats the fallback reply
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    delay: Option<Duration>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn always(reply: Reply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: reply,
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn sequence(replies: Vec<Reply>, then: Reply) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::always(then)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Requests whose URL ends with the given path
    pub fn calls_to(&self, path: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.ends_with(path))
            .count()
    }
}

pub fn ok(value: Value) -> Reply {
    Ok(ApiResponse::json_body(200, &value))
}

pub fn status(code: u16, value: Value) -> Reply {
    Ok(ApiResponse::json_body(code, &value))
}

pub fn timeout() -> Reply {
    Err(TransportError::Timeout)
}

pub fn refused() -> Reply {
    Err(TransportError::Connect("connection refused".into()))
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<ApiResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
