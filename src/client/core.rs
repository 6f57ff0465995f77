//! HTTP client core
//!
//! Attaches credentials and tier timeouts, classifies every outcome and
//! hands authentication failures to the session guard.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::endpoint::Endpoint;
use super::error::Failure;
use super::request::{ApiResponse, RequestContext};
use super::transport::{Transport, TransportRequest};
use crate::config::ApiConfig;
use crate::session::{GuardDecision, SessionGuard, TokenStore};

pub struct HttpClient {
    transport: Arc<dyn Transport>,
    config: ApiConfig,
    store: Arc<TokenStore>,
    guard: SessionGuard,
}

impl HttpClient {
    pub fn new(
        config: ApiConfig,
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        guard: SessionGuard,
    ) -> Self {
        Self {
            transport,
            config,
            store,
            guard,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.config.base_url(), endpoint.path())
    }

    /// Send one request. Never panics; every outcome is either a 2xx
    /// response or a classified [`Failure`].
    pub async fn send(&self, ctx: &RequestContext) -> Result<ApiResponse, Failure> {
        let request_id = Uuid::new_v4().to_string();
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Request-Id".to_string(), request_id.clone()),
        ];
        if let Some(token) = self.store.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let timeout = self.config.timeout_for(ctx.endpoint.tier());
        let request = TransportRequest {
            method: ctx.endpoint.method(),
            url: self.url_for(ctx.endpoint),
            headers,
            body: ctx.body.clone(),
            timeout,
        };

        debug!(
            endpoint = ctx.endpoint.path(),
            request_id = %request_id,
            timeout_secs = timeout.as_secs(),
            "Sending request"
        );

        let failure = match self.transport.execute(request).await {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => Failure::from_response(response.status, &response.body),
            Err(e) => Failure::from(e),
        };

        warn!(
            endpoint = ctx.endpoint.path(),
            request_id = %request_id,
            class = ?failure.class,
            status = ?failure.status,
            "Request failed"
        );

        let decision = self.guard.handle(&failure, ctx);
        if decision != GuardDecision::Ignore {
            debug!(decision = ?decision, "Session guard applied");
        }

        Err(failure)
    }
}
