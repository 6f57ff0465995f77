//! Service wake-up probe
//!
//! Hosts that sleep when idle take a long time to answer the first request.
//! A cheap health check before a long call gets the host booting.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::endpoint::{Endpoint, Method, TimeoutTier};
use super::request::RequestBody;
use super::transport::{Transport, TransportRequest};
use crate::config::ApiConfig;

pub struct WakeUpProbe {
    transport: Arc<dyn Transport>,
    config: ApiConfig,
}

impl WakeUpProbe {
    pub fn new(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Whether a call to this endpoint should be preceded by a probe
    pub fn should_probe(&self, endpoint: Endpoint) -> bool {
        endpoint.spec().wake_first && self.config.is_cold_start_origin()
    }

    /// Best-effort health check. Returns true if the service answered with
    /// a 2xx; failures are logged and never propagated.
    pub async fn probe(&self, before: Endpoint) -> bool {
        let request = TransportRequest {
            method: Method::Get,
            url: format!("{}{}", self.config.base_url(), Endpoint::Health.path()),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: RequestBody::Empty,
            timeout: self.config.timeout_for(TimeoutTier::Probe),
        };

        info!(before = before.path(), "Waking up backend service");
        match self.transport.execute(request).await {
            Ok(response) if response.is_success() => {
                debug!("Backend is awake");
                true
            }
            Ok(response) => {
                warn!(status = response.status, "Health check returned an error status, proceeding anyway");
                false
            }
            Err(e) => {
                warn!(error = %e, "Health check failed, proceeding anyway");
                false
            }
        }
    }
}
