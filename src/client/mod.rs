//! Backend API client
//!
//! Layers, bottom up:
//!
//! - [`transport`]: network access behind the [`Transport`] trait
//! - [`core`]: credentials, tier timeouts, failure classification and the
//!   session guard hook
//! - [`probe`]: wake-up health checks for hosts that sleep when idle
//! - [`retry`]: bounded retries with linear backoff and cancellation

pub mod core;
pub mod endpoint;
pub mod error;
pub mod probe;
pub mod request;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use self::core::HttpClient;
pub use endpoint::{Endpoint, EndpointSpec, Method, TimeoutTier};
pub use error::{ClientError, Failure, FailureClass};
pub use probe::WakeUpProbe;
pub use request::{ApiResponse, RequestBody, RequestContext};
pub use retry::{
    CancelToken, OperationState, OperationTracker, RetryController, RetryError, RetryPolicy,
};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest};
