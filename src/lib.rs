//! # Claimsight
//!
//! Resilient client for a medical insurance claims analytics backend.
//!
//! ## Features
//!
//! - **Session handling**: token store with a guard that reacts to expired sessions
//! - **Tiered timeouts**: per-endpoint deadlines, longer for hosts that cold-start
//! - **Bounded retries**: linear backoff for transient failures, with cancellation
//! - **Offline answers**: deterministic estimates and sample data when the backend is away
//! - **Demo accounts**: built-in logins that never touch the network
//!
//! ## Modules
//!
//! - [`api`]: typed operations against the backend
//! - [`client`]: transport, failure classification, probe and retry
//! - [`session`]: token store, session guard and demo-account resolution
//! - [`mock`]: deterministic offline results
//! - [`notify`]: processing and result notifications
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claimsight::api::{Gender, PatientProfile, Region, Smoker};
//! use claimsight::{CancelToken, ClaimsApi, Config, Route};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let api = ClaimsApi::from_config(&config, Route::Predict)?;
//!
//!     let profile = PatientProfile {
//!         age: 42,
//!         bmi: 27.3,
//!         gender: Gender::Female,
//!         smoker: Smoker::No,
//!         region: Region::South,
//!         premium_annual_inr: Some(28_000.0),
//!     };
//!
//!     let outcome = api.predict(&profile, &CancelToken::new()).await?;
//!     println!(
//!         "Estimated claim: INR {:.0} (offline estimate: {})",
//!         outcome.data.prediction, outcome.is_mock
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod mock;
pub mod notify;
pub mod session;

// Re-export top-level types for convenience
pub use api::{ApiError, ApiResult, ClaimsApi};

pub use client::{
    CancelToken, Endpoint, Failure, FailureClass, HttpClient, OperationState, RetryController,
    RetryPolicy, TimeoutTier, Transport, WakeUpProbe,
};

pub use config::{Config, ConfigError, LoggingConfig};

pub use mock::{compute_mock, Outcome};

pub use notify::{Notification, NotificationCenter, NotificationKind};

pub use session::{
    GuardDecision, Navigator, OriginResolver, Route, Session, SessionGuard, SessionOrigin,
    TokenStore,
};
