//! Claims API
//!
//! Typed operations against the claims analytics backend.
//!
//! # Operations
//!
//! ## Auth
//! - `login` - `POST /login` (demo accounts answered locally)
//! - `signup` - `POST /signup`
//! - `current_user` - `GET /me`
//!
//! ## Analytics (sample data when unavailable)
//! - `stats` - `GET /stats`
//! - `claims_analysis` - `GET /claims-analysis`
//! - `model_info` - `GET /model-info`
//!
//! ## Prediction
//! - `predict` - `POST /predict` (offline estimate when unavailable)
//! - `send_prediction_email` - `POST /send-prediction-email`
//!
//! ## Admin
//! - `upload_dataset` - `POST /admin/upload`
//! - `retrain_model` - `POST /admin/retrain`
//!
//! # Example
//!
//! ```rust,no_run
//! use claimsight::api::ClaimsApi;
//! use claimsight::client::CancelToken;
//! use claimsight::config::Config;
//! use claimsight::session::Route;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ClaimsApi::from_config(&Config::load_default(), Route::Login)?;
//! api.login("admin@example.com", "admin123").await?;
//!
//! let stats = api.stats(&CancelToken::new()).await?;
//! println!("{} policies (sample data: {})", stats.data.total_policies, stats.is_mock);
//! # Ok(())
//! # }
//! ```

pub mod dto;
pub mod error;
pub mod service;

pub use dto::*;
pub use error::{ApiError, ApiResult, ErrorBody};
pub use service::ClaimsApi;
