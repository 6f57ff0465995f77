//! Deterministic mock engine
//!
//! Offline answers for when the backend cannot be reached or the session
//! belongs to a demo account. Every value here is a pure function of its
//! input.

pub mod fixtures;
pub mod prediction;

use serde::Serialize;

pub use fixtures::{
    demo_retrain, demo_upload, mock_claims_analysis, mock_model_info, mock_stats,
};
pub use prediction::{compute_mock, mock_confidence, variation_factor};

/// Result of an operation that may have been answered offline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub data: T,
    pub is_mock: bool,
}

impl<T> Outcome<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            is_mock: false,
        }
    }

    pub fn mock(data: T) -> Self {
        Self {
            data,
            is_mock: true,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            data: f(self.data),
            is_mock: self.is_mock,
        }
    }
}

/// Why an admin operation was answered offline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    DemoAccount,
    BackendUnavailable,
}
