//! Endpoint table
//!
//! Every backend route with its method, timeout tier and the flags the
//! client uses to decide retries, probing and admin handling.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    Get,
    Post,
}

/// Per-call timeout class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeoutTier {
    /// Quick reads and login
    Interactive,
    /// Signup and uploads
    Standard,
    /// Model retraining
    Extended,
    /// Calls that may hit a sleeping host
    ColdStart,
    /// Wake-up health checks
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Endpoint {
    Login,
    Signup,
    Me,
    Stats,
    ClaimsAnalysis,
    ModelInfo,
    Predict,
    AdminUpload,
    AdminRetrain,
    SendPredictionEmail,
    Health,
}

/// Static properties of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSpec {
    pub path: &'static str,
    pub method: Method,
    pub tier: TimeoutTier,
    pub admin_action: bool,
    pub long_running: bool,
    /// Backend may not implement it; a sentinel body means "absent"
    pub optional: bool,
    /// Probe the service before calling when the host cold-starts
    pub wake_first: bool,
}

const fn spec(path: &'static str, method: Method, tier: TimeoutTier) -> EndpointSpec {
    EndpointSpec {
        path,
        method,
        tier,
        admin_action: false,
        long_running: false,
        optional: false,
        wake_first: false,
    }
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::Login,
        Endpoint::Signup,
        Endpoint::Me,
        Endpoint::Stats,
        Endpoint::ClaimsAnalysis,
        Endpoint::ModelInfo,
        Endpoint::Predict,
        Endpoint::AdminUpload,
        Endpoint::AdminRetrain,
        Endpoint::SendPredictionEmail,
        Endpoint::Health,
    ];

    pub const fn spec(self) -> EndpointSpec {
        use Method::*;
        use TimeoutTier::*;

        match self {
            Endpoint::Login => spec("/login", Post, Interactive),
            Endpoint::Signup => spec("/signup", Post, Standard),
            Endpoint::Me => spec("/me", Get, Interactive),
            Endpoint::Stats => EndpointSpec {
                optional: true,
                ..spec("/stats", Get, Interactive)
            },
            Endpoint::ClaimsAnalysis => EndpointSpec {
                optional: true,
                ..spec("/claims-analysis", Get, Interactive)
            },
            Endpoint::ModelInfo => EndpointSpec {
                optional: true,
                ..spec("/model-info", Get, Interactive)
            },
            Endpoint::Predict => spec("/predict", Post, Interactive),
            Endpoint::AdminUpload => EndpointSpec {
                admin_action: true,
                long_running: true,
                ..spec("/admin/upload", Post, Standard)
            },
            Endpoint::AdminRetrain => EndpointSpec {
                admin_action: true,
                long_running: true,
                ..spec("/admin/retrain", Post, Extended)
            },
            Endpoint::SendPredictionEmail => EndpointSpec {
                long_running: true,
                wake_first: true,
                ..spec("/send-prediction-email", Post, ColdStart)
            },
            Endpoint::Health => spec("/health", Get, Probe),
        }
    }

    pub const fn path(self) -> &'static str {
        self.spec().path
    }

    pub const fn method(self) -> Method {
        self.spec().method
    }

    pub const fn tier(self) -> TimeoutTier {
        self.spec().tier
    }
}
