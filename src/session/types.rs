//! Session and route types

use serde::{Deserialize, Serialize};

/// Where a session came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    /// Issued by the backend
    #[default]
    Real,
    /// Issued locally for a built-in demo account
    Demo,
}

/// Client-side authentication state
///
/// `is_admin` only drives UI gating; the backend remains the authority for
/// every admin decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user_email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub origin: SessionOrigin,
}

impl Session {
    /// An empty session with no token
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session backed by a token issued by the backend
    pub fn real(token: impl Into<String>, email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            token: Some(token.into()),
            user_email: Some(email.into()),
            is_admin,
            origin: SessionOrigin::Real,
        }
    }

    /// Session for a demo account, carrying a `demo_token_<millis>` token
    pub fn demo(email: impl Into<String>, is_admin: bool, issued_at_ms: i64) -> Self {
        Self {
            token: Some(format!("demo_token_{}", issued_at_ms)),
            user_email: Some(email.into()),
            is_admin,
            origin: SessionOrigin::Demo,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().map_or(false, |t| !t.is_empty())
    }

    pub fn is_demo(&self) -> bool {
        self.is_authenticated() && self.origin == SessionOrigin::Demo
    }
}

/// Front-end routes the session guard reasons about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Predict,
    Analysis,
    Admin,
    Other(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
            Route::Predict => "/predict",
            Route::Analysis => "/analysis",
            Route::Admin => "/admin",
            Route::Other(path) => path,
        }
    }

    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/dashboard" => Route::Dashboard,
            "/predict" => Route::Predict,
            "/analysis" => Route::Analysis,
            "/admin" => Route::Admin,
            other => Route::Other(other.to_string()),
        }
    }

    /// Routes where a 401 is an expected answer rather than an expired session
    pub fn allows_anonymous(&self) -> bool {
        matches!(self, Route::Login | Route::Signup)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
