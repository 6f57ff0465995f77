//! Demo-account resolution
//!
//! Demo logins are answered locally, before any request reaches the HTTP
//! client.

use chrono::Utc;

use super::types::{Session, SessionOrigin};

/// A built-in account usable without a backend
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

impl DemoAccount {
    fn new(email: &str, password: &str, is_admin: bool) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            is_admin,
        }
    }
}

pub struct OriginResolver {
    accounts: Vec<DemoAccount>,
}

impl Default for OriginResolver {
    fn default() -> Self {
        Self::with_default_accounts()
    }
}

impl OriginResolver {
    pub fn with_default_accounts() -> Self {
        Self {
            accounts: vec![
                DemoAccount::new("admin@example.com", "admin123", true),
                DemoAccount::new("admin@gmail.com", "admin123", true),
                DemoAccount::new("gokrishna98@gmail.com", "admin123", false),
                DemoAccount::new("user@example.com", "user123", false),
            ],
        }
    }

    /// A resolver that never short-circuits a login
    pub fn disabled() -> Self {
        Self {
            accounts: Vec::new(),
        }
    }

    pub fn accounts(&self) -> &[DemoAccount] {
        &self.accounts
    }

    /// Resolve a demo login, stamping the token with the current time
    pub fn resolve_login(&self, email: &str, password: &str) -> Option<Session> {
        self.resolve_login_at(email, password, Utc::now().timestamp_millis())
    }

    pub fn resolve_login_at(&self, email: &str, password: &str, now_ms: i64) -> Option<Session> {
        let email = email.trim();
        self.accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .map(|a| Session::demo(a.email.clone(), a.is_admin, now_ms))
    }

    /// True when the session belongs to a demo admin account
    pub fn is_demo_admin(&self, session: &Session) -> bool {
        if session.origin != SessionOrigin::Demo || !session.is_authenticated() {
            return false;
        }
        let Some(email) = session.user_email.as_deref() else {
            return false;
        };
        self.accounts
            .iter()
            .any(|a| a.is_admin && a.email.eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_demo_admin() {
        let resolver = OriginResolver::with_default_accounts();
        let session = resolver
            .resolve_login_at("admin@example.com", "admin123", 1234)
            .unwrap();
        assert!(session.is_admin);
        assert_eq!(session.token.as_deref(), Some("demo_token_1234"));
        assert!(resolver.is_demo_admin(&session));
    }

    #[test]
    fn test_resolves_demo_user() {
        let resolver = OriginResolver::with_default_accounts();
        let session = resolver
            .resolve_login_at(" user@example.com ", "user123", 1)
            .unwrap();
        assert!(!session.is_admin);
        assert!(!resolver.is_demo_admin(&session));
    }

    #[test]
    fn test_wrong_password_is_not_demo() {
        let resolver = OriginResolver::with_default_accounts();
        assert!(resolver.resolve_login_at("admin@gmail.com", "nope", 1).is_none());
        assert!(resolver.resolve_login_at("someone@else.io", "admin123", 1).is_none());
    }

    #[test]
    fn test_real_session_is_never_demo_admin() {
        let resolver = OriginResolver::with_default_accounts();
        let session = Session::real("jwt", "admin@example.com", true);
        assert!(!resolver.is_demo_admin(&session));
    }

    #[test]
    fn test_disabled_resolver() {
        let resolver = OriginResolver::disabled();
        assert!(resolver.resolve_login("admin@example.com", "admin123").is_none());
    }
}
