//! Session guard
//!
//! Decides what an authentication failure means for the current session and
//! applies that decision through a [`Navigator`].

use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

use super::store::TokenStore;
use super::types::Route;
use crate::client::{Failure, FailureClass, RequestContext};

/// Where the user currently is and how to move them
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> Route;
    fn navigate(&self, to: Route);
}

/// In-process navigator that records every navigation
pub struct RouteTracker {
    current: RwLock<Route>,
    history: Mutex<Vec<Route>>,
}

impl RouteTracker {
    pub fn new(start: Route) -> Self {
        Self {
            current: RwLock::new(start),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Navigations performed so far, oldest first
    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for RouteTracker {
    fn current_route(&self) -> Route {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn navigate(&self, to: Route) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = to.clone();
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(to);
    }
}

/// Authentication state derived from the token store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    Anonymous,
}

/// What to do about a failed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Not an authentication failure
    Ignore,
    /// Leave the session alone and let the caller report the error
    Surface,
    /// Move elsewhere, keeping the session
    Redirect(Route),
    /// Drop the session and move elsewhere
    ClearAndRedirect(Route),
}

pub struct SessionGuard {
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    pub fn new(store: Arc<TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn state(&self) -> AuthState {
        if self.store.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Decide without side effects
    pub fn decide(&self, failure: &Failure, ctx: &RequestContext) -> GuardDecision {
        if !failure.class.is_auth() {
            return GuardDecision::Ignore;
        }

        // Admin actions report their own auth failures
        if ctx.is_admin_action {
            return GuardDecision::Surface;
        }

        let route = self.navigator.current_route();
        if route == Route::Admin && !self.store.is_admin() {
            return GuardDecision::Redirect(Route::Dashboard);
        }

        if failure.class == FailureClass::Forbidden || route.allows_anonymous() {
            return GuardDecision::Surface;
        }

        match self.state() {
            AuthState::Authenticated => GuardDecision::ClearAndRedirect(Route::Login),
            AuthState::Anonymous => GuardDecision::Redirect(Route::Login),
        }
    }

    /// Decide and apply
    pub fn handle(&self, failure: &Failure, ctx: &RequestContext) -> GuardDecision {
        let decision = self.decide(failure, ctx);
        match &decision {
            GuardDecision::Ignore | GuardDecision::Surface => {}
            GuardDecision::Redirect(route) => {
                info!(endpoint = ctx.endpoint.path(), to = %route, "Redirecting after auth failure");
                self.navigator.navigate(route.clone());
            }
            GuardDecision::ClearAndRedirect(route) => {
                info!(endpoint = ctx.endpoint.path(), to = %route, "Session rejected by backend, signing out");
                if let Err(e) = self.store.clear_session() {
                    warn!(error = %e, "Failed to remove persisted session");
                }
                self.navigator.navigate(route.clone());
            }
        }
        decision
    }
}
