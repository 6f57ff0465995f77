//! Session state
//!
//! The token store, the demo-account resolver and the guard that reacts to
//! authentication failures.

pub mod guard;
pub mod origin;
pub mod store;
pub mod types;

pub use guard::{AuthState, GuardDecision, Navigator, RouteTracker, SessionGuard};
pub use origin::{DemoAccount, OriginResolver};
pub use store::{
    AuthSnapshot, FileSessionStore, MemorySessionStore, SessionPersistence, StoreError, TokenStore,
};
pub use types::{Route, Session, SessionOrigin};
