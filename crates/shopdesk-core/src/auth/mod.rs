//! Authentication module for managing the session token and guarding routes.
//!
//! This module provides:
//! - `SessionStore`: the single holder of the bearer token
//! - `RouteGate`: the authorization check run before a protected view renders
//! - `AuthIndicator`: top-level logged-in state that follows token changes
//!
//! Tokens are never checked for expiry client-side; the server's 401 is the
//! only signal that a token is no longer valid.

pub mod gate;
pub mod session;
pub mod status;

pub use gate::{Admission, AuthorizationDecision, GateState, GuardedMount, RouteGate, SessionQuery};
pub use session::SessionStore;
pub use status::AuthIndicator;
