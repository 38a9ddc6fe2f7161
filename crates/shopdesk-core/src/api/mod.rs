//! REST API module for the shop backend.
//!
//! `Gateway` performs every authenticated call: it injects the bearer token
//! held by the session store, applies rotated tokens from response headers,
//! and de-authenticates on 401. `ApiClient` layers typed operations for each
//! storefront and admin screen on top of it.

pub mod client;
pub mod error;
pub mod gateway;

pub use client::ApiClient;
pub use error::ApiError;
pub use gateway::{AuthRequest, Gateway};
