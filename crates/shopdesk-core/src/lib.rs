//! Core library for shopdesk.
//!
//! Provides the pieces every storefront and admin screen is built on:
//!
//! - `auth`: the session token store, the route authorization gate and the
//!   top-level auth indicator
//! - `api`: the authenticated request gateway and the typed resource client
//! - `navigation`: routes and the navigator that login redirects act on
//! - `models`: response schemas for the shop backend
//! - `config`: user configuration
//! - `utils`: display formatting helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod utils;

pub use api::{ApiClient, ApiError, AuthRequest, Gateway};
pub use auth::{AuthIndicator, RouteGate, SessionStore};
pub use config::Config;
pub use navigation::{AdminSection, Navigator, Route};
