//! Typed client for the shop backend.
//!
//! Every storefront and admin screen talks to the server through
//! `ApiClient`. Authenticated calls go through the [`Gateway`]; login is the
//! one call made without a session.

use reqwest::header;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::SessionStore;
use crate::models::{Member, NewUser, Order, Page, Product, Role, ShoppingLog, User};
use crate::navigation::{Navigator, Route};

use super::gateway::{strip_bearer, BEARER_PREFIX};
use super::{ApiError, AuthRequest, Gateway};

// ============================================================================
// Constants
// ============================================================================

/// Form-encoded login endpoint; the token comes back in a header.
const LOGIN_PATH: &str = "/token";

/// Logout endpoint; invalidates the refresh cookie server-side.
const LOGOUT_PATH: &str = "/invalidate-token";

/// Page size used by the storefront lists.
pub const STOREFRONT_PAGE_SIZE: u32 = 10;

/// Page size used by the admin lists.
pub const ADMIN_PAGE_SIZE: u32 = 5;

/// Default sort for the admin order list: newest first.
pub const DEFAULT_ORDER_SORT: &str = "orderDate,desc";

/// API client for the shop backend.
/// Clone is cheap - the gateway shares its connection pool and session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    gateway: Gateway,
}

impl ApiClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn navigator(&self) -> &Navigator {
        self.gateway.navigator()
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        resource: &'static str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| {
            warn!(resource, error = %source, "Response did not match schema");
            ApiError::Decode { resource, source }
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: AuthRequest,
        resource: &'static str,
    ) -> Result<T, ApiError> {
        let response = self.gateway.send(request).await?;
        Self::decode(response, resource).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        request: AuthRequest,
        body: &B,
        resource: &'static str,
    ) -> Result<T, ApiError> {
        self.fetch(request.json(body)?, resource).await
    }

    /// Send a request whose response body is not needed.
    async fn execute(&self, request: AuthRequest) -> Result<(), ApiError> {
        self.gateway.send(request).await?;
        Ok(())
    }

    fn page(path: &str, page: u32, size: u32) -> AuthRequest {
        AuthRequest::get(path).query("page", page).query("size", size)
    }

    // ===== Session =====

    /// Log in with username and password.
    ///
    /// Success requires a 2xx status and an `Authorization: Bearer <token>`
    /// response header; the token is stored in the session. The session is
    /// untouched on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = self.gateway.url(LOGIN_PATH)?;

        let response = self
            .gateway
            .http()
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(username, %status, "Login rejected");
            return Err(ApiError::LoginRejected(status));
        }

        let token = response
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|raw| raw.starts_with(BEARER_PREFIX))
            .map(strip_bearer)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!(username, "Login response carried no usable credential");
                ApiError::MissingCredential
            })?;

        self.gateway.session().set(token);
        info!(username, "Login successful");
        Ok(())
    }

    /// Invalidate the session server-side, clear it locally, and go to login.
    ///
    /// Without a stored token there is nothing to invalidate; the navigator
    /// still moves to login.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.gateway.session().get().is_none() {
            debug!("Logout without session");
            self.gateway.navigator().navigate(Route::LOGIN);
            return Ok(());
        }

        self.execute(AuthRequest::get(LOGOUT_PATH)).await?;

        self.gateway.session().clear();
        self.gateway.navigator().navigate(Route::LOGIN);
        info!("Logged out");
        Ok(())
    }

    // ===== Storefront =====

    pub async fn products(&self, page: u32) -> Result<Page<Product>, ApiError> {
        self.fetch(Self::page("/api/products", page, STOREFRONT_PAGE_SIZE), "product page")
            .await
    }

    /// The logged-in member's own account.
    pub async fn member_info(&self) -> Result<Member, ApiError> {
        self.fetch(AuthRequest::get("/api/member"), "member").await
    }

    /// The logged-in member's orders.
    pub async fn order_history(&self, page: u32) -> Result<Page<Order>, ApiError> {
        self.fetch(Self::page("/api/orders", page, STOREFRONT_PAGE_SIZE), "order page")
            .await
    }

    // ===== Admin: members =====

    pub async fn members(&self, page: u32) -> Result<Page<Member>, ApiError> {
        self.fetch(Self::page("/admin/members", page, ADMIN_PAGE_SIZE), "member page")
            .await
    }

    pub async fn member(&self, id: i64) -> Result<Member, ApiError> {
        self.fetch(AuthRequest::get(format!("/admin/members/{}", id)), "member")
            .await
    }

    pub async fn create_member(&self, member: &Member) -> Result<Member, ApiError> {
        self.send_json(AuthRequest::post("/admin/members"), member, "member")
            .await
    }

    pub async fn update_member(&self, id: i64, member: &Member) -> Result<Member, ApiError> {
        self.send_json(AuthRequest::put(format!("/admin/members/{}", id)), member, "member")
            .await
    }

    pub async fn delete_member(&self, id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!("/admin/members/{}", id)))
            .await
    }

    // ===== Admin: products =====

    pub async fn admin_products(&self, page: u32) -> Result<Page<Product>, ApiError> {
        self.fetch(Self::page("/admin/products", page, ADMIN_PAGE_SIZE), "product page")
            .await
    }

    pub async fn product(&self, id: i64) -> Result<Product, ApiError> {
        self.fetch(AuthRequest::get(format!("/admin/products/{}", id)), "product")
            .await
    }

    pub async fn create_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.send_json(AuthRequest::post("/admin/products"), product, "product")
            .await
    }

    pub async fn update_product(&self, id: i64, product: &Product) -> Result<Product, ApiError> {
        self.send_json(AuthRequest::put(format!("/admin/products/{}", id)), product, "product")
            .await
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!("/admin/products/{}", id)))
            .await
    }

    // ===== Admin: orders =====

    /// All orders. `sort` is `field[,asc|desc]`.
    pub async fn orders(&self, page: u32, sort: &str) -> Result<Page<Order>, ApiError> {
        let request = Self::page("/admin/orders", page, ADMIN_PAGE_SIZE).query("sort", sort);
        self.fetch(request, "order page").await
    }

    pub async fn delete_order(&self, id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!("/admin/orders/{}", id)))
            .await
    }

    // ===== Admin: roles =====

    pub async fn roles(&self) -> Result<Vec<Role>, ApiError> {
        self.fetch(AuthRequest::get("/admin/roles"), "role list").await
    }

    pub async fn create_role(&self, name: &str) -> Result<Role, ApiError> {
        self.send_json(AuthRequest::post("/admin/roles/"), &Role::named(name), "role")
            .await
    }

    pub async fn update_role(&self, id: i64, name: &str) -> Result<Role, ApiError> {
        let role = Role {
            id: Some(id),
            name: name.to_string(),
        };
        self.send_json(AuthRequest::put(format!("/admin/roles/{}", id)), &role, "role")
            .await
    }

    pub async fn delete_role(&self, id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!("/admin/roles/{}", id)))
            .await
    }

    // ===== Admin: system users =====

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.fetch(AuthRequest::get("/admin/users"), "user list").await
    }

    /// Users and the assignable roles, fetched concurrently.
    pub async fn users_with_roles(&self) -> Result<(Vec<User>, Vec<Role>), ApiError> {
        futures::try_join!(self.users(), self.roles())
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.send_json(AuthRequest::post("/admin/users"), user, "user")
            .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!("/admin/users/{}", id)))
            .await
    }

    /// Revoke one role from a user.
    pub async fn remove_user_role(&self, user_id: i64, role_id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!(
            "/admin/users/{}/roles/{}",
            user_id, role_id
        )))
        .await
    }

    // ===== Admin: shopping logs =====

    pub async fn shopping_logs(&self) -> Result<Vec<ShoppingLog>, ApiError> {
        self.fetch(AuthRequest::get("/admin/shopping-logs"), "shopping log list")
            .await
    }

    pub async fn create_shopping_log(&self, log: &ShoppingLog) -> Result<ShoppingLog, ApiError> {
        self.send_json(AuthRequest::post("/admin/shopping-logs/"), log, "shopping log")
            .await
    }

    pub async fn update_shopping_log(
        &self,
        id: i64,
        log: &ShoppingLog,
    ) -> Result<ShoppingLog, ApiError> {
        self.send_json(
            AuthRequest::put(format!("/admin/shopping-logs/{}", id)),
            log,
            "shopping log",
        )
        .await
    }

    pub async fn delete_shopping_log(&self, id: i64) -> Result<(), ApiError> {
        self.execute(AuthRequest::delete(format!("/admin/shopping-logs/{}", id)))
            .await
    }
}
