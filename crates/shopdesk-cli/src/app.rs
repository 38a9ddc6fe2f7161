//! Application state and screen orchestration.
//!
//! `App` owns the API client, the route gate and the auth indicator. Every
//! screen goes through [`App::open`]: the gate runs first, then the data is
//! fetched, then the result is handed to the views.

use std::future::Future;

use anyhow::{Context, Result};
use shopdesk_core::api::client::DEFAULT_ORDER_SORT;
use shopdesk_core::auth::Admission;
use shopdesk_core::{
    AdminSection, ApiClient, ApiError, AuthIndicator, Config, Gateway, Navigator, Route,
    RouteGate, SessionStore,
};
use tracing::{info, warn};

use crate::views::{self, Screen};

/// What opening a route or running an admin action produced.
#[derive(Debug)]
pub enum Outcome {
    Rendered { route: Route, screen: Screen },
    /// An admin mutation succeeded.
    Done { route: Route, message: String },
    /// The gate or the server sent us to login; `from` is where to return.
    LoginRequired { from: Route },
    Failed { route: Route, error: anyhow::Error },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Rendered { .. } | Outcome::Done { .. })
    }

    pub fn render(&self) -> String {
        match self {
            Outcome::Rendered { screen, .. } => views::render(screen),
            Outcome::Done { message, .. } => format!("{}\n", message),
            Outcome::LoginRequired { from } => format!("{}\n", views::login_required(*from)),
            Outcome::Failed { route, error } => format!("{}\n", views::error(*route, error)),
        }
    }
}

fn is_auth_failure(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ApiError>()
        .map_or(false, ApiError::is_auth_failure)
}

pub struct App {
    config: Config,
    client: ApiClient,
    gate: RouteGate<SessionStore>,
    indicator: AuthIndicator,
    order_sort: String,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let session = config.session_store()?;
        let gateway = Gateway::new(
            &config.api_base_url,
            config.request_timeout(),
            session,
            Navigator::default(),
        )
        .with_context(|| format!("Invalid API base URL: {}", config.api_base_url))?;

        Ok(Self::with_client(config, ApiClient::new(gateway)))
    }

    pub fn with_client(config: Config, client: ApiClient) -> Self {
        let gate = RouteGate::new(client.session().clone(), client.navigator().clone());
        let indicator = AuthIndicator::new(client.session());
        Self {
            config,
            client,
            gate,
            indicator,
            order_sort: DEFAULT_ORDER_SORT.to_string(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn navigator(&self) -> &Navigator {
        self.client.navigator()
    }

    /// Current indicator state, after picking up any session change.
    pub fn is_authenticated(&mut self) -> bool {
        self.indicator.refresh();
        self.indicator.is_authenticated()
    }

    /// Pick up a session change. Returns true if the indicator flipped.
    pub fn refresh_indicator(&mut self) -> bool {
        self.indicator.refresh()
    }

    pub fn set_order_sort(&mut self, sort: impl Into<String>) {
        self.order_sort = sort.into();
    }

    // =========================================================================
    // Screens
    // =========================================================================

    /// Gate `route`, then fetch and return its screen.
    pub async fn open(&mut self, route: Route, page: u32) -> Outcome {
        if let Admission::Redirected { from } = self.gate.admit(route) {
            return Outcome::LoginRequired { from };
        }

        match self.load(route, page).await {
            Ok(screen) => Outcome::Rendered { route, screen },
            Err(e) if e.is_auth_failure() => {
                self.indicator.refresh();
                Outcome::LoginRequired { from: route }
            }
            Err(e) => {
                warn!(%route, error = %e, "Failed to load screen");
                Outcome::Failed {
                    route,
                    error: e.into(),
                }
            }
        }
    }

    async fn load(&self, route: Route, page: u32) -> Result<Screen, ApiError> {
        let api = &self.client;
        let screen = match route {
            Route::Home => Screen::Home,
            Route::Login => Screen::Login {
                from: self.navigator().current().from,
            },
            Route::Products => Screen::Products(api.products(page).await?),
            Route::MemberInfo => Screen::MemberInfo(api.member_info().await?),
            Route::OrderHistory => Screen::OrderHistory(api.order_history(page).await?),
            Route::AdminHome => Screen::AdminHome,
            Route::Admin(AdminSection::Members) => Screen::Members(api.members(page).await?),
            Route::Admin(AdminSection::Products) => {
                Screen::AdminProducts(api.admin_products(page).await?)
            }
            Route::Admin(AdminSection::Orders) => {
                Screen::Orders(api.orders(page, &self.order_sort).await?)
            }
            Route::Admin(AdminSection::ShoppingLogs) => {
                Screen::ShoppingLogs(api.shopping_logs().await?)
            }
            Route::Admin(AdminSection::Users) => {
                let (users, roles) = api.users_with_roles().await?;
                Screen::Users { users, roles }
            }
            Route::Admin(AdminSection::Roles) => Screen::Roles(api.roles().await?),
        };
        Ok(screen)
    }

    /// Gate the admin section, then run `action` against the API.
    pub async fn mutate<F, Fut>(&mut self, section: AdminSection, action: F) -> Outcome
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let route = Route::Admin(section);
        if let Admission::Redirected { from } = self.gate.admit(route) {
            return Outcome::LoginRequired { from };
        }

        match action(self.client.clone()).await {
            Ok(message) => {
                info!(%route, "{}", message);
                Outcome::Done { route, message }
            }
            Err(e) if is_auth_failure(&e) => {
                self.indicator.refresh();
                Outcome::LoginRequired { from: route }
            }
            Err(error) => {
                warn!(%route, error = %error, "Admin action failed");
                Outcome::Failed { route, error }
            }
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Move to the login entry point. `return_to` overrides any destination
    /// already recorded by a redirect.
    pub fn begin_login(&self, return_to: Option<Route>) {
        let navigator = self.navigator();
        match return_to {
            Some(route) => navigator.redirect_to_login(Some(route)),
            None if navigator.route() != Route::LOGIN => navigator.navigate(Route::LOGIN),
            None => {}
        }
    }

    /// Log in and return the destination recorded at login time.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Route, ApiError> {
        self.client.login(username, password).await?;
        self.indicator.refresh();
        Ok(self.navigator().return_destination())
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        self.client.logout().await?;
        self.indicator.refresh();
        Ok(())
    }

    pub fn last_username(&self) -> Option<&str> {
        self.config.last_username.as_deref()
    }

    /// Store the username as the login default for next time.
    pub fn remember_username(&mut self, username: &str) {
        if self.config.last_username.as_deref() == Some(username) {
            return;
        }
        self.config.last_username = Some(username.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer) -> App {
        let config = Config {
            api_base_url: server.uri(),
            persist_session: false,
            ..Default::default()
        };
        App::new(config).unwrap()
    }

    fn empty_page() -> serde_json::Value {
        json!({ "content": [], "totalPages": 0, "number": 0 })
    }

    #[tokio::test]
    async fn test_protected_route_without_session_redirects_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut app = app(&server);
        let outcome = app.open(Route::MemberInfo, 0).await;

        assert!(matches!(
            outcome,
            Outcome::LoginRequired {
                from: Route::MemberInfo
            }
        ));
        assert_eq!(app.navigator().route(), Route::Login);
        assert_eq!(app.navigator().return_destination(), Route::MemberInfo);
    }

    #[tokio::test]
    async fn test_products_without_session_redirects_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .expect(0)
            .mount(&server)
            .await;

        let mut app = app(&server);
        let outcome = app.open(Route::Products, 0).await;

        // The gate admits products, but the list is fetched with the session
        assert!(matches!(
            outcome,
            Outcome::LoginRequired {
                from: Route::Products
            }
        ));
        assert_eq!(app.navigator().route(), Route::Login);
        assert_eq!(app.navigator().return_destination(), Route::Products);
    }

    #[tokio::test]
    async fn test_products_render_when_signed_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("page", "0"))
            .and(header_is("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .expect(1)
            .mount(&server)
            .await;

        let mut app = app(&server);
        app.client().session().set("abc123");
        let outcome = app.open(Route::Products, 0).await;

        assert!(outcome.is_ok());
        assert!(outcome.render().contains("No products found."));
        assert_eq!(app.navigator().route(), Route::Products);
    }

    #[tokio::test]
    async fn test_home_renders_without_session() {
        let server = MockServer::start().await;
        let mut app = app(&server);

        let outcome = app.open(Route::Home, 0).await;
        assert!(outcome.is_ok());
        assert!(outcome.render().contains("Sign in with `login`"));
    }

    #[tokio::test]
    async fn test_login_returns_to_recorded_destination() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Bearer abc123"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/orders"))
            .and(header_is("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .expect(1)
            .mount(&server)
            .await;

        let mut app = app(&server);
        assert!(!app.is_authenticated());

        let outcome = app.open(Route::OrderHistory, 0).await;
        assert!(!outcome.is_ok());

        app.begin_login(None);
        let destination = app.login("user", "qwaszx").await.unwrap();
        assert_eq!(destination, Route::OrderHistory);
        assert!(app.is_authenticated());

        let outcome = app.open(destination, 0).await;
        assert!(outcome.render().contains("No orders yet."));
    }

    #[tokio::test]
    async fn test_explicit_return_to_wins() {
        let server = MockServer::start().await;
        let app = app(&server);

        app.navigator().redirect_to_login(Some(Route::MemberInfo));
        app.begin_login(Some(Route::Admin(AdminSection::Roles)));

        assert_eq!(
            app.navigator().return_destination(),
            Route::Admin(AdminSection::Roles)
        );
    }

    #[tokio::test]
    async fn test_unauthorized_response_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/member"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut app = app(&server);
        app.client().session().set("expired");
        assert!(app.is_authenticated());

        let outcome = app.open(Route::MemberInfo, 0).await;

        assert!(matches!(
            outcome,
            Outcome::LoginRequired {
                from: Route::MemberInfo
            }
        ));
        assert!(!app.is_authenticated());
        assert_eq!(app.navigator().route(), Route::Login);
    }

    #[tokio::test]
    async fn test_server_error_is_shown_inline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/roles"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "DB error" })),
            )
            .mount(&server)
            .await;

        let mut app = app(&server);
        app.client().session().set("abc123");

        let outcome = app.open(Route::Admin(AdminSection::Roles), 0).await;
        assert_eq!(
            outcome.render(),
            "Error loading Role Management: DB error\n"
        );
        assert!(app.is_authenticated());
    }

    #[tokio::test]
    async fn test_mutation_gated() {
        let server = MockServer::start().await;
        let mut app = app(&server);

        let outcome = app
            .mutate(AdminSection::Roles, |api| async move {
                api.delete_role(1).await?;
                Ok("deleted".to_string())
            })
            .await;

        assert!(matches!(
            outcome,
            Outcome::LoginRequired {
                from: Route::Admin(AdminSection::Roles)
            }
        ));
    }

    #[tokio::test]
    async fn test_mutation_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/orders/5"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut app = app(&server);
        app.client().session().set("abc123");

        let outcome = app
            .mutate(AdminSection::Orders, |api| async move {
                api.delete_order(5).await?;
                Ok("Order 5 deleted".to_string())
            })
            .await;

        assert_eq!(outcome.render(), "Order 5 deleted\n");
    }

    #[tokio::test]
    async fn test_admin_orders_use_configured_sort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/orders"))
            .and(query_param("sort", "totalAmount,asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .expect(1)
            .mount(&server)
            .await;

        let mut app = app(&server);
        app.client().session().set("abc123");
        app.set_order_sort("totalAmount,asc");

        let outcome = app.open(Route::Admin(AdminSection::Orders), 0).await;
        assert!(outcome.is_ok());
    }
}
