//! Routes and the navigator.
//!
//! The navigator is the single place that knows where the user is. Login
//! redirects from the route gate and the gateway both act on it, and the
//! login screen reads the carried destination back from it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown route: {0}")]
pub struct UnknownRoute(pub String);

/// Admin screens under `/pages/admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminSection {
    Members,
    Products,
    Orders,
    ShoppingLogs,
    Users,
    Roles,
}

impl AdminSection {
    pub const ALL: [AdminSection; 6] = [
        AdminSection::Members,
        AdminSection::Products,
        AdminSection::Orders,
        AdminSection::ShoppingLogs,
        AdminSection::Users,
        AdminSection::Roles,
    ];

    /// Path segment below `/pages/admin/`.
    pub fn segment(&self) -> &'static str {
        match self {
            AdminSection::Members => "members",
            AdminSection::Products => "products",
            AdminSection::Orders => "orders",
            AdminSection::ShoppingLogs => "shopping-logs",
            AdminSection::Users => "users",
            AdminSection::Roles => "roles",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AdminSection::Members => "Member Management",
            AdminSection::Products => "Product Management",
            AdminSection::Orders => "Order Management",
            AdminSection::ShoppingLogs => "Shopping Logs",
            AdminSection::Users => "System Users",
            AdminSection::Roles => "Role Management",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.segment() == segment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Products,
    Login,
    MemberInfo,
    OrderHistory,
    AdminHome,
    Admin(AdminSection),
}

impl Route {
    /// The login entry point.
    pub const LOGIN: Route = Route::Login;

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Products => "/pages/products",
            Route::Login => "/pages/login",
            Route::MemberInfo => "/pages/member-info",
            Route::OrderHistory => "/pages/order-history",
            Route::AdminHome => "/pages/admin",
            Route::Admin(AdminSection::Members) => "/pages/admin/members",
            Route::Admin(AdminSection::Products) => "/pages/admin/products",
            Route::Admin(AdminSection::Orders) => "/pages/admin/orders",
            Route::Admin(AdminSection::ShoppingLogs) => "/pages/admin/shopping-logs",
            Route::Admin(AdminSection::Users) => "/pages/admin/users",
            Route::Admin(AdminSection::Roles) => "/pages/admin/roles",
        }
    }

    /// Whether the route must pass the authorization gate before rendering.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::MemberInfo | Route::OrderHistory | Route::AdminHome | Route::Admin(_)
        )
    }

    /// Whether the page needs a session to show anything. Products are not
    /// gated but their list is fetched through the authenticated gateway.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Route::Home | Route::Login)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Main",
            Route::Products => "Products",
            Route::Login => "Login",
            Route::MemberInfo => "Member Info",
            Route::OrderHistory => "Order History",
            Route::AdminHome => "Admin",
            Route::Admin(section) => section.title(),
        }
    }

    /// Every route, in navigation-bar order.
    pub fn all() -> impl Iterator<Item = Route> {
        [
            Route::Home,
            Route::Products,
            Route::MemberInfo,
            Route::OrderHistory,
            Route::AdminHome,
            Route::Login,
        ]
        .into_iter()
        .chain(AdminSection::ALL.into_iter().map(Route::Admin))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        let route = match path {
            "/" => Route::Home,
            "/pages/products" => Route::Products,
            "/pages/login" => Route::Login,
            "/pages/member-info" => Route::MemberInfo,
            "/pages/order-history" => Route::OrderHistory,
            "/pages/admin" => Route::AdminHome,
            other => other
                .strip_prefix("/pages/admin/")
                .and_then(AdminSection::from_segment)
                .map(Route::Admin)
                .ok_or_else(|| UnknownRoute(s.to_string()))?,
        };
        Ok(route)
    }
}

/// Where the user is, plus where they were headed when sent to login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub from: Option<Route>,
}

impl Location {
    fn at(route: Route) -> Self {
        Self { route, from: None }
    }
}

/// Shared handle to the current location. Clones observe the same location.
#[derive(Debug, Clone)]
pub struct Navigator {
    location: Arc<watch::Sender<Location>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        let (tx, _) = watch::channel(Location::at(start));
        Self {
            location: Arc::new(tx),
        }
    }

    pub fn current(&self) -> Location {
        *self.location.borrow()
    }

    pub fn route(&self) -> Route {
        self.location.borrow().route
    }

    pub fn navigate(&self, route: Route) {
        debug!(%route, "Navigating");
        self.location.send_replace(Location::at(route));
    }

    /// Replace the current location with the login entry point, carrying
    /// `from` so a successful login can return there.
    pub fn redirect_to_login(&self, from: Option<Route>) {
        let from = from.filter(|r| *r != Route::LOGIN);
        debug!(from = ?from.map(|r| r.path()), "Redirecting to login");
        self.location.send_replace(Location {
            route: Route::LOGIN,
            from,
        });
    }

    /// Redirect to login, remembering the current route as the destination.
    pub fn redirect_to_login_from_current(&self) {
        let current = self.current();
        // A second redirect while already on login keeps the first destination
        let from = if current.route == Route::LOGIN {
            current.from
        } else {
            Some(current.route)
        };
        self.redirect_to_login(from);
    }

    /// Where to go after a successful login.
    pub fn return_destination(&self) -> Route {
        self.location.borrow().from.unwrap_or(Route::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths_round_trip() {
        for route in Route::all() {
            assert_eq!(route.path().parse::<Route>(), Ok(route), "{}", route);
        }
        assert_eq!(Route::all().count(), 12);
    }

    #[test]
    fn test_route_parse_tolerates_trailing_slash_and_query() {
        assert_eq!("/pages/admin/".parse::<Route>(), Ok(Route::AdminHome));
        assert_eq!(
            "/pages/admin/orders?page=2".parse::<Route>(),
            Ok(Route::Admin(AdminSection::Orders))
        );
        assert_eq!("".parse::<Route>(), Ok(Route::Home));
    }

    #[test]
    fn test_route_parse_unknown() {
        assert_eq!(
            "/pages/admin/unknown".parse::<Route>(),
            Err(UnknownRoute("/pages/admin/unknown".to_string()))
        );
        assert!("/cart".parse::<Route>().is_err());
    }

    #[test]
    fn test_protected_routes() {
        assert!(!Route::Home.is_protected());
        assert!(!Route::Products.is_protected());
        assert!(!Route::Login.is_protected());
        assert!(Route::MemberInfo.is_protected());
        assert!(Route::OrderHistory.is_protected());
        assert!(Route::AdminHome.is_protected());
        for section in AdminSection::ALL {
            assert!(Route::Admin(section).is_protected());
        }
    }

    #[test]
    fn test_routes_needing_session() {
        assert!(!Route::Home.needs_session());
        assert!(!Route::Login.needs_session());
        // Ungated, but loaded through the gateway
        assert!(!Route::Products.is_protected());
        assert!(Route::Products.needs_session());
        for route in Route::all().filter(Route::is_protected) {
            assert!(route.needs_session(), "{}", route);
        }
    }

    #[test]
    fn test_redirect_preserves_destination() {
        let nav = Navigator::default();
        nav.navigate(Route::OrderHistory);
        nav.redirect_to_login_from_current();

        assert_eq!(nav.route(), Route::Login);
        assert_eq!(nav.current().from, Some(Route::OrderHistory));
        assert_eq!(nav.return_destination(), Route::OrderHistory);

        // Redirecting again from login keeps the first destination
        nav.redirect_to_login_from_current();
        assert_eq!(nav.return_destination(), Route::OrderHistory);
    }

    #[test]
    fn test_return_destination_defaults_home() {
        let nav = Navigator::new(Route::Login);
        assert_eq!(nav.return_destination(), Route::Home);

        nav.redirect_to_login(Some(Route::Login));
        assert_eq!(nav.current().from, None);
    }

    #[test]
    fn test_navigate_clears_destination() {
        let nav = Navigator::default();
        nav.redirect_to_login(Some(Route::MemberInfo));
        nav.navigate(Route::MemberInfo);
        assert_eq!(nav.current(), Location { route: Route::MemberInfo, from: None });
    }
}
