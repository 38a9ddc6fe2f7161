//! Plain-text rendering of every screen.
//!
//! Views never fetch anything themselves; `App::open` resolves the gate and
//! the data, then hands a [`Screen`] here.

pub mod admin;
pub mod storefront;

use std::fmt;

use shopdesk_core::models::{Member, Order, Page, Product, Role, ShoppingLog, User};
use shopdesk_core::Route;

/// Fully loaded content for one route.
#[derive(Debug, Clone)]
pub enum Screen {
    Home,
    Login { from: Option<Route> },
    Products(Page<Product>),
    MemberInfo(Member),
    OrderHistory(Page<Order>),
    AdminHome,
    Members(Page<Member>),
    AdminProducts(Page<Product>),
    Orders(Page<Order>),
    ShoppingLogs(Vec<ShoppingLog>),
    Users { users: Vec<User>, roles: Vec<Role> },
    Roles(Vec<Role>),
}

impl Screen {
    /// Current page index and whether a next page exists, for paged lists.
    pub fn page_position(&self) -> Option<(u32, bool)> {
        fn position<T>(page: &Page<T>) -> Option<(u32, bool)> {
            Some((page.number, page.has_next()))
        }

        match self {
            Screen::Products(page) | Screen::AdminProducts(page) => position(page),
            Screen::OrderHistory(page) | Screen::Orders(page) => position(page),
            Screen::Members(page) => position(page),
            _ => None,
        }
    }
}

pub fn render(screen: &Screen) -> String {
    match screen {
        Screen::Home => storefront::home(),
        Screen::Login { from } => storefront::login(*from),
        Screen::Products(page) => storefront::products(page),
        Screen::MemberInfo(member) => storefront::member_info(member),
        Screen::OrderHistory(page) => storefront::order_history(page),
        Screen::AdminHome => admin::home(),
        Screen::Members(page) => admin::members(page),
        Screen::AdminProducts(page) => admin::products(page),
        Screen::Orders(page) => admin::orders(page),
        Screen::ShoppingLogs(logs) => admin::shopping_logs(logs),
        Screen::Users { users, roles } => admin::users(users, roles),
        Screen::Roles(roles) => admin::roles(roles),
    }
}

pub fn login_required(from: Route) -> String {
    format!(
        "Login required: sign in to continue to {} ({})",
        from.title(),
        from
    )
}

pub fn error(route: Route, error: &dyn fmt::Display) -> String {
    format!("Error loading {}: {}", route.title(), error)
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.chars().count()))
}

fn pager<T>(page: &Page<T>) -> String {
    let mut line = page.label();
    if page.number > 0 {
        line.push_str("  [prev]");
    }
    if page.has_next() {
        line.push_str("  [next]");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<T>(content: Vec<T>, number: u32, total_pages: u32) -> Page<T> {
        Page {
            content,
            total_pages,
            number,
            total_elements: None,
            size: None,
        }
    }

    #[test]
    fn test_heading_underline_matches_title() {
        assert_eq!(heading("Roles"), "Roles\n=====\n");
    }

    #[test]
    fn test_pager_hints() {
        assert_eq!(pager(&page(vec![1], 0, 1)), "Page 1 of 1");
        assert_eq!(pager(&page(vec![1], 0, 3)), "Page 1 of 3  [next]");
        assert_eq!(pager(&page(vec![1], 2, 3)), "Page 3 of 3  [prev]");
    }

    #[test]
    fn test_login_required_names_destination() {
        let text = login_required(Route::MemberInfo);
        assert!(text.contains("/pages/member-info"));
    }

    #[test]
    fn test_page_position() {
        let products: Page<Product> = page(vec![], 1, 3);
        assert_eq!(Screen::Products(products).page_position(), Some((1, true)));

        let orders: Page<Order> = page(vec![], 2, 3);
        assert_eq!(Screen::Orders(orders).page_position(), Some((2, false)));

        assert_eq!(Screen::Roles(vec![]).page_position(), None);
        assert_eq!(Screen::Home.page_position(), None);
    }
}
