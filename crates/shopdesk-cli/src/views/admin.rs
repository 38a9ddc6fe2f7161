//! Admin screens.

use std::fmt::Write;

use shopdesk_core::models::{Member, Order, Page, Product, Role, ShoppingLog, User};
use shopdesk_core::utils::{format_date, format_optional, format_price, truncate_string};
use shopdesk_core::{AdminSection, Route};

use super::{heading, pager};

fn id_or_dash(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn home() -> String {
    let mut out = heading(Route::AdminHome.title());
    for section in AdminSection::ALL {
        let route = Route::Admin(section);
        let _ = writeln!(out, "  {:<20} {}", section.title(), route);
    }
    out
}

pub fn members(page: &Page<Member>) -> String {
    let mut out = heading(AdminSection::Members.title());
    if page.is_empty() {
        out.push_str("No members.\n");
        return out;
    }

    let _ = writeln!(out, "{:>5}  {:<16} {:<28} {}", "ID", "Username", "Email", "Address");
    for member in &page.content {
        let _ = writeln!(
            out,
            "{:>5}  {:<16} {:<28} {}",
            id_or_dash(member.member_id),
            truncate_string(&member.username, 16),
            truncate_string(&format_optional(&member.email, "-"), 28),
            truncate_string(&format_optional(&member.address, "-"), 30)
        );
    }
    let _ = writeln!(out, "\n{}", pager(page));
    out
}

pub fn products(page: &Page<Product>) -> String {
    let mut out = heading(AdminSection::Products.title());
    if page.is_empty() {
        out.push_str("No products.\n");
        return out;
    }

    let _ = writeln!(out, "{:>5}  {:<24} {:>12} {:>6}", "ID", "Name", "Price", "Stock");
    for product in &page.content {
        let stock = product
            .stock_quantity
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>5}  {:<24} {:>12} {:>6}",
            id_or_dash(product.product_id),
            truncate_string(&product.name, 24),
            format_price(product.price),
            stock
        );
    }
    let _ = writeln!(out, "\n{}", pager(page));
    out
}

pub fn orders(page: &Page<Order>) -> String {
    let mut out = heading(AdminSection::Orders.title());
    if page.is_empty() {
        out.push_str("No orders.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>5}  {:<14} {:<16} {:<16} {:>12}  {}",
        "ID", "Number", "Date", "Customer", "Total", "Status"
    );
    for order in &page.content {
        let _ = writeln!(
            out,
            "{:>5}  {:<14} {:<16} {:<16} {:>12}  {}",
            order.id,
            format_optional(&order.order_number, "-"),
            format_date(order.order_date.as_ref()),
            truncate_string(&format_optional(&order.username, "-"), 16),
            format_price(order.total_amount),
            order.status_display()
        );
    }
    let _ = writeln!(out, "\n{}", pager(page));
    out
}

pub fn roles(roles: &[Role]) -> String {
    let mut out = heading(AdminSection::Roles.title());
    if roles.is_empty() {
        out.push_str("No roles.\n");
        return out;
    }
    for role in roles {
        let _ = writeln!(out, "{:>5}  {}", id_or_dash(role.id), role.name);
    }
    out
}

/// Users with their roles, followed by the roles available to grant.
pub fn users(users: &[User], roles: &[Role]) -> String {
    let mut out = heading(AdminSection::Users.title());
    if users.is_empty() {
        out.push_str("No users.\n");
    }
    for user in users {
        let granted = if user.roles.is_empty() {
            "-".to_string()
        } else {
            user.role_names().join(", ")
        };
        let _ = writeln!(out, "{:>5}  {:<16} {}", user.id, user.username, granted);
    }

    let available: Vec<String> = roles
        .iter()
        .map(|r| format!("{} ({})", r.name, id_or_dash(r.id)))
        .collect();
    let _ = writeln!(out, "\nAvailable roles: {}", available.join(", "));
    out
}

pub fn shopping_logs(logs: &[ShoppingLog]) -> String {
    let mut out = heading(AdminSection::ShoppingLogs.title());
    if logs.is_empty() {
        out.push_str("No shopping logs.\n");
        return out;
    }

    let _ = writeln!(out, "{:>5}  {:>7}  {:<16} {}", "ID", "Member", "Action", "Details");
    for log in logs {
        let _ = writeln!(
            out,
            "{:>5}  {:>7}  {:<16} {}",
            id_or_dash(log.id),
            id_or_dash(log.member_id),
            truncate_string(&log.action, 16),
            truncate_string(&format_optional(&log.details, ""), 40)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_lists_every_section() {
        let text = home();
        for section in AdminSection::ALL {
            assert!(text.contains(Route::Admin(section).path()));
        }
    }

    #[test]
    fn test_users_with_roles() {
        let admin = Role {
            id: Some(1),
            name: "ROLE_ADMIN".to_string(),
        };
        let text = users(
            &[
                User {
                    id: 1,
                    username: "admin".to_string(),
                    roles: vec![admin.clone()],
                },
                User {
                    id: 2,
                    username: "staff".to_string(),
                    roles: vec![],
                },
            ],
            &[admin],
        );

        assert!(text.contains(&format!("{:<16} ROLE_ADMIN", "admin")));
        assert!(text.contains(&format!("{:<16} -", "staff")));
        assert!(text.contains("Available roles: ROLE_ADMIN (1)"));
    }

    #[test]
    fn test_empty_lists() {
        assert!(roles(&[]).contains("No roles."));
        assert!(shopping_logs(&[]).contains("No shopping logs."));
    }

    #[test]
    fn test_shopping_log_row() {
        let text = shopping_logs(&[ShoppingLog {
            id: Some(4),
            member_id: Some(7),
            action: "ADD_TO_CART".to_string(),
            details: Some("productId=3".to_string()),
        }]);
        assert!(text.contains("ADD_TO_CART"));
        assert!(text.contains("productId=3"));
    }
}
