//! Storefront screens: home, login, products, member info, order history.

use std::fmt::Write;

use shopdesk_core::models::{Member, Order, Page, Product};
use shopdesk_core::utils::{format_date, format_optional, format_phone, format_price, truncate_string};
use shopdesk_core::Route;

use super::{heading, pager};

pub fn home() -> String {
    let mut out = heading("Welcome to the shop");
    out.push_str("Sign in with `login` to browse products and see your orders.\n");
    out
}

pub fn login(from: Option<Route>) -> String {
    let mut out = heading(Route::Login.title());
    match from {
        Some(route) => {
            let _ = writeln!(out, "Sign in to continue to {}.", route);
        }
        None => out.push_str("Sign in with `login`.\n"),
    }
    out
}

pub fn products(page: &Page<Product>) -> String {
    let mut out = heading(Route::Products.title());
    if page.is_empty() {
        out.push_str("No products found.\n");
        return out;
    }

    let _ = writeln!(out, "{:<24} {:>12}  {}", "Name", "Price", "Description");
    for product in &page.content {
        let stock = if product.in_stock() { "" } else { "  (sold out)" };
        let _ = writeln!(
            out,
            "{:<24} {:>12}  {}{}",
            truncate_string(&product.name, 24),
            format_price(product.price),
            truncate_string(&format_optional(&product.description, ""), 40),
            stock
        );
    }
    let _ = writeln!(out, "\n{}", pager(page));
    out
}

pub fn member_info(member: &Member) -> String {
    let mut out = heading(Route::MemberInfo.title());
    let phone = member
        .phone_number
        .as_deref()
        .map(format_phone)
        .unwrap_or_else(|| "-".to_string());

    let _ = writeln!(out, "Username: {}", member.username);
    let _ = writeln!(out, "Email:    {}", format_optional(&member.email, "-"));
    let _ = writeln!(out, "Phone:    {}", phone);
    let _ = writeln!(out, "Address:  {}", format_optional(&member.address, "-"));
    out
}

pub fn order_history(page: &Page<Order>) -> String {
    let mut out = heading(Route::OrderHistory.title());
    if page.is_empty() {
        out.push_str("No orders yet.\n");
        return out;
    }

    for order in &page.content {
        let _ = writeln!(
            out,
            "#{:<6} {}  {:>12}  {:>3} items  {}",
            order.id,
            format_date(order.order_date.as_ref()),
            format_price(order.total_amount),
            order.item_count(),
            order.status_display()
        );
        for item in &order.order_items {
            let _ = writeln!(
                out,
                "        {} x{}  {}",
                truncate_string(&item.product_name, 30),
                item.quantity,
                format_price(item.line_total())
            );
        }
    }
    let _ = writeln!(out, "\n{}", pager(page));
    out
}
