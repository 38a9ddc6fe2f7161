//! Response schemas for the shop backend.
//!
//! This module contains the data structures the storefront and admin
//! screens exchange with the server:
//!
//! - `Page<T>`: paginated list envelope
//! - `Member`: shop member (customer) account
//! - `Product`: catalog entry
//! - `Order`, `OrderItem`, `OrderStatus`: order summaries
//! - `Role`, `User`, `NewUser`, `ShoppingLog`: admin-only resources

pub mod admin;
pub mod member;
pub mod order;
pub mod page;
pub mod product;

pub use admin::{NewUser, Role, ShoppingLog, User};
pub use member::Member;
pub use order::{Order, OrderItem, OrderStatus};
pub use page::Page;
pub use product::Product;
