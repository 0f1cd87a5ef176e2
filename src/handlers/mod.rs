pub mod admin_analytics;
pub mod admin_books;
pub mod admin_notifications;
pub mod admin_orders;
pub mod auth;
pub mod cart;
pub mod storefront;
pub mod ws;
