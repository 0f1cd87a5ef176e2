pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod export_service;
pub mod notifier;
pub mod uploads;

pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use checkout_service::CheckoutService;
pub use notifier::{NotificationSink, Notifier};
