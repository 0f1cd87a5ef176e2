use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    db::{
        DbPool, admin_store::AdminStore, analytics_store::AnalyticsStore, book_store::BookStore,
        notification_store::NotificationStore, order_store::OrderStore,
    },
    services::{AuthService, CatalogService, CheckoutService, Notifier, uploads::ImageStore},
    sessions::{CartSessions, DEFAULT_MAX_SESSIONS},
    ws::{ConnectionManager, SharedConnectionManager},
};

/// Everything a request handler may need. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub books: BookStore,
    pub orders: OrderStore,
    pub analytics: AnalyticsStore,
    pub notifier: Notifier,
    pub catalog: CatalogService,
    pub checkout: CheckoutService,
    pub auth: AuthService,
    pub carts: Arc<CartSessions>,
    pub connections: SharedConnectionManager,
}

impl AppState {
    pub fn new(config: Config, pool: DbPool) -> Self {
        let connections = Arc::new(ConnectionManager::new());
        let notifier = Notifier::new(NotificationStore::new(pool.clone()), connections.clone());
        let books = BookStore::new(pool.clone());
        let images = ImageStore::new(&config.upload_dir);

        Self {
            catalog: CatalogService::new(books.clone(), images, notifier.clone()),
            checkout: CheckoutService::new(pool.clone(), notifier.clone()),
            auth: AuthService::new(
                AdminStore::new(pool.clone()),
                &config.jwt_secret,
                config.jwt_expiration_hours,
            ),
            orders: OrderStore::new(pool.clone()),
            analytics: AnalyticsStore::new(pool),
            books,
            notifier,
            carts: Arc::new(CartSessions::with_limits(
                Duration::from_secs(config.cart_session_idle_minutes.saturating_mul(60)),
                DEFAULT_MAX_SESSIONS,
            )),
            connections,
            config: Arc::new(config),
        }
    }
}
