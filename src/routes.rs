use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{
        admin_analytics, admin_books, admin_notifications, admin_orders, auth, cart, storefront,
        ws,
    },
    state::AppState,
};

/// Largest accepted request body, cover images included
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/books", get(storefront::list_books))
        .route("/books/{id}", get(storefront::book_detail))
        .route("/filters", get(storefront::filter_options))
        .route("/cart", get(cart::view_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{book_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/cart/count", get(cart::cart_count))
        .route("/checkout", post(cart::checkout));

    // Everything registered before route_layer requires an admin token
    let admin = Router::new()
        .route("/dashboard", get(admin_analytics::dashboard))
        .route("/analytics", get(admin_analytics::analytics))
        .route(
            "/books",
            get(admin_books::list_books).post(admin_books::create_book),
        )
        .route(
            "/books/{id}",
            get(admin_books::get_book)
                .put(admin_books::update_book)
                .delete(admin_books::delete_book),
        )
        .route("/inventory", get(admin_books::inventory))
        .route("/inventory/export", get(admin_books::export_inventory))
        .route("/orders", get(admin_orders::list_orders))
        .route("/orders/{order_id}", get(admin_orders::order_detail))
        .route("/orders/{order_id}/status", post(admin_orders::update_status))
        .route("/notifications", get(admin_notifications::list_notifications))
        .route("/notifications/{id}/read", post(admin_notifications::mark_read))
        .route(
            "/api/notifications/unread-count",
            get(admin_notifications::unread_count),
        )
        .route(
            "/api/chart-data/monthly-sales",
            get(admin_analytics::monthly_sales_chart),
        )
        .route(
            "/api/chart-data/genre-sales",
            get(admin_analytics::genre_sales_chart),
        )
        .route("/ws", get(ws::ws_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin))
        .route("/login", post(auth::login));

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/", get(|| async { "Bookstore server is running." }))
        .nest("/api", api)
        .nest("/admin", admin)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
