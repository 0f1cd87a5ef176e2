use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use futures::future::join_all;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    AppState, app,
    config::Config,
    db::{
        DbPool, analytics_store::AnalyticsStore, book_store::BookStore, init_db_pool,
        notification_store::NotificationStore, order_store::OrderStore, seed_defaults,
    },
    error::AppError,
    models::{
        book::{Book, BookFilter, BookForm, BookInput, Visibility},
        cart::Cart,
        notification::{NewNotification, Notification},
        order::{CustomerDetails, OrderStatus},
    },
    services::{
        CatalogService, CheckoutService, Notifier, cart_service, export_service,
        notifier::NoopSink,
        uploads::{ImageStore, UploadedImage},
    },
    sessions::CART_SESSION_HEADER,
    ws::ConnectionManager,
};

// Helper function to setup a test database in a fresh file
async fn setup_test_db() -> (PathBuf, DbPool) {
    let path = std::env::temp_dir().join(format!("bookstore_test_{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let pool = init_db_pool(&url, 5)
        .await
        .expect("Failed to initialize database");
    (path, pool)
}

// Helper function to clean up test database
async fn teardown_test_db(path: PathBuf, pool: DbPool) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let file = PathBuf::from(format!("{}{}", path.display(), suffix));
        let _ = std::fs::remove_file(file);
    }
}

fn notifier(pool: &DbPool) -> Notifier {
    Notifier::new(NotificationStore::new(pool.clone()), Arc::new(NoopSink))
}

fn customer() -> CustomerDetails {
    CustomerDetails {
        customer_name: "Ada Lovelace".into(),
        customer_email: "ada@example.com".into(),
        ..Default::default()
    }
}

async fn create_test_book(pool: &DbPool, title: &str, price_cents: i64, stock: i64) -> Book {
    let input = BookInput {
        title: title.into(),
        author: "Test Author".into(),
        description: None,
        price_cents,
        stock,
        genre: Some("Fiction".into()),
        stock_threshold: 5,
    };
    BookStore::new(pool.clone())
        .create(&input, None)
        .await
        .expect("Failed to create book")
}

async fn create_genre_book(pool: &DbPool, title: &str, genre: &str, price_cents: i64, stock: i64) -> Book {
    let input = BookInput {
        title: title.into(),
        author: "Genre Author".into(),
        description: None,
        price_cents,
        stock,
        genre: Some(genre.into()),
        stock_threshold: 5,
    };
    BookStore::new(pool.clone())
        .create(&input, None)
        .await
        .expect("Failed to create book")
}

fn book_form(title: &str, price: &str, stock: &str) -> BookForm {
    BookForm {
        title: title.into(),
        author: "Form Author".into(),
        price: price.into(),
        stock: stock.into(),
        ..Default::default()
    }
}

fn image(file_name: &str) -> UploadedImage {
    UploadedImage {
        file_name: file_name.into(),
        data: vec![0x89, 0x50, 0x4e, 0x47],
    }
}

async fn notifications_of_kind(pool: &DbPool, kind: &str) -> Vec<Notification> {
    NotificationStore::new(pool.clone())
        .recent(1000)
        .await
        .expect("Failed to list notifications")
        .into_iter()
        .filter(|n| n.kind == kind)
        .collect()
}

fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        server_host: "127.0.0.1".into(),
        server_port: 0,
        database_url: String::new(),
        max_pool_size: 5,
        upload_dir: upload_dir.display().to_string(),
        jwt_secret: "test-secret".into(),
        jwt_expiration_hours: 1,
        admin_password: "hunter2".into(),
        seed_sample_data: false,
        cart_session_idle_minutes: 120,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

#[tokio::test]
async fn test_checkout_total_matches_items() {
    let (path, pool) = setup_test_db().await;
    let dune = create_test_book(&pool, "Dune", 1999, 10).await;
    let emma = create_test_book(&pool, "Emma", 850, 10).await;

    let mut cart = Cart::new();
    cart.add(dune.id, 2).unwrap();
    cart.add(emma.id, 3).unwrap();

    let service = CheckoutService::new(pool.clone(), notifier(&pool));
    let detail = service.checkout(&mut cart, &customer()).await.unwrap();

    let sum: i64 = detail.items.iter().map(|i| i.line_total_cents()).sum();
    assert_eq!(detail.order.total_cents, sum);
    assert_eq!(detail.order.total_cents, 2 * 1999 + 3 * 850);
    assert_eq!(detail.order.status, "pending");
    assert!(cart.is_empty());

    let stored = OrderStore::new(pool.clone())
        .find(&detail.order.order_id)
        .await
        .unwrap();
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.order.total_cents, sum);

    let books = BookStore::new(pool.clone());
    assert_eq!(books.find(dune.id).await.unwrap().stock, 8);
    assert_eq!(books.find(emma.id).await.unwrap().stock, 7);

    assert_eq!(notifications_of_kind(&pool, "new_order").await.len(), 1);

    let daily = AnalyticsStore::new(pool.clone()).daily_sales(30).await.unwrap();
    assert_eq!(daily.iter().map(|d| d.quantity_sold).sum::<i64>(), 5);

    teardown_test_db(path, pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_copy_goes_to_exactly_one_buyer() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Last Copy", 1500, 1).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let book_id = book.id;
    let buy = move |service: CheckoutService| async move {
        let mut cart = Cart::new();
        cart.add(book_id, 1).unwrap();
        service.checkout(&mut cart, &customer()).await
    };

    let (a, b) = tokio::join!(
        tokio::spawn(buy(service.clone())),
        tokio::spawn(buy(service.clone()))
    );
    let results = [a.unwrap(), b.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(AppError::InsufficientStock { available: 0, .. })
    )));

    let stock = BookStore::new(pool.clone()).find(book.id).await.unwrap().stock;
    assert_eq!(stock, 0);
    assert_eq!(OrderStore::new(pool.clone()).list(None).await.unwrap().len(), 1);

    teardown_test_db(path, pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_never_oversell() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Popular", 1000, 3).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let handles = (0..10).map(|_| {
        let service = service.clone();
        let book_id = book.id;
        tokio::spawn(async move {
            let mut cart = Cart::new();
            cart.add(book_id, 1).unwrap();
            service.checkout(&mut cart, &customer()).await.is_ok()
        })
    });

    let successes = join_all(handles)
        .await
        .into_iter()
        .filter(|result| *result.as_ref().unwrap())
        .count();

    assert_eq!(successes, 3);
    let stock = BookStore::new(pool.clone()).find(book.id).await.unwrap().stock;
    assert_eq!(stock, 0);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_failed_checkout_changes_nothing() {
    let (path, pool) = setup_test_db().await;
    let plenty = create_test_book(&pool, "Plenty", 1000, 5).await;
    let scarce = create_test_book(&pool, "Scarce", 1000, 1).await;

    let mut cart = Cart::new();
    cart.add(plenty.id, 2).unwrap();
    cart.add(scarce.id, 2).unwrap();

    let service = CheckoutService::new(pool.clone(), notifier(&pool));
    let err = service.checkout(&mut cart, &customer()).await.unwrap_err();
    match err {
        AppError::InsufficientStock { title, available } => {
            assert_eq!(title, "Scarce");
            assert_eq!(available, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let books = BookStore::new(pool.clone());
    assert_eq!(books.find(plenty.id).await.unwrap().stock, 5);
    assert_eq!(books.find(scarce.id).await.unwrap().stock, 1);
    assert!(OrderStore::new(pool.clone()).list(None).await.unwrap().is_empty());
    assert!(notifications_of_kind(&pool, "new_order").await.is_empty());
    assert_eq!(cart.len(), 2);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_and_bad_customer() {
    let (path, pool) = setup_test_db().await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let mut cart = Cart::new();
    assert!(matches!(
        service.checkout(&mut cart, &customer()).await,
        Err(AppError::Validation(_))
    ));

    let book = create_test_book(&pool, "Dune", 1999, 3).await;
    cart.add(book.id, 1).unwrap();
    let nameless = CustomerDetails {
        customer_name: "  ".into(),
        ..customer()
    };
    assert!(matches!(
        service.checkout(&mut cart, &nameless).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(BookStore::new(pool.clone()).find(book.id).await.unwrap().stock, 3);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_low_stock_emitted_once_on_crossing() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Threshold", 1000, 6).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let mut cart = Cart::new();
    cart.add(book.id, 2).unwrap();
    service.checkout(&mut cart, &customer()).await.unwrap();

    let alerts = notifications_of_kind(&pool, "low_stock").await;
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains("Threshold"));
    assert!(alerts[0].message.contains('4'));

    cart.add(book.id, 1).unwrap();
    service.checkout(&mut cart, &customer()).await.unwrap();
    assert_eq!(notifications_of_kind(&pool, "low_stock").await.len(), 1);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let (path, pool) = setup_test_db().await;
    let store = NotificationStore::new(pool.clone());

    let saved = store
        .append(&NewNotification::book_deleted("Old Book"))
        .await
        .unwrap();
    assert_eq!(store.unread_count().await.unwrap(), 1);

    store.mark_read(saved.id).await.unwrap();
    store.mark_read(saved.id).await.unwrap();
    assert_eq!(store.unread_count().await.unwrap(), 0);

    let recent = store.recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert!(recent[0].is_read);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_catalog_create_then_find() {
    let (path, pool) = setup_test_db().await;
    let books = BookStore::new(pool.clone());
    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let catalog = CatalogService::new(books.clone(), ImageStore::new(&uploads), notifier(&pool));

    let form = BookForm {
        title: "The Hobbit".into(),
        author: "J.R.R. Tolkien".into(),
        description: Some("There and back again.".into()),
        price: "12.50".into(),
        stock: "7".into(),
        genre: Some("Fantasy".into()),
        stock_threshold: None,
    };
    let created = catalog.create(&form, None).await.unwrap();
    let found = books.find(created.id).await.unwrap();

    assert_eq!(found.title, "The Hobbit");
    assert_eq!(found.price_cents, 1250);
    assert_eq!(found.stock, 7);
    assert_eq!(found.stock_threshold, 5);
    assert_eq!(found.genre.as_deref(), Some("Fantasy"));
    assert_eq!(notifications_of_kind(&pool, "book_added").await.len(), 1);

    let deleted = catalog.delete(created.id).await.unwrap();
    assert_eq!(deleted.id, created.id);
    assert!(matches!(books.find(created.id).await, Err(AppError::NotFound(_))));
    assert_eq!(notifications_of_kind(&pool, "book_deleted").await.len(), 1);

    let _ = std::fs::remove_dir_all(uploads);
    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_nan_price_creates_nothing() {
    let (path, pool) = setup_test_db().await;
    let books = BookStore::new(pool.clone());
    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let catalog = CatalogService::new(books.clone(), ImageStore::new(&uploads), notifier(&pool));

    let form = BookForm {
        title: "Broken".into(),
        author: "Nobody".into(),
        price: "nan".into(),
        stock: "1".into(),
        ..Default::default()
    };
    assert!(matches!(
        catalog.create(&form, None).await,
        Err(AppError::Validation(_))
    ));
    assert!(books.list_all().await.unwrap().is_empty());
    assert!(notifications_of_kind(&pool, "book_added").await.is_empty());

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_deleting_a_book_keeps_order_history() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Ephemeral", 1200, 4).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let mut cart = Cart::new();
    cart.add(book.id, 1).unwrap();
    let detail = service.checkout(&mut cart, &customer()).await.unwrap();

    BookStore::new(pool.clone()).delete(book.id).await.unwrap();

    let stored = OrderStore::new(pool.clone())
        .find(&detail.order.order_id)
        .await
        .unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].book_id, None);
    assert_eq!(stored.items[0].title, "Ephemeral");
    assert_eq!(stored.order.total_cents, 1200);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_storefront_hides_sold_out_books() {
    let (path, pool) = setup_test_db().await;
    create_test_book(&pool, "Available", 1000, 3).await;
    create_test_book(&pool, "Sold Out", 1000, 0).await;
    let books = BookStore::new(pool.clone());

    let storefront = books
        .search(&BookFilter::default(), Visibility::Storefront)
        .await
        .unwrap();
    assert_eq!(storefront.len(), 1);
    assert_eq!(storefront[0].title, "Available");

    let admin = books
        .search(&BookFilter::default(), Visibility::Admin)
        .await
        .unwrap();
    assert_eq!(admin.len(), 2);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_cart_is_clamped_to_stock() {
    let (path, pool) = setup_test_db().await;
    let limited = create_test_book(&pool, "Limited", 1000, 2).await;
    let gone = create_test_book(&pool, "Gone", 1000, 0).await;

    let mut cart = Cart::new();
    cart.add(limited.id, 5).unwrap();
    cart.add(gone.id, 1).unwrap();
    cart.add(9999, 1).unwrap();

    let view = cart_service::materialize(&mut cart, &BookStore::new(pool.clone()))
        .await
        .unwrap();

    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
    assert_eq!(view.total_cents, 2000);
    assert_eq!(view.warnings.len(), 3);
    assert_eq!(cart.quantity(limited.id), Some(2));
    assert_eq!(cart.len(), 1);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_empty_inventory_export_is_header_only() {
    let (path, pool) = setup_test_db().await;

    let rows = AnalyticsStore::new(pool.clone())
        .inventory_snapshot()
        .await
        .unwrap();
    assert!(rows.is_empty());

    let csv = String::from_utf8(export_service::inventory_csv(&rows).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.starts_with("ID,Title,Author"));

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_inventory_snapshot_counts_sales() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Seller", 1000, 10).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let mut cart = Cart::new();
    cart.add(book.id, 3).unwrap();
    service.checkout(&mut cart, &customer()).await.unwrap();

    let rows = AnalyticsStore::new(pool.clone())
        .inventory_snapshot()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stock, 7);
    assert_eq!(rows[0].total_sold, 3);
    assert_eq!(rows[0].total_revenue_cents, 3000);

    let stats = AnalyticsStore::new(pool.clone()).dashboard_stats().await.unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.pending_orders, 1);
    assert_eq!(stats.total_revenue_cents, 3000);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let (path, pool) = setup_test_db().await;
    seed_defaults(&pool, "hunter2", false).await.unwrap();
    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let router = app(AppState::new(test_config(uploads), pool.clone()));

    let response = router
        .clone()
        .oneshot(Request::get("/admin/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(
            Request::post("/admin/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"admin","password":"wrong"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(
            Request::post("/admin/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"admin","password":"hunter2"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let token = login["token"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(
            Request::get("/admin/dashboard")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await;
    assert_eq!(dashboard["stats"]["total_books"], 0);

    let response = router
        .oneshot(
            Request::get(format!("/admin/api/notifications/unread-count?token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_cart_and_checkout_over_http() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Over The Wire", 2500, 3).await;
    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let router = app(AppState::new(test_config(uploads), pool.clone()));

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/cart/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"book_id":{},"quantity":2}}"#, book.id)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = response
        .headers()
        .get(&CART_SESSION_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(body_json(response).await["count"], 2);

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .header(&CART_SESSION_HEADER, &session)
                .body(Body::from(
                    r#"{"customer_name":"Ada","customer_email":"ada@example.com"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["order"]["total_cents"], 5000);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/cart/count")
                .header(&CART_SESSION_HEADER, &session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["count"], 0);

    // Only one copy left, so asking for two more conflicts
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/cart/items")
                .header(header::CONTENT_TYPE, "application/json")
                .header(&CART_SESSION_HEADER, &session)
                .body(Body::from(format!(r#"{{"book_id":{},"quantity":2}}"#, book.id)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::post("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .header(&CART_SESSION_HEADER, &session)
                .body(Body::from(
                    r#"{"customer_name":"Ada","customer_email":"ada@example.com"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(BookStore::new(pool.clone()).find(book.id).await.unwrap().stock, 1);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_order_status_update_notifies() {
    let (path, pool) = setup_test_db().await;
    seed_defaults(&pool, "hunter2", false).await.unwrap();
    let book = create_test_book(&pool, "Status", 1000, 3).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));
    let mut cart = Cart::new();
    cart.add(book.id, 1).unwrap();
    let detail = service.checkout(&mut cart, &customer()).await.unwrap();

    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let state = AppState::new(test_config(uploads), pool.clone());
    let token = state
        .auth
        .login(&crate::models::admin::LoginRequest {
            username: "admin".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap()
        .token;
    let router = app(state);
    let uri = format!("/admin/orders/{}/status", detail.order.order_id);

    let response = router
        .clone()
        .oneshot(
            Request::post(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"teleported"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(
            Request::post(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"shipped"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "shipped");
    assert_eq!(notifications_of_kind(&pool, "order_updated").await.len(), 1);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_decrement_stock_is_conditional() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Counted", 1000, 3).await;
    let books = BookStore::new(pool.clone());

    assert_eq!(books.decrement_stock(book.id, 2).await.unwrap(), 1);
    assert!(matches!(
        books.decrement_stock(book.id, 2).await,
        Err(AppError::InsufficientStock { available: 1, .. })
    ));
    assert!(matches!(
        books.decrement_stock(9999, 1).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(books.find(book.id).await.unwrap().stock, 1);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_stalled_dashboard_does_not_hold_up_checkout() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Busy", 1000, 50).await;

    let connections = Arc::new(ConnectionManager::new());
    let (stalled, _never_read) = tokio::sync::mpsc::channel(1);
    connections.register(Uuid::new_v4(), stalled).await;
    let notifier = Notifier::new(NotificationStore::new(pool.clone()), connections.clone());
    let service = CheckoutService::new(pool.clone(), notifier);

    for _ in 0..3 {
        let mut cart = Cart::new();
        cart.add(book.id, 1).unwrap();
        tokio::time::timeout(Duration::from_secs(3), service.checkout(&mut cart, &customer()))
            .await
            .expect("checkout waited on the dashboard")
            .unwrap();
        assert!(cart.is_empty());
    }

    assert_eq!(BookStore::new(pool.clone()).find(book.id).await.unwrap().stock, 47);
    assert_eq!(OrderStore::new(pool.clone()).list(None).await.unwrap().len(), 3);
    assert_eq!(connections.connection_count().await, 0);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_analytics_reports_after_sales() {
    let (path, pool) = setup_test_db().await;
    let novel = create_genre_book(&pool, "Novel", "Fiction", 1000, 10).await;
    let atlas = create_genre_book(&pool, "Atlas", "History", 2500, 6).await;
    create_genre_book(&pool, "Gone", "History", 900, 0).await;
    let service = CheckoutService::new(pool.clone(), notifier(&pool));

    let mut cart = Cart::new();
    cart.add(novel.id, 3).unwrap();
    cart.add(atlas.id, 1).unwrap();
    let kept = service.checkout(&mut cart, &customer()).await.unwrap();
    assert_eq!(kept.order.total_cents, 5500);

    cart.add(novel.id, 1).unwrap();
    let cancelled = service.checkout(&mut cart, &customer()).await.unwrap();
    OrderStore::new(pool.clone())
        .update_status(&cancelled.order.order_id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let analytics = AnalyticsStore::new(pool.clone());

    let stats = analytics.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_books, 3);
    assert_eq!(stats.total_stock, 6 + 5);
    assert_eq!(stats.low_stock_books, 2);
    assert_eq!(stats.out_of_stock, 1);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.pending_orders, 1);
    assert_eq!(stats.today_orders, 2);
    assert_eq!(stats.total_revenue_cents, 5500);
    assert_eq!(stats.today_revenue_cents, 5500);

    let top = analytics.top_selling_books(10).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!((top[0].id, top[0].total_sold, top[0].total_revenue_cents), (novel.id, 3, 3000));
    assert_eq!((top[1].id, top[1].total_sold, top[1].total_revenue_cents), (atlas.id, 1, 2500));

    let genres = analytics.sales_by_genre().await.unwrap();
    assert_eq!(genres.len(), 2);
    assert_eq!(genres[0].genre, "Fiction");
    assert_eq!(genres[0].total_revenue_cents, 3000);
    assert_eq!(genres[1].genre, "History");
    assert_eq!(genres[1].total_sold, 1);
    assert_eq!(genres[1].book_count, 1);

    let monthly = analytics.monthly_sales(12).await.unwrap();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].period, chrono::Utc::now().format("%Y-%m").to_string());
    assert_eq!(monthly[0].order_count, 1);
    assert_eq!(monthly[0].revenue_cents, 5500);

    let weekly = analytics.weekly_sales(12).await.unwrap();
    assert_eq!(weekly.iter().map(|w| w.order_count).sum::<i64>(), 1);
    assert_eq!(weekly.iter().map(|w| w.revenue_cents).sum::<i64>(), 5500);

    let low = analytics.low_stock_alerts().await.unwrap();
    assert_eq!(low.iter().map(|b| b.id).collect::<Vec<_>>(), vec![atlas.id]);

    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_catalog_update_replaces_image_and_flags_low_stock() {
    let (path, pool) = setup_test_db().await;
    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let catalog = CatalogService::new(
        BookStore::new(pool.clone()),
        ImageStore::new(&uploads),
        notifier(&pool),
    );

    let created = catalog
        .create(&book_form("Edited", "10.00", "6"), Some(image("cover.png")))
        .await
        .unwrap();
    let first_image = created.image_filename.clone().unwrap();
    assert!(uploads.join(&first_image).exists());

    let updated = catalog
        .update(created.id, &book_form("Edited", "11.00", "4"), Some(image("back.jpg")))
        .await
        .unwrap();
    let second_image = updated.image_filename.clone().unwrap();
    assert!(second_image.starts_with("back_"));
    assert!(uploads.join(&second_image).exists());
    assert!(!uploads.join(&first_image).exists());
    assert_eq!(updated.price_cents, 1100);
    assert_eq!(notifications_of_kind(&pool, "low_stock").await.len(), 1);

    // Already below the threshold, and no new image
    let updated = catalog
        .update(created.id, &book_form("Edited", "11.00", "3"), None)
        .await
        .unwrap();
    assert_eq!(updated.image_filename.as_deref(), Some(second_image.as_str()));
    assert_eq!(notifications_of_kind(&pool, "low_stock").await.len(), 1);

    // Same upload again; the stored name may collide with the current one
    let updated = catalog
        .update(created.id, &book_form("Edited", "11.00", "3"), Some(image("back.jpg")))
        .await
        .unwrap();
    let current = updated.image_filename.unwrap();
    assert!(uploads.join(&current).exists());

    assert!(matches!(
        catalog.update(9999, &book_form("Missing", "1.00", "1"), None).await,
        Err(AppError::NotFound(_))
    ));

    let _ = std::fs::remove_dir_all(uploads);
    teardown_test_db(path, pool).await;
}

#[tokio::test]
async fn test_cart_reads_create_no_sessions() {
    let (path, pool) = setup_test_db().await;
    let book = create_test_book(&pool, "Browsed", 1000, 3).await;
    let uploads = std::env::temp_dir().join(format!("bookstore_uploads_{}", Uuid::new_v4()));
    let state = AppState::new(test_config(uploads), pool.clone());
    let carts = state.carts.clone();
    let router = app(state);

    for uri in ["/api/cart", "/api/cart/count"] {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(&CART_SESSION_HEADER).is_none());
    }
    assert_eq!(carts.session_count().await, 0);

    let response = router
        .oneshot(
            Request::post("/api/cart/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"book_id":{},"quantity":9223372036854775807}}"#,
                    book.id
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    teardown_test_db(path, pool).await;
}
