use std::{str::FromStr, time::Duration};

use anyhow::Result;
use chrono::Utc;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::services::auth_service;

pub mod admin_store;
pub mod analytics_store;
pub mod book_store;
pub mod notification_store;
pub mod order_store;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool and make sure the schema exists
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    setup_database(&pool).await?;

    Ok(pool)
}

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        description TEXT,
        price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
        stock INTEGER NOT NULL DEFAULT 0,
        genre TEXT,
        image_filename TEXT,
        stock_threshold INTEGER NOT NULL DEFAULT 5,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        email TEXT,
        role TEXT NOT NULL DEFAULT 'admin',
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id TEXT UNIQUE NOT NULL,
        customer_name TEXT NOT NULL,
        customer_email TEXT NOT NULL,
        customer_phone TEXT,
        shipping_address TEXT,
        total_cents INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        payment_method TEXT NOT NULL DEFAULT 'cash_on_delivery',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id TEXT NOT NULL REFERENCES orders (order_id),
        book_id INTEGER REFERENCES books (id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        price_cents INTEGER NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        is_read BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales_analytics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id INTEGER REFERENCES books (id) ON DELETE SET NULL,
        quantity_sold INTEGER NOT NULL DEFAULT 0,
        revenue_cents INTEGER NOT NULL DEFAULT 0,
        date TEXT NOT NULL
    );
    "#,
];

/// Set up the database schema
async fn setup_database(pool: &DbPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// (title, author, description, price in cents, stock, genre, stock threshold)
type SampleBook = (&'static str, &'static str, &'static str, i64, i64, &'static str, i64);

const SAMPLE_BOOKS: [SampleBook; 10] = [
    ("The Great Gatsby", "F. Scott Fitzgerald", "A classic American novel set in the Jazz Age, exploring themes of wealth, love, and the American Dream.", 1299, 25, "Fiction", 5),
    ("To Kill a Mockingbird", "Harper Lee", "A gripping tale of racial injustice and childhood innocence in the American South.", 1399, 18, "Fiction", 5),
    ("1984", "George Orwell", "A dystopian social science fiction novel about totalitarian control and surveillance.", 1499, 30, "Science Fiction", 10),
    ("Pride and Prejudice", "Jane Austen", "A romantic novel of manners set in Georgian England.", 1199, 22, "Romance", 8),
    ("The Rust Programming Language", "Steve Klabnik and Carol Nichols", "The official guide to Rust, from ownership to fearless concurrency.", 4999, 3, "Technology", 5),
    ("Digital Marketing Essentials", "Sarah Johnson", "Modern strategies for digital marketing in the social media age.", 2999, 2, "Business", 5),
    ("World History: A Complete Overview", "Dr. Michael Brown", "Comprehensive overview of world history from ancient times to present.", 3999, 1, "History", 3),
    ("Cooking Fundamentals", "Chef Maria Lopez", "Learn the basics of cooking with step-by-step instructions and recipes.", 2499, 20, "Non-Fiction", 7),
    ("Advanced JavaScript", "John Developer", "Master modern JavaScript with ES6+ features and best practices.", 4599, 15, "Technology", 6),
    ("Business Strategy 2024", "MBA Expert", "Latest business strategies for modern entrepreneurs and managers.", 3599, 8, "Business", 5),
];

/// Insert the default admin and, optionally, the sample catalog into an
/// empty database
pub async fn seed_defaults(pool: &DbPool, admin_password: &str, sample_books: bool) -> Result<()> {
    let admins: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await?;

    if admins.0 == 0 {
        let password_hash = auth_service::hash_password(admin_password)?;
        sqlx::query(
            r#"
            INSERT INTO admins (username, password_hash, email, role, created_at)
            VALUES ('admin', ?, 'admin@bookstore.com', 'superadmin', ?);
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        tracing::info!("Seeded default admin account");
    }

    if !sample_books {
        return Ok(());
    }

    let books: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;

    if books.0 == 0 {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        for (title, author, description, price_cents, stock, genre, threshold) in SAMPLE_BOOKS {
            sqlx::query(
                r#"
                INSERT INTO books (title, author, description, price_cents, stock, genre,
                                   stock_threshold, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
                "#,
            )
            .bind(title)
            .bind(author)
            .bind(description)
            .bind(price_cents)
            .bind(stock)
            .bind(genre)
            .bind(threshold)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::info!("Seeded {} sample books", SAMPLE_BOOKS.len());
    }

    Ok(())
}
