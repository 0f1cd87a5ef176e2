use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::book::{Book, BookFilter, BookInput, FilterOptions, Visibility},
};

/// Book state right after a successful stock decrement
#[derive(Debug, Clone, FromRow)]
pub struct StockTaken {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price_cents: i64,
    pub stock: i64,
    pub stock_threshold: i64,
}

/// Book store for catalog operations
#[derive(Clone)]
pub struct BookStore {
    pool: DbPool,
}

impl BookStore {
    /// Create a new BookStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a book by ID
    pub async fn find(&self, id: i64) -> Result<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book".into()))
    }

    /// Insert a new book
    pub async fn create(&self, input: &BookInput, image_filename: Option<&str>) -> Result<Book> {
        let now = Utc::now();
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, description, price_cents, stock, genre,
                               image_filename, stock_threshold, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(&input.genre)
        .bind(image_filename)
        .bind(input.stock_threshold)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(book_id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Replace all editable fields of a book
    pub async fn update(
        &self,
        id: i64,
        input: &BookInput,
        image_filename: Option<&str>,
    ) -> Result<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = ?, author = ?, description = ?, price_cents = ?, stock = ?, genre = ?,
                image_filename = ?, stock_threshold = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(&input.genre)
        .bind(image_filename)
        .bind(input.stock_threshold)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Book".into()))
    }

    /// Delete a book, returning the removed row
    pub async fn delete(&self, id: i64) -> Result<Book> {
        sqlx::query_as::<_, Book>("DELETE FROM books WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book".into()))
    }

    /// Filtered listing. The storefront only sees books in stock.
    pub async fn search(&self, filter: &BookFilter, visibility: Visibility) -> Result<Vec<Book>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM books WHERE 1 = 1");

        if visibility == Visibility::Storefront {
            builder.push(" AND stock > 0");
        }
        if let Some(text) = &filter.text {
            let pattern = format!("%{}%", text);
            builder
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR author LIKE ")
                .push_bind(pattern.clone())
                .push(" OR description LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(genre) = &filter.genre {
            builder.push(" AND genre LIKE ").push_bind(format!("%{}%", genre));
        }
        if let Some(author) = &filter.author {
            builder.push(" AND author LIKE ").push_bind(format!("%{}%", author));
        }
        if let Some(min) = filter.min_price_cents {
            builder.push(" AND price_cents >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price_cents {
            builder.push(" AND price_cents <= ").push_bind(max);
        }
        builder.push(filter.sort.order_by());

        let books = builder.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    /// All books, newest first
    pub async fn list_all(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// All books ordered for stock review
    pub async fn list_by_stock(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY stock ASC, title")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// In-stock books of the same genre, in random order
    pub async fn related(&self, book: &Book, limit: i64) -> Result<Vec<Book>> {
        let Some(genre) = &book.genre else {
            return Ok(Vec::new());
        };

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE genre = ? AND id != ? AND stock > 0
            ORDER BY RANDOM()
            LIMIT ?
            "#,
        )
        .bind(genre)
        .bind(book.id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Distinct genres and authors among books in stock
    pub async fn filter_options(&self) -> Result<FilterOptions> {
        let genres: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT genre FROM books WHERE genre IS NOT NULL AND stock > 0 ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;
        let authors: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT author FROM books WHERE stock > 0 ORDER BY author")
                .fetch_all(&self.pool)
                .await?;

        Ok(FilterOptions {
            genres: genres.into_iter().map(|(g,)| g).collect(),
            authors: authors.into_iter().map(|(a,)| a).collect(),
        })
    }

    /// Atomically take `quantity` copies out of stock, returning the new level
    pub async fn decrement_stock(&self, id: i64, quantity: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        let taken = take_stock(&mut conn, id, quantity, Utc::now()).await?;
        Ok(taken.stock)
    }
}

/// Conditional stock decrement.
///
/// The check and the write are a single statement, so two callers can never
/// both succeed against the same remaining copy. Inside a transaction this is
/// the first write, which makes SQLite take the write lock before anything
/// else is read.
pub(crate) async fn take_stock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<StockTaken> {
    if quantity <= 0 {
        return Err(AppError::Validation("Quantity must be at least 1.".into()));
    }

    let taken = sqlx::query_as::<_, StockTaken>(
        r#"
        UPDATE books
        SET stock = stock - ?, updated_at = ?
        WHERE id = ? AND stock >= ?
        RETURNING id, title, author, price_cents, stock, stock_threshold
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(taken) = taken {
        return Ok(taken);
    }

    // Nothing updated: either the book is gone or there are not enough copies
    let current: Option<(String, i64)> = sqlx::query_as("SELECT title, stock FROM books WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match current {
        Some((title, available)) => Err(AppError::InsufficientStock { title, available }),
        None => Err(AppError::NotFound("Book".into())),
    }
}
