use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::order::{CustomerDetails, Order, OrderDetail, OrderItem, OrderStatus, OrderSummary},
};

/// Order store for order history and status changes
#[derive(Clone)]
pub struct OrderStore {
    pool: DbPool,
}

impl OrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Orders with item counts, newest first. `None` lists everything.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<OrderSummary>> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT o.*, COUNT(oi.id) AS item_count, GROUP_CONCAT(oi.title, ' | ') AS book_titles
            FROM orders o
            LEFT JOIN order_items oi ON o.order_id = oi.order_id
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Get an order and its lines by public order id
    pub async fn find(&self, order_id: &str) -> Result<OrderDetail> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))?;

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderDetail { order, items })
    }

    /// Change the status of an order
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ? RETURNING *",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))
    }
}

pub(crate) async fn insert_order<'e, E>(
    executor: E,
    order_id: &str,
    customer: &CustomerDetails,
    total_cents: i64,
    now: DateTime<Utc>,
) -> Result<Order>
where
    E: SqliteExecutor<'e>,
{
    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (order_id, customer_name, customer_email, customer_phone,
                            shipping_address, total_cents, status, payment_method,
                            created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(customer.customer_name.trim())
    .bind(customer.customer_email.trim())
    .bind(customer.customer_phone.as_deref().map(str::trim).filter(|p| !p.is_empty()))
    .bind(customer.shipping_address.as_deref().map(str::trim).filter(|a| !a.is_empty()))
    .bind(total_cents)
    .bind(OrderStatus::Pending.as_str())
    .bind(customer.payment_method())
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(order)
}

/// Line to be written for a new order
pub(crate) struct NewOrderItem<'a> {
    pub book_id: i64,
    pub title: &'a str,
    pub author: &'a str,
    pub quantity: i64,
    pub price_cents: i64,
}

pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: &str,
    item: &NewOrderItem<'_>,
    sold_at: DateTime<Utc>,
) -> Result<OrderItem> {
    let row = sqlx::query_as::<_, OrderItem>(
        r#"
        INSERT INTO order_items (order_id, book_id, title, author, quantity, price_cents)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(item.book_id)
    .bind(item.title)
    .bind(item.author)
    .bind(item.quantity)
    .bind(item.price_cents)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO sales_analytics (book_id, quantity_sold, revenue_cents, date) VALUES (?, ?, ?, ?)",
    )
    .bind(item.book_id)
    .bind(item.quantity)
    .bind(row.line_total_cents())
    .bind(sold_at.date_naive().to_string())
    .execute(&mut *conn)
    .await?;

    Ok(row)
}
