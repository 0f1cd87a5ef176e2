use crate::{
    db::DbPool,
    error::Result,
    models::{
        analytics::{DailySales, DashboardStats, GenreSales, InventoryRow, PeriodSales, TopSeller},
        book::Book,
    },
};

/// Read-only aggregation over books and order history
#[derive(Clone)]
pub struct AnalyticsStore {
    pool: DbPool,
}

impl AnalyticsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Headline numbers. Revenue excludes cancelled orders.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COALESCE(SUM(stock), 0) FROM books) AS total_stock,
                (SELECT COUNT(*) FROM books WHERE stock <= stock_threshold) AS low_stock_books,
                (SELECT COUNT(*) FROM books WHERE stock = 0) AS out_of_stock,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM orders WHERE date(created_at) = date('now')) AS today_orders,
                (SELECT COALESCE(SUM(total_cents), 0) FROM orders
                    WHERE status != 'cancelled') AS total_revenue_cents,
                (SELECT COALESCE(SUM(total_cents), 0) FROM orders
                    WHERE status != 'cancelled' AND date(created_at) = date('now')) AS today_revenue_cents
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Best sellers by quantity
    pub async fn top_selling_books(&self, limit: i64) -> Result<Vec<TopSeller>> {
        let rows = sqlx::query_as::<_, TopSeller>(
            r#"
            SELECT b.id, b.title, b.author, b.price_cents, b.stock,
                   SUM(oi.quantity) AS total_sold,
                   SUM(oi.quantity * oi.price_cents) AS total_revenue_cents
            FROM books b
            JOIN order_items oi ON b.id = oi.book_id
            JOIN orders o ON oi.order_id = o.order_id
            WHERE o.status != 'cancelled'
            GROUP BY b.id
            ORDER BY total_sold DESC, b.title
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn sales_by_genre(&self) -> Result<Vec<GenreSales>> {
        let rows = sqlx::query_as::<_, GenreSales>(
            r#"
            SELECT b.genre AS genre,
                   SUM(oi.quantity) AS total_sold,
                   SUM(oi.quantity * oi.price_cents) AS total_revenue_cents,
                   COUNT(DISTINCT b.id) AS book_count
            FROM books b
            JOIN order_items oi ON b.id = oi.book_id
            JOIN orders o ON oi.order_id = o.order_id
            WHERE o.status != 'cancelled' AND b.genre IS NOT NULL
            GROUP BY b.genre
            ORDER BY total_revenue_cents DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Books at or below their threshold that still have copies left
    pub async fn low_stock_alerts(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE stock <= stock_threshold AND stock > 0 ORDER BY stock ASC, title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn out_of_stock_books(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE stock = 0 ORDER BY title")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Order count and revenue per month over the last `months` months
    pub async fn monthly_sales(&self, months: i64) -> Result<Vec<PeriodSales>> {
        let rows = sqlx::query_as::<_, PeriodSales>(
            r#"
            SELECT strftime('%Y-%m', created_at) AS period,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(total_cents), 0) AS revenue_cents
            FROM orders
            WHERE created_at >= date('now', ?) AND status != 'cancelled'
            GROUP BY period
            ORDER BY period
            "#,
        )
        .bind(format!("-{} months", months))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Order count and revenue per week over the last `weeks` weeks
    pub async fn weekly_sales(&self, weeks: i64) -> Result<Vec<PeriodSales>> {
        let rows = sqlx::query_as::<_, PeriodSales>(
            r#"
            SELECT strftime('%Y-W%W', created_at) AS period,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(total_cents), 0) AS revenue_cents
            FROM orders
            WHERE created_at >= date('now', ?) AND status != 'cancelled'
            GROUP BY period
            ORDER BY period
            "#,
        )
        .bind(format!("-{} days", weeks * 7))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Units and revenue per day as recorded at checkout time
    pub async fn daily_sales(&self, days: i64) -> Result<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT date,
                   SUM(quantity_sold) AS quantity_sold,
                   SUM(revenue_cents) AS revenue_cents
            FROM sales_analytics
            WHERE date >= date('now', ?)
            GROUP BY date
            ORDER BY date
            "#,
        )
        .bind(format!("-{} days", days))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every book with its lifetime sales, for the inventory export
    pub async fn inventory_snapshot(&self) -> Result<Vec<InventoryRow>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT b.id, b.title, b.author, b.genre, b.price_cents, b.stock, b.stock_threshold,
                   COALESCE(SUM(s.quantity), 0) AS total_sold,
                   COALESCE(SUM(s.quantity * s.price_cents), 0) AS total_revenue_cents
            FROM books b
            LEFT JOIN (
                SELECT oi.book_id, oi.quantity, oi.price_cents
                FROM order_items oi
                JOIN orders o ON oi.order_id = o.order_id
                WHERE o.status != 'cancelled'
            ) s ON s.book_id = b.id
            GROUP BY b.id
            ORDER BY total_revenue_cents DESC, b.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
