use chrono::Utc;
use sqlx::SqliteExecutor;

use crate::{
    db::DbPool,
    error::Result,
    models::notification::{NewNotification, Notification},
};

pub const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Notification store for the admin event log
#[derive(Clone)]
pub struct NotificationStore {
    pool: DbPool,
}

impl NotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append a notification
    pub async fn append(&self, notification: &NewNotification) -> Result<Notification> {
        insert(&self.pool, notification).await
    }

    /// Mark a notification as read. Unknown or already-read ids are a no-op.
    pub async fn mark_read(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn unread_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE is_read = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Most recent notifications first
    pub async fn recent(&self, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }
}

/// Insert a notification on any executor, so it can join a caller's transaction
pub(crate) async fn insert<'e, E>(executor: E, notification: &NewNotification) -> Result<Notification>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (type, title, message, is_read, created_at)
        VALUES (?, ?, ?, FALSE, ?)
        RETURNING *
        "#,
    )
    .bind(notification.kind.as_str())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;
    Ok(row)
}
