use crate::{db::DbPool, error::Result, models::admin::Admin};

/// Admin account lookups
#[derive(Clone)]
pub struct AdminStore {
    pool: DbPool,
}

impl AdminStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get an admin by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }
}
