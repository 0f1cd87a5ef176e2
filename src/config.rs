use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub max_pool_size: u32,
    pub upload_dir: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub admin_password: String,
    pub seed_sample_data: bool,
    pub cart_session_idle_minutes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SERVER_PORT"))?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://bookstore.db".to_string()),
            max_pool_size: env::var("MAX_POOL_SIZE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("MAX_POOL_SIZE"))?,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".to_string()),
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("JWT_EXPIRATION_HOURS"))?,
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            seed_sample_data: env::var("SEED_SAMPLE_DATA")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            cart_session_idle_minutes: env::var("CART_SESSION_IDLE_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("CART_SESSION_IDLE_MINUTES"))?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}
