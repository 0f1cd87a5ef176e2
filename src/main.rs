use bookstore_server::{
    AppState, app,
    config::Config,
    db::{init_db_pool, seed_defaults},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookstore_server=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = init_db_pool(&config.database_url, config.max_pool_size).await?;
    seed_defaults(&pool, &config.admin_password, config.seed_sample_data).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = config.server_addr();
    let state = AppState::new(config, pool);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Bookstore server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
