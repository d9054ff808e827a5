use dotenv::dotenv;
use storefront_core::app::{create_router, AppState};
use storefront_core::config::Config;
use storefront_core::db;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting Storefront Core Server...");

    let config = Config::from_env()?;

    // Open the store and make sure the tables exist
    let db_pool = db::create_pool(&config.database_url).await?;
    db::init_schema(&db_pool).await?;

    let app = create_router(AppState::new(db_pool));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind_address(), e))?;

    info!("Server listening on {}", config.bind_address());

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
