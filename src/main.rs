use dotenvy::dotenv;
use envconfig::Envconfig;

use clinic::credentials::TokenSigner;
use clinic::db::{init_db, migrate, seed::seed_users};
use clinic::handlers::AppState;
use clinic::router::build_router;
use clinic::store::PgStore;
use clinic::{Config, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize the logger with default settings or "info" level if not specified
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting the clinic API...");

    // Load environment variables from a .env file if present
    dotenv().ok();

    let config = Config::init_from_env()?;
    let token_ttl = config.token_ttl()?;

    // Connect, create the database on first run and apply the schema
    let pool = init_db(&config.database_url(), config.db_max_connections).await?;
    migrate(&pool).await?;

    let store = PgStore::new(pool);
    let seeded = seed_users(&store).await?;
    if seeded > 0 {
        log::info!("Seeded {} user(s)", seeded);
    }

    let signer = TokenSigner::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.clone(),
        token_ttl,
    );
    let app = build_router(AppState::new(store, signer), &config.cors_origins());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.api_port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
    }
}
