use dotenvy::dotenv;
use envconfig::Envconfig;

use clinic::db::{init_db, migrate, seed::seed_users};
use clinic::store::PgStore;
use clinic::{Config, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok();

    let config = Config::init_from_env()?;
    let pool = init_db(&config.database_url(), config.db_max_connections).await?;
    migrate(&pool).await?;

    let inserted = seed_users(&PgStore::new(pool)).await?;
    log::info!("Seeding complete, {} user(s) inserted", inserted);
    Ok(())
}
