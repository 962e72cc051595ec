use sqlx::{postgres::PgPoolOptions, Error, Executor, PgPool};
use thiserror::Error;

pub mod models;
pub mod seed;

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to parse database URL: {0}")]
    UrlParse(String),
    #[error("Database error: {0}")]
    Sqlx(#[from] Error),
    #[error("Failed to create database: {0}")]
    CreateDb(String),
    #[error("Failed to apply schema: {0}")]
    Migrate(String),
}

/// Connects to the clinic database, creating it first if the server does not have it yet.
pub async fn init_db(database_url: &str, max_connections: u32) -> Result<PgPool, DatabaseError> {
    let (base_url, db_name) = parse_database_url(database_url)?;

    let temp_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&format!("{}/postgres", base_url))
        .await
        .map_err(DatabaseError::Sqlx)?;

    ensure_database_exists(&temp_pool, &db_name).await?;
    temp_pool.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(DatabaseError::Sqlx)?;

    log::info!("Connected to database {}", db_name);
    Ok(pool)
}

/// Applies the idempotent schema in `schema.sql`.
pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    pool.execute(SCHEMA)
        .await
        .map_err(|e| DatabaseError::Migrate(e.to_string()))?;
    log::info!("Database schema is up to date");
    Ok(())
}

fn parse_database_url(database_url: &str) -> Result<(String, String), DatabaseError> {
    let base_url = database_url
        .rsplit_once('/')
        .ok_or_else(|| DatabaseError::UrlParse("Invalid database URL format".to_string()))?
        .0
        .to_string();

    let db_name = database_url
        .split('/')
        .last()
        .and_then(|s| s.split('?').next())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DatabaseError::UrlParse("Failed to extract database name".to_string()))?
        .to_string();

    if !db_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::UrlParse(format!(
            "Unsupported database name: {}",
            db_name
        )));
    }

    Ok((base_url, db_name))
}

async fn ensure_database_exists(pool: &PgPool, db_name: &str) -> Result<(), DatabaseError> {
    let db_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::Sqlx)?;

    if !db_exists {
        log::info!("Creating database {}", db_name);
        pool.execute(format!("CREATE DATABASE {}", db_name).as_str())
            .await
            .map_err(|e| DatabaseError::CreateDb(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_server_url_from_database_name() {
        let (base, name) =
            parse_database_url("postgres://user:pw@localhost:5432/clinic?sslmode=disable").unwrap();
        assert_eq!(base, "postgres://user:pw@localhost:5432");
        assert_eq!(name, "clinic");
    }

    #[test]
    fn rejects_names_that_would_need_quoting() {
        assert!(matches!(
            parse_database_url("postgres://localhost:5432/clinic;drop"),
            Err(DatabaseError::UrlParse(_))
        ));
        assert!(matches!(
            parse_database_url("postgres://localhost:5432/"),
            Err(DatabaseError::UrlParse(_))
        ));
    }

    #[test]
    fn schema_declares_the_slot_index() {
        assert!(SCHEMA.contains("appointments_doctor_slot_idx"));
        assert!(SCHEMA.contains("WHERE status <> 'cancelled'"));
    }
}
