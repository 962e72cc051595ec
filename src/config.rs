use chrono::Duration;
use envconfig::Envconfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JWT_EXPIRES_IN must be a positive number of hours, got {0}")]
    InvalidTokenTtl(i64),
}

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "DB_HOST", default = "localhost")]
    pub db_host: String,

    #[envconfig(from = "DB_PORT", default = "5432")]
    pub db_port: u16,

    #[envconfig(from = "DB_USER", default = "postgres")]
    pub db_user: String,

    #[envconfig(from = "DB_PASSWORD", default = "postgres")]
    pub db_password: String,

    #[envconfig(from = "DB_NAME", default = "clinic")]
    pub db_name: String,

    #[envconfig(from = "DB_MAX_CONNECTIONS", default = "10")]
    pub db_max_connections: u32,

    #[envconfig(from = "JWT_SECRET")]
    pub jwt_secret: String,

    #[envconfig(from = "JWT_ISSUER", default = "clinic")]
    pub jwt_issuer: String,

    /// Token lifetime in hours.
    #[envconfig(from = "JWT_EXPIRES_IN", default = "24")]
    pub jwt_expires_in: i64,

    #[envconfig(from = "API_PORT", default = "8080")]
    pub api_port: u16,

    #[envconfig(
        from = "CORS_ALLOWED_ORIGINS",
        default = "http://localhost:3000,http://localhost:8081"
    )]
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }

    /// Token lifetime. Zero, negative and out-of-range hour counts are rejected.
    pub fn token_ttl(&self) -> Result<Duration, ConfigError> {
        if self.jwt_expires_in <= 0 {
            return Err(ConfigError::InvalidTokenTtl(self.jwt_expires_in));
        }
        Duration::try_hours(self.jwt_expires_in)
            .ok_or(ConfigError::InvalidTokenTtl(self.jwt_expires_in))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }
}
