pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::ClinicError;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
