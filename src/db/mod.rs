pub mod enums;
pub mod models;
pub mod repositories;

use diesel::PgConnection;
use diesel::r2d2::{self, ConnectionManager as DbConnectionManager, PooledConnection};

pub type DbPool = r2d2::Pool<DbConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<DbConnectionManager<PgConnection>>;

/// Builds the connection pool from the database section of the config.
pub fn create_pool(config: &crate::config::DatabaseConfig) -> Result<DbPool, crate::error::AppError> {
    let manager = DbConnectionManager::<PgConnection>::new(&config.url);
    r2d2::Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
        .build(manager)
        .map_err(|e| crate::error::AppError::Config(format!("Failed to create database pool: {}", e)))
}
