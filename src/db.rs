use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;
use crate::error::ApiError;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Check if a room with the given name already exists
pub async fn check_duplicate_room(
    pool: &PgPool,
    room_name: &str,
) -> Result<bool, ApiError> {
    tracing::debug!("Checking for duplicate room: {}", room_name);

    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM rooms WHERE room_name = $1)"
    )
    .bind(room_name)
    .fetch_one(pool)
    .await?;

    let is_duplicate = exists.unwrap_or(false);
    if is_duplicate {
        tracing::debug!("Duplicate room found: {}", room_name);
    }

    Ok(is_duplicate)
}

/// Check if a room with the given name already exists, excluding a specific ID
/// Used for update operations so a room can keep its own name
pub async fn check_duplicate_room_excluding_id(
    pool: &PgPool,
    room_name: &str,
    exclude_id: Uuid,
) -> Result<bool, ApiError> {
    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM rooms WHERE room_name = $1 AND id != $2)"
    )
    .bind(room_name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(exists.unwrap_or(false))
}
