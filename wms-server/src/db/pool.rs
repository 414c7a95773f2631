//! Database connection pool management

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgPool};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Create a PostgreSQL connection pool.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/wms").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a PostgreSQL connection pool with custom options.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Pool that connects on first use. Startup never blocks on the database.
pub fn create_lazy_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy(database_url)
}

/// Open and close one connection with the given credentials.
///
/// Host, port and database come from `database_url`; the user name and
/// password replace whatever it carries.
pub async fn verify_credentials(
    database_url: &str,
    username: &str,
    password: &str,
) -> Result<(), sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .username(username)
        .password(password);
    let conn = options.connect().await?;
    conn.close().await?;
    Ok(())
}

/// Round-trip a trivial query.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p wms-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn wrong_password_is_rejected() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let result = verify_credentials(&url, "wms_nobody", "definitely-wrong").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let pool = create_lazy_pool("postgres://nobody@127.0.0.1:1/none", 1);
        assert!(pool.is_ok());
    }
}
