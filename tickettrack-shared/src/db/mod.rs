/// PostgreSQL plumbing for [`crate::store::postgres::PgStore`]
///
/// # Modules
///
/// - `pool`: connection pool construction and health check
/// - `migrations`: embedded schema migrations
///
/// # Example
///
/// ```no_run
/// use tickettrack_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
